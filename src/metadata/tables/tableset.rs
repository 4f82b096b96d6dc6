use strum::IntoEnumIterator;

use super::TableId;

/// Membership of table kinds in a 64-bit vector, as used by the `valid` and `sorted` fields
/// of the tables heap header.
///
/// Bit *i* corresponds to the table kind with index *i*. Bits that do not name a known
/// table kind are preserved, so a header can be inspected for them with
/// [`TableSet::unknown_bits`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TableSet(u64);

impl TableSet {
    /// An empty set.
    #[must_use]
    pub const fn empty() -> Self {
        TableSet(0)
    }

    /// Wrap a raw bit-vector.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        TableSet(bits)
    }

    /// The raw bit-vector.
    #[must_use]
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Check whether `table` is a member.
    #[must_use]
    pub const fn contains(&self, table: TableId) -> bool {
        self.0 & table.bit() != 0
    }

    /// Add `table`.
    pub fn insert(&mut self, table: TableId) {
        self.0 |= table.bit();
    }

    /// Remove `table`.
    pub fn remove(&mut self, table: TableId) {
        self.0 &= !table.bit();
    }

    /// Number of set bits, including unknown ones.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns true if no bit is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Bits set for indices that are not a known table kind.
    #[must_use]
    pub fn unknown_bits(&self) -> u64 {
        let known = TableId::iter().fold(0_u64, |acc, id| acc | id.bit());
        self.0 & !known
    }

    /// Member table kinds in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = TableId> + '_ {
        TableId::iter().filter(|id| self.contains(*id))
    }
}

impl FromIterator<TableId> for TableSet {
    fn from_iter<I: IntoIterator<Item = TableId>>(iter: I) -> Self {
        let mut set = TableSet::empty();
        for table in iter {
            set.insert(table);
        }
        set
    }
}

impl std::fmt::Debug for TableSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let mut set = TableSet::empty();
        assert!(set.is_empty());

        set.insert(TableId::AssemblyRef);
        set.insert(TableId::TypeDef);
        set.insert(TableId::MethodDef);
        assert_eq!(set.len(), 3);
        assert_eq!(set.bits(), (1 << 2) | (1 << 6) | (1 << 35));
        assert!(set.contains(TableId::MethodDef));
        assert!(!set.contains(TableId::Field));

        let order: Vec<_> = set.iter().collect();
        assert_eq!(
            order,
            vec![TableId::TypeDef, TableId::MethodDef, TableId::AssemblyRef]
        );

        set.remove(TableId::MethodDef);
        assert!(!set.contains(TableId::MethodDef));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn unknown_bits() {
        let set = TableSet::from_bits((1 << 0) | (1 << 0x2C) | (1 << 0x2D) | (1 << 63));
        assert_eq!(set.unknown_bits(), (1 << 0x2D) | (1 << 63));
        assert_eq!(set.iter().count(), 2);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn collect() {
        let set: TableSet = [TableId::Module, TableId::TypeRef].into_iter().collect();
        assert_eq!(set.bits(), 0b11);
        assert_eq!(format!("{set:?}"), "{Module, TypeRef}");
    }
}
