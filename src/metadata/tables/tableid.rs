use strum::{EnumCount, EnumIter, FromRepr, IntoStaticStr};

/// Identifies one of the metadata table kinds defined by ECMA-335 II.22.
///
/// The discriminant is the table's index in the `valid` and `sorted` bit-vectors of the
/// tables heap, and the high byte of every metadata token referring to one of its rows.
/// Iteration via [`strum::IntoEnumIterator`] yields the kinds in ascending index order,
/// which is the order their row counts and rows are laid out in the `#~` stream.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, EnumIter, EnumCount, FromRepr,
    IntoStaticStr,
)]
#[repr(u8)]
pub enum TableId {
    /// `Module`, the current module; always exactly one row
    Module = 0x00,
    /// `TypeRef`, references to types defined elsewhere
    TypeRef = 0x01,
    /// `TypeDef`, types defined in this module
    TypeDef = 0x02,
    /// `FieldPtr`, indirection used by unoptimized (`#-`) metadata
    FieldPtr = 0x03,
    /// `Field`, field definitions
    Field = 0x04,
    /// `MethodPtr`, indirection used by unoptimized (`#-`) metadata
    MethodPtr = 0x05,
    /// `MethodDef`, method definitions
    MethodDef = 0x06,
    /// `ParamPtr`, indirection used by unoptimized (`#-`) metadata
    ParamPtr = 0x07,
    /// `Param`, method parameters
    Param = 0x08,
    /// `InterfaceImpl`, interfaces implemented by types
    InterfaceImpl = 0x09,
    /// `MemberRef`, references to fields and methods of other types
    MemberRef = 0x0A,
    /// `Constant`, compile-time constant values
    Constant = 0x0B,
    /// `CustomAttribute`, attribute applications
    CustomAttribute = 0x0C,
    /// `FieldMarshal`, marshalling descriptors
    FieldMarshal = 0x0D,
    /// `DeclSecurity`, declarative security
    DeclSecurity = 0x0E,
    /// `ClassLayout`, explicit type layout
    ClassLayout = 0x0F,
    /// `FieldLayout`, explicit field offsets
    FieldLayout = 0x10,
    /// `StandAloneSig`, signatures not attached to a member
    StandAloneSig = 0x11,
    /// `EventMap`, maps types to their event lists
    EventMap = 0x12,
    /// `EventPtr`, indirection used by unoptimized (`#-`) metadata
    EventPtr = 0x13,
    /// `Event`, event definitions
    Event = 0x14,
    /// `PropertyMap`, maps types to their property lists
    PropertyMap = 0x15,
    /// `PropertyPtr`, indirection used by unoptimized (`#-`) metadata
    PropertyPtr = 0x16,
    /// `Property`, property definitions
    Property = 0x17,
    /// `MethodSemantics`, getter/setter/adder/remover associations
    MethodSemantics = 0x18,
    /// `MethodImpl`, explicit method overrides
    MethodImpl = 0x19,
    /// `ModuleRef`, references to other modules
    ModuleRef = 0x1A,
    /// `TypeSpec`, constructed type signatures
    TypeSpec = 0x1B,
    /// `ImplMap`, P/Invoke mappings
    ImplMap = 0x1C,
    /// `FieldRVA`, initial data of static fields
    FieldRVA = 0x1D,
    /// `EncLog`, edit-and-continue log
    EncLog = 0x1E,
    /// `EncMap`, edit-and-continue token map
    EncMap = 0x1F,
    /// `Assembly`, the assembly manifest
    Assembly = 0x20,
    /// `AssemblyProcessor`, unused by current runtimes
    AssemblyProcessor = 0x21,
    /// `AssemblyOS`, unused by current runtimes
    AssemblyOS = 0x22,
    /// `AssemblyRef`, referenced assemblies
    AssemblyRef = 0x23,
    /// `AssemblyRefProcessor`, unused by current runtimes
    AssemblyRefProcessor = 0x24,
    /// `AssemblyRefOS`, unused by current runtimes
    AssemblyRefOS = 0x25,
    /// `File`, files of a multi-module assembly
    File = 0x26,
    /// `ExportedType`, types exported from other modules
    ExportedType = 0x27,
    /// `ManifestResource`, embedded and linked resources
    ManifestResource = 0x28,
    /// `NestedClass`, nesting relationships between types
    NestedClass = 0x29,
    /// `GenericParam`, generic parameters of types and methods
    GenericParam = 0x2A,
    /// `MethodSpec`, generic method instantiations
    MethodSpec = 0x2B,
    /// `GenericParamConstraint`, constraints on generic parameters
    GenericParamConstraint = 0x2C,
}

impl TableId {
    /// The table's name as used in ECMA-335, e.g. `"TypeDef"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Look up a table kind by its index in the `valid` bit-vector.
    #[must_use]
    pub fn from_index(index: u32) -> Option<TableId> {
        u8::try_from(index).ok().and_then(TableId::from_repr)
    }

    /// The bit this table occupies in the `valid` and `sorted` vectors.
    #[must_use]
    pub const fn bit(self) -> u64 {
        1_u64 << (self as u8)
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of table kinds known to the decoder.
pub const TABLE_COUNT: usize = TableId::COUNT;

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn contiguous_indices() {
        for (index, id) in TableId::iter().enumerate() {
            assert_eq!(id as usize, index);
            assert_eq!(TableId::from_index(index as u32), Some(id));
        }
        assert_eq!(TABLE_COUNT, 0x2D);
        assert_eq!(TableId::from_index(0x2D), None);
        assert_eq!(TableId::from_index(0x1_0000), None);
    }

    #[test]
    fn names_and_bits() {
        assert_eq!(TableId::TypeDef.name(), "TypeDef");
        assert_eq!(TableId::GenericParamConstraint.to_string(), "GenericParamConstraint");
        assert_eq!(TableId::Module.bit(), 1);
        assert_eq!(TableId::AssemblyRef.bit(), 1 << 35);
    }
}
