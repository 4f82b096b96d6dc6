//! Coded indices: table columns that reference one of several tables.
//!
//! A coded index packs a table-selector tag into its low bits and a 1-based row id into the
//! remaining bits (ECMA-335 II.24.2.6). Each union has its own fixed tag width and its own
//! ordered tag-to-table list, there is no arithmetic relationship between unions.
//!
//! ```rust
//! use cilmeta::metadata::tables::{CodedIndex, CodedIndexType, TableId};
//!
//! // ResolutionScope: 2 tag bits, tag 2 = AssemblyRef
//! let scope = CodedIndex::decode(CodedIndexType::ResolutionScope, (7 << 2) | 2)?;
//! assert_eq!(scope.tag, TableId::AssemblyRef);
//! assert_eq!(scope.row, 7);
//! assert_eq!(scope.token.value(), 0x2300_0007);
//! # Ok::<(), cilmeta::Error>(())
//! ```

use strum::{EnumCount, EnumIter};

use crate::{
    metadata::{tables::TableId, token::Token},
    Error, Result,
};

/// The coded index unions of ECMA-335 II.24.2.6.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, EnumCount)]
pub enum CodedIndexType {
    /// `TypeDef`, `TypeRef` or `TypeSpec`
    TypeDefOrRef,
    /// `Field`, `Param` or `Property`
    HasConstant,
    /// Any table that may carry a custom attribute
    HasCustomAttribute,
    /// `Field` or `Param`
    HasFieldMarshal,
    /// `TypeDef`, `MethodDef` or `Assembly`
    HasDeclSecurity,
    /// `TypeDef`, `TypeRef`, `ModuleRef`, `MethodDef` or `TypeSpec`
    MemberRefParent,
    /// `Event` or `Property`
    HasSemantics,
    /// `MethodDef` or `MemberRef`
    MethodDefOrRef,
    /// `Field` or `MethodDef`
    MemberForwarded,
    /// `File`, `AssemblyRef` or `ExportedType`
    Implementation,
    /// `MethodDef` or `MemberRef`, with three reserved tags
    CustomAttributeType,
    /// `Module`, `ModuleRef`, `AssemblyRef` or `TypeRef`
    ResolutionScope,
    /// `TypeDef` or `MethodDef`
    TypeOrMethodDef,
}

impl CodedIndexType {
    /// The tag-to-table list of this union, indexed by tag. `None` marks a tag the standard
    /// reserves as unused.
    #[must_use]
    pub fn targets(&self) -> &'static [Option<TableId>] {
        match self {
            CodedIndexType::TypeDefOrRef => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasConstant => &[
                Some(TableId::Field),
                Some(TableId::Param),
                Some(TableId::Property),
            ],
            CodedIndexType::HasCustomAttribute => &[
                Some(TableId::MethodDef),
                Some(TableId::Field),
                Some(TableId::TypeRef),
                Some(TableId::TypeDef),
                Some(TableId::Param),
                Some(TableId::InterfaceImpl),
                Some(TableId::MemberRef),
                Some(TableId::Module),
                // Labelled 'Permission' in the standard, no such table exists
                Some(TableId::DeclSecurity),
                Some(TableId::Property),
                Some(TableId::Event),
                Some(TableId::StandAloneSig),
                Some(TableId::ModuleRef),
                Some(TableId::TypeSpec),
                Some(TableId::Assembly),
                Some(TableId::AssemblyRef),
                Some(TableId::File),
                Some(TableId::ExportedType),
                Some(TableId::ManifestResource),
                Some(TableId::GenericParam),
                Some(TableId::GenericParamConstraint),
                Some(TableId::MethodSpec),
            ],
            CodedIndexType::HasFieldMarshal => &[Some(TableId::Field), Some(TableId::Param)],
            CodedIndexType::HasDeclSecurity => &[
                Some(TableId::TypeDef),
                Some(TableId::MethodDef),
                Some(TableId::Assembly),
            ],
            CodedIndexType::MemberRefParent => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::ModuleRef),
                Some(TableId::MethodDef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasSemantics => &[Some(TableId::Event), Some(TableId::Property)],
            CodedIndexType::MethodDefOrRef => &[Some(TableId::MethodDef), Some(TableId::MemberRef)],
            CodedIndexType::MemberForwarded => &[Some(TableId::Field), Some(TableId::MethodDef)],
            CodedIndexType::Implementation => &[
                Some(TableId::File),
                Some(TableId::AssemblyRef),
                Some(TableId::ExportedType),
            ],
            CodedIndexType::CustomAttributeType => &[
                None,
                None,
                Some(TableId::MethodDef),
                Some(TableId::MemberRef),
                None,
            ],
            CodedIndexType::ResolutionScope => &[
                Some(TableId::Module),
                Some(TableId::ModuleRef),
                Some(TableId::AssemblyRef),
                Some(TableId::TypeRef),
            ],
            CodedIndexType::TypeOrMethodDef => &[Some(TableId::TypeDef), Some(TableId::MethodDef)],
        }
    }

    /// Number of low bits holding the tag.
    #[must_use]
    pub const fn tag_bits(&self) -> u32 {
        match self {
            CodedIndexType::HasFieldMarshal
            | CodedIndexType::HasSemantics
            | CodedIndexType::MethodDefOrRef
            | CodedIndexType::MemberForwarded
            | CodedIndexType::TypeOrMethodDef => 1,
            CodedIndexType::TypeDefOrRef
            | CodedIndexType::HasConstant
            | CodedIndexType::HasDeclSecurity
            | CodedIndexType::Implementation
            | CodedIndexType::ResolutionScope => 2,
            CodedIndexType::MemberRefParent | CodedIndexType::CustomAttributeType => 3,
            CodedIndexType::HasCustomAttribute => 5,
        }
    }

    /// Mask selecting the tag bits of a raw value.
    #[must_use]
    pub const fn tag_mask(&self) -> u32 {
        (1 << self.tag_bits()) - 1
    }

    /// The real tables participating in this union, in tag order.
    pub fn tables(&self) -> impl Iterator<Item = TableId> {
        self.targets().iter().filter_map(|target| *target)
    }
}

/// A decoded coded index value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodedIndex {
    /// The table this index refers to.
    pub tag: TableId,
    /// The 1-based row id, 0 for a null reference.
    pub row: u32,
    /// The metadata token combining `tag` and `row`.
    pub token: Token,
}

impl CodedIndex {
    /// Create a coded index referring to `row` of `tag`.
    #[must_use]
    pub fn new(tag: TableId, row: u32) -> CodedIndex {
        CodedIndex {
            tag,
            row,
            token: Token::from_parts(tag, row),
        }
    }

    /// Decode a raw column value of the union `kind`.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedToken`] if the tag exceeds the union's tag range or
    /// selects a tag reserved as unused.
    pub fn decode(kind: CodedIndexType, raw: u32) -> Result<CodedIndex> {
        let tag = raw & kind.tag_mask();
        let row = raw >> kind.tag_bits();

        match kind.targets().get(tag as usize) {
            Some(Some(table)) => Ok(CodedIndex::new(*table, row)),
            _ => Err(Error::MalformedToken { kind, tag, raw }),
        }
    }

    /// Encode a reference to `row` of `table` as a raw value of the union `kind`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if `table` is not a member of the union, or `row` does
    /// not fit beside the tag bits.
    pub fn encode(kind: CodedIndexType, table: TableId, row: u32) -> Result<u32> {
        let Some(tag) = kind.targets().iter().position(|t| *t == Some(table)) else {
            return Err(Error::Error(format!(
                "{table} is not a member of the {kind:?} coded index"
            )));
        };

        if row > (u32::MAX >> kind.tag_bits()) {
            return Err(Error::Error(format!(
                "Row {row} does not fit a {kind:?} coded index"
            )));
        }

        #[allow(clippy::cast_possible_truncation)]
        Ok((row << kind.tag_bits()) | tag as u32)
    }

    /// Returns true for a null reference.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn tag_ranges_fit_widths() {
        for kind in CodedIndexType::iter() {
            let len = kind.targets().len() as u32;
            assert!(len <= 1 << kind.tag_bits(), "{kind:?}");
            assert!(len > 1 << (kind.tag_bits() - 1), "{kind:?}");
        }
        assert_eq!(CodedIndexType::COUNT, 13);
        assert_eq!(CodedIndexType::HasCustomAttribute.targets().len(), 22);
    }

    #[test]
    fn decode_type_def_or_ref() {
        let index = CodedIndex::decode(CodedIndexType::TypeDefOrRef, (0x42 << 2) | 1).unwrap();
        assert_eq!(index.tag, TableId::TypeRef);
        assert_eq!(index.row, 0x42);
        assert_eq!(index.token.value(), 0x0100_0042);
        assert!(!index.is_null());

        let null = CodedIndex::decode(CodedIndexType::TypeDefOrRef, 0).unwrap();
        assert_eq!(null.tag, TableId::TypeDef);
        assert!(null.is_null());
    }

    #[test]
    fn decode_has_custom_attribute() {
        let index = CodedIndex::decode(CodedIndexType::HasCustomAttribute, (3 << 5) | 21).unwrap();
        assert_eq!(index.tag, TableId::MethodSpec);
        assert_eq!(index.row, 3);

        let result = CodedIndex::decode(CodedIndexType::HasCustomAttribute, (3 << 5) | 22);
        assert!(matches!(
            result,
            Err(Error::MalformedToken {
                kind: CodedIndexType::HasCustomAttribute,
                tag: 22,
                ..
            })
        ));
    }

    #[test]
    fn decode_out_of_range() {
        // Implementation has 3 members and 2 tag bits, tag 3 is outside the union
        let result = CodedIndex::decode(CodedIndexType::Implementation, (1 << 2) | 3);
        assert!(matches!(result, Err(Error::MalformedToken { tag: 3, raw: 7, .. })));
    }

    #[test]
    fn custom_attribute_type_reserved_tags() {
        let kind = CodedIndexType::CustomAttributeType;
        assert_eq!(
            CodedIndex::decode(kind, (9 << 3) | 2).unwrap(),
            CodedIndex::new(TableId::MethodDef, 9)
        );
        assert_eq!(
            CodedIndex::decode(kind, (9 << 3) | 3).unwrap(),
            CodedIndex::new(TableId::MemberRef, 9)
        );

        for tag in [0, 1, 4, 5, 6, 7] {
            assert!(matches!(
                CodedIndex::decode(kind, (9 << 3) | tag),
                Err(Error::MalformedToken { .. })
            ));
        }
    }

    #[test]
    fn encode_inverts_decode() {
        for kind in CodedIndexType::iter() {
            for table in kind.tables() {
                let raw = CodedIndex::encode(kind, table, 0x1234).unwrap();
                let decoded = CodedIndex::decode(kind, raw).unwrap();
                assert_eq!(decoded, CodedIndex::new(table, 0x1234), "{kind:?}");
            }
        }

        assert!(CodedIndex::encode(CodedIndexType::HasSemantics, TableId::Field, 1).is_err());
        assert!(CodedIndex::encode(CodedIndexType::HasCustomAttribute, TableId::Field, u32::MAX).is_err());
    }
}
