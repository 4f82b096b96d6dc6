//! Static column schemas of every table kind (ECMA-335 II.22).
//!
//! A schema is the ordered list of a table's columns. Rows are decoded by walking this list,
//! so adding a table kind means adding data here rather than code elsewhere.

use crate::metadata::tables::{CodedIndexType, TableId};

/// How a column is encoded on disk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ColumnKind {
    /// A constant of the given width in bytes (1, 2 or 4)
    Fixed(u8),
    /// An offset into `#Strings`
    StringIndex,
    /// An index into `#GUID`
    GuidIndex,
    /// An offset into `#Blob`
    BlobIndex,
    /// A 1-based row id of the given table
    TableIndex(TableId),
    /// A coded index of the given union
    CodedIndex(CodedIndexType),
}

/// A named column of a table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Column {
    /// Column name as used in ECMA-335
    pub name: &'static str,
    /// On-disk encoding
    pub kind: ColumnKind,
}

/// The ordered columns of one table kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TableSchema {
    /// The table kind described
    pub id: TableId,
    /// Columns in on-disk order
    pub columns: &'static [Column],
}

impl TableSchema {
    /// Position of the column called `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// The column called `name`.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|column| column.name == name)
    }
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

const U8: ColumnKind = ColumnKind::Fixed(1);
const U16: ColumnKind = ColumnKind::Fixed(2);
const U32: ColumnKind = ColumnKind::Fixed(4);
const STR: ColumnKind = ColumnKind::StringIndex;
const GUID: ColumnKind = ColumnKind::GuidIndex;
const BLOB: ColumnKind = ColumnKind::BlobIndex;

const fn table(id: TableId) -> ColumnKind {
    ColumnKind::TableIndex(id)
}

const fn coded(kind: CodedIndexType) -> ColumnKind {
    ColumnKind::CodedIndex(kind)
}

use CodedIndexType as C;
use TableId as T;

static MODULE: [Column; 5] = [
    col("Generation", U16),
    col("Name", STR),
    col("Mvid", GUID),
    col("EncId", GUID),
    col("EncBaseId", GUID),
];

static TYPE_REF: [Column; 3] = [
    col("ResolutionScope", coded(C::ResolutionScope)),
    col("TypeName", STR),
    col("TypeNamespace", STR),
];

static TYPE_DEF: [Column; 6] = [
    col("Flags", U32),
    col("TypeName", STR),
    col("TypeNamespace", STR),
    col("Extends", coded(C::TypeDefOrRef)),
    col("FieldList", table(T::Field)),
    col("MethodList", table(T::MethodDef)),
];

static FIELD_PTR: [Column; 1] = [col("Field", table(T::Field))];

static FIELD: [Column; 3] = [
    col("Flags", U16),
    col("Name", STR),
    col("Signature", BLOB),
];

static METHOD_PTR: [Column; 1] = [col("Method", table(T::MethodDef))];

static METHOD_DEF: [Column; 6] = [
    col("RVA", U32),
    col("ImplFlags", U16),
    col("Flags", U16),
    col("Name", STR),
    col("Signature", BLOB),
    col("ParamList", table(T::Param)),
];

static PARAM_PTR: [Column; 1] = [col("Param", table(T::Param))];

static PARAM: [Column; 3] = [
    col("Flags", U16),
    col("Sequence", U16),
    col("Name", STR),
];

static INTERFACE_IMPL: [Column; 2] = [
    col("Class", table(T::TypeDef)),
    col("Interface", coded(C::TypeDefOrRef)),
];

static MEMBER_REF: [Column; 3] = [
    col("Class", coded(C::MemberRefParent)),
    col("Name", STR),
    col("Signature", BLOB),
];

static CONSTANT: [Column; 4] = [
    col("Type", U8),
    col("Padding", U8),
    col("Parent", coded(C::HasConstant)),
    col("Value", BLOB),
];

static CUSTOM_ATTRIBUTE: [Column; 3] = [
    col("Parent", coded(C::HasCustomAttribute)),
    col("Type", coded(C::CustomAttributeType)),
    col("Value", BLOB),
];

static FIELD_MARSHAL: [Column; 2] = [
    col("Parent", coded(C::HasFieldMarshal)),
    col("NativeType", BLOB),
];

static DECL_SECURITY: [Column; 3] = [
    col("Action", U16),
    col("Parent", coded(C::HasDeclSecurity)),
    col("PermissionSet", BLOB),
];

static CLASS_LAYOUT: [Column; 3] = [
    col("PackingSize", U16),
    col("ClassSize", U32),
    col("Parent", table(T::TypeDef)),
];

static FIELD_LAYOUT: [Column; 2] = [col("Offset", U32), col("Field", table(T::Field))];

static STAND_ALONE_SIG: [Column; 1] = [col("Signature", BLOB)];

static EVENT_MAP: [Column; 2] = [
    col("Parent", table(T::TypeDef)),
    col("EventList", table(T::Event)),
];

static EVENT_PTR: [Column; 1] = [col("Event", table(T::Event))];

static EVENT: [Column; 3] = [
    col("EventFlags", U16),
    col("Name", STR),
    col("EventType", coded(C::TypeDefOrRef)),
];

static PROPERTY_MAP: [Column; 2] = [
    col("Parent", table(T::TypeDef)),
    col("PropertyList", table(T::Property)),
];

static PROPERTY_PTR: [Column; 1] = [col("Property", table(T::Property))];

static PROPERTY: [Column; 3] = [col("Flags", U16), col("Name", STR), col("Type", BLOB)];

static METHOD_SEMANTICS: [Column; 3] = [
    col("Semantics", U16),
    col("Method", table(T::MethodDef)),
    col("Association", coded(C::HasSemantics)),
];

static METHOD_IMPL: [Column; 3] = [
    col("Class", table(T::TypeDef)),
    col("MethodBody", coded(C::MethodDefOrRef)),
    col("MethodDeclaration", coded(C::MethodDefOrRef)),
];

static MODULE_REF: [Column; 1] = [col("Name", STR)];

static TYPE_SPEC: [Column; 1] = [col("Signature", BLOB)];

static IMPL_MAP: [Column; 4] = [
    col("MappingFlags", U16),
    col("MemberForwarded", coded(C::MemberForwarded)),
    col("ImportName", STR),
    col("ImportScope", table(T::ModuleRef)),
];

static FIELD_RVA: [Column; 2] = [col("RVA", U32), col("Field", table(T::Field))];

static ENC_LOG: [Column; 2] = [col("Token", U32), col("FuncCode", U32)];

static ENC_MAP: [Column; 1] = [col("Token", U32)];

static ASSEMBLY: [Column; 9] = [
    col("HashAlgId", U32),
    col("MajorVersion", U16),
    col("MinorVersion", U16),
    col("BuildNumber", U16),
    col("RevisionNumber", U16),
    col("Flags", U32),
    col("PublicKey", BLOB),
    col("Name", STR),
    col("Culture", STR),
];

static ASSEMBLY_PROCESSOR: [Column; 1] = [col("Processor", U32)];

static ASSEMBLY_OS: [Column; 3] = [
    col("OSPlatformId", U32),
    col("OSMajorVersion", U32),
    col("OSMinorVersion", U32),
];

static ASSEMBLY_REF: [Column; 9] = [
    col("MajorVersion", U16),
    col("MinorVersion", U16),
    col("BuildNumber", U16),
    col("RevisionNumber", U16),
    col("Flags", U32),
    col("PublicKeyOrToken", BLOB),
    col("Name", STR),
    col("Culture", STR),
    col("HashValue", BLOB),
];

static ASSEMBLY_REF_PROCESSOR: [Column; 2] = [
    col("Processor", U32),
    col("AssemblyRef", table(T::AssemblyRef)),
];

static ASSEMBLY_REF_OS: [Column; 4] = [
    col("OSPlatformId", U32),
    col("OSMajorVersion", U32),
    col("OSMinorVersion", U32),
    col("AssemblyRef", table(T::AssemblyRef)),
];

static FILE: [Column; 3] = [col("Flags", U32), col("Name", STR), col("HashValue", BLOB)];

static EXPORTED_TYPE: [Column; 5] = [
    col("Flags", U32),
    col("TypeDefId", U32),
    col("TypeName", STR),
    col("TypeNamespace", STR),
    col("Implementation", coded(C::Implementation)),
];

static MANIFEST_RESOURCE: [Column; 4] = [
    col("Offset", U32),
    col("Flags", U32),
    col("Name", STR),
    col("Implementation", coded(C::Implementation)),
];

static NESTED_CLASS: [Column; 2] = [
    col("NestedClass", table(T::TypeDef)),
    col("EnclosingClass", table(T::TypeDef)),
];

static GENERIC_PARAM: [Column; 4] = [
    col("Number", U16),
    col("Flags", U16),
    col("Owner", coded(C::TypeOrMethodDef)),
    col("Name", STR),
];

static METHOD_SPEC: [Column; 2] = [
    col("Method", coded(C::MethodDefOrRef)),
    col("Instantiation", BLOB),
];

static GENERIC_PARAM_CONSTRAINT: [Column; 2] = [
    col("Owner", table(T::GenericParam)),
    col("Constraint", coded(C::TypeDefOrRef)),
];

/// The schema of `id`.
#[must_use]
pub fn schema(id: TableId) -> TableSchema {
    let columns: &'static [Column] = match id {
        T::Module => &MODULE,
        T::TypeRef => &TYPE_REF,
        T::TypeDef => &TYPE_DEF,
        T::FieldPtr => &FIELD_PTR,
        T::Field => &FIELD,
        T::MethodPtr => &METHOD_PTR,
        T::MethodDef => &METHOD_DEF,
        T::ParamPtr => &PARAM_PTR,
        T::Param => &PARAM,
        T::InterfaceImpl => &INTERFACE_IMPL,
        T::MemberRef => &MEMBER_REF,
        T::Constant => &CONSTANT,
        T::CustomAttribute => &CUSTOM_ATTRIBUTE,
        T::FieldMarshal => &FIELD_MARSHAL,
        T::DeclSecurity => &DECL_SECURITY,
        T::ClassLayout => &CLASS_LAYOUT,
        T::FieldLayout => &FIELD_LAYOUT,
        T::StandAloneSig => &STAND_ALONE_SIG,
        T::EventMap => &EVENT_MAP,
        T::EventPtr => &EVENT_PTR,
        T::Event => &EVENT,
        T::PropertyMap => &PROPERTY_MAP,
        T::PropertyPtr => &PROPERTY_PTR,
        T::Property => &PROPERTY,
        T::MethodSemantics => &METHOD_SEMANTICS,
        T::MethodImpl => &METHOD_IMPL,
        T::ModuleRef => &MODULE_REF,
        T::TypeSpec => &TYPE_SPEC,
        T::ImplMap => &IMPL_MAP,
        T::FieldRVA => &FIELD_RVA,
        T::EncLog => &ENC_LOG,
        T::EncMap => &ENC_MAP,
        T::Assembly => &ASSEMBLY,
        T::AssemblyProcessor => &ASSEMBLY_PROCESSOR,
        T::AssemblyOS => &ASSEMBLY_OS,
        T::AssemblyRef => &ASSEMBLY_REF,
        T::AssemblyRefProcessor => &ASSEMBLY_REF_PROCESSOR,
        T::AssemblyRefOS => &ASSEMBLY_REF_OS,
        T::File => &FILE,
        T::ExportedType => &EXPORTED_TYPE,
        T::ManifestResource => &MANIFEST_RESOURCE,
        T::NestedClass => &NESTED_CLASS,
        T::GenericParam => &GENERIC_PARAM,
        T::MethodSpec => &METHOD_SPEC,
        T::GenericParamConstraint => &GENERIC_PARAM_CONSTRAINT,
    };

    TableSchema { id, columns }
}
