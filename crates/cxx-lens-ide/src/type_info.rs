//! Serializable description of a type.

use cxx_lens_hir::{Type, TypeKind};
use serde::Serialize;

use crate::current_function::qualified_name;

/// Fields describing one type.
///
/// Only `type` and `type_kind` are always present; the other fields appear
/// for the kinds they apply to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeInfo {
    /// Spelling as written.
    #[serde(rename = "type")]
    pub spelling: String,
    /// libclang name of the kind.
    pub type_kind: &'static str,
    /// Present (and true) for const-qualified types.
    #[serde(rename = "const", skip_serializing_if = "std::ops::Not::not")]
    pub is_const: bool,
    /// Target of pointers and references.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointee: Option<String>,
    /// Result of function types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Element count of constant arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Qualified name of the declaring record, enum or typedef.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration: Option<String>,
}

impl TypeInfo {
    /// Describes `ty`.
    #[must_use]
    pub fn new(ty: &Type<'_>) -> Self {
        let kind = ty.kind();
        let result =
            (kind == TypeKind::FunctionProto).then(|| ty.result_type().spelling().to_owned());
        let size = if kind == TypeKind::ConstantArray { ty.array_size() } else { None };
        let declaration = match kind {
            TypeKind::Record | TypeKind::Enum | TypeKind::Typedef => {
                ty.declaration().map(qualified_name)
            }
            _ => None,
        };
        Self {
            spelling: ty.spelling().to_owned(),
            type_kind: kind.spelling(),
            is_const: ty.is_const_qualified(),
            pointee: ty.pointee().map(|pointee| pointee.spelling().to_owned()),
            result,
            size,
            declaration,
        }
    }
}

/// A deduced type together with its canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeducedType {
    /// The deduced type.
    #[serde(flatten)]
    pub deduced: TypeInfo,
    /// The deduced type with aliases resolved.
    pub canonical: TypeInfo,
}

impl DeducedType {
    /// Describes `ty` and its canonical type.
    #[must_use]
    pub fn new(ty: &Type<'_>) -> Self {
        Self {
            deduced: TypeInfo::new(ty),
            canonical: TypeInfo::new(&ty.canonical()),
        }
    }
}
