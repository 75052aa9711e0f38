//! C++ types as seen by the query layer.
//!
//! Types live in a per-translation-unit table and are handed out as
//! [`Type`] handles. Spellings follow the conventions of clang's type
//! printer (`int *`, `const char[6]`, `int (int, char)`) so that editor
//! output matches what a compiler-backed tool would show.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::cursor::Cursor;
use crate::unit::{NodeId, TranslationUnit};

/// Kind of a type, named after libclang's `CXTypeKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// No type could be computed.
    Invalid,
    /// A type the front end does not model structurally.
    Unexposed,
    /// `void`.
    Void,
    /// `bool`.
    Bool,
    /// Plain `char`.
    CharS,
    /// `signed char`.
    SChar,
    /// `unsigned char`.
    UChar,
    /// `wchar_t`.
    WChar,
    /// `char16_t`.
    Char16,
    /// `char32_t`.
    Char32,
    /// `short`.
    Short,
    /// `unsigned short`.
    UShort,
    /// `int`.
    Int,
    /// `unsigned int`.
    UInt,
    /// `long`.
    Long,
    /// `unsigned long`.
    ULong,
    /// `long long`.
    LongLong,
    /// `unsigned long long`.
    ULongLong,
    /// `float`.
    Float,
    /// `double`.
    Double,
    /// `long double`.
    LongDouble,
    /// `std::nullptr_t`.
    NullPtr,
    /// `T *`.
    Pointer,
    /// `T &`.
    LValueReference,
    /// `T &&`.
    RValueReference,
    /// Class, struct or union.
    Record,
    /// Enumeration.
    Enum,
    /// Typedef or alias name.
    Typedef,
    /// Function type with a prototype.
    FunctionProto,
    /// `T[N]`.
    ConstantArray,
    /// `T[]`.
    IncompleteArray,
    /// Placeholder (`auto`, `decltype(auto)`) awaiting deduction.
    Auto,
}

impl TypeKind {
    /// libclang's name for this kind.
    #[must_use]
    pub const fn spelling(self) -> &'static str {
        match self {
            Self::Invalid => "Invalid",
            Self::Unexposed => "Unexposed",
            Self::Void => "Void",
            Self::Bool => "Bool",
            Self::CharS => "Char_S",
            Self::SChar => "SChar",
            Self::UChar => "UChar",
            Self::WChar => "WChar",
            Self::Char16 => "Char16",
            Self::Char32 => "Char32",
            Self::Short => "Short",
            Self::UShort => "UShort",
            Self::Int => "Int",
            Self::UInt => "UInt",
            Self::Long => "Long",
            Self::ULong => "ULong",
            Self::LongLong => "LongLong",
            Self::ULongLong => "ULongLong",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::LongDouble => "LongDouble",
            Self::NullPtr => "NullPtr",
            Self::Pointer => "Pointer",
            Self::LValueReference => "LValueReference",
            Self::RValueReference => "RValueReference",
            Self::Record => "Record",
            Self::Enum => "Enum",
            Self::Typedef => "Typedef",
            Self::FunctionProto => "FunctionProto",
            Self::ConstantArray => "ConstantArray",
            Self::IncompleteArray => "IncompleteArray",
            Self::Auto => "Auto",
        }
    }

    /// Source spelling of a builtin kind, `None` for compound kinds.
    #[must_use]
    pub const fn builtin_spelling(self) -> Option<&'static str> {
        Some(match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::CharS => "char",
            Self::SChar => "signed char",
            Self::UChar => "unsigned char",
            Self::WChar => "wchar_t",
            Self::Char16 => "char16_t",
            Self::Char32 => "char32_t",
            Self::Short => "short",
            Self::UShort => "unsigned short",
            Self::Int => "int",
            Self::UInt => "unsigned int",
            Self::Long => "long",
            Self::ULong => "unsigned long",
            Self::LongLong => "long long",
            Self::ULongLong => "unsigned long long",
            Self::Float => "float",
            Self::Double => "double",
            Self::LongDouble => "long double",
            Self::NullPtr => "std::nullptr_t",
            _ => return None,
        })
    }

    /// Returns true for `bool`, character and integer kinds.
    #[must_use]
    pub const fn is_integral(self) -> bool {
        self.integer_rank().is_some()
    }

    /// Returns true for `float`, `double` and `long double`.
    #[must_use]
    pub const fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double | Self::LongDouble)
    }

    /// Returns true for integral and floating kinds.
    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        self.is_integral() || self.is_floating()
    }

    /// Returns true for unsigned integer kinds.
    #[must_use]
    pub const fn is_unsigned(self) -> bool {
        matches!(
            self,
            Self::Bool | Self::UChar | Self::UShort | Self::UInt | Self::ULong | Self::ULongLong
        )
    }

    /// Integer conversion rank; `None` for non-integral kinds.
    pub(crate) const fn integer_rank(self) -> Option<u8> {
        Some(match self {
            Self::Bool => 0,
            Self::CharS | Self::SChar | Self::UChar => 1,
            Self::Short | Self::UShort => 2,
            Self::WChar | Self::Char16 | Self::Char32 | Self::Int | Self::UInt => 3,
            Self::Long | Self::ULong => 4,
            Self::LongLong | Self::ULongLong => 5,
            _ => return None,
        })
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}

/// Index into a translation unit's type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TypeId(pub(crate) u32);

impl TypeId {
    pub(crate) const INVALID: Self = Self(0);

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TypeData {
    pub(crate) kind: TypeKind,
    pub(crate) spelling: String,
    pub(crate) is_const: bool,
    /// `None` when the type is its own canonical type.
    pub(crate) canonical: Option<TypeId>,
    /// Pointer/reference target or array element.
    pub(crate) pointee: Option<TypeId>,
    pub(crate) result: Option<TypeId>,
    pub(crate) params: Vec<TypeId>,
    pub(crate) declaration: Option<NodeId>,
    pub(crate) array_size: Option<u64>,
}

impl TypeData {
    fn new(kind: TypeKind, spelling: impl Into<String>) -> Self {
        Self {
            kind,
            spelling: spelling.into(),
            is_const: false,
            canonical: None,
            pointee: None,
            result: None,
            params: Vec::new(),
            declaration: None,
            array_size: None,
        }
    }
}

/// Arena of every type mentioned in a translation unit.
#[derive(Debug, Clone)]
pub(crate) struct TypeTable {
    types: Vec<TypeData>,
    builtins: FxHashMap<(TypeKind, bool), TypeId>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub(crate) fn new() -> Self {
        Self {
            types: vec![TypeData::new(TypeKind::Invalid, "")],
            builtins: FxHashMap::default(),
        }
    }

    pub(crate) fn get(&self, id: TypeId) -> &TypeData {
        &self.types[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: TypeId) -> &mut TypeData {
        &mut self.types[id.index()]
    }

    pub(crate) fn kind(&self, id: TypeId) -> TypeKind {
        self.get(id).kind
    }

    pub(crate) fn spelling(&self, id: TypeId) -> &str {
        &self.get(id).spelling
    }

    fn push(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(data);
        id
    }

    pub(crate) fn canonical(&self, id: TypeId) -> TypeId {
        self.get(id).canonical.unwrap_or(id)
    }

    pub(crate) fn canonical_kind(&self, id: TypeId) -> TypeKind {
        self.kind(self.canonical(id))
    }

    pub(crate) fn builtin(&mut self, kind: TypeKind) -> TypeId {
        self.builtin_qualified(kind, false)
    }

    fn builtin_qualified(&mut self, kind: TypeKind, is_const: bool) -> TypeId {
        if let Some(id) = self.builtins.get(&(kind, is_const)) {
            return *id;
        }
        let base = kind.builtin_spelling().unwrap_or_default();
        let mut data = TypeData::new(kind, const_prefixed(base, is_const));
        data.is_const = is_const;
        let id = self.push(data);
        self.builtins.insert((kind, is_const), id);
        id
    }

    pub(crate) fn unexposed(&mut self, spelling: impl Into<String>) -> TypeId {
        self.push(TypeData::new(TypeKind::Unexposed, spelling))
    }

    pub(crate) fn placeholder(&mut self, spelling: impl Into<String>) -> TypeId {
        self.push(TypeData::new(TypeKind::Auto, spelling))
    }

    /// A record or enum type as written, canonicalized to its qualified name.
    pub(crate) fn tagged(
        &mut self,
        kind: TypeKind,
        written: &str,
        qualified: &str,
        declaration: NodeId,
    ) -> TypeId {
        let canonical = (written != qualified).then(|| {
            let mut data = TypeData::new(kind, qualified);
            data.declaration = Some(declaration);
            self.push(data)
        });
        let mut data = TypeData::new(kind, written);
        data.canonical = canonical;
        data.declaration = Some(declaration);
        self.push(data)
    }

    /// A typedef/alias name; its canonical type is the underlying canonical type.
    pub(crate) fn typedef(
        &mut self,
        written: &str,
        declaration: Option<NodeId>,
        underlying: TypeId,
    ) -> TypeId {
        let mut data = TypeData::new(TypeKind::Typedef, written);
        data.canonical = Some(self.canonical(underlying));
        data.declaration = declaration;
        self.push(data)
    }

    pub(crate) fn pointer_to(&mut self, pointee: TypeId, is_const: bool) -> TypeId {
        let spelling = self.pointer_spelling(pointee, is_const);
        let canonical_pointee = self.canonical(pointee);
        let canonical = (canonical_pointee != pointee).then(|| {
            let spelling = self.pointer_spelling(canonical_pointee, is_const);
            let mut data = TypeData::new(TypeKind::Pointer, spelling);
            data.pointee = Some(canonical_pointee);
            data.is_const = is_const;
            self.push(data)
        });
        let mut data = TypeData::new(TypeKind::Pointer, spelling);
        data.pointee = Some(pointee);
        data.is_const = is_const;
        data.canonical = canonical;
        self.push(data)
    }

    fn pointer_spelling(&self, pointee: TypeId, is_const: bool) -> String {
        let target = self.get(pointee);
        let mut spelling = if target.kind == TypeKind::FunctionProto {
            let result = target.result.map_or("", |result| self.spelling(result));
            format!("{result} (*)({})", self.param_list(&target.params))
        } else {
            declarator_suffixed(&target.spelling, "*")
        };
        if is_const {
            spelling.push_str("const");
        }
        spelling
    }

    pub(crate) fn reference_to(&mut self, pointee: TypeId, rvalue: bool) -> TypeId {
        let (kind, token) = if rvalue {
            (TypeKind::RValueReference, "&&")
        } else {
            (TypeKind::LValueReference, "&")
        };
        let canonical_pointee = self.canonical(pointee);
        let canonical = (canonical_pointee != pointee).then(|| {
            let spelling = declarator_suffixed(self.spelling(canonical_pointee), token);
            let mut data = TypeData::new(kind, spelling);
            data.pointee = Some(canonical_pointee);
            self.push(data)
        });
        let mut data = TypeData::new(kind, declarator_suffixed(self.spelling(pointee), token));
        data.pointee = Some(pointee);
        data.canonical = canonical;
        self.push(data)
    }

    pub(crate) fn array_of(&mut self, element: TypeId, size: Option<u64>) -> TypeId {
        let canonical_element = self.canonical(element);
        let canonical = (canonical_element != element).then(|| {
            let data = self.array_data(canonical_element, size);
            self.push(data)
        });
        let mut data = self.array_data(element, size);
        data.canonical = canonical;
        self.push(data)
    }

    fn array_data(&self, element: TypeId, size: Option<u64>) -> TypeData {
        let bounds = size.map_or_else(String::new, |size| size.to_string());
        let kind = if size.is_some() {
            TypeKind::ConstantArray
        } else {
            TypeKind::IncompleteArray
        };
        let mut data = TypeData::new(kind, format!("{}[{bounds}]", self.spelling(element)));
        data.pointee = Some(element);
        data.array_size = size;
        data.is_const = self.get(element).is_const;
        data
    }

    pub(crate) fn function(
        &mut self,
        result: TypeId,
        params: Vec<TypeId>,
        is_const: bool,
    ) -> TypeId {
        let canonical_result = self.canonical(result);
        let canonical_params: Vec<TypeId> =
            params.iter().map(|param| self.canonical(*param)).collect();
        let canonical = (canonical_result != result || canonical_params != params).then(|| {
            let data = self.function_data(canonical_result, canonical_params, is_const);
            self.push(data)
        });
        let mut data = self.function_data(result, params, is_const);
        data.canonical = canonical;
        self.push(data)
    }

    fn function_data(&self, result: TypeId, params: Vec<TypeId>, is_const: bool) -> TypeData {
        let mut spelling = format!("{} ({})", self.spelling(result), self.param_list(&params));
        if is_const {
            spelling.push_str(" const");
        }
        let mut data = TypeData::new(TypeKind::FunctionProto, spelling);
        data.result = Some(result);
        data.params = params;
        data
    }

    fn param_list(&self, params: &[TypeId]) -> String {
        params
            .iter()
            .map(|param| self.spelling(*param))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Adds a top-level `const`.
    pub(crate) fn with_const(&mut self, id: TypeId) -> TypeId {
        let (kind, is_const, canonical, pointee) = self.parts(id);
        if is_const
            || matches!(
                kind,
                TypeKind::Invalid | TypeKind::LValueReference | TypeKind::RValueReference
            )
        {
            return id;
        }
        if kind.builtin_spelling().is_some() && canonical.is_none() {
            return self.builtin_qualified(kind, true);
        }
        if kind == TypeKind::Pointer {
            return self.pointer_to(pointee.unwrap_or(TypeId::INVALID), true);
        }
        let mut data = self.get(id).clone();
        data.spelling = const_prefixed(&data.spelling, true);
        data.is_const = true;
        data.canonical = canonical.map(|canonical| self.with_const(canonical));
        self.push(data)
    }

    /// Removes a top-level `const`.
    pub(crate) fn without_const(&mut self, id: TypeId) -> TypeId {
        let (kind, is_const, canonical, pointee) = self.parts(id);
        if !is_const || matches!(kind, TypeKind::ConstantArray | TypeKind::IncompleteArray) {
            return id;
        }
        if kind.builtin_spelling().is_some() && canonical.is_none() {
            return self.builtin(kind);
        }
        if kind == TypeKind::Pointer {
            return self.pointer_to(pointee.unwrap_or(TypeId::INVALID), false);
        }
        let mut data = self.get(id).clone();
        if let Some(stripped) = data.spelling.strip_prefix("const ") {
            data.spelling = stripped.to_owned();
        }
        data.is_const = false;
        data.canonical = canonical.map(|canonical| self.without_const(canonical));
        self.push(data)
    }

    /// Array-to-pointer and function-to-pointer decay, then lvalue-to-rvalue.
    pub(crate) fn decay(&mut self, id: TypeId) -> TypeId {
        let (kind, _, _, pointee) = self.parts(id);
        match kind {
            TypeKind::ConstantArray | TypeKind::IncompleteArray => {
                self.pointer_to(pointee.unwrap_or(TypeId::INVALID), false)
            }
            TypeKind::FunctionProto => self.pointer_to(id, false),
            _ => self.without_const(id),
        }
    }

    fn parts(&self, id: TypeId) -> (TypeKind, bool, Option<TypeId>, Option<TypeId>) {
        let data = self.get(id);
        (data.kind, data.is_const, data.canonical, data.pointee)
    }

    /// Strips references, returning the referenced type.
    pub(crate) fn non_reference(&self, id: TypeId) -> TypeId {
        let data = self.get(id);
        match data.kind {
            TypeKind::LValueReference | TypeKind::RValueReference => {
                data.pointee.unwrap_or(TypeId::INVALID)
            }
            _ => id,
        }
    }
}

fn const_prefixed(spelling: &str, is_const: bool) -> String {
    if is_const {
        format!("const {spelling}")
    } else {
        spelling.to_owned()
    }
}

fn declarator_suffixed(base: &str, token: &str) -> String {
    if base.ends_with('*') || base.ends_with('&') {
        format!("{base}{token}")
    } else {
        format!("{base} {token}")
    }
}

/// A type of a translation unit.
#[derive(Clone, Copy)]
pub struct Type<'tu> {
    unit: &'tu TranslationUnit,
    id: TypeId,
}

impl<'tu> Type<'tu> {
    pub(crate) fn new(unit: &'tu TranslationUnit, id: TypeId) -> Self {
        Self { unit, id }
    }

    fn data(&self) -> &'tu TypeData {
        self.unit.types.get(self.id)
    }

    /// Kind of the type.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.data().kind
    }

    /// Spelling as written (typedef names and qualifiers preserved).
    #[must_use]
    pub fn spelling(&self) -> &'tu str {
        &self.data().spelling
    }

    /// Returns false for [`TypeKind::Invalid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.kind() != TypeKind::Invalid
    }

    /// The type with every typedef resolved and records fully qualified.
    #[must_use]
    pub fn canonical(&self) -> Type<'tu> {
        Self::new(self.unit, self.unit.types.canonical(self.id))
    }

    /// Target of a pointer or reference.
    #[must_use]
    pub fn pointee(&self) -> Option<Type<'tu>> {
        match self.kind() {
            TypeKind::Pointer | TypeKind::LValueReference | TypeKind::RValueReference => {
                self.data().pointee.map(|id| Self::new(self.unit, id))
            }
            _ => None,
        }
    }

    /// Element type of an array.
    #[must_use]
    pub fn array_element(&self) -> Option<Type<'tu>> {
        match self.kind() {
            TypeKind::ConstantArray | TypeKind::IncompleteArray => {
                self.data().pointee.map(|id| Self::new(self.unit, id))
            }
            _ => None,
        }
    }

    /// Result type of a function type; invalid for every other kind.
    #[must_use]
    pub fn result_type(&self) -> Type<'tu> {
        Self::new(self.unit, self.data().result.unwrap_or(TypeId::INVALID))
    }

    /// Parameter types of a function type.
    pub fn argument_types(&self) -> impl Iterator<Item = Type<'tu>> + 'tu {
        let unit = self.unit;
        self.data().params.iter().map(move |id| Type::new(unit, *id))
    }

    /// Declaration of a record, enum, typedef or template parameter type.
    #[must_use]
    pub fn declaration(&self) -> Option<Cursor<'tu>> {
        self.data().declaration.map(|id| Cursor::new(self.unit, id))
    }

    /// Returns true when the type carries a top-level `const`.
    #[must_use]
    pub fn is_const_qualified(&self) -> bool {
        self.data().is_const
    }

    /// Number of elements of a constant array.
    #[must_use]
    pub fn array_size(&self) -> Option<u64> {
        self.data().array_size
    }
}

impl PartialEq for Type<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.unit, other.unit) && self.id == other.id
    }
}

impl Eq for Type<'_> {}

impl fmt::Debug for Type<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Type")
            .field("kind", &self.kind())
            .field("spelling", &self.spelling())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_spellings_follow_clang() {
        let mut table = TypeTable::new();
        let int = table.builtin(TypeKind::Int);
        let pointer = table.pointer_to(int, false);
        let double_pointer = table.pointer_to(pointer, false);
        let const_pointer = table.pointer_to(int, true);
        assert_eq!(table.spelling(pointer), "int *");
        assert_eq!(table.spelling(double_pointer), "int **");
        assert_eq!(table.spelling(const_pointer), "int *const");
    }

    #[test]
    fn const_is_added_and_dropped_at_top_level() {
        let mut table = TypeTable::new();
        let char_type = table.builtin(TypeKind::CharS);
        let const_char = table.with_const(char_type);
        let string = table.array_of(const_char, Some(6));
        assert_eq!(table.spelling(const_char), "const char");
        assert_eq!(table.spelling(string), "const char[6]");
        let decayed = table.decay(string);
        assert_eq!(table.spelling(decayed), "const char *");
        assert_eq!(table.without_const(const_char), char_type);
    }

    #[test]
    fn function_types_list_parameters() {
        let mut table = TypeTable::new();
        let int = table.builtin(TypeKind::Int);
        let char_type = table.builtin(TypeKind::CharS);
        let function = table.function(int, vec![int, char_type], false);
        let pointer = table.pointer_to(function, false);
        assert_eq!(table.spelling(function), "int (int, char)");
        assert_eq!(table.spelling(pointer), "int (*)(int, char)");
    }

    #[test]
    fn typedefs_canonicalize_to_their_target() {
        let mut table = TypeTable::new();
        let ulong = table.builtin(TypeKind::ULong);
        let size = table.typedef("size_t", None, ulong);
        assert_eq!(table.kind(size), TypeKind::Typedef);
        assert_eq!(table.canonical(size), ulong);
        let reference = table.reference_to(size, false);
        assert_eq!(table.spelling(reference), "size_t &");
        assert_eq!(table.spelling(table.canonical(reference)), "unsigned long &");
    }
}
