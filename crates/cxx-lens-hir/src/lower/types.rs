//! Type specifiers and declarators.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use tree_sitter::Node;

use super::{named_children, normalize_spelling, Builder, FileCtx};
use crate::cursor::CursorKind;
use crate::types::{TypeId, TypeKind};
use crate::unit::NodeId;

#[derive(Debug, Clone, Copy)]
enum Primitive {
    Builtin(TypeKind),
    /// A standard typedef the grammar treats as a keyword (`size_t`).
    Alias(TypeKind),
}

static PRIMITIVES: Lazy<FxHashMap<&'static str, Primitive>> = Lazy::new(|| {
    use Primitive::{Alias, Builtin};
    [
        ("void", Builtin(TypeKind::Void)),
        ("bool", Builtin(TypeKind::Bool)),
        ("char", Builtin(TypeKind::CharS)),
        ("int", Builtin(TypeKind::Int)),
        ("float", Builtin(TypeKind::Float)),
        ("double", Builtin(TypeKind::Double)),
        ("short", Builtin(TypeKind::Short)),
        ("long", Builtin(TypeKind::Long)),
        ("signed", Builtin(TypeKind::Int)),
        ("unsigned", Builtin(TypeKind::UInt)),
        ("wchar_t", Builtin(TypeKind::WChar)),
        ("char8_t", Builtin(TypeKind::UChar)),
        ("char16_t", Builtin(TypeKind::Char16)),
        ("char32_t", Builtin(TypeKind::Char32)),
        ("size_t", Alias(TypeKind::ULong)),
        ("ssize_t", Alias(TypeKind::Long)),
        ("ptrdiff_t", Alias(TypeKind::Long)),
        ("intptr_t", Alias(TypeKind::Long)),
        ("uintptr_t", Alias(TypeKind::ULong)),
        ("max_align_t", Alias(TypeKind::LongDouble)),
        ("nullptr_t", Alias(TypeKind::NullPtr)),
        ("int8_t", Alias(TypeKind::SChar)),
        ("int16_t", Alias(TypeKind::Short)),
        ("int32_t", Alias(TypeKind::Int)),
        ("int64_t", Alias(TypeKind::Long)),
        ("uint8_t", Alias(TypeKind::UChar)),
        ("uint16_t", Alias(TypeKind::UShort)),
        ("uint32_t", Alias(TypeKind::UInt)),
        ("uint64_t", Alias(TypeKind::ULong)),
    ]
    .into_iter()
    .collect()
});

/// Node kinds that name the entity a declarator declares.
pub(super) fn is_declarator_name(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "field_identifier"
            | "type_identifier"
            | "qualified_identifier"
            | "destructor_name"
            | "operator_name"
            | "template_function"
            | "operator_cast"
    )
}

/// The nested declarator of a declarator node.
pub(super) fn inner_declarator(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("declarator").or_else(|| {
        named_children(node).into_iter().find(|child| {
            !matches!(
                child.kind(),
                "type_qualifier"
                    | "attribute_declaration"
                    | "attribute_specifier"
                    | "ms_pointer_modifier"
            )
        })
    })
}

/// The name a declarator introduces.
pub(super) fn declarator_name(node: Node<'_>) -> Option<Node<'_>> {
    if is_declarator_name(node.kind()) {
        return Some(node);
    }
    match node.kind() {
        "pointer_declarator"
        | "reference_declarator"
        | "array_declarator"
        | "function_declarator"
        | "parenthesized_declarator"
        | "attributed_declarator"
        | "init_declarator" => inner_declarator(node).and_then(declarator_name),
        _ => None,
    }
}

/// The function declarator directly applied to the declared name, if the
/// declarator declares a function (rather than, say, a function pointer).
pub(super) fn function_declarator(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "function_declarator" => {
            let inner = node.child_by_field_name("declarator")?;
            if is_declarator_name(inner.kind()) {
                Some(node)
            } else if inner.kind() == "parenthesized_declarator" {
                None
            } else {
                function_declarator(inner)
            }
        }
        "pointer_declarator"
        | "reference_declarator"
        | "attributed_declarator"
        | "init_declarator" => {
            inner_declarator(node).and_then(function_declarator)
        }
        _ => None,
    }
}

/// Result of applying a declarator to a base type.
pub(super) struct Declarated<'t> {
    pub(super) name: Option<Node<'t>>,
    pub(super) ty: TypeId,
}

impl Builder<'_> {
    pub(super) fn has_const(&self, file: &FileCtx, node: Node<'_>) -> bool {
        named_children(node).into_iter().any(|child| {
            child.kind() == "type_qualifier" && matches!(file.text_of(child), "const" | "constexpr")
        })
    }

    /// Type named by the `type` field of `decl`, with its qualifiers.
    pub(super) fn specifier_type(&mut self, file: &FileCtx, decl: Node<'_>, refs: bool) -> TypeId {
        let Some(spec) = decl.child_by_field_name("type") else {
            return TypeId::INVALID;
        };
        let base = self.type_specifier(file, spec, refs);
        if self.has_const(file, decl) {
            self.unit.types.with_const(base)
        } else {
            base
        }
    }

    pub(super) fn type_specifier(&mut self, file: &FileCtx, spec: Node<'_>, refs: bool) -> TypeId {
        match spec.kind() {
            "primitive_type" => self.primitive_type(file.text_of(spec)),
            "sized_type_specifier" => self.sized_type(file, spec),
            "placeholder_type_specifier" | "auto" => {
                let spelling = if file.text_of(spec).contains("decltype") {
                    "decltype(auto)"
                } else {
                    "auto"
                };
                self.unit.types.placeholder(spelling)
            }
            "type_identifier" => {
                let written = file.text_of(spec).to_owned();
                self.named_type(file, spec, None, &written, refs)
            }
            "qualified_identifier" => self.qualified_type(file, spec, refs),
            "template_type" => self.template_type(file, spec, None, refs),
            "struct_specifier" | "class_specifier" | "union_specifier" | "enum_specifier" => {
                self.tag_type(file, spec, refs)
            }
            "decltype" => self.decltype_type(file, spec, refs),
            "type_descriptor" => self.type_descriptor(file, spec, refs),
            _ => {
                let spelling = normalize_spelling(file.text_of(spec));
                self.unit.types.unexposed(spelling)
            }
        }
    }

    pub(super) fn primitive_type(&mut self, text: &str) -> TypeId {
        match PRIMITIVES.get(text) {
            Some(Primitive::Builtin(kind)) => self.unit.types.builtin(*kind),
            Some(Primitive::Alias(kind)) => {
                let target = self.unit.types.builtin(*kind);
                self.unit.types.typedef(text, None, target)
            }
            None => self.unit.types.unexposed(text),
        }
    }

    fn sized_type(&mut self, file: &FileCtx, spec: Node<'_>) -> TypeId {
        let mut cursor = spec.walk();
        let (mut unsigned, mut signed, mut short, mut longs) = (false, false, false, 0);
        for child in spec.children(&mut cursor) {
            match child.kind() {
                "unsigned" => unsigned = true,
                "signed" => signed = true,
                "short" => short = true,
                "long" => longs += 1,
                _ => {}
            }
        }
        let base = spec.child_by_field_name("type").map(|node| file.text_of(node));
        let kind = match base {
            Some("char") if unsigned => TypeKind::UChar,
            Some("char") if signed => TypeKind::SChar,
            Some("char") => TypeKind::CharS,
            Some("double") if longs > 0 => TypeKind::LongDouble,
            Some("double") => TypeKind::Double,
            Some("float") => TypeKind::Float,
            _ => match (short, longs, unsigned) {
                (true, _, false) => TypeKind::Short,
                (true, _, true) => TypeKind::UShort,
                (false, 0, false) => TypeKind::Int,
                (false, 0, true) => TypeKind::UInt,
                (false, 1, false) => TypeKind::Long,
                (false, 1, true) => TypeKind::ULong,
                (false, _, false) => TypeKind::LongLong,
                (false, _, true) => TypeKind::ULongLong,
            },
        };
        self.unit.types.builtin(kind)
    }

    /// Resolves a type name, in `container` when qualified.
    pub(super) fn named_type(
        &mut self,
        file: &FileCtx,
        name_node: Node<'_>,
        container: Option<NodeId>,
        written: &str,
        refs: bool,
    ) -> TypeId {
        let name = file.text_of(name_node);
        let decl = self.lookup_type_name(name, container);
        let Some(decl) = decl else {
            if container.is_none() && PRIMITIVES.contains_key(name) {
                return self.primitive_type(name);
            }
            return self.unit.types.unexposed(normalize_spelling(written));
        };
        let ty = self.type_for_decl(decl, &normalize_spelling(written));
        if refs {
            self.type_ref(file, name_node, decl, ty);
        }
        ty
    }

    pub(super) fn lookup_type_name(&self, name: &str, container: Option<NodeId>) -> Option<NodeId> {
        let candidates = match container {
            Some(container) => self.unit.scopes.lookup_member(container, name),
            None => {
                // The injected class name of an enclosing record.
                if let Some(record) = self
                    .scopes
                    .containers()
                    .find(|id| {
                        self.unit.node(*id).kind.is_record() && self.unit.node(*id).spelling == name
                    })
                {
                    return Some(record);
                }
                self.scopes.lookup(&self.unit.scopes, name)
            }
        };
        candidates
            .into_iter()
            .find(|id| self.unit.node(*id).kind.is_type_declaration())
    }

    /// The type a declaration introduces, spelled as `written`.
    pub(super) fn type_for_decl(&mut self, decl: NodeId, written: &str) -> TypeId {
        let kind = self.unit.node(decl).kind;
        let canonical = self.canonical(decl);
        match kind {
            kind if kind.is_record() => {
                let qualified = self.qualified_name(canonical);
                self.unit
                    .types
                    .tagged(TypeKind::Record, written, &qualified, canonical)
            }
            CursorKind::EnumDecl => {
                let qualified = self.qualified_name(canonical);
                self.unit
                    .types
                    .tagged(TypeKind::Enum, written, &qualified, canonical)
            }
            CursorKind::TypedefDecl | CursorKind::TypeAliasDecl => {
                let underlying = self
                    .unit
                    .typedef_underlying
                    .get(&decl)
                    .copied()
                    .unwrap_or(TypeId::INVALID);
                self.unit.types.typedef(written, Some(decl), underlying)
            }
            _ => {
                let ty = self.unit.types.unexposed(written);
                self.unit.types.get_mut(ty).declaration = Some(decl);
                ty
            }
        }
    }

    /// `N::M::S` style name of a declaration.
    pub(super) fn qualified_name(&self, decl: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(decl);
        while let Some(id) = current {
            let node = self.unit.node(id);
            match node.kind {
                CursorKind::TranslationUnit => break,
                CursorKind::Namespace if node.spelling.is_empty() => {
                    parts.push("(anonymous namespace)".to_owned());
                }
                kind if kind.is_function_like() => {}
                _ if node.spelling.is_empty() => parts.push("(anonymous)".to_owned()),
                _ => parts.push(node.spelling.to_string()),
            }
            current = node.semantic_parent;
        }
        parts.reverse();
        parts.join("::")
    }

    fn type_ref(&mut self, file: &FileCtx, name_node: Node<'_>, decl: NodeId, ty: TypeId) {
        let node = self.unit.node(decl);
        let keyword = match node.kind {
            CursorKind::StructDecl => Some("struct"),
            CursorKind::ClassDecl | CursorKind::ClassTemplate => Some("class"),
            CursorKind::UnionDecl => Some("union"),
            CursorKind::EnumDecl => Some("enum"),
            _ => None,
        };
        let spelling = match keyword {
            Some(keyword) => format!("{keyword} {}", self.qualified_name(self.canonical(decl))),
            None => node.spelling.to_string(),
        };
        let kind = if node.kind == CursorKind::ClassTemplate {
            CursorKind::TemplateRef
        } else {
            CursorKind::TypeRef
        };
        let id = self.add_node(kind, file, name_node);
        self.set_name(id, Some(name_node), spelling);
        let data = self.unit.node_mut(id);
        data.referenced = Some(decl);
        data.ty = ty;
    }

    /// Resolves the scopes of a qualified name, returning the innermost
    /// container (if every scope resolved) and the final name node.
    pub(super) fn resolve_scope<'t>(
        &mut self,
        file: &FileCtx,
        node: Node<'t>,
        refs: bool,
    ) -> (Option<NodeId>, Node<'t>) {
        let mut container = match node.child_by_field_name("scope") {
            None => Some(NodeId::ROOT),
            Some(scope) => self.scope_container(file, scope, None, refs),
        };
        let Some(mut name) = node.child_by_field_name("name") else {
            return (None, node);
        };
        while name.kind() == "qualified_identifier" {
            let scope = name.child_by_field_name("scope");
            container = match (container, scope) {
                (Some(outer), Some(scope)) => self.scope_container(file, scope, Some(outer), refs),
                _ => None,
            };
            match name.child_by_field_name("name") {
                Some(next) => name = next,
                None => break,
            }
        }
        (container, name)
    }

    fn scope_container(
        &mut self,
        file: &FileCtx,
        scope: Node<'_>,
        within: Option<NodeId>,
        refs: bool,
    ) -> Option<NodeId> {
        let name_node = if scope.kind() == "template_type" {
            scope.child_by_field_name("name")?
        } else {
            scope
        };
        let name = file.text_of(name_node);
        let candidates = match within {
            Some(container) => self.unit.scopes.lookup_member(container, name),
            None => self.scopes.lookup(&self.unit.scopes, name),
        };
        let decl = candidates.into_iter().find_map(|id| {
            let node = self.unit.node(id);
            match node.kind {
                CursorKind::Namespace | CursorKind::EnumDecl => Some(id),
                kind if kind.is_record() => Some(id),
                CursorKind::TypedefDecl | CursorKind::TypeAliasDecl => {
                    let underlying = self.unit.typedef_underlying.get(&id)?;
                    let canonical = self.unit.types.canonical(*underlying);
                    self.unit.types.get(canonical).declaration
                }
                _ => None,
            }
        })?;
        if refs {
            let kind = if self.unit.node(decl).kind == CursorKind::Namespace {
                CursorKind::NamespaceRef
            } else {
                CursorKind::TypeRef
            };
            let id = self.add_node(kind, file, name_node);
            self.set_name(id, Some(name_node), name);
            self.unit.node_mut(id).referenced = Some(decl);
        }
        Some(self.canonical(decl))
    }

    fn qualified_type(&mut self, file: &FileCtx, spec: Node<'_>, refs: bool) -> TypeId {
        let written = normalize_spelling(file.text_of(spec));
        let (container, name) = self.resolve_scope(file, spec, refs);
        let Some(container) = container else {
            return self.unit.types.unexposed(written);
        };
        match name.kind() {
            "type_identifier" | "identifier" => {
                self.named_type(file, name, Some(container), &written, refs)
            }
            "template_type" => self.template_type(file, name, Some(container), refs),
            _ => self.unit.types.unexposed(written),
        }
    }

    fn template_type(
        &mut self,
        file: &FileCtx,
        spec: Node<'_>,
        container: Option<NodeId>,
        refs: bool,
    ) -> TypeId {
        let written = normalize_spelling(file.text_of(spec));
        if let Some(arguments) = spec.child_by_field_name("arguments") {
            if refs {
                for argument in named_children(arguments) {
                    if argument.kind() == "type_descriptor" {
                        self.type_descriptor(file, argument, true);
                    }
                }
            }
        }
        let decl = spec
            .child_by_field_name("name")
            .and_then(|name| {
                self.lookup_type_name(file.text_of(name), container)
                    .map(|decl| (name, decl))
            });
        let Some((name, decl)) = decl else {
            return self.unit.types.unexposed(written);
        };
        let ty = if self.unit.node(decl).kind.is_record() {
            let canonical = self.canonical(decl);
            let qualified = format!(
                "{}{}",
                self.qualified_name(canonical),
                written.find('<').map_or("", |start| &written[start..])
            );
            self.unit
                .types
                .tagged(TypeKind::Record, &written, &qualified, canonical)
        } else {
            self.type_for_decl(decl, &written)
        };
        if refs {
            self.type_ref(file, name, decl, ty);
        }
        ty
    }

    fn tag_type(&mut self, file: &FileCtx, spec: Node<'_>, refs: bool) -> TypeId {
        let keyword = match spec.kind() {
            "struct_specifier" => "struct",
            "class_specifier" => "class",
            "union_specifier" => "union",
            _ => "enum",
        };
        if let Some(decl) = self.tag_decls.get(&(file.id, spec.start_byte())).copied() {
            let name = self.unit.node(decl).spelling.clone();
            let written = if name.is_empty() {
                let location = self.unit.source_location(file.id, super::offset(spec.start_byte()));
                format!(
                    "{keyword} (anonymous {keyword} at {}:{}:{})",
                    location.file.display(),
                    location.line,
                    location.column
                )
            } else {
                format!("{keyword} {name}")
            };
            return self.type_for_decl(decl, &written);
        }
        let Some(name) = spec.child_by_field_name("name") else {
            return self.unit.types.unexposed(keyword);
        };
        let written = format!("{keyword} {}", normalize_spelling(file.text_of(name)));
        match name.kind() {
            "qualified_identifier" => {
                let (container, last) = self.resolve_scope(file, name, refs);
                match container {
                    Some(container) => self.named_type(file, last, Some(container), &written, refs),
                    None => self.unit.types.unexposed(written),
                }
            }
            "template_type" => self.template_type(file, name, None, refs),
            _ => self.named_type(file, name, None, &written, refs),
        }
    }

    fn decltype_type(&mut self, file: &FileCtx, spec: Node<'_>, refs: bool) -> TypeId {
        let spelling = normalize_spelling(file.text_of(spec));
        let ty = self.unit.types.unexposed(spelling);
        if refs {
            if let Some(expr) = named_children(spec).into_iter().next() {
                if let Some(lowered) = self.lower_expr(file, expr) {
                    self.decltypes.push((ty, lowered));
                }
            }
        }
        ty
    }

    pub(super) fn type_descriptor(&mut self, file: &FileCtx, node: Node<'_>, refs: bool) -> TypeId {
        if node.kind() != "type_descriptor" {
            return self.type_specifier(file, node, refs);
        }
        let base = self.specifier_type(file, node, refs);
        self.declarator(file, node.child_by_field_name("declarator"), base, refs)
            .ty
    }

    /// Applies a (possibly abstract) declarator to `base`.
    pub(super) fn declarator<'t>(
        &mut self,
        file: &FileCtx,
        node: Option<Node<'t>>,
        base: TypeId,
        refs: bool,
    ) -> Declarated<'t> {
        let Some(node) = node else {
            return Declarated { name: None, ty: base };
        };
        if is_declarator_name(node.kind()) {
            return Declarated {
                name: Some(node),
                ty: base,
            };
        }
        match node.kind() {
            "pointer_declarator" | "abstract_pointer_declarator" => {
                let is_const = self.has_const(file, node);
                let ty = self.unit.types.pointer_to(base, is_const);
                self.declarator(file, inner_declarator(node), ty, refs)
            }
            "reference_declarator" | "abstract_reference_declarator" => {
                let rvalue = super::has_token(node, "&&");
                let ty = self.unit.types.reference_to(base, rvalue);
                self.declarator(file, inner_declarator(node), ty, refs)
            }
            "array_declarator" | "abstract_array_declarator" => {
                let size = node
                    .child_by_field_name("size")
                    .and_then(|size| parse_integer(file.text_of(size)));
                let ty = self.unit.types.array_of(base, size);
                self.declarator(file, node.child_by_field_name("declarator"), ty, refs)
            }
            "function_declarator" | "abstract_function_declarator" => {
                let trailing = named_children(node)
                    .into_iter()
                    .find(|child| child.kind() == "trailing_return_type");
                let result = match trailing {
                    Some(trailing) if self.unit.types.kind(base) == TypeKind::Auto => {
                        match named_children(trailing).into_iter().next() {
                            Some(descriptor) => self.type_descriptor(file, descriptor, refs),
                            None => base,
                        }
                    }
                    _ => base,
                };
                let params = self.parameter_types(file, node.child_by_field_name("parameters"));
                let is_const = self.has_const(file, node);
                let ty = self.unit.types.function(result, params, is_const);
                self.declarator(file, node.child_by_field_name("declarator"), ty, refs)
            }
            "parenthesized_declarator"
            | "abstract_parenthesized_declarator"
            | "attributed_declarator"
            | "init_declarator" => self.declarator(file, inner_declarator(node), base, refs),
            _ => Declarated { name: None, ty: base },
        }
    }

    /// Parameter types of a parameter list, decayed as in a function type.
    pub(super) fn parameter_types(
        &mut self,
        file: &FileCtx,
        params: Option<Node<'_>>,
    ) -> Vec<TypeId> {
        let Some(params) = params else {
            return Vec::new();
        };
        let mut types = Vec::new();
        let children = named_children(params);
        for param in &children {
            if !matches!(
                param.kind(),
                "parameter_declaration" | "optional_parameter_declaration"
            ) {
                continue;
            }
            let base = self.specifier_type(file, *param, false);
            let declarator = param.child_by_field_name("declarator");
            if declarator.is_none()
                && children.len() == 1
                && self.unit.types.kind(base) == TypeKind::Void
            {
                break;
            }
            let ty = self.declarator(file, declarator, base, false).ty;
            let ty = match self.unit.types.kind(ty) {
                TypeKind::ConstantArray | TypeKind::IncompleteArray | TypeKind::FunctionProto => {
                    self.unit.types.decay(ty)
                }
                _ => ty,
            };
            types.push(ty);
        }
        types
    }
}

/// Value of an integer literal, ignoring suffixes and digit separators.
pub(super) fn parse_integer(text: &str) -> Option<u64> {
    let cleaned: String = text.chars().filter(|ch| *ch != '\'').collect();
    let trimmed = cleaned.trim_end_matches(['u', 'U', 'l', 'L', 'z', 'Z']);
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok();
    }
    if let Some(binary) = trimmed.strip_prefix("0b").or_else(|| trimmed.strip_prefix("0B")) {
        return u64::from_str_radix(binary, 2).ok();
    }
    if trimmed.len() > 1 && trimmed.starts_with('0') {
        return u64::from_str_radix(&trimmed[1..], 8).ok();
    }
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literals_in_every_base() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("0x1F"), Some(31));
        assert_eq!(parse_integer("010"), Some(8));
        assert_eq!(parse_integer("0b101"), Some(5));
        assert_eq!(parse_integer("1'000u"), Some(1000));
        assert_eq!(parse_integer("N"), None);
    }
}
