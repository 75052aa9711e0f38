//! Declarations: namespaces, records, enums, functions, variables, type
//! aliases, templates, using-directives and preprocessing directives.

use smol_str::SmolStr;
use text_size::TextRange;
use tree_sitter::Node;

use super::types::{declarator_name, function_declarator};
use super::{
    has_token, named_children, named_children_except, normalize_spelling, offset, range_of,
    Builder, FileCtx,
};
use crate::comments;
use crate::cursor::CursorKind;
use crate::diagnostics::DiagnosticSeverity;
use crate::includes::IncludeSpec;
use crate::scope::Frame;
use crate::types::{TypeId, TypeKind};
use crate::unit::NodeId;

/// A declared function whose body is still to be lowered.
#[derive(Debug, Clone, Copy)]
pub(super) struct FunctionSig {
    pub(super) id: NodeId,
    /// Canonical record of a member function.
    pub(super) record: Option<NodeId>,
    /// Declared outside its class (`void A::f() {}`).
    pub(super) out_of_line: bool,
    pub(super) is_const: bool,
}

fn is_record_specifier(kind: &str) -> bool {
    matches!(kind, "struct_specifier" | "class_specifier" | "union_specifier")
}

/// The declaration a `template_declaration` wraps.
fn template_inner(node: Node<'_>) -> Option<Node<'_>> {
    named_children_except(node, &["parameters"])
        .into_iter()
        .rfind(|child| child.kind() != "comment" && child.kind() != "requires_clause")
}

fn storage_class(file: &FileCtx, node: Node<'_>, class: &str) -> bool {
    named_children(node)
        .into_iter()
        .any(|child| child.kind() == "storage_class_specifier" && file.text_of(child) == class)
}

/// Spelling of a function name node.
fn function_name(file: &FileCtx, name: Node<'_>) -> String {
    match name.kind() {
        "template_function" => name
            .child_by_field_name("name")
            .map(|inner| file.text_of(inner).to_owned())
            .unwrap_or_default(),
        "operator_name" | "destructor_name" => file.text_of(name).split_whitespace().collect(),
        "operator_cast" => {
            let ty = name
                .child_by_field_name("type")
                .map(|ty| normalize_spelling(file.text_of(ty)))
                .unwrap_or_default();
            format!("operator {ty}")
        }
        _ => file.text_of(name).to_owned(),
    }
}

/// The `operator T()` node inside a declarator, if any.
fn operator_cast(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "operator_cast" => Some(node),
        "qualified_identifier" => node.child_by_field_name("name").and_then(operator_cast),
        "reference_declarator" | "pointer_declarator" | "attributed_declarator" => {
            super::types::inner_declarator(node).and_then(operator_cast)
        }
        _ => None,
    }
}

impl Builder<'_> {
    pub(super) fn lower_item(&mut self, file: &FileCtx, node: Node<'_>) {
        match node.kind() {
            "namespace_definition" => self.lower_namespace(file, node),
            "function_definition" => {
                if let Some(sig) = self.declare_definition(file, node, None) {
                    self.lower_function_body(file, node, sig);
                }
            }
            "declaration" => self.lower_declaration(file, node, None),
            "field_declaration" => self.lower_field_declaration(file, node, None),
            "type_definition" => self.lower_typedef(file, node),
            "alias_declaration" => self.lower_alias(file, node),
            "template_declaration" => self.lower_template(file, node),
            kind if is_record_specifier(kind) => {
                self.lower_record(file, node, node, None);
            }
            "enum_specifier" => {
                self.lower_enum(file, node, node);
            }
            "linkage_specification" => {
                if let Some(body) = node.child_by_field_name("body") {
                    if body.kind() == "declaration_list" {
                        self.lower_items(file, body);
                    } else {
                        self.lower_item(file, body);
                    }
                }
            }
            "declaration_list" | "ERROR" | "preproc_if" | "preproc_ifdef" | "preproc_else"
            | "preproc_elif" | "preproc_elifdef" => {
                for child in named_children_except(node, &["name", "condition"]) {
                    self.lower_item(file, child);
                }
            }
            "preproc_include" => self.lower_include(file, node),
            "preproc_call" => self.lower_preproc_call(file, node),
            "using_declaration" => self.lower_using(file, node),
            _ => {}
        }
    }

    fn attach_comment(&mut self, id: NodeId, file: &FileCtx, anchor: Node<'_>) {
        self.unit.node_mut(id).brief_comment = comments::brief_comment(anchor, &file.text);
    }

    /// Lowers a tag specifier with a body appearing inside a declaration.
    fn lower_inline_tag(&mut self, file: &FileCtx, decl: Node<'_>) {
        let Some(spec) = decl.child_by_field_name("type") else {
            return;
        };
        if spec.child_by_field_name("body").is_none() {
            return;
        }
        if is_record_specifier(spec.kind()) {
            self.lower_record(file, spec, decl, None);
        } else if spec.kind() == "enum_specifier" {
            self.lower_enum(file, spec, decl);
        }
    }

    fn lower_namespace(&mut self, file: &FileCtx, node: Node<'_>) {
        let levels: Vec<(Option<Node<'_>>, String)> = match node.child_by_field_name("name") {
            Some(name) if name.kind() == "nested_namespace_specifier" => named_children(name)
                .into_iter()
                .filter(|part| part.kind() == "namespace_identifier")
                .map(|part| (Some(part), file.text_of(part).to_owned()))
                .collect(),
            Some(name) => vec![(Some(name), file.text_of(name).to_owned())],
            None => vec![(None, String::new())],
        };
        self.lower_namespace_levels(file, node, &levels, true);
    }

    fn lower_namespace_levels(
        &mut self,
        file: &FileCtx,
        node: Node<'_>,
        levels: &[(Option<Node<'_>>, String)],
        outermost: bool,
    ) {
        let Some(((name_node, name), rest)) = levels.split_first() else {
            if let Some(body) = node.child_by_field_name("body") {
                self.lower_items(file, body);
            }
            return;
        };
        let container = self.scopes.container();
        let existing = self
            .unit
            .scopes
            .members(container)
            .and_then(|table| {
                table
                    .get(name)
                    .iter()
                    .copied()
                    .find(|id| self.unit.node(*id).kind == CursorKind::Namespace)
            });
        let id = self.add_node(CursorKind::Namespace, file, node);
        self.set_name(id, *name_node, name.as_str());
        self.unit.node_mut(id).is_definition = true;
        if outermost {
            self.attach_comment(id, file, node);
        }
        let canonical = match existing {
            Some(previous) => {
                let canonical = self.canonical(previous);
                self.unit.node_mut(id).canonical = Some(canonical);
                canonical
            }
            None => {
                self.unit.scopes.insert(container, SmolStr::new(name), id);
                if name.is_empty() {
                    self.unit.scopes.add_using(container, id);
                }
                id
            }
        };
        self.inside_scope(id, Frame::container(canonical), |this| {
            this.lower_namespace_levels(file, node, rest, false);
        });
    }

    fn lower_using(&mut self, file: &FileCtx, node: Node<'_>) {
        let Some(target) = named_children(node)
            .into_iter()
            .rfind(|child| {
                matches!(
                    child.kind(),
                    "identifier" | "qualified_identifier" | "type_identifier"
                )
            })
        else {
            return;
        };
        if has_token(node, "namespace") {
            let id = self.add_node(CursorKind::UsingDirective, file, node);
            let namespace = self.under(id, |this| this.resolve_namespace(file, target));
            if let Some(namespace) = namespace {
                let spelling = self.unit.node(namespace).spelling.clone();
                self.set_name(id, Some(target), spelling);
                self.unit.node_mut(id).referenced = Some(namespace);
                self.scopes.add_using(&mut self.unit.scopes, namespace);
            }
            return;
        }
        if target.kind() != "qualified_identifier" {
            return;
        }
        let (container, leaf) = self.resolve_scope(file, target, false);
        let Some(container) = container else {
            return;
        };
        let name = file.text_of(leaf).to_owned();
        for decl in self.unit.scopes.lookup_member(container, &name) {
            self.declare(&name, decl);
        }
    }

    /// Resolves the namespace named by `target`, emitting namespace references.
    fn resolve_namespace(&mut self, file: &FileCtx, target: Node<'_>) -> Option<NodeId> {
        let (candidates, leaf) = if target.kind() == "qualified_identifier" {
            let (container, leaf) = self.resolve_scope(file, target, true);
            let name = file.text_of(leaf);
            (
                container.map(|c| self.unit.scopes.lookup_member(c, name)).unwrap_or_default(),
                leaf,
            )
        } else {
            (self.scopes.lookup(&self.unit.scopes, file.text_of(target)), target)
        };
        let namespace = candidates
            .into_iter()
            .find(|id| self.unit.node(*id).kind == CursorKind::Namespace)?;
        let reference = self.add_node(CursorKind::NamespaceRef, file, leaf);
        self.set_name(reference, Some(leaf), file.text_of(leaf));
        self.unit.node_mut(reference).referenced = Some(namespace);
        Some(self.canonical(namespace))
    }

    fn lower_include(&mut self, file: &FileCtx, node: Node<'_>) {
        let Some(path_node) = node.child_by_field_name("path") else {
            return;
        };
        let Some(spec) = IncludeSpec::parse(file.text_of(path_node)) else {
            return;
        };
        let resolved = self
            .search
            .resolve(&spec, &file.dir, |path| self.sources.exists(path));
        let directive = self.options.detailed_preprocessing_record.then(|| {
            let extent = TextRange::new(offset(node.start_byte()), offset(path_node.end_byte()));
            let id = self.add_node_with_range(CursorKind::InclusionDirective, file.id, extent);
            self.set_name(id, None, spec.name());
            id
        });
        match resolved {
            Some(path) => {
                let included = self.include_file(path);
                if let (Some(directive), Some(included)) = (directive, included) {
                    self.unit.node_mut(directive).included_file = Some(included);
                }
            }
            None => self.report(
                file.id,
                offset(path_node.start_byte()),
                DiagnosticSeverity::Fatal,
                format!("'{}' file not found", spec.name()),
            ),
        }
    }

    fn lower_preproc_call(&mut self, file: &FileCtx, node: Node<'_>) {
        let directive = node
            .child_by_field_name("directive")
            .map(|directive| file.text_of(directive).trim_start_matches('#').trim().to_owned())
            .unwrap_or_default();
        let severity = match directive.as_str() {
            "error" => DiagnosticSeverity::Error,
            "warning" => DiagnosticSeverity::Warning,
            _ => return,
        };
        let argument = node
            .child_by_field_name("argument")
            .map(|argument| file.text_of(argument).trim().to_owned())
            .unwrap_or_default();
        let message = if argument.is_empty() {
            format!("#{directive}")
        } else {
            argument
        };
        self.report(file.id, offset(node.start_byte()), severity, message);
    }

    fn lower_template(&mut self, file: &FileCtx, node: Node<'_>) {
        let Some(inner) = template_inner(node) else {
            return;
        };
        match inner.kind() {
            "function_definition" => {
                if let Some(sig) = self.declare_definition(file, inner, Some(node)) {
                    self.lower_function_body(file, inner, sig);
                }
            }
            kind if is_record_specifier(kind) => {
                self.lower_record(file, inner, inner, Some(node));
            }
            "declaration" => self.lower_declaration(file, inner, Some(node)),
            "field_declaration" => self.lower_field_declaration(file, inner, Some(node)),
            _ => self.lower_item(file, inner),
        }
    }

    /// Runs `f` in a template scope declaring the parameters of `template`
    /// as children of `owner`.
    fn inside_template<R>(
        &mut self,
        file: &FileCtx,
        template: Option<Node<'_>>,
        owner: NodeId,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let Some(params) =
            template.and_then(|template| template.child_by_field_name("parameters"))
        else {
            return f(self);
        };
        self.within_frame(Frame::template(), |this| {
            this.under(owner, |this| this.lower_template_parameters(file, params, owner));
            f(this)
        })
    }

    fn lower_template_parameters(&mut self, file: &FileCtx, params: Node<'_>, owner: NodeId) {
        for param in named_children(params) {
            if !matches!(
                param.kind(),
                "type_parameter_declaration"
                    | "optional_type_parameter_declaration"
                    | "variadic_type_parameter_declaration"
            ) {
                continue;
            }
            let name = param.child_by_field_name("name").or_else(|| {
                named_children(param)
                    .into_iter()
                    .find(|child| child.kind() == "type_identifier")
            });
            let spelling = name.map(|name| file.text_of(name).to_owned()).unwrap_or_default();
            let id = self.add_node(CursorKind::TemplateTypeParameter, file, param);
            self.set_name(id, name, spelling.as_str());
            let ty = self.unit.types.unexposed(spelling.as_str());
            self.unit.types.get_mut(ty).declaration = Some(id);
            let data = self.unit.node_mut(id);
            data.semantic_parent = Some(owner);
            data.ty = ty;
            data.is_definition = true;
            self.declare(&spelling, id);
        }
    }

    /// Template parameters already lowered as children of `id`.
    fn template_parameters_of(&self, id: NodeId) -> Vec<NodeId> {
        self.unit
            .node(id)
            .children
            .iter()
            .copied()
            .filter(|child| self.unit.node(*child).kind == CursorKind::TemplateTypeParameter)
            .collect()
    }

    pub(super) fn lower_declaration(
        &mut self,
        file: &FileCtx,
        node: Node<'_>,
        template: Option<Node<'_>>,
    ) {
        self.lower_inline_tag(file, node);
        let mut cursor = node.walk();
        let declarators: Vec<Node<'_>> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        for declarator in declarators {
            let target = if declarator.kind() == "init_declarator" {
                declarator.child_by_field_name("declarator")
            } else {
                Some(declarator)
            };
            let Some(target) = target else {
                continue;
            };
            let start = template.unwrap_or(node).start_byte();
            let extent = TextRange::new(offset(start), offset(declarator.end_byte()));
            if function_declarator(target).is_some() || operator_cast(target).is_some() {
                self.declare_function(file, node, target, extent, template);
            } else {
                self.lower_variable(file, node, declarator, extent);
            }
        }
    }

    /// Declares a function from `declarator`; `decl` carries the return
    /// type and specifiers.
    fn declare_function(
        &mut self,
        file: &FileCtx,
        decl: Node<'_>,
        declarator: Node<'_>,
        extent: TextRange,
        template: Option<Node<'_>>,
    ) -> Option<FunctionSig> {
        let fdecl = function_declarator(declarator);
        let name_node = match fdecl {
            Some(fdecl) => fdecl.child_by_field_name("declarator")?,
            None => operator_cast(declarator)?,
        };
        let id = self.add_node_with_range(CursorKind::FunctionDecl, file.id, extent);
        let qualified = name_node.kind() == "qualified_identifier";
        let (container, leaf) = if qualified {
            self.under(id, |this| this.resolve_scope(file, name_node, true))
        } else {
            (Some(self.scopes.container()), name_node)
        };
        let name = function_name(file, leaf);
        let record = container.filter(|c| self.unit.node(*c).kind.is_record());
        let kind = if template.is_some() {
            CursorKind::FunctionTemplate
        } else if leaf.kind() == "operator_cast" {
            CursorKind::ConversionFunction
        } else if leaf.kind() == "destructor_name" {
            CursorKind::Destructor
        } else if let Some(record) = record {
            if self.unit.node(record).spelling == name {
                CursorKind::Constructor
            } else {
                CursorKind::CXXMethod
            }
        } else {
            CursorKind::FunctionDecl
        };
        self.unit.node_mut(id).kind = kind;
        if qualified {
            let parent = container.map(|c| self.definitions.get(&c).copied().unwrap_or(c));
            self.unit.node_mut(id).semantic_parent = parent;
        }
        self.set_name(id, Some(leaf), name.as_str());
        let anchor = template.unwrap_or(decl);
        self.attach_comment(id, file, anchor);

        let is_const = fdecl.is_some_and(|fdecl| self.has_const(file, fdecl));
        self.inside_template(file, template, id, |this| {
            let mut base = this.under(id, |this| this.specifier_type(file, decl, true));
            if base == TypeId::INVALID
                && matches!(kind, CursorKind::Constructor | CursorKind::Destructor)
            {
                base = this.unit.types.builtin(TypeKind::Void);
            }
            let declared = if leaf.kind() == "operator_cast" {
                let result = this.under(id, |this| this.specifier_type(file, leaf, true));
                let function = this.unit.types.function(result, Vec::new(), is_const);
                super::types::Declarated { name: Some(leaf), ty: function }
            } else {
                this.declarator(file, Some(declarator), base, false)
            };
            this.unit.node_mut(id).ty = declared.ty;
            this.under(id, |this| this.lower_parameters(file, fdecl, id));
        });

        let params = self.parameter_count(id);
        let existing = container.and_then(|container| {
            self.unit.scopes.members(container).and_then(|table| {
                table.get(&name).iter().copied().find(|other| {
                    *other != id
                        && self.unit.node(*other).kind.is_function_like()
                        && self.parameter_count(*other) == params
                })
            })
        });
        match existing {
            Some(previous) => {
                let canonical = self.canonical(previous);
                self.unit.node_mut(id).canonical = Some(canonical);
            }
            None if qualified => {
                if let Some(container) = container {
                    self.unit.scopes.insert(container, SmolStr::new(&name), id);
                }
            }
            None => self.declare(&name, id),
        }
        Some(FunctionSig {
            id,
            record: record.map(|record| self.canonical(record)),
            out_of_line: qualified,
            is_const,
        })
    }

    pub(super) fn parameter_count(&self, function: NodeId) -> usize {
        self.unit
            .node(function)
            .children
            .iter()
            .filter(|child| self.unit.node(**child).kind == CursorKind::ParmDecl)
            .count()
    }

    /// Declares a function definition, reporting redefinitions.
    fn declare_definition(
        &mut self,
        file: &FileCtx,
        node: Node<'_>,
        template: Option<Node<'_>>,
    ) -> Option<FunctionSig> {
        let declarator = node.child_by_field_name("declarator")?;
        let extent = range_of(template.unwrap_or(node));
        let sig = self.declare_function(file, node, declarator, extent, template)?;
        self.note_definition(file, sig.id);
        Some(sig)
    }

    /// Lowers parameters as `ParmDecl` children of the current lexical
    /// parent, semantically owned by `owner`.
    pub(super) fn lower_parameters(
        &mut self,
        file: &FileCtx,
        fdecl: Option<Node<'_>>,
        owner: NodeId,
    ) -> Vec<NodeId> {
        let Some(params) = fdecl.and_then(|fdecl| fdecl.child_by_field_name("parameters")) else {
            return Vec::new();
        };
        let children = named_children(params);
        let mut ids = Vec::new();
        for param in &children {
            if !matches!(
                param.kind(),
                "parameter_declaration"
                    | "optional_parameter_declaration"
                    | "variadic_parameter_declaration"
            ) {
                continue;
            }
            let declarator = param.child_by_field_name("declarator");
            let is_void = declarator.is_none()
                && children.len() == 1
                && param
                    .child_by_field_name("type")
                    .is_some_and(|ty| file.text_of(ty) == "void");
            if is_void {
                break;
            }
            let id = self.add_node(CursorKind::ParmDecl, file, *param);
            self.unit.node_mut(id).semantic_parent = Some(owner);
            let base = self.under(id, |this| this.specifier_type(file, *param, true));
            let declared = self.under(id, |this| this.declarator(file, declarator, base, true));
            let name = declared
                .name
                .map(|name| file.text_of(name).to_owned())
                .unwrap_or_default();
            self.set_name(id, declared.name, name);
            let ty = match self.unit.types.kind(declared.ty) {
                TypeKind::ConstantArray | TypeKind::IncompleteArray | TypeKind::FunctionProto => {
                    self.unit.types.decay(declared.ty)
                }
                _ => declared.ty,
            };
            let data = self.unit.node_mut(id);
            data.ty = ty;
            data.is_definition = true;
            if let Some(value) = param.child_by_field_name("default_value") {
                self.inside_declaration(id, |this| this.lower_expr(file, value));
            }
            ids.push(id);
        }
        ids
    }

    /// Lowers the body and member initializers of a function definition.
    pub(super) fn lower_function_body(&mut self, file: &FileCtx, node: Node<'_>, sig: FunctionSig) {
        let id = sig.id;
        let declared: Vec<NodeId> = self
            .template_parameters_of(id)
            .into_iter()
            .chain(
                self.unit
                    .node(id)
                    .children
                    .iter()
                    .copied()
                    .filter(|child| self.unit.node(*child).kind == CursorKind::ParmDecl)
                    .collect::<Vec<_>>(),
            )
            .collect();
        let this_type = sig.record.map(|record| {
            let written = self.qualified_name(record);
            let record_type = self.type_for_decl(record, &written);
            let record_type = if sig.is_const {
                self.unit.types.with_const(record_type)
            } else {
                record_type
            };
            self.unit.types.pointer_to(record_type, false)
        });
        let record_frame = sig.record.filter(|_| sig.out_of_line);
        let in_template = self.unit.node(id).kind == CursorKind::FunctionTemplate;

        if let Some(record) = record_frame {
            self.scopes.push(Frame::container(record));
        }
        self.scopes.push(if in_template { Frame::template() } else { Frame::block() });
        for param in declared {
            let name = self.unit.node(param).spelling.clone();
            self.declare(&name, param);
        }
        if let Some(this_type) = this_type {
            self.this_types.push(this_type);
        }
        self.semantic.push(id);
        self.inside_declaration(id, |this| {
            for child in named_children(node) {
                if child.kind() == "field_initializer_list" {
                    this.lower_member_initializers(file, child);
                }
            }
            if let Some(body) = node.child_by_field_name("body") {
                this.lower_stmt(file, body);
            }
        });
        self.semantic.pop();
        if this_type.is_some() {
            self.this_types.pop();
        }
        self.scopes.pop();
        if record_frame.is_some() {
            self.scopes.pop();
        }
    }

    fn lower_member_initializers(&mut self, file: &FileCtx, list: Node<'_>) {
        for initializer in named_children(list) {
            if initializer.kind() != "field_initializer" {
                continue;
            }
            for part in named_children(initializer) {
                match part.kind() {
                    "argument_list" | "initializer_list" => {
                        for argument in named_children(part) {
                            self.lower_expr(file, argument);
                        }
                    }
                    "field_identifier" => {
                        let name = file.text_of(part).to_owned();
                        let target = self
                            .scopes
                            .lookup(&self.unit.scopes, &name)
                            .into_iter()
                            .next();
                        let reference = self.add_node(CursorKind::MemberRefExpr, file, part);
                        self.set_name(reference, Some(part), name);
                        self.unit.node_mut(reference).referenced = target;
                    }
                    _ => {}
                }
            }
        }
    }

    /// Lowers one variable of a declaration.
    fn lower_variable(
        &mut self,
        file: &FileCtx,
        decl: Node<'_>,
        declarator: Node<'_>,
        extent: TextRange,
    ) {
        let (target, value) = if declarator.kind() == "init_declarator" {
            (
                declarator.child_by_field_name("declarator"),
                declarator.child_by_field_name("value"),
            )
        } else {
            (Some(declarator), None)
        };
        let Some(name_node) = target.and_then(declarator_name) else {
            return;
        };
        let id = self.add_node_with_range(CursorKind::VarDecl, file.id, extent);
        let (container, leaf) = if name_node.kind() == "qualified_identifier" {
            let (container, leaf) =
                self.under(id, |this| this.resolve_scope(file, name_node, true));
            (container, leaf)
        } else {
            (None, name_node)
        };
        let name = file.text_of(leaf).to_owned();
        self.set_name(id, Some(leaf), name.as_str());
        self.attach_comment(id, file, decl);
        let base = self.under(id, |this| this.specifier_type(file, decl, true));
        let declared = self.under(id, |this| this.declarator(file, target, base, true));
        let is_extern = storage_class(file, decl, "extern");
        {
            let data = self.unit.node_mut(id);
            data.ty = declared.ty;
            data.is_definition = !(is_extern && value.is_none());
        }
        self.register_variable(id, &name, container);

        let Some(value) = value else {
            return;
        };
        let init =
            self.inside_declaration(id, |this| this.lower_initializer(file, value, declared.ty));
        let Some(init) = init else {
            return;
        };
        self.initializers.insert(id, init);
        if self.unit.types.kind(declared.ty) == TypeKind::IncompleteArray {
            let count = match value.kind() {
                "initializer_list" => Some(named_children(value).len() as u64),
                _ => {
                    let init_type = self.unit.node(init).ty;
                    self.unit.types.get(init_type).array_size
                }
            };
            if let Some(count) = count {
                let element = self.unit.types.get(declared.ty).pointee.unwrap_or(TypeId::INVALID);
                let completed = self.unit.types.array_of(element, Some(count));
                self.unit.node_mut(id).ty = completed;
            }
        }
    }

    /// Registers a variable, linking it to an earlier declaration of the
    /// same entity.
    fn register_variable(&mut self, id: NodeId, name: &str, container: Option<NodeId>) {
        let scope = container.unwrap_or_else(|| self.scopes.container());
        let existing = if container.is_some() || !self.scopes.innermost_is_block() {
            self.unit.scopes.members(scope).and_then(|table| {
                table.get(name).iter().copied().find(|other| {
                    *other != id && matches!(self.unit.node(*other).kind, CursorKind::VarDecl)
                })
            })
        } else {
            None
        };
        match existing {
            Some(previous) => {
                let canonical = self.canonical(previous);
                self.unit.node_mut(id).canonical = Some(canonical);
                if let Some(container) = container {
                    let parent = self.definitions.get(&container).copied().unwrap_or(container);
                    self.unit.node_mut(id).semantic_parent = Some(parent);
                }
            }
            None => match container {
                Some(container) => self.unit.scopes.insert(container, SmolStr::new(name), id),
                None => self.declare(name, id),
            },
        }
    }

    /// Lowers the initializer of a variable declared with type `declared`.
    pub(super) fn lower_initializer(
        &mut self,
        file: &FileCtx,
        value: Node<'_>,
        declared: TypeId,
    ) -> Option<NodeId> {
        let is_reference = matches!(
            self.unit.types.kind(declared),
            TypeKind::LValueReference | TypeKind::RValueReference
        );
        match value.kind() {
            "initializer_list" => self.lower_expr(file, value),
            "argument_list" => {
                let canonical = self.unit.types.canonical(declared);
                if self.unit.types.kind(canonical) == TypeKind::Record {
                    let id = self.add_node(CursorKind::CallExpr, file, value);
                    let record = self.unit.types.get(canonical).declaration;
                    let spelling = record
                        .map(|record| self.unit.node(record).spelling.clone())
                        .unwrap_or_default();
                    let data = self.unit.node_mut(id);
                    data.ty = declared;
                    data.referenced = record;
                    data.spelling = spelling;
                    self.set_shape(id, crate::sema::ExprShape::Fixed);
                    self.under(id, |this| {
                        for argument in named_children(value) {
                            this.lower_expr(file, argument);
                        }
                    });
                    return Some(id);
                }
                let argument = named_children(value)
                    .into_iter()
                    .find(|child| child.kind() != "comment")?;
                let expr = self.lower_expr(file, argument)?;
                Some(if is_reference { expr } else { self.wrap_implicit(expr) })
            }
            _ => {
                let expr = self.lower_expr(file, value)?;
                Some(if is_reference { expr } else { self.wrap_implicit(expr) })
            }
        }
    }

    fn lower_field_declaration(
        &mut self,
        file: &FileCtx,
        node: Node<'_>,
        template: Option<Node<'_>>,
    ) {
        self.lower_inline_tag(file, node);
        let mut cursor = node.walk();
        let declarators: Vec<Node<'_>> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        let is_static = storage_class(file, node, "static");
        let default_value = node.child_by_field_name("default_value");
        let last = declarators.len().saturating_sub(1);
        for (index, declarator) in declarators.into_iter().enumerate() {
            let start = template.unwrap_or(node).start_byte();
            let extent = TextRange::new(offset(start), offset(declarator.end_byte()));
            if function_declarator(declarator).is_some() || operator_cast(declarator).is_some() {
                self.declare_function(file, node, declarator, extent, template);
                continue;
            }
            let Some(name_node) = declarator_name(declarator) else {
                continue;
            };
            let kind = if is_static { CursorKind::VarDecl } else { CursorKind::FieldDecl };
            let id = self.add_node_with_range(kind, file.id, extent);
            let name = file.text_of(name_node).to_owned();
            self.set_name(id, Some(name_node), name.as_str());
            self.attach_comment(id, file, node);
            let base = self.under(id, |this| this.specifier_type(file, node, true));
            let declared =
                self.under(id, |this| this.declarator(file, Some(declarator), base, true));
            {
                let data = self.unit.node_mut(id);
                data.ty = declared.ty;
                data.is_definition = !is_static;
            }
            self.declare(&name, id);
            if index == last {
                if let Some(value) = default_value {
                    let init = self.inside_declaration(id, |this| {
                        this.lower_initializer(file, value, declared.ty)
                    });
                    if let Some(init) = init {
                        self.initializers.insert(id, init);
                    }
                }
            }
        }
    }

    /// Lowers a struct/class/union specifier. `anchor` is the node comments
    /// attach to.
    pub(super) fn lower_record(
        &mut self,
        file: &FileCtx,
        node: Node<'_>,
        anchor: Node<'_>,
        template: Option<Node<'_>>,
    ) -> Option<NodeId> {
        let kind = match (node.kind(), template) {
            (_, Some(_)) => CursorKind::ClassTemplate,
            ("struct_specifier", None) => CursorKind::StructDecl,
            ("union_specifier", None) => CursorKind::UnionDecl,
            _ => CursorKind::ClassDecl,
        };
        let body = node.child_by_field_name("body");
        let name_node = node.child_by_field_name("name");
        let (container, leaf) = match name_node {
            Some(name) if name.kind() == "qualified_identifier" => {
                let (container, leaf) = self.resolve_scope(file, name, false);
                (container, Some(leaf))
            }
            Some(name) if name.kind() == "template_type" => {
                (Some(self.scopes.container()), name.child_by_field_name("name"))
            }
            Some(name) => (Some(self.scopes.container()), Some(name)),
            None => (Some(self.scopes.container()), None),
        };
        let name = leaf.map(|leaf| file.text_of(leaf).to_owned()).unwrap_or_default();
        if body.is_none() && name.is_empty() {
            return None;
        }
        let container = container?;
        let qualified = name_node.is_some_and(|name| name.kind() == "qualified_identifier");
        let existing = self.unit.scopes.members(container).and_then(|table| {
            table
                .get(&name)
                .iter()
                .copied()
                .find(|other| self.unit.node(*other).kind.is_record())
        });

        let extent = range_of(template.unwrap_or(node));
        let id = self.add_node_with_range(kind, file.id, extent);
        self.set_name(id, leaf, name.as_str());
        self.tag_decls.insert((file.id, node.start_byte()), id);
        self.attach_comment(id, file, anchor);
        if qualified {
            self.unit.node_mut(id).semantic_parent = Some(container);
        }
        match existing {
            Some(previous) => {
                let canonical = self.canonical(previous);
                self.unit.node_mut(id).canonical = Some(canonical);
            }
            None if qualified => self.unit.scopes.insert(container, SmolStr::new(&name), id),
            None if name.is_empty() => {}
            None => self.declare(&name, id),
        }
        let canonical = self.canonical(id);
        let written = self.qualified_name(canonical);
        let record_type = self.type_for_decl(id, &written);
        self.unit.node_mut(id).ty = record_type;

        let Some(body) = body else {
            return Some(id);
        };
        self.note_definition(file, id);
        self.inside_template(file, template, id, |this| {
            this.inside_scope(id, Frame::container(canonical), |this| {
                for clause in named_children(node) {
                    if clause.kind() == "base_class_clause" {
                        this.lower_bases(file, clause, canonical);
                    }
                }
                this.lower_record_body(file, body);
            });
        });
        Some(id)
    }

    fn lower_bases(&mut self, file: &FileCtx, clause: Node<'_>, record: NodeId) {
        for base in named_children(clause) {
            if !matches!(
                base.kind(),
                "type_identifier" | "qualified_identifier" | "template_type"
            ) {
                continue;
            }
            let ty = self.type_specifier(file, base, true);
            let canonical = self.unit.types.canonical(ty);
            let declaration = self
                .unit
                .types
                .get(canonical)
                .declaration
                .filter(|decl| self.unit.node(*decl).kind.is_record());
            match declaration {
                Some(decl) => {
                    let decl = self.canonical(decl);
                    self.unit.scopes.add_base(record, decl);
                }
                None => {
                    self.opaque_records.insert(record);
                }
            }
        }
    }

    /// Lowers class members, deferring member function bodies until every
    /// member is declared.
    fn lower_record_body(&mut self, file: &FileCtx, body: Node<'_>) {
        let mut deferred = Vec::new();
        for member in named_children(body) {
            match member.kind() {
                "function_definition" => {
                    if let Some(sig) = self.declare_definition(file, member, None) {
                        deferred.push((member, sig));
                    }
                }
                "template_declaration" => match template_inner(member) {
                    Some(inner) if inner.kind() == "function_definition" => {
                        if let Some(sig) = self.declare_definition(file, inner, Some(member)) {
                            deferred.push((inner, sig));
                        }
                    }
                    _ => self.lower_template(file, member),
                },
                "access_specifier" | "comment" | "friend_declaration" => {}
                _ => self.lower_item(file, member),
            }
        }
        for (member, sig) in deferred {
            self.lower_function_body(file, member, sig);
        }
    }

    pub(super) fn lower_enum(
        &mut self,
        file: &FileCtx,
        node: Node<'_>,
        anchor: Node<'_>,
    ) -> Option<NodeId> {
        let name_node = node.child_by_field_name("name");
        let body = node.child_by_field_name("body");
        let name = name_node.map(|name| file.text_of(name).to_owned()).unwrap_or_default();
        if body.is_none() && name.is_empty() {
            return None;
        }
        let scoped = has_token(node, "class") || has_token(node, "struct");
        let outer = self.scopes.container();
        let existing = self.unit.scopes.members(outer).and_then(|table| {
            table
                .get(&name)
                .iter()
                .copied()
                .find(|other| self.unit.node(*other).kind == CursorKind::EnumDecl)
        });
        let id = self.add_node(CursorKind::EnumDecl, file, node);
        self.set_name(id, name_node, name.as_str());
        self.tag_decls.insert((file.id, node.start_byte()), id);
        self.attach_comment(id, file, anchor);
        match existing {
            Some(previous) => {
                let canonical = self.canonical(previous);
                self.unit.node_mut(id).canonical = Some(canonical);
            }
            None => self.declare(&name, id),
        }
        let canonical = self.canonical(id);
        let written = self.qualified_name(canonical);
        let enum_type = self.type_for_decl(id, &written);
        self.unit.node_mut(id).ty = enum_type;

        let Some(body) = body else {
            return Some(id);
        };
        self.note_definition(file, id);
        let block_scope = self.scopes.innermost_is_block();
        self.inside_scope(id, Frame::container(canonical), |this| {
            for enumerator in named_children(body) {
                if enumerator.kind() != "enumerator" {
                    continue;
                }
                let constant = this.add_node(CursorKind::EnumConstantDecl, file, enumerator);
                let name_node = enumerator.child_by_field_name("name");
                let name = name_node.map(|name| file.text_of(name).to_owned()).unwrap_or_default();
                this.set_name(constant, name_node, name.as_str());
                this.attach_comment(constant, file, enumerator);
                {
                    let data = this.unit.node_mut(constant);
                    data.ty = enum_type;
                    data.is_definition = true;
                }
                this.declare(&name, constant);
                if !scoped && !block_scope {
                    this.unit.scopes.insert(outer, SmolStr::new(&name), constant);
                }
                if let Some(value) = enumerator.child_by_field_name("value") {
                    this.inside_declaration(constant, |this| this.lower_expr(file, value));
                }
            }
        });
        Some(id)
    }

    fn lower_typedef(&mut self, file: &FileCtx, node: Node<'_>) {
        self.lower_inline_tag(file, node);
        let mut cursor = node.walk();
        let declarators: Vec<Node<'_>> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        for declarator in declarators {
            let id = self.add_node(CursorKind::TypedefDecl, file, node);
            let base = self.under(id, |this| this.specifier_type(file, node, true));
            let declared =
                self.under(id, |this| this.declarator(file, Some(declarator), base, true));
            let name = declared
                .name
                .map(|name| file.text_of(name).to_owned())
                .unwrap_or_default();
            self.finish_alias(file, id, node, declared.name, &name, declared.ty);
        }
    }

    fn lower_alias(&mut self, file: &FileCtx, node: Node<'_>) {
        let name_node = node.child_by_field_name("name");
        let name = name_node.map(|name| file.text_of(name).to_owned()).unwrap_or_default();
        let id = self.add_node(CursorKind::TypeAliasDecl, file, node);
        let underlying = match node.child_by_field_name("type") {
            Some(ty) => self.under(id, |this| this.type_descriptor(file, ty, true)),
            None => TypeId::INVALID,
        };
        self.finish_alias(file, id, node, name_node, &name, underlying);
    }

    fn finish_alias(
        &mut self,
        file: &FileCtx,
        id: NodeId,
        node: Node<'_>,
        name_node: Option<Node<'_>>,
        name: &str,
        underlying: TypeId,
    ) {
        self.set_name(id, name_node, name);
        self.attach_comment(id, file, node);
        self.unit.typedef_underlying.insert(id, underlying);
        let ty = self.unit.types.typedef(name, Some(id), underlying);
        let data = self.unit.node_mut(id);
        data.ty = ty;
        data.is_definition = true;
        self.declare(name, id);
    }
}
