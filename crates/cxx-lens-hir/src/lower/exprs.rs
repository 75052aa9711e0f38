//! Statements and expressions.

use text_size::TextRange;
use tree_sitter::Node;

use super::{named_children, offset, Builder, FileCtx};
use crate::cursor::CursorKind;
use crate::scope::Frame;
use crate::sema::{BinaryOp, ExprShape, UnaryOp};
use crate::types::{TypeId, TypeKind};
use crate::unit::NodeId;

fn is_expression_syntax(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "qualified_identifier"
            | "template_function"
            | "field_expression"
            | "call_expression"
            | "number_literal"
            | "string_literal"
            | "raw_string_literal"
            | "concatenated_string"
            | "char_literal"
            | "true"
            | "false"
            | "null"
            | "nullptr"
            | "this"
            | "parenthesized_expression"
            | "binary_expression"
            | "assignment_expression"
            | "unary_expression"
            | "pointer_expression"
            | "update_expression"
            | "conditional_expression"
            | "comma_expression"
            | "cast_expression"
            | "sizeof_expression"
            | "alignof_expression"
            | "new_expression"
            | "delete_expression"
            | "lambda_expression"
            | "subscript_expression"
            | "initializer_list"
            | "compound_literal_expression"
            | "user_defined_literal"
            | "throw_expression"
            | "co_await_expression"
            | "fold_expression"
            | "parameter_pack_expansion"
    )
}

/// Cursor kind of `static_cast<T>(e)` and friends.
fn named_cast(name: &str) -> Option<CursorKind> {
    match name {
        "static_cast" => Some(CursorKind::CXXStaticCastExpr),
        "dynamic_cast" => Some(CursorKind::CXXDynamicCastExpr),
        "reinterpret_cast" => Some(CursorKind::CXXReinterpretCastExpr),
        "const_cast" => Some(CursorKind::CXXConstCastExpr),
        _ => None,
    }
}

fn binary_op(operator: &str) -> BinaryOp {
    match operator {
        "<<" | ">>" => BinaryOp::Shift,
        "==" | "!=" | "<" | ">" | "<=" | ">=" | "<=>" | "not_eq" => BinaryOp::Comparison,
        "&&" | "||" | "and" | "or" => BinaryOp::Logical,
        _ => BinaryOp::Arithmetic,
    }
}

/// Number of characters (including the terminator) a string literal body
/// occupies.
fn unescaped_len(body: &str) -> u64 {
    let bytes = body.as_bytes();
    let (mut index, mut len) = (0, 0);
    while index < bytes.len() {
        if bytes[index] == b'\\' {
            index += 2;
            match bytes.get(index - 1) {
                Some(b'x') => {
                    while bytes.get(index).is_some_and(u8::is_ascii_hexdigit) {
                        index += 1;
                    }
                }
                Some(b'0'..=b'7') => {
                    let mut digits = 1;
                    while digits < 3 && matches!(bytes.get(index), Some(b'0'..=b'7')) {
                        index += 1;
                        digits += 1;
                    }
                }
                Some(b'u') => index += 4,
                Some(b'U') => index += 8,
                _ => {}
            }
        } else {
            index += 1;
        }
        len += 1;
    }
    len + 1
}

/// Element kind and length of a (possibly prefixed) string literal.
fn string_literal_shape(text: &str) -> (TypeKind, u64) {
    let kind = if text.starts_with("u8") {
        TypeKind::CharS
    } else if text.starts_with('L') {
        TypeKind::WChar
    } else if text.starts_with('u') {
        TypeKind::Char16
    } else if text.starts_with('U') {
        TypeKind::Char32
    } else {
        TypeKind::CharS
    };
    let raw = text.find("R\"").filter(|start| !text[..*start].contains('"'));
    let len = match raw {
        Some(start) => {
            let body = &text[start + 2..];
            match (body.find('('), body.rfind(')')) {
                (Some(open), Some(close)) if open < close => {
                    (body[open + 1..close].len() + 1) as u64
                }
                _ => 1,
            }
        }
        None => {
            let body = text
                .find('"')
                .and_then(|open| text[open + 1..].strip_suffix('"'))
                .unwrap_or_default();
            unescaped_len(body)
        }
    };
    (kind, len)
}

/// Type kind of a numeric literal.
fn number_literal_kind(text: &str) -> (CursorKind, TypeKind) {
    let lower: String = text
        .chars()
        .filter(|ch| *ch != '\'')
        .collect::<String>()
        .to_ascii_lowercase();
    let hex = lower.starts_with("0x");
    let floating = if hex {
        lower.contains('p')
    } else {
        lower.contains('.') || lower.contains('e')
    };
    if floating {
        let kind = if lower.ends_with('l') {
            TypeKind::LongDouble
        } else if !hex && lower.ends_with('f') {
            TypeKind::Float
        } else {
            TypeKind::Double
        };
        return (CursorKind::FloatingLiteral, kind);
    }
    let suffix: String = lower
        .chars()
        .rev()
        .take_while(|ch| matches!(ch, 'u' | 'l' | 'z'))
        .collect();
    let unsigned = suffix.contains('u');
    let longs = suffix.matches('l').count();
    let kind = match (longs, unsigned, suffix.contains('z')) {
        (_, true, true) => TypeKind::ULong,
        (_, false, true) => TypeKind::Long,
        (0, false, _) => TypeKind::Int,
        (0, true, _) => TypeKind::UInt,
        (1, false, _) => TypeKind::Long,
        (1, true, _) => TypeKind::ULong,
        (_, false, _) => TypeKind::LongLong,
        (_, true, _) => TypeKind::ULongLong,
    };
    (CursorKind::IntegerLiteral, kind)
}

impl Builder<'_> {
    /// Lowers a statement under the current lexical parent.
    pub(super) fn lower_stmt(&mut self, file: &FileCtx, node: Node<'_>) -> Option<NodeId> {
        let kind = match node.kind() {
            "compound_statement" => return Some(self.lower_block(file, node)),
            "declaration" => {
                let id = self.add_node(CursorKind::DeclStmt, file, node);
                self.under(id, |this| this.lower_declaration(file, node, None));
                return Some(id);
            }
            "type_definition" | "alias_declaration" | "using_declaration" | "struct_specifier"
            | "class_specifier" | "union_specifier" | "enum_specifier" => {
                let id = self.add_node(CursorKind::DeclStmt, file, node);
                self.under(id, |this| this.lower_item(file, node));
                return Some(id);
            }
            "expression_statement" => {
                return named_children(node)
                    .into_iter()
                    .find(|child| child.kind() != "comment")
                    .and_then(|expr| self.lower_expr(file, expr));
            }
            "return_statement" => return Some(self.lower_return(file, node)),
            "for_range_loop" => return Some(self.lower_range_for(file, node)),
            "if_statement" => CursorKind::IfStmt,
            "for_statement" => CursorKind::ForStmt,
            "while_statement" => CursorKind::WhileStmt,
            "do_statement" => CursorKind::DoStmt,
            "switch_statement" => CursorKind::SwitchStmt,
            "case_statement" if node.child_by_field_name("value").is_some() => CursorKind::CaseStmt,
            "case_statement" => CursorKind::DefaultStmt,
            "break_statement" => CursorKind::BreakStmt,
            "continue_statement" => CursorKind::ContinueStmt,
            "comment" => return None,
            kind if is_expression_syntax(kind) => return self.lower_expr(file, node),
            _ => CursorKind::UnexposedStmt,
        };
        let id = self.add_node(kind, file, node);
        self.within_frame(Frame::block(), |this| {
            this.under(id, |this| this.lower_statement_parts(file, node));
        });
        Some(id)
    }

    fn lower_statement_parts(&mut self, file: &FileCtx, node: Node<'_>) {
        for child in named_children(node) {
            match child.kind() {
                "condition_clause" | "else_clause" | "init_statement" | "catch_clause" => {
                    self.lower_statement_parts(file, child);
                }
                "parameter_list" | "comment" => {}
                _ => {
                    self.lower_stmt(file, child);
                }
            }
        }
    }

    fn lower_block(&mut self, file: &FileCtx, node: Node<'_>) -> NodeId {
        let id = self.add_node(CursorKind::CompoundStmt, file, node);
        self.within_frame(Frame::block(), |this| {
            this.under(id, |this| {
                for child in named_children(node) {
                    this.lower_stmt(file, child);
                }
            });
        });
        id
    }

    fn lower_return(&mut self, file: &FileCtx, node: Node<'_>) -> NodeId {
        let id = self.add_node(CursorKind::ReturnStmt, file, node);
        self.under(id, |this| {
            let value = named_children(node)
                .into_iter()
                .find(|child| child.kind() != "comment");
            if let Some(value) = value {
                if let Some(expr) = this.lower_expr(file, value) {
                    if value.kind() != "initializer_list" {
                        this.wrap_implicit(expr);
                    }
                }
            }
        });
        id
    }

    fn lower_range_for(&mut self, file: &FileCtx, node: Node<'_>) -> NodeId {
        let id = self.add_node(CursorKind::CXXForRangeStmt, file, node);
        self.within_frame(Frame::block(), |this| {
            this.under(id, |this| {
                let declarator = node.child_by_field_name("declarator");
                let name_node = declarator.and_then(super::types::declarator_name);
                let variable = name_node.map(|name_node| {
                    let start = node.child_by_field_name("type").unwrap_or(name_node).start_byte();
                    let end = declarator.unwrap_or(name_node).end_byte();
                    let var = this.add_node_with_range(
                        CursorKind::VarDecl,
                        file.id,
                        TextRange::new(offset(start), offset(end)),
                    );
                    let name = file.text_of(name_node).to_owned();
                    this.set_name(var, Some(name_node), name.as_str());
                    let base = this.under(var, |this| this.specifier_type(file, node, true));
                    let declared =
                        this.under(var, |this| this.declarator(file, declarator, base, true));
                    let data = this.unit.node_mut(var);
                    data.ty = declared.ty;
                    data.is_definition = true;
                    this.declare(&name, var);
                    var
                });
                let range = node
                    .child_by_field_name("right")
                    .and_then(|right| this.lower_expr(file, right));
                if let (Some(variable), Some(range)) = (variable, range) {
                    this.range_loops.insert(variable, range);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    this.lower_stmt(file, body);
                }
            });
        });
        id
    }

    /// Lowers an expression under the current lexical parent, returning its
    /// node.
    pub(super) fn lower_expr(&mut self, file: &FileCtx, node: Node<'_>) -> Option<NodeId> {
        let id = match node.kind() {
            "identifier" => {
                let name = file.text_of(node).to_owned();
                self.lower_name_ref(file, node, node, &name, None)
            }
            "qualified_identifier" => self.lower_qualified_ref(file, node, None),
            "template_function" => {
                let name_node = node.child_by_field_name("name")?;
                let name = file.text_of(name_node).to_owned();
                self.lower_name_ref(file, node, name_node, &name, None)
            }
            "field_expression" => self.lower_member(file, node),
            "call_expression" => self.lower_call(file, node)?,
            "number_literal" => {
                let (kind, ty) = number_literal_kind(file.text_of(node));
                let ty = self.unit.types.builtin(ty);
                self.fixed(file, node, kind, ty)
            }
            "string_literal" | "raw_string_literal" | "concatenated_string" => {
                self.lower_string(file, node)
            }
            "char_literal" => {
                let text = file.text_of(node);
                let kind = if text.starts_with('L') {
                    TypeKind::WChar
                } else if text.starts_with("u8") {
                    TypeKind::CharS
                } else if text.starts_with('u') {
                    TypeKind::Char16
                } else if text.starts_with('U') {
                    TypeKind::Char32
                } else {
                    TypeKind::CharS
                };
                let ty = self.unit.types.builtin(kind);
                self.fixed(file, node, CursorKind::CharacterLiteral, ty)
            }
            "true" | "false" => {
                let ty = self.unit.types.builtin(TypeKind::Bool);
                self.fixed(file, node, CursorKind::CXXBoolLiteralExpr, ty)
            }
            "null" | "nullptr" => {
                if file.text_of(node) == "nullptr" {
                    let ty = self.unit.types.builtin(TypeKind::NullPtr);
                    self.fixed(file, node, CursorKind::CXXNullPtrLiteralExpr, ty)
                } else {
                    let ty = self.unit.types.builtin(TypeKind::Long);
                    self.fixed(file, node, CursorKind::UnexposedExpr, ty)
                }
            }
            "this" => {
                let ty = self.this_types.last().copied().unwrap_or(TypeId::INVALID);
                self.fixed(file, node, CursorKind::CXXThisExpr, ty)
            }
            "parenthesized_expression" => {
                self.composite(file, node, CursorKind::ParenExpr, ExprShape::Paren)
            }
            "binary_expression" => {
                let operator = node
                    .child_by_field_name("operator")
                    .map(|op| file.text_of(op))
                    .unwrap_or_default();
                let shape = ExprShape::Binary(binary_op(operator));
                self.composite(file, node, CursorKind::BinaryOperator, shape)
            }
            "assignment_expression" => {
                let operator = node
                    .child_by_field_name("operator")
                    .map(|op| file.text_of(op))
                    .unwrap_or("=");
                let kind = if operator == "=" {
                    CursorKind::BinaryOperator
                } else {
                    CursorKind::CompoundAssignOperator
                };
                self.composite(file, node, kind, ExprShape::Binary(BinaryOp::Assign))
            }
            "comma_expression" => {
                self.composite(
                    file,
                    node,
                    CursorKind::BinaryOperator,
                    ExprShape::Binary(BinaryOp::Comma),
                )
            }
            "unary_expression" => {
                let operator = node
                    .child_by_field_name("operator")
                    .map(|op| file.text_of(op))
                    .unwrap_or_default();
                let op = if matches!(operator, "!" | "not") {
                    UnaryOp::Not
                } else {
                    UnaryOp::Promote
                };
                self.composite(file, node, CursorKind::UnaryOperator, ExprShape::Unary(op))
            }
            "pointer_expression" => {
                let operator = node
                    .child_by_field_name("operator")
                    .map(|op| file.text_of(op))
                    .unwrap_or_default();
                let op = if operator == "&" {
                    UnaryOp::AddressOf
                } else {
                    UnaryOp::Deref
                };
                self.composite(file, node, CursorKind::UnaryOperator, ExprShape::Unary(op))
            }
            "update_expression" => {
                self.composite(
                    file,
                    node,
                    CursorKind::UnaryOperator,
                    ExprShape::Unary(UnaryOp::Update),
                )
            }
            "conditional_expression" => {
                self.composite(file, node, CursorKind::ConditionalOperator, ExprShape::Conditional)
            }
            "subscript_expression" => self.lower_subscript(file, node),
            "cast_expression" => {
                let id = self.add_node(CursorKind::CStyleCastExpr, file, node);
                let ty = match node.child_by_field_name("type") {
                    Some(ty) => self.under(id, |this| this.type_descriptor(file, ty, true)),
                    None => TypeId::INVALID,
                };
                self.unit.node_mut(id).ty = ty;
                self.set_shape(id, ExprShape::Fixed);
                if let Some(value) = node.child_by_field_name("value") {
                    self.under(id, |this| this.lower_expr(file, value));
                }
                id
            }
            "sizeof_expression" | "alignof_expression" => {
                let ty = self.unit.types.builtin(TypeKind::ULong);
                let id = self.fixed(file, node, CursorKind::UnaryExpr, ty);
                self.under(id, |this| {
                    if let Some(value) = node.child_by_field_name("value") {
                        this.lower_expr(file, value);
                    }
                    if let Some(ty) = node.child_by_field_name("type") {
                        this.type_descriptor(file, ty, true);
                    }
                });
                id
            }
            "new_expression" => {
                let id = self.add_node(CursorKind::CXXNewExpr, file, node);
                let base = self.under(id, |this| this.specifier_type(file, node, true));
                let ty = if base == TypeId::INVALID {
                    TypeId::INVALID
                } else {
                    self.unit.types.pointer_to(base, false)
                };
                self.unit.node_mut(id).ty = ty;
                self.set_shape(id, ExprShape::Fixed);
                self.under(id, |this| {
                    for field in ["placement", "declarator", "arguments"] {
                        if let Some(part) = node.child_by_field_name(field) {
                            for argument in named_children(part) {
                                this.lower_expr(file, argument);
                            }
                        }
                    }
                });
                id
            }
            "delete_expression" => {
                let ty = self.unit.types.builtin(TypeKind::Void);
                let id = self.fixed(file, node, CursorKind::CXXDeleteExpr, ty);
                self.under(id, |this| {
                    for child in named_children(node) {
                        this.lower_expr(file, child);
                    }
                });
                id
            }
            "lambda_expression" => self.lower_lambda(file, node),
            "initializer_list" => {
                self.composite(file, node, CursorKind::InitListExpr, ExprShape::Opaque)
            }
            "compound_literal_expression" => {
                let id = self.add_node(CursorKind::CXXFunctionalCastExpr, file, node);
                let ty = match node.child_by_field_name("type") {
                    Some(ty) => self.under(id, |this| this.type_descriptor(file, ty, true)),
                    None => TypeId::INVALID,
                };
                self.unit.node_mut(id).ty = ty;
                self.set_shape(id, ExprShape::Fixed);
                if let Some(value) = node.child_by_field_name("value") {
                    self.under(id, |this| this.lower_expr(file, value));
                }
                id
            }
            "ERROR" | "comment" => return None,
            _ if !node.is_named() => return None,
            _ => self.composite(file, node, CursorKind::UnexposedExpr, ExprShape::Opaque),
        };
        Some(id)
    }

    fn fixed(&mut self, file: &FileCtx, node: Node<'_>, kind: CursorKind, ty: TypeId) -> NodeId {
        let id = self.add_node(kind, file, node);
        self.unit.node_mut(id).ty = ty;
        self.set_shape(id, ExprShape::Fixed);
        id
    }

    /// A node whose type derives from its expression children.
    fn composite(
        &mut self,
        file: &FileCtx,
        node: Node<'_>,
        kind: CursorKind,
        shape: ExprShape,
    ) -> NodeId {
        let id = self.add_node(kind, file, node);
        self.set_shape(id, shape);
        self.under(id, |this| {
            for child in named_children(node) {
                if is_expression_syntax(child.kind()) {
                    this.lower_expr(file, child);
                } else if child.kind() == "compound_statement" {
                    this.lower_stmt(file, child);
                }
            }
        });
        id
    }

    /// Wraps `expr` in an implicit conversion node taking its place.
    pub(super) fn wrap_implicit(&mut self, expr: NodeId) -> NodeId {
        let data = self.unit.node(expr);
        let (file, extent, location, parent) =
            (data.file, data.extent, data.location, data.lexical_parent);
        let Some(parent) = parent else {
            return expr;
        };
        let id = self.add_node_with_range(CursorKind::UnexposedExpr, file, extent);
        if let Some(owner) = self.unit.node(id).lexical_parent {
            self.unit.node_mut(owner).children.retain(|child| *child != id);
        }
        let spelling = self.unit.node(expr).spelling.clone();
        let semantic = self.unit.node(expr).semantic_parent;
        {
            let wrapper = self.unit.node_mut(id);
            wrapper.location = location;
            wrapper.spelling = spelling;
            wrapper.lexical_parent = Some(parent);
            wrapper.semantic_parent = semantic;
            wrapper.children = vec![expr];
        }
        let siblings = &mut self.unit.node_mut(parent).children;
        if let Some(slot) = siblings.iter_mut().find(|child| **child == expr) {
            *slot = id;
        }
        self.unit.node_mut(expr).lexical_parent = Some(id);
        self.set_shape(id, ExprShape::Implicit);
        id
    }

    /// Picks the declaration a reference names, preferring a function
    /// taking `arg_count` arguments.
    fn pick_overload(&self, candidates: &[NodeId], arg_count: Option<usize>) -> Option<NodeId> {
        if let Some(count) = arg_count {
            let matching = candidates.iter().copied().find(|id| {
                self.unit.node(*id).kind.is_function_like() && self.parameter_count(*id) == count
            });
            if matching.is_some() {
                return matching;
            }
        }
        candidates.first().copied()
    }

    fn lower_name_ref(
        &mut self,
        file: &FileCtx,
        node: Node<'_>,
        name_node: Node<'_>,
        name: &str,
        arg_count: Option<usize>,
    ) -> NodeId {
        let candidates = self.scopes.lookup(&self.unit.scopes, name);
        let target = self.pick_overload(&candidates, arg_count);
        let kind = match target.map(|target| self.unit.node(target).kind) {
            Some(CursorKind::FieldDecl) => CursorKind::MemberRefExpr,
            _ => CursorKind::DeclRefExpr,
        };
        let id = self.add_node(kind, file, node);
        self.set_name(id, Some(name_node), name);
        self.unit.node_mut(id).referenced = target;
        self.set_shape(id, ExprShape::DeclRef);
        if target.is_none() {
            self.report_undeclared(file, name_node, name, arg_count.is_some());
        }
        id
    }

    fn lower_qualified_ref(
        &mut self,
        file: &FileCtx,
        node: Node<'_>,
        arg_count: Option<usize>,
    ) -> NodeId {
        let id = self.add_node(CursorKind::DeclRefExpr, file, node);
        let (container, leaf) = self.under(id, |this| this.resolve_scope(file, node, true));
        let leaf = if leaf.kind() == "template_function" {
            leaf.child_by_field_name("name").unwrap_or(leaf)
        } else {
            leaf
        };
        let name = file.text_of(leaf).to_owned();
        let target = container.and_then(|container| {
            let candidates = self.unit.scopes.lookup_member(container, &name);
            self.pick_overload(&candidates, arg_count)
        });
        self.set_name(id, Some(leaf), name);
        self.unit.node_mut(id).referenced = target;
        self.set_shape(id, ExprShape::DeclRef);
        id
    }

    fn lower_member(&mut self, file: &FileCtx, node: Node<'_>) -> NodeId {
        let id = self.add_node(CursorKind::MemberRefExpr, file, node);
        let field = node.child_by_field_name("field");
        let name_node = field.map(|field| match field.kind() {
            "template_method" => field.child_by_field_name("name").unwrap_or(field),
            _ => field,
        });
        let name = name_node
            .map(|name| file.text_of(name).to_owned())
            .unwrap_or_default();
        self.set_name(id, name_node, name);
        if let Some(argument) = node.child_by_field_name("argument") {
            self.under(id, |this| this.lower_expr(file, argument));
        }
        let arrow = node
            .child_by_field_name("operator")
            .is_some_and(|op| file.text_of(op) == "->");
        self.set_shape(id, ExprShape::Member { arrow });
        id
    }

    fn lower_call(&mut self, file: &FileCtx, node: Node<'_>) -> Option<NodeId> {
        let function = node.child_by_field_name("function")?;
        let arguments: Vec<Node<'_>> = node
            .child_by_field_name("arguments")
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .filter(|argument| argument.kind() != "comment")
            .collect();

        if function.kind() == "template_function" {
            let cast = function
                .child_by_field_name("name")
                .and_then(|name| named_cast(file.text_of(name)));
            if let Some(kind) = cast {
                let id = self.add_node(kind, file, node);
                let target = function
                    .child_by_field_name("arguments")
                    .and_then(|list| named_children(list).into_iter().next());
                let ty = match target {
                    Some(target) => self.under(id, |this| this.type_descriptor(file, target, true)),
                    None => TypeId::INVALID,
                };
                self.unit.node_mut(id).ty = ty;
                self.set_shape(id, ExprShape::Fixed);
                self.under(id, |this| {
                    for argument in &arguments {
                        this.lower_expr(file, *argument);
                    }
                });
                return Some(id);
            }
        }
        if matches!(function.kind(), "primitive_type" | "sized_type_specifier") {
            let id = self.add_node(CursorKind::CXXFunctionalCastExpr, file, node);
            let ty = self.type_specifier(file, function, false);
            self.unit.node_mut(id).ty = ty;
            self.set_shape(id, ExprShape::Fixed);
            self.under(id, |this| {
                for argument in &arguments {
                    this.lower_expr(file, *argument);
                }
            });
            return Some(id);
        }

        let id = self.add_node(CursorKind::CallExpr, file, node);
        let count = Some(arguments.len());
        let callee = self.under(id, |this| match function.kind() {
            "identifier" => {
                let name = file.text_of(function).to_owned();
                Some(this.lower_name_ref(file, function, function, &name, count))
            }
            "qualified_identifier" => Some(this.lower_qualified_ref(file, function, count)),
            "template_function" => {
                let name_node = function.child_by_field_name("name")?;
                let name = file.text_of(name_node).to_owned();
                Some(this.lower_name_ref(file, function, name_node, &name, count))
            }
            _ => this.lower_expr(file, function),
        });
        if let Some(callee) = callee {
            let (spelling, location) = {
                let data = self.unit.node(callee);
                (data.spelling.clone(), data.location)
            };
            let data = self.unit.node_mut(id);
            data.spelling = spelling;
            data.location = location;
        }
        self.under(id, |this| {
            for argument in &arguments {
                this.lower_expr(file, *argument);
            }
        });
        self.set_shape(id, ExprShape::Call);
        Some(id)
    }

    fn lower_subscript(&mut self, file: &FileCtx, node: Node<'_>) -> NodeId {
        let id = self.add_node(CursorKind::ArraySubscriptExpr, file, node);
        self.under(id, |this| {
            if let Some(argument) = node.child_by_field_name("argument") {
                this.lower_expr(file, argument);
            }
            if let Some(indices) = node.child_by_field_name("indices") {
                for index in named_children(indices) {
                    this.lower_expr(file, index);
                }
            } else if let Some(index) = node.child_by_field_name("index") {
                this.lower_expr(file, index);
            }
        });
        self.set_shape(id, ExprShape::Subscript);
        id
    }

    fn lower_string(&mut self, file: &FileCtx, node: Node<'_>) -> NodeId {
        let parts = if node.kind() == "concatenated_string" {
            named_children(node)
                .into_iter()
                .filter(|part| matches!(part.kind(), "string_literal" | "raw_string_literal"))
                .collect()
        } else {
            vec![node]
        };
        let mut kind = TypeKind::CharS;
        let mut len = 1;
        for part in parts {
            let (part_kind, part_len) = string_literal_shape(file.text_of(part));
            if part_kind != TypeKind::CharS {
                kind = part_kind;
            }
            len += part_len - 1;
        }
        let element = self.unit.types.builtin(kind);
        let element = self.unit.types.with_const(element);
        let ty = self.unit.types.array_of(element, Some(len));
        self.fixed(file, node, CursorKind::StringLiteral, ty)
    }

    fn lower_lambda(&mut self, file: &FileCtx, node: Node<'_>) -> NodeId {
        let id = self.add_node(CursorKind::LambdaExpr, file, node);
        let location = self.unit.source_location(file.id, offset(node.start_byte()));
        let spelling = format!(
            "(lambda at {}:{}:{})",
            location.file.display(),
            location.line,
            location.column
        );
        let ty = self.unit.types.unexposed(spelling);
        self.unit.node_mut(id).ty = ty;
        self.set_shape(id, ExprShape::Fixed);
        let owner = self.decl_context.last().copied().unwrap_or(NodeId::ROOT);
        self.within_frame(Frame::block(), |this| {
            this.under(id, |this| {
                let declarator = node.child_by_field_name("declarator");
                for param in this.lower_parameters(file, declarator, owner) {
                    let name = this.unit.node(param).spelling.clone();
                    this.declare(&name, param);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    this.lower_stmt(file, body);
                }
            });
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_literal_types_follow_suffixes() {
        assert_eq!(number_literal_kind("42").1, TypeKind::Int);
        assert_eq!(number_literal_kind("42u").1, TypeKind::UInt);
        assert_eq!(number_literal_kind("42UL").1, TypeKind::ULong);
        assert_eq!(number_literal_kind("42ll").1, TypeKind::LongLong);
        assert_eq!(number_literal_kind("0xff").1, TypeKind::Int);
        assert_eq!(number_literal_kind("1.5").1, TypeKind::Double);
        assert_eq!(number_literal_kind("1.5f").1, TypeKind::Float);
        assert_eq!(number_literal_kind("1e3L").1, TypeKind::LongDouble);
        assert_eq!(number_literal_kind("1.5").0, CursorKind::FloatingLiteral);
    }

    #[test]
    fn string_lengths_count_escapes_once() {
        assert_eq!(string_literal_shape("\"abc\""), (TypeKind::CharS, 4));
        assert_eq!(string_literal_shape("\"a\\nb\""), (TypeKind::CharS, 4));
        assert_eq!(string_literal_shape("\"\\x41\\101\""), (TypeKind::CharS, 3));
        assert_eq!(string_literal_shape("L\"ab\""), (TypeKind::WChar, 3));
        assert_eq!(string_literal_shape("R\"(a\\b)\""), (TypeKind::CharS, 4));
    }
}
