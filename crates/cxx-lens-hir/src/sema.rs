//! Expression typing.
//!
//! Lowering records the shape of every expression; this pass computes the
//! types that depend on other nodes (references, calls, member accesses,
//! operators) once the whole translation unit is known, so that uses of
//! entities declared later in a class body resolve too.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::cursor::CursorKind;
use crate::types::{TypeId, TypeKind};
use crate::unit::{NodeId, TranslationUnit};

/// How an expression's type is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExprShape {
    /// Type was fixed during lowering.
    Fixed,
    /// Type of the referenced declaration.
    DeclRef,
    /// Member access; the first child is the object expression.
    Member { arrow: bool },
    /// Call; the first child is the callee.
    Call,
    /// `(e)`.
    Paren,
    /// Implicit conversion of the only child.
    Implicit,
    Unary(UnaryOp),
    Binary(BinaryOp),
    /// `c ? a : b`.
    Conditional,
    /// `a[i]`.
    Subscript,
    /// No type (`{...}` and unmodelled expressions).
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    /// `+`, `-`, `~`: integral promotion.
    Promote,
    AddressOf,
    Deref,
    /// `++`/`--`.
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Arithmetic,
    Shift,
    Comparison,
    Logical,
    Assign,
    Comma,
}

/// Side tables produced by lowering.
pub(crate) struct Facts<'a> {
    pub(crate) shapes: &'a FxHashMap<NodeId, ExprShape>,
    /// Variable to its initializer expression.
    pub(crate) initializers: &'a FxHashMap<NodeId, NodeId>,
    /// Range-for variable to the range expression.
    pub(crate) range_loops: &'a FxHashMap<NodeId, NodeId>,
    /// `decltype(e)` types to the expression they name.
    pub(crate) decltypes: &'a [(TypeId, NodeId)],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Pending,
    InProgress,
    Done,
}

pub(crate) fn analyze(unit: &mut TranslationUnit, facts: &Facts<'_>) {
    let mut sema = Sema {
        unit,
        facts,
        states: FxHashMap::default(),
        returns: FxHashMap::default(),
    };
    for (ty, expr) in facts.decltypes {
        let named = sema.type_of(*expr);
        let canonical = sema.unit.types.canonical(named);
        if named != TypeId::INVALID {
            sema.unit.types.get_mut(*ty).canonical = Some(canonical);
        }
    }
    let mut ids: Vec<NodeId> = facts.shapes.keys().copied().collect();
    ids.sort_unstable();
    for id in ids {
        sema.type_of(id);
    }
}

struct Sema<'u, 'f> {
    unit: &'u mut TranslationUnit,
    facts: &'f Facts<'f>,
    states: FxHashMap<NodeId, State>,
    /// Deduced result types of `auto` functions.
    returns: FxHashMap<NodeId, Option<TypeId>>,
}

impl Sema<'_, '_> {
    fn type_of(&mut self, id: NodeId) -> TypeId {
        let Some(shape) = self.facts.shapes.get(&id).copied() else {
            return self.unit.node(id).ty;
        };
        match self.states.get(&id).copied().unwrap_or(State::Pending) {
            State::Done => return self.unit.node(id).ty,
            State::InProgress => return TypeId::INVALID,
            State::Pending => {}
        }
        self.states.insert(id, State::InProgress);
        let ty = match shape {
            ExprShape::Fixed => self.unit.node(id).ty,
            ExprShape::DeclRef => self
                .unit
                .node(id)
                .referenced
                .map_or(TypeId::INVALID, |decl| self.value_type(decl)),
            ExprShape::Member { arrow } => self.member_type(id, arrow),
            ExprShape::Call => self.call_type(id),
            ExprShape::Paren => self.child_type(id, 0),
            ExprShape::Implicit => {
                let inner = self.child_type(id, 0);
                let inner = self.unit.types.non_reference(inner);
                self.unit.types.decay(inner)
            }
            ExprShape::Unary(op) => self.unary_type(id, op),
            ExprShape::Binary(op) => self.binary_type(id, op),
            ExprShape::Conditional => {
                let then = self.child_type(id, 1);
                if then == TypeId::INVALID {
                    self.child_type(id, 2)
                } else {
                    then
                }
            }
            ExprShape::Subscript => {
                let base = self.child_type(id, 0);
                let base = self.unit.types.non_reference(base);
                let canonical = self.unit.types.canonical(base);
                self.unit.types.get(canonical).pointee.unwrap_or(TypeId::INVALID)
            }
            ExprShape::Opaque => TypeId::INVALID,
        };
        self.unit.node_mut(id).ty = ty;
        self.states.insert(id, State::Done);
        ty
    }

    fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.unit.node(id).children.get(index).copied()
    }

    /// Type of the `index`th expression child, skipping reference cursors.
    fn child_type(&mut self, id: NodeId, index: usize) -> TypeId {
        let child = self
            .unit
            .node(id)
            .children
            .iter()
            .copied()
            .filter(|child| !self.unit.node(*child).kind.is_reference())
            .nth(index);
        child.map_or(TypeId::INVALID, |child| self.type_of(child))
    }

    /// Type of an expression naming `decl`.
    fn value_type(&mut self, decl: NodeId) -> TypeId {
        let node = self.unit.node(decl);
        let declared = node.ty;
        match node.kind {
            CursorKind::VarDecl | CursorKind::ParmDecl | CursorKind::FieldDecl => {
                if !self.mentions_placeholder(declared) {
                    return declared;
                }
                let source = if let Some(init) = self.facts.initializers.get(&decl).copied() {
                    self.type_of(init)
                } else if let Some(range) = self.facts.range_loops.get(&decl).copied() {
                    let range = self.type_of(range);
                    self.element_type(range)
                } else {
                    TypeId::INVALID
                };
                if source == TypeId::INVALID {
                    return declared;
                }
                self.substitute_placeholder(declared, source)
            }
            CursorKind::EnumConstantDecl => declared,
            kind if kind.is_function_like() => declared,
            _ => TypeId::INVALID,
        }
    }

    fn mentions_placeholder(&self, ty: TypeId) -> bool {
        let data = self.unit.types.get(ty);
        match data.kind {
            TypeKind::Auto => true,
            TypeKind::LValueReference | TypeKind::RValueReference | TypeKind::Pointer => data
                .pointee
                .is_some_and(|pointee| self.unit.types.kind(pointee) == TypeKind::Auto),
            _ => false,
        }
    }

    /// Replaces the placeholder in `declared` by what `source` deduces.
    fn substitute_placeholder(&mut self, declared: TypeId, source: TypeId) -> TypeId {
        let data = self.unit.types.get(declared);
        let (kind, is_const, pointee) = (data.kind, data.is_const, data.pointee);
        let value = self.unit.types.non_reference(source);
        match kind {
            TypeKind::Auto => {
                let value = self.unit.types.decay(value);
                if is_const {
                    self.unit.types.with_const(value)
                } else {
                    value
                }
            }
            TypeKind::LValueReference | TypeKind::RValueReference => {
                let pointee_const = pointee.is_some_and(|p| self.unit.types.get(p).is_const);
                let value = if pointee_const {
                    self.unit.types.with_const(value)
                } else {
                    value
                };
                self.unit
                    .types
                    .reference_to(value, kind == TypeKind::RValueReference)
            }
            TypeKind::Pointer => self.unit.types.decay(value),
            _ => declared,
        }
    }

    fn element_type(&mut self, range: TypeId) -> TypeId {
        let range = self.unit.types.non_reference(range);
        let canonical = self.unit.types.canonical(range);
        match self.unit.types.kind(canonical) {
            TypeKind::ConstantArray | TypeKind::IncompleteArray => self
                .unit
                .types
                .get(range)
                .pointee
                .or(self.unit.types.get(canonical).pointee)
                .unwrap_or(TypeId::INVALID),
            _ => TypeId::INVALID,
        }
    }

    fn member_type(&mut self, id: NodeId, arrow: bool) -> TypeId {
        let base = self.child_type(id, 0);
        let mut object = self.unit.types.non_reference(base);
        if arrow {
            let canonical = self.unit.types.canonical(object);
            object = match self.unit.types.kind(canonical) {
                TypeKind::Pointer => self
                    .unit
                    .types
                    .get(canonical)
                    .pointee
                    .unwrap_or(TypeId::INVALID),
                _ => TypeId::INVALID,
            };
        }
        let canonical = self.unit.types.canonical(object);
        let Some(record) = self.unit.types.get(canonical).declaration else {
            return TypeId::INVALID;
        };
        let name: SmolStr = self.unit.node(id).spelling.clone();
        let record = self.unit.node(record).canonical.unwrap_or(record);
        let Some(member) = self.unit.scopes.lookup_member(record, &name).first().copied() else {
            return TypeId::INVALID;
        };
        self.unit.node_mut(id).referenced = Some(member);
        self.value_type(member)
    }

    fn call_type(&mut self, id: NodeId) -> TypeId {
        let Some(callee) = self.child(id, 0) else {
            return TypeId::INVALID;
        };
        let callee_type = self.type_of(callee);
        let target = self.unit.node(callee).referenced;
        self.unit.node_mut(id).referenced = target;
        if let Some(target) = target {
            let kind = self.unit.node(target).kind;
            if kind.is_type_declaration() {
                let written = self.unit.node(target).spelling.to_string();
                return self.record_value(target, &written);
            }
            if kind.is_function_like() {
                return self.function_result(target);
            }
        }
        let canonical = self.unit.types.canonical(callee_type);
        let canonical = self.unit.types.non_reference(canonical);
        let function = match self.unit.types.kind(canonical) {
            TypeKind::Pointer => self.unit.types.get(canonical).pointee.unwrap_or(TypeId::INVALID),
            _ => canonical,
        };
        self.unit.types.get(function).result.unwrap_or(TypeId::INVALID)
    }

    /// Type produced by constructing `decl`.
    fn record_value(&mut self, decl: NodeId, written: &str) -> TypeId {
        let node = self.unit.node(decl);
        match node.kind {
            CursorKind::TypedefDecl
            | CursorKind::TypeAliasDecl
            | CursorKind::TemplateTypeParameter => node.ty,
            CursorKind::EnumDecl => node.ty,
            _ => {
                let existing = node.ty;
                if existing == TypeId::INVALID {
                    self.unit.types.unexposed(written)
                } else {
                    existing
                }
            }
        }
    }

    /// Result type of a call to `function`, deducing `auto` results from
    /// the first returned expression.
    fn function_result(&mut self, function: NodeId) -> TypeId {
        let fn_type = self.unit.node(function).ty;
        let result = self.unit.types.get(fn_type).result.unwrap_or(TypeId::INVALID);
        if self.unit.types.kind(result) != TypeKind::Auto {
            return result;
        }
        if let Some(deduced) = self.returns.get(&function).copied() {
            return deduced.unwrap_or(result);
        }
        self.returns.insert(function, None);
        let deduced = self
            .definition_of(function)
            .and_then(|definition| self.first_return_value(definition))
            .map(|value| self.type_of(value))
            .filter(|ty| *ty != TypeId::INVALID && self.unit.types.kind(*ty) != TypeKind::Auto);
        self.returns.insert(function, deduced);
        deduced.unwrap_or(result)
    }

    fn definition_of(&self, function: NodeId) -> Option<NodeId> {
        let canonical = self.unit.node(function).canonical.unwrap_or(function);
        self.unit
            .nodes
            .iter()
            .enumerate()
            .find(|(_, node)| {
                node.is_definition
                    && node.kind.is_function_like()
                    && node.canonical == Some(canonical)
            })
            .map(|(index, _)| NodeId(index as u32))
    }

    fn first_return_value(&self, function: NodeId) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self
            .unit
            .node(function)
            .children
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(id) = stack.pop() {
            let node = self.unit.node(id);
            if node.kind == CursorKind::ReturnStmt {
                return node.children.first().copied();
            }
            if node.kind == CursorKind::LambdaExpr {
                continue;
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    fn unary_type(&mut self, id: NodeId, op: UnaryOp) -> TypeId {
        let operand = self.child_type(id, 0);
        match op {
            UnaryOp::Not => self.unit.types.builtin(TypeKind::Bool),
            UnaryOp::Promote => {
                let operand = self.unit.types.non_reference(operand);
                self.promote(operand)
            }
            UnaryOp::AddressOf => {
                if operand == TypeId::INVALID {
                    return TypeId::INVALID;
                }
                let operand = self.unit.types.non_reference(operand);
                self.unit.types.pointer_to(operand, false)
            }
            UnaryOp::Deref => {
                let operand = self.unit.types.non_reference(operand);
                let data = self.unit.types.get(operand);
                let pointee = if data.kind == TypeKind::Pointer {
                    data.pointee
                } else {
                    let canonical = self.unit.types.canonical(operand);
                    let data = self.unit.types.get(canonical);
                    (data.kind == TypeKind::Pointer).then_some(data.pointee).flatten()
                };
                pointee.unwrap_or(TypeId::INVALID)
            }
            UnaryOp::Update => operand,
        }
    }

    fn promote(&mut self, ty: TypeId) -> TypeId {
        let kind = self.unit.types.canonical_kind(ty);
        match kind.integer_rank() {
            Some(rank) if rank < 3 => self.unit.types.builtin(TypeKind::Int),
            Some(_) if matches!(kind, TypeKind::WChar | TypeKind::Char16 | TypeKind::Char32) => {
                self.unit.types.builtin(TypeKind::Int)
            }
            Some(_) => self.unit.types.builtin(kind),
            None if kind.is_floating() => self.unit.types.builtin(kind),
            None => self.unit.types.without_const(ty),
        }
    }

    fn binary_type(&mut self, id: NodeId, op: BinaryOp) -> TypeId {
        let left = self.child_type(id, 0);
        let right = self.child_type(id, 1);
        match op {
            BinaryOp::Comparison | BinaryOp::Logical => self.unit.types.builtin(TypeKind::Bool),
            BinaryOp::Assign => left,
            BinaryOp::Comma => right,
            BinaryOp::Shift => {
                let left = self.unit.types.non_reference(left);
                self.promote(left)
            }
            BinaryOp::Arithmetic => {
                let left = self.unit.types.non_reference(left);
                let right = self.unit.types.non_reference(right);
                self.arithmetic(left, right)
            }
        }
    }

    /// Usual arithmetic conversions, plus pointer arithmetic.
    fn arithmetic(&mut self, left: TypeId, right: TypeId) -> TypeId {
        let left_kind = self.unit.types.canonical_kind(left);
        let right_kind = self.unit.types.canonical_kind(right);
        let left_pointer = matches!(
            left_kind,
            TypeKind::Pointer | TypeKind::ConstantArray | TypeKind::IncompleteArray
        );
        let right_pointer = matches!(
            right_kind,
            TypeKind::Pointer | TypeKind::ConstantArray | TypeKind::IncompleteArray
        );
        match (left_pointer, right_pointer) {
            (true, true) => return self.unit.types.builtin(TypeKind::Long),
            (true, false) => return self.unit.types.decay(left),
            (false, true) => return self.unit.types.decay(right),
            (false, false) => {}
        }
        if !left_kind.is_arithmetic() || !right_kind.is_arithmetic() {
            return if left_kind.is_arithmetic() { right } else { left };
        }
        for floating in [TypeKind::LongDouble, TypeKind::Double, TypeKind::Float] {
            if left_kind == floating || right_kind == floating {
                return self.unit.types.builtin(floating);
            }
        }
        let left = self.promoted_kind(left_kind);
        let right = self.promoted_kind(right_kind);
        let (left_rank, right_rank) = (
            left.integer_rank().unwrap_or(3),
            right.integer_rank().unwrap_or(3),
        );
        let kind = match left_rank.cmp(&right_rank) {
            std::cmp::Ordering::Greater => left,
            std::cmp::Ordering::Less => right,
            std::cmp::Ordering::Equal if right.is_unsigned() => right,
            std::cmp::Ordering::Equal => left,
        };
        self.unit.types.builtin(kind)
    }

    fn promoted_kind(&self, kind: TypeKind) -> TypeKind {
        match kind.integer_rank() {
            Some(rank) if rank < 3 => TypeKind::Int,
            Some(_) if matches!(kind, TypeKind::WChar | TypeKind::Char16 | TypeKind::Char32) => {
                TypeKind::Int
            }
            _ => kind,
        }
    }
}
