//! Cursors: read-only handles onto the nodes of a translation unit.

use std::fmt;
use std::path::Path;

use text_size::TextRange;

use crate::types::{Type, TypeId};
use crate::unit::{NodeId, SourceLocation, SourceRange, TranslationUnit};

/// Kind of a cursor, named after libclang's `CXCursorKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorKind {
    /// The translation unit itself.
    TranslationUnit,

    // Declarations
    /// `namespace N { ... }`.
    Namespace,
    /// `struct S`.
    StructDecl,
    /// `class C`.
    ClassDecl,
    /// `union U`.
    UnionDecl,
    /// `enum E`.
    EnumDecl,
    /// Enumerator inside an enum.
    EnumConstantDecl,
    /// Non-static data member.
    FieldDecl,
    /// Free function.
    FunctionDecl,
    /// Member function.
    CXXMethod,
    /// Constructor.
    Constructor,
    /// Destructor.
    Destructor,
    /// `operator T()`.
    ConversionFunction,
    /// Function template.
    FunctionTemplate,
    /// Class template.
    ClassTemplate,
    /// Variable, including static data members.
    VarDecl,
    /// Function or lambda parameter.
    ParmDecl,
    /// `typedef`.
    TypedefDecl,
    /// `using X = T;`.
    TypeAliasDecl,
    /// `template <typename T>` parameter.
    TemplateTypeParameter,
    /// `using namespace N;`.
    UsingDirective,

    // References
    /// Reference to a type name.
    TypeRef,
    /// Reference to a namespace name.
    NamespaceRef,
    /// Reference to a template name.
    TemplateRef,

    // Expressions
    /// Expression the front end does not classify further.
    UnexposedExpr,
    /// Reference to a declaration.
    DeclRefExpr,
    /// Member access or implicit member reference.
    MemberRefExpr,
    /// Call or construction.
    CallExpr,
    /// Integer literal.
    IntegerLiteral,
    /// Floating-point literal.
    FloatingLiteral,
    /// String literal.
    StringLiteral,
    /// Character literal.
    CharacterLiteral,
    /// `(expr)`.
    ParenExpr,
    /// Prefix/postfix operator.
    UnaryOperator,
    /// Binary operator.
    BinaryOperator,
    /// `a += b` and friends.
    CompoundAssignOperator,
    /// `c ? a : b`.
    ConditionalOperator,
    /// `(T)expr`.
    CStyleCastExpr,
    /// `a[i]`.
    ArraySubscriptExpr,
    /// `{...}`.
    InitListExpr,
    /// `sizeof`/`alignof`.
    UnaryExpr,
    /// `static_cast<T>(expr)`.
    CXXStaticCastExpr,
    /// `dynamic_cast<T>(expr)`.
    CXXDynamicCastExpr,
    /// `reinterpret_cast<T>(expr)`.
    CXXReinterpretCastExpr,
    /// `const_cast<T>(expr)`.
    CXXConstCastExpr,
    /// `T(expr)`.
    CXXFunctionalCastExpr,
    /// `true` / `false`.
    CXXBoolLiteralExpr,
    /// `nullptr`.
    CXXNullPtrLiteralExpr,
    /// `this`.
    CXXThisExpr,
    /// `new T`.
    CXXNewExpr,
    /// `delete p`.
    CXXDeleteExpr,
    /// Lambda expression.
    LambdaExpr,

    // Statements
    /// Statement the front end does not classify further.
    UnexposedStmt,
    /// `{ ... }`.
    CompoundStmt,
    /// Declaration used as a statement.
    DeclStmt,
    /// `return`.
    ReturnStmt,
    /// `if`.
    IfStmt,
    /// `for (;;)`.
    ForStmt,
    /// `for (x : range)`.
    CXXForRangeStmt,
    /// `while`.
    WhileStmt,
    /// `do ... while`.
    DoStmt,
    /// `switch`.
    SwitchStmt,
    /// `case`.
    CaseStmt,
    /// `default:`.
    DefaultStmt,
    /// `break`.
    BreakStmt,
    /// `continue`.
    ContinueStmt,

    // Preprocessing
    /// `#include`.
    InclusionDirective,
}

impl CursorKind {
    /// libclang's name for this kind.
    #[must_use]
    pub const fn spelling(self) -> &'static str {
        match self {
            Self::TranslationUnit => "TranslationUnit",
            Self::Namespace => "Namespace",
            Self::StructDecl => "StructDecl",
            Self::ClassDecl => "ClassDecl",
            Self::UnionDecl => "UnionDecl",
            Self::EnumDecl => "EnumDecl",
            Self::EnumConstantDecl => "EnumConstantDecl",
            Self::FieldDecl => "FieldDecl",
            Self::FunctionDecl => "FunctionDecl",
            Self::CXXMethod => "CXXMethod",
            Self::Constructor => "Constructor",
            Self::Destructor => "Destructor",
            Self::ConversionFunction => "ConversionFunction",
            Self::FunctionTemplate => "FunctionTemplate",
            Self::ClassTemplate => "ClassTemplate",
            Self::VarDecl => "VarDecl",
            Self::ParmDecl => "ParmDecl",
            Self::TypedefDecl => "TypedefDecl",
            Self::TypeAliasDecl => "TypeAliasDecl",
            Self::TemplateTypeParameter => "TemplateTypeParameter",
            Self::UsingDirective => "UsingDirective",
            Self::TypeRef => "TypeRef",
            Self::NamespaceRef => "NamespaceRef",
            Self::TemplateRef => "TemplateRef",
            Self::UnexposedExpr => "UnexposedExpr",
            Self::DeclRefExpr => "DeclRefExpr",
            Self::MemberRefExpr => "MemberRefExpr",
            Self::CallExpr => "CallExpr",
            Self::IntegerLiteral => "IntegerLiteral",
            Self::FloatingLiteral => "FloatingLiteral",
            Self::StringLiteral => "StringLiteral",
            Self::CharacterLiteral => "CharacterLiteral",
            Self::ParenExpr => "ParenExpr",
            Self::UnaryOperator => "UnaryOperator",
            Self::BinaryOperator => "BinaryOperator",
            Self::CompoundAssignOperator => "CompoundAssignOperator",
            Self::ConditionalOperator => "ConditionalOperator",
            Self::CStyleCastExpr => "CStyleCastExpr",
            Self::ArraySubscriptExpr => "ArraySubscriptExpr",
            Self::InitListExpr => "InitListExpr",
            Self::UnaryExpr => "UnaryExpr",
            Self::CXXStaticCastExpr => "CXXStaticCastExpr",
            Self::CXXDynamicCastExpr => "CXXDynamicCastExpr",
            Self::CXXReinterpretCastExpr => "CXXReinterpretCastExpr",
            Self::CXXConstCastExpr => "CXXConstCastExpr",
            Self::CXXFunctionalCastExpr => "CXXFunctionalCastExpr",
            Self::CXXBoolLiteralExpr => "CXXBoolLiteralExpr",
            Self::CXXNullPtrLiteralExpr => "CXXNullPtrLiteralExpr",
            Self::CXXThisExpr => "CXXThisExpr",
            Self::CXXNewExpr => "CXXNewExpr",
            Self::CXXDeleteExpr => "CXXDeleteExpr",
            Self::LambdaExpr => "LambdaExpr",
            Self::UnexposedStmt => "UnexposedStmt",
            Self::CompoundStmt => "CompoundStmt",
            Self::DeclStmt => "DeclStmt",
            Self::ReturnStmt => "ReturnStmt",
            Self::IfStmt => "IfStmt",
            Self::ForStmt => "ForStmt",
            Self::CXXForRangeStmt => "CXXForRangeStmt",
            Self::WhileStmt => "WhileStmt",
            Self::DoStmt => "DoStmt",
            Self::SwitchStmt => "SwitchStmt",
            Self::CaseStmt => "CaseStmt",
            Self::DefaultStmt => "DefaultStmt",
            Self::BreakStmt => "BreakStmt",
            Self::ContinueStmt => "ContinueStmt",
            Self::InclusionDirective => "InclusionDirective",
        }
    }

    /// Returns true for declaration kinds.
    #[must_use]
    pub const fn is_declaration(self) -> bool {
        matches!(
            self,
            Self::Namespace
                | Self::StructDecl
                | Self::ClassDecl
                | Self::UnionDecl
                | Self::EnumDecl
                | Self::EnumConstantDecl
                | Self::FieldDecl
                | Self::FunctionDecl
                | Self::CXXMethod
                | Self::Constructor
                | Self::Destructor
                | Self::ConversionFunction
                | Self::FunctionTemplate
                | Self::ClassTemplate
                | Self::VarDecl
                | Self::ParmDecl
                | Self::TypedefDecl
                | Self::TypeAliasDecl
                | Self::TemplateTypeParameter
                | Self::UsingDirective
        )
    }

    /// Returns true for reference kinds (`TypeRef`, `NamespaceRef`, `TemplateRef`).
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::TypeRef | Self::NamespaceRef | Self::TemplateRef)
    }

    /// Returns true for function-like declarations.
    #[must_use]
    pub const fn is_function_like(self) -> bool {
        matches!(
            self,
            Self::FunctionDecl
                | Self::CXXMethod
                | Self::Constructor
                | Self::Destructor
                | Self::ConversionFunction
                | Self::FunctionTemplate
        )
    }

    /// Returns true for class, struct, union and class template declarations.
    #[must_use]
    pub const fn is_record(self) -> bool {
        matches!(
            self,
            Self::StructDecl | Self::ClassDecl | Self::UnionDecl | Self::ClassTemplate
        )
    }

    /// Returns true for declarations that introduce a type name.
    #[must_use]
    pub const fn is_type_declaration(self) -> bool {
        self.is_record()
            || matches!(
                self,
                Self::EnumDecl
                    | Self::TypedefDecl
                    | Self::TypeAliasDecl
                    | Self::TemplateTypeParameter
            )
    }

    /// Returns true for expression kinds.
    #[must_use]
    pub const fn is_expression(self) -> bool {
        matches!(
            self,
            Self::UnexposedExpr
                | Self::DeclRefExpr
                | Self::MemberRefExpr
                | Self::CallExpr
                | Self::IntegerLiteral
                | Self::FloatingLiteral
                | Self::StringLiteral
                | Self::CharacterLiteral
                | Self::ParenExpr
                | Self::UnaryOperator
                | Self::BinaryOperator
                | Self::CompoundAssignOperator
                | Self::ConditionalOperator
                | Self::CStyleCastExpr
                | Self::ArraySubscriptExpr
                | Self::InitListExpr
                | Self::UnaryExpr
                | Self::CXXStaticCastExpr
                | Self::CXXDynamicCastExpr
                | Self::CXXReinterpretCastExpr
                | Self::CXXConstCastExpr
                | Self::CXXFunctionalCastExpr
                | Self::CXXBoolLiteralExpr
                | Self::CXXNullPtrLiteralExpr
                | Self::CXXThisExpr
                | Self::CXXNewExpr
                | Self::CXXDeleteExpr
                | Self::LambdaExpr
        )
    }

    /// Returns true for statement kinds.
    #[must_use]
    pub const fn is_statement(self) -> bool {
        matches!(
            self,
            Self::UnexposedStmt
                | Self::CompoundStmt
                | Self::DeclStmt
                | Self::ReturnStmt
                | Self::IfStmt
                | Self::ForStmt
                | Self::CXXForRangeStmt
                | Self::WhileStmt
                | Self::DoStmt
                | Self::SwitchStmt
                | Self::CaseStmt
                | Self::DefaultStmt
                | Self::BreakStmt
                | Self::ContinueStmt
        )
    }
}

impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}

/// What [`Cursor::visit_children`] does after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildVisit {
    /// Stop the whole traversal.
    Break,
    /// Skip the children of the current node.
    Continue,
    /// Descend into the children of the current node.
    Recurse,
}

/// A node of a translation unit.
#[derive(Clone, Copy)]
pub struct Cursor<'tu> {
    unit: &'tu TranslationUnit,
    id: NodeId,
}

impl<'tu> Cursor<'tu> {
    pub(crate) fn new(unit: &'tu TranslationUnit, id: NodeId) -> Self {
        Self { unit, id }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    /// Translation unit the cursor belongs to.
    #[must_use]
    pub fn translation_unit(&self) -> &'tu TranslationUnit {
        self.unit
    }

    /// Kind of the node.
    #[must_use]
    pub fn kind(&self) -> CursorKind {
        self.unit.node(self.id).kind
    }

    /// Name of the entity (declarations, references) or of the callee/member.
    #[must_use]
    pub fn spelling(&self) -> &'tu str {
        &self.unit.node(self.id).spelling
    }

    /// Enclosing scope of a declaration or enclosing declaration of a
    /// statement/expression; `None` for references, directives and the root.
    #[must_use]
    pub fn semantic_parent(&self) -> Option<Cursor<'tu>> {
        self.unit
            .node(self.id)
            .semantic_parent
            .map(|id| Self::new(self.unit, id))
    }

    /// Syntactic parent.
    #[must_use]
    pub fn lexical_parent(&self) -> Option<Cursor<'tu>> {
        self.unit
            .node(self.id)
            .lexical_parent
            .map(|id| Self::new(self.unit, id))
    }

    /// Direct children in source order.
    pub fn children(&self) -> impl Iterator<Item = Cursor<'tu>> + 'tu {
        let unit = self.unit;
        unit.node(self.id)
            .children
            .iter()
            .map(move |id| Cursor::new(unit, *id))
    }

    /// Depth-first pre-order traversal of the descendants.
    ///
    /// The visitor receives each node and its parent. Returns true when the
    /// traversal was stopped by [`ChildVisit::Break`].
    pub fn visit_children<F>(&self, mut visitor: F) -> bool
    where
        F: FnMut(Cursor<'tu>, Cursor<'tu>) -> ChildVisit,
    {
        self.visit_with(&mut visitor)
    }

    fn visit_with<F>(&self, visitor: &mut F) -> bool
    where
        F: FnMut(Cursor<'tu>, Cursor<'tu>) -> ChildVisit,
    {
        for child in self.children() {
            match visitor(child, *self) {
                ChildVisit::Break => return true,
                ChildVisit::Continue => {}
                ChildVisit::Recurse => {
                    if child.visit_with(visitor) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Type of the declaration or expression.
    #[must_use]
    pub fn ty(&self) -> Type<'tu> {
        Type::new(self.unit, self.unit.node(self.id).ty)
    }

    /// Result type of a function-like declaration; invalid otherwise.
    #[must_use]
    pub fn result_type(&self) -> Type<'tu> {
        if !self.kind().is_function_like() {
            return Type::new(self.unit, TypeId::INVALID);
        }
        self.ty().result_type()
    }

    /// Underlying type of a typedef or alias declaration.
    #[must_use]
    pub fn typedef_underlying_type(&self) -> Option<Type<'tu>> {
        self.unit
            .typedef_underlying
            .get(&self.id)
            .map(|id| Type::new(self.unit, *id))
    }

    /// Declaration this cursor refers to. Declarations refer to themselves.
    #[must_use]
    pub fn referenced(&self) -> Option<Cursor<'tu>> {
        if self.kind().is_declaration() {
            return Some(*self);
        }
        self.unit
            .node(self.id)
            .referenced
            .map(|id| Self::new(self.unit, id))
    }

    /// First declaration of the entity; other cursors are their own canonical cursor.
    #[must_use]
    pub fn canonical(&self) -> Cursor<'tu> {
        self.unit
            .node(self.id)
            .canonical
            .map_or(*self, |id| Self::new(self.unit, id))
    }

    /// Position of the cursor's name (or start for unnamed nodes).
    #[must_use]
    pub fn location(&self) -> SourceLocation {
        let node = self.unit.node(self.id);
        self.unit.source_location(node.file, node.location)
    }

    /// Full source range of the node.
    #[must_use]
    pub fn extent(&self) -> SourceRange {
        let node = self.unit.node(self.id);
        SourceRange {
            start: self.unit.source_location(node.file, node.extent.start()),
            end: self.unit.source_location(node.file, node.extent.end()),
        }
    }

    pub(crate) fn text_range(&self) -> TextRange {
        self.unit.node(self.id).extent
    }

    /// Brief documentation comment attached to a declaration.
    #[must_use]
    pub fn brief_comment(&self) -> Option<&'tu str> {
        self.unit.node(self.id).brief_comment.as_deref()
    }

    /// File named by an inclusion directive, when it could be resolved.
    #[must_use]
    pub fn included_file(&self) -> Option<&'tu Path> {
        self.unit
            .node(self.id)
            .included_file
            .map(|file| self.unit.file_path(file))
    }

    /// Returns true when the declaration is also a definition.
    #[must_use]
    pub fn is_definition(&self) -> bool {
        self.unit.node(self.id).is_definition
    }
}

impl PartialEq for Cursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.unit, other.unit) && self.id == other.id
    }
}

impl Eq for Cursor<'_> {}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.location();
        write!(
            f,
            "{} {:?} @{}:{}",
            self.kind(),
            self.spelling(),
            location.line,
            location.column
        )
    }
}
