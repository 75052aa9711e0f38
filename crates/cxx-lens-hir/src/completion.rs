//! Code completion.
//!
//! Candidates come from the semantic model of the (possibly broken) buffer:
//! members of the object's record after `.`/`->`, members of the named scope
//! after `::`, otherwise every declaration visible at the position plus
//! keywords and builtin type names.

use std::path::Path;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use text_size::TextSize;
use tracing::debug;

use crate::cursor::CursorKind;
use crate::types::{TypeId, TypeKind};
use crate::unit::{NodeId, TranslationUnit};

const KEYWORDS: &[&str] = &[
    "alignas", "alignof", "auto", "break", "case", "catch", "class", "const", "constexpr",
    "const_cast", "continue", "decltype", "default", "delete", "do", "dynamic_cast", "else",
    "enum", "explicit", "extern", "false", "for", "friend", "goto", "if", "inline", "mutable",
    "namespace", "new", "noexcept", "nullptr", "operator", "private", "protected", "public",
    "reinterpret_cast", "return", "sizeof", "static", "static_assert", "static_cast", "struct",
    "switch", "template", "this", "throw", "true", "try", "typedef", "typeid", "typename",
    "union", "using", "virtual", "volatile", "while",
];

const BUILTIN_TYPES: &[&str] = &[
    "bool", "char", "char16_t", "char32_t", "double", "float", "int", "long", "short", "signed",
    "unsigned", "void", "wchar_t",
];

/// Role of a piece of a completion string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionChunkKind {
    /// The text the user types to select the candidate.
    TypedText,
    /// Type of the result (`int` for a variable or function returning int).
    ResultType,
    /// A parameter to fill in.
    Placeholder,
    /// Extra information such as trailing qualifiers.
    Informative,
    /// `(`.
    LeftParen,
    /// `)`.
    RightParen,
    /// `, `.
    Comma,
    /// Literal text.
    Text,
}

/// One piece of a completion string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionChunk {
    /// Role of the chunk.
    pub kind: CompletionChunkKind,
    /// Text of the chunk.
    pub text: String,
}

impl CompletionChunk {
    fn new(kind: CompletionChunkKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// A completion candidate as a sequence of chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionString {
    chunks: Vec<CompletionChunk>,
}

impl CompletionString {
    /// Chunks in display order.
    #[must_use]
    pub fn chunks(&self) -> &[CompletionChunk] {
        &self.chunks
    }

    /// Concatenated typed-text chunks.
    #[must_use]
    pub fn typed_text(&self) -> String {
        self.chunks
            .iter()
            .filter(|chunk| chunk.kind == CompletionChunkKind::TypedText)
            .map(|chunk| chunk.text.as_str())
            .collect()
    }
}

/// A single completion result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    /// Kind of the declaration the candidate stands for; `None` for
    /// keywords and builtin type names.
    pub cursor_kind: Option<CursorKind>,
    /// The candidate.
    pub completion_string: CompletionString,
}

/// Every candidate at a position, in no particular order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeCompleteResults {
    /// The candidates.
    pub results: Vec<CompletionResult>,
}

enum Context {
    /// After `base.` or `base->`.
    Member { base: String, arrow: bool },
    /// After `A::B::`.
    Scope(Vec<String>),
    Unqualified,
}

fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Start of the identifier ending at `at`.
fn identifier_start(text: &str, at: usize) -> usize {
    let bytes = text.as_bytes();
    let mut start = at.min(bytes.len());
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    while start > 0 && is_identifier_byte(bytes[start - 1]) {
        start -= 1;
    }
    start
}

fn completion_context(text: &str, at: usize) -> Context {
    let start = identifier_start(text, at);
    let before = text[..start].trim_end();
    let (operator_start, arrow) = if let Some(rest) = before.strip_suffix("->") {
        (Some(rest.len()), true)
    } else if before.ends_with('.') && !before.ends_with("..") {
        (Some(before.len() - 1), false)
    } else {
        (None, false)
    };
    if let Some(end) = operator_start {
        let head = text[..end].trim_end();
        let base_start = identifier_start(head, head.len());
        let base = &head[base_start..];
        if !base.is_empty() && !base.as_bytes()[0].is_ascii_digit() {
            return Context::Member {
                base: base.to_owned(),
                arrow,
            };
        }
        return Context::Member {
            base: String::new(),
            arrow,
        };
    }
    let mut scopes = Vec::new();
    let mut rest = before;
    while let Some(head) = rest.strip_suffix("::") {
        let head = head.trim_end();
        let name_start = identifier_start(head, head.len());
        let name = &head[name_start..];
        if name.is_empty() {
            break;
        }
        scopes.push(name.to_owned());
        rest = head[..name_start].trim_end();
    }
    if scopes.is_empty() {
        if before.ends_with("::") {
            return Context::Scope(Vec::new());
        }
        return Context::Unqualified;
    }
    scopes.reverse();
    Context::Scope(scopes)
}

impl TranslationUnit {
    /// Completion candidates at `line`/`column` (1-based) of `path`.
    #[must_use]
    pub fn code_complete_at(&self, path: &Path, line: u32, column: u32) -> CodeCompleteResults {
        let Some(file) = self.file_id(path) else {
            return CodeCompleteResults::default();
        };
        let source = self.file(file);
        let Some(offset) = source.line_index.offset(line, column) else {
            return CodeCompleteResults::default();
        };
        let at = usize::from(offset);
        let context = completion_context(&source.text, at);
        let position = self.innermost_node(file, offset).unwrap_or(NodeId::ROOT);

        let mut results = Vec::new();
        match context {
            Context::Member { base, arrow } => {
                if let Some(record) = self.member_base_record(position, offset, &base, arrow) {
                    for (name, decl) in self.scopes.all_members(record) {
                        self.push_declaration(&mut results, &name, decl);
                    }
                }
            }
            Context::Scope(scopes) => {
                if let Some(container) = self.resolve_scopes(position, offset, &scopes) {
                    for (name, decl) in self.scopes.all_members(container) {
                        self.push_declaration(&mut results, &name, decl);
                    }
                }
            }
            Context::Unqualified => {
                for (name, decl) in self.visible_declarations(position, offset) {
                    self.push_declaration(&mut results, &name, decl);
                }
                for keyword in KEYWORDS.iter().chain(BUILTIN_TYPES) {
                    results.push(CompletionResult {
                        cursor_kind: None,
                        completion_string: CompletionString {
                            chunks: vec![CompletionChunk::new(
                                CompletionChunkKind::TypedText,
                                *keyword,
                            )],
                        },
                    });
                }
            }
        }
        debug!(candidates = results.len(), "code completion");
        CodeCompleteResults { results }
    }

    fn push_declaration(&self, results: &mut Vec<CompletionResult>, name: &str, decl: NodeId) {
        let node = self.node(decl);
        if name.is_empty() || node.kind == CursorKind::UsingDirective {
            return;
        }
        let mut chunks = Vec::new();
        let ty = node.ty;
        if node.kind.is_function_like() {
            let result = self.types.get(ty).result.unwrap_or(TypeId::INVALID);
            if result != TypeId::INVALID
                && !matches!(node.kind, CursorKind::Constructor | CursorKind::Destructor)
            {
                chunks.push(CompletionChunk::new(
                    CompletionChunkKind::ResultType,
                    self.types.spelling(result),
                ));
            }
            chunks.push(CompletionChunk::new(CompletionChunkKind::TypedText, name));
            chunks.push(CompletionChunk::new(CompletionChunkKind::LeftParen, "("));
            let params: Vec<NodeId> = node
                .children
                .iter()
                .copied()
                .filter(|child| self.node(*child).kind == CursorKind::ParmDecl)
                .collect();
            for (index, param) in params.iter().enumerate() {
                if index > 0 {
                    chunks.push(CompletionChunk::new(CompletionChunkKind::Comma, ", "));
                }
                let param = self.node(*param);
                let ty = self.types.spelling(param.ty);
                let text = if param.spelling.is_empty() {
                    ty.to_owned()
                } else {
                    format!("{ty} {}", param.spelling)
                };
                chunks.push(CompletionChunk::new(CompletionChunkKind::Placeholder, text));
            }
            chunks.push(CompletionChunk::new(CompletionChunkKind::RightParen, ")"));
            if self.types.get(ty).is_const {
                chunks.push(CompletionChunk::new(CompletionChunkKind::Informative, " const"));
            }
        } else {
            if matches!(
                node.kind,
                CursorKind::VarDecl
                    | CursorKind::FieldDecl
                    | CursorKind::ParmDecl
                    | CursorKind::EnumConstantDecl
            ) && ty != TypeId::INVALID
            {
                chunks.push(CompletionChunk::new(
                    CompletionChunkKind::ResultType,
                    self.types.spelling(ty),
                ));
            }
            chunks.push(CompletionChunk::new(CompletionChunkKind::TypedText, name));
        }
        results.push(CompletionResult {
            cursor_kind: Some(node.kind),
            completion_string: CompletionString { chunks },
        });
    }

    /// Lexical ancestors of `position`, innermost first.
    fn ancestors(&self, position: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = Some(position);
        while let Some(id) = current {
            out.push(id);
            current = self.node(id).lexical_parent;
        }
        out
    }

    /// Every declaration visible at `offset`, innermost scope first.
    fn visible_declarations(&self, position: NodeId, offset: TextSize) -> Vec<(SmolStr, NodeId)> {
        let mut names = FxHashSet::default();
        let mut out = Vec::new();
        let mut push = |name: &SmolStr, decl: NodeId, out: &mut Vec<(SmolStr, NodeId)>| {
            if !name.is_empty() && names.insert(name.clone()) {
                out.push((name.clone(), decl));
            }
        };
        for ancestor in self.ancestors(position) {
            let node = self.node(ancestor);
            let is_scope = node.kind == CursorKind::TranslationUnit
                || node.kind == CursorKind::Namespace
                || node.kind.is_record()
                || node.kind == CursorKind::EnumDecl;
            if is_scope {
                let container = node.canonical.unwrap_or(ancestor);
                for (name, decl) in self.scopes.all_members(container) {
                    push(&name, decl, &mut out);
                }
                continue;
            }
            if node.kind.is_function_like() {
                if let Some(parent) = node.semantic_parent {
                    if self.node(parent).kind.is_record() {
                        let record = self.node(parent).canonical.unwrap_or(parent);
                        for (name, decl) in self.scopes.all_members(record) {
                            push(&name, decl, &mut out);
                        }
                    }
                }
            }
            for child in &node.children {
                let data = self.node(*child);
                if data.extent.start() > offset {
                    continue;
                }
                if data.kind.is_declaration() {
                    push(&data.spelling, *child, &mut out);
                } else if data.kind == CursorKind::DeclStmt {
                    for inner in &data.children {
                        let inner_data = self.node(*inner);
                        if inner_data.kind.is_declaration() {
                            push(&inner_data.spelling, *inner, &mut out);
                        }
                    }
                }
            }
        }
        out
    }

    /// Record an expression named `base` refers to, dereferenced for `->`.
    fn member_base_record(
        &self,
        position: NodeId,
        offset: TextSize,
        base: &str,
        arrow: bool,
    ) -> Option<NodeId> {
        let ty = if base == "this" {
            self.ancestors(position)
                .into_iter()
                .find(|id| self.node(*id).kind.is_function_like())
                .and_then(|function| self.node(function).semantic_parent)
                .filter(|parent| self.node(*parent).kind.is_record())
                .map(|record| self.node(record).ty)?
        } else {
            let decl = self
                .visible_declarations(position, offset)
                .into_iter()
                .find(|(name, _)| name == base)
                .map(|(_, decl)| decl)
                .or_else(|| self.nearest_preceding_declaration(position, offset, base))?;
            self.value_type_of(decl)
        };
        let mut ty = self.types.non_reference(ty);
        let canonical = self.types.canonical(ty);
        if base == "this" || (arrow && self.types.kind(canonical) == TypeKind::Pointer) {
            if self.types.kind(canonical) == TypeKind::Pointer {
                ty = self.types.get(canonical).pointee.unwrap_or(TypeId::INVALID);
            }
        }
        let canonical = self.types.canonical(ty);
        let record = self.types.get(canonical).declaration?;
        Some(self.node(record).canonical.unwrap_or(record))
    }

    /// Falls back to the closest earlier declaration named `name` in the
    /// same file, for buffers too broken to scope properly.
    fn nearest_preceding_declaration(
        &self,
        position: NodeId,
        offset: TextSize,
        name: &str,
    ) -> Option<NodeId> {
        let file = self.node(position).file;
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                node.file == file
                    && node.location < offset
                    && node.spelling == name
                    && matches!(
                        node.kind,
                        CursorKind::VarDecl | CursorKind::ParmDecl | CursorKind::FieldDecl
                    )
            })
            .max_by_key(|(_, node)| node.location)
            .map(|(index, _)| NodeId(index as u32))
    }

    /// Declared type of a variable, or the type of its initializer when the
    /// declared type is a placeholder.
    fn value_type_of(&self, decl: NodeId) -> TypeId {
        let node = self.node(decl);
        if self.types.kind(node.ty) != TypeKind::Auto {
            return node.ty;
        }
        node.children
            .iter()
            .map(|child| self.node(*child).ty)
            .find(|ty| *ty != TypeId::INVALID && self.types.kind(*ty) != TypeKind::Auto)
            .unwrap_or(node.ty)
    }

    fn resolve_scopes(
        &self,
        position: NodeId,
        offset: TextSize,
        scopes: &[String],
    ) -> Option<NodeId> {
        let Some((first, rest)) = scopes.split_first() else {
            return Some(NodeId::ROOT);
        };
        let mut container = self
            .visible_declarations(position, offset)
            .into_iter()
            .find(|(name, decl)| name == first && self.is_scope_decl(*decl))
            .map(|(_, decl)| decl)
            .or_else(|| {
                self.scopes
                    .lookup_member(NodeId::ROOT, first)
                    .into_iter()
                    .find(|decl| self.is_scope_decl(*decl))
            })?;
        container = self.node(container).canonical.unwrap_or(container);
        for name in rest {
            let next = self
                .scopes
                .lookup_member(container, name)
                .into_iter()
                .find(|decl| self.is_scope_decl(*decl))?;
            container = self.node(next).canonical.unwrap_or(next);
        }
        Some(container)
    }

    fn is_scope_decl(&self, decl: NodeId) -> bool {
        let kind = self.node(decl).kind;
        kind == CursorKind::Namespace || kind == CursorKind::EnumDecl || kind.is_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_member_access_contexts() {
        let text = "obj.fo";
        match completion_context(text, text.len()) {
            Context::Member { base, arrow } => {
                assert_eq!(base, "obj");
                assert!(!arrow);
            }
            _ => panic!("expected member context"),
        }
        let text = "ptr -> ";
        assert!(matches!(
            completion_context(text, text.len()),
            Context::Member { arrow: true, .. }
        ));
    }

    #[test]
    fn detects_scope_chains() {
        let text = "x = a::b::c";
        match completion_context(text, text.len()) {
            Context::Scope(scopes) => assert_eq!(scopes, vec!["a".to_owned(), "b".to_owned()]),
            _ => panic!("expected scope context"),
        }
        assert!(matches!(completion_context("int x = y", 9), Context::Unqualified));
    }

    #[test]
    fn offsets_inside_wide_characters_do_not_split_them() {
        let text = "s = \"é\";";
        assert_eq!(identifier_start(text, 6), 5);
        assert!(matches!(completion_context(text, 6), Context::Unqualified));
    }
}
