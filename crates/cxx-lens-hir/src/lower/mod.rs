//! Lowering of tree-sitter syntax trees into the cursor arena.
//!
//! One [`Builder`] walks the main file and every header it includes,
//! creating declaration, reference, statement and expression nodes while
//! maintaining the lexical scope stack. Expression types that depend on
//! other expressions are left to [`crate::sema`], which runs once the whole
//! translation unit is lowered.

mod decls;
mod exprs;
mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use tree_sitter::{Node, Parser, Tree};

use crate::cursor::CursorKind;
use crate::diagnostics::{syntax_errors, Diagnostic, DiagnosticPolicy, DiagnosticSeverity};
use crate::includes::IncludeSearch;
use crate::index::{HirError, ParseOptions, SourceLoader};
use crate::scope::{Frame, ScopeStack};
use crate::sema::{self, ExprShape, Facts};
use crate::types::TypeId;
use crate::unit::{FileId, NodeData, NodeId, TranslationUnit};

const MAX_INCLUDE_DEPTH: usize = 200;

/// A file being lowered.
pub(crate) struct FileCtx {
    pub(crate) id: FileId,
    pub(crate) text: Arc<str>,
    pub(crate) dir: PathBuf,
}

impl FileCtx {
    fn new(id: FileId, path: &Path, text: Arc<str>) -> Self {
        Self {
            id,
            text,
            dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        }
    }

    pub(crate) fn text_of(&self, node: Node<'_>) -> &str {
        self.text.get(node.byte_range()).unwrap_or_default()
    }
}

pub(crate) fn range_of(node: Node<'_>) -> TextRange {
    TextRange::new(offset(node.start_byte()), offset(node.end_byte()))
}

pub(crate) fn offset(byte: usize) -> TextSize {
    TextSize::try_from(byte).unwrap_or_default()
}

/// Parses `main` and everything it includes into a translation unit.
pub(crate) fn build(
    parser: &mut Parser,
    sources: SourceLoader,
    args: &[String],
    options: ParseOptions,
    main: PathBuf,
    text: Arc<str>,
) -> Result<TranslationUnit, HirError> {
    let tree = parser
        .parse(text.as_bytes(), None)
        .ok_or_else(|| HirError::ParseAborted(main.clone()))?;
    let file = FileCtx::new(FileId::MAIN, &main, Arc::clone(&text));

    let mut builder = Builder {
        parser,
        sources,
        search: IncludeSearch::from_args(args),
        policy: DiagnosticPolicy::from_args(args),
        options,
        unit: TranslationUnit::new(main.clone(), text),
        scopes: ScopeStack::default(),
        lexical: vec![NodeId::ROOT],
        semantic: vec![NodeId::ROOT],
        decl_context: Vec::new(),
        this_types: Vec::new(),
        shapes: FxHashMap::default(),
        initializers: FxHashMap::default(),
        range_loops: FxHashMap::default(),
        decltypes: Vec::new(),
        definitions: FxHashMap::default(),
        tag_decls: FxHashMap::default(),
        loaded: FxHashSet::default(),
        opaque_records: FxHashSet::default(),
        depth: 0,
        fatal: false,
    };
    builder.scopes.push(Frame::container(NodeId::ROOT));
    builder.loaded.insert(main);
    builder.lower_file(&file, tree.root_node());

    let Builder {
        mut unit,
        shapes,
        initializers,
        range_loops,
        decltypes,
        ..
    } = builder;
    let facts = Facts {
        shapes: &shapes,
        initializers: &initializers,
        range_loops: &range_loops,
        decltypes: &decltypes,
    };
    sema::analyze(&mut unit, &facts);
    Ok(unit)
}

pub(crate) struct Builder<'p> {
    parser: &'p mut Parser,
    sources: SourceLoader,
    search: IncludeSearch,
    policy: DiagnosticPolicy,
    options: ParseOptions,
    pub(crate) unit: TranslationUnit,
    pub(crate) scopes: ScopeStack,
    /// Parent for new nodes.
    lexical: Vec<NodeId>,
    /// Semantic parent for new declarations.
    semantic: Vec<NodeId>,
    /// Semantic parent for new statements and expressions.
    decl_context: Vec<NodeId>,
    /// Type of `this` inside member function bodies.
    this_types: Vec<TypeId>,
    shapes: FxHashMap<NodeId, ExprShape>,
    initializers: FxHashMap<NodeId, NodeId>,
    range_loops: FxHashMap<NodeId, NodeId>,
    decltypes: Vec<(TypeId, NodeId)>,
    /// Canonical declaration to its definition.
    definitions: FxHashMap<NodeId, NodeId>,
    /// Record/enum specifiers already lowered, by file and start byte.
    tag_decls: FxHashMap<(FileId, usize), NodeId>,
    loaded: FxHashSet<PathBuf>,
    /// Records with a base class that could not be resolved.
    opaque_records: FxHashSet<NodeId>,
    depth: usize,
    fatal: bool,
}

impl Builder<'_> {
    fn parse(&mut self, path: &Path, text: &str) -> Result<Tree, HirError> {
        self.parser
            .parse(text.as_bytes(), None)
            .ok_or_else(|| HirError::ParseAborted(path.to_path_buf()))
    }

    fn lower_file(&mut self, file: &FileCtx, root: Node<'_>) {
        for error in syntax_errors(root, &file.text) {
            self.report(file.id, offset(error.offset), DiagnosticSeverity::Error, error.message);
        }
        self.lower_items(file, root);
    }

    pub(crate) fn report(
        &mut self,
        file: FileId,
        at: TextSize,
        severity: DiagnosticSeverity,
        message: String,
    ) {
        let Some(severity) = self.policy.apply(severity) else {
            return;
        };
        let location = self.unit.source_location(file, at);
        self.unit.diagnostics.push(Diagnostic {
            severity,
            location,
            message,
        });
        if severity == DiagnosticSeverity::Fatal {
            self.fatal = true;
        }
    }

    /// Appends a node under the current lexical parent.
    pub(crate) fn add_node(
        &mut self,
        kind: CursorKind,
        file: &FileCtx,
        syntax: Node<'_>,
    ) -> NodeId {
        self.add_node_with_range(kind, file.id, range_of(syntax))
    }

    pub(crate) fn add_node_with_range(
        &mut self,
        kind: CursorKind,
        file: FileId,
        extent: TextRange,
    ) -> NodeId {
        let mut data = NodeData::new(kind, file, extent);
        data.lexical_parent = self.lexical.last().copied();
        data.semantic_parent = if kind.is_declaration() {
            self.semantic.last().copied()
        } else if kind.is_reference() || kind == CursorKind::InclusionDirective {
            None
        } else {
            self.decl_context.last().copied()
        };
        let id = self.unit.push_node(data);
        if kind.is_declaration() {
            self.unit.node_mut(id).canonical = Some(id);
        }
        id
    }

    pub(crate) fn set_name(
        &mut self,
        id: NodeId,
        name: Option<Node<'_>>,
        spelling: impl Into<SmolStr>,
    ) {
        let node = self.unit.node_mut(id);
        node.spelling = spelling.into();
        if let Some(name) = name {
            node.location = offset(name.start_byte());
        }
    }

    pub(crate) fn set_shape(&mut self, id: NodeId, shape: ExprShape) {
        self.shapes.insert(id, shape);
    }

    /// Runs `f` with `id` as lexical parent.
    pub(crate) fn under<R>(&mut self, id: NodeId, f: impl FnOnce(&mut Self) -> R) -> R {
        self.lexical.push(id);
        let result = f(self);
        self.lexical.pop();
        result
    }

    /// Runs `f` inside the scope of declaration `id`: new nodes become its
    /// children, new declarations name it as semantic parent.
    pub(crate) fn inside_scope<R>(
        &mut self,
        id: NodeId,
        frame: Frame,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.scopes.push(frame);
        self.semantic.push(id);
        let result = self.under(id, f);
        self.semantic.pop();
        self.scopes.pop();
        result
    }

    /// Runs `f` with `id` as the declaration owning new statements/expressions.
    pub(crate) fn inside_declaration<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.decl_context.push(id);
        let result = self.under(id, f);
        self.decl_context.pop();
        result
    }

    pub(crate) fn within_frame<R>(&mut self, frame: Frame, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scopes.push(frame);
        let result = f(self);
        self.scopes.pop();
        result
    }

    pub(crate) fn declare(&mut self, name: &str, id: NodeId) {
        self.scopes.declare(&mut self.unit.scopes, SmolStr::new(name), id);
    }

    pub(crate) fn canonical(&self, id: NodeId) -> NodeId {
        self.unit.node(id).canonical.unwrap_or(id)
    }

    /// Records `definition` for its entity, reporting a redefinition when
    /// the entity already has one.
    pub(crate) fn note_definition(&mut self, file: &FileCtx, definition: NodeId) {
        let canonical = self.canonical(definition);
        self.unit.node_mut(definition).is_definition = true;
        match self.definitions.get(&canonical).copied() {
            Some(previous) if previous != definition => {
                let node = self.unit.node(definition);
                let (at, name) = (node.location, node.spelling.clone());
                let (previous_file, previous_at) = {
                    let prev = self.unit.node(previous);
                    (prev.file, prev.location)
                };
                self.report(
                    file.id,
                    at,
                    DiagnosticSeverity::Error,
                    format!("redefinition of '{name}'"),
                );
                self.report(
                    previous_file,
                    previous_at,
                    DiagnosticSeverity::Note,
                    "previous definition is here".to_owned(),
                );
            }
            Some(_) => {}
            None => {
                self.definitions.insert(canonical, definition);
            }
        }
    }

    /// Reports an unresolved name unless the context makes that unreliable.
    pub(crate) fn report_undeclared(
        &mut self,
        file: &FileCtx,
        name_node: Node<'_>,
        name: &str,
        is_callee: bool,
    ) {
        let opaque = self
            .scopes
            .containers()
            .any(|container| self.opaque_records.contains(&container));
        if self.fatal
            || opaque
            || self.scopes.in_template()
            || (is_callee && self.options.incomplete)
            || name.starts_with("__")
        {
            return;
        }
        self.report(
            file.id,
            offset(name_node.start_byte()),
            DiagnosticSeverity::Error,
            format!("use of undeclared identifier '{name}'"),
        );
    }

    fn lower_items(&mut self, file: &FileCtx, node: Node<'_>) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        for child in children {
            self.lower_item(file, child);
        }
    }

    /// Loads and lowers an included header in the current scope.
    fn include_file(&mut self, path: PathBuf) -> Option<FileId> {
        if let Some(existing) = self.unit.file_id(&path) {
            return Some(existing);
        }
        if self.depth >= MAX_INCLUDE_DEPTH || !self.loaded.insert(path.clone()) {
            return None;
        }
        let text = match self.sources.read(&path) {
            Ok(text) => text,
            Err(err) => {
                tracing::debug!(%err, "skipping unreadable header");
                return None;
            }
        };
        let tree = match self.parse(&path, &text) {
            Ok(tree) => tree,
            Err(err) => {
                tracing::debug!(%err, "skipping header");
                return None;
            }
        };
        let id = self.unit.add_file(path.clone(), Arc::clone(&text));
        let file = FileCtx::new(id, &path, text);
        self.depth += 1;
        self.lower_file(&file, tree.root_node());
        self.depth -= 1;
        Some(id)
    }
}

/// Child nodes of `node` excluding the given fields.
pub(crate) fn named_children_except<'t>(node: Node<'t>, fields: &[&str]) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            let skipped = cursor.field_name().is_some_and(|field| fields.contains(&field));
            if child.is_named() && !skipped {
                out.push(child);
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

pub(crate) fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

/// Collapses whitespace the way clang prints written types.
pub(crate) fn normalize_spelling(text: &str) -> String {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(joined.len());
    let chars: Vec<char> = joined.chars().collect();
    for (index, ch) in chars.iter().enumerate() {
        if *ch == ' ' {
            let prev = index.checked_sub(1).and_then(|i| chars.get(i));
            let next = chars.get(index + 1);
            if matches!(prev, Some('<' | '(' | ':'))
                || matches!(next, Some('>' | ')' | ',' | ':'))
            {
                continue;
            }
        }
        out.push(*ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_types_are_normalized() {
        assert_eq!(normalize_spelling("std :: vector< int >"), "std::vector<int>");
        assert_eq!(normalize_spelling("map<int,\n  int>"), "map<int, int>");
        assert_eq!(normalize_spelling("const   char"), "const char");
    }
}
