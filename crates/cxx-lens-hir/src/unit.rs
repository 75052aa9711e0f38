//! The translation unit: node arena, files, types and diagnostics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::cursor::{Cursor, CursorKind};
use crate::diagnostics::Diagnostic;
use crate::line_index::LineIndex;
use crate::paths;
use crate::scope::ScopeTable;
use crate::types::{TypeId, TypeTable};

/// Index of a node in the arena; `NodeId::ROOT` is the translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) const ROOT: Self = Self(0);

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a file loaded into the translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FileId(pub(crate) u32);

impl FileId {
    pub(crate) const MAIN: Self = Self(0);
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: CursorKind,
    pub(crate) file: FileId,
    pub(crate) extent: TextRange,
    pub(crate) location: TextSize,
    pub(crate) spelling: SmolStr,
    pub(crate) semantic_parent: Option<NodeId>,
    pub(crate) lexical_parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) ty: TypeId,
    pub(crate) referenced: Option<NodeId>,
    pub(crate) canonical: Option<NodeId>,
    pub(crate) brief_comment: Option<String>,
    pub(crate) included_file: Option<FileId>,
    pub(crate) is_definition: bool,
}

impl NodeData {
    pub(crate) fn new(kind: CursorKind, file: FileId, extent: TextRange) -> Self {
        Self {
            kind,
            file,
            extent,
            location: extent.start(),
            spelling: SmolStr::default(),
            semantic_parent: None,
            lexical_parent: None,
            children: Vec::new(),
            ty: TypeId::INVALID,
            referenced: None,
            canonical: None,
            brief_comment: None,
            included_file: None,
            is_definition: false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SourceFile {
    pub(crate) path: PathBuf,
    pub(crate) text: Arc<str>,
    pub(crate) line_index: LineIndex,
}

/// A resolved position: file, 1-based line and column (bytes), byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// File containing the position.
    pub file: PathBuf,
    /// 1-based line.
    pub line: u32,
    /// 1-based byte column.
    pub column: u32,
    /// Byte offset from the start of the file.
    pub offset: u32,
}

/// A half-open range between two locations of the same file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRange {
    /// First position covered.
    pub start: SourceLocation,
    /// Position just past the range.
    pub end: SourceLocation,
}

/// A parsed and analysed C++ translation unit.
///
/// Owns every node, type and diagnostic; cursors and types borrow from it.
#[derive(Debug)]
pub struct TranslationUnit {
    pub(crate) files: Vec<SourceFile>,
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) types: TypeTable,
    pub(crate) scopes: ScopeTable,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) typedef_underlying: FxHashMap<NodeId, TypeId>,
}

impl TranslationUnit {
    pub(crate) fn new(main: PathBuf, text: Arc<str>) -> Self {
        let line_index = LineIndex::new(&text);
        let extent = TextRange::up_to(TextSize::of(&*text));
        let mut root = NodeData::new(CursorKind::TranslationUnit, FileId::MAIN, extent);
        root.spelling = SmolStr::new(main.to_string_lossy());
        Self {
            files: vec![SourceFile {
                path: main,
                text,
                line_index,
            }],
            nodes: vec![root],
            types: TypeTable::new(),
            scopes: ScopeTable::default(),
            diagnostics: Vec::new(),
            typedef_underlying: FxHashMap::default(),
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        if let Some(parent) = data.lexical_parent {
            self.nodes[parent.index()].children.push(id);
        }
        self.nodes.push(data);
        id
    }

    pub(crate) fn add_file(&mut self, path: PathBuf, text: Arc<str>) -> FileId {
        let id = FileId(self.files.len() as u32);
        let line_index = LineIndex::new(&text);
        self.files.push(SourceFile {
            path,
            text,
            line_index,
        });
        id
    }

    pub(crate) fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub(crate) fn file_path(&self, id: FileId) -> &Path {
        &self.file(id).path
    }

    pub(crate) fn file_id(&self, path: &Path) -> Option<FileId> {
        let normalized = paths::normalize(path);
        self.files
            .iter()
            .position(|file| file.path == normalized)
            .map(|index| FileId(index as u32))
    }

    pub(crate) fn source_location(&self, file: FileId, offset: TextSize) -> SourceLocation {
        let source = self.file(file);
        let (line, column) = source.line_index.line_col(offset);
        SourceLocation {
            file: source.path.clone(),
            line,
            column,
            offset: offset.into(),
        }
    }

    /// Path of the main file.
    #[must_use]
    pub fn main_file(&self) -> &Path {
        self.file_path(FileId::MAIN)
    }

    /// The translation unit cursor.
    #[must_use]
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self, NodeId::ROOT)
    }

    /// Innermost cursor whose extent contains `line`/`column` of `path`.
    ///
    /// Returns `None` when the position is outside every declaration, that is
    /// when only the translation unit itself contains it.
    #[must_use]
    pub fn cursor_at(&self, path: &Path, line: u32, column: u32) -> Option<Cursor<'_>> {
        let file = self.file_id(path)?;
        let offset = self.file(file).line_index.offset(line, column)?;
        self.innermost_node(file, offset)
            .filter(|id| *id != NodeId::ROOT)
            .map(|id| Cursor::new(self, id))
    }

    /// Length in bytes of 1-based `line` of `path`, without its newline.
    #[must_use]
    pub fn line_length(&self, path: &Path, line: u32) -> Option<u32> {
        let file = self.file_id(path)?;
        self.file(file).line_index.line_len(line)
    }

    pub(crate) fn innermost_node(&self, file: FileId, offset: TextSize) -> Option<NodeId> {
        let mut current = NodeId::ROOT;
        loop {
            let next = self.node(current).children.iter().copied().find(|child| {
                let node = self.node(*child);
                node.file == file && node.extent.contains(offset)
            });
            match next {
                Some(child) => current = child,
                None => return Some(current),
            }
        }
    }

    /// Number of diagnostics produced while parsing.
    #[must_use]
    pub fn num_diagnostics(&self) -> usize {
        self.diagnostics.len()
    }

    /// Diagnostic `index` in emission order.
    #[must_use]
    pub fn diagnostic(&self, index: usize) -> Option<&Diagnostic> {
        self.diagnostics.get(index)
    }

    /// Every diagnostic in emission order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
