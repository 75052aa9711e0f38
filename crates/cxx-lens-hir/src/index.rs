//! Parse sessions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;
use tree_sitter::{LanguageError, Parser};

use crate::lower;
use crate::paths;
use crate::unit::TranslationUnit;

/// Errors raised while creating a session or parsing a translation unit.
#[derive(Debug, Error)]
pub enum HirError {
    /// A source file could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The C++ grammar is incompatible with the linked tree-sitter runtime.
    #[error("failed to load the C++ grammar: {0}")]
    Language(#[from] LanguageError),
    /// tree-sitter gave up on the file.
    #[error("parsing '{}' was aborted", .0.display())]
    ParseAborted(PathBuf),
}

/// Options for [`Index::parse_translation_unit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// The file may be a fragment of a larger program: calls to unknown
    /// functions are not reported.
    pub incomplete: bool,
    /// Keep `#include` directives as [`InclusionDirective`] cursors.
    ///
    /// [`InclusionDirective`]: crate::CursorKind::InclusionDirective
    pub detailed_preprocessing_record: bool,
}

impl ParseOptions {
    /// Options for parsing a possibly incomplete editor buffer.
    #[must_use]
    pub const fn incomplete() -> Self {
        Self {
            incomplete: true,
            detailed_preprocessing_record: false,
        }
    }

    /// Also records inclusion directives.
    #[must_use]
    pub const fn with_detailed_preprocessing_record(mut self) -> Self {
        self.detailed_preprocessing_record = true;
        self
    }
}

/// In-memory contents overriding a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsavedFile {
    /// File the buffer stands for.
    pub path: PathBuf,
    /// Current buffer contents.
    pub contents: String,
}

impl UnsavedFile {
    /// Creates an unsaved buffer for `path`.
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// File contents by normalized path: unsaved buffers first, then disk.
#[derive(Debug, Default)]
pub(crate) struct SourceLoader {
    unsaved: FxHashMap<PathBuf, Arc<str>>,
}

impl SourceLoader {
    pub(crate) fn new(unsaved: &[UnsavedFile]) -> Self {
        let unsaved = unsaved
            .iter()
            .map(|file| (paths::normalize(&file.path), Arc::from(file.contents.as_str())))
            .collect();
        Self { unsaved }
    }

    pub(crate) fn exists(&self, path: &Path) -> bool {
        self.unsaved.contains_key(path) || path.is_file()
    }

    pub(crate) fn read(&self, path: &Path) -> Result<Arc<str>, HirError> {
        if let Some(contents) = self.unsaved.get(path) {
            return Ok(Arc::clone(contents));
        }
        let bytes = std::fs::read(path).map_err(|source| HirError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Arc::from(String::from_utf8_lossy(&bytes).as_ref()))
    }
}

/// A parsing session: one configured parser, reused for every file of a
/// translation unit.
pub struct Index {
    parser: Parser,
}

impl Index {
    /// Creates a session with the C++ grammar loaded.
    pub fn new() -> Result<Self, HirError> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_cpp::LANGUAGE.into())?;
        Ok(Self { parser })
    }

    /// Parses and analyses `path` with compiler `args`.
    ///
    /// Buffers in `unsaved` take precedence over files on disk, both for the
    /// main file and for included headers.
    pub fn parse_translation_unit(
        &mut self,
        path: &Path,
        args: &[String],
        unsaved: &[UnsavedFile],
        options: ParseOptions,
    ) -> Result<TranslationUnit, HirError> {
        let sources = SourceLoader::new(unsaved);
        let main = paths::normalize(path);
        let text = sources.read(&main)?;
        debug!(file = %main.display(), args = args.len(), "parsing translation unit");
        lower::build(&mut self.parser, sources, args, options, main, text)
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index").finish_non_exhaustive()
    }
}
