//! Source positions and per-query translation units.

use std::path::PathBuf;

use cxx_lens_hir::{Cursor, Index, ParseOptions, TranslationUnit, UnsavedFile};
use tracing::{debug, warn};

/// Input of every position query: where the editor cursor is, how to
/// compile the file and which buffers differ from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationTuple {
    /// File the position refers to.
    pub file: PathBuf,
    /// 1-based line.
    pub line: u32,
    /// 1-based byte column.
    pub col: u32,
    /// Compiler arguments, without the file itself.
    pub args: Vec<String>,
    /// Buffers overriding files on disk.
    pub unsaved: Vec<UnsavedFile>,
}

impl LocationTuple {
    /// A position in `file` with no arguments and no unsaved buffers.
    pub fn new(file: impl Into<PathBuf>, line: u32, col: u32) -> Self {
        Self {
            file: file.into(),
            line,
            col,
            args: Vec::new(),
            unsaved: Vec::new(),
        }
    }

    /// Sets the compiler arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Adds an unsaved buffer.
    #[must_use]
    pub fn with_unsaved(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.unsaved.push(UnsavedFile::new(path, contents));
        self
    }
}

/// Parses `location.file` with `options` and runs `f` on the result.
///
/// The index and translation unit live only for the duration of the call.
/// Returns `None` when the file cannot be parsed.
pub fn with_translation_unit<R>(
    location: &LocationTuple,
    options: ParseOptions,
    f: impl FnOnce(&TranslationUnit) -> Option<R>,
) -> Option<R> {
    let mut index = match Index::new() {
        Ok(index) => index,
        Err(err) => {
            warn!(%err, "failed to create index");
            return None;
        }
    };
    let unit = match index.parse_translation_unit(
        &location.file,
        &location.args,
        &location.unsaved,
        options,
    ) {
        Ok(unit) => unit,
        Err(err) => {
            debug!(%err, "no translation unit");
            return None;
        }
    };
    f(&unit)
}

/// Cursor exactly at the location.
pub fn resolve_cursor<'tu>(
    unit: &'tu TranslationUnit,
    location: &LocationTuple,
) -> Option<Cursor<'tu>> {
    unit.cursor_at(&location.file, location.line, location.col)
}

/// Cursor at the location, stepping left while the hit has no semantic
/// parent.
///
/// Reference cursors such as `TypeRef` are not part of the semantic tree;
/// moving one column left usually lands on their enclosing declaration or
/// statement. Columns past the end of the line start from the line end.
/// Stops at column 1 and returns whatever was found there.
pub fn resolve_cursor_with_backoff<'tu>(
    unit: &'tu TranslationUnit,
    location: &LocationTuple,
) -> Option<Cursor<'tu>> {
    let line_length = unit.line_length(&location.file, location.line)?;
    let mut column = location.col.min(line_length.saturating_add(1));
    loop {
        let cursor = unit.cursor_at(&location.file, location.line, column);
        let anchored = cursor.is_some_and(|cursor| cursor.semantic_parent().is_some());
        if anchored || column <= 1 {
            return cursor;
        }
        column -= 1;
    }
}
