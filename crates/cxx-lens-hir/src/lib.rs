//! `cxx-lens-hir` - semantic model of C++ translation units.
//!
//! This crate turns C++ source into a queryable model built on
//! `tree-sitter-cpp`:
//!
//! - **Cursors**: declarations, references, statements and expressions with
//!   semantic/lexical parents, referenced and canonical declarations
//! - **Types**: spellings, kinds, canonical forms, pointees, result types
//! - **Diagnostics**: syntax errors, missing headers, redefinitions and
//!   undeclared identifiers
//! - **Completion**: member, scope and unqualified candidates
//!
//! # Architecture
//!
//! An [`Index`] owns a parser. [`Index::parse_translation_unit`] reads the
//! main file (preferring unsaved buffers), follows `#include` directives,
//! lowers every syntax tree into one node arena and finally types the
//! expressions. The resulting [`TranslationUnit`] is immutable; [`Cursor`]
//! and [`Type`] are cheap handles borrowing it.
//!
//! # Example
//!
//! ```ignore
//! use cxx_lens_hir::{Index, ParseOptions, UnsavedFile};
//!
//! let mut index = Index::new()?;
//! let buffer = UnsavedFile::new("/tmp/a.cpp", "auto x = 1;");
//! let unit = index.parse_translation_unit(
//!     "/tmp/a.cpp".as_ref(),
//!     &[],
//!     &[buffer],
//!     ParseOptions::incomplete(),
//! )?;
//! let cursor = unit.cursor_at("/tmp/a.cpp".as_ref(), 1, 6);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod comments;
mod completion;
mod cursor;
mod diagnostics;
mod includes;
mod index;
mod line_index;
mod lower;
pub mod paths;
mod scope;
mod sema;
mod types;
mod unit;

pub use completion::{
    CodeCompleteResults, CompletionChunk, CompletionChunkKind, CompletionResult, CompletionString,
};
pub use cursor::{ChildVisit, Cursor, CursorKind};
pub use diagnostics::{Diagnostic, DiagnosticSeverity};
pub use index::{HirError, Index, ParseOptions, UnsavedFile};
pub use types::{Type, TypeKind};
pub use unit::{SourceLocation, SourceRange, TranslationUnit};
