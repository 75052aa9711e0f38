//! Comment, declaration and include lookups.

use cxx_lens_hir::{CursorKind, ParseOptions};
use serde::Serialize;
use tracing::debug;

use crate::location::{resolve_cursor, with_translation_unit, LocationTuple};
use crate::vimson::to_vimson;

#[derive(Debug, Serialize)]
struct Comment<'a> {
    brief: &'a str,
}

#[derive(Debug, Serialize)]
struct DeclarationLocation {
    file: String,
    line: u32,
    col: u32,
}

#[derive(Debug, Serialize)]
struct IncludeTarget {
    file: String,
}

/// `{'brief': '...'}` for the declaration at or referenced from the
/// location.
///
/// A cursor that references nothing is treated as the declaration itself.
/// The brief comment is taken from the canonical declaration and is empty
/// when none is attached.
pub fn get_comment_at(location: &LocationTuple) -> String {
    debug!(
        file = %location.file.display(),
        line = location.line,
        col = location.col,
        "comment"
    );
    with_translation_unit(location, ParseOptions::incomplete(), |unit| {
        let cursor = resolve_cursor(unit, location)?;
        let target = cursor.referenced().unwrap_or(cursor);
        let brief = target.canonical().brief_comment().unwrap_or_default();
        Some(to_vimson(&Comment { brief }))
    })
    .unwrap_or_else(|| String::from("{}"))
}

/// `{'file': ..., 'line': ..., 'col': ...}` of the canonical declaration
/// referenced from the location, or `{}` when nothing is referenced.
pub fn get_deduced_declaration_at(location: &LocationTuple) -> String {
    debug!(
        file = %location.file.display(),
        line = location.line,
        col = location.col,
        "declaration"
    );
    with_translation_unit(location, ParseOptions::incomplete(), |unit| {
        let cursor = resolve_cursor(unit, location)?;
        let declaration = cursor.referenced()?.canonical();
        let position = declaration.location();
        Some(to_vimson(&DeclarationLocation {
            file: position.file.display().to_string(),
            line: position.line,
            col: position.column,
        }))
    })
    .unwrap_or_else(|| String::from("{}"))
}

/// `{'file': '<path>'}` of the header named by the `#include` at the
/// location, or `{}` when there is no resolvable directive there.
pub fn get_include_at(location: &LocationTuple) -> String {
    debug!(
        file = %location.file.display(),
        line = location.line,
        col = location.col,
        "include"
    );
    let options = ParseOptions::incomplete().with_detailed_preprocessing_record();
    with_translation_unit(location, options, |unit| {
        let cursor = resolve_cursor(unit, location)?;
        if cursor.kind() != CursorKind::InclusionDirective {
            return None;
        }
        let file = cursor.included_file()?.display().to_string();
        Some(to_vimson(&IncludeTarget { file }))
    })
    .unwrap_or_else(|| String::from("{}"))
}
