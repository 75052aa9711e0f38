//! Qualified name of the function enclosing a position.

use cxx_lens_hir::{Cursor, CursorKind, ParseOptions};
use serde::Serialize;
use tracing::debug;

use crate::location::{resolve_cursor_with_backoff, with_translation_unit, LocationTuple};
use crate::vimson::to_vimson;

/// Rendered in place of an empty scope name.
pub const ANONYMOUS_SCOPE: &str = "(anonymous namespace)";

#[derive(Debug, Serialize)]
struct CurrentFunction {
    name: String,
}

/// `{'name': '<qualified name>'}` of the function around the location.
///
/// The name is empty outside of functions; `{}` when the file cannot be
/// parsed.
pub fn get_current_function_at(location: &LocationTuple) -> String {
    debug!(
        file = %location.file.display(),
        line = location.line,
        col = location.col,
        "current function"
    );
    with_translation_unit(location, ParseOptions::incomplete(), |unit| {
        let name = resolve_cursor_with_backoff(unit, location)
            .and_then(enclosing_function)
            .map(qualified_name)
            .unwrap_or_default();
        Some(to_vimson(&CurrentFunction { name }))
    })
    .unwrap_or_else(|| String::from("{}"))
}

/// Nearest function-like cursor on the semantic parent chain, including
/// `cursor` itself.
fn enclosing_function(cursor: Cursor<'_>) -> Option<Cursor<'_>> {
    let mut current = cursor;
    loop {
        let kind = current.kind();
        if kind.is_function_like() {
            return Some(current);
        }
        if kind == CursorKind::TranslationUnit {
            return None;
        }
        current = current.semantic_parent()?;
    }
}

/// `::`-joined names from the outermost scope down to `cursor`.
///
/// Unnamed scopes render as [`ANONYMOUS_SCOPE`]. The translation unit
/// contributes nothing, so a global declaration yields its plain name.
pub fn qualified_name(cursor: Cursor<'_>) -> String {
    let mut stack = Vec::new();
    let mut current = Some(cursor);
    while let Some(scope) = current {
        if scope.kind() == CursorKind::TranslationUnit {
            break;
        }
        let name = scope.spelling();
        stack.push(if name.is_empty() { ANONYMOUS_SCOPE } else { name });
        current = scope.semantic_parent();
    }
    let mut name = String::new();
    while let Some(part) = stack.pop() {
        if !name.is_empty() {
            name.push_str("::");
        }
        name.push_str(part);
    }
    name
}
