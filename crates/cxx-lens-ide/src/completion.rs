//! Completion candidates as a sorted list of names.

use std::collections::BTreeSet;

use cxx_lens_hir::ParseOptions;
use tracing::debug;

use crate::location::{with_translation_unit, LocationTuple};
use crate::vimson::to_vimson;

/// `['<name>', ...]` of every completion candidate at the location.
///
/// Only the typed text of each candidate is kept. The list is sorted and
/// free of duplicates; `[]` when the file cannot be parsed.
pub fn get_completion_at(location: &LocationTuple) -> String {
    debug!(
        file = %location.file.display(),
        line = location.line,
        col = location.col,
        "completion"
    );
    with_translation_unit(location, ParseOptions::incomplete(), |unit| {
        let results = unit.code_complete_at(&location.file, location.line, location.col);
        let names: BTreeSet<String> = results
            .results
            .iter()
            .map(|result| result.completion_string.typed_text())
            .collect();
        Some(to_vimson(&names))
    })
    .unwrap_or_else(|| String::from("[]"))
}
