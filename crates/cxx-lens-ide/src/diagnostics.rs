//! Diagnostics with their locations.

use cxx_lens_hir::ParseOptions;
use serde::Serialize;
use tracing::debug;

use crate::location::{with_translation_unit, LocationTuple};
use crate::vimson::to_vimson;

#[derive(Debug, Serialize)]
struct DiagnosticRecord {
    severity: &'static str,
    file: String,
    line: u32,
    column: u32,
    offset: u32,
}

/// `[{'severity': ..., 'file': ..., 'line': ..., 'column': ..., 'offset': ...}, ...]`
/// in emission order; `[]` when the file cannot be parsed.
///
/// Only the file, arguments and buffers of `location` are used.
pub fn get_diagnostics(location: &LocationTuple) -> String {
    debug!(file = %location.file.display(), "diagnostics");
    with_translation_unit(location, ParseOptions::incomplete(), |unit| {
        let records: Vec<DiagnosticRecord> = (0..unit.num_diagnostics())
            .filter_map(|index| unit.diagnostic(index))
            .map(|diagnostic| DiagnosticRecord {
                severity: diagnostic.severity.as_str(),
                file: diagnostic.location.file.display().to_string(),
                line: diagnostic.location.line,
                column: diagnostic.location.column,
                offset: diagnostic.location.offset,
            })
            .collect();
        Some(to_vimson(&records))
    })
    .unwrap_or_else(|| String::from("[]"))
}
