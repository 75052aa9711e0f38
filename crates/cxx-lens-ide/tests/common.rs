//! Shared helpers for query tests.
#![allow(dead_code, unused_imports)]

pub use cxx_lens_ide::LocationTuple;
pub use expect_test::expect;

/// Virtual path of the edited buffer.
pub const MAIN: &str = "/cxx-lens-ide-test/main.cpp";

/// 1-based line and column of the first occurrence of `needle`.
pub fn position_of(source: &str, needle: &str) -> (u32, u32) {
    let offset = source.find(needle).unwrap_or_else(|| panic!("{needle:?} not in source"));
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = offset - before.rfind('\n').map_or(0, |newline| newline + 1) + 1;
    (line as u32, column as u32)
}

/// Location of the first occurrence of `needle` in the unsaved `source`.
pub fn at(source: &str, needle: &str) -> LocationTuple {
    at_offset(source, needle, 0)
}

/// Like [`at`], `delta` columns to the right.
pub fn at_offset(source: &str, needle: &str, delta: u32) -> LocationTuple {
    let (line, col) = position_of(source, needle);
    at_position(source, line, col + delta)
}

/// Location `line`/`col` in the unsaved `source`.
pub fn at_position(source: &str, line: u32, col: u32) -> LocationTuple {
    LocationTuple::new(MAIN, line, col).with_unsaved(MAIN, source)
}
