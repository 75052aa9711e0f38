//! Shared helpers for front-end tests.
#![allow(dead_code, unused_imports)]

use std::path::Path;

pub use cxx_lens_hir::{
    ChildVisit, Cursor, CursorKind, DiagnosticSeverity, Index, ParseOptions, TranslationUnit,
    TypeKind, UnsavedFile,
};

/// Virtual path of the main buffer; nothing is read from disk.
pub const MAIN: &str = "/cxx-lens-test/main.cpp";

/// Parses `source` as the main file.
pub fn parse(source: &str) -> TranslationUnit {
    parse_with(source, &[], &[], ParseOptions::incomplete())
}

/// Parses `source` with compiler `args` and extra in-memory `files`.
pub fn parse_with(
    source: &str,
    args: &[&str],
    files: &[(&str, &str)],
    options: ParseOptions,
) -> TranslationUnit {
    let mut unsaved = vec![UnsavedFile::new(MAIN, source)];
    unsaved.extend(files.iter().map(|(path, text)| UnsavedFile::new(*path, *text)));
    let args: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
    let mut index = Index::new().expect("C++ grammar loads");
    index
        .parse_translation_unit(Path::new(MAIN), &args, &unsaved, options)
        .expect("in-memory buffer parses")
}

/// 1-based line and column of the first occurrence of `needle`.
pub fn position_of(source: &str, needle: &str) -> (u32, u32) {
    let offset = source.find(needle).unwrap_or_else(|| panic!("{needle:?} not in source"));
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = offset - before.rfind('\n').map_or(0, |newline| newline + 1) + 1;
    (line as u32, column as u32)
}

/// Cursor at the first occurrence of `needle`.
pub fn cursor_at<'tu>(unit: &'tu TranslationUnit, source: &str, needle: &str) -> Cursor<'tu> {
    let (line, column) = position_of(source, needle);
    unit.cursor_at(Path::new(MAIN), line, column)
        .unwrap_or_else(|| panic!("no cursor at {needle:?}"))
}

/// First descendant of `cursor` (depth first) satisfying `predicate`.
pub fn find<'tu>(
    cursor: Cursor<'tu>,
    predicate: impl Fn(&Cursor<'tu>) -> bool,
) -> Option<Cursor<'tu>> {
    let mut found = None;
    cursor.visit_children(|child, _| {
        if predicate(&child) {
            found = Some(child);
            ChildVisit::Break
        } else {
            ChildVisit::Recurse
        }
    });
    found
}
