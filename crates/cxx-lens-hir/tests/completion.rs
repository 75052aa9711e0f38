mod common;
use common::*;

use std::collections::BTreeSet;
use std::path::Path;

fn typed_texts(unit: &TranslationUnit, line: u32, column: u32) -> BTreeSet<String> {
    unit.code_complete_at(Path::new(MAIN), line, column)
        .results
        .iter()
        .map(|result| result.completion_string.typed_text())
        .collect()
}

const POINT: &str = "struct Point { int x; int y; int norm() const; };\nint main() {\n    Point p;\n    return p.x;\n}\n";

#[test]
fn member_access_offers_record_members() {
    let (line, column) = position_of(POINT, "p.x");
    let names = typed_texts(&parse(POINT), line, column + 2);
    let expected: BTreeSet<String> =
        ["norm", "x", "y"].iter().map(|name| (*name).to_owned()).collect();
    assert_eq!(names, expected);
}

#[test]
fn unqualified_completion_sees_locals_globals_and_keywords() {
    let (line, column) = position_of(POINT, "return");
    let names = typed_texts(&parse(POINT), line, column);
    for expected in ["p", "Point", "main", "int", "return"] {
        assert!(names.contains(expected), "missing {expected} in {names:?}");
    }
}

#[test]
fn scope_completion_lists_namespace_members() {
    let source = "namespace util { int helper(); int other(); }\nint z = util::helper();\n";
    let (line, column) = position_of(source, "util::helper");
    let names = typed_texts(&parse(source), line, column + 6);
    assert!(names.contains("helper"));
    assert!(names.contains("other"));
    assert!(!names.contains("z"));
}

#[test]
fn function_candidates_carry_placeholders() {
    let source = "int scale(int factor, double by);\nint r = scale(1, 2.0);\n";
    let (line, column) = position_of(source, "scale(1");
    let unit = parse(source);
    let results = unit.code_complete_at(Path::new(MAIN), line, column);
    let scale = results
        .results
        .iter()
        .find(|result| result.completion_string.typed_text() == "scale")
        .expect("scale is offered");
    let placeholders: Vec<&str> = scale
        .completion_string
        .chunks()
        .iter()
        .filter(|chunk| chunk.kind == cxx_lens_hir::CompletionChunkKind::Placeholder)
        .map(|chunk| chunk.text.as_str())
        .collect();
    assert_eq!(placeholders, vec!["int factor", "double by"]);
    assert_eq!(scale.cursor_kind, Some(CursorKind::FunctionDecl));
}
