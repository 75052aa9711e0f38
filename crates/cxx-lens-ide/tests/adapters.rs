mod common;
use common::*;

use cxx_lens_ide::{execute, get_completion_at, get_diagnostics, QueryKind};

#[test]
fn completion_lists_are_sorted_and_unique() {
    let source = "struct P { int beta; int alpha; };\nint main() {\n    P p;\n    return p.alpha;\n}\n";
    assert_eq!(
        get_completion_at(&at_offset(source, "p.alpha", 2)),
        "['alpha', 'beta']"
    );
}

#[test]
fn unqualified_completion_contains_typed_text_only() {
    let source = "int scale(int factor);\nint main() {\n    return 0;\n}\n";
    let rendered = get_completion_at(&at(source, "return"));
    assert!(rendered.contains("'scale'"), "{rendered}");
    assert!(rendered.contains("'main'"), "{rendered}");
    assert!(!rendered.contains("factor"), "{rendered}");
}

#[test]
fn diagnostics_render_severity_and_location() {
    let source = "#include \"missing.h\"\nint x = nope;\n";
    expect![[r#"[{'severity': 'fatal', 'file': '/cxx-lens-ide-test/main.cpp', 'line': '1', 'column': '10', 'offset': '9'}]"#]]
        .assert_eq(&get_diagnostics(&at_position(source, 1, 1)));
}

#[test]
fn redefinitions_come_with_a_note() {
    let source = "int f() { return 0; }\nint f() { return 1; }\n";
    expect![[r#"[{'severity': 'error', 'file': '/cxx-lens-ide-test/main.cpp', 'line': '2', 'column': '5', 'offset': '26'}, {'severity': 'note', 'file': '/cxx-lens-ide-test/main.cpp', 'line': '1', 'column': '5', 'offset': '4'}]"#]]
        .assert_eq(&get_diagnostics(&at_position(source, 1, 1)));
}

#[test]
fn clean_files_have_no_diagnostics() {
    let source = "int main() { return 0; }\n";
    assert_eq!(get_diagnostics(&at_position(source, 1, 1)), "[]");
}

#[test]
fn failures_render_empty_literals() {
    let location = LocationTuple::new("/cxx-lens-ide-test/absent.cpp", 1, 1);
    for kind in QueryKind::ALL {
        if kind == QueryKind::CompileCommands {
            continue;
        }
        let expected = match kind {
            QueryKind::Completion | QueryKind::Diagnostics => "[]",
            _ => "{}",
        };
        assert_eq!(execute(kind, &location), expected, "{kind}");
        assert_eq!(kind.empty_result(), expected);
    }
}

// =============================================================================
// Out-of-range and mid-character positions
// =============================================================================

#[test]
fn completion_inside_a_wide_character() {
    let source = "const char *s = \"é\";\nint x;\n";
    let (line, col) = position_of(source, "é");
    let rendered = get_completion_at(&at_position(source, line, col + 1));
    assert!(rendered.contains("'int'"), "{rendered}");
}

#[test]
fn huge_columns_clamp_to_the_line_end() {
    let source = "int a;\nint b;\n";
    for kind in QueryKind::ALL {
        if kind == QueryKind::CompileCommands {
            continue;
        }
        let rendered = execute(kind, &at_position(source, 2, u32::MAX));
        assert!(rendered.starts_with(['{', '[']), "{kind}: {rendered}");
    }
    assert_eq!(
        cxx_lens_ide::deduce_type_at(&at_position(source, 2, u32::MAX)),
        "{}"
    );
}
