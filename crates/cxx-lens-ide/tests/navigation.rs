mod common;
use common::*;

use cxx_lens_ide::{
    get_comment_at, get_current_function_at, get_deduced_declaration_at, get_include_at,
};

// =============================================================================
// Current function
// =============================================================================

#[test]
fn anonymous_namespaces_use_a_sentinel() {
    let source = "namespace N {\nnamespace {\nint helper() {\n    return 1;\n}\n}\n}\n";
    assert_eq!(
        get_current_function_at(&at(source, "return")),
        "{'name': 'N::(anonymous namespace)::helper'}"
    );
}

#[test]
fn out_of_line_methods_are_qualified_by_their_class() {
    let source = "struct Shape {\n    double area() const;\n};\ndouble Shape::area() const {\n    return 0.0;\n}\n";
    assert_eq!(
        get_current_function_at(&at(source, "return")),
        "{'name': 'Shape::area'}"
    );
}

#[test]
fn type_references_back_off_to_their_statement() {
    let source = "struct Box {};\nvoid fill() {\n    Box b;\n}\n";
    assert_eq!(get_current_function_at(&at(source, "Box b")), "{'name': 'fill'}");
}

#[test]
fn columns_past_the_line_end_back_off_from_the_end() {
    let source = "void fill() {\n    int y = 1;\n}\n";
    assert_eq!(
        get_current_function_at(&at_position(source, 2, u32::MAX)),
        "{'name': 'fill'}"
    );
    assert_eq!(
        get_current_function_at(&at_position(source, 9, u32::MAX)),
        "{'name': ''}"
    );
}

#[test]
fn global_scope_has_an_empty_name() {
    let source = "int global = 1;\n";
    assert_eq!(get_current_function_at(&at(source, "global")), "{'name': ''}");
    let blank = "int a;\n\nint b;\n";
    assert_eq!(get_current_function_at(&at_position(blank, 2, 1)), "{'name': ''}");
}

// =============================================================================
// Comments
// =============================================================================

#[test]
fn comments_follow_references_to_the_canonical_declaration() {
    let source = "/// Computes things.\nint compute();\nint x = compute();\n";
    assert_eq!(
        get_comment_at(&at_offset(source, "= compute", 2)),
        "{'brief': 'Computes things.'}"
    );
    assert_eq!(
        get_comment_at(&at(source, "compute")),
        "{'brief': 'Computes things.'}"
    );
}

#[test]
fn undocumented_declarations_have_an_empty_brief() {
    let source = "int plain;\n";
    assert_eq!(get_comment_at(&at(source, "plain")), "{'brief': ''}");
}

#[test]
fn comments_need_a_cursor() {
    let source = "int a;\n\nint b;\n";
    assert_eq!(get_comment_at(&at_position(source, 2, 1)), "{}");
}

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn declarations_of_variables() {
    let source = "int target = 1;\nint use = target;\n";
    expect![[r#"{'file': '/cxx-lens-ide-test/main.cpp', 'line': '1', 'col': '5'}"#]]
        .assert_eq(&get_deduced_declaration_at(&at(source, "target;")));
}

#[test]
fn declarations_resolve_to_the_first_declaration() {
    let source = "void run();\nvoid run() {}\nvoid go() { run(); }\n";
    expect![[r#"{'file': '/cxx-lens-ide-test/main.cpp', 'line': '1', 'col': '6'}"#]]
        .assert_eq(&get_deduced_declaration_at(&at_offset(source, "{ run", 2)));
}

#[test]
fn unreferencing_cursors_have_a_comment_but_no_declaration() {
    let source = "/// The answer.\nint n = 42;\n";
    let literal = at(source, "42");
    assert_eq!(get_comment_at(&literal), "{'brief': ''}");
    assert_eq!(get_deduced_declaration_at(&literal), "{}");
    assert_eq!(get_comment_at(&at(source, "n =")), "{'brief': 'The answer.'}");
}

// =============================================================================
// Includes
// =============================================================================

#[test]
fn includes_resolve_to_the_header() {
    let source = "#include \"util.h\"\nint x;\n";
    let location =
        at_position(source, 1, 2).with_unsaved("/cxx-lens-ide-test/util.h", "int util();\n");
    assert_eq!(
        get_include_at(&location),
        "{'file': '/cxx-lens-ide-test/util.h'}"
    );
}

#[test]
fn includes_need_a_directive() {
    let source = "#include \"util.h\"\nint x;\n";
    let location = at(source, "x;").with_unsaved("/cxx-lens-ide-test/util.h", "int util();\n");
    assert_eq!(get_include_at(&location), "{}");
}

#[test]
fn unresolved_includes_are_empty() {
    let source = "#include \"nope.h\"\n";
    assert_eq!(get_include_at(&at_position(source, 1, 2)), "{}");
}
