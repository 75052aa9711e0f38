mod common;
use common::*;

use cxx_lens_ide::{
    deduce_func_or_var_decl, deduce_func_return_type, deduce_type_at, deduce_var_decl_type,
};

// =============================================================================
// Variables
// =============================================================================

#[test]
fn explicit_variable_types_are_reported_verbatim() {
    let source = "int value = 3;\n";
    expect![[r#"{'type': 'int', 'type_kind': 'Int', 'canonical': {'type': 'int', 'type_kind': 'Int'}}"#]]
        .assert_eq(&deduce_var_decl_type(&at(source, "value")));
}

#[test]
fn auto_variables_take_the_initializer_type() {
    let source = "auto ratio = 0.5f;\n";
    expect![[r#"{'type': 'float', 'type_kind': 'Float', 'canonical': {'type': 'float', 'type_kind': 'Float'}}"#]]
        .assert_eq(&deduce_var_decl_type(&at(source, "ratio")));
}

#[test]
fn auto_variables_initialized_by_calls() {
    let source = "struct Widget {};\nWidget make();\nauto w = make();\n";
    expect![[r#"{'type': 'Widget', 'type_kind': 'Record', 'declaration': 'Widget', 'canonical': {'type': 'Widget', 'type_kind': 'Record', 'declaration': 'Widget'}}"#]]
        .assert_eq(&deduce_var_decl_type(&at(source, "w =")));
}

#[test]
fn typedefs_report_their_canonical_type() {
    let source = "typedef unsigned int uint;\nuint count = 0;\n";
    expect![[r#"{'type': 'uint', 'type_kind': 'Typedef', 'declaration': 'uint', 'canonical': {'type': 'unsigned int', 'type_kind': 'UInt'}}"#]]
        .assert_eq(&deduce_var_decl_type(&at(source, "count")));
}

#[test]
fn pointers_report_their_pointee() {
    let source = "const char *name = \"x\";\n";
    expect![[r#"{'type': 'const char *', 'type_kind': 'Pointer', 'pointee': 'const char', 'canonical': {'type': 'const char *', 'type_kind': 'Pointer', 'pointee': 'const char'}}"#]]
        .assert_eq(&deduce_var_decl_type(&at(source, "name")));
}

#[test]
fn records_are_declared_by_qualified_name() {
    let source = "namespace app { struct Config {}; }\napp::Config settings;\n";
    expect![[r#"{'type': 'app::Config', 'type_kind': 'Record', 'declaration': 'app::Config', 'canonical': {'type': 'app::Config', 'type_kind': 'Record', 'declaration': 'app::Config'}}"#]]
        .assert_eq(&deduce_var_decl_type(&at(source, "settings")));
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn explicit_return_types_skip_the_body() {
    let source = "int answer() { return 42; }\n";
    expect![[r#"{'type': 'int', 'type_kind': 'Int', 'canonical': {'type': 'int', 'type_kind': 'Int'}}"#]]
        .assert_eq(&deduce_func_return_type(&at(source, "answer")));
}

#[test]
fn the_first_return_statement_wins() {
    let source = "auto pick(bool b) {\n    if (b) return 1;\n    return 2.0;\n}\n";
    expect![[r#"{'type': 'int', 'type_kind': 'Int', 'canonical': {'type': 'int', 'type_kind': 'Int'}}"#]]
        .assert_eq(&deduce_func_return_type(&at(source, "pick")));
}

#[test]
fn bodiless_auto_functions_have_no_type() {
    let source = "auto later();\n";
    assert_eq!(deduce_func_return_type(&at(source, "later")), "{}");
}

#[test]
fn func_or_var_dispatches_on_the_declaration() {
    let source = "auto letter() { return 'c'; }\nauto copy = 1.0;\n";
    expect![[r#"{'type': 'char', 'type_kind': 'Char_S', 'canonical': {'type': 'char', 'type_kind': 'Char_S'}}"#]]
        .assert_eq(&deduce_func_or_var_decl(&at(source, "letter")));
    expect![[r#"{'type': 'double', 'type_kind': 'Double', 'canonical': {'type': 'double', 'type_kind': 'Double'}}"#]]
        .assert_eq(&deduce_func_or_var_decl(&at(source, "copy")));
}

// =============================================================================
// Arbitrary positions
// =============================================================================

#[test]
fn expressions_report_their_own_type() {
    let source = "int base = 2;\nlong wide = base * 2L;\n";
    expect![[r#"{'type': 'long', 'type_kind': 'Long', 'canonical': {'type': 'long', 'type_kind': 'Long'}}"#]]
        .assert_eq(&deduce_type_at(&at(source, "* 2L")));
}

#[test]
fn uses_of_auto_variables_are_deduced() {
    let source = "auto total = 10;\nint twice = total + total;\n";
    expect![[r#"{'type': 'int', 'type_kind': 'Int', 'canonical': {'type': 'int', 'type_kind': 'Int'}}"#]]
        .assert_eq(&deduce_type_at(&at(source, "total +")));
}

#[test]
fn empty_positions_have_no_type() {
    let source = "int a;\n\nint b;\n";
    assert_eq!(deduce_type_at(&at_position(source, 2, 1)), "{}");
    assert_eq!(deduce_var_decl_type(&at_position(source, 2, 1)), "{}");
}

#[test]
fn unreadable_files_have_no_type() {
    let location = LocationTuple::new("/cxx-lens-ide-test/absent.cpp", 1, 1);
    assert_eq!(deduce_type_at(&location), "{}");
}
