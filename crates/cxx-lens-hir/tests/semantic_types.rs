mod common;
use common::*;

use std::path::Path;

#[test]
fn auto_variables_keep_their_placeholder_but_uses_are_deduced() {
    let source = "auto count = 3;\nint copy = count;\n";
    let unit = parse(source);
    let declaration = cursor_at(&unit, source, "count");
    assert_eq!(declaration.ty().kind(), TypeKind::Auto);
    assert_eq!(declaration.ty().spelling(), "auto");
    let use_site = cursor_at(&unit, source, "count;");
    assert_eq!(use_site.kind(), CursorKind::DeclRefExpr);
    assert_eq!(use_site.ty().spelling(), "int");
}

#[test]
fn calls_to_auto_functions_take_the_returned_type() {
    let source = "auto half() { return 0.5; }\nauto h = half();\n";
    let unit = parse(source);
    let (line, column) = position_of(source, "half();");
    let call = unit
        .cursor_at(Path::new(MAIN), line, column + 4)
        .expect("call expression");
    assert_eq!(call.kind(), CursorKind::CallExpr);
    assert_eq!(call.ty().spelling(), "double");
}

#[test]
fn member_access_through_pointers() {
    let source = "struct Point { int x; double y; };\nPoint origin;\nPoint *ptr = &origin;\ndouble dy = ptr->y;\n";
    let unit = parse(source);
    let (line, column) = position_of(source, "->y");
    let member = unit
        .cursor_at(Path::new(MAIN), line, column + 2)
        .expect("member reference");
    assert_eq!(member.kind(), CursorKind::MemberRefExpr);
    assert_eq!(member.ty().spelling(), "double");
    let field = member.referenced().expect("field");
    assert_eq!(field.kind(), CursorKind::FieldDecl);
    assert_eq!(field.spelling(), "y");

    let pointer = cursor_at(&unit, source, "ptr =");
    assert_eq!(pointer.ty().spelling(), "Point *");
    assert_eq!(pointer.ty().pointee().map(|pointee| pointee.kind()), Some(TypeKind::Record));
}

#[test]
fn string_literals_are_const_char_arrays() {
    let source = "const char *greeting = \"hello\";\n";
    let unit = parse(source);
    let literal = cursor_at(&unit, source, "\"hello");
    assert_eq!(literal.kind(), CursorKind::StringLiteral);
    assert_eq!(literal.ty().spelling(), "const char[6]");
    assert_eq!(literal.ty().array_size(), Some(6));
    let variable = cursor_at(&unit, source, "greeting");
    assert_eq!(variable.ty().spelling(), "const char *");
}

#[test]
fn typedefs_canonicalize_to_builtin_types() {
    let source = "typedef unsigned long ulong_t;\nulong_t n = 0;\n";
    let unit = parse(source);
    let variable = cursor_at(&unit, source, "n =");
    assert_eq!(variable.ty().kind(), TypeKind::Typedef);
    assert_eq!(variable.ty().spelling(), "ulong_t");
    assert_eq!(variable.ty().canonical().kind(), TypeKind::ULong);
    assert_eq!(variable.ty().canonical().spelling(), "unsigned long");
}

#[test]
fn records_canonicalize_to_qualified_names() {
    let source = "namespace geo { struct Vec {}; }\nusing namespace geo;\nVec v;\ngeo::Vec w;\n";
    let unit = parse(source);
    let v = cursor_at(&unit, source, "v;");
    assert_eq!(v.ty().spelling(), "Vec");
    assert_eq!(v.ty().canonical().spelling(), "geo::Vec");
    let w = cursor_at(&unit, source, "w;");
    assert_eq!(w.ty().spelling(), "geo::Vec");
    let declaration = w.ty().declaration().expect("record declaration");
    assert_eq!(declaration.kind(), CursorKind::StructDecl);
    assert_eq!(declaration.spelling(), "Vec");
}

#[test]
fn arithmetic_follows_usual_conversions() {
    let source = "int i = 1;\ndouble d = 2.0;\nauto sum = i + d;\nauto big = 1L * i;\n";
    let unit = parse(source);
    let sum = cursor_at(&unit, source, "+ d");
    assert_eq!(sum.kind(), CursorKind::BinaryOperator);
    assert_eq!(sum.ty().spelling(), "double");
    let product = cursor_at(&unit, source, "* i");
    assert_eq!(product.ty().spelling(), "long");
}
