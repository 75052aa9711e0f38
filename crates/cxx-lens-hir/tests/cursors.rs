mod common;
use common::*;

#[test]
fn variable_name_resolves_to_its_declaration() {
    let source = "int answer = 42;\n";
    let unit = parse(source);
    let cursor = cursor_at(&unit, source, "answer");
    assert_eq!(cursor.kind(), CursorKind::VarDecl);
    assert_eq!(cursor.spelling(), "answer");
    assert_eq!(cursor.ty().spelling(), "int");
    assert!(cursor.is_definition());
    let location = cursor.location();
    assert_eq!((location.line, location.column), (1, 5));
    assert_eq!(
        cursor.semantic_parent().map(|parent| parent.kind()),
        Some(CursorKind::TranslationUnit)
    );
}

#[test]
fn positions_outside_every_declaration_have_no_cursor() {
    let source = "int a;\n\n\nint b;\n";
    let unit = parse(source);
    assert!(unit.cursor_at(std::path::Path::new(MAIN), 2, 1).is_none());
}

#[test]
fn references_point_at_their_declaration() {
    let source = "int value = 1;\nint copy = value;\n";
    let unit = parse(source);
    let cursor = cursor_at(&unit, source, "value;");
    assert_eq!(cursor.kind(), CursorKind::DeclRefExpr);
    let target = cursor.referenced().expect("reference resolves");
    assert_eq!(target.kind(), CursorKind::VarDecl);
    assert_eq!(target.location().line, 1);
}

#[test]
fn out_of_line_members_belong_to_their_class() {
    let source = "struct Widget {\n    void draw();\n};\nvoid Widget::draw() {}\n";
    let unit = parse(source);
    let cursor = cursor_at(&unit, source, "draw() {}");
    assert_eq!(cursor.kind(), CursorKind::CXXMethod);
    let parent = cursor.semantic_parent().expect("method has a class");
    assert_eq!(parent.kind(), CursorKind::StructDecl);
    assert_eq!(parent.spelling(), "Widget");
    assert_eq!(cursor.canonical().location().line, 2);
    assert!(cursor.is_definition());
    assert!(!cursor.canonical().is_definition());
}

#[test]
fn semantic_parents_walk_through_namespaces() {
    let source = "namespace outer {\nnamespace {\nvoid helper() { int local = 0; }\n}\n}\n";
    let unit = parse(source);
    let local = cursor_at(&unit, source, "local");
    assert_eq!(local.kind(), CursorKind::VarDecl);
    let function = local.semantic_parent().expect("function");
    assert_eq!(function.kind(), CursorKind::FunctionDecl);
    assert_eq!(function.spelling(), "helper");
    let anonymous = function.semantic_parent().expect("anonymous namespace");
    assert_eq!(anonymous.kind(), CursorKind::Namespace);
    assert_eq!(anonymous.spelling(), "");
    let outer = anonymous.semantic_parent().expect("outer namespace");
    assert_eq!(outer.spelling(), "outer");
    assert_eq!(
        outer.semantic_parent().map(|parent| parent.kind()),
        Some(CursorKind::TranslationUnit)
    );
}

#[test]
fn redeclarations_share_a_canonical_declaration() {
    let source = "int twice(int);\nint twice(int v) { return v * 2; }\n";
    let unit = parse(source);
    let definition = cursor_at(&unit, source, "twice(int v)");
    assert_eq!(definition.kind(), CursorKind::FunctionDecl);
    assert_eq!(definition.canonical().location().line, 1);
    assert_eq!(definition.ty().spelling(), "int (int)");
    assert_eq!(definition.result_type().spelling(), "int");
}

#[test]
fn brief_comments_take_the_first_paragraph() {
    let source = "/// Adds two numbers.\n///\n/// Longer description.\nint add(int a, int b);\n";
    let unit = parse(source);
    let cursor = cursor_at(&unit, source, "add");
    assert_eq!(cursor.kind(), CursorKind::FunctionDecl);
    assert_eq!(cursor.brief_comment(), Some("Adds two numbers."));
}

#[test]
fn visiting_stops_on_break() {
    let source = "int a = 1;\nint b = 2;\nint c = 3;\n";
    let unit = parse(source);
    let mut seen = Vec::new();
    let stopped = unit.cursor().visit_children(|child, _| {
        seen.push(child.spelling().to_owned());
        if child.spelling() == "b" {
            ChildVisit::Break
        } else {
            ChildVisit::Continue
        }
    });
    assert!(stopped);
    assert_eq!(seen, vec!["a".to_owned(), "b".to_owned()]);
}

fn dump(cursor: Cursor<'_>, depth: usize, out: &mut String) {
    cursor.visit_children(|child, _| {
        out.push_str(&"  ".repeat(depth));
        out.push_str(child.kind().spelling());
        out.push(' ');
        out.push_str(child.spelling());
        if child.ty().is_valid() {
            out.push_str(" : ");
            out.push_str(child.ty().spelling());
        }
        out.push('\n');
        dump(child, depth + 1, out);
        ChildVisit::Continue
    });
}

#[test]
fn declaration_tree_snapshot() {
    let source = "namespace n {\nint f(int a);\n}\n";
    let unit = parse(source);
    let mut out = String::new();
    dump(unit.cursor(), 0, &mut out);
    expect_test::expect![[r#"
        Namespace n
          FunctionDecl f : int (int)
            ParmDecl a : int
    "#]]
    .assert_eq(&out);
}
