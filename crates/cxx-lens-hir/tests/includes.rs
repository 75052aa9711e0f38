mod common;
use common::*;

use std::path::Path;

const HEADER: &str = "/cxx-lens-test/defs.h";

#[test]
fn quoted_includes_resolve_next_to_the_includer() {
    let source = "#include \"defs.h\"\nint value = from_header();\n";
    let options = ParseOptions::incomplete().with_detailed_preprocessing_record();
    let unit = parse_with(source, &[], &[(HEADER, "int from_header();\n")], options);
    assert_eq!(unit.num_diagnostics(), 0);

    let directive = unit
        .cursor_at(Path::new(MAIN), 1, 3)
        .expect("inclusion directive");
    assert_eq!(directive.kind(), CursorKind::InclusionDirective);
    assert_eq!(directive.included_file(), Some(Path::new(HEADER)));

    let call = cursor_at(&unit, source, "from_header");
    let declaration = call.referenced().expect("declared in the header");
    assert_eq!(declaration.location().file, Path::new(HEADER));
}

#[test]
fn directives_are_not_cursors_without_a_detailed_record() {
    let source = "#include \"defs.h\"\n";
    let unit = parse_with(
        source,
        &[],
        &[(HEADER, "int from_header();\n")],
        ParseOptions::incomplete(),
    );
    assert!(unit.cursor_at(Path::new(MAIN), 1, 3).is_none());
}

#[test]
fn angled_includes_search_include_directories() {
    let source = "#include <lib.h>\nLibType t;\n";
    let unit = parse_with(
        source,
        &["-I", "/cxx-lens-test/include"],
        &[("/cxx-lens-test/include/lib.h", "struct LibType {};\n")],
        ParseOptions::incomplete(),
    );
    assert_eq!(unit.num_diagnostics(), 0);
    let variable = cursor_at(&unit, source, "t;");
    assert_eq!(variable.ty().kind(), TypeKind::Record);
}

#[test]
fn headers_are_lowered_once() {
    let source = "#include \"defs.h\"\n#include \"defs.h\"\nint x = from_header();\n";
    let header = "inline int from_header() { return 1; }\n";
    let unit = parse_with(source, &[], &[(HEADER, header)], ParseOptions::incomplete());
    assert_eq!(unit.num_diagnostics(), 0);
}

#[test]
fn files_are_read_from_disk_without_buffers() {
    let dir = tempfile::tempdir().expect("temp dir");
    let header = dir.path().join("shapes.h");
    let main = dir.path().join("main.cpp");
    std::fs::write(&header, "struct Circle { double radius; };\n").expect("write header");
    std::fs::write(&main, "#include \"shapes.h\"\nCircle unit;\n").expect("write main");

    let mut index = Index::new().expect("C++ grammar loads");
    let unit = index
        .parse_translation_unit(&main, &[], &[], ParseOptions::incomplete())
        .expect("parses from disk");
    assert_eq!(unit.num_diagnostics(), 0);
    let variable = unit.cursor_at(&main, 2, 8).expect("variable");
    assert_eq!(variable.kind(), CursorKind::VarDecl);
    let record = variable.ty().declaration().expect("record");
    assert_eq!(record.location().file, header);
}

#[test]
fn unreadable_main_files_are_errors() {
    let mut index = Index::new().expect("C++ grammar loads");
    let result = index.parse_translation_unit(
        Path::new("/cxx-lens-test/does-not-exist.cpp"),
        &[],
        &[],
        ParseOptions::incomplete(),
    );
    assert!(result.is_err());
}
