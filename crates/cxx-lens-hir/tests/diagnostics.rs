mod common;
use common::*;

fn messages(unit: &TranslationUnit) -> Vec<(DiagnosticSeverity, String)> {
    unit.diagnostics()
        .iter()
        .map(|diagnostic| (diagnostic.severity, diagnostic.message.clone()))
        .collect()
}

#[test]
fn missing_headers_are_fatal() {
    let source = "#include \"missing.h\"\nint x;\n";
    let unit = parse(source);
    assert_eq!(
        messages(&unit),
        vec![(DiagnosticSeverity::Fatal, "'missing.h' file not found".to_owned())]
    );
    let diagnostic = unit.diagnostic(0).expect("one diagnostic");
    assert_eq!((diagnostic.location.line, diagnostic.location.column), (1, 10));
    assert!(unit.diagnostic(1).is_none());
}

#[test]
fn undeclared_identifiers_are_errors() {
    let source = "int main() { return nope; }\n";
    let unit = parse(source);
    assert_eq!(
        messages(&unit),
        vec![(
            DiagnosticSeverity::Error,
            "use of undeclared identifier 'nope'".to_owned()
        )]
    );
    assert_eq!(unit.diagnostics()[0].location.column, 21);
}

#[test]
fn redefinitions_point_at_the_previous_definition() {
    let source = "int f() { return 0; }\nint f() { return 1; }\n";
    let unit = parse(source);
    assert_eq!(unit.num_diagnostics(), 2);
    let error = &unit.diagnostics()[0];
    assert_eq!(error.severity, DiagnosticSeverity::Error);
    assert_eq!(error.message, "redefinition of 'f'");
    assert_eq!((error.location.line, error.location.column), (2, 5));
    let note = &unit.diagnostics()[1];
    assert_eq!(note.severity, DiagnosticSeverity::Note);
    assert_eq!(note.location.line, 1);
}

#[test]
fn warning_flags_are_honoured() {
    let source = "#warning careful\nint x;\n";
    let plain = parse(source);
    assert_eq!(
        messages(&plain),
        vec![(DiagnosticSeverity::Warning, "careful".to_owned())]
    );
    let silenced = parse_with(source, &["-w"], &[], ParseOptions::incomplete());
    assert_eq!(silenced.num_diagnostics(), 0);
    let promoted = parse_with(source, &["-Werror"], &[], ParseOptions::incomplete());
    assert_eq!(promoted.diagnostics()[0].severity, DiagnosticSeverity::Error);
}

#[test]
fn syntax_errors_are_reported() {
    let source = "int x = ;\n";
    let unit = parse(source);
    assert!(unit
        .diagnostics()
        .iter()
        .any(|diagnostic| diagnostic.severity == DiagnosticSeverity::Error));
}

#[test]
fn clean_sources_have_no_diagnostics() {
    let source = "struct S { int v; int get() const { return v; } };\nint use(S s) { return s.get(); }\n";
    let unit = parse(source);
    assert_eq!(messages(&unit), Vec::new());
}
