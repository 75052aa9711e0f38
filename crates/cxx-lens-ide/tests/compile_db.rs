use std::fs;
use std::path::Path;

use cxx_lens_ide::{compile_args, compile_args_with_fallback, get_compile_commands};
use serde_json::json;

fn write_database(dir: &Path, entries: &serde_json::Value) {
    fs::write(dir.join("compile_commands.json"), entries.to_string()).expect("write database");
}

#[test]
fn no_database_falls_back_to_the_default_dialect() {
    let dir = tempfile::tempdir().expect("temp dir");
    let file = dir.path().join("a.cpp");
    assert_eq!(compile_args(&file), vec!["-std=c++1y"]);
    assert_eq!(get_compile_commands(&file), "{'commands': '-std=c++1y'}");
    assert_eq!(
        compile_args_with_fallback(&file, &["-std=c++20".to_owned()]),
        vec!["-std=c++20"]
    );
}

#[test]
fn database_entries_drop_the_file_itself() {
    let dir = tempfile::tempdir().expect("temp dir");
    let file = dir.path().join("main.cpp");
    write_database(
        dir.path(),
        &json!([{
            "directory": dir.path(),
            "file": "main.cpp",
            "arguments": ["clang++", "-std=c++17", "-Iinclude", "-c", "main.cpp"]
        }]),
    );
    assert_eq!(compile_args(&file), vec!["clang++", "-std=c++17", "-Iinclude", "-c"]);
    assert_eq!(
        get_compile_commands(&file),
        "{'commands': 'clang++ -std=c++17 -Iinclude -c'}"
    );
}

#[test]
fn databases_are_found_in_ancestor_directories() {
    let dir = tempfile::tempdir().expect("temp dir");
    let nested = dir.path().join("src").join("deep");
    fs::create_dir_all(&nested).expect("create dirs");
    let file = nested.join("a.cpp");
    write_database(
        dir.path(),
        &json!([{
            "directory": dir.path(),
            "file": "src/deep/a.cpp",
            "command": "c++ -DDEEP=1 -c src/deep/a.cpp"
        }]),
    );
    assert_eq!(compile_args(&file), vec!["c++", "-DDEEP=1", "-c"]);
}

#[test]
fn files_missing_from_the_database_get_no_arguments() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_database(
        dir.path(),
        &json!([{"directory": dir.path(), "file": "other.cpp", "arguments": ["c++", "other.cpp"]}]),
    );
    let file = dir.path().join("main.cpp");
    assert!(compile_args(&file).is_empty());
    assert_eq!(get_compile_commands(&file), "{'commands': ''}");
}

#[test]
fn malformed_databases_get_no_arguments() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("compile_commands.json"), "{ not json").expect("write database");
    assert!(compile_args(&dir.path().join("main.cpp")).is_empty());
}
