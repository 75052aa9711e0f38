#![no_main]

use std::path::Path;

use cxx_lens_hir::{ChildVisit, Index, ParseOptions, UnsavedFile};
use libfuzzer_sys::fuzz_target;

const MAX_SOURCE_BYTES: usize = 4096;
const MAIN: &str = "/fuzz/main.cpp";
const HEADER: &str = "/fuzz/fuzz.h";

fn decode_source(bytes: &[u8]) -> String {
    let capped = &bytes[..bytes.len().min(MAX_SOURCE_BYTES)];
    String::from_utf8_lossy(capped).into_owned()
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let split = usize::from(data[0]) % (data.len() - 1) + 1;
    let header = decode_source(&data[1..split]);
    let main = format!("#include \"fuzz.h\"\n{}", decode_source(&data[split..]));
    let unsaved = [UnsavedFile::new(MAIN, main.as_str()), UnsavedFile::new(HEADER, header)];

    let Ok(mut index) = Index::new() else {
        return;
    };
    let options = ParseOptions::incomplete().with_detailed_preprocessing_record();
    let Ok(unit) = index.parse_translation_unit(Path::new(MAIN), &[], &unsaved, options) else {
        return;
    };

    unit.cursor().visit_children(|cursor, _| {
        let ty = cursor.ty();
        let _ = (ty.spelling(), ty.canonical().spelling(), ty.pointee(), ty.result_type().kind());
        let _ = (cursor.semantic_parent(), cursor.referenced(), cursor.canonical());
        let _ = (cursor.location(), cursor.extent(), cursor.brief_comment());
        ChildVisit::Recurse
    });

    let lines = u32::try_from(main.lines().count()).unwrap_or(u32::MAX).max(1);
    let line = u32::from(data[1]) % lines + 1;
    let column = u32::from(data[2]) % 80 + 1;
    let _ = unit.cursor_at(Path::new(MAIN), line, column);
    let _ = unit.code_complete_at(Path::new(MAIN), line, column);
    let _ = unit.diagnostics();
});
