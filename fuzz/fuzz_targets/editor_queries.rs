#![no_main]

use cxx_lens_ide::{execute, LocationTuple, QueryKind};
use libfuzzer_sys::fuzz_target;

const MAX_SOURCE_BYTES: usize = 4096;
const MAIN: &str = "/fuzz/main.cpp";

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let capped = &data[3..data.len().min(MAX_SOURCE_BYTES + 3)];
    let source = String::from_utf8_lossy(capped).into_owned();
    let lines = u32::try_from(source.lines().count()).unwrap_or(u32::MAX).max(1);
    let line = u32::from(data[1]) % lines + 1;
    let col = u32::from(data[2]) % 80 + 1;
    let kind = QueryKind::ALL[usize::from(data[0]) % QueryKind::ALL.len()];
    if kind == QueryKind::CompileCommands {
        return;
    }

    let location = LocationTuple::new(MAIN, line, col)
        .with_args(vec![String::from("-std=c++17")])
        .with_unsaved(MAIN, source);
    let rendered = execute(kind, &location);
    assert!(rendered.starts_with('{') || rendered.starts_with('['));
});
