//! Line-delimited request loop.
//!
//! Each stdin line is one JSON request, each stdout line the vimson answer:
//!
//! ```text
//! {"query": "deduce-type-at", "file": "src/main.cpp", "line": 3, "col": 9}
//! {'type': 'int', 'type_kind': 'Int', 'canonical': {'type': 'int', 'type_kind': 'Int'}}
//! ```
//!
//! Requests are independent; nothing survives from one line to the next.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use cxx_lens_ide::{execute, render_compile_commands, LocationTuple, QueryKind};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;

#[derive(Debug, Deserialize)]
struct Request {
    query: String,
    file: PathBuf,
    #[serde(default = "first")]
    line: u32,
    #[serde(default = "first")]
    col: u32,
    #[serde(default)]
    args: Option<Vec<String>>,
    #[serde(default)]
    unsaved: Vec<UnsavedBuffer>,
}

#[derive(Debug, Deserialize)]
struct UnsavedBuffer {
    path: PathBuf,
    contents: String,
}

fn first() -> u32 {
    1
}

/// Answers requests from `input` until it is exhausted.
pub fn run(config: &Config, input: impl BufRead, mut output: impl Write) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = line.context("failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = answer(config, &line);
        writeln!(output, "{response}").context("failed to write response")?;
        output.flush().context("failed to flush response")?;
    }
    Ok(())
}

/// Answer to a single request line; `{}` for requests that cannot be decoded.
pub fn answer(config: &Config, line: &str) -> String {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(err) => {
            warn!(%err, "malformed request");
            return String::from("{}");
        }
    };
    let kind = match request.query.parse::<QueryKind>() {
        Ok(kind) => kind,
        Err(err) => {
            warn!(%err, "rejecting request");
            return String::from("{}");
        }
    };
    debug!(query = %kind, file = %request.file.display(), "request");
    let args = config.resolve_args(&request.file, request.args);
    if kind == QueryKind::CompileCommands {
        return render_compile_commands(&args);
    }
    let mut location = LocationTuple::new(request.file, request.line, request.col).with_args(args);
    for buffer in request.unsaved {
        location = location.with_unsaved(buffer.path, buffer.contents);
    }
    execute(kind, &location)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> Config {
        Config::from_toml("[compile]\nuse_database = false\n").expect("valid config")
    }

    #[test]
    fn malformed_requests_answer_empty_maps() {
        let config = offline();
        assert_eq!(answer(&config, "not json"), "{}");
        assert_eq!(answer(&config, r#"{"file": "a.cpp"}"#), "{}");
        assert_eq!(answer(&config, r#"{"query": "teleport", "file": "a.cpp"}"#), "{}");
    }

    #[test]
    fn compile_commands_use_the_configuration() {
        let config = offline();
        assert_eq!(
            answer(&config, r#"{"query": "compile-commands", "file": "/nowhere/a.cpp"}"#),
            "{'commands': '-std=c++1y'}"
        );
        assert_eq!(
            answer(
                &config,
                r#"{"query": "compile_commands", "file": "/nowhere/a.cpp", "args": ["-std=c++17"]}"#
            ),
            "{'commands': '-std=c++17'}"
        );
    }

    #[test]
    fn requests_are_answered_line_by_line() {
        let input = concat!(
            r#"{"query": "deduce-var-decl-type", "file": "/lens/main.cpp", "line": 1, "col": 6, "unsaved": [{"path": "/lens/main.cpp", "contents": "auto x = 1;\n"}]}"#,
            "\n\n",
            r#"{"query": "current-function", "file": "/lens/main.cpp", "line": 1, "col": 20, "unsaved": [{"path": "/lens/main.cpp", "contents": "void run() { int y = 2; }\n"}]}"#,
            "\n",
            "garbage\n",
        );
        let mut output = Vec::new();
        run(&offline(), input.as_bytes(), &mut output).expect("loop completes");
        let output = String::from_utf8(output).expect("utf-8 output");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "{'type': 'int', 'type_kind': 'Int', 'canonical': {'type': 'int', 'type_kind': 'Int'}}",
                "{'name': 'run'}",
                "{}",
            ]
        );
    }
}
