//! CLI definitions for cxx-lens.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use cxx_lens_ide::QueryKind;

#[derive(Debug, Parser)]
#[command(
    name = "cxx-lens",
    version,
    about = "C++ type deduction and editor queries",
    after_help = concat!(
        "Examples:\n",
        "  cxx-lens deduce-type-at src/main.cpp --line 12 --col 8\n",
        "  cxx-lens completion src/main.cpp --line 4 --col 7 --stdin < buffer.cpp\n",
        "  cxx-lens diagnostics src/main.cpp -- -std=c++17 -Iinclude\n",
        "  cxx-lens compile-commands src/main.cpp\n",
        "  cxx-lens serve",
    )
)]
pub struct Cli {
    /// Configuration file (defaults to cxx-lens.toml or .cxx-lens.toml in the working directory).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

/// Where to query and how to parse.
#[derive(Debug, Clone, Args)]
pub struct PositionArgs {
    /// Source file.
    pub file: PathBuf,
    /// 1-based line.
    #[arg(long, default_value_t = 1)]
    pub line: u32,
    /// 1-based byte column.
    #[arg(long, default_value_t = 1)]
    pub col: u32,
    /// Read the contents of FILE from stdin.
    #[arg(long)]
    pub stdin: bool,
    /// Parse PATH with the contents of BUFFER_FILE.
    #[arg(long, value_name = "PATH=BUFFER_FILE", value_parser = parse_unsaved)]
    pub unsaved: Vec<(PathBuf, PathBuf)>,
    /// Compiler arguments; replaces the compilation database.
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Type of the variable declared at a position.
    DeduceVarDeclType(PositionArgs),
    /// Type of the variable or function declared at a position.
    DeduceFuncOrVarDecl(PositionArgs),
    /// Result type of the function declared at a position.
    DeduceFuncReturnType(PositionArgs),
    /// Type of whatever is at a position.
    DeduceTypeAt(PositionArgs),
    /// Qualified name of the function around a position.
    CurrentFunction(PositionArgs),
    /// Brief comment of the declaration at or referenced from a position.
    Comment(PositionArgs),
    /// Location of the declaration referenced from a position.
    Declaration(PositionArgs),
    /// File named by the `#include` at a position.
    Include(PositionArgs),
    /// Completion candidates at a position.
    Completion(PositionArgs),
    /// Diagnostics of a file.
    Diagnostics(PositionArgs),
    /// Compiler arguments of a file.
    CompileCommands {
        /// Source file.
        file: PathBuf,
    },
    /// Answer JSON requests read line by line from stdin.
    Serve,
}

impl Command {
    /// The position query this command runs, if it is one.
    pub fn position_query(&self) -> Option<(QueryKind, &PositionArgs)> {
        let query = match self {
            Self::DeduceVarDeclType(args) => (QueryKind::DeduceVarDeclType, args),
            Self::DeduceFuncOrVarDecl(args) => (QueryKind::DeduceFuncOrVarDecl, args),
            Self::DeduceFuncReturnType(args) => (QueryKind::DeduceFuncReturnType, args),
            Self::DeduceTypeAt(args) => (QueryKind::DeduceTypeAt, args),
            Self::CurrentFunction(args) => (QueryKind::CurrentFunction, args),
            Self::Comment(args) => (QueryKind::Comment, args),
            Self::Declaration(args) => (QueryKind::Declaration, args),
            Self::Include(args) => (QueryKind::Include, args),
            Self::Completion(args) => (QueryKind::Completion, args),
            Self::Diagnostics(args) => (QueryKind::Diagnostics, args),
            Self::CompileCommands { .. } | Self::Serve => return None,
        };
        Some(query)
    }
}

fn parse_unsaved(value: &str) -> Result<(PathBuf, PathBuf), String> {
    match value.split_once('=') {
        Some((path, buffer)) if !path.is_empty() && !buffer.is_empty() => {
            Ok((PathBuf::from(path), PathBuf::from(buffer)))
        }
        _ => Err(format!("expected PATH=BUFFER_FILE, got '{value}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_commands_parse() {
        let cli = Cli::try_parse_from([
            "cxx-lens",
            "deduce-type-at",
            "src/main.cpp",
            "--line",
            "12",
            "--col",
            "8",
            "--unsaved",
            "src/a.h=/tmp/a.h.buf",
            "--",
            "-std=c++17",
            "-Iinclude",
        ])
        .expect("valid command line");
        let (kind, args) = cli.command.position_query().expect("position query");
        assert_eq!(kind, QueryKind::DeduceTypeAt);
        assert_eq!(args.file, PathBuf::from("src/main.cpp"));
        assert_eq!((args.line, args.col), (12, 8));
        assert!(!args.stdin);
        assert_eq!(
            args.unsaved,
            vec![(PathBuf::from("src/a.h"), PathBuf::from("/tmp/a.h.buf"))]
        );
        assert_eq!(args.args, vec!["-std=c++17", "-Iinclude"]);
    }

    #[test]
    fn global_config_flag() {
        let cli = Cli::try_parse_from([
            "cxx-lens",
            "compile-commands",
            "a.cpp",
            "--config",
            "lens.toml",
        ])
        .expect("valid command line");
        assert_eq!(cli.config, Some(PathBuf::from("lens.toml")));
        assert!(cli.command.position_query().is_none());
    }

    #[test]
    fn malformed_unsaved_buffers_are_rejected() {
        assert!(parse_unsaved("no-separator").is_err());
        assert!(parse_unsaved("=buffer").is_err());
        assert!(
            Cli::try_parse_from(["cxx-lens", "comment", "a.cpp", "--unsaved", "a.cpp"]).is_err()
        );
    }
}
