//! Compiler arguments from `compile_commands.json`.
//!
//! The database is looked up in the file's directory and then in every
//! ancestor directory. The outcome is deliberately asymmetric:
//!
//! - no database anywhere: the fallback flags (`-std=c++1y` by default)
//! - a database without an entry for the file: no arguments at all
//! - a database that cannot be read or parsed: no arguments at all

use std::io;
use std::path::{Path, PathBuf};

use cxx_lens_hir::paths::normalize;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::vimson::to_vimson;

/// Dialect flag used when no compilation database exists.
pub const DEFAULT_DIALECT_FLAG: &str = "-std=c++1y";

/// File name of a compilation database.
pub const DATABASE_FILE: &str = "compile_commands.json";

/// Failure to load a compilation database.
#[derive(Debug, Error)]
pub enum CompileDbError {
    /// The database file could not be read.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        /// Database path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The database is not a valid JSON compilation database.
    #[error("malformed compilation database '{}': {source}", path.display())]
    Json {
        /// Database path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// One entry of a compilation database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompileCommand {
    /// Working directory of the compilation.
    pub directory: PathBuf,
    /// Main source file, relative to `directory` or absolute.
    pub file: PathBuf,
    /// Argument vector, compiler included.
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
    /// Shell-escaped command line, used when `arguments` is absent.
    #[serde(default)]
    pub command: Option<String>,
}

impl CompileCommand {
    /// Absolute, normalized path of the source file.
    #[must_use]
    pub fn source_path(&self) -> PathBuf {
        normalize(&self.directory.join(&self.file))
    }

    /// The argument vector, splitting `command` when necessary.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        match (&self.arguments, &self.command) {
            (Some(arguments), _) => arguments.clone(),
            (None, Some(command)) => split_command(command),
            (None, None) => Vec::new(),
        }
    }
}

/// A parsed `compile_commands.json`.
#[derive(Debug, Clone, Default)]
pub struct CompilationDatabase {
    commands: Vec<CompileCommand>,
}

impl CompilationDatabase {
    /// Loads `<directory>/compile_commands.json`.
    pub fn load(directory: &Path) -> Result<Self, CompileDbError> {
        let path = directory.join(DATABASE_FILE);
        let text = std::fs::read_to_string(&path).map_err(|source| CompileDbError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| CompileDbError::Json { path, source })
    }

    /// Parses the JSON text of a database.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let commands = serde_json::from_str(text)?;
        Ok(Self { commands })
    }

    /// Entries for `file`, in database order.
    pub fn commands_for<'a>(
        &'a self,
        file: &'a Path,
    ) -> impl Iterator<Item = &'a CompileCommand> + 'a {
        let file = normalize(file);
        self.commands
            .iter()
            .filter(move |command| command.source_path() == file)
    }

    /// Arguments of the first entry for `file` without the file itself.
    #[must_use]
    pub fn arguments_for(&self, file: &Path) -> Vec<String> {
        let Some(command) = self.commands_for(file).next() else {
            return Vec::new();
        };
        let file = normalize(file);
        command
            .args()
            .into_iter()
            .filter(|arg| normalize(&command.directory.join(arg)) != file)
            .collect()
    }
}

/// Directory holding the nearest database above `file`.
fn find_database_dir(file: &Path) -> Option<&Path> {
    file.ancestors()
        .skip(1)
        .find(|dir| dir.join(DATABASE_FILE).is_file())
}

/// Compiler arguments for `file`, with `-std=c++1y` when no database exists.
#[must_use]
pub fn compile_args(file: &Path) -> Vec<String> {
    compile_args_with_fallback(file, &[DEFAULT_DIALECT_FLAG.to_owned()])
}

/// Compiler arguments for `file`, with `fallback` when no database exists.
#[must_use]
pub fn compile_args_with_fallback(file: &Path, fallback: &[String]) -> Vec<String> {
    let file = normalize(file);
    let Some(directory) = find_database_dir(&file) else {
        debug!(file = %file.display(), "no compilation database");
        return fallback.to_vec();
    };
    match CompilationDatabase::load(directory) {
        Ok(database) => database.arguments_for(&file),
        Err(err) => {
            warn!(%err, "ignoring compilation database");
            Vec::new()
        }
    }
}

#[derive(Debug, Serialize)]
struct CompileCommands {
    commands: String,
}

/// `{'commands': '<space-joined arguments>'}` for `file`.
pub fn get_compile_commands(file: &Path) -> String {
    render_compile_commands(&compile_args(file))
}

/// `{'commands': '<space-joined arguments>'}` for already resolved `args`.
pub fn render_compile_commands(args: &[String]) -> String {
    to_vimson(&CompileCommands {
        commands: args.join(" "),
    })
}

/// Splits a shell command line into words.
///
/// Whitespace separates words; single quotes are literal, double quotes
/// allow `\"` and `\\`, and a backslash outside quotes escapes the next
/// character.
fn split_command(command: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = command.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_word = true;
                for quoted in chars.by_ref() {
                    if quoted == '\'' {
                        break;
                    }
                    word.push(quoted);
                }
            }
            '"' => {
                in_word = true;
                while let Some(quoted) = chars.next() {
                    match quoted {
                        '"' => break,
                        '\\' => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => word.push(escaped),
                            Some(other) => {
                                word.push('\\');
                                word.push(other);
                            }
                            None => word.push('\\'),
                        },
                        _ => word.push(quoted),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(escaped) = chars.next() {
                    word.push(escaped);
                }
            }
            ch if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            _ => {
                in_word = true;
                word.push(ch);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_split_like_a_shell() {
        assert_eq!(
            split_command(r#"clang++ -DNAME="a b" -I'inc dir' -c  main.cpp"#),
            vec!["clang++", "-DNAME=a b", "-Iinc dir", "-c", "main.cpp"]
        );
        assert_eq!(split_command(r"cc a\ b ''"), vec!["cc", "a b", ""]);
        assert_eq!(split_command(r#"cc "q\"uote""#), vec!["cc", "q\"uote"]);
        assert!(split_command("   ").is_empty());
    }

    #[test]
    fn entries_match_by_normalized_path() {
        let database = CompilationDatabase::from_json(
            r#"[
                {"directory": "/work", "file": "src/../main.cpp", "arguments": ["c++", "-std=c++17", "-c", "main.cpp"]},
                {"directory": "/work", "file": "/work/main.cpp", "command": "c++ -O2 -c main.cpp"}
            ]"#,
        )
        .expect("valid database");
        assert_eq!(database.commands_for(Path::new("/work/main.cpp")).count(), 2);
        assert_eq!(
            database.arguments_for(Path::new("/work/main.cpp")),
            vec!["c++", "-std=c++17", "-c"]
        );
        assert!(database.arguments_for(Path::new("/work/other.cpp")).is_empty());
    }

    #[test]
    fn command_strings_are_split() {
        let database = CompilationDatabase::from_json(
            r#"[{"directory": "/w", "file": "a.cpp", "command": "c++ -Iinclude -c /w/a.cpp", "output": "a.o"}]"#,
        )
        .expect("valid database");
        assert_eq!(
            database.arguments_for(Path::new("/w/a.cpp")),
            vec!["c++", "-Iinclude", "-c"]
        );
    }

    #[test]
    fn malformed_databases_are_errors() {
        assert!(CompilationDatabase::from_json("{\"not\": \"a list\"}").is_err());
        assert!(CompilationDatabase::from_json("[{\"file\": \"a.cpp\"}]").is_err());
    }
}
