//! Configuration loaded from `cxx-lens.toml`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use cxx_lens_ide::{compile_args_with_fallback, DEFAULT_DIALECT_FLAG};
use serde::Deserialize;

pub(crate) const CONFIG_FILES: &[&str] = &["cxx-lens.toml", ".cxx-lens.toml"];

/// Settings from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How compiler arguments are chosen.
    pub compile: CompileSection,
    /// Log filtering.
    pub log: LogSection,
}

/// `[compile]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompileSection {
    /// Used only when no `compile_commands.json` exists.
    pub fallback_flags: Vec<String>,
    /// Appended to every argument list.
    pub extra_args: Vec<String>,
    /// Consult `compile_commands.json` at all.
    pub use_database: bool,
}

impl Default for CompileSection {
    fn default() -> Self {
        Self {
            fallback_flags: vec![DEFAULT_DIALECT_FLAG.to_owned()],
            extra_args: Vec::new(),
            use_database: true,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// `tracing` filter directive used when `CXX_LENS_LOG` is unset.
    pub filter: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: String::from("warn"),
        }
    }
}

impl Config {
    /// First configuration file present in `dir`.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Loads the configuration found in `dir`, or the defaults when there is
    /// none.
    pub fn discover(dir: &Path) -> anyhow::Result<Self> {
        match Self::find(dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Parses configuration text.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Compiler arguments for `file`: the compilation database (or the
    /// fallback flags), followed by `extra_args`.
    pub fn compile_args(&self, file: &Path) -> Vec<String> {
        let mut args = if self.compile.use_database {
            compile_args_with_fallback(file, &self.compile.fallback_flags)
        } else {
            self.compile.fallback_flags.clone()
        };
        args.extend(self.compile.extra_args.iter().cloned());
        args
    }

    /// `explicit` arguments when given, otherwise [`Config::compile_args`];
    /// `extra_args` are appended in both cases.
    pub fn resolve_args(&self, file: &Path, explicit: Option<Vec<String>>) -> Vec<String> {
        match explicit {
            Some(mut args) => {
                args.extend(self.compile.extra_args.iter().cloned());
                args
            }
            None => self.compile_args(file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_the_database_and_the_default_dialect() {
        let config = Config::default();
        assert_eq!(config.compile.fallback_flags, vec!["-std=c++1y"]);
        assert!(config.compile.use_database);
        assert!(config.compile.extra_args.is_empty());
        assert_eq!(config.log.filter, "warn");
    }

    #[test]
    fn partial_files_keep_defaults() {
        let config =
            Config::from_toml("[compile]\nextra_args = [\"-DLENS\"]\n").expect("valid config");
        assert_eq!(config.compile.extra_args, vec!["-DLENS"]);
        assert_eq!(config.compile.fallback_flags, vec!["-std=c++1y"]);
        assert_eq!(config.log, LogSection::default());
    }

    #[test]
    fn full_files_override_everything() {
        let config = Config::from_toml(
            "[compile]\nfallback_flags = [\"-std=c++20\"]\nextra_args = []\nuse_database = false\n[log]\nfilter = \"cxx_lens_ide=debug\"\n",
        )
        .expect("valid config");
        assert_eq!(config.compile.fallback_flags, vec!["-std=c++20"]);
        assert!(!config.compile.use_database);
        assert_eq!(config.log.filter, "cxx_lens_ide=debug");
        assert_eq!(
            config.compile_args(Path::new("/anywhere/a.cpp")),
            vec!["-std=c++20"]
        );
    }

    #[test]
    fn malformed_files_are_errors() {
        assert!(Config::from_toml("[compile]\nuse_database = \"yes\"\n").is_err());
    }

    #[test]
    fn explicit_arguments_still_get_extra_args() {
        let config =
            Config::from_toml("[compile]\nextra_args = [\"-DLENS\"]\nuse_database = false\n")
                .expect("valid config");
        assert_eq!(
            config.resolve_args(Path::new("a.cpp"), Some(vec!["-std=c++17".to_owned()])),
            vec!["-std=c++17", "-DLENS"]
        );
        assert_eq!(
            config.resolve_args(Path::new("a.cpp"), None),
            vec!["-std=c++1y", "-DLENS"]
        );
    }

    #[test]
    fn discovery_prefers_the_plain_name() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert_eq!(Config::discover(dir.path()).expect("defaults"), Config::default());
        std::fs::write(
            dir.path().join(".cxx-lens.toml"),
            "[log]\nfilter = \"info\"\n",
        )
        .expect("write");
        assert_eq!(Config::discover(dir.path()).expect("hidden file").log.filter, "info");
        std::fs::write(
            dir.path().join("cxx-lens.toml"),
            "[log]\nfilter = \"debug\"\n",
        )
        .expect("write");
        assert_eq!(Config::discover(dir.path()).expect("plain file").log.filter, "debug");
        std::fs::write(dir.path().join("cxx-lens.toml"), "[log\n").expect("write");
        assert!(Config::discover(dir.path()).is_err());
    }
}
