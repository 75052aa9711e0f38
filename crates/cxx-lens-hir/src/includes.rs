//! `#include` search paths and header resolution.

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::paths;

/// Header name of an include directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IncludeSpec {
    /// `#include "name"`.
    Quoted(String),
    /// `#include <name>`.
    Angled(String),
}

impl IncludeSpec {
    pub(crate) fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(name) = text.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
            return Some(Self::Quoted(name.to_owned()));
        }
        text.strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .map(|name| Self::Angled(name.to_owned()))
    }

    pub(crate) fn name(&self) -> &str {
        match self {
            Self::Quoted(name) | Self::Angled(name) => name,
        }
    }
}

/// Include directories extracted from compiler arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct IncludeSearch {
    quote_dirs: Vec<PathBuf>,
    angle_dirs: Vec<PathBuf>,
}

impl IncludeSearch {
    /// Reads `-iquote`, `-I` and `-isystem`, each joined (`-Idir`) or split
    /// (`-I dir`).
    pub(crate) fn from_args(args: &[String]) -> Self {
        let mut search = Self::default();
        let mut user = Vec::new();
        let mut system = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            for (flag, target) in [
                ("-iquote", &mut search.quote_dirs),
                ("-isystem", &mut system),
                ("-I", &mut user),
            ] {
                if let Some(rest) = arg.strip_prefix(flag) {
                    let dir = if rest.is_empty() {
                        iter.next().map(String::as_str)
                    } else {
                        Some(rest)
                    };
                    if let Some(dir) = dir {
                        target.push(paths::normalize(Path::new(dir)));
                    }
                    break;
                }
            }
        }
        search.angle_dirs = user.into_iter().chain(system).collect();
        search
    }

    /// Resolves `spec` included from a file in `includer_dir`.
    pub(crate) fn resolve(
        &self,
        spec: &IncludeSpec,
        includer_dir: &Path,
        exists: impl Fn(&Path) -> bool,
    ) -> Option<PathBuf> {
        let candidates: Vec<&Path> = match spec {
            IncludeSpec::Quoted(_) => std::iter::once(includer_dir)
                .chain(self.quote_dirs.iter().map(PathBuf::as_path))
                .chain(self.angle_dirs.iter().map(PathBuf::as_path))
                .collect(),
            IncludeSpec::Angled(_) => self.angle_dirs.iter().map(PathBuf::as_path).collect(),
        };
        let found = candidates
            .into_iter()
            .map(|dir| paths::normalize(&dir.join(spec.name())))
            .find(|candidate| exists(candidate));
        trace!(header = spec.name(), resolved = ?found, "include lookup");
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| (*item).to_owned()).collect()
    }

    #[test]
    fn parses_quoted_and_angled_names() {
        assert_eq!(
            IncludeSpec::parse("\"foo.h\""),
            Some(IncludeSpec::Quoted("foo.h".to_owned()))
        );
        assert_eq!(
            IncludeSpec::parse("<vector>"),
            Some(IncludeSpec::Angled("vector".to_owned()))
        );
        assert_eq!(IncludeSpec::parse("FOO"), None);
    }

    #[test]
    fn joined_and_split_flags_are_accepted() {
        let search = IncludeSearch::from_args(&args(&[
            "-I/a", "-I", "/b", "-isystem", "/c", "-iquote/d",
        ]));
        assert_eq!(
            search.angle_dirs,
            vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]
        );
        assert_eq!(search.quote_dirs, vec![PathBuf::from("/d")]);
    }

    #[test]
    fn quoted_includes_prefer_the_including_directory() {
        let search = IncludeSearch::from_args(&args(&["-I/inc"]));
        let spec = IncludeSpec::Quoted("x.h".to_owned());
        let found = search.resolve(&spec, Path::new("/src"), |_| true);
        assert_eq!(found, Some(PathBuf::from("/src/x.h")));

        let angled = IncludeSpec::Angled("x.h".to_owned());
        let found = search.resolve(&angled, Path::new("/src"), |path| path.starts_with("/inc"));
        assert_eq!(found, Some(PathBuf::from("/inc/x.h")));
    }
}
