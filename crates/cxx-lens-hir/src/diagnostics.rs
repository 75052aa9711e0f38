//! Diagnostics reported while building a translation unit.

use std::fmt;

use tree_sitter::Node;

use crate::unit::SourceLocation;

/// Severity of a diagnostic, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    /// Suppressed by the command line.
    Ignored,
    /// Supplementary information attached to a previous diagnostic.
    Note,
    /// Suspicious but valid code.
    Warning,
    /// Invalid code.
    Error,
    /// Error after which the translation unit is unreliable.
    Fatal,
}

impl DiagnosticSeverity {
    /// Lower-case name used in editor output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic with its resolved location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity after command-line policy was applied.
    pub severity: DiagnosticSeverity,
    /// Where the problem was found.
    pub location: SourceLocation,
    /// Human-readable message.
    pub message: String,
}

/// How `-w` and `-Werror` rewrite warning severities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DiagnosticPolicy {
    suppress_warnings: bool,
    warnings_as_errors: bool,
}

impl DiagnosticPolicy {
    pub(crate) fn from_args(args: &[String]) -> Self {
        let mut policy = Self::default();
        for arg in args {
            match arg.as_str() {
                "-w" => policy.suppress_warnings = true,
                "-Werror" => policy.warnings_as_errors = true,
                "-Wno-error" => policy.warnings_as_errors = false,
                _ => {}
            }
        }
        policy
    }

    /// Final severity of a diagnostic; `None` drops it.
    pub(crate) fn apply(self, severity: DiagnosticSeverity) -> Option<DiagnosticSeverity> {
        match severity {
            DiagnosticSeverity::Warning if self.suppress_warnings => None,
            DiagnosticSeverity::Warning if self.warnings_as_errors => {
                Some(DiagnosticSeverity::Error)
            }
            other => Some(other),
        }
    }
}

/// A syntax problem found in a tree-sitter tree, as byte offset and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub(crate) offset: usize,
    pub(crate) message: String,
}

/// Collects `ERROR` and `MISSING` nodes without descending into error
/// subtrees, which only repeat the same problem.
pub(crate) fn syntax_errors(root: Node<'_>, source: &str) -> Vec<SyntaxError> {
    let mut errors = Vec::new();
    if !root.has_error() {
        return errors;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            errors.push(SyntaxError {
                offset: node.start_byte(),
                message: format!("expected '{}'", node.kind()),
            });
            continue;
        }
        if node.is_error() {
            let token = node
                .utf8_text(source.as_bytes())
                .ok()
                .and_then(|text| text.split_whitespace().next())
                .unwrap_or_default();
            errors.push(SyntaxError {
                offset: node.start_byte(),
                message: if token.is_empty() {
                    "expected expression".to_owned()
                } else {
                    format!("unexpected '{token}'")
                },
            });
            continue;
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    errors.sort_by_key(|error| error.offset);
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn werror_promotes_and_w_drops_warnings() {
        let werror = DiagnosticPolicy::from_args(&["-Werror".to_owned()]);
        assert_eq!(
            werror.apply(DiagnosticSeverity::Warning),
            Some(DiagnosticSeverity::Error)
        );
        let silent = DiagnosticPolicy::from_args(&["-w".to_owned()]);
        assert_eq!(silent.apply(DiagnosticSeverity::Warning), None);
        assert_eq!(
            silent.apply(DiagnosticSeverity::Fatal),
            Some(DiagnosticSeverity::Fatal)
        );
    }

    #[test]
    fn severities_render_lower_case() {
        assert_eq!(DiagnosticSeverity::Fatal.to_string(), "fatal");
        assert_eq!(DiagnosticSeverity::Ignored.as_str(), "ignored");
    }
}
