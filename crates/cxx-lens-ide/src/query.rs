//! Query names and dispatch.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::location::LocationTuple;
use crate::{completion, compile_db, current_function, deduction, diagnostics, navigation};

/// Every query the crate answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Type of the variable declared at a position.
    DeduceVarDeclType,
    /// Type of the variable or function declared at a position.
    DeduceFuncOrVarDecl,
    /// Result type of the function declared at a position.
    DeduceFuncReturnType,
    /// Type of whatever is at a position.
    DeduceTypeAt,
    /// Qualified name of the enclosing function.
    CurrentFunction,
    /// Brief comment of the referenced declaration.
    Comment,
    /// Location of the referenced declaration.
    Declaration,
    /// File named by an `#include`.
    Include,
    /// Completion candidates.
    Completion,
    /// Diagnostics of the file.
    Diagnostics,
    /// Compiler arguments of the file.
    CompileCommands,
}

impl QueryKind {
    /// All queries, in documentation order.
    pub const ALL: [QueryKind; 11] = [
        Self::DeduceVarDeclType,
        Self::DeduceFuncOrVarDecl,
        Self::DeduceFuncReturnType,
        Self::DeduceTypeAt,
        Self::CurrentFunction,
        Self::Comment,
        Self::Declaration,
        Self::Include,
        Self::Completion,
        Self::Diagnostics,
        Self::CompileCommands,
    ];

    /// Command-line name of the query.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DeduceVarDeclType => "deduce-var-decl-type",
            Self::DeduceFuncOrVarDecl => "deduce-func-or-var-decl",
            Self::DeduceFuncReturnType => "deduce-func-return-type",
            Self::DeduceTypeAt => "deduce-type-at",
            Self::CurrentFunction => "current-function",
            Self::Comment => "comment",
            Self::Declaration => "declaration",
            Self::Include => "include",
            Self::Completion => "completion",
            Self::Diagnostics => "diagnostics",
            Self::CompileCommands => "compile-commands",
        }
    }

    /// Literal answered when the query has no result.
    #[must_use]
    pub const fn empty_result(self) -> &'static str {
        match self {
            Self::Completion | Self::Diagnostics => "[]",
            _ => "{}",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown query name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown query '{0}'")]
pub struct UnknownQuery(pub String);

impl FromStr for QueryKind {
    type Err = UnknownQuery;

    /// Accepts the command-line name with either `-` or `_` separators.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = name.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| UnknownQuery(name.to_owned()))
    }
}

/// Runs `kind` at `location` and returns its vimson literal.
pub fn execute(kind: QueryKind, location: &LocationTuple) -> String {
    match kind {
        QueryKind::DeduceVarDeclType => deduction::deduce_var_decl_type(location),
        QueryKind::DeduceFuncOrVarDecl => deduction::deduce_func_or_var_decl(location),
        QueryKind::DeduceFuncReturnType => deduction::deduce_func_return_type(location),
        QueryKind::DeduceTypeAt => deduction::deduce_type_at(location),
        QueryKind::CurrentFunction => current_function::get_current_function_at(location),
        QueryKind::Comment => navigation::get_comment_at(location),
        QueryKind::Declaration => navigation::get_deduced_declaration_at(location),
        QueryKind::Include => navigation::get_include_at(location),
        QueryKind::Completion => completion::get_completion_at(location),
        QueryKind::Diagnostics => diagnostics::get_diagnostics(location),
        QueryKind::CompileCommands => compile_db::get_compile_commands(&location.file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in QueryKind::ALL {
            assert_eq!(kind.name().parse::<QueryKind>(), Ok(kind));
        }
    }

    #[test]
    fn underscores_are_accepted() {
        assert_eq!(
            "deduce_var_decl_type".parse::<QueryKind>(),
            Ok(QueryKind::DeduceVarDeclType)
        );
        assert_eq!(
            "get_compile_commands".parse::<QueryKind>(),
            Err(UnknownQuery("get_compile_commands".to_owned()))
        );
    }
}
