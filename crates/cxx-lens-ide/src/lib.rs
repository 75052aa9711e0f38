//! `cxx-lens-ide` - editor queries for C++.
//!
//! This crate answers single-point editor questions on top of `cxx-lens-hir`:
//!
//! - **Type deduction**: effective types of variables, functions and
//!   expressions, looking through `auto` placeholders
//! - **Current function**: qualified name of the function around a position
//! - **Navigation**: brief comments, declaration locations, included files
//! - **Completion and diagnostics**: deduplicated candidates and located
//!   diagnostics
//! - **Compile flags**: arguments from `compile_commands.json`
//!
//! # Architecture
//!
//! Every query is a free function taking a [`LocationTuple`] and returning a
//! vimson literal. Queries parse the file from scratch in their own
//! [`cxx_lens_hir::Index`] and drop it before returning; nothing is shared
//! between calls. Failures never escape: a query that cannot answer renders
//! its empty literal (`{}` or `[]`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod compile_db;
pub mod completion;
pub mod current_function;
pub mod deduction;
pub mod diagnostics;
pub mod location;
pub mod navigation;
pub mod query;
pub mod type_info;
pub mod vimson;

pub use compile_db::{
    compile_args, compile_args_with_fallback, get_compile_commands, render_compile_commands,
    CompilationDatabase, CompileCommand, CompileDbError, DEFAULT_DIALECT_FLAG,
};
pub use completion::get_completion_at;
pub use current_function::{get_current_function_at, qualified_name, ANONYMOUS_SCOPE};
pub use deduction::{
    deduce_func_decl_type_at_cursor, deduce_func_or_var_decl, deduce_func_return_type,
    deduce_type_at, deduce_type_at_cursor, deduce_var_decl_type, find_descendant, is_auto_type,
    search_kind,
};
pub use diagnostics::get_diagnostics;
pub use location::{
    resolve_cursor, resolve_cursor_with_backoff, with_translation_unit, LocationTuple,
};
pub use navigation::{get_comment_at, get_deduced_declaration_at, get_include_at};
pub use query::{execute, QueryKind, UnknownQuery};
pub use type_info::{DeducedType, TypeInfo};
pub use vimson::to_vimson;
