//! Type deduction through `auto` placeholders.
//!
//! The front end reports the declared type of a declaration. For `auto`
//! variables and functions that is the placeholder itself, so the effective
//! type has to be recovered from the initializer or from a `return`
//! statement. Both searches share [`find_descendant`].

use cxx_lens_hir::{ChildVisit, Cursor, CursorKind, ParseOptions, Type, TypeKind};
use tracing::debug;

use crate::location::{resolve_cursor, with_translation_unit, LocationTuple};
use crate::type_info::DeducedType;
use crate::vimson::to_vimson;

const AUTO: &str = "auto";

/// Returns true when `auto` occurs in `spelling` as a whole word.
///
/// `const auto &` and `decltype(auto)` contain the placeholder;
/// `autoComplete` and `MyAutoType` do not.
pub fn is_auto_type(spelling: &str) -> bool {
    spelling.match_indices(AUTO).any(|(start, marker)| {
        let before = spelling[..start].chars().next_back();
        let after = spelling[start + marker.len()..].chars().next();
        !before.is_some_and(is_identifier_char) && !after.is_some_and(is_identifier_char)
    })
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn is_placeholder(ty: &Type<'_>) -> bool {
    ty.kind() == TypeKind::Auto || is_auto_type(ty.spelling())
}

fn is_unresolved(ty: &Type<'_>) -> bool {
    !ty.is_valid() || is_placeholder(ty)
}

/// Depth-first pre-order search below `cursor` for the first descendant
/// `select` accepts.
pub fn find_descendant<'tu, T>(
    cursor: Cursor<'tu>,
    mut select: impl FnMut(Cursor<'tu>) -> Option<T>,
) -> Option<T> {
    let mut found = None;
    cursor.visit_children(|child, _| match select(child) {
        Some(value) => {
            found = Some(value);
            ChildVisit::Break
        }
        None => ChildVisit::Recurse,
    });
    found
}

/// `cursor` itself or its first descendant whose kind matches.
pub fn search_kind<'tu>(
    cursor: Cursor<'tu>,
    matches: impl Fn(CursorKind) -> bool,
) -> Option<Cursor<'tu>> {
    if matches(cursor.kind()) {
        return Some(cursor);
    }
    find_descendant(cursor, |child| matches(child.kind()).then_some(child))
}

fn first_resolved_type(cursor: Cursor<'_>) -> Option<Type<'_>> {
    find_descendant(cursor, |child| {
        let ty = child.ty();
        (!is_unresolved(&ty)).then_some(ty)
    })
}

/// Effective type of a variable or expression.
///
/// A resolved declared type is returned as is. Otherwise the type of the
/// first descendant with a resolved type, usually the initializer, is used.
pub fn deduce_type_at_cursor(cursor: Cursor<'_>) -> Option<Type<'_>> {
    let ty = cursor.ty();
    if is_unresolved(&ty) {
        first_resolved_type(cursor)
    } else {
        Some(ty)
    }
}

/// Effective result type of a function.
///
/// Explicit result types are returned without looking at the body. A
/// placeholder result is deduced from the first `return` statement in
/// depth-first order; functions without one (including bodiless
/// declarations) have no deducible type.
pub fn deduce_func_decl_type_at_cursor(cursor: Cursor<'_>) -> Option<Type<'_>> {
    let result = cursor.ty().result_type();
    if result.is_valid() && !is_placeholder(&result) {
        return Some(result);
    }
    let return_stmt = search_kind(cursor, |kind| kind == CursorKind::ReturnStmt)?;
    first_resolved_type(return_stmt)
}

fn deduce_at(
    location: &LocationTuple,
    deduce: impl for<'tu> FnOnce(Cursor<'tu>) -> Option<Type<'tu>>,
) -> String {
    with_translation_unit(location, ParseOptions::incomplete(), |unit| {
        let cursor = resolve_cursor(unit, location)?;
        deduce(cursor).map(|ty| to_vimson(&DeducedType::new(&ty)))
    })
    .unwrap_or_else(|| String::from("{}"))
}

/// Deduced type of the variable declared at the location.
pub fn deduce_var_decl_type(location: &LocationTuple) -> String {
    debug!(
        file = %location.file.display(),
        line = location.line,
        col = location.col,
        "deduce variable type"
    );
    deduce_at(location, |cursor| {
        let var = search_kind(cursor, |kind| kind == CursorKind::VarDecl)?;
        deduce_type_at_cursor(var)
    })
}

/// Deduced type of the variable, or result type of the function, declared
/// at the location.
pub fn deduce_func_or_var_decl(location: &LocationTuple) -> String {
    debug!(
        file = %location.file.display(),
        line = location.line,
        col = location.col,
        "deduce declaration type"
    );
    deduce_at(location, |cursor| {
        let decl = search_kind(cursor, |kind| {
            kind == CursorKind::VarDecl || kind.is_function_like()
        })?;
        if decl.kind() == CursorKind::VarDecl {
            deduce_type_at_cursor(decl)
        } else {
            deduce_func_decl_type_at_cursor(decl)
        }
    })
}

/// Deduced result type of the function declared at the location.
pub fn deduce_func_return_type(location: &LocationTuple) -> String {
    debug!(
        file = %location.file.display(),
        line = location.line,
        col = location.col,
        "deduce return type"
    );
    deduce_at(location, |cursor| {
        let function = search_kind(cursor, CursorKind::is_function_like)?;
        deduce_func_decl_type_at_cursor(function)
    })
}

/// Deduced type of whatever is at the location.
///
/// Cursors without a type (statements, namespaces) defer to their first
/// typed descendant.
pub fn deduce_type_at(location: &LocationTuple) -> String {
    debug!(
        file = %location.file.display(),
        line = location.line,
        col = location.col,
        "deduce type"
    );
    deduce_at(location, |cursor| {
        let typed = if cursor.ty().is_valid() {
            cursor
        } else {
            find_descendant(cursor, |child| child.ty().is_valid().then_some(child))?
        };
        let kind = typed.kind();
        if kind == CursorKind::VarDecl {
            deduce_type_at_cursor(typed)
        } else if kind.is_function_like() {
            deduce_func_decl_type_at_cursor(typed)
        } else {
            Some(typed.ty())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_is_detected_as_a_whole_word() {
        assert!(is_auto_type("auto"));
        assert!(is_auto_type("const auto&"));
        assert!(is_auto_type("const auto &"));
        assert!(is_auto_type("auto *"));
        assert!(is_auto_type("decltype(auto)"));
        assert!(is_auto_type("std::vector<auto>"));
    }

    #[test]
    fn auto_inside_identifiers_is_not_a_placeholder() {
        assert!(!is_auto_type("autoComplete"));
        assert!(!is_auto_type("MyAutoType"));
        assert!(!is_auto_type("auto_ptr<int>"));
        assert!(!is_auto_type("my_auto"));
        assert!(!is_auto_type("automatic"));
        assert!(!is_auto_type("int"));
        assert!(!is_auto_type(""));
    }

    #[test]
    fn a_later_whole_word_still_counts() {
        assert!(is_auto_type("autoX<auto>"));
    }
}
