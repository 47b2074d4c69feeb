//! Positional placeholder substitution.
//!
//! Raw report queries mark parameters with `#P<n>#` tokens, `n` being the
//! 1-based position in a [`ParameterList`]. Binding replaces every token whose
//! index resolves with the parameter's rendered SQL literal:
//!
//! ```text
//! SELECT * FROM emp WHERE dept = #P1# AND job = #P2#
//!   + [Number(10), Text("IT_PROG")]
//!   = SELECT * FROM emp WHERE dept = 10 AND job = 'IT_PROG'
//! ```
//!
//! Substitution is all-or-nothing: the text is returned untouched unless it
//! contains at least one token and a non-empty parameter list was supplied.
//! Tokens whose index exceeds the list pass through unresolved. Indices are
//! written without leading zeros; `#P01#` and `#P0#` are not tokens.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::model::{render_literal, ParameterList};
use crate::sql::Dialect;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#P([1-9][0-9]*)#").expect("placeholder pattern is valid"));

/// Substitute `#P<n>#` placeholders in `sql` with rendered parameter literals.
///
/// The scan is a single pass over the original text, so a rendered literal
/// that itself contains `#P<j>#` is never substituted again.
pub fn bind<'a>(sql: &'a str, params: &ParameterList, dialect: Dialect) -> Cow<'a, str> {
    if params.is_empty() || !has_placeholders(sql) {
        return Cow::Borrowed(sql);
    }

    let bound = PLACEHOLDER.replace_all(sql, |caps: &Captures<'_>| {
        let resolved = caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|index| params.get(index));

        match resolved {
            Some(value) => render_literal(value, dialect),
            None => caps[0].to_string(),
        }
    });

    debug!(
        placeholders = placeholder_indices(sql).len(),
        parameters = params.len(),
        %dialect,
        "bound query placeholders"
    );

    bound
}

/// Whether `sql` contains at least one placeholder token.
pub fn has_placeholders(sql: &str) -> bool {
    PLACEHOLDER.is_match(sql)
}

/// Placeholder indices in order of appearance (repeats included).
///
/// Indices too large to represent are skipped; they can never resolve.
pub fn placeholder_indices(sql: &str) -> Vec<usize> {
    PLACEHOLDER
        .captures_iter(sql)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}
