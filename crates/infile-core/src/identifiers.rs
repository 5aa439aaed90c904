//! MySQL identifier quoting.
//!
//! Bulk-load statements name their table and column list with backtick
//! quoting; these helpers produce and read back that form.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Pattern for a single backtick-quoted identifier, compiled once.
fn quoted_ident() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*`((?:[^`]|``)*)`\s*$").ok())
        .as_ref()
}

/// Quote an identifier using MySQL backtick quoting.
///
/// Embedded backticks are escaped by doubling them.
///
/// ```
/// use infile_core::quote_ident_mysql;
///
/// assert_eq!(quote_ident_mysql("customer"), "`customer`");
/// assert_eq!(quote_ident_mysql("odd`name"), "`odd``name`");
/// ```
#[inline]
pub fn quote_ident_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Read back one identifier, quoted or bare.
///
/// Bare identifiers are returned trimmed; quoted ones have their doubled
/// backticks collapsed.
pub fn unquote_ident_mysql(raw: &str) -> String {
    match quoted_ident().and_then(|re| re.captures(raw)) {
        Some(caps) => caps[1].replace("``", "`"),
        None => raw.trim().to_string(),
    }
}

/// Split a comma-separated column list such as `` `id`, `first_name` ``.
///
/// Commas inside backtick-quoted names do not split.
pub fn split_ident_list(list: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in list.chars() {
        match c {
            '`' => {
                quoted = !quoted;
                current.push(c);
            }
            ',' if !quoted => {
                names.push(unquote_ident_mysql(&current));
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        names.push(unquote_ident_mysql(&current));
    }
    names
}

/// Reject empty column names.
pub fn check_column_name(entity: &'static str, column: &str) -> Result<()> {
    if column.trim().is_empty() {
        return Err(Error::schema(
            crate::error::SchemaErrorKind::EmptyColumn,
            entity,
            "column name is empty",
        ));
    }
    Ok(())
}
