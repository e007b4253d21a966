//! Table shape and name normalization
//!
//! Table names are user-supplied, so they are normalized and validated here
//! before being spliced into any DDL/DML statement. SQLite identifiers are
//! case-insensitive; the normalized (uppercased) form is the canonical one
//! used for every existence check.

use crate::{Error, Result};

/// SQL to create a managed blob table, parameterized by table name.
///
/// AUTOINCREMENT keeps row identities monotonically increasing and never
/// reused, with the per-table counter persisted in sqlite_sequence across
/// process restarts.
pub fn create_table_sql(name: &str) -> String {
    format!(
        "CREATE TABLE \"{}\" (id INTEGER PRIMARY KEY AUTOINCREMENT, payload BLOB)",
        name
    )
}

/// SQL to drop a managed blob table
pub fn drop_table_sql(name: &str) -> String {
    format!("DROP TABLE \"{}\"", name)
}

/// Normalize a table name to its canonical uppercase form.
///
/// Rejects anything that is not a plain identifier (leading letter or
/// underscore, then letters/digits/underscores) so a name can never smuggle
/// SQL into a statement.
pub fn normalize_name(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if !valid {
        return Err(Error::InvalidTableName(name.to_string()));
    }

    Ok(name.to_ascii_uppercase())
}
