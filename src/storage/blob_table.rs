//! SQLite blob table implementation

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use super::schema;
use crate::Result;

/// One raw row of a managed table: identity plus opaque payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRow {
    pub id: i64,
    pub payload: Vec<u8>,
}

/// Handle over one open SQLite database holding managed blob tables.
///
/// Constructed once and passed by reference to every component that needs
/// storage access. Row identities are assigned by SQLite at append time and
/// are never reused or renumbered; logical positions are always recomputed
/// from ascending identity order.
pub struct BlobTable {
    conn: Connection,
}

impl BlobTable {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// True iff a table with the normalized name is currently defined
    pub fn exists(&self, name: &str) -> Result<bool> {
        let name = schema::normalize_name(name)?;
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [&name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// All currently defined managed table names (normalized)
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(names)
    }

    /// Define a new blob table. Returns false if it already exists.
    pub fn create_table(&self, name: &str) -> Result<bool> {
        let name = schema::normalize_name(name)?;
        if self.exists(&name)? {
            tracing::warn!("Table {} already exists", name);
            return Ok(false);
        }

        self.conn.execute(&schema::create_table_sql(&name), [])?;
        Ok(true)
    }

    /// Drop a blob table. Returns false if it does not exist.
    pub fn drop_table(&self, name: &str) -> Result<bool> {
        let name = schema::normalize_name(name)?;
        if !self.exists(&name)? {
            tracing::warn!("Table {} does not exist", name);
            return Ok(false);
        }

        self.conn.execute(&schema::drop_table_sql(&name), [])?;
        Ok(true)
    }

    /// Append a payload, assigning the next row identity.
    /// Returns false if the table does not exist.
    pub fn append(&self, name: &str, payload: &[u8]) -> Result<bool> {
        let name = schema::normalize_name(name)?;
        if !self.exists(&name)? {
            tracing::warn!("Table {} does not exist", name);
            return Ok(false);
        }

        self.conn.execute(
            &format!("INSERT INTO \"{}\" (payload) VALUES (?1)", name),
            params![payload],
        )?;
        Ok(true)
    }

    /// Read every payload in ascending identity order.
    ///
    /// Absence is an error here, not an empty result; callers that want a
    /// benign empty sequence must check `exists` first.
    pub fn read_all(&self, name: &str) -> Result<Vec<Vec<u8>>> {
        let name = schema::normalize_name(name)?;
        if !self.exists(&name)? {
            return Err(crate::Error::TableNotFound(name));
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT payload FROM \"{}\" ORDER BY id", name))?;

        let payloads = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<Vec<u8>>>>()?;

        Ok(payloads)
    }

    /// Read payloads between two 0-based logical positions, both inclusive.
    ///
    /// `end` is clamped to the last row. Returns an empty sequence if the
    /// table is absent, the range is inverted, or `start` is past the end.
    pub fn read_range(&self, name: &str, start: usize, end: usize) -> Result<Vec<Vec<u8>>> {
        let rows = self.scan_range(name, start, end)?;
        Ok(rows.into_iter().map(|row| row.payload).collect())
    }

    /// Range scan that also returns row identities, for raw inspection.
    /// Same position semantics as `read_range`.
    pub fn scan_range(&self, name: &str, start: usize, end: usize) -> Result<Vec<BlobRow>> {
        let name = schema::normalize_name(name)?;
        if !self.exists(&name)? {
            tracing::warn!("Table {} does not exist", name);
            return Ok(Vec::new());
        }

        if end < start {
            tracing::warn!("Invalid position range: start={}, end={}", start, end);
            return Ok(Vec::new());
        }

        let total = match self.count(&name)? {
            Some(n) if n > 0 => n,
            _ => return Ok(Vec::new()),
        };

        if start >= total {
            return Ok(Vec::new());
        }

        let end = end.min(total - 1);
        let limit = end - start + 1;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, payload FROM \"{}\" ORDER BY id LIMIT ?1 OFFSET ?2",
            name
        ))?;

        let rows = stmt
            .query_map(params![limit as i64, start as i64], |row| {
                Ok(BlobRow {
                    id: row.get(0)?,
                    payload: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<BlobRow>>>()?;

        Ok(rows)
    }

    /// Number of rows, or None if the table is absent
    pub fn count(&self, name: &str) -> Result<Option<usize>> {
        let name = schema::normalize_name(name)?;
        if !self.exists(&name)? {
            return Ok(None);
        }

        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", name), [], |row| {
                    row.get(0)
                })?;
        Ok(Some(count as usize))
    }

    /// Resolve a 0-based logical position to its row identity.
    ///
    /// This is the single translation point between logical index and
    /// physical identity: rows are numbered in ascending identity order and
    /// the identity of the row ranked `pos` is returned, or None when `pos`
    /// is past the end or the table is absent.
    pub fn identity_at_position(&self, name: &str, pos: usize) -> Result<Option<i64>> {
        let name = schema::normalize_name(name)?;
        if !self.exists(&name)? {
            return Ok(None);
        }

        let id: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT id FROM \"{}\" ORDER BY id LIMIT 1 OFFSET ?1", name),
                params![pos as i64],
                |row| row.get(0),
            )
            .optional()?;

        Ok(id)
    }

    /// Delete the row with the given identity. True iff exactly one row matched.
    pub fn delete_by_identity(&self, name: &str, id: i64) -> Result<bool> {
        let name = schema::normalize_name(name)?;
        if !self.exists(&name)? {
            tracing::warn!("Table {} does not exist", name);
            return Ok(false);
        }

        let affected = self.conn.execute(
            &format!("DELETE FROM \"{}\" WHERE id = ?1", name),
            params![id],
        )?;
        Ok(affected == 1)
    }

    /// Overwrite the payload of the row with the given identity, leaving its
    /// identity and logical position untouched. True iff exactly one row matched.
    pub fn update_by_identity(&self, name: &str, id: i64, payload: &[u8]) -> Result<bool> {
        let name = schema::normalize_name(name)?;
        if !self.exists(&name)? {
            tracing::warn!("Table {} does not exist", name);
            return Ok(false);
        }

        let affected = self.conn.execute(
            &format!("UPDATE \"{}\" SET payload = ?1 WHERE id = ?2", name),
            params![payload, id],
        )?;
        Ok(affected == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(n: u8) -> Vec<u8> {
        vec![n; 4]
    }

    #[test]
    fn test_create_exists_drop() {
        let db = BlobTable::open_in_memory().unwrap();

        assert!(!db.exists("items").unwrap());
        assert!(db.create_table("items").unwrap());
        assert!(db.exists("items").unwrap());

        // second create of the same table is refused
        assert!(!db.create_table("ITEMS").unwrap());

        assert!(db.drop_table("items").unwrap());
        assert!(!db.exists("items").unwrap());
        assert!(!db.drop_table("items").unwrap());
    }

    #[test]
    fn test_existence_is_case_insensitive() {
        let db = BlobTable::open_in_memory().unwrap();

        db.create_table("products").unwrap();
        assert!(db.exists("Products").unwrap());
        assert!(db.exists("PRODUCTS").unwrap());
        assert_eq!(db.list_tables().unwrap(), vec!["PRODUCTS".to_string()]);
    }

    #[test]
    fn test_invalid_name_rejected() {
        let db = BlobTable::open_in_memory().unwrap();
        assert!(db.create_table("bad name; DROP TABLE x").is_err());
        assert!(db.exists("\"quoted\"").is_err());
    }

    #[test]
    fn test_append_and_count() {
        let db = BlobTable::open_in_memory().unwrap();

        assert_eq!(db.count("items").unwrap(), None);
        assert!(!db.append("items", &payload(1)).unwrap());

        db.create_table("items").unwrap();
        assert_eq!(db.count("items").unwrap(), Some(0));

        assert!(db.append("items", &payload(1)).unwrap());
        assert!(db.append("items", &payload(2)).unwrap());
        assert_eq!(db.count("items").unwrap(), Some(2));
    }

    #[test]
    fn test_read_all_ordered() {
        let db = BlobTable::open_in_memory().unwrap();
        db.create_table("items").unwrap();

        for n in 1..=3 {
            db.append("items", &payload(n)).unwrap();
        }

        let all = db.read_all("items").unwrap();
        assert_eq!(all, vec![payload(1), payload(2), payload(3)]);
    }

    #[test]
    fn test_read_all_absent_is_an_error() {
        let db = BlobTable::open_in_memory().unwrap();
        assert!(matches!(
            db.read_all("missing"),
            Err(crate::Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_read_range_clamps_end() {
        let db = BlobTable::open_in_memory().unwrap();
        db.create_table("items").unwrap();
        for n in 1..=3 {
            db.append("items", &payload(n)).unwrap();
        }

        // end far past the last row is clamped, not rejected
        let rows = db.read_range("items", 0, 100).unwrap();
        assert_eq!(rows.len(), 3);

        let rows = db.read_range("items", 1, 1).unwrap();
        assert_eq!(rows, vec![payload(2)]);
    }

    #[test]
    fn test_read_range_empty_cases() {
        let db = BlobTable::open_in_memory().unwrap();

        // absent table
        assert!(db.read_range("items", 0, 2).unwrap().is_empty());

        db.create_table("items").unwrap();
        // empty table
        assert!(db.read_range("items", 0, 2).unwrap().is_empty());

        db.append("items", &payload(1)).unwrap();
        // inverted range
        assert!(db.read_range("items", 2, 1).unwrap().is_empty());
        // start past the end
        assert!(db.read_range("items", 1, 5).unwrap().is_empty());
    }

    #[test]
    fn test_identity_at_position() {
        let db = BlobTable::open_in_memory().unwrap();
        db.create_table("items").unwrap();
        for n in 1..=3 {
            db.append("items", &payload(n)).unwrap();
        }

        let first = db.identity_at_position("items", 0).unwrap().unwrap();
        let second = db.identity_at_position("items", 1).unwrap().unwrap();
        assert!(second > first);

        assert_eq!(db.identity_at_position("items", 3).unwrap(), None);
        assert_eq!(db.identity_at_position("missing", 0).unwrap(), None);
    }

    #[test]
    fn test_positions_shift_after_delete() {
        let db = BlobTable::open_in_memory().unwrap();
        db.create_table("items").unwrap();
        for n in 1..=4 {
            db.append("items", &payload(n)).unwrap();
        }

        let second = db.identity_at_position("items", 1).unwrap().unwrap();
        assert!(db.delete_by_identity("items", second).unwrap());

        // the old position 2 row is now ranked 1
        let shifted = db.read_range("items", 1, 1).unwrap();
        assert_eq!(shifted, vec![payload(3)]);
        assert_eq!(db.count("items").unwrap(), Some(3));
    }

    #[test]
    fn test_delete_and_update_by_identity() {
        let db = BlobTable::open_in_memory().unwrap();
        db.create_table("items").unwrap();
        db.append("items", &payload(1)).unwrap();

        let id = db.identity_at_position("items", 0).unwrap().unwrap();

        assert!(db.update_by_identity("items", id, &payload(9)).unwrap());
        assert_eq!(db.read_all("items").unwrap(), vec![payload(9)]);
        // update does not change identity or position
        assert_eq!(db.identity_at_position("items", 0).unwrap(), Some(id));

        assert!(db.delete_by_identity("items", id).unwrap());
        // the row is gone, a second delete matches nothing
        assert!(!db.delete_by_identity("items", id).unwrap());
        assert!(!db.update_by_identity("items", id, &payload(1)).unwrap());
    }

    #[test]
    fn test_identities_never_reused() {
        let db = BlobTable::open_in_memory().unwrap();
        db.create_table("items").unwrap();

        db.append("items", &payload(1)).unwrap();
        db.append("items", &payload(2)).unwrap();
        let last = db.identity_at_position("items", 1).unwrap().unwrap();

        db.delete_by_identity("items", last).unwrap();
        db.append("items", &payload(3)).unwrap();

        let replacement = db.identity_at_position("items", 1).unwrap().unwrap();
        assert!(replacement > last);
    }

    #[test]
    fn test_scan_range_exposes_identities() {
        let db = BlobTable::open_in_memory().unwrap();
        db.create_table("items").unwrap();
        for n in 1..=3 {
            db.append("items", &payload(n)).unwrap();
        }

        let rows = db.scan_range("items", 0, 100).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(rows[2].payload, payload(3));
    }

    #[test]
    fn test_interrupted_clear_leaves_table_absent() {
        let db = BlobTable::open_in_memory().unwrap();
        db.create_table("items").unwrap();
        db.append("items", &payload(1)).unwrap();

        // first half of a drop-then-recreate clear completes, then the
        // process dies before the recreate step
        assert!(db.drop_table("items").unwrap());

        assert!(!db.exists("items").unwrap());
        assert_eq!(db.count("items").unwrap(), None);
        assert!(db.read_range("items", 0, 10).unwrap().is_empty());
    }

    #[test]
    fn test_identity_counter_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let last = {
            let db = BlobTable::open(&path).unwrap();
            db.create_table("items").unwrap();
            db.append("items", &payload(1)).unwrap();
            db.append("items", &payload(2)).unwrap();
            db.identity_at_position("items", 1).unwrap().unwrap()
        };

        let db = BlobTable::open(&path).unwrap();
        assert_eq!(db.count("items").unwrap(), Some(2));

        db.append("items", &payload(3)).unwrap();
        let next = db.identity_at_position("items", 2).unwrap().unwrap();
        assert!(next > last);
    }
}
