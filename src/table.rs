//! Index-addressed CRUD over one named blob table
//!
//! Every operation addresses rows by logical index (0-based rank in
//! ascending identity order) and delegates to the blob table after the
//! index is resolved to a row identity. Index resolution is a scan, so
//! index-addressed mutations cost O(table size); in exchange, deleting a
//! row shifts every later index with no renumbering bookkeeping.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::storage::{BlobTable, schema};
use crate::{Error, Result, codec};

/// What a bulk scan does with a row whose payload fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPolicy {
    /// Log a warning and leave the row out of the result (default)
    #[default]
    SkipCorrupt,
    /// Propagate the decode error and abort the scan
    Strict,
}

/// Index-addressed view of one named table, generic over the stored value.
///
/// The underlying table is created at construction if absent. Out-of-range
/// indices are reported as benign `None`/empty results at this layer; the
/// list facade above turns them into hard errors.
pub struct IndexedObjectTable<'a, T> {
    db: &'a BlobTable,
    name: String,
    scan_policy: ScanPolicy,
    _marker: PhantomData<T>,
}

impl<'a, T> IndexedObjectTable<'a, T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open the named table, creating it if it does not exist yet
    pub fn open(db: &'a BlobTable, name: &str) -> Result<Self> {
        let name = schema::normalize_name(name)?;
        if !db.exists(&name)? {
            db.create_table(&name)?;
        }

        Ok(Self {
            db,
            name,
            scan_policy: ScanPolicy::default(),
            _marker: PhantomData,
        })
    }

    /// Replace the bulk-scan decode policy
    pub fn with_scan_policy(mut self, policy: ScanPolicy) -> Self {
        self.scan_policy = policy;
        self
    }

    /// Normalized name of the underlying table
    pub fn table_name(&self) -> &str {
        &self.name
    }

    /// Number of stored rows. A missing table counts as empty.
    pub fn size(&self) -> Result<usize> {
        Ok(self.db.count(&self.name)?.unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }

    /// Value at a logical index, or None when the index is out of range or
    /// the row holds the absent payload
    pub fn get(&self, index: usize) -> Result<Option<T>> {
        if index >= self.size()? {
            return Ok(None);
        }

        let payloads = self.db.read_range(&self.name, index, index)?;
        match payloads.first() {
            Some(payload) => codec::decode(payload),
            None => Ok(None),
        }
    }

    /// Encode and append a value at the end
    pub fn add(&self, value: &T) -> Result<bool> {
        let payload = codec::encode(Some(value))?;
        self.db.append(&self.name, &payload)
    }

    /// Remove the row at a logical index and return its value.
    ///
    /// The value is read before the delete but only returned on a confirmed
    /// deletion; None means the index was out of range or the store reported
    /// no row deleted.
    pub fn remove(&self, index: usize) -> Result<Option<T>> {
        if index >= self.size()? {
            return Ok(None);
        }

        let old = self.get(index)?;
        let Some(id) = self.resolve_identity(index)? else {
            return Ok(None);
        };

        if self.db.delete_by_identity(&self.name, id)? {
            Ok(old)
        } else {
            Ok(None)
        }
    }

    /// Overwrite the row at a logical index and return its previous value.
    /// Identity and logical position are unchanged by the overwrite.
    pub fn set(&self, index: usize, value: &T) -> Result<Option<T>> {
        if index >= self.size()? {
            return Ok(None);
        }

        let old = self.get(index)?;
        let Some(id) = self.resolve_identity(index)? else {
            return Ok(None);
        };

        let payload = codec::encode(Some(value))?;
        if self.db.update_by_identity(&self.name, id, &payload)? {
            Ok(old)
        } else {
            Ok(None)
        }
    }

    /// Resolve a logical index to the identity of the row it ranks.
    ///
    /// Every index-addressed mutation goes through this single resolution
    /// step followed by an identity-addressed store call.
    pub fn resolve_identity(&self, index: usize) -> Result<Option<i64>> {
        self.db.identity_at_position(&self.name, index)
    }

    /// Empty the table by dropping and recreating it.
    ///
    /// Two independent steps with no atomicity: if the recreate fails after
    /// the drop succeeded, the table is left absent and the error is
    /// propagated rather than masked.
    pub fn clear(&self) -> Result<()> {
        self.db.drop_table(&self.name)?;
        self.db
            .create_table(&self.name)
            .map_err(|err| Error::Interrupted {
                op: "clear",
                table: self.name.clone(),
                source: Box::new(err),
            })?;
        Ok(())
    }

    /// Permanently remove the underlying table. Unlike `clear`, nothing is
    /// recreated.
    pub fn drop_table(&self) -> Result<bool> {
        self.db.drop_table(&self.name)
    }

    /// All stored values in ascending identity order, decoded per the scan
    /// policy. Absent-payload rows are left out.
    pub fn get_all(&self) -> Result<Vec<T>> {
        let payloads = self.db.read_all(&self.name)?;
        self.decode_payloads(payloads)
    }

    /// Values between two logical indices, both inclusive.
    ///
    /// Unlike the blob table's clamping range read, an `end` past the last
    /// row rejects the whole range and returns an empty sequence.
    pub fn get_range(&self, start: usize, end: usize) -> Result<Vec<T>> {
        if end < start || end >= self.size()? {
            return Ok(Vec::new());
        }

        let payloads = self.db.read_range(&self.name, start, end)?;
        self.decode_payloads(payloads)
    }

    fn decode_payloads(&self, payloads: Vec<Vec<u8>>) -> Result<Vec<T>> {
        let mut values = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match codec::decode(&payload) {
                Ok(Some(value)) => values.push(value),
                Ok(None) => {}
                Err(err @ Error::Decode(_)) => match self.scan_policy {
                    ScanPolicy::SkipCorrupt => {
                        tracing::warn!("Skipping undecodable row in {}: {}", self.name, err);
                    }
                    ScanPolicy::Strict => return Err(err),
                },
                Err(err) => return Err(err),
            }
        }
        Ok(values)
    }
}
