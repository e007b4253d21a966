//! List facade with an in-memory mirror of one indexed table
//!
//! The cache is loaded once at construction and mutated only through the
//! operations here. Reads come from the cache; every mutation goes to the
//! store first and touches the cache only after the store confirmed it, so
//! a successful mutation can never leave the two diverged.
//!
//! The one sanctioned way around the write path is a `range_mut`/`get_mut`
//! borrow: callers may edit cached values in place, which leaves cache and
//! store diverged until either `save_changes` (cache wins) or `refresh`
//! (store wins) runs. The `dirty` flag tracks that state.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::storage::BlobTable;
use crate::table::IndexedObjectTable;
use crate::{Error, Result};

/// Ordered list of values persisted in one blob table, mirrored in memory.
///
/// Unlike the layers below, out-of-range indices here are hard errors:
/// list semantics promise a value for every index in `[0, len)`.
pub struct CachedObjectList<'a, T> {
    table: IndexedObjectTable<'a, T>,
    cache: Vec<T>,
    dirty: bool,
}

impl<'a, T> CachedObjectList<'a, T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open the named table (creating it if absent) and load the cache
    pub fn open(db: &'a BlobTable, name: &str) -> Result<Self> {
        Self::from_table(IndexedObjectTable::open(db, name)?)
    }

    /// Wrap an already-configured table, loading the cache from it
    pub fn from_table(table: IndexedObjectTable<'a, T>) -> Result<Self> {
        let cache = table.get_all()?;
        Ok(Self {
            table,
            cache,
            dirty: false,
        })
    }

    /// The underlying indexed table
    pub fn table(&self) -> &IndexedObjectTable<'a, T> {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        self.table.table_name()
    }

    /// Number of cached values; no store round trip
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// True while in-place edits have not been reconciled by
    /// `save_changes` or `refresh`
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.cache.iter()
    }

    /// Cached value at an index
    pub fn get(&self, index: usize) -> Result<&T> {
        self.cache.get(index).ok_or(Error::OutOfRange {
            index,
            len: self.cache.len(),
        })
    }

    /// Mutable borrow of a cached value, for in-place edits that bypass the
    /// write path. Marks the list dirty until reconciled.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.cache.len();
        self.dirty = true;
        self.cache
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    /// Append a value: store first, cache only on success
    pub fn add(&mut self, value: T) -> Result<()> {
        self.warn_if_dirty("add");

        if !self.table.add(&value)? {
            return Err(self.diverged("append was rejected by the store"));
        }

        self.cache.push(value);
        Ok(())
    }

    /// Remove the value at an index and return it.
    ///
    /// The returned value is the cached one, not a re-read. A store that
    /// reports no row deleted for an index the cache holds is a divergence
    /// and surfaces as [`Error::Inconsistent`].
    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.cache.len() {
            return Err(Error::OutOfRange {
                index,
                len: self.cache.len(),
            });
        }
        self.warn_if_dirty("remove");

        match self.table.remove(index)? {
            Some(_) => Ok(self.cache.remove(index)),
            None => Err(self.diverged("store deleted no row for a cached index")),
        }
    }

    /// Replace the value at an index and return the previous one
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        if index >= self.cache.len() {
            return Err(Error::OutOfRange {
                index,
                len: self.cache.len(),
            });
        }
        self.warn_if_dirty("set");

        match self.table.set(index, &value)? {
            Some(_) => Ok(std::mem::replace(&mut self.cache[index], value)),
            None => Err(self.diverged("store updated no row for a cached index")),
        }
    }

    /// Empty the store, then the cache
    pub fn clear(&mut self) -> Result<()> {
        self.table.clear()?;
        self.cache.clear();
        self.dirty = false;
        Ok(())
    }

    /// Borrow the cached values in `[start, end)`.
    ///
    /// The slice aliases the cache itself; it never touches the store.
    pub fn range(&self, start: usize, end: usize) -> Result<&[T]> {
        self.check_range(start, end)?;
        Ok(&self.cache[start..end])
    }

    /// Mutable slice over `[start, end)`, the bulk form of the in-place
    /// edit escape hatch. Marks the list dirty until reconciled.
    pub fn range_mut(&mut self, start: usize, end: usize) -> Result<&mut [T]> {
        self.check_range(start, end)?;
        self.dirty = true;
        Ok(&mut self.cache[start..end])
    }

    /// Persist the cache over the store: clear, then re-append everything.
    ///
    /// This is the cache-wins reconciliation for in-place edits. The steps
    /// are independent store calls; a failure mid-append leaves the store
    /// holding a prefix of the cache and surfaces as [`Error::Interrupted`].
    pub fn save_changes(&mut self) -> Result<()> {
        self.table.clear()?;

        for value in &self.cache {
            let appended = self.table.add(value).map_err(|err| Error::Interrupted {
                op: "save_changes",
                table: self.table.table_name().to_string(),
                source: Box::new(err),
            })?;
            if !appended {
                return Err(self.diverged("table vanished mid-save"));
            }
        }

        self.dirty = false;
        Ok(())
    }

    /// Reload the cache from the store, discarding unsaved in-place edits.
    /// This is the store-wins reconciliation.
    pub fn refresh(&mut self) -> Result<()> {
        self.cache = self.table.get_all()?;
        self.dirty = false;
        Ok(())
    }

    /// Drop the underlying table entirely and empty the cache. Unlike
    /// `clear`, no empty table remains.
    pub fn dispose(&mut self) -> Result<bool> {
        if !self.table.drop_table()? {
            return Ok(false);
        }

        self.cache.clear();
        self.dirty = false;
        Ok(true)
    }

    fn check_range(&self, start: usize, end: usize) -> Result<()> {
        let len = self.cache.len();
        if start > end {
            return Err(Error::OutOfRange { index: start, len });
        }
        if end > len {
            return Err(Error::OutOfRange { index: end, len });
        }
        Ok(())
    }

    fn diverged(&self, detail: &str) -> Error {
        Error::Inconsistent {
            table: self.table.table_name().to_string(),
            detail: detail.to_string(),
        }
    }

    fn warn_if_dirty(&self, op: &str) {
        if self.dirty {
            tracing::warn!(
                "{} on {} with unreconciled in-place edits; save_changes or refresh should run first",
                op,
                self.table.table_name()
            );
        }
    }
}

impl<'a, T> std::ops::Index<usize> for CachedObjectList<'a, T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.cache[index]
    }
}
