//! # Bloblist - List-semantics object persistence over SQLite
//!
//! Bloblist stores arbitrary serializable values as opaque blob rows in
//! SQLite tables and addresses them by insertion-order logical index.
//!
//! Bloblist provides:
//! - A blob table primitive with append, point read/update/delete by row
//!   identity, ordered scans and positional range scans
//! - A bincode-based payload codec
//! - An index-addressed CRUD surface that resolves logical index to row
//!   identity before every mutation
//! - A cached list facade with write-through mutations and explicit bulk
//!   reconciliation in both directions

pub mod codec;
pub mod config;
pub mod demo;
pub mod list;
pub mod storage;
pub mod table;
pub mod ui;

// Re-exports for convenient access
pub use list::CachedObjectList;
pub use storage::BlobTable;
pub use table::{IndexedObjectTable, ScanPolicy};

/// Result type alias for Bloblist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Bloblist operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Index {index} out of bounds for length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("Encode failed: {0}")]
    Encode(#[source] bincode::Error),

    #[error("Decode failed: {0}")]
    Decode(#[source] bincode::Error),

    #[error("Cache and table {table} diverged: {detail}")]
    Inconsistent { table: String, detail: String },

    #[error("{op} interrupted mid-sequence on table {table}: {source}")]
    Interrupted {
        op: &'static str,
        table: String,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
