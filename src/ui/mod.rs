pub mod table;
pub mod theme;

pub use table::{BlobRowDisplay, TableListRow, hex_preview, rows_table, tables_overview};
pub use theme::{Theme, theme};
