use tabled::{Table, Tabled, settings::Style};

use crate::storage::BlobRow;

#[derive(Tabled)]
pub struct TableListRow {
    #[tabled(rename = "Table")]
    pub name: String,
    #[tabled(rename = "Rows")]
    pub rows: String,
}

/// Render the table listing with per-table row counts
pub fn tables_overview(rows: &[TableListRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
pub struct BlobRowDisplay {
    #[tabled(rename = "Position")]
    pub position: usize,
    #[tabled(rename = "Identity")]
    pub id: i64,
    #[tabled(rename = "Bytes")]
    pub bytes: usize,
    #[tabled(rename = "Payload")]
    pub preview: String,
}

/// Render raw rows as position / identity / size / payload preview
pub fn rows_table(start: usize, rows: &[BlobRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let display: Vec<BlobRowDisplay> = rows
        .iter()
        .enumerate()
        .map(|(offset, row)| BlobRowDisplay {
            position: start + offset,
            id: row.id,
            bytes: row.payload.len(),
            preview: hex_preview(&row.payload, 16),
        })
        .collect();

    Table::new(&display).with(Style::rounded()).to_string()
}

/// Hex dump of the first `max` bytes, with an ellipsis when truncated
pub fn hex_preview(bytes: &[u8], max: usize) -> String {
    if bytes.is_empty() {
        return "(empty)".to_string();
    }

    let shown = hex::encode(&bytes[..bytes.len().min(max)]);
    if bytes.len() > max {
        format!("{}…", shown)
    } else {
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_preview_truncates() {
        assert_eq!(hex_preview(&[], 8), "(empty)");
        assert_eq!(hex_preview(&[0xab, 0xcd], 8), "abcd");
        assert_eq!(hex_preview(&[0x11; 10], 4), "11111111…");
    }
}
