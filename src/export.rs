//! CSV export
//!
//! Fixed-column CSV of the current view, UTF-8 with BOM so spreadsheet
//! applications detect the encoding. Content cells are quoted with embedded
//! quotes doubled; the filename carries an ISO-ish timestamp.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::types::error::{Result, SmsError};
use crate::types::Message;

const BOM: &str = "\u{feff}";
const HEADERS: &[&str] = &[
    "Phone",
    "Content",
    "Direction",
    "Time",
    "Read",
    "Status",
];

/// Render messages as CSV text, BOM included
pub fn to_csv(messages: &[Message]) -> String {
    let mut rows = Vec::with_capacity(messages.len() + 1);
    rows.push(HEADERS.join(","));

    for m in messages {
        let row = [
            m.phone.clone(),
            quote(&m.content),
            m.direction.label().to_string(),
            m.timestamp.format("%d/%m/%Y %H:%M").to_string(),
            if m.read { "Read" } else { "Unread" }.to_string(),
            m.status.as_str().to_string(),
        ];
        rows.push(row.join(","));
    }

    format!("{}{}", BOM, rows.join("\n"))
}

/// Filename like `sms-export-2024-06-15T10-00-00.csv`
pub fn export_filename(now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y-%m-%dT%H:%M:%S").to_string().replace(':', "-");
    format!("sms-export-{}.csv", stamp)
}

/// Write the export into `dir`, returning the full path
pub fn write_to_dir(messages: &[Message], dir: &Path) -> Result<PathBuf> {
    let path = dir.join(export_filename(Utc::now()));
    fs::write(&path, to_csv(messages))
        .map_err(|e| SmsError::Io(format!("Failed to write export {:?}: {}", path, e)))?;
    Ok(path)
}

/// Quote a cell, doubling any embedded quote characters
fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeliveryStatus, Direction};
    use chrono::TimeZone;

    fn msg(content: &str) -> Message {
        Message {
            id: "1".to_string(),
            phone: "0901234567".to_string(),
            content: content.to_string(),
            direction: Direction::Received,
            timestamp: Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap(),
            read: false,
            status: DeliveryStatus::Received,
            storage: None,
        }
    }

    #[test]
    fn starts_with_bom_and_header() {
        let csv = to_csv(&[msg("hello")]);
        assert!(csv.starts_with('\u{feff}'));
        assert!(csv.contains("Phone,Content,Direction,Time,Read,Status"));
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let csv = to_csv(&[msg(r#"He said "hi""#)]);
        assert!(csv.contains(r#""He said ""hi""""#));
    }

    #[test]
    fn row_carries_labels_and_formatted_time() {
        let csv = to_csv(&[msg("hello")]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "0901234567,\"hello\",Received,15/06/2024 10:00,Unread,received"
        );
    }

    #[test]
    fn filename_has_no_colons() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 5).unwrap();
        assert_eq!(export_filename(now), "sms-export-2024-06-15T10-30-05.csv");
    }

    #[test]
    fn write_to_dir_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_to_dir(&[msg("hello")], dir.path()).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("hello"));
    }
}
