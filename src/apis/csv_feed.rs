use serde_json::Value;
use tracing::instrument;

use super::base::get_checked;
use crate::app::ports::HttpClientPort;
use crate::error::Result;
use crate::types::{RawRecordTable, SourceKind};

/// Download a CSV feed and read it into a raw table
#[instrument(skip(http))]
pub async fn fetch_csv(
    http: &dyn HttpClientPort,
    url: &str,
    kind: SourceKind,
) -> Result<RawRecordTable> {
    let resp = get_checked(http, url, kind).await?;
    parse_csv(kind.as_str(), &resp.bytes)
}

/// Read CSV bytes into a raw table; every cell is kept as a string
pub fn parse_csv(source_id: &str, bytes: &[u8]) -> Result<RawRecordTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let columns = reader
        .headers()?
        .iter()
        .map(normalize_header_name)
        .collect();

    let mut table = RawRecordTable::new(source_id, columns);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(|field| Value::String(field.to_string())).collect());
    }
    Ok(table)
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM
    name.trim().trim_start_matches('\u{feff}').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_csv_keeps_columns_and_string_cells() {
        let body = "\u{feff}Date, New infected ,Tests for identification\n2020-03-01,10,100\n2020-03-02, 15 ,120\n";
        let table = parse_csv("national", body.as_bytes()).unwrap();

        assert_eq!(table.columns, vec!["Date", "New infected", "Tests for identification"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 1), &json!("15"));
        assert_eq!(table.source_id, "national");
    }

    #[test]
    fn test_parse_csv_pads_short_rows() {
        let table = parse_csv("severe", b"Date,severe_new\n2020-04-01\n").unwrap();
        assert_eq!(table.cell(0, 1), &Value::Null);
    }

    #[test]
    fn test_header_only_csv_is_empty_table() {
        let table = parse_csv("severe", b"Date,severe_new\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 2);
    }
}
