//! Panel export for the downstream model.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::CanonicalPanel;
use crate::error::{PanelError, Result};

const CSV_HEADER: [&str; 5] = ["region", "date", "positive", "total", "deaths"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// `region,date,positive,total,deaths`; deaths left empty when the feed has none
    #[default]
    Csv,
    /// Array of row objects
    Json,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => f.write_str("csv"),
            ExportFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(PanelError::Config(format!("unknown export format '{}'", other))),
        }
    }
}

/// Write the panel rows in `(region, date)` order
pub fn write_panel<W: Write>(
    panel: &CanonicalPanel,
    format: ExportFormat,
    writer: W,
) -> Result<()> {
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
            wtr.write_record(CSV_HEADER)?;
            for row in panel.to_rows() {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        ExportFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, &panel.to_rows())?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

pub fn panel_to_string(panel: &CanonicalPanel, format: ExportFormat) -> Result<String> {
    let mut buf = Vec::new();
    write_panel(panel, format, &mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| PanelError::Config(format!("export produced invalid UTF-8: {}", e)))
}
