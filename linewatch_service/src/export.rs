//! Alert exports: a CSV spreadsheet and a paginated plain-text report.
//!
//! Both writers take the list exactly as the alert view produced it
//! (filtered, sorted) and read severity from each record, so the two files
//! always agree with each other and with the on-screen table.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::alert::view::AlertFilter;
use crate::model::AlertRecord;

/// Alert lines per report page, title and footer not included.
pub const LINES_PER_PAGE: usize = 38;

pub const SPREADSHEET_HEADER: [&str; 5] = ["Torre", "Fecha", "Tipo de Alerta", "Valor", "Severidad"];

#[derive(Debug)]
pub enum ExportError {
    Io(io::Error),
    Csv(csv::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "export I/O error: {}", e),
            ExportError::Csv(e) => write!(f, "spreadsheet write error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<io::Error> for ExportError {
    fn from(e: io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Csv(e)
    }
}

/// `alertas_<filter>.<extension>`
pub fn export_file_name(filter: &AlertFilter, extension: &str) -> String {
    format!("alertas_{}.{}", filter, extension)
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

pub fn write_spreadsheet<W: Write>(writer: W, alerts: &[AlertRecord]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SPREADSHEET_HEADER)?;
    for alert in alerts {
        let date = alert.date.format("%Y-%m-%d").to_string();
        let value = alert.formatted_value();
        let severity = alert.severity().to_string();
        wtr.write_record([
            alert.point_label.as_str(),
            date.as_str(),
            alert.alert_label.as_str(),
            value.as_str(),
            severity.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Text report
// ---------------------------------------------------------------------------

fn report_line(alert: &AlertRecord) -> String {
    format!(
        "{} - {}: {} ({}) - Severidad: {}",
        alert.date.format("%Y-%m-%d"),
        alert.point_label,
        alert.alert_label,
        alert.formatted_value(),
        alert.severity()
    )
}

/// Renders the report as text. Pages are separated by a form feed and each
/// ends with a `Página i de n` footer. An empty list still yields one page.
pub fn render_text_report(alerts: &[AlertRecord], filter: &AlertFilter, lines_per_page: usize) -> String {
    let lines_per_page = lines_per_page.max(1);
    let lines: Vec<String> = alerts.iter().map(report_line).collect();
    let pages: Vec<&[String]> = if lines.is_empty() {
        vec![&lines[..]]
    } else {
        lines.chunks(lines_per_page).collect()
    };
    let total = pages.len();

    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push('\x0c');
        }
        if i == 0 {
            out.push_str(&format!("Reporte de Alertas ({})\n\n", filter));
            if page.is_empty() {
                out.push_str("No se detectaron alertas.\n");
            }
        }
        for line in page.iter() {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&format!("\nPágina {} de {}\n", i + 1, total));
    }
    out
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Paths written by [`export_alerts`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub spreadsheet: PathBuf,
    pub report: PathBuf,
}

/// Writes both exports into `dir`, creating it if needed.
pub fn export_alerts(dir: &Path, alerts: &[AlertRecord], filter: &AlertFilter) -> Result<ExportPaths, ExportError> {
    std::fs::create_dir_all(dir)?;

    let spreadsheet = dir.join(export_file_name(filter, "csv"));
    write_spreadsheet(File::create(&spreadsheet)?, alerts)?;

    let report = dir.join(export_file_name(filter, "txt"));
    std::fs::write(&report, render_text_report(alerts, filter, LINES_PER_PAGE))?;

    Ok(ExportPaths { spreadsheet, report })
}
