use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::commands::WatchlistReport;
use crate::errors::AppError;
use crate::models::config::ExportFormat;
use crate::models::metrics::{MetricsRow, MetricsTable, METRICS_COLUMNS};

pub const XLSX_SHEET_NAME: &str = "Watchlist";
pub const JSON_FILE_NAME: &str = "watchlist.json";

fn optional_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_record(row: &MetricsRow) -> Vec<String> {
    let mut record = Vec::with_capacity(METRICS_COLUMNS.len());
    record.push(row.ticker.to_string());
    record.push(row.name.clone().unwrap_or_default());
    record.extend(row.numeric_cells().iter().map(|v| optional_cell(*v)));
    record
}

/// Write the metrics table as CSV. Absent values are empty cells.
pub fn write_metrics_csv(table: &MetricsTable, path: &Path) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| AppError::FileWrite(format!("Cannot create CSV: {}", e)))?;

    wtr.write_record(METRICS_COLUMNS)?;
    for row in table.rows() {
        wtr.write_record(csv_record(row))?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the metrics table as a single-sheet workbook with a bold header row.
pub fn write_metrics_xlsx(table: &MetricsTable, path: &Path) -> Result<(), AppError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(XLSX_SHEET_NAME)?;

    for (col, header) in METRICS_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (i, row) in table.rows().iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, row.ticker.as_str())?;
        if let Some(name) = &row.name {
            sheet.write_string(r, 1, name)?;
        }
        for (offset, value) in row.numeric_cells().iter().enumerate() {
            if let Some(v) = value {
                sheet.write_number(r, (offset + 2) as u16, *v)?;
            }
        }
    }

    sheet.autofit();
    workbook.save(path)?;
    Ok(())
}

/// Write the export file for `format` into `dir` and return its path.
pub fn export_metrics(
    table: &MetricsTable,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf, AppError> {
    let path = dir.join(format.file_name());
    match format {
        ExportFormat::Csv => write_metrics_csv(table, &path)?,
        ExportFormat::Xlsx => write_metrics_xlsx(table, &path)?,
    }
    info!(
        "Exported {} rows to {} ({})",
        table.len(),
        path.display(),
        format.mime_type()
    );
    Ok(path)
}

/// Write the display payload as pretty JSON into `dir` and return its path.
pub fn write_report_json(report: &WatchlistReport, dir: &Path) -> Result<PathBuf, AppError> {
    let payload = super::frame::report_payload(report)?;
    let path = dir.join(JSON_FILE_NAME);
    let text = serde_json::to_string_pretty(&payload)?;
    std::fs::write(&path, text)
        .map_err(|e| AppError::FileWrite(format!("Cannot create JSON: {}", e)))?;
    Ok(path)
}
