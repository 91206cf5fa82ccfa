use crate::constants::CSV_FILE_PREFIX;
use crate::error::Result;
use crate::models::TickerMetrics;
use chrono::NaiveDateTime;
use std::io::Write;

/// Write metrics as CSV, one row per ticker.
///
/// The header row is always written, even for an empty batch.
pub fn write_metrics_csv<W: Write>(metrics: &[TickerMetrics], writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(TickerMetrics::CSV_HEADERS)?;
    for row in metrics {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn metrics_to_csv(metrics: &[TickerMetrics]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_metrics_csv(metrics, &mut buffer)?;
    Ok(buffer)
}

/// Attachment name for an export taken at `at`, e.g. `nifty_50_analysis_20240612_153000.csv`
pub fn export_file_name(at: NaiveDateTime) -> String {
    format!("{}{}.csv", CSV_FILE_PREFIX, at.format("%Y%m%d_%H%M%S"))
}
