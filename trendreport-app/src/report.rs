//! Writing the accepted HTML report to disk.
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use trendreport_common::Result;

pub const REPORT_FILE_PREFIX: &str = "weibo-trend-report";

/// Reports are dated by the UTC calendar day, whatever the host time zone.
pub fn report_date(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

/// `weibo-trend-report-<YYYY-MM-DD>.html`
pub fn report_file_name(date: NaiveDate) -> String {
    format!("{REPORT_FILE_PREFIX}-{}.html", date.format("%Y-%m-%d"))
}

/// Write `html` in one operation; an existing report for the same day is replaced.
pub fn write_report(dir: &Path, date: NaiveDate, html: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(date));
    std::fs::write(&path, html)?;
    tracing::info!(path = %path.display(), bytes = html.len(), "report.written");
    Ok(path)
}
