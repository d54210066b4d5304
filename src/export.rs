//! Spreadsheet export and timed autosave.
//!
//! Tables are written as RFC 4180 CSV, the spreadsheet-compatible format
//! every workbook application opens. Autosave snapshots the table on a
//! fixed interval so a crash mid-session loses at most one interval of
//! edits.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::table::ResultsTable;
use crate::utils::filename::sanitize_filename;

/// Write the table to a CSV file, creating parent directories as needed.
pub fn write_csv(path: &Path, table: &ResultsTable) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut out = String::new();
    write_record(&mut out, table.headers().iter().map(String::as_str));
    for row in table.rows() {
        write_record(&mut out, row.iter().map(String::as_str));
    }
    std::fs::write(path, out)
}

fn write_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&escape_field(field));
    }
    out.push_str("\r\n");
}

/// Quote a field per RFC 4180 when it contains a delimiter, quote, or line
/// break.
fn escape_field(field: &str) -> String {
    if field.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Build an export filename from a document basename, an optional page
/// number, and a timestamp: `invoice_p2_20260806_141530.csv`.
pub fn export_filename(basename: &str, page: Option<u32>, now: DateTime<Local>) -> String {
    let mut name = sanitize_filename(basename);
    if let Some(page) = page {
        name.push_str(&format!("_p{}", page));
    }
    format!("{}_{}.csv", name, now.format("%Y%m%d_%H%M%S"))
}

/// Timestamped autosave filename.
pub fn autosave_filename(now: DateTime<Local>) -> String {
    format!("autosave_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Spawn the periodic autosave task. Each tick snapshots the table under
/// the lock and writes outside it; an empty table is skipped. Abort the
/// returned handle to stop autosaving.
pub fn spawn_autosave(
    table: Arc<Mutex<ResultsTable>>,
    dir: PathBuf,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately; skip it
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let snapshot = table.lock().await.clone();
            if snapshot.is_empty() {
                continue;
            }
            let path = dir.join(autosave_filename(Local::now()));
            match write_csv(&path, &snapshot) {
                Ok(()) => tracing::debug!(path = %path.display(), "autosaved table"),
                Err(e) => tracing::warn!(path = %path.display(), %e, "autosave failed"),
            }
        }
    })
}
