//! Append-only JSONL sink and its reader.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use jungai_core::brands::slugify;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::report::Report;
use crate::ReportError;

/// Appends reports to one JSONL file.
///
/// Appends are serialized through an internal lock so concurrent brand runs
/// never interleave lines.
#[derive(Debug)]
pub struct ReportWriter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `report` as one line.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::WriteFailed`] if the report cannot be
    /// serialized, the parent directory cannot be created, or the append
    /// fails.
    pub async fn emit(&self, report: &Report) -> Result<(), ReportError> {
        let mut line = serde_json::to_string(report).map_err(|e| self.write_failed(&e))?;
        line.push('\n');

        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_failed(&e))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.write_failed(&e))?;

        let start = file
            .metadata()
            .await
            .map_err(|e| self.write_failed(&e))?
            .len();
        if start > 0 {
            let terminated = ends_with_newline(&mut file, start)
                .await
                .map_err(|e| self.write_failed(&e))?;
            if !terminated {
                line.insert(0, '\n');
            }
        }

        if let Err(e) = write_line(&mut file, &line).await {
            // Cut a partial line so the next append starts clean.
            if let Err(rollback) = file.set_len(start).await {
                tracing::error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "failed to roll back partial report line"
                );
            }
            return Err(self.write_failed(&e));
        }

        tracing::info!(
            brand = %report.brand,
            archetype = %report.archetype,
            run_id = %report.run_id,
            path = %self.path.display(),
            "report emitted"
        );
        Ok(())
    }

    fn write_failed(&self, err: &dyn std::fmt::Display) -> ReportError {
        ReportError::WriteFailed {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

async fn ends_with_newline(file: &mut File, len: u64) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1)).await?;
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

async fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

/// Read back stored reports, newest first.
///
/// `brand` filters by slug, so "Acme Corp" matches "acme-corp". A missing
/// file yields no reports. Malformed lines are skipped with a warning.
///
/// # Errors
///
/// Returns [`ReportError::ReadFailed`] if the file exists but cannot be read.
pub async fn read_reports(
    path: &Path,
    brand: Option<&str>,
    limit: usize,
) -> Result<Vec<Report>, ReportError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ReportError::ReadFailed {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let wanted = brand.map(slugify);
    let mut reports = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Report>(line) {
            Ok(report) => {
                if wanted.as_deref().is_none_or(|slug| slugify(&report.brand) == slug) {
                    reports.push(report);
                }
            }
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "skipping malformed report line");
            }
        }
    }

    reports.reverse();
    reports.truncate(limit);
    Ok(reports)
}
