use std::path::{Path, PathBuf};

use crate::client::{Backend, ClientError};

pub const EXPORT_FILE_NAME: &str = "transactions.csv";
const PARTIAL_FILE_NAME: &str = ".transactions.csv.part";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("cannot write export: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub bytes: usize,
    /// Data records in the payload, `None` when it is not valid CSV.
    pub records: Option<usize>,
}

impl ExportReport {
    pub fn summary(&self) -> String {
        match self.records {
            Some(records) => format!(
                "Exported {records} {} to {}",
                if records == 1 { "row" } else { "rows" },
                self.path.display()
            ),
            None => format!("Exported {} bytes to {}", self.bytes, self.path.display()),
        }
    }
}

/// Downloads the backend CSV export and saves it under `dir`.
pub async fn export_csv<B: Backend>(backend: &B, dir: &Path) -> Result<ExportReport, ExportError> {
    let payload = backend.export_transactions().await?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(EXPORT_FILE_NAME);
    let partial = dir.join(PARTIAL_FILE_NAME);
    // Renamed into place only once fully written.
    if let Err(err) = write_then_rename(&partial, &path, &payload).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(err.into());
    }

    let records = count_records(&payload);
    tracing::info!(path = %path.display(), bytes = payload.len(), ?records, "csv export saved");
    Ok(ExportReport {
        path,
        bytes: payload.len(),
        records,
    })
}

async fn write_then_rename(partial: &Path, path: &Path, payload: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(partial, payload).await?;
    tokio::fs::rename(partial, path).await
}

fn count_records(payload: &[u8]) -> Option<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(payload);
    let mut count = 0;
    for record in reader.records() {
        record.ok()?;
        count += 1;
    }
    Some(count)
}
