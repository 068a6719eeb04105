use crate::domain::ports::RecordSheet;
use crate::domain::record::{CheckRecord, CheckStatus, RecordId};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Column names of the record sheet. The id must stay first.
pub const SHEET_HEADER: [&str; 7] = [
    "record_id",
    "recipient",
    "date",
    "amount_primary",
    "amount_secondary",
    "full_name",
    "status",
];

pub const STATUS_COLUMN: &str = "status";

pub fn record_row(record: &CheckRecord, status: CheckStatus) -> Vec<String> {
    let draft = &record.draft;
    vec![
        record.id.to_string(),
        draft.recipient.clone(),
        draft.date.to_string(),
        draft.amount_primary.to_string(),
        draft.amount_secondary.to_string(),
        draft.full_name.clone(),
        status.as_str().to_string(),
    ]
}

/// Position of the status column, located by name in the header row.
pub fn status_column(header: &[String]) -> Option<usize> {
    header
        .iter()
        .position(|name| name.trim().eq_ignore_ascii_case(STATUS_COLUMN))
}

/// Sets the status cell of the first data row whose id column equals `id`.
/// `rows` starts with the header.
pub fn set_status(rows: &mut [Vec<String>], id: RecordId, status: CheckStatus) -> Result<()> {
    let (header, data) = rows
        .split_first_mut()
        .ok_or_else(|| AppError::ExternalStore("Sheet is empty".to_string()))?;
    let column = status_column(header)
        .ok_or_else(|| AppError::ExternalStore("Sheet has no status column".to_string()))?;

    let id_text = id.to_string();
    let row = data
        .iter_mut()
        .find(|row| row.first() == Some(&id_text))
        .ok_or_else(|| AppError::ExternalStore(format!("No row for check {}", id)))?;

    if row.len() <= column {
        row.resize(column + 1, String::new());
    }
    row[column] = status.as_str().to_string();
    Ok(())
}

fn store_error(e: impl std::fmt::Display) -> AppError {
    AppError::ExternalStore(e.to_string())
}

fn encode_rows<I, R>(rows: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row).map_err(store_error)?;
    }
    writer.into_inner().map_err(store_error)
}

fn decode_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes)
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect::<Vec<String>>())
                .map_err(store_error)
        })
        .collect()
}

/// Record-of-truth kept in a CSV file, one row per dispatched check.
///
/// Appends go to the end of the file. Status updates rewrite the file through a
/// temporary sibling. The csv codec only ever sees in-memory buffers; the file
/// itself is touched through `tokio::fs`.
pub struct CsvRecordSheet {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvRecordSheet {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn is_empty(&self) -> Result<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(store_error(e)),
        }
    }
}

#[async_trait]
impl RecordSheet for CsvRecordSheet {
    async fn append_row(&self, record: &CheckRecord, status: CheckStatus) -> Result<()> {
        let _guard = self.lock.lock().await;

        let row = record_row(record, status);
        let bytes = if self.is_empty().await? {
            let header = SHEET_HEADER.map(str::to_string).to_vec();
            encode_rows([header, row])?
        } else {
            encode_rows([row])?
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(store_error)?;
        file.write_all(&bytes).await.map_err(store_error)?;
        file.flush().await.map_err(store_error)
    }

    async fn update_status(&self, id: RecordId, status: CheckStatus) -> Result<()> {
        let _guard = self.lock.lock().await;

        let bytes = tokio::fs::read(&self.path).await.map_err(store_error)?;
        let mut rows = decode_rows(&bytes)?;
        set_status(&mut rows, id, status)?;

        let tmp = self.path.with_extension("csv.tmp");
        tokio::fs::write(&tmp, encode_rows(&rows)?)
            .await
            .map_err(store_error)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(store_error)
    }
}
