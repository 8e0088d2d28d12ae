use std::collections::HashSet;
use std::fs;
use std::path::Path;
use log::{info, warn};
use tempfile::NamedTempFile;

use crate::error::ScrapeError;
use crate::record::{CharacteristicRecord, RecordSet, URL_COLUMN};

pub const DELIMITER: u8 = b';';

/// What a previous run left behind in the checkpoint file.
#[derive(Debug, Default)]
pub struct ResumeState {
    pub first_run: bool,
    /// URLs whose rows are already in `records`; used only to skip work.
    pub exists_urls: HashSet<String>,
    pub records: RecordSet,
}

impl ResumeState {
    pub fn load(path: &Path) -> Result<Self, ScrapeError> {
        if !path.exists() {
            info!("No checkpoint found at {:?}. Starting fresh.", path);
            return Ok(ResumeState {
                first_run: true,
                ..Default::default()
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut rows = reader.records();
        let header = match rows.next() {
            Some(row) => row?,
            None => {
                warn!("Checkpoint {:?} is empty, nothing to restore.", path);
                return Ok(ResumeState::default());
            }
        };

        let url_index = match header.iter().position(|h| h == URL_COLUMN) {
            Some(i) => i,
            None => {
                warn!("Checkpoint {:?} has no `{}` column, nothing to restore.", path, URL_COLUMN);
                return Ok(ResumeState::default());
            }
        };

        let mut state = ResumeState::default();
        for row in rows {
            let row = row?;
            if let Some(url) = row.get(url_index).filter(|u| !u.is_empty()) {
                state.exists_urls.insert(url.to_string());
            }
            let record: CharacteristicRecord = header.iter().zip(row.iter()).collect();
            state.records.push(record);
        }

        info!(
            "Resumed previous session: {} rows from {} pages.",
            state.records.len(),
            state.exists_urls.len()
        );
        Ok(state)
    }
}

/// Rewrites the whole checkpoint from `records`. The new snapshot goes to a
/// sibling temp file first, so the old file stays intact until the rename.
pub fn write_checkpoint(path: &Path, records: &RecordSet) -> Result<(), ScrapeError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let schema = records.schema();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .terminator(csv::Terminator::CRLF)
        .from_writer(NamedTempFile::new_in(dir)?);

    if !schema.is_empty() {
        writer.write_record(&schema)?;
    }
    for record in records.iter() {
        writer.write_record(schema.iter().map(|column| record.get(column).unwrap_or_default()))?;
    }

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
