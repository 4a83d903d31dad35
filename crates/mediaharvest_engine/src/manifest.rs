use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use mediaharvest_core::{ManifestRecord, ResumeLoadError};
use thiserror::Error;

pub const MANIFEST_FILENAME: &str = "data.csv";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Resume(#[from] ResumeLoadError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestMode {
    /// Keep existing rows and add new ones after them.
    Append,
    /// Start an empty manifest, discarding any previous rows.
    Truncate,
}

/// Reads every row of a header-less manifest. A missing file reads as empty.
///
/// Any malformed row fails the whole read: resuming from a partial seed could
/// download items twice.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestRecord>, ManifestError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        let fields: Vec<&str> = row.iter().collect();
        records.push(ManifestRecord::from_fields(i + 1, &fields)?);
    }
    Ok(records)
}

/// Append-only writer for one target's manifest. Every row is flushed as soon
/// as it is written so an interrupted run keeps what it already saved.
pub struct ManifestWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows_written: usize,
}

impl ManifestWriter {
    pub fn open(path: &Path, mode: ManifestMode) -> Result<Self, ManifestError> {
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            ManifestMode::Append => options.append(true),
            ManifestMode::Truncate => options.write(true).truncate(true),
        };
        let file = options.open(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows_written: 0,
        })
    }

    pub fn append(&mut self, record: &ManifestRecord) -> Result<(), ManifestError> {
        self.writer.write_record(record.to_fields())?;
        self.writer.flush().map_err(|source| ManifestError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.rows_written += 1;
        Ok(())
    }

    /// Rows appended through this writer, not counting earlier runs.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}
