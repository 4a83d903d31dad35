use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },
    #[error("cannot use target directory {}: {source}", path.display())]
    TargetDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Creates `dir` (and parents) when missing and checks that files can be
/// created in it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let dir_error = |source: io::Error| PersistError::TargetDir {
        path: dir.to_path_buf(),
        source,
    };
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => {
            return Err(PersistError::NotADirectory {
                path: dir.to_path_buf(),
            })
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(dir_error)?
        }
        Err(err) => return Err(dir_error(err)),
    }
    // removed again on drop
    NamedTempFile::new_in(dir).map_err(dir_error)?;
    Ok(())
}

/// Writes media files into one target directory. Each file lands via a
/// synced temp file and a rename, so a crash never leaves a half-written
/// image under its final name. An existing file of the same name is replaced.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write_bytes(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        let write_error = |source: io::Error| PersistError::Write {
            path: target.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_error)?;
        tmp.write_all(content).map_err(write_error)?;
        tmp.as_file_mut().sync_all().map_err(write_error)?;
        tmp.persist(&target).map_err(|e| write_error(e.error))?;
        Ok(target)
    }
}
