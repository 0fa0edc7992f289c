use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::info;

use super::{RepositoryError, Store, Tables};

/// Failure while reading or writing a JSON snapshot of the store.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl Store {
    /// Loads a snapshot file; a missing file yields an empty store.
    pub fn load_snapshot(path: &Path) -> Result<Self, SnapshotError> {
        if !path.exists() {
            info!(path = %path.display(), "no snapshot found, starting with an empty store");
            return Ok(Self::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let tables: Tables = serde_json::from_reader(reader)?;
        info!(
            path = %path.display(),
            selections = tables.selections.len(),
            interviews = tables.interviews.len(),
            "store snapshot loaded"
        );
        Ok(Self::from_tables(tables))
    }

    /// Writes the store to `path` through a temporary file and a rename.
    pub fn save_snapshot(&self, path: &Path) -> Result<(), SnapshotError> {
        let tables = self.snapshot()?;
        let staging = path.with_extension("tmp");

        {
            let mut writer = BufWriter::new(File::create(&staging)?);
            serde_json::to_writer(&mut writer, &tables)?;
            writer.flush()?;
        }
        fs::rename(&staging, path)?;

        info!(path = %path.display(), "store snapshot saved");
        Ok(())
    }
}
