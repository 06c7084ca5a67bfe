//! Flat relation stores: JSON file on disk and in-memory.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument};

use crate::application::wire::HierarchyPayload;
use crate::domain::FlatRow;
use crate::infrastructure::traits::{FileSystem, FlatStore};

/// The fetch payload kept in a JSON file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never sees a half-written relation. The payload shape (array or
/// division object) is preserved across writes.
pub struct JsonFileStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_payload(&self) -> io::Result<HierarchyPayload> {
        let content = self.fs.read_to_string(&self.path)?;
        HierarchyPayload::from_json(&content).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}: {}", self.path.display(), e),
            )
        })
    }

    /// Replace the whole relation, keeping the on-disk payload shape.
    pub fn save_all(&self, rows: Vec<FlatRow>) -> io::Result<()> {
        let divided = self.fs.exists(&self.path) && self.read_payload()?.is_divided();
        self.write_atomic(&shaped(rows, divided)?)
    }

    fn write_atomic(&self, payload: &HierarchyPayload) -> io::Result<()> {
        let body = serde_json::to_string_pretty(payload)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let tmp = self.temp_path();
        self.fs.ensure_parent(&self.path)?;
        self.fs.write(&tmp, &body)?;
        self.fs.rename(&tmp, &self.path)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl FlatStore for JsonFileStore {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> io::Result<Vec<FlatRow>> {
        let rows = self.read_payload()?.into_rows();
        debug!("load: {} rows", rows.len());
        Ok(rows)
    }

    #[instrument(level = "debug", skip(self, row), fields(id = %row.id))]
    fn update_row(&self, row: &FlatRow) -> io::Result<()> {
        let payload = self.read_payload()?;
        let divided = payload.is_divided();
        let mut rows = payload.into_rows();

        let slot = rows
            .iter_mut()
            .find(|r| r.id == row.id)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no row {}", row.id)))?;
        *slot = row.clone();

        self.write_atomic(&shaped(rows, divided)?)
    }
}

fn shaped(rows: Vec<FlatRow>, divided: bool) -> io::Result<HierarchyPayload> {
    if divided {
        HierarchyPayload::divided(rows)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    } else {
        Ok(HierarchyPayload::Rows(rows))
    }
}

/// Rows held in memory, for tests and scripted use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<FlatRow>>,
}

impl MemoryStore {
    pub fn new(rows: Vec<FlatRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    /// Copy of the current rows.
    pub fn snapshot(&self) -> Vec<FlatRow> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }
}

impl FlatStore for MemoryStore {
    fn load(&self) -> io::Result<Vec<FlatRow>> {
        self.rows
            .lock()
            .map(|rows| rows.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }

    fn update_row(&self, row: &FlatRow) -> io::Result<()> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        let slot = rows
            .iter_mut()
            .find(|r| r.id == row.id)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no row {}", row.id)))?;
        *slot = row.clone();
        Ok(())
    }
}
