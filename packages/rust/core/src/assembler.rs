//! Manifest assembler.
//!
//! Owns the ordered record list for a run and writes it out as one compact
//! JSON array.

use std::path::Path;

use tracing::{debug, info, instrument};

use mdpack_shared::{FileRecord, MdpackError, Result};

/// Accumulates records in insertion order and persists them.
#[derive(Debug, Default)]
pub struct ManifestAssembler {
    records: Vec<FileRecord>,
}

impl ManifestAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fully produced record.
    pub fn push(&mut self, record: FileRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Serialize as a compact JSON array, non-ASCII left verbatim.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.records).map_err(|e| {
            MdpackError::Serialization(format!("manifest serialization failed: {e}"))
        })
    }

    /// Write the manifest to `path`, creating parent directories as needed.
    #[instrument(skip_all, fields(path = %path.display(), records = self.records.len()))]
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        write_atomic(path, json.as_bytes())?;
        info!(bytes = json.len(), "manifest written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write `data` to `path` via a sibling temp file and a rename, so an
/// interrupted run never leaves a truncated file behind.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let file_name = path.file_name().ok_or_else(|| {
        MdpackError::output(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent).map_err(|e| MdpackError::output(parent, e))?;
    }

    let temp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    let written = std::fs::write(&temp, data)
        .map_err(|e| MdpackError::output(&temp, e))
        .and_then(|()| std::fs::rename(&temp, path).map_err(|e| MdpackError::output(path, e)));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp);
        return Err(e);
    }

    debug!(path = %path.display(), "wrote file");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
