//! Byte-addressable persistent memory.
//!
//! The lock keeps its settings and card table in a small EEPROM. Writes land
//! in a RAM copy and only reach the medium on [`Eeprom::commit`], the same
//! way the microcontroller's emulated EEPROM behaves.

use crate::error::{StorageError, StorageResult};
use smartlock_core::constants::EEPROM_SIZE;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Value of an erased EEPROM cell.
pub const ERASED_BYTE: u8 = 0xFF;

/// Persistent memory with explicit commit.
pub trait Eeprom: Send + Sync {
    /// Size of the image in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill `buf` from `offset`.
    fn read(&self, offset: usize, buf: &mut [u8]) -> StorageResult<()>;

    /// Overwrite bytes at `offset`. Not durable until [`commit`](Self::commit).
    fn write(&mut self, offset: usize, data: &[u8]) -> StorageResult<()>;

    /// Flush pending writes to the medium.
    fn commit(&mut self) -> StorageResult<()>;
}

fn check_range(offset: usize, len: usize, size: usize) -> StorageResult<std::ops::Range<usize>> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(offset..end),
        _ => Err(StorageError::OutOfBounds { offset, len, size }),
    }
}

/// Volatile image, lost when dropped.
#[derive(Debug, Clone)]
pub struct MemoryEeprom {
    data: Vec<u8>,
    commits: usize,
}

impl MemoryEeprom {
    /// Erased image of the standard size.
    pub fn new() -> Self {
        Self::with_size(EEPROM_SIZE)
    }

    pub fn with_size(size: usize) -> Self {
        Self {
            data: vec![ERASED_BYTE; size],
            commits: 0,
        }
    }

    /// Image preloaded with `data`.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, commits: 0 }
    }

    /// Number of commits so far.
    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Default for MemoryEeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl Eeprom for MemoryEeprom {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> StorageResult<()> {
        let range = check_range(offset, buf.len(), self.data.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> StorageResult<()> {
        let range = check_range(offset, data.len(), self.data.len())?;
        self.data[range].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        self.commits += 1;
        Ok(())
    }
}

/// Image backed by a file.
///
/// A missing file starts erased. Commits write a sibling temp file and
/// rename it over the image, so a crash never leaves a half-written image.
#[derive(Debug)]
pub struct FileEeprom {
    path: PathBuf,
    data: Vec<u8>,
    dirty: bool,
}

impl FileEeprom {
    /// Open the image at `path` with the standard size.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_size(path, EEPROM_SIZE)
    }

    pub fn open_with_size(path: impl AsRef<Path>, size: usize) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read(&path) {
            Ok(mut data) => {
                if data.len() != size {
                    warn!(
                        path = %path.display(),
                        found = data.len(),
                        expected = size,
                        "Memory image has unexpected size"
                    );
                    data.resize(size, ERASED_BYTE);
                }
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No memory image, starting erased");
                vec![ERASED_BYTE; size]
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            data,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are writes not yet committed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
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

impl Eeprom for FileEeprom {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> StorageResult<()> {
        let range = check_range(offset, buf.len(), self.data.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> StorageResult<()> {
        let range = check_range(offset, data.len(), self.data.len())?;
        if self.data[range.clone()] != *data {
            self.data[range].copy_from_slice(data);
            self.dirty = true;
        }
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        if !self.dirty && self.path.exists() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        std::fs::write(&temp, &self.data)?;
        std::fs::rename(&temp, &self.path)?;
        self.dirty = false;

        debug!(path = %self.path.display(), "Memory image committed");
        Ok(())
    }
}
