//! The write-ahead log
//!
//! Append-only, checksum-chained log over a single backing file, with
//! crash recovery by truncation at open time.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use crate::config::FlushPolicy;
use crate::error::{MeridianError, Result};

use super::flush::{BatchedFlush, FlushStrategy, SyncFlush};
use super::record::{self, checksum, FILE_HEADER_SIZE, OF_PAYLOAD, RECORD_HEADER_SIZE};

/// Append-only durability log
///
/// ## Concurrency Model
///
/// Every public operation locks the whole instance: the read cursor,
/// the append position and the running header checksum are one piece of
/// shared mutable state, so at most one logical operation runs at a
/// time per log file. Lock acquisition is the only suspension point;
/// an operation that has started runs to completion or fails fatally.
///
/// The flush strategy keeps its own handle to the backing file and its
/// own lock, so batched flush scheduling never blocks an append beyond
/// the force call itself.
pub struct Wal {
    path: PathBuf,

    /// File handle, read cursor and running header checksum
    inner: Mutex<WalInner>,

    /// Consulted after every append; owned and shut down by this log
    flush: Box<dyn FlushStrategy>,
}

impl std::fmt::Debug for Wal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wal").field("path", &self.path).finish()
    }
}

struct WalInner {
    file: File,

    /// Read cursor: absolute offset of the next record to consume.
    /// Starts after the file header, advances monotonically, and only
    /// rewinds via an explicit `rewind`.
    position: u64,

    /// Running checksum over the full bytes of every committed record
    file_checksum: u32,
}

impl Wal {
    /// Create a new empty log at `path`
    ///
    /// Writes a zero header checksum and forces it. Fails with
    /// `FileExists` if the path is already occupied and `FileAccess` if
    /// the created file cannot be opened read/write.
    pub fn create(path: impl AsRef<Path>, policy: FlushPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => MeridianError::FileExists { path: path.clone() },
                ErrorKind::PermissionDenied => MeridianError::FileAccess { path: path.clone() },
                _ => MeridianError::Io(e),
            })?;

        file.write_all(&0u32.to_be_bytes())?;
        file.sync_data()?;

        let flush = build_strategy(&file, policy)?;
        Ok(Self {
            path,
            inner: Mutex::new(WalInner {
                file,
                position: FILE_HEADER_SIZE,
                file_checksum: 0,
            }),
            flush,
        })
    }

    /// Open an existing log at `path` and recover it
    ///
    /// Reads the stored header checksum, validates every record against
    /// it, and truncates any partially-written tail before the log
    /// becomes usable. Fails with `FileNotFound` / `FileAccess` on
    /// lifecycle problems and `CorruptLog` when the stored header does
    /// not match a full reconstruction from the valid records.
    pub fn open(path: impl AsRef<Path>, policy: FlushPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => MeridianError::FileNotFound { path: path.clone() },
                ErrorKind::PermissionDenied => MeridianError::FileAccess { path: path.clone() },
                _ => MeridianError::Io(e),
            })?;

        if file.metadata()?.len() < FILE_HEADER_SIZE {
            // not even a header: nothing valid to reconstruct from
            return Err(MeridianError::CorruptLog {
                path,
                stored: 0,
                computed: 0,
            });
        }

        file.seek(SeekFrom::Start(0))?;
        let mut header = [0u8; FILE_HEADER_SIZE as usize];
        file.read_exact(&mut header)?;
        let stored = u32::from_be_bytes(header);

        let flush = build_strategy(&file, policy)?;
        let wal = Self {
            path,
            inner: Mutex::new(WalInner {
                file,
                position: FILE_HEADER_SIZE,
                file_checksum: stored,
            }),
            flush,
        };
        wal.recover()?;
        Ok(wal)
    }

    /// Append a payload as a new record
    ///
    /// Writes the record at end-of-file, folds its full bytes into the
    /// running header checksum, rewrites the header, then hands the
    /// write length to the flush strategy. A failed storage write is
    /// fatal and not retried.
    pub fn append(&self, payload: &[u8]) -> Result<()> {
        let rec = record::wrap(payload);
        let mut inner = self.inner.lock();

        inner.file.seek(SeekFrom::End(0))?;
        inner.file.write_all(&rec)?;

        inner.file_checksum = checksum(inner.file_checksum, &rec);
        let header = inner.file_checksum.to_be_bytes();
        inner.file.seek(SeekFrom::Start(0))?;
        inner.file.write_all(&header)?;

        // record bytes plus the header rewrite
        self.flush.on_write(rec.len() as u64 + FILE_HEADER_SIZE)
    }

    /// Return the next valid payload at the read cursor, or `None`
    ///
    /// `None` means end of valid data: end-of-file, a record whose
    /// declared length runs past end-of-file, or a payload failing its
    /// checksum. The read path does not distinguish corruption from a
    /// clean end; open-time recovery is where strictness lives.
    pub fn next(&self) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock();
        read_next_record(&mut inner).map(|full| full[OF_PAYLOAD..].to_vec())
    }

    /// Reset the read cursor to the first record
    ///
    /// The write position is unaffected.
    pub fn rewind(&self) {
        self.inner.lock().position = FILE_HEADER_SIZE;
    }

    /// Hard-truncate the backing file to `offset` bytes
    ///
    /// Recovery's tool for discarding a partially-written tail.
    pub fn truncate(&self, offset: u64) -> Result<()> {
        let inner = self.inner.lock();
        inner.file.set_len(offset)?;
        Ok(())
    }

    /// Force pending writes, stop flush scheduling and release the file
    ///
    /// No further operations are valid afterward.
    pub fn close(self) -> Result<()> {
        let result = self.flush.flush_now();
        self.flush.shutdown();
        result
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate the whole file against the stored header checksum and
    /// truncate anything past the last valid record
    fn recover(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.position = FILE_HEADER_SIZE;

        let stored = inner.file_checksum;
        let mut computed: u32 = 0;
        let mut valid_end = FILE_HEADER_SIZE;
        let mut records: u64 = 0;

        while let Some(full) = read_next_record(&mut inner) {
            computed = checksum(computed, &full);
            valid_end += full.len() as u64;
            records += 1;
        }

        if computed != stored {
            return Err(MeridianError::CorruptLog {
                path: self.path.clone(),
                stored,
                computed,
            });
        }

        inner.file.set_len(valid_end)?;
        inner.position = FILE_HEADER_SIZE;
        debug!(
            path = %self.path.display(),
            records,
            valid_end,
            "wal recovered"
        );
        Ok(())
    }
}

impl Drop for Wal {
    fn drop(&mut self) {
        self.flush.shutdown();
    }
}

/// Read the full bytes of the record at the cursor and advance past it
///
/// Returns `None` on end-of-file, a structurally invalid record, a
/// per-record checksum mismatch, or an I/O failure mid-read. The read
/// path treats all of these as end of valid data.
fn read_next_record(inner: &mut WalInner) -> Option<Vec<u8>> {
    let file_len = inner.file.metadata().ok()?.len();
    if inner.position + RECORD_HEADER_SIZE > file_len {
        return None;
    }

    let mut header = [0u8; RECORD_HEADER_SIZE as usize];
    inner.file.seek(SeekFrom::Start(inner.position)).ok()?;
    inner.file.read_exact(&mut header).ok()?;
    let (len, stored) = record::parse_header(&header);

    if inner.position + RECORD_HEADER_SIZE + u64::from(len) > file_len {
        return None;
    }

    let mut full = vec![0u8; RECORD_HEADER_SIZE as usize + len as usize];
    inner.file.seek(SeekFrom::Start(inner.position)).ok()?;
    inner.file.read_exact(&mut full).ok()?;

    if checksum(0, &full[OF_PAYLOAD..]) != stored {
        return None;
    }

    inner.position += full.len() as u64;
    Some(full)
}

fn build_strategy(file: &File, policy: FlushPolicy) -> Result<Box<dyn FlushStrategy>> {
    let handle = file.try_clone()?;
    Ok(match policy {
        FlushPolicy::Sync => Box::new(SyncFlush::new(handle)),
        FlushPolicy::Batched {
            interval,
            byte_threshold,
        } => Box::new(BatchedFlush::new(handle, interval, byte_threshold)?),
    })
}
