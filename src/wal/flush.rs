//! Flush strategies
//!
//! Decide when buffered WAL writes are forced to stable storage.
//!
//! Two implementations:
//! - [`SyncFlush`]: force after every append. Maximum durability.
//! - [`BatchedFlush`]: force once a byte threshold or a time threshold
//!   is crossed, whichever comes first. Bounded data loss on crash,
//!   much higher append throughput.
//!
//! The log never inspects the concrete strategy; it only calls the
//! [`FlushStrategy`] capability methods.

use std::fs::File;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, tick, Sender};
use crossbeam::select;
use parking_lot::Mutex;
use tracing::warn;

use crate::error::Result;

/// When-to-force policy consulted by the log after every append
pub trait FlushStrategy: Send + Sync {
    /// Account for `bytes_written` freshly appended bytes and force the
    /// file if the strategy calls for it
    fn on_write(&self, bytes_written: u64) -> Result<()>;

    /// Force everything pending to stable storage now
    fn flush_now(&self) -> Result<()>;

    /// Stop any background scheduling. Idempotent; further `on_write`
    /// calls still account bytes but nothing ticks on a timer.
    fn shutdown(&self);
}

// =============================================================================
// Synchronous Strategy
// =============================================================================

/// Forces the file on every write
pub struct SyncFlush {
    file: File,
}

impl SyncFlush {
    /// Wrap a handle to the log's backing file
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

impl FlushStrategy for SyncFlush {
    fn on_write(&self, _bytes_written: u64) -> Result<()> {
        // a failed durability write is fatal to the append
        self.file.sync_data()?;
        Ok(())
    }

    fn flush_now(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    fn shutdown(&self) {}
}

// =============================================================================
// Batched Strategy
// =============================================================================

/// State shared between writer threads and the timer thread
struct FlushCore {
    file: File,
    interval: Duration,
    byte_threshold: u64,

    /// Construction instant; timestamps below are nanoseconds since this
    start: Instant,

    /// Bytes appended since the last force (lock-free accumulation)
    pending: AtomicU64,

    /// Timestamp of the last force, nanoseconds since `start`
    last_flush: AtomicU64,

    /// Completed forces (observability)
    flushes: AtomicU64,

    /// Serializes the force itself; conditions are re-checked under this
    /// lock so racing callers force at most once per satisfied threshold
    force_lock: Mutex<()>,
}

impl FlushCore {
    fn now_nanos(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn thresholds_due(&self) -> bool {
        let bytes = self.pending.load(Ordering::Acquire);
        let since = self
            .now_nanos()
            .saturating_sub(self.last_flush.load(Ordering::Acquire));
        bytes >= self.byte_threshold || since >= self.interval.as_nanos() as u64
    }

    /// Force if a threshold is crossed. Best-effort: an I/O failure is
    /// logged and skipped; the next satisfied check retries naturally.
    fn try_flush(&self) {
        if !self.thresholds_due() {
            return;
        }
        let _guard = self.force_lock.lock();
        if !self.thresholds_due() {
            // another caller flushed between our check and the lock
            return;
        }
        if let Err(e) = self.file.sync_data() {
            warn!(error = %e, "batched flush failed, skipping until next threshold");
            return;
        }
        self.mark_flushed();
    }

    fn mark_flushed(&self) {
        self.pending.store(0, Ordering::Release);
        self.last_flush.store(self.now_nanos(), Ordering::Release);
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }
}

/// Time- and byte-threshold batched flushing with an owned timer thread
///
/// The timer thread belongs to this strategy alone and is shut down
/// deterministically by [`FlushStrategy::shutdown`] (also run on drop),
/// so unrelated log instances share no hidden scheduler state.
pub struct BatchedFlush {
    core: Arc<FlushCore>,
    shutdown_tx: Sender<()>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl BatchedFlush {
    /// Start a batched strategy over a handle to the log's backing file
    ///
    /// Fails only if the timer thread cannot be spawned.
    pub fn new(file: File, interval: Duration, byte_threshold: u64) -> Result<Self> {
        let core = Arc::new(FlushCore {
            file,
            interval,
            byte_threshold,
            start: Instant::now(),
            pending: AtomicU64::new(0),
            last_flush: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            force_lock: Mutex::new(()),
        });

        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let timer_core = Arc::clone(&core);
        let timer = std::thread::Builder::new()
            .name("wal-flush".into())
            .spawn(move || {
                let ticker = tick(interval);
                loop {
                    select! {
                        recv(ticker) -> _ => timer_core.try_flush(),
                        recv(shutdown_rx) -> _ => break,
                    }
                }
            })?;

        Ok(Self {
            core,
            shutdown_tx,
            timer: Mutex::new(Some(timer)),
        })
    }

    /// Bytes accumulated since the last force
    pub fn pending_bytes(&self) -> u64 {
        self.core.pending.load(Ordering::Acquire)
    }

    /// Number of completed forces so far
    pub fn flushes(&self) -> u64 {
        self.core.flushes.load(Ordering::Relaxed)
    }
}

impl FlushStrategy for BatchedFlush {
    fn on_write(&self, bytes_written: u64) -> Result<()> {
        self.core.pending.fetch_add(bytes_written, Ordering::AcqRel);
        self.core.try_flush();
        Ok(())
    }

    fn flush_now(&self) -> Result<()> {
        let _guard = self.core.force_lock.lock();
        self.core.file.sync_data()?;
        self.core.mark_flushed();
        Ok(())
    }

    fn shutdown(&self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.timer.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for BatchedFlush {
    fn drop(&mut self) {
        self.shutdown();
    }
}
