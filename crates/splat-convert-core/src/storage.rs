//! Local filesystem access for sources and committed outputs.
//!
//! Outputs are never written to their final path directly. The commit
//! protocol stages bytes in a temporary file in the destination's own
//! directory (so the final rename stays on one filesystem), flushes it to
//! stable storage, and then renames it over the destination:
//!
//! - [`temp_path_for`] builds the staging name
//!   `.<basename>.<pid>.<unix-millis>.<random-hex>.tmp`.
//! - [`OutputSink`] opens the staging file with exclusive-create semantics,
//!   hands out a `Write` handle, and on [`OutputSink::finish`] flushes,
//!   fsyncs, closes and renames.
//! - A [`TempFileGuard`] removes the staging file on every path that does
//!   not reach a successful rename, including unwinding.
//!
//! Sources are opened through [`open_input`]; the returned handle closes
//! when dropped.

mod error;
mod output;

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use log::warn;
use rand::RngCore as _;
use snafu::prelude::*;

pub use error::{BackendError, StorageError};
pub use output::OutputSink;

pub(crate) use error::{InvalidTargetSnafu, classify_io};

/// General result type used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Extension of every staging file.
pub const TEMP_EXTENSION: &str = "tmp";

/// Build the staging path for `target`, next to it.
///
/// The name combines the destination's base name, the process id, the
/// current time in milliseconds and 64 random bits, so concurrent
/// conversions do not collide in practice. Exclusive creation in
/// [`OutputSink::open`] catches the case where they would.
pub fn temp_path_for(target: &Path) -> StorageResult<PathBuf> {
    let base = target.file_name().context(InvalidTargetSnafu {
        path: target.display().to_string(),
    })?;
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let name = format!(
        ".{}.{}.{}.{:016x}.{TEMP_EXTENSION}",
        base.to_string_lossy(),
        std::process::id(),
        millis,
        rand::rng().next_u64(),
    );
    Ok(parent_dir(target).join(name))
}

/// Directory holding `path`; `.` for bare file names.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Guard that removes a temporary file on drop unless disarmed.
///
/// Used to ensure cleanup on error paths during atomic writes.
pub struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    /// Guard `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Keep the file. Call after a successful rename.
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Best-effort: the caller is already reporting the original failure.
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(
                "Failed to remove staging file {}: {e}",
                self.path.display()
            );
        }
    }
}

/// Open a source file for reading.
///
/// Missing files map to [`StorageError::NotFound`]. The handle is released
/// when the returned reader is dropped.
pub async fn open_input(path: &Path) -> StorageResult<BufReader<File>> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| classify_io(path, e))?;
    // Readers are synchronous and need std::io::{Read, Seek}.
    let file = file.into_std().await;
    Ok(BufReader::new(file))
}

/// Whether `path` currently exists.
pub async fn exists(path: &Path) -> StorageResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| classify_io(path, e))
}
