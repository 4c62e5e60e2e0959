use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::debug;
use snafu::ResultExt;
use tokio::fs::{self, OpenOptions};

use crate::storage::{
    BackendError, StorageResult, TempFileGuard, classify_io, error::OtherIoSnafu, temp_path_for,
};

/// Staged output for one destination file.
///
/// Bytes written through [`OutputSink::writer`] land in a hidden staging file
/// beside the destination. Nothing is visible at the destination until
/// [`OutputSink::finish`] renames the staging file over it. Dropping the
/// sink without finishing closes the handle and removes the staging file.
pub struct OutputSink {
    tmp_path: PathBuf,
    final_path: PathBuf,
    writer: BufWriter<File>,
    guard: TempFileGuard,
}

impl OutputSink {
    /// Create the staging file for `target` with exclusive-create semantics.
    ///
    /// The destination itself is not touched.
    pub async fn open(target: &Path) -> StorageResult<Self> {
        Self::open_at(target, temp_path_for(target)?).await
    }

    // Fails with `AlreadyExists` if `tmp_path` is taken; the existing file is
    // left alone since the guard is only armed after creation succeeds.
    pub(crate) async fn open_at(target: &Path, tmp_path: PathBuf) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .await
            .map_err(|e| classify_io(&tmp_path, e))?;
        let guard = TempFileGuard::new(tmp_path.clone());
        debug!("Staging {} in {}", target.display(), tmp_path.display());

        // Format writers are synchronous std::io::Write consumers.
        let file = file.into_std().await;

        Ok(Self {
            tmp_path,
            final_path: target.to_path_buf(),
            writer: BufWriter::new(file),
            guard,
        })
    }

    /// Path of the staging file.
    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    /// Write handle onto the staging file.
    pub fn writer(&mut self) -> &mut dyn Write {
        &mut self.writer
    }

    /// Flush, fsync, close, and atomically rename onto the destination.
    ///
    /// An existing destination is replaced. On any error the staging file is
    /// removed and the destination is left as it was.
    pub async fn finish(self) -> StorageResult<()> {
        let OutputSink {
            tmp_path,
            final_path,
            writer,
            mut guard,
        } = self;

        let file = writer
            .into_inner()
            .map_err(|e| BackendError::Local(e.into_error()))
            .context(OtherIoSnafu {
                path: tmp_path.display().to_string(),
            })?;

        file.sync_all()
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: tmp_path.display().to_string(),
            })?;

        // Data is durable; a failure to close changes nothing, so it is ignored.
        drop(file);

        fs::rename(&tmp_path, &final_path)
            .await
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: final_path.display().to_string(),
            })?;

        guard.disarm();
        debug!("Committed {}", final_path.display());
        Ok(())
    }
}

impl io::Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
