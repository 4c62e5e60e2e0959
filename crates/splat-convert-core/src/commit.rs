//! Commit writer: serialize a table to its destination crash-safely.
//!
//! 1. Resolve the output kind from the destination name; an unsupported
//!    name fails before anything touches the filesystem.
//! 2. Open a uniquely named staging file beside the destination with
//!    exclusive create ([`OutputSink::open`]).
//! 3. Run the registered [`FormatWriter`](crate::codec::FormatWriter) into
//!    the staging handle.
//! 4. Flush and fsync, close, and rename over the destination
//!    ([`OutputSink::finish`]).
//!
//! If step 3 or 4 fails the staging file is removed and the destination keeps
//! whatever it held before. The rename always replaces an existing
//! destination; [`WriteOptions::overwrite`] does not gate it.

use std::path::Path;

use log::{debug, warn};
use snafu::prelude::*;

use crate::{
    codec::{CodecRegistry, WriteContext, catch_collaborator},
    data::DataTable,
    error::{CodecSnafu, CodecUnavailableSnafu, ConvertResult, StorageSnafu},
    format::{OutputKind, resolve_output_kind},
    options::WriteOptions,
    pipeline::Stage,
    storage::{self, OutputSink},
};

/// Write `table` to `target` through the writer registered for its kind.
///
/// Returns the kind that was written.
pub async fn write_file(
    target: &Path,
    table: &DataTable,
    options: &WriteOptions,
    codecs: &CodecRegistry,
) -> ConvertResult<OutputKind> {
    let kind = resolve_output_kind(target)?;
    let writer = codecs.writer(kind).context(CodecUnavailableSnafu {
        kind: kind.to_string(),
    })?;

    if !options.overwrite && storage::exists(target).await.context(StorageSnafu)? {
        warn!(
            "{} exists and overwrite is disabled; it will be replaced anyway",
            target.display()
        );
    }

    let mut sink = OutputSink::open(target).await.context(StorageSnafu)?;
    let ctx = WriteContext {
        target,
        kind,
        options,
    };

    debug!(
        "Writing {} rows as {kind} to {}",
        table.num_rows(),
        target.display()
    );
    // On error the sink is dropped here, which removes the staging file.
    catch_collaborator(|| writer.write(sink.writer(), table, &ctx)).context(CodecSnafu {
        stage: Stage::Writing,
        path: target.display().to_string(),
    })?;

    sink.finish().await.context(StorageSnafu)?;
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{ConvertError, ErrorKind},
        test_util::{FailingWriter, IpcCodec, PanickingWriter, read_ipc_table, splat_table},
    };
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn file_names(dir: &Path) -> std::io::Result<Vec<String>> {
        let mut names: Vec<String> = std::fs::read_dir(dir)?
            .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<Result<_, _>>()?;
        names.sort();
        Ok(names)
    }

    #[tokio::test]
    async fn successful_write_leaves_only_the_target() -> TestResult {
        let tmp = TempDir::new()?;
        let target = tmp.path().join("out.ply");
        let codecs = CodecRegistry::new().with_writer(OutputKind::Ply, IpcCodec);
        let table = splat_table(10);

        let kind = write_file(&target, &table, &WriteOptions::default(), &codecs).await?;

        assert_eq!(kind, OutputKind::Ply);
        assert_eq!(read_ipc_table(&target)?, table);
        assert_eq!(file_names(tmp.path())?, vec!["out.ply".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn compressed_ply_targets_use_the_compressed_writer() -> TestResult {
        let tmp = TempDir::new()?;
        let target = tmp.path().join("out.compressed.ply");
        let codecs = CodecRegistry::new()
            .with_writer(OutputKind::CompressedPly, IpcCodec)
            .with_writer(OutputKind::Ply, FailingWriter);

        let kind = write_file(&target, &splat_table(2), &WriteOptions::default(), &codecs).await?;
        assert_eq!(kind, OutputKind::CompressedPly);
        Ok(())
    }

    #[tokio::test]
    async fn unsupported_target_touches_nothing() -> TestResult {
        let tmp = TempDir::new()?;
        let target = tmp.path().join("out.obj");
        let codecs = CodecRegistry::new().with_writer(OutputKind::Ply, IpcCodec);

        let err = write_file(&target, &splat_table(1), &WriteOptions::default(), &codecs)
            .await
            .expect_err("unsupported");
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        assert!(file_names(tmp.path())?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_writer_is_reported() -> TestResult {
        let tmp = TempDir::new()?;
        let err = write_file(
            &tmp.path().join("out.html"),
            &splat_table(1),
            &WriteOptions::default(),
            &CodecRegistry::new(),
        )
        .await
        .expect_err("no writer");
        assert!(matches!(err, ConvertError::CodecUnavailable { ref kind } if kind == "html"));
        assert!(file_names(tmp.path())?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failed_codec_keeps_old_target_and_cleans_up() -> TestResult {
        let tmp = TempDir::new()?;
        let target = tmp.path().join("out.ply");
        tokio::fs::write(&target, b"previous").await?;
        let codecs = CodecRegistry::new().with_writer(OutputKind::Ply, FailingWriter);

        let err = write_file(&target, &splat_table(3), &WriteOptions::default(), &codecs)
            .await
            .expect_err("writer fails");

        assert_eq!(err.kind(), ErrorKind::Codec);
        assert_eq!(tokio::fs::read(&target).await?, b"previous");
        assert_eq!(file_names(tmp.path())?, vec!["out.ply".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn failed_codec_without_prior_target_creates_nothing() -> TestResult {
        let tmp = TempDir::new()?;
        let target = tmp.path().join("out.ply");
        let codecs = CodecRegistry::new().with_writer(OutputKind::Ply, FailingWriter);

        write_file(&target, &splat_table(3), &WriteOptions::default(), &codecs)
            .await
            .expect_err("writer fails");

        assert!(!target.exists());
        assert!(file_names(tmp.path())?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn panicking_codec_is_a_codec_error() -> TestResult {
        let tmp = TempDir::new()?;
        let target = tmp.path().join("out.ply");
        let codecs = CodecRegistry::new().with_writer(OutputKind::Ply, PanickingWriter);

        let err = write_file(&target, &splat_table(1), &WriteOptions::default(), &codecs)
            .await
            .expect_err("writer panics");
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert!(file_names(tmp.path())?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn overwrite_false_still_replaces() -> TestResult {
        let tmp = TempDir::new()?;
        let target = tmp.path().join("out.ply");
        tokio::fs::write(&target, b"previous").await?;
        let codecs = CodecRegistry::new().with_writer(OutputKind::Ply, IpcCodec);
        let options = WriteOptions {
            overwrite: false,
            ..WriteOptions::default()
        };

        write_file(&target, &splat_table(4), &options, &codecs).await?;
        assert_eq!(read_ipc_table(&target)?.num_rows(), 4);
        Ok(())
    }
}
