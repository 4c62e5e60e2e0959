//! External collaborators: format readers/writers, the procedural generator,
//! compressed-ply decoding and per-splat processing.
//!
//! None of the byte layouts live in this crate. Implementations are
//! registered in a [`CodecRegistry`] keyed by the resolved
//! [`InputKind`]/[`OutputKind`], and the pipeline only ever talks to them
//! through these traits.
//!
//! Collaborators run synchronously on already-open handles. A writer writes
//! into the staging file handed to it and must not close or rename it; the
//! commit protocol owns that handle.

use std::{
    collections::HashMap,
    error::Error,
    fmt,
    io::{Read, Seek, Write},
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    data::{DataTable, FileRecord},
    format::{InputKind, OutputKind, PlyEncoding},
    options::WriteOptions,
};

/// Opaque error returned by a collaborator.
pub type CodecError = Box<dyn Error + Send + Sync + 'static>;

/// Result type for collaborator calls.
pub type CodecResult<T> = Result<T, CodecError>;

/// Seekable byte source handed to readers.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// What a reader or generator is being asked to load.
#[derive(Clone, Debug)]
pub struct ReadContext {
    /// Path of the source as given by the caller.
    pub path: PathBuf,
    /// Kind the path resolved to.
    pub kind: InputKind,
}

/// What a writer is being asked to produce.
#[derive(Clone, Copy, Debug)]
pub struct WriteContext<'a> {
    /// Final destination path. The bytes go to the staging handle, but
    /// multi-file formats need the destination to name their siblings.
    pub target: &'a Path,
    /// Kind the destination resolved to.
    pub kind: OutputKind,
    /// Options forwarded untouched (iteration count, compute device).
    pub options: &'a WriteOptions,
}

/// Parses one encoding into a [`FileRecord`].
pub trait FormatReader: Send + Sync {
    /// Read the whole file from `input`.
    fn read(&self, input: &mut dyn ReadSeek, ctx: &ReadContext) -> CodecResult<FileRecord>;
}

/// Serializes a table into one encoding.
pub trait FormatWriter: Send + Sync {
    /// Write `table` into `output`.
    fn write(
        &self,
        output: &mut dyn Write,
        table: &DataTable,
        ctx: &WriteContext<'_>,
    ) -> CodecResult<()>;
}

/// Produces splats procedurally (`.mjs` inputs) without opening a file.
pub trait SplatGenerator: Send + Sync {
    /// Generate a record for the given source description.
    fn generate(&self, ctx: &ReadContext) -> CodecResult<FileRecord>;
}

/// Recognizes and expands the compressed ply layout after parsing.
pub trait PlyDecompressor: Send + Sync {
    /// Whether a parsed ply record uses the compressed layout.
    fn is_compressed(&self, record: &FileRecord) -> bool;

    /// Expand a compressed record into plain splat columns.
    fn decompress(&self, record: &FileRecord) -> CodecResult<DataTable>;
}

/// Point in the pipeline at which a [`TableProcessor`] runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessStage<'a> {
    /// A single source, before merging.
    Source {
        /// Position of the source in the input list.
        index: usize,
        /// Path of the source.
        path: &'a Path,
    },
    /// The merged table, before writing.
    Merged,
}

/// Row-level transform applied once per source and once after merging.
///
/// Treated as pure: the input table is consumed and a new one returned.
pub trait TableProcessor: Send + Sync {
    /// Transform `table`.
    fn process(&self, table: DataTable, stage: ProcessStage<'_>) -> CodecResult<DataTable>;
}

/// Processor that returns its input unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityProcessor;

impl TableProcessor for IdentityProcessor {
    fn process(&self, table: DataTable, _stage: ProcessStage<'_>) -> CodecResult<DataTable> {
        Ok(table)
    }
}

/// Set of collaborators available to a conversion.
#[derive(Clone)]
pub struct CodecRegistry {
    readers: HashMap<InputKind, Arc<dyn FormatReader>>,
    writers: HashMap<OutputKind, Arc<dyn FormatWriter>>,
    generator: Option<Arc<dyn SplatGenerator>>,
    ply_decompressor: Option<Arc<dyn PlyDecompressor>>,
    processor: Arc<dyn TableProcessor>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self {
            readers: HashMap::new(),
            writers: HashMap::new(),
            generator: None,
            ply_decompressor: None,
            processor: Arc::new(IdentityProcessor),
        }
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("readers", &self.readers.keys().collect::<Vec<_>>())
            .field("writers", &self.writers.keys().collect::<Vec<_>>())
            .field("generator", &self.generator.is_some())
            .field("ply_decompressor", &self.ply_decompressor.is_some())
            .finish_non_exhaustive()
    }
}

impl CodecRegistry {
    /// Empty registry with the identity processor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the reader for `kind`, replacing any previous one.
    pub fn with_reader(mut self, kind: InputKind, reader: impl FormatReader + 'static) -> Self {
        self.readers.insert(kind, Arc::new(reader));
        self
    }

    /// Register the writer for `kind`, replacing any previous one.
    pub fn with_writer(mut self, kind: OutputKind, writer: impl FormatWriter + 'static) -> Self {
        self.writers.insert(kind, Arc::new(writer));
        self
    }

    /// Register the procedural generator used for `.mjs` inputs.
    pub fn with_generator(mut self, generator: impl SplatGenerator + 'static) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// Register the compressed-ply decoder.
    pub fn with_ply_decompressor(mut self, decompressor: impl PlyDecompressor + 'static) -> Self {
        self.ply_decompressor = Some(Arc::new(decompressor));
        self
    }

    /// Replace the row-level processor.
    pub fn with_processor(mut self, processor: impl TableProcessor + 'static) -> Self {
        self.processor = Arc::new(processor);
        self
    }

    /// Reader for `kind`, if registered.
    pub fn reader(&self, kind: InputKind) -> Option<&Arc<dyn FormatReader>> {
        self.readers.get(&kind)
    }

    /// Writer for `kind`, if registered.
    pub fn writer(&self, kind: OutputKind) -> Option<&Arc<dyn FormatWriter>> {
        self.writers.get(&kind)
    }

    /// Procedural generator, if registered.
    pub fn generator(&self) -> Option<&Arc<dyn SplatGenerator>> {
        self.generator.as_ref()
    }

    /// Compressed-ply decoder, if registered.
    pub fn ply_decompressor(&self) -> Option<&Arc<dyn PlyDecompressor>> {
        self.ply_decompressor.as_ref()
    }

    /// Row-level processor.
    pub fn processor(&self) -> &Arc<dyn TableProcessor> {
        &self.processor
    }

    /// Classify a parsed ply record. Without a registered decoder every
    /// record is plain.
    pub fn ply_encoding(&self, record: &FileRecord) -> PlyEncoding {
        match &self.ply_decompressor {
            Some(d) if d.is_compressed(record) => PlyEncoding::Compressed,
            _ => PlyEncoding::Plain,
        }
    }
}

/// A collaborator panicked; reported as a codec failure.
#[derive(Debug)]
pub struct CollaboratorPanic {
    message: String,
}

impl fmt::Display for CollaboratorPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "collaborator panicked: {}", self.message)
    }
}

impl Error for CollaboratorPanic {}

/// Run a collaborator call, turning a panic into a [`CodecError`].
///
/// Handles owned by the caller are still dropped during unwinding, so the
/// usual guards run before this returns.
pub(crate) fn catch_collaborator<T>(f: impl FnOnce() -> CodecResult<T>) -> CodecResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "non-string panic payload".to_string()
            };
            Err(Box::new(CollaboratorPanic { message }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{IpcCodec, splat_table};

    #[test]
    fn empty_registry_has_no_codecs() {
        let registry = CodecRegistry::new();
        assert!(registry.reader(InputKind::Ply).is_none());
        assert!(registry.writer(OutputKind::Ply).is_none());
        assert!(registry.generator().is_none());
        assert_eq!(
            registry.ply_encoding(&FileRecord::default()),
            PlyEncoding::Plain
        );
    }

    #[test]
    fn registration_is_per_kind() {
        let registry = CodecRegistry::new()
            .with_reader(InputKind::Ply, IpcCodec)
            .with_writer(OutputKind::CompressedPly, IpcCodec);
        assert!(registry.reader(InputKind::Ply).is_some());
        assert!(registry.reader(InputKind::Spz).is_none());
        assert!(registry.writer(OutputKind::CompressedPly).is_some());
        assert!(registry.writer(OutputKind::Ply).is_none());
    }

    #[test]
    fn identity_processor_returns_input() {
        let table = splat_table(3);
        let out = IdentityProcessor
            .process(table.clone(), ProcessStage::Merged)
            .expect("identity never fails");
        assert_eq!(out, table);
    }

    #[test]
    fn panics_become_codec_errors() {
        let result: CodecResult<()> = catch_collaborator(|| panic!("bad header"));
        let err = result.expect_err("panic should be caught");
        assert!(err.to_string().contains("bad header"));

        let ok = catch_collaborator(|| Ok(7));
        assert_eq!(ok.expect("no panic"), 7);
    }
}
