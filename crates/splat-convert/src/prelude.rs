//! Wrapper prelude.
//!
//! The `splat-convert` crate is the supported public entry point.
//! Downstream code should prefer importing from this prelude instead of
//! depending on internal core module paths.

pub use crate::codec::{
    FormatReader, FormatWriter, PlyDecompressor, SplatGenerator, TableProcessor,
};
pub use crate::{
    CodecRegistry, ConvertError, ConvertOptions, ConvertOutcome, ConvertReport, Converter,
    DataTable, ErrorKind, FillPolicy, InputKind, OutputKind, WriteOptions,
};
