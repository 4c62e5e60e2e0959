//! # splat-convert
//!
//! Convert Gaussian-splat assets between encodings through a common columnar
//! table.
//!
//! This crate is the supported public entry point and provides a small, stable surface.
//! Format codecs are supplied by the caller through a [`CodecRegistry`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use splat_convert::prelude::*;
//!
//! let codecs = CodecRegistry::new()
//!     .with_reader(InputKind::Ply, my_ply_reader)
//!     .with_writer(OutputKind::Sog, my_sog_writer);
//!
//! let report = Converter::new(codecs)
//!     .convert("scene.ply", "scene/meta.json")
//!     .await?;
//! println!("wrote {} splats", report.table.num_rows());
//! ```

/// Convenience prelude with the stable, supported surface.
pub mod prelude;

/// Collaborator traits (wrapper-only).
pub mod codec {
    pub use splat_convert_core::codec::{
        CodecError, CodecResult, FormatReader, FormatWriter, IdentityProcessor, PlyDecompressor,
        ProcessStage, ReadContext, ReadSeek, SplatGenerator, TableProcessor, WriteContext,
    };
}

pub use splat_convert_core::codec::CodecRegistry;
pub use splat_convert_core::combine::{CombineError, FillPolicy, combine, combine_with_policy};
pub use splat_convert_core::data::{
    Column, ColumnIdentity, DataTable, Element, ElementType, FileRecord, TableError,
};
pub use splat_convert_core::error::{ConvertError, Direction, ErrorKind};
pub use splat_convert_core::format::{
    InputKind, OutputKind, resolve_input_kind, resolve_output_kind,
};
pub use splat_convert_core::options::{ComputeDevice, ConvertOptions, OptionsError, WriteOptions};
pub use splat_convert_core::pipeline::{ConvertOutcome, ConvertReport, Converter, Stage};
pub use splat_convert_core::schema::{SPLAT_COLUMNS, is_splat_table};
pub use splat_convert_core::storage::StorageError;
