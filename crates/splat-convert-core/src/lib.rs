//! Core engine for converting Gaussian-splat assets between encodings.
//!
//! Every supported encoding (ply, splat, ksplat, spz, sog, compressed ply,
//! lod, csv, html) is normalized into one columnar representation so the
//! conversion itself only ever deals with tables:
//!
//! - A typed, named columnar table model backed by Arrow arrays
//!   (`data` module).
//! - Suffix-based resolution of file names to reader/writer kinds
//!   (`format` module).
//! - Validation of the fixed splat attribute set (`schema` module).
//! - Merging of several source tables into one, with an explicit policy
//!   for columns that only some sources carry (`combine` module).
//! - A crash-safe commit protocol: stage into a temporary file next to the
//!   destination, fsync, then atomically rename (`storage` and `commit`
//!   modules).
//! - The conversion pipeline that sequences read, validate, process,
//!   combine and write, reporting every failure as a value (`pipeline`).
//!
//! Byte-level codecs, LOD construction and per-splat processing are not part
//! of this crate; they plug in through the traits in the `codec` module.
#![deny(missing_docs)]
pub mod codec;
pub mod combine;
pub mod commit;
pub mod data;
pub mod error;
pub mod format;
pub mod options;
pub mod pipeline;
pub mod schema;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_util;

pub use codec::CodecRegistry;
pub use data::{Column, DataTable, ElementType, FileRecord};
pub use error::{ConvertError, ErrorKind};
pub use options::ConvertOptions;
pub use pipeline::{ConvertOutcome, ConvertReport, Converter};
