//! Reading stage: resolve, open and parse one source.

use std::path::Path;

use log::debug;
use snafu::prelude::*;

use crate::{
    codec::{CodecRegistry, ReadContext, catch_collaborator},
    data::FileRecord,
    error::{CodecSnafu, CodecUnavailableSnafu, ConvertResult, StorageSnafu},
    format::{InputKind, PlyEncoding, resolve_input_kind},
    pipeline::Stage,
    storage::open_input,
};

/// Load `path` into a [`FileRecord`].
///
/// Generator inputs never open a file. Every other input is opened, parsed
/// by the reader registered for its kind, and closed again before this
/// returns, whether parsing succeeded, failed or panicked. Compressed ply
/// records are expanded into a single plain `"vertex"` element.
pub async fn read_file(path: &Path, codecs: &CodecRegistry) -> ConvertResult<FileRecord> {
    let kind = resolve_input_kind(path)?;
    let ctx = ReadContext {
        path: path.to_path_buf(),
        kind,
    };
    let codec_context = || CodecSnafu {
        stage: Stage::Reading,
        path: path.display().to_string(),
    };

    if !kind.opens_file() {
        let generator = codecs.generator().context(CodecUnavailableSnafu {
            kind: kind.to_string(),
        })?;
        debug!("Generating splats from {}", path.display());
        return catch_collaborator(|| generator.generate(&ctx)).context(codec_context());
    }

    let reader = codecs.reader(kind).context(CodecUnavailableSnafu {
        kind: kind.to_string(),
    })?;

    let record = {
        let mut input = open_input(path).await.context(StorageSnafu)?;
        debug!("Reading {} as {kind}", path.display());
        catch_collaborator(|| reader.read(&mut input, &ctx)).context(codec_context())?
    };

    if kind != InputKind::Ply {
        return Ok(record);
    }

    match catch_collaborator(|| Ok(codecs.ply_encoding(&record))).context(codec_context())? {
        PlyEncoding::Plain => Ok(record),
        PlyEncoding::Compressed => {
            debug!("Decompressing compressed ply {}", path.display());
            let decompressor = codecs.ply_decompressor().context(CodecUnavailableSnafu {
                kind: "compressed-ply".to_string(),
            })?;
            let table = catch_collaborator(|| decompressor.decompress(&record))
                .context(codec_context())?;
            Ok(FileRecord {
                comments: record.comments,
                ..FileRecord::single_vertex(table)
            })
        }
    }
}
