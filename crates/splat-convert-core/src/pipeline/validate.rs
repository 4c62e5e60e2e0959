//! Validation stage: extract the vertex table of a parsed source.

use std::path::Path;

use snafu::prelude::*;

use crate::{
    data::{DataTable, FileRecord, VERTEX_ELEMENT},
    error::{ConvertResult, SchemaViolationSnafu},
    schema::missing_splat_columns,
};

/// Take the single `"vertex"` element out of `record` and check it.
///
/// Fails with a schema violation naming `path` when the record holds anything
/// other than a single `"vertex"` element, when that element has no rows, or
/// when any required splat column is missing.
pub fn vertex_table(record: FileRecord, path: &Path) -> ConvertResult<DataTable> {
    let path_str = || path.display().to_string();

    let names: Vec<&str> = record.elements.iter().map(|e| e.name.as_str()).collect();
    ensure!(
        names == [VERTEX_ELEMENT],
        SchemaViolationSnafu {
            path: path_str(),
            reason: format!(
                "expected exactly one element named '{VERTEX_ELEMENT}', found [{}]",
                names.join(", ")
            ),
        }
    );

    let table = record
        .elements
        .into_iter()
        .next()
        .map(|e| e.table)
        .unwrap_or_default();

    ensure!(
        table.num_rows() > 0,
        SchemaViolationSnafu {
            path: path_str(),
            reason: "file contains no splats",
        }
    );

    let missing = missing_splat_columns(&table);
    ensure!(
        missing.is_empty(),
        SchemaViolationSnafu {
            path: path_str(),
            reason: format!("missing required splat columns: {}", missing.join(", ")),
        }
    );

    Ok(table)
}
