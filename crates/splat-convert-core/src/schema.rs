//! The splat attribute set.
//!
//! A table is treated as Gaussian-splat vertex data only if it carries every
//! column in [`SPLAT_COLUMNS`]. Column order and extra columns (higher-order
//! spherical harmonics, normals, ...) are irrelevant and pass through.

use crate::data::DataTable;

/// Columns every splat table must carry: position, rotation quaternion,
/// log-scale, DC color and opacity.
pub const SPLAT_COLUMNS: [&str; 14] = [
    "x", "y", "z", "rot_0", "rot_1", "rot_2", "rot_3", "scale_0", "scale_1", "scale_2", "f_dc_0",
    "f_dc_1", "f_dc_2", "opacity",
];

/// Whether `table` carries every required splat column.
pub fn is_splat_table(table: &DataTable) -> bool {
    SPLAT_COLUMNS.iter().all(|name| table.has_column(name))
}

/// Required columns absent from `table`, in [`SPLAT_COLUMNS`] order.
pub fn missing_splat_columns(table: &DataTable) -> Vec<&'static str> {
    SPLAT_COLUMNS
        .iter()
        .copied()
        .filter(|name| !table.has_column(name))
        .collect()
}
