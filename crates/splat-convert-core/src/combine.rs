//! Merging several tables of the same domain into one.
//!
//! The output schema is the *unified identity list*: the first table's
//! columns in order, followed by every `(name, element type)` identity that a
//! later table introduces, in the order the tables are given. Each output
//! column is allocated at the total row count, pre-filled according to the
//! [`FillPolicy`], and every source's values are copied in at that source's
//! row offset.
//!
//! Rows of a source that lacks a column therefore hold the fill value. Under
//! [`FillPolicy::Zero`] that is the element type's zero and the merge cannot
//! fail; [`FillPolicy::Strict`] turns any gap into an error instead.

use std::{collections::BTreeMap, sync::Arc};

use arrow::{
    array::{Array, ArrayRef, AsArray, Float64Array, PrimitiveArray},
    compute::cast,
    datatypes::{
        ArrowPrimitiveType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, UInt8Type,
        UInt16Type, UInt32Type,
    },
    error::ArrowError,
};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::data::{Column, ColumnIdentity, DataTable, ElementType};

/// What goes into the rows of a source that lacks a column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// The element type's zero value.
    #[default]
    Zero,
    /// A per-column-name value, cast to the column's element type. Columns
    /// without an entry fall back to zero.
    Values(BTreeMap<String, f64>),
    /// Every source must carry every column of the merged schema.
    Strict,
}

/// Errors raised while merging under a non-default [`FillPolicy`].
#[derive(Debug, Snafu)]
pub enum CombineError {
    /// A source lacks a column that another source carries.
    #[snafu(display(
        "Table {table_index} is missing column {column} ({element_type}) required by strict merge"
    ))]
    MissingColumn {
        /// Position of the incomplete table in the input.
        table_index: usize,
        /// Name of the missing column.
        column: String,
        /// Element type of the missing column.
        element_type: ElementType,
    },

    /// A configured fill value is not representable in the column's type.
    #[snafu(display("Fill value {value} does not fit column {column} ({element_type})"))]
    FillValue {
        /// Column the value was configured for.
        column: String,
        /// Element type of that column.
        element_type: ElementType,
        /// The configured value.
        value: f64,
    },

    /// Arrow could not cast a fill value.
    #[snafu(display("Failed to cast fill value for column {column}: {source}"))]
    FillCast {
        /// Column the value was configured for.
        column: String,
        /// Underlying Arrow error.
        source: ArrowError,
    },
}

/// Convenience alias for combine results.
pub type CombineResult<T> = Result<T, CombineError>;

/// Merge `tables` under [`FillPolicy::Zero`]. Never fails.
///
/// A single table is returned as is; an empty input yields an empty table.
pub fn combine(mut tables: Vec<DataTable>) -> DataTable {
    if tables.len() <= 1 {
        return tables.pop().unwrap_or_default();
    }
    let identities = unified_identities(&tables);
    let fills = vec![None; identities.len()];
    merge(&tables, &identities, &fills)
}

/// Merge `tables` under an explicit fill policy.
pub fn combine_with_policy(
    mut tables: Vec<DataTable>,
    policy: &FillPolicy,
) -> CombineResult<DataTable> {
    if tables.len() <= 1 {
        return Ok(tables.pop().unwrap_or_default());
    }
    let identities = unified_identities(&tables);

    let fills = match policy {
        FillPolicy::Zero => vec![None; identities.len()],
        FillPolicy::Strict => {
            ensure_complete(&tables, &identities)?;
            vec![None; identities.len()]
        }
        FillPolicy::Values(values) => identities
            .iter()
            .map(|id| match values.get(&id.name) {
                Some(v) => fill_scalar(id, *v).map(Some),
                None => Ok(None),
            })
            .collect::<CombineResult<Vec<_>>>()?,
    };

    Ok(merge(&tables, &identities, &fills))
}

/// First table's identities in order, then each newly seen identity.
pub fn unified_identities(tables: &[DataTable]) -> Vec<ColumnIdentity> {
    let mut identities: Vec<ColumnIdentity> = Vec::new();
    for table in tables {
        for id in table.identities() {
            if !identities.contains(&id) {
                identities.push(id);
            }
        }
    }
    identities
}

fn ensure_complete(tables: &[DataTable], identities: &[ColumnIdentity]) -> CombineResult<()> {
    for (table_index, table) in tables.iter().enumerate() {
        if let Some(id) = identities
            .iter()
            .find(|id| table.column_by_identity(id).is_none())
        {
            return MissingColumnSnafu {
                table_index,
                column: id.name.clone(),
                element_type: id.element_type,
            }
            .fail();
        }
    }
    Ok(())
}

// One-element array holding `value` in the identity's element type.
fn fill_scalar(id: &ColumnIdentity, value: f64) -> CombineResult<ArrayRef> {
    let source = Float64Array::from(vec![value]);
    let scalar = cast(&source, &id.element_type.data_type()).context(FillCastSnafu {
        column: id.name.clone(),
    })?;
    // Safe casts turn out-of-range and NaN-to-integer values into nulls, but
    // narrowing a finite f64 to f32 overflows to infinity instead.
    let overflowed = scalar
        .as_primitive_opt::<Float32Type>()
        .is_some_and(|f| value.is_finite() && !f.value(0).is_finite());
    ensure!(
        !scalar.is_null(0) && !overflowed,
        FillValueSnafu {
            column: id.name.clone(),
            element_type: id.element_type,
            value,
        }
    );
    Ok(scalar)
}

fn merge(
    tables: &[DataTable],
    identities: &[ColumnIdentity],
    fills: &[Option<ArrayRef>],
) -> DataTable {
    let total_rows: usize = tables.iter().map(DataTable::num_rows).sum();

    let mut offsets = Vec::with_capacity(tables.len());
    let mut row_offset = 0;
    for table in tables {
        offsets.push(row_offset);
        row_offset += table.num_rows();
    }

    let columns = identities
        .iter()
        .zip(fills)
        .map(|(id, fill)| {
            let sources: Vec<(usize, Option<&Column>)> = tables
                .iter()
                .zip(&offsets)
                .map(|(table, offset)| (*offset, table.column_by_identity(id)))
                .collect();
            let fill = fill.as_ref();

            let data = match id.element_type {
                ElementType::Int8 => merge_typed::<Int8Type>(&sources, total_rows, fill),
                ElementType::UInt8 => merge_typed::<UInt8Type>(&sources, total_rows, fill),
                ElementType::Int16 => merge_typed::<Int16Type>(&sources, total_rows, fill),
                ElementType::UInt16 => merge_typed::<UInt16Type>(&sources, total_rows, fill),
                ElementType::Int32 => merge_typed::<Int32Type>(&sources, total_rows, fill),
                ElementType::UInt32 => merge_typed::<UInt32Type>(&sources, total_rows, fill),
                ElementType::Float32 => merge_typed::<Float32Type>(&sources, total_rows, fill),
                ElementType::Float64 => merge_typed::<Float64Type>(&sources, total_rows, fill),
            };
            Column::from_parts(id.name.clone(), id.element_type, data)
        })
        .collect();

    DataTable::from_columns_unchecked(columns)
}

fn merge_typed<T: ArrowPrimitiveType>(
    sources: &[(usize, Option<&Column>)],
    total_rows: usize,
    fill: Option<&ArrayRef>,
) -> ArrayRef {
    let fill_value = fill
        .and_then(|scalar| scalar.as_primitive_opt::<T>())
        .map(|scalar| scalar.value(0))
        .unwrap_or_default();

    let mut out = vec![fill_value; total_rows];
    for (offset, column) in sources {
        let Some(array) = column.and_then(|c| c.data().as_primitive_opt::<T>()) else {
            continue;
        };
        let values = array.values();
        out[*offset..*offset + values.len()].copy_from_slice(values);
    }
    Arc::new(PrimitiveArray::<T>::new(out.into(), None))
}
