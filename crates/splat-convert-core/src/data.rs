//! Columnar table model.
//!
//! Every reader produces, and every writer consumes, the same format-neutral
//! representation:
//!
//! - [`Column`]: a named, dense Arrow primitive array of one [`ElementType`].
//! - [`DataTable`]: an ordered set of equal-length columns.
//! - [`FileRecord`]: header comments plus named elements, each holding a
//!   table (for splat files the interesting element is `"vertex"`).
//!
//! Column order inside a table is presentational only. For merging, a column
//! is identified by its [`ColumnIdentity`], the `(name, element type)` pair;
//! two columns sharing a name but not a type are distinct columns.

use std::{fmt, sync::Arc};

use arrow::{
    array::{Array, ArrayRef, AsArray, PrimitiveArray},
    datatypes::{
        ArrowNativeType, ArrowPrimitiveType, DataType, Field, Float32Type, Float64Type, Int8Type,
        Int16Type, Int32Type, Schema, UInt8Type, UInt16Type, UInt32Type,
    },
    error::ArrowError,
    record_batch::{RecordBatch, RecordBatchOptions},
};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// Name of the element that carries per-splat data in a [`FileRecord`].
pub const VERTEX_ELEMENT: &str = "vertex";

/// Errors raised while building or converting tables.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TableError {
    /// The Arrow type of a column is not one of the supported element types.
    #[snafu(display("Column {column} has unsupported type {data_type}"))]
    UnsupportedType {
        /// Name of the offending column.
        column: String,
        /// Arrow type that was encountered.
        data_type: DataType,
    },

    /// A column's length differs from the table's row count.
    #[snafu(display("Column {column} has {actual} rows, expected {expected}"))]
    LengthMismatch {
        /// Name of the offending column.
        column: String,
        /// Row count established by the first column.
        expected: usize,
        /// Length of the offending column.
        actual: usize,
    },

    /// Arrow rejected a record batch built from the table.
    #[snafu(display("Arrow error while converting table: {source}"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },
}

/// Convenience alias for table model results.
pub type TableResult<T> = Result<T, TableError>;

/// Numeric element type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
}

impl ElementType {
    /// Arrow data type backing columns of this element type.
    pub fn data_type(self) -> DataType {
        match self {
            ElementType::Int8 => DataType::Int8,
            ElementType::UInt8 => DataType::UInt8,
            ElementType::Int16 => DataType::Int16,
            ElementType::UInt16 => DataType::UInt16,
            ElementType::Int32 => DataType::Int32,
            ElementType::UInt32 => DataType::UInt32,
            ElementType::Float32 => DataType::Float32,
            ElementType::Float64 => DataType::Float64,
        }
    }

    /// Map an Arrow data type back to an element type, if supported.
    pub fn from_data_type(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Int8 => Some(ElementType::Int8),
            DataType::UInt8 => Some(ElementType::UInt8),
            DataType::Int16 => Some(ElementType::Int16),
            DataType::UInt16 => Some(ElementType::UInt16),
            DataType::Int32 => Some(ElementType::Int32),
            DataType::UInt32 => Some(ElementType::UInt32),
            DataType::Float32 => Some(ElementType::Float32),
            DataType::Float64 => Some(ElementType::Float64),
            _ => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Int8 => "int8",
            ElementType::UInt8 => "uint8",
            ElementType::Int16 => "int16",
            ElementType::UInt16 => "uint16",
            ElementType::Int32 => "int32",
            ElementType::UInt32 => "uint32",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
        };
        f.write_str(name)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Rust scalar types that can back a [`Column`].
///
/// Implemented for exactly the primitives listed in [`ElementType`].
pub trait ElementNative: sealed::Sealed + ArrowNativeType {
    /// Arrow primitive type whose native representation is `Self`.
    type Arrow: ArrowPrimitiveType<Native = Self>;
    /// Element type tag for `Self`.
    const ELEMENT_TYPE: ElementType;
}

macro_rules! element_native {
    ($($native:ty => $arrow:ty, $tag:ident;)*) => {
        $(
            impl sealed::Sealed for $native {}

            impl ElementNative for $native {
                type Arrow = $arrow;
                const ELEMENT_TYPE: ElementType = ElementType::$tag;
            }
        )*
    };
}

element_native! {
    i8 => Int8Type, Int8;
    u8 => UInt8Type, UInt8;
    i16 => Int16Type, Int16;
    u16 => UInt16Type, UInt16;
    i32 => Int32Type, Int32;
    u32 => UInt32Type, UInt32;
    f32 => Float32Type, Float32;
    f64 => Float64Type, Float64;
}

/// The `(name, element type)` pair that identifies a column when merging.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnIdentity {
    /// Column name.
    pub name: String,
    /// Column element type.
    pub element_type: ElementType,
}

impl fmt::Display for ColumnIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.element_type)
    }
}

/// A named, typed, contiguous column of values.
#[derive(Clone, Debug)]
pub struct Column {
    name: String,
    element_type: ElementType,
    data: ArrayRef,
}

impl Column {
    /// Wrap an Arrow array as a column.
    ///
    /// Fails with [`TableError::UnsupportedType`] unless the array's type is
    /// one of the [`ElementType`] variants.
    pub fn new(name: impl Into<String>, data: ArrayRef) -> TableResult<Self> {
        let name = name.into();
        let element_type = match ElementType::from_data_type(data.data_type()) {
            Some(t) => t,
            None => {
                return UnsupportedTypeSnafu {
                    column: name,
                    data_type: data.data_type().clone(),
                }
                .fail();
            }
        };
        Ok(Self {
            name,
            element_type,
            data,
        })
    }

    /// Build a column from plain values.
    pub fn from_values<T: ElementNative>(name: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            name: name.into(),
            element_type: T::ELEMENT_TYPE,
            data: Arc::new(PrimitiveArray::<T::Arrow>::new(values.into(), None)),
        }
    }

    // Callers guarantee `data` has the Arrow type of `element_type`.
    pub(crate) fn from_parts(name: String, element_type: ElementType, data: ArrayRef) -> Self {
        Self {
            name,
            element_type,
            data,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element type of the stored values.
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Identity used to match this column across tables.
    pub fn identity(&self) -> ColumnIdentity {
        ColumnIdentity {
            name: self.name.clone(),
            element_type: self.element_type,
        }
    }

    /// Whether this column has the given identity.
    pub fn matches(&self, identity: &ColumnIdentity) -> bool {
        self.element_type == identity.element_type && self.name == identity.name
    }

    /// Underlying Arrow array.
    pub fn data(&self) -> &ArrayRef {
        &self.data
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the column holds no values.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the values as a slice if `T` matches the element type.
    pub fn values<T: ElementNative>(&self) -> Option<&[T]> {
        self.data
            .as_primitive_opt::<T::Arrow>()
            .map(|array| array.values().as_ref())
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.element_type == other.element_type
            && self.data.as_ref() == other.data.as_ref()
    }
}

/// Ordered set of equal-length columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<Column>,
}

impl DataTable {
    /// Build a table, checking that every column has the same length.
    pub fn new(columns: Vec<Column>) -> TableResult<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return LengthMismatchSnafu {
                    column: bad.name.clone(),
                    expected,
                    actual: bad.len(),
                }
                .fail();
            }
        }
        Ok(Self { columns })
    }

    // Callers guarantee equal column lengths.
    pub(crate) fn from_columns_unchecked(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Row count; zero for a table without columns.
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Columns in table order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Consume the table, returning its columns.
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// First column with the given name, regardless of element type.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column with exactly the given identity.
    pub fn column_by_identity(&self, identity: &ColumnIdentity) -> Option<&Column> {
        self.columns.iter().find(|c| c.matches(identity))
    }

    /// Whether any column carries `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Column identities in table order.
    pub fn identities(&self) -> impl Iterator<Item = ColumnIdentity> + '_ {
        self.columns.iter().map(Column::identity)
    }

    /// Convert into an Arrow record batch (non-nullable fields).
    ///
    /// The row count is carried explicitly so column-less tables survive.
    pub fn to_record_batch(&self) -> TableResult<RecordBatch> {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(c.name.as_str(), c.element_type.data_type(), false))
            .collect();
        let arrays: Vec<ArrayRef> = self.columns.iter().map(|c| c.data.clone()).collect();
        let options = RecordBatchOptions::new().with_row_count(Some(self.num_rows()));

        RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
            .context(ArrowSnafu)
    }
}

impl TryFrom<RecordBatch> for DataTable {
    type Error = TableError;

    fn try_from(batch: RecordBatch) -> TableResult<Self> {
        let schema = batch.schema();
        let columns = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, array)| Column::new(field.name().as_str(), array.clone()))
            .collect::<TableResult<Vec<_>>>()?;
        // RecordBatch already enforces equal lengths.
        Ok(Self::from_columns_unchecked(columns))
    }
}

/// A named element of a [`FileRecord`].
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Element name, e.g. `"vertex"`.
    pub name: String,
    /// Element data.
    pub table: DataTable,
}

/// Format-neutral in-memory representation of a splat file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileRecord {
    /// Free-form header comments carried by the source format.
    pub comments: Vec<String>,
    /// Elements in file order.
    pub elements: Vec<Element>,
}

impl FileRecord {
    /// A record holding `table` as its only `"vertex"` element.
    pub fn single_vertex(table: DataTable) -> Self {
        Self {
            comments: Vec::new(),
            elements: vec![Element {
                name: VERTEX_ELEMENT.to_string(),
                table,
            }],
        }
    }

    /// Elements named `"vertex"`.
    pub fn vertex_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.name == VERTEX_ELEMENT)
    }
}
