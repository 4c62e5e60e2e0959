use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use arrow::ipc::{reader::StreamReader, writer::StreamWriter};

use crate::{
    codec::{CodecResult, FormatReader, FormatWriter, ReadContext, ReadSeek, WriteContext},
    data::{Column, DataTable, FileRecord},
    schema::SPLAT_COLUMNS,
};

pub(crate) type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// `rows` rows of every splat column as float32; values differ per column
/// and per row.
pub(crate) fn splat_table(rows: usize) -> DataTable {
    table_with_columns(&SPLAT_COLUMNS, rows)
}

/// Float32 table with the given column names.
pub(crate) fn table_with_columns(names: &[&str], rows: usize) -> DataTable {
    let columns = names
        .iter()
        .enumerate()
        .map(|(c, name)| {
            let values = (0..rows).map(|r| (c * 1000 + r) as f32 * 0.5).collect();
            Column::from_values(*name, values)
        })
        .collect();
    DataTable::new(columns).expect("columns have equal length")
}

/// Float32 values of the first column called `name`.
pub(crate) fn f32_values(table: &DataTable, name: &str) -> Vec<f32> {
    table
        .column(name)
        .and_then(|c| c.values::<f32>())
        .map(<[f32]>::to_vec)
        .unwrap_or_else(|| panic!("no float32 column {name}"))
}

/// Stand-in codec: the vertex table as a single Arrow IPC stream batch.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct IpcCodec;

impl FormatReader for IpcCodec {
    fn read(&self, input: &mut dyn ReadSeek, _ctx: &ReadContext) -> CodecResult<FileRecord> {
        let mut reader = StreamReader::try_new(input, None)?;
        let table = match reader.next() {
            Some(batch) => DataTable::try_from(batch?)?,
            None => DataTable::empty(),
        };
        Ok(FileRecord::single_vertex(table))
    }
}

impl FormatWriter for IpcCodec {
    fn write(
        &self,
        output: &mut dyn Write,
        table: &DataTable,
        _ctx: &WriteContext<'_>,
    ) -> CodecResult<()> {
        let batch = table.to_record_batch()?;
        let mut writer = StreamWriter::try_new(output, &batch.schema())?;
        writer.write(&batch)?;
        writer.finish()?;
        Ok(())
    }
}

/// Writes a few bytes, then fails.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FailingWriter;

impl FormatWriter for FailingWriter {
    fn write(
        &self,
        output: &mut dyn Write,
        _table: &DataTable,
        _ctx: &WriteContext<'_>,
    ) -> CodecResult<()> {
        output.write_all(b"partial")?;
        Err("simulated writer failure".into())
    }
}

/// Panics mid-write.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct PanickingWriter;

impl FormatWriter for PanickingWriter {
    fn write(
        &self,
        output: &mut dyn Write,
        _table: &DataTable,
        _ctx: &WriteContext<'_>,
    ) -> CodecResult<()> {
        output.write_all(b"partial")?;
        panic!("simulated writer panic");
    }
}

pub(crate) fn write_ipc_table(path: &Path, table: &DataTable) -> TestResult {
    let batch = table.to_record_batch()?;
    let mut out = BufWriter::new(File::create(path)?);
    let mut writer = StreamWriter::try_new(&mut out, &batch.schema())?;
    writer.write(&batch)?;
    writer.finish()?;
    drop(writer);
    out.flush()?;
    Ok(())
}

pub(crate) fn read_ipc_table(path: &Path) -> TestResult<DataTable> {
    let mut reader = StreamReader::try_new(BufReader::new(File::open(path)?), None)?;
    match reader.next() {
        Some(batch) => Ok(DataTable::try_from(batch?)?),
        None => Ok(DataTable::empty()),
    }
}
