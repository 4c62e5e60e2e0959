#![allow(dead_code)]

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use arrow::ipc::{reader::StreamReader, writer::StreamWriter};
use splat_convert_core::{
    codec::{
        CodecResult, FormatReader, FormatWriter, PlyDecompressor, ReadContext, ReadSeek,
        SplatGenerator, WriteContext,
    },
    data::{Column, DataTable, Element, FileRecord},
    schema::SPLAT_COLUMNS,
};

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Float32 table with the given column names; `value(c, r)` fills column
/// `c`, row `r`.
pub fn table_from_fn(
    names: &[&str],
    rows: usize,
    value: impl Fn(usize, usize) -> f32,
) -> DataTable {
    let columns = names
        .iter()
        .enumerate()
        .map(|(c, name)| Column::from_values(*name, (0..rows).map(|r| value(c, r)).collect()))
        .collect();
    DataTable::new(columns).expect("columns have equal length")
}

pub fn splat_table(rows: usize) -> DataTable {
    table_from_fn(&SPLAT_COLUMNS, rows, |c, r| c as f32 + r as f32 / 100.0)
}

pub fn f32_values(table: &DataTable, name: &str) -> Vec<f32> {
    table
        .column(name)
        .and_then(|c| c.values::<f32>())
        .map(<[f32]>::to_vec)
        .unwrap_or_else(|| panic!("no float32 column {name}"))
}

/// Arrow IPC stream standing in for a real splat encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct IpcCodec;

impl FormatReader for IpcCodec {
    fn read(&self, input: &mut dyn ReadSeek, _ctx: &ReadContext) -> CodecResult<FileRecord> {
        let mut reader = StreamReader::try_new(input, None)?;
        let table = match reader.next() {
            Some(batch) => DataTable::try_from(batch?)?,
            None => DataTable::empty(),
        };
        Ok(FileRecord {
            comments: vec!["written by IpcCodec".to_string()],
            elements: vec![Element {
                name: "vertex".to_string(),
                table,
            }],
        })
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

/// Generates `rows` splats without touching the filesystem.
#[derive(Clone, Copy, Debug)]
pub struct GridGenerator {
    pub rows: usize,
}

impl SplatGenerator for GridGenerator {
    fn generate(&self, _ctx: &ReadContext) -> CodecResult<FileRecord> {
        Ok(FileRecord::single_vertex(splat_table(self.rows)))
    }
}

/// Treats a `packed_position` column as the compressed layout and expands
/// each packed row into a full splat row.
#[derive(Clone, Copy, Debug, Default)]
pub struct PackedDecompressor;

impl PlyDecompressor for PackedDecompressor {
    fn is_compressed(&self, record: &FileRecord) -> bool {
        record
            .vertex_elements()
            .any(|e| e.table.has_column("packed_position"))
    }

    fn decompress(&self, record: &FileRecord) -> CodecResult<DataTable> {
        let packed = record
            .vertex_elements()
            .next()
            .and_then(|e| e.table.column("packed_position"))
            .and_then(|c| c.values::<f32>())
            .ok_or("compressed record has no packed_position column")?
            .to_vec();
        Ok(table_from_fn(&SPLAT_COLUMNS, packed.len(), |_, r| packed[r]))
    }
}

pub fn write_ipc(path: &Path, table: &DataTable) -> TestResult {
    let batch = table.to_record_batch()?;
    let mut out = BufWriter::new(File::create(path)?);
    {
        let mut writer = StreamWriter::try_new(&mut out, &batch.schema())?;
        writer.write(&batch)?;
        writer.finish()?;
    }
    out.flush()?;
    Ok(())
}

pub fn read_ipc(path: &Path) -> TestResult<DataTable> {
    let mut reader = StreamReader::try_new(BufReader::new(File::open(path)?), None)?;
    let batch = reader.next().ok_or("empty stream")??;
    Ok(DataTable::try_from(batch)?)
}

pub fn dir_entries(dir: &Path) -> TestResult<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}
