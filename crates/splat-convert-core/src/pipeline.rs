//! The conversion pipeline.
//!
//! A conversion moves linearly through
//! `Reading → Validating → Processing → Combining → Processing → Writing`
//! and ends either in a [`ConvertReport`] or a [`ConvertError`]. There are no
//! retries; the first failure ends the conversion and is returned as a value.
//!
//! Each source is read, validated and processed on its own, so a processor
//! can normalize sources individually. The merged table is then processed
//! once more, which is where transforms that need the full set run.

pub mod read;
pub mod validate;

use std::{
    fmt,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use snafu::prelude::*;

use crate::{
    codec::{CodecRegistry, ProcessStage, catch_collaborator},
    combine::combine_with_policy,
    commit::write_file,
    data::DataTable,
    error::{
        CodecSnafu, CombineSnafu, ConvertError, ConvertResult, EmptyResultSnafu, NoInputsSnafu,
    },
    format::OutputKind,
    options::ConvertOptions,
};

pub use read::read_file;
pub use validate::vertex_table;

/// Stage of a conversion, used in logs and error reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Resolving and parsing a source.
    Reading,
    /// Checking a source's vertex table.
    Validating,
    /// Running the row-level processor.
    Processing,
    /// Merging sources.
    Combining,
    /// Committing the output.
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Reading => "reading",
            Stage::Validating => "validating",
            Stage::Processing => "processing",
            Stage::Combining => "combining",
            Stage::Writing => "writing",
        })
    }
}

/// Summary of a successful conversion.
#[derive(Clone, Debug)]
pub struct ConvertReport {
    /// Sources in the order they were merged.
    pub inputs: Vec<PathBuf>,
    /// Committed destination.
    pub output: PathBuf,
    /// Writer kind used for the destination.
    pub output_kind: OutputKind,
    /// The table that was written.
    pub table: DataTable,
}

/// Outcome of a conversion. Callers branch on the variant.
pub type ConvertOutcome = Result<ConvertReport, ConvertError>;

/// Runs conversions with a fixed set of collaborators and options.
#[derive(Clone, Debug, Default)]
pub struct Converter {
    codecs: CodecRegistry,
    options: ConvertOptions,
}

impl Converter {
    /// Converter with default options.
    pub fn new(codecs: CodecRegistry) -> Self {
        Self {
            codecs,
            options: ConvertOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// Registered collaborators.
    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Active options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a single source into `output`.
    pub async fn convert(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> ConvertOutcome {
        self.convert_many(&[input.as_ref()], output).await
    }

    /// Merge several sources into `output`.
    ///
    /// Sources are merged in the given order; see [`crate::combine`] for how
    /// columns that only some sources carry are filled.
    pub async fn convert_many<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        output: impl AsRef<Path>,
    ) -> ConvertOutcome {
        let output = output.as_ref();
        match self.run(inputs, output).await {
            Ok(report) => {
                info!(
                    "Wrote {} splats ({} columns) to {} as {}",
                    report.table.num_rows(),
                    report.table.num_columns(),
                    output.display(),
                    report.output_kind
                );
                Ok(report)
            }
            Err(e) => {
                warn!("Conversion to {} failed: {e}", output.display());
                Err(e)
            }
        }
    }

    async fn run<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        output: &Path,
    ) -> ConvertResult<ConvertReport> {
        ensure!(!inputs.is_empty(), NoInputsSnafu);

        let mut sources = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.iter().enumerate() {
            let path = input.as_ref();

            debug!("[{}] {}", Stage::Reading, path.display());
            let record = read_file(path, &self.codecs).await?;

            debug!("[{}] {}", Stage::Validating, path.display());
            let table = vertex_table(record, path)?;

            debug!(
                "[{}] {} ({} rows)",
                Stage::Processing,
                path.display(),
                table.num_rows()
            );
            let table = self.process(table, ProcessStage::Source { index, path }, path)?;
            sources.push(table);
        }

        debug!("[{}] {} sources", Stage::Combining, sources.len());
        let merged =
            combine_with_policy(sources, &self.options.fill_policy).context(CombineSnafu)?;

        debug!("[{}] merged ({} rows)", Stage::Processing, merged.num_rows());
        let table = self.process(merged, ProcessStage::Merged, output)?;

        ensure!(table.num_rows() > 0, EmptyResultSnafu);

        debug!("[{}] {}", Stage::Writing, output.display());
        let output_kind = write_file(output, &table, &self.options.write, &self.codecs).await?;

        Ok(ConvertReport {
            inputs: inputs.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            output: output.to_path_buf(),
            output_kind,
            table,
        })
    }

    fn process(
        &self,
        table: DataTable,
        stage: ProcessStage<'_>,
        path: &Path,
    ) -> ConvertResult<DataTable> {
        let processor = self.codecs.processor();
        catch_collaborator(|| processor.process(table, stage)).context(CodecSnafu {
            stage: Stage::Processing,
            path: path.display().to_string(),
        })
    }
}
