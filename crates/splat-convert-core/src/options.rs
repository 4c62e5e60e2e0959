//! Conversion options.
//!
//! Options are plain serde structs so callers can load them from JSON (or
//! any other serde format) and pass them through unchanged. Every field has
//! a default; an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::combine::FillPolicy;

/// Errors raised while loading options.
#[derive(Debug, Snafu)]
pub enum OptionsError {
    /// The JSON document could not be parsed into options.
    #[snafu(display("Failed to parse conversion options: {source}"))]
    Parse {
        /// Underlying serde_json error.
        source: serde_json::Error,
    },
}

/// Compute device preference forwarded to the sog and lod writers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeDevice {
    /// Run on the CPU.
    Cpu,
    /// Run on a GPU; `adapter` selects one by index, `None` picks the default.
    Gpu {
        /// Adapter index.
        #[serde(default)]
        adapter: Option<usize>,
    },
}

impl Default for ComputeDevice {
    fn default() -> Self {
        ComputeDevice::Gpu { adapter: None }
    }
}

/// Options consumed by the commit writer and forwarded to format writers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Accepted for compatibility. The commit rename always replaces an
    /// existing destination; `false` only produces a warning.
    pub overwrite: bool,
    /// Iteration count for writers that run an optimization (sog, lod).
    pub iterations: u32,
    /// Compute device for writers that can use one (sog, lod).
    pub device: ComputeDevice,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            iterations: 10,
            device: ComputeDevice::default(),
        }
    }
}

/// Top-level options for a conversion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Output options.
    pub write: WriteOptions,
    /// How columns missing from some sources are filled when merging.
    pub fill_policy: FillPolicy,
}

impl ConvertOptions {
    /// Parse options from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, OptionsError> {
        serde_json::from_str(json).context(ParseSnafu)
    }
}
