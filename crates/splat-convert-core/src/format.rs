//! File name to codec-kind resolution.
//!
//! Resolution is purely suffix based and case-insensitive. Several suffixes
//! overlap (`x.compressed.ply` also ends with `.ply`, `x.lod-meta.json` also
//! ends with `meta.json`), so instead of testing suffixes in a fixed order
//! the rule tables are resolved by **longest matching suffix**. The outcome
//! is the same as checking the more specific suffix first, but it does not
//! depend on where a rule sits in its table.

use std::{fmt, path::Path};

use snafu::OptionExt;

use crate::error::{ConvertResult, Direction, UnsupportedFormatSnafu};

/// Kind of reader used for an input file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Procedural generator module (`.mjs`); no file is opened.
    Generator,
    /// `.ksplat`
    Ksplat,
    /// `.splat`
    Splat,
    /// `.sog` bundle or unbundled `meta.json`.
    Sog,
    /// `.ply`; plain vs compressed is decided from the parsed content.
    Ply,
    /// `.spz`
    Spz,
}

impl InputKind {
    /// Whether reading this kind involves opening the input path.
    pub fn opens_file(self) -> bool {
        self != InputKind::Generator
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputKind::Generator => "generator",
            InputKind::Ksplat => "ksplat",
            InputKind::Splat => "splat",
            InputKind::Sog => "sog",
            InputKind::Ply => "ply",
            InputKind::Spz => "spz",
        })
    }
}

/// Kind of writer used for an output file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// `.csv`
    Csv,
    /// `lod-meta.json` (level-of-detail chunk set).
    Lod,
    /// `.sog` bundle or unbundled `meta.json`.
    Sog,
    /// `.compressed.ply`
    CompressedPly,
    /// `.ply`
    Ply,
    /// `.html` viewer page.
    Html,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputKind::Csv => "csv",
            OutputKind::Lod => "lod",
            OutputKind::Sog => "sog",
            OutputKind::CompressedPly => "compressed-ply",
            OutputKind::Ply => "ply",
            OutputKind::Html => "html",
        })
    }
}

/// Encoding of a parsed `.ply` input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlyEncoding {
    /// Uncompressed per-splat properties.
    Plain,
    /// Chunk-quantized compressed layout.
    Compressed,
}

/// One `(suffix, kind)` entry of a resolution table. Suffixes are lowercase.
#[derive(Clone, Copy, Debug)]
pub struct SuffixRule<K> {
    /// Lowercase suffix the file name must end with.
    pub suffix: &'static str,
    /// Kind selected when the rule wins.
    pub kind: K,
}

const fn rule<K>(suffix: &'static str, kind: K) -> SuffixRule<K> {
    SuffixRule { suffix, kind }
}

/// Input resolution table.
pub const INPUT_RULES: &[SuffixRule<InputKind>] = &[
    rule(".mjs", InputKind::Generator),
    rule(".ksplat", InputKind::Ksplat),
    rule(".splat", InputKind::Splat),
    rule(".sog", InputKind::Sog),
    rule("meta.json", InputKind::Sog),
    rule(".ply", InputKind::Ply),
    rule(".spz", InputKind::Spz),
];

/// Output resolution table.
pub const OUTPUT_RULES: &[SuffixRule<OutputKind>] = &[
    rule(".csv", OutputKind::Csv),
    rule("lod-meta.json", OutputKind::Lod),
    rule(".sog", OutputKind::Sog),
    rule("meta.json", OutputKind::Sog),
    rule(".compressed.ply", OutputKind::CompressedPly),
    rule(".ply", OutputKind::Ply),
    rule(".html", OutputKind::Html),
];

/// Resolve `file_name` against `rules`, picking the longest matching suffix.
///
/// Two distinct suffixes of equal length cannot both end the same name, so
/// the winner is unique.
pub fn resolve_with<K: Copy>(rules: &[SuffixRule<K>], file_name: &str) -> Option<K> {
    let lower = file_name.to_lowercase();
    rules
        .iter()
        .filter(|r| lower.ends_with(r.suffix))
        .max_by_key(|r| r.suffix.len())
        .map(|r| r.kind)
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Resolve the reader kind for `path`.
pub fn resolve_input_kind(path: &Path) -> ConvertResult<InputKind> {
    file_name_of(path)
        .and_then(|name| resolve_with(INPUT_RULES, &name))
        .context(UnsupportedFormatSnafu {
            path: path.display().to_string(),
            direction: Direction::Input,
        })
}

/// Resolve the writer kind for `path`.
pub fn resolve_output_kind(path: &Path) -> ConvertResult<OutputKind> {
    file_name_of(path)
        .and_then(|name| resolve_with(OUTPUT_RULES, &name))
        .context(UnsupportedFormatSnafu {
            path: path.display().to_string(),
            direction: Direction::Output,
        })
}
