//! Error taxonomy for the patcher
//!
//! `MissingFile` is the only expected fatal error. `GlyphNotFound` is
//! reported by the transfer step and downgraded to a warning by the runner.
//! Everything else comes from reading or compiling the font tables.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use write_fonts::read::ReadError;
use write_fonts::BuilderError;

/// Which of the two input fonts an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    /// The font being patched (Segoe UI)
    Destination,
    /// The font supplying glyphs (Segoe UI Symbol)
    Donor,
}

impl fmt::Display for FontRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontRole::Destination => f.write_str("Segoe UI"),
            FontRole::Donor => f.write_str("Segoe UI Symbol"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("{role} not found: {}", path.display())]
    MissingFile { role: FontRole, path: PathBuf },

    #[error("U+{codepoint:04X} is not mapped in the donor font")]
    GlyphNotFound { codepoint: u32 },

    #[error("{} has no glyf/loca tables, only TrueType outlines can be patched", path.display())]
    NotTrueType { path: PathBuf },

    #[error("required '{tag}' table is missing")]
    MissingTable { tag: &'static str },

    #[error("malformed '{tag}' table: {reason}")]
    Malformed { tag: &'static str, reason: String },

    #[error("font would have {count} glyphs, a TrueType font can address at most 65535")]
    TooManyGlyphs { count: usize },

    #[error("cmap format {format} sub-table would be {length} bytes, over the 65535 byte limit")]
    CmapOverflow { format: u16, length: usize },

    #[error("failed to parse font: {0}")]
    Read(#[from] ReadError),

    #[error("failed to write font: {0}")]
    Build(#[from] BuilderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PatchError {
    pub fn malformed(tag: &'static str, reason: impl Into<String>) -> Self {
        PatchError::Malformed {
            tag,
            reason: reason.into(),
        }
    }
}

pub type PatchResult<T> = Result<T, PatchError>;
