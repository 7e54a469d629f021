//! Post-save verification
//!
//! The saved font is read again from disk and checked with read-fonts' own
//! cmap lookup, independent of the cmap model used to write it.

use crate::core::errors::PatchResult;
use write_fonts::read::{FontRef, TableProvider};
use std::fmt;
use std::fs;
use std::path::Path;

/// Code points reported after saving: `(code point, symbol, label)`.
/// The sharp sign is not transferred and is only reported.
pub const VERIFY_CHECKLIST: [(u32, char, &str); 3] = [
    (0x266D, '♭', "flat"),
    (0x266E, '♮', "natural"),
    (0x266F, '♯', "sharp"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyLine {
    pub codepoint: u32,
    pub symbol: char,
    pub label: &'static str,
    pub present: bool,
}

impl fmt::Display for VerifyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.present { '✓' } else { '✗' };
        write!(
            f,
            "U+{:04X} ({}) {}: {mark}",
            self.codepoint, self.symbol, self.label
        )
    }
}

/// Reload `path` and report which checklist code points it maps.
pub fn verify(path: &Path) -> PatchResult<Vec<VerifyLine>> {
    let data = fs::read(path)?;
    let font = FontRef::new(&data)?;
    let cmap = font.cmap()?;
    Ok(VERIFY_CHECKLIST
        .iter()
        .map(|&(codepoint, symbol, label)| VerifyLine {
            codepoint,
            symbol,
            label,
            present: cmap
                .map_codepoint(codepoint)
                .is_some_and(|glyph_id| glyph_id.to_u32() != 0),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::testing::{triangle, TestFont};

    #[test]
    fn reports_each_checklist_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        TestFont::new()
            .glyph("uni266D", triangle(0, 0, 400, 700), 450, 0)
            .map(0x266D, "uni266D")
            .write(&path);

        let lines = verify(&path).unwrap();
        let present: Vec<bool> = lines.iter().map(|line| line.present).collect();
        assert_eq!(present, [true, false, false]);
        assert_eq!(lines[0].to_string(), "U+266D (♭) flat: ✓");
        assert_eq!(lines[2].to_string(), "U+266F (♯) sharp: ✗");
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        fs::write(&path, b"truncated").unwrap();
        assert!(verify(&path).is_err());
    }
}
