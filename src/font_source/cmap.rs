//! Character to glyph mapping
//!
//! The `cmap` table is kept as its list of sub-tables. Every format that maps
//! single code points to single glyphs (0, 4, 6, 10, 12 and 13) is decoded
//! into a code point → glyph name map the patcher can edit. Formats 2, 8 and
//! 14 are carried through as write-fonts sub-tables with their glyph ids
//! unchanged, which stays valid because existing glyphs never move.

use crate::core::errors::{PatchError, PatchResult};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use write_fonts::from_obj::FromTableRef;
use write_fonts::read::tables::cmap::{Cmap as RawCmap, CmapSubtable as RawSubtable};
use write_fonts::tables::cmap::{
    Cmap as CmapTable, CmapSubtable as Encoded, ConstantMapGroup, EncodingRecord, PlatformId,
    SequentialMapGroup,
};
use write_fonts::types::GlyphId;

/// Sub-table preference for the "best" mapping: full-repertoire Unicode
/// first, then BMP-only Unicode, then older Unicode encodings.
const BEST_CMAP_ORDER: [(u16, u16); 8] = [
    (3, 10),
    (0, 6),
    (0, 4),
    (3, 1),
    (0, 3),
    (0, 2),
    (0, 1),
    (0, 0),
];

/// Largest number of entries a format 6 glyph array can hold.
const FORMAT_6_MAX_ENTRIES: u32 = (u16::MAX as u32 - 10) / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFormat {
    /// Byte encoding table, code points and glyph ids below 256
    Format0,
    /// Segment mapping to delta values, BMP only
    Format4,
    /// Trimmed table mapping, one dense BMP range
    Format6,
    /// Trimmed array, one dense range anywhere in Unicode
    Format10,
    /// Segmented coverage, full Unicode range
    Format12,
    /// Many-to-one range mappings
    Format13,
}

impl MappingFormat {
    /// Whether `codepoint` → `glyph_id` can be added to a sub-table of this
    /// format that already holds `map`.
    fn accepts(self, codepoint: u32, glyph_id: u16, map: &BTreeMap<u32, String>) -> bool {
        match self {
            MappingFormat::Format0 => codepoint < 256 && glyph_id < 256,
            MappingFormat::Format4 => codepoint < 0xFFFF,
            MappingFormat::Format6 => {
                let first = map.keys().next().map_or(codepoint, |&first| first.min(codepoint));
                let last = map.keys().next_back().map_or(codepoint, |&last| last.max(codepoint));
                last <= 0xFFFF && last - first < FORMAT_6_MAX_ENTRIES
            }
            MappingFormat::Format10 | MappingFormat::Format12 | MappingFormat::Format13 => {
                codepoint <= 0x10FFFF
            }
        }
    }
}

/// An editable code point → glyph name sub-table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodepointMap {
    pub format: MappingFormat,
    pub language: u32,
    pub map: BTreeMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtableBody {
    Mapping(CodepointMap),
    Opaque(Encoded),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmapSubtable {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub body: SubtableBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cmap {
    subtables: Vec<CmapSubtable>,
}

impl Cmap {
    pub fn new(subtables: Vec<CmapSubtable>) -> Self {
        Self { subtables }
    }

    /// Decode `cmap`, naming glyphs through `names`.
    pub fn decode(cmap: &RawCmap, names: &[String]) -> PatchResult<Self> {
        let mut subtables = Vec::new();
        for record in cmap.encoding_records() {
            let (platform_id, encoding_id) = (record.platform_id() as u16, record.encoding_id());
            let subtable = record.subtable(cmap.offset_data())?;
            let body = match decode_mapping(&subtable) {
                Some((format, language, pairs)) => SubtableBody::Mapping(CodepointMap {
                    format,
                    language,
                    map: pairs
                        .into_iter()
                        .filter(|&(_, glyph_id)| glyph_id != 0)
                        .filter_map(|(cp, glyph_id)| Some((cp, names.get(glyph_id as usize)?.clone())))
                        .collect(),
                }),
                None => {
                    debug!(platform_id, encoding_id, "Keeping cmap sub-table as is");
                    SubtableBody::Opaque(Encoded::from_table_ref(&subtable))
                }
            };
            subtables.push(CmapSubtable {
                platform_id,
                encoding_id,
                body,
            });
        }
        Ok(Self { subtables })
    }

    pub fn subtables(&self) -> &[CmapSubtable] {
        &self.subtables
    }

    /// The preferred Unicode mapping, if the font has one.
    pub fn best(&self) -> Option<&BTreeMap<u32, String>> {
        BEST_CMAP_ORDER.iter().find_map(|&(platform, encoding)| {
            self.subtables.iter().find_map(|subtable| match &subtable.body {
                SubtableBody::Mapping(mapping)
                    if subtable.platform_id == platform && subtable.encoding_id == encoding =>
                {
                    Some(&mapping.map)
                }
                _ => None,
            })
        })
    }

    /// Point `codepoint` at `glyph_name` (glyph `glyph_id`) in every editable
    /// sub-table that can represent it. Returns how many were updated.
    pub fn set_mapping(&mut self, codepoint: u32, glyph_name: &str, glyph_id: u16) -> usize {
        let mut updated = 0;
        for subtable in &mut self.subtables {
            let SubtableBody::Mapping(mapping) = &mut subtable.body else {
                continue;
            };
            if mapping.format.accepts(codepoint, glyph_id, &mapping.map) {
                mapping.map.insert(codepoint, glyph_name.to_owned());
                updated += 1;
            } else {
                debug!(
                    platform_id = subtable.platform_id,
                    encoding_id = subtable.encoding_id,
                    "U+{codepoint:04X} does not fit a {:?} sub-table",
                    mapping.format
                );
            }
        }
        updated
    }

    /// Compile to a write-fonts table. Identical sub-tables end up sharing
    /// one offset when the table is packed.
    pub fn compile(&self, glyph_ids: &HashMap<&str, u16>) -> PatchResult<CmapTable> {
        let records = self
            .subtables
            .iter()
            .map(|subtable| {
                let encoded = match &subtable.body {
                    SubtableBody::Mapping(mapping) => encode_mapping(mapping, glyph_ids)?,
                    SubtableBody::Opaque(encoded) => encoded.clone(),
                };
                Ok(EncodingRecord::new(
                    PlatformId::new(subtable.platform_id),
                    subtable.encoding_id,
                    encoded,
                ))
            })
            .collect::<PatchResult<Vec<_>>>()?;
        Ok(CmapTable::new(records))
    }
}

/// `(format, language, (code point, glyph id) pairs)` for editable formats.
fn decode_mapping(subtable: &RawSubtable) -> Option<(MappingFormat, u32, Vec<(u32, u32)>)> {
    let decoded = match subtable {
        RawSubtable::Format0(sub) => (
            MappingFormat::Format0,
            sub.language() as u32,
            sub.glyph_id_array()
                .iter()
                .enumerate()
                .map(|(cp, &glyph_id)| (cp as u32, glyph_id as u32))
                .collect(),
        ),
        RawSubtable::Format4(sub) => (
            MappingFormat::Format4,
            sub.language() as u32,
            sub.iter().map(|(cp, glyph_id)| (cp, glyph_id.to_u32())).collect(),
        ),
        RawSubtable::Format6(sub) => (
            MappingFormat::Format6,
            sub.language() as u32,
            dense_range(sub.first_code() as u32, sub.glyph_id_array().iter().map(|id| id.get())),
        ),
        RawSubtable::Format10(sub) => (
            MappingFormat::Format10,
            sub.language(),
            dense_range(sub.start_char_code(), sub.glyph_id_array().iter().map(|id| id.get())),
        ),
        RawSubtable::Format12(sub) => (
            MappingFormat::Format12,
            sub.language(),
            sub.iter().map(|(cp, glyph_id)| (cp, glyph_id.to_u32())).collect(),
        ),
        RawSubtable::Format13(sub) => (
            MappingFormat::Format13,
            sub.language(),
            sub.groups()
                .iter()
                .flat_map(|group| {
                    (group.start_char_code()..=group.end_char_code())
                        .map(move |cp| (cp, group.glyph_id()))
                })
                .collect(),
        ),
        _ => return None,
    };
    Some(decoded)
}

fn dense_range(first: u32, glyph_ids: impl Iterator<Item = u16>) -> Vec<(u32, u32)> {
    glyph_ids
        .enumerate()
        .map(|(offset, glyph_id)| (first + offset as u32, glyph_id as u32))
        .collect()
}

/// Resolve names to glyph ids, dropping entries the format cannot hold.
fn resolve(mapping: &CodepointMap, glyph_ids: &HashMap<&str, u16>) -> PatchResult<Vec<(u32, u16)>> {
    let mut entries = Vec::with_capacity(mapping.map.len());
    for (&codepoint, name) in &mapping.map {
        let glyph_id = glyph_ids.get(name.as_str()).copied().ok_or_else(|| {
            PatchError::malformed(
                "cmap",
                format!("U+{codepoint:04X} maps to '{name}', which is not in the glyph order"),
            )
        })?;
        if mapping.format.accepts(codepoint, glyph_id, &BTreeMap::new()) {
            entries.push((codepoint, glyph_id));
        }
    }
    Ok(entries)
}

fn encode_mapping(mapping: &CodepointMap, glyph_ids: &HashMap<&str, u16>) -> PatchResult<Encoded> {
    let entries = resolve(mapping, glyph_ids)?;
    let language = mapping.language;
    match mapping.format {
        MappingFormat::Format0 => {
            let mut glyph_id_array = vec![0u8; 256];
            for (codepoint, glyph_id) in entries {
                glyph_id_array[codepoint as usize] = glyph_id as u8;
            }
            Ok(Encoded::format_0(language as u16, glyph_id_array))
        }
        MappingFormat::Format4 => encode_format4(&entries, language as u16),
        MappingFormat::Format6 => {
            let (first, glyph_id_array) = dense_array(&entries);
            let length = 10 + 2 * glyph_id_array.len();
            let (Ok(length), Ok(entry_count)) =
                (u16::try_from(length), u16::try_from(glyph_id_array.len()))
            else {
                return Err(PatchError::CmapOverflow { format: 6, length });
            };
            Ok(Encoded::format_6(
                length,
                language as u16,
                first as u16,
                entry_count,
                glyph_id_array,
            ))
        }
        MappingFormat::Format10 => {
            let (first, glyph_id_array) = dense_array(&entries);
            Ok(Encoded::format_10(
                20 + 2 * glyph_id_array.len() as u32,
                language,
                first,
                glyph_id_array.len() as u32,
                glyph_id_array,
            ))
        }
        MappingFormat::Format12 => {
            let groups = sequential_groups(&entries);
            Ok(Encoded::format_12(
                16 + 12 * groups.len() as u32,
                language,
                groups.len() as u32,
                groups,
            ))
        }
        MappingFormat::Format13 => {
            let groups = constant_groups(&entries);
            Ok(Encoded::format_13(
                16 + 12 * groups.len() as u32,
                language,
                groups.len() as u32,
                groups,
            ))
        }
    }
}

/// Format 4 from write-fonts' own segment builder, with the language field
/// carried over. An empty map still needs the closing 0xFFFF segment.
fn encode_format4(entries: &[(u32, u16)], language: u16) -> PatchResult<Encoded> {
    let chars = entries.iter().filter_map(|&(codepoint, glyph_id)| {
        Some((char::from_u32(codepoint)?, GlyphId::from(glyph_id)))
    });
    let built = CmapTable::from_mappings(chars)
        .map_err(|conflict| PatchError::malformed("cmap", conflict.to_string()))?;
    let Some(record) = built.encoding_records.into_iter().next() else {
        return Ok(Encoded::format_4(
            24,
            language,
            2,
            2,
            0,
            0,
            vec![0xFFFF],
            vec![0xFFFF],
            vec![1],
            vec![0],
            Vec::new(),
        ));
    };
    match record.subtable.into_inner() {
        Encoded::Format4(mut format4) => {
            format4.language = language;
            Ok(Encoded::Format4(format4))
        }
        _ => Err(PatchError::malformed("cmap", "expected a format 4 sub-table")),
    }
}

/// First code point and the glyph ids of the whole range up to the last
/// one, with 0 filling the gaps.
fn dense_array(entries: &[(u32, u16)]) -> (u32, Vec<u16>) {
    let (Some(&(first, _)), Some(&(last, _))) = (entries.first(), entries.last()) else {
        return (0, Vec::new());
    };
    let mut glyph_id_array = vec![0u16; (last - first) as usize + 1];
    for &(codepoint, glyph_id) in entries {
        glyph_id_array[(codepoint - first) as usize] = glyph_id;
    }
    (first, glyph_id_array)
}

/// Runs where both the code point and the glyph id go up by one.
fn sequential_groups(entries: &[(u32, u16)]) -> Vec<SequentialMapGroup> {
    let mut groups: Vec<(u32, u32, u32)> = Vec::new();
    for &(codepoint, glyph_id) in entries {
        let glyph_id = glyph_id as u32;
        match groups.last_mut() {
            Some((start, end, start_glyph))
                if *end + 1 == codepoint && *start_glyph + (codepoint - *start) == glyph_id =>
            {
                *end = codepoint;
            }
            _ => groups.push((codepoint, codepoint, glyph_id)),
        }
    }
    groups
        .into_iter()
        .map(|(start, end, glyph_id)| SequentialMapGroup::new(start, end, glyph_id))
        .collect()
}

/// Runs of consecutive code points that share one glyph.
fn constant_groups(entries: &[(u32, u16)]) -> Vec<ConstantMapGroup> {
    let mut groups: Vec<(u32, u32, u32)> = Vec::new();
    for &(codepoint, glyph_id) in entries {
        let glyph_id = glyph_id as u32;
        match groups.last_mut() {
            Some((_, end, group_glyph)) if *end + 1 == codepoint && *group_glyph == glyph_id => {
                *end = codepoint;
            }
            _ => groups.push((codepoint, codepoint, glyph_id)),
        }
    }
    groups
        .into_iter()
        .map(|(start, end, glyph_id)| ConstantMapGroup::new(start, end, glyph_id))
        .collect()
}
