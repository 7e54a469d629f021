//! Synthetic TrueType fonts for tests
//!
//! Fonts are compiled straight from write-fonts tables rather than through
//! `FontResource`, so loading one exercises the reader against files the
//! patcher did not write. The table layouts can be varied to cover what
//! real fonts ship: `post` version 1.0 names, long `loca` offsets, compacted
//! `hmtx` and format 4 segments that index a glyph id array.

use super::glyf::Outline;
use kurbo::BezPath;
use std::path::Path;
use write_fonts::tables::cmap::{
    Cmap, CmapSubtable, EncodingRecord, PlatformId, SequentialMapGroup,
};
use write_fonts::tables::glyf::{
    Anchor, Bbox, Component, ComponentFlags, CompositeGlyph, GlyfLocaBuilder, SimpleGlyph,
    Transform,
};
use write_fonts::tables::head::Head;
use write_fonts::tables::hhea::Hhea;
use write_fonts::tables::hmtx::{Hmtx, LongMetric};
use write_fonts::tables::loca::LocaFormat;
use write_fonts::tables::maxp::Maxp;
use write_fonts::tables::post::Post;
use write_fonts::types::{FWord, Fixed, GlyphId, GlyphId16, Tag};
use write_fonts::FontBuilder;

/// A single-contour triangle spanning the given bounds.
pub fn triangle(x_min: i16, y_min: i16, x_max: i16, y_max: i16) -> Outline {
    let x_mid = x_min + (x_max - x_min) / 2;
    let mut path = BezPath::new();
    path.move_to((x_min as f64, y_min as f64));
    path.line_to((x_max as f64, y_min as f64));
    path.line_to((x_mid as f64, y_max as f64));
    path.close_path();
    Outline::Simple(SimpleGlyph::from_bezpath(&path).expect("triangle is a valid path"))
}

/// A composite glyph placing `(glyph id, dx, dy)` components.
pub fn composite_glyph(components: &[(u16, i16, i16)]) -> Outline {
    let bbox = Bbox {
        x_min: 0,
        y_min: 0,
        x_max: 600,
        y_max: 700,
    };
    let mut parts = components.iter().map(|&(glyph_id, x, y)| {
        Component::new(
            GlyphId16::new(glyph_id),
            Anchor::Offset { x, y },
            Transform::default(),
            ComponentFlags::default(),
        )
    });
    let mut glyph = CompositeGlyph::new(parts.next().expect("at least one component"), bbox);
    for part in parts {
        glyph.add_component(part, bbox);
    }
    Outline::Composite(glyph)
}

/// Builder for small test fonts. Glyph 0 is always an empty `.notdef`.
///
/// The cmap always has a delta-coded format 4 under (0, 3), an empty
/// format 14 under (0, 5), a format 4 indexing a glyph id array under
/// (3, 1) and a format 12 under (3, 10). A Macintosh format 6 sub-table
/// under (1, 0) is added with [`TestFont::mac_roman_table`].
#[derive(Debug, Clone)]
pub struct TestFont {
    glyphs: Vec<(String, Outline, u16, i16)>,
    mappings: Vec<(u32, u16)>,
    extra_tables: Vec<(Tag, Vec<u8>)>,
    max_points: u16,
    long_loca: bool,
    standard_names: bool,
    compact_hmtx: bool,
    mac_roman_table: bool,
}

impl Default for TestFont {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFont {
    pub fn new() -> Self {
        Self {
            glyphs: vec![(".notdef".to_string(), Outline::Empty, 500, 0)],
            mappings: Vec::new(),
            extra_tables: Vec::new(),
            max_points: 3,
            long_loca: false,
            standard_names: false,
            compact_hmtx: false,
            mac_roman_table: false,
        }
    }

    pub fn glyph(mut self, name: &str, outline: Outline, advance: u16, side_bearing: i16) -> Self {
        self.glyphs
            .push((name.to_string(), outline, advance, side_bearing));
        self
    }

    /// Map `codepoint` to the glyph called `name`.
    pub fn map(mut self, codepoint: u32, name: &str) -> Self {
        let glyph_id = self
            .glyphs
            .iter()
            .position(|(glyph, ..)| glyph == name)
            .expect("map a glyph that was added");
        self.mappings.push((codepoint, glyph_id as u16));
        self
    }

    pub fn table(mut self, tag: &[u8; 4], data: Vec<u8>) -> Self {
        self.extra_tables.push((Tag::new(tag), data));
        self
    }

    pub fn max_points(mut self, max_points: u16) -> Self {
        self.max_points = max_points;
        self
    }

    /// Write 32-bit `loca` offsets even though short ones would fit.
    pub fn long_loca(mut self) -> Self {
        self.long_loca = true;
        self
    }

    /// Write a version 1.0 `post`. Glyph names are then implied by the
    /// standard Macintosh order, whatever was passed to [`TestFont::glyph`].
    pub fn standard_names(mut self) -> Self {
        self.standard_names = true;
        self
    }

    /// Drop the advance of trailing glyphs that share the last advance.
    pub fn compact_hmtx(mut self) -> Self {
        self.compact_hmtx = true;
        self
    }

    /// Add a format 6 sub-table under (1, 0) for mappings below U+0100.
    pub fn mac_roman_table(mut self) -> Self {
        self.mac_roman_table = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut glyf_loca = GlyfLocaBuilder::new();
        for (_, outline, ..) in &self.glyphs {
            glyf_loca.add_glyph(outline).expect("test glyph compiles");
        }
        let (glyf, loca, loca_format) = glyf_loca.build();

        let bounds = self
            .glyphs
            .iter()
            .filter_map(|(_, outline, ..)| outline.bbox())
            .reduce(Bbox::union)
            .unwrap_or_default();
        let head = Head {
            font_revision: Fixed::ONE,
            units_per_em: 1000,
            lowest_rec_ppem: 8,
            x_min: bounds.x_min,
            y_min: bounds.y_min,
            x_max: bounds.x_max,
            y_max: bounds.y_max,
            index_to_loc_format: if self.long_loca { 1 } else { loca_format as i16 },
            ..Default::default()
        };

        let (hmtx, number_of_long_metrics) = self.hmtx();
        let hhea = Hhea {
            ascender: FWord::new(800),
            descender: FWord::new(-200),
            number_of_long_metrics,
            ..Default::default()
        };

        let mut builder = FontBuilder::new();
        builder
            .add_table(&head)
            .and_then(|builder| builder.add_table(&hhea))
            .and_then(|builder| builder.add_table(&self.maxp()))
            .and_then(|builder| builder.add_table(&self.post()))
            .and_then(|builder| builder.add_table(&glyf))
            .and_then(|builder| builder.add_table(&hmtx))
            .and_then(|builder| builder.add_table(&self.cmap()))
            .expect("test tables compile");
        let loca_bytes = write_fonts::dump_table(&loca).expect("loca compiles");
        if self.long_loca && loca_format == LocaFormat::Short {
            builder.add_raw(Tag::new(b"loca"), widen_loca(&loca_bytes));
        } else {
            builder.add_raw(Tag::new(b"loca"), loca_bytes);
        }
        for (tag, data) in &self.extra_tables {
            builder.add_raw(*tag, data.clone());
        }
        builder.build()
    }

    pub fn write(&self, path: &Path) {
        std::fs::write(path, self.build()).expect("write test font");
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.glyphs.iter().map(|(name, ..)| name.as_str())
    }

    fn maxp(&self) -> Maxp {
        Maxp {
            max_points: Some(self.max_points),
            max_contours: Some(1),
            max_composite_points: Some(0),
            max_composite_contours: Some(0),
            max_zones: Some(2),
            max_twilight_points: Some(0),
            max_storage: Some(0),
            max_function_defs: Some(0),
            max_instruction_defs: Some(0),
            max_stack_elements: Some(0),
            max_size_of_instructions: Some(0),
            max_component_elements: Some(1),
            max_component_depth: Some(1),
            ..Maxp::new(self.glyphs.len() as u16)
        }
    }

    fn post(&self) -> Post {
        if self.standard_names {
            Post::default()
        } else {
            Post::new_v2(self.names())
        }
    }

    fn hmtx(&self) -> (Hmtx, u16) {
        let mut long_count = self.glyphs.len();
        if self.compact_hmtx {
            let last = self.glyphs.last().map(|(_, _, advance, _)| *advance);
            while long_count > 1 && self.glyphs[long_count - 2].2 == last.unwrap_or_default() {
                long_count -= 1;
            }
        }
        let (long, short) = self.glyphs.split_at(long_count);
        let hmtx = Hmtx::new(
            long.iter()
                .map(|(_, _, advance, side_bearing)| LongMetric::new(*advance, *side_bearing))
                .collect(),
            short.iter().map(|(_, _, _, side_bearing)| *side_bearing).collect(),
        );
        (hmtx, long_count as u16)
    }

    fn cmap(&self) -> Cmap {
        let mut mappings = self.mappings.clone();
        mappings.sort_unstable();
        let bmp: Vec<(u32, u16)> = mappings
            .iter()
            .copied()
            .filter(|&(codepoint, _)| codepoint < 0xFFFF)
            .collect();

        let delta_coded = Cmap::from_mappings(bmp.iter().filter_map(|&(codepoint, glyph_id)| {
            Some((char::from_u32(codepoint)?, GlyphId::from(glyph_id)))
        }))
        .expect("no conflicting test mappings")
        .encoding_records
        .into_iter()
        .next()
        .map(|record| record.subtable.into_inner())
        .unwrap_or_else(|| range_offset_format4(&[]));

        let mut records = vec![
            EncodingRecord::new(PlatformId::Unicode, 3, delta_coded),
            EncodingRecord::new(PlatformId::Unicode, 5, CmapSubtable::format_14(10, 0, Vec::new())),
        ];
        if self.mac_roman_table {
            let low: Vec<(u32, u16)> = bmp.iter().copied().filter(|&(cp, _)| cp < 0x100).collect();
            records.push(EncodingRecord::new(PlatformId::Macintosh, 0, format6(&low)));
        }
        records.push(EncodingRecord::new(PlatformId::Windows, 1, range_offset_format4(&bmp)));
        let groups: Vec<SequentialMapGroup> = mappings
            .iter()
            .map(|&(codepoint, glyph_id)| SequentialMapGroup::new(codepoint, codepoint, glyph_id as u32))
            .collect();
        records.push(EncodingRecord::new(
            PlatformId::Windows,
            10,
            CmapSubtable::format_12(16 + 12 * groups.len() as u32, 0, groups.len() as u32, groups),
        ));
        Cmap::new(records)
    }
}

/// Format 4 with one segment over the whole mapped range, resolved through
/// `glyphIdArray` via `idRangeOffset`, plus the closing 0xFFFF segment.
fn range_offset_format4(entries: &[(u32, u16)]) -> CmapSubtable {
    let (Some(&(first, _)), Some(&(last, _))) = (entries.first(), entries.last()) else {
        return CmapSubtable::format_4(
            24,
            0,
            2,
            2,
            0,
            0,
            vec![0xFFFF],
            vec![0xFFFF],
            vec![1],
            vec![0],
            Vec::new(),
        );
    };
    let mut glyph_id_array = vec![0u16; (last - first) as usize + 1];
    for &(codepoint, glyph_id) in entries {
        glyph_id_array[(codepoint - first) as usize] = glyph_id;
    }
    let length = 16 + 8 * 2 + 2 * glyph_id_array.len();
    CmapSubtable::format_4(
        length as u16,
        0,
        4,
        4,
        1,
        0,
        vec![last as u16, 0xFFFF],
        vec![first as u16, 0xFFFF],
        vec![0, 1],
        // Segment 0's array starts right after the two range offsets
        vec![4, 0],
        glyph_id_array,
    )
}

fn format6(entries: &[(u32, u16)]) -> CmapSubtable {
    let (Some(&(first, _)), Some(&(last, _))) = (entries.first(), entries.last()) else {
        return CmapSubtable::format_6(10, 0, 0, 0, Vec::new());
    };
    let mut glyph_id_array = vec![0u16; (last - first) as usize + 1];
    for &(codepoint, glyph_id) in entries {
        glyph_id_array[(codepoint - first) as usize] = glyph_id;
    }
    let count = glyph_id_array.len() as u16;
    CmapSubtable::format_6(10 + 2 * count, 0, first as u16, count, glyph_id_array)
}

/// Rewrite short `loca` offsets (half the byte offset) as 32-bit ones.
fn widen_loca(short: &[u8]) -> Vec<u8> {
    short
        .chunks_exact(2)
        .flat_map(|pair| (u16::from_be_bytes([pair[0], pair[1]]) as u32 * 2).to_be_bytes())
        .collect()
}
