//! Font source data structures
//!
//! `FontResource` is the in-memory model of one TrueType font file: the
//! glyph order, outlines and horizontal metrics keyed by glyph name, the
//! editable cmap, owned copies of the header tables, and every other table
//! as raw bytes. Tables are read through `write_fonts::read` and compiled
//! back with the write-fonts table builders and `FontBuilder`.

pub mod cmap;
pub mod glyf;
pub mod metrics;
pub mod names;

#[cfg(test)]
pub(crate) mod testing;

pub use cmap::{Cmap, CmapSubtable, CodepointMap, MappingFormat, SubtableBody};
pub use glyf::{Bbox, Glyph, Outline};
pub use metrics::{HorizontalExtents, HorizontalMetric};

use crate::core::errors::{PatchError, PatchResult};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;
use write_fonts::from_obj::FromTableRef;
use write_fonts::read::{FontRef, ReadError, TableProvider};
use write_fonts::tables::head::Head;
use write_fonts::tables::hhea::Hhea;
use write_fonts::tables::maxp::Maxp;
use write_fonts::tables::post::Post;
use write_fonts::types::Tag;
use write_fonts::FontBuilder;

/// Tables compiled from the model on every save.
const REBUILT_TABLES: [Tag; 8] = [
    Tag::new(b"head"),
    Tag::new(b"hhea"),
    Tag::new(b"maxp"),
    Tag::new(b"post"),
    Tag::new(b"glyf"),
    Tag::new(b"loca"),
    Tag::new(b"hmtx"),
    Tag::new(b"cmap"),
];

/// Tables that describe the exact glyph set or file bytes and would be
/// wrong after glyphs are added.
const STALE_WHEN_GLYPHS_CHANGE: [Tag; 3] = [Tag::new(b"hdmx"), Tag::new(b"LTSH"), Tag::new(b"DSIG")];

const HEAD_CHECKSUM_ADJUSTMENT: usize = 8;
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

#[derive(Debug, Clone)]
pub struct FontResource {
    tables: BTreeMap<Tag, Vec<u8>>,
    head: Head,
    hhea: Hhea,
    maxp: Maxp,
    post: Option<Post>,
    glyph_order: Vec<String>,
    glyphs: HashMap<String, Glyph>,
    metrics: HashMap<String, HorizontalMetric>,
    cmap: Cmap,
    glyphs_changed: bool,
}

impl FontResource {
    /// Load a font file into memory.
    pub fn load(path: impl AsRef<Path>) -> PatchResult<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        debug!("Read {} bytes from {}", data.len(), path.display());
        Self::from_bytes(&data).map_err(|error| match error {
            PatchError::MissingTable { tag: "glyf" | "loca" } => PatchError::NotTrueType {
                path: path.to_path_buf(),
            },
            other => other,
        })
    }

    pub fn from_bytes(data: &[u8]) -> PatchResult<Self> {
        let font = FontRef::new(data)?;
        let tables: BTreeMap<Tag, Vec<u8>> = font
            .table_directory
            .table_records()
            .iter()
            .filter_map(|record| {
                let tag = record.tag();
                let table = font.table_data(tag)?;
                Some((tag, table.as_bytes().to_vec()))
            })
            .collect();

        let glyf = required(font.glyf(), "glyf")?;
        let loca = required(font.loca(None), "loca")?;
        let maxp = Maxp::from_table_ref(&required(font.maxp(), "maxp")?);
        let head = Head::from_table_ref(&required(font.head(), "head")?);
        let hhea = Hhea::from_table_ref(&required(font.hhea(), "hhea")?);
        let post = font.post().ok().map(|post| Post::from_table_ref(&post));
        let num_glyphs = maxp.num_glyphs;

        let glyph_order = names::glyph_names(&font, num_glyphs);
        let outlines = glyf::decode_glyphs(&glyf, &loca, &glyph_order)?;
        let advances = metrics::decode_hmtx(&required(font.hmtx(), "hmtx")?, num_glyphs)?;
        let cmap = Cmap::decode(&required(font.cmap(), "cmap")?, &glyph_order)?;

        debug!(
            "Loaded {} glyphs, {} tables, {} cmap sub-tables",
            num_glyphs,
            tables.len(),
            cmap.subtables().len()
        );

        Ok(Self {
            glyphs: glyph_order.iter().cloned().zip(outlines).collect(),
            metrics: glyph_order.iter().cloned().zip(advances).collect(),
            glyph_order,
            cmap,
            tables,
            head,
            hhea,
            maxp,
            post,
            glyphs_changed: false,
        })
    }

    pub fn glyph_order(&self) -> &[String] {
        &self.glyph_order
    }

    pub fn glyph(&self, name: &str) -> Option<&Glyph> {
        self.glyphs.get(name)
    }

    pub fn contains_glyph(&self, name: &str) -> bool {
        self.glyphs.contains_key(name)
    }

    pub fn metrics(&self, name: &str) -> Option<HorizontalMetric> {
        self.metrics.get(name).copied()
    }

    pub fn cmap(&self) -> &Cmap {
        &self.cmap
    }

    pub fn best_cmap(&self) -> Option<&BTreeMap<u32, String>> {
        self.cmap.best()
    }

    /// Glyph name the best cmap assigns to `codepoint`.
    pub fn glyph_for_codepoint(&self, codepoint: u32) -> Option<&str> {
        self.best_cmap()?.get(&codepoint).map(String::as_str)
    }

    pub fn has_table(&self, tag: &str) -> bool {
        self.tables.keys().any(|table| table.to_string() == tag)
    }

    /// Store an outline under `name`. New names are appended to the glyph
    /// order; an existing name keeps its slot. Returns true if appended.
    pub fn insert_glyph(&mut self, name: &str, glyph: Glyph) -> bool {
        self.glyphs_changed = true;
        if self.glyphs.insert(name.to_owned(), glyph).is_some() {
            return false;
        }
        self.glyph_order.push(name.to_owned());
        true
    }

    /// Map `codepoint` to glyph `name` in every cmap sub-table able to hold
    /// it. Returns how many sub-tables were updated.
    pub fn map_codepoint(&mut self, codepoint: u32, name: &str) -> usize {
        let glyph_id = self
            .glyph_order
            .iter()
            .position(|glyph| glyph == name)
            .map_or(u16::MAX, |glyph_id| glyph_id.min(u16::MAX as usize) as u16);
        self.cmap.set_mapping(codepoint, name, glyph_id)
    }

    pub fn set_metrics(&mut self, name: &str, metric: HorizontalMetric) {
        self.metrics.insert(name.to_owned(), metric);
    }

    /// Raise this font's `maxp` profile limits to at least `donor`'s. Only
    /// version 1.0 tables carry limits; returns false if either lacks them.
    pub fn raise_profile_limits(&mut self, donor: &FontResource) -> bool {
        if self.maxp.max_points.is_none() || donor.maxp.max_points.is_none() {
            return false;
        }
        let theirs = &donor.maxp;
        let ours = &mut self.maxp;
        for (current, needed) in [
            (&mut ours.max_points, theirs.max_points),
            (&mut ours.max_contours, theirs.max_contours),
            (&mut ours.max_composite_points, theirs.max_composite_points),
            (&mut ours.max_composite_contours, theirs.max_composite_contours),
            (&mut ours.max_zones, theirs.max_zones),
            (&mut ours.max_twilight_points, theirs.max_twilight_points),
            (&mut ours.max_storage, theirs.max_storage),
            (&mut ours.max_function_defs, theirs.max_function_defs),
            (&mut ours.max_instruction_defs, theirs.max_instruction_defs),
            (&mut ours.max_stack_elements, theirs.max_stack_elements),
            (&mut ours.max_size_of_instructions, theirs.max_size_of_instructions),
            (&mut ours.max_component_elements, theirs.max_component_elements),
            (&mut ours.max_component_depth, theirs.max_component_depth),
        ] {
            if let (Some(current), Some(needed)) = (current.as_mut(), needed) {
                *current = (*current).max(needed);
            }
        }
        true
    }

    /// Metrics written for `name`; glyphs without explicit metrics get a
    /// zero advance and a bearing matching their outline.
    fn metric_or_default(&self, name: &str, glyph: &Glyph) -> HorizontalMetric {
        self.metrics(name).unwrap_or_else(|| {
            let side_bearing = glyph.bounds().map_or(0, |bounds| bounds.x_min);
            HorizontalMetric::new(0, side_bearing)
        })
    }

    /// Serialize the font.
    pub fn to_bytes(&self) -> PatchResult<Vec<u8>> {
        let count = self.glyph_order.len();
        let num_glyphs = u16::try_from(count).map_err(|_| PatchError::TooManyGlyphs { count })?;
        let glyph_ids: HashMap<&str, u16> = self
            .glyph_order
            .iter()
            .enumerate()
            .map(|(glyph_id, name)| (name.as_str(), glyph_id as u16))
            .collect();
        let outlines = self
            .glyph_order
            .iter()
            .map(|name| {
                self.glyphs.get(name).ok_or_else(|| {
                    PatchError::malformed("glyf", format!("no outline for glyph '{name}'"))
                })
            })
            .collect::<PatchResult<Vec<&Glyph>>>()?;

        let (glyf, loca, loca_format) = glyf::build_glyf_loca(
            self.glyph_order.iter().map(String::as_str).zip(outlines.iter().copied()),
            &glyph_ids,
        )?;

        let advances: Vec<HorizontalMetric> = self
            .glyph_order
            .iter()
            .zip(&outlines)
            .map(|(name, glyph)| self.metric_or_default(name, glyph))
            .collect();
        let (hmtx, number_of_long_metrics) = metrics::build_hmtx(&advances)?;

        let mut hhea = self.hhea.clone();
        HorizontalExtents::compute(
            advances
                .iter()
                .copied()
                .zip(outlines.iter().map(|glyph| glyph.bounds())),
        )
        .apply(&mut hhea, number_of_long_metrics);

        let mut head = self.head.clone();
        head.checksum_adjustment = 0;
        head.index_to_loc_format = loca_format as i16;
        if let Some(bounds) = outlines
            .iter()
            .filter_map(|glyph| glyph.bounds())
            .reduce(Bbox::union)
        {
            head.x_min = bounds.x_min;
            head.y_min = bounds.y_min;
            head.x_max = bounds.x_max;
            head.y_max = bounds.y_max;
        }

        let mut maxp = self.maxp.clone();
        maxp.num_glyphs = num_glyphs;
        let post = self
            .post
            .as_ref()
            .map(|post| names::post_for_order(post, &self.glyph_order))
            .transpose()?;
        let cmap = self.cmap.compile(&glyph_ids)?;

        let mut builder = FontBuilder::new();
        builder
            .add_table(&head)?
            .add_table(&hhea)?
            .add_table(&maxp)?
            .add_table(&glyf)?
            .add_table(&loca)?
            .add_table(&hmtx)?
            .add_table(&cmap)?;
        if let Some(post) = &post {
            builder.add_table(post)?;
        }
        for (tag, data) in &self.tables {
            if REBUILT_TABLES.contains(tag) {
                continue;
            }
            if self.glyphs_changed && STALE_WHEN_GLYPHS_CHANGE.contains(tag) {
                debug!("Dropping {tag} table");
                continue;
            }
            builder.add_raw(*tag, data.as_slice());
        }
        let mut font = builder.build();
        set_checksum_adjustment(&mut font)?;
        Ok(font)
    }

    /// Serialize the font and replace `path` with it.
    ///
    /// The bytes go to a temporary file next to `path` first, so an error
    /// part way through never leaves a truncated font behind.
    pub fn save(&self, path: impl AsRef<Path>) -> PatchResult<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let mut staged = tempfile::NamedTempFile::new_in(directory)?;
        staged.write_all(&bytes)?;
        staged.as_file().sync_all()?;
        if let Ok(existing) = fs::metadata(path) {
            fs::set_permissions(staged.path(), existing.permissions())?;
        }
        staged.persist(path).map_err(|error| error.error)?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

/// Name a missing table by `tag` instead of a generic read error.
fn required<T>(table: Result<T, ReadError>, tag: &'static str) -> PatchResult<T> {
    table.map_err(|error| match error {
        ReadError::TableIsMissing(_) => PatchError::MissingTable { tag },
        other => PatchError::Read(other),
    })
}

/// Sum of the data as big-endian `u32` words, zero padded.
pub(crate) fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Set `head.checkSumAdjustment` so the whole file sums to the magic value.
/// The font builder leaves it at whatever `head` was compiled with.
fn set_checksum_adjustment(font: &mut [u8]) -> PatchResult<()> {
    let head_offset = FontRef::new(&*font)?
        .table_directory
        .table_records()
        .iter()
        .find(|record| record.tag() == Tag::new(b"head"))
        .map(|record| record.offset() as usize)
        .ok_or(PatchError::MissingTable { tag: "head" })?;
    let field = head_offset + HEAD_CHECKSUM_ADJUSTMENT;
    let adjustment = CHECKSUM_MAGIC.wrapping_sub(checksum(font));
    font.get_mut(field..field + 4)
        .ok_or_else(|| PatchError::malformed("head", "table is truncated"))?
        .copy_from_slice(&adjustment.to_be_bytes());
    Ok(())
}
