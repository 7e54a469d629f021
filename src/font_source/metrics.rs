//! Horizontal metrics
//!
//! This module contains the per-glyph advance width and left side bearing
//! (`hmtx`) and the font-wide extents derived from them (`hhea`).

use super::glyf::Bbox;
use crate::core::errors::{PatchError, PatchResult};
use write_fonts::read::tables::hmtx::Hmtx as RawHmtx;
use write_fonts::tables::hhea::Hhea;
use write_fonts::tables::hmtx::{Hmtx, LongMetric};
use write_fonts::types::{FWord, GlyphId, UfWord};

/// Advance width and left side bearing of one glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HorizontalMetric {
    pub advance: u16,
    pub side_bearing: i16,
}

impl HorizontalMetric {
    pub fn new(advance: u16, side_bearing: i16) -> Self {
        Self {
            advance,
            side_bearing,
        }
    }
}

/// One metric per glyph. Glyphs past the long metrics reuse the last
/// advance width.
pub fn decode_hmtx(hmtx: &RawHmtx, num_glyphs: u16) -> PatchResult<Vec<HorizontalMetric>> {
    (0..num_glyphs)
        .map(|glyph_id| {
            let glyph_id = GlyphId::from(glyph_id);
            match (hmtx.advance(glyph_id), hmtx.side_bearing(glyph_id)) {
                (Some(advance), Some(side_bearing)) => {
                    Ok(HorizontalMetric::new(advance, side_bearing))
                }
                _ => Err(PatchError::malformed(
                    "hmtx",
                    format!("no metrics for glyph {}", glyph_id.to_u32()),
                )),
            }
        })
        .collect()
}

/// Build `hmtx`, dropping the advance width of any trailing run of glyphs
/// that share the last advance. The long metric count goes into `hhea`.
pub fn build_hmtx(metrics: &[HorizontalMetric]) -> PatchResult<(Hmtx, u16)> {
    let trailing = match metrics.last() {
        Some(last) => metrics
            .iter()
            .rev()
            .skip(1)
            .take_while(|metric| metric.advance == last.advance)
            .count(),
        None => 0,
    };
    let long_count = metrics.len() - trailing;
    let number_of_long_metrics = u16::try_from(long_count)
        .map_err(|_| PatchError::TooManyGlyphs { count: metrics.len() })?;

    let (long, short) = metrics.split_at(long_count);
    let hmtx = Hmtx::new(
        long.iter()
            .map(|metric| LongMetric::new(metric.advance, metric.side_bearing))
            .collect(),
        short.iter().map(|metric| metric.side_bearing).collect(),
    );
    Ok((hmtx, number_of_long_metrics))
}

/// Font-wide horizontal extents recorded in `hhea`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HorizontalExtents {
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
}

impl HorizontalExtents {
    /// Compute extents from each glyph's metrics and outline bounds. Glyphs
    /// without contours only contribute their advance.
    pub fn compute(glyphs: impl IntoIterator<Item = (HorizontalMetric, Option<Bbox>)>) -> Self {
        let mut advance_width_max = 0u16;
        let mut bearings: Option<(i32, i32, i32)> = None;
        for (metric, bounds) in glyphs {
            advance_width_max = advance_width_max.max(metric.advance);
            let Some(bounds) = bounds else { continue };
            let lsb = metric.side_bearing as i32;
            let extent = lsb + (bounds.x_max as i32 - bounds.x_min as i32);
            let rsb = metric.advance as i32 - extent;
            bearings = Some(match bearings {
                None => (lsb, rsb, extent),
                Some((min_lsb, min_rsb, max_extent)) => {
                    (min_lsb.min(lsb), min_rsb.min(rsb), max_extent.max(extent))
                }
            });
        }
        let (lsb, rsb, extent) = bearings.unwrap_or((0, 0, 0));
        Self {
            advance_width_max,
            min_left_side_bearing: clamp_i16(lsb),
            min_right_side_bearing: clamp_i16(rsb),
            x_max_extent: clamp_i16(extent),
        }
    }

    /// Store these extents and the long metric count in `hhea`.
    pub fn apply(&self, hhea: &mut Hhea, number_of_long_metrics: u16) {
        hhea.advance_width_max = UfWord::new(self.advance_width_max);
        hhea.min_left_side_bearing = FWord::new(self.min_left_side_bearing);
        hhea.min_right_side_bearing = FWord::new(self.min_right_side_bearing);
        hhea.x_max_extent = FWord::new(self.x_max_extent);
        hhea.number_of_long_metrics = number_of_long_metrics;
    }
}

fn clamp_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}
