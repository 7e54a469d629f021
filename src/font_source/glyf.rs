//! Glyph outlines and the `glyf`/`loca` pair
//!
//! Outlines are held as write-fonts glyphs. Composite glyphs also carry the
//! names of their components, so a glyph copied between fonts can be
//! renumbered against whatever glyph order it ends up in.

use crate::core::errors::{PatchError, PatchResult};
use std::borrow::Cow;
use std::collections::HashMap;
use write_fonts::from_obj::FromTableRef;
use write_fonts::read::tables::glyf::Glyf as RawGlyf;
use write_fonts::read::tables::loca::Loca as RawLoca;
use write_fonts::tables::glyf::{Component, CompositeGlyph, GlyfLocaBuilder, Glyf};
use write_fonts::tables::loca::{Loca, LocaFormat};
use write_fonts::types::{GlyphId, GlyphId16};

pub use write_fonts::tables::glyf::{Bbox, Glyph as Outline};

/// One glyph: its outline plus, for composites, the component names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    outline: Outline,
    components: Vec<String>,
}

impl Glyph {
    /// Wrap an outline, resolving component glyph ids through `names`.
    pub fn from_outline(outline: Outline, names: &[String]) -> PatchResult<Self> {
        let outline = match outline {
            Outline::Simple(simple) if simple.contours().is_empty() => Outline::Empty,
            other => other,
        };
        let components = match &outline {
            Outline::Composite(composite) => composite
                .components()
                .iter()
                .map(|component| {
                    let glyph_id = component.glyph.to_u16();
                    names.get(glyph_id as usize).cloned().ok_or_else(|| {
                        PatchError::malformed(
                            "glyf",
                            format!("component references glyph {glyph_id} out of range"),
                        )
                    })
                })
                .collect::<PatchResult<_>>()?,
            _ => Vec::new(),
        };
        Ok(Self {
            outline,
            components,
        })
    }

    pub fn empty() -> Self {
        Self {
            outline: Outline::Empty,
            components: Vec::new(),
        }
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.outline, Outline::Composite(_))
    }

    /// Component glyph names, in component order.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn bounds(&self) -> Option<Bbox> {
        self.outline.bbox()
    }

    /// A copy of this glyph whose components point at renamed glyphs.
    pub fn with_component_names(&self, rename: impl FnMut(&String) -> String) -> Self {
        Self {
            outline: self.outline.clone(),
            components: self.components.iter().map(rename).collect(),
        }
    }

    /// The outline with component ids resolved against `glyph_ids`.
    ///
    /// A composite whose components already carry the right ids is returned
    /// as is, hinting instructions included. Otherwise it is rebuilt
    /// component by component and keeps its original bounding box.
    pub fn compile(&self, glyph_ids: &HashMap<&str, u16>) -> PatchResult<Cow<'_, Outline>> {
        let Outline::Composite(composite) = &self.outline else {
            return Ok(Cow::Borrowed(&self.outline));
        };
        let ids = self
            .components
            .iter()
            .map(|name| {
                glyph_ids.get(name.as_str()).copied().ok_or_else(|| {
                    PatchError::malformed(
                        "glyf",
                        format!("component '{name}' is not in the glyph order"),
                    )
                })
            })
            .collect::<PatchResult<Vec<u16>>>()?;
        let current = composite.components().iter().map(|c| c.glyph.to_u16());
        if current.eq(ids.iter().copied()) {
            return Ok(Cow::Borrowed(&self.outline));
        }

        let mut rebuilt: Option<CompositeGlyph> = None;
        for (component, id) in composite.components().iter().zip(ids) {
            let moved = Component::new(
                GlyphId16::new(id),
                component.anchor,
                component.transform,
                component.flags,
            );
            match rebuilt.as_mut() {
                Some(glyph) => glyph.add_component(moved, composite.bbox),
                None => rebuilt = Some(CompositeGlyph::new(moved, composite.bbox)),
            }
        }
        let rebuilt = rebuilt
            .ok_or_else(|| PatchError::malformed("glyf", "composite glyph has no components"))?;
        Ok(Cow::Owned(Outline::Composite(rebuilt)))
    }
}

/// Read every glyph listed in `loca`, in glyph order.
pub fn decode_glyphs<'a>(
    glyf: &RawGlyf<'a>,
    loca: &RawLoca<'a>,
    names: &[String],
) -> PatchResult<Vec<Glyph>> {
    names
        .iter()
        .enumerate()
        .map(|(glyph_id, name)| {
            let outline = loca
                .get_glyf(GlyphId::new(glyph_id as u32), glyf)
                .map_err(|error| {
                    PatchError::malformed("glyf", format!("glyph '{name}' is unreadable: {error}"))
                })?
                .map_or(Outline::Empty, |glyph| Outline::from_table_ref(&glyph));
            Glyph::from_outline(outline, names)
        })
        .collect()
}

/// Lay out `glyphs` in order. write-fonts picks short offsets whenever the
/// table allows them.
pub fn build_glyf_loca<'a>(
    glyphs: impl IntoIterator<Item = (&'a str, &'a Glyph)>,
    glyph_ids: &HashMap<&str, u16>,
) -> PatchResult<(Glyf, Loca, LocaFormat)> {
    let mut builder = GlyfLocaBuilder::new();
    for (name, glyph) in glyphs {
        let outline = glyph.compile(glyph_ids)?;
        builder.add_glyph(&*outline).map_err(|error| {
            PatchError::malformed("glyf", format!("glyph '{name}' does not compile: {error}"))
        })?;
    }
    Ok(builder.build())
}
