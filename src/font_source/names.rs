//! Glyph names
//!
//! TrueType fonts carry glyph names in the `post` table (version 2.0, or the
//! implicit standard Macintosh order of version 1.0). Fonts without names get
//! synthesized `glyphNNNNN` names so the rest of the patcher can address
//! every glyph by name.

use crate::core::errors::{PatchError, PatchResult};
use std::collections::HashSet;
use tracing::debug;
use write_fonts::read::tables::post::DEFAULT_GLYPH_NAMES;
use write_fonts::read::{FontRef, TableProvider};
use write_fonts::tables::post::Post;
use write_fonts::types::{GlyphId16, Version16Dot16};

/// Glyph names for every glyph id, unique within the font.
pub fn glyph_names(font: &FontRef, num_glyphs: u16) -> Vec<String> {
    let post = font.post().ok();
    if post.is_none() {
        debug!("No usable post table, synthesizing glyph names");
    }
    let mut seen = HashSet::new();
    (0..num_glyphs)
        .map(|glyph_id| {
            let name = post
                .as_ref()
                .and_then(|post| post.glyph_name(GlyphId16::new(glyph_id)))
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| synthesized_name(glyph_id));
            unique_name(name, &mut seen)
        })
        .collect()
}

fn synthesized_name(glyph_id: u16) -> String {
    format!("glyph{glyph_id:05}")
}

/// Suffix repeated names with `#1`, `#2`, ... in glyph order.
fn unique_name(name: String, seen: &mut HashSet<String>) -> String {
    if seen.insert(name.clone()) {
        return name;
    }
    let mut suffix = 1;
    loop {
        let candidate = format!("{name}#{suffix}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

/// `post` for `glyph_order`, keeping every header field of `post`.
///
/// Version 2.0 tables get a fresh name index. A version 1.0 table stays as
/// it is while the glyph order is still a prefix of the standard Macintosh
/// order and becomes version 2.0 otherwise. Other versions carry no names
/// and are returned unchanged.
pub fn post_for_order(post: &Post, glyph_order: &[String]) -> PatchResult<Post> {
    let needs_names = match post.version {
        Version16Dot16::VERSION_2_0 => true,
        Version16Dot16::VERSION_1_0 => !is_standard_order(glyph_order),
        _ => false,
    };
    if !needs_names {
        return Ok(post.clone());
    }

    if let Some(name) = glyph_order.iter().find(|name| name.len() > u8::MAX as usize) {
        return Err(PatchError::malformed(
            "post",
            format!("glyph name '{name}' is too long"),
        ));
    }
    let custom_names = glyph_order
        .iter()
        .filter(|name| !DEFAULT_GLYPH_NAMES.contains(&name.as_str()))
        .count();
    if DEFAULT_GLYPH_NAMES.len() + custom_names > u16::MAX as usize + 1 {
        return Err(PatchError::malformed("post", "too many glyph names"));
    }
    if post.version == Version16Dot16::VERSION_1_0 {
        debug!("Converting post to version 2.0 for new glyph names");
    }

    let named = Post::new_v2(glyph_order.iter().map(String::as_str));
    Ok(Post {
        version: named.version,
        num_glyphs: named.num_glyphs,
        glyph_name_index: named.glyph_name_index,
        string_data: named.string_data,
        ..post.clone()
    })
}

fn is_standard_order(glyph_order: &[String]) -> bool {
    glyph_order.len() <= DEFAULT_GLYPH_NAMES.len()
        && glyph_order
            .iter()
            .zip(DEFAULT_GLYPH_NAMES.iter())
            .all(|(name, standard)| name == *standard)
}
