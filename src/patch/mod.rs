//! The glyph transfer
//!
//! Copies the music signs from Segoe UI Symbol into Segoe UI. Each transfer
//! is planned against the donor first and only then applied, so the glyph
//! table, glyph order, cmap and metrics of the destination are always
//! updated together or not at all.

pub mod backup;
pub mod verify;

pub use backup::{ensure_backup, BackupStatus};
pub use verify::{verify, VerifyLine, VERIFY_CHECKLIST};

use crate::core::errors::{FontRole, PatchError, PatchResult};
use crate::font_source::{FontResource, Glyph, HorizontalMetric};
use anyhow::Context;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DESTINATION_FILE: &str = "segoeui.ttf";
pub const DONOR_FILE: &str = "seguisym.ttf";
pub const BACKUP_SUFFIX: &str = ".backup";

/// Nesting limit for composite glyphs pulled in with a transfer.
const MAX_COMPONENT_DEPTH: usize = 8;

/// One glyph to copy from the donor font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphTransfer {
    pub codepoint: u32,
    pub target_name: &'static str,
    pub description: &'static str,
}

impl GlyphTransfer {
    pub fn symbol(&self) -> char {
        char::from_u32(self.codepoint).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

pub const GLYPHS_TO_COPY: [GlyphTransfer; 2] = [
    GlyphTransfer {
        codepoint: 0x266D,
        target_name: "uni266D",
        description: "MUSIC FLAT SIGN",
    },
    GlyphTransfer {
        codepoint: 0x266E,
        target_name: "uni266E",
        description: "MUSIC NATURAL SIGN",
    },
];

/// Where the fonts live inside a Wine prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontPaths {
    pub prefix: PathBuf,
    pub fonts_dir: PathBuf,
    pub destination: PathBuf,
    pub donor: PathBuf,
    pub backup: PathBuf,
}

impl FontPaths {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        let prefix = prefix.into();
        let fonts_dir = prefix.join("drive_c").join("windows").join("Fonts");
        let destination = fonts_dir.join(DESTINATION_FILE);
        let mut backup = destination.clone().into_os_string();
        backup.push(BACKUP_SUFFIX);
        Self {
            donor: fonts_dir.join(DONOR_FILE),
            backup: PathBuf::from(backup),
            destination,
            fonts_dir,
            prefix,
        }
    }

    /// Both input fonts must exist before anything is touched.
    pub fn validate(&self) -> PatchResult<()> {
        for (role, path) in [
            (FontRole::Destination, &self.destination),
            (FontRole::Donor, &self.donor),
        ] {
            if !path.is_file() {
                return Err(PatchError::MissingFile {
                    role,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// What a successful transfer did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub transfer: GlyphTransfer,
    pub donor_glyph: String,
    /// False when the target name already existed and was replaced
    pub appended: bool,
    pub cmap_subtables_updated: usize,
    pub metrics: Option<HorizontalMetric>,
    /// Extra glyphs copied because the donor glyph is a composite
    pub components: Vec<String>,
}

struct PlannedGlyph {
    name: String,
    glyph: Glyph,
    metrics: Option<HorizontalMetric>,
}

/// Copy one glyph from `donor` into `dest`.
///
/// Fails with `GlyphNotFound` if the donor's best cmap does not map the code
/// point; `dest` is unchanged in that case.
pub fn transfer_glyph(
    dest: &mut FontResource,
    donor: &FontResource,
    transfer: &GlyphTransfer,
) -> PatchResult<TransferReport> {
    let donor_glyph = donor
        .glyph_for_codepoint(transfer.codepoint)
        .ok_or(PatchError::GlyphNotFound {
            codepoint: transfer.codepoint,
        })?
        .to_owned();

    let mut plan = Vec::new();
    plan_glyph(
        donor,
        &donor_glyph,
        transfer.target_name,
        0,
        &mut HashSet::new(),
        &mut plan,
    )?;

    // Nothing below can fail
    dest.raise_profile_limits(donor);
    let mut appended = false;
    let mut components = Vec::new();
    let mut metrics = None;
    for planned in plan {
        let added = dest.insert_glyph(&planned.name, planned.glyph);
        match planned.metrics {
            Some(metric) => dest.set_metrics(&planned.name, metric),
            None => warn!("No horizontal metrics for '{}' in the donor font", planned.name),
        }
        if planned.name == transfer.target_name {
            appended = added;
            metrics = planned.metrics;
        } else {
            components.push(planned.name);
        }
    }
    let cmap_subtables_updated = dest.map_codepoint(transfer.codepoint, transfer.target_name);
    debug!(
        "U+{:04X}: {} -> {} ({} cmap sub-tables, {} components)",
        transfer.codepoint,
        donor_glyph,
        transfer.target_name,
        cmap_subtables_updated,
        components.len()
    );

    Ok(TransferReport {
        transfer: *transfer,
        donor_glyph,
        appended,
        cmap_subtables_updated,
        metrics,
        components,
    })
}

/// Collect `donor_name` and, for composites, every glyph it references.
/// Components are renamed under the target so they cannot collide with
/// glyphs already in the destination.
fn plan_glyph(
    donor: &FontResource,
    donor_name: &str,
    target_name: &str,
    depth: usize,
    visited: &mut HashSet<String>,
    plan: &mut Vec<PlannedGlyph>,
) -> PatchResult<()> {
    if depth > MAX_COMPONENT_DEPTH {
        return Err(PatchError::malformed(
            "glyf",
            format!("components of '{donor_name}' nest too deeply"),
        ));
    }
    if !visited.insert(target_name.to_owned()) {
        return Ok(());
    }
    let glyph = donor.glyph(donor_name).ok_or_else(|| {
        PatchError::malformed("glyf", format!("donor has no outline for '{donor_name}'"))
    })?;
    let component_name = |name: &str| format!("{target_name}.{name}");
    plan.push(PlannedGlyph {
        name: target_name.to_owned(),
        glyph: glyph.with_component_names(|name| component_name(name)),
        metrics: donor.metrics(donor_name),
    });
    for component in glyph.components() {
        plan_glyph(
            donor,
            component,
            &component_name(component),
            depth + 1,
            visited,
            plan,
        )?;
    }
    Ok(())
}

/// Everything a run produced, for the caller to report or inspect.
#[derive(Debug)]
pub struct PatchSummary {
    pub backup: BackupStatus,
    pub transferred: Vec<TransferReport>,
    pub skipped: Vec<GlyphTransfer>,
    pub verification: Result<Vec<VerifyLine>, String>,
}

/// Run the whole patch against the fonts in `paths`, printing progress.
///
/// Validate, back up, load from the backup, transfer each glyph, save over
/// the destination, then reload and verify.
pub fn patch_fonts(paths: &FontPaths) -> anyhow::Result<PatchSummary> {
    paths.validate()?;

    let backup = ensure_backup(&paths.destination, &paths.backup)
        .with_context(|| format!("Failed to back up {}", paths.destination.display()))?;
    match backup {
        BackupStatus::Created => println!("Creating backup: {}", paths.backup.display()),
        BackupStatus::Existing => println!("Backup exists: {}", paths.backup.display()),
    }

    println!("Loading fonts...");
    let mut dest = load(&paths.backup)?;
    let donor = load(&paths.donor)?;

    let mut transferred = Vec::new();
    let mut skipped = Vec::new();
    for transfer in &GLYPHS_TO_COPY {
        match transfer_glyph(&mut dest, &donor, transfer) {
            Ok(report) => {
                println!(
                    "Copying U+{:04X} ({}) {}...",
                    transfer.codepoint,
                    transfer.symbol(),
                    transfer.description
                );
                transferred.push(report);
            }
            Err(PatchError::GlyphNotFound { codepoint }) => {
                warn!("U+{codepoint:04X} not in Segoe UI Symbol, skipping");
                skipped.push(*transfer);
            }
            Err(error) => {
                return Err(error).with_context(|| {
                    format!("Failed to copy U+{:04X}", transfer.codepoint)
                })
            }
        }
    }

    println!("Saving patched font to: {}", paths.destination.display());
    dest.save(&paths.destination)
        .with_context(|| format!("Failed to save {}", paths.destination.display()))?;
    drop(dest);

    println!();
    println!("Verifying...");
    let verification = verify(&paths.destination).map_err(|error| error.to_string());
    match &verification {
        Ok(lines) => lines.iter().for_each(|line| println!("  {line}")),
        Err(error) => println!("  ✗ could not reload patched font: {error}"),
    }

    Ok(PatchSummary {
        backup,
        transferred,
        skipped,
        verification,
    })
}

fn load(path: &Path) -> anyhow::Result<FontResource> {
    FontResource::load(path).with_context(|| format!("Failed to load {}", path.display()))
}
