use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};

use posture_core::document::DocumentKind;
use posture_core::error::PostureError;
use posture_core::registry::{Binding, InputKind, Registry};
use posture_core::validators;

mod generate_poam;
mod listings;
mod monthly_report;
mod ports;
mod visualize;

/// Suffix format for generated artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const SSP: &[DocumentKind] = &[DocumentKind::Ssp];
const POAM: &[DocumentKind] = &[DocumentKind::Poam];
const SAP: &[DocumentKind] = &[DocumentKind::Sap];
const SSP_OR_POAM: &[DocumentKind] = &[DocumentKind::Ssp, DocumentKind::Poam];

/// Every operation the CLI exposes.
pub fn build_registry() -> Registry {
    let mut registry = Registry::new();

    registry.register(
        "roles",
        Binding::new(InputKind::Document, listings::roles)
            .about("List key roles from an SSP")
            .accepts(SSP)
            .validator(validators::has_roles),
    );
    registry.register(
        "components",
        Binding::new(InputKind::Document, listings::components)
            .about("List SSP inventory items and their properties")
            .accepts(SSP)
            .validator(validators::has_inventory),
    );
    registry.register(
        "controls",
        Binding::new(InputKind::Document, listings::controls)
            .about("Analyze implemented controls in an SSP")
            .accepts(SSP)
            .validator(validators::has_control_implementation),
    );
    registry.register(
        "security-levels",
        Binding::new(InputKind::Document, listings::security_levels)
            .about("Show CIA impact levels and information types")
            .accepts(SSP)
            .validator(validators::has_security_impact),
    );
    registry.register(
        "user-privileges",
        Binding::new(InputKind::Document, listings::user_privileges)
            .about("Show users, their roles, and privileges")
            .accepts(SSP)
            .validator(validators::has_users),
    );
    registry.register(
        "poams",
        Binding::new(InputKind::Document, listings::poams)
            .about("List POA&M items")
            .accepts(POAM)
            .validator(validators::has_poam_items),
    );
    registry.register(
        "activities",
        Binding::new(InputKind::Document, listings::activities)
            .about("List the assessor and activities of an assessment plan")
            .accepts(SAP)
            .validator(validators::has_activities),
    );
    registry.register(
        "metadata",
        Binding::new(InputKind::Document, listings::metadata)
            .about("Show document metadata")
            .validator(validators::has_metadata),
    );
    registry.register(
        "visualize",
        Binding::new(InputKind::Document, visualize::run)
            .about("Write component diagrams and an HTML summary of an SSP")
            .accepts(SSP)
            .validator(validators::has_components),
    );
    registry.register(
        "ports",
        Binding::new(InputKind::ScanOnly, ports::run)
            .about("Review open ports in a scan file against the approved list"),
    );
    registry.register(
        "generate-poam",
        Binding::new(InputKind::DocumentWithScan, generate_poam::run)
            .about("Merge scan findings into a POA&M ledger (requires --scan)")
            .accepts(SSP_OR_POAM)
            .validator(validators::is_ssp_or_poam),
    );
    registry.register(
        "monthly-report",
        Binding::new(InputKind::DocumentWithScan, monthly_report::run)
            .about("Build the monthly status report from a POA&M and a scan (requires --scan)")
            .accepts(POAM)
            .validator(validators::has_poam_items),
    );

    registry
}

/// Write a generated artifact as `<dir>/<stem>_<timestamp>.<ext>`.
fn write_artifact(
    dir: &Path,
    stem: &str,
    ext: &str,
    now: DateTime<Local>,
    content: &str,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
    let path = dir.join(format!("{stem}_{}.{ext}", now.format(TIMESTAMP_FORMAT)));
    std::fs::write(&path, content)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    tracing::info!("wrote {}", path.display());
    Ok(path)
}

/// Read a supplementary input file, reporting a missing or unreadable file
/// as an input error rather than a handler fault.
fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(PostureError::NotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    std::fs::read_to_string(path).map_err(|e| {
        PostureError::Format {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
        .into()
    })
}
