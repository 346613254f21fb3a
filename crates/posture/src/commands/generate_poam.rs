use std::io::Write;

use anyhow::{bail, Result};
use serde_json::Value;

use posture_core::document::Document;
use posture_core::ledger;
use posture_core::loader;
use posture_core::registry::{Context, Input};
use posture_core::scan;
use posture_report::json::{self, MergeSummary};

use super::write_artifact;

pub fn run(ctx: &mut Context<'_>, input: Input<'_>) -> Result<()> {
    let document = input.document()?;
    let report = scan::load(input.scan_path()?)?;

    let mut poam = match document {
        Document::Poam(tree) => tree.clone(),
        Document::Ssp(_) => seed_ledger(ctx, document),
        Document::Sap(_) => bail!("generate-poam needs an SSP or POA&M"),
    };

    let existing = ledger::read_items(&poam)?;
    let findings = report.findings(ctx.config.ledger.min_severity);
    let outcome = ledger::merge(existing, &findings, ledger::new_item_id);
    ledger::write_items(&mut poam, &outcome.items, ctx.now)?;

    let content = json::format_ledger(&poam, false)?;
    let path = write_artifact(
        &ctx.config.output.docs_dir,
        "generated_poam",
        "json",
        ctx.now,
        &content,
    )?;

    let summary = MergeSummary::from(&outcome);
    tracing::info!("{summary}");
    writeln!(ctx.out, "Generated POA&M saved to {}", path.display())?;
    writeln!(ctx.out, "{summary}")?;
    Ok(())
}

/// Starting ledger for an SSP run: the configured POA&M when it loads,
/// otherwise an empty one. System identity is copied from the SSP either way.
fn seed_ledger(ctx: &Context<'_>, ssp: &Document) -> Value {
    let path = &ctx.config.ledger.path;
    let mut poam = if path.exists() {
        match loader::load(path) {
            Ok(Document::Poam(tree)) => tree,
            Ok(other) => {
                tracing::warn!(
                    "ledger {} is a {} document, starting a new POA&M",
                    path.display(),
                    other.kind().label()
                );
                ledger::empty_poam(ctx.now)
            }
            Err(e) => {
                tracing::warn!("could not load existing POA&M: {e}");
                ledger::empty_poam(ctx.now)
            }
        }
    } else {
        ledger::empty_poam(ctx.now)
    };
    ledger::seed_from_ssp(&mut poam, ssp.body());
    poam
}
