use std::io::Write;

use anyhow::Result;
use serde_json::Value;

use posture_core::document::str_or;
use posture_core::error::PostureError;
use posture_core::ledger;
use posture_core::registry::{Context, Input};
use posture_core::scan;
use posture_core::summary::{PoamStatus, ScanSummary};
use posture_core::trends::TrendSeries;
use posture_report::markdown::{self, MonthlyReport};

use super::{read_input, write_artifact};

pub fn run(ctx: &mut Context<'_>, input: Input<'_>) -> Result<()> {
    let document = input.document()?;
    let report = scan::load(input.scan_path()?)?;

    let template = match &ctx.config.report.template {
        Some(path) => read_input(path)?,
        None => markdown::DEFAULT_TEMPLATE.to_string(),
    };
    let trends = load_trends(ctx)?;

    let body = document.body();
    let metadata = document.metadata().unwrap_or(&Value::Null);
    let system_id = body
        .get("system-id")
        .map(|id| str_or(id, "id", "Unknown ID"))
        .unwrap_or("Unknown ID");

    let items = ledger::read_items(document.tree())?;
    let poam = PoamStatus::from_items(&items, document.tree());
    let scan = ScanSummary::from_report(&report);

    let rendered = markdown::format_monthly_report(
        &template,
        &MonthlyReport {
            system_name: str_or(metadata, "title", "Unknown System"),
            system_id,
            poam_version: str_or(metadata, "version", "Unknown"),
            date: ctx.now.format("%B %d, %Y").to_string(),
            poam: &poam,
            scan: &scan,
            trends: &trends,
        },
    );

    let path = write_artifact(
        &ctx.config.output.reports_dir,
        "monthly_report",
        "md",
        ctx.now,
        &rendered,
    )?;
    writeln!(ctx.out, "Monthly report generated: {}", path.display())?;
    Ok(())
}

fn load_trends(ctx: &Context<'_>) -> Result<TrendSeries> {
    let Some(path) = &ctx.config.report.trends else {
        return Ok(TrendSeries::default());
    };
    if !path.exists() {
        return Err(PostureError::NotFound { path: path.clone() }.into());
    }
    let series = TrendSeries::load(path).map_err(|e| PostureError::Format {
        path: path.clone(),
        message: format!("{e:#}"),
    })?;
    Ok(series)
}
