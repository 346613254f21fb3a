use std::io::Write;

use anyhow::Result;

use posture_core::registry::{Context, Input};
use posture_core::scan;
use posture_report::text;

pub fn run(ctx: &mut Context<'_>, input: Input<'_>) -> Result<()> {
    let report = scan::load(input.scan_path()?)?;
    write!(
        ctx.out,
        "{}",
        text::format_ports(&report, &ctx.config.ports.approved)
    )?;
    Ok(())
}
