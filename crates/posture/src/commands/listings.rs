use std::io::Write;

use anyhow::Result;

use posture_core::registry::{Context, Input};
use posture_report::text;

pub fn roles(ctx: &mut Context<'_>, input: Input<'_>) -> Result<()> {
    let document = input.document()?;
    write!(ctx.out, "{}", text::format_roles(document.body()))?;
    Ok(())
}

pub fn components(ctx: &mut Context<'_>, input: Input<'_>) -> Result<()> {
    let document = input.document()?;
    write!(ctx.out, "{}", text::format_components(document.body()))?;
    Ok(())
}

pub fn controls(ctx: &mut Context<'_>, input: Input<'_>) -> Result<()> {
    let document = input.document()?;
    write!(ctx.out, "{}", text::format_controls(document.body()))?;
    Ok(())
}

pub fn security_levels(ctx: &mut Context<'_>, input: Input<'_>) -> Result<()> {
    let document = input.document()?;
    write!(ctx.out, "{}", text::format_security_levels(document.body()))?;
    Ok(())
}

pub fn user_privileges(ctx: &mut Context<'_>, input: Input<'_>) -> Result<()> {
    let document = input.document()?;
    write!(ctx.out, "{}", text::format_user_privileges(document.body()))?;
    Ok(())
}

pub fn poams(ctx: &mut Context<'_>, input: Input<'_>) -> Result<()> {
    let document = input.document()?;
    write!(ctx.out, "{}", text::format_poams(document.body()))?;
    Ok(())
}

pub fn activities(ctx: &mut Context<'_>, input: Input<'_>) -> Result<()> {
    let document = input.document()?;
    write!(ctx.out, "{}", text::format_activities(document.body()))?;
    Ok(())
}

pub fn metadata(ctx: &mut Context<'_>, input: Input<'_>) -> Result<()> {
    let document = input.document()?;
    write!(ctx.out, "{}", text::format_metadata(document))?;
    Ok(())
}
