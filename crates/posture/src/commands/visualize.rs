use std::io::Write;

use anyhow::Result;
use serde_json::Value;

use posture_core::graph::ComponentGraph;
use posture_core::registry::{Context, Input};
use posture_report::{diagram, dot, html};

use super::write_artifact;

pub fn run(ctx: &mut Context<'_>, input: Input<'_>) -> Result<()> {
    let document = input.document()?;
    let ssp = document.body();
    let dir = &ctx.config.output.reports_dir;

    let system_impl = ssp.get("system-implementation").unwrap_or(&Value::Null);
    let graph = ComponentGraph::from_system_implementation(system_impl);
    if graph.is_empty() {
        tracing::warn!("no components or inventory items found to visualize");
    } else {
        let mermaid = diagram::generate_component_diagram(&graph);
        let path = write_artifact(dir, "component_graph", "mmd", ctx.now, &mermaid)?;
        writeln!(ctx.out, "Component graph generated: {}", path.display())?;

        let graphviz = dot::generate_component_diagram(&graph);
        let path = write_artifact(dir, "component_graph", "dot", ctx.now, &graphviz)?;
        writeln!(ctx.out, "Component graph (DOT) generated: {}", path.display())?;
    }

    let page = html::format_ssp_report(ssp);
    let path = write_artifact(dir, "oscal_report", "html", ctx.now, &page)?;
    writeln!(ctx.out, "HTML report generated: {}", path.display())?;
    Ok(())
}
