use posture_core::graph::{ComponentGraph, NodeKind};

/// Generate a Mermaid flowchart of SSP components and inventory items.
pub fn generate_component_diagram(graph: &ComponentGraph) -> String {
    let mut out = String::new();
    out.push_str("flowchart LR\n");

    let mut components = Vec::new();
    let mut inventory = Vec::new();
    let mut external = Vec::new();

    for node in graph.nodes() {
        let id = sanitize_mermaid_id(&node.id);
        let label = escape_label(&format!("{} ({})", node.title, node.node_type));
        let line = match node.kind {
            NodeKind::InventoryItem => format!("    {id}([\"{label}\"])"),
            _ => format!("    {id}[\"{label}\"]"),
        };
        match node.kind {
            NodeKind::Component => components.push((id, line)),
            NodeKind::InventoryItem => inventory.push((id, line)),
            NodeKind::External => external.push((id, line)),
        }
    }

    for (title, nodes) in [
        ("Components", &components),
        ("Inventory", &inventory),
        ("External", &external),
    ] {
        if nodes.is_empty() {
            continue;
        }
        out.push_str(&format!("  subgraph {title}\n"));
        for (_, line) in nodes {
            out.push_str(&format!("{line}\n"));
        }
        out.push_str("  end\n");
    }

    for (src, tgt, edge) in graph.edges_with_nodes() {
        let from = sanitize_mermaid_id(&src.id);
        let to = sanitize_mermaid_id(&tgt.id);
        let rel = escape_label(&edge.relationship);
        if tgt.kind == NodeKind::External {
            out.push_str(&format!("  {from} -.->|\"{rel}\"| {to}\n"));
        } else {
            out.push_str(&format!("  {from} -->|\"{rel}\"| {to}\n"));
        }
    }

    out.push_str("\n  classDef component fill:#e3f2fd\n");
    out.push_str("  classDef inventory fill:#e8f5e9\n");
    out.push_str("  classDef external fill:#fff3e0,stroke-dasharray: 5 5\n");
    for (class, nodes) in [
        ("component", &components),
        ("inventory", &inventory),
        ("external", &external),
    ] {
        if !nodes.is_empty() {
            let ids: Vec<&str> = nodes.iter().map(|(id, _)| id.as_str()).collect();
            out.push_str(&format!("  class {} {class}\n", ids.join(",")));
        }
    }

    out
}

/// Sanitize a string to be a valid Mermaid node ID.
fn sanitize_mermaid_id(s: &str) -> String {
    let id: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    // ids starting with a digit confuse the parser
    format!("n_{id}")
}

fn escape_label(s: &str) -> String {
    s.replace('"', "#quot;")
}
