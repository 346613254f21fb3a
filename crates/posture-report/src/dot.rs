use posture_core::graph::{ComponentGraph, GraphNode, NodeKind};

/// Generate a GraphViz DOT diagram of SSP components and inventory items.
pub fn generate_component_diagram(graph: &ComponentGraph) -> String {
    let mut out = String::new();
    out.push_str("digraph components {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, style=filled];\n\n");

    let clusters = [
        (NodeKind::Component, "components", "Components", "#e3f2fd"),
        (NodeKind::InventoryItem, "inventory", "Inventory", "#e8f5e9"),
    ];
    let nodes = graph.nodes();

    for (kind, name, label, color) in &clusters {
        let members: Vec<&&GraphNode> = nodes.iter().filter(|n| n.kind == *kind).collect();
        if members.is_empty() {
            continue;
        }
        out.push_str(&format!("  subgraph cluster_{name} {{\n"));
        out.push_str(&format!("    label=\"{label}\";\n"));
        out.push_str("    style=filled;\n");
        out.push_str(&format!("    color=\"{color}\";\n"));
        out.push_str("    node [fillcolor=white];\n");
        for node in members {
            out.push_str(&format!(
                "    {} [label=\"{}\\n({})\"];\n",
                sanitize_dot_id(&node.id),
                escape(&node.title),
                escape(&node.node_type)
            ));
        }
        out.push_str("  }\n\n");
    }

    let external: Vec<&&GraphNode> = nodes
        .iter()
        .filter(|n| n.kind == NodeKind::External)
        .collect();
    for node in &external {
        out.push_str(&format!(
            "  {} [label=\"{}\", style=dashed];\n",
            sanitize_dot_id(&node.id),
            escape(&node.title)
        ));
    }
    if !external.is_empty() {
        out.push('\n');
    }

    for (src, tgt, edge) in graph.edges_with_nodes() {
        let from = sanitize_dot_id(&src.id);
        let to = sanitize_dot_id(&tgt.id);
        let label = escape(&edge.relationship);
        if tgt.kind == NodeKind::External {
            out.push_str(&format!(
                "  {from} -> {to} [style=dashed, label=\"{label}\"];\n"
            ));
        } else {
            out.push_str(&format!("  {from} -> {to} [label=\"{label}\"];\n"));
        }
    }

    out.push_str("}\n");
    out
}

/// Sanitize a string to be a valid DOT node ID.
fn sanitize_dot_id(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    // DOT IDs must start with a letter or underscore
    if cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        format!("n_{cleaned}")
    } else {
        cleaned
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
