use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{array_or_empty, str_or};

/// What an SSP graph node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Component,
    InventoryItem,
    /// Referenced by a link but not declared in the SSP
    External,
}

/// Node in the component graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub title: String,
    pub node_type: String,
    pub kind: NodeKind,
}

/// Edge in the component graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub relationship: String,
}

/// Directed graph of SSP components, inventory items, and their links.
pub struct ComponentGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    index: HashMap<String, NodeIndex>,
}

const TITLE_LIMIT: usize = 30;

impl ComponentGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Build from the `system-implementation` section of an SSP.
    pub fn from_system_implementation(system_impl: &Value) -> Self {
        let mut graph = Self::new();

        for comp in array_or_empty(system_impl, "components") {
            let id = str_or(comp, "uuid", "unknown").to_string();
            graph.add_node(GraphNode {
                id: id.clone(),
                title: str_or(comp, "title", "Unnamed Component").to_string(),
                node_type: str_or(comp, "type", "unknown").to_string(),
                kind: NodeKind::Component,
            });
            for link in array_or_empty(comp, "links") {
                let target = str_or(link, "href", "").trim_start_matches('#');
                if !target.is_empty() {
                    graph.add_edge(&id, target, str_or(link, "rel", "unknown"));
                }
            }
        }

        for item in array_or_empty(system_impl, "inventory-items") {
            let id = str_or(item, "uuid", "unknown").to_string();
            graph.add_node(GraphNode {
                id: id.clone(),
                title: shorten(str_or(item, "description", "No description")),
                node_type: "inventory-item".to_string(),
                kind: NodeKind::InventoryItem,
            });
            for implemented in array_or_empty(item, "implemented-components") {
                if let Some(component) = implemented.get("component-uuid").and_then(Value::as_str)
                {
                    graph.add_edge(&id, component, "implements");
                }
            }
        }

        graph
    }

    /// Add a node. A node already present under the same id is upgraded from
    /// an external placeholder but otherwise kept.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.id) {
            if self.graph[idx].kind == NodeKind::External {
                self.graph[idx] = node;
            }
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    /// Ensure an id exists as a node, creating an external placeholder if needed.
    pub fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        self.add_node(GraphNode {
            id: id.to_string(),
            title: id.to_string(),
            node_type: "external".to_string(),
            kind: NodeKind::External,
        })
    }

    pub fn add_edge(&mut self, from: &str, to: &str, relationship: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        self.graph.add_edge(
            from_idx,
            to_idx,
            GraphEdge {
                relationship: relationship.to_string(),
            },
        );
    }

    /// Iterate over all edges with their source and target nodes.
    pub fn edges_with_nodes(&self) -> Vec<(&GraphNode, &GraphNode, &GraphEdge)> {
        self.graph
            .edge_references()
            .map(|e| {
                let src = &self.graph[e.source()];
                let tgt = &self.graph[e.target()];
                (src, tgt, e.weight())
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> Vec<&GraphNode> {
        self.graph.node_weights().collect()
    }
}

impl Default for ComponentGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn shorten(text: &str) -> String {
    if text.chars().count() > TITLE_LIMIT {
        let head: String = text.chars().take(TITLE_LIMIT).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
