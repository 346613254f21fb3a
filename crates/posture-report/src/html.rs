use serde_json::Value;

use posture_core::document::{array_or_empty, str_or};

const STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 40px; }
.section { margin-bottom: 30px; }
.metadata { background-color: #f5f5f5; padding: 15px; border-radius: 5px; }
.component { border: 1px solid #ddd; padding: 15px; margin: 10px 0; border-radius: 5px; }
.inventory-item { background-color: #f9f9f9; padding: 15px; margin: 10px 0; border-radius: 5px; }
h2 { color: #333; border-bottom: 2px solid #eee; padding-bottom: 5px; }
.muted { color: #666; }
";

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Standalone HTML page summarising an SSP's system information, components,
/// and inventory.
pub fn format_ssp_report(ssp: &Value) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>OSCAL Component Analysis Report</title>\n");
    out.push_str(&format!("<style>\n{STYLE}</style>\n"));
    out.push_str("</head>\n<body>\n");

    render_metadata(&mut out, ssp.get("metadata").unwrap_or(&Value::Null));

    let system_impl = ssp.get("system-implementation").unwrap_or(&Value::Null);
    render_components(&mut out, array_or_empty(system_impl, "components"));
    render_inventory(&mut out, array_or_empty(system_impl, "inventory-items"));

    out.push_str("</body>\n</html>\n");
    out
}

fn render_metadata(out: &mut String, metadata: &Value) {
    out.push_str("<div class=\"section metadata\">\n<h2>System Information</h2>\n");
    for (label, key) in [
        ("Title", "title"),
        ("Version", "version"),
        ("Last Modified", "last-modified"),
    ] {
        out.push_str(&format!(
            "<p><strong>{label}:</strong> {}</p>\n",
            escape_html(str_or(metadata, key, "N/A"))
        ));
    }
    out.push_str("</div>\n");
}

fn render_components(out: &mut String, components: &[Value]) {
    out.push_str("<div class=\"section\">\n<h2>System Components</h2>\n");
    if components.is_empty() {
        out.push_str("<p class=\"muted\">None</p>\n");
    }
    for comp in components {
        out.push_str("<div class=\"component\">\n");
        out.push_str(&format!(
            "<h3>{}</h3>\n",
            escape_html(str_or(comp, "title", "Unnamed Component"))
        ));
        out.push_str(&format!(
            "<p><strong>Type:</strong> {}</p>\n",
            escape_html(str_or(comp, "type", "N/A"))
        ));
        out.push_str(&format!(
            "<p><strong>Description:</strong> {}</p>\n",
            escape_html(str_or(comp, "description", "N/A"))
        ));

        let links = array_or_empty(comp, "links");
        if !links.is_empty() {
            out.push_str("<p><strong>Links:</strong></p>\n<ul>\n");
            for link in links {
                let text = link
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_else(|| str_or(link, "href", "No description"));
                out.push_str(&format!(
                    "<li>{} ({} relationship)</li>\n",
                    escape_html(text),
                    escape_html(str_or(link, "rel", "unknown"))
                ));
            }
            out.push_str("</ul>\n");
        }

        if let Some(state) = comp
            .get("status")
            .and_then(|s| s.get("state"))
            .and_then(Value::as_str)
        {
            out.push_str(&format!(
                "<p><strong>Status:</strong> {}</p>\n",
                escape_html(state)
            ));
        }
        out.push_str("</div>\n");
    }
    out.push_str("</div>\n");
}

fn render_inventory(out: &mut String, items: &[Value]) {
    out.push_str("<div class=\"section\">\n<h2>Inventory Items</h2>\n");
    if items.is_empty() {
        out.push_str("<p class=\"muted\">None</p>\n");
    }
    for item in items {
        out.push_str("<div class=\"inventory-item\">\n");
        out.push_str(&format!(
            "<p><strong>Description:</strong> {}</p>\n",
            escape_html(str_or(item, "description", "N/A"))
        ));

        let props = array_or_empty(item, "props");
        if !props.is_empty() {
            out.push_str("<p><strong>Properties:</strong></p>\n<ul>\n");
            for prop in props {
                let class = prop
                    .get("class")
                    .and_then(Value::as_str)
                    .map(|c| format!(" ({})", escape_html(c)))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "<li>{}: {}{class}</li>\n",
                    escape_html(str_or(prop, "name", "unnamed")),
                    escape_html(str_or(prop, "value", "N/A"))
                ));
            }
            out.push_str("</ul>\n");
        }

        let implemented = array_or_empty(item, "implemented-components");
        if !implemented.is_empty() {
            out.push_str("<p><strong>Implemented Components:</strong></p>\n<ul>\n");
            for imp in implemented {
                out.push_str(&format!(
                    "<li>Component ID: {}</li>\n",
                    escape_html(str_or(imp, "component-uuid", "N/A"))
                ));
            }
            out.push_str("</ul>\n");
        }
        out.push_str("</div>\n");
    }
    out.push_str("</div>\n");
}
