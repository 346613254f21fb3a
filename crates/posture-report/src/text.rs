use std::collections::{BTreeMap, BTreeSet};

use colored::Colorize;
use serde_json::Value;

use posture_core::document::{array_or_empty, lookup, str_or, Document};
use posture_core::scan::{PortEntry, ScanReport};

const KNOWN_ROLES: [(&str, &str); 4] = [
    ("owner", "The System Owner is"),
    ("developer", "The Lead Developer is"),
    ("system-engineer", "The Lead Engineer is"),
    ("public-affairs-office", "The Public Affairs Office Lead is"),
];

fn heading(out: &mut String, title: &str) {
    out.push_str(&format!("\n{}\n", title.bold()));
    out.push_str(&format!("{}\n", "=".repeat(title.len())));
}

/// Key roles declared in SSP metadata.
pub fn format_roles(ssp: &Value) -> String {
    let mut out = String::new();
    let roles = lookup(ssp, &["metadata", "roles"])
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut found = false;
    for role in roles {
        let id = str_or(role, "id", "");
        if let Some((_, label)) = KNOWN_ROLES.iter().find(|(known, _)| *known == id) {
            out.push_str(&format!("{label}: {}\n", str_or(role, "title", "Unnamed")));
            found = true;
        }
    }
    if !found {
        out.push_str("No roles found in the SSP.\n");
    }
    out
}

/// Inventory items with their properties and implemented components.
pub fn format_components(ssp: &Value) -> String {
    let mut out = String::new();
    let items = lookup(ssp, &["system-implementation", "inventory-items"])
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for item in items {
        out.push_str(&format!(
            "Description: {}\n",
            str_or(item, "description", "No description")
        ));
        out.push_str("Properties:\n");
        for prop in array_or_empty(item, "props") {
            out.push_str(&format!(
                "  {}: {} ({})\n",
                str_or(prop, "name", "unnamed"),
                str_or(prop, "value", ""),
                str_or(prop, "class", "")
            ));
        }
        out.push_str("Implemented Components:\n");
        for implemented in array_or_empty(item, "implemented-components") {
            for prop in array_or_empty(implemented, "props") {
                out.push_str(&format!(
                    "    {}: {}\n",
                    str_or(prop, "name", "unnamed"),
                    str_or(prop, "value", "")
                ));
            }
        }
        out.push('\n');
    }
    out
}

/// Implemented requirements with statements and component responsibilities.
pub fn format_controls(ssp: &Value) -> String {
    let mut out = String::new();
    let implementation = ssp.get("control-implementation").unwrap_or(&Value::Null);

    heading(&mut out, "Implemented Controls Analysis");
    out.push_str(&format!(
        "Description: {}\n",
        str_or(implementation, "description", "No description provided")
    ));

    for req in array_or_empty(implementation, "implemented-requirements") {
        out.push_str(&format!(
            "\n{}: {}\n",
            "Control ID".bold(),
            str_or(req, "control-id", "Unknown")
        ));
        let statements = array_or_empty(req, "statements");
        if statements.is_empty() {
            continue;
        }
        out.push_str("Statements:\n");
        for stmt in statements {
            out.push_str(&format!("- ID: {}\n", str_or(stmt, "statement-id", "Unknown")));
            let by_components = array_or_empty(stmt, "by-components");
            if by_components.is_empty() {
                continue;
            }
            out.push_str("  Implemented By Components:\n");
            for comp in by_components {
                out.push_str(&format!(
                    "  * Component: {}\n",
                    str_or(comp, "component-uuid", "Unknown")
                ));
                out.push_str(&format!(
                    "    Description: {}\n",
                    str_or(comp, "description", "No description")
                ));
                let params = array_or_empty(comp, "set-parameters");
                if params.is_empty() {
                    continue;
                }
                out.push_str("    Parameters:\n");
                for param in params {
                    let values: Vec<&str> = array_or_empty(param, "values")
                        .iter()
                        .filter_map(Value::as_str)
                        .collect();
                    out.push_str(&format!(
                        "    - {}: {}\n",
                        str_or(param, "param-id", "unknown"),
                        values.join(", ")
                    ));
                }
            }
        }
    }
    out
}

/// CIA impact levels plus per-information-type adjustments.
pub fn format_security_levels(ssp: &Value) -> String {
    let mut out = String::new();
    let characteristics = ssp.get("system-characteristics").unwrap_or(&Value::Null);
    let levels = characteristics
        .get("security-impact-level")
        .unwrap_or(&Value::Null);

    heading(&mut out, "Security Impact Level Analysis");
    for (label, key) in [
        ("Confidentiality", "security-objective-confidentiality"),
        ("Integrity", "security-objective-integrity"),
        ("Availability", "security-objective-availability"),
    ] {
        out.push_str(&format!("{label}: {}\n", str_or(levels, key, "Not specified")));
    }

    let Some(info) = characteristics.get("system-information") else {
        return out;
    };
    out.push_str("\nInformation Type Details:\n");
    for info_type in array_or_empty(info, "information-types") {
        out.push_str(&format!("\nTitle: {}\n", str_or(info_type, "title", "Unnamed")));
        out.push_str(&format!(
            "Description: {}\n",
            str_or(info_type, "description", "No description")
        ));
        for (label, key) in [
            ("Confidentiality", "confidentiality-impact"),
            ("Integrity", "integrity-impact"),
            ("Availability", "availability-impact"),
        ] {
            let impact = info_type.get(key).unwrap_or(&Value::Null);
            let base = str_or(impact, "base", "Not specified");
            match impact.get("adjustment-justification").and_then(Value::as_str) {
                Some(justification) => {
                    out.push_str(&format!(
                        "{label}: {base} (Adjusted to {})\n",
                        str_or(impact, "selected", "Same as base")
                    ));
                    out.push_str(&format!("Justification: {justification}\n"));
                }
                None => out.push_str(&format!("{label}: {base}\n")),
            }
        }
    }
    out
}

/// Users with their type, resolved role titles, and authorized privileges.
pub fn format_user_privileges(ssp: &Value) -> String {
    let mut out = String::new();
    let roles: BTreeMap<&str, &str> = lookup(ssp, &["metadata", "roles"])
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .filter_map(|role| {
            Some((
                role.get("id")?.as_str()?,
                role.get("title").and_then(Value::as_str).unwrap_or(""),
            ))
        })
        .collect();

    heading(&mut out, "User Privilege Analysis");
    let users = lookup(ssp, &["system-implementation", "users"])
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for user in users {
        out.push_str(&format!("\n{}: {}\n", "User".bold(), str_or(user, "title", "Unnamed")));
        let user_type = array_or_empty(user, "props")
            .iter()
            .find(|p| str_or(p, "name", "") == "type")
            .map(|p| str_or(p, "value", "Not specified"))
            .unwrap_or("Not specified");
        out.push_str(&format!("Type: {user_type}\n"));

        out.push_str("Assigned Roles:\n");
        for role_id in array_or_empty(user, "role-ids").iter().filter_map(Value::as_str) {
            let title = roles.get(role_id).copied().unwrap_or(role_id);
            out.push_str(&format!("- {title}\n"));
        }

        if let Some(privileges) = user.get("authorized-privileges").and_then(Value::as_array) {
            out.push_str("Authorized Privileges:\n");
            for privilege in privileges {
                out.push_str(&format!(
                    "- {}:\n",
                    str_or(privilege, "title", "Unnamed privilege")
                ));
                for function in array_or_empty(privilege, "functions-performed")
                    .iter()
                    .filter_map(Value::as_str)
                {
                    out.push_str(&format!("  * {function}\n"));
                }
            }
        }
    }
    out
}

/// Action-item count followed by each item's title and description.
pub fn format_poams(poam: &Value) -> String {
    let mut out = String::new();
    let items = array_or_empty(poam, "poam-items");
    out.push_str(&format!("Total number of POAM items: {}\n\n", items.len()));
    for (index, item) in items.iter().enumerate() {
        out.push_str(&format!("POAM Item {}:\n", index + 1));
        out.push_str(&format!("  Title: {}\n", str_or(item, "title", "Untitled")));
        out.push_str(&format!(
            "  Description: {}\n\n",
            str_or(item, "description", "No description")
        ));
    }
    out
}

/// Assessor and planned activities from an assessment plan.
pub fn format_activities(sap: &Value) -> String {
    let mut out = String::new();
    let roles = lookup(sap, &["metadata", "roles"])
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    for role in roles.iter().filter(|r| str_or(r, "id", "") == "assessor") {
        out.push_str(&format!("The 3PAO is: {}\n", str_or(role, "title", "Unnamed")));
    }
    out.push('\n');

    let activities = lookup(sap, &["local-definitions", "activities"])
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    for (index, activity) in activities.iter().enumerate() {
        let first_step = array_or_empty(activity, "steps")
            .first()
            .map(|step| str_or(step, "title", "No steps"))
            .unwrap_or("No steps");
        out.push_str(&format!("Activity #{}:\n", index + 1));
        out.push_str(&format!(" Title: {}\n", str_or(activity, "title", "Untitled")));
        out.push_str(&format!(" Description: {first_step}\n\n"));
    }
    out
}

/// Document identity fields from metadata.
pub fn format_metadata(document: &Document) -> String {
    let mut out = String::new();
    let metadata = document.metadata().unwrap_or(&Value::Null);
    heading(&mut out, &format!("{} Metadata", document.kind().label()));
    for (label, key) in [
        ("Title", "title"),
        ("Version", "version"),
        ("Last Modified", "last-modified"),
        ("OSCAL Version", "oscal-version"),
    ] {
        out.push_str(&format!("{label}: {}\n", str_or(metadata, key, "N/A")));
    }
    out
}

/// Per-host open ports. Ports outside `approved` are flagged unless the list
/// is empty.
pub fn format_ports(report: &ScanReport, approved: &[u16]) -> String {
    let mut out = String::new();
    let inventory: BTreeMap<String, BTreeSet<PortEntry>> = report.port_inventory();
    let approved: BTreeSet<u16> = approved.iter().copied().collect();

    heading(&mut out, "Open Port Review");
    if report.hosts.is_empty() {
        out.push_str("No hosts found in scan.\n");
        return out;
    }

    let mut unapproved: BTreeSet<u16> = BTreeSet::new();
    for host in &report.hosts {
        out.push_str(&format!("\n{}: {}\n", "Host".bold(), host.name));
        if let Some(ip) = host.ip() {
            out.push_str(&format!("  IP: {ip}\n"));
        }
        if let Some(os) = host.os() {
            out.push_str(&format!("  OS: {os}\n"));
        }
        let ports = inventory.get(&host.name).cloned().unwrap_or_default();
        if ports.is_empty() {
            out.push_str("  No open ports observed\n");
            continue;
        }
        for entry in &ports {
            let flagged = !approved.is_empty() && !approved.contains(&entry.port);
            let line = format!("  {}/{} {}", entry.port, entry.protocol, entry.service);
            if flagged {
                unapproved.insert(entry.port);
                out.push_str(&format!("{line} {}\n", "[not approved]".red()));
            } else {
                out.push_str(&format!("{line}\n"));
            }
        }
    }

    if approved.is_empty() {
        return out;
    }
    out.push('\n');
    if unapproved.is_empty() {
        out.push_str(&format!(
            "{}\n",
            "All observed ports are in the approved list.".green()
        ));
    } else {
        let ports: Vec<String> = unapproved.iter().map(u16::to_string).collect();
        out.push_str(&format!(
            "Ports observed but not approved: {}\n",
            ports.join(", ")
        ));
    }
    out
}
