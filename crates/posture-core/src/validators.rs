//! Applicability predicates for operations.
//!
//! Each validator checks that a document tree carries the structure an
//! operation reads. They never panic: a missing key or a node of the wrong
//! type at any depth simply yields `false`.

use serde_json::Value;

use crate::document::{lookup, DocumentKind, POAM_MARKER, SAP_MARKER, SSP_MARKER};

/// Signature shared by every validator.
pub type Validator = fn(&Value) -> bool;

fn has(tree: &Value, path: &[&str]) -> bool {
    lookup(tree, path).is_some()
}

fn has_array(tree: &Value, path: &[&str]) -> bool {
    lookup(tree, path).is_some_and(Value::is_array)
}

pub fn is_ssp(tree: &Value) -> bool {
    has(tree, &[SSP_MARKER])
}

pub fn is_poam(tree: &Value) -> bool {
    has(tree, &[POAM_MARKER])
}

pub fn is_sap(tree: &Value) -> bool {
    has(tree, &[SAP_MARKER])
}

pub fn is_ssp_or_poam(tree: &Value) -> bool {
    is_ssp(tree) || is_poam(tree)
}

pub fn has_roles(tree: &Value) -> bool {
    has_array(tree, &[SSP_MARKER, "metadata", "roles"])
}

pub fn has_inventory(tree: &Value) -> bool {
    has_array(
        tree,
        &[SSP_MARKER, "system-implementation", "inventory-items"],
    )
}

pub fn has_components(tree: &Value) -> bool {
    has_array(tree, &[SSP_MARKER, "system-implementation", "components"])
}

/// User analysis resolves role ids against metadata roles, so both are required.
pub fn has_users(tree: &Value) -> bool {
    has_array(tree, &[SSP_MARKER, "system-implementation", "users"]) && has_roles(tree)
}

pub fn has_control_implementation(tree: &Value) -> bool {
    lookup(tree, &[SSP_MARKER, "control-implementation"]).is_some_and(Value::is_object)
}

pub fn has_security_impact(tree: &Value) -> bool {
    lookup(
        tree,
        &[
            SSP_MARKER,
            "system-characteristics",
            "security-impact-level",
        ],
    )
    .is_some_and(Value::is_object)
}

pub fn has_poam_items(tree: &Value) -> bool {
    has_array(tree, &[POAM_MARKER, "poam-items"])
}

pub fn has_activities(tree: &Value) -> bool {
    has_array(tree, &[SAP_MARKER, "local-definitions", "activities"])
}

/// Metadata object under whichever marker the document carries.
pub fn has_metadata(tree: &Value) -> bool {
    DocumentKind::KNOWN.iter().any(|kind| {
        kind.marker()
            .and_then(|m| lookup(tree, &[m, "metadata"]))
            .is_some_and(Value::is_object)
    })
}
