use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PostureError, Result};

pub const SSP_MARKER: &str = "system-security-plan";
pub const POAM_MARKER: &str = "plan-of-action-and-milestones";
pub const SAP_MARKER: &str = "assessment-plan";

static NULL: Value = Value::Null;

/// Kind of compliance document, derived from its top-level marker key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Ssp,
    Poam,
    Sap,
    Unknown,
}

impl DocumentKind {
    /// Recognized kinds in classification priority order.
    pub const KNOWN: [DocumentKind; 3] = [DocumentKind::Ssp, DocumentKind::Poam, DocumentKind::Sap];

    /// Top-level key that marks a document of this kind.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            DocumentKind::Ssp => Some(SSP_MARKER),
            DocumentKind::Poam => Some(POAM_MARKER),
            DocumentKind::Sap => Some(SAP_MARKER),
            DocumentKind::Unknown => None,
        }
    }

    /// Upper-case label used in log lines and messages.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Ssp => "SSP",
            DocumentKind::Poam => "POA&M",
            DocumentKind::Sap => "SAP",
            DocumentKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Ssp => write!(f, "ssp"),
            DocumentKind::Poam => write!(f, "poam"),
            DocumentKind::Sap => write!(f, "sap"),
            DocumentKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Every recognized marker present at the top level of `tree`, in priority order.
pub fn markers_present(tree: &Value) -> Vec<DocumentKind> {
    let Some(map) = tree.as_object() else {
        return Vec::new();
    };
    DocumentKind::KNOWN
        .into_iter()
        .filter(|kind| kind.marker().is_some_and(|m| map.contains_key(m)))
        .collect()
}

/// Classify by fixed marker priority (ssp, then poam, then sap); first match wins.
///
/// Documents carrying several markers are silently classified by priority.
/// Use [`classify_strict`] to reject them instead.
pub fn classify(tree: &Value) -> DocumentKind {
    markers_present(tree)
        .first()
        .copied()
        .unwrap_or(DocumentKind::Unknown)
}

/// Classify, treating a document with more than one marker as ambiguous.
pub fn classify_strict(tree: &Value) -> Result<DocumentKind> {
    let present = markers_present(tree);
    match present.as_slice() {
        [] => Ok(DocumentKind::Unknown),
        [kind] => Ok(*kind),
        many => {
            let names: Vec<String> = many.iter().map(|k| k.to_string()).collect();
            Err(PostureError::validation(format!(
                "ambiguous document: found markers for {}",
                names.join(", ")
            )))
        }
    }
}

/// A loaded compliance document, one variant per recognized kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Ssp(Value),
    Poam(Value),
    Sap(Value),
}

impl Document {
    /// Wrap a parsed tree in the variant matching its marker.
    pub fn from_tree(tree: Value) -> Result<Self> {
        match classify_strict(&tree)? {
            DocumentKind::Ssp => Ok(Document::Ssp(tree)),
            DocumentKind::Poam => Ok(Document::Poam(tree)),
            DocumentKind::Sap => Ok(Document::Sap(tree)),
            DocumentKind::Unknown => Err(PostureError::validation(
                "file does not appear to be a valid OSCAL document",
            )),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Ssp(_) => DocumentKind::Ssp,
            Document::Poam(_) => DocumentKind::Poam,
            Document::Sap(_) => DocumentKind::Sap,
        }
    }

    pub fn tree(&self) -> &Value {
        match self {
            Document::Ssp(v) | Document::Poam(v) | Document::Sap(v) => v,
        }
    }

    /// The object under the document's marker key.
    pub fn body(&self) -> &Value {
        self.kind()
            .marker()
            .and_then(|m| self.tree().get(m))
            .unwrap_or(&NULL)
    }

    pub fn metadata(&self) -> Option<&Value> {
        let metadata = self.body().get("metadata");
        if metadata.is_none() {
            tracing::warn!("metadata section not found in {} document", self.kind().label());
        }
        metadata
    }

    pub fn title(&self) -> Option<&str> {
        self.body()
            .get("metadata")
            .and_then(|m| m.get("title"))
            .and_then(Value::as_str)
    }
}

/// Follow `path` through nested objects. Any missing key or non-object node yields `None`.
pub fn lookup<'a>(tree: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(tree, |node, key| node.as_object()?.get(*key))
}

/// String value of `key`, or `default` when absent or not a string.
pub fn str_or<'a>(node: &'a Value, key: &str, default: &'a str) -> &'a str {
    node.get(key).and_then(Value::as_str).unwrap_or(default)
}

/// Array under `key`, or an empty slice.
pub fn array_or_empty<'a>(node: &'a Value, key: &str) -> &'a [Value] {
    node.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
