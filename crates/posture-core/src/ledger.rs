//! POA&M action-item ledger and its merge against fresh scan findings.
//!
//! The ledger is append-only: items are created when a finding first shows
//! up, carried forward while it persists, and closed (never removed) once it
//! disappears from the scan.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::document::{lookup, POAM_MARKER};
use crate::scan::Finding;

/// Remediation status of an action item. Values outside the four tracked
/// states are kept verbatim in `Other` and count as active.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemStatus {
    #[default]
    Open,
    InProgress,
    Pending,
    Completed,
    Other(String),
}

impl ItemStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ItemStatus::Open => "open",
            ItemStatus::InProgress => "in-progress",
            ItemStatus::Pending => "pending",
            ItemStatus::Completed => "completed",
            ItemStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for ItemStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "open" => ItemStatus::Open,
            "in-progress" => ItemStatus::InProgress,
            "pending" => ItemStatus::Pending,
            "completed" => ItemStatus::Completed,
            _ => ItemStatus::Other(raw),
        }
    }
}

impl From<ItemStatus> for String {
    fn from(status: ItemStatus) -> Self {
        match status {
            ItemStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// The scan finding an action item tracks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelatedFinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Contents of an item's `related-findings` field. Anything that is not a
/// scan-finding object (such as the OSCAL list of finding references) is
/// carried through as-is and never matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Related {
    Scan(RelatedFinding),
    Raw(Value),
}

/// One ledger entry. Fields the tool does not model are kept in `extra`
/// and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        rename = "related-findings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub related_finding: Option<Related>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActionItem {
    /// New open item for a finding that has no ledger entry yet.
    pub fn from_finding(finding: &Finding, uuid: String) -> Self {
        Self {
            uuid,
            title: finding.title.clone(),
            description: finding.description.clone(),
            related_finding: Some(Related::Scan(RelatedFinding {
                plugin_id: Some(finding.plugin_id.clone()),
                host: Some(finding.host.clone()),
                severity: Some(finding.severity.level()),
                extra: Map::new(),
            })),
            status: Some(ItemStatus::Open),
            extra: Map::new(),
        }
    }

    /// The tracked scan finding, when `related-findings` holds one.
    pub fn finding(&self) -> Option<&RelatedFinding> {
        match self.related_finding.as_ref()? {
            Related::Scan(finding) => Some(finding),
            Related::Raw(_) => None,
        }
    }

    pub fn plugin_id(&self) -> Option<&str> {
        self.finding()
            .and_then(|r| r.plugin_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Effective status; an item without one is open.
    pub fn status(&self) -> ItemStatus {
        self.status.clone().unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.status != Some(ItemStatus::Completed)
    }
}

/// Fresh stable identifier for a new ledger entry.
pub fn new_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Result of merging findings into a ledger.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeOutcome {
    pub items: Vec<ActionItem>,
    pub created: usize,
    pub carried: usize,
    pub reopened: usize,
    pub closed: usize,
}

/// Merge current findings into an existing ledger.
///
/// Output order is active items in finding order, followed by every other
/// existing item in ledger order. `new_id` is called once per created item.
pub fn merge(
    existing: Vec<ActionItem>,
    findings: &[Finding],
    mut new_id: impl FnMut() -> String,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    // plugin id -> ledger position; an active entry wins over a closed one
    let mut index: HashMap<String, usize> = HashMap::new();
    for (pos, item) in existing.iter().enumerate() {
        let Some(plugin_id) = item.plugin_id() else {
            continue;
        };
        match index.entry(plugin_id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(pos);
            }
            Entry::Occupied(mut slot) => {
                if !existing[*slot.get()].is_active() && item.is_active() {
                    slot.insert(pos);
                }
            }
        }
    }

    let mut slots: Vec<Option<ActionItem>> = existing.into_iter().map(Some).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    for finding in findings {
        if !seen.insert(finding.plugin_id.as_str()) {
            continue;
        }
        let matched = index
            .get(&finding.plugin_id)
            .and_then(|&pos| slots[pos].take());
        match matched {
            Some(mut item) => {
                if item.is_active() {
                    outcome.carried += 1;
                } else {
                    item.status = Some(ItemStatus::Open);
                    outcome.reopened += 1;
                }
                outcome.items.push(item);
            }
            None => {
                outcome.items.push(ActionItem::from_finding(finding, new_id()));
                outcome.created += 1;
            }
        }
    }

    for mut item in slots.into_iter().flatten() {
        if item.plugin_id().is_some() && item.is_active() {
            item.status = Some(ItemStatus::Completed);
            outcome.closed += 1;
        }
        outcome.items.push(item);
    }

    tracing::debug!(
        created = outcome.created,
        carried = outcome.carried,
        reopened = outcome.reopened,
        closed = outcome.closed,
        "merged findings into ledger"
    );
    outcome
}

/// Read the action items of a POA&M tree. A missing item list is empty.
pub fn read_items(poam: &Value) -> Result<Vec<ActionItem>> {
    let Some(items) = lookup(poam, &[POAM_MARKER, "poam-items"]) else {
        return Ok(Vec::new());
    };
    serde_json::from_value(items.clone()).context("failed to read poam-items")
}

/// Replace the action items of a POA&M tree and stamp `last-modified`.
pub fn write_items(poam: &mut Value, items: &[ActionItem], now: DateTime<Local>) -> Result<()> {
    let body = poam
        .get_mut(POAM_MARKER)
        .and_then(Value::as_object_mut)
        .context("document is not a POA&M")?;
    body.insert(
        "poam-items".to_string(),
        serde_json::to_value(items).context("failed to serialize poam-items")?,
    );
    let metadata = body
        .entry("metadata")
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .context("POA&M metadata is not an object")?;
    metadata.insert("last-modified".to_string(), json!(now.to_rfc3339()));
    Ok(())
}

/// Empty POA&M used when no ledger exists yet.
pub fn empty_poam(now: DateTime<Local>) -> Value {
    json!({
        POAM_MARKER: {
            "uuid": new_item_id(),
            "metadata": {
                "title": "Generated POA&M",
                "last-modified": now.to_rfc3339(),
                "version": "1.0",
                "oscal-version": "1.1.2"
            },
            "poam-items": []
        }
    })
}

/// Copy system identity from an SSP body into a POA&M tree.
pub fn seed_from_ssp(poam: &mut Value, ssp_body: &Value) {
    let Some(body) = poam.get_mut(POAM_MARKER).and_then(Value::as_object_mut) else {
        return;
    };
    if let Some(metadata) = ssp_body.get("metadata") {
        let system = metadata
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Unknown System");
        if let Some(target) = body.get_mut("metadata").and_then(Value::as_object_mut) {
            target.insert("title".to_string(), json!(format!("POA&M for {system}")));
        }
    }
    if let Some(system_id) = lookup(ssp_body, &["system-characteristics", "system-ids"])
        .and_then(Value::as_array)
        .and_then(|ids| ids.first())
    {
        body.insert("system-id".to_string(), system_id.clone());
    }
}
