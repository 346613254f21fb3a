use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::document::{array_or_empty, lookup, str_or, POAM_MARKER};
use crate::ledger::{ActionItem, ItemStatus};
use crate::scan::{ScanReport, Severity};

/// A high or critical finding called out by name in reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotableFinding {
    pub host: String,
    pub name: String,
    pub severity: Severity,
}

/// Per-severity and per-host aggregates over one scan.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScanSummary {
    /// Every item is counted, informational ones included.
    pub severity_counts: BTreeMap<Severity, usize>,
    /// Non-informational findings per host.
    pub findings_by_host: BTreeMap<String, usize>,
    /// High and critical findings in scan order.
    pub notable: Vec<NotableFinding>,
}

impl ScanSummary {
    pub fn from_report(report: &ScanReport) -> Self {
        let mut summary = Self::default();
        for host in &report.hosts {
            for item in &host.items {
                *summary.severity_counts.entry(item.severity).or_default() += 1;
                if item.severity == Severity::Info {
                    continue;
                }
                *summary
                    .findings_by_host
                    .entry(host.name.clone())
                    .or_default() += 1;
                if item.severity >= Severity::High {
                    summary.notable.push(NotableFinding {
                        host: host.name.clone(),
                        name: item.plugin_name.clone(),
                        severity: item.severity,
                    });
                }
            }
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.severity_counts.get(&severity).copied().unwrap_or(0)
    }

    /// Critical plus high.
    pub fn urgent_count(&self) -> usize {
        self.count(Severity::Critical) + self.count(Severity::High)
    }
}

/// POA&M items bucketed by status, plus open high-impact risks.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PoamStatus {
    pub open: Vec<String>,
    pub in_progress: Vec<String>,
    pub pending_review: Vec<String>,
    pub recently_closed: Vec<String>,
    pub high_risk: Vec<String>,
}

impl PoamStatus {
    pub fn from_items(items: &[ActionItem], poam: &Value) -> Self {
        let mut status = Self::default();
        for item in items {
            let bucket = match item.status() {
                ItemStatus::Open => &mut status.open,
                ItemStatus::InProgress => &mut status.in_progress,
                ItemStatus::Pending => &mut status.pending_review,
                ItemStatus::Completed => &mut status.recently_closed,
                ItemStatus::Other(_) => continue,
            };
            bucket.push(item.title.clone());
        }

        let risks = lookup(poam, &[POAM_MARKER, "risks"])
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for risk in risks {
            if str_or(risk, "status", "") != "open" {
                continue;
            }
            let high_impact = array_or_empty(risk, "characterizations")
                .iter()
                .flat_map(|c| array_or_empty(c, "facets"))
                .any(|facet| {
                    str_or(facet, "name", "") == "impact" && str_or(facet, "value", "") == "high"
                });
            if high_impact {
                status.high_risk.push(str_or(risk, "title", "").to_string());
            }
        }
        status
    }
}
