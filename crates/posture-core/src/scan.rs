use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::error::{PostureError, Result};

/// Finding severity on the scanner's 0-4 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Severity::Info),
            1 => Some(Severity::Low),
            2 => Some(Severity::Medium),
            3 => Some(Severity::High),
            4 => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Severity::Info => 0,
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    /// Capitalized name for report tables.
    pub fn title(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Ok(level) = s.trim().parse::<u8>() {
            return Severity::from_level(level)
                .ok_or_else(|| anyhow!("severity level out of range (0-4): {s}"));
        }
        match s.trim().to_lowercase().as_str() {
            "info" | "none" => Ok(Severity::Info),
            "low" => Ok(Severity::Low),
            "medium" | "moderate" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(anyhow!("unknown severity: {s}")),
        }
    }
}

/// One `ReportItem` from the scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportItem {
    pub port: u16,
    pub protocol: String,
    pub service: String,
    pub severity: Severity,
    pub plugin_id: String,
    pub plugin_name: String,
    pub description: Option<String>,
}

/// One scanned host with its properties and findings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportHost {
    pub name: String,
    pub properties: BTreeMap<String, String>,
    pub items: Vec<ReportItem>,
}

impl ReportHost {
    pub fn ip(&self) -> Option<&str> {
        self.properties.get("host-ip").map(String::as_str)
    }

    pub fn os(&self) -> Option<&str> {
        self.properties
            .get("operating-system")
            .or_else(|| self.properties.get("os"))
            .map(String::as_str)
    }
}

/// A finding flattened out of its host, as consumed by the ledger merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub host: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub plugin_id: String,
}

/// An open port observed on a host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortEntry {
    pub port: u16,
    pub protocol: String,
    pub service: String,
}

/// Parsed scan results file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub hosts: Vec<ReportHost>,
}

/// Load and parse a scan results file.
pub fn load(path: &Path) -> Result<ScanReport> {
    if !path.exists() {
        return Err(PostureError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| PostureError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let report = ScanReport::parse(&content).map_err(|e| PostureError::Format {
        path: path.to_path_buf(),
        message: format!("{e:#}"),
    })?;
    tracing::info!(
        "loaded scan with {} host(s) from {}",
        report.hosts.len(),
        path.display()
    );
    Ok(report)
}

impl ScanReport {
    /// Parse scan XML. Hosts may appear at any depth under the root.
    pub fn parse(xml: &str) -> anyhow::Result<Self> {
        let doc = roxmltree::Document::parse(xml).context("invalid scan XML")?;
        let hosts = doc
            .descendants()
            .filter(|n| n.has_tag_name("ReportHost"))
            .map(parse_host)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { hosts })
    }

    /// Findings at or above `min`, flattened with their host name. Items
    /// without a plugin id cannot be tracked and are left out.
    pub fn findings(&self, min: Severity) -> Vec<Finding> {
        self.hosts
            .iter()
            .flat_map(|host| {
                host.items
                    .iter()
                    .filter(move |item| item.severity >= min && !item.plugin_id.is_empty())
                    .map(move |item| Finding {
                        host: host.name.clone(),
                        title: item.plugin_name.clone(),
                        description: item
                            .description
                            .clone()
                            .unwrap_or_else(|| "No description available".to_string()),
                        severity: item.severity,
                        plugin_id: item.plugin_id.clone(),
                    })
            })
            .collect()
    }

    /// Open ports per host. Port 0 (host-level plugins) is skipped.
    pub fn port_inventory(&self) -> BTreeMap<String, BTreeSet<PortEntry>> {
        let mut inventory: BTreeMap<String, BTreeSet<PortEntry>> = BTreeMap::new();
        for host in &self.hosts {
            let ports = inventory.entry(host.name.clone()).or_default();
            for item in host.items.iter().filter(|i| i.port != 0) {
                ports.insert(PortEntry {
                    port: item.port,
                    protocol: item.protocol.clone(),
                    service: item.service.clone(),
                });
            }
        }
        inventory
    }
}

fn parse_host(node: roxmltree::Node<'_, '_>) -> anyhow::Result<ReportHost> {
    let name = node.attribute("name").unwrap_or("unknown").to_string();

    let properties = node
        .children()
        .filter(|n| n.has_tag_name("HostProperties"))
        .flat_map(|props| props.children().filter(|n| n.has_tag_name("tag")))
        .filter_map(|tag| {
            let key = tag.attribute("name")?;
            Some((key.to_string(), tag.text().unwrap_or_default().trim().to_string()))
        })
        .collect();

    let items = node
        .children()
        .filter(|n| n.has_tag_name("ReportItem"))
        .map(|item| parse_item(item).with_context(|| format!("in host '{name}'")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(ReportHost {
        name,
        properties,
        items,
    })
}

fn parse_item(node: roxmltree::Node<'_, '_>) -> anyhow::Result<ReportItem> {
    let plugin_id = node
        .attribute("pluginID")
        .unwrap_or_default()
        .trim()
        .to_string();

    let severity_attr = node.attribute("severity").unwrap_or("0");
    let severity: Severity = severity_attr
        .parse()
        .with_context(|| format!("invalid severity on plugin '{plugin_id}'"))?;

    let port_attr = node.attribute("port").unwrap_or("0");
    let port: u16 = port_attr
        .trim()
        .parse()
        .with_context(|| format!("invalid port '{port_attr}' on plugin '{plugin_id}'"))?;

    let plugin_name = node
        .attribute("pluginName")
        .map(str::to_string)
        .or_else(|| child_text(node, "plugin_name"))
        .unwrap_or_else(|| "Unknown Finding".to_string());

    Ok(ReportItem {
        port,
        protocol: node.attribute("protocol").unwrap_or("tcp").to_string(),
        service: node.attribute("svc_name").unwrap_or("unknown").to_string(),
        severity,
        plugin_id,
        plugin_name,
        description: child_text(node, "description"),
    })
}

fn child_text(node: roxmltree::Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
}
