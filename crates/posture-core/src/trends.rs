use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Month-over-month finding totals by severity.
///
/// Trend history is supplied from outside (a JSON file) or falls back to the
/// built-in six-month series; it is never derived from past runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub months: Vec<String>,
    pub critical: Vec<u32>,
    pub high: Vec<u32>,
    pub medium: Vec<u32>,
    pub low: Vec<u32>,
    pub total: Vec<u32>,
}

/// Direction of the critical-finding count over the last two periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskDirection {
    Increasing,
    Decreasing,
    Unknown,
}

impl std::fmt::Display for RiskDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskDirection::Increasing => write!(f, "Increasing"),
            RiskDirection::Decreasing => write!(f, "Decreasing"),
            RiskDirection::Unknown => write!(f, "Unknown"),
        }
    }
}

impl Default for TrendSeries {
    fn default() -> Self {
        let months = ["Aug", "Sep", "Oct", "Nov", "Dec", "Jan"];
        Self {
            months: months.iter().map(|m| m.to_string()).collect(),
            critical: vec![10, 15, 12, 8, 11, 14],
            high: vec![20, 25, 18, 22, 19, 21],
            medium: vec![30, 28, 32, 25, 29, 27],
            low: vec![15, 12, 14, 18, 13, 16],
            total: vec![75, 80, 76, 73, 72, 78],
        }
    }
}

impl TrendSeries {
    /// Load a series from a JSON file and check its shape.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read trend data '{}'", path.display()))?;
        let series: TrendSeries = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse trend data '{}'", path.display()))?;
        series.validate()?;
        Ok(series)
    }

    pub fn validate(&self) -> Result<()> {
        let expected = self.months.len();
        for (name, values) in [
            ("critical", &self.critical),
            ("high", &self.high),
            ("medium", &self.medium),
            ("low", &self.low),
            ("total", &self.total),
        ] {
            if values.len() != expected {
                bail!(
                    "trend series '{name}' has {} values but there are {expected} months",
                    values.len()
                );
            }
        }
        Ok(())
    }

    /// Risk direction by comparing the last two critical counts.
    pub fn risk_direction(&self) -> RiskDirection {
        match last_two(&self.critical) {
            Some((prev, last)) if last > prev => RiskDirection::Increasing,
            Some(_) => RiskDirection::Decreasing,
            None => RiskDirection::Unknown,
        }
    }

    /// Percentage change of the total between the last two periods.
    pub fn month_over_month_change(&self) -> Option<f64> {
        let (prev, last) = last_two(&self.total)?;
        if prev == 0 {
            return None;
        }
        Some((f64::from(last) - f64::from(prev)) / f64::from(prev) * 100.0)
    }

    /// Largest value across every series, for chart scaling.
    pub fn peak(&self) -> u32 {
        [&self.critical, &self.high, &self.medium, &self.low, &self.total]
            .iter()
            .flat_map(|s| s.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }
}

fn last_two(values: &[u32]) -> Option<(u32, u32)> {
    match values {
        [.., prev, last] => Some((*prev, *last)),
        _ => None,
    }
}
