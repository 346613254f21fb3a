use std::collections::BTreeMap;

use posture_core::scan::Severity;
use posture_core::summary::{PoamStatus, ScanSummary};
use posture_core::trends::TrendSeries;

/// How many entries each narrated list shows.
const TOP_N: usize = 5;

/// Template used when no custom template is configured.
pub const DEFAULT_TEMPLATE: &str = "\
# Monthly Security Status Report

**System:** {{system}}
**Report Date:** {{date}}
**System ID:** {{system_id}}
**POA&M Version:** {{poam_id}}

## Executive Summary

### Key Metrics
{{key_metrics}}

## Finding Trends

{{trend_chart}}

### Trend Analysis
{{trend_analysis}}

## High-Risk POA&M Items

{{high_risk_items}}

## Current Scan Results

| Severity   | Count |
|------------|-------|
{{severity_table}}

### High and Critical Findings

{{notable_findings}}

### Findings by Host

| Host | Findings |
|------|----------|
{{host_table}}

## POA&M Status

- Open: {{open_count}}
- Recently Closed: {{closed_count}}
- In Progress: {{in_progress_count}}
- Pending Review: {{pending_count}}
";

/// Everything the monthly report is assembled from.
#[derive(Debug, Clone)]
pub struct MonthlyReport<'a> {
    pub system_name: &'a str,
    pub system_id: &'a str,
    pub poam_version: &'a str,
    /// Already formatted for display, e.g. "January 05, 2026".
    pub date: String,
    pub poam: &'a PoamStatus,
    pub scan: &'a ScanSummary,
    pub trends: &'a TrendSeries,
}

/// Render the monthly report into `template`.
pub fn format_monthly_report(template: &str, report: &MonthlyReport<'_>) -> String {
    fill_template(template, &report_values(report))
}

fn report_values(report: &MonthlyReport<'_>) -> BTreeMap<&'static str, String> {
    let mut values = BTreeMap::new();
    values.insert(
        "system",
        format!("{} ({})", report.system_name, report.system_id),
    );
    values.insert("date", report.date.clone());
    values.insert("system_id", report.system_id.to_string());
    values.insert("poam_id", report.poam_version.to_string());
    values.insert("key_metrics", key_metrics(report));
    values.insert("trend_chart", trend_chart(report.trends));
    values.insert("trend_analysis", trend_analysis(report));
    values.insert(
        "high_risk_items",
        bullet_list(report.poam.high_risk.iter().map(String::as_str)),
    );
    values.insert("severity_table", severity_table(report.scan));
    values.insert(
        "notable_findings",
        bullet_list(
            report
                .scan
                .notable
                .iter()
                .map(|n| format!("{} ({}, {})", n.name, n.host, n.severity.title())),
        ),
    );
    values.insert("host_table", host_table(report.scan));
    values.insert("open_count", report.poam.open.len().to_string());
    values.insert("closed_count", report.poam.recently_closed.len().to_string());
    values.insert("in_progress_count", report.poam.in_progress.len().to_string());
    values.insert("pending_count", report.poam.pending_review.len().to_string());
    values
}

/// Replace `{{name}}` tokens. Unknown names are left in place.
pub fn fill_template(template: &str, values: &BTreeMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match values.get(key) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn key_metrics(report: &MonthlyReport<'_>) -> String {
    format!(
        "- Total Open POA&Ms: {}\n- Critical/High Findings: {}\n- Risk Level Trend: {}",
        report.poam.open.len(),
        report.scan.urgent_count(),
        report.trends.risk_direction()
    )
}

/// Mermaid `xychart-beta` block for the trend series.
pub fn trend_chart(trends: &TrendSeries) -> String {
    let months: Vec<String> = trends.months.iter().map(|m| format!("\"{m}\"")).collect();
    let ceiling = trends.peak().max(100).div_ceil(10).saturating_mul(10);
    let mut out = String::new();
    out.push_str("```mermaid\nxychart-beta\n");
    out.push_str("    title \"Six Month Finding Trends\"\n");
    out.push_str(&format!("    x-axis [{}]\n", months.join(", ")));
    out.push_str(&format!(
        "    y-axis \"Number of Findings\" 0 --> {ceiling}\n"
    ));
    for (values, label) in [
        (&trends.critical, "Critical"),
        (&trends.high, "High"),
        (&trends.medium, "Medium"),
        (&trends.low, "Low"),
    ] {
        out.push_str(&format!("    bar {} \"{label}\"\n", series(values)));
    }
    out.push_str(&format!(
        "    line {} \"Total Findings\"\n",
        series(&trends.total)
    ));
    out.push_str("```");
    out
}

fn series(values: &[u32]) -> String {
    let items: Vec<String> = values.iter().map(u32::to_string).collect();
    format!("[{}]", items.join(", "))
}

fn trend_analysis(report: &MonthlyReport<'_>) -> String {
    let change = match report.trends.month_over_month_change() {
        Some(pct) => format!("{pct:.1}%"),
        None => "n/a".to_string(),
    };
    let most_frequent = Severity::ALL
        .iter()
        .filter(|s| **s != Severity::Info)
        .map(|s| (report.scan.count(*s), *s))
        .filter(|(count, _)| *count > 0)
        .max_by_key(|(count, s)| (*count, *s))
        .map(|(_, s)| s.title())
        .unwrap_or("None");
    format!(
        "- Month-over-month change in total findings: {change}\n\
         - Most frequent finding category: {most_frequent}\n\
         - Notable changes: {} high or critical findings in the current scan",
        report.scan.notable.len()
    )
}

fn severity_table(scan: &ScanSummary) -> String {
    let rows: Vec<String> = Severity::ALL
        .iter()
        .map(|s| format!("| {:<10} | {} |", s.title(), scan.count(*s)))
        .collect();
    rows.join("\n")
}

fn host_table(scan: &ScanSummary) -> String {
    if scan.findings_by_host.is_empty() {
        return "| (none) | 0 |".to_string();
    }
    let rows: Vec<String> = scan
        .findings_by_host
        .iter()
        .map(|(host, count)| format!("| {host} | {count} |"))
        .collect();
    rows.join("\n")
}

fn bullet_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<String> = items
        .into_iter()
        .take(TOP_N)
        .map(|item| format!("- {}", item.as_ref()))
        .collect();
    if lines.is_empty() {
        "- None".to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posture_core::summary::NotableFinding;

    fn scan() -> ScanSummary {
        let mut scan = ScanSummary::default();
        scan.severity_counts.insert(Severity::Critical, 1);
        scan.severity_counts.insert(Severity::High, 2);
        scan.severity_counts.insert(Severity::Medium, 4);
        scan.severity_counts.insert(Severity::Info, 9);
        scan.findings_by_host.insert("web01".into(), 5);
        scan.findings_by_host.insert("db01".into(), 2);
        scan.notable = (0..7)
            .map(|i| NotableFinding {
                host: "web01".into(),
                name: format!("Finding {i}"),
                severity: Severity::High,
            })
            .collect();
        scan
    }

    fn poam() -> PoamStatus {
        PoamStatus {
            open: vec!["A".into(), "B".into()],
            in_progress: vec!["C".into()],
            pending_review: vec![],
            recently_closed: vec!["D".into()],
            high_risk: vec!["Unpatched OpenSSL".into()],
        }
    }

    fn render(template: &str) -> String {
        let (poam, scan, trends) = (poam(), scan(), TrendSeries::default());
        format_monthly_report(
            template,
            &MonthlyReport {
                system_name: "Demo",
                system_id: "FR-123",
                poam_version: "1.2",
                date: "January 05, 2026".into(),
                poam: &poam,
                scan: &scan,
                trends: &trends,
            },
        )
    }

    #[test]
    fn test_default_template_fills_every_placeholder() {
        let out = render(DEFAULT_TEMPLATE);
        assert!(!out.contains("{{"), "{out}");
        assert!(out.contains("**System:** Demo (FR-123)"));
        assert!(out.contains("- Total Open POA&Ms: 2"));
        assert!(out.contains("- Critical/High Findings: 3"));
        assert!(out.contains("- Risk Level Trend: Increasing"));
        assert!(out.contains("| Critical   | 1 |"));
        assert!(out.contains("| web01 | 5 |"));
        assert!(out.contains("- Recently Closed: 1"));
        assert!(out.contains("- Pending Review: 0"));
        assert!(out.contains("- Unpatched OpenSSL"));
    }

    #[test]
    fn test_narrated_lists_are_capped() {
        let out = render("{{notable_findings}}");
        assert_eq!(out.lines().count(), TOP_N);
        assert!(out.contains("Finding 4 (web01, High)"));
        assert!(!out.contains("Finding 5"));
    }

    #[test]
    fn test_trend_analysis() {
        let out = render("{{trend_analysis}}");
        assert!(out.contains("change in total findings: 8.3%"));
        assert!(out.contains("Most frequent finding category: Medium"));
        assert!(out.contains("7 high or critical findings"));
    }

    #[test]
    fn test_trend_chart_block() {
        let chart = trend_chart(&TrendSeries::default());
        assert!(chart.starts_with("```mermaid\nxychart-beta\n"));
        assert!(chart.contains("x-axis [\"Aug\", \"Sep\", \"Oct\", \"Nov\", \"Dec\", \"Jan\"]"));
        assert!(chart.contains("y-axis \"Number of Findings\" 0 --> 100"));
        assert!(chart.contains("bar [10, 15, 12, 8, 11, 14] \"Critical\""));
        assert!(chart.contains("line [75, 80, 76, 73, 72, 78] \"Total Findings\""));
        assert!(chart.ends_with("```"));
    }

    #[test]
    fn test_chart_ceiling_grows_with_data() {
        let mut trends = TrendSeries::default();
        trends.total = vec![75, 80, 76, 73, 72, 143];
        assert!(trend_chart(&trends).contains("0 --> 150"));
    }

    #[test]
    fn test_chart_ceiling_saturates_at_largest_value() {
        let mut trends = TrendSeries::default();
        trends.total = vec![75, 80, 76, 73, 72, u32::MAX];
        let chart = trend_chart(&trends);
        assert!(chart.contains(&format!("0 --> {}", u32::MAX)), "{chart}");
    }

    #[test]
    fn test_fill_template_keeps_unknown_tokens() {
        let mut values = BTreeMap::new();
        values.insert("name", "posture".to_string());
        assert_eq!(
            fill_template("{{ name }} {{other}} {{unterminated", &values),
            "posture {{other}} {{unterminated"
        );
    }

    #[test]
    fn test_empty_lists_render_none() {
        let out = format_monthly_report(
            "{{high_risk_items}}|{{host_table}}",
            &MonthlyReport {
                system_name: "S",
                system_id: "I",
                poam_version: "1",
                date: String::new(),
                poam: &PoamStatus::default(),
                scan: &ScanSummary::default(),
                trends: &TrendSeries::default(),
            },
        );
        assert_eq!(out, "- None|| (none) | 0 |");
    }
}
