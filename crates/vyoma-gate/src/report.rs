use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
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

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" | "informational" => Ok(Severity::Info),
            _ => Err(format!(
                "unknown severity '{}'. Must be one of: critical, high, medium, low, info",
                s
            )),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A single reported vulnerability. Everything but the severity is opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Finding {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            details: Map::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        ["title", "name", "type"]
            .iter()
            .find_map(|key| self.details.get(*key).and_then(Value::as_str))
    }
}

/// Parsed scanner report: `{ "vulnerabilities": [ { "severity": ... }, ... ] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub vulnerabilities: Vec<Finding>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl ScanReport {
    pub fn new(vulnerabilities: Vec<Finding>) -> Self {
        Self {
            vulnerabilities,
            metadata: Map::new(),
        }
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn len(&self) -> usize {
        self.vulnerabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vulnerabilities.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.vulnerabilities
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    /// Counts for every severity level, zeros included.
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for finding in &self.vulnerabilities {
            *counts.entry(finding.severity).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_report_and_keeps_opaque_fields() {
        let report = ScanReport::from_json(
            r#"{
                "target": "https://shop.example.com",
                "vulnerabilities": [
                    {"severity": "Critical", "title": "SQL injection", "url": "/login"},
                    {"severity": "high", "title": "Reflected XSS"},
                    {"severity": "INFORMATIONAL", "name": "Server banner"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.vulnerabilities[0].severity, Severity::Critical);
        assert_eq!(report.vulnerabilities[0].title(), Some("SQL injection"));
        assert_eq!(report.vulnerabilities[2].severity, Severity::Info);
        assert_eq!(report.vulnerabilities[2].title(), Some("Server banner"));
        assert_eq!(
            report.metadata.get("target").and_then(Value::as_str),
            Some("https://shop.example.com")
        );
    }

    #[test]
    fn counts_by_severity() {
        let report = ScanReport::new(vec![
            Finding::new(Severity::Critical),
            Finding::new(Severity::High),
            Finding::new(Severity::High),
            Finding::new(Severity::Low),
        ]);

        assert_eq!(report.count(Severity::Critical), 1);
        assert_eq!(report.count(Severity::High), 2);
        assert_eq!(report.count(Severity::Medium), 0);

        let counts = report.severity_counts();
        assert_eq!(counts.len(), 5);
        assert_eq!(counts[&Severity::Low], 1);
        assert_eq!(counts[&Severity::Info], 0);
    }

    #[test]
    fn empty_vulnerability_list_is_valid() {
        let report = ScanReport::from_json(r#"{"vulnerabilities": []}"#).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn malformed_reports_are_rejected() {
        // missing key
        assert!(ScanReport::from_json(r#"{"findings": []}"#).is_err());
        // wrong shape
        assert!(ScanReport::from_json(r#"{"vulnerabilities": {}}"#).is_err());
        assert!(ScanReport::from_json(r#"[]"#).is_err());
        // finding without severity
        assert!(ScanReport::from_json(r#"{"vulnerabilities": [{"title": "x"}]}"#).is_err());
        // unknown severity
        assert!(ScanReport::from_json(r#"{"vulnerabilities": [{"severity": "severe"}]}"#).is_err());
        // not JSON at all
        assert!(ScanReport::from_json("<html>").is_err());
    }
}
