use crate::error::FailureKind;
use crate::report::Severity;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use vyoma_config::ScanMode;

pub const SUMMARY_SCHEMA: &str = "vyoma.gate.v1";

/// Where a gate run ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Idle,
    Invoking,
    ReportPending,
    Evaluating,
    Decided,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Invoking => "invoking",
            Stage::ReportPending => "report-pending",
            Stage::Evaluating => "evaluating",
            Stage::Decided => "decided",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Passed,
    Failed,
}

impl GateStatus {
    pub fn exit_code(&self) -> i32 {
        match self {
            GateStatus::Passed => 0,
            GateStatus::Failed => 1,
        }
    }
}

/// Machine-readable outcome of one gate run.
#[derive(Debug, Clone, Serialize)]
pub struct GateSummary {
    pub schema: String,
    pub generated_at: String,
    pub status: GateStatus,
    pub exit_code: i32,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_mode: Option<ScanMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_critical: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_high: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_counts: Option<BTreeMap<Severity, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanner_exit_code: Option<i32>,
    pub timed_out: bool,
    pub duration_ms: u128,
}

impl GateSummary {
    pub fn new(status: GateStatus, stage: Stage, message: String) -> Self {
        Self {
            schema: SUMMARY_SCHEMA.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            status,
            exit_code: status.exit_code(),
            stage,
            failure_kind: None,
            message,
            target_url: None,
            scan_mode: None,
            critical_count: None,
            high_count: None,
            threshold_critical: None,
            threshold_high: None,
            severity_counts: None,
            report_path: None,
            scanner_exit_code: None,
            timed_out: false,
            duration_ms: 0,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == GateStatus::Passed
    }

    /// Single line suitable for the end of a pipeline log.
    pub fn decision_line(&self) -> String {
        match (self.status, self.failure_kind) {
            (GateStatus::Passed, _) => format!("GATE PASSED: {}", self.message),
            (GateStatus::Failed, Some(kind)) => {
                format!("GATE FAILED [{}]: {}", kind, self.message)
            }
            (GateStatus::Failed, None) => format!("GATE FAILED: {}", self.message),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_line_includes_failure_kind() {
        let mut summary = GateSummary::new(
            GateStatus::Failed,
            Stage::Failed,
            "Report file not found at reports/vyoma-report.json".to_string(),
        );
        summary.failure_kind = Some(FailureKind::ReportNotFoundError);

        assert_eq!(summary.exit_code, 1);
        assert_eq!(
            summary.decision_line(),
            "GATE FAILED [ReportNotFoundError]: Report file not found at reports/vyoma-report.json"
        );
    }

    #[test]
    fn json_shape() {
        let mut summary = GateSummary::new(
            GateStatus::Passed,
            Stage::Decided,
            "Security scan passed thresholds".to_string(),
        );
        summary.critical_count = Some(0);
        summary.threshold_high = Some(5);
        summary.severity_counts = Some(BTreeMap::from([(Severity::High, 2)]));

        let value: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(value["schema"], "vyoma.gate.v1");
        assert_eq!(value["status"], "passed");
        assert_eq!(value["stage"], "decided");
        assert_eq!(value["exit_code"], 0);
        assert_eq!(value["critical_count"], 0);
        assert_eq!(value["severity_counts"]["high"], 2);
        assert!(value.get("failure_kind").is_none());
        assert!(value.get("report_path").is_none());
    }
}
