use crate::report::{ScanReport, Severity};
use serde::Serialize;
use vyoma_config::RunConfig;

pub const PASSED_MESSAGE: &str = "Security scan passed thresholds";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdVerdict {
    pub critical_count: usize,
    pub high_count: usize,
    pub threshold_critical: u32,
    pub threshold_high: u32,
    pub passed: bool,
    pub message: String,
    /// Severity whose ceiling failed the verdict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exceeded: Option<Severity>,
}

/// Compare counts against the configured ceilings. Critical is checked first
/// and wins the message when both ceilings are exceeded.
pub fn evaluate(config: &RunConfig, report: &ScanReport) -> ThresholdVerdict {
    let critical_count = report.count(Severity::Critical);
    let high_count = report.count(Severity::High);

    let mut verdict = ThresholdVerdict {
        critical_count,
        high_count,
        threshold_critical: config.threshold_critical,
        threshold_high: config.threshold_high,
        passed: true,
        message: PASSED_MESSAGE.to_string(),
        exceeded: None,
    };

    if exceeds(critical_count, config.threshold_critical) {
        verdict.passed = false;
        verdict.exceeded = Some(Severity::Critical);
        verdict.message = format!(
            "CRITICAL threshold exceeded: {} critical vulnerabilities found, threshold is {}",
            critical_count, config.threshold_critical
        );
    } else if exceeds(high_count, config.threshold_high) {
        verdict.passed = false;
        verdict.exceeded = Some(Severity::High);
        verdict.message = format!(
            "HIGH threshold exceeded: {} high vulnerabilities found, threshold is {}",
            high_count, config.threshold_high
        );
    }

    verdict
}

fn exceeds(count: usize, threshold: u32) -> bool {
    count as u64 > u64::from(threshold)
}
