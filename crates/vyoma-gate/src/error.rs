use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use vyoma_config::ConfigError;

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Failed to prepare output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch scanner '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan failed with return code {code}: {}", stderr_excerpt(stderr))]
    NonZeroExit { code: i32, stderr: String },

    #[error("Scan timed out after {}", human_duration(*timeout))]
    TimedOut { timeout: Duration },
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("Report file not found at {}", join_paths(attempted))]
    ReportNotFound { attempted: Vec<PathBuf> },

    #[error("Report at {} could not be parsed: {reason}", path.display())]
    ReportParse { path: PathBuf, reason: String },
}

/// Stable tag naming the stage that failed, or a failed verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    ConfigError,
    InvocationError,
    ReportNotFoundError,
    ReportParseError,
    ThresholdExceeded,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ConfigError => "ConfigError",
            FailureKind::InvocationError => "InvocationError",
            FailureKind::ReportNotFoundError => "ReportNotFoundError",
            FailureKind::ReportParseError => "ReportParseError",
            FailureKind::ThresholdExceeded => "ThresholdExceeded",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GateError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GateError::Config(_) => FailureKind::ConfigError,
            GateError::Invocation(_) => FailureKind::InvocationError,
            GateError::ReportNotFound { .. } => FailureKind::ReportNotFoundError,
            GateError::ReportParse { .. } => FailureKind::ReportParseError,
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "(no candidate paths)".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

const STDERR_EXCERPT_LIMIT: usize = 2000;

fn stderr_excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return "(no stderr output)".to_string();
    }
    if trimmed.chars().count() <= STDERR_EXCERPT_LIMIT {
        return trimmed.to_string();
    }
    // Tail is where tracebacks end up.
    let skip = trimmed.chars().count() - STDERR_EXCERPT_LIMIT;
    format!("...{}", trimmed.chars().skip(skip).collect::<String>())
}

fn human_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (count, unit) = match secs {
        s if s > 0 && s % 3600 == 0 => (s / 3600, "hour"),
        s if s > 0 && s % 60 == 0 => (s / 60, "minute"),
        s => (s, "second"),
    };
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_matches_pipeline_wording() {
        let err = InvocationError::TimedOut {
            timeout: Duration::from_secs(3600),
        };
        assert_eq!(err.to_string(), "Scan timed out after 1 hour");

        let err = InvocationError::TimedOut {
            timeout: Duration::from_secs(90),
        };
        assert_eq!(err.to_string(), "Scan timed out after 90 seconds");
    }

    #[test]
    fn kind_names_the_stage_and_message_stays_untagged() {
        let err = GateError::ReportNotFound {
            attempted: vec![PathBuf::from("reports/vyoma-report.json")],
        };
        assert_eq!(err.kind(), FailureKind::ReportNotFoundError);
        assert_eq!(
            err.to_string(),
            "Report file not found at reports/vyoma-report.json"
        );
    }

    #[test]
    fn long_stderr_keeps_the_tail() {
        let stderr = format!("{}Traceback: boom", "x".repeat(5000));
        let err = InvocationError::NonZeroExit { code: 2, stderr };
        let msg = err.to_string();
        assert!(msg.starts_with("Scan failed with return code 2: ..."));
        assert!(msg.ends_with("Traceback: boom"));
    }
}
