use crate::error::{FailureKind, GateError};
use crate::invoker::{invoke, ProcessRunner, ScannerRunner};
use crate::locator::{locate, locator_for, ReportLocator, ReportQuery};
use crate::summary::{GateStatus, GateSummary, Stage};
use crate::threshold::{evaluate, ThresholdVerdict};
use std::time::{Duration, Instant, SystemTime};
use vyoma_config::{ConfigError, RunConfig};

/// Final result of a gate run: the exit code to hand back to the pipeline,
/// the structured summary, and the error that stopped the run, if any.
#[derive(Debug)]
pub struct GateDecision {
    pub exit_code: i32,
    pub summary: GateSummary,
    pub verdict: Option<ThresholdVerdict>,
    pub error: Option<GateError>,
}

impl GateDecision {
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }

    /// Decision for a run that never got a usable configuration.
    pub fn config_failure(err: ConfigError) -> Self {
        let err = GateError::from(err);
        let mut summary = GateSummary::new(GateStatus::Failed, Stage::Failed, err.to_string());
        summary.failure_kind = Some(err.kind());
        Self {
            exit_code: summary.exit_code,
            summary,
            verdict: None,
            error: Some(err),
        }
    }
}

/// Runs the pipeline: invoke -> locate -> evaluate -> decide.
pub struct Gate {
    runner: Box<dyn ScannerRunner>,
    locator: Option<Box<dyn ReportLocator>>,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl Gate {
    pub fn new() -> Self {
        Self {
            runner: Box::new(ProcessRunner::default()),
            locator: None,
        }
    }

    pub fn with_runner(mut self, runner: impl ScannerRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// Use a fixed locator instead of the one named by the config.
    pub fn with_locator(mut self, locator: impl ReportLocator + 'static) -> Self {
        self.locator = Some(Box::new(locator));
        self
    }

    pub fn decide(&self, config: &RunConfig) -> GateDecision {
        let started = Instant::now();
        let mut run = GateRun::new(config);

        // 1. Invoke
        if !config.report_format.is_json() {
            let err = ConfigError::Invalid(format!(
                "report_format '{}' cannot be evaluated by the gate; use 'json'",
                config.report_format
            ));
            return run.fail(GateError::from(err), started.elapsed());
        }

        run.enter(Stage::Invoking);
        let launched_at = SystemTime::now();
        let invocation = match invoke(config, self.runner.as_ref()) {
            Ok(result) => result,
            Err(e) => return run.fail(e.into(), started.elapsed()),
        };
        run.summary.scanner_exit_code = Some(invocation.exit_code);
        run.summary.timed_out = invocation.timed_out;

        if let Err(e) = invocation.check(config.timeout()) {
            return run.fail(e.into(), started.elapsed());
        }
        tracing::info!("Security scan completed successfully");

        // 2. Locate
        run.enter(Stage::ReportPending);
        let default_locator;
        let locator: &dyn ReportLocator = match &self.locator {
            Some(locator) => locator.as_ref(),
            None => {
                default_locator = locator_for(config.report_locator);
                default_locator.as_ref()
            }
        };
        // Only artifacts written by this scan count.
        let query =
            ReportQuery::new(&config.output_dir, &config.target_url).launched_at(launched_at);
        let located = match locate(locator, &query) {
            Ok(located) => located,
            Err(e) => return run.fail(e, started.elapsed()),
        };
        run.summary.report_path = Some(located.path.clone());

        // 3. Evaluate
        run.enter(Stage::Evaluating);
        let verdict = evaluate(config, &located.report);
        run.summary.severity_counts = Some(located.report.severity_counts());

        run.decide(verdict, started.elapsed())
    }
}

/// Convenience for the default process runner and configured locator.
pub fn decide(config: &RunConfig) -> GateDecision {
    Gate::new().decide(config)
}

struct GateRun {
    stage: Stage,
    summary: GateSummary,
}

impl GateRun {
    fn new(config: &RunConfig) -> Self {
        let mut summary = GateSummary::new(GateStatus::Failed, Stage::Idle, String::new());
        summary.target_url = Some(config.target_url.clone());
        summary.scan_mode = Some(config.scan_mode);
        summary.threshold_critical = Some(config.threshold_critical);
        summary.threshold_high = Some(config.threshold_high);
        Self {
            stage: Stage::Idle,
            summary,
        }
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!("Gate stage {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    fn fail(mut self, err: GateError, elapsed: Duration) -> GateDecision {
        tracing::debug!("Gate stage {} -> failed: {}", self.stage, err);
        self.summary.status = GateStatus::Failed;
        self.summary.exit_code = GateStatus::Failed.exit_code();
        self.summary.stage = Stage::Failed;
        self.summary.failure_kind = Some(err.kind());
        self.summary.message = err.to_string();
        self.summary.duration_ms = elapsed.as_millis();

        GateDecision {
            exit_code: self.summary.exit_code,
            summary: self.summary,
            verdict: None,
            error: Some(err),
        }
    }

    fn decide(mut self, verdict: ThresholdVerdict, elapsed: Duration) -> GateDecision {
        self.enter(Stage::Decided);
        let status = if verdict.passed {
            GateStatus::Passed
        } else {
            GateStatus::Failed
        };

        self.summary.status = status;
        self.summary.exit_code = status.exit_code();
        self.summary.stage = Stage::Decided;
        self.summary.failure_kind = (!verdict.passed).then_some(FailureKind::ThresholdExceeded);
        self.summary.message = verdict.message.clone();
        self.summary.critical_count = Some(verdict.critical_count);
        self.summary.high_count = Some(verdict.high_count);
        self.summary.duration_ms = elapsed.as_millis();

        tracing::info!(
            passed = verdict.passed,
            critical = verdict.critical_count,
            high = verdict.high_count,
            "{}",
            verdict.message
        );

        GateDecision {
            exit_code: self.summary.exit_code,
            summary: self.summary,
            verdict: Some(verdict),
            error: None,
        }
    }
}
