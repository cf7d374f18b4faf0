pub mod decision;
pub mod error;
pub mod invoker;
pub mod locator;
pub mod report;
pub mod summary;
pub mod threshold;
pub mod timeout;

pub use decision::{decide, Gate, GateDecision};
pub use error::{FailureKind, GateError, InvocationError};
pub use invoker::{
    invoke, terminate_active_scanner, InvocationResult, ProcessRunner, ScanCommand, ScannerRunner,
};
pub use locator::{
    locate, locator_for, LocatedReport, ReportLocator, ReportQuery, WELL_KNOWN_REPORT_NAME,
};
pub use report::{Finding, ScanReport, Severity};
pub use summary::{GateStatus, GateSummary, Stage};
pub use threshold::{evaluate, ThresholdVerdict};
