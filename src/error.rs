//! Error types.
//!
//! Uses `thiserror` for ergonomic error definitions. Probe-level network
//! failures never appear here: the probe engine absorbs them into a
//! [`ProbeStatus`](crate::probe::ProbeStatus) verdict.

use thiserror::Error;

/// Errors surfaced by the scan driver and its CLI plumbing.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid port specification: {0}")]
    InvalidPortSpec(String),

    #[error("failed to resolve target: {0}")]
    Resolve(String),

    #[error("no ports to scan")]
    EmptyPortList,

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// Scheduler misconfiguration, rejected eagerly at construction rather
/// than hanging silently later.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("workflow capacity must be at least 1")]
    ZeroCapacity,

    #[error("workflow needs at least one worker")]
    ZeroWorkers,
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;
