//! The error taxonomy of the simulation core.
//!
//! Only [`SimError::Config`] is fatal: it is returned before a run starts and
//! aborts construction of the simulation. `PlanInfeasible` and
//! `SchedulerUnderflow` are non-fatal conditions — they are logged via
//! `tracing` at the point they occur and also recorded in
//! [`crate::sim::SimOutput::warnings`] so a caller can inspect them after the
//! run completes, but they never stop the run. Per-bundle and per-session
//! outcomes (`SessionFailure`, `BundleDropped`) are *not* part of this enum:
//! they are first-class return values of the store and LTP engine APIs and
//! are folded into `metrics` counters by the driver, never surfaced as errors.

use thiserror::Error;

/// Top-level error type for the simulation core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// An invalid or out-of-range configuration value. Fatal: raised before
    /// the simulation starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The requested contact density could not produce a plan connecting the
    /// network as configured. Non-fatal: the simulation proceeds with the
    /// (possibly empty) plan that was generated.
    #[error("contact plan infeasible: {0}")]
    PlanInfeasible(String),

    /// The event queue emptied before the configured horizon. Treated as
    /// normal termination, not a failure.
    #[error("scheduler underflow at t={0}")]
    SchedulerUnderflow(f64),
}

/// Shorthand result type for the simulation core.
pub type SimResult<T> = Result<T, SimError>;
