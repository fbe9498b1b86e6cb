use crate::events::ManagerState;
use crate::grid::Time;
use thiserror::Error;

/// A finalization failure attributed to the event that raised it.
#[derive(Debug)]
pub struct FinalizeFailure {
    pub event: String,
    pub error: CMTError,
}

fn describe_failures(failures: &[FinalizeFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("'{}': {}", failure.event, failure.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum CMTError {
    #[error("Invalid interval {interval} for event '{event}'. Intervals must be positive")]
    InvalidInterval { event: String, interval: Time },
    #[error("Cannot run backwards in time. Requested={requested}, current time={current}")]
    BackwardTime { requested: Time, current: Time },
    #[error("Cannot run to {requested}. The stop time must be finite")]
    UnboundedTime { requested: Time },
    #[error("Cannot {operation} while the event manager is {state}")]
    InvalidState {
        operation: String,
        state: ManagerState,
    },
    #[error("Unknown variable '{variable}' on port '{port}'")]
    UnknownVariable { port: String, variable: String },
    #[error("Shape mismatch for '{variable}' on port '{port}'. Expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        port: String,
        variable: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("Component behind port '{port}' failed: {message}")]
    Component { port: String, message: String },
    #[error("{} event(s) failed to finalize: {}", .0.len(), describe_failures(.0))]
    Finalize(Vec<FinalizeFailure>),
    #[error("Invalid coupling configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl CMTError {
    /// Collapse a list of finalization failures into a single error.
    ///
    /// Returns `Ok` when nothing failed.
    pub fn from_finalize_failures(failures: Vec<FinalizeFailure>) -> CMTResult<()> {
        match failures.is_empty() {
            true => Ok(()),
            false => Err(CMTError::Finalize(failures)),
        }
    }
}

/// Convenience type for `Result<T, CMTError>`.
pub type CMTResult<T> = Result<T, CMTError>;
