use cmt_core::errors::{CMTError, CMTResult};
use cmt_core::Time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Initialized,
    Finalized,
}

/// Lifecycle and clock shared by the sample components.
///
/// Initializing twice is harmless.
/// A component can only be advanced while initialized, and never backwards.
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    port: String,
    phase: Phase,
    time: Time,
}

impl Lifecycle {
    pub fn new(port: &str, start_time: Time) -> Self {
        Self {
            port: port.to_string(),
            phase: Phase::Created,
            time: start_time,
        }
    }

    pub fn time(&self) -> Time {
        self.time
    }

    fn error(&self, message: String) -> CMTError {
        CMTError::Component {
            port: self.port.clone(),
            message,
        }
    }

    pub fn initialize(&mut self) -> CMTResult<()> {
        match self.phase {
            Phase::Finalized => Err(self.error("cannot initialize after finalize".to_string())),
            _ => {
                self.phase = Phase::Initialized;
                Ok(())
            }
        }
    }

    /// Move the clock to `until`, returning the elapsed time
    pub fn advance(&mut self, until: Time) -> CMTResult<Time> {
        if self.phase != Phase::Initialized {
            return Err(self.error(format!(
                "cannot update to {} unless initialized",
                until
            )));
        }
        if until < self.time {
            return Err(self.error(format!(
                "cannot update to {} from {}",
                until, self.time
            )));
        }
        let elapsed = until - self.time;
        self.time = until;
        Ok(elapsed)
    }

    pub fn finalize(&mut self) -> CMTResult<()> {
        match self.phase {
            Phase::Finalized => Err(self.error("already finalized".to_string())),
            _ => {
                self.phase = Phase::Finalized;
                Ok(())
            }
        }
    }
}
