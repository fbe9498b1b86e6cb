//! Schedulable events and the manager that fires them.
//!
//! An event is anything that can be initialized, run up to a time and finalized.
//! Events come in three flavours:
//! - [`PortEvent`] steps a single component
//! - [`PortMapEvent`] copies variables from one port to another
//! - [`ChainEvent`] runs a fixed sequence of events as one unit
//!
//! The [`EventManager`] owns a schedule of events, each with its own recurrence interval,
//! and advances a global clock by firing whichever events are due next.
//! Ties are broken by the order in which events were registered, so a run is fully
//! deterministic.

mod chain;
mod manager;
mod port;

#[cfg(test)]
mod tests;

use crate::errors::CMTResult;
use crate::grid::Time;
use std::fmt::Debug;
use std::rc::Rc;

pub use chain::ChainEvent;
pub use manager::{EventManager, ManagerScope, ManagerState};
pub use port::{PortEvent, PortMapEvent};

/// A schedulable unit of work.
///
/// Events are shared between the manager and any chains they belong to, so every operation
/// takes `&self`; any mutable state lives behind the ports an event references.
pub trait Event: Debug {
    /// Name used to attribute failures and log messages
    fn name(&self) -> &str;

    fn initialize(&self) -> CMTResult<()>;

    /// Fire the event, advancing anything it drives to `until`.
    fn run(&self, until: Time) -> CMTResult<()>;

    fn finalize(&self) -> CMTResult<()>;
}

/// Shared handle to an event.
pub type EventHandle = Rc<dyn Event>;
