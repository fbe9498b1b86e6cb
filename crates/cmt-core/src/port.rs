//! Ports expose the variables of a simulation component.
//!
//! A port is the only view the scheduler has of a component.
//! It can initialize, advance and finalize the component, and read or write the component's
//! named variables as values over its grid.
//!
//! The same port is usually referenced by several events, for example the [`PortEvent`] that
//! steps the component and a [`PortMapEvent`] that feeds it data from another component.
//! Ports are therefore passed around as shared [`PortHandle`]s.
//! No event exclusively owns a port and there is no locking: the order of the schedule is
//! the only thing that determines which event sees which state.
//!
//! [`PortEvent`]: crate::events::PortEvent
//! [`PortMapEvent`]: crate::events::PortMapEvent

use crate::errors::CMTResult;
use crate::grid::{GridValues, Time};
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

/// Interface to a simulation component.
pub trait Port: Debug {
    /// Name used to identify the port in errors and configuration
    fn name(&self) -> &str;

    /// Prepare the component for use.
    fn initialize(&mut self) -> CMTResult<()>;

    /// Advance the component to `time`.
    ///
    /// May be a no-op if the component is already at `time`.
    fn update_until(&mut self, time: Time) -> CMTResult<()>;

    /// Release any resources held by the component.
    fn finalize(&mut self) -> CMTResult<()>;

    /// Current values of a variable.
    ///
    /// Fails with [`CMTError::UnknownVariable`](crate::errors::CMTError::UnknownVariable)
    /// if the port does not expose `name`.
    fn get_grid_values(&self, name: &str) -> CMTResult<GridValues>;

    /// Overwrite the values of a variable.
    ///
    /// Fails with [`CMTError::ShapeMismatch`](crate::errors::CMTError::ShapeMismatch) if
    /// `values` doesn't fit the port's grid.
    fn set_grid_values(&mut self, name: &str, values: GridValues) -> CMTResult<()>;

    /// Names of the variables exposed by the port
    fn variable_names(&self) -> Vec<String>;

    /// Time the component has been advanced to
    fn current_time(&self) -> Time;
}

/// Shared handle to a port.
pub type PortHandle = Rc<RefCell<dyn Port>>;

/// Wrap a port in a [`PortHandle`] so it can be shared between events
pub fn shared<P: Port + 'static>(port: P) -> PortHandle {
    Rc::new(RefCell::new(port))
}

/// Name of the port behind a handle
pub fn port_name(port: &PortHandle) -> String {
    port.borrow().name().to_string()
}
