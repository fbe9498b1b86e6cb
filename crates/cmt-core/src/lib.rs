pub mod config;
mod example_ports;
pub mod events;
pub mod grid;
pub mod port;

pub mod errors;

pub use events::{ChainEvent, Event, EventHandle, EventManager, PortEvent, PortMapEvent};
pub use grid::{FloatValue, Grid, GridValues, Time};
pub use port::{Port, PortHandle};
