//! Couple independently-stepped simulation components.
//!
//! Components are exposed through [`Port`]s and driven by an [`EventManager`] that fires
//! recurring events in time order.
//! Port maps copy variables between components and chains group several events into a
//! single firing.

pub use cmt_components::components;
pub use cmt_core::*;
