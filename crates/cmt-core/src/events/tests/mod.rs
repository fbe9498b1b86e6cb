//! Scenario tests for the event manager.
//!
//! These drive complete schedules through their lifecycle using recording ports, checking
//! firing order, due-time bookkeeping and teardown guarantees.

use crate::events::{EventHandle, PortEvent};
use crate::example_ports::{Journal, RecordingPort};
use crate::port::shared;
use std::rc::Rc;


/// A port event over a fresh recording port that writes to `journal`
fn port_event(name: &str, journal: &Journal) -> EventHandle {
    Rc::new(PortEvent::new(shared(RecordingPort::with_journal(
        name,
        &[],
        journal.clone(),
    ))))
}

/// Wrap an already configured recording port in a port event
fn event_for(port: RecordingPort) -> EventHandle {
    Rc::new(PortEvent::new(shared(port)))
}

/// Journal entries for `update_until` calls only
fn updates(journal: &Journal) -> Vec<String> {
    journal
        .entries()
        .into_iter()
        .filter(|e| e.contains("update_until"))
        .collect()
}
