use crate::errors::{CMTError, CMTResult, FinalizeFailure};
use crate::events::{Event, EventHandle};
use crate::grid::Time;
use log::warn;

/// Runs an ordered sequence of events as a single schedulable unit.
///
/// A chain is useful for expressing "map data into a component, then step it" as one firing.
/// Every sub-event is run to the same time, in order.
/// If a sub-event fails the chain stops immediately; sub-events that already ran keep their
/// effects.
///
/// If a sub-event fails to initialize, the sub-events before it are finalized again.
///
/// Chains may contain other chains.
/// A chain must never contain itself, directly or through another chain, as this is not
/// checked.
#[derive(Debug)]
pub struct ChainEvent {
    name: String,
    events: Vec<EventHandle>,
}

impl ChainEvent {
    pub fn new(events: Vec<EventHandle>) -> Self {
        let name = format!(
            "chain[{}]",
            events
                .iter()
                .map(|e| e.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self { name, events }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn events(&self) -> &[EventHandle] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Event for ChainEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&self) -> CMTResult<()> {
        for (index, event) in self.events.iter().enumerate() {
            if let Err(err) = event.initialize() {
                if let Err(rollback) = finalize_events(&self.events[..index]) {
                    warn!("{}: failed to roll back initialization: {}", self.name, rollback);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn run(&self, until: Time) -> CMTResult<()> {
        self.events.iter().try_for_each(|event| event.run(until))
    }

    /// Finalize every sub-event, even if some of them fail.
    fn finalize(&self) -> CMTResult<()> {
        finalize_events(&self.events)
    }
}

fn finalize_events(events: &[EventHandle]) -> CMTResult<()> {
    let failures = events
        .iter()
        .filter_map(|event| {
            event.finalize().err().map(|error| FinalizeFailure {
                event: event.name().to_string(),
                error,
            })
        })
        .collect();
    CMTError::from_finalize_failures(failures)
}
