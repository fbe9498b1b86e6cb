//! Drives a schedule of recurring events forward in time.

use crate::errors::{CMTError, CMTResult, FinalizeFailure};
use crate::events::EventHandle;
use crate::grid::Time;
use log::{debug, info, warn};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Lifecycle of an [`EventManager`].
///
/// `Unstarted -> Initialized -> Running -> Finalized`.
/// `Finalized` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Unstarted,
    Initialized,
    Running,
    Finalized,
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerState::Unstarted => write!(f, "unstarted"),
            ManagerState::Initialized => write!(f, "initialized"),
            ManagerState::Running => write!(f, "running"),
            ManagerState::Finalized => write!(f, "finalized"),
        }
    }
}

/// Scheduling metadata for a registered event.
#[derive(Debug)]
struct ScheduledEvent {
    event: EventHandle,
    interval: Time,
    /// Time the recurrence is counted from
    origin: Time,
    /// Number of completed firings
    firings: u64,
}

impl ScheduledEvent {
    /// Time of the next firing.
    ///
    /// Due times are `origin + k * interval` rather than a running sum so that rounding
    /// doesn't accumulate over many firings.
    fn next_due_time(&self) -> Time {
        self.origin + (self.firings + 1) as Time * self.interval
    }
}

fn validate_interval(event: &EventHandle, interval: Time) -> CMTResult<()> {
    // Also rejects NaN
    match interval > 0.0 {
        true => Ok(()),
        false => Err(CMTError::InvalidInterval {
            event: event.name().to_string(),
            interval,
        }),
    }
}

/// Owns a schedule of recurring events and fires them in time order.
///
/// Every event recurs at a fixed interval.
/// An event registered at construction first fires at `t = interval`, then at `2 * interval`
/// and so on.
/// Calling [`run`](EventManager::run) fires every firing that falls on or before the requested
/// time, even if a single call skips past several of them.
/// Firings are ordered by due time, and firings due at the same time are ordered by
/// registration.
///
/// The manager is single threaded and does not arbitrate access to ports shared by several
/// events.
/// The order of the schedule is the only way of expressing that one event must see data
/// written by another.
///
/// The manager has a lifecycle (see [`ManagerState`]).
/// [`enter`](EventManager::enter) and [`with_scope`](EventManager::with_scope) tie that
/// lifecycle to a scope so that events are always finalized.
#[derive(Debug)]
pub struct EventManager {
    schedule: Vec<ScheduledEvent>,
    current_time: Time,
    state: ManagerState,
}

impl EventManager {
    /// Create a manager from `(event, interval)` pairs.
    ///
    /// Fails if any interval is not positive.
    pub fn new<I>(schedule: I) -> CMTResult<Self>
    where
        I: IntoIterator<Item = (EventHandle, Time)>,
    {
        let schedule = schedule
            .into_iter()
            .map(|(event, interval)| {
                validate_interval(&event, interval)?;
                Ok(ScheduledEvent {
                    event,
                    interval,
                    origin: 0.0,
                    firings: 0,
                })
            })
            .collect::<CMTResult<Vec<_>>>()?;

        Ok(Self {
            schedule,
            current_time: 0.0,
            state: ManagerState::Unstarted,
        })
    }

    pub fn current_time(&self) -> Time {
        self.current_time
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// Number of registered events
    pub fn len(&self) -> usize {
        self.schedule.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    /// Registered events in registration order
    pub fn events(&self) -> impl Iterator<Item = &EventHandle> {
        self.schedule.iter().map(|s| &s.event)
    }

    /// Due time of each registered event, in registration order
    pub fn due_times(&self) -> Vec<Time> {
        self.schedule.iter().map(|s| s.next_due_time()).collect()
    }

    /// The earliest due time across all events
    pub fn next_due_time(&self) -> Option<Time> {
        self.next_due(Time::INFINITY).map(|index| self.schedule[index].next_due_time())
    }

    fn invalid_state(&self, operation: &str) -> CMTError {
        CMTError::InvalidState {
            operation: operation.to_string(),
            state: self.state,
        }
    }

    /// Register another recurring event.
    ///
    /// The event first fires at `current_time + interval`.
    /// If the manager has already been initialized the event is initialized straight away so
    /// that every registered event shares the manager's lifecycle.
    pub fn add_recurring_event(&mut self, event: EventHandle, interval: Time) -> CMTResult<()> {
        validate_interval(&event, interval)?;

        match self.state {
            ManagerState::Finalized => return Err(self.invalid_state("add an event")),
            ManagerState::Initialized | ManagerState::Running => {
                info!("Initializing late event '{}'", event.name());
                event.initialize()?;
            }
            ManagerState::Unstarted => {}
        }

        debug!(
            "Registered '{}' every {} from t={}",
            event.name(),
            interval,
            self.current_time
        );
        self.schedule.push(ScheduledEvent {
            event,
            interval,
            origin: self.current_time,
            firings: 0,
        });
        Ok(())
    }

    /// Initialize every event in registration order.
    ///
    /// Initialization stops at the first failure.
    /// Events that were already initialized are then finalized and the manager can no longer
    /// be used.
    pub fn initialize_all(&mut self) -> CMTResult<()> {
        if self.state != ManagerState::Unstarted {
            return Err(self.invalid_state("initialize"));
        }

        info!("Initializing {} events", self.schedule.len());
        for (index, scheduled) in self.schedule.iter().enumerate() {
            if let Err(err) = scheduled.event.initialize() {
                warn!(
                    "Failed to initialize '{}': {}",
                    scheduled.event.name(),
                    err
                );
                self.state = ManagerState::Finalized;
                if let Err(rollback) = finalize_events(&self.schedule[..index]) {
                    warn!("Failed to roll back initialization: {}", rollback);
                }
                return Err(err);
            }
        }

        self.state = ManagerState::Initialized;
        Ok(())
    }

    /// Index of the event with the earliest due time that is no later than `stop_time`.
    ///
    /// Ties go to the event registered first.
    fn next_due(&self, stop_time: Time) -> Option<usize> {
        self.schedule
            .iter()
            .enumerate()
            .filter(|(_, s)| s.next_due_time() <= stop_time)
            .fold(None, |earliest: Option<(usize, Time)>, (index, s)| {
                let due = s.next_due_time();
                match earliest {
                    Some((_, best)) if best <= due => earliest,
                    _ => Some((index, due)),
                }
            })
            .map(|(index, _)| index)
    }

    /// Advance to `stop_time`, firing every event that falls due on the way.
    ///
    /// Each event is run to its own due time rather than `stop_time`.
    /// A failure aborts the rest of the run.
    /// Events that fired before the failure keep their effects, and the failed firing is still
    /// pending.
    pub fn run(&mut self, stop_time: Time) -> CMTResult<()> {
        match self.state {
            ManagerState::Initialized | ManagerState::Running => {}
            _ => return Err(self.invalid_state("run")),
        }
        // Written this way round so that a NaN stop time is rejected
        if !(stop_time >= self.current_time) {
            return Err(CMTError::BackwardTime {
                requested: stop_time,
                current: self.current_time,
            });
        }
        // Due times never pass an infinite stop time
        if !stop_time.is_finite() {
            return Err(CMTError::UnboundedTime {
                requested: stop_time,
            });
        }
        self.state = ManagerState::Running;

        while let Some(index) = self.next_due(stop_time) {
            let scheduled = &mut self.schedule[index];
            let due = scheduled.next_due_time();
            debug!("Firing '{}' at t={}", scheduled.event.name(), due);
            scheduled.event.run(due)?;
            scheduled.firings += 1;
        }

        self.current_time = stop_time;
        Ok(())
    }

    /// Finalize every event in registration order.
    ///
    /// Every event is given a chance to finalize even if an earlier one fails, and all
    /// failures are reported together.
    /// The manager is finalized afterwards regardless, so a second call is rejected.
    pub fn finalize_all(&mut self) -> CMTResult<()> {
        match self.state {
            ManagerState::Initialized | ManagerState::Running => {}
            _ => return Err(self.invalid_state("finalize")),
        }

        info!("Finalizing {} events", self.schedule.len());
        self.state = ManagerState::Finalized;
        finalize_events(&self.schedule)
    }

    /// Initialize all events and return a guard that finalizes them when dropped.
    pub fn enter(&mut self) -> CMTResult<ManagerScope<'_>> {
        self.initialize_all()?;
        Ok(ManagerScope { manager: self })
    }

    /// Run `f` between [`initialize_all`](Self::initialize_all) and
    /// [`finalize_all`](Self::finalize_all).
    ///
    /// Events are finalized however `f` exits.
    /// If both `f` and finalization fail, the error from `f` is returned and the finalization
    /// error is logged.
    pub fn with_scope<F, R>(&mut self, f: F) -> CMTResult<R>
    where
        F: FnOnce(&mut EventManager) -> CMTResult<R>,
    {
        let mut scope = self.enter()?;
        let result = f(&mut *scope);
        let closed = scope.close();

        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(finalize_err)) => {
                warn!("Failed to finalize after an error: {}", finalize_err);
                Err(err)
            }
        }
    }
}

fn finalize_events(schedule: &[ScheduledEvent]) -> CMTResult<()> {
    let failures = schedule
        .iter()
        .filter_map(|scheduled| {
            scheduled.event.finalize().err().map(|error| {
                warn!("Failed to finalize '{}': {}", scheduled.event.name(), error);
                FinalizeFailure {
                    event: scheduled.event.name().to_string(),
                    error,
                }
            })
        })
        .collect();
    CMTError::from_finalize_failures(failures)
}

/// An initialized [`EventManager`] whose events are finalized when the scope ends.
///
/// Dropping the scope finalizes the events and logs any failures.
/// Use [`close`](ManagerScope::close) to receive the failures instead.
#[derive(Debug)]
pub struct ManagerScope<'a> {
    manager: &'a mut EventManager,
}

impl ManagerScope<'_> {
    /// Finalize the events now.
    ///
    /// Does nothing if the manager was already finalized from within the scope.
    pub fn close(self) -> CMTResult<()> {
        match self.manager.state() {
            ManagerState::Finalized => Ok(()),
            _ => self.manager.finalize_all(),
        }
    }
}

impl Deref for ManagerScope<'_> {
    type Target = EventManager;

    fn deref(&self) -> &Self::Target {
        self.manager
    }
}

impl DerefMut for ManagerScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.manager
    }
}

impl Drop for ManagerScope<'_> {
    fn drop(&mut self) {
        if self.manager.state() == ManagerState::Finalized {
            return;
        }
        if let Err(err) = self.manager.finalize_all() {
            warn!("Errors while finalizing events: {}", err);
        }
    }
}
