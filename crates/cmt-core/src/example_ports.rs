#![allow(dead_code)]

//! Ports used to exercise the scheduler in tests.

use crate::errors::{CMTError, CMTResult};
use crate::grid::{Grid, GridValues, GridVariables, Time};
use crate::port::Port;
use std::cell::RefCell;
use std::rc::Rc;

/// A shared, ordered record of lifecycle calls made against one or more ports.
#[derive(Debug, Clone, Default)]
pub(crate) struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Number of entries equal to `entry`
    pub fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| *e == entry).count()
    }
}

/// Port over a scalar grid that journals every lifecycle call.
///
/// Variables are plain storage; advancing the port only moves its clock.
/// Each lifecycle call can be made to fail so that error paths can be tested.
#[derive(Debug)]
pub(crate) struct RecordingPort {
    name: String,
    variables: GridVariables,
    time: Time,
    journal: Journal,
    fail_initialize: bool,
    fail_update: bool,
    fail_finalize: bool,
}

impl RecordingPort {
    /// Create a port with its own journal
    pub fn new(name: &str, variables: &[&str]) -> (Self, Journal) {
        let journal = Journal::new();
        (Self::with_journal(name, variables, journal.clone()), journal)
    }

    pub fn with_journal(name: &str, variables: &[&str], journal: Journal) -> Self {
        let variables = variables
            .iter()
            .fold(GridVariables::new(name, Grid::scalar()), |acc, v| {
                acc.with_variable(v)
            });
        Self {
            name: name.to_string(),
            variables,
            time: 0.0,
            journal,
            fail_initialize: false,
            fail_update: false,
            fail_finalize: false,
        }
    }

    pub fn failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }

    pub fn failing_update(mut self) -> Self {
        self.fail_update = true;
        self
    }

    pub fn failing_finalize(mut self) -> Self {
        self.fail_finalize = true;
        self
    }

    fn call(&self, operation: String, fail: bool) -> CMTResult<()> {
        self.journal.record(format!("{}.{}", self.name, operation));
        match fail {
            true => Err(CMTError::Component {
                port: self.name.clone(),
                message: format!("{} failed", operation),
            }),
            false => Ok(()),
        }
    }
}

impl Port for RecordingPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) -> CMTResult<()> {
        self.call("initialize".to_string(), self.fail_initialize)
    }

    fn update_until(&mut self, time: Time) -> CMTResult<()> {
        self.call(format!("update_until({})", time), self.fail_update)?;
        self.time = time;
        Ok(())
    }

    fn finalize(&mut self) -> CMTResult<()> {
        self.call("finalize".to_string(), self.fail_finalize)
    }

    fn get_grid_values(&self, name: &str) -> CMTResult<GridValues> {
        self.variables.get(name).cloned()
    }

    fn set_grid_values(&mut self, name: &str, values: GridValues) -> CMTResult<()> {
        self.variables.set(name, values)
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.names()
    }

    fn current_time(&self) -> Time {
        self.time
    }
}
