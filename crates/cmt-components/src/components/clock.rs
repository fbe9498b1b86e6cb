//! Clock component
//!
//! A component with no physics that reports the time it has been advanced to.
//! Useful for checking that data flows between components at the expected times.

use crate::lifecycle::Lifecycle;
use cmt_core::errors::CMTResult;
use cmt_core::grid::{GridVariables, GridValues};
use cmt_core::{Grid, Port, Time};
use log::debug;
use serde::{Deserialize, Serialize};

/// Parameters for the clock component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockParameters {
    pub grid: Grid,
    /// Variables that are overwritten with the current time on every update
    pub outputs: Vec<String>,
    /// Variables that are only stored, typically written by a port map
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub start_time: Time,
}

/// Component whose outputs hold the time it was last updated to.
///
/// Outputs start at `start_time` and every `update_until(t)` sets each of them to `t` over
/// the whole grid.
/// Inputs are untouched by updates.
#[derive(Debug, Clone)]
pub struct ClockComponent {
    name: String,
    outputs: Vec<String>,
    variables: GridVariables,
    lifecycle: Lifecycle,
}

impl ClockComponent {
    pub fn from_parameters(name: &str, parameters: ClockParameters) -> Self {
        let variables = parameters
            .outputs
            .iter()
            .chain(parameters.inputs.iter())
            .fold(
                GridVariables::new(name, parameters.grid.clone()),
                |variables, v| variables.with_variable(v),
            );
        let mut component = Self {
            name: name.to_string(),
            outputs: parameters.outputs,
            variables,
            lifecycle: Lifecycle::new(name, parameters.start_time),
        };
        component.write_time();
        component
    }

    /// A clock over a single node with one output variable
    pub fn scalar(name: &str, output: &str) -> Self {
        Self::from_parameters(
            name,
            ClockParameters {
                grid: Grid::scalar(),
                outputs: vec![output.to_string()],
                inputs: vec![],
                start_time: 0.0,
            },
        )
    }

    fn write_time(&mut self) {
        let time = self.lifecycle.time();
        for output in self.outputs.iter() {
            if let Ok(values) = self.variables.get_mut(output) {
                values.fill(time);
            }
        }
    }
}

impl Port for ClockComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) -> CMTResult<()> {
        self.lifecycle.initialize()
    }

    fn update_until(&mut self, time: Time) -> CMTResult<()> {
        self.lifecycle.advance(time)?;
        debug!("{}: advanced to {}", self.name, time);
        self.write_time();
        Ok(())
    }

    fn finalize(&mut self) -> CMTResult<()> {
        self.lifecycle.finalize()
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
        self.lifecycle.time()
    }
}
