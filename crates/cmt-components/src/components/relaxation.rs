//! Relaxation component
//!
//! A one-box surface temperature model that relaxes toward the temperature of the air
//! above it.

use crate::lifecycle::Lifecycle;
use cmt_core::errors::{CMTError, CMTResult};
use cmt_core::grid::{FloatValue, GridValues, GridVariables};
use cmt_core::{Grid, Port, Time};
use log::debug;
use ndarray::Zip;
use serde::{Deserialize, Serialize};

// Variable name constants
const VAR_SURFACE_TEMP: &str = "land_surface__temperature";
const VAR_AIR_TEMP: &str = "land_surface_air__temperature";

/// Parameters for the relaxation component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaxationParameters {
    /// Timescale of the surface's response
    /// unit: same as model time
    pub tau: FloatValue,
    /// Surface temperature at the start of the run
    /// unit: K
    pub initial_temperature: FloatValue,
}

/// One-box relaxation component
///
/// The surface temperature $T$ relaxes toward the air temperature $T_a$:
/// $$ \frac{dT}{dt} = \frac{T_a - T}{\tau} $$
///
/// The air temperature is an input that is held constant between updates, so every update
/// applies the exact solution
/// $$ T(t) = T_a + (T(t_0) - T_a) e^{-(t - t_0) / \tau} $$
/// independently at each grid node.
#[derive(Debug, Clone)]
pub struct RelaxationComponent {
    name: String,
    parameters: RelaxationParameters,
    variables: GridVariables,
    lifecycle: Lifecycle,
}

impl RelaxationComponent {
    pub fn from_parameters(name: &str, grid: Grid, parameters: RelaxationParameters) -> Self {
        let variables = GridVariables::new(name, grid)
            .with_filled(VAR_SURFACE_TEMP, parameters.initial_temperature)
            .with_filled(VAR_AIR_TEMP, parameters.initial_temperature);
        Self {
            name: name.to_string(),
            parameters,
            variables,
            lifecycle: Lifecycle::new(name, 0.0),
        }
    }

    pub fn surface_temperature_name() -> &'static str {
        VAR_SURFACE_TEMP
    }

    pub fn air_temperature_name() -> &'static str {
        VAR_AIR_TEMP
    }

    /// Relax `surface` toward `air` over `elapsed`
    pub fn relax(&self, surface: &mut GridValues, air: &GridValues, elapsed: Time) {
        let decay = (-elapsed / self.parameters.tau).exp();
        Zip::from(surface)
            .and(air)
            .for_each(|t, &t_air| *t = t_air + (*t - t_air) * decay);
    }
}

impl Port for RelaxationComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) -> CMTResult<()> {
        if !(self.parameters.tau > 0.0) {
            return Err(CMTError::Component {
                port: self.name.clone(),
                message: format!("tau must be positive, got {}", self.parameters.tau),
            });
        }
        self.lifecycle.initialize()
    }

    fn update_until(&mut self, time: Time) -> CMTResult<()> {
        let elapsed = self.lifecycle.advance(time)?;
        let air = self.variables.get(VAR_AIR_TEMP)?.clone();
        let mut surface = self.variables.get(VAR_SURFACE_TEMP)?.clone();
        self.relax(&mut surface, &air, elapsed);
        self.variables.set(VAR_SURFACE_TEMP, surface)?;
        debug!("{}: relaxed over {} to t={}", self.name, elapsed, time);
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
