//! Grid values exchanged through ports.
//!
//! The scheduling core treats grids as opaque: all it needs is a shape to validate writes
//! against and an owned array of values per variable.
//! Reading a variable always produces a copy so a value that has been mapped to another port
//! cannot be changed by later updates to its source.

use crate::errors::{CMTError, CMTResult};
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

pub type FloatValue = f64;
pub type Time = f64;

/// Values of a single variable over every node of a grid.
pub type GridValues = ArrayD<FloatValue>;

/// A uniform raster grid, described by the number of nodes along each axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    shape: Vec<usize>,
}

impl Grid {
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
        }
    }

    /// A grid holding a single value
    pub fn scalar() -> Self {
        Self::new(&[1])
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total number of nodes in the grid.
    pub fn node_count(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn zeros(&self) -> GridValues {
        self.filled(0.0)
    }

    pub fn filled(&self, value: FloatValue) -> GridValues {
        ArrayD::from_elem(IxDyn(&self.shape), value)
    }

    /// Check that `values` can be stored on this grid.
    ///
    /// `port` and `variable` are only used to describe the failure.
    pub fn check(&self, port: &str, variable: &str, values: &GridValues) -> CMTResult<()> {
        match values.shape() == self.shape.as_slice() {
            true => Ok(()),
            false => Err(CMTError::ShapeMismatch {
                port: port.to_string(),
                variable: variable.to_string(),
                expected: self.shape.clone(),
                actual: values.shape().to_vec(),
            }),
        }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::scalar()
    }
}

/// Named variables stored on a common grid.
///
/// Variables keep the order in which they were added.
/// This is the storage most ports are built on.
#[derive(Debug, Clone)]
pub struct GridVariables {
    port: String,
    grid: Grid,
    variables: Vec<(String, GridValues)>,
}

impl GridVariables {
    pub fn new(port: &str, grid: Grid) -> Self {
        Self {
            port: port.to_string(),
            grid,
            variables: Vec::new(),
        }
    }

    /// Add a zero-initialised variable
    pub fn with_variable(self, name: &str) -> Self {
        self.with_filled(name, 0.0)
    }

    /// Add a variable with every node set to `value`
    pub fn with_filled(mut self, name: &str, value: FloatValue) -> Self {
        let values = self.grid.filled(value);
        self.insert(name, values);
        self
    }

    /// Replaces the variable if one with the same name already exists
    fn insert(&mut self, name: &str, values: GridValues) {
        match self.variables.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.variables.push((name.to_string(), values)),
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn has(&self, name: &str) -> bool {
        self.variables.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.variables.iter().map(|(n, _)| n.clone()).collect()
    }

    fn unknown(&self, name: &str) -> CMTError {
        CMTError::UnknownVariable {
            port: self.port.clone(),
            variable: name.to_string(),
        }
    }

    pub fn get(&self, name: &str) -> CMTResult<&GridValues> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values)
            .ok_or_else(|| self.unknown(name))
    }

    pub fn get_mut(&mut self, name: &str) -> CMTResult<&mut GridValues> {
        let unknown = self.unknown(name);
        self.variables
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values)
            .ok_or(unknown)
    }

    /// Overwrite the values of an existing variable.
    pub fn set(&mut self, name: &str, values: GridValues) -> CMTResult<()> {
        self.grid.check(&self.port, name, &values)?;
        *self.get_mut(name)? = values;
        Ok(())
    }

    /// Set every node of an existing variable to `value`
    pub fn fill(&mut self, name: &str, value: FloatValue) -> CMTResult<()> {
        self.get_mut(name)?.fill(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    #[test]
    fn grid_shape() {
        let grid = Grid::new(&[2, 3]);
        assert_eq!(grid.node_count(), 6);
        assert_eq!(grid.zeros().shape(), &[2, 3]);
        assert!(grid.filled(4.0).iter().all(|v| *v == 4.0));
        assert_eq!(Grid::default(), Grid::scalar());
    }

    #[test]
    fn check_rejects_wrong_shape() {
        let grid = Grid::new(&[2, 2]);
        let values = array![1.0, 2.0, 3.0, 4.0].into_dyn();

        match grid.check("earth", "temperature", &values) {
            Err(CMTError::ShapeMismatch {
                port,
                variable,
                expected,
                actual,
            }) => {
                assert_eq!(port, "earth");
                assert_eq!(variable, "temperature");
                assert_eq!(expected, vec![2, 2]);
                assert_eq!(actual, vec![4]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn variables_keep_insertion_order() {
        let variables = GridVariables::new("air", Grid::scalar())
            .with_variable("b")
            .with_variable("a");
        assert_eq!(variables.names(), vec!["b".to_string(), "a".to_string()]);
        assert!(variables.has("a"));
        assert!(!variables.has("c"));
    }

    #[test]
    fn set_and_get() {
        let mut variables = GridVariables::new("air", Grid::new(&[3])).with_variable("density");
        variables
            .set("density", Array::linspace(0.0, 2.0, 3).into_dyn())
            .unwrap();
        assert_eq!(
            variables.get("density").unwrap(),
            &array![0.0, 1.0, 2.0].into_dyn()
        );

        variables.fill("density", 7.0).unwrap();
        assert!(variables.get("density").unwrap().iter().all(|v| *v == 7.0));

        let variables = variables.with_filled("pressure", 1.5);
        assert_eq!(variables.get("pressure").unwrap(), &array![1.5, 1.5, 1.5].into_dyn());
        assert!(variables.get("density").unwrap().iter().all(|v| *v == 7.0));
    }

    #[test]
    fn unknown_variable() {
        let mut variables = GridVariables::new("air", Grid::scalar());
        let err = variables.get("density").unwrap_err();
        assert_eq!(err.to_string(), "Unknown variable 'density' on port 'air'");

        let err = variables
            .set("density", Grid::scalar().zeros())
            .unwrap_err();
        assert!(matches!(err, CMTError::UnknownVariable { .. }));
    }

    #[test]
    fn set_rejects_wrong_shape() {
        let mut variables = GridVariables::new("air", Grid::new(&[2])).with_variable("density");
        let err = variables
            .set("density", Grid::new(&[3]).zeros())
            .unwrap_err();
        assert!(matches!(err, CMTError::ShapeMismatch { .. }));
        // The stored values are untouched
        assert_eq!(variables.get("density").unwrap().shape(), &[2]);
    }
}
