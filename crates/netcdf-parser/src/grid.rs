//! In-memory gridded dataset.
//!
//! Every variable is held as a flat row-major `f64` buffer. Masked cells
//! (`_FillValue` in the source file) are stored as NaN.

use import_common::Value;
use std::collections::BTreeMap;

use crate::error::{NetCdfError, NetCdfResult};

/// Read access to a self-describing array dataset.
pub trait ArraySource {
    /// Global attribute.
    fn attribute(&self, name: &str) -> NetCdfResult<Value>;

    /// Attribute of one variable.
    fn variable_attribute(&self, var: &str, name: &str) -> NetCdfResult<Value>;

    /// Ordered dimension names of a variable.
    fn variable_dimensions(&self, var: &str) -> NetCdfResult<Vec<String>>;

    /// Length of each dimension, in the same order as [`variable_dimensions`](Self::variable_dimensions).
    fn variable_shape(&self, var: &str) -> NetCdfResult<Vec<usize>>;

    /// Scalar at a full index tuple.
    fn variable_value(&self, var: &str, indices: &[usize]) -> NetCdfResult<f64>;

    /// `valid_min` / `valid_max` attributes as numbers, when present.
    fn valid_bounds(&self, var: &str) -> (Option<f64>, Option<f64>) {
        let bound = |name| {
            self.variable_attribute(var, name)
                .ok()
                .and_then(|v| v.as_f64())
        };
        (bound("valid_min"), bound("valid_max"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
}

/// One named array with its dimensions and attributes.
#[derive(Debug, Clone)]
pub struct GridVariable {
    name: String,
    dimensions: Vec<Dimension>,
    attributes: BTreeMap<String, Value>,
    values: Vec<f64>,
}

impl GridVariable {
    /// Create a variable; `values.len()` must equal the product of the dimension lengths.
    pub fn new(
        name: impl Into<String>,
        dimensions: Vec<Dimension>,
        values: Vec<f64>,
    ) -> NetCdfResult<Self> {
        let name = name.into();
        let expected: usize = dimensions.iter().map(|d| d.len).product();
        if values.len() != expected {
            return Err(NetCdfError::InvalidFormat(format!(
                "variable {} has {} values, shape requires {}",
                name,
                values.len(),
                expected
            )));
        }
        Ok(Self {
            name,
            dimensions,
            attributes: BTreeMap::new(),
            values,
        })
    }

    /// Zero-dimensional variable holding one value.
    pub fn scalar(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            dimensions: Vec::new(),
            attributes: BTreeMap::new(),
            values: vec![value],
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.len).collect()
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Row-major offset of an index tuple.
    pub fn flat_index(&self, indices: &[usize]) -> NetCdfResult<usize> {
        let out_of_bounds = || NetCdfError::IndexOutOfBounds {
            variable: self.name.clone(),
            indices: indices.to_vec(),
            shape: self.shape(),
        };

        if indices.len() != self.dimensions.len() {
            return Err(out_of_bounds());
        }

        let mut offset = 0;
        for (idx, dim) in indices.iter().zip(&self.dimensions) {
            if *idx >= dim.len {
                return Err(out_of_bounds());
            }
            offset = offset * dim.len + idx;
        }
        Ok(offset)
    }

    pub fn value_at(&self, indices: &[usize]) -> NetCdfResult<f64> {
        let offset = self.flat_index(indices)?;
        Ok(self.values[offset])
    }
}

/// A dataset of global attributes plus named variables.
#[derive(Debug, Clone, Default)]
pub struct GridDataset {
    attributes: BTreeMap<String, Value>,
    variables: BTreeMap<String, GridVariable>,
}

impl GridDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_variable(mut self, variable: GridVariable) -> Self {
        self.add_variable(variable);
        self
    }

    pub fn add_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    pub fn add_variable(&mut self, variable: GridVariable) {
        self.variables.insert(variable.name.clone(), variable);
    }

    pub fn variable(&self, name: &str) -> NetCdfResult<&GridVariable> {
        self.variables
            .get(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("variable {}", name)))
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }
}

impl ArraySource for GridDataset {
    fn attribute(&self, name: &str) -> NetCdfResult<Value> {
        self.attributes
            .get(name)
            .cloned()
            .ok_or_else(|| NetCdfError::MissingData(format!("attribute {}", name)))
    }

    fn variable_attribute(&self, var: &str, name: &str) -> NetCdfResult<Value> {
        self.variable(var)?
            .attribute(name)
            .cloned()
            .ok_or_else(|| NetCdfError::MissingData(format!("attribute {}:{}", var, name)))
    }

    fn variable_dimensions(&self, var: &str) -> NetCdfResult<Vec<String>> {
        Ok(self
            .variable(var)?
            .dimensions
            .iter()
            .map(|d| d.name.clone())
            .collect())
    }

    fn variable_shape(&self, var: &str) -> NetCdfResult<Vec<usize>> {
        Ok(self.variable(var)?.shape())
    }

    fn variable_value(&self, var: &str, indices: &[usize]) -> NetCdfResult<f64> {
        self.variable(var)?.value_at(indices)
    }
}

/// Row-major iterator over every index tuple of a shape.
///
/// A zero-dimensional shape yields one empty tuple; any zero-length
/// dimension yields nothing.
#[derive(Debug, Clone)]
pub struct IndexIter {
    shape: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl IndexIter {
    pub fn new(shape: &[usize]) -> Self {
        let next = if shape.iter().any(|&len| len == 0) {
            None
        } else {
            Some(vec![0; shape.len()])
        };
        Self {
            shape: shape.to_vec(),
            next,
        }
    }
}

impl Iterator for IndexIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;

        let mut following = current.clone();
        for axis in (0..self.shape.len()).rev() {
            following[axis] += 1;
            if following[axis] < self.shape[axis] {
                self.next = Some(following);
                break;
            }
            following[axis] = 0;
        }

        Some(current)
    }
}
