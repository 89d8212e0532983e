//! Tests for the in-memory grid and the ArraySource contract.

use import_common::Value;
use netcdf_parser::{ArraySource, Dimension, GridDataset, GridVariable, IndexIter, NetCdfError};

fn dim(name: &str, len: usize) -> Dimension {
    Dimension {
        name: name.to_string(),
        len,
    }
}

fn sample() -> GridDataset {
    GridDataset::new()
        .with_attribute("title", "Bay survey")
        .with_attribute("station_count", Value::Integer(2))
        .with_variable(
            GridVariable::new(
                "temp",
                vec![dim("time", 2), dim("station", 2)],
                vec![10.0, 11.0, 12.0, 13.0],
            )
            .unwrap()
            .with_attribute("units", "degC"),
        )
        .with_variable(GridVariable::new("time", vec![dim("time", 2)], vec![0.0, 1.0]).unwrap())
        .with_variable(GridVariable::scalar("depth", 3.5))
}

// ============================================================================
// Attribute tests
// ============================================================================

#[test]
fn test_global_attribute() {
    let ds = sample();
    assert_eq!(ds.attribute("title").unwrap(), Value::from("Bay survey"));
    assert!(matches!(
        ds.attribute("missing"),
        Err(NetCdfError::MissingData(_))
    ));
}

#[test]
fn test_variable_attribute() {
    let ds = sample();
    assert_eq!(
        ds.variable_attribute("temp", "units").unwrap(),
        Value::from("degC")
    );
    assert!(ds.variable_attribute("temp", "long_name").is_err());
    assert!(ds.variable_attribute("salinity", "units").is_err());
}

// ============================================================================
// Variable access tests
// ============================================================================

#[test]
fn test_dimensions_and_shape() {
    let ds = sample();
    assert_eq!(ds.variable_dimensions("temp").unwrap(), vec!["time", "station"]);
    assert_eq!(ds.variable_shape("temp").unwrap(), vec![2, 2]);
    assert!(ds.variable_dimensions("depth").unwrap().is_empty());
}

#[test]
fn test_scalar_variable() {
    let ds = sample();
    assert_eq!(ds.variable_value("depth", &[]).unwrap(), 3.5);
    assert_eq!(IndexIter::new(&ds.variable_shape("depth").unwrap()).count(), 1);
}

#[test]
fn test_enumerate_values_row_major() {
    let ds = sample();
    let shape = ds.variable_shape("temp").unwrap();
    let values: Vec<f64> = IndexIter::new(&shape)
        .map(|idx| ds.variable_value("temp", &idx).unwrap())
        .collect();
    assert_eq!(values, vec![10.0, 11.0, 12.0, 13.0]);
}

#[test]
fn test_open_without_feature_or_missing_file() {
    let result = netcdf_parser::open_grid_dataset("/nonexistent/file.nc");
    assert!(result.is_err());
}
