//! Loading NetCDF files into a [`GridDataset`] using the native netcdf library.
//!
//! Only compiled with the `netcdf` feature; without it [`open_grid_dataset`]
//! reports [`NetCdfError::Unsupported`].
//!
//! Numeric variables are read as `f64` with `scale_factor` / `add_offset`
//! applied and `_FillValue` cells replaced by NaN. Non-numeric variables are
//! skipped.

use std::path::Path;

use crate::error::{NetCdfError, NetCdfResult};
use crate::grid::GridDataset;

/// Open a NetCDF file and load all numeric variables into memory.
pub fn open_grid_dataset(path: impl AsRef<Path>) -> NetCdfResult<GridDataset> {
    #[cfg(feature = "netcdf")]
    {
        reader::read(path.as_ref())
    }

    #[cfg(not(feature = "netcdf"))]
    {
        Err(NetCdfError::Unsupported(format!(
            "cannot open {}: built without the `netcdf` feature",
            path.as_ref().display()
        )))
    }
}

#[cfg(feature = "netcdf")]
pub use reader::silence_hdf5_errors;

#[cfg(feature = "netcdf")]
mod reader {
    use import_common::Value;
    use netcdf::AttributeValue;
    use std::path::Path;
    use std::sync::Once;
    use tracing::{debug, info};

    use super::{NetCdfError, NetCdfResult};
    use crate::grid::{Dimension, GridDataset, GridVariable};

    /// Silence HDF5's automatic error printing to stderr.
    ///
    /// The HDF5 C library prints diagnostics even when a missing optional
    /// attribute is handled on the Rust side. Call early in `main()`; safe to
    /// call repeatedly.
    pub fn silence_hdf5_errors() {
        static INIT: Once = Once::new();

        INIT.call_once(|| {
            // SAFETY: H5Eset_auto2 with null handlers is a documented way to
            // disable automatic error output.
            unsafe {
                hdf5_metno_sys::h5e::H5Eset_auto2(
                    hdf5_metno_sys::h5e::H5E_DEFAULT,
                    None,
                    std::ptr::null_mut(),
                );
            }
        });
    }

    pub(super) fn read(path: &Path) -> NetCdfResult<GridDataset> {
        silence_hdf5_errors();

        let file = netcdf::open(path)
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

        let mut dataset = GridDataset::new();
        for attr in file.attributes() {
            if let Some(value) = attr.value().ok().and_then(attribute_to_value) {
                dataset.add_attribute(attr.name(), value);
            }
        }

        for var in file.variables() {
            let name = var.name();
            let raw: Vec<f64> = match var.get_values::<f64, _>(..) {
                Ok(values) => values,
                Err(e) => {
                    debug!(variable = %name, error = %e, "Skipping non-numeric variable");
                    continue;
                }
            };

            let dimensions: Vec<Dimension> = var
                .dimensions()
                .iter()
                .map(|d| Dimension {
                    name: d.name(),
                    len: d.len(),
                })
                .collect();

            let attributes: Vec<(String, Value)> = var
                .attributes()
                .filter_map(|attr| {
                    let value = attr.value().ok().and_then(attribute_to_value)?;
                    Some((attr.name().to_string(), value))
                })
                .collect();

            let numeric = |key: &str| {
                attributes
                    .iter()
                    .find(|(name, _)| name == key)
                    .and_then(|(_, v)| v.as_f64())
            };
            let scale = numeric("scale_factor").unwrap_or(1.0);
            let offset = numeric("add_offset").unwrap_or(0.0);
            let fill = numeric("_FillValue");

            let values: Vec<f64> = raw
                .into_iter()
                .map(|v| {
                    if Some(v) == fill {
                        f64::NAN
                    } else {
                        v * scale + offset
                    }
                })
                .collect();

            let mut loaded = GridVariable::new(name, dimensions, values)?;
            for (attr_name, value) in attributes {
                loaded = loaded.with_attribute(attr_name, value);
            }
            dataset.add_variable(loaded);
        }

        info!(
            path = %path.display(),
            variables = dataset.variable_names().count(),
            "Loaded NetCDF dataset"
        );
        Ok(dataset)
    }

    fn attribute_to_value(value: AttributeValue) -> Option<Value> {
        let value = match value {
            AttributeValue::Uchar(v) => Value::Integer(v.into()),
            AttributeValue::Schar(v) => Value::Integer(v.into()),
            AttributeValue::Ushort(v) => Value::Integer(v.into()),
            AttributeValue::Short(v) => Value::Integer(v.into()),
            AttributeValue::Uint(v) => Value::Integer(v.into()),
            AttributeValue::Int(v) => Value::Integer(v.into()),
            AttributeValue::Ulonglong(v) => Value::Integer(i64::try_from(v).ok()?),
            AttributeValue::Longlong(v) => Value::Integer(v),
            AttributeValue::Float(v) => Value::Float(v.into()),
            AttributeValue::Double(v) => Value::Float(v),
            AttributeValue::Str(s) => Value::Text(s),
            AttributeValue::Uchars(v) => list(v.into_iter().map(|x| Value::Integer(x.into()))),
            AttributeValue::Schars(v) => list(v.into_iter().map(|x| Value::Integer(x.into()))),
            AttributeValue::Ushorts(v) => list(v.into_iter().map(|x| Value::Integer(x.into()))),
            AttributeValue::Shorts(v) => list(v.into_iter().map(|x| Value::Integer(x.into()))),
            AttributeValue::Uints(v) => list(v.into_iter().map(|x| Value::Integer(x.into()))),
            AttributeValue::Ints(v) => list(v.into_iter().map(|x| Value::Integer(x.into()))),
            AttributeValue::Ulonglongs(v) => list(
                v.into_iter()
                    .filter_map(|x| i64::try_from(x).ok())
                    .map(Value::Integer),
            ),
            AttributeValue::Longlongs(v) => list(v.into_iter().map(Value::Integer)),
            AttributeValue::Floats(v) => list(v.into_iter().map(|x| Value::Float(x.into()))),
            AttributeValue::Doubles(v) => list(v.into_iter().map(Value::Float)),
            AttributeValue::Strs(v) => Value::Text(v.join(", ")),
            #[allow(unreachable_patterns)]
            _ => return None,
        };
        Some(value)
    }

    /// Single-element lists collapse to a scalar; longer lists become text.
    fn list(values: impl Iterator<Item = Value>) -> Value {
        let mut values: Vec<Value> = values.collect();
        if values.len() == 1 {
            return values.remove(0);
        }
        Value::Text(
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}
