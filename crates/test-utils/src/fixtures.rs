//! Common test fixtures: a small mooring grid, a station document and the
//! mappings that read them.

use mapping::MappingConfig;
use netcdf_parser::{Dimension, GridDataset, GridVariable};
use serde_json::{json, Value as Json};

fn dim(name: &str, len: usize) -> Dimension {
    Dimension {
        name: name.to_string(),
        len,
    }
}

/// Mooring time series: `TEMP` and `PSAL` over three `TIME` steps.
///
/// `TEMP[1]` is masked and `PSAL[2]` is above `valid_max`, so the grid
/// mapping yields four records.
pub fn sample_grid() -> GridDataset {
    GridDataset::new()
        .with_attribute("site_code", "NRSPHB")
        .with_attribute("site_name", "Port Hacking")
        .with_attribute("program", "IMOS")
        .with_variable(
            GridVariable::new("TIME", vec![dim("TIME", 3)], vec![25567.0, 25567.5, 25568.0])
                .expect("valid TIME")
                .with_attribute("units", "days since 1950-01-01 00:00:00 UTC"),
        )
        .with_variable(
            GridVariable::new("TEMP", vec![dim("TIME", 3)], vec![18.25, f64::NAN, 19.5])
                .expect("valid TEMP")
                .with_attribute("units", "degrees_Celsius")
                .with_attribute("valid_min", -5.0)
                .with_attribute("valid_max", 40.0),
        )
        .with_variable(
            GridVariable::new("PSAL", vec![dim("TIME", 3)], vec![35.1, 35.2, 99.0])
                .expect("valid PSAL")
                .with_attribute("units", "PSU")
                .with_attribute("valid_min", 2.0)
                .with_attribute("valid_max", 41.0),
        )
        .with_variable(GridVariable::scalar("NOMINAL_DEPTH", 20.0))
}

/// Mapping for [`sample_grid`].
pub const GRID_MAPPING: &str = r#"{
    "parameters": ["TEMP", "PSAL"],
    "templates": {
        "import": {
            "site_code": "ATTR site_code",
            "date": "VAR TIME !datetime:days_since_1950:json",
            "program": "ATTR program",
            "variant_type": "CONST Depth",
            "variant_value": "VAR NOMINAL_DEPTH !float",
            "parameter": "PARAM name",
            "value": "PARAM value !float",
            "laboratory": "ATTR institution|CONST CSIRO"
        },
        "site": { "name": "ATTR site_name", "location": "FIELD site_code" },
        "program": { "name": "FIELD program" },
        "variant_type": { "name": "FIELD variant_type" },
        "parameter": { "name": "FIELD parameter", "unit": "VARATTR (FIELD parameter) units" },
        "laboratory": { "name": "FIELD laboratory" }
    }
}"#;

pub fn grid_mapping() -> MappingConfig {
    MappingConfig::from_json_str(GRID_MAPPING).expect("valid grid mapping")
}

/// Station observations for one weather station, two rows.
pub fn station_document(wmo: i64, name: &str) -> Json {
    json!({
        "observations": {
            "header": [{ "name": name, "state": "Victoria" }],
            "data": [
                {
                    "wmo": wmo,
                    "name": name,
                    "local_date_time_full": "20210815213000",
                    "air_temp": 9.5,
                    "rel_hum": 80
                },
                {
                    "wmo": wmo,
                    "name": name,
                    "local_date_time_full": "20210815210000",
                    "air_temp": 9.8,
                    "rel_hum": null
                }
            ]
        }
    })
}

/// Mapping for [`station_document`].
pub const DOCUMENT_MAPPING: &str = r#"{
    "import_path": "observations.data",
    "templates": {
        "import": {
            "site_code": "JSON $.wmo",
            "date": "JSON $.local_date_time_full !datetime:bom_date_time_full:json",
            "program": "CONST BOM",
            "parameter": "CONST Air Temperature",
            "value": "JSON $.air_temp !float"
        },
        "site": {
            "name": "JSON $.name|JSON observations.header.0.name",
            "location": "JSON observations.header.0.state"
        },
        "program": { "name": "FIELD program" },
        "parameter": { "name": "FIELD parameter", "unit": "CONST degC" }
    }
}"#;

pub fn document_mapping() -> MappingConfig {
    MappingConfig::from_json_str(DOCUMENT_MAPPING).expect("valid document mapping")
}
