//! Test fixtures, data-file lookup and a recording [`MockImportService`]
//! shared by the importer crates.

pub mod fixtures;
pub mod mock_service;
pub mod paths;

pub use fixtures::*;
pub use mock_service::{MockImportService, ServiceCall};
pub use paths::*;

/// Resolve a sample data file with [`find_test_file`], or skip the test.
///
/// NetCDF samples are not checked in; tests using them return early with a
/// note when no `testdata/` directory or `TEST_DATA_DIR` has the file.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("SKIPPED: sample file '{}' not found (set TEST_DATA_DIR)", $name);
                return;
            }
        }
    }};
}

/// Assert two floats differ by at most `epsilon`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon): (f64, f64, f64) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!("{} and {} differ by {} (epsilon {})", left, right, diff, epsilon);
        }
    }};
}
