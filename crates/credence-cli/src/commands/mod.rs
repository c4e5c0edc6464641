//! Command implementations.

pub mod bootstrap;
pub mod calibrate;
pub mod claims;
pub mod config;
pub mod isotonic;
pub mod load;
pub mod propagate;
pub mod requirements;
pub mod smooth_ece;

pub use self::bootstrap::execute_bootstrap;
pub use self::calibrate::execute_calibrate;
pub use self::claims::execute_claims;
pub use self::config::execute_config;
pub use self::isotonic::execute_isotonic;
pub use self::load::execute_load;
pub use self::propagate::{execute_graph, execute_propagate};
pub use self::requirements::execute_requirements;
pub use self::smooth_ece::execute_smooth_ece;

use crate::config::Config;
use crate::error::{CliError, Result};
use credence_store::SqliteStore;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Read};
use tracing::debug;

/// Read and parse JSON from a file, or from stdin when `file` is `-`.
pub(crate) fn read_json<T: DeserializeOwned>(file: &str) -> Result<T> {
    let json_data = if file == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(file)
            .map_err(|e| CliError::InvalidInput(format!("Cannot read '{}': {}", file, e)))?
    };

    serde_json::from_str(&json_data).map_err(|source| CliError::InputParse {
        input: file.to_string(),
        source,
    })
}

/// Open the configured claim database, creating its directory if needed.
pub(crate) fn open_store(config: &Config) -> Result<SqliteStore> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    debug!(path = %path.display(), "Opening claim database");
    Ok(SqliteStore::new(&path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use credence_calibration::CalibrationSample;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_json_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), r#"[{"confidence": 0.7, "outcome": true}]"#).unwrap();

        let samples: Vec<CalibrationSample> = read_json(file.path().to_str().unwrap()).unwrap();
        assert_eq!(samples, vec![CalibrationSample::new(0.7, true)]);
    }

    #[test]
    fn test_read_json_malformed_names_input() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), r#"[{"confidence": "high"}]"#).unwrap();
        let name = file.path().to_str().unwrap();

        let err = read_json::<Vec<CalibrationSample>>(name).unwrap_err();
        assert!(matches!(&err, CliError::InputParse { input, .. } if input == name));
        assert!(err.to_string().starts_with(&format!("Cannot parse '{}'", name)));
    }

    #[test]
    fn test_read_json_missing_file() {
        let result: Result<Vec<CalibrationSample>> = read_json("/nonexistent/samples.json");
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }
}
