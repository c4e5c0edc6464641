//! Configuration management for the CLI.
//!
//! The configuration lives in `~/.credence/config.toml` unless `--config`
//! points elsewhere. Every section is optional:
//!
//! ```toml
//! [settings]
//! color = true
//! format = "table"
//! database = "/home/me/.credence/claims.db"
//!
//! [curve]
//! bucket_count = 10
//!
//! [smooth_ece]
//! kernel = "gaussian"
//! num_eval_points = 100
//!
//! [propagation]
//! max_depth = 10
//! materialize_defeaters = true
//! base_reduction = 0.3
//! depth_decay = 0.5
//! ```

use crate::error::{CliError, Result};
use credence_calibration::{CurveOptions, SmoothEceOptions};
use credence_defeat::PropagationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Calibration curve options
    #[serde(default)]
    pub curve: CurveOptions,

    /// Smoothed ECE options
    #[serde(default)]
    pub smooth_ece: SmoothEceOptions,

    /// Defeat propagation options
    #[serde(default)]
    pub propagation: PropagationConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Claim database; `~/.credence/claims.db` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Directory holding the default configuration and database.
    pub fn home() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".credence"))
    }

    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist; the default path falls back to defaults
    /// when missing.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path()?, false),
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents).map_err(|source| CliError::ConfigParse {
                path: path.clone(),
                source,
            })?;
            config.validate()?;
            tracing::debug!(path = %path.display(), "Loaded configuration");
            Ok(config)
        } else if explicit {
            Err(CliError::Config(format!("Config file '{}' does not exist", path.display())))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.curve.validate()?;
        self.smooth_ece.validate()?;
        self.propagation.validate()?;
        Ok(())
    }

    /// Claim database path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.settings.database {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::home()?.join("claims.db")),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            database: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use credence_calibration::KernelType;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Table);
        assert_eq!(config.curve.bucket_count, 10);
        assert_eq!(config.propagation.max_depth, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str(
            r#"
            [settings]
            format = "json"

            [smooth_ece]
            kernel = "epanechnikov"
            "#,
        )
        .unwrap();

        assert_eq!(config.settings.format, OutputFormat::Json);
        assert!(config.settings.color);
        assert_eq!(config.smooth_ece.kernel, KernelType::Epanechnikov);
        assert_eq!(config.propagation, PropagationConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [curve]

            [propagation]
            max_depth = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.curve, CurveOptions::default());
        assert_eq!(config.propagation.max_depth, 3);
        assert!(config.propagation.materialize_defeaters);
        assert_eq!(config.propagation.base_reduction, PropagationConfig::default().base_reduction);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.settings.database = Some(dir.path().join("claims.db"));
        config.propagation = PropagationConfig::shallow();
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.database_path().unwrap(), dir.path().join("claims.db"));
    }

    #[test]
    fn test_missing_explicit_path() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_section_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[curve]\nbucket_count = 0\n").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(CliError::Calibration(_))));
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[propagation]\nmax_depth = \"deep\"\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(&err, CliError::ConfigParse { path: p, .. } if p == &path));
        assert!(err.to_string().contains("config.toml"));
    }
}
