//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::{Path, PathBuf};

/// Execute the config command.
pub fn execute_config(
    args: ConfigArgs,
    config: &Config,
    config_path: Option<&Path>,
    formatter: &Formatter,
) -> Result<()> {
    let path = resolve_path(config_path)?;
    match args.action {
        ConfigAction::Show => show_config(config),
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::Init { force } => init_config(&path, force, formatter),
    }
}

fn resolve_path(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(p) => Ok(p.to_path_buf()),
        None => Config::default_path(),
    }
}

/// Print the effective configuration as TOML.
fn show_config(config: &Config) -> Result<()> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
    println!("{}", contents);
    Ok(())
}

/// Write a default configuration file.
fn init_config(path: &Path, force: bool, formatter: &Formatter) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "'{}' already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save(path)?;
    println!("{}", formatter.success(&format!("Wrote {}", path.display())));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use tempfile::TempDir;

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        init_config(&path, false, &formatter).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), Config::default());

        assert!(matches!(init_config(&path, false, &formatter), Err(CliError::Config(_))));
        assert!(init_config(&path, true, &formatter).is_ok());
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = Path::new("/tmp/credence.toml");
        assert_eq!(resolve_path(Some(path)).unwrap(), path.to_path_buf());
    }
}
