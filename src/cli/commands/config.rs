//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
///
/// `config_path` is the `--config` override, if any.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: Option<&str>) -> Result<()> {
    let path = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", path.display());
        }

        ConfigAction::Init { force } => {
            init_config(&path, *force)?;
        }
    }

    Ok(())
}

/// Write a default configuration file, refusing to overwrite unless forced.
fn init_config(path: &PathBuf, force: bool) -> Result<bool> {
    if path.exists() && !force {
        Output::warning(&format!("Config already exists at {}", path.display()));
        Output::info("Use --force to overwrite it.");
        return Ok(false);
    }

    Settings::default().save_to(path)?;
    Output::success(&format!("Created default config at {}", path.display()));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_config_respects_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("retouche").join("config.toml");

        assert!(init_config(&path, false).unwrap());
        std::fs::write(&path, "[context]\nmodel = \"custom\"\n").unwrap();

        assert!(!init_config(&path, false).unwrap());
        let kept = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(kept.context.model, "custom");

        assert!(init_config(&path, true).unwrap());
        let reset = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(reset.context.model, "gpt-4.1");
    }
}
