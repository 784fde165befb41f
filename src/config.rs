// Configuration management

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::AppConfig;

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("quizforge");

    fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

    Ok(config_dir)
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Load the config, writing the defaults on first run so users have a file
/// to edit.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(config_path: &Path) -> Result<AppConfig> {
    if !config_path.exists() {
        let default_config = AppConfig::default();
        save_config_to(config_path, &default_config)?;
        return Ok(default_config);
    }

    let contents = fs::read_to_string(config_path).context("Failed to read config file")?;

    let config: AppConfig = toml::from_str(&contents).context("Failed to parse config file")?;

    Ok(config)
}

#[allow(dead_code)]
pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_to(&get_config_path()?, config)
}

pub fn save_config_to(config_path: &Path, config: &AppConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(config_path, contents).context("Failed to write config file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_creates_default() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config = load_config_from(&config_path).unwrap();

        assert_eq!(config.api_base_url, "http://127.0.0.1:5000");
        assert!(config_path.exists(), "defaults should be written on first run");
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config = AppConfig {
            api_base_url: "http://custom:8080".to_string(),
            default_question_count: 10,
            ..Default::default()
        };

        save_config_to(&config_path, &config).unwrap();
        let loaded = load_config_from(&config_path).unwrap();

        assert_eq!(loaded.api_base_url, "http://custom:8080");
        assert_eq!(loaded.default_question_count, 10);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        fs::write(&config_path, "api_base_url = \"http://other:9000\"\n").unwrap();
        let loaded = load_config_from(&config_path).unwrap();

        assert_eq!(loaded.api_base_url, "http://other:9000");
        assert_eq!(loaded.question_timeout_secs, 90);
        assert_eq!(loaded.max_question_retries, 3);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = AppConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.api_base_url, config.api_base_url);
        assert_eq!(deserialized.default_difficulty, config.default_difficulty);
    }
}
