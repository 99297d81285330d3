use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Cities used to seed the history on first run.
pub const DEFAULT_CITIES: &[&str] = &[
    "London",
    "Birmingham",
    "Tokyo",
    "Paris",
    "New York",
    "Sydney",
    "Sofia",
    "Berlin",
    "Cairo",
    "Manchester",
    "Liverpool",
    "Dublin",
    "Bristol",
];

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_cities = ["London", "Paris"]
/// history_capacity = 2
/// request_timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,

    /// Provider address; the public OpenWeather endpoint when absent.
    pub base_url: Option<String>,

    pub default_cities: Option<Vec<String>>,

    /// Defaults to the number of default cities.
    pub history_capacity: Option<usize>,

    /// No timeout when absent.
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Returns the API key, preferring the environment over the file.
    pub fn api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key.clone().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `weatherdash configure` or set {API_KEY_ENV}."
            )
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn default_cities(&self) -> Vec<String> {
        match &self.default_cities {
            Some(cities) => cities.clone(),
            None => DEFAULT_CITIES.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Never less than 1, so a search always lands in the history.
    pub fn history_capacity(&self) -> usize {
        self.history_capacity.unwrap_or_else(|| self.default_cities().len()).max(1)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Load config from the platform location, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if cfg.history_capacity == Some(0) {
            return Err(anyhow!(
                "history_capacity in {} must be at least 1.\n\
                 Hint: remove the setting to keep one entry per default city.",
                path.display()
            ));
        }

        Ok(cfg)
    }

    /// Save config to the platform location, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherdash", "weatherdash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builtin_city_list() {
        let cfg = Config::default();

        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert_eq!(cfg.default_cities().len(), 13);
        assert_eq!(cfg.default_cities()[0], "London");
        assert_eq!(cfg.history_capacity(), 13);
        assert_eq!(cfg.request_timeout(), None);
    }

    #[test]
    fn capacity_follows_custom_city_list() {
        let cfg = Config {
            default_cities: Some(vec!["London".into(), "Paris".into()]),
            ..Config::default()
        };
        assert_eq!(cfg.history_capacity(), 2);

        let cfg = Config { history_capacity: Some(5), ..cfg };
        assert_eq!(cfg.history_capacity(), 5);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config { request_timeout_secs: Some(10), ..Config::default() };
        cfg.set_api_key("KEY".into());
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.request_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn parses_partial_toml() {
        let cfg: Config = toml::from_str(
            r#"
            api_key = "abc"
            default_cities = ["Sofia", "Berlin", "Cairo"]
            "#,
        )
        .unwrap();

        assert_eq!(cfg.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.history_capacity(), 3);
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn invalid_toml_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn zero_capacity_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "history_capacity = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("history_capacity"));
        assert!(err.to_string().contains("Hint:"));
    }

    #[test]
    fn empty_city_list_still_keeps_one_entry() {
        let cfg = Config { default_cities: Some(vec![]), ..Config::default() };
        assert_eq!(cfg.history_capacity(), 1);

        let cfg = Config { history_capacity: Some(0), ..Config::default() };
        assert_eq!(cfg.history_capacity(), 1);
    }
}
