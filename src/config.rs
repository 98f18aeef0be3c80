use crate::error::{PanelError, Result};
use crate::types::SourceKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable that may point at the config file
pub const CONFIG_PATH_ENV: &str = "IL_PANEL_CONFIG";

const DEFAULT_NATIONAL_URL: &str = "https://raw.githubusercontent.com/dancarmoz/\
israel_moh_covid_dashboard_data/master/hospitalized_and_infected.csv";
const DEFAULT_SEVERE_URL: &str =
    "https://raw.githubusercontent.com/asafpr/COVID19_data/master/new_severe_cases.csv";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub placeholders: PlaceholderConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub national: CsvFeedConfig,
    pub severe: CsvFeedConfig,
    pub regional: DatastoreConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CsvFeedConfig {
    pub url: String,
}

/// CKAN datastore endpoint serving the per-city cumulative table
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatastoreConfig {
    pub base_url: String,
    pub resource_id: String,
    /// Records requested per page
    pub page_limit: u32,
    /// Upper bound on followed pages before giving up
    pub max_pages: u32,
}

/// Constants substituted for a missing or deliberately discarded testing denominator
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// `total` written by the severe-case normalizer
    pub severe_total: f64,
    /// `total` written by the selector when denominator normalization is off
    pub unnormalized_total: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    pub file_prefix: String,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.gov.il/api/3/action/datastore_search".to_string(),
            resource_id: "8a21d39d-91e3-40db-aca1-f73f7ab1df69".to_string(),
            page_limit: 1000,
            max_pages: 500,
        }
    }
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            severe_total: 10_000.0,
            unnormalized_total: 100_000.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            file_prefix: "il_case_panel.log".to_string(),
        }
    }
}

impl SourcesConfig {
    fn fill_defaults(&mut self) {
        if self.national.url.is_empty() {
            self.national.url = DEFAULT_NATIONAL_URL.to_string();
        }
        if self.severe.url.is_empty() {
            self.severe.url = DEFAULT_SEVERE_URL.to_string();
        }
    }

    /// Primary URL for a source, as shown by the CLI
    pub fn url_for(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::National => &self.national.url,
            SourceKind::Severe => &self.severe.url,
            SourceKind::Regional => &self.regional.base_url,
        }
    }
}

impl Config {
    /// Built-in configuration pointing at the public feeds
    pub fn defaults() -> Self {
        let mut config = Config::default();
        config.sources.fill_defaults();
        config
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.sources.fill_defaults();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PanelError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from an explicit path, else from `IL_PANEL_CONFIG`, else built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load_from(path.trim()),
            _ => Ok(Self::defaults()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let regional = &self.sources.regional;
        if regional.page_limit == 0 {
            return Err(PanelError::Config("sources.regional.page_limit must be positive".into()));
        }
        if regional.max_pages == 0 {
            return Err(PanelError::Config("sources.regional.max_pages must be positive".into()));
        }
        if regional.resource_id.trim().is_empty() {
            return Err(PanelError::Config("sources.regional.resource_id is empty".into()));
        }
        for (name, value) in [
            ("placeholders.severe_total", self.placeholders.severe_total),
            ("placeholders.unnormalized_total", self.placeholders.unnormalized_total),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PanelError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_placeholders_and_urls() {
        let config = Config::defaults();
        assert_eq!(config.placeholders.severe_total, 10_000.0);
        assert_eq!(config.placeholders.unnormalized_total, 100_000.0);
        assert!(config.sources.national.url.ends_with("hospitalized_and_infected.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [placeholders]
            severe_total = 500.0

            [sources.regional]
            page_limit = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.placeholders.severe_total, 500.0);
        assert_eq!(config.placeholders.unnormalized_total, 100_000.0);
        assert_eq!(config.sources.regional.page_limit, 50);
        assert_eq!(config.sources.regional.max_pages, 500);
        assert!(!config.sources.severe.url.is_empty());
    }

    #[test]
    fn test_rejects_zero_page_limit() {
        let err = Config::from_toml_str("[sources.regional]\npage_limit = 0\n").unwrap_err();
        assert!(matches!(err, PanelError::Config(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, PanelError::Config(_)));
    }
}
