// ABOUTME: Configuration file loading, validation, and hierarchical merging for partlens
// ABOUTME: Supports TOML config files in the project directory and XDG config locations

use anyhow::{anyhow, Context, Result};
use partlens_sdk::{CompressionConfig, IngestConfig};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{config as locations, defaults, prompts};

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "validate_temperature")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "validate_max_tokens")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub debug: Option<bool>,
    #[serde(default)]
    pub images: Option<ConfigImages>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct ConfigImages {
    #[serde(default)]
    pub max_dimension: Option<u32>,
    #[serde(default, deserialize_with = "validate_quality")]
    pub quality: Option<f32>,
    #[serde(default)]
    pub byte_budget: Option<usize>,
    #[serde(default)]
    pub worker_timeout_ms: Option<u64>,
}

impl Config {
    /// Load configuration from standard XDG-compliant locations
    pub fn load() -> Result<Self> {
        let paths = Self::get_config_paths();
        Self::load_from_paths(&paths.iter().map(|p| p.as_str()).collect::<Vec<_>>())
    }

    /// Load configuration from specific file paths in order of precedence.
    /// Missing files are skipped; unreadable or invalid ones are errors.
    pub fn load_from_paths(paths: &[&str]) -> Result<Self> {
        let mut config = Config::default();

        for path in paths {
            if !Path::new(path).is_file() {
                continue;
            }
            // Later paths override earlier ones
            config = config.merge(Self::load_from_file(path)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a single file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse TOML config file: {}",
                path.as_ref().display()
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get standard config file paths, lowest precedence first
    pub fn get_config_paths() -> Vec<String> {
        let mut paths = Vec::new();

        // 1. User config directory fallback
        if let Some(home_dir) = dirs::home_dir() {
            let path = home_dir
                .join(".config")
                .join(locations::APP_DIR)
                .join(locations::FILE_NAME);
            paths.push(path.to_string_lossy().to_string());
        }

        // 2. XDG config home
        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            let path = PathBuf::from(config_home)
                .join(locations::APP_DIR)
                .join(locations::FILE_NAME);
            paths.push(path.to_string_lossy().to_string());
        }

        // 3. Project-specific config (highest precedence)
        if let Ok(current_dir) = std::env::current_dir() {
            paths.push(
                current_dir
                    .join(locations::PROJECT_FILE)
                    .to_string_lossy()
                    .to_string(),
            );
        }

        paths.dedup();
        paths
    }

    /// Merge this config with another, giving precedence to the other config
    pub fn merge(self, other: Config) -> Config {
        Config {
            model: other.model.or(self.model),
            temperature: other.temperature.or(self.temperature),
            max_tokens: other.max_tokens.or(self.max_tokens),
            api_url: other.api_url.or(self.api_url),
            persona: other.persona.or(self.persona),
            analysis: other.analysis.or(self.analysis),
            debug: other.debug.or(self.debug),
            images: match (self.images, other.images) {
                (Some(base), Some(other)) => Some(base.merge(other)),
                (base, other) => other.or(base),
            },
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(temperature) = self.temperature {
            check_temperature(temperature).map_err(|e| anyhow!(e))?;
        }
        if self.max_tokens == Some(0) {
            return Err(anyhow!("max_tokens must be at least 1"));
        }
        if let Some(ref images) = self.images {
            images.validate().context("Invalid [images] configuration")?;
        }
        Ok(())
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(defaults::MODEL)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(defaults::TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(defaults::MAX_TOKENS)
    }

    /// Blank prompt overrides fall back to the built-in texts
    pub fn persona(&self) -> &str {
        non_blank(self.persona.as_deref()).unwrap_or(prompts::PERSONA)
    }

    pub fn analysis(&self) -> &str {
        non_blank(self.analysis.as_deref()).unwrap_or(prompts::ANALYSIS)
    }

    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    /// Ingestion settings with config overrides applied over the SDK defaults
    pub fn ingest_config(&self) -> IngestConfig {
        let mut ingest = IngestConfig::default();
        let images = self.images.clone().unwrap_or_default();

        let mut compression = CompressionConfig::default();
        if let Some(max_dimension) = images.max_dimension {
            compression.max_dimension = max_dimension;
        }
        if let Some(quality) = images.quality {
            compression.initial_quality = quality;
        }
        if let Some(byte_budget) = images.byte_budget {
            compression.byte_budget = byte_budget;
        }
        ingest.compression = Some(compression);

        if let Some(ms) = images.worker_timeout_ms {
            ingest.worker_timeout = Duration::from_millis(ms);
        }
        ingest
    }
}

impl ConfigImages {
    /// Merge image settings field by field
    pub fn merge(self, other: ConfigImages) -> ConfigImages {
        ConfigImages {
            max_dimension: other.max_dimension.or(self.max_dimension),
            quality: other.quality.or(self.quality),
            byte_budget: other.byte_budget.or(self.byte_budget),
            worker_timeout_ms: other.worker_timeout_ms.or(self.worker_timeout_ms),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_dimension == Some(0) {
            return Err(anyhow!("max_dimension must be at least 1"));
        }
        if let Some(quality) = self.quality {
            check_quality(quality).map_err(|e| anyhow!(e))?;
        }
        if self.byte_budget == Some(0) {
            return Err(anyhow!("byte_budget must be at least 1"));
        }
        if self.worker_timeout_ms == Some(0) {
            return Err(anyhow!("worker_timeout_ms must be at least 1"));
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

pub(crate) fn check_temperature(temperature: f64) -> std::result::Result<(), String> {
    if (defaults::MIN_TEMPERATURE..=defaults::MAX_TEMPERATURE).contains(&temperature) {
        Ok(())
    } else {
        Err(format!(
            "Invalid temperature {}. Must be between {} and {}",
            temperature,
            defaults::MIN_TEMPERATURE,
            defaults::MAX_TEMPERATURE
        ))
    }
}

fn check_quality(quality: f32) -> std::result::Result<(), String> {
    if quality > 0.0 && quality <= 1.0 {
        Ok(())
    } else {
        Err(format!(
            "Invalid quality {}. Must be greater than 0 and at most 1",
            quality
        ))
    }
}

// Custom deserializer for temperature range validation
fn validate_temperature<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<f64>::deserialize(deserializer)?;
    if let Some(temperature) = value {
        check_temperature(temperature).map_err(D::Error::custom)?;
    }
    Ok(value)
}

fn validate_max_tokens<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<u32>::deserialize(deserializer)?;
    if value == Some(0) {
        return Err(D::Error::custom("max_tokens must be at least 1"));
    }
    Ok(value)
}

fn validate_quality<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<f32>::deserialize(deserializer)?;
    if let Some(quality) = value {
        check_quality(quality).map_err(D::Error::custom)?;
    }
    Ok(value)
}
