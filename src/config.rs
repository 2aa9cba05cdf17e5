//! Injected configuration.
//!
//! Everything that used to be a process-wide constant (tags, size ceilings, the kind precedence of
//! nested parameters) lives here and is handed to the components that need it.

use crate::error::ConfigError;
use crate::flow::ParameterKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the experiment-tracking service.
    pub server: Option<String>,
    pub api_key: Option<String>,
    /// Tags attached to uploaded runs.
    pub tags: Vec<String>,
    /// Whether a model is also trained on the full dataset for every run.
    pub model_full_dataset: bool,
    /// Whether to look up an existing setup and skip the run when one is found.
    pub avoid_duplicate_runs: bool,
    pub serialization: SerializationConfig,
    pub toolkit: ToolkitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: None,
            api_key: None,
            tags: Vec::new(),
            model_full_dataset: true,
            avoid_duplicate_runs: true,
            serialization: SerializationConfig::default(),
            toolkit: ToolkitConfig::default(),
        }
    }
}

/// Limits and policy for flow serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializationConfig {
    pub max_name_length: usize,
    pub max_parameters: usize,
    /// Maximum length of one JSON-encoded value array.
    pub max_value_length: usize,
    /// Order in which nested kinds are tried when a parameter's values name component types.
    pub kind_precedence: Vec<ParameterKind>,
    pub language: String,
    /// Description used when a component offers no technical information.
    pub description: String,
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            max_name_length: 1024,
            max_parameters: 256,
            max_value_length: 2048,
            kind_precedence: vec![
                ParameterKind::Array,
                ParameterKind::Classifier,
                ParameterKind::OptionHandler,
                ParameterKind::ParameterFreeClass,
            ],
            language: "English".to_string(),
            description: "Toolkit implementation; no technical information available.".to_string(),
        }
    }
}

/// Identity of the toolkit whose components are serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    pub name: String,
    pub version: String,
    /// Tags attached to every uploaded flow.
    pub tags: Vec<String>,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            name: "Weka".to_string(),
            version: "3.9.6".to_string(),
            tags: vec!["Weka_3.9.6".to_string()],
        }
    }
}

impl ToolkitConfig {
    /// Toolkit name and version, e.g. `Weka_3.9.6`.
    pub fn dependency(&self) -> String {
        format!("{}_{}", self.name, self.version)
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "Loaded configuration file");
        Self::from_toml_str(&content)
    }

    /// Parses TOML, accepting either a bare document or one nested under `[kiroku]`.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let value: toml::Value =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let section = match value.get("kiroku") {
            Some(section) => section.clone(),
            None => value,
        };
        let config: Self = section
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parses the compact `key=value; key=value` form, e.g.
    /// `server=https://example.org; avoid_duplicate_runs=false`.
    ///
    /// Unknown keys are ignored so the same string can carry settings for other tools.
    pub fn from_config_string(input: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for entry in input.split(';') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let Some((key, value)) = entry.split_once('=') else {
                return Err(ConfigError::Parse(format!("expected key=value, got '{}'", entry)));
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "server" => config.server = Some(value.to_string()),
                "api_key" => config.api_key = Some(value.to_string()),
                "tags" => config.tags = split_list(value),
                "model_full_dataset" => config.model_full_dataset = parse_bool(key, value)?,
                "avoid_duplicate_runs" => config.avoid_duplicate_runs = parse_bool(key, value)?,
                "max_name_length" => config.serialization.max_name_length = parse_usize(key, value)?,
                "max_parameters" => config.serialization.max_parameters = parse_usize(key, value)?,
                "max_value_length" => {
                    config.serialization.max_value_length = parse_usize(key, value)?
                }
                "kind_precedence" => {
                    config.serialization.kind_precedence = split_list(value)
                        .iter()
                        .map(|kind| {
                            kind.parse::<ParameterKind>()
                                .map_err(|_| ConfigError::InvalidValue {
                                    key: key.to_string(),
                                    value: kind.clone(),
                                })
                        })
                        .collect::<Result<_, _>>()?
                }
                "toolkit" => config.toolkit.name = value.to_string(),
                "toolkit_version" => config.toolkit.version = value.to_string(),
                other => debug!(key = other, "Ignoring unknown configuration key"),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that the kind precedence only names nested kinds, each at most once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let precedence = &self.serialization.kind_precedence;
        for (i, kind) in precedence.iter().enumerate() {
            if !kind.is_nested_candidate() || precedence[..i].contains(kind) {
                return Err(ConfigError::InvalidPrecedence(kind.to_string()));
            }
        }
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_limits() {
        let config = Config::default();
        assert!(config.model_full_dataset);
        assert!(config.avoid_duplicate_runs);
        assert_eq!(config.serialization.max_value_length, 2048);
        assert_eq!(config.serialization.kind_precedence[0], ParameterKind::Array);
    }

    #[test]
    fn parses_legacy_config_string() {
        let config = Config::from_config_string(
            "server=https://test.openml.org; avoid_duplicate_runs=false; tags=a, b; unknown=1",
        )
        .unwrap();
        assert_eq!(config.server.as_deref(), Some("https://test.openml.org"));
        assert!(!config.avoid_duplicate_runs);
        assert!(config.model_full_dataset);
        assert_eq!(config.tags, vec!["a", "b"]);
    }

    #[test]
    fn booleans_accept_words_and_digits() {
        let config =
            Config::from_config_string("avoid_duplicate_runs=0; model_full_dataset=TRUE").unwrap();
        assert!(!config.avoid_duplicate_runs);
        assert!(config.model_full_dataset);

        let config = Config::from_config_string("model_full_dataset=0; avoid_duplicate_runs=1").unwrap();
        assert!(!config.model_full_dataset);
        assert!(config.avoid_duplicate_runs);

        let result = Config::from_config_string("avoid_duplicate_runs=no");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, ref value })
                if key == "avoid_duplicate_runs" && value == "no"
        ));
    }

    #[test]
    fn rejects_non_nested_kind_in_precedence() {
        let result = Config::from_config_string("kind_precedence=classifier,flag");
        assert!(matches!(result, Err(ConfigError::InvalidPrecedence(kind)) if kind == "flag"));
    }

    #[test]
    fn toml_section_is_optional() {
        let nested = Config::from_toml_str(
            "[kiroku]\nserver = \"https://example.org\"\n[kiroku.serialization]\nmax_parameters = 10\n",
        )
        .unwrap();
        let bare = Config::from_toml_str(
            "server = \"https://example.org\"\n[serialization]\nmax_parameters = 10\n",
        )
        .unwrap();
        assert_eq!(nested, bare);
        assert_eq!(bare.serialization.max_parameters, 10);
        assert_eq!(bare.serialization.max_name_length, 1024);
    }
}
