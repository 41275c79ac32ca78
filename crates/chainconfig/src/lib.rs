use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse filter chain: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise filter chain: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid filter chain: {0}")]
    Invalid(String),
}

/// Kernel normalization requested for a blur stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    Exact,
    Legacy,
}

/// One entry of `[[filters]]`, selected by its `kind` key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FilterStage {
    GaussianBlur {
        radius: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        normalization: Option<Normalization>,
    },
    Passthrough,
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStage::GaussianBlur {
                radius,
                normalization: Some(Normalization::Legacy),
            } => write!(f, "gaussian-blur r{radius} (legacy)"),
            FilterStage::GaussianBlur { radius, .. } => write!(f, "gaussian-blur r{radius}"),
            FilterStage::Passthrough => f.write_str("passthrough"),
        }
    }
}

/// An ordered filter chain loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainConfig {
    pub version: u32,
    #[serde(default)]
    pub filters: Vec<FilterStage>,
}

impl ChainConfig {
    pub const VERSION: u32 = 1;

    pub fn new(filters: Vec<FilterStage>) -> Self {
        Self {
            version: Self::VERSION,
            filters,
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: ChainConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != Self::VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported chain version {}; expected {}",
                self.version,
                Self::VERSION
            )));
        }

        if self.filters.is_empty() {
            return Err(ConfigError::Invalid(
                "chain must define at least one [[filters]] entry".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[[filters]]
kind = "gaussian-blur"
radius = 6

[[filters]]
kind = "passthrough"

[[filters]]
kind = "gaussian-blur"
radius = 2
normalization = "legacy"
"#;

    #[test]
    fn parses_sample_chain() {
        let config = ChainConfig::from_toml_str(SAMPLE).expect("parse chain");
        assert_eq!(config.version, 1);
        assert_eq!(
            config.filters,
            vec![
                FilterStage::GaussianBlur {
                    radius: 6,
                    normalization: None,
                },
                FilterStage::Passthrough,
                FilterStage::GaussianBlur {
                    radius: 2,
                    normalization: Some(Normalization::Legacy),
                },
            ]
        );
    }

    #[test]
    fn rejects_unknown_kind() {
        let config = r#"
version = 1

[[filters]]
kind = "sharpen"
"#;
        let err = ChainConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_blur_without_radius() {
        let config = r#"
version = 1

[[filters]]
kind = "gaussian-blur"
"#;
        let err = ChainConfig::from_toml_str(config).unwrap_err();
        assert!(err.to_string().contains("radius"));
    }

    #[test]
    fn rejects_empty_chain() {
        let err = ChainConfig::from_toml_str("version = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("[[filters]]")));
    }

    #[test]
    fn rejects_unsupported_version() {
        let config = r#"
version = 2

[[filters]]
kind = "passthrough"
"#;
        let err = ChainConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("version 2")));
    }

    #[test]
    fn serialised_chain_parses_back() {
        let config = ChainConfig::from_toml_str(SAMPLE).unwrap();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("kind = \"gaussian-blur\""));
        assert_eq!(ChainConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn display_names_stages() {
        assert_eq!(
            FilterStage::GaussianBlur {
                radius: 3,
                normalization: Some(Normalization::Legacy),
            }
            .to_string(),
            "gaussian-blur r3 (legacy)"
        );
        assert_eq!(FilterStage::Passthrough.to_string(), "passthrough");
    }
}
