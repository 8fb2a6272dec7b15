//! Demo configuration from environment variables

use crate::activity::CardVariant;
use crate::channel::ChannelConfig;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Settings for the scripted demo run
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub channel: ChannelConfig,
    /// Install the `Action.Execute` -> `Action.Submit` rewrite
    pub rewrite: bool,
    /// Pace the virtual clock against wall time
    pub realtime: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            rewrite: true,
            realtime: false,
        }
    }
}

impl DemoConfig {
    /// Read `CARD_SHIM_*` variables, falling back to defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(variant) = lookup("CARD_SHIM_VARIANT") {
            config.channel.card_variant = variant.parse::<CardVariant>().map_err(|message| {
                ConfigError::Invalid {
                    var: "CARD_SHIM_VARIANT",
                    message,
                }
            })?;
        }

        if let Some(ms) = lookup("CARD_SHIM_RESPONSE_DELAY_MS") {
            let ms: u64 = ms.trim().parse().map_err(|e| ConfigError::Invalid {
                var: "CARD_SHIM_RESPONSE_DELAY_MS",
                message: format!("{e}"),
            })?;
            config.channel.response_delay = Duration::from_millis(ms);
        }

        if let Some(value) = lookup("CARD_SHIM_REWRITE") {
            config.rewrite = parse_bool("CARD_SHIM_REWRITE", &value)?;
        }
        if let Some(value) = lookup("CARD_SHIM_REALTIME") {
            config.realtime = parse_bool("CARD_SHIM_REALTIME", &value)?;
        }

        Ok(config)
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            var,
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::DEFAULT_RESPONSE_DELAY;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<DemoConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DemoConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.channel.card_variant, CardVariant::Execute);
        assert_eq!(config.channel.response_delay, DEFAULT_RESPONSE_DELAY);
        assert!(config.rewrite);
        assert!(!config.realtime);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = from_pairs(&[
            ("CARD_SHIM_VARIANT", "submit"),
            ("CARD_SHIM_RESPONSE_DELAY_MS", " 250 "),
            ("CARD_SHIM_REWRITE", "off"),
            ("CARD_SHIM_REALTIME", "Yes"),
        ])
        .unwrap();

        assert_eq!(config.channel.card_variant, CardVariant::Submit);
        assert_eq!(config.channel.response_delay, Duration::from_millis(250));
        assert!(!config.rewrite);
        assert!(config.realtime);
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = from_pairs(&[("CARD_SHIM_RESPONSE_DELAY_MS", "soon")]).unwrap_err();
        assert!(err.to_string().starts_with("CARD_SHIM_RESPONSE_DELAY_MS:"));

        let err = from_pairs(&[("CARD_SHIM_REWRITE", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "CARD_SHIM_REWRITE", .. }));

        assert!(from_pairs(&[("CARD_SHIM_VARIANT", "openurl")]).is_err());
    }
}
