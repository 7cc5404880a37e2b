//! Server configuration from environment variables.
//!
//! Secrets come from the environment (a `.env` file is honored in
//! development). Only the Gemini API key is required; the Telegram and
//! Cloudinary integrations are enabled when their variables are set.

use minerva_tools::CloudinaryConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("incomplete Cloudinary configuration: {0} is not set")]
    PartialCloudinary(&'static str),
}

/// Server configuration loaded at startup.
#[derive(Debug)]
pub struct ServerConfig {
    pub gemini_api_key: String,
    pub gemini_model: Option<String>,
    pub telegram_bot_token: Option<String>,
    /// Public base URL of this deployment; when set, the Telegram
    /// webhook is registered at `{public_url}/telegram-webhook`.
    pub public_url: Option<String>,
    pub cloudinary: Option<CloudinaryConfig>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| get(name).filter(|v| !v.trim().is_empty());

        let gemini_api_key = get("GEMINI_API_KEY").ok_or(ConfigError::MissingVar("GEMINI_API_KEY"))?;

        // Cloudinary is all-or-none: a partial credential set is a
        // deployment mistake, not a request to disable the tools.
        let cloud_name = get("CLOUDINARY_CLOUD_NAME");
        let cloud_key = get("CLOUDINARY_API_KEY");
        let cloud_secret = get("CLOUDINARY_API_SECRET");
        let cloudinary = match (cloud_name, cloud_key, cloud_secret) {
            (Some(name), Some(key), Some(secret)) => Some(CloudinaryConfig::new(name, key, secret)),
            (None, None, None) => None,
            (None, _, _) => return Err(ConfigError::PartialCloudinary("CLOUDINARY_CLOUD_NAME")),
            (_, None, _) => return Err(ConfigError::PartialCloudinary("CLOUDINARY_API_KEY")),
            (_, _, None) => return Err(ConfigError::PartialCloudinary("CLOUDINARY_API_SECRET")),
        };

        Ok(Self {
            gemini_api_key,
            gemini_model: get("GEMINI_MODEL"),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            public_url: get("PUBLIC_URL"),
            cloudinary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<_, _> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn gemini_api_key_is_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("GEMINI_API_KEY")));
    }

    #[test]
    fn minimal_config_disables_integrations() {
        let config = config_from(&[("GEMINI_API_KEY", "key")]).unwrap();
        assert!(config.telegram_bot_token.is_none());
        assert!(config.cloudinary.is_none());
        assert!(config.gemini_model.is_none());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let err = config_from(&[("GEMINI_API_KEY", "   ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn partial_cloudinary_is_rejected() {
        let err = config_from(&[
            ("GEMINI_API_KEY", "key"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "ck"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::PartialCloudinary("CLOUDINARY_API_SECRET")
        ));
    }

    #[test]
    fn full_config_parses() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "key"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("PUBLIC_URL", "https://bot.example.com"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "ck"),
            ("CLOUDINARY_API_SECRET", "cs"),
        ])
        .unwrap();
        assert_eq!(config.gemini_model.as_deref(), Some("gemini-2.0-flash"));
        assert!(config.cloudinary.is_some());
        assert_eq!(config.public_url.as_deref(), Some("https://bot.example.com"));
    }
}
