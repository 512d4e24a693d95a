//! Error types for parameter validation and config loading

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("Invalid endpoint URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported endpoint scheme '{0}', expected ws or wss")]
    UnsupportedScheme(String),

    #[error("Temperature {0} is outside the 0-100 range")]
    TemperatureOutOfRange(u8),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid session parameters: {0}")]
    Parameters(#[from] ParameterError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
