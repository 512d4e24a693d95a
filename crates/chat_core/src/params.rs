//! SessionParameters - Conversation settings for one connection
//!
//! The endpoint URL is fixed for the lifetime of a connection; model,
//! temperature and system message are read fresh each time a question is sent.

use std::fmt;

use serde::{Serialize, Serializer};
use url::Url;

use crate::error::ParameterError;

/// Upper bound of the user-facing temperature scale.
pub const MAX_TEMPERATURE: u8 = 100;

/// Opaque credential handed through to the transport.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret, for the transport's handshake only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Validated parameters for a chat session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionParameters {
    #[serde(serialize_with = "serialize_url")]
    endpoint_url: Url,
    model: String,
    temperature: u8,
    system_message: String,
    #[serde(skip)]
    credential: Option<Credential>,
}

fn serialize_url<S: Serializer>(url: &Url, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(url.as_str())
}

impl SessionParameters {
    /// Build parameters, validating the endpoint and temperature.
    pub fn new(
        endpoint_url: &str,
        model: impl Into<String>,
        temperature: u8,
        system_message: impl Into<String>,
    ) -> Result<Self, ParameterError> {
        Ok(Self {
            endpoint_url: parse_endpoint(endpoint_url)?,
            model: model.into(),
            temperature: check_temperature(temperature)?,
            system_message: system_message.into(),
            credential: None,
        })
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_endpoint_url(mut self, endpoint_url: &str) -> Result<Self, ParameterError> {
        self.endpoint_url = parse_endpoint(endpoint_url)?;
        Ok(self)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: u8) -> Result<Self, ParameterError> {
        self.temperature = check_temperature(temperature)?;
        Ok(self)
    }

    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = system_message.into();
        self
    }

    pub fn endpoint_url(&self) -> &Url {
        &self.endpoint_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Temperature on the 0-100 scale.
    pub fn temperature(&self) -> u8 {
        self.temperature
    }

    /// Temperature on the 0.0-1.0 scale sent over the wire.
    pub fn temperature_ratio(&self) -> f64 {
        f64::from(self.temperature) / f64::from(MAX_TEMPERATURE)
    }

    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Whether switching to `other` requires a new connection.
    pub fn requires_reconnect(&self, other: &SessionParameters) -> bool {
        self.endpoint_url != other.endpoint_url
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ParameterError> {
    let url = Url::parse(raw.trim()).map_err(|source| ParameterError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ParameterError::UnsupportedScheme(other.to_string())),
    }
}

fn check_temperature(temperature: u8) -> Result<u8, ParameterError> {
    if temperature > MAX_TEMPERATURE {
        return Err(ParameterError::TemperatureOutOfRange(temperature));
    }
    Ok(temperature)
}
