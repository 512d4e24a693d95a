//! ChatRequest - The outbound request frame

use serde::Serialize;

use crate::params::SessionParameters;

/// One question as sent to the chat service.
///
/// Field order matters on the wire: `question`, `system`, `temperature`, `model`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub question: String,
    pub system: String,
    /// Already scaled to 0.0-1.0.
    pub temperature: f64,
    pub model: String,
}

impl ChatRequest {
    /// Frame a question with the parameters as they are right now.
    pub fn new(question: impl Into<String>, params: &SessionParameters) -> Self {
        Self {
            question: question.into(),
            system: params.system_message().to_string(),
            temperature: params.temperature_ratio(),
            model: params.model().to_string(),
        }
    }

    /// Encode as a UTF-8 JSON text frame.
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
