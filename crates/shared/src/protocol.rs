use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ImageId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateImageRequest {
    pub idea: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateImageResponse {
    pub image_id: ImageId,
    pub image_url: String,
    pub image_path: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertTo3dRequest {
    pub image_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertTo3dResponse {
    pub model_url: String,
}

/// Body of `GET /health`. The shape is not contractual, so every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_configured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meshy_configured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Common envelope of the generate/convert endpoints: a logical `success` flag,
/// an optional `error` text and the operation's own fields next to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl ServiceReply {
    pub fn into_payload<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Object(self.body))
    }
}

/// Error body returned alongside non-2xx statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
