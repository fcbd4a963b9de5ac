//! JSON bodies exchanged with the conversion service.

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{MediaFormat, Quality};

/// Body of `POST /api/info`.
#[derive(Debug, Serialize)]
pub(crate) struct InfoRequestBody<'a> {
    pub url: &'a str,
}

/// Body of `POST /api/download`.
#[derive(Debug, Serialize)]
pub(crate) struct DownloadRequestBody<'a> {
    pub url: &'a str,
    pub format: MediaFormat,
    pub quality: Quality,
}

/// Reply of `POST /api/info`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct InfoPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub duration: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Reply of `POST /api/download`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DownloadPayload {
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Any reply, read only for its `error` field.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(default)]
    pub error: Option<String>,
}

/// An `error` field counts only when it holds non-blank text.
pub(crate) fn reported_error(error: Option<String>) -> Option<String> {
    error.filter(|e| !e.trim().is_empty())
}

/// Accepts `"3:45"`, `225` or `null` for the duration field.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
