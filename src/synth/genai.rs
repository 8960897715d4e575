//! Image-generation REST client (`models/{model}:generateContent`).
//!
//! Thin HTTP wrapper. Pure parsing in `parse_response` and failure
//! classification in `classify_failure` for testability.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::BackendConfig;
use super::{BackendError, GenerationBackend, RenderRequest};

const SOURCE_MIME_TYPE: &str = "image/png";

// =============================================================================
// CLIENT
// =============================================================================

pub struct GenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GenAiClient {
    /// Build a client from parsed backend config.
    ///
    /// # Errors
    ///
    /// Returns `HttpClientBuild` if the HTTP client cannot be constructed.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_key: config.api_key, model: config.model, base_url: config.base_url })
    }

    /// Build a client from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, BackendError> {
        Self::new(BackendConfig::from_env()?)
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait::async_trait]
impl GenerationBackend for GenAiClient {
    async fn render(&self, request: &RenderRequest) -> Result<String, BackendError> {
        let body = ApiRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: SOURCE_MIME_TYPE.into(),
                            data: strip_data_uri(&request.source_image).to_owned(),
                        },
                    },
                    RequestPart::Text { text: request.prompt.clone() },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE"],
                image_config: ImageConfig { aspect_ratio: request.operation.aspect_ratio() },
            },
        };

        debug!(operation = %request.operation, model = %self.model, "render request");
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::ApiRequest(e.to_string()))?;

        if status != 200 {
            return Err(classify_failure(status, text));
        }

        parse_response(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
    image_config: ImageConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

// =============================================================================
// PARSING
// =============================================================================

/// Bare base64 payload of a data URI; other strings are returned unchanged.
#[must_use]
pub fn strip_data_uri(source: &str) -> &str {
    match source.split_once(',') {
        Some((_, data)) => data,
        None => source,
    }
}

/// Map a non-200 response to a typed error. HTTP 429 and any body mentioning
/// `RESOURCE_EXHAUSTED` mean the backend is rate limiting.
#[must_use]
pub fn classify_failure(status: u16, body: String) -> BackendError {
    if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
        return BackendError::RateLimited(format!("status {status}"));
    }
    BackendError::ApiResponse { status, body }
}

/// Extract the first inline image of the first candidate as a data URI.
///
/// # Errors
///
/// `ApiParse` for malformed JSON, `NoAsset` when no image part is present.
pub fn parse_response(json: &str) -> Result<String, BackendError> {
    let api: ApiResponse = serde_json::from_str(json).map_err(|e| BackendError::ApiParse(e.to_string()))?;
    let inline = api
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.inline_data))
        .ok_or(BackendError::NoAsset)?;
    let mime = if inline.mime_type.is_empty() { SOURCE_MIME_TYPE } else { inline.mime_type.as_str() };
    Ok(format!("data:{mime};base64,{}", inline.data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_response_finds_first_inline_image() {
        let json = r#"{"candidates":[{"content":{"parts":[
            {"text":"here you go"},
            {"inlineData":{"mimeType":"image/png","data":"QUJD"}}
        ]}}]}"#;
        assert_eq!(parse_response(json).unwrap(), "data:image/png;base64,QUJD");
    }

    #[test]
    fn parse_response_without_image_is_no_asset() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"sorry"}]}}]}"#;
        assert!(matches!(parse_response(json), Err(BackendError::NoAsset)));
        assert!(matches!(parse_response(r#"{"candidates":[]}"#), Err(BackendError::NoAsset)));
    }

    #[test]
    fn parse_response_rejects_malformed_json() {
        assert!(matches!(parse_response("not json"), Err(BackendError::ApiParse(_))));
    }

    #[test]
    fn classify_failure_detects_rate_limits() {
        assert!(classify_failure(429, String::new()).is_rate_limited());
        assert!(classify_failure(400, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#.into()).is_rate_limited());
        assert!(matches!(classify_failure(500, "boom".into()), BackendError::ApiResponse { status: 500, .. }));
    }

    #[test]
    fn strip_data_uri_handles_both_forms() {
        assert_eq!(strip_data_uri("data:image/png;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_uri("QUJD"), "QUJD");
    }

    #[test]
    fn request_serializes_in_wire_shape() {
        let body = ApiRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::InlineData { inline_data: InlineData { mime_type: "image/png".into(), data: "QUJD".into() } },
                    RequestPart::Text { text: "draw".into() },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE"],
                image_config: ImageConfig { aspect_ratio: "1:1" },
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["contents"][0]["parts"][1]["text"], "draw");
        assert_eq!(json["generationConfig"]["imageConfig"]["aspectRatio"], "1:1");
    }
}
