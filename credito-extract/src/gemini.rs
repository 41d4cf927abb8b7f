//! Gemini `generateContent` backend.
//!
//! The document travels inline (base64) next to the extraction instruction;
//! structured JSON output is requested through `responseSchema`.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::credentials::ApiKey;
use crate::error::{AuthProblem, ExtractError, Result};
use crate::prompt::response_schema;
use crate::service::{DocumentService, ExtractionRequest};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.1,
            timeout: Duration::from_secs(120),
        }
    }
}

pub struct GeminiService {
    http: reqwest::Client,
    config: GeminiConfig,
    /// Raw configured key; validated on every call so that a missing or
    /// malformed key fails before anything is sent
    api_key: Option<String>,
}

impl GeminiService {
    pub fn new(config: GeminiConfig, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExtractError::Unknown(format!("build http client: {e}")))?;
        Ok(Self { http, config, api_key })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Inline { inline_data: InlineData },
    Text { text: String },
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

pub(crate) fn build_body(request: &ExtractionRequest, temperature: f32) -> Value {
    let body = GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::Inline {
                    inline_data: InlineData {
                        mime_type: request.media_type.mime(),
                        data: STANDARD.encode(&request.document),
                    },
                },
                Part::Text {
                    text: request.instruction.clone(),
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: response_schema(),
            temperature,
        },
    };
    // Plain data structs only; serialisation cannot fail
    serde_json::to_value(body).unwrap_or(Value::Null)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

const SAFETY_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Pull the answer text out of a 2xx envelope.
pub(crate) fn interpret_envelope(body: &str) -> Result<String> {
    let resp: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ExtractError::MalformedResponse(format!("unreadable response envelope: {e}")))?;

    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ExtractError::SafetyBlocked(reason));
    }

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ExtractError::MalformedResponse("response has no candidates".into()))?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if SAFETY_FINISH_REASONS.contains(&reason) {
            return Err(ExtractError::SafetyBlocked(reason.to_string()));
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ExtractError::MalformedResponse("response has no text".into()));
    }
    Ok(text)
}

/// Map a non-2xx status and its body to an error kind.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> ExtractError {
    let detail = error_message(body).unwrap_or_else(|| body.trim().to_string());
    let summary = format!("{status} {detail}");

    match status.as_u16() {
        401 | 403 => ExtractError::auth(
            AuthProblem::Rejected,
            format!("the service rejected the API key ({summary}); check the key or its permissions"),
        ),
        400 if detail.to_ascii_lowercase().contains("api key") => ExtractError::auth(
            AuthProblem::Rejected,
            format!("the service rejected the API key ({summary}); generate a new key and run: credito auth paste-api-key"),
        ),
        408 | 429 | 500 | 502 | 503 | 504 => ExtractError::Transient(summary),
        _ => ExtractError::Unknown(summary),
    }
}

fn error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    v.get("error")?.get("message")?.as_str().map(str::to_string)
}

/// Dropped or reset connections count as transient along with timeouts.
pub(crate) fn classify_transport(err: &reqwest::Error) -> ExtractError {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        ExtractError::Transient(format!("network error: {err}"))
    } else if err.is_decode() {
        ExtractError::MalformedResponse(format!("could not read response body: {err}"))
    } else {
        ExtractError::Unknown(err.to_string())
    }
}

#[async_trait]
impl DocumentService for GeminiService {
    async fn generate(&self, request: &ExtractionRequest) -> Result<String> {
        let key = ApiKey::resolve(self.api_key.as_deref())?;
        let body = build_body(request, self.config.temperature);

        debug!(endpoint = %self.endpoint(), "posting generateContent");
        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| classify_transport(&e))?;
        if !status.is_success() {
            return Err(classify_status(status, &text));
        }
        interpret_envelope(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::media::MediaType;

    fn request() -> ExtractionRequest {
        ExtractionRequest {
            document: b"%PDF-1.4".to_vec(),
            media_type: MediaType::Pdf,
            instruction: "extract".to_string(),
        }
    }

    #[test]
    fn test_body_shape() {
        let body = build_body(&request(), 0.1);
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inline_data"]["mime_type"], "application/pdf");
        assert_eq!(parts[0]["inline_data"]["data"], "JVBERi0xLjQ=");
        assert_eq!(parts[1]["text"], "extract");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(body["generationConfig"]["responseSchema"].is_object());
    }

    #[test]
    fn test_status_classification() {
        let cases = [
            (StatusCode::UNAUTHORIZED, ErrorKind::Auth),
            (StatusCode::FORBIDDEN, ErrorKind::Auth),
            (StatusCode::TOO_MANY_REQUESTS, ErrorKind::Transient),
            (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::Transient),
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Transient),
            (StatusCode::GATEWAY_TIMEOUT, ErrorKind::Transient),
            (StatusCode::NOT_FOUND, ErrorKind::Unknown),
            (StatusCode::BAD_REQUEST, ErrorKind::Unknown),
        ];
        for (status, kind) in cases {
            assert_eq!(classify_status(status, "{}").kind(), kind, "{status}");
        }
    }

    #[test]
    fn test_bad_request_with_invalid_key_is_auth() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let err = classify_status(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, ExtractError::Auth { problem: AuthProblem::Rejected, .. }));
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn test_envelope_text_is_joined() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"clientName\":"},{"text":"\"\",\"entries\":[]}"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(interpret_envelope(body).unwrap(), r#"{"clientName":"","entries":[]}"#);
    }

    #[test]
    fn test_prompt_block_is_safety() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert_eq!(interpret_envelope(body).unwrap_err(), ExtractError::SafetyBlocked("SAFETY".into()));
    }

    #[test]
    fn test_finish_reason_safety() {
        let body = r#"{"candidates":[{"finishReason":"PROHIBITED_CONTENT"}]}"#;
        assert_eq!(interpret_envelope(body).unwrap_err().kind(), ErrorKind::SafetyBlocked);
    }

    #[test]
    fn test_empty_envelope_is_malformed() {
        assert_eq!(interpret_envelope(r#"{"candidates":[]}"#).unwrap_err().kind(), ErrorKind::MalformedResponse);
        assert_eq!(interpret_envelope("<html>").unwrap_err().kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_dropped_connection_is_transient() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });

        let config = GeminiConfig {
            base_url: format!("http://{addr}"),
            timeout: Duration::from_secs(5),
            ..GeminiConfig::default()
        };
        let service = GeminiService::new(config, Some("AIzaSyExample".into())).unwrap();
        let err = service.generate(&request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient, "{err}");
        assert!(err.kind().is_retryable());
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_sending() {
        // Unroutable address: reaching the network would surface as Transient
        let config = GeminiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..GeminiConfig::default()
        };
        let service = GeminiService::new(config, None).unwrap();
        let err = service.generate(&request()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Auth { problem: AuthProblem::Missing, .. }));

        let service = GeminiService::new(GeminiConfig::default(), Some("sk-123".into())).unwrap();
        let err = service.generate(&request()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Auth { problem: AuthProblem::Malformed, .. }));
    }
}
