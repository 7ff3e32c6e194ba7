// HTTP client for the inference backend.
//
// Three endpoints, all JSON responses:
//   POST /api/infer_image    multipart: file + prompt
//   POST /api/generate_text  {"prompt": ...}
//   GET  /api/health

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::preview::FileCandidate;

/// Successful generation, as shown inline and stored in history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub prompt: String,
    pub generated: String,
}

#[derive(Debug, Deserialize)]
struct GenerationBody {
    #[serde(default)]
    prompt: Option<String>,
    generated: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub model_loaded: bool,
    pub device: String,
    pub dtype: String,
}

/// How a request ended, from the UI's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiOutcome<T> {
    Success(T),
    /// Non-ok status. `message` is the server's `error` field when present.
    Failed { status: u16, message: Option<String> },
    /// No usable response: connection failure or unreadable body.
    Network,
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub file: FileCandidate,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextRequest {
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| ClientError::BaseUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::BaseUrl(format!(
                "{}: scheme must be http or https",
                base_url
            )));
        }

        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn infer_image(&self, request: ImageRequest) -> ApiOutcome<Generation> {
        let ImageRequest { file, prompt } = request;

        let part = match Part::bytes(file.bytes)
            .file_name(file.name.clone())
            .mime_str(&file.mime)
        {
            Ok(part) => part,
            Err(e) => {
                tracing::error!("Cannot attach {} as {}: {}", file.name, file.mime, e);
                return ApiOutcome::Failed {
                    status: 0,
                    message: None,
                };
            }
        };
        let form = Form::new().part("file", part).text("prompt", prompt.clone());

        tracing::info!("📤 Sending image {} ({} bytes) for inference", file.name, file.size);

        let response = self
            .client
            .post(self.endpoint("/api/infer_image"))
            .multipart(form)
            .send()
            .await;

        read_generation(response, prompt).await
    }

    pub async fn generate_text(&self, request: TextRequest) -> ApiOutcome<Generation> {
        tracing::info!("📤 Sending text prompt ({} chars)", request.prompt.chars().count());

        let response = self
            .client
            .post(self.endpoint("/api/generate_text"))
            .json(&request)
            .send()
            .await;

        read_generation(response, request.prompt).await
    }

    pub async fn health(&self) -> ApiOutcome<HealthReport> {
        let response = self.client.get(self.endpoint("/api/health")).send().await;

        let (status, body) = match read_body(response).await {
            Some(read) => read,
            None => return ApiOutcome::Network,
        };

        if !status.is_success() {
            return ApiOutcome::Failed {
                status: status.as_u16(),
                message: None,
            };
        }

        match serde_json::from_str(&body) {
            Ok(report) => ApiOutcome::Success(report),
            Err(e) => {
                tracing::error!("Health check error: {}", e);
                ApiOutcome::Network
            }
        }
    }
}

async fn read_body(
    response: reqwest::Result<reqwest::Response>,
) -> Option<(reqwest::StatusCode, String)> {
    let response = match response {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Request failed: {}", e);
            return None;
        }
    };

    let status = response.status();
    match response.text().await {
        Ok(body) => {
            let preview: String = body.chars().take(500).collect();
            tracing::debug!("Status: {} Body: {}", status, preview);
            Some((status, body))
        }
        Err(e) => {
            tracing::error!("Could not read response body: {}", e);
            None
        }
    }
}

async fn read_generation(
    response: reqwest::Result<reqwest::Response>,
    submitted_prompt: String,
) -> ApiOutcome<Generation> {
    let (status, body) = match read_body(response).await {
        Some(read) => read,
        None => return ApiOutcome::Network,
    };

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error);
        tracing::warn!("Backend returned {}: {:?}", status, message);
        return ApiOutcome::Failed {
            status: status.as_u16(),
            message,
        };
    }

    match serde_json::from_str::<GenerationBody>(&body) {
        Ok(parsed) => {
            tracing::info!("✅ Generated {} chars", parsed.generated.chars().count());
            ApiOutcome::Success(Generation {
                prompt: parsed.prompt.unwrap_or(submitted_prompt),
                generated: parsed.generated,
            })
        }
        Err(e) => {
            tracing::error!("Malformed generation response: {}", e);
            ApiOutcome::Network
        }
    }
}
