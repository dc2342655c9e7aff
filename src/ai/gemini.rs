//! Google Gemini API provider for advice generation

use super::{calculate_backoff_delay, parse_retry_delay, AiError, TextGenerator};
use super::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, MAX_RETRIES, REQUEST_TIMEOUT_SECS, RETRY_BASE_DELAY_MS};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "Gemini";

/// Public Gemini endpoint
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Model entry reported by the provider's model listing
#[derive(Debug, Clone, Serialize)]
pub struct AiModelInfo {
    pub id: String,
    pub name: String,
}

/// Settings the Gemini client is built with. Fixed for the lifetime of the
/// process.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub base_url: String,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
            retry_base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }
}

/// Long-lived Gemini client. Construct once at startup and share it.
pub struct GeminiClient {
    http: reqwest::Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self, AiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Create client with timeout and connection pooling
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| AiError::network_error(PROVIDER, &settings.model, &e.to_string()))?;

        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &GeminiSettings {
        &self.settings
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.settings.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.settings.model),
            urlencoding::encode(&self.settings.api_key)
        )
    }

    /// Single request without retries.
    async fn attempt(&self, url: &str, body: &GenerateContentRequest) -> Result<String, AiError> {
        let model = &self.settings.model;

        let response = self.http.post(url).json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                AiError::timeout(PROVIDER, model, self.settings.timeout)
            } else if e.is_connect() {
                AiError::network_error(PROVIDER, model, "connection failed")
            } else {
                AiError::network_error(PROVIDER, model, &e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &body, model));
        }

        let data: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AiError::other(PROVIDER, model, &format!("JSON parse error: {}", e)))?;

        data.candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|p| p.into_iter().next())
            .and_then(|p| p.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AiError::empty_response(PROVIDER, model))
    }

    /// Fetch the models available for this key that support `generateContent`.
    pub async fn list_models(&self) -> Result<Vec<AiModelInfo>, AiError> {
        let model = &self.settings.model;
        let url = format!(
            "{}/v1beta/models?key={}",
            self.settings.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.settings.api_key)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AiError::network_error(PROVIDER, model, &e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &body, model));
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct GeminiModel {
            name: String,
            display_name: Option<String>,
            supported_generation_methods: Option<Vec<String>>,
        }

        #[derive(Deserialize)]
        struct GeminiModelsResponse {
            #[serde(default)]
            models: Vec<GeminiModel>,
        }

        let data: GeminiModelsResponse = response
            .json()
            .await
            .map_err(|e| AiError::other(PROVIDER, model, &format!("JSON parse error: {}", e)))?;

        let models = data
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .as_ref()
                    .map(|methods| methods.iter().any(|method| method == "generateContent"))
                    .unwrap_or(false)
            })
            .map(|m| {
                // Extract model ID from "models/gemini-xxx" format
                let id = m.name.trim_start_matches("models/").to_string();
                AiModelInfo {
                    name: m.display_name.unwrap_or_else(|| id.clone()),
                    id,
                }
            })
            .collect();

        Ok(models)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model(&self) -> &str {
        &self.settings.model
    }

    /// Generate text with retry logic. Transient failures are retried with
    /// exponential backoff up to `max_retries` times.
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
            },
        };
        let url = self.generate_url();

        let mut attempt = 0;
        loop {
            match self.attempt(&url, &body).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < self.settings.max_retries => {
                    let delay = calculate_backoff_delay(self.settings.retry_base_delay, attempt);
                    log::warn!(
                        "{} request failed ({}), retrying in {:?} (attempt {}/{})",
                        PROVIDER,
                        err,
                        delay,
                        attempt + 1,
                        self.settings.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Parse Gemini API error response
fn parse_error(status: u16, body: &str, model: &str) -> AiError {
    match status {
        429 => {
            // Check if it's quota exceeded vs rate limit
            let body_lower = body.to_lowercase();
            if body_lower.contains("quota") || body_lower.contains("resource_exhausted") {
                AiError::quota_exceeded(PROVIDER, model)
            } else {
                AiError::rate_limit(PROVIDER, model, parse_retry_delay(body))
            }
        }
        400 if body.contains("API_KEY_INVALID") => AiError::invalid_api_key(PROVIDER, model),
        401 | 403 => AiError::invalid_api_key(PROVIDER, model),
        404 => AiError::model_not_found(PROVIDER, model),
        500..=599 => AiError::server_error(PROVIDER, model, &format!("HTTP {}", status)),
        _ => AiError::other(
            PROVIDER,
            model,
            &format!("HTTP {}: {}", status, truncate(body, 200)),
        ),
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
