//! Vertex AI Gemini client: one image reference plus one instruction in, text out.

use crate::{
    auth::{AuthError, TokenSource},
    prompts::PromptTemplate,
    storage::StorageLocator,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub const MAX_OUTPUT_TOKENS: u32 = 2048;
pub const TEMPERATURE: f32 = 0.4;

/// Declared for every upload, PNG included.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("model returned no text (finish reason: {})", .finish_reason.as_deref().unwrap_or("unknown"))]
    EmptyResponse { finish_reason: Option<String> },
}

#[async_trait]
pub trait ImageDescriber: Send + Sync {
    async fn describe(
        &self,
        locator: &StorageLocator,
        template: PromptTemplate,
    ) -> Result<String, ModelError>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl GenerateRequest {
    pub fn for_image(locator: &StorageLocator, template: PromptTemplate) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::FileData {
                        file_data: FileData {
                            mime_type: IMAGE_MIME_TYPE.to_string(),
                            file_uri: locator.to_string(),
                        },
                    },
                    Part::Text {
                        text: template.text().to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: TEMPERATURE,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, concatenated as returned.
    pub fn into_text(self) -> Result<String, ModelError> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(ModelError::EmptyResponse {
                finish_reason: None,
            })?;

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(ModelError::EmptyResponse {
                finish_reason: candidate.finish_reason,
            });
        }
        Ok(text)
    }
}

pub fn vertex_endpoint(project_id: &str, location: &str, model: &str) -> String {
    let host = if location == "global" {
        "aiplatform.googleapis.com".to_string()
    } else {
        format!("{location}-aiplatform.googleapis.com")
    };
    format!(
        "https://{host}/v1/projects/{project_id}/locations/{location}/publishers/google/models/{model}:generateContent"
    )
}

pub struct VertexClient {
    http: Client,
    endpoint: String,
    tokens: Arc<dyn TokenSource>,
}

impl VertexClient {
    pub fn new(
        http: Client,
        project_id: &str,
        location: &str,
        model: &str,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http,
            endpoint: vertex_endpoint(project_id, location, model),
            tokens,
        }
    }

    /// Point the client at a different `generateContent` URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageDescriber for VertexClient {
    async fn describe(
        &self,
        locator: &StorageLocator,
        template: PromptTemplate,
    ) -> Result<String, ModelError> {
        let request = GenerateRequest::for_image(locator, template);
        let token = self.tokens.access_token().await?;

        tracing::debug!("Vertex AI request to: {}", self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            tracing::error!("Vertex AI error ({}): {}", status, error_text);

            let message = serde_json::from_str::<serde_json::Value>(&error_text)
                .ok()
                .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(error_text);

            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response.json().await?;
        body.into_text()
    }
}
