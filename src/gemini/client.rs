// src/gemini/client.rs
use crate::gemini::models::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::gemini::{GenerationRequest, GenerativeModel};
use crate::utils::error::GeminiError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::time::Duration;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
// Large documents at high token budgets can take minutes to answer.
const GEMINI_REQUEST_TIMEOUT_SECS: u64 = 300;
const GEMINI_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Creates a reqwest client configured for Gemini interaction.
fn build_gemini_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(GEMINI_REQUEST_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(GEMINI_CONNECT_TIMEOUT_SECS))
        .build()
}

/// Gemini `generateContent` endpoint bound to one model and API key.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self, GeminiError> {
        Ok(Self {
            http: build_gemini_client()?, // Propagate client build error if any
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", GEMINI_API_BASE, self.model)
    }
}

/// Builds the JSON body: prompt text followed by the file as inline data.
fn build_request_body(request: &GenerationRequest<'_>) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part { text: Some(request.prompt.clone()), inline_data: None },
                Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: request.mime_type.clone(),
                        data: STANDARD.encode(request.data),
                    }),
                },
            ],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            top_p: request.top_p,
            max_output_tokens: request.max_output_tokens,
        },
    }
}

impl GenerativeModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GeminiError> {
        let url = self.endpoint();
        tracing::info!("Sending {} ({} bytes) to {}", request.mime_type, request.data.len(), self.model);
        tracing::debug!(
            "Generation config: temperature={}, top_p={}, max_output_tokens={}",
            request.temperature,
            request.top_p,
            request.max_output_tokens
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request_body(request))
            .send()
            .await?; // Propagates reqwest::Error as GeminiError::Network

        // Check if the request was successful (status code 2xx)
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("HTTP error status: {} from {}", status, url);
            tracing::debug!("Error body: {}", body);
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!("Received 429 Too Many Requests - quota or rate limit hit.");
                return Err(GeminiError::RateLimited);
            }
            // Return generic HTTP error
            return Err(GeminiError::Http(status));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        if let Some(reason) = body.prompt_feedback.as_ref().and_then(|f| f.block_reason.clone()) {
            return Err(GeminiError::Blocked(reason));
        }
        if let Some(reason) = body.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            tracing::debug!("Finish reason: {}", reason);
        }

        let text = body.text().ok_or(GeminiError::EmptyResponse)?;
        tracing::debug!("Received {} characters from {}", text.len(), self.model);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_encodes_file() {
        let request = GenerationRequest {
            prompt: "find tables".to_string(),
            mime_type: "application/pdf".to_string(),
            data: b"%PDF",
            temperature: 0.0,
            top_p: 0.95,
            max_output_tokens: 30000,
        };
        let body = build_request_body(&request);

        let parts = &body.contents[0].parts;
        assert_eq!(parts[0].text.as_deref(), Some("find tables"));
        let inline = parts[1].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "application/pdf");
        assert_eq!(inline.data, "JVBERg==");
        assert_eq!(body.generation_config.max_output_tokens, 30000);
    }

    #[test]
    fn test_endpoint_includes_model() {
        let client = GeminiClient::new("key", "gemini-1.5-flash").unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(client.model_name(), "gemini-1.5-flash");
    }
}
