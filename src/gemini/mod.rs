// src/gemini/mod.rs
pub mod client;
pub mod models;

use crate::utils::error::GeminiError;

pub use client::GeminiClient;

/// One multimodal generation call: instruction text plus an attached file.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub prompt: String,
    pub mime_type: String,
    pub data: &'a [u8],
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

/// A hosted model that answers a prompt about an attached file with text.
pub trait GenerativeModel {
    fn model_name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GeminiError>;
}
