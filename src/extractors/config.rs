//! Settings for one extraction run.

use clap::ValueEnum;
use serde::Serialize;

/// Nucleus sampling is fixed; only temperature and budget vary by tier.
pub const TOP_P: f32 = 0.95;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Named preset trading answer length and determinism for speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Fast,
    #[default]
    Balanced,
    High,
}

impl QualityTier {
    pub const fn temperature(self) -> f32 {
        match self {
            Self::Fast => 0.2,
            Self::Balanced => 0.1,
            Self::High => 0.0,
        }
    }

    pub const fn max_output_tokens(self) -> u32 {
        match self {
            Self::Fast => 12_000,
            Self::Balanced => 20_000,
            Self::High => 30_000,
        }
    }
}

/// Configuration passed to the orchestrator for each file.
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub quality: QualityTier,
    /// Split contract-form tables into summary and payment tables.
    pub reshape: bool,
    /// Enables the custom prompt and raw reply dumps.
    pub developer_mode: bool,
    /// Replaces the built-in prompt, in developer mode only.
    pub custom_prompt: Option<String>,
    pub max_attempts: u32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            quality: QualityTier::default(),
            reshape: false,
            developer_mode: false,
            custom_prompt: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ExtractionSettings {
    #[must_use]
    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    #[must_use]
    pub fn with_reshape(mut self, reshape: bool) -> Self {
        self.reshape = reshape;
        self
    }

    #[must_use]
    pub fn with_developer_mode(mut self, prompt: Option<String>) -> Self {
        self.developer_mode = true;
        self.custom_prompt = prompt;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// The custom prompt, if developer mode is on and it is not blank.
    pub fn prompt_override(&self) -> Option<&str> {
        if !self.developer_mode {
            return None;
        }
        self.custom_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parameters() {
        assert_eq!((QualityTier::Fast.temperature(), QualityTier::Fast.max_output_tokens()), (0.2, 12_000));
        assert_eq!((QualityTier::Balanced.temperature(), QualityTier::Balanced.max_output_tokens()), (0.1, 20_000));
        assert_eq!((QualityTier::High.temperature(), QualityTier::High.max_output_tokens()), (0.0, 30_000));
    }

    #[test]
    fn test_prompt_override_needs_developer_mode() {
        let mut settings = ExtractionSettings::default();
        settings.custom_prompt = Some("custom".to_string());
        assert_eq!(settings.prompt_override(), None);

        let settings = ExtractionSettings::default().with_developer_mode(Some("custom".to_string()));
        assert_eq!(settings.prompt_override(), Some("custom"));

        let settings = ExtractionSettings::default().with_developer_mode(Some("   ".to_string()));
        assert_eq!(settings.prompt_override(), None);
    }
}
