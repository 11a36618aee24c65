//! Drives one file through the model call, reply parsing and table post-processing.

use std::time::Duration;

use crate::extractors::classify::{classify_table, is_contract_form, TableClassification};
use crate::extractors::config::{ExtractionSettings, TOP_P};
use crate::extractors::normalize::normalize_table;
use crate::extractors::prompt::build_prompt;
use crate::extractors::reshape::{reshape_contract, Reshaped, ReshapedTable};
use crate::extractors::response::{ExtractionResult, ResponseParser};
use crate::extractors::source::SourceFile;
use crate::extractors::table::ParsedTable;
use crate::gemini::{GenerationRequest, GenerativeModel};
use crate::utils::error::ExtractError;

/// Backoff before attempt `n + 1` is `n` times this.
const RETRY_BACKOFF_STEP_SECS: u64 = 2;

/// Column used when a block that could not be parsed is exported as-is.
pub const ORIGINAL_TEXT_COLUMN: &str = "original_csv";

/// The model's reply for one file and the per-block parse results.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub reply: String,
    pub results: Vec<ExtractionResult>,
}

/// A block after classification, reshaping and normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum TableOutput {
    Table {
        index: usize,
        classification: TableClassification,
        recovered: bool,
        table: ParsedTable,
    },
    Reshaped {
        index: usize,
        reshaped: ReshapedTable,
    },
    Failure {
        index: usize,
        original_text: String,
    },
}

impl TableOutput {
    /// Zero-based position of the block in the reply.
    pub fn index(&self) -> usize {
        match self {
            Self::Table { index, .. } | Self::Reshaped { index, .. } | Self::Failure { index, .. } => *index,
        }
    }

    pub fn classification(&self) -> Option<TableClassification> {
        match self {
            Self::Table { classification, .. } => Some(*classification),
            Self::Reshaped { .. } => Some(TableClassification::ContractForm),
            Self::Failure { .. } => None,
        }
    }

    /// The table written to CSV: the combined view for reshaped contracts,
    /// and a single `original_csv` cell holding the raw text for failures.
    pub fn export_table(&self) -> ParsedTable {
        match self {
            Self::Table { table, .. } => table.clone(),
            Self::Reshaped { reshaped, .. } => reshaped.combined.clone(),
            Self::Failure { original_text, .. } => ParsedTable::new(
                vec![ORIGINAL_TEXT_COLUMN.to_string()],
                vec![vec![original_text.clone()]],
            ),
        }
    }
}

/// Runs extraction for one file against a model, with bounded retries.
pub struct ExtractionOrchestrator<M> {
    model: M,
    settings: ExtractionSettings,
    parser: ResponseParser,
}

impl<M: GenerativeModel> ExtractionOrchestrator<M> {
    pub fn new(model: M, settings: ExtractionSettings) -> Self {
        Self {
            model,
            settings,
            parser: ResponseParser::new(),
        }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Sends `file` to the model and parses the reply into per-block results.
    /// A `NO_TABLES_FOUND` reply is a success with no results.
    pub async fn extract(&self, file: &SourceFile) -> Result<Extraction, ExtractError> {
        let request = GenerationRequest {
            prompt: build_prompt(file.kind, &self.settings),
            mime_type: file.kind.mime_type().to_string(),
            data: &file.bytes,
            temperature: self.settings.quality.temperature(),
            top_p: TOP_P,
            max_output_tokens: self.settings.quality.max_output_tokens(),
        };

        let reply = self.call_with_retry(&request).await?;
        tracing::debug!("Raw model reply:\n{}", reply);

        let results = self.parser.parse_reply(&reply);
        tracing::info!("Parsed {} table block(s) from {}", results.len(), file.base_name);
        Ok(Extraction { reply, results })
    }

    /// Transient errors are retried with linearly growing sleeps between
    /// attempts; anything else ends the call immediately.
    async fn call_with_retry(&self, request: &GenerationRequest<'_>) -> Result<String, ExtractError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt: u32 = 1;

        loop {
            tracing::info!("Calling {} (attempt {}/{})", self.model.model_name(), attempt, max_attempts);

            match self.model.generate(request).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_transient() => {
                    if attempt >= max_attempts {
                        tracing::error!("Giving up after {} attempts: {}", attempt, e);
                        return Err(ExtractError::RetriesExhausted { attempts: attempt, source: e });
                    }
                    let delay = Duration::from_secs(RETRY_BACKOFF_STEP_SECS * u64::from(attempt));
                    tracing::warn!("Model call failed: {}. Retrying in {}s...", e, delay.as_secs());
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Model call failed with a non-retryable error: {}", e);
                    return Err(ExtractError::Service(e));
                }
            }
        }
    }
}

/// Classifies each parsed table, reshapes contract forms when enabled, and
/// normalizes the rest according to their classification.
pub fn finalize(results: Vec<ExtractionResult>, settings: &ExtractionSettings) -> Vec<TableOutput> {
    results
        .into_iter()
        .enumerate()
        .map(|(index, result)| {
            let (table, recovered) = match result {
                ExtractionResult::Parsed(table) => (table, false),
                ExtractionResult::RecoveredParsed(table) => (table, true),
                ExtractionResult::ParseFailure { original_text } => {
                    return TableOutput::Failure { index, original_text };
                }
            };

            let classification = classify_table(&table);
            let contract = is_contract_form(&table);
            tracing::info!(
                "Table {}: {} ({} rows x {} columns){}",
                index + 1,
                classification.label(),
                table.row_count(),
                table.column_count(),
                if contract { ", contract form" } else { "" }
            );

            let table = if settings.reshape && contract {
                match reshape_contract(table) {
                    Reshaped::Contract(reshaped) => return TableOutput::Reshaped { index, reshaped },
                    Reshaped::Unchanged(table) => table,
                }
            } else {
                table
            };

            TableOutput::Table {
                index,
                classification,
                recovered,
                table: normalize_table(table, classification),
            }
        })
        .collect()
}
