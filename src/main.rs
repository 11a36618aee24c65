// src/main.rs
mod utils;
mod gemini;
mod extractors;
mod storage;

use std::path::PathBuf;

use clap::Parser;
use utils::AppError;
use gemini::GeminiClient;
use extractors::{finalize, ExtractionOrchestrator, ExtractionSettings, QualityTier, SourceFile, TableOutput};
use storage::{RunMetadata, StorageManager};

/// Command Line Interface for extracting tables from a PDF or image into CSV
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PDF (first page already extracted) or image file (jpg, jpeg, png, bmp, webp)
    file: PathBuf,

    /// Gemini model to use
    #[arg(short, long, default_value = "gemini-1.5-pro")]
    model: String,

    /// Extraction quality: trades answer length and determinism for speed
    #[arg(short, long, value_enum, default_value_t = QualityTier::Balanced)]
    quality: QualityTier,

    /// Split contract-form tables into summary and payment tables
    #[arg(short, long)]
    reshape: bool,

    /// Developer mode - save the raw model reply and allow a custom prompt
    #[arg(short, long)]
    developer: bool,

    /// Prompt that replaces the built-in one (developer mode only)
    #[arg(long, requires = "developer")]
    custom_prompt: Option<String>,

    /// Output directory for CSV files
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,

    /// Attempts before a transient API failure is reported
    #[arg(long, default_value_t = extractors::config::DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.developer);
    tracing::info!("Starting extraction for {}", args.file.display());

    let api_key = args
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AppError::Config("No API key: pass --api-key or set GEMINI_API_KEY".to_string()))?;

    // 3. Load the source file
    let bytes = std::fs::read(&args.file)?;
    let source = SourceFile::from_bytes(&args.file, bytes).ok_or_else(|| {
        AppError::Config(format!(
            "Unsupported file type: {} (expected pdf, jpg, jpeg, png, bmp or webp)",
            args.file.display()
        ))
    })?;
    tracing::info!("Loaded {} file {} ({} bytes)", source.kind, source.base_name, source.bytes.len());

    // 4. Build settings and the orchestrator
    let mut settings = ExtractionSettings::default()
        .with_quality(args.quality)
        .with_reshape(args.reshape)
        .with_max_attempts(args.max_attempts);
    if args.developer {
        settings = settings.with_developer_mode(args.custom_prompt.clone());
    }

    let client = GeminiClient::new(&api_key, &args.model)?;
    let orchestrator = ExtractionOrchestrator::new(client, settings);

    // 5. Initialize storage
    let storage = StorageManager::new(&args.output_dir)?;
    let timestamp = storage::timestamp();

    // 6. Call the model and parse its reply
    let extraction = orchestrator.extract(&source).await?;

    if orchestrator.settings().developer_mode {
        if let Err(e) = storage.save_raw_reply(&source.base_name, &timestamp, &extraction.reply) {
            tracing::warn!("Failed to save raw reply: {}", e);
        }
    }

    if extraction.results.is_empty() {
        tracing::warn!("No tables found in the {} file.", source.kind);
        print_no_tables_guidance(&source);
        return Ok(());
    }

    // 7. Post-process and save each table
    let outputs = finalize(extraction.results, orchestrator.settings());
    tracing::info!("Found {} table(s)", outputs.len());

    let mut tables = Vec::with_capacity(outputs.len());
    let mut failure_count = 0;

    for output in &outputs {
        if let TableOutput::Failure { index, .. } = output {
            tracing::warn!("Table {} could not be parsed; saving the original text instead", index + 1);
            failure_count += 1;
        }

        match storage.save_table(&source.base_name, &timestamp, output) {
            Ok((path, meta)) => {
                println!("{}", path.display());
                tables.push(meta);
            }
            Err(e) => tracing::error!("Failed to save table {}: {}", output.index() + 1, e),
        }
    }

    let metadata = RunMetadata {
        source_file: args.file.display().to_string(),
        model: orchestrator.model_name().to_string(),
        quality: orchestrator.settings().quality,
        extraction_timestamp: chrono::Utc::now().to_rfc3339(),
        tables,
    };
    match storage.save_run_metadata(&source.base_name, &timestamp, &metadata) {
        Ok(path) => tracing::info!("Saved run metadata to: {}", path.display()),
        Err(e) => tracing::error!("Failed to save run metadata: {}", e),
    }

    tracing::info!(
        "Processing finished. Tables: {}, Parse failures: {}",
        outputs.len(),
        failure_count
    );

    Ok(())
}

/// Hints for a reply that was valid but contained no tables.
fn print_no_tables_guidance(source: &SourceFile) {
    let hints: &[&str] = if source.kind.is_pdf() {
        &[
            "Check that the PDF has a text layer (scanned documents may need OCR).",
            "Check that the table really is laid out as a table.",
            "Try a smaller PDF or a higher resolution scan.",
        ]
    } else {
        &[
            "Check that the image resolution is high enough.",
            "Check that the image is not blurred or distorted.",
            "Check that the table is clearly visible.",
            "Try converting the image to another format.",
        ]
    };

    println!("No tables found in {}. Things to try:", source.base_name);
    for (i, hint) in hints.iter().enumerate() {
        println!("  {}. {}", i + 1, hint);
    }
}
