// src/extractors/mod.rs
pub mod classify;
pub mod config;
pub mod normalize;
pub mod orchestrator;
pub mod prompt;
pub mod reshape;
pub mod response;
pub mod source;
pub mod table;

// Re-export key extraction types for convenience
pub use config::{ExtractionSettings, QualityTier};
pub use orchestrator::{finalize, ExtractionOrchestrator, TableOutput};
pub use source::SourceFile;
pub use table::ParsedTable;
