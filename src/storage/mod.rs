// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};
use crate::extractors::{ParsedTable, TableOutput};
use crate::utils::error::StorageError;
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;

/// UTF-8 byte order mark, so spreadsheet apps detect the encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Current local time in the `YYYY-MM-DD_HHMMSS` form used in file names.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d_%H%M%S").to_string()
}

/// `{base}_{timestamp}_table_{n}.csv`, with `n` counting from 1.
pub fn csv_file_name(base_name: &str, timestamp: &str, number: usize) -> String {
    format!("{}_{}_table_{}.csv", base_name, timestamp, number)
}

/// Serializes a table as BOM-prefixed UTF-8 CSV with every field quoted.
pub fn to_csv_bytes(table: &ParsedTable) -> Result<Vec<u8>, StorageError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(UTF8_BOM.to_vec());

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|e| StorageError::IoError(e.into_error()))
}

/// Per-table entry of the run metadata file.
#[derive(Debug, Serialize)]
pub struct TableMetadata {
    pub number: usize,
    pub kind: &'static str,
    pub classification: Option<&'static str>,
    pub rows: usize,
    pub columns: usize,
    pub csv_file: String,
}

/// Summary of one extraction run, written next to the CSV files.
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    pub source_file: String,
    pub model: String,
    pub quality: crate::extractors::QualityTier,
    pub extraction_timestamp: String,
    pub tables: Vec<TableMetadata>,
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Writes one extracted table as CSV and describes it for the metadata file.
    pub fn save_table(
        &self,
        base_name: &str,
        timestamp: &str,
        output: &TableOutput,
    ) -> Result<(PathBuf, TableMetadata), StorageError> {
        let number = output.index() + 1;
        let filename = csv_file_name(base_name, timestamp, number);
        let file_path = self.base_dir.join(&filename);

        let table = output.export_table();
        fs::write(&file_path, to_csv_bytes(&table)?)?;

        tracing::info!("Saved table {} to {}", number, file_path.display());

        let kind = match output {
            TableOutput::Table { recovered: false, .. } => "parsed",
            TableOutput::Table { recovered: true, .. } => "recovered",
            TableOutput::Reshaped { .. } => "reshaped",
            TableOutput::Failure { .. } => "parse_failure",
        };
        let metadata = TableMetadata {
            number,
            kind,
            classification: output.classification().map(|c| c.label()),
            rows: table.row_count(),
            columns: table.column_count(),
            csv_file: filename,
        };

        Ok((file_path, metadata))
    }

    /// Saves the model's unprocessed reply for inspection.
    pub fn save_raw_reply(&self, base_name: &str, timestamp: &str, reply: &str) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("{}_{}_reply.txt", base_name, timestamp));
        fs::write(&file_path, reply)?;

        tracing::info!("Saved raw reply to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves metadata about the run in JSON format
    pub fn save_run_metadata(&self, base_name: &str, timestamp: &str, metadata: &RunMetadata) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("{}_{}_meta.json", base_name, timestamp));

        let metadata_str = serde_json::to_string_pretty(metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str)
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());

        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::classify::TableClassification;
    use crate::extractors::response::{ExtractionResult, ResponseParser};
    use crate::extractors::QualityTier;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn reparse(bytes: &[u8]) -> ParsedTable {
        let body = std::str::from_utf8(bytes).unwrap();
        let reply = format!("TABLE_START\n{}\nTABLE_END", body);
        match ResponseParser::new().parse_reply(&reply).remove(0) {
            ExtractionResult::Parsed(table) => table,
            other => panic!("expected Parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_file_name_convention() {
        assert_eq!(csv_file_name("report", "2024-03-01_093015", 1), "report_2024-03-01_093015_table_1.csv");
        let ts = timestamp();
        assert_eq!(ts.len(), "YYYY-MM-DD_HHMMSS".len());
        assert_eq!(&ts[10..11], "_");
    }

    #[test]
    fn test_csv_has_bom_and_quotes_everything() {
        let table = ParsedTable::new(strings(&["항목", "2023"]), vec![strings(&["매출액", "1,234"])]);
        let bytes = to_csv_bytes(&table).unwrap();

        assert!(bytes.starts_with(UTF8_BOM));
        let body = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
        assert_eq!(body, "\"항목\",\"2023\"\n\"매출액\",\"1,234\"\n");
    }

    #[test]
    fn test_export_round_trip() {
        let table = ParsedTable::new(
            strings(&["구분", "2022", "2023"]),
            vec![
                strings(&["매출액", "1,234", "(56)"]),
                strings(&["비고 \"주석\"", "", "12%"]),
                strings(&["영업이익", "7", "8"]),
            ],
        );
        let bytes = to_csv_bytes(&table).unwrap();
        assert_eq!(reparse(&bytes), table);
    }

    #[test]
    fn test_export_round_trip_keeps_inner_whitespace() {
        let table = ParsedTable::new(
            strings(&["구분", "2023"]),
            vec![
                strings(&["  유동자산", "1"]),
                strings(&["He said, \"hi\"", "2"]),
                strings(&["합계 ", "3"]),
            ],
        );
        let bytes = to_csv_bytes(&table).unwrap();
        assert_eq!(reparse(&bytes), table);
    }

    #[test]
    fn test_save_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("out")).unwrap();

        let output = TableOutput::Table {
            index: 1,
            classification: TableClassification::IncomeStatement,
            recovered: false,
            table: ParsedTable::new(strings(&["A"]), vec![strings(&["1"])]),
        };
        let (path, meta) = storage.save_table("scan", "2024-01-02_030405", &output).unwrap();

        assert_eq!(path.file_name().unwrap(), "scan_2024-01-02_030405_table_2.csv");
        assert!(path.exists());
        assert_eq!(meta.kind, "parsed");
        assert_eq!(meta.classification, Some("income statement"));

        let failure = TableOutput::Failure { index: 0, original_text: "\"broken".to_string() };
        let (path, meta) = storage.save_table("scan", "2024-01-02_030405", &failure).unwrap();
        let written = fs::read(&path).unwrap();
        assert_eq!(&written[UTF8_BOM.len()..], b"\"original_csv\"\n\"\"\"broken\"\n");
        assert_eq!(meta.kind, "parse_failure");

        let run = RunMetadata {
            source_file: "scan.png".to_string(),
            model: "gemini-1.5-pro".to_string(),
            quality: QualityTier::High,
            extraction_timestamp: "2024-01-02T03:04:05Z".to_string(),
            tables: vec![meta],
        };
        let meta_path = storage.save_run_metadata("scan", "2024-01-02_030405", &run).unwrap();
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(meta_path).unwrap()).unwrap();
        assert_eq!(json["quality"], "high");
        assert_eq!(json["tables"][0]["kind"], "parse_failure");
    }
}
