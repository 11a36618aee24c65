// src/extractors/response.rs

// --- Imports ---
use crate::extractors::table::ParsedTable;
use crate::utils::error::ParseError;
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use regex::Regex;

// --- Constants ---
pub const BLOCK_START: &str = "TABLE_START";
pub const BLOCK_END: &str = "TABLE_END";
pub const NO_TABLES_FOUND: &str = "NO_TABLES_FOUND";

// Stands in for a comma inside a quoted field while a recovered line is split.
const COMMA_PLACEHOLDER: &str = "__COMMA__";

// --- Regex Patterns (Lazy Static) ---
static DEFAULT_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    block_regex(BLOCK_START, BLOCK_END).expect("Failed to compile DEFAULT_BLOCK_RE")
});

// Horizontal whitespace only, so a trailing comma never joins two lines.
// Recovery only: these also rewrite `, "` inside a field that holds an escaped quote.
static SPACE_AROUND_CLOSING_QUOTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[ \t]*"[ \t]*,[ \t]*"#).expect("Failed to compile SPACE_AROUND_CLOSING_QUOTE_RE")
});

static SPACE_AROUND_OPENING_QUOTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[ \t]*,[ \t]*"[ \t]*"#).expect("Failed to compile SPACE_AROUND_OPENING_QUOTE_RE")
});

fn block_regex(start: &str, end: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?s){}\s*(.*?)\s*{}",
        regex::escape(start),
        regex::escape(end)
    ))
}

// --- Data Structures ---

/// Outcome of parsing one delimited block of a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    /// Parsed by the strict reader.
    Parsed(ParsedTable),
    /// Parsed only by the lenient recovery reader; lower confidence.
    RecoveredParsed(ParsedTable),
    /// Neither reader produced a table. Holds the block text as received.
    ParseFailure { original_text: String },
}

impl ExtractionResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExtractionResult::ParseFailure { .. })
    }
}

/// Splits a model reply into marker-delimited blocks and parses each one.
pub struct ResponseParser {
    block_re: Regex,
}

impl ResponseParser {
    /// Parser for the standard `TABLE_START` / `TABLE_END` markers.
    pub fn new() -> Self {
        Self { block_re: DEFAULT_BLOCK_RE.clone() }
    }

    /// Parses every block of `reply` in order of appearance.
    /// A reply containing `NO_TABLES_FOUND` anywhere yields no results,
    /// whatever blocks it also carries. Every block yields exactly one result.
    pub fn parse_reply(&self, reply: &str) -> Vec<ExtractionResult> {
        if reply.contains(NO_TABLES_FOUND) {
            tracing::info!("Model reported no tables in the document");
            return Vec::new();
        }

        let results: Vec<ExtractionResult> = self
            .block_re
            .captures_iter(reply)
            .enumerate()
            .map(|(index, caps)| {
                let text = caps.get(1).map_or("", |m| m.as_str());
                self.parse_block(index, text)
            })
            .collect();

        let failures = results.iter().filter(|r| r.is_failure()).count();
        tracing::debug!("Found {} table block(s) in model reply, {} unparseable", results.len(), failures);
        results
    }

    /// Strict parse first, lenient recovery if it raises, failure otherwise.
    pub fn parse_block(&self, index: usize, text: &str) -> ExtractionResult {
        let primary_err = match parse_strict(text) {
            Ok(table) => {
                tracing::debug!("Table {} parsed: {} rows x {} columns", index + 1, table.row_count(), table.column_count());
                return ExtractionResult::Parsed(table);
            }
            Err(e) => e,
        };

        tracing::warn!("Table {} failed to parse ({}), attempting recovery", index + 1, primary_err);

        match parse_lenient(text) {
            Ok(table) => {
                tracing::info!("Table {} recovered: {} rows x {} columns", index + 1, table.row_count(), table.column_count());
                ExtractionResult::RecoveredParsed(table)
            }
            Err(e) => {
                tracing::error!("Table {} could not be recovered ({}); keeping raw text", index + 1, e);
                ExtractionResult::ParseFailure { original_text: text.to_string() }
            }
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes blanks between quotes and commas: `"a" , "b"` becomes `"a","b"`.
fn tidy_quoted_fields(text: &str) -> String {
    let text = SPACE_AROUND_CLOSING_QUOTE_RE.replace_all(text, "\",");
    SPACE_AROUND_OPENING_QUOTE_RE.replace_all(&text, ",\"").into_owned()
}

/// Quoted CSV reader. Every field must be fully quoted; a missing header is
/// an error. Rows whose width differs from the header are skipped with a warning.
fn parse_strict(text: &str) -> Result<ParsedTable, ParseError> {
    let compact = strip_outside_quotes(text.trim_start_matches('\u{feff}'))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(compact.as_bytes());

    let mut records = reader.records();
    let header: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => return Err(ParseError::MissingHeader),
    };

    let mut rows = Vec::new();
    for (i, record) in records.enumerate() {
        let record = record?;
        if record.len() != header.len() {
            tracing::warn!(
                "Skipping malformed row {}: expected {} fields, found {}",
                i + 1,
                header.len(),
                record.len()
            );
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(ParsedTable::from_records(header, rows))
}

/// Checks that `text` is made of quoted fields only and drops the blanks
/// between them. Content inside quotes is copied untouched.
fn strip_outside_quotes(text: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut line = 1;
    let mut in_quotes = false;
    // A field was closed and a comma or line end may follow
    let mut after_field = false;
    let mut line_started = false;

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    out.push_str("\"\"");
                    continue;
                }
                in_quotes = false;
                after_field = true;
            } else if ch == '\n' {
                line += 1;
            }
            out.push(ch);
            continue;
        }

        match ch {
            ' ' | '\t' | '\r' => {}
            '"' if !after_field => {
                in_quotes = true;
                line_started = true;
                out.push(ch);
            }
            ',' if after_field => {
                after_field = false;
                out.push(ch);
            }
            '\n' if after_field || !line_started => {
                after_field = false;
                line_started = false;
                line += 1;
                out.push(ch);
            }
            _ => return Err(ParseError::UnquotedField(line)),
        }
    }

    if in_quotes {
        return Err(ParseError::UnterminatedQuote);
    }
    if line_started && !after_field {
        return Err(ParseError::UnquotedField(line));
    }
    Ok(out)
}

/// Best-effort reader for text the strict reader rejected. Commas inside
/// quotes are protected line by line, lines are split without quote
/// handling, and rows of the wrong width are dropped silently.
fn parse_lenient(text: &str) -> Result<ParsedTable, ParseError> {
    let protected = tidy_quoted_fields(text.trim_start_matches('\u{feff}'))
        .lines()
        .map(protect_quoted_commas)
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(protected.as_bytes());

    let mut records = reader.records();
    let header: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(restore_field).collect(),
        None => return Err(ParseError::MissingHeader),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        if record.len() == header.len() {
            rows.push(record.iter().map(restore_field).collect());
        }
    }

    let table = ParsedTable::from_records(header, rows);
    if table.is_empty() {
        return Err(ParseError::EmptyTable);
    }
    Ok(table)
}

/// Replaces commas inside a quoted span of one line with `COMMA_PLACEHOLDER`.
/// An unterminated quote protects the rest of its line only.
fn protect_quoted_commas(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                out.push(ch);
            }
            ',' if in_quotes => out.push_str(COMMA_PLACEHOLDER),
            _ => out.push(ch),
        }
    }
    out
}

/// Restores protected commas and strips the blanks and one pair of quotes
/// around the field.
fn restore_field(field: &str) -> String {
    let restored = field.replace(COMMA_PLACEHOLDER, ",");
    let trimmed = restored.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    trimmed.strip_suffix('"').unwrap_or(trimmed).to_string()
}
