// src/extractors/classify.rs
use crate::extractors::table::ParsedTable;
use serde::Serialize;

// --- Constants ---
const CLASSIFY_SAMPLE_ROWS: usize = 20;
const CONTRACT_SAMPLE_ROWS: usize = 10;
const MIN_KEYWORD_MATCHES: usize = 2;
// Contract forms are one consolidated row with a handful of columns; statements are larger.
const CONTRACT_MAX_ROWS: usize = 20;
const CONTRACT_MAX_COLUMNS: usize = 10;

/// Scored statement types, in tie-break priority order.
const KEYWORD_SETS: &[(TableClassification, &[&str])] = &[
    (
        TableClassification::BalanceSheet,
        &["재무상태표", "대차대조표", "자산", "부채", "자본", "유동자산", "비유동자산", "자산총계", "부채총계"],
    ),
    (
        TableClassification::IncomeStatement,
        &["손익계산서", "매출액", "매출원가", "매출총이익", "영업이익", "당기순이익", "EBITDA", "판매비", "관리비"],
    ),
    (
        TableClassification::CashFlowStatement,
        &["현금흐름표", "영업활동", "투자활동", "재무활동", "현금흐름", "기초현금", "기말현금"],
    ),
    (
        TableClassification::InvestmentMetrics,
        &["PER", "ROA", "ROE", "EPS", "BPS", "성장성", "수익성", "안정성", "주당순이익"],
    ),
];

/// Unit id, contracting party, area, sale price and payment schedule terms.
const CONTRACT_KEYWORDS: &[&str] = &["호실", "계약자", "면적", "분양대금", "납부", "계약금", "중도금", "잔금"];

// --- Data Structures ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableClassification {
    BalanceSheet,
    IncomeStatement,
    CashFlowStatement,
    InvestmentMetrics,
    ContractForm,
    Unclassified,
}

impl TableClassification {
    /// Statement types whose value columns get numeric normalization.
    pub fn is_financial_statement(self) -> bool {
        matches!(
            self,
            Self::BalanceSheet | Self::IncomeStatement | Self::CashFlowStatement
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BalanceSheet => "balance sheet",
            Self::IncomeStatement => "income statement",
            Self::CashFlowStatement => "cash flow statement",
            Self::InvestmentMetrics => "investment metrics",
            Self::ContractForm => "contract form",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Assigns a statement type by counting which keywords of each set occur in
/// the headers and first rows. Each keyword counts once. The highest score
/// wins, earlier entries of `KEYWORD_SETS` win ties, and fewer than two
/// matches leaves the table unclassified.
pub fn classify_table(table: &ParsedTable) -> TableClassification {
    if table.is_empty() {
        return TableClassification::Unclassified;
    }

    let text = table.search_text(CLASSIFY_SAMPLE_ROWS).to_lowercase();

    let mut best = (TableClassification::Unclassified, 0usize);
    for (kind, keywords) in KEYWORD_SETS {
        let score = count_keywords(&text, keywords);
        tracing::trace!("Keyword score for {}: {}", kind.label(), score);
        // Strictly greater, so the earlier type keeps a tie
        if score > best.1 {
            best = (*kind, score);
        }
    }

    if best.1 >= MIN_KEYWORD_MATCHES {
        best.0
    } else {
        TableClassification::Unclassified
    }
}

/// Whether the table looks like a single-unit sale contract: contract
/// keywords in the headers or first rows, and a small shape.
/// Evaluated independently of `classify_table`.
pub fn is_contract_form(table: &ParsedTable) -> bool {
    if table.is_empty() {
        return false;
    }

    let is_small = table.row_count() < CONTRACT_MAX_ROWS && table.column_count() < CONTRACT_MAX_COLUMNS;
    if !is_small {
        return false;
    }

    let text = table.search_text(CONTRACT_SAMPLE_ROWS).to_lowercase();
    count_keywords(&text, CONTRACT_KEYWORDS) > 0
}

fn count_keywords(text: &str, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|keyword| text.contains(&keyword.to_lowercase()))
        .count()
}
