// src/extractors/normalize.rs
use crate::extractors::classify::TableClassification;
use crate::extractors::table::ParsedTable;

/// Canonicalizes a numeric-looking cell: thousands separators are removed and
/// an accounting negative like `(1,234)` becomes `-1234`. Empty cells and
/// already-normalized values come back unchanged.
pub fn normalize_numeric(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let stripped = value.replace(',', "");
    let trimmed = stripped.trim();

    match trimmed.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) if !inner.trim().is_empty() => format!("-{}", inner.trim()),
        _ => stripped,
    }
}

/// Post-processing applied to a parsed table before export: cells are
/// trimmed, empty rows/columns dropped, and for financial statements every
/// value column (all but the first, label, column) is numerically normalized.
pub fn normalize_table(table: ParsedTable, classification: TableClassification) -> ParsedTable {
    let table = table
        .map_cells(|_| true, |cell| cell.trim().to_string())
        .drop_empty();

    if classification.is_financial_statement() {
        table.map_cells(|col| col != 0, normalize_numeric)
    } else {
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parenthesized_negative() {
        assert_eq!(normalize_numeric("(1,234)"), "-1234");
        assert_eq!(normalize_numeric(" (500) "), "-500");
        assert_eq!(normalize_numeric("1,234,567"), "1234567");
        assert_eq!(normalize_numeric("12.5%"), "12.5%");
        assert_eq!(normalize_numeric(""), "");
        assert_eq!(normalize_numeric("()"), "()");
    }

    #[test]
    fn test_idempotent() {
        for value in ["(1,234)", "1,000", "((5))", "-", "( 7 )", "abc", "", "()", "3,4,5"] {
            let once = normalize_numeric(value);
            assert_eq!(normalize_numeric(&once), once, "not idempotent for {:?}", value);
        }
    }

    #[test]
    fn test_balance_sheet_value_columns_normalized() {
        let table = ParsedTable::new(
            strings(&["항목", "2023"]),
            vec![strings(&["(유동자산)", "(1,234)"]), strings(&["자산총계", " 5,000 "])],
        );
        let out = normalize_table(table, TableClassification::BalanceSheet);

        // Label column is left alone
        assert_eq!(out.cell(0, "항목"), Some("(유동자산)"));
        assert_eq!(out.cell(0, "2023"), Some("-1234"));
        assert_eq!(out.cell(1, "2023"), Some("5000"));
    }

    #[test]
    fn test_other_types_only_trimmed() {
        let table = ParsedTable::new(strings(&["Name", "Value"]), vec![strings(&["a", " (1,234) "])]);

        let out = normalize_table(table.clone(), TableClassification::InvestmentMetrics);
        assert_eq!(out.cell(0, "Value"), Some("(1,234)"));

        let out = normalize_table(table, TableClassification::Unclassified);
        assert_eq!(out.cell(0, "Value"), Some("(1,234)"));
    }
}
