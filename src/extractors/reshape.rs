// src/extractors/reshape.rs
use crate::extractors::classify::is_contract_form;
use crate::extractors::table::ParsedTable;

// --- Constants ---
pub const SUMMARY_COLUMNS: [&str; 4] = ["호실", "계약자", "면적(㎡)", "분양대금"];
pub const PAYMENT_COLUMNS: [&str; 4] = ["구분", "납부할금액(연체료포함)", "납부금액", "납부일"];

// Source fields read for each payment row, before any `.N` suffix
const AMOUNT_DUE_FIELD: &str = "납부할금액(연체료포함)";
const AMOUNT_PAID_FIELD: &str = "납부금액";
const PAID_DATE_FIELD: &str = "납부일";

// Positions read when the named summary fields are missing.
// Reading position 5 rather than 3 for the sale price is an inherited quirk, kept as is.
const SUMMARY_FALLBACK_POSITIONS: [usize; 4] = [0, 1, 2, 5];

const SEPARATOR: &str = "---";

/// A contract form split into its header block and payment schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReshapedTable {
    pub summary: ParsedTable,
    pub payments: ParsedTable,
    pub combined: ParsedTable,
}

/// Result of `reshape_contract`: either the split tables or the input, untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reshaped {
    Contract(ReshapedTable),
    Unchanged(ParsedTable),
}

/// Decomposes a one-row contract form into a summary table and a six-row
/// payment schedule. Tables that are not contract forms, or have no rows,
/// are handed back unchanged. Only the first row is read.
pub fn reshape_contract(table: ParsedTable) -> Reshaped {
    if table.row_count() == 0 || !is_contract_form(&table) {
        tracing::debug!("Table is not a reshapeable contract form, leaving it as is");
        return Reshaped::Unchanged(table);
    }
    if table.row_count() > 1 {
        tracing::debug!("Contract form has {} rows; only the first is reshaped", table.row_count());
    }

    let summary = ParsedTable::new(to_strings(&SUMMARY_COLUMNS), vec![summary_row(&table)]);
    let payments = ParsedTable::new(to_strings(&PAYMENT_COLUMNS), payment_rows(&table));
    let combined = combine(&summary, &payments);

    Reshaped::Contract(ReshapedTable { summary, payments, combined })
}

fn summary_row(table: &ParsedTable) -> Vec<String> {
    if table.has_column("호실") && table.has_column("계약자") {
        return SUMMARY_COLUMNS
            .iter()
            .map(|name| field(table, name))
            .collect();
    }

    if table.column_count() > SUMMARY_FALLBACK_POSITIONS[3] {
        tracing::debug!("Named contract fields missing, reading summary by position");
        return SUMMARY_FALLBACK_POSITIONS
            .iter()
            .map(|&col| table.cell_at(0, col).unwrap_or_default().to_string())
            .collect();
    }

    vec![String::new(); SUMMARY_COLUMNS.len()]
}

fn payment_rows(table: &ParsedTable) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(6);
    rows.push(payment_row(table, "계약금".to_string(), ""));
    for i in 1..=4 {
        rows.push(payment_row(table, format!("중도금 {}차", i), &format!(".{}", i)));
    }
    rows.push(payment_row(table, "잔금".to_string(), ".5"));
    rows
}

fn payment_row(table: &ParsedTable, category: String, suffix: &str) -> Vec<String> {
    vec![
        category,
        field(table, &format!("{}{}", AMOUNT_DUE_FIELD, suffix)),
        field(table, &format!("{}{}", AMOUNT_PAID_FIELD, suffix)),
        field(table, &format!("{}{}", PAID_DATE_FIELD, suffix)),
    ]
}

fn field(table: &ParsedTable, name: &str) -> String {
    table.cell(0, name).unwrap_or_default().to_string()
}

/// Summary rows, a `---` separator row, then payment rows, all under the
/// summary's columns.
fn combine(summary: &ParsedTable, payments: &ParsedTable) -> ParsedTable {
    let mut rows: Vec<Vec<String>> = summary.rows().to_vec();
    rows.push(vec![SEPARATOR.to_string(); summary.column_count()]);
    rows.extend(payments.rows().iter().cloned());
    ParsedTable::new(summary.columns().to_vec(), rows)
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], row: &[&str]) -> ParsedTable {
        ParsedTable::new(to_strings(columns), vec![to_strings(row)])
    }

    fn expect_contract(reshaped: Reshaped) -> ReshapedTable {
        match reshaped {
            Reshaped::Contract(r) => r,
            Reshaped::Unchanged(t) => panic!("expected reshaped contract, got {:?}", t),
        }
    }

    #[test]
    fn test_named_fields_without_payments() {
        let input = table(
            &["호실", "계약자", "면적(㎡)", "분양대금"],
            &["101", "Kim", "84", "500,000,000"],
        );
        let r = expect_contract(reshape_contract(input));

        assert_eq!(r.summary.columns(), to_strings(&SUMMARY_COLUMNS).as_slice());
        assert_eq!(r.summary.rows(), &[to_strings(&["101", "Kim", "84", "500,000,000"])]);

        assert_eq!(r.payments.columns(), to_strings(&PAYMENT_COLUMNS).as_slice());
        assert_eq!(r.payments.row_count(), 6);
        let categories: Vec<&str> = r.payments.rows().iter().map(|row| row[0].as_str()).collect();
        assert_eq!(categories, ["계약금", "중도금 1차", "중도금 2차", "중도금 3차", "중도금 4차", "잔금"]);
        for row in r.payments.rows() {
            assert!(row[1..].iter().all(String::is_empty), "expected empty payment fields: {:?}", row);
        }
    }

    #[test]
    fn test_suffixed_payment_fields() {
        let input = table(
            &[
                "호실", "계약자",
                "납부할금액(연체료포함)", "납부금액", "납부일",
                "납부할금액(연체료포함).2", "납부일.2",
                "납부금액.5",
            ],
            &["202", "Lee", "50,000", "50,000", "2023-01-10", "30,000", "2023-06-10", "120,000"],
        );
        let r = expect_contract(reshape_contract(input));

        assert_eq!(r.payments.rows()[0], to_strings(&["계약금", "50,000", "50,000", "2023-01-10"]));
        assert_eq!(r.payments.rows()[1], to_strings(&["중도금 1차", "", "", ""]));
        assert_eq!(r.payments.rows()[2], to_strings(&["중도금 2차", "30,000", "", "2023-06-10"]));
        assert_eq!(r.payments.rows()[5], to_strings(&["잔금", "", "120,000", ""]));
        // 면적 and 분양대금 absent from the source
        assert_eq!(r.summary.rows()[0], to_strings(&["202", "Lee", "", ""]));
    }

    #[test]
    fn test_positional_fallback_reads_position_five() {
        // Contract keyword appears in the data, not in the headers
        let input = table(
            &["c0", "c1", "c2", "c3", "c4", "c5"],
            &["301", "Park", "59", "계약금", "x", "400,000,000"],
        );
        let r = expect_contract(reshape_contract(input));
        assert_eq!(r.summary.rows()[0], to_strings(&["301", "Park", "59", "400,000,000"]));
    }

    #[test]
    fn test_narrow_table_without_names_gives_empty_summary() {
        let input = table(&["c0", "c1", "c2"], &["잔금", "1", "2"]);
        let r = expect_contract(reshape_contract(input));
        assert_eq!(r.summary.rows()[0], to_strings(&["", "", "", ""]));
    }

    #[test]
    fn test_combined_layout() {
        let input = table(&["호실", "계약자"], &["101", "Kim"]);
        let r = expect_contract(reshape_contract(input));

        assert_eq!(r.combined.columns(), to_strings(&SUMMARY_COLUMNS).as_slice());
        assert_eq!(r.combined.row_count(), 1 + 1 + 6);
        assert_eq!(r.combined.rows()[0], r.summary.rows()[0]);
        assert_eq!(r.combined.rows()[1], to_strings(&["---", "---", "---", "---"]));
        assert_eq!(r.combined.rows()[2..], r.payments.rows()[..]);
    }

    #[test]
    fn test_only_first_row_used() {
        let input = ParsedTable::new(
            to_strings(&["호실", "계약자"]),
            vec![to_strings(&["101", "Kim"]), to_strings(&["102", "Choi"])],
        );
        let r = expect_contract(reshape_contract(input));
        assert_eq!(r.summary.rows()[0][0], "101");
        assert_eq!(r.summary.row_count(), 1);
    }

    #[test]
    fn test_non_contract_table_unchanged() {
        let input = table(&["항목", "2023"], &["자산총계", "100"]);
        assert_eq!(reshape_contract(input.clone()), Reshaped::Unchanged(input));

        let empty = ParsedTable::new(to_strings(&["호실", "계약자"]), Vec::new());
        assert_eq!(reshape_contract(empty.clone()), Reshaped::Unchanged(empty));
    }
}
