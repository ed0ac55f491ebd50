// CSV Export - table snapshots with per-column filters
// Rows are rendered exactly as the on-screen tables show them (display
// timestamps, comma-decimal amounts), then filtered with case- and
// accent-insensitive substring matching before serialization.

use crate::clock::format_timestamp;
use crate::expense::ExpenseRecord;
use crate::income::IncomeRecord;
use crate::text::contains_folded;
use anyhow::{Context, Result};
use std::io::Write;

/// Income table columns, in export order.
pub const INCOME_HEADERS: [&str; 8] = [
    "DATE", "AMOUNT", "SEMESTER", "ACCOUNT", "METHOD", "LINE", "USER", "EXTRA",
];

/// Expense table columns, in export order.
pub const EXPENSE_HEADERS: [&str; 10] = [
    "DATE",
    "ACCOUNT",
    "METHOD",
    "AMOUNT",
    "REAL AMOUNT",
    "SEMESTER",
    "CATEGORY",
    "REASON",
    "AUTHORIZED",
    "RESPONSIBLE",
];

pub fn income_row(record: &IncomeRecord) -> Vec<String> {
    vec![
        format_timestamp(&record.date),
        record.amount.format(),
        record.semester.clone(),
        record.account.clone(),
        record.method.clone(),
        record.line.clone(),
        record.user.clone(),
        record.extra.clone(),
    ]
}

pub fn expense_row(record: &ExpenseRecord) -> Vec<String> {
    vec![
        format_timestamp(&record.date),
        record.account.clone(),
        record.method.clone(),
        record.amount.format(),
        record.real_amount.format(),
        record.semester.clone(),
        record.category.clone(),
        record.reason.clone(),
        record.authorized_by.clone(),
        record.responsible.clone(),
    ]
}

/// Keep the rows matching every (column, needle) filter. Blank needles are
/// skipped; a filter on a column the row does not have matches nothing.
pub fn apply_filters(rows: Vec<Vec<String>>, filters: &[(usize, String)]) -> Vec<Vec<String>> {
    rows.into_iter()
        .filter(|row| {
            filters.iter().all(|(col, needle)| {
                needle.trim().is_empty()
                    || row
                        .get(*col)
                        .is_some_and(|cell| contains_folded(cell, needle))
            })
        })
        .collect()
}

/// Serialize a header row plus data rows as CSV.
pub fn write_csv<W: Write>(writer: W, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush().context("Failed to flush CSV output")?;

    Ok(())
}

/// Filtered income export as a CSV string.
pub fn export_incomes(records: &[IncomeRecord], filters: &[(usize, String)]) -> Result<String> {
    let rows = apply_filters(records.iter().map(income_row).collect(), filters);
    csv_string(&INCOME_HEADERS, &rows)
}

/// Filtered expense export as a CSV string.
pub fn export_expenses(records: &[ExpenseRecord], filters: &[(usize, String)]) -> Result<String> {
    let rows = apply_filters(records.iter().map(expense_row).collect(), filters);
    csv_string(&EXPENSE_HEADERS, &rows)
}

fn csv_string(headers: &[&str], rows: &[Vec<String>]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, headers, rows)?;
    String::from_utf8(buf).context("CSV output was not valid UTF-8")
}

// ============================================================================
// TESTS
// ============================================================================
