// SQLite Persistence - the ledger repository
// Two append-only tables, one per movement kind. Amounts are stored as
// integer cents and timestamps as RFC3339 text; listings come back newest
// first. The normalizers never touch SQL and the repository never validates.

use crate::clock::bogota_offset;
use crate::expense::ExpenseRecord;
use crate::income::IncomeRecord;
use crate::money::Money;
use anyhow::{Context, Result};
use chrono::DateTime;
use rusqlite::{params, Connection, Row};
use std::path::Path;

// ============================================================================
// REPOSITORY TRAIT
// ============================================================================

/// Storage seam for the ledger. Listings return records newest first.
pub trait LedgerRepository {
    fn insert_income(&self, record: &IncomeRecord) -> Result<()>;
    fn insert_expense(&self, record: &ExpenseRecord) -> Result<()>;
    fn list_incomes(&self) -> Result<Vec<IncomeRecord>>;
    fn list_expenses(&self) -> Result<Vec<ExpenseRecord>>;
    fn income_summary(&self) -> Result<Vec<IncomeSummaryRow>>;
    fn expense_summary(&self) -> Result<Vec<ExpenseSummaryRow>>;
}

/// Income totals for one semester.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IncomeSummaryRow {
    pub semester: String,
    pub count: i64,
    pub total: Money,
}

/// Expense totals for one category, with and without the 4x1000 levy.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExpenseSummaryRow {
    pub category: String,
    pub count: i64,
    pub total: Money,
    pub total_real: Money,
}

// ============================================================================
// SQLITE BACKEND
// ============================================================================

pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Open (or create) the ledger database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("Failed to open database: {:?}", path.as_ref()))?;
        setup_database(&conn)?;
        Ok(SqliteLedger { conn })
    }

    /// In-memory ledger for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteLedger { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS incomes (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            semester TEXT NOT NULL,
            account TEXT NOT NULL,
            method TEXT NOT NULL,
            line TEXT NOT NULL,
            user TEXT NOT NULL,
            extra TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            account TEXT NOT NULL,
            method TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            real_amount_cents INTEGER NOT NULL,
            semester TEXT NOT NULL,
            category TEXT NOT NULL,
            reason TEXT NOT NULL,
            authorized_by TEXT NOT NULL,
            responsible TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_incomes_created_at ON incomes(created_at)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_created_at ON expenses(created_at)",
        [],
    )?;

    Ok(())
}

impl LedgerRepository for SqliteLedger {
    fn insert_income(&self, record: &IncomeRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO incomes (
                id, created_at, amount_cents, semester, account, method, line, user, extra
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id,
                record.date.to_rfc3339(),
                record.amount.cents(),
                record.semester,
                record.account,
                record.method,
                record.line,
                record.user,
                record.extra,
            ],
        )?;
        Ok(())
    }

    fn insert_expense(&self, record: &ExpenseRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO expenses (
                id, created_at, account, method, amount_cents, real_amount_cents,
                semester, category, reason, authorized_by, responsible
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.id,
                record.date.to_rfc3339(),
                record.account,
                record.method,
                record.amount.cents(),
                record.real_amount.cents(),
                record.semester,
                record.category,
                record.reason,
                record.authorized_by,
                record.responsible,
            ],
        )?;
        Ok(())
    }

    fn list_incomes(&self) -> Result<Vec<IncomeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, amount_cents, semester, account, method, line, user, extra
             FROM incomes
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let records = stmt
            .query_map([], income_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn list_expenses(&self) -> Result<Vec<ExpenseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, account, method, amount_cents, real_amount_cents,
                    semester, category, reason, authorized_by, responsible
             FROM expenses
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let records = stmt
            .query_map([], expense_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn income_summary(&self) -> Result<Vec<IncomeSummaryRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT semester, COUNT(*), SUM(amount_cents)
             FROM incomes
             GROUP BY semester
             ORDER BY semester",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(IncomeSummaryRow {
                    semester: row.get(0)?,
                    count: row.get(1)?,
                    total: Money::from_cents(row.get(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn expense_summary(&self) -> Result<Vec<ExpenseSummaryRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*), SUM(amount_cents), SUM(real_amount_cents)
             FROM expenses
             GROUP BY category
             ORDER BY category",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ExpenseSummaryRow {
                    category: row.get(0)?,
                    count: row.get(1)?,
                    total: Money::from_cents(row.get(2)?),
                    total_real: Money::from_cents(row.get(3)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn parse_stored_date(raw: &str) -> rusqlite::Result<chrono::DateTime<chrono::FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&bogota_offset()))
        .map_err(|_| rusqlite::Error::InvalidQuery)
}

fn income_from_row(row: &Row<'_>) -> rusqlite::Result<IncomeRecord> {
    let created_at: String = row.get(1)?;
    Ok(IncomeRecord {
        id: row.get(0)?,
        date: parse_stored_date(&created_at)?,
        amount: Money::from_cents(row.get(2)?),
        semester: row.get(3)?,
        account: row.get(4)?,
        method: row.get(5)?,
        line: row.get(6)?,
        user: row.get(7)?,
        extra: row.get(8)?,
    })
}

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<ExpenseRecord> {
    let created_at: String = row.get(1)?;
    Ok(ExpenseRecord {
        id: row.get(0)?,
        date: parse_stored_date(&created_at)?,
        account: row.get(2)?,
        method: row.get(3)?,
        amount: Money::from_cents(row.get(4)?),
        real_amount: Money::from_cents(row.get(5)?),
        semester: row.get(6)?,
        category: row.get(7)?,
        reason: row.get(8)?,
        authorized_by: row.get(9)?,
        responsible: row.get(10)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{bogota_offset, FixedClock};
    use crate::config::LedgerConfig;
    use crate::expense::{normalize_expense, ExpenseSubmission};
    use crate::income::{normalize_income, IncomeSubmission};
    use chrono::TimeZone;

    fn clock_at(day: u32, hour: u32) -> FixedClock {
        FixedClock(
            bogota_offset()
                .with_ymd_and_hms(2026, 3, day, hour, 0, 0)
                .unwrap(),
        )
    }

    fn sample_income(clock: &FixedClock) -> IncomeRecord {
        let sub = IncomeSubmission {
            amount: "250.000".to_string(),
            semester: "126".to_string(),
            account: "NEQUI".to_string(),
            detail: "NEQUI".to_string(),
            processor_method: None,
            include_line_user: false,
            line: None,
            user: None,
        };
        normalize_income(&sub, &LedgerConfig::with_defaults(), clock).unwrap()
    }

    fn sample_expense(clock: &FixedClock, category: &str, account: &str) -> ExpenseRecord {
        let sub = ExpenseSubmission {
            amount: "100.000".to_string(),
            account: account.to_string(),
            method: "TRANSFER".to_string(),
            semester: "126".to_string(),
            category: category.to_string(),
            month: None,
            vehicle_name: None,
            vehicle_motive: None,
            reason: Some("SOMETHING".to_string()),
            authorized_by: "LAURA P".to_string(),
            responsible: "CARLOS M".to_string(),
        };
        normalize_expense(&sub, &LedgerConfig::with_defaults(), clock).unwrap()
    }

    #[test]
    fn test_income_round_trip() {
        let db = SqliteLedger::open_in_memory().unwrap();
        let record = sample_income(&clock_at(10, 9));

        db.insert_income(&record).unwrap();
        let listed = db.list_incomes().unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, record.id);
        assert_eq!(listed[0].date, record.date);
        assert_eq!(listed[0].amount, record.amount);
        assert_eq!(listed[0].line, "PENDING");
    }

    #[test]
    fn test_listings_are_newest_first() {
        let db = SqliteLedger::open_in_memory().unwrap();
        let older = sample_income(&clock_at(10, 9));
        let newer = sample_income(&clock_at(11, 9));

        db.insert_income(&older).unwrap();
        db.insert_income(&newer).unwrap();

        let listed = db.list_incomes().unwrap();
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }

    #[test]
    fn test_same_timestamp_falls_back_to_insertion_order() {
        let db = SqliteLedger::open_in_memory().unwrap();
        let clock = clock_at(10, 9);
        let first = sample_income(&clock);
        let second = sample_income(&clock);

        db.insert_income(&first).unwrap();
        db.insert_income(&second).unwrap();

        let listed = db.list_incomes().unwrap();
        assert_eq!(listed[0].id, second.id);
    }

    #[test]
    fn test_expense_round_trip_keeps_both_amounts() {
        let db = SqliteLedger::open_in_memory().unwrap();
        let record = sample_expense(&clock_at(10, 9), "OTHER", "DAVIVIENDA");

        db.insert_expense(&record).unwrap();
        let listed = db.list_expenses().unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].amount.format(), "100000,00");
        assert_eq!(listed[0].real_amount.format(), "100400,00");
        assert_eq!(listed[0].reason, "SOMETHING");
    }

    #[test]
    fn test_income_summary_groups_by_semester() {
        let db = SqliteLedger::open_in_memory().unwrap();
        db.insert_income(&sample_income(&clock_at(10, 9))).unwrap();
        db.insert_income(&sample_income(&clock_at(10, 10))).unwrap();

        let summary = db.income_summary().unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].semester, "126");
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].total.format(), "500000,00");
    }

    #[test]
    fn test_expense_summary_totals_both_amounts() {
        let db = SqliteLedger::open_in_memory().unwrap();
        let clock = clock_at(10, 9);
        db.insert_expense(&sample_expense(&clock, "OTHER", "DAVIVIENDA"))
            .unwrap();
        db.insert_expense(&sample_expense(&clock, "OTHER", "CASH"))
            .unwrap();
        db.insert_expense(&sample_expense(&clock, "SOFTWARE", "CASH"))
            .unwrap();

        let summary = db.expense_summary().unwrap();
        assert_eq!(summary.len(), 2);

        let other = summary.iter().find(|r| r.category == "OTHER").unwrap();
        assert_eq!(other.count, 2);
        assert_eq!(other.total.format(), "200000,00");
        // One levy-bearing account plus one exempt account.
        assert_eq!(other.total_real.format(), "200400,00");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let db = SqliteLedger::open_in_memory().unwrap();
        let record = sample_income(&clock_at(10, 9));

        db.insert_income(&record).unwrap();
        assert!(db.insert_income(&record).is_err());
    }
}
