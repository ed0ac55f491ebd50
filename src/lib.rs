// Finanzas TT - Core Library
// Deterministic bookkeeping for the organization's income/expense ledger.
// Exposes all modules for use in the CLI, API server, and tests.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod expense;
pub mod export;
pub mod fees;
pub mod income;
pub mod money;
pub mod text;
pub mod transfer;

// Re-export commonly used types
pub use clock::{format_timestamp, Clock, FixedClock, SystemClock};
pub use config::{Account, Category, CategoryRule, LedgerConfig, ReasonTemplate, Semester};
pub use db::{
    setup_database, ExpenseSummaryRow, IncomeSummaryRow, LedgerRepository, SqliteLedger,
};
pub use error::LedgerError;
pub use expense::{normalize_expense, ExpenseRecord, ExpenseSubmission};
pub use export::{
    export_expenses, export_incomes, EXPENSE_HEADERS, INCOME_HEADERS,
};
pub use fees::{processor_net, real_amount, ProcessorMethod};
pub use income::{normalize_income, IncomeRecord, IncomeSubmission};
pub use money::Money;
pub use transfer::{normalize_transfer, TransferRecords, TransferSubmission};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
