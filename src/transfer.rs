// Internal Transfer Composer
// A transfer between two organizational accounts is booked as an income on
// the destination, plus an optional cost expense on the origin. Both records
// go through the same normalizers as manual submissions.

use crate::clock::Clock;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::expense::{normalize_expense, ExpenseRecord, ExpenseSubmission};
use crate::income::{normalize_income, IncomeRecord, IncomeSubmission, GENERAL};
use crate::money::Money;
use crate::text::{normalize_opt, normalize_tag};
use serde::{Deserialize, Serialize};

/// Method tag stamped on both sides of an internal transfer.
pub const TRANSFER_METHOD: &str = "INTERNAL_TRANSFER";
/// Authorized-by/responsible tag for synthesized cost expenses.
pub const AUTOMATIC: &str = "AUTOMATIC";

// ============================================================================
// SUBMISSION AND RECORDS
// ============================================================================

/// Raw transfer fields exactly as the caller submitted them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSubmission {
    pub amount: String,
    pub origin: String,
    pub destination: String,
    /// Optional bank cost of the movement. Blank or zero means no cost
    /// record is produced.
    #[serde(default)]
    pub cost: Option<String>,
}

/// The one or two records an accepted transfer produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecords {
    pub income: IncomeRecord,
    pub expense: Option<ExpenseRecord>,
}

// ============================================================================
// COMPOSITION
// ============================================================================

/// Validate a transfer and compose its ledger records.
///
/// Nothing is persisted here; the caller inserts both records (or neither)
/// so a rejected cost never leaves a half-booked transfer behind.
pub fn normalize_transfer(
    sub: &TransferSubmission,
    config: &LedgerConfig,
    clock: &dyn Clock,
) -> Result<TransferRecords, LedgerError> {
    let origin_raw = normalize_tag(&sub.origin);
    let destination_raw = normalize_tag(&sub.destination);

    Money::parse(&sub.amount)?;

    let origin = config.account(&origin_raw)?;
    let destination = config.account(&destination_raw)?;
    if origin == destination {
        return Err(LedgerError::invalid_choice(
            "destination",
            "origin and destination accounts must differ",
        ));
    }

    let cost = match normalize_opt(sub.cost.as_deref()) {
        Some(text) => {
            let cost = Money::parse_non_negative(&text)?;
            cost.is_positive().then_some(cost)
        }
        None => None,
    };

    let mut income = normalize_income(
        &IncomeSubmission {
            amount: sub.amount.clone(),
            semester: GENERAL.to_string(),
            account: destination.as_str().to_string(),
            detail: TRANSFER_METHOD.to_string(),
            processor_method: None,
            include_line_user: false,
            line: None,
            user: None,
        },
        config,
        clock,
    )?;
    income.extra = format!("FROM_{origin}");

    let expense = match cost {
        Some(cost) => Some(normalize_expense(
            &ExpenseSubmission {
                amount: cost.format(),
                account: origin.as_str().to_string(),
                method: TRANSFER_METHOD.to_string(),
                semester: GENERAL.to_string(),
                category: config.transfer_category.clone(),
                month: None,
                vehicle_name: None,
                vehicle_motive: None,
                reason: Some(format!("TRANSFER_FEE_{origin}_TO_{destination}")),
                authorized_by: AUTOMATIC.to_string(),
                responsible: AUTOMATIC.to_string(),
            },
            config,
            clock,
        )?),
        None => None,
    };

    Ok(TransferRecords { income, expense })
}

// ============================================================================
// TESTS
// ============================================================================
