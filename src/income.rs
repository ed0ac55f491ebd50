// Income Normalizer
// Turns a raw income submission into a validated, fee-adjusted ledger entry
// or a structured rejection. State-free: one submission in, one record out.

use crate::clock::Clock;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::fees::{processor_net, ProcessorMethod};
use crate::money::Money;
use crate::text::{fold_accents, normalize_opt, normalize_tag};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Detail tag that routes an income through the interest override.
pub const INTEREST_DETAIL: &str = "INTEREST_PAYMENT";
/// Semester/line forced by the interest override.
pub const GENERAL: &str = "GENERAL";
/// User forced by the interest override.
pub const INTEREST_USER: &str = "INTERESES";
/// Sentinel for line/user left for later assignment.
pub const PENDING: &str = "PENDING";

// ============================================================================
// SUBMISSION AND RECORD
// ============================================================================

/// Raw income fields exactly as the caller submitted them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeSubmission {
    pub amount: String,
    pub semester: String,
    pub account: String,
    pub detail: String,
    #[serde(default)]
    pub processor_method: Option<String>,
    #[serde(default)]
    pub include_line_user: bool,
    #[serde(default)]
    pub line: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

/// A normalized income entry. Immutable once created; the repository owns it
/// after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub id: String,
    pub date: DateTime<FixedOffset>,
    /// Net amount credited (after processor fees where applicable).
    pub amount: Money,
    pub semester: String,
    pub account: String,
    pub method: String,
    pub line: String,
    pub user: String,
    pub extra: String,
}

// ============================================================================
// NORMALIZATION PIPELINE
// ============================================================================

/// Validate and canonicalize one income submission.
///
/// Order matters: the amount is parsed before any field-requirement check, so
/// a malformed amount is always the reported rejection.
pub fn normalize_income(
    sub: &IncomeSubmission,
    config: &LedgerConfig,
    clock: &dyn Clock,
) -> Result<IncomeRecord, LedgerError> {
    let semester_raw = normalize_tag(&sub.semester);
    let account_raw = normalize_tag(&sub.account);
    let detail = normalize_tag(&sub.detail);

    let gross = Money::parse(&sub.amount)?;

    let account = config.account(&account_raw)?;

    // Interest payments are booked against the fixed GENERAL bucket no matter
    // what was submitted; everything else validates semester and line/user.
    let (semester, line, user) = if fold_accents(&detail) == INTEREST_DETAIL {
        (
            GENERAL.to_string(),
            GENERAL.to_string(),
            INTEREST_USER.to_string(),
        )
    } else {
        let semester = config.semester(&semester_raw)?.into_inner();
        let (line, user) = if sub.include_line_user {
            let line = normalize_opt(sub.line.as_deref()).ok_or_else(|| {
                LedgerError::missing_field("line", "LINE is required when line/user is included")
            })?;
            let user = normalize_opt(sub.user.as_deref()).ok_or_else(|| {
                LedgerError::missing_field("user", "USER is required when line/user is included")
            })?;
            (line, user)
        } else {
            (PENDING.to_string(), PENDING.to_string())
        };
        (semester, line, user)
    };

    let (amount, method) = if config.is_processor_route(&account, &detail) {
        let raw = normalize_opt(sub.processor_method.as_deref()).ok_or_else(|| {
            LedgerError::missing_field(
                "processor_method",
                "processor method (PSE or TC) is required for this route",
            )
        })?;
        let submethod = ProcessorMethod::parse(&raw)?;
        (processor_net(gross, submethod), config.processor_detail.clone())
    } else {
        (gross, detail)
    };

    Ok(IncomeRecord {
        id: uuid::Uuid::new_v4().to_string(),
        date: clock.now(),
        amount,
        semester,
        account: account.into_inner(),
        method,
        line,
        user,
        extra: "-".to_string(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
