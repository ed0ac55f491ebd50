// Expense Normalizer
// Validates a raw expense submission against the category rule table,
// synthesizes the reason code, and applies the 4x1000 tax adjustment.

use crate::clock::Clock;
use crate::config::{LedgerConfig, ReasonTemplate};
use crate::error::LedgerError;
use crate::fees::real_amount;
use crate::money::Money;
use crate::text::{normalize_opt, normalize_tag};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ============================================================================
// SUBMISSION AND RECORD
// ============================================================================

/// Raw expense fields exactly as the caller submitted them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseSubmission {
    pub amount: String,
    pub account: String,
    pub method: String,
    pub semester: String,
    pub category: String,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub vehicle_name: Option<String>,
    #[serde(default)]
    pub vehicle_motive: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    pub authorized_by: String,
    pub responsible: String,
}

/// A normalized expense entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: String,
    pub date: DateTime<FixedOffset>,
    pub account: String,
    pub method: String,
    /// Amount as submitted.
    pub amount: Money,
    /// Amount plus the 4x1000 levy for non-cash accounts.
    pub real_amount: Money,
    pub semester: String,
    pub category: String,
    /// Synthesized reason code, never empty (`-` when nothing applies).
    pub reason: String,
    pub authorized_by: String,
    pub responsible: String,
}

// ============================================================================
// NORMALIZATION PIPELINE
// ============================================================================

/// Validate and canonicalize one expense submission.
///
/// Same ordering contract as incomes: the amount parses first, then the
/// closed sets, then the category-specific requirements.
pub fn normalize_expense(
    sub: &ExpenseSubmission,
    config: &LedgerConfig,
    clock: &dyn Clock,
) -> Result<ExpenseRecord, LedgerError> {
    let account_raw = normalize_tag(&sub.account);
    let method = normalize_tag(&sub.method);
    let semester_raw = normalize_tag(&sub.semester);
    let category_raw = normalize_tag(&sub.category);
    let month = normalize_opt(sub.month.as_deref());
    let vehicle_name_raw = normalize_opt(sub.vehicle_name.as_deref());
    let vehicle_motive_raw = normalize_opt(sub.vehicle_motive.as_deref());
    let reason_raw = normalize_opt(sub.reason.as_deref());
    let authorized_by = normalize_tag(&sub.authorized_by);
    let responsible = normalize_tag(&sub.responsible);

    let amount = Money::parse(&sub.amount)?;

    let account = config.account(&account_raw)?;
    let semester = config.semester(&semester_raw)?;
    let category = config.category(&category_raw)?;

    if method.is_empty() {
        return Err(LedgerError::missing_field("method", "METHOD is required"));
    }
    if authorized_by.is_empty() {
        return Err(LedgerError::missing_field(
            "authorized_by",
            "AUTHORIZED BY is required",
        ));
    }
    if responsible.is_empty() {
        return Err(LedgerError::missing_field(
            "responsible",
            "RESPONSIBLE is required",
        ));
    }

    let rule = config.category_rule(&category);

    if rule.requires_month && month.is_none() {
        return Err(LedgerError::missing_field(
            "month",
            format!("MONTH is required for category {category}"),
        ));
    }

    let vehicle = if rule.requires_vehicle {
        let name = vehicle_name_raw.ok_or_else(|| {
            LedgerError::missing_field("vehicle_name", "VEHICLE is required for this category")
        })?;
        let motive = vehicle_motive_raw.ok_or_else(|| {
            LedgerError::missing_field(
                "vehicle_motive",
                "VEHICLE MOTIVE is required for this category",
            )
        })?;
        Some((config.vehicle_name(&name)?, config.vehicle_motive(&motive)?))
    } else {
        None
    };

    if rule.requires_reason && reason_raw.is_none() {
        return Err(LedgerError::missing_field(
            "reason",
            format!("REASON is required for category {category}"),
        ));
    }

    let reason = match (&rule.template, &vehicle) {
        (ReasonTemplate::SocialSecurity, _) => {
            // month presence is enforced above for this category
            format!("SS_{}_2026", month.as_deref().unwrap_or("-"))
        }
        (ReasonTemplate::Vehicle, Some((name, motive))) => {
            format!(
                "{}_{}_{}",
                name,
                motive,
                reason_raw.as_deref().unwrap_or("-")
            )
        }
        (ReasonTemplate::Vehicle, None) => {
            return Err(LedgerError::missing_field(
                "vehicle_name",
                "VEHICLE is required for this category",
            ));
        }
        (ReasonTemplate::Literal(text), _) => text.clone(),
        (ReasonTemplate::MonthSuffix, _) => format!(
            "{}_{}",
            reason_raw.as_deref().unwrap_or("-"),
            month.as_deref().unwrap_or("-")
        ),
        (ReasonTemplate::Verbatim, _) => reason_raw.unwrap_or_else(|| "-".to_string()),
    };

    let real = real_amount(amount, &account, config);

    Ok(ExpenseRecord {
        id: uuid::Uuid::new_v4().to_string(),
        date: clock.now(),
        account: account.into_inner(),
        method,
        amount,
        real_amount: real,
        semester: semester.into_inner(),
        category: category.into_inner(),
        reason,
        authorized_by,
        responsible,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{bogota_offset, FixedClock};
    use chrono::TimeZone;

    fn test_clock() -> FixedClock {
        FixedClock(
            bogota_offset()
                .with_ymd_and_hms(2026, 3, 15, 10, 30, 0)
                .unwrap(),
        )
    }

    fn base_submission() -> ExpenseSubmission {
        ExpenseSubmission {
            amount: "100.000".to_string(),
            account: "DAVIVIENDA".to_string(),
            method: "TRANSFER".to_string(),
            semester: "126".to_string(),
            category: "OTHER".to_string(),
            month: None,
            vehicle_name: None,
            vehicle_motive: None,
            reason: None,
            authorized_by: "LAURA P".to_string(),
            responsible: "CARLOS M".to_string(),
        }
    }

    fn normalize(sub: &ExpenseSubmission) -> Result<ExpenseRecord, LedgerError> {
        normalize_expense(sub, &LedgerConfig::with_defaults(), &test_clock())
    }

    #[test]
    fn test_plain_expense_with_levy() {
        let record = normalize(&base_submission()).unwrap();

        assert_eq!(record.amount.format(), "100000,00");
        assert_eq!(record.real_amount.format(), "100400,00");
        assert_eq!(record.reason, "-");
        assert_eq!(record.authorized_by, "LAURA P");
        assert_eq!(record.responsible, "CARLOS M");
    }

    #[test]
    fn test_cash_account_exempt_from_levy() {
        let mut sub = base_submission();
        sub.account = "CASH".to_string();

        let record = normalize(&sub).unwrap();
        assert_eq!(record.real_amount, record.amount);
    }

    #[test]
    fn test_social_security_reason() {
        let mut sub = base_submission();
        sub.category = "SOCIAL_SECURITY".to_string();
        sub.month = Some(" march ".to_string());

        let record = normalize(&sub).unwrap();
        assert_eq!(record.reason, "SS_MARCH_2026");
    }

    #[test]
    fn test_social_security_requires_month() {
        let mut sub = base_submission();
        sub.category = "SOCIAL_SECURITY".to_string();
        sub.month = None;

        let err = normalize(&sub).unwrap_err();
        assert_eq!(err.kind(), "MissingField");
        assert_eq!(err.field(), Some("month"));
    }

    #[test]
    fn test_vehicle_reason_triple() {
        let mut sub = base_submission();
        sub.category = "VEHICLES".to_string();
        sub.vehicle_name = Some("versa".to_string());
        sub.vehicle_motive = Some("MAINTENANCE".to_string());
        sub.reason = Some("OIL CHANGE".to_string());

        let record = normalize(&sub).unwrap();
        assert_eq!(record.reason, "VERSA_MAINTENANCE_OIL CHANGE");
    }

    #[test]
    fn test_vehicle_fields_all_required() {
        let mut sub = base_submission();
        sub.category = "VEHICLES".to_string();

        let err = normalize(&sub).unwrap_err();
        assert_eq!(err.field(), Some("vehicle_name"));

        sub.vehicle_name = Some("MAZDA".to_string());
        let err = normalize(&sub).unwrap_err();
        assert_eq!(err.field(), Some("vehicle_motive"));

        sub.vehicle_motive = Some("SOAT".to_string());
        let err = normalize(&sub).unwrap_err();
        assert_eq!(err.field(), Some("reason"));
    }

    #[test]
    fn test_unknown_vehicle_rejected() {
        let mut sub = base_submission();
        sub.category = "VEHICLES".to_string();
        sub.vehicle_name = Some("DELOREAN".to_string());
        sub.vehicle_motive = Some("MAINTENANCE".to_string());
        sub.reason = Some("FLUX".to_string());

        let err = normalize(&sub).unwrap_err();
        assert_eq!(err.kind(), "InvalidChoice");
        assert_eq!(err.field(), Some("vehicle_name"));
    }

    #[test]
    fn test_severance_books_against_fixed_literal() {
        let mut sub = base_submission();
        sub.category = "SEVERANCE".to_string();
        sub.reason = Some("IGNORED".to_string());

        let record = normalize(&sub).unwrap();
        assert_eq!(record.reason, "2025");
    }

    #[test]
    fn test_month_scoped_category_appends_month() {
        let mut sub = base_submission();
        sub.category = "PAYROLL".to_string();
        sub.month = Some("APRIL".to_string());
        sub.reason = Some("DIANA GOMEZ".to_string());

        let record = normalize(&sub).unwrap();
        assert_eq!(record.reason, "DIANA GOMEZ_APRIL");
    }

    #[test]
    fn test_month_scoped_category_requires_reason() {
        let mut sub = base_submission();
        sub.category = "PAYROLL".to_string();
        sub.month = Some("APRIL".to_string());
        sub.reason = None;

        let err = normalize(&sub).unwrap_err();
        assert_eq!(err.field(), Some("reason"));
    }

    #[test]
    fn test_verbatim_reason_kept() {
        let mut sub = base_submission();
        sub.reason = Some("  notary fees  ".to_string());

        let record = normalize(&sub).unwrap();
        assert_eq!(record.reason, "NOTARY FEES");
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut sub = base_submission();
        sub.category = "GIFTS".to_string();

        let err = normalize(&sub).unwrap_err();
        assert_eq!(err.kind(), "InvalidChoice");
        assert_eq!(err.field(), Some("category"));
    }

    #[test]
    fn test_blank_authorized_by_rejected() {
        let mut sub = base_submission();
        sub.authorized_by = "   ".to_string();

        let err = normalize(&sub).unwrap_err();
        assert_eq!(err.field(), Some("authorized_by"));
    }

    #[test]
    fn test_amount_failure_reported_first() {
        let mut sub = base_submission();
        sub.amount = "zero".to_string();
        sub.category = "SOCIAL_SECURITY".to_string();
        sub.month = None;

        let err = normalize(&sub).unwrap_err();
        assert_eq!(err.kind(), "InvalidAmount");
    }
}
