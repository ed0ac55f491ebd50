// Configured enumerations - the sets the core validates against
// Accounts, periods, categories, and the category-specific requirements are
// configuration data, not hardcoded business logic: the normalizers only see
// values that already passed through this module.

use crate::error::LedgerError;
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

// ============================================================================
// VALIDATED TAGS
// ============================================================================

/// An account name validated against the configured set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account(String);

/// A fiscal-period tag validated against the configured set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Semester(String);

/// An expense category validated against the configured set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category(String);

macro_rules! tag_impl {
    ($name:ident) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

tag_impl!(Account);
tag_impl!(Semester);
tag_impl!(Category);

// ============================================================================
// CATEGORY RULES
// ============================================================================

/// How a category's reason code is synthesized. Exactly one template applies
/// per category, resolved in a fixed priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasonTemplate {
    /// `SS_{month}_2026` (the year is a deliberate literal, see DESIGN.md).
    SocialSecurity,
    /// `{vehicle_name}_{vehicle_motive}_{reason}`.
    Vehicle,
    /// A fixed literal (severance books against `2025`).
    Literal(String),
    /// `{reason}_{month}` for the remaining month-scoped categories.
    MonthSuffix,
    /// The free-text reason verbatim, or `-` when absent.
    Verbatim,
}

/// Required fields and reason template for one category, looked up once per
/// submission instead of re-deriving it across branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub requires_month: bool,
    pub requires_reason: bool,
    pub requires_vehicle: bool,
    pub template: ReasonTemplate,
}

// ============================================================================
// LEDGER CONFIG
// ============================================================================

/// Every fixed enumeration the core depends on, loadable from JSON.
///
/// A config file may override any subset of fields; omitted fields keep the
/// production defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub accounts: Vec<String>,
    pub semesters: Vec<String>,
    pub categories: Vec<String>,
    /// Categories for which the month field is mandatory.
    pub month_categories: Vec<String>,
    /// Categories for which the free-text reason is mandatory.
    pub reason_categories: Vec<String>,
    pub vehicle_names: Vec<String>,
    pub vehicle_motives: Vec<String>,
    /// Accounts exempt from the 4x1000 transfer tax.
    pub cash_accounts: Vec<String>,
    /// Account-name prefix of the externally-processed payment family.
    pub processor_account_prefix: String,
    /// Detail tag that routes an income through the payment processor.
    pub processor_detail: String,
    pub social_security_category: String,
    pub vehicles_category: String,
    pub severance_category: String,
    /// Category forced onto synthesized internal-transfer cost expenses.
    pub transfer_category: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl LedgerConfig {
    /// Production master data.
    pub fn with_defaults() -> Self {
        LedgerConfig {
            accounts: strings(&[
                "BANCOLOMBIA_1423",
                "BANCOLOMBIA_2807",
                "DAVIVIENDA",
                "NEQUI",
                "CASH",
                "CASH_WIRE_SERVICE",
            ]),
            semesters: strings(&["126", "226", "326", "426", "526", "GENERAL"]),
            categories: strings(&[
                "REFUND",
                "ADVANCE",
                "VEHICLES",
                "DATABASE",
                "RENT_APARTMENTS",
                "GROCERIES",
                "PAYROLL",
                "SOFTWARE",
                "PER_DIEM",
                "TAXES",
                "SOCIAL_SECURITY",
                "BONUSES",
                "SEVERANCE",
                "TRANSFERS",
                "OTHER",
            ]),
            month_categories: strings(&[
                "ADVANCE",
                "RENT_APARTMENTS",
                "GROCERIES",
                "PAYROLL",
                "PER_DIEM",
                "TAXES",
                "SOCIAL_SECURITY",
                "BONUSES",
            ]),
            reason_categories: strings(&[
                "ADVANCE",
                "PAYROLL",
                "PER_DIEM",
                "BONUSES",
                "DATABASE",
                "RENT_APARTMENTS",
                "GROCERIES",
                "SOFTWARE",
                "TAXES",
                "REFUND",
            ]),
            vehicle_names: strings(&["VERSA", "MAZDA", "QASHQAI"]),
            vehicle_motives: strings(&[
                "MAINTENANCE",
                "SOAT",
                "TAXES",
                "FULL_COVERAGE",
                "ROADWORTHINESS",
            ]),
            cash_accounts: strings(&["CASH", "CASH_WIRE_SERVICE"]),
            processor_account_prefix: "BANCOLOMBIA_".to_string(),
            processor_detail: "WOMPI".to_string(),
            social_security_category: "SOCIAL_SECURITY".to_string(),
            vehicles_category: "VEHICLES".to_string(),
            severance_category: "SEVERANCE".to_string(),
            transfer_category: "TRANSFERS".to_string(),
        }
    }

    /// Load configuration overrides from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    // ========================================================================
    // Validated lookups (inputs are already trimmed/uppercased)
    // ========================================================================

    pub fn account(&self, raw: &str) -> Result<Account, LedgerError> {
        if self.accounts.iter().any(|a| a == raw) {
            Ok(Account(raw.to_string()))
        } else {
            Err(LedgerError::invalid_account_or_period(
                "account",
                format!("unknown account: {raw}"),
            ))
        }
    }

    pub fn semester(&self, raw: &str) -> Result<Semester, LedgerError> {
        if self.semesters.iter().any(|s| s == raw) {
            Ok(Semester(raw.to_string()))
        } else {
            Err(LedgerError::invalid_account_or_period(
                "semester",
                format!("unknown semester: {raw}"),
            ))
        }
    }

    pub fn category(&self, raw: &str) -> Result<Category, LedgerError> {
        if self.categories.iter().any(|c| c == raw) {
            Ok(Category(raw.to_string()))
        } else {
            Err(LedgerError::invalid_choice(
                "category",
                format!("unknown category: {raw}"),
            ))
        }
    }

    pub fn vehicle_name(&self, raw: &str) -> Result<String, LedgerError> {
        if self.vehicle_names.iter().any(|v| v == raw) {
            Ok(raw.to_string())
        } else {
            Err(LedgerError::invalid_choice(
                "vehicle_name",
                format!("unknown vehicle name: {raw}"),
            ))
        }
    }

    pub fn vehicle_motive(&self, raw: &str) -> Result<String, LedgerError> {
        if self.vehicle_motives.iter().any(|v| v == raw) {
            Ok(raw.to_string())
        } else {
            Err(LedgerError::invalid_choice(
                "vehicle_motive",
                format!("unknown vehicle motive: {raw}"),
            ))
        }
    }

    /// Whether an account is cash-equivalent (exempt from the 4x1000 tax).
    pub fn is_cash_account(&self, account: &Account) -> bool {
        self.cash_accounts.iter().any(|a| a == account.as_str())
    }

    /// Whether this account/detail combination routes through the external
    /// payment processor (and therefore through the fee calculator).
    pub fn is_processor_route(&self, account: &Account, detail: &str) -> bool {
        account.as_str().starts_with(&self.processor_account_prefix)
            && detail == self.processor_detail
    }

    /// Required fields and reason template for one category.
    ///
    /// Template priority: social security, vehicles, severance, month-scoped,
    /// verbatim. Exactly one fires.
    pub fn category_rule(&self, category: &Category) -> CategoryRule {
        let name = category.as_str();
        let requires_month = self.month_categories.iter().any(|c| c == name);
        let requires_vehicle = name == self.vehicles_category;
        let requires_reason =
            requires_vehicle || self.reason_categories.iter().any(|c| c == name);

        let template = if name == self.social_security_category {
            ReasonTemplate::SocialSecurity
        } else if requires_vehicle {
            ReasonTemplate::Vehicle
        } else if name == self.severance_category {
            ReasonTemplate::Literal("2025".to_string())
        } else if requires_month {
            ReasonTemplate::MonthSuffix
        } else {
            ReasonTemplate::Verbatim
        };

        CategoryRule {
            requires_month,
            requires_reason,
            requires_vehicle,
            template,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sets_are_consistent() {
        let config = LedgerConfig::with_defaults();

        // Every month/reason category is a known category.
        for cat in config
            .month_categories
            .iter()
            .chain(config.reason_categories.iter())
        {
            assert!(config.categories.contains(cat), "unknown category: {cat}");
        }
        // Cash accounts are real accounts.
        for acct in &config.cash_accounts {
            assert!(config.accounts.contains(acct));
        }
        assert!(config.categories.contains(&config.transfer_category));
    }

    #[test]
    fn test_account_validation() {
        let config = LedgerConfig::with_defaults();

        assert!(config.account("NEQUI").is_ok());
        let err = config.account("BANK_OF_NOWHERE").unwrap_err();
        assert_eq!(err.kind(), "InvalidAccountOrPeriod");
        assert_eq!(err.field(), Some("account"));
    }

    #[test]
    fn test_semester_validation() {
        let config = LedgerConfig::with_defaults();

        assert!(config.semester("126").is_ok());
        assert!(config.semester("GENERAL").is_ok());
        assert_eq!(
            config.semester("999").unwrap_err().kind(),
            "InvalidAccountOrPeriod"
        );
    }

    #[test]
    fn test_category_validation() {
        let config = LedgerConfig::with_defaults();

        assert!(config.category("GROCERIES").is_ok());
        assert_eq!(
            config.category("NO_SUCH_CATEGORY").unwrap_err().kind(),
            "InvalidChoice"
        );
    }

    #[test]
    fn test_processor_route_detection() {
        let config = LedgerConfig::with_defaults();

        let bancolombia = config.account("BANCOLOMBIA_1423").unwrap();
        let nequi = config.account("NEQUI").unwrap();

        assert!(config.is_processor_route(&bancolombia, "WOMPI"));
        assert!(!config.is_processor_route(&bancolombia, "TRANSFER"));
        assert!(!config.is_processor_route(&nequi, "WOMPI"));
    }

    #[test]
    fn test_cash_accounts() {
        let config = LedgerConfig::with_defaults();

        let cash = config.account("CASH").unwrap();
        let wire = config.account("CASH_WIRE_SERVICE").unwrap();
        let bank = config.account("DAVIVIENDA").unwrap();

        assert!(config.is_cash_account(&cash));
        assert!(config.is_cash_account(&wire));
        assert!(!config.is_cash_account(&bank));
    }

    #[test]
    fn test_category_rule_table() {
        let config = LedgerConfig::with_defaults();

        let ss = config.category_rule(&config.category("SOCIAL_SECURITY").unwrap());
        assert!(ss.requires_month);
        assert_eq!(ss.template, ReasonTemplate::SocialSecurity);

        let vehicles = config.category_rule(&config.category("VEHICLES").unwrap());
        assert!(vehicles.requires_vehicle);
        assert!(vehicles.requires_reason);
        assert!(!vehicles.requires_month);
        assert_eq!(vehicles.template, ReasonTemplate::Vehicle);

        let severance = config.category_rule(&config.category("SEVERANCE").unwrap());
        assert_eq!(
            severance.template,
            ReasonTemplate::Literal("2025".to_string())
        );

        let groceries = config.category_rule(&config.category("GROCERIES").unwrap());
        assert!(groceries.requires_month);
        assert!(groceries.requires_reason);
        assert_eq!(groceries.template, ReasonTemplate::MonthSuffix);

        let other = config.category_rule(&config.category("OTHER").unwrap());
        assert!(!other.requires_month);
        assert!(!other.requires_reason);
        assert_eq!(other.template, ReasonTemplate::Verbatim);
    }

    #[test]
    fn test_partial_config_overrides_keep_defaults() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"accounts": ["CASH", "BANK_X"]}"#).unwrap();

        assert_eq!(config.accounts, vec!["CASH", "BANK_X"]);
        // Untouched fields fall back to production defaults.
        assert_eq!(config.processor_detail, "WOMPI");
        assert!(config.categories.contains(&"VEHICLES".to_string()));
    }
}
