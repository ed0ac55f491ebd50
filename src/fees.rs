// Fee Calculator - processor net amounts and the 4x1000 transfer tax
// Every intermediate is rounded half-up to cents before the next step. That
// matches the legacy ledger output; do not collapse the chain into a single
// closed-form expression.

use crate::config::{Account, LedgerConfig};
use crate::error::LedgerError;
use crate::money::Money;
use serde::{Deserialize, Serialize};

// ============================================================================
// PROCESSOR SUBMETHOD
// ============================================================================

/// Payment-processor submethod for externally-processed incomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessorMethod {
    /// Bank-debit rail.
    Pse,
    /// Credit card (carries an extra 1.5% fee).
    Tc,
}

impl ProcessorMethod {
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        match raw {
            "PSE" => Ok(ProcessorMethod::Pse),
            "TC" => Ok(ProcessorMethod::Tc),
            other => Err(LedgerError::invalid_choice(
                "processor_method",
                format!("processor method must be PSE or TC, got: {other}"),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorMethod::Pse => "PSE",
            ProcessorMethod::Tc => "TC",
        }
    }
}

// ============================================================================
// FEE RULES
// ============================================================================

/// Net amount after the processor's fee schedule.
///
/// base_fee = round2(gross * 2.65% + 700), vat = round2(base_fee * 19%),
/// discount = base_fee + vat (+ round2(gross * 1.5%) for TC),
/// net = gross - discount.
pub fn processor_net(gross: Money, method: ProcessorMethod) -> Money {
    let base_fee = gross.mul_rate(265, 10_000) + Money::from_major(700);
    let vat = base_fee.mul_rate(19, 100);
    let mut discount = base_fee + vat;
    if method == ProcessorMethod::Tc {
        discount = discount + gross.mul_rate(15, 1_000);
    }
    gross - discount
}

/// Tax-adjusted "real" amount for an outgoing movement.
///
/// Cash-equivalent accounts are exempt; every other account carries the fixed
/// 0.4% levy (4x1000): real = round2(gross * 1.004).
pub fn real_amount(gross: Money, account: &Account, config: &LedgerConfig) -> Money {
    if config.is_cash_account(account) {
        gross
    } else {
        gross.mul_rate(1_004, 1_000)
    }
}

// ============================================================================
// TESTS
// ============================================================================
