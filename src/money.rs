// Money Parser/Formatter - exact COP amounts
// All monetary values in the system are integer cents; binary floating point
// never touches money. Rounding is round-half-up to 2 fraction digits and
// happens exactly once per derived value.

use crate::error::LedgerError;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};

// ============================================================================
// MONEY TYPE
// ============================================================================

/// A COP amount in integer cents (2 fraction digits, fixed).
///
/// Stored amounts are produced by [`Money::parse`] or by the fee/tax rules in
/// [`crate::fees`]; both round half-up at the cent boundary, so every value
/// this type holds already has exactly 2 fraction digits by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Amount from raw integer cents.
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Amount from whole pesos.
    pub const fn from_major(pesos: i64) -> Self {
        Money(pesos * 100)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Multiply by the rate `num / den`, rounding half-up to cents.
    ///
    /// This is the single rounding point for all derived amounts; callers
    /// chain it step by step (never as one closed-form expression) to
    /// reproduce the legacy ledger output exactly.
    pub fn mul_rate(self, num: i64, den: i64) -> Money {
        debug_assert!(den > 0);
        let scaled = self.0 as i128 * num as i128;
        let den = den as i128;
        let half = den / 2;
        let rounded = if scaled >= 0 {
            (scaled + half) / den
        } else {
            -((-scaled + half) / den)
        };
        Money(rounded as i64)
    }

    /// Parse locale-formatted amount text into a positive amount.
    ///
    /// Accepts a comma as the fractional separator, strips every other
    /// non-digit character (thousands dots, currency signs, spaces), and
    /// rounds half-up to 2 fraction digits. Rejects empty input, more than
    /// one separator, and non-positive values.
    pub fn parse(text: &str) -> Result<Money, LedgerError> {
        let cents = parse_cents(text)?;
        if cents <= 0 {
            return Err(LedgerError::invalid_amount("amount must be positive"));
        }
        Ok(Money(cents))
    }

    /// Like [`Money::parse`] but admits zero (transfer costs may be zero,
    /// which simply means no cost record is produced).
    pub fn parse_non_negative(text: &str) -> Result<Money, LedgerError> {
        parse_cents(text).map(Money)
    }

    /// Parse the organizational display form (optionally signed). Inverse of
    /// [`Money::format`]; used when records round-trip through JSON/CSV.
    pub fn from_display(text: &str) -> Result<Money, LedgerError> {
        let trimmed = text.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed),
        };
        let cents = parse_cents(rest)?;
        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Render with exactly 2 fraction digits and a comma separator, the
    /// organizational display convention: `Money(123450) -> "1234,50"`.
    pub fn format(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{},{:02}", sign, abs / 100, abs % 100)
    }
}

/// Clean and parse amount text to cents, rounding half-up to 2 digits.
fn parse_cents(text: &str) -> Result<i64, LedgerError> {
    let clean: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();

    if clean.is_empty() {
        return Err(LedgerError::invalid_amount("amount is empty"));
    }
    if clean.matches(',').count() > 1 {
        return Err(LedgerError::invalid_amount(
            "amount has more than one decimal separator",
        ));
    }

    let (major_str, frac_str) = match clean.split_once(',') {
        Some((major, frac)) => (major, frac),
        None => (clean.as_str(), ""),
    };
    if major_str.is_empty() && frac_str.is_empty() {
        return Err(LedgerError::invalid_amount("amount has no digits"));
    }

    let major: i128 = if major_str.is_empty() {
        0
    } else {
        major_str
            .parse()
            .map_err(|_| LedgerError::invalid_amount("amount too large"))?
    };

    // Round half-up on the third fraction digit; digits past it cannot move
    // the value across the half boundary.
    let mut frac = frac_str.bytes();
    let d1 = frac.next().map_or(0, |b| (b - b'0') as i128);
    let d2 = frac.next().map_or(0, |b| (b - b'0') as i128);
    let round_up = frac.next().is_some_and(|b| b >= b'5');

    let cents = major * 100 + d1 * 10 + d2 + i128::from(round_up);
    i64::try_from(cents).map_err(|_| LedgerError::invalid_amount("amount too large"))
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

// Records carry amounts as the organizational display string in JSON and CSV
// ("952632,00"), matching what the tables and exports have always shown.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Money::from_display(&text).map_err(D::Error::custom)
    }
}

// ============================================================================
// TESTS
// ============================================================================
