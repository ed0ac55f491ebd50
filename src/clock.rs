// Organizational time source
// Records are stamped in America/Bogota (UTC-5, no DST) at second precision.

use chrono::{DateTime, FixedOffset, Timelike, Utc};

/// The organization books everything in Bogota time.
pub fn bogota_offset() -> FixedOffset {
    FixedOffset::west_opt(5 * 3600).unwrap()
}

/// Wall-clock seam so normalizers stay deterministic under test.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// System wall clock in the organizational timezone, truncated to seconds.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Utc::now().with_timezone(&bogota_offset());
        now.with_nanosecond(0).unwrap_or(now)
    }
}

/// Fixed clock for tests.
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Display/export timestamp format: `31/12/2025 18:45:00`.
pub fn format_timestamp(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%d/%m/%Y %H:%M:%S").to_string()
}

// ============================================================================
// TESTS
// ============================================================================
