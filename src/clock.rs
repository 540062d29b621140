use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};

/// Source of "now" for the engine: the earliest bookable date and the
/// `created_at` stamp on new bookings.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and demos.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Midnight UTC on `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::at_date("2025-12-01".parse().unwrap());
        assert_eq!(clock.today(), "2025-12-01".parse::<NaiveDate>().unwrap());
        clock.advance(chrono::Duration::hours(25));
        assert_eq!(clock.today(), "2025-12-02".parse::<NaiveDate>().unwrap());
    }

    #[test]
    fn fixed_clock_set() {
        let clock = FixedClock::at_date("2025-12-01".parse().unwrap());
        let later = "2026-01-15T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
