use chrono::NaiveDate;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::availability::{day_status, free_slots, is_date_blocked, is_slot_booked};
use super::{Engine, EngineError};

impl Engine {
    /// Catalog snapshot, in display order.
    pub fn list_halls(&self) -> &[Hall] {
        self.catalog().halls()
    }

    /// Unknown halls are never blocked.
    pub async fn is_date_blocked(&self, hall_id: &str, date: NaiveDate) -> bool {
        match self.get_hall(hall_id) {
            Some(ledger) => is_date_blocked(&*ledger.read().await, date),
            None => false,
        }
    }

    /// Unknown halls have no bookings.
    pub async fn is_slot_booked(&self, hall_id: &str, date: NaiveDate, slot: TimeSlot) -> bool {
        match self.get_hall(hall_id) {
            Some(ledger) => is_slot_booked(&*ledger.read().await, date, slot),
            None => false,
        }
    }

    pub async fn available_slots(&self, hall_id: &str, date: NaiveDate) -> Result<Vec<TimeSlot>, EngineError> {
        let ledger = self.require_hall(hall_id)?;
        let guard = ledger.read().await;
        Ok(free_slots(&guard, date))
    }

    pub async fn day_status(&self, hall_id: &str, date: NaiveDate) -> Result<DayStatus, EngineError> {
        let ledger = self.require_hall(hall_id)?;
        let guard = ledger.read().await;
        Ok(day_status(&guard, date, self.clock.today()))
    }

    /// Day states for `from..=to`, for rendering a calendar month.
    pub async fn calendar(
        &self,
        hall_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DayStatus>, EngineError> {
        if to < from {
            return Err(EngineError::Validation("calendar range ends before it starts"));
        }
        if (to - from).num_days() >= MAX_CALENDAR_DAYS {
            return Err(EngineError::LimitExceeded("calendar range too wide"));
        }
        let ledger = self.require_hall(hall_id)?;
        let guard = ledger.read().await;
        let today = self.clock.today();
        Ok(from
            .iter_days()
            .take_while(|d| *d <= to)
            .map(|d| day_status(&guard, d, today))
            .collect())
    }

    pub async fn get_booking(&self, id: Ulid) -> Option<Booking> {
        let hall_id = self.get_hall_for_booking(&id)?;
        let ledger = self.get_hall(&hall_id)?;
        let guard = ledger.read().await;
        guard.booking(id).cloned()
    }

    /// A user's bookings, newest first.
    pub async fn bookings_for_user(&self, user_id: &str) -> Vec<Booking> {
        let mut out = self.collect_bookings(|b| b.user_id == user_id).await;
        sort_newest_first(&mut out);
        out
    }

    /// Every booking across halls, newest first.
    pub async fn all_bookings(&self) -> Vec<Booking> {
        let mut out = self.collect_bookings(|_| true).await;
        sort_newest_first(&mut out);
        out
    }

    /// The review queue, oldest request first.
    pub async fn pending_bookings(&self) -> Vec<Booking> {
        let mut out = self
            .collect_bookings(|b| b.status == BookingStatus::Pending)
            .await;
        out.sort_by_key(|b| (b.created_at, b.id));
        out
    }

    /// Status counts, across all users or for one.
    pub async fn booking_stats(&self, user_id: Option<&str>) -> BookingStats {
        let mut stats = BookingStats::default();
        for ledger in self.ledgers() {
            let guard = ledger.read().await;
            for booking in &guard.bookings {
                if user_id.is_none_or(|u| booking.user_id == u) {
                    stats.count(booking.status);
                }
            }
        }
        stats
    }

    pub async fn blocked_dates(&self, hall_id: &str) -> Result<Vec<BlockedDate>, EngineError> {
        let ledger = self.require_hall(hall_id)?;
        let guard = ledger.read().await;
        Ok(guard.blocked.clone())
    }

    async fn collect_bookings(&self, keep: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let mut out = Vec::new();
        for ledger in self.ledgers() {
            let guard = ledger.read().await;
            out.extend(guard.bookings.iter().filter(|b| keep(b)).cloned());
        }
        out
    }
}

fn sort_newest_first(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
