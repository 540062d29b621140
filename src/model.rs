use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// A bookable venue. Reference data, loaded once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hall {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

/// The fixed, ordered set of bookable intervals within a day.
///
/// Slot identity is the exact label. Labels that overlap on the wall clock
/// (`09:00 - 12:00` and `10:00 - 13:00`) are independent slots and can be
/// booked at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "09:00 - 12:00")]
    Morning,
    #[serde(rename = "10:00 - 13:00")]
    LateMorning,
    #[serde(rename = "14:00 - 17:00")]
    Afternoon,
    #[serde(rename = "15:00 - 18:00")]
    LateAfternoon,
    #[serde(rename = "18:00 - 21:00")]
    Evening,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 5] = [
        TimeSlot::Morning,
        TimeSlot::LateMorning,
        TimeSlot::Afternoon,
        TimeSlot::LateAfternoon,
        TimeSlot::Evening,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeSlot::Morning => "09:00 - 12:00",
            TimeSlot::LateMorning => "10:00 - 13:00",
            TimeSlot::Afternoon => "14:00 - 17:00",
            TimeSlot::LateAfternoon => "15:00 - 18:00",
            TimeSlot::Evening => "18:00 - 21:00",
        }
    }

    /// Exact label match, no whitespace normalisation.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.label() == label)
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
}

impl BookingStatus {
    /// Pending and approved bookings occupy their slot; rejected ones don't.
    pub fn is_effective(self) -> bool {
        !matches!(self, BookingStatus::Rejected)
    }
}

/// Outcome of an administrative review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn status(self) -> BookingStatus {
        match self {
            Decision::Approved => BookingStatus::Approved,
            Decision::Rejected => BookingStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub user_id: String,
    pub user_name: String,
    pub hall_id: String,
    /// Name of the hall when the request was filed.
    pub hall_name: String,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub purpose: String,
    pub attendees: u32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDate {
    pub id: Ulid,
    pub hall_id: String,
    pub date: NaiveDate,
    pub reason: String,
}

/// A booking candidate as collected by a presentation layer.
///
/// Fields stay optional/raw so that missing input surfaces as a validation
/// error from the workflow rather than a parse failure upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingRequest {
    pub user_id: String,
    pub user_name: String,
    pub hall_id: String,
    pub date: Option<NaiveDate>,
    pub time_slot: String,
    pub purpose: String,
    pub attendees: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockRequest {
    pub hall_id: String,
    pub date: Option<NaiveDate>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// The acting user, as asserted by the session collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub user_name: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Ledger changes, broadcast per hall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    BookingRequested(Booking),
    BookingReviewed {
        id: Ulid,
        hall_id: String,
        status: BookingStatus,
    },
    DateBlocked(BlockedDate),
}

impl LedgerEvent {
    pub fn hall_id(&self) -> &str {
        match self {
            LedgerEvent::BookingRequested(b) => &b.hall_id,
            LedgerEvent::BookingReviewed { hall_id, .. } => hall_id,
            LedgerEvent::DateBlocked(b) => &b.hall_id,
        }
    }
}

/// Per-hall ledger: bookings and blocks, each kept sorted by date.
#[derive(Debug, Clone)]
pub struct HallLedger {
    pub hall: Hall,
    /// Sorted by `date`; insertion order is preserved within a date.
    pub bookings: Vec<Booking>,
    /// Sorted by `date`; insertion order is preserved within a date.
    pub blocked: Vec<BlockedDate>,
}

impl HallLedger {
    pub fn new(hall: Hall) -> Self {
        Self {
            hall,
            bookings: Vec::new(),
            blocked: Vec::new(),
        }
    }

    pub fn record_booking(&mut self, booking: Booking) {
        let pos = self.bookings.partition_point(|b| b.date <= booking.date);
        self.bookings.insert(pos, booking);
    }

    pub fn add_blocked_date(&mut self, blocked: BlockedDate) {
        let pos = self.blocked.partition_point(|b| b.date <= blocked.date);
        self.blocked.insert(pos, blocked);
    }

    /// All bookings (any status) on `date`, via binary search.
    pub fn bookings_on(&self, date: NaiveDate) -> &[Booking] {
        let lo = self.bookings.partition_point(|b| b.date < date);
        let hi = self.bookings.partition_point(|b| b.date <= date);
        &self.bookings[lo..hi]
    }

    pub fn blocks_on(&self, date: NaiveDate) -> &[BlockedDate] {
        let lo = self.blocked.partition_point(|b| b.date < date);
        let hi = self.blocked.partition_point(|b| b.date <= date);
        &self.blocked[lo..hi]
    }

    pub fn booking(&self, id: Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn booking_mut(&mut self, id: Ulid) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    /// Overwrite a booking's status in place. No prior-state check, so
    /// re-applying a status or re-reviewing a decided booking both succeed.
    /// Returns false if the booking isn't in this ledger.
    pub fn set_status(&mut self, id: Ulid, status: BookingStatus) -> bool {
        match self.booking_mut(id) {
            Some(booking) => {
                booking.status = status;
                true
            }
            None => false,
        }
    }
}

// ── Query result types ───────────────────────────────────────────

/// Calendar-cell state for one hall and date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStatus {
    pub date: NaiveDate,
    /// Before the clock's today; not selectable.
    pub past: bool,
    pub blocked: bool,
    /// At least one pending or approved booking exists on this date.
    pub has_bookings: bool,
}

impl DayStatus {
    pub fn selectable(&self) -> bool {
        !self.past && !self.blocked
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl BookingStats {
    pub fn count(&mut self, status: BookingStatus) {
        self.total += 1;
        match status {
            BookingStatus::Pending => self.pending += 1,
            BookingStatus::Approved => self.approved += 1,
            BookingStatus::Rejected => self.rejected += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn hall() -> Hall {
        Hall {
            id: "1".into(),
            name: "Main Seminar Hall".into(),
            capacity: 200,
            facilities: vec![],
            location: String::new(),
            description: String::new(),
        }
    }

    fn booking_on(d: &str, slot: TimeSlot) -> Booking {
        Booking {
            id: Ulid::new(),
            user_id: "2".into(),
            user_name: "John Doe".into(),
            hall_id: "1".into(),
            hall_name: "Main Seminar Hall".into(),
            date: date(d),
            time_slot: slot,
            purpose: "Talk".into(),
            attendees: 10,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn slot_labels_are_exact() {
        assert_eq!(TimeSlot::from_label("09:00 - 12:00"), Some(TimeSlot::Morning));
        assert_eq!(TimeSlot::from_label("18:00 - 21:00"), Some(TimeSlot::Evening));
        assert_eq!(TimeSlot::from_label("09:00-12:00"), None);
        assert_eq!(TimeSlot::from_label(" 09:00 - 12:00"), None);
        assert_eq!(TimeSlot::from_label(""), None);
    }

    #[test]
    fn slot_order_follows_the_day() {
        let mut sorted = TimeSlot::ALL;
        sorted.sort();
        assert_eq!(sorted, TimeSlot::ALL);
        assert_eq!(TimeSlot::Afternoon.to_string(), "14:00 - 17:00");
    }

    #[test]
    fn slot_serializes_as_label() {
        let json = serde_json::to_string(&TimeSlot::LateAfternoon).unwrap();
        assert_eq!(json, "\"15:00 - 18:00\"");
        let back: TimeSlot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TimeSlot::LateAfternoon);
    }

    #[test]
    fn status_effectiveness() {
        assert!(BookingStatus::Pending.is_effective());
        assert!(BookingStatus::Approved.is_effective());
        assert!(!BookingStatus::Rejected.is_effective());
        assert_eq!(Decision::Rejected.status(), BookingStatus::Rejected);
    }

    #[test]
    fn ledger_keeps_bookings_sorted_by_date() {
        let mut ledger = HallLedger::new(hall());
        ledger.record_booking(booking_on("2025-12-12", TimeSlot::Morning));
        ledger.record_booking(booking_on("2025-12-10", TimeSlot::Evening));
        ledger.record_booking(booking_on("2025-12-11", TimeSlot::Morning));
        let dates: Vec<_> = ledger.bookings.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![date("2025-12-10"), date("2025-12-11"), date("2025-12-12")]);
    }

    #[test]
    fn bookings_on_preserves_insertion_order_within_date() {
        let mut ledger = HallLedger::new(hall());
        let first = booking_on("2025-12-10", TimeSlot::Evening);
        let second = booking_on("2025-12-10", TimeSlot::Morning);
        let first_id = first.id;
        let second_id = second.id;
        ledger.record_booking(booking_on("2025-12-09", TimeSlot::Morning));
        ledger.record_booking(first);
        ledger.record_booking(second);
        ledger.record_booking(booking_on("2025-12-11", TimeSlot::Morning));

        let day = ledger.bookings_on(date("2025-12-10"));
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].id, first_id);
        assert_eq!(day[1].id, second_id);
        assert!(ledger.bookings_on(date("2025-12-31")).is_empty());
    }

    #[test]
    fn blocks_on_returns_duplicates() {
        let mut ledger = HallLedger::new(hall());
        for reason in ["Holiday", "Maintenance"] {
            ledger.add_blocked_date(BlockedDate {
                id: Ulid::new(),
                hall_id: "1".into(),
                date: date("2025-12-25"),
                reason: reason.into(),
            });
        }
        assert_eq!(ledger.blocks_on(date("2025-12-25")).len(), 2);
        assert!(ledger.blocks_on(date("2025-12-24")).is_empty());
    }

    #[test]
    fn set_status_is_unconditional() {
        let mut ledger = HallLedger::new(hall());
        let b = booking_on("2025-12-10", TimeSlot::Morning);
        let id = b.id;
        ledger.record_booking(b);
        assert!(ledger.set_status(id, BookingStatus::Rejected));
        assert!(ledger.set_status(id, BookingStatus::Approved));
        assert!(ledger.set_status(id, BookingStatus::Approved));
        assert_eq!(ledger.booking(id).unwrap().status, BookingStatus::Approved);
        assert!(!ledger.set_status(Ulid::new(), BookingStatus::Approved));
    }

    #[test]
    fn stats_count_by_status() {
        let mut stats = BookingStats::default();
        stats.count(BookingStatus::Pending);
        stats.count(BookingStatus::Approved);
        stats.count(BookingStatus::Approved);
        stats.count(BookingStatus::Rejected);
        assert_eq!(
            stats,
            BookingStats { total: 4, pending: 1, approved: 2, rejected: 1 }
        );
    }

    #[test]
    fn event_json_is_tagged() {
        let event = LedgerEvent::BookingReviewed {
            id: Ulid::new(),
            hall_id: "2".into(),
            status: BookingStatus::Approved,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "booking_reviewed");
        assert_eq!(value["status"], "approved");
        assert_eq!(event.hall_id(), "2");
    }
}
