use chrono::NaiveDate;

use crate::model::*;

// ── Availability predicates ───────────────────────────────────────
//
// Pure functions over one hall's ledger. Callers hold the lock.

/// True if any block entry exists for `date`, whatever its reason.
pub fn is_date_blocked(ledger: &HallLedger, date: NaiveDate) -> bool {
    !ledger.blocks_on(date).is_empty()
}

/// The pending or approved booking holding `slot` on `date`, if any.
///
/// Pending requests hold the slot as soon as they are filed. Rejected
/// bookings are skipped, which is what frees a slot for re-booking.
pub fn effective_booking(ledger: &HallLedger, date: NaiveDate, slot: TimeSlot) -> Option<&Booking> {
    ledger
        .bookings_on(date)
        .iter()
        .find(|b| b.time_slot == slot && b.status.is_effective())
}

pub fn is_slot_booked(ledger: &HallLedger, date: NaiveDate, slot: TimeSlot) -> bool {
    effective_booking(ledger, date, slot).is_some()
}

/// Slots still open on `date`, in day order. Blocks are not consulted here,
/// a blocked date with no bookings still lists every slot.
pub fn free_slots(ledger: &HallLedger, date: NaiveDate) -> Vec<TimeSlot> {
    let day = ledger.bookings_on(date);
    TimeSlot::ALL
        .into_iter()
        .filter(|slot| {
            !day
                .iter()
                .any(|b| b.time_slot == *slot && b.status.is_effective())
        })
        .collect()
}

pub fn day_status(ledger: &HallLedger, date: NaiveDate, today: NaiveDate) -> DayStatus {
    DayStatus {
        date,
        past: date < today,
        blocked: is_date_blocked(ledger, date),
        has_bookings: ledger.bookings_on(date).iter().any(|b| b.status.is_effective()),
    }
}
