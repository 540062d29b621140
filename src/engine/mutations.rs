use tracing::{debug, info};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::conflict::{check_bookable, check_no_conflict, validate_block, validate_request};
use super::{Engine, EngineError};

impl Engine {
    /// File a booking request. On success the booking is recorded as
    /// `pending` and already holds its slot.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// required fields, capacity, blocked date, slot conflict. The last
    /// three and the append happen under the hall's write lock.
    pub async fn request_booking(&self, request: BookingRequest) -> Result<Booking, EngineError> {
        let result = self.try_request_booking(&request).await;
        let outcome = match &result {
            Ok(_) => "accepted",
            Err(e) => e.kind(),
        };
        metrics::counter!(observability::BOOKING_REQUESTS_TOTAL, "outcome" => outcome).increment(1);
        if let Err(e) = &result {
            debug!(hall = %request.hall_id, user = %request.user_id, "booking request refused: {e}");
        }
        result
    }

    async fn try_request_booking(&self, request: &BookingRequest) -> Result<Booking, EngineError> {
        let now = self.clock.now();
        let checked = validate_request(request, now.date_naive())?;
        let ledger = self.require_hall(checked.hall_id)?;
        let mut guard = ledger.write().await;

        check_bookable(&guard, &checked)?;

        let booking = Booking {
            id: self.next_booking_id(checked.hall_id),
            user_id: checked.user_id.to_string(),
            user_name: checked.user_name.to_string(),
            hall_id: guard.hall.id.clone(),
            hall_name: guard.hall.name.clone(),
            date: checked.date,
            time_slot: checked.time_slot,
            purpose: checked.purpose.to_string(),
            attendees: checked.attendees,
            status: BookingStatus::Pending,
            created_at: now,
        };
        info!(
            id = %booking.id,
            hall = %booking.hall_id,
            date = %booking.date,
            slot = %booking.time_slot,
            "booking requested"
        );
        self.apply_and_notify(&mut guard, LedgerEvent::BookingRequested(booking.clone()));
        Ok(booking)
    }

    /// Set a booking's status to the decision. Re-applying the same decision
    /// is harmless, and an already-decided booking may be reviewed again.
    /// Reviving a rejected booking fails with `Conflict` if its slot has
    /// since been taken.
    pub async fn review_booking(&self, id: Ulid, decision: Decision) -> Result<Booking, EngineError> {
        let mut guard = self.resolve_booking_write(&id).await?;
        let status = decision.status();
        let hall_id = guard.hall.id.clone();
        let Some(current) = guard.booking(id) else {
            return Err(EngineError::NotFound(format!("booking {id}")));
        };
        // A rejected booking gave up its slot; reviving it must not overlap
        // whoever took the slot since.
        if status.is_effective() && !current.status.is_effective() {
            check_no_conflict(&guard, current.date, current.time_slot)?;
        }

        self.apply_and_notify(
            &mut guard,
            LedgerEvent::BookingReviewed { id, hall_id: hall_id.clone(), status },
        );
        metrics::counter!(observability::BOOKING_REVIEWS_TOTAL, "decision" => decision_label(decision))
            .increment(1);
        info!(%id, hall = %hall_id, ?status, "booking reviewed");

        guard
            .booking(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))
    }

    pub async fn approve(&self, id: Ulid) -> Result<Booking, EngineError> {
        self.review_booking(id, Decision::Approved).await
    }

    /// Rejecting frees the booking's slot for new requests.
    pub async fn reject(&self, id: Ulid) -> Result<Booking, EngineError> {
        self.review_booking(id, Decision::Rejected).await
    }

    /// Close a hall for new requests on a date. Bookings already pending or
    /// approved on that date are left untouched.
    pub async fn block_date(&self, request: BlockRequest) -> Result<BlockedDate, EngineError> {
        let (hall_id, date, reason) = validate_block(&request)?;
        let ledger = self.require_hall(hall_id)?;
        let mut guard = ledger.write().await;
        if guard.blocked.len() >= MAX_BLOCKED_DATES_PER_HALL {
            return Err(EngineError::LimitExceeded("too many blocked dates on hall"));
        }

        let blocked = BlockedDate {
            id: Ulid::new(),
            hall_id: guard.hall.id.clone(),
            date,
            reason: reason.to_string(),
        };
        info!(hall = %blocked.hall_id, %date, reason = %blocked.reason, "date blocked");
        metrics::counter!(observability::DATES_BLOCKED_TOTAL).increment(1);
        self.apply_and_notify(&mut guard, LedgerEvent::DateBlocked(blocked.clone()));
        Ok(blocked)
    }
}

fn decision_label(decision: Decision) -> &'static str {
    match decision {
        Decision::Approved => "approved",
        Decision::Rejected => "rejected",
    }
}
