use chrono::NaiveDate;

use crate::limits::*;
use crate::model::*;

use super::availability::{effective_booking, is_date_blocked};
use super::EngineError;

/// A booking request whose required fields are present and well-formed.
#[derive(Debug)]
pub(crate) struct CheckedRequest<'a> {
    pub user_id: &'a str,
    pub user_name: &'a str,
    pub hall_id: &'a str,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub purpose: &'a str,
    pub attendees: u32,
}

/// Field presence, shape and text limits. Runs before any ledger lookup.
pub(crate) fn validate_request(req: &BookingRequest, today: NaiveDate) -> Result<CheckedRequest<'_>, EngineError> {
    if req.user_id.is_empty() {
        return Err(EngineError::Validation("missing field: user_id"));
    }
    if req.hall_id.is_empty() {
        return Err(EngineError::Validation("missing field: hall_id"));
    }
    let Some(date) = req.date else {
        return Err(EngineError::Validation("missing field: date"));
    };
    if req.time_slot.is_empty() {
        return Err(EngineError::Validation("missing field: time_slot"));
    }
    let purpose = req.purpose.trim();
    if purpose.is_empty() {
        return Err(EngineError::Validation("missing field: purpose"));
    }
    let Some(attendees) = req.attendees else {
        return Err(EngineError::Validation("missing field: attendees"));
    };

    if purpose.len() > MAX_PURPOSE_LEN {
        return Err(EngineError::LimitExceeded("purpose too long"));
    }
    if req.user_name.len() > MAX_NAME_LEN {
        return Err(EngineError::LimitExceeded("user name too long"));
    }
    if req.user_id.len() > MAX_ID_LEN || req.hall_id.len() > MAX_ID_LEN {
        return Err(EngineError::LimitExceeded("id too long"));
    }

    let time_slot =
        TimeSlot::from_label(&req.time_slot).ok_or(EngineError::Validation("unknown time slot"))?;
    if date < today {
        return Err(EngineError::Validation("date is in the past"));
    }

    Ok(CheckedRequest {
        user_id: &req.user_id,
        user_name: &req.user_name,
        hall_id: &req.hall_id,
        date,
        time_slot,
        purpose,
        attendees,
    })
}

pub(crate) fn check_capacity(hall: &Hall, attendees: u32) -> Result<(), EngineError> {
    if attendees == 0 || attendees > hall.capacity {
        return Err(EngineError::Capacity {
            attendees,
            capacity: hall.capacity,
        });
    }
    Ok(())
}

pub(crate) fn check_not_blocked(ledger: &HallLedger, date: NaiveDate) -> Result<(), EngineError> {
    if is_date_blocked(ledger, date) {
        return Err(EngineError::Blocked {
            hall_id: ledger.hall.id.clone(),
            date,
        });
    }
    Ok(())
}

pub(crate) fn check_no_conflict(ledger: &HallLedger, date: NaiveDate, slot: TimeSlot) -> Result<(), EngineError> {
    match effective_booking(ledger, date, slot) {
        Some(existing) => Err(EngineError::Conflict(existing.id)),
        None => Ok(()),
    }
}

/// Steps 2–4 of the booking workflow, in order. Caller holds the hall's write lock.
pub(crate) fn check_bookable(ledger: &HallLedger, req: &CheckedRequest<'_>) -> Result<(), EngineError> {
    check_capacity(&ledger.hall, req.attendees)?;
    check_not_blocked(ledger, req.date)?;
    check_no_conflict(ledger, req.date, req.time_slot)?;
    if ledger.bookings.len() >= MAX_BOOKINGS_PER_HALL {
        return Err(EngineError::LimitExceeded("too many bookings on hall"));
    }
    Ok(())
}

pub(crate) fn validate_block(req: &BlockRequest) -> Result<(&str, NaiveDate, &str), EngineError> {
    if req.hall_id.is_empty() {
        return Err(EngineError::Validation("missing field: hall_id"));
    }
    let Some(date) = req.date else {
        return Err(EngineError::Validation("missing field: date"));
    };
    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(EngineError::Validation("missing field: reason"));
    }
    if reason.len() > MAX_REASON_LEN {
        return Err(EngineError::LimitExceeded("reason too long"));
    }
    Ok((&req.hall_id, date, reason))
}
