use chrono::NaiveDate;
use ulid::Ulid;

/// Expected, user-facing outcomes of ledger operations. None of these are
/// faults: callers correct the input and resubmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Missing or malformed input.
    Validation(&'static str),
    /// Attendee count outside `1..=capacity`.
    Capacity { attendees: u32, capacity: u32 },
    /// Date administratively blocked for the hall.
    Blocked { hall_id: String, date: NaiveDate },
    /// Slot already held by the given pending or approved booking.
    Conflict(Ulid),
    /// Unknown hall or booking id.
    NotFound(String),
    LimitExceeded(&'static str),
}

impl EngineError {
    /// Stable machine-readable tag, used for metrics labels and wire errors.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::Capacity { .. } => "capacity",
            EngineError::Blocked { .. } => "blocked",
            EngineError::Conflict(_) => "conflict",
            EngineError::NotFound(_) => "not_found",
            EngineError::LimitExceeded(_) => "limit_exceeded",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "invalid request: {msg}"),
            EngineError::Capacity { attendees, capacity } => {
                write!(f, "{attendees} attendees outside hall capacity 1..={capacity}")
            }
            EngineError::Blocked { hall_id, date } => {
                write!(f, "hall {hall_id} is blocked on {date}")
            }
            EngineError::Conflict(id) => write!(f, "time slot already booked: {id}"),
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
