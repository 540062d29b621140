//! Hard limits on ledger growth and on user-supplied text.

/// Halls accepted from a catalog file.
pub const MAX_HALLS: usize = 1_000;

/// Bookings retained per hall (rejected ones included, bookings are never deleted).
pub const MAX_BOOKINGS_PER_HALL: usize = 100_000;

/// Blocked-date entries per hall.
pub const MAX_BLOCKED_DATES_PER_HALL: usize = 10_000;

pub const MAX_PURPOSE_LEN: usize = 2_000;
pub const MAX_REASON_LEN: usize = 500;
pub const MAX_NAME_LEN: usize = 256;
pub const MAX_ID_LEN: usize = 128;

/// Concurrent `listen` subscriptions per connection.
pub const MAX_LISTENS_PER_CONNECTION: usize = 64;

/// Widest date range a single calendar query may cover.
pub const MAX_CALENDAR_DAYS: i64 = 366;
