use std::net::SocketAddr;

use crate::wire::Request;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total adapter commands executed. Labels: command, status.
pub const COMMANDS_TOTAL: &str = "hallbook_commands_total";

/// Histogram: command latency in seconds. Labels: command.
pub const COMMAND_DURATION_SECONDS: &str = "hallbook_command_duration_seconds";

// ── Ledger metrics ──────────────────────────────────────────────

/// Counter: booking requests by outcome (accepted, conflict, blocked, ...).
pub const BOOKING_REQUESTS_TOTAL: &str = "hallbook_booking_requests_total";

/// Counter: admin reviews. Labels: decision.
pub const BOOKING_REVIEWS_TOTAL: &str = "hallbook_booking_reviews_total";

/// Counter: blocked-date entries added.
pub const DATES_BLOCKED_TOTAL: &str = "hallbook_dates_blocked_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "hallbook_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "hallbook_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "hallbook_connections_rejected_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a Request variant to a short label for metrics.
pub fn command_label(req: &Request) -> &'static str {
    match req {
        Request::Identify { .. } => "identify",
        Request::ListHalls => "list_halls",
        Request::TimeSlots => "time_slots",
        Request::RequestBooking { .. } => "request_booking",
        Request::Approve { .. } => "approve",
        Request::Reject { .. } => "reject",
        Request::BlockDate { .. } => "block_date",
        Request::MyBookings => "my_bookings",
        Request::AllBookings => "all_bookings",
        Request::PendingBookings => "pending_bookings",
        Request::Stats { .. } => "stats",
        Request::IsDateBlocked { .. } => "is_date_blocked",
        Request::IsSlotBooked { .. } => "is_slot_booked",
        Request::AvailableSlots { .. } => "available_slots",
        Request::DayStatus { .. } => "day_status",
        Request::Calendar { .. } => "calendar",
        Request::BlockedDates { .. } => "blocked_dates",
        Request::Listen { .. } => "listen",
        Request::Unlisten { .. } => "unlisten",
    }
}
