//! JSON-lines adapter: one request object per line in, one reply per line out.
//!
//! Requests are tagged by `"cmd"`. Replies are `{"ok": ...}` or
//! `{"error": {"kind", "message"}}`. After `listen`, ledger events for that
//! hall are interleaved as `{"event": ...}` lines.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, warn};
use ulid::Ulid;

use crate::engine::{Engine, EngineError};
use crate::limits::*;
use crate::model::*;
use crate::observability;

const EVENT_QUEUE: usize = 256;

/// A parsed adapter command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    Identify {
        user_id: String,
        user_name: String,
        #[serde(default = "default_role")]
        role: Role,
    },
    ListHalls,
    TimeSlots,
    /// `user_id`/`user_name` in the body are ignored; the session identity wins.
    RequestBooking(BookingRequest),
    Approve {
        id: Ulid,
    },
    Reject {
        id: Ulid,
    },
    BlockDate(BlockRequest),
    MyBookings,
    AllBookings,
    PendingBookings,
    Stats {
        #[serde(default)]
        all: bool,
    },
    IsDateBlocked {
        hall_id: String,
        date: NaiveDate,
    },
    IsSlotBooked {
        hall_id: String,
        date: NaiveDate,
        time_slot: String,
    },
    AvailableSlots {
        hall_id: String,
        date: NaiveDate,
    },
    DayStatus {
        hall_id: String,
        date: NaiveDate,
    },
    Calendar {
        hall_id: String,
        from: NaiveDate,
        to: NaiveDate,
    },
    BlockedDates {
        hall_id: String,
    },
    Listen {
        hall_id: String,
    },
    Unlisten {
        hall_id: String,
    },
}

fn default_role() -> Role {
    Role::User
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireError {
    pub kind: &'static str,
    pub message: String,
}

impl WireError {
    fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

impl From<EngineError> for WireError {
    fn from(e: EngineError) -> Self {
        Self::new(e.kind(), e.to_string())
    }
}

impl From<serde_json::Error> for WireError {
    fn from(e: serde_json::Error) -> Self {
        Self::new("internal", e.to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Reply {
    Ok(Value),
    Error(WireError),
    Event(LedgerEvent),
}

/// Per-connection state.
struct Session {
    identity: Option<Identity>,
    listens: HashMap<String, JoinHandle<()>>,
    events: mpsc::Sender<LedgerEvent>,
}

impl Session {
    fn identity(&self) -> Result<&Identity, WireError> {
        self.identity
            .as_ref()
            .ok_or_else(|| WireError::new("unidentified", "identify first"))
    }

    fn admin(&self) -> Result<&Identity, WireError> {
        let identity = self.identity()?;
        if !identity.is_admin() {
            return Err(WireError::new("forbidden", "admin role required"));
        }
        Ok(identity)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for (_, task) in self.listens.drain() {
            task.abort();
        }
    }
}

/// Serve one client until it disconnects or sends an oversized line.
pub async fn process_connection(
    socket: TcpStream,
    engine: Arc<Engine>,
    max_line_len: usize,
) -> Result<(), LinesCodecError> {
    let mut framed = Framed::new(socket, LinesCodec::new_with_max_length(max_line_len));
    let (events_tx, mut events_rx) = mpsc::channel(EVENT_QUEUE);
    let mut session = Session {
        identity: None,
        listens: HashMap::new(),
        events: events_tx,
    };

    loop {
        tokio::select! {
            line = framed.next() => {
                let line = match line {
                    Some(Ok(line)) => line,
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        warn!("line longer than {max_line_len} bytes, closing connection");
                        let err = WireError::bad_request("line too long");
                        framed.send(encode(&Reply::Error(err))).await?;
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(e),
                    None => return Ok(()),
                };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = handle_line(&engine, &mut session, &line).await;
                framed.send(encode(&reply)).await?;
            }
            Some(event) = events_rx.recv() => {
                framed.send(encode(&Reply::Event(event))).await?;
            }
        }
    }
}

fn encode(reply: &Reply) -> String {
    serde_json::to_string(reply).unwrap_or_else(|e| internal_error_line(&e.to_string()))
}

fn internal_error_line(message: &str) -> String {
    serde_json::json!({ "error": { "kind": "internal", "message": message } }).to_string()
}

async fn handle_line(engine: &Engine, session: &mut Session, line: &str) -> Reply {
    let request: Request = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => return Reply::Error(WireError::bad_request(e.to_string())),
    };
    let label = observability::command_label(&request);
    let start = std::time::Instant::now();

    let result = execute(engine, session, request).await;

    metrics::histogram!(observability::COMMAND_DURATION_SECONDS, "command" => label)
        .record(start.elapsed().as_secs_f64());
    let status = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!(observability::COMMANDS_TOTAL, "command" => label, "status" => status).increment(1);

    match result {
        Ok(value) => Reply::Ok(value),
        Err(e) => {
            debug!(command = label, kind = e.kind, "{}", e.message);
            Reply::Error(e)
        }
    }
}

async fn execute(engine: &Engine, session: &mut Session, request: Request) -> Result<Value, WireError> {
    match request {
        Request::Identify {
            user_id,
            user_name,
            role,
        } => {
            if user_id.is_empty() || user_id.len() > MAX_ID_LEN {
                return Err(WireError::bad_request("user_id must be 1..=128 bytes"));
            }
            if user_name.len() > MAX_NAME_LEN {
                return Err(WireError::bad_request("user_name too long"));
            }
            let identity = Identity {
                user_id,
                user_name,
                role,
            };
            let value = serde_json::to_value(&identity)?;
            session.identity = Some(identity);
            Ok(value)
        }
        Request::ListHalls => Ok(serde_json::to_value(engine.list_halls())?),
        Request::TimeSlots => Ok(serde_json::to_value(TimeSlot::ALL)?),
        Request::RequestBooking(mut form) => {
            let identity = session.identity()?;
            form.user_id = identity.user_id.clone();
            form.user_name = identity.user_name.clone();
            let booking = engine.request_booking(form).await?;
            Ok(serde_json::to_value(booking)?)
        }
        Request::Approve { id } => {
            session.admin()?;
            Ok(serde_json::to_value(engine.approve(id).await?)?)
        }
        Request::Reject { id } => {
            session.admin()?;
            Ok(serde_json::to_value(engine.reject(id).await?)?)
        }
        Request::BlockDate(block) => {
            session.admin()?;
            Ok(serde_json::to_value(engine.block_date(block).await?)?)
        }
        Request::MyBookings => {
            let user_id = session.identity()?.user_id.clone();
            Ok(serde_json::to_value(engine.bookings_for_user(&user_id).await)?)
        }
        Request::AllBookings => {
            session.admin()?;
            Ok(serde_json::to_value(engine.all_bookings().await)?)
        }
        Request::PendingBookings => {
            session.admin()?;
            Ok(serde_json::to_value(engine.pending_bookings().await)?)
        }
        Request::Stats { all } => {
            let stats = if all {
                session.admin()?;
                engine.booking_stats(None).await
            } else {
                let user_id = session.identity()?.user_id.clone();
                engine.booking_stats(Some(&user_id)).await
            };
            Ok(serde_json::to_value(stats)?)
        }
        Request::IsDateBlocked { hall_id, date } => {
            Ok(Value::Bool(engine.is_date_blocked(&hall_id, date).await))
        }
        Request::IsSlotBooked {
            hall_id,
            date,
            time_slot,
        } => {
            let slot = TimeSlot::from_label(&time_slot)
                .ok_or(EngineError::Validation("unknown time slot"))?;
            Ok(Value::Bool(engine.is_slot_booked(&hall_id, date, slot).await))
        }
        Request::AvailableSlots { hall_id, date } => {
            Ok(serde_json::to_value(engine.available_slots(&hall_id, date).await?)?)
        }
        Request::DayStatus { hall_id, date } => {
            Ok(serde_json::to_value(engine.day_status(&hall_id, date).await?)?)
        }
        Request::Calendar { hall_id, from, to } => {
            Ok(serde_json::to_value(engine.calendar(&hall_id, from, to).await?)?)
        }
        Request::BlockedDates { hall_id } => {
            Ok(serde_json::to_value(engine.blocked_dates(&hall_id).await?)?)
        }
        Request::Listen { hall_id } => {
            if engine.get_hall(&hall_id).is_none() {
                return Err(EngineError::NotFound(format!("hall {hall_id}")).into());
            }
            if !session.listens.contains_key(&hall_id) {
                if session.listens.len() >= MAX_LISTENS_PER_CONNECTION {
                    return Err(EngineError::LimitExceeded("too many listens").into());
                }
                let rx = engine.notify.subscribe(&hall_id);
                let task = tokio::spawn(forward_events(rx, session.events.clone()));
                session.listens.insert(hall_id.clone(), task);
            }
            Ok(serde_json::json!({ "listening": hall_id }))
        }
        Request::Unlisten { hall_id } => {
            let was_listening = match session.listens.remove(&hall_id) {
                Some(task) => {
                    task.abort();
                    true
                }
                None => false,
            };
            Ok(serde_json::json!({ "unlistened": was_listening }))
        }
    }
}

/// Pump one hall's broadcast into the connection's event queue.
async fn forward_events(mut rx: broadcast::Receiver<LedgerEvent>, tx: mpsc::Sender<LedgerEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("listener lagged, {skipped} events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_unit_commands() {
        let req: Request = serde_json::from_str(r#"{"cmd": "list_halls"}"#).unwrap();
        assert_eq!(req, Request::ListHalls);
        let req: Request = serde_json::from_str(r#"{"cmd": "pending_bookings"}"#).unwrap();
        assert_eq!(req, Request::PendingBookings);
    }

    #[test]
    fn parse_identify_defaults_to_user_role() {
        let req: Request =
            serde_json::from_str(r#"{"cmd": "identify", "user_id": "2", "user_name": "John Doe"}"#).unwrap();
        assert_eq!(
            req,
            Request::Identify {
                user_id: "2".into(),
                user_name: "John Doe".into(),
                role: Role::User,
            }
        );
    }

    #[test]
    fn parse_request_booking_with_missing_fields() {
        let req: Request =
            serde_json::from_str(r#"{"cmd": "request_booking", "hall_id": "1", "time_slot": "09:00 - 12:00"}"#)
                .unwrap();
        let Request::RequestBooking(form) = req else {
            panic!("expected RequestBooking");
        };
        assert_eq!(form.hall_id, "1");
        assert_eq!(form.date, None);
        assert_eq!(form.attendees, None);
        assert!(form.purpose.is_empty());
    }

    #[test]
    fn parse_block_date() {
        let req: Request = serde_json::from_str(
            r#"{"cmd": "block_date", "hall_id": "1", "date": "2025-12-25", "reason": "Holiday"}"#,
        )
        .unwrap();
        assert_eq!(
            req,
            Request::BlockDate(BlockRequest {
                hall_id: "1".into(),
                date: Some("2025-12-25".parse().unwrap()),
                reason: "Holiday".into(),
            })
        );
    }

    #[test]
    fn parse_approve_requires_ulid() {
        let id = Ulid::new();
        let req: Request = serde_json::from_str(&format!(r#"{{"cmd": "approve", "id": "{id}"}}"#)).unwrap();
        assert_eq!(req, Request::Approve { id });
        assert!(serde_json::from_str::<Request>(r#"{"cmd": "approve", "id": "42"}"#).is_err());
    }

    #[test]
    fn unknown_command_is_error() {
        assert!(serde_json::from_str::<Request>(r#"{"cmd": "drop_tables"}"#).is_err());
        assert!(serde_json::from_str::<Request>(r#"{"hall_id": "1"}"#).is_err());
    }

    #[test]
    fn reply_shapes() {
        let ok = encode(&Reply::Ok(Value::Bool(true)));
        assert_eq!(ok, r#"{"ok":true}"#);

        let err = encode(&Reply::Error(EngineError::Conflict(Ulid::nil()).into()));
        let v: Value = serde_json::from_str(&err).unwrap();
        assert_eq!(v["error"]["kind"], "conflict");

        let event = LedgerEvent::BookingReviewed {
            id: Ulid::nil(),
            hall_id: "1".into(),
            status: BookingStatus::Rejected,
        };
        let v: Value = serde_json::from_str(&encode(&Reply::Event(event))).unwrap();
        assert_eq!(v["event"]["type"], "booking_reviewed");
        assert_eq!(v["event"]["status"], "rejected");
    }

    #[test]
    fn internal_error_line_escapes_message() {
        let message = "bad \"key\" at C:\\tmp\n\tcol 3\u{1}";
        let line = internal_error_line(message);
        assert!(!line.contains('\n'));
        let v: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["error"]["kind"], "internal");
        assert_eq!(v["error"]["message"], message);
    }
}
