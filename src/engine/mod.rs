mod availability;
mod conflict;
mod error;
mod mutations;
mod queries;

pub use availability::{day_status, effective_booking, free_slots, is_date_blocked, is_slot_booked};
pub use error::EngineError;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::catalog::HallCatalog;
use crate::clock::{Clock, SystemClock};
use crate::model::*;
use crate::notify::NotifyHub;

pub type SharedHallLedger = Arc<RwLock<HallLedger>>;

/// The availability ledger: one lock-guarded [`HallLedger`] per catalog hall.
///
/// Every check-then-append for a hall runs under that hall's write lock, so
/// two requests for the same (hall, date, slot) can never both pass the
/// conflict check. Halls never share state, so they never contend.
pub struct Engine {
    catalog: Arc<HallCatalog>,
    pub(super) halls: DashMap<String, SharedHallLedger>,
    /// Reverse lookup: booking id → hall id
    pub(super) booking_to_hall: DashMap<Ulid, String>,
    pub(super) clock: Arc<dyn Clock>,
    pub notify: Arc<NotifyHub>,
}

/// Apply an event directly to a hall's ledger (no locking; caller holds the lock).
fn apply_to_hall(ledger: &mut HallLedger, event: &LedgerEvent, index: &DashMap<Ulid, String>) {
    match event {
        LedgerEvent::BookingRequested(booking) => {
            index.insert(booking.id, booking.hall_id.clone());
            ledger.record_booking(booking.clone());
        }
        LedgerEvent::BookingReviewed { id, status, .. } => {
            ledger.set_status(*id, *status);
        }
        LedgerEvent::DateBlocked(blocked) => {
            ledger.add_blocked_date(blocked.clone());
        }
    }
}

impl Engine {
    pub fn new(catalog: HallCatalog, clock: Arc<dyn Clock>, notify: Arc<NotifyHub>) -> Self {
        let halls = DashMap::new();
        for hall in catalog.halls() {
            halls.insert(hall.id.clone(), Arc::new(RwLock::new(HallLedger::new(hall.clone()))));
        }
        tracing::debug!("ledger initialised with {} halls", catalog.len());
        Self {
            catalog: Arc::new(catalog),
            halls,
            booking_to_hall: DashMap::new(),
            clock,
            notify,
        }
    }

    /// Wall-clock engine with a fresh notification hub.
    pub fn with_system_clock(catalog: HallCatalog) -> Self {
        Self::new(catalog, Arc::new(SystemClock), Arc::new(NotifyHub::new()))
    }

    pub fn catalog(&self) -> &HallCatalog {
        &self.catalog
    }

    pub fn get_hall(&self, id: &str) -> Option<SharedHallLedger> {
        self.halls.get(id).map(|e| e.value().clone())
    }

    pub fn get_hall_for_booking(&self, booking_id: &Ulid) -> Option<String> {
        self.booking_to_hall.get(booking_id).map(|e| e.value().clone())
    }

    pub(super) fn require_hall(&self, id: &str) -> Result<SharedHallLedger, EngineError> {
        self.get_hall(id)
            .ok_or_else(|| EngineError::NotFound(format!("hall {id}")))
    }

    /// Ledgers in catalog order. Arcs are cloned out so no map guard is held across an await.
    pub(super) fn ledgers(&self) -> Vec<SharedHallLedger> {
        self.catalog
            .halls()
            .iter()
            .filter_map(|h| self.get_hall(&h.id))
            .collect()
    }

    /// Apply + notify in one call.
    pub(super) fn apply_and_notify(&self, ledger: &mut HallLedger, event: LedgerEvent) {
        apply_to_hall(ledger, &event, &self.booking_to_hall);
        self.notify.send(&ledger.hall.id, event);
    }

    /// Lookup booking → hall, get ledger, acquire write lock.
    pub(super) async fn resolve_booking_write(
        &self,
        booking_id: &Ulid,
    ) -> Result<tokio::sync::OwnedRwLockWriteGuard<HallLedger>, EngineError> {
        let hall_id = self
            .get_hall_for_booking(booking_id)
            .ok_or_else(|| EngineError::NotFound(format!("booking {booking_id}")))?;
        let ledger = self.require_hall(&hall_id)?;
        Ok(ledger.write_owned().await)
    }

    /// Fresh booking id, reserved in the index so no concurrent request can draw it too.
    pub(super) fn next_booking_id(&self, hall_id: &str) -> Ulid {
        loop {
            let id = Ulid::new();
            if let dashmap::mapref::entry::Entry::Vacant(slot) = self.booking_to_hall.entry(id) {
                slot.insert(hall_id.to_string());
                return id;
            }
        }
    }
}
