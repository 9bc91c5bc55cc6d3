use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::model::*;

use super::conflict::find_conflicts;

/// Failures reported by the collaborator seam.
#[derive(Debug)]
pub enum StoreError {
    /// A concurrent writer committed an overlapping booking first.
    Conflict(BookingId),
    NotFound(Ulid),
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Conflict(id) => write!(f, "conflict with booking: {id}"),
            StoreError::NotFound(id) => write!(f, "not found: {id}"),
            StoreError::Backend(e) => write!(f, "backend error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Supplies apartment snapshots. Implemented by the host application.
#[async_trait]
pub trait ApartmentCatalog: Send + Sync {
    async fn get_apartment(
        &self,
        apartment_id: ApartmentId,
    ) -> Result<Option<ApartmentSnapshot>, StoreError>;
}

/// Persists bookings. Implemented by the host application.
///
/// `save` and `reschedule` MUST re-check overlap atomically with the
/// write — validate-then-write without that guard is racy, and two
/// overlapping requests could both pass validation before either
/// commits. A detected race surfaces as [`StoreError::Conflict`].
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Active (`Pending` or `Confirmed`) bookings for an apartment.
    /// `exclude` drops one booking id, for edit flows revalidating a
    /// booking against its own apartment.
    async fn active_bookings(
        &self,
        apartment_id: ApartmentId,
        exclude: Option<BookingId>,
    ) -> Result<Vec<ExistingBooking>, StoreError>;

    /// Persist a validated booking as `Pending`, assigning its id.
    async fn save(&self, booking: &PricedBooking) -> Result<BookingId, StoreError>;

    /// Replace the stay of an existing booking, keeping id and status.
    async fn reschedule(
        &self,
        booking_id: BookingId,
        booking: &PricedBooking,
    ) -> Result<(), StoreError>;

    async fn get(&self, booking_id: BookingId) -> Result<Option<BookingRecord>, StoreError>;

    /// Unconditional status write. Transition legality is the engine's
    /// job; the repository just records the outcome.
    async fn set_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<(), StoreError>;

    async fn bookings_for_guest(
        &self,
        guest_id: GuestId,
    ) -> Result<Vec<BookingRecord>, StoreError>;
}

// ── In-memory reference store ─────────────────────────────────────

/// All bookings for one apartment, sorted by stay start.
#[derive(Debug, Default)]
struct ApartmentBook {
    bookings: Vec<BookingRecord>,
}

impl ApartmentBook {
    fn insert(&mut self, record: BookingRecord) {
        let pos = self
            .bookings
            .binary_search_by_key(&record.booking.stay.start, |r| r.booking.stay.start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, record);
    }

    fn active(&self, exclude: Option<BookingId>) -> Vec<ExistingBooking> {
        self.bookings
            .iter()
            .filter(|r| r.status.is_active() && Some(r.booking_id) != exclude)
            .map(|r| ExistingBooking {
                booking_id: r.booking_id,
                apartment_id: r.booking.apartment_id,
                stay: r.booking.stay,
            })
            .collect()
    }

    fn position(&self, booking_id: BookingId) -> Option<usize> {
        self.bookings.iter().position(|r| r.booking_id == booking_id)
    }
}

type SharedBook = Arc<RwLock<ApartmentBook>>;

/// Reference implementation of both collaborator traits, backed by
/// concurrent maps with a per-apartment write lock.
///
/// The lock is the storage-level conflict guard: overlap is re-checked
/// under it immediately before every insert, so two racing writers can
/// never both commit overlapping stays.
pub struct MemoryStore {
    apartments: DashMap<ApartmentId, ApartmentSnapshot>,
    books: DashMap<ApartmentId, SharedBook>,
    /// Reverse lookup: booking id → apartment id.
    booking_index: DashMap<BookingId, ApartmentId>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            apartments: DashMap::new(),
            books: DashMap::new(),
            booking_index: DashMap::new(),
        }
    }

    pub fn insert_apartment(&self, snapshot: ApartmentSnapshot) {
        self.apartments.insert(snapshot.apartment_id, snapshot);
    }

    pub fn remove_apartment(&self, apartment_id: &ApartmentId) {
        self.apartments.remove(apartment_id);
    }

    fn book_for(&self, apartment_id: ApartmentId) -> SharedBook {
        self.books.entry(apartment_id).or_default().value().clone()
    }

    fn all_books(&self) -> Vec<SharedBook> {
        self.books.iter().map(|e| e.value().clone()).collect()
    }
}

#[async_trait]
impl ApartmentCatalog for MemoryStore {
    async fn get_apartment(
        &self,
        apartment_id: ApartmentId,
    ) -> Result<Option<ApartmentSnapshot>, StoreError> {
        Ok(self.apartments.get(&apartment_id).map(|e| e.value().clone()))
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn active_bookings(
        &self,
        apartment_id: ApartmentId,
        exclude: Option<BookingId>,
    ) -> Result<Vec<ExistingBooking>, StoreError> {
        let book = self.book_for(apartment_id);
        let guard = book.read().await;
        Ok(guard.active(exclude))
    }

    async fn save(&self, booking: &PricedBooking) -> Result<BookingId, StoreError> {
        let book = self.book_for(booking.apartment_id);
        let mut guard = book.write().await;

        // Re-check under the write lock; this is what makes the guard hold
        // against racing writers.
        let conflicts = find_conflicts(&booking.stay, &guard.active(None));
        if let Some(&winner) = conflicts.first() {
            return Err(StoreError::Conflict(winner));
        }

        let booking_id = Ulid::new();
        guard.insert(BookingRecord {
            booking_id,
            status: BookingStatus::Pending,
            booking: booking.clone(),
        });
        self.booking_index.insert(booking_id, booking.apartment_id);
        Ok(booking_id)
    }

    async fn reschedule(
        &self,
        booking_id: BookingId,
        booking: &PricedBooking,
    ) -> Result<(), StoreError> {
        let apartment_id = *self
            .booking_index
            .get(&booking_id)
            .ok_or(StoreError::NotFound(booking_id))?
            .value();
        let book = self.book_for(apartment_id);
        let mut guard = book.write().await;

        let conflicts = find_conflicts(&booking.stay, &guard.active(Some(booking_id)));
        if let Some(&winner) = conflicts.first() {
            return Err(StoreError::Conflict(winner));
        }

        let pos = guard
            .position(booking_id)
            .ok_or(StoreError::NotFound(booking_id))?;
        let status = guard.bookings[pos].status;
        guard.bookings.remove(pos);
        guard.insert(BookingRecord {
            booking_id,
            status,
            booking: booking.clone(),
        });
        Ok(())
    }

    async fn get(&self, booking_id: BookingId) -> Result<Option<BookingRecord>, StoreError> {
        let Some(apartment_id) = self.booking_index.get(&booking_id).map(|e| *e.value()) else {
            return Ok(None);
        };
        let book = self.book_for(apartment_id);
        let guard = book.read().await;
        Ok(guard
            .position(booking_id)
            .map(|pos| guard.bookings[pos].clone()))
    }

    async fn set_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<(), StoreError> {
        let apartment_id = *self
            .booking_index
            .get(&booking_id)
            .ok_or(StoreError::NotFound(booking_id))?
            .value();
        let book = self.book_for(apartment_id);
        let mut guard = book.write().await;
        let pos = guard
            .position(booking_id)
            .ok_or(StoreError::NotFound(booking_id))?;
        guard.bookings[pos].status = status;
        Ok(())
    }

    async fn bookings_for_guest(
        &self,
        guest_id: GuestId,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let mut out = Vec::new();
        for book in self.all_books() {
            let guard = book.read().await;
            out.extend(
                guard
                    .bookings
                    .iter()
                    .filter(|r| r.booking.guest_id == guest_id)
                    .cloned(),
            );
        }
        Ok(out)
    }
}
