mod availability;
mod conflict;
mod error;
mod mutations;
mod queries;
mod store;

pub use availability::{can_cancel, validate_and_price};
pub use conflict::find_conflicts;
pub use error::{BookingRejection, EngineError, Violation};
pub use store::{ApartmentCatalog, BookingRepository, MemoryStore, StoreError};

use std::sync::Arc;

use crate::model::*;

/// Booking orchestration over the two collaborator seams.
///
/// Holds no state of its own: every call reads a fresh snapshot and a
/// fresh set of active bookings, runs the pure validation, and hands the
/// result to the repository. Safe to share across request handlers.
pub struct Engine {
    catalog: Arc<dyn ApartmentCatalog>,
    repository: Arc<dyn BookingRepository>,
}

impl Engine {
    pub fn new(catalog: Arc<dyn ApartmentCatalog>, repository: Arc<dyn BookingRepository>) -> Self {
        Self {
            catalog,
            repository,
        }
    }

    pub(super) async fn snapshot(
        &self,
        apartment_id: ApartmentId,
    ) -> Result<ApartmentSnapshot, EngineError> {
        self.catalog
            .get_apartment(apartment_id)
            .await?
            .ok_or(EngineError::ApartmentNotFound(apartment_id))
    }

    pub(super) async fn record(&self, booking_id: BookingId) -> Result<BookingRecord, EngineError> {
        self.repository
            .get(booking_id)
            .await?
            .ok_or(EngineError::BookingNotFound(booking_id))
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            // Conflicts from guarded writes are intercepted at the call
            // site for the retry path; anything that leaks here is final.
            StoreError::Conflict(id) => EngineError::SaveConflict(id),
            StoreError::NotFound(id) => EngineError::BookingNotFound(id),
            StoreError::Backend(e) => EngineError::Storage(e),
        }
    }
}
