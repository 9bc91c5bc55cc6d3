use tracing::{debug, info};

use crate::model::*;

use super::availability::{can_cancel, validate_and_price};
use super::conflict::{check_snapshot, today};
use super::error::EngineError;
use super::store::StoreError;
use super::Engine;

impl Engine {
    /// Validate, price, and persist a new stay.
    ///
    /// A save-time conflict means another writer slipped in between our
    /// read and the write; we re-read and re-validate exactly once,
    /// which normally turns the race into a `DateConflict` rejection
    /// the caller can display. A second save conflict gives up.
    pub async fn book(&self, request: BookingRequest) -> Result<BookingRecord, EngineError> {
        let apartment = self.snapshot(request.apartment_id).await?;
        check_snapshot(&request, &apartment)?;
        let today = today();

        let mut retried = false;
        loop {
            let existing = self
                .repository
                .active_bookings(request.apartment_id, None)
                .await?;
            let priced = validate_and_price(&request, &apartment, &existing, today)
                .map_err(|rejection| {
                    debug!(apartment = %request.apartment_id, %rejection, "booking rejected");
                    EngineError::Rejected(rejection)
                })?;

            match self.repository.save(&priced).await {
                Ok(booking_id) => {
                    info!(
                        booking = %booking_id,
                        apartment = %request.apartment_id,
                        nights = priced.nights,
                        total = %priced.total_price,
                        "booking created"
                    );
                    return self.record(booking_id).await;
                }
                Err(StoreError::Conflict(winner)) if !retried => {
                    debug!(winner = %winner, "save conflict, revalidating");
                    retried = true;
                }
                Err(StoreError::Conflict(winner)) => {
                    return Err(EngineError::SaveConflict(winner));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Change the dates or guest count of an active booking. Runs the
    /// same validation as `book`, with the booking's own id excluded
    /// from the overlap set. Apartment and guest are fixed.
    pub async fn reschedule(
        &self,
        booking_id: BookingId,
        request: BookingRequest,
    ) -> Result<BookingRecord, EngineError> {
        let current = self.record(booking_id).await?;
        if !current.status.is_active() {
            return Err(EngineError::BookingInactive(booking_id));
        }
        if request.apartment_id != current.booking.apartment_id {
            return Err(EngineError::Precondition(
                "reschedule cannot move a booking between apartments",
            ));
        }
        if request.guest_id != current.booking.guest_id {
            return Err(EngineError::Precondition(
                "reschedule cannot reassign a booking to another guest",
            ));
        }

        let apartment = self.snapshot(request.apartment_id).await?;
        check_snapshot(&request, &apartment)?;
        let today = today();

        let mut retried = false;
        loop {
            let existing = self
                .repository
                .active_bookings(request.apartment_id, Some(booking_id))
                .await?;
            let priced = validate_and_price(&request, &apartment, &existing, today)
                .map_err(|rejection| {
                    debug!(booking = %booking_id, %rejection, "reschedule rejected");
                    EngineError::Rejected(rejection)
                })?;

            match self.repository.reschedule(booking_id, &priced).await {
                Ok(()) => {
                    info!(booking = %booking_id, nights = priced.nights, "booking rescheduled");
                    return self.record(booking_id).await;
                }
                Err(StoreError::Conflict(winner)) if !retried => {
                    debug!(winner = %winner, "reschedule conflict, revalidating");
                    retried = true;
                }
                Err(StoreError::Conflict(winner)) => {
                    return Err(EngineError::SaveConflict(winner));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// `Pending → Confirmed`.
    pub async fn confirm(&self, booking_id: BookingId) -> Result<BookingRecord, EngineError> {
        self.transition(booking_id, BookingStatus::Confirmed).await
    }

    /// `Confirmed → Completed`.
    pub async fn complete(&self, booking_id: BookingId) -> Result<BookingRecord, EngineError> {
        self.transition(booking_id, BookingStatus::Completed).await
    }

    /// Cancel an active booking. Only allowed while the stay starts more
    /// than two days out.
    pub async fn cancel(&self, booking_id: BookingId) -> Result<BookingRecord, EngineError> {
        let current = self.record(booking_id).await?;
        if !current.status.can_transition_to(BookingStatus::Cancelled) {
            return Err(EngineError::InvalidTransition {
                from: current.status,
                to: BookingStatus::Cancelled,
            });
        }
        if !can_cancel(current.booking.stay.start, today()) {
            return Err(EngineError::CancellationWindowClosed(booking_id));
        }

        self.repository
            .set_status(booking_id, BookingStatus::Cancelled)
            .await?;
        info!(booking = %booking_id, "booking cancelled");
        self.record(booking_id).await
    }

    async fn transition(
        &self,
        booking_id: BookingId,
        to: BookingStatus,
    ) -> Result<BookingRecord, EngineError> {
        let current = self.record(booking_id).await?;
        if !current.status.can_transition_to(to) {
            return Err(EngineError::InvalidTransition {
                from: current.status,
                to,
            });
        }
        self.repository.set_status(booking_id, to).await?;
        info!(booking = %booking_id, status = ?to, "booking status updated");
        self.record(booking_id).await
    }
}
