use chrono::NaiveDate;

use crate::model::*;
use crate::money::Money;

use super::conflict::{find_conflicts, today};
use super::error::{EngineError, Violation};
use super::Engine;

impl Engine {
    pub async fn booking(&self, booking_id: BookingId) -> Result<BookingRecord, EngineError> {
        self.record(booking_id).await
    }

    /// Price a prospective stay without validating guest or occupancy
    /// constraints: nights × nightly price, rounded to cents.
    pub async fn quote(
        &self,
        apartment_id: ApartmentId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Money, EngineError> {
        let apartment = self.snapshot(apartment_id).await?;
        if end <= start {
            return Err(EngineError::Rejected(Violation::InvalidDateRange.into()));
        }
        let nights = (end - start).num_days();
        Ok((apartment.price_per_night * nights).round_2())
    }

    /// Ids of active bookings colliding with `[start, end)`. Empty means
    /// the apartment is free for those dates.
    pub async fn probe_availability(
        &self,
        apartment_id: ApartmentId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BookingId>, EngineError> {
        if end <= start {
            return Err(EngineError::Rejected(Violation::InvalidDateRange.into()));
        }
        self.snapshot(apartment_id).await?;
        let existing = self.repository.active_bookings(apartment_id, None).await?;
        Ok(find_conflicts(&DateRange::new(start, end), &existing))
    }

    /// Active stays for a guest that start after today, soonest first.
    pub async fn upcoming_bookings(
        &self,
        guest_id: GuestId,
    ) -> Result<Vec<BookingRecord>, EngineError> {
        let today = today();
        let mut out: Vec<_> = self
            .repository
            .bookings_for_guest(guest_id)
            .await?
            .into_iter()
            .filter(|r| r.status.is_active() && r.booking.stay.start > today)
            .collect();
        out.sort_by_key(|r| r.booking.stay.start);
        Ok(out)
    }

    /// Stays for a guest that have already ended, most recent first.
    /// Includes cancelled ones; hosts can filter on status if they care.
    pub async fn past_bookings(
        &self,
        guest_id: GuestId,
    ) -> Result<Vec<BookingRecord>, EngineError> {
        let today = today();
        let mut out: Vec<_> = self
            .repository
            .bookings_for_guest(guest_id)
            .await?
            .into_iter()
            .filter(|r| r.booking.stay.end <= today)
            .collect();
        out.sort_by(|a, b| b.booking.stay.end.cmp(&a.booking.stay.end));
        Ok(out)
    }
}
