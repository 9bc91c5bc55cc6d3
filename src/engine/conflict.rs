use chrono::{NaiveDate, Utc};

use crate::limits::MAX_OCCUPANCY_BOUND;
use crate::model::*;

use super::EngineError;

/// Current UTC date — the only wall clock read in the crate. Pure
/// functions always take the date as a parameter instead.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// The single overlap scan, shared by request validation and the
/// storage-side write guard. Returns every colliding booking id.
pub fn find_conflicts(stay: &DateRange, existing: &[ExistingBooking]) -> Vec<BookingId> {
    existing
        .iter()
        .filter(|b| b.stay.overlaps(stay))
        .map(|b| b.booking_id)
        .collect()
}

/// Contract guard: the snapshot handed to validation must describe the
/// requested apartment and must itself be well-formed.
pub(crate) fn check_snapshot(
    request: &BookingRequest,
    apartment: &ApartmentSnapshot,
) -> Result<(), EngineError> {
    if request.apartment_id != apartment.apartment_id {
        return Err(EngineError::Precondition(
            "apartment snapshot does not match request",
        ));
    }
    if apartment.max_occupancy == 0 || apartment.max_occupancy > MAX_OCCUPANCY_BOUND {
        return Err(EngineError::Precondition(
            "apartment max_occupancy out of bounds",
        ));
    }
    if apartment.price_per_night.is_negative() {
        return Err(EngineError::Precondition("negative nightly price"));
    }
    Ok(())
}
