use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::money::Money;

pub type ApartmentId = Ulid;
pub type GuestId = Ulid;
pub type BookingId = Ulid;

/// Half-open calendar range `[start, end)`. A guest checks in on `start`
/// and checks out on `end`; the night of `end` is not occupied, so two
/// stays touching at a boundary do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start < end, "DateRange start must be before end");
        Self { start, end }
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_day(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }
}

/// Lifecycle of a booking. Only `Pending` and `Confirmed` bookings block
/// other stays; `Cancelled` and `Completed` never participate in overlap
/// checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Legal transitions: `Pending → Confirmed → Completed`, and either
    /// active state may move to `Cancelled`. Everything else is rejected.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Completed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }
}

/// Read-only view of an apartment, supplied by the catalog. No owner
/// graph, no lazy navigation — just the fields the engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApartmentSnapshot {
    pub apartment_id: ApartmentId,
    pub owner_id: GuestId,
    pub max_occupancy: u32,
    pub price_per_night: Money,
    pub is_available: bool,
}

/// Raw caller input for a new or rescheduled stay. Nothing in here is
/// trusted: the engine re-checks every field, including the date order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub apartment_id: ApartmentId,
    pub guest_id: GuestId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guests: u32,
    pub special_requests: Option<String>,
}

/// A stay already committed to storage and known to be active. Used only
/// for overlap checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingBooking {
    pub booking_id: BookingId,
    pub apartment_id: ApartmentId,
    pub stay: DateRange,
}

/// Validated, priced output of the engine. `total_price` is always
/// derived server-side; any caller-supplied total is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedBooking {
    pub apartment_id: ApartmentId,
    pub guest_id: GuestId,
    pub stay: DateRange,
    pub guests: u32,
    pub nights: i64,
    pub total_price: Money,
    pub special_requests: Option<String>,
    /// The injected "today" at validation time, never a wall clock read.
    pub created_at: NaiveDate,
}

/// Durable form of a booking as the repository stores it. Ids are
/// assigned at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_id: BookingId,
    pub status: BookingStatus,
    pub booking: PricedBooking,
}
