use serde::{Deserialize, Serialize};

use crate::model::{ApartmentId, BookingId, BookingStatus};

/// A single violated booking rule. These are expected user-input
/// outcomes, surfaced verbatim to the caller for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    ApartmentUnavailable,
    SelfBooking,
    StartDateInPast,
    InvalidDateRange,
    OccupancyExceeded { max_occupancy: u32 },
    StayTooLong { max_nights: i64 },
    SpecialRequestsTooLong { max_len: usize },
    DateConflict { conflicting: Vec<BookingId> },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::ApartmentUnavailable => write!(f, "apartment is not open for booking"),
            Violation::SelfBooking => write!(f, "owners cannot book their own apartment"),
            Violation::StartDateInPast => {
                write!(f, "stay must start at least one day in the future")
            }
            Violation::InvalidDateRange => write!(f, "check-out must be after check-in"),
            Violation::OccupancyExceeded { max_occupancy } => {
                write!(f, "guest count exceeds maximum occupancy of {max_occupancy}")
            }
            Violation::StayTooLong { max_nights } => {
                write!(f, "stay exceeds the maximum of {max_nights} nights")
            }
            Violation::SpecialRequestsTooLong { max_len } => {
                write!(f, "special requests exceed {max_len} characters")
            }
            Violation::DateConflict { conflicting } => {
                write!(f, "dates conflict with existing booking(s): ")?;
                for (i, id) in conflicting.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{id}")?;
                }
                Ok(())
            }
        }
    }
}

/// Complete rejection report: every violated rule, not just the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRejection {
    pub violations: Vec<Violation>,
}

impl BookingRejection {
    pub(crate) fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Ids of the bookings this request collides with, if any.
    pub fn conflicting_ids(&self) -> Option<&[BookingId]> {
        self.violations.iter().find_map(|v| match v {
            Violation::DateConflict { conflicting } => Some(conflicting.as_slice()),
            _ => None,
        })
    }
}

impl From<Violation> for BookingRejection {
    fn from(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

impl std::fmt::Display for BookingRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum EngineError {
    ApartmentNotFound(ApartmentId),
    BookingNotFound(BookingId),
    /// Validation outcome carried as data.
    Rejected(BookingRejection),
    /// The write lost a race to this booking even after one revalidation.
    SaveConflict(BookingId),
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    /// Reschedule targeted a booking that is cancelled or completed.
    BookingInactive(BookingId),
    /// Cancellation attempted inside the 48-hour lock window.
    CancellationWindowClosed(BookingId),
    /// Programming-contract breach, distinct from user-facing rejections.
    Precondition(&'static str),
    Storage(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::ApartmentNotFound(id) => write!(f, "apartment not found: {id}"),
            EngineError::BookingNotFound(id) => write!(f, "booking not found: {id}"),
            EngineError::Rejected(rejection) => write!(f, "booking rejected: {rejection}"),
            EngineError::SaveConflict(id) => {
                write!(f, "save conflict with concurrent booking: {id}")
            }
            EngineError::InvalidTransition { from, to } => {
                write!(f, "invalid status transition: {from:?} -> {to:?}")
            }
            EngineError::BookingInactive(id) => write!(f, "booking is not active: {id}"),
            EngineError::CancellationWindowClosed(id) => {
                write!(f, "cancellation window closed for booking: {id}")
            }
            EngineError::Precondition(msg) => write!(f, "precondition violated: {msg}"),
            EngineError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
