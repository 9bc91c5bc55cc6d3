//! Validation bounds for booking input.

/// Longest bookable stay. Requests beyond this are rejected as data, not
/// errors — a guest can shorten the stay and retry.
pub const MAX_STAY_NIGHTS: i64 = 365;

/// Upper bound on the free-text special requests field.
pub const MAX_SPECIAL_REQUESTS_LEN: usize = 500;

/// Sanity cap on a snapshot's `max_occupancy`. A catalog handing out
/// more than this is misconfigured, which is a precondition failure
/// rather than a guest-correctable rejection.
pub const MAX_OCCUPANCY_BOUND: u32 = 50;
