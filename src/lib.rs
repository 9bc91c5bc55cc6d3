//! Booking availability core for an apartment-rental marketplace.
//!
//! The engine validates and prices stays against apartment snapshots and
//! existing bookings, with all persistence behind the narrow
//! [`engine::ApartmentCatalog`] / [`engine::BookingRepository`] seams. It
//! performs no I/O of its own and reads no ambient state: hosts supply
//! the storage, the identity, and (for the pure functions) the clock.

pub mod engine;
pub mod limits;
pub mod model;
pub mod money;

pub use engine::{Engine, EngineError};
