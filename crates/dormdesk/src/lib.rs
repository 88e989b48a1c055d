//! Booking request lifecycle and room allocation for managed student residencies.
//!
//! The crate is organized around the [`booking`] module: students submit
//! booking requests for a numbered room, residency managers approve, reject,
//! or mark them paid, and the allocation ledger guarantees that a room is
//! never granted to two requests at once.

pub mod booking;
pub mod config;
pub mod error;
pub mod telemetry;
