//! Booking request lifecycle and room allocation.
//!
//! Students apply for one numbered room in one residency; residency managers
//! approve, reject, or mark the resulting requests paid. The hard problem is
//! allocation under concurrency: the [`ledger::AllocationLedger`] owns the
//! atomic units that keep a room from ever being granted twice and a student
//! from holding two active requests for the same residency.

pub mod authorize;
pub mod directory;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod memory;
pub mod router;
pub mod service;
pub mod validate;

#[cfg(test)]
mod tests;

pub use authorize::{authorize, permits, BookingAction, BookingScope};
pub use directory::{
    DirectoryError, IdentityDirectory, PublicationStatus, ResidencyDirectory, ResidencySnapshot,
    StudentIdentity,
};
pub use domain::{
    Actor, ApplicantProfile, BookingRequest, BookingRequestId, BookingStatus, BookingSubmission,
    BookingUpdate, PaymentDetails, PaymentRecord, PaymentStatus, ResidencyId, Role, Sex, UserId,
};
pub use error::BookingError;
pub use ledger::{AllocationLedger, BookingFilter, CommitOutcome};
pub use lifecycle::{RivalPolicy, Transition, RIVAL_REJECTION_REASON};
pub use memory::InMemoryLedger;
pub use router::booking_router;
pub use service::{BookingService, BookingView, ListingQuery};
