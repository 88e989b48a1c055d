//! Storage abstraction for booking records.
//!
//! The ledger is the sole owner of booking state: every correctness guarantee
//! of the allocation engine reduces to the atomicity contracts documented on
//! [`AllocationLedger::admit`] and [`AllocationLedger::commit`]. No caller
//! caches occupancy between requests; every decision re-reads ledger state
//! inside the atomic unit.

use super::domain::{BookingRequest, BookingRequestId, BookingStatus, ResidencyId, UserId};
use super::error::BookingError;
use super::lifecycle::Transition;

/// Filter applied by the listing surface. Role scoping happens above the
/// ledger, after residency ownership is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
}

/// Result of a committed transition. `auto_rejected` carries the ids of
/// rival pending requests rejected in the same atomic unit, when the
/// approval policy asks for that.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    pub request: BookingRequest,
    pub auto_rejected: Vec<BookingRequestId>,
}

/// Durable store of booking requests. Records are never physically deleted;
/// terminal states are retained for audit.
pub trait AllocationLedger: Send + Sync {
    /// Insert a fresh pending record.
    ///
    /// Atomic with respect to the single-active invariant: fails with
    /// `DuplicateActive` when the student already has an active request
    /// (pending, approved, or paid) for the same residency.
    fn admit(&self, record: BookingRequest) -> Result<BookingRequest, BookingError>;

    fn fetch(&self, id: &BookingRequestId) -> Result<Option<BookingRequest>, BookingError>;

    /// Apply a lifecycle transition to the identified record.
    ///
    /// The whole call is one atomic unit executed against current ledger
    /// state. For `Transition::Approve` that unit re-reads the target,
    /// scans for any other record holding the same `(residency, room)` with
    /// an approved or paid status, aborts with `RoomConflict` when one
    /// exists, and otherwise commits the approval (plus any rival rejections
    /// the policy requires). Of two concurrent approvals for the same room,
    /// exactly one succeeds; a failed commit leaves the ledger untouched.
    fn commit(
        &self,
        id: &BookingRequestId,
        transition: Transition,
    ) -> Result<CommitOutcome, BookingError>;

    /// Filtered scan ordered by creation time, newest first.
    fn search(&self, filter: &BookingFilter) -> Result<Vec<BookingRequest>, BookingError>;

    /// The student's active request for a residency, if any.
    fn active_for(
        &self,
        student: &UserId,
        residency: &ResidencyId,
    ) -> Result<Option<BookingRequest>, BookingError>;

    /// The request currently holding a room (approved or paid), if any.
    fn room_holder(
        &self,
        residency: &ResidencyId,
        room_number: u32,
    ) -> Result<Option<BookingRequest>, BookingError>;

    /// The student's most recent active request, falling back to the most
    /// recent record of any status.
    fn latest_for_student(&self, student: &UserId) -> Result<Option<BookingRequest>, BookingError>;
}
