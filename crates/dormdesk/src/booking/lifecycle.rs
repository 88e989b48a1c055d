//! Status state machine for booking requests.
//!
//! `apply` is a pure function from a record and a transition to the next
//! record. The allocation ledger invokes it inside its atomic commit, so this
//! module is the only place a record's status, rejection reason, or payment
//! record ever changes.

use chrono::{DateTime, Utc};

use super::domain::{
    BookingRequest, BookingStatus, BookingUpdate, PaymentDetails, PaymentRecord, PaymentStatus,
};
use super::error::BookingError;

/// Reason recorded on rival pending requests rejected by `RivalPolicy::AutoReject`.
pub const RIVAL_REJECTION_REASON: &str = "room allocated to another applicant";

/// What happens to other pending requests for a room once one of them is
/// approved. The default leaves them for manual cleanup by the manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RivalPolicy {
    #[default]
    LeavePending,
    AutoReject,
}

/// Requested status change, carrying the inputs the transition needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Approve { rivals: RivalPolicy },
    Reject { reason: String },
    MarkPaid { details: PaymentDetails },
    Cancel,
    Amend { update: BookingUpdate },
}

impl Transition {
    /// Verb used in transition error messages and transition logs.
    pub const fn action(&self) -> &'static str {
        match self {
            Transition::Approve { .. } => "approve",
            Transition::Reject { .. } => "reject",
            Transition::MarkPaid { .. } => "mark as paid",
            Transition::Cancel => "cancel",
            Transition::Amend { .. } => "update",
        }
    }

    const fn required_status(&self) -> BookingStatus {
        match self {
            Transition::Approve { .. }
            | Transition::Reject { .. }
            | Transition::Cancel
            | Transition::Amend { .. } => BookingStatus::Pending,
            Transition::MarkPaid { .. } => BookingStatus::Approved,
        }
    }
}

/// Apply `transition` to `request`, returning the successor record.
///
/// Fails with `InvalidTransition` when the precondition status does not
/// match, and with `Validation` for malformed transition inputs (blank
/// rejection reason, empty update). Never mutates in place.
pub fn apply(
    request: &BookingRequest,
    transition: &Transition,
    now: DateTime<Utc>,
) -> Result<BookingRequest, BookingError> {
    let required = transition.required_status();
    if request.status != required {
        return Err(BookingError::InvalidTransition {
            from: request.status,
            action: transition.action(),
        });
    }

    let mut next = request.clone();
    next.updated_at = now;

    match transition {
        Transition::Approve { .. } => {
            next.status = BookingStatus::Approved;
            // A payment already settled out-of-band survives the approval.
            let already_paid = matches!(
                next.payment,
                Some(PaymentRecord {
                    status: PaymentStatus::Paid,
                    ..
                })
            );
            if !already_paid {
                next.payment = Some(PaymentRecord::pending());
            }
        }
        Transition::Reject { reason } => {
            let reason = reason.trim();
            if reason.is_empty() {
                return Err(BookingError::validation("rejection reason must not be empty"));
            }
            next.status = BookingStatus::Rejected;
            next.rejection_reason = Some(reason.to_string());
            next.payment = None;
        }
        Transition::MarkPaid { details } => {
            if details.method.trim().is_empty() {
                return Err(BookingError::validation("payment method must not be empty"));
            }
            next.status = BookingStatus::Paid;
            next.payment = Some(PaymentRecord::settled(details.clone()));
        }
        Transition::Cancel => {
            next.status = BookingStatus::Cancelled;
        }
        Transition::Amend { update } => {
            if update.is_empty() {
                return Err(BookingError::validation("no updatable fields provided"));
            }
            if let Some(room_number) = update.room_number {
                next.room_number = room_number;
            }
            if let Some(notes) = &update.notes {
                let notes = notes.trim();
                next.notes = (!notes.is_empty()).then(|| notes.to_string());
            }
            if let Some(profile) = &update.profile {
                next.profile = profile.clone();
            }
        }
    }

    Ok(next)
}
