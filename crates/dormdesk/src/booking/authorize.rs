//! Role and ownership checks.
//!
//! Every operation funnels through [`authorize`] before any mutation. The
//! checks are expressed as capability predicates per role rather than inline
//! role conditionals, so the gate can be tested in isolation.

use super::domain::{Actor, Role, UserId};
use super::error::BookingError;

/// Operations subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Submit,
    View,
    List,
    Approve,
    Reject,
    MarkPaid,
    Cancel,
    Amend,
}

impl BookingAction {
    pub const fn label(self) -> &'static str {
        match self {
            BookingAction::Submit => "submit",
            BookingAction::View => "view",
            BookingAction::List => "list",
            BookingAction::Approve => "approve",
            BookingAction::Reject => "reject",
            BookingAction::MarkPaid => "mark as paid",
            BookingAction::Cancel => "cancel",
            BookingAction::Amend => "update",
        }
    }
}

/// Ownership context of the resource an action targets. `student` is the
/// applicant who owns the request, `residency_owner` the manager account of
/// the residency it belongs to (resolved via the residency directory).
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingScope<'a> {
    pub student: Option<&'a UserId>,
    pub residency_owner: Option<&'a UserId>,
}

impl<'a> BookingScope<'a> {
    pub fn student(student: &'a UserId) -> Self {
        Self {
            student: Some(student),
            residency_owner: None,
        }
    }

    pub fn residency_owner(owner: &'a UserId) -> Self {
        Self {
            student: None,
            residency_owner: Some(owner),
        }
    }
}

/// Capability check: may `actor` perform `action` within `scope`?
pub fn permits(actor: &Actor, action: BookingAction, scope: &BookingScope<'_>) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Student => student_permits(actor, action, scope),
        Role::Service => service_permits(actor, action, scope),
    }
}

fn student_permits(actor: &Actor, action: BookingAction, scope: &BookingScope<'_>) -> bool {
    let owns_request = scope.student == Some(&actor.id);
    match action {
        BookingAction::Submit => owns_request,
        BookingAction::View | BookingAction::Cancel | BookingAction::Amend => owns_request,
        BookingAction::List
        | BookingAction::Approve
        | BookingAction::Reject
        | BookingAction::MarkPaid => false,
    }
}

fn service_permits(actor: &Actor, action: BookingAction, scope: &BookingScope<'_>) -> bool {
    match action {
        // Listing is always allowed; the query surface scopes results to
        // owned residencies.
        BookingAction::List => true,
        BookingAction::View
        | BookingAction::Approve
        | BookingAction::Reject
        | BookingAction::MarkPaid => scope.residency_owner == Some(&actor.id),
        BookingAction::Submit | BookingAction::Cancel | BookingAction::Amend => false,
    }
}

/// [`permits`], surfaced as the 403 error the REST layer reports.
pub fn authorize(
    actor: &Actor,
    action: BookingAction,
    scope: &BookingScope<'_>,
) -> Result<(), BookingError> {
    if permits(actor, action, scope) {
        Ok(())
    } else {
        Err(BookingError::forbidden(format!(
            "{} {} is not allowed to {} this booking request",
            actor.role.label(),
            actor.id,
            action.label()
        )))
    }
}
