use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::authorize::{self, BookingAction, BookingScope};
use super::directory::{IdentityDirectory, ResidencyDirectory, ResidencySnapshot};
use super::domain::{
    Actor, BookingRequest, BookingRequestId, BookingStatus, BookingSubmission, BookingUpdate,
    PaymentDetails, ResidencyId, Role,
};
use super::error::BookingError;
use super::ledger::{AllocationLedger, BookingFilter, CommitOutcome};
use super::lifecycle::{RivalPolicy, Transition};
use super::validate;

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_booking_id() -> BookingRequestId {
    let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BookingRequestId(format!("req-{id:06}"))
}

/// Listing filters accepted by the query surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub status: Option<BookingStatus>,
    /// Free text matched against the enriched applicant name or the room
    /// number.
    pub text: Option<String>,
}

/// Booking record enriched with display-only applicant identity.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub request: BookingRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_email: Option<String>,
}

/// Facade composing the authorization gate, eligibility validation, and the
/// allocation ledger. Handlers never touch the ledger directly.
pub struct BookingService<L, R, I> {
    ledger: Arc<L>,
    residencies: Arc<R>,
    identities: Arc<I>,
    rivals: RivalPolicy,
}

impl<L, R, I> BookingService<L, R, I>
where
    L: AllocationLedger + 'static,
    R: ResidencyDirectory + 'static,
    I: IdentityDirectory + 'static,
{
    pub fn new(ledger: Arc<L>, residencies: Arc<R>, identities: Arc<I>, rivals: RivalPolicy) -> Self {
        Self {
            ledger,
            residencies,
            identities,
            rivals,
        }
    }

    /// Validate and admit a new pending request on behalf of `actor`.
    pub fn submit(
        &self,
        actor: &Actor,
        submission: BookingSubmission,
    ) -> Result<BookingRequest, BookingError> {
        authorize::authorize(actor, BookingAction::Submit, &BookingScope::student(&actor.id))?;

        let residency = self.visible_residency(&submission.residency_id)?;
        validate::submission(&residency, &submission, Utc::now().date_naive())?;

        // Best-effort pre-filters; the ledger re-checks the duplicate rule
        // atomically on admit, and approval owns room exclusivity.
        if let Some(holder) = self
            .ledger
            .room_holder(&submission.residency_id, submission.room_number)?
        {
            if holder.student_id != actor.id {
                return Err(BookingError::RoomConflict {
                    residency: submission.residency_id.clone(),
                    room_number: submission.room_number,
                });
            }
        }
        if self.ledger.active_for(&actor.id, &submission.residency_id)?.is_some() {
            return Err(BookingError::DuplicateActive {
                residency: submission.residency_id.clone(),
            });
        }

        let record = BookingRequest::admitted(
            next_booking_id(),
            actor.id.clone(),
            submission,
            Utc::now(),
        );
        let stored = self.ledger.admit(record)?;
        info!(
            booking = %stored.id,
            residency = %stored.residency_id,
            room = stored.room_number,
            "booking request admitted"
        );
        Ok(stored)
    }

    /// Approve a pending request, reserving its room exclusively.
    pub fn approve(&self, actor: &Actor, id: &BookingRequestId) -> Result<CommitOutcome, BookingError> {
        let record = self.fetch_existing(id)?;
        self.authorize_managed(actor, BookingAction::Approve, &record)?;

        let outcome = self
            .ledger
            .commit(id, Transition::Approve { rivals: self.rivals })?;
        info!(
            booking = %id,
            residency = %outcome.request.residency_id,
            room = outcome.request.room_number,
            rejected_rivals = outcome.auto_rejected.len(),
            "booking request approved"
        );
        Ok(outcome)
    }

    /// Reject a pending request with a mandatory reason.
    pub fn reject(
        &self,
        actor: &Actor,
        id: &BookingRequestId,
        reason: String,
    ) -> Result<BookingRequest, BookingError> {
        let record = self.fetch_existing(id)?;
        self.authorize_managed(actor, BookingAction::Reject, &record)?;

        let outcome = self.ledger.commit(id, Transition::Reject { reason })?;
        info!(booking = %id, "booking request rejected");
        Ok(outcome.request)
    }

    /// Record settlement of an approved request.
    pub fn mark_paid(
        &self,
        actor: &Actor,
        id: &BookingRequestId,
        details: PaymentDetails,
    ) -> Result<BookingRequest, BookingError> {
        let record = self.fetch_existing(id)?;
        self.authorize_managed(actor, BookingAction::MarkPaid, &record)?;

        let outcome = self.ledger.commit(id, Transition::MarkPaid { details })?;
        info!(booking = %id, "booking request marked paid");
        Ok(outcome.request)
    }

    /// Withdraw the caller's own pending request.
    pub fn cancel(&self, actor: &Actor, id: &BookingRequestId) -> Result<BookingRequest, BookingError> {
        let record = self.fetch_existing(id)?;
        authorize::authorize(
            actor,
            BookingAction::Cancel,
            &BookingScope::student(&record.student_id),
        )?;

        let outcome = self.ledger.commit(id, Transition::Cancel)?;
        info!(booking = %id, "booking request cancelled");
        Ok(outcome.request)
    }

    /// Replace whitelisted fields of the caller's own pending request.
    pub fn amend(
        &self,
        actor: &Actor,
        id: &BookingRequestId,
        update: BookingUpdate,
    ) -> Result<BookingRequest, BookingError> {
        let record = self.fetch_existing(id)?;
        authorize::authorize(
            actor,
            BookingAction::Amend,
            &BookingScope::student(&record.student_id),
        )?;

        if let Some(profile) = &update.profile {
            validate::profile(profile, Utc::now().date_naive())?;
        }
        if let Some(room_number) = update.room_number {
            let residency = self.visible_residency(&record.residency_id)?;
            validate::room_number(&residency, room_number)?;
            if let Some(holder) = self.ledger.room_holder(&record.residency_id, room_number)? {
                if holder.id != record.id {
                    return Err(BookingError::RoomConflict {
                        residency: record.residency_id.clone(),
                        room_number,
                    });
                }
            }
        }

        let outcome = self.ledger.commit(id, Transition::Amend { update })?;
        info!(booking = %id, "booking request updated");
        Ok(outcome.request)
    }

    /// The student's current request: most recent active, else most recent
    /// terminal, else `None`.
    pub fn my_request(&self, actor: &Actor) -> Result<Option<BookingView>, BookingError> {
        authorize::authorize(actor, BookingAction::View, &BookingScope::student(&actor.id))?;
        let record = self.ledger.latest_for_student(&actor.id)?;
        Ok(record.map(|record| self.view(record)))
    }

    /// Role-scoped listing with optional status and free-text filters.
    pub fn list(&self, actor: &Actor, query: &ListingQuery) -> Result<Vec<BookingView>, BookingError> {
        authorize::authorize(actor, BookingAction::List, &BookingScope::default())?;

        let filter = BookingFilter { status: query.status };
        let records = self.ledger.search(&filter)?;

        let mut views = Vec::with_capacity(records.len());
        for record in records {
            if actor.role == Role::Service && !self.owned_by(actor, &record.residency_id)? {
                continue;
            }
            views.push(self.view(record));
        }

        if let Some(text) = query.text.as_deref() {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty() {
                views.retain(|view| matches_text(view, &needle));
            }
        }

        Ok(views)
    }

    fn view(&self, request: BookingRequest) -> BookingView {
        let identity = self.identities.identity(&request.student_id);
        let (student_name, student_email) = match identity {
            Some(identity) => (Some(identity.name), Some(identity.email)),
            None => (None, None),
        };
        BookingView {
            request,
            student_name,
            student_email,
        }
    }

    fn fetch_existing(&self, id: &BookingRequestId) -> Result<BookingRequest, BookingError> {
        self.ledger
            .fetch(id)?
            .ok_or_else(|| BookingError::not_found(format!("booking request {id} not found")))
    }

    /// A residency is visible to applicants only once its listing is
    /// approved; anything else reads as absent.
    fn visible_residency(&self, id: &ResidencyId) -> Result<ResidencySnapshot, BookingError> {
        let residency = self.residencies.residency(id)?;
        residency
            .filter(ResidencySnapshot::is_published)
            .ok_or_else(|| BookingError::not_found(format!("residency {id} not found")))
    }

    /// Gate a manager action against the owner of the request's residency.
    fn authorize_managed(
        &self,
        actor: &Actor,
        action: BookingAction,
        record: &BookingRequest,
    ) -> Result<(), BookingError> {
        let residency = self
            .residencies
            .residency(&record.residency_id)?
            .ok_or_else(|| {
                BookingError::not_found(format!("residency {} not found", record.residency_id))
            })?;
        authorize::authorize(actor, action, &BookingScope::residency_owner(&residency.owner_id))
    }

    fn owned_by(&self, actor: &Actor, residency: &ResidencyId) -> Result<bool, BookingError> {
        let residency = self.residencies.residency(residency)?;
        Ok(residency.map_or(false, |snapshot| snapshot.owner_id == actor.id))
    }
}

fn matches_text(view: &BookingView, needle: &str) -> bool {
    if view.request.room_number.to_string() == needle {
        return true;
    }
    view.student_name
        .as_deref()
        .map_or(false, |name| name.to_lowercase().contains(needle))
}
