use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::directory::{IdentityDirectory, ResidencyDirectory};
use super::domain::{
    Actor, BookingRequest, BookingRequestId, BookingStatus, BookingSubmission, BookingUpdate,
    PaymentDetails, Role, UserId,
};
use super::error::BookingError;
use super::ledger::AllocationLedger;
use super::service::{BookingService, ListingQuery};

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = match &self {
            BookingError::Validation(_) | BookingError::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            BookingError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::DuplicateActive { .. } | BookingError::RoomConflict { .. } => {
                StatusCode::CONFLICT
            }
            BookingError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Storage failures are logged in full but surfaced generically.
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "booking operation failed unexpectedly");
            let body = Json(json!({ "error": "unexpected server error" }));
            return (status, body).into_response();
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// The upstream gateway authenticates callers and forwards their identity in
/// these headers; the booking service trusts but re-authorizes them.
const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = BookingError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = required_header(parts, USER_ID_HEADER)?;
        let role_value = required_header(parts, USER_ROLE_HEADER)?;
        let role = Role::from_label(&role_value).ok_or_else(|| {
            BookingError::Unauthenticated(format!("unknown role '{role_value}'"))
        })?;
        Ok(Actor {
            id: UserId(id),
            role,
        })
    }
}

fn required_header(parts: &Parts, name: &'static str) -> Result<String, BookingError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| BookingError::Unauthenticated(format!("{name} header is required")))
}

/// Router builder exposing the booking request REST surface.
pub fn booking_router<L, R, I>(service: Arc<BookingService<L, R, I>>) -> Router
where
    L: AllocationLedger + 'static,
    R: ResidencyDirectory + 'static,
    I: IdentityDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/booking-requests/student",
            post(submit_booking::<L, R, I>),
        )
        .route("/api/v1/booking-requests", get(list_bookings::<L, R, I>))
        .route(
            "/api/v1/booking-requests/:id/approve",
            put(approve_booking::<L, R, I>),
        )
        .route(
            "/api/v1/booking-requests/:id/reject",
            put(reject_booking::<L, R, I>),
        )
        .route(
            "/api/v1/booking-requests/:id/mark-paid",
            put(mark_booking_paid::<L, R, I>),
        )
        .route(
            "/api/v1/booking-requests/student/my-request",
            get(my_booking::<L, R, I>),
        )
        .route(
            "/api/v1/booking-requests/student/my-request/:id",
            put(amend_booking::<L, R, I>).delete(cancel_booking::<L, R, I>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    status: Option<String>,
    q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RejectBody {
    #[serde(default)]
    rejection_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApprovalResponse {
    #[serde(flatten)]
    request: BookingRequest,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    auto_rejected_rivals: Vec<BookingRequestId>,
}

pub(crate) async fn submit_booking<L, R, I>(
    State(service): State<Arc<BookingService<L, R, I>>>,
    actor: Actor,
    Json(submission): Json<BookingSubmission>,
) -> Result<Response, BookingError>
where
    L: AllocationLedger + 'static,
    R: ResidencyDirectory + 'static,
    I: IdentityDirectory + 'static,
{
    let record = service.submit(&actor, submission)?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub(crate) async fn list_bookings<L, R, I>(
    State(service): State<Arc<BookingService<L, R, I>>>,
    actor: Actor,
    Query(params): Query<ListParams>,
) -> Result<Response, BookingError>
where
    L: AllocationLedger + 'static,
    R: ResidencyDirectory + 'static,
    I: IdentityDirectory + 'static,
{
    let status = match params.status.as_deref() {
        Some(raw) => Some(BookingStatus::from_label(raw).ok_or_else(|| {
            BookingError::validation(format!("unknown status filter '{raw}'"))
        })?),
        None => None,
    };
    let query = ListingQuery {
        status,
        text: params.q,
    };
    let views = service.list(&actor, &query)?;
    Ok(Json(views).into_response())
}

pub(crate) async fn approve_booking<L, R, I>(
    State(service): State<Arc<BookingService<L, R, I>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Response, BookingError>
where
    L: AllocationLedger + 'static,
    R: ResidencyDirectory + 'static,
    I: IdentityDirectory + 'static,
{
    let outcome = service.approve(&actor, &BookingRequestId(id))?;
    let body = ApprovalResponse {
        request: outcome.request,
        auto_rejected_rivals: outcome.auto_rejected,
    };
    Ok(Json(body).into_response())
}

pub(crate) async fn reject_booking<L, R, I>(
    State(service): State<Arc<BookingService<L, R, I>>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<RejectBody>,
) -> Result<Response, BookingError>
where
    L: AllocationLedger + 'static,
    R: ResidencyDirectory + 'static,
    I: IdentityDirectory + 'static,
{
    let reason = body.rejection_reason.unwrap_or_default();
    let record = service.reject(&actor, &BookingRequestId(id), reason)?;
    Ok(Json(record).into_response())
}

pub(crate) async fn mark_booking_paid<L, R, I>(
    State(service): State<Arc<BookingService<L, R, I>>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(details): Json<PaymentDetails>,
) -> Result<Response, BookingError>
where
    L: AllocationLedger + 'static,
    R: ResidencyDirectory + 'static,
    I: IdentityDirectory + 'static,
{
    let record = service.mark_paid(&actor, &BookingRequestId(id), details)?;
    Ok(Json(record).into_response())
}

pub(crate) async fn my_booking<L, R, I>(
    State(service): State<Arc<BookingService<L, R, I>>>,
    actor: Actor,
) -> Result<Response, BookingError>
where
    L: AllocationLedger + 'static,
    R: ResidencyDirectory + 'static,
    I: IdentityDirectory + 'static,
{
    let view = service.my_request(&actor)?;
    Ok(Json(view).into_response())
}

pub(crate) async fn cancel_booking<L, R, I>(
    State(service): State<Arc<BookingService<L, R, I>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Response, BookingError>
where
    L: AllocationLedger + 'static,
    R: ResidencyDirectory + 'static,
    I: IdentityDirectory + 'static,
{
    let record = service.cancel(&actor, &BookingRequestId(id))?;
    Ok(Json(record).into_response())
}

pub(crate) async fn amend_booking<L, R, I>(
    State(service): State<Arc<BookingService<L, R, I>>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(update): Json<BookingUpdate>,
) -> Result<Response, BookingError>
where
    L: AllocationLedger + 'static,
    R: ResidencyDirectory + 'static,
    I: IdentityDirectory + 'static,
{
    let record = service.amend(&actor, &BookingRequestId(id), update)?;
    Ok(Json(record).into_response())
}
