use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::booking::directory::{
    DirectoryError, IdentityDirectory, PublicationStatus, ResidencyDirectory, ResidencySnapshot,
    StudentIdentity,
};
use crate::booking::domain::{
    Actor, ApplicantProfile, BookingRequest, BookingRequestId, BookingSubmission, PaymentDetails,
    ResidencyId, Role, Sex, UserId,
};
use crate::booking::error::BookingError;
use crate::booking::ledger::{AllocationLedger, BookingFilter, CommitOutcome};
use crate::booking::lifecycle::{RivalPolicy, Transition};
use crate::booking::memory::InMemoryLedger;
use crate::booking::router::booking_router;
use crate::booking::service::BookingService;

pub(super) const RESIDENCY: &str = "res-alger-01";
pub(super) const MANAGER: &str = "mgr-amina";

pub(super) type TestService = BookingService<InMemoryLedger, MemoryResidencies, MemoryIdentities>;

#[derive(Default)]
pub(super) struct MemoryResidencies {
    records: Mutex<HashMap<ResidencyId, ResidencySnapshot>>,
}

impl MemoryResidencies {
    pub(super) fn insert(&self, snapshot: ResidencySnapshot) {
        self.records
            .lock()
            .expect("directory mutex poisoned")
            .insert(snapshot.id.clone(), snapshot);
    }
}

impl ResidencyDirectory for MemoryResidencies {
    fn residency(&self, id: &ResidencyId) -> Result<Option<ResidencySnapshot>, DirectoryError> {
        let records = self.records.lock().expect("directory mutex poisoned");
        Ok(records.get(id).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryIdentities {
    records: Mutex<HashMap<UserId, StudentIdentity>>,
}

impl MemoryIdentities {
    pub(super) fn insert(&self, id: &str, name: &str, email: &str) {
        self.records.lock().expect("identity mutex poisoned").insert(
            UserId(id.to_string()),
            StudentIdentity {
                name: name.to_string(),
                email: email.to_string(),
            },
        );
    }
}

impl IdentityDirectory for MemoryIdentities {
    fn identity(&self, id: &UserId) -> Option<StudentIdentity> {
        self.records
            .lock()
            .expect("identity mutex poisoned")
            .get(id)
            .cloned()
    }
}

/// Ledger fake for storage-failure paths.
pub(super) struct UnavailableLedger;

impl AllocationLedger for UnavailableLedger {
    fn admit(&self, _record: BookingRequest) -> Result<BookingRequest, BookingError> {
        Err(BookingError::Unavailable("ledger offline".to_string()))
    }

    fn fetch(&self, _id: &BookingRequestId) -> Result<Option<BookingRequest>, BookingError> {
        Err(BookingError::Unavailable("ledger offline".to_string()))
    }

    fn commit(
        &self,
        _id: &BookingRequestId,
        _transition: Transition,
    ) -> Result<CommitOutcome, BookingError> {
        Err(BookingError::Unavailable("ledger offline".to_string()))
    }

    fn search(&self, _filter: &BookingFilter) -> Result<Vec<BookingRequest>, BookingError> {
        Err(BookingError::Unavailable("ledger offline".to_string()))
    }

    fn active_for(
        &self,
        _student: &UserId,
        _residency: &ResidencyId,
    ) -> Result<Option<BookingRequest>, BookingError> {
        Err(BookingError::Unavailable("ledger offline".to_string()))
    }

    fn room_holder(
        &self,
        _residency: &ResidencyId,
        _room_number: u32,
    ) -> Result<Option<BookingRequest>, BookingError> {
        Err(BookingError::Unavailable("ledger offline".to_string()))
    }

    fn latest_for_student(
        &self,
        _student: &UserId,
    ) -> Result<Option<BookingRequest>, BookingError> {
        Err(BookingError::Unavailable("ledger offline".to_string()))
    }
}

pub(super) fn residency(id: &str, owner: &str, rooms: u32) -> ResidencySnapshot {
    ResidencySnapshot {
        id: ResidencyId(id.to_string()),
        owner_id: UserId(owner.to_string()),
        total_room_count: rooms,
        publication_status: PublicationStatus::Approved,
    }
}

pub(super) fn profile() -> ApplicantProfile {
    ApplicantProfile {
        exam_record_id: "BAC-2023-4521".to_string(),
        exam_year: 2023,
        sex: Sex::Female,
        birth_date: NaiveDate::from_ymd_opt(2004, 7, 2).expect("valid date"),
        field_of_study: "Computer Science".to_string(),
        study_year: 2,
        home_wilaya: "Tizi Ouzou".to_string(),
    }
}

pub(super) fn submission(room_number: u32) -> BookingSubmission {
    BookingSubmission {
        residency_id: ResidencyId(RESIDENCY.to_string()),
        room_number,
        profile: profile(),
        notes: Some("ground floor preferred".to_string()),
    }
}

pub(super) fn payment_details() -> PaymentDetails {
    PaymentDetails {
        amount: 4500,
        method: "bank transfer".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 9, 12).expect("valid date"),
    }
}

pub(super) fn student(id: &str) -> Actor {
    Actor::new(id, Role::Student)
}

pub(super) fn manager(id: &str) -> Actor {
    Actor::new(id, Role::Service)
}

pub(super) fn admin() -> Actor {
    Actor::new("admin-root", Role::Admin)
}

/// Service over fresh in-memory collaborators, with one three-room residency
/// owned by `MANAGER` already present.
pub(super) fn build_service() -> (
    TestService,
    Arc<InMemoryLedger>,
    Arc<MemoryResidencies>,
    Arc<MemoryIdentities>,
) {
    build_service_with_policy(RivalPolicy::LeavePending)
}

pub(super) fn build_service_with_policy(
    rivals: RivalPolicy,
) -> (
    TestService,
    Arc<InMemoryLedger>,
    Arc<MemoryResidencies>,
    Arc<MemoryIdentities>,
) {
    let ledger = Arc::new(InMemoryLedger::default());
    let residencies = Arc::new(MemoryResidencies::default());
    residencies.insert(residency(RESIDENCY, MANAGER, 3));
    let identities = Arc::new(MemoryIdentities::default());
    let service = BookingService::new(
        ledger.clone(),
        residencies.clone(),
        identities.clone(),
        rivals,
    );
    (service, ledger, residencies, identities)
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    booking_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
