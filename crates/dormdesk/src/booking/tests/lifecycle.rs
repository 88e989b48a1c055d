use chrono::Utc;

use super::common::*;
use crate::booking::domain::{
    BookingRequest, BookingRequestId, BookingStatus, BookingUpdate, PaymentRecord, PaymentStatus,
    UserId,
};
use crate::booking::error::BookingError;
use crate::booking::ledger::AllocationLedger;
use crate::booking::lifecycle::{self, RivalPolicy, Transition};

#[test]
fn approval_attaches_a_pending_payment() {
    let (service, _, _, _) = build_service();
    let record = service
        .submit(&student("stu-1"), submission(1))
        .expect("submission admitted");

    let outcome = service
        .approve(&manager(MANAGER), &record.id)
        .expect("pending request approves");

    assert_eq!(outcome.request.status, BookingStatus::Approved);
    let payment = outcome.request.payment.expect("payment record attached");
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.amount, None);
    assert_eq!(payment.method, None);
    assert_eq!(payment.date, None);
}

#[test]
fn rejection_requires_a_reason() {
    let (service, ledger, _, _) = build_service();
    let record = service
        .submit(&student("stu-1"), submission(1))
        .expect("submission admitted");

    match service.reject(&manager(MANAGER), &record.id, "   ".to_string()) {
        Err(BookingError::Validation(message)) => assert!(message.contains("reason")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let stored = ledger.fetch(&record.id).expect("fetch").expect("present");
    assert_eq!(stored.status, BookingStatus::Pending, "failed reject must not mutate");
}

#[test]
fn rejection_stores_the_trimmed_reason() {
    let (service, _, _, _) = build_service();
    let record = service
        .submit(&student("stu-1"), submission(1))
        .expect("submission admitted");

    let rejected = service
        .reject(
            &manager(MANAGER),
            &record.id,
            "  incomplete exam record  ".to_string(),
        )
        .expect("reject succeeds");

    assert_eq!(rejected.status, BookingStatus::Rejected);
    assert_eq!(
        rejected.rejection_reason.as_deref(),
        Some("incomplete exam record")
    );
    assert_eq!(rejected.payment, None);
}

#[test]
fn marking_paid_requires_prior_approval() {
    let (service, _, _, _) = build_service();
    let record = service
        .submit(&student("stu-1"), submission(1))
        .expect("submission admitted");

    match service.mark_paid(&manager(MANAGER), &record.id, payment_details()) {
        Err(BookingError::InvalidTransition { from, action }) => {
            assert_eq!(from, BookingStatus::Pending);
            assert_eq!(action, "mark as paid");
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn marking_paid_stores_the_settlement_details() {
    let (service, _, _, _) = build_service();
    let record = service
        .submit(&student("stu-1"), submission(1))
        .expect("submission admitted");
    service
        .approve(&manager(MANAGER), &record.id)
        .expect("approval succeeds");

    let paid = service
        .mark_paid(&manager(MANAGER), &record.id, payment_details())
        .expect("mark paid succeeds");

    assert_eq!(paid.status, BookingStatus::Paid);
    let payment = paid.payment.expect("payment retained");
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(payment.amount, Some(4500));
    assert_eq!(payment.method.as_deref(), Some("bank transfer"));
    assert!(payment.date.is_some());
}

#[test]
fn cancelling_twice_is_an_invalid_transition() {
    let (service, _, _, _) = build_service();
    let applicant = student("stu-1");
    let record = service
        .submit(&applicant, submission(1))
        .expect("submission admitted");

    let cancelled = service
        .cancel(&applicant, &record.id)
        .expect("first cancel succeeds");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    match service.cancel(&applicant, &record.id) {
        Err(BookingError::InvalidTransition { from, action }) => {
            assert_eq!(from, BookingStatus::Cancelled);
            assert_eq!(action, "cancel");
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn approved_requests_cannot_be_cancelled_by_the_student() {
    let (service, _, _, _) = build_service();
    let applicant = student("stu-1");
    let record = service
        .submit(&applicant, submission(1))
        .expect("submission admitted");
    service
        .approve(&manager(MANAGER), &record.id)
        .expect("approval succeeds");

    match service.cancel(&applicant, &record.id) {
        Err(BookingError::InvalidTransition { from, .. }) => {
            assert_eq!(from, BookingStatus::Approved);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn amend_replaces_whitelisted_fields_while_pending() {
    let (service, _, _, _) = build_service();
    let applicant = student("stu-1");
    let record = service
        .submit(&applicant, submission(1))
        .expect("submission admitted");

    let mut new_profile = profile();
    new_profile.field_of_study = "Architecture".to_string();

    let update = BookingUpdate {
        room_number: Some(3),
        notes: Some("needs accessible access".to_string()),
        profile: Some(new_profile),
    };
    let amended = service
        .amend(&applicant, &record.id, update)
        .expect("amend succeeds while pending");

    assert_eq!(amended.room_number, 3);
    assert_eq!(amended.notes.as_deref(), Some("needs accessible access"));
    assert_eq!(amended.profile.field_of_study, "Architecture");
    assert_eq!(amended.status, BookingStatus::Pending);
}

#[test]
fn amend_with_no_fields_is_a_validation_error() {
    let (service, _, _, _) = build_service();
    let applicant = student("stu-1");
    let record = service
        .submit(&applicant, submission(1))
        .expect("submission admitted");

    match service.amend(&applicant, &record.id, BookingUpdate::default()) {
        Err(BookingError::Validation(message)) => assert!(message.contains("updatable")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn amend_validates_the_new_room_against_capacity() {
    let (service, _, _, _) = build_service();
    let applicant = student("stu-1");
    let record = service
        .submit(&applicant, submission(1))
        .expect("submission admitted");

    let update = BookingUpdate {
        room_number: Some(9),
        ..BookingUpdate::default()
    };
    match service.amend(&applicant, &record.id, update) {
        Err(BookingError::Validation(message)) => assert!(message.contains("exceeds")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn amend_after_approval_is_rejected() {
    let (service, _, _, _) = build_service();
    let applicant = student("stu-1");
    let record = service
        .submit(&applicant, submission(1))
        .expect("submission admitted");
    service
        .approve(&manager(MANAGER), &record.id)
        .expect("approval succeeds");

    let update = BookingUpdate {
        notes: Some("too late".to_string()),
        ..BookingUpdate::default()
    };
    match service.amend(&applicant, &record.id, update) {
        Err(BookingError::InvalidTransition { from, action }) => {
            assert_eq!(from, BookingStatus::Approved);
            assert_eq!(action, "update");
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn transitions_on_unknown_ids_are_not_found() {
    let (service, _, _, _) = build_service();
    let missing = BookingRequestId("req-999999".to_string());

    match service.approve(&admin(), &missing) {
        Err(BookingError::NotFound(message)) => assert!(message.contains("req-999999")),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn apply_preserves_a_payment_already_settled() {
    let now = Utc::now();
    let mut record = BookingRequest::admitted(
        BookingRequestId("req-manual".to_string()),
        UserId("stu-1".to_string()),
        submission(1),
        now,
    );
    // Settlement recorded out-of-band before the approval landed.
    record.payment = Some(PaymentRecord {
        status: PaymentStatus::Paid,
        amount: Some(4500),
        method: Some("cash".to_string()),
        date: None,
    });

    let approved = lifecycle::apply(
        &record,
        &Transition::Approve {
            rivals: RivalPolicy::LeavePending,
        },
        now,
    )
    .expect("approval applies");

    let payment = approved.payment.expect("payment retained");
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(payment.amount, Some(4500));
}
