use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::Args;
use dormdesk::booking::{
    Actor, ApplicantProfile, BookingService, BookingSubmission, InMemoryLedger, ListingQuery,
    PaymentDetails, PublicationStatus, ResidencyId, ResidencySnapshot, RivalPolicy, Role, Sex,
    StudentIdentity, UserId,
};
use dormdesk::error::AppError;

use crate::infra::{InMemoryIdentityDirectory, InMemoryResidencyDirectory};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reject rival pending requests automatically when a room is approved
    #[arg(long)]
    pub(crate) auto_reject_rivals: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let rivals = if args.auto_reject_rivals {
        RivalPolicy::AutoReject
    } else {
        RivalPolicy::LeavePending
    };

    let ledger = Arc::new(InMemoryLedger::default());
    let residencies = Arc::new(InMemoryResidencyDirectory::default());
    let identities = Arc::new(InMemoryIdentityDirectory::default());

    residencies.insert(ResidencySnapshot {
        id: ResidencyId("res-demo".to_string()),
        owner_id: UserId("mgr-demo".to_string()),
        total_room_count: 3,
        publication_status: PublicationStatus::Approved,
    });
    identities.insert(
        UserId("stu-lina".to_string()),
        StudentIdentity {
            name: "Lina Mansouri".to_string(),
            email: "lina@univ.dz".to_string(),
        },
    );
    identities.insert(
        UserId("stu-yacine".to_string()),
        StudentIdentity {
            name: "Yacine Brahimi".to_string(),
            email: "yacine@univ.dz".to_string(),
        },
    );

    let service = BookingService::new(ledger, residencies, identities, rivals);
    let manager = Actor::new("mgr-demo", Role::Service);
    let lina = Actor::new("stu-lina", Role::Student);
    let yacine = Actor::new("stu-yacine", Role::Student);

    println!("Booking allocation demo (rival policy: {rivals:?})");

    let first = match service.submit(&lina, demo_submission(2, 17)) {
        Ok(record) => record,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "- {} applied for room {} -> {}",
        first.student_id, first.room_number, first.status
    );

    let second = match service.submit(&yacine, demo_submission(2, 18)) {
        Ok(record) => record,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "- {} applied for the same room -> {} (rival pending requests are allowed)",
        second.student_id, second.status
    );

    match service.approve(&manager, &first.id) {
        Ok(outcome) => {
            println!(
                "- Manager approved {} -> {} (payment {})",
                outcome.request.id,
                outcome.request.status,
                outcome
                    .request
                    .payment
                    .as_ref()
                    .map(|payment| format!("{:?}", payment.status))
                    .unwrap_or_else(|| "none".to_string())
            );
            if !outcome.auto_rejected.is_empty() {
                println!("  Auto-rejected rivals: {:?}", outcome.auto_rejected);
            }
        }
        Err(err) => println!("  Approval failed: {err}"),
    }

    match service.approve(&manager, &second.id) {
        Ok(_) => println!("- Rival approval unexpectedly succeeded"),
        Err(err) => println!("- Rival approval refused: {err}"),
    }

    match service.mark_paid(
        &manager,
        &first.id,
        PaymentDetails {
            amount: 4500,
            method: "ccp".to_string(),
            date: Local::now().date_naive(),
        },
    ) {
        Ok(record) => println!("- Payment recorded for {} -> {}", record.id, record.status),
        Err(err) => println!("  Payment failed: {err}"),
    }

    if !args.auto_reject_rivals {
        match service.cancel(&yacine, &second.id) {
            Ok(record) => println!(
                "- {} withdrew their pending request -> {}",
                record.student_id, record.status
            ),
            Err(err) => println!("  Cancellation failed: {err}"),
        }
    }

    let admin = Actor::new("admin-demo", Role::Admin);
    match service.list(&admin, &ListingQuery::default()) {
        Ok(views) => match serde_json::to_string_pretty(&views) {
            Ok(json) => println!("\nFinal ledger state:\n{json}"),
            Err(err) => println!("  Listing unavailable: {err}"),
        },
        Err(err) => println!("  Listing unavailable: {err}"),
    }

    Ok(())
}

fn demo_submission(room_number: u32, serial: u32) -> BookingSubmission {
    let today = Local::now().date_naive();
    let birth_date = birth_date_years_ago(today, 20);
    BookingSubmission {
        residency_id: ResidencyId("res-demo".to_string()),
        room_number,
        profile: ApplicantProfile {
            exam_record_id: format!("BAC-2023-{serial:04}"),
            exam_year: 2023,
            sex: Sex::Female,
            birth_date,
            field_of_study: "Computer Science".to_string(),
            study_year: 2,
            home_wilaya: "Bejaia".to_string(),
        },
        notes: None,
    }
}

fn birth_date_years_ago(today: NaiveDate, years: i64) -> NaiveDate {
    today
        .checked_sub_signed(chrono::Duration::days(365 * years))
        .unwrap_or(today)
}
