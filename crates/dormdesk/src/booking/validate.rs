//! Eligibility checks performed before a submission is admitted to the
//! ledger. Everything here fails fast and mutates nothing; the duplicate and
//! occupancy checks are best-effort pre-filters whose guarantees are owned by
//! the ledger's atomic operations.

use chrono::{Datelike, NaiveDate};

use super::directory::ResidencySnapshot;
use super::domain::{ApplicantProfile, BookingSubmission};
use super::error::BookingError;

const EXAM_YEAR_FLOOR: u16 = 1970;
const MAX_STUDY_YEAR: u8 = 8;

/// Validate a full submission against the residency it targets.
pub fn submission(
    residency: &ResidencySnapshot,
    submission: &BookingSubmission,
    today: NaiveDate,
) -> Result<(), BookingError> {
    profile(&submission.profile, today)?;
    room_number(residency, submission.room_number)
}

/// Structural checks on the applicant profile fields.
pub fn profile(profile: &ApplicantProfile, today: NaiveDate) -> Result<(), BookingError> {
    require_text("exam_record_id", &profile.exam_record_id)?;
    require_text("field_of_study", &profile.field_of_study)?;
    require_text("home_wilaya", &profile.home_wilaya)?;

    let exam_year_ceiling = today.year().clamp(0, u16::MAX as i32) as u16;
    if profile.exam_year < EXAM_YEAR_FLOOR || profile.exam_year > exam_year_ceiling {
        return Err(BookingError::validation(format!(
            "exam_year must be between {EXAM_YEAR_FLOOR} and {exam_year_ceiling}"
        )));
    }

    if profile.study_year == 0 || profile.study_year > MAX_STUDY_YEAR {
        return Err(BookingError::validation(format!(
            "study_year must be between 1 and {MAX_STUDY_YEAR}"
        )));
    }

    if profile.birth_date >= today {
        return Err(BookingError::validation("birth_date must be in the past"));
    }

    Ok(())
}

/// The requested room must exist within the residency's room count.
pub fn room_number(residency: &ResidencySnapshot, room_number: u32) -> Result<(), BookingError> {
    if room_number == 0 {
        return Err(BookingError::validation(
            "room_number must be a positive integer",
        ));
    }
    if room_number > residency.total_room_count {
        return Err(BookingError::validation(format!(
            "room {room_number} exceeds the {} available rooms of residency {}",
            residency.total_room_count, residency.id
        )));
    }
    Ok(())
}

fn require_text(field: &str, value: &str) -> Result<(), BookingError> {
    if value.trim().is_empty() {
        return Err(BookingError::validation(format!("{field} is required")));
    }
    Ok(())
}
