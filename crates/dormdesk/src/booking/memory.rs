//! In-memory allocation ledger.
//!
//! One mutex guards the whole record map, so every `admit` and `commit` runs
//! as a single critical section: the room scan and the status write of an
//! approval cannot interleave with another commit. A database-backed ledger
//! would satisfy the same trait contract with a serializable transaction.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use super::domain::{BookingRequest, BookingRequestId, BookingStatus, ResidencyId, UserId};
use super::error::BookingError;
use super::ledger::{AllocationLedger, BookingFilter, CommitOutcome};
use super::lifecycle::{self, RivalPolicy, Transition, RIVAL_REJECTION_REASON};

#[derive(Default)]
pub struct InMemoryLedger {
    records: Mutex<HashMap<BookingRequestId, BookingRequest>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, terminal states included.
    pub fn len(&self) -> usize {
        self.records.lock().expect("ledger mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn holds_same_room(record: &BookingRequest, residency: &ResidencyId, room_number: u32) -> bool {
    record.residency_id == *residency
        && record.room_number == room_number
        && record.status.holds_room()
}

impl AllocationLedger for InMemoryLedger {
    fn admit(&self, record: BookingRequest) -> Result<BookingRequest, BookingError> {
        let mut records = self.records.lock().expect("ledger mutex poisoned");

        let duplicate = records.values().any(|existing| {
            existing.student_id == record.student_id
                && existing.residency_id == record.residency_id
                && existing.status.is_active()
        });
        if duplicate {
            return Err(BookingError::DuplicateActive {
                residency: record.residency_id.clone(),
            });
        }

        if records.contains_key(&record.id) {
            return Err(BookingError::Unavailable(format!(
                "booking id {} already present",
                record.id
            )));
        }

        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &BookingRequestId) -> Result<Option<BookingRequest>, BookingError> {
        let records = self.records.lock().expect("ledger mutex poisoned");
        Ok(records.get(id).cloned())
    }

    fn commit(
        &self,
        id: &BookingRequestId,
        transition: Transition,
    ) -> Result<CommitOutcome, BookingError> {
        let mut records = self.records.lock().expect("ledger mutex poisoned");

        let current = records
            .get(id)
            .cloned()
            .ok_or_else(|| BookingError::not_found(format!("booking request {id} not found")))?;
        let now = Utc::now();

        if matches!(transition, Transition::Approve { .. }) {
            let taken = records
                .values()
                .any(|other| other.id != *id && holds_same_room(other, &current.residency_id, current.room_number));
            if taken {
                return Err(BookingError::RoomConflict {
                    residency: current.residency_id.clone(),
                    room_number: current.room_number,
                });
            }
        }

        // Stage every successor record before writing anything, so a failed
        // transition leaves the map exactly as it was.
        let updated = lifecycle::apply(&current, &transition, now)?;

        let mut rejected_rivals = Vec::new();
        if let Transition::Approve {
            rivals: RivalPolicy::AutoReject,
        } = &transition
        {
            let rejection = Transition::Reject {
                reason: RIVAL_REJECTION_REASON.to_string(),
            };
            for rival in records.values().filter(|other| {
                other.id != *id
                    && other.residency_id == current.residency_id
                    && other.room_number == current.room_number
                    && other.status == BookingStatus::Pending
            }) {
                rejected_rivals.push(lifecycle::apply(rival, &rejection, now)?);
            }
        }

        records.insert(id.clone(), updated.clone());
        let mut auto_rejected = Vec::with_capacity(rejected_rivals.len());
        for rival in rejected_rivals {
            auto_rejected.push(rival.id.clone());
            records.insert(rival.id.clone(), rival);
        }

        Ok(CommitOutcome {
            request: updated,
            auto_rejected,
        })
    }

    fn search(&self, filter: &BookingFilter) -> Result<Vec<BookingRequest>, BookingError> {
        let records = self.records.lock().expect("ledger mutex poisoned");
        let mut matches: Vec<BookingRequest> = records
            .values()
            .filter(|record| filter.status.map_or(true, |status| record.status == status))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(matches)
    }

    fn active_for(
        &self,
        student: &UserId,
        residency: &ResidencyId,
    ) -> Result<Option<BookingRequest>, BookingError> {
        let records = self.records.lock().expect("ledger mutex poisoned");
        Ok(records
            .values()
            .find(|record| {
                record.student_id == *student
                    && record.residency_id == *residency
                    && record.status.is_active()
            })
            .cloned())
    }

    fn room_holder(
        &self,
        residency: &ResidencyId,
        room_number: u32,
    ) -> Result<Option<BookingRequest>, BookingError> {
        let records = self.records.lock().expect("ledger mutex poisoned");
        Ok(records
            .values()
            .find(|record| holds_same_room(record, residency, room_number))
            .cloned())
    }

    fn latest_for_student(&self, student: &UserId) -> Result<Option<BookingRequest>, BookingError> {
        let records = self.records.lock().expect("ledger mutex poisoned");
        let mine = records
            .values()
            .filter(|record| record.student_id == *student);

        let mut latest_active: Option<&BookingRequest> = None;
        let mut latest_any: Option<&BookingRequest> = None;
        for record in mine {
            if latest_any.map_or(true, |seen| record.created_at > seen.created_at) {
                latest_any = Some(record);
            }
            if record.status.is_active()
                && latest_active.map_or(true, |seen| record.created_at > seen.created_at)
            {
                latest_active = Some(record);
            }
        }

        Ok(latest_active.or(latest_any).cloned())
    }
}
