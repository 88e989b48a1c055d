use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for booking requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingRequestId(pub String);

impl fmt::Display for BookingRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for platform accounts (students, residency managers).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for managed residencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResidencyId(pub String);

impl fmt::Display for ResidencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform roles recognized by the authorization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Service,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Service => "service",
            Role::Admin => "admin",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "service" => Some(Role::Service),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Authenticated caller as resolved by the upstream identity gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId(id.into()),
            role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
}

/// Applicant details captured at submission time. Required in full when a
/// request is created and frozen once the request leaves `pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub exam_record_id: String,
    pub exam_year: u16,
    pub sex: Sex,
    pub birth_date: NaiveDate,
    pub field_of_study: String,
    pub study_year: u8,
    pub home_wilaya: String,
}

/// Lifecycle states of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
    Cancelled,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Paid => "paid",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "approved" => Some(BookingStatus::Approved),
            "rejected" => Some(BookingStatus::Rejected),
            "paid" => Some(BookingStatus::Paid),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Active requests count against the one-per-student-per-residency rule
    /// and, once approved or paid, against the room itself.
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Approved | BookingStatus::Paid
        )
    }

    /// Approved and paid requests hold their room exclusively.
    pub const fn holds_room(self) -> bool {
        matches!(self, BookingStatus::Approved | BookingStatus::Paid)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Paid | BookingStatus::Cancelled
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Payment state attached to approved and paid requests. Only the status is
/// authoritative here; settlement happens outside this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub status: PaymentStatus,
    pub amount: Option<u32>,
    pub method: Option<String>,
    pub date: Option<NaiveDate>,
}

impl PaymentRecord {
    /// The empty record attached when a request is approved.
    pub fn pending() -> Self {
        Self {
            status: PaymentStatus::Pending,
            amount: None,
            method: None,
            date: None,
        }
    }

    pub fn settled(details: PaymentDetails) -> Self {
        Self {
            status: PaymentStatus::Paid,
            amount: Some(details.amount),
            method: Some(details.method),
            date: Some(details.date),
        }
    }
}

/// Settlement details supplied when a manager marks a request paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub amount: u32,
    pub method: String,
    pub date: NaiveDate,
}

/// A student's application for one specific room number in one residency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: BookingRequestId,
    pub student_id: UserId,
    pub residency_id: ResidencyId,
    pub room_number: u32,
    pub profile: ApplicantProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRequest {
    /// Build the pending record admitted to the ledger for a fresh submission.
    pub fn admitted(
        id: BookingRequestId,
        student_id: UserId,
        submission: BookingSubmission,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            student_id,
            residency_id: submission.residency_id,
            room_number: submission.room_number,
            profile: submission.profile,
            notes: submission
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            status: BookingStatus::Pending,
            rejection_reason: None,
            payment: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == BookingStatus::Pending
    }
}

/// Inbound payload for a new booking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSubmission {
    pub residency_id: ResidencyId,
    pub room_number: u32,
    pub profile: ApplicantProfile,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Whitelisted fields a student may replace while the request is pending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingUpdate {
    #[serde(default)]
    pub room_number: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub profile: Option<ApplicantProfile>,
}

impl BookingUpdate {
    pub fn is_empty(&self) -> bool {
        self.room_number.is_none() && self.notes.is_none() && self.profile.is_none()
    }
}
