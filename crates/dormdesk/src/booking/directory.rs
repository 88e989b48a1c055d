use serde::{Deserialize, Serialize};

use super::domain::{ResidencyId, UserId};
use super::error::BookingError;

/// Moderation state of a residency listing. Applications are only accepted
/// against approved residencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Read-only view of a residency as exposed by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidencySnapshot {
    pub id: ResidencyId,
    pub owner_id: UserId,
    pub total_room_count: u32,
    pub publication_status: PublicationStatus,
}

impl ResidencySnapshot {
    pub fn is_published(&self) -> bool {
        self.publication_status == PublicationStatus::Approved
    }
}

/// Display-only identity attributes resolved for listings. Never consulted
/// for allocation decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub name: String,
    pub email: String,
}

/// Lookup failures from the residency catalog.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("residency directory unavailable: {0}")]
    Unavailable(String),
}

impl From<DirectoryError> for BookingError {
    fn from(value: DirectoryError) -> Self {
        BookingError::Unavailable(value.to_string())
    }
}

/// Residency catalog collaborator, read-only from this crate's perspective.
pub trait ResidencyDirectory: Send + Sync {
    fn residency(&self, id: &ResidencyId) -> Result<Option<ResidencySnapshot>, DirectoryError>;
}

/// Identity collaborator used to enrich listings with applicant names.
pub trait IdentityDirectory: Send + Sync {
    fn identity(&self, id: &UserId) -> Option<StudentIdentity>;
}
