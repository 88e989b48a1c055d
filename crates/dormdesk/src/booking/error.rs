use super::domain::{BookingStatus, ResidencyId};

/// Domain error taxonomy for the booking lifecycle. The HTTP mapping lives
/// next to the router so the domain stays transport-free.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("cannot {action} a booking request in status '{from}'")]
    InvalidTransition {
        from: BookingStatus,
        action: &'static str,
    },

    #[error("missing or malformed caller identity: {0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("an active booking request already exists for residency {residency}")]
    DuplicateActive { residency: ResidencyId },

    #[error("room {room_number} in residency {residency} is already booked")]
    RoomConflict {
        residency: ResidencyId,
        room_number: u32,
    },

    #[error("allocation ledger unavailable: {0}")]
    Unavailable(String),
}

impl BookingError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Conflicts (lost races, duplicate active requests) surface as 409.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BookingError::DuplicateActive { .. } | BookingError::RoomConflict { .. }
        )
    }
}
