use crate::conflict::ConflictDetail;
use campus_database::DatabaseError;
use std::borrow::Cow;

/// A specialized [`EnrollmentError`] enum of this crate.
#[campus_derive::campus_error]
pub enum EnrollmentError {
    /// No student record matches the identifier by key, `uid` or `username`.
    #[error("No student matches identifier '{identifier}'")]
    IdentityNotFound { identifier: String },

    #[error("Section '{section_id}' not found")]
    SectionNotFound { section_id: String },

    /// The section is offered in a different term than the request names.
    #[error("Section '{section}' belongs to term '{actual}', not '{expected}'")]
    TermMismatch { section: String, expected: String, actual: String },

    /// The section overlaps one the student already holds in the same term.
    #[error("Schedule conflict with {conflict}")]
    ScheduleConflict { conflict: Box<ConflictDetail> },

    #[error("Section '{section_id}' is full ({capacity} seats)")]
    CapacityExceeded { section_id: String, capacity: u64 },

    /// Store failure, including exhausted transaction retries.
    #[error("Database error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    /// Malformed records and other unexpected states.
    #[error("Internal enrollment error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl EnrollmentError {
    /// True for rejections caused by the request rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::IdentityNotFound { .. }
                | Self::SectionNotFound { .. }
                | Self::TermMismatch { .. }
                | Self::ScheduleConflict { .. }
                | Self::CapacityExceeded { .. }
        )
    }
}
