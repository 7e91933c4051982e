//! Class registration feature slice.
//!
//! Students enroll into capacity-limited class sections. Every register or
//! unregister call runs as one store transaction that checks the term, scans
//! the student's sections of that term for schedule overlap, enforces the
//! seat limit, and updates the section counter and the student's registered
//! set together.

mod catalog;
mod conflict;
mod coordinator;
mod error;
mod identity;
mod model;
pub mod schedule;

pub use crate::catalog::SectionCatalog;
pub use crate::conflict::{ConflictDetail, Overlap, conflicts, overlap};
pub use crate::coordinator::EnrollmentCoordinator;
pub use crate::error::{EnrollmentError, EnrollmentErrorExt};
pub use crate::identity::IdentityResolver;
pub use crate::model::{
    ClassSection, LooseCount, LooseText, Outcome, RegistrationRequest, RosterEntry, StudentRecord,
};
pub use crate::schedule::{DateRange, ParsedSchedule};

use campus_database::Database;
use campus_domain::config::AppConfig;
use campus_domain::registry::InitializedSlice;

/// Enrollment feature state
#[campus_derive::campus_slice]
pub struct Enrollment {
    pub coordinator: EnrollmentCoordinator<Database>,
    pub catalog: SectionCatalog<Database>,
}

/// Initialize the enrollment feature over an injected store handle.
pub fn init(config: &AppConfig, database: &Database) -> InitializedSlice {
    let policy = config.registration.dangling_policy;
    tracing::info!(dangling_policy = ?policy, "Enrollment slice initialized");

    let slice = Enrollment::new(EnrollmentInner {
        coordinator: EnrollmentCoordinator::new(database.clone()).with_dangling_policy(policy),
        catalog: SectionCatalog::new(database.clone()),
    });

    InitializedSlice::new(slice)
}
