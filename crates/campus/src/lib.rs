//! Facade crate for the campus registration platform.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Add `campus` with the desired feature slices (`enrollment` is on by default).
//! - Build a [`database::Database`], then call [`init`] to register feature slices.

pub use campus_database as database;
pub use campus_domain as domain;
pub use campus_kernel as kernel;

use campus_database::Database;
use campus_domain::config::AppConfig;
use campus_domain::registry::InitializedSlice;

/// Feature registry for runtime introspection.
pub mod features {
    #[cfg(feature = "enrollment")]
    pub use campus_enrollment as enrollment;

    /// Build-time enabled features (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "enrollment")]
        "enrollment",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Initialize all enabled feature slices over one injected store handle.
#[must_use]
pub fn init(config: &AppConfig, database: &Database) -> Vec<InitializedSlice> {
    let mut slices = Vec::new();

    // Enrollment
    #[cfg(feature = "enrollment")]
    slices.push(features::enrollment::init(config, database));

    #[cfg(not(feature = "enrollment"))]
    let _ = (config, database);

    slices
}
