//! # Domain Models
//!
//! Pure data shared by every campus crate: configuration sections, the document
//! layout (collection and field names) and the feature slice registry.
//! Keep it lean: no I/O, networking, or heavy logic.

pub mod config;
pub mod constants;
pub mod registry;
