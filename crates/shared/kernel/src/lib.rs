//! Kernel utilities shared across slices.
//! Keep this crate lightweight: it re-exports the domain and owns configuration loading.
//!
//! ## Config loading
//! ```rust,no_run
//! use campus_kernel::config::load_config;
//! use campus_kernel::domain::config::AppConfig;
//!
//! let cfg: AppConfig = load_config(Some("campus.toml")).unwrap_or_default();
//! assert!(cfg.database.max_attempts >= 1);
//! ```
pub mod config;

pub use campus_domain as domain;
