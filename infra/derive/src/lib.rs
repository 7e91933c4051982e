#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the campus workspace.
//!
//! * [`campus_error`] turns a plain enum into a context-aware error type.
//! * [`campus_slice`] turns a state struct into a shareable feature slice handle.
//!
//! Examples are `ignore`d here because the expansions reference crates
//! (`thiserror`, `campus-domain`) that the consuming crate must depend on.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemStruct, parse_macro_input};

/// Attribute macro for defining a crate's error enum.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * `<Name>Ext<T>` trait with `.context(...)` for `Result<T, Name>` and for
///   `Result<T, Source>` of every variant carrying a `source` field.
/// * `From<Source>` for every such variant (so `?` works on upstream errors).
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * `Name::kind()`, a `&'static str` naming the active variant for structured logs.
/// * A module-private `format_context` helper for `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. Applied to an **enum** with **named** fields only.
/// 2. A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// 3. Variants with a source must also carry `context`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[campus_derive::campus_error]
/// pub enum StoreError {
///     #[error("Decode error{}: {source}", format_context(.context))]
///     Decode { source: serde_json::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal store error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn load(raw: &str) -> Result<serde_json::Value, StoreError> {
///     serde_json::from_str(raw).context("Decoding fixture")
/// }
/// ```
#[proc_macro_attribute]
pub fn campus_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}

/// Attribute macro to define a feature slice handle.
///
/// The annotated struct becomes `<Name>Inner`; `<Name>` is generated as a cheap
/// `Arc` wrapper that derefs to it and implements
/// `campus_domain::registry::FeatureSlice`.
///
/// # Example
/// ```rust,ignore
/// #[campus_derive::campus_slice]
/// pub struct Enrollment {
///     pub coordinator: EnrollmentCoordinator<Database>,
/// }
///
/// let slice = Enrollment::new(EnrollmentInner { coordinator });
/// ```
#[proc_macro_attribute]
pub fn campus_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::slice::expand(input).into()
}
