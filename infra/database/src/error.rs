use std::borrow::Cow;

/// A specialized [`DatabaseError`] enum of this crate.
#[campus_derive::campus_error]
pub enum DatabaseError {
    /// Invalid store configuration.
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// `update` targeted a document that does not exist.
    #[error("Document not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A transaction kept losing write races and ran out of attempts.
    #[error("Transaction contention{}: {message}", format_context(.context))]
    Contention { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A document could not be converted to or from its typed form.
    #[error("Serialization error{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal database error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
