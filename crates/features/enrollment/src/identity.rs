use crate::error::EnrollmentError;
use campus_database::{Document, DocumentRef, DocumentStore, Filter};
use campus_domain::constants::{STUDENTS, student};
use tracing::{debug, info, instrument};

/// Maps a caller-supplied student identifier to one stored record.
///
/// Lookup order: document key, then the `uid` field, then the lowercased
/// `username` field. The first hit wins; duplicates are not detected.
#[derive(Debug, Clone)]
pub struct IdentityResolver<S> {
    store: S,
    collection: String,
}

impl<S: DocumentStore> IdentityResolver<S> {
    /// Resolver over the student collection.
    pub fn new(store: S) -> Self {
        Self::with_collection(store, STUDENTS)
    }

    pub fn with_collection(store: S, collection: impl Into<String>) -> Self {
        Self { store, collection: collection.into() }
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn resolve(&self, identifier: &str) -> Result<Document, EnrollmentError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(EnrollmentError::IdentityNotFound { identifier: String::new() });
        }

        if let Some(doc) = self.store.get(&DocumentRef::new(&self.collection, identifier)).await? {
            return Ok(doc);
        }

        debug!("No document keyed by identifier, trying uid");
        if let Some(doc) = self.first_match(student::UID, identifier).await? {
            info!(resolved = %doc.reference(), "Identity resolved by uid");
            return Ok(doc);
        }

        debug!("No uid match, trying username");
        if let Some(doc) = self.first_match(student::USERNAME, &identifier.to_lowercase()).await? {
            info!(resolved = %doc.reference(), "Identity resolved by username");
            return Ok(doc);
        }

        Err(EnrollmentError::IdentityNotFound { identifier: identifier.to_owned() })
    }

    async fn first_match(&self, field: &str, value: &str) -> Result<Option<Document>, EnrollmentError> {
        let docs = self.store.query(&self.collection, &Filter::eq(field, value), 1).await?;
        Ok(docs.into_iter().next())
    }
}
