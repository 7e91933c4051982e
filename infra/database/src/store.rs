use crate::document::{Document, DocumentRef, Fields, Filter};
use crate::error::DatabaseError;
use std::future::Future;

/// `limit` value for queries that return every match.
pub const UNLIMITED: usize = usize::MAX;

/// Reads and buffered writes inside one transaction attempt.
///
/// Reads observe the transaction's own buffered writes. Nothing becomes
/// visible to other readers until the attempt commits.
pub trait Transaction {
    /// Reads a document, recording its version for commit-time validation.
    fn get(&mut self, reference: &DocumentRef) -> Result<Option<Document>, DatabaseError>;

    /// Buffers a partial update. Fails with [`DatabaseError::NotFound`] when the
    /// document does not exist.
    fn update(&mut self, reference: &DocumentRef, fields: Fields) -> Result<(), DatabaseError>;
}

/// Contract of the document store used by the registration engine.
pub trait DocumentStore: Send + Sync {
    fn get(
        &self,
        reference: &DocumentRef,
    ) -> impl Future<Output = Result<Option<Document>, DatabaseError>> + Send;

    /// Documents of `collection` matching `filter`, ordered by key, at most `limit`.
    fn query(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Document>, DatabaseError>> + Send;

    /// Creates or replaces a document.
    fn set(
        &self,
        reference: &DocumentRef,
        fields: Fields,
    ) -> impl Future<Output = Result<(), DatabaseError>> + Send;

    /// Merges `fields` into an existing document.
    fn update(
        &self,
        reference: &DocumentRef,
        fields: Fields,
    ) -> impl Future<Output = Result<(), DatabaseError>> + Send;

    /// Removes a document, reporting whether it existed.
    fn delete(&self, reference: &DocumentRef)
    -> impl Future<Output = Result<bool, DatabaseError>> + Send;

    /// Runs `body` atomically with retry on conflict.
    ///
    /// `body` may run several times and must not have side effects outside the
    /// transaction. An error from `body` aborts without writing anything.
    fn transaction<T, E, F>(&self, body: F) -> impl Future<Output = Result<T, E>> + Send
    where
        T: Send,
        E: From<DatabaseError> + Send,
        F: FnMut(&mut dyn Transaction) -> Result<T, E> + Send;
}
