//! # Database Infrastructure
//!
//! This crate provides the document store shared across the workspace: named
//! collections of JSON field maps keyed by document id, with optimistic
//! multi-document transactions.
//!
//! ## Key Features
//! - **Store Contract**: [`DocumentStore`] is the seam every feature slice codes against.
//! - **Optimistic Transactions**: Reads are versioned and validated at commit; a lost
//!   race re-runs the transaction body after an exponential backoff.
//! - **Builder Pattern**: Fluent API for tuning the retry budget.
//!
//! ## Example
//!
//! ```rust
//! use campus_database::{Database, DatabaseError, DocumentRef, DocumentStore, Fields};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DatabaseError> {
//!     let db = Database::builder().name("campus").max_attempts(5).init()?;
//!
//!     let doc = DocumentRef::new("classes", "CS101");
//!     db.set(&doc, Fields::new()).await?;
//!     assert!(db.get(&doc).await?.is_some());
//!
//!     Ok(())
//! }
//! ```

mod document;
mod error;
mod memory;
mod store;

pub use document::{Document, DocumentRef, Fields, Filter};
pub use error::{DatabaseError, DatabaseErrorExt};
pub use store::{DocumentStore, Transaction, UNLIMITED};

use campus_domain::config::DatabaseConfig;
use memory::{Engine, MemoryTransaction};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const DEFAULT_NAME: &str = "campus";

/// Inner state of the [`Database`] wrapper.
#[derive(Debug)]
pub struct DatabaseInner {
    engine: Engine,
    name: String,
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        info!(name = %self.name, "Document store handle dropped");
    }
}

/// Shared handle to an in-process document store.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Creates a new [`DatabaseBuilder`].
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

/// Outcome of a single transaction attempt.
enum Attempt<T, E> {
    Done(Result<T, E>),
    Retry,
}

impl Database {
    fn attempt<T, E, F>(&self, body: &mut F) -> Attempt<T, E>
    where
        E: From<DatabaseError>,
        F: FnMut(&mut dyn Transaction) -> Result<T, E>,
    {
        let mut tx = MemoryTransaction::new(&self.inner.engine);
        let result = {
            let scope: &mut dyn Transaction = &mut tx;
            body(scope)
        };

        match result {
            // A rejection computed from reads that have since changed is re-evaluated.
            Err(_) if tx.is_stale() => Attempt::Retry,
            Err(err) => Attempt::Done(Err(err)),
            Ok(value) => match tx.commit() {
                Ok(writes) => {
                    debug!(writes, "Transaction committed");
                    Attempt::Done(Ok(value))
                },
                Err(DatabaseError::Contention { .. }) => Attempt::Retry,
                Err(err) => Attempt::Done(Err(err.into())),
            },
        }
    }
}

impl DocumentStore for Database {
    async fn get(&self, reference: &DocumentRef) -> Result<Option<Document>, DatabaseError> {
        Ok(self.inner.engine.get(reference))
    }

    async fn query(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Document>, DatabaseError> {
        Ok(self.inner.engine.query(collection, filter, limit))
    }

    async fn set(&self, reference: &DocumentRef, fields: Fields) -> Result<(), DatabaseError> {
        self.inner.engine.set(reference, fields);
        Ok(())
    }

    async fn update(&self, reference: &DocumentRef, fields: Fields) -> Result<(), DatabaseError> {
        self.inner.engine.update(reference, fields)
    }

    async fn delete(&self, reference: &DocumentRef) -> Result<bool, DatabaseError> {
        Ok(self.inner.engine.delete(reference))
    }

    #[instrument(skip_all, fields(store = %self.inner.name))]
    async fn transaction<T, E, F>(&self, mut body: F) -> Result<T, E>
    where
        T: Send,
        E: From<DatabaseError> + Send,
        F: FnMut(&mut dyn Transaction) -> Result<T, E> + Send,
    {
        let max_attempts = self.inner.max_attempts;
        let mut delay = self.inner.initial_backoff;
        for attempt in 1..=max_attempts {
            match self.attempt(&mut body) {
                Attempt::Done(result) => return result,
                Attempt::Retry if attempt == max_attempts => break,
                Attempt::Retry => {
                    warn!(attempt, ?delay, "Transaction conflict, retrying...");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.inner.max_backoff);
                },
            }
        }

        Err(DatabaseError::Contention {
            message: format!("gave up after {max_attempts} attempts").into(),
            context: None,
        }
        .into())
    }
}

/// A fluent builder for configuring the document store.
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug)]
pub struct DatabaseBuilder {
    name: Option<String>,
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::from_config(&DatabaseConfig::default())
    }
}

impl DatabaseBuilder {
    /// Creates a new [`DatabaseBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the retry budget from the `[database]` config section.
    pub const fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            name: None,
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Sets the store name used in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets how many times a transaction body may run before contention is reported.
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the first backoff and its upper bound.
    pub const fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Validates the settings and creates an empty store.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] if `max_attempts` is zero or the initial
    ///   backoff exceeds its bound.
    #[instrument(skip(self), fields(name = self.name))]
    pub fn init(self) -> Result<Database, DatabaseError> {
        if self.max_attempts == 0 {
            return Err(DatabaseError::Validation {
                message: "max_attempts must be at least 1".into(),
                context: None,
            });
        }
        if self.initial_backoff > self.max_backoff {
            return Err(DatabaseError::Validation {
                message: "initial backoff exceeds max backoff".into(),
                context: Some(format!("{:?} > {:?}", self.initial_backoff, self.max_backoff).into()),
            });
        }

        let name = self.name.unwrap_or_else(|| DEFAULT_NAME.to_owned());
        info!(%name, max_attempts = self.max_attempts, "Document store initialized");

        Ok(Database {
            inner: Arc::new(DatabaseInner {
                engine: Engine::default(),
                name,
                max_attempts: self.max_attempts,
                initial_backoff: self.initial_backoff,
                max_backoff: self.max_backoff,
            }),
        })
    }
}
