use anyhow::Context;
use campus::database::{DatabaseError, DocumentRef, DocumentStore, Fields};
use campus::domain::constants::{SECTIONS, STUDENTS};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Seed documents keyed by id.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub classes: BTreeMap<String, Fields>,
    pub users: BTreeMap<String, Fields>,
}

impl Fixture {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Malformed fixture {}", path.display()))
    }

    /// Writes every document, replacing existing ones. Returns the document count.
    pub async fn apply(&self, store: &impl DocumentStore) -> Result<usize, DatabaseError> {
        let collections = [(SECTIONS, &self.classes), (STUDENTS, &self.users)];
        let mut written = 0;
        for (collection, docs) in collections {
            for (id, fields) in docs {
                store.set(&DocumentRef::new(collection, id.as_str()), fields.clone()).await?;
                written += 1;
            }
        }
        Ok(written)
    }
}
