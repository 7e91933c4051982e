use crate::document::{Document, DocumentRef, Fields, Filter, merge};
use crate::error::DatabaseError;
use crate::store::Transaction;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct Versioned {
    version: u64,
    fields: Fields,
}

type Collection = BTreeMap<String, Versioned>;

/// Versioned in-memory collections. Every write stamps a fresh version from a
/// store-wide clock, so a deleted and recreated document never reuses one.
#[derive(Debug, Default)]
pub(crate) struct Engine {
    collections: RwLock<FxHashMap<String, Collection>>,
    clock: AtomicU64,
}

impl Engine {
    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn read(&self, reference: &DocumentRef) -> Option<(u64, Fields)> {
        let collections = self.collections.read();
        collections
            .get(reference.collection())
            .and_then(|docs| docs.get(reference.key()))
            .map(|doc| (doc.version, doc.fields.clone()))
    }

    pub(crate) fn get(&self, reference: &DocumentRef) -> Option<Document> {
        self.read(reference).map(|(_, fields)| Document::new(reference.clone(), fields))
    }

    pub(crate) fn query(&self, collection: &str, filter: &Filter, limit: usize) -> Vec<Document> {
        let collections = self.collections.read();
        let Some(docs) = collections.get(collection) else {
            return Vec::new();
        };
        docs.iter()
            .filter(|(_, doc)| filter.matches(&doc.fields))
            .take(limit)
            .map(|(key, doc)| {
                Document::new(DocumentRef::new(collection, key.clone()), doc.fields.clone())
            })
            .collect()
    }

    pub(crate) fn set(&self, reference: &DocumentRef, fields: Fields) {
        let version = self.tick();
        self.collections
            .write()
            .entry(reference.collection().to_owned())
            .or_default()
            .insert(reference.key().to_owned(), Versioned { version, fields });
    }

    pub(crate) fn update(&self, reference: &DocumentRef, fields: Fields) -> Result<(), DatabaseError> {
        let mut collections = self.collections.write();
        let doc = lookup_mut(&mut collections, reference)?;
        merge(&mut doc.fields, fields);
        doc.version = self.tick();
        Ok(())
    }

    pub(crate) fn delete(&self, reference: &DocumentRef) -> bool {
        let mut collections = self.collections.write();
        collections
            .get_mut(reference.collection())
            .is_some_and(|docs| docs.remove(reference.key()).is_some())
    }

    fn version_of(collections: &FxHashMap<String, Collection>, reference: &DocumentRef) -> Option<u64> {
        collections
            .get(reference.collection())
            .and_then(|docs| docs.get(reference.key()))
            .map(|doc| doc.version)
    }
}

fn lookup_mut<'a>(
    collections: &'a mut FxHashMap<String, Collection>,
    reference: &DocumentRef,
) -> Result<&'a mut Versioned, DatabaseError> {
    collections.get_mut(reference.collection()).and_then(|docs| docs.get_mut(reference.key())).ok_or_else(
        || DatabaseError::NotFound { message: reference.to_string().into(), context: None },
    )
}

/// Snapshot of a document as first seen by a transaction attempt.
#[derive(Debug)]
struct ReadEntry {
    version: Option<u64>,
    fields: Option<Fields>,
}

/// One optimistic attempt: a read set pinned at first read and an ordered
/// write buffer applied at commit.
#[derive(Debug)]
pub(crate) struct MemoryTransaction<'a> {
    engine: &'a Engine,
    reads: FxHashMap<DocumentRef, ReadEntry>,
    writes: Vec<(DocumentRef, Fields)>,
}

impl<'a> MemoryTransaction<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        Self { engine, reads: FxHashMap::default(), writes: Vec::new() }
    }

    fn pin(&mut self, reference: &DocumentRef) -> &ReadEntry {
        match self.reads.entry(reference.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let current = self.engine.read(reference);
                entry.insert(ReadEntry {
                    version: current.as_ref().map(|(version, _)| *version),
                    fields: current.map(|(_, fields)| fields),
                })
            },
        }
    }

    /// True when any document read by this attempt has changed since.
    pub(crate) fn is_stale(&self) -> bool {
        let collections = self.engine.collections.read();
        self.stale_in(&collections)
    }

    fn stale_in(&self, collections: &FxHashMap<String, Collection>) -> bool {
        self.reads
            .iter()
            .any(|(reference, entry)| Engine::version_of(collections, reference) != entry.version)
    }

    /// Validates the read set and applies the write buffer under one write lock.
    pub(crate) fn commit(self) -> Result<usize, DatabaseError> {
        if self.writes.is_empty() {
            return Ok(0);
        }

        let mut collections = self.engine.collections.write();
        if self.stale_in(&collections) {
            return Err(DatabaseError::Contention {
                message: "read set changed before commit".into(),
                context: None,
            });
        }

        let applied = self.writes.len();
        for (reference, patch) in self.writes {
            let doc = lookup_mut(&mut collections, &reference)?;
            merge(&mut doc.fields, patch);
            doc.version = self.engine.tick();
        }
        Ok(applied)
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn get(&mut self, reference: &DocumentRef) -> Result<Option<Document>, DatabaseError> {
        let Some(mut fields) = self.pin(reference).fields.clone() else {
            return Ok(None);
        };
        for (target, patch) in &self.writes {
            if target == reference {
                merge(&mut fields, patch.clone());
            }
        }
        Ok(Some(Document::new(reference.clone(), fields)))
    }

    fn update(&mut self, reference: &DocumentRef, fields: Fields) -> Result<(), DatabaseError> {
        if self.pin(reference).version.is_none() {
            return Err(DatabaseError::NotFound {
                message: reference.to_string().into(),
                context: Some("Transactional update".into()),
            });
        }
        self.writes.push((reference.clone(), fields));
        Ok(())
    }
}
