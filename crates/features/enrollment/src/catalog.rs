use crate::error::EnrollmentError;
use crate::model::{ClassSection, RosterEntry, StudentRecord, decode};
use campus_database::{DatabaseError, Document, DocumentRef, DocumentStore, Filter, UNLIMITED};
use campus_domain::constants::{SECTIONS, STUDENTS, section, student};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Section management over the document store.
#[derive(Debug, Clone)]
pub struct SectionCatalog<S> {
    store: S,
}

impl<S: DocumentStore> SectionCatalog<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates the section or merges the given fields into the stored one and
    /// stamps `createdAt`. Unset fields of `data` leave stored values untouched.
    #[instrument(skip(self, data))]
    pub async fn save_section(&self, section_id: &str, data: &ClassSection) -> Result<(), EnrollmentError> {
        let section_id = section_id.trim();
        if section_id.is_empty() {
            return Err("section id is required".into());
        }

        let Value::Object(mut fields) = serde_json::to_value(data).map_err(DatabaseError::from)? else {
            return Err("section did not serialize to an object".into());
        };
        fields.insert(section::CLASS_ID.to_owned(), Value::from(section_id));
        fields.insert(
            section::CREATED_AT.to_owned(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );

        let reference = DocumentRef::new(SECTIONS, section_id);
        match self.store.update(&reference, fields.clone()).await {
            Err(DatabaseError::NotFound { .. }) => self.store.set(&reference, fields).await?,
            other => other?,
        }
        info!("Section saved");
        Ok(())
    }

    pub async fn section(&self, section_id: &str) -> Result<Option<ClassSection>, EnrollmentError> {
        let reference = DocumentRef::new(SECTIONS, section_id.trim());
        self.store.get(&reference).await?.as_ref().map(decode::<ClassSection>).transpose()
    }

    /// Sections offered in `term`, most recently saved first. Sections without a
    /// readable `createdAt` come last; ties keep id order.
    pub async fn sections_for_term(&self, term: &str) -> Result<Vec<(String, ClassSection)>, EnrollmentError> {
        let mut docs = self.store.query(SECTIONS, &Filter::eq(section::SEMESTER, term), UNLIMITED).await?;
        docs.sort_by_key(|doc| Reverse(saved_at(doc)));
        sections(&docs)
    }

    /// Sections taught by `teacher`, ordered by id.
    pub async fn sections_for_teacher(
        &self,
        teacher: &str,
    ) -> Result<Vec<(String, ClassSection)>, EnrollmentError> {
        self.sections_where(Filter::eq(section::TEACHER, teacher)).await
    }

    async fn sections_where(&self, filter: Filter) -> Result<Vec<(String, ClassSection)>, EnrollmentError> {
        sections(&self.store.query(SECTIONS, &filter, UNLIMITED).await?)
    }

    /// Student accounts holding the section, ordered by document key. Records
    /// without a registered-section list count through their legacy
    /// single-section field.
    #[instrument(skip(self))]
    pub async fn roster(&self, section_id: &str) -> Result<Vec<RosterEntry>, EnrollmentError> {
        let section_id = section_id.trim();
        let listed = self
            .store
            .query(STUDENTS, &Filter::contains(student::REGISTERED_CLASS_IDS, section_id), UNLIMITED)
            .await?;
        let legacy =
            self.store.query(STUDENTS, &Filter::eq(student::LEGACY_CLASS_ID, section_id), UNLIMITED).await?;

        let mut roster = BTreeMap::new();
        for doc in listed.iter().chain(&legacy) {
            let record: StudentRecord = decode(doc)?;
            if record.is_student() && record.holds(section_id) {
                roster.entry(doc.id().to_owned()).or_insert_with(|| RosterEntry {
                    id: doc.id().to_owned(),
                    uid: record.uid,
                    username: record.username,
                });
            }
        }
        Ok(roster.into_values().collect())
    }

    /// Removes the section. Student records keep the id; the coordinator's
    /// dangling-id policy decides what happens to it later.
    #[instrument(skip(self))]
    pub async fn delete_section(&self, section_id: &str) -> Result<bool, EnrollmentError> {
        let removed = self.store.delete(&DocumentRef::new(SECTIONS, section_id.trim())).await?;
        if removed {
            info!("Section deleted");
        }
        Ok(removed)
    }
}

fn sections(docs: &[Document]) -> Result<Vec<(String, ClassSection)>, EnrollmentError> {
    let mut sections = Vec::with_capacity(docs.len());
    for doc in docs {
        let section: ClassSection = decode(doc)?;
        sections.push((doc.id().to_owned(), section));
    }
    Ok(sections)
}

fn saved_at(doc: &Document) -> Option<DateTime<Utc>> {
    let stamp = doc.get(section::CREATED_AT)?.as_str()?;
    DateTime::parse_from_rfc3339(stamp).ok().map(|at| at.with_timezone(&Utc))
}
