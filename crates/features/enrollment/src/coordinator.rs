use crate::conflict::{ConflictDetail, overlap};
use crate::error::EnrollmentError;
use crate::identity::IdentityResolver;
use crate::model::{ClassSection, Outcome, RegistrationRequest, StudentRecord, decode};
use crate::schedule::{ParsedSchedule, ScheduleText};
use campus_database::{DocumentRef, DocumentStore, Fields, Transaction};
use campus_domain::config::DanglingPolicy;
use campus_domain::constants::SECTIONS;
use campus_domain::constants::section::CURRENT_SLOTS;
use campus_domain::constants::student::{CURRENT_SEMESTER, LEGACY_CLASS_ID, REGISTERED_CLASS_IDS};
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Documents touched by one request, resolved before the transaction starts.
#[derive(Debug)]
struct Target<'a> {
    request: &'a RegistrationRequest,
    section_id: &'a str,
    student: &'a DocumentRef,
    section: &'a DocumentRef,
}

/// Runs register and unregister requests as single store transactions.
///
/// Within one transaction the coordinator re-reads the student and the
/// section, checks the term, scans the student's sections of that term for
/// schedule overlap, enforces capacity, and writes the seat counter and the
/// registered-section set together. A rejected request writes nothing.
#[derive(Debug, Clone)]
pub struct EnrollmentCoordinator<S> {
    store: S,
    resolver: IdentityResolver<S>,
    dangling: DanglingPolicy,
}

impl<S: DocumentStore + Clone> EnrollmentCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self {
            resolver: IdentityResolver::new(store.clone()),
            store,
            dangling: DanglingPolicy::default(),
        }
    }

    /// Sets the handling of registered ids whose section no longer exists.
    #[must_use]
    pub fn with_dangling_policy(mut self, policy: DanglingPolicy) -> Self {
        self.dangling = policy;
        self
    }

    #[must_use]
    pub const fn dangling_policy(&self) -> DanglingPolicy {
        self.dangling
    }

    pub async fn register_or_unregister(
        &self,
        student_id: &str,
        section_id: &str,
        term: &str,
        is_register: bool,
    ) -> Result<Outcome, EnrollmentError> {
        let request = RegistrationRequest {
            student_id: student_id.to_owned(),
            section_id: section_id.to_owned(),
            term: term.to_owned(),
            register: is_register,
        };
        self.apply(&request).await
    }

    #[instrument(
        skip_all,
        fields(
            student = %request.student_id,
            section = %request.section_id,
            term = %request.term,
            register = request.register,
        )
    )]
    pub async fn apply(&self, request: &RegistrationRequest) -> Result<Outcome, EnrollmentError> {
        let student = self.resolver.resolve(&request.student_id).await?;
        let section_id = request.section_id.trim();
        if section_id.is_empty() {
            return Err(EnrollmentError::SectionNotFound { section_id: String::new() });
        }

        let section_ref = DocumentRef::new(SECTIONS, section_id);
        let target =
            Target { request, section_id, student: student.reference(), section: &section_ref };

        let outcome = self
            .store
            .transaction(|tx: &mut dyn Transaction| self.attempt(tx, &target))
            .await
            .inspect_err(|err| {
                if err.is_client_error() {
                    info!(kind = err.kind(), %err, "Registration rejected");
                } else {
                    warn!(kind = err.kind(), %err, "Registration failed");
                }
            })?;

        info!(?outcome, student_doc = %student.reference(), "Registration applied");
        Ok(outcome)
    }

    fn attempt(&self, tx: &mut dyn Transaction, target: &Target<'_>) -> Result<Outcome, EnrollmentError> {
        let Some(student_doc) = tx.get(target.student)? else {
            return Err(EnrollmentError::IdentityNotFound {
                identifier: target.request.student_id.trim().to_owned(),
            });
        };
        let Some(section_doc) = tx.get(target.section)? else {
            return Err(EnrollmentError::SectionNotFound { section_id: target.section_id.to_owned() });
        };

        let section: ClassSection = decode(&section_doc)?;
        if section.term() != Some(target.request.term.as_str()) {
            return Err(EnrollmentError::TermMismatch {
                section: target.section_id.to_owned(),
                expected: target.request.term.clone(),
                actual: section.term().unwrap_or_default().to_owned(),
            });
        }

        let student: StudentRecord = decode(&student_doc)?;
        if target.request.register {
            self.register(tx, target, &section, &student)
        } else {
            Self::unregister(tx, target, &section, &student)
        }
    }

    fn register(
        &self,
        tx: &mut dyn Transaction,
        target: &Target<'_>,
        section: &ClassSection,
        student: &StudentRecord,
    ) -> Result<Outcome, EnrollmentError> {
        if student.holds(target.section_id) {
            return Ok(Outcome::AlreadyRegistered);
        }

        let term = target.request.term.as_str();
        let wanted = ParsedSchedule::parse(section);
        let mut registered = student.registered_ids();
        let mut dangling = Vec::new();

        for held_id in registered.iter().map(|id| id.trim()) {
            if held_id.is_empty() || held_id == target.section_id {
                continue;
            }
            let Some(doc) = tx.get(&DocumentRef::new(SECTIONS, held_id))? else {
                warn!(section = held_id, policy = ?self.dangling, "Registered section no longer exists");
                dangling.push(held_id.to_owned());
                continue;
            };
            let held: ClassSection = decode(&doc)?;
            if held.term() != Some(term) {
                continue;
            }
            if let Some(found) = overlap(&wanted, &ParsedSchedule::parse(&held)) {
                let dates = ScheduleText::of(&held).dates;
                return Err(EnrollmentError::ScheduleConflict {
                    conflict: Box::new(ConflictDetail {
                        section_id: held_id.to_owned(),
                        name: held.display_name(held_id).to_owned(),
                        days: found.days,
                        periods: found.periods,
                        date_range: (!dates.trim().is_empty()).then_some(dates),
                    }),
                });
            }
        }

        let capacity = section.capacity()?;
        let enrolled = section.enrolled()?;
        if enrolled >= capacity {
            return Err(EnrollmentError::CapacityExceeded {
                section_id: target.section_id.to_owned(),
                capacity,
            });
        }

        if self.dangling == DanglingPolicy::Prune && !dangling.is_empty() {
            registered.retain(|id| !dangling.iter().any(|gone| gone == id.trim()));
            info!(pruned = ?dangling, "Dropped dangling section ids");
        }
        registered.push(target.section_id.to_owned());

        tx.update(target.section, patch([(CURRENT_SLOTS, Value::from(enrolled + 1))]))?;
        tx.update(
            target.student,
            patch([
                (REGISTERED_CLASS_IDS, Value::from(registered)),
                (LEGACY_CLASS_ID, Value::from(target.section_id)),
                (CURRENT_SEMESTER, Value::from(term)),
            ]),
        )?;
        Ok(Outcome::Registered)
    }

    fn unregister(
        tx: &mut dyn Transaction,
        target: &Target<'_>,
        section: &ClassSection,
        student: &StudentRecord,
    ) -> Result<Outcome, EnrollmentError> {
        let mut registered = student.registered_ids();
        let before = registered.len();
        registered.retain(|id| id.trim() != target.section_id);
        if registered.len() == before {
            return Ok(Outcome::NotRegistered);
        }

        let enrolled = section.enrolled()?;
        tx.update(
            target.section,
            patch([(CURRENT_SLOTS, Value::from(enrolled.saturating_sub(1)))]),
        )?;
        tx.update(target.student, patch([(REGISTERED_CLASS_IDS, Value::from(registered))]))?;
        Ok(Outcome::Unregistered)
    }
}

fn patch<const N: usize>(entries: [(&str, Value); N]) -> Fields {
    entries.into_iter().map(|(name, value)| (name.to_owned(), value)).collect()
}
