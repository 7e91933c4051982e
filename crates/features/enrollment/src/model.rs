use crate::error::EnrollmentError;
use campus_database::Document;
use campus_domain::constants::DEFAULT_CAPACITY;
use campus_domain::constants::student::STUDENT_ROLE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed view of a stored record. Records that do not fit the type are
/// reported as internal errors rather than store failures.
pub(crate) fn decode<T: DeserializeOwned>(doc: &Document) -> Result<T, EnrollmentError> {
    doc.decode().map_err(|err| EnrollmentError::Internal {
        message: err.to_string().into(),
        context: Some("Malformed record".into()),
    })
}

/// A schedule field as stored by legacy writers: text, a number, or a list of either.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LooseText(Value);

impl LooseText {
    /// Flattens the stored value into text. Lists are joined with `", "`;
    /// anything else that is not text or a number renders empty.
    #[must_use]
    pub fn render(&self) -> String {
        render(&self.0)
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.render().trim().is_empty()
    }
}

impl From<&str> for LooseText {
    fn from(text: &str) -> Self {
        Self(Value::String(text.to_owned()))
    }
}

impl From<Value> for LooseText {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        Value::Null | Value::Bool(_) | Value::Object(_) => String::new(),
    }
}

/// A seat counter stored either as a number or as numeric text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LooseCount(Value);

impl LooseCount {
    /// `None` when the stored value is not a non-negative integer. Integral
    /// doubles such as `50.0` count; numeric text must be an integer literal.
    #[must_use]
    pub fn value(&self) -> Option<u64> {
        match &self.0 {
            Value::Number(number) => number.as_u64().or_else(|| number.as_f64().and_then(whole)),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole(number: f64) -> Option<u64> {
    const LIMIT: f64 = 18_446_744_073_709_551_616.0;
    (number.is_finite() && number >= 0.0 && number < LIMIT && number.fract() == 0.0)
        .then(|| number as u64)
}

impl From<u64> for LooseCount {
    fn from(count: u64) -> Self {
        Self(Value::from(count))
    }
}

/// A class section document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    /// Single delimited descriptor: `days | periods | room | date-range`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<LooseText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<LooseText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periods: Option<LooseText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<LooseText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<LooseText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_slots: Option<LooseCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_slots: Option<LooseCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
}

impl ClassSection {
    /// Seat limit, defaulting when the field is absent.
    pub fn capacity(&self) -> Result<u64, EnrollmentError> {
        count(self.max_slots.as_ref(), DEFAULT_CAPACITY, "maxSlots")
    }

    /// Current enrollment, zero when the field is absent.
    pub fn enrolled(&self) -> Result<u64, EnrollmentError> {
        count(self.current_slots.as_ref(), 0, "currentSlots")
    }

    /// The section's term; a section without one belongs to no term.
    #[must_use]
    pub fn term(&self) -> Option<&str> {
        self.semester.as_deref()
    }

    /// Display name, falling back to the section id.
    #[must_use]
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.name.as_deref().filter(|name| !name.is_empty()).unwrap_or(id)
    }
}

fn count(raw: Option<&LooseCount>, default: u64, field: &'static str) -> Result<u64, EnrollmentError> {
    raw.map_or(Ok(default), |raw| {
        raw.value().ok_or_else(|| EnrollmentError::Internal {
            message: format!("malformed {field}: {:?}", raw.0).into(),
            context: None,
        })
    })
}

/// A student document. Unknown fields are ignored and preserved on update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentRecord {
    pub uid: Option<String>,
    pub username: Option<String>,
    pub registered_class_ids: Value,
    /// Legacy single-section field.
    pub class_id: Value,
    pub current_semester: Option<String>,
    pub role: Option<String>,
}

impl StudentRecord {
    /// The registered-section set. Records predating the list fall back to the
    /// legacy single-section field.
    #[must_use]
    pub fn registered_ids(&self) -> Vec<String> {
        if let Value::Array(items) = &self.registered_class_ids {
            return items
                .iter()
                .map(render)
                .filter(|id| !id.is_empty())
                .collect();
        }
        let legacy = render(&self.class_id);
        if legacy.is_empty() { Vec::new() } else { vec![legacy] }
    }

    /// Whether the record is a student account.
    #[must_use]
    pub fn is_student(&self) -> bool {
        self.role.as_deref().is_none_or(|role| role == STUDENT_ROLE)
    }

    /// Whether the registered-section set holds `section_id`.
    #[must_use]
    pub fn holds(&self, section_id: &str) -> bool {
        self.registered_ids().iter().any(|id| id.trim() == section_id)
    }
}

/// One register or unregister call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Document key, external `uid` or username.
    #[serde(rename = "userId")]
    pub student_id: String,
    #[serde(rename = "classId")]
    pub section_id: String,
    #[serde(rename = "semester")]
    pub term: String,
    #[serde(rename = "isRegister")]
    pub register: bool,
}

impl RegistrationRequest {
    pub fn register(
        student_id: impl Into<String>,
        section_id: impl Into<String>,
        term: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            section_id: section_id.into(),
            term: term.into(),
            register: true,
        }
    }

    pub fn unregister(
        student_id: impl Into<String>,
        section_id: impl Into<String>,
        term: impl Into<String>,
    ) -> Self {
        Self { register: false, ..Self::register(student_id, section_id, term) }
    }
}

/// Successful result of a registration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Registered,
    /// The student already held the section; nothing changed.
    AlreadyRegistered,
    Unregistered,
    /// The student did not hold the section; nothing changed.
    NotRegistered,
}

impl Outcome {
    /// Whether the request committed a change.
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Registered | Self::Unregistered)
    }
}

/// A student holding a section, as listed by [`crate::SectionCatalog::roster`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: String,
    pub uid: Option<String>,
    pub username: Option<String>,
}
