//! Document store layout.
//!
//! Field names are the camelCase keys written by earlier registration paths;
//! they must stay stable for existing records to decode.

/// Collection holding class sections.
pub const SECTIONS: &str = "classes";
/// Collection holding user (student) records.
pub const STUDENTS: &str = "users";

/// Seat capacity assumed when a section does not declare one.
pub const DEFAULT_CAPACITY: u64 = 50;

/// Separator of the combined `days | periods | room | date-range` schedule string.
pub const SCHEDULE_DELIMITER: char = '|';

/// Field names of a class section document.
pub mod section {
    pub const CLASS_ID: &str = "classId";
    pub const NAME: &str = "name";
    pub const TEACHER: &str = "teacher";
    pub const SCHEDULE: &str = "schedule";
    pub const DAY_OF_WEEK: &str = "dayOfWeek";
    pub const PERIODS: &str = "periods";
    pub const DATE_RANGE: &str = "dateRange";
    pub const ROOM: &str = "room";
    pub const MAX_SLOTS: &str = "maxSlots";
    pub const CURRENT_SLOTS: &str = "currentSlots";
    pub const SEMESTER: &str = "semester";
    /// RFC 3339 timestamp of the last save.
    pub const CREATED_AT: &str = "createdAt";
}

/// Field names of a student document.
pub mod student {
    pub const UID: &str = "uid";
    pub const USERNAME: &str = "username";
    pub const REGISTERED_CLASS_IDS: &str = "registeredClassIds";
    /// Single-section field from before multi-section registration.
    pub const LEGACY_CLASS_ID: &str = "classId";
    pub const CURRENT_SEMESTER: &str = "currentSemester";
    pub const ROLE: &str = "role";
    /// `role` of a student account; records without a role count as students.
    pub const STUDENT_ROLE: &str = "student";
}
