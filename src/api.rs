//! Public API surface for the faculty allocation backend.
//!
//! This file consolidates the identifier newtypes and DTO types shared by the
//! service layer, the repositories and the HTTP API. All types derive
//! Serialize/Deserialize for JSON serialization.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Teacher identifier (database primary key).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TeacherId(pub i64);

/// Subject identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub i64);

/// Class identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassId(pub i64);

/// Time slot identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlotId(pub i64);

/// Allocation identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocationId(pub i64);

impl TeacherId {
    pub fn new(value: i64) -> Self {
        TeacherId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl SubjectId {
    pub fn new(value: i64) -> Self {
        SubjectId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl ClassId {
    pub fn new(value: i64) -> Self {
        ClassId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TimeSlotId {
    pub fn new(value: i64) -> Self {
        TimeSlotId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl AllocationId {
    pub fn new(value: i64) -> Self {
        AllocationId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

// =============================================================================
// Teachers
// =============================================================================

/// Public teacher record. The stored password hash is never part of this type,
/// so it cannot leak through serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub teacher_id: TeacherId,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub expertise: Option<String>,
    pub max_load: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Teacher record together with its credential hash, used only by the login
/// flow. Not serializable.
#[derive(Debug, Clone)]
pub struct TeacherAccount {
    pub teacher: Teacher,
    pub password_hash: String,
}

/// Payload for inserting a teacher. The password is already hashed by the
/// service layer before this struct is built.
#[derive(Debug, Clone)]
pub struct NewTeacher {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: Option<String>,
    pub expertise: Option<String>,
    pub max_load: Option<i32>,
}

/// Registration payload carrying the plaintext password. Only the hash ever
/// reaches the store.
#[derive(Debug, Clone, Deserialize)]
pub struct TeacherRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: Option<String>,
    pub expertise: Option<String>,
    pub max_load: Option<i32>,
}

/// Full-record teacher update (PUT semantics: every field is written).
#[derive(Debug, Clone)]
pub struct TeacherUpdate {
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub expertise: Option<String>,
    pub max_load: Option<i32>,
}

// =============================================================================
// Subjects and classes
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: SubjectId,
    pub subject_code: String,
    pub subject_name: String,
    pub department: Option<String>,
    pub credits: Option<i32>,
}

/// Insert/update payload for a subject (PUT writes every field).
#[derive(Debug, Clone)]
pub struct SubjectInput {
    pub subject_code: String,
    pub subject_name: String,
    pub department: Option<String>,
    pub credits: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub class_id: ClassId,
    pub class_name: String,
    pub semester: i32,
    pub year: i32,
    pub department: Option<String>,
}

/// Insert/update payload for a class.
#[derive(Debug, Clone)]
pub struct ClassInput {
    pub class_name: String,
    pub semester: i32,
    pub year: i32,
    pub department: Option<String>,
}

// =============================================================================
// Time slots and allocations
// =============================================================================

/// Weekly time slot. `day_of_week` is 1–7 with Monday = 1, which makes the
/// day-of-week sort order of the allocation view natural.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub timeslot_id: TimeSlotId,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone)]
pub struct NewTimeSlot {
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Insert payload for an allocation record: a teacher teaches a subject to a
/// class in a slot during an academic year.
#[derive(Debug, Clone)]
pub struct NewAllocation {
    pub teacher_id: TeacherId,
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub timeslot_id: TimeSlotId,
    pub academic_year: String,
}

// =============================================================================
// Allocation view
// =============================================================================

/// One flat row of the allocation view left join, as returned by the store.
///
/// The join spans teachers → allocations → classes/subjects/time_slots; a
/// teacher with no allocations yields exactly one row whose joined columns are
/// all `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationViewRow {
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub email: String,
    pub department: Option<String>,
    pub class_name: Option<String>,
    pub subject_name: Option<String>,
    pub subject_code: Option<String>,
    pub day_of_week: Option<i16>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub academic_year: Option<String>,
}

impl AllocationViewRow {
    /// Allocation payload of this row, when the left join matched one.
    ///
    /// The joined class name is the discriminator: a row without it is the
    /// placeholder produced for a teacher with no allocations.
    pub fn detail(&self) -> Option<AllocationDetail> {
        self.class_name.as_ref()?;
        Some(AllocationDetail {
            class_name: self.class_name.clone()?,
            subject_name: self.subject_name.clone()?,
            subject_code: self.subject_code.clone()?,
            day_of_week: self.day_of_week?,
            start_time: self.start_time?,
            end_time: self.end_time?,
            academic_year: self.academic_year.clone()?,
        })
    }
}

/// One allocation entry inside a teacher's aggregated view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationDetail {
    pub class_name: String,
    pub subject_name: String,
    pub subject_code: String,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub academic_year: String,
}

/// Aggregated per-teacher allocation record: the nested shape served by
/// `GET /allocations/view`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherAllocationView {
    pub teacher_id: TeacherId,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub allocations: Vec<AllocationDetail>,
}

// =============================================================================
// Preferences
// =============================================================================

/// One entry of a teacher's stored preference list, joined with the subject
/// catalog. Served by `GET /preferences/{teacher_id}` ordered by rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub subject_code: String,
    pub rank: i32,
}

/// One entry of a submitted preference list. Rank 1 is the most preferred;
/// values are stored verbatim, never re-ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceInput {
    pub subject_id: SubjectId,
    pub rank: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_newtype_roundtrip() {
        let id = TeacherId::new(42);
        assert_eq!(id.value(), 42);
        // Newtype ids serialize as the bare integer, matching the wire format.
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }

    fn null_row(id: i64, name: &str) -> AllocationViewRow {
        AllocationViewRow {
            teacher_id: TeacherId::new(id),
            teacher_name: name.to_string(),
            email: format!("{name}@example.edu"),
            department: None,
            class_name: None,
            subject_name: None,
            subject_code: None,
            day_of_week: None,
            start_time: None,
            end_time: None,
            academic_year: None,
        }
    }

    #[test]
    fn test_detail_absent_without_class_name() {
        assert!(null_row(1, "ada").detail().is_none());
    }

    #[test]
    fn test_detail_present_with_joined_columns() {
        let mut row = null_row(1, "ada");
        row.class_name = Some("CS-3A".to_string());
        row.subject_name = Some("Compilers".to_string());
        row.subject_code = Some("CS301".to_string());
        row.day_of_week = Some(2);
        row.start_time = NaiveTime::from_hms_opt(9, 0, 0);
        row.end_time = NaiveTime::from_hms_opt(10, 30, 0);
        row.academic_year = Some("2024-2025".to_string());

        let detail = row.detail().expect("joined row must yield a detail");
        assert_eq!(detail.class_name, "CS-3A");
        assert_eq!(detail.day_of_week, 2);
        assert_eq!(detail.academic_year, "2024-2025");
    }
}
