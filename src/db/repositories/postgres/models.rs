use chrono::{DateTime, NaiveTime, Utc};
use diesel::prelude::*;

use super::schema::{allocations, classes, subjects, teacher_preferences, teachers, time_slots};
use crate::api;
use crate::api::{AllocationViewRow, ClassId, SubjectId, TeacherId, TimeSlotId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = teachers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeacherRow {
    pub teacher_id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: Option<String>,
    pub expertise: Option<String>,
    pub max_load: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl TeacherRow {
    pub fn into_public(self) -> api::Teacher {
        api::Teacher {
            teacher_id: TeacherId::new(self.teacher_id),
            name: self.name,
            email: self.email,
            department: self.department,
            expertise: self.expertise,
            max_load: self.max_load,
            created_at: self.created_at,
        }
    }

    pub fn into_account(self) -> api::TeacherAccount {
        let password_hash = self.password_hash.clone();
        api::TeacherAccount {
            teacher: self.into_public(),
            password_hash,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = teachers)]
pub struct NewTeacherRow {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: Option<String>,
    pub expertise: Option<String>,
    pub max_load: Option<i32>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = teachers)]
#[diesel(treat_none_as_null = true)]
pub struct TeacherChangeset {
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub expertise: Option<String>,
    pub max_load: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subjects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubjectRow {
    pub subject_id: i64,
    pub subject_code: String,
    pub subject_name: String,
    pub department: Option<String>,
    pub credits: Option<i32>,
}

impl SubjectRow {
    pub fn into_public(self) -> api::Subject {
        api::Subject {
            subject_id: SubjectId::new(self.subject_id),
            subject_code: self.subject_code,
            subject_name: self.subject_name,
            department: self.department,
            credits: self.credits,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subjects)]
pub struct NewSubjectRow {
    pub subject_code: String,
    pub subject_name: String,
    pub department: Option<String>,
    pub credits: Option<i32>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = subjects)]
#[diesel(treat_none_as_null = true)]
pub struct SubjectChangeset {
    pub subject_code: String,
    pub subject_name: String,
    pub department: Option<String>,
    pub credits: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = classes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ClassRow {
    pub class_id: i64,
    pub class_name: String,
    pub semester: i32,
    pub year: i32,
    pub department: Option<String>,
}

impl ClassRow {
    pub fn into_public(self) -> api::Class {
        api::Class {
            class_id: ClassId::new(self.class_id),
            class_name: self.class_name,
            semester: self.semester,
            year: self.year,
            department: self.department,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = classes)]
pub struct NewClassRow {
    pub class_name: String,
    pub semester: i32,
    pub year: i32,
    pub department: Option<String>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = classes)]
#[diesel(treat_none_as_null = true)]
pub struct ClassChangeset {
    pub class_name: String,
    pub semester: i32,
    pub year: i32,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = time_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TimeSlotRow {
    pub timeslot_id: i64,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TimeSlotRow {
    pub fn into_public(self) -> api::TimeSlot {
        api::TimeSlot {
            timeslot_id: TimeSlotId::new(self.timeslot_id),
            day_of_week: self.day_of_week,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = time_slots)]
pub struct NewTimeSlotRow {
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = allocations)]
pub struct NewAllocationRow {
    pub teacher_id: i64,
    pub class_id: i64,
    pub subject_id: i64,
    pub timeslot_id: i64,
    pub academic_year: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = teacher_preferences)]
pub struct NewPreferenceRow {
    pub teacher_id: i64,
    pub subject_id: i64,
    pub academic_year: String,
    pub rank: i32,
}

/// Flat row of the allocation view left join. Field order matches the
/// explicit `.select()` tuple in the query.
#[derive(Debug, Clone, Queryable)]
pub struct AllocationViewJoinRow {
    pub teacher_id: i64,
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

impl From<AllocationViewJoinRow> for AllocationViewRow {
    fn from(row: AllocationViewJoinRow) -> Self {
        AllocationViewRow {
            teacher_id: TeacherId::new(row.teacher_id),
            teacher_name: row.teacher_name,
            email: row.email,
            department: row.department,
            class_name: row.class_name,
            subject_name: row.subject_name,
            subject_code: row.subject_code,
            day_of_week: row.day_of_week,
            start_time: row.start_time,
            end_time: row.end_time,
            academic_year: row.academic_year,
        }
    }
}
