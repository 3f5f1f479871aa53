//! In-memory repository implementation for unit testing and local development.
//!
//! Mirrors the constraints of the Postgres schema (unique email, unique
//! subject code, unique class name per year/semester, unique preference rank
//! and subject per teacher/year, referential integrity with the same cascade
//! rules) so constraint-path tests run without a database. All tables live
//! behind one mutex; every operation is a single critical section, which gives
//! the same all-or-nothing visibility as a store transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use parking_lot::Mutex;

use crate::api::{
    AllocationId, AllocationViewRow, Class, ClassId, ClassInput, NewAllocation, NewTeacher,
    NewTimeSlot, PreferenceEntry, PreferenceInput, Subject, SubjectId, SubjectInput, Teacher,
    TeacherAccount, TeacherId, TeacherUpdate, TimeSlot, TimeSlotId,
};
use crate::db::repository::{
    AllocationRepository, ClassRepository, ErrorContext, FullRepository, PreferenceRepository,
    RepositoryError, RepositoryResult, SubjectRepository, TeacherRepository,
};

#[derive(Debug, Clone)]
struct TeacherRow {
    teacher_id: i64,
    name: String,
    email: String,
    password_hash: String,
    department: Option<String>,
    expertise: Option<String>,
    max_load: Option<i32>,
    created_at: DateTime<Utc>,
}

impl TeacherRow {
    fn to_public(&self) -> Teacher {
        Teacher {
            teacher_id: TeacherId::new(self.teacher_id),
            name: self.name.clone(),
            email: self.email.clone(),
            department: self.department.clone(),
            expertise: self.expertise.clone(),
            max_load: self.max_load,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
struct SubjectRow {
    subject_id: i64,
    subject_code: String,
    subject_name: String,
    department: Option<String>,
    credits: Option<i32>,
}

impl SubjectRow {
    fn to_public(&self) -> Subject {
        Subject {
            subject_id: SubjectId::new(self.subject_id),
            subject_code: self.subject_code.clone(),
            subject_name: self.subject_name.clone(),
            department: self.department.clone(),
            credits: self.credits,
        }
    }
}

#[derive(Debug, Clone)]
struct ClassRow {
    class_id: i64,
    class_name: String,
    semester: i32,
    year: i32,
    department: Option<String>,
}

impl ClassRow {
    fn to_public(&self) -> Class {
        Class {
            class_id: ClassId::new(self.class_id),
            class_name: self.class_name.clone(),
            semester: self.semester,
            year: self.year,
            department: self.department.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct TimeSlotRow {
    timeslot_id: i64,
    day_of_week: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

#[derive(Debug, Clone)]
#[allow(dead_code)] // allocation_id mirrors the schema's primary key
struct AllocationRow {
    allocation_id: i64,
    teacher_id: i64,
    class_id: i64,
    subject_id: i64,
    timeslot_id: i64,
    academic_year: String,
}

#[derive(Debug, Clone)]
struct PreferenceRow {
    teacher_id: i64,
    subject_id: i64,
    academic_year: String,
    rank: i32,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    teachers: Vec<TeacherRow>,
    subjects: Vec<SubjectRow>,
    classes: Vec<ClassRow>,
    time_slots: Vec<TimeSlotRow>,
    allocations: Vec<AllocationRow>,
    preferences: Vec<PreferenceRow>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store gateway.
#[derive(Debug, Default)]
pub struct LocalRepository {
    tables: Mutex<Tables>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a teacher row directly, bypassing registration. The stored
    /// credential hash is empty and never matches any password.
    pub fn seed_teacher(&self, name: &str, email: &str) -> TeacherId {
        let mut t = self.tables.lock();
        let id = t.next_id();
        t.teachers.push(TeacherRow {
            teacher_id: id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            department: None,
            expertise: None,
            max_load: None,
            created_at: Utc::now(),
        });
        TeacherId::new(id)
    }

    /// Seed a subject row directly.
    pub fn seed_subject(&self, code: &str, name: &str) -> SubjectId {
        let mut t = self.tables.lock();
        let id = t.next_id();
        t.subjects.push(SubjectRow {
            subject_id: id,
            subject_code: code.to_string(),
            subject_name: name.to_string(),
            department: None,
            credits: None,
        });
        SubjectId::new(id)
    }

    /// Seed a class row directly.
    pub fn seed_class(&self, name: &str, semester: i32, year: i32) -> ClassId {
        let mut t = self.tables.lock();
        let id = t.next_id();
        t.classes.push(ClassRow {
            class_id: id,
            class_name: name.to_string(),
            semester,
            year,
            department: None,
        });
        ClassId::new(id)
    }
}

fn fk_violation(table: &str, column: &str) -> RepositoryError {
    RepositoryError::query_with_context(
        format!("insert on \"{table}\" violates foreign key constraint"),
        ErrorContext::default().with_details(format!("column={column}")),
    )
}

#[async_trait]
impl TeacherRepository for LocalRepository {
    async fn list_teachers(&self) -> RepositoryResult<Vec<Teacher>> {
        let t = self.tables.lock();
        Ok(t.teachers.iter().map(TeacherRow::to_public).collect())
    }

    async fn insert_teacher(&self, new: &NewTeacher) -> RepositoryResult<Teacher> {
        let mut t = self.tables.lock();
        if t.teachers.iter().any(|row| row.email == new.email) {
            return Err(RepositoryError::conflict(format!(
                "duplicate email: {}",
                new.email
            )));
        }
        let id = t.next_id();
        let row = TeacherRow {
            teacher_id: id,
            name: new.name.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            department: new.department.clone(),
            expertise: new.expertise.clone(),
            max_load: new.max_load,
            created_at: Utc::now(),
        };
        let public = row.to_public();
        t.teachers.push(row);
        Ok(public)
    }

    async fn update_teacher(
        &self,
        teacher_id: TeacherId,
        update: &TeacherUpdate,
    ) -> RepositoryResult<Teacher> {
        let mut t = self.tables.lock();
        if t.teachers
            .iter()
            .any(|row| row.email == update.email && row.teacher_id != teacher_id.value())
        {
            return Err(RepositoryError::conflict(format!(
                "duplicate email: {}",
                update.email
            )));
        }
        let row = t
            .teachers
            .iter_mut()
            .find(|row| row.teacher_id == teacher_id.value())
            .ok_or_else(|| RepositoryError::not_found("Teacher not found"))?;
        row.name = update.name.clone();
        row.email = update.email.clone();
        row.department = update.department.clone();
        row.expertise = update.expertise.clone();
        row.max_load = update.max_load;
        Ok(row.to_public())
    }

    async fn delete_teacher(&self, teacher_id: TeacherId) -> RepositoryResult<()> {
        let mut t = self.tables.lock();
        let before = t.teachers.len();
        t.teachers.retain(|row| row.teacher_id != teacher_id.value());
        if t.teachers.len() == before {
            return Err(RepositoryError::not_found("Teacher not found"));
        }
        // Same cascades as the schema.
        t.allocations.retain(|a| a.teacher_id != teacher_id.value());
        t.preferences.retain(|p| p.teacher_id != teacher_id.value());
        Ok(())
    }

    async fn find_teacher_by_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Option<TeacherAccount>> {
        let t = self.tables.lock();
        Ok(t.teachers.iter().find(|row| row.email == email).map(|row| {
            TeacherAccount {
                teacher: row.to_public(),
                password_hash: row.password_hash.clone(),
            }
        }))
    }
}

#[async_trait]
impl SubjectRepository for LocalRepository {
    async fn list_subjects(&self) -> RepositoryResult<Vec<Subject>> {
        let t = self.tables.lock();
        let mut subjects: Vec<Subject> = t.subjects.iter().map(SubjectRow::to_public).collect();
        subjects.sort_by(|a, b| a.subject_name.cmp(&b.subject_name));
        Ok(subjects)
    }

    async fn insert_subject(&self, input: &SubjectInput) -> RepositoryResult<Subject> {
        let mut t = self.tables.lock();
        if t.subjects
            .iter()
            .any(|row| row.subject_code == input.subject_code)
        {
            return Err(RepositoryError::conflict(format!(
                "duplicate subject code: {}",
                input.subject_code
            )));
        }
        let id = t.next_id();
        let row = SubjectRow {
            subject_id: id,
            subject_code: input.subject_code.clone(),
            subject_name: input.subject_name.clone(),
            department: input.department.clone(),
            credits: input.credits,
        };
        let public = row.to_public();
        t.subjects.push(row);
        Ok(public)
    }

    async fn update_subject(
        &self,
        subject_id: SubjectId,
        input: &SubjectInput,
    ) -> RepositoryResult<Subject> {
        let mut t = self.tables.lock();
        if t.subjects.iter().any(|row| {
            row.subject_code == input.subject_code && row.subject_id != subject_id.value()
        }) {
            return Err(RepositoryError::conflict(format!(
                "duplicate subject code: {}",
                input.subject_code
            )));
        }
        let row = t
            .subjects
            .iter_mut()
            .find(|row| row.subject_id == subject_id.value())
            .ok_or_else(|| RepositoryError::not_found("Subject not found"))?;
        row.subject_code = input.subject_code.clone();
        row.subject_name = input.subject_name.clone();
        row.department = input.department.clone();
        row.credits = input.credits;
        Ok(row.to_public())
    }

    async fn delete_subject(&self, subject_id: SubjectId) -> RepositoryResult<()> {
        let mut t = self.tables.lock();
        if !t
            .subjects
            .iter()
            .any(|row| row.subject_id == subject_id.value())
        {
            return Err(RepositoryError::not_found("Subject not found"));
        }
        // Preferences hold a plain (non-cascading) reference to subjects.
        if t.preferences
            .iter()
            .any(|p| p.subject_id == subject_id.value())
        {
            return Err(RepositoryError::query_with_context(
                "delete on \"subjects\" violates foreign key constraint on \"teacher_preferences\"",
                ErrorContext::new("delete_subject").with_entity_id(subject_id.value()),
            ));
        }
        t.subjects.retain(|row| row.subject_id != subject_id.value());
        t.allocations.retain(|a| a.subject_id != subject_id.value());
        Ok(())
    }
}

#[async_trait]
impl ClassRepository for LocalRepository {
    async fn list_classes(&self) -> RepositoryResult<Vec<Class>> {
        let t = self.tables.lock();
        let mut classes: Vec<Class> = t.classes.iter().map(ClassRow::to_public).collect();
        classes.sort_by(|a, b| b.year.cmp(&a.year).then(b.semester.cmp(&a.semester)));
        Ok(classes)
    }

    async fn insert_class(&self, input: &ClassInput) -> RepositoryResult<Class> {
        let mut t = self.tables.lock();
        if t.classes.iter().any(|row| {
            row.class_name == input.class_name
                && row.year == input.year
                && row.semester == input.semester
        }) {
            return Err(RepositoryError::conflict(format!(
                "duplicate class: {} ({}/{})",
                input.class_name, input.year, input.semester
            )));
        }
        let id = t.next_id();
        let row = ClassRow {
            class_id: id,
            class_name: input.class_name.clone(),
            semester: input.semester,
            year: input.year,
            department: input.department.clone(),
        };
        let public = row.to_public();
        t.classes.push(row);
        Ok(public)
    }

    async fn update_class(
        &self,
        class_id: ClassId,
        input: &ClassInput,
    ) -> RepositoryResult<Class> {
        let mut t = self.tables.lock();
        if t.classes.iter().any(|row| {
            row.class_name == input.class_name
                && row.year == input.year
                && row.semester == input.semester
                && row.class_id != class_id.value()
        }) {
            return Err(RepositoryError::conflict(format!(
                "duplicate class: {} ({}/{})",
                input.class_name, input.year, input.semester
            )));
        }
        let row = t
            .classes
            .iter_mut()
            .find(|row| row.class_id == class_id.value())
            .ok_or_else(|| RepositoryError::not_found("Class not found"))?;
        row.class_name = input.class_name.clone();
        row.semester = input.semester;
        row.year = input.year;
        row.department = input.department.clone();
        Ok(row.to_public())
    }

    async fn delete_class(&self, class_id: ClassId) -> RepositoryResult<()> {
        let mut t = self.tables.lock();
        let before = t.classes.len();
        t.classes.retain(|row| row.class_id != class_id.value());
        if t.classes.len() == before {
            return Err(RepositoryError::not_found("Class not found"));
        }
        t.allocations.retain(|a| a.class_id != class_id.value());
        Ok(())
    }
}

#[async_trait]
impl AllocationRepository for LocalRepository {
    async fn fetch_allocation_rows(
        &self,
        teacher: Option<TeacherId>,
    ) -> RepositoryResult<Vec<AllocationViewRow>> {
        let t = self.tables.lock();

        let mut teachers: Vec<&TeacherRow> = t
            .teachers
            .iter()
            .filter(|row| teacher.map_or(true, |id| row.teacher_id == id.value()))
            .collect();
        // Name ties break on id so the output order is fully deterministic.
        teachers.sort_by(|a, b| a.name.cmp(&b.name).then(a.teacher_id.cmp(&b.teacher_id)));

        let mut rows = Vec::new();
        for teacher_row in teachers {
            let mut joined: Vec<(&AllocationRow, &ClassRow, &SubjectRow, &TimeSlotRow)> = t
                .allocations
                .iter()
                .filter(|a| a.teacher_id == teacher_row.teacher_id)
                .filter_map(|a| {
                    let class = t.classes.iter().find(|c| c.class_id == a.class_id)?;
                    let subject = t.subjects.iter().find(|s| s.subject_id == a.subject_id)?;
                    let slot = t
                        .time_slots
                        .iter()
                        .find(|ts| ts.timeslot_id == a.timeslot_id)?;
                    Some((a, class, subject, slot))
                })
                .collect();
            joined.sort_by(|x, y| {
                (x.3.day_of_week, x.3.start_time).cmp(&(y.3.day_of_week, y.3.start_time))
            });

            if joined.is_empty() {
                // Left-join placeholder row for a teacher with no allocations.
                rows.push(AllocationViewRow {
                    teacher_id: TeacherId::new(teacher_row.teacher_id),
                    teacher_name: teacher_row.name.clone(),
                    email: teacher_row.email.clone(),
                    department: teacher_row.department.clone(),
                    class_name: None,
                    subject_name: None,
                    subject_code: None,
                    day_of_week: None,
                    start_time: None,
                    end_time: None,
                    academic_year: None,
                });
                continue;
            }

            for (allocation, class, subject, slot) in joined {
                rows.push(AllocationViewRow {
                    teacher_id: TeacherId::new(teacher_row.teacher_id),
                    teacher_name: teacher_row.name.clone(),
                    email: teacher_row.email.clone(),
                    department: teacher_row.department.clone(),
                    class_name: Some(class.class_name.clone()),
                    subject_name: Some(subject.subject_name.clone()),
                    subject_code: Some(subject.subject_code.clone()),
                    day_of_week: Some(slot.day_of_week),
                    start_time: Some(slot.start_time),
                    end_time: Some(slot.end_time),
                    academic_year: Some(allocation.academic_year.clone()),
                });
            }
        }

        Ok(rows)
    }

    async fn insert_time_slot(&self, new: &NewTimeSlot) -> RepositoryResult<TimeSlot> {
        let mut t = self.tables.lock();
        let id = t.next_id();
        t.time_slots.push(TimeSlotRow {
            timeslot_id: id,
            day_of_week: new.day_of_week,
            start_time: new.start_time,
            end_time: new.end_time,
        });
        Ok(TimeSlot {
            timeslot_id: TimeSlotId::new(id),
            day_of_week: new.day_of_week,
            start_time: new.start_time,
            end_time: new.end_time,
        })
    }

    async fn insert_allocation(&self, new: &NewAllocation) -> RepositoryResult<AllocationId> {
        let mut t = self.tables.lock();
        if !t
            .teachers
            .iter()
            .any(|row| row.teacher_id == new.teacher_id.value())
        {
            return Err(fk_violation("allocations", "teacher_id"));
        }
        if !t
            .classes
            .iter()
            .any(|row| row.class_id == new.class_id.value())
        {
            return Err(fk_violation("allocations", "class_id"));
        }
        if !t
            .subjects
            .iter()
            .any(|row| row.subject_id == new.subject_id.value())
        {
            return Err(fk_violation("allocations", "subject_id"));
        }
        if !t
            .time_slots
            .iter()
            .any(|row| row.timeslot_id == new.timeslot_id.value())
        {
            return Err(fk_violation("allocations", "timeslot_id"));
        }
        let id = t.next_id();
        t.allocations.push(AllocationRow {
            allocation_id: id,
            teacher_id: new.teacher_id.value(),
            class_id: new.class_id.value(),
            subject_id: new.subject_id.value(),
            timeslot_id: new.timeslot_id.value(),
            academic_year: new.academic_year.clone(),
        });
        Ok(AllocationId::new(id))
    }
}

#[async_trait]
impl PreferenceRepository for LocalRepository {
    async fn fetch_preferences(
        &self,
        teacher: TeacherId,
        academic_year: &str,
    ) -> RepositoryResult<Vec<PreferenceEntry>> {
        let t = self.tables.lock();
        let mut entries: Vec<PreferenceEntry> = t
            .preferences
            .iter()
            .filter(|p| p.teacher_id == teacher.value() && p.academic_year == academic_year)
            .filter_map(|p| {
                let subject = t.subjects.iter().find(|s| s.subject_id == p.subject_id)?;
                Some(PreferenceEntry {
                    subject_id: SubjectId::new(subject.subject_id),
                    subject_name: subject.subject_name.clone(),
                    subject_code: subject.subject_code.clone(),
                    rank: p.rank,
                })
            })
            .collect();
        entries.sort_by_key(|entry| entry.rank);
        Ok(entries)
    }

    async fn replace_preferences(
        &self,
        teacher: TeacherId,
        academic_year: &str,
        preferences: &[PreferenceInput],
    ) -> RepositoryResult<usize> {
        let mut t = self.tables.lock();

        // Every check runs before the first mutation, so a failure leaves the
        // stored set untouched, the same outcome as a rolled-back transaction.
        if !t
            .teachers
            .iter()
            .any(|row| row.teacher_id == teacher.value())
        {
            return Err(fk_violation("teacher_preferences", "teacher_id"));
        }
        for pref in preferences {
            if !t
                .subjects
                .iter()
                .any(|row| row.subject_id == pref.subject_id.value())
            {
                return Err(fk_violation("teacher_preferences", "subject_id"));
            }
        }
        let mut ranks = std::collections::HashSet::new();
        let mut subjects = std::collections::HashSet::new();
        for pref in preferences {
            if !ranks.insert(pref.rank) {
                return Err(RepositoryError::conflict(format!(
                    "duplicate rank {} for teacher {} in {}",
                    pref.rank,
                    teacher.value(),
                    academic_year
                )));
            }
            if !subjects.insert(pref.subject_id.value()) {
                return Err(RepositoryError::conflict(format!(
                    "duplicate subject {} for teacher {} in {}",
                    pref.subject_id.value(),
                    teacher.value(),
                    academic_year
                )));
            }
        }

        t.preferences
            .retain(|p| !(p.teacher_id == teacher.value() && p.academic_year == academic_year));
        for pref in preferences {
            t.preferences.push(PreferenceRow {
                teacher_id: teacher.value(),
                subject_id: pref.subject_id.value(),
                academic_year: academic_year.to_string(),
                rank: pref.rank,
            });
        }
        Ok(preferences.len())
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
