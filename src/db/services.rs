//! High-level business logic over the repository traits.
//!
//! These functions are the application-facing interface to the store: HTTP
//! handlers call them and never touch a repository implementation directly.
//! Everything takes `&dyn FullRepository`, so tests can run the same paths
//! against the in-memory repository.

use std::collections::HashSet;

use log::debug;

use crate::api::{
    AllocationViewRow, Class, ClassId, ClassInput, NewTeacher, PreferenceEntry, PreferenceInput,
    Subject, SubjectId, SubjectInput, Teacher, TeacherAllocationView, TeacherId,
    TeacherRegistration, TeacherUpdate,
};

use super::password;
use super::repository::{
    AllocationRepository, ClassRepository, FullRepository, PreferenceRepository, RepositoryError,
    RepositoryResult, SubjectRepository, TeacherRepository,
};

/// Verify store connectivity.
pub async fn health_check(repo: &dyn FullRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}

// =============================================================================
// Allocation aggregation view
// =============================================================================

/// Aggregated allocation view, optionally restricted to one teacher.
///
/// Fetches the ordered flat join from the store and folds it into one record
/// per teacher. No partial result is ever returned: any store failure
/// propagates as-is.
pub async fn allocation_view(
    repo: &dyn FullRepository,
    teacher: Option<TeacherId>,
) -> RepositoryResult<Vec<TeacherAllocationView>> {
    let rows = repo.fetch_allocation_rows(teacher).await?;
    Ok(fold_allocation_rows(rows))
}

/// Fold the flat left-join row set into per-teacher records.
///
/// Grouping is an explicit pass over the ordered rows: the output sequence
/// follows first-seen order of each teacher (the store query orders by
/// teacher name), and rows whose joined columns are null (teachers with no
/// allocations) contribute an empty allocation list rather than a spurious
/// entry.
pub fn fold_allocation_rows(rows: Vec<AllocationViewRow>) -> Vec<TeacherAllocationView> {
    let mut index: std::collections::HashMap<TeacherId, usize> = std::collections::HashMap::new();
    let mut grouped: Vec<TeacherAllocationView> = Vec::new();

    for row in rows {
        let slot = match index.get(&row.teacher_id) {
            Some(&slot) => slot,
            None => {
                index.insert(row.teacher_id, grouped.len());
                grouped.push(TeacherAllocationView {
                    teacher_id: row.teacher_id,
                    name: row.teacher_name.clone(),
                    email: row.email.clone(),
                    department: row.department.clone(),
                    allocations: Vec::new(),
                });
                grouped.len() - 1
            }
        };

        if let Some(detail) = row.detail() {
            grouped[slot].allocations.push(detail);
        }
    }

    grouped
}

// =============================================================================
// Preferences
// =============================================================================

/// A teacher's stored preference list for one academic year, ordered by rank.
pub async fn teacher_preferences(
    repo: &dyn FullRepository,
    teacher: TeacherId,
    academic_year: &str,
) -> RepositoryResult<Vec<PreferenceEntry>> {
    repo.fetch_preferences(teacher, academic_year).await
}

/// Replace a teacher's preference set for one academic year.
///
/// Ranks must be unique within the submission; a duplicate is rejected here,
/// before any store access, in addition to the store's own constraint. The
/// list itself is stored verbatim, with no re-ranking and no de-duplication
/// of subjects; an empty list simply clears the stored set.
pub async fn submit_preferences(
    repo: &dyn FullRepository,
    teacher: TeacherId,
    academic_year: &str,
    preferences: &[PreferenceInput],
) -> RepositoryResult<usize> {
    let mut seen_ranks = HashSet::new();
    for pref in preferences {
        if !seen_ranks.insert(pref.rank) {
            return Err(RepositoryError::validation(format!(
                "Duplicate rank {} in submission",
                pref.rank
            )));
        }
    }

    let inserted = repo
        .replace_preferences(teacher, academic_year, preferences)
        .await?;
    debug!(
        "replaced preferences teacher_id={} academic_year={} rows={}",
        teacher.value(),
        academic_year,
        inserted
    );
    Ok(inserted)
}

// =============================================================================
// Teachers
// =============================================================================

pub async fn list_teachers(repo: &dyn FullRepository) -> RepositoryResult<Vec<Teacher>> {
    repo.list_teachers().await
}

/// Register a teacher: reject an already-used email, hash the password, insert.
pub async fn register_teacher(
    repo: &dyn FullRepository,
    registration: &TeacherRegistration,
) -> RepositoryResult<Teacher> {
    if repo
        .find_teacher_by_email(&registration.email)
        .await?
        .is_some()
    {
        return Err(RepositoryError::conflict(
            "Teacher with this email already exists",
        ));
    }

    let new = NewTeacher {
        name: registration.name.clone(),
        email: registration.email.clone(),
        password_hash: password::hash_password(&registration.password),
        department: registration.department.clone(),
        expertise: registration.expertise.clone(),
        max_load: registration.max_load,
    };
    repo.insert_teacher(&new).await
}

/// Authenticate by email and password. `Ok(None)` covers both an unknown
/// address and a wrong password, so callers cannot distinguish the two.
pub async fn login_teacher(
    repo: &dyn FullRepository,
    email: &str,
    password_plain: &str,
) -> RepositoryResult<Option<Teacher>> {
    let Some(account) = repo.find_teacher_by_email(email).await? else {
        return Ok(None);
    };

    if password::verify_password(password_plain, &account.password_hash) {
        Ok(Some(account.teacher))
    } else {
        Ok(None)
    }
}

pub async fn update_teacher(
    repo: &dyn FullRepository,
    teacher: TeacherId,
    update: &TeacherUpdate,
) -> RepositoryResult<Teacher> {
    repo.update_teacher(teacher, update).await
}

pub async fn delete_teacher(
    repo: &dyn FullRepository,
    teacher: TeacherId,
) -> RepositoryResult<()> {
    repo.delete_teacher(teacher).await
}

// =============================================================================
// Subjects
// =============================================================================

pub async fn list_subjects(repo: &dyn FullRepository) -> RepositoryResult<Vec<Subject>> {
    repo.list_subjects().await
}

pub async fn create_subject(
    repo: &dyn FullRepository,
    input: &SubjectInput,
) -> RepositoryResult<Subject> {
    repo.insert_subject(input).await
}

pub async fn update_subject(
    repo: &dyn FullRepository,
    subject: SubjectId,
    input: &SubjectInput,
) -> RepositoryResult<Subject> {
    repo.update_subject(subject, input).await
}

pub async fn delete_subject(
    repo: &dyn FullRepository,
    subject: SubjectId,
) -> RepositoryResult<()> {
    repo.delete_subject(subject).await
}

// =============================================================================
// Classes
// =============================================================================

pub async fn list_classes(repo: &dyn FullRepository) -> RepositoryResult<Vec<Class>> {
    repo.list_classes().await
}

pub async fn create_class(
    repo: &dyn FullRepository,
    input: &ClassInput,
) -> RepositoryResult<Class> {
    repo.insert_class(input).await
}

pub async fn update_class(
    repo: &dyn FullRepository,
    class: ClassId,
    input: &ClassInput,
) -> RepositoryResult<Class> {
    repo.update_class(class, input).await
}

pub async fn delete_class(repo: &dyn FullRepository, class: ClassId) -> RepositoryResult<()> {
    repo.delete_class(class).await
}
