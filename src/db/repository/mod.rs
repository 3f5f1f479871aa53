//! Repository trait definitions: the store gateway seam of the service.
//!
//! Each trait covers one entity family; `FullRepository` bundles them for the
//! application layer. Implementations live in `super::repositories`.

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use async_trait::async_trait;

use crate::api::{
    AllocationId, AllocationViewRow, Class, ClassId, ClassInput, NewAllocation, NewTeacher,
    NewTimeSlot, PreferenceEntry, PreferenceInput, Subject, SubjectId, SubjectInput, Teacher,
    TeacherAccount, TeacherId, TeacherUpdate, TimeSlot,
};

/// Repository trait for teacher records and credentials.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait TeacherRepository: Send + Sync {
    /// List every teacher, public fields only.
    async fn list_teachers(&self) -> RepositoryResult<Vec<Teacher>>;

    /// Insert a registered teacher. The store enforces email uniqueness; a
    /// duplicate surfaces as `RepositoryError::ConflictError`.
    async fn insert_teacher(&self, new: &NewTeacher) -> RepositoryResult<Teacher>;

    /// Overwrite a teacher's public fields. `NotFound` when the id does not
    /// exist, `ConflictError` when the new email is already taken.
    async fn update_teacher(
        &self,
        teacher_id: TeacherId,
        update: &TeacherUpdate,
    ) -> RepositoryResult<Teacher>;

    /// Delete a teacher. `NotFound` when the id does not exist.
    async fn delete_teacher(&self, teacher_id: TeacherId) -> RepositoryResult<()>;

    /// Look up a teacher with its credential hash by email. `Ok(None)` when no
    /// account uses the address.
    async fn find_teacher_by_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Option<TeacherAccount>>;
}

/// Repository trait for the subject catalog.
#[async_trait]
pub trait SubjectRepository: Send + Sync {
    /// List subjects ordered by name.
    async fn list_subjects(&self) -> RepositoryResult<Vec<Subject>>;

    /// Insert a subject. Duplicate subject code → `ConflictError`.
    async fn insert_subject(&self, input: &SubjectInput) -> RepositoryResult<Subject>;

    /// Overwrite a subject. `NotFound` / `ConflictError` as for teachers.
    async fn update_subject(
        &self,
        subject_id: SubjectId,
        input: &SubjectInput,
    ) -> RepositoryResult<Subject>;

    /// Delete a subject. `NotFound` when the id does not exist.
    async fn delete_subject(&self, subject_id: SubjectId) -> RepositoryResult<()>;
}

/// Repository trait for class records.
#[async_trait]
pub trait ClassRepository: Send + Sync {
    /// List classes ordered by year descending, then semester descending.
    async fn list_classes(&self) -> RepositoryResult<Vec<Class>>;

    /// Insert a class. Duplicate (name, year, semester) → `ConflictError`.
    async fn insert_class(&self, input: &ClassInput) -> RepositoryResult<Class>;

    /// Overwrite a class.
    async fn update_class(&self, class_id: ClassId, input: &ClassInput)
        -> RepositoryResult<Class>;

    /// Delete a class. `NotFound` when the id does not exist.
    async fn delete_class(&self, class_id: ClassId) -> RepositoryResult<()>;
}

/// Repository trait for allocation records and the aggregation view's flat
/// row set.
#[async_trait]
pub trait AllocationRepository: Send + Sync {
    /// Fetch the flat left-join row set behind the allocation view, ordered
    /// by teacher name (ties broken by id), day of week, start time.
    ///
    /// A teacher with no allocations appears as one row with all joined
    /// columns `None`. With `teacher` set, only that teacher's rows are
    /// returned, still including the all-null placeholder row.
    async fn fetch_allocation_rows(
        &self,
        teacher: Option<TeacherId>,
    ) -> RepositoryResult<Vec<AllocationViewRow>>;

    /// Insert a time slot. Administrative seeding; no HTTP surface.
    async fn insert_time_slot(&self, new: &NewTimeSlot) -> RepositoryResult<TimeSlot>;

    /// Insert an allocation record. Administrative seeding; no HTTP surface.
    /// Referential integrity is the store's: unknown ids fail the insert.
    async fn insert_allocation(&self, new: &NewAllocation) -> RepositoryResult<AllocationId>;
}

/// Repository trait for per-teacher ranked subject preferences.
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Fetch a teacher's stored preference list for one academic year, joined
    /// with the subject catalog and ordered ascending by rank.
    async fn fetch_preferences(
        &self,
        teacher: TeacherId,
        academic_year: &str,
    ) -> RepositoryResult<Vec<PreferenceEntry>>;

    /// Atomically replace a teacher's preference set for one academic year.
    ///
    /// One transaction deletes every existing row for `(teacher, year)` and
    /// inserts one row per entry with ranks stored verbatim. If any insert
    /// fails (constraint violation, unknown subject id) the whole operation
    /// rolls back and the prior set stays intact. Returns the number of rows
    /// inserted.
    async fn replace_preferences(
        &self,
        teacher: TeacherId,
        academic_year: &str,
        preferences: &[PreferenceInput],
    ) -> RepositoryResult<usize>;
}

/// Combined repository interface consumed by the application layer.
#[async_trait]
pub trait FullRepository:
    TeacherRepository
    + SubjectRepository
    + ClassRepository
    + AllocationRepository
    + PreferenceRepository
{
    /// Verify store connectivity with a trivial query.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
