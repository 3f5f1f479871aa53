//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres database
//! holding the faculty allocation schema.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task;

use crate::api::{
    AllocationId, AllocationViewRow, Class, ClassId, ClassInput, NewAllocation, NewTeacher,
    NewTimeSlot, PreferenceEntry, PreferenceInput, Subject, SubjectId, SubjectInput, Teacher,
    TeacherAccount, TeacherId, TeacherUpdate, TimeSlot,
};
use crate::db::repository::{
    AllocationRepository, ClassRepository, ErrorContext, FullRepository, PreferenceRepository,
    RepositoryError, RepositoryResult, SubjectRepository, TeacherRepository,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables (see module docs).
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// The operation runs on the blocking pool and is retried up to
    /// `max_retries` times when a retryable error occurs (connection errors,
    /// serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

#[async_trait]
impl TeacherRepository for PostgresRepository {
    async fn list_teachers(&self) -> RepositoryResult<Vec<Teacher>> {
        self.with_conn(|conn| {
            teachers::table
                .select(TeacherRow::as_select())
                .load::<TeacherRow>(conn)
                .map(|rows| rows.into_iter().map(TeacherRow::into_public).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_teacher(&self, new: &NewTeacher) -> RepositoryResult<Teacher> {
        let row = NewTeacherRow {
            name: new.name.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            department: new.department.clone(),
            expertise: new.expertise.clone(),
            max_load: new.max_load,
        };
        self.with_conn(move |conn| {
            diesel::insert_into(teachers::table)
                .values(&row)
                .returning(TeacherRow::as_returning())
                .get_result::<TeacherRow>(conn)
                .map(TeacherRow::into_public)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn update_teacher(
        &self,
        teacher_id: TeacherId,
        update: &TeacherUpdate,
    ) -> RepositoryResult<Teacher> {
        let changes = TeacherChangeset {
            name: update.name.clone(),
            email: update.email.clone(),
            department: update.department.clone(),
            expertise: update.expertise.clone(),
            max_load: update.max_load,
        };
        self.with_conn(move |conn| {
            diesel::update(teachers::table.find(teacher_id.value()))
                .set(changes)
                .returning(TeacherRow::as_returning())
                .get_result::<TeacherRow>(conn)
                .map(TeacherRow::into_public)
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => {
                        RepositoryError::not_found("Teacher not found")
                    }
                    other => map_diesel_error(other),
                })
        })
        .await
    }

    async fn delete_teacher(&self, teacher_id: TeacherId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(teachers::table.find(teacher_id.value()))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::not_found_with_context(
                    "Teacher not found",
                    ErrorContext::new("delete_teacher").with_entity_id(teacher_id.value()),
                ));
            }
            Ok(())
        })
        .await
    }

    async fn find_teacher_by_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Option<TeacherAccount>> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            teachers::table
                .filter(teachers::email.eq(&email))
                .select(TeacherRow::as_select())
                .first::<TeacherRow>(conn)
                .optional()
                .map(|row| row.map(TeacherRow::into_account))
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl SubjectRepository for PostgresRepository {
    async fn list_subjects(&self) -> RepositoryResult<Vec<Subject>> {
        self.with_conn(|conn| {
            subjects::table
                .order(subjects::subject_name.asc())
                .select(SubjectRow::as_select())
                .load::<SubjectRow>(conn)
                .map(|rows| rows.into_iter().map(SubjectRow::into_public).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_subject(&self, input: &SubjectInput) -> RepositoryResult<Subject> {
        let row = NewSubjectRow {
            subject_code: input.subject_code.clone(),
            subject_name: input.subject_name.clone(),
            department: input.department.clone(),
            credits: input.credits,
        };
        self.with_conn(move |conn| {
            diesel::insert_into(subjects::table)
                .values(&row)
                .returning(SubjectRow::as_returning())
                .get_result::<SubjectRow>(conn)
                .map(SubjectRow::into_public)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn update_subject(
        &self,
        subject_id: SubjectId,
        input: &SubjectInput,
    ) -> RepositoryResult<Subject> {
        let changes = SubjectChangeset {
            subject_code: input.subject_code.clone(),
            subject_name: input.subject_name.clone(),
            department: input.department.clone(),
            credits: input.credits,
        };
        self.with_conn(move |conn| {
            diesel::update(subjects::table.find(subject_id.value()))
                .set(changes)
                .returning(SubjectRow::as_returning())
                .get_result::<SubjectRow>(conn)
                .map(SubjectRow::into_public)
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => {
                        RepositoryError::not_found("Subject not found")
                    }
                    other => map_diesel_error(other),
                })
        })
        .await
    }

    async fn delete_subject(&self, subject_id: SubjectId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(subjects::table.find(subject_id.value()))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::not_found_with_context(
                    "Subject not found",
                    ErrorContext::new("delete_subject").with_entity_id(subject_id.value()),
                ));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ClassRepository for PostgresRepository {
    async fn list_classes(&self) -> RepositoryResult<Vec<Class>> {
        self.with_conn(|conn| {
            classes::table
                .order((classes::year.desc(), classes::semester.desc()))
                .select(ClassRow::as_select())
                .load::<ClassRow>(conn)
                .map(|rows| rows.into_iter().map(ClassRow::into_public).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_class(&self, input: &ClassInput) -> RepositoryResult<Class> {
        let row = NewClassRow {
            class_name: input.class_name.clone(),
            semester: input.semester,
            year: input.year,
            department: input.department.clone(),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(classes::table)
                .values(&row)
                .returning(ClassRow::as_returning())
                .get_result::<ClassRow>(conn)
                .map(ClassRow::into_public)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn update_class(
        &self,
        class_id: ClassId,
        input: &ClassInput,
    ) -> RepositoryResult<Class> {
        let changes = ClassChangeset {
            class_name: input.class_name.clone(),
            semester: input.semester,
            year: input.year,
            department: input.department.clone(),
        };
        self.with_conn(move |conn| {
            diesel::update(classes::table.find(class_id.value()))
                .set(changes)
                .returning(ClassRow::as_returning())
                .get_result::<ClassRow>(conn)
                .map(ClassRow::into_public)
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => {
                        RepositoryError::not_found("Class not found")
                    }
                    other => map_diesel_error(other),
                })
        })
        .await
    }

    async fn delete_class(&self, class_id: ClassId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(classes::table.find(class_id.value()))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::not_found_with_context(
                    "Class not found",
                    ErrorContext::new("delete_class").with_entity_id(class_id.value()),
                ));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl AllocationRepository for PostgresRepository {
    async fn fetch_allocation_rows(
        &self,
        teacher: Option<TeacherId>,
    ) -> RepositoryResult<Vec<AllocationViewRow>> {
        self.with_conn(move |conn| {
            // Left join so teachers with no allocations still appear, with all
            // joined columns null. The ORDER BY makes the fold deterministic.
            let mut query = teachers::table
                .left_join(
                    allocations::table
                        .left_join(classes::table)
                        .left_join(subjects::table)
                        .left_join(time_slots::table),
                )
                .select((
                    teachers::teacher_id,
                    teachers::name,
                    teachers::email,
                    teachers::department,
                    classes::class_name.nullable(),
                    subjects::subject_name.nullable(),
                    subjects::subject_code.nullable(),
                    time_slots::day_of_week.nullable(),
                    time_slots::start_time.nullable(),
                    time_slots::end_time.nullable(),
                    allocations::academic_year.nullable(),
                ))
                .order((
                    teachers::name.asc(),
                    teachers::teacher_id.asc(),
                    time_slots::day_of_week.asc(),
                    time_slots::start_time.asc(),
                ))
                .into_boxed();

            if let Some(id) = teacher {
                query = query.filter(teachers::teacher_id.eq(id.value()));
            }

            query
                .load::<AllocationViewJoinRow>(conn)
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_time_slot(&self, new: &NewTimeSlot) -> RepositoryResult<TimeSlot> {
        let row = NewTimeSlotRow {
            day_of_week: new.day_of_week,
            start_time: new.start_time,
            end_time: new.end_time,
        };
        self.with_conn(move |conn| {
            diesel::insert_into(time_slots::table)
                .values(&row)
                .returning(TimeSlotRow::as_returning())
                .get_result::<TimeSlotRow>(conn)
                .map(TimeSlotRow::into_public)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_allocation(&self, new: &NewAllocation) -> RepositoryResult<AllocationId> {
        let row = NewAllocationRow {
            teacher_id: new.teacher_id.value(),
            class_id: new.class_id.value(),
            subject_id: new.subject_id.value(),
            timeslot_id: new.timeslot_id.value(),
            academic_year: new.academic_year.clone(),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(allocations::table)
                .values(&row)
                .returning(allocations::allocation_id)
                .get_result::<i64>(conn)
                .map(AllocationId::new)
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl PreferenceRepository for PostgresRepository {
    async fn fetch_preferences(
        &self,
        teacher: TeacherId,
        academic_year: &str,
    ) -> RepositoryResult<Vec<PreferenceEntry>> {
        let academic_year = academic_year.to_string();
        self.with_conn(move |conn| {
            teacher_preferences::table
                .inner_join(subjects::table)
                .filter(teacher_preferences::teacher_id.eq(teacher.value()))
                .filter(teacher_preferences::academic_year.eq(&academic_year))
                .order(teacher_preferences::rank.asc())
                .select((
                    subjects::subject_id,
                    subjects::subject_name,
                    subjects::subject_code,
                    teacher_preferences::rank,
                ))
                .load::<(i64, String, String, i32)>(conn)
                .map(|rows| {
                    rows.into_iter()
                        .map(|(subject_id, subject_name, subject_code, rank)| PreferenceEntry {
                            subject_id: SubjectId::new(subject_id),
                            subject_name,
                            subject_code,
                            rank,
                        })
                        .collect()
                })
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn replace_preferences(
        &self,
        teacher: TeacherId,
        academic_year: &str,
        preferences: &[PreferenceInput],
    ) -> RepositoryResult<usize> {
        let academic_year = academic_year.to_string();
        let rows: Vec<NewPreferenceRow> = preferences
            .iter()
            .map(|pref| NewPreferenceRow {
                teacher_id: teacher.value(),
                subject_id: pref.subject_id.value(),
                academic_year: academic_year.clone(),
                rank: pref.rank,
            })
            .collect();

        self.with_conn(move |conn| {
            // One transaction owns the connection for the whole replace: the
            // delete and every insert commit together or not at all, and the
            // pooled connection is released on every exit path.
            conn.transaction(|tx| {
                diesel::delete(
                    teacher_preferences::table
                        .filter(teacher_preferences::teacher_id.eq(teacher.value()))
                        .filter(teacher_preferences::academic_year.eq(&academic_year)),
                )
                .execute(tx)
                .map_err(map_diesel_error)?;

                if rows.is_empty() {
                    return Ok(0);
                }

                diesel::insert_into(teacher_preferences::table)
                    .values(&rows)
                    .execute(tx)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }
}

#[async_trait]
impl FullRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }
}
