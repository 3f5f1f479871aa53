//! Database module for faculty allocation data.
//!
//! This module provides abstractions for database operations via the
//! Repository pattern, allowing different storage backends to be swapped
//! easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (HTTP handlers)                       │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs) - Business Logic            │
//! │  - Allocation view folding                               │
//! │  - Preference submission invariants                      │
//! │  - Password hashing / login                              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │ PostgresRepository │ LocalRepository │
//!     └──────────────────────────────┘
//! ```
//!
//! # Recommended Usage
//!
//! **Use the service layer together with the factory:**
//! ```ignore
//! use fas_rust::db::{factory::RepositoryFactory, services};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::from_env().await?;
//!     let view = services::allocation_view(repo.as_ref(), None).await?;
//!     Ok(())
//! }
//! ```

// Feature flag guard: at least one storage backend must be compiled in.
#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod password;
pub mod repositories;
pub mod repository;
pub mod services;

#[cfg(test)]
#[path = "services_tests.rs"]
mod services_tests;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

// ==================== Service Layer ====================
// High-level functions that work with any repository implementation.

pub use services::{
    allocation_view, delete_teacher, health_check, list_classes, list_subjects, list_teachers,
    login_teacher, register_teacher, submit_preferences, teacher_preferences, update_teacher,
};

// ==================== Repository Pattern Exports ====================

pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    AllocationRepository, ClassRepository, ErrorContext, FullRepository, PreferenceRepository,
    RepositoryError, RepositoryResult, SubjectRepository, TeacherRepository,
};
