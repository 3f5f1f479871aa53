//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations, injected at startup
    pub repository: Arc<dyn FullRepository>,
    /// Academic year partitioning preferences and allocations
    pub academic_year: Arc<str>,
}

impl AppState {
    /// Create a new application state with the given repository and academic
    /// year.
    pub fn new(repository: Arc<dyn FullRepository>, academic_year: impl AsRef<str>) -> Self {
        Self {
            repository,
            academic_year: Arc::from(academic_year.as_ref()),
        }
    }
}
