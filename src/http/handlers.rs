//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer for business logic. Store uniqueness conflicts are translated to the
//! per-route messages of the external contract.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use super::dto::{
    CreateClassRequest, CreateSubjectRequest, HealthResponse, LoginRequest, LoginResponse,
    RegisterTeacherRequest, UpdateClassRequest, UpdateSubjectRequest, UpdateTeacherRequest,
};
use super::error::{AppError, Msg};
use super::state::AppState;
use crate::api::{
    Class, ClassId, ClassInput, PreferenceEntry, PreferenceInput, Subject, SubjectId,
    SubjectInput, Teacher, TeacherAllocationView, TeacherId, TeacherRegistration, TeacherUpdate,
};
use crate::db::repository::RepositoryError;
use crate::db::services as db_services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Translate a store uniqueness conflict to a route-specific message; every
/// other error keeps its taxonomy mapping.
fn map_conflict(err: RepositoryError, msg: &str) -> AppError {
    match err {
        RepositoryError::ConflictError { .. } => AppError::Conflict(msg.to_string()),
        other => AppError::from(other),
    }
}

fn required(field: &Option<String>) -> Option<&str> {
    match field.as_deref() {
        Some(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

// =============================================================================
// Index and health check
// =============================================================================

/// GET /
pub async fn index() -> &'static str {
    "Welcome to the Faculty Allocation API!"
}

/// GET /health
///
/// Health check endpoint to verify the service is running and database is
/// accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Allocation view
// =============================================================================

/// GET /allocations/view
///
/// Aggregated allocation view across all teachers.
pub async fn allocation_view(
    State(state): State<AppState>,
) -> HandlerResult<Vec<TeacherAllocationView>> {
    let view = db_services::allocation_view(state.repository.as_ref(), None).await?;
    Ok(Json(view))
}

/// GET /allocations/view/{teacher_id}
///
/// Aggregated allocation view for a single teacher.
pub async fn allocation_view_for_teacher(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
) -> HandlerResult<Vec<TeacherAllocationView>> {
    let view = db_services::allocation_view(
        state.repository.as_ref(),
        Some(TeacherId::new(teacher_id)),
    )
    .await?;
    Ok(Json(view))
}

// =============================================================================
// Preferences
// =============================================================================

/// GET /preferences/{teacher_id}
///
/// A teacher's preference list for the configured academic year, ordered by
/// rank.
pub async fn get_preferences(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
) -> HandlerResult<Vec<PreferenceEntry>> {
    let prefs = db_services::teacher_preferences(
        state.repository.as_ref(),
        TeacherId::new(teacher_id),
        &state.academic_year,
    )
    .await?;
    Ok(Json(prefs))
}

/// Parsed body of `POST /preferences`.
#[derive(Debug, PartialEq)]
pub(crate) struct PreferenceSubmission {
    pub teacher_id: TeacherId,
    pub preferences: Vec<PreferenceInput>,
}

/// Validate the raw submission payload.
///
/// `None` means the body is rejected before any store access: missing
/// `teacher_id`, `preferences` that is not an array, or an entry without an
/// integral `subject_id`/`rank`.
pub(crate) fn parse_preference_submission(payload: &Value) -> Option<PreferenceSubmission> {
    let teacher_id = payload.get("teacher_id")?.as_i64()?;
    let entries = payload.get("preferences")?.as_array()?;

    let mut preferences = Vec::with_capacity(entries.len());
    for entry in entries {
        let subject_id = entry.get("subject_id")?.as_i64()?;
        let rank = i32::try_from(entry.get("rank")?.as_i64()?).ok()?;
        preferences.push(PreferenceInput {
            subject_id: SubjectId::new(subject_id),
            rank,
        });
    }

    Some(PreferenceSubmission {
        teacher_id: TeacherId::new(teacher_id),
        preferences,
    })
}

/// POST /preferences
///
/// Atomically replace a teacher's preference list for the configured academic
/// year.
pub async fn submit_preferences(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Msg>), AppError> {
    let submission = parse_preference_submission(&payload)
        .ok_or_else(|| AppError::BadRequest("Invalid data submitted".to_string()))?;

    db_services::submit_preferences(
        state.repository.as_ref(),
        submission.teacher_id,
        &state.academic_year,
        &submission.preferences,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Msg::new("Preferences saved successfully")),
    ))
}

// =============================================================================
// Teachers
// =============================================================================

/// GET /teachers
pub async fn list_teachers(State(state): State<AppState>) -> HandlerResult<Vec<Teacher>> {
    let teachers = db_services::list_teachers(state.repository.as_ref()).await?;
    Ok(Json(teachers))
}

/// POST /teachers
///
/// Register a new teacher.
pub async fn register_teacher(
    State(state): State<AppState>,
    Json(request): Json<RegisterTeacherRequest>,
) -> Result<(StatusCode, Json<Teacher>), AppError> {
    let (Some(name), Some(email), Some(password)) = (
        required(&request.name),
        required(&request.email),
        required(&request.password),
    ) else {
        return Err(AppError::BadRequest(
            "Please enter name, email, and password".to_string(),
        ));
    };

    let registration = TeacherRegistration {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        department: request.department.clone(),
        expertise: request.expertise.clone(),
        max_load: request.max_load,
    };

    let teacher = db_services::register_teacher(state.repository.as_ref(), &registration)
        .await
        .map_err(|e| map_conflict(e, "Teacher with this email already exists"))?;

    Ok((StatusCode::CREATED, Json(teacher)))
}

/// PUT /teachers/{id}
pub async fn update_teacher(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
    Json(request): Json<UpdateTeacherRequest>,
) -> HandlerResult<Teacher> {
    let update = TeacherUpdate {
        name: request.name,
        email: request.email,
        department: request.department,
        expertise: request.expertise,
        max_load: request.max_load,
    };

    let teacher = db_services::update_teacher(
        state.repository.as_ref(),
        TeacherId::new(teacher_id),
        &update,
    )
    .await
    .map_err(|e| map_conflict(e, "Email already in use."))?;
    Ok(Json(teacher))
}

/// DELETE /teachers/{id}
pub async fn delete_teacher(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
) -> HandlerResult<Msg> {
    db_services::delete_teacher(state.repository.as_ref(), TeacherId::new(teacher_id)).await?;
    Ok(Json(Msg::new("Teacher removed")))
}

/// POST /teachers/login
///
/// Authenticate a teacher by email and password.
pub async fn login_teacher(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> HandlerResult<LoginResponse> {
    let (Some(email), Some(password)) =
        (required(&request.email), required(&request.password))
    else {
        return Err(AppError::BadRequest("Please enter all fields".to_string()));
    };

    let teacher = db_services::login_teacher(state.repository.as_ref(), email, password)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid credentials".to_string()))?;

    Ok(Json(LoginResponse {
        msg: "Login successful".to_string(),
        teacher,
    }))
}

// =============================================================================
// Classes
// =============================================================================

/// GET /classes
pub async fn list_classes(State(state): State<AppState>) -> HandlerResult<Vec<Class>> {
    let classes = db_services::list_classes(state.repository.as_ref()).await?;
    Ok(Json(classes))
}

/// POST /classes
pub async fn create_class(
    State(state): State<AppState>,
    Json(request): Json<CreateClassRequest>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let (Some(class_name), Some(semester), Some(year)) = (
        required(&request.class_name),
        request.semester,
        request.year,
    ) else {
        return Err(AppError::BadRequest(
            "Please provide class name, semester, and year".to_string(),
        ));
    };

    let input = ClassInput {
        class_name: class_name.to_string(),
        semester,
        year,
        department: request.department.clone(),
    };

    let class = db_services::create_class(state.repository.as_ref(), &input)
        .await
        .map_err(|e| {
            map_conflict(
                e,
                "A class with this name already exists for the specified year.",
            )
        })?;

    Ok((StatusCode::CREATED, Json(class)))
}

/// PUT /classes/{id}
pub async fn update_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(request): Json<UpdateClassRequest>,
) -> HandlerResult<Class> {
    let input = ClassInput {
        class_name: request.class_name,
        semester: request.semester,
        year: request.year,
        department: request.department,
    };

    let class = db_services::update_class(state.repository.as_ref(), ClassId::new(class_id), &input)
        .await
        .map_err(|e| {
            map_conflict(
                e,
                "A class with this name already exists for the specified year.",
            )
        })?;
    Ok(Json(class))
}

/// DELETE /classes/{id}
pub async fn delete_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> HandlerResult<Msg> {
    db_services::delete_class(state.repository.as_ref(), ClassId::new(class_id)).await?;
    Ok(Json(Msg::new("Class removed")))
}

// =============================================================================
// Subjects
// =============================================================================

/// GET /subjects
pub async fn list_subjects(State(state): State<AppState>) -> HandlerResult<Vec<Subject>> {
    let subjects = db_services::list_subjects(state.repository.as_ref()).await?;
    Ok(Json(subjects))
}

/// POST /subjects
pub async fn create_subject(
    State(state): State<AppState>,
    Json(request): Json<CreateSubjectRequest>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let (Some(subject_code), Some(subject_name)) = (
        required(&request.subject_code),
        required(&request.subject_name),
    ) else {
        return Err(AppError::BadRequest(
            "Please provide subject code and name".to_string(),
        ));
    };

    let input = SubjectInput {
        subject_code: subject_code.to_string(),
        subject_name: subject_name.to_string(),
        department: request.department.clone(),
        credits: request.credits,
    };

    let subject = db_services::create_subject(state.repository.as_ref(), &input)
        .await
        .map_err(|e| map_conflict(e, "Subject code must be unique."))?;

    Ok((StatusCode::CREATED, Json(subject)))
}

/// PUT /subjects/{id}
pub async fn update_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
    Json(request): Json<UpdateSubjectRequest>,
) -> HandlerResult<Subject> {
    let input = SubjectInput {
        subject_code: request.subject_code,
        subject_name: request.subject_name,
        department: request.department,
        credits: request.credits,
    };

    let subject = db_services::update_subject(
        state.repository.as_ref(),
        SubjectId::new(subject_id),
        &input,
    )
    .await
    .map_err(|e| map_conflict(e, "Subject code must be unique."))?;
    Ok(Json(subject))
}

/// DELETE /subjects/{id}
pub async fn delete_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
) -> HandlerResult<Msg> {
    db_services::delete_subject(state.repository.as_ref(), SubjectId::new(subject_id)).await?;
    Ok(Json(Msg::new("Subject removed")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submission_rejects_missing_teacher_id() {
        let payload = json!({ "preferences": [] });
        assert!(parse_preference_submission(&payload).is_none());
    }

    #[test]
    fn test_submission_rejects_non_array_preferences() {
        let payload = json!({ "teacher_id": 1, "preferences": "not-an-array" });
        assert!(parse_preference_submission(&payload).is_none());
    }

    #[test]
    fn test_submission_rejects_malformed_entry() {
        let payload = json!({
            "teacher_id": 1,
            "preferences": [{ "subject_id": 2 }]
        });
        assert!(parse_preference_submission(&payload).is_none());
    }

    #[test]
    fn test_submission_accepts_empty_list() {
        let payload = json!({ "teacher_id": 1, "preferences": [] });
        let parsed = parse_preference_submission(&payload).unwrap();
        assert_eq!(parsed.teacher_id.value(), 1);
        assert!(parsed.preferences.is_empty());
    }

    #[test]
    fn test_submission_preserves_entry_order_and_ranks() {
        let payload = json!({
            "teacher_id": 7,
            "preferences": [
                { "subject_id": 30, "rank": 3 },
                { "subject_id": 10, "rank": 1 },
                { "subject_id": 20, "rank": 2 }
            ]
        });
        let parsed = parse_preference_submission(&payload).unwrap();
        let ranks: Vec<i32> = parsed.preferences.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![3, 1, 2]);
    }
}
