//! Data Transfer Objects for the HTTP API.
//!
//! Response types are mostly re-exported from [`crate::api`], which already
//! derives Serialize/Deserialize. Request bodies whose required fields the
//! original contract checks by hand use `Option` fields so the handlers can
//! answer with the documented `{"msg": ...}` bodies instead of a generic
//! deserialization rejection.

use serde::{Deserialize, Serialize};

// Re-export existing DTOs that are already serializable
pub use crate::api::{
    AllocationDetail, Class, PreferenceEntry, Subject, Teacher, TeacherAllocationView,
};
pub use crate::http::error::Msg;

/// Request body for registering a teacher. Name, email and password are
/// required; the handler validates them.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterTeacherRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub expertise: Option<String>,
    #[serde(default)]
    pub max_load: Option<i32>,
}

/// Request body for `PUT /teachers/{id}`. Every field is written.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTeacherRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub expertise: Option<String>,
    #[serde(default)]
    pub max_load: Option<i32>,
}

/// Request body for `POST /teachers/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response body for a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub msg: String,
    pub teacher: Teacher,
}

/// Request body for creating a class. Name, semester and year are required.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClassRequest {
    pub class_name: Option<String>,
    pub semester: Option<i32>,
    pub year: Option<i32>,
    #[serde(default)]
    pub department: Option<String>,
}

/// Request body for `PUT /classes/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateClassRequest {
    pub class_name: String,
    pub semester: i32,
    pub year: i32,
    #[serde(default)]
    pub department: Option<String>,
}

/// Request body for creating a subject. Code and name are required.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubjectRequest {
    pub subject_code: Option<String>,
    pub subject_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub credits: Option<i32>,
}

/// Request body for `PUT /subjects/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSubjectRequest {
    pub subject_code: String,
    pub subject_name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub credits: Option<i32>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// API version
    pub version: String,
    /// Database connectivity status
    pub database: String,
}
