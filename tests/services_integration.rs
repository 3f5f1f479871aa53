//! Integration tests for the service layer against the in-memory repository.
//!
//! These exercise the full call stack below the HTTP handlers: services →
//! repository traits → LocalRepository, including the constraint paths the
//! Postgres schema enforces.

use fas_rust::api::{PreferenceInput, SubjectId, TeacherRegistration};
use fas_rust::db::repositories::LocalRepository;
use fas_rust::db::repository::{PreferenceRepository, RepositoryError};
use fas_rust::db::services;

const YEAR: &str = "2024-2025";

fn registration(name: &str, email: &str) -> TeacherRegistration {
    TeacherRegistration {
        name: name.to_string(),
        email: email.to_string(),
        password: "correct horse battery staple".to_string(),
        department: Some("CS".to_string()),
        expertise: None,
        max_load: Some(12),
    }
}

// =========================================================
// Preference replacement
// =========================================================

#[tokio::test]
async fn test_replacement_is_idempotent() {
    let repo = LocalRepository::new();
    let teacher = repo.seed_teacher("ada", "ada@faculty.edu");
    let s1 = repo.seed_subject("CS101", "Intro");
    let s2 = repo.seed_subject("CS201", "Algorithms");

    let prefs = vec![
        PreferenceInput { subject_id: s1, rank: 1 },
        PreferenceInput { subject_id: s2, rank: 2 },
    ];

    services::submit_preferences(&repo, teacher, YEAR, &prefs)
        .await
        .unwrap();
    let first = services::teacher_preferences(&repo, teacher, YEAR)
        .await
        .unwrap();

    // Same submission again: stored set must be identical, not doubled.
    services::submit_preferences(&repo, teacher, YEAR, &prefs)
        .await
        .unwrap();
    let second = services::teacher_preferences(&repo, teacher, YEAR)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
}

#[tokio::test]
async fn test_replacement_swaps_not_merges() {
    let repo = LocalRepository::new();
    let teacher = repo.seed_teacher("ada", "ada@faculty.edu");
    let s1 = repo.seed_subject("CS101", "Intro");
    let s2 = repo.seed_subject("CS201", "Algorithms");
    let s3 = repo.seed_subject("CS301", "Compilers");

    services::submit_preferences(
        &repo,
        teacher,
        YEAR,
        &[
            PreferenceInput { subject_id: s1, rank: 1 },
            PreferenceInput { subject_id: s2, rank: 2 },
        ],
    )
    .await
    .unwrap();

    // A second submission fully subsumes the first; nothing of the old list
    // survives.
    services::submit_preferences(
        &repo,
        teacher,
        YEAR,
        &[PreferenceInput { subject_id: s3, rank: 1 }],
    )
    .await
    .unwrap();

    let stored = services::teacher_preferences(&repo, teacher, YEAR)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].subject_id, s3);
    assert_eq!(stored[0].rank, 1);
}

#[tokio::test]
async fn test_empty_submission_clears_existing_rows() {
    let repo = LocalRepository::new();
    let teacher = repo.seed_teacher("ada", "ada@faculty.edu");
    let s1 = repo.seed_subject("CS101", "Intro");

    services::submit_preferences(
        &repo,
        teacher,
        YEAR,
        &[PreferenceInput { subject_id: s1, rank: 1 }],
    )
    .await
    .unwrap();

    let inserted = services::submit_preferences(&repo, teacher, YEAR, &[])
        .await
        .unwrap();
    assert_eq!(inserted, 0);

    let stored = services::teacher_preferences(&repo, teacher, YEAR)
        .await
        .unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn test_retrieval_sorted_by_rank_not_insertion_order() {
    let repo = LocalRepository::new();
    let teacher = repo.seed_teacher("ada", "ada@faculty.edu");
    let s1 = repo.seed_subject("CS101", "Intro");
    let s2 = repo.seed_subject("CS201", "Algorithms");
    let s3 = repo.seed_subject("CS301", "Compilers");

    // Ranks submitted out of order: 3, 1, 2.
    services::submit_preferences(
        &repo,
        teacher,
        YEAR,
        &[
            PreferenceInput { subject_id: s1, rank: 3 },
            PreferenceInput { subject_id: s2, rank: 1 },
            PreferenceInput { subject_id: s3, rank: 2 },
        ],
    )
    .await
    .unwrap();

    let stored = services::teacher_preferences(&repo, teacher, YEAR)
        .await
        .unwrap();
    let ranks: Vec<i32> = stored.iter().map(|p| p.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_constraint_violation_leaves_prior_set_intact() {
    let repo = LocalRepository::new();
    let teacher = repo.seed_teacher("ada", "ada@faculty.edu");
    let s1 = repo.seed_subject("CS101", "Intro");
    let s2 = repo.seed_subject("CS201", "Algorithms");

    services::submit_preferences(
        &repo,
        teacher,
        YEAR,
        &[PreferenceInput { subject_id: s1, rank: 1 }],
    )
    .await
    .unwrap();

    // Drive the duplicate-rank batch straight into the store, bypassing the
    // service-layer validation, to exercise the transactional rollback path.
    let err = repo
        .replace_preferences(
            teacher,
            YEAR,
            &[
                PreferenceInput { subject_id: s1, rank: 1 },
                PreferenceInput { subject_id: s2, rank: 1 },
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ConflictError { .. }));

    // The pre-submission set survives untouched.
    let stored = services::teacher_preferences(&repo, teacher, YEAR)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].subject_id, s1);
}

#[tokio::test]
async fn test_unknown_subject_fails_whole_submission() {
    let repo = LocalRepository::new();
    let teacher = repo.seed_teacher("ada", "ada@faculty.edu");
    let s1 = repo.seed_subject("CS101", "Intro");

    services::submit_preferences(
        &repo,
        teacher,
        YEAR,
        &[PreferenceInput { subject_id: s1, rank: 1 }],
    )
    .await
    .unwrap();

    let err = services::submit_preferences(
        &repo,
        teacher,
        YEAR,
        &[
            PreferenceInput { subject_id: s1, rank: 1 },
            PreferenceInput {
                subject_id: SubjectId::new(9999),
                rank: 2,
            },
        ],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepositoryError::QueryError { .. }));

    let stored = services::teacher_preferences(&repo, teacher, YEAR)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_preferences_partitioned_by_academic_year() {
    let repo = LocalRepository::new();
    let teacher = repo.seed_teacher("ada", "ada@faculty.edu");
    let s1 = repo.seed_subject("CS101", "Intro");
    let s2 = repo.seed_subject("CS201", "Algorithms");

    services::submit_preferences(
        &repo,
        teacher,
        "2023-2024",
        &[PreferenceInput { subject_id: s1, rank: 1 }],
    )
    .await
    .unwrap();
    services::submit_preferences(
        &repo,
        teacher,
        YEAR,
        &[PreferenceInput { subject_id: s2, rank: 1 }],
    )
    .await
    .unwrap();

    // Replacing one year never touches the other.
    services::submit_preferences(&repo, teacher, YEAR, &[])
        .await
        .unwrap();

    let old = services::teacher_preferences(&repo, teacher, "2023-2024")
        .await
        .unwrap();
    assert_eq!(old.len(), 1);
    assert_eq!(old[0].subject_id, s1);
}

// =========================================================
// Registration and login
// =========================================================

#[tokio::test]
async fn test_register_then_login() {
    let repo = LocalRepository::new();
    let teacher = services::register_teacher(&repo, &registration("ada", "ada@faculty.edu"))
        .await
        .unwrap();
    assert_eq!(teacher.email, "ada@faculty.edu");

    let logged_in =
        services::login_teacher(&repo, "ada@faculty.edu", "correct horse battery staple")
            .await
            .unwrap()
            .expect("valid credentials must log in");
    assert_eq!(logged_in.teacher_id, teacher.teacher_id);
}

#[tokio::test]
async fn test_login_rejects_wrong_password_and_unknown_email() {
    let repo = LocalRepository::new();
    services::register_teacher(&repo, &registration("ada", "ada@faculty.edu"))
        .await
        .unwrap();

    let wrong = services::login_teacher(&repo, "ada@faculty.edu", "nope")
        .await
        .unwrap();
    assert!(wrong.is_none());

    let unknown = services::login_teacher(&repo, "ghost@faculty.edu", "nope")
        .await
        .unwrap();
    assert!(unknown.is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let repo = LocalRepository::new();
    services::register_teacher(&repo, &registration("ada", "ada@faculty.edu"))
        .await
        .unwrap();

    let err = services::register_teacher(&repo, &registration("imposter", "ada@faculty.edu"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ConflictError { .. }));

    let teachers = services::list_teachers(&repo).await.unwrap();
    assert_eq!(teachers.len(), 1);
}

// =========================================================
// Entity CRUD paths
// =========================================================

#[tokio::test]
async fn test_update_and_delete_missing_teacher() {
    let repo = LocalRepository::new();

    let err = services::update_teacher(
        &repo,
        fas_rust::api::TeacherId::new(404),
        &fas_rust::api::TeacherUpdate {
            name: "nobody".to_string(),
            email: "nobody@faculty.edu".to_string(),
            department: None,
            expertise: None,
            max_load: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    let err = services::delete_teacher(&repo, fas_rust::api::TeacherId::new(404))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_subject_code_uniqueness() {
    let repo = LocalRepository::new();
    let input = fas_rust::api::SubjectInput {
        subject_code: "CS101".to_string(),
        subject_name: "Intro".to_string(),
        department: None,
        credits: Some(4),
    };
    services::create_subject(&repo, &input).await.unwrap();

    let err = services::create_subject(&repo, &input).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConflictError { .. }));
}

#[tokio::test]
async fn test_class_unique_per_year_and_semester() {
    let repo = LocalRepository::new();
    let input = fas_rust::api::ClassInput {
        class_name: "CS-3A".to_string(),
        semester: 1,
        year: 2024,
        department: None,
    };
    services::create_class(&repo, &input).await.unwrap();

    let err = services::create_class(&repo, &input).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConflictError { .. }));

    // Same name in a different year is a different class.
    let mut other_year = input.clone();
    other_year.year = 2025;
    services::create_class(&repo, &other_year).await.unwrap();

    let classes = services::list_classes(&repo).await.unwrap();
    assert_eq!(classes.len(), 2);
    // Ordered by year descending.
    assert_eq!(classes[0].year, 2025);
}

#[tokio::test]
async fn test_deleting_teacher_cascades_preferences() {
    let repo = LocalRepository::new();
    let teacher = repo.seed_teacher("ada", "ada@faculty.edu");
    let s1 = repo.seed_subject("CS101", "Intro");

    services::submit_preferences(
        &repo,
        teacher,
        YEAR,
        &[PreferenceInput { subject_id: s1, rank: 1 }],
    )
    .await
    .unwrap();

    services::delete_teacher(&repo, teacher).await.unwrap();

    let stored = services::teacher_preferences(&repo, teacher, YEAR)
        .await
        .unwrap();
    assert!(stored.is_empty());
}
