//! Unit tests for the service layer fold and validation logic.

use chrono::NaiveTime;

use super::services::{fold_allocation_rows, submit_preferences};
use crate::api::{AllocationViewRow, PreferenceInput, TeacherId};

fn bare_row(teacher_id: i64, name: &str) -> AllocationViewRow {
    AllocationViewRow {
        teacher_id: TeacherId::new(teacher_id),
        teacher_name: name.to_string(),
        email: format!("{name}@faculty.edu"),
        department: Some("CS".to_string()),
        class_name: None,
        subject_name: None,
        subject_code: None,
        day_of_week: None,
        start_time: None,
        end_time: None,
        academic_year: None,
    }
}

fn joined_row(teacher_id: i64, name: &str, class_name: &str) -> AllocationViewRow {
    let mut row = bare_row(teacher_id, name);
    row.class_name = Some(class_name.to_string());
    row.subject_name = Some("Algorithms".to_string());
    row.subject_code = Some("CS201".to_string());
    row.day_of_week = Some(1);
    row.start_time = NaiveTime::from_hms_opt(9, 0, 0);
    row.end_time = NaiveTime::from_hms_opt(10, 0, 0);
    row.academic_year = Some("2024-2025".to_string());
    row
}

#[test]
fn test_fold_groups_rows_per_teacher_in_first_seen_order() {
    let rows = vec![
        joined_row(1, "ada", "CS-1A"),
        joined_row(1, "ada", "CS-1B"),
        bare_row(2, "brian"),
    ];

    let grouped = fold_allocation_rows(rows);
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped[0].teacher_id.value(), 1);
    assert_eq!(grouped[0].allocations.len(), 2);
    assert_eq!(grouped[0].allocations[0].class_name, "CS-1A");
    assert_eq!(grouped[0].allocations[1].class_name, "CS-1B");
    // Left-join placeholder row: teacher present, empty allocation list.
    assert_eq!(grouped[1].teacher_id.value(), 2);
    assert!(grouped[1].allocations.is_empty());
}

#[test]
fn test_fold_empty_input() {
    assert!(fold_allocation_rows(vec![]).is_empty());
}

#[test]
fn test_fold_never_invents_allocations_from_null_rows() {
    let grouped = fold_allocation_rows(vec![bare_row(5, "carol")]);
    assert_eq!(grouped.len(), 1);
    assert_eq!(grouped[0].name, "carol");
    assert!(grouped[0].allocations.is_empty());
}

#[cfg(feature = "local-repo")]
mod replacement {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::RepositoryError;

    const YEAR: &str = "2024-2025";

    #[tokio::test]
    async fn test_duplicate_rank_rejected_before_store() {
        let repo = LocalRepository::new();
        let teacher = repo.seed_teacher("ada", "ada@faculty.edu");
        let subject_a = repo.seed_subject("CS101", "Intro");
        let subject_b = repo.seed_subject("CS102", "Data Structures");

        let prefs = vec![
            PreferenceInput {
                subject_id: subject_a,
                rank: 1,
            },
            PreferenceInput {
                subject_id: subject_b,
                rank: 1,
            },
        ];

        let err = submit_preferences(&repo, teacher, YEAR, &prefs)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));

        // Nothing was written.
        let stored = crate::db::services::teacher_preferences(&repo, teacher, YEAR)
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_ranks_stored_verbatim() {
        let repo = LocalRepository::new();
        let teacher = repo.seed_teacher("ada", "ada@faculty.edu");
        let subject_a = repo.seed_subject("CS101", "Intro");
        let subject_b = repo.seed_subject("CS102", "Data Structures");

        // Non-contiguous ranks survive as submitted.
        let prefs = vec![
            PreferenceInput {
                subject_id: subject_a,
                rank: 10,
            },
            PreferenceInput {
                subject_id: subject_b,
                rank: 3,
            },
        ];

        let inserted = submit_preferences(&repo, teacher, YEAR, &prefs)
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let stored = crate::db::services::teacher_preferences(&repo, teacher, YEAR)
            .await
            .unwrap();
        let ranks: Vec<i32> = stored.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![3, 10]);
    }
}
