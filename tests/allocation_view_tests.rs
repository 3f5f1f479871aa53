//! Integration tests for the allocation aggregation view.

use chrono::NaiveTime;

use fas_rust::api::{NewAllocation, NewTimeSlot, TeacherId};
use fas_rust::db::repositories::LocalRepository;
use fas_rust::db::repository::AllocationRepository;
use fas_rust::db::services;

const YEAR: &str = "2024-2025";

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

async fn seed_slot(repo: &LocalRepository, day: i16, start: NaiveTime, end: NaiveTime) -> fas_rust::api::TimeSlotId {
    repo.insert_time_slot(&NewTimeSlot {
        day_of_week: day,
        start_time: start,
        end_time: end,
    })
    .await
    .unwrap()
    .timeslot_id
}

#[tokio::test]
async fn test_view_groups_allocations_per_teacher() {
    let repo = LocalRepository::new();
    let alice = repo.seed_teacher("alice", "alice@faculty.edu");
    let bob = repo.seed_teacher("bob", "bob@faculty.edu");
    let subject = repo.seed_subject("CS201", "Algorithms");
    let class_x = repo.seed_class("CS-2A", 1, 2024);
    let class_y = repo.seed_class("CS-2B", 1, 2024);
    let slot = seed_slot(&repo, 1, time(9, 0), time(10, 0)).await;

    for class in [class_x, class_y] {
        repo.insert_allocation(&NewAllocation {
            teacher_id: alice,
            class_id: class,
            subject_id: subject,
            timeslot_id: slot,
            academic_year: YEAR.to_string(),
        })
        .await
        .unwrap();
    }

    let view = services::allocation_view(&repo, None).await.unwrap();

    // alice first (name order), with both classes; bob present with an empty
    // allocation list, not a spurious null entry.
    assert_eq!(view.len(), 2);
    assert_eq!(view[0].teacher_id, alice);
    assert_eq!(view[0].allocations.len(), 2);
    let class_names: Vec<&str> = view[0]
        .allocations
        .iter()
        .map(|a| a.class_name.as_str())
        .collect();
    assert!(class_names.contains(&"CS-2A"));
    assert!(class_names.contains(&"CS-2B"));

    assert_eq!(view[1].teacher_id, bob);
    assert!(view[1].allocations.is_empty());
}

#[tokio::test]
async fn test_view_orders_by_day_then_start_time() {
    let repo = LocalRepository::new();
    let alice = repo.seed_teacher("alice", "alice@faculty.edu");
    let subject = repo.seed_subject("CS201", "Algorithms");
    let class = repo.seed_class("CS-2A", 1, 2024);

    // Seed slots out of order: Wednesday 9:00, Monday 14:00, Monday 9:00.
    let wed_morning = seed_slot(&repo, 3, time(9, 0), time(10, 0)).await;
    let mon_afternoon = seed_slot(&repo, 1, time(14, 0), time(15, 0)).await;
    let mon_morning = seed_slot(&repo, 1, time(9, 0), time(10, 0)).await;

    for slot in [wed_morning, mon_afternoon, mon_morning] {
        repo.insert_allocation(&NewAllocation {
            teacher_id: alice,
            class_id: class,
            subject_id: subject,
            timeslot_id: slot,
            academic_year: YEAR.to_string(),
        })
        .await
        .unwrap();
    }

    let view = services::allocation_view(&repo, None).await.unwrap();
    let order: Vec<(i16, NaiveTime)> = view[0]
        .allocations
        .iter()
        .map(|a| (a.day_of_week, a.start_time))
        .collect();
    assert_eq!(
        order,
        vec![(1, time(9, 0)), (1, time(14, 0)), (3, time(9, 0))]
    );
}

#[tokio::test]
async fn test_view_with_teacher_filter() {
    let repo = LocalRepository::new();
    let alice = repo.seed_teacher("alice", "alice@faculty.edu");
    let bob = repo.seed_teacher("bob", "bob@faculty.edu");
    let subject = repo.seed_subject("CS201", "Algorithms");
    let class = repo.seed_class("CS-2A", 1, 2024);
    let slot = seed_slot(&repo, 1, time(9, 0), time(10, 0)).await;

    repo.insert_allocation(&NewAllocation {
        teacher_id: alice,
        class_id: class,
        subject_id: subject,
        timeslot_id: slot,
        academic_year: YEAR.to_string(),
    })
    .await
    .unwrap();

    let filtered = services::allocation_view(&repo, Some(alice)).await.unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].teacher_id, alice);
    assert_eq!(filtered[0].allocations.len(), 1);
    assert_eq!(filtered[0].allocations[0].academic_year, YEAR);

    // Filtering on a teacher with no allocations still yields the teacher,
    // with an empty list.
    let empty = services::allocation_view(&repo, Some(bob)).await.unwrap();
    assert_eq!(empty.len(), 1);
    assert!(empty[0].allocations.is_empty());

    // Unknown teacher: no rows at all.
    let none = services::allocation_view(&repo, Some(TeacherId::new(9999)))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_view_output_follows_name_order() {
    let repo = LocalRepository::new();
    // Seed in reverse alphabetical order.
    let zoe = repo.seed_teacher("zoe", "zoe@faculty.edu");
    let alice = repo.seed_teacher("alice", "alice@faculty.edu");
    let mia = repo.seed_teacher("mia", "mia@faculty.edu");

    let view = services::allocation_view(&repo, None).await.unwrap();
    let ids: Vec<TeacherId> = view.iter().map(|t| t.teacher_id).collect();
    assert_eq!(ids, vec![alice, mia, zoe]);
}

#[tokio::test]
async fn test_view_empty_store() {
    let repo = LocalRepository::new();
    let view = services::allocation_view(&repo, None).await.unwrap();
    assert!(view.is_empty());
}
