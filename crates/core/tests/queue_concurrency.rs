//! Concurrent writers against one queue database.
//!
//! Every test opens several independent stores on the same SQLite file, the
//! way separate processes would.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

use chrono::Utc;
use tempfile::TempDir;

use cadence_core::{
    testing::fixtures, ItemError, ItemState, ItemStore, LifecycleError, SchedulePolicy,
    ScheduleStore, Scheduler, SqliteItemStore, SqliteScheduleStore, Transition,
};

const WRITERS: usize = 8;

fn open_items(path: &Path) -> Arc<SqliteItemStore> {
    Arc::new(SqliteItemStore::new(path).expect("Failed to open item store"))
}

fn open_entries(path: &Path) -> Arc<SqliteScheduleStore> {
    Arc::new(SqliteScheduleStore::new(path).expect("Failed to open schedule store"))
}

#[test]
fn test_concurrent_approvals_agree() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("queue.db");
    let item = open_items(&db_path)
        .append(fixtures::new_item("approve me"))
        .unwrap();

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let store = open_items(&db_path);
            let barrier = Arc::clone(&barrier);
            let id = item.id.clone();
            thread::spawn(move || {
                barrier.wait();
                store.apply(&id, &Transition::Approve)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("writer panicked").expect("approve failed"))
        .collect();

    let first_approval = results[0].approved_at;
    assert!(first_approval.is_some());
    for approved in &results {
        assert_eq!(approved.state, ItemState::Approved);
        assert_eq!(approved.approved_at, first_approval);
    }
}

#[test]
fn test_concurrent_edits_lose_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("queue.db");
    let item = open_items(&db_path)
        .append(fixtures::new_item("base"))
        .unwrap();

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let store = open_items(&db_path);
            let barrier = Arc::clone(&barrier);
            let id = item.id.clone();
            thread::spawn(move || {
                barrier.wait();
                store.update_atomic(&id, &|current| {
                    let mut next = current.clone();
                    next.content = format!("{} w{}", current.content, writer);
                    next.state = ItemState::Edited;
                    next.edited_at = Some(current.created_at);
                    Ok(next)
                })
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer panicked").expect("edit failed");
    }

    let content = open_items(&db_path).get(&item.id).unwrap().content;
    for writer in 0..WRITERS {
        assert!(
            content.contains(&format!(" w{}", writer)),
            "edit from writer {} was lost: {:?}",
            writer,
            content
        );
    }
}

#[test]
fn test_approve_racing_posted_item_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("queue.db");
    let items = open_items(&db_path);
    let entries = open_entries(&db_path);

    fixtures::approved_item(items.as_ref(), "only one");
    Scheduler::new(
        Arc::clone(&items) as Arc<dyn ItemStore>,
        entries as Arc<dyn ScheduleStore>,
        SchedulePolicy::default(),
    )
    .run(Utc::now())
    .unwrap();

    let id = items.list_all().unwrap().into_vec()[0].id.clone();
    let posted = items
        .apply(
            &id,
            &Transition::RecordPublish(cadence_core::PublishResult::Success {
                external_ref: "x-1".to_string(),
            }),
        )
        .unwrap();

    let other = open_items(&db_path);
    let err = other.apply(&id, &Transition::Approve).unwrap_err();
    assert!(matches!(
        err,
        ItemError::Conflict {
            source: LifecycleError::IllegalTransition {
                from: ItemState::Posted,
                ..
            },
            ..
        }
    ));
    assert_eq!(other.get(&id).unwrap(), posted);
}

#[test]
fn test_concurrent_schedulers_assign_each_item_once() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("queue.db");

    let seed = open_items(&db_path);
    let ids: Vec<String> = (0..12)
        .map(|i| fixtures::approved_item(seed.as_ref(), &format!("post {}", i)).id)
        .collect();

    let schedulers = 4;
    let barrier = Arc::new(Barrier::new(schedulers));
    let handles: Vec<_> = (0..schedulers)
        .map(|_| {
            let items = open_items(&db_path);
            let entries = open_entries(&db_path);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let scheduler = Scheduler::new(
                    items as Arc<dyn ItemStore>,
                    entries as Arc<dyn ScheduleStore>,
                    SchedulePolicy::default(),
                )
                .with_start_date(Some(fixtures::anchor()));
                barrier.wait();
                scheduler.run(fixtures::before_anchor())
            })
        })
        .collect();

    let mut assigned = 0;
    for handle in handles {
        let report = handle.join().expect("scheduler panicked").expect("run failed");
        assert!(report.is_clean(), "failures: {:?}", report.failed);
        assigned += report.assigned.len();
    }
    assert_eq!(assigned, ids.len());

    let entries = open_entries(&db_path).list_all().unwrap();
    assert_eq!(entries.len(), ids.len());

    let positions: HashSet<_> = entries.iter().map(|e| (e.day, e.time_slot)).collect();
    assert_eq!(positions.len(), entries.len());

    let items = open_items(&db_path);
    for entry in &entries {
        let item = items.get(&entry.item_id).unwrap();
        assert_eq!(item.state, ItemState::Scheduled);
        assert_eq!(item.scheduled_slot, Some(entry.slot()));
    }
}

#[test]
fn test_reopened_store_sees_committed_state() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("queue.db");

    let id = {
        let store = open_items(&db_path);
        let item = store.append(fixtures::new_item("durable")).unwrap();
        store
            .apply(
                &item.id,
                &Transition::Edit {
                    content: "durable, edited".to_string(),
                },
            )
            .unwrap();
        item.id
    };

    let reopened = open_items(&db_path);
    let item = reopened.get(&id).unwrap();
    assert_eq!(item.content, "durable, edited");
    assert_eq!(item.state, ItemState::Edited);
}
