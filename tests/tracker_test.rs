mod common;

use chrono::Month;
use common::{empty_book, goal_row, row};
use pretty_assertions::assert_eq;
use taskboard::config::{BootstrapConfig, CacheConfig};
use taskboard::credentials::{CREDENTIALS_SHEET, Identity, Role};
use taskboard::daily::DAILY_SHEET;
use taskboard::goals::{GOALS_SHEET, GoalDraft, Task, TaskStatus};
use taskboard::{SheetStore, Tracker, TrackerError, Workbook};

fn tracker() -> Tracker<Workbook> {
    Tracker::new(empty_book(), &CacheConfig::default())
}

fn master() -> Identity {
    Identity {
        username: "boss".to_string(),
        full_name: "Big Boss".to_string(),
        role: Role::Master,
    }
}

fn user(full_name: &str) -> Identity {
    Identity {
        username: full_name.to_lowercase(),
        full_name: full_name.to_string(),
        role: Role::User,
    }
}

fn draft(goal: &str, tasks: &[&str]) -> GoalDraft {
    GoalDraft::new(
        "IT",
        goal,
        tasks.iter().map(|t| Task::new(t, TaskStatus::Working)).collect(),
    )
}

#[test]
fn schema_is_created_once() {
    let mut tracker = Tracker::new(Workbook::new("DataCollection"), &CacheConfig::default());

    assert_eq!(tracker.ensure_schema().unwrap().len(), 3);
    assert!(tracker.ensure_schema().unwrap().is_empty());
    assert_eq!(tracker.store().values(DAILY_SHEET).unwrap(), vec![row(&["Name"])]);
}

#[test]
fn bootstrap_only_on_an_empty_credentials_sheet() {
    let mut tracker = tracker();
    let bootstrap = BootstrapConfig {
        username: "admin".to_string(),
        password: "changeme".to_string(),
        name: "Admin".to_string(),
    };

    assert!(tracker.bootstrap_master(&bootstrap).unwrap());
    assert!(!tracker.bootstrap_master(&bootstrap).unwrap());

    let identity = tracker.authenticate("admin", "changeme").unwrap().unwrap();
    assert!(identity.is_master());
}

#[test]
fn added_goals_are_visible_immediately() {
    let mut tracker = tracker();
    let alice = user("Alice");
    assert!(tracker.user_month("Alice", Month::March).unwrap().is_empty());

    let row = tracker.add_goal(&alice, Month::March, &draft("Ship", &["a", "b"])).unwrap();

    assert_eq!(row, 2);
    let entries = tracker.user_month("Alice", Month::March).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].tasks.len(), 2);
    assert!(tracker.user_month("Alice", Month::April).unwrap().is_empty());
}

#[test]
fn invalid_drafts_are_not_written() {
    let mut tracker = tracker();
    let alice = user("Alice");

    let err = tracker.add_goal(&alice, Month::March, &draft("", &["a"])).unwrap_err();
    assert_eq!(err.to_string(), "Please enter a main goal");
    let err = tracker.add_goal(&alice, Month::March, &draft("Ship", &["  "])).unwrap_err();
    assert_eq!(err.to_string(), "Please add at least one task");

    assert_eq!(tracker.store().values(GOALS_SHEET).unwrap().len(), 1);
}

#[test]
fn edits_keep_department_and_month_and_refresh_the_cache() {
    let mut tracker = tracker();
    let alice = user("Alice");
    tracker.add_goal(&alice, Month::March, &draft("Ship", &["a"])).unwrap();
    let entry = tracker.user_month("Alice", Month::March).unwrap().remove(0);

    let edit = GoalDraft::new("Finance", "Ship it", vec![Task::new("a", TaskStatus::Completed)]);
    tracker.save_edit(&alice, &entry, &edit).unwrap();

    let entry = tracker.user_month("Alice", Month::March).unwrap().remove(0);
    assert_eq!(entry.goal, "Ship it");
    assert_eq!(entry.department, "IT");
    assert_eq!(entry.tasks[0].status, TaskStatus::Completed);
}

#[test]
fn only_the_owner_can_edit_an_entry() {
    let mut tracker = tracker();
    tracker.add_goal(&user("Alice"), Month::March, &draft("Ship", &["a"])).unwrap();
    let entry = tracker.user_month("Alice", Month::March).unwrap().remove(0);

    assert!(matches!(
        tracker.save_edit(&user("Bob"), &entry, &draft("Mine now", &["x"])),
        Err(TrackerError::Forbidden)
    ));
}

#[test]
fn current_entry_is_the_latest_row() {
    let mut tracker = tracker();
    let alice = user("Alice");
    tracker.add_goal(&alice, Month::March, &draft("first", &["a"])).unwrap();
    tracker.add_goal(&user("Bob"), Month::March, &draft("bob", &["a"])).unwrap();
    tracker.add_goal(&alice, Month::April, &draft("second", &["a"])).unwrap();

    let entry = tracker.current_entry(&alice).unwrap().unwrap();
    assert_eq!(entry.goal, "second");
    assert_eq!(entry.row, 4);
}

#[test]
fn new_accounts_can_log_in_without_waiting_for_the_cache() {
    let mut tracker = tracker();
    assert!(tracker.authenticate("carol", "pw").unwrap().is_none());

    tracker.add_user(&master(), "carol", "pw", "Carol", Role::User).unwrap();
    assert_eq!(tracker.authenticate("carol", "pw").unwrap().unwrap().full_name, "Carol");

    tracker.delete_user(&master(), "carol").unwrap();
    assert!(tracker.authenticate("carol", "pw").unwrap().is_none());
}

#[test]
fn administration_requires_the_master_role() {
    let mut tracker = tracker();
    let alice = user("Alice");

    assert!(matches!(
        tracker.add_user(&alice, "x", "y", "Z", Role::Master),
        Err(TrackerError::Forbidden)
    ));
    assert!(matches!(tracker.delete_user(&alice, "x"), Err(TrackerError::Forbidden)));
    assert!(matches!(tracker.list_users(&alice), Err(TrackerError::Forbidden)));
    assert!(matches!(tracker.all_goals(&alice), Err(TrackerError::Forbidden)));
    assert!(matches!(tracker.all_updates(&alice), Err(TrackerError::Forbidden)));
    assert!(matches!(
        tracker.add_date_columns(&alice, &["03-Jan-2025".to_string()]),
        Err(TrackerError::Forbidden)
    ));
    assert_eq!(tracker.store().values(CREDENTIALS_SHEET).unwrap().len(), 1);
}

#[test]
fn credentials_are_never_exported() {
    let tracker = tracker();
    assert!(matches!(
        tracker.export_rows(&master(), CREDENTIALS_SHEET),
        Err(TrackerError::Forbidden)
    ));
    assert_eq!(tracker.export_rows(&master(), GOALS_SHEET).unwrap().len(), 1);
}

#[test]
fn daily_updates_round_trip_through_the_tracker() {
    let mut tracker = tracker();
    let alice = user("Alice");

    tracker.log_daily_update(&alice, "02-Jan-2025", "Wrote tests").unwrap();

    assert_eq!(
        tracker.latest_update(&alice).unwrap(),
        Some(("02-Jan-2025".to_string(), "Wrote tests".to_string()))
    );
    let updates = tracker.all_updates(&master()).unwrap();
    assert_eq!(updates[1], row(&["Alice", "", "Wrote tests"]));
}

#[test]
fn master_sees_every_goal_row() {
    let mut book = empty_book();
    book.put_rows(
        GOALS_SHEET,
        vec![
            row(&taskboard::goals::GOAL_HEADERS),
            goal_row(&["Alice", "IT", "g1", "March", "t", "Working"]),
            goal_row(&["Bob", "HR", "g2", "April", "t", "Completed"]),
        ],
    );
    let tracker = Tracker::new(book, &CacheConfig::default());

    let goals = tracker.all_goals(&master()).unwrap();
    assert_eq!(goals.len(), 2);
    assert_eq!(goals[1].full_name, "Bob");
}

#[test]
fn missing_credentials_sheet_is_an_error_not_a_failed_login() {
    let mut tracker = Tracker::new(Workbook::new("DataCollection"), &CacheConfig::default());
    assert!(matches!(
        tracker.authenticate("alice", "pw"),
        Err(TrackerError::WorksheetNotFound(_))
    ));
}
