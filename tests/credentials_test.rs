mod common;

use common::{credentials_book, row};
use taskboard::credentials::{
    CREDENTIALS_SHEET, Role, add_user, delete_user, load_credentials,
};
use taskboard::{SheetStore, TrackerError};

#[test]
fn incomplete_rows_are_skipped_and_role_defaults_to_user() {
    let book = credentials_book(vec![
        row(&["alice", "pw1", "Alice Smith", ""]),
        row(&["", "pw2", "No Username", "User"]),
        row(&["bob", "", "Bob Jones", "User"]),
        row(&["carol", "pw3", "", "Master"]),
        row(&["dave", "pw4", "Dave Boss", "Master"]),
        row(&["erin", "pw5", "Erin", "Supervisor"]),
    ]);

    let table = load_credentials(&book).unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table.get("alice").unwrap().role, Role::User);
    assert_eq!(table.get("dave").unwrap().role, Role::Master);
    assert_eq!(table.get("erin").unwrap().role, Role::User);
    assert!(table.get("bob").is_none());
}

#[test]
fn wrong_password_and_unknown_user_look_the_same() {
    let book = credentials_book(vec![row(&["alice", "pw1", "Alice Smith", "User"])]);
    let table = load_credentials(&book).unwrap();

    let identity = table.check("alice", "pw1").unwrap();
    assert_eq!(identity.full_name, "Alice Smith");
    assert!(table.check("alice", "nope").is_none());
    assert!(table.check("mallory", "pw1").is_none());
}

#[test]
fn added_users_are_hashed_and_can_log_in() {
    let mut book = credentials_book(vec![]);

    let n = add_user(&mut book, " frank ", "hunter2", "Frank Lee", Role::Master).unwrap();

    assert_eq!(n, 2);
    let raw = book.values(CREDENTIALS_SHEET).unwrap();
    assert_eq!(raw[1][0], "frank");
    assert!(raw[1][1].starts_with("$argon2"));
    assert_eq!(raw[1][3], "Master");

    let identity = load_credentials(&book).unwrap().check("frank", "hunter2").unwrap();
    assert!(identity.is_master());
}

#[test]
fn empty_fields_are_rejected_before_writing() {
    let mut book = credentials_book(vec![]);
    assert!(matches!(
        add_user(&mut book, "gina", "", "Gina", Role::User),
        Err(TrackerError::InvalidInput(_))
    ));
    assert_eq!(book.values(CREDENTIALS_SHEET).unwrap().len(), 1);
}

#[test]
fn duplicate_usernames_first_row_wins() {
    let mut book = credentials_book(vec![]);
    add_user(&mut book, "sam", "first", "Sam One", Role::User).unwrap();
    add_user(&mut book, "sam", "second", "Sam Two", Role::User).unwrap();

    let table = load_credentials(&book).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.check("sam", "first").unwrap().full_name, "Sam One");
    assert!(table.check("sam", "second").is_none());

    assert_eq!(delete_user(&mut book, "sam").unwrap(), 2);
    let table = load_credentials(&book).unwrap();
    assert_eq!(table.check("sam", "second").unwrap().full_name, "Sam Two");
}

#[test]
fn delete_removes_only_the_first_row_containing_the_text() {
    let mut book = credentials_book(vec![
        row(&["alice", "pw", "henry", "User"]),
        row(&["henry", "pw", "Henry Ford", "User"]),
    ]);

    let deleted = delete_user(&mut book, "henry").unwrap();

    assert_eq!(deleted, 2);
    let raw = book.values(CREDENTIALS_SHEET).unwrap();
    assert_eq!(raw.len(), 2);
    assert_eq!(raw[1][0], "henry");
}

#[test]
fn deleting_an_unknown_user_fails() {
    let mut book = credentials_book(vec![row(&["alice", "pw", "Alice", "User"])]);
    assert!(matches!(
        delete_user(&mut book, "Username"),
        Err(TrackerError::UserNotFound(_))
    ));
    assert_eq!(book.values(CREDENTIALS_SHEET).unwrap().len(), 2);
}
