use chrono::Month;
use pretty_assertions::assert_eq;
use std::time::Duration;
use taskboard::TrackerError;
use taskboard::credentials::{Identity, Role};
use taskboard::goals::GoalEntry;
use taskboard::session::{Action, Screen, Session, SessionStore};

fn identity(role: Role) -> Identity {
    Identity {
        username: "alice".to_string(),
        full_name: "Alice Smith".to_string(),
        role,
    }
}

fn logged_in(role: Role) -> Session {
    let mut session = Session::default();
    session.apply(Action::LoginSucceeded(identity(role))).unwrap();
    session
}

fn entry() -> GoalEntry {
    GoalEntry {
        full_name: "Alice Smith".to_string(),
        department: "IT".to_string(),
        goal: "Migrate".to_string(),
        month: "March".to_string(),
        tasks: vec![],
        row: 2,
    }
}

#[test]
fn login_lands_on_the_dashboard_for_the_role() {
    assert_eq!(logged_in(Role::User).screen, Screen::Dashboard);
    assert_eq!(logged_in(Role::Master).screen, Screen::MasterDashboard);
}

#[test]
fn nothing_but_login_is_allowed_while_logged_out() {
    let mut session = Session::default();
    for action in [Action::Home, Action::AddNewTask, Action::Logout, Action::OpenAdmin] {
        assert!(matches!(
            session.apply(action),
            Err(TrackerError::InvalidTransition { .. })
        ));
    }
    assert_eq!(session.screen, Screen::LoggedOut);
    assert!(session.identity.is_none());
}

#[test]
fn logging_in_twice_is_refused() {
    let mut session = logged_in(Role::User);
    let err = session
        .apply(Action::LoginSucceeded(identity(Role::Master)))
        .unwrap_err();
    assert!(matches!(err, TrackerError::InvalidTransition { .. }));
    assert_eq!(session.identity.unwrap().role, Role::User);
}

#[test]
fn task_screens_return_to_the_dashboard() {
    let mut session = logged_in(Role::User);

    session.apply(Action::AddNewTask).unwrap();
    assert_eq!(session.screen, Screen::AddTask);
    session.apply(Action::Cancel).unwrap();
    assert_eq!(session.screen, Screen::Dashboard);

    session.apply(Action::Edit(entry())).unwrap();
    assert_eq!(session.screen, Screen::EditTask(entry()));
    session.apply(Action::Saved).unwrap();
    assert_eq!(session.screen, Screen::Dashboard);
}

#[test]
fn master_moves_between_dashboards() {
    let mut session = logged_in(Role::Master);
    session.apply(Action::Home).unwrap();
    assert_eq!(session.screen, Screen::Dashboard);
    session.apply(Action::OpenAdmin).unwrap();
    assert_eq!(session.screen, Screen::MasterDashboard);
}

#[test]
fn users_cannot_open_administration() {
    let mut session = logged_in(Role::User);
    assert!(matches!(session.apply(Action::OpenAdmin), Err(TrackerError::Forbidden)));
    assert_eq!(session.screen, Screen::Dashboard);
}

#[test]
fn month_selection_keeps_the_screen() {
    let mut session = logged_in(Role::User);
    session.apply(Action::AddNewTask).unwrap();
    session.apply(Action::SelectMonth(Month::July)).unwrap();
    assert_eq!(session.month, Month::July);
    assert_eq!(session.screen, Screen::AddTask);
}

#[test]
fn logout_clears_everything() {
    let mut session = logged_in(Role::Master);
    session.last_update_date = Some("01-Jan-2025".to_string());
    session.apply(Action::Logout).unwrap();

    assert_eq!(session.screen, Screen::LoggedOut);
    assert!(session.identity.is_none());
    assert!(session.last_update_date.is_none());
}

#[test]
fn sessions_are_isolated_and_expire() {
    let mut store = SessionStore::new(Duration::from_secs(60));
    let a = store.create();
    let b = store.create();
    assert_ne!(a, b);

    store.get_mut(&a).unwrap().apply(Action::LoginSucceeded(identity(Role::User))).unwrap();
    assert!(store.get(&a).unwrap().is_authenticated());
    assert!(!store.get(&b).unwrap().is_authenticated());

    store.remove(&a);
    assert!(store.get(&a).is_none());

    let mut expired = SessionStore::new(Duration::ZERO);
    let id = expired.create();
    assert!(expired.get(&id).is_none());
    assert_eq!(expired.purge_expired(), 1);
    assert!(expired.is_empty());
}
