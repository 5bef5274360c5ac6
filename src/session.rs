//! Per-session navigation state.
//!
//! Each browser session owns one [`Session`]; screens change only through
//! [`Session::apply`], and a [`SessionStore`] maps cookie ids to sessions.

use chrono::{Datelike, Local, Month};
use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::credentials::Identity;
use crate::error::{Result, TrackerError};
use crate::goals::GoalEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Screen {
    LoggedOut,
    Dashboard,
    AddTask,
    /// Editing a snapshot of the entry taken when Edit was pressed.
    EditTask(GoalEntry),
    MasterDashboard,
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::LoggedOut => "login",
            Screen::Dashboard => "dashboard",
            Screen::AddTask => "add task",
            Screen::EditTask(_) => "edit task",
            Screen::MasterDashboard => "master dashboard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LoginSucceeded(Identity),
    Home,
    Cancel,
    /// A form was saved successfully.
    Saved,
    AddNewTask,
    Edit(GoalEntry),
    OpenAdmin,
    SelectMonth(Month),
    Logout,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::LoginSucceeded(_) => "log in",
            Action::Home => "go home",
            Action::Cancel => "cancel",
            Action::Saved => "save",
            Action::AddNewTask => "add a task",
            Action::Edit(_) => "edit",
            Action::OpenAdmin => "open administration",
            Action::SelectMonth(_) => "select a month",
            Action::Logout => "log out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Option<Identity>,
    pub month: Month,
    pub screen: Screen,
    /// Date label of the last daily update posted in this session.
    pub last_update_date: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            identity: None,
            month: current_month(),
            screen: Screen::LoggedOut,
            last_update_date: None,
        }
    }
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Move to the next screen, or refuse with `InvalidTransition`.
    pub fn apply(&mut self, action: Action) -> Result<()> {
        debug!("{} -> {}", self.screen.name(), action.name());
        let is_master = self.identity.as_ref().is_some_and(Identity::is_master);
        let logged_out = self.screen == Screen::LoggedOut;

        match (logged_out, action) {
            (true, Action::LoginSucceeded(identity)) => {
                self.screen = if identity.is_master() {
                    Screen::MasterDashboard
                } else {
                    Screen::Dashboard
                };
                self.identity = Some(identity);
            }
            (true, action) | (false, action @ Action::LoginSucceeded(_)) => {
                return Err(self.invalid(&action));
            }
            (false, Action::Logout) => *self = Session::default(),
            (false, Action::Home | Action::Cancel | Action::Saved) => {
                self.screen = Screen::Dashboard
            }
            (false, Action::AddNewTask) => self.screen = Screen::AddTask,
            (false, Action::Edit(entry)) => self.screen = Screen::EditTask(entry),
            (false, Action::OpenAdmin) if is_master => self.screen = Screen::MasterDashboard,
            (false, Action::OpenAdmin) => return Err(TrackerError::Forbidden),
            (false, Action::SelectMonth(month)) => self.month = month,
        }
        Ok(())
    }

    fn invalid(&self, action: &Action) -> TrackerError {
        TrackerError::InvalidTransition {
            from: self.screen.name().to_string(),
            action: action.name().to_string(),
        }
    }
}

pub fn current_month() -> Month {
    Month::try_from(Local::now().month() as u8).unwrap_or(Month::January)
}

struct Slot {
    session: Session,
    expires_at: SystemTime,
}

/// Live sessions keyed by an opaque id carried in the session cookie.
pub struct SessionStore {
    lifetime: Duration,
    slots: HashMap<String, Slot>,
}

impl SessionStore {
    pub fn new(lifetime: Duration) -> Self {
        SessionStore {
            lifetime,
            slots: HashMap::new(),
        }
    }

    /// Start a fresh logged-out session and return its id.
    pub fn create(&mut self) -> String {
        let id = Uuid::new_v4().to_string();
        self.slots.insert(
            id.clone(),
            Slot {
                session: Session::default(),
                expires_at: SystemTime::now() + self.lifetime,
            },
        );
        id
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.slots
            .get(id)
            .filter(|slot| slot.expires_at > SystemTime::now())
            .map(|slot| &slot.session)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.slots
            .get_mut(id)
            .filter(|slot| slot.expires_at > SystemTime::now())
            .map(|slot| &mut slot.session)
    }

    pub fn remove(&mut self, id: &str) {
        self.slots.remove(id);
    }

    /// Drop expired sessions and return how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = SystemTime::now();
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.expires_at > now);
        before - self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
