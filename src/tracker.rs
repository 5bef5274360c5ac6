//! The operations the screens call, over one store with its query caches.

use chrono::Month;
use log::{error, info, warn};

use crate::cache::QueryCache;
use crate::config::{BootstrapConfig, CacheConfig};
use crate::credentials::{self, CREDENTIAL_HEADERS, CREDENTIALS_SHEET, CredentialTable, Identity, Role};
use crate::daily::{self, DAILY_SHEET, DailyOutcome, NAME_HEADER};
use crate::error::{Result, TrackerError};
use crate::goals::{self, GOAL_HEADERS, GOALS_SHEET, GoalDraft, GoalEntry};
use crate::sheet::{ScanOrder, SheetStore};

pub struct Tracker<S: SheetStore> {
    store: S,
    credentials: QueryCache<(), CredentialTable>,
    goals: QueryCache<(String, Month), Vec<GoalEntry>>,
}

impl<S: SheetStore> Tracker<S> {
    pub fn new(store: S, cache: &CacheConfig) -> Self {
        Tracker {
            store,
            credentials: QueryCache::new(cache.credentials_max_age()),
            goals: QueryCache::new(cache.goals_max_age()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Create any of the three worksheets that do not exist yet, with their headers.
    pub fn ensure_schema(&mut self) -> Result<Vec<String>> {
        let titles = self.store.worksheet_titles();
        let mut created = Vec::new();
        let schema: [(&str, &[&str]); 3] = [
            (CREDENTIALS_SHEET, &CREDENTIAL_HEADERS),
            (GOALS_SHEET, &GOAL_HEADERS),
            (DAILY_SHEET, &[NAME_HEADER]),
        ];
        for (title, headers) in schema {
            if !titles.iter().any(|t| t == title) {
                self.store.add_worksheet(title, headers)?;
                info!("Created worksheet '{}'", title);
                created.push(title.to_string());
            }
        }
        Ok(created)
    }

    /// Add the configured Master account when no credential exists. Returns whether one was added.
    pub fn bootstrap_master(&mut self, bootstrap: &BootstrapConfig) -> Result<bool> {
        if !self.credential_table()?.is_empty() {
            return Ok(false);
        }
        credentials::add_user(
            &mut self.store,
            &bootstrap.username,
            &bootstrap.password,
            &bootstrap.name,
            Role::Master,
        )?;
        self.invalidate();
        warn!("Created bootstrap Master account '{}'", bootstrap.username);
        Ok(true)
    }

    /// Drop every cached query result.
    pub fn invalidate(&mut self) {
        self.credentials.invalidate_all();
        self.goals.invalidate_all();
    }

    pub fn credential_table(&mut self) -> Result<CredentialTable> {
        if let Some(table) = self.credentials.get(&()) {
            return Ok(table);
        }
        let table = credentials::load_credentials(&self.store).inspect_err(|e| {
            error!("Error retrieving credentials: {}", e);
        })?;
        self.credentials.insert((), table.clone());
        Ok(table)
    }

    /// `Ok(None)` for an unknown user or a wrong password alike.
    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<Option<Identity>> {
        let identity = self.credential_table()?.check(username, password);
        match &identity {
            Some(id) => info!("'{}' logged in as {}", id.username, id.role),
            None => info!("Failed login for '{}'", username),
        }
        Ok(identity)
    }

    pub fn user_month(&mut self, full_name: &str, month: Month) -> Result<Vec<GoalEntry>> {
        let key = (full_name.to_string(), month);
        if let Some(entries) = self.goals.get(&key) {
            return Ok(entries);
        }
        let entries = goals::load_user_month(&self.store, full_name, month)?;
        self.goals.insert(key, entries.clone());
        Ok(entries)
    }

    /// The user's most recently added goal row.
    pub fn current_entry(&self, identity: &Identity) -> Result<Option<GoalEntry>> {
        goals::find_entry(&self.store, &identity.full_name, ScanOrder::LastMatch)
    }

    pub fn add_goal(&mut self, identity: &Identity, month: Month, draft: &GoalDraft) -> Result<usize> {
        draft.validate()?;
        let row = goals::append_row(&mut self.store, &identity.full_name, month, draft)?;
        self.invalidate();
        Ok(row)
    }

    /// Overwrite `entry`'s row. The department and month stay those of the entry.
    pub fn save_edit(&mut self, identity: &Identity, entry: &GoalEntry, draft: &GoalDraft) -> Result<()> {
        if entry.full_name != identity.full_name {
            return Err(TrackerError::Forbidden);
        }
        let draft = GoalDraft {
            department: entry.department.clone(),
            ..draft.clone()
        };
        goals::update_row(&mut self.store, entry.row, &entry.full_name, &entry.month, &draft)?;
        self.invalidate();
        Ok(())
    }

    pub fn log_daily_update(&mut self, identity: &Identity, date_key: &str, text: &str) -> Result<DailyOutcome> {
        daily::log_update(&mut self.store, &identity.full_name, date_key, text)
    }

    pub fn latest_update(&self, identity: &Identity) -> Result<Option<(String, String)>> {
        daily::latest_update(&self.store, &identity.full_name)
    }

    pub fn add_user(
        &mut self,
        actor: &Identity,
        username: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> Result<usize> {
        require_master(actor)?;
        let row = credentials::add_user(&mut self.store, username, password, full_name, role)?;
        self.invalidate();
        Ok(row)
    }

    pub fn delete_user(&mut self, actor: &Identity, username: &str) -> Result<usize> {
        require_master(actor)?;
        let row = credentials::delete_user(&mut self.store, username)?;
        self.invalidate();
        Ok(row)
    }

    pub fn list_users(&mut self, actor: &Identity) -> Result<Vec<Identity>> {
        require_master(actor)?;
        Ok(self
            .credential_table()?
            .iter()
            .map(|c| Identity {
                username: c.username.clone(),
                full_name: c.full_name.clone(),
                role: c.role,
            })
            .collect())
    }

    pub fn all_goals(&self, actor: &Identity) -> Result<Vec<GoalEntry>> {
        require_master(actor)?;
        goals::all_entries(&self.store)
    }

    pub fn all_updates(&self, actor: &Identity) -> Result<Vec<Vec<String>>> {
        require_master(actor)?;
        daily::all_updates(&self.store)
    }

    /// Add date labels to the Daily Updates header row.
    pub fn add_date_columns(&mut self, actor: &Identity, date_keys: &[String]) -> Result<usize> {
        require_master(actor)?;
        daily::add_date_columns(&mut self.store, date_keys)
    }

    /// Raw rows of a data worksheet, for export. Credentials are not exportable.
    pub fn export_rows(&self, actor: &Identity, sheet: &str) -> Result<Vec<Vec<String>>> {
        require_master(actor)?;
        if sheet == CREDENTIALS_SHEET {
            return Err(TrackerError::Forbidden);
        }
        self.store.values(sheet)
    }
}

fn require_master(actor: &Identity) -> Result<()> {
    if actor.is_master() {
        Ok(())
    } else {
        warn!("'{}' attempted a Master action", actor.username);
        Err(TrackerError::Forbidden)
    }
}
