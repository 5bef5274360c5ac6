use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TrackerError};
use crate::sheet::SheetStore;

pub const CREDENTIALS_SHEET: &str = "Credentials";
pub const CREDENTIAL_HEADERS: [&str; 4] = ["Username", "Password", "Name", "Role"];
const USERNAME_COL: usize = 1;

/// Access tier of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    User,
    Master,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Master => write!(f, "Master"),
        }
    }
}

impl FromStr for Role {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "User" => Ok(Role::User),
            "Master" => Ok(Role::Master),
            other => Err(TrackerError::InvalidInput(format!("Unknown role '{}'", other))),
        }
    }
}

/// Who is logged in. Cached into the session after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

impl Identity {
    pub fn is_master(&self) -> bool {
        self.role == Role::Master
    }
}

/// One row of the Credentials sheet. `password` holds whatever the sheet
/// stores: an Argon2 PHC string, or plaintext on rows written before hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

/// Credentials in sheet order. Usernames are not unique; lookups take the first row.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    entries: Vec<Credential>,
}

impl CredentialTable {
    pub fn get(&self, username: &str) -> Option<&Credential> {
        self.entries.iter().find(|c| c.username == username)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check a username/password pair. Unknown users and wrong passwords both give `None`.
    pub fn check(&self, username: &str, password: &str) -> Option<Identity> {
        let cred = self.get(username)?;
        if !verify_password(password, &cred.password) {
            return None;
        }
        Some(Identity {
            username: cred.username.clone(),
            full_name: cred.full_name.clone(),
            role: cred.role,
        })
    }
}

/// Read every credential row. Rows missing a username, password or name are skipped.
pub fn load_credentials(store: &impl SheetStore) -> Result<CredentialTable> {
    let records = store.records(CREDENTIALS_SHEET)?;
    let mut entries = Vec::with_capacity(records.len());

    for record in records {
        let username = record.field("Username").trim();
        let password = record.field("Password");
        let full_name = record.field("Name").trim();
        if username.is_empty() || password.is_empty() || full_name.is_empty() {
            continue;
        }
        let role = record.field("Role").parse().unwrap_or_else(|e| {
            warn!("{} for '{}', treating as User", e, username);
            Role::User
        });
        entries.push(Credential {
            username: username.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            role,
        });
    }

    Ok(CredentialTable { entries })
}

/// Append an account row. Duplicate usernames are accepted; the first row wins on lookup.
pub fn add_user(
    store: &mut impl SheetStore,
    username: &str,
    password: &str,
    full_name: &str,
    role: Role,
) -> Result<usize> {
    let username = username.trim();
    let full_name = full_name.trim();
    if username.is_empty() || password.is_empty() || full_name.is_empty() {
        return Err(TrackerError::InvalidInput(
            "Username, password and name cannot be empty".to_string(),
        ));
    }

    let password_hash = hash_password(password)?;
    let row = store.append_row(
        CREDENTIALS_SHEET,
        vec![
            username.to_string(),
            password_hash,
            full_name.to_string(),
            role.to_string(),
        ],
    )?;
    info!("Added {} account '{}' at row {}", role, username, row);
    Ok(row)
}

/// Delete the row holding the first cell, anywhere below the header, equal to `username`.
///
/// The match is not restricted to the Username column, so a name or password
/// cell with the same text deletes that row instead. Such matches are logged.
pub fn delete_user(store: &mut impl SheetStore, username: &str) -> Result<usize> {
    let cell = store
        .find(CREDENTIALS_SHEET, username)?
        .ok_or_else(|| TrackerError::UserNotFound(username.to_string()))?;

    if cell.col != USERNAME_COL {
        warn!(
            "'{}' matched column {} of row {}, not the Username column; deleting that row",
            username, cell.col, cell.row
        );
    }

    store.delete_row(CREDENTIALS_SHEET, cell.row)?;
    info!("Deleted credentials row {} for '{}'", cell.row, username);
    Ok(cell.row)
}

/// Hash a password into an Argon2id PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| TrackerError::PasswordHash(e.to_string()))
}

/// Verify against an Argon2 hash, falling back to a constant-time plaintext
/// comparison for cells that are not PHC strings.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => {
            warn!("Credential stored without hashing; re-add the account to hash it");
            constant_time_eq(password.as_bytes(), stored.as_bytes())
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_and_legacy_passwords_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("s3cre", &hash));

        assert!(verify_password("plain", "plain"));
        assert!(!verify_password("plain", "plainer"));
        assert!(!verify_password("plaim", "plain"));
    }

    #[test]
    fn role_parsing() {
        assert_eq!("".parse::<Role>().unwrap(), Role::User);
        assert_eq!("Master".parse::<Role>().unwrap(), Role::Master);
        assert!("admin".parse::<Role>().is_err());
    }
}
