use thiserror::Error;

/// Errors raised by the workbook store, the mappers and the navigation state machine.
///
/// Wrong passwords and unknown usernames are not errors: authentication
/// reports them as `Ok(None)` so the login screen can show one generic message.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Worksheet '{0}' not found")]
    WorksheetNotFound(String),

    #[error("'{column}' column not found in sheet '{sheet}'")]
    MissingColumn { sheet: String, column: String },

    #[error("Date column {0} not found in sheet")]
    DateColumnNotFound(String),

    #[error("Duplicate header '{header}' in sheet '{sheet}'")]
    DuplicateHeader { sheet: String, header: String },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("This action requires the Master role")]
    Forbidden,

    #[error("Cannot {action} from the {from} screen")]
    InvalidTransition { from: String, action: String },

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for TrackerError {
    fn from(e: bincode::Error) -> Self {
        TrackerError::Snapshot(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
