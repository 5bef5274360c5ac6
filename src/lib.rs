/*!
# Taskboard

A small web application for tracking monthly department goals and daily
updates, with every record kept in a workbook of named worksheets.

## Overview

Staff log in, pick a month, and see their goals for that month: one entry per
department, each with a main goal and up to five tasks carrying a status
(Not Started, Working, Completed, Incomplete). They can edit an entry in
place, add a new one, and post a free-text update for a date. A Master
account can also add and remove accounts and view every goal and update.

## Architecture

### Store Layer
- **sheet**: the `SheetStore` trait (worksheets addressed by title, rows and
  columns 1-based), the in-memory `Workbook`, A1 range notation
- **saving**: `FileWorkbook`, a workbook persisted as a gzip-compressed
  bincode snapshot after every write

### Mapping Layer
- **credentials**: the Credentials sheet (`Username, Password, Name, Role`),
  Argon2 password hashing, account add/delete
- **goals**: the Goals sheet (`Name, Department, Main Goal, Month`, then five
  `Task i, Task i Status` pairs) to and from `GoalEntry`
- **daily**: the Daily Updates sheet (`Name` plus one column per date label),
  update-in-place or append

### Application Layer
- **cache**: query results keyed by query and parameters, invalidated on write
- **session**: the per-session navigation state machine and session store
- **tracker**: the operations the screens call, with role checks
- **app** / **pages** (feature `web`): axum routes and handlebars screens

### Import / Export
- **loader**: CSV import used to seed worksheets
- **downloader**: CSV and XLSX export of aggregate views

## Worksheet Rows

Goals and daily updates are addressed by sheet row: the header is row 1 and
the first data row is row 2. Edits overwrite the whole 14-cell Goals row;
empty task slots are written as `--` with a blank status.
*/

pub mod cache;
pub mod config;
pub mod credentials;
pub mod daily;
pub mod downloader;
pub mod error;
pub mod goals;
pub mod loader;
pub mod saving;
pub mod session;
pub mod sheet;
pub mod tracker;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod pages;

pub use error::{Result, TrackerError};
pub use saving::FileWorkbook;
pub use sheet::{SheetStore, Workbook};
pub use tracker::Tracker;
