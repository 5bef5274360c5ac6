//! The Daily Updates sheet: one row per person, one column per date label.

use chrono::NaiveDate;
use log::info;
use serde::Serialize;

use crate::error::{Result, TrackerError};
use crate::sheet::{ScanOrder, SheetStore, find_row};

pub const DAILY_SHEET: &str = "Daily Updates";
pub const NAME_HEADER: &str = "Name";
pub const DATE_KEY_FORMAT: &str = "%d-%b-%Y";

/// Where a daily update landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DailyOutcome {
    Updated { row: usize },
    Appended { row: usize },
}

/// The column label used for a date, e.g. `01-Jan-2025`.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Write `text` into the `date_key` column of the first row named `full_name`,
/// appending a row for that person if none exists.
///
/// Headers are matched on raw values because date labels are free-form and
/// would not survive record decoding. A missing date or Name column fails
/// without writing anything.
pub fn log_update(
    store: &mut impl SheetStore,
    full_name: &str,
    date_key: &str,
    text: &str,
) -> Result<DailyOutcome> {
    if text.trim().is_empty() {
        return Err(TrackerError::InvalidInput(
            "Please enter your update before submitting".to_string(),
        ));
    }

    let rows = store.values(DAILY_SHEET)?;
    let Some((headers, data_rows)) = rows.split_first() else {
        return Err(missing_name_column());
    };

    let date_col = headers
        .iter()
        .position(|h| h == date_key)
        .ok_or_else(|| TrackerError::DateColumnNotFound(date_key.to_string()))?;
    let name_col = headers
        .iter()
        .position(|h| h == NAME_HEADER)
        .ok_or_else(missing_name_column)?;

    match find_row(data_rows, name_col, full_name, ScanOrder::FirstMatch) {
        Some(idx) => {
            let row = idx + 2;
            store.update_cell(DAILY_SHEET, row, date_col + 1, text)?;
            info!("Updated {} for {} at row {}", date_key, full_name, row);
            Ok(DailyOutcome::Updated { row })
        }
        None => {
            let mut new_row = vec![String::new(); headers.len()];
            new_row[name_col] = full_name.to_string();
            new_row[date_col] = text.to_string();
            let row = store.append_row(DAILY_SHEET, new_row)?;
            info!("Added {} for {} as new row {}", date_key, full_name, row);
            Ok(DailyOutcome::Appended { row })
        }
    }
}

/// The right-most non-empty date cell on the first row named `full_name`,
/// as `(date label, text)`.
pub fn latest_update(store: &impl SheetStore, full_name: &str) -> Result<Option<(String, String)>> {
    let rows = store.values(DAILY_SHEET)?;
    let Some((headers, data_rows)) = rows.split_first() else {
        return Ok(None);
    };
    let name_col = headers
        .iter()
        .position(|h| h == NAME_HEADER)
        .ok_or_else(missing_name_column)?;

    let Some(idx) = find_row(data_rows, name_col, full_name, ScanOrder::FirstMatch) else {
        return Ok(None);
    };
    let cells = &data_rows[idx];
    Ok(headers
        .iter()
        .enumerate()
        .rev()
        .filter(|(c, _)| *c != name_col)
        .find_map(|(c, h)| {
            cells
                .get(c)
                .filter(|v| !v.trim().is_empty())
                .map(|v| (h.clone(), v.clone()))
        }))
}

/// Append date labels missing from the header row. Returns how many were added.
pub fn add_date_columns(store: &mut impl SheetStore, date_keys: &[String]) -> Result<usize> {
    let rows = store.values(DAILY_SHEET)?;
    let mut headers = rows.first().cloned().unwrap_or_default();
    if !headers.iter().any(|h| h == NAME_HEADER) {
        return Err(missing_name_column());
    }

    let mut added = 0;
    for key in date_keys {
        if key.trim().is_empty() || headers.contains(key) {
            continue;
        }
        headers.push(key.clone());
        store.update_cell(DAILY_SHEET, 1, headers.len(), key)?;
        added += 1;
    }
    if added > 0 {
        info!("Added {} date columns to {}", added, DAILY_SHEET);
    }
    Ok(added)
}

/// The whole sheet as raw rows, header first.
pub fn all_updates(store: &impl SheetStore) -> Result<Vec<Vec<String>>> {
    store.values(DAILY_SHEET)
}

fn missing_name_column() -> TrackerError {
    TrackerError::MissingColumn {
        sheet: DAILY_SHEET.to_string(),
        column: NAME_HEADER.to_string(),
    }
}
