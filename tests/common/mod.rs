#![allow(dead_code)]

use taskboard::Workbook;
use taskboard::credentials::{CREDENTIAL_HEADERS, CREDENTIALS_SHEET};
use taskboard::daily::DAILY_SHEET;
use taskboard::goals::{GOAL_HEADERS, GOALS_SHEET};

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// A Goals row with the given leading cells, padded to the full 14 columns.
pub fn goal_row(cells: &[&str]) -> Vec<String> {
    let mut r = row(cells);
    r.resize(GOAL_HEADERS.len(), String::new());
    r
}

pub fn book_with(sheet: &str, rows: Vec<Vec<String>>) -> Workbook {
    let mut book = Workbook::new("DataCollection");
    book.put_rows(sheet, rows);
    book
}

pub fn goals_book(data: Vec<Vec<String>>) -> Workbook {
    let mut rows = vec![row(&GOAL_HEADERS)];
    rows.extend(data);
    book_with(GOALS_SHEET, rows)
}

pub fn daily_book(headers: &[&str], data: Vec<Vec<String>>) -> Workbook {
    let mut rows = vec![row(headers)];
    rows.extend(data);
    book_with(DAILY_SHEET, rows)
}

pub fn credentials_book(data: Vec<Vec<String>>) -> Workbook {
    let mut rows = vec![row(&CREDENTIAL_HEADERS)];
    rows.extend(data);
    book_with(CREDENTIALS_SHEET, rows)
}

/// All three worksheets, with headers only.
pub fn empty_book() -> Workbook {
    let mut book = Workbook::new("DataCollection");
    book.put_rows(CREDENTIALS_SHEET, vec![row(&CREDENTIAL_HEADERS)]);
    book.put_rows(GOALS_SHEET, vec![row(&GOAL_HEADERS)]);
    book.put_rows(DAILY_SHEET, vec![row(&["Name", "01-Jan-2025", "02-Jan-2025"])]);
    book
}
