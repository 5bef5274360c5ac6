use crate::error::{Result, TrackerError};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref CELL_REGEX: Regex = Regex::new(r"^([A-Za-z]+)([1-9][0-9]*)$").unwrap();
}

/// A 1-based cell address, the way sheet UIs number rows and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

/// Which match wins when a linear scan finds several rows.
///
/// The daily update writer edits the first row carrying a name; "current
/// entry" lookups want the most recent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    FirstMatch,
    LastMatch,
}

/// One data row decoded against the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// Value under `header`, or "" when the column does not exist.
    pub fn field(&self, header: &str) -> &str {
        self.get(header).unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Worksheet {
    pub title: String,
    pub rows: Vec<Vec<String>>,
}

impl Worksheet {
    pub fn new(title: &str, headers: &[&str]) -> Self {
        let rows = if headers.is_empty() {
            Vec::new()
        } else {
            vec![headers.iter().map(|h| h.to_string()).collect()]
        };
        Worksheet {
            title: title.to_string(),
            rows,
        }
    }

    pub fn header(&self) -> &[String] {
        self.rows.first().map(|r| r.as_slice()).unwrap_or(&[])
    }

    /// Write one cell, growing the grid the way a sheet does on write.
    pub fn set_cell(&mut self, row: usize, col: usize, value: &str) -> Result<()> {
        if row == 0 || col == 0 {
            return Err(TrackerError::InvalidRange(cell_label(row, col)));
        }
        if self.rows.len() < row {
            self.rows.resize_with(row, Vec::new);
        }
        let cells = &mut self.rows[row - 1];
        if cells.len() < col {
            cells.resize(col, String::new());
        }
        cells[col - 1] = value.to_string();
        Ok(())
    }

    pub fn append(&mut self, row: Vec<String>) -> usize {
        self.rows.push(row);
        self.rows.len()
    }

    pub fn delete_row(&mut self, row: usize) -> Result<()> {
        if row == 0 || row > self.rows.len() {
            return Err(TrackerError::InvalidRange(format!(
                "row {} is outside '{}' ({} rows)",
                row,
                self.title,
                self.rows.len()
            )));
        }
        self.rows.remove(row - 1);
        Ok(())
    }
}

/// The tabular store every mapper talks to.
///
/// Titles address worksheets; rows and columns are 1-based. Any backend with
/// these row/cell semantics can stand in for the workbook file.
pub trait SheetStore {
    fn worksheet_titles(&self) -> Vec<String>;

    fn add_worksheet(&mut self, title: &str, headers: &[&str]) -> Result<()>;

    /// All rows as raw strings, header included.
    fn values(&self, sheet: &str) -> Result<Vec<Vec<String>>>;

    fn update_range(&mut self, sheet: &str, range: &str, rows: &[Vec<String>]) -> Result<()>;

    fn update_cell(&mut self, sheet: &str, row: usize, col: usize, value: &str) -> Result<()>;

    /// Appends after the last row and returns the new row number.
    fn append_row(&mut self, sheet: &str, row: Vec<String>) -> Result<usize>;

    fn delete_row(&mut self, sheet: &str, row: usize) -> Result<()>;

    /// Data rows decoded against the header row.
    fn records(&self, sheet: &str) -> Result<Vec<Record>> {
        decode_records(sheet, &self.values(sheet)?)
    }

    /// First cell below the header, scanning row-major, whose value equals `value`.
    fn find(&self, sheet: &str, value: &str) -> Result<Option<CellRef>> {
        let rows = self.values(sheet)?;
        for (r, cells) in rows.iter().enumerate().skip(1) {
            if let Some(c) = cells.iter().position(|cell| cell == value) {
                return Ok(Some(CellRef { row: r + 1, col: c + 1 }));
            }
        }
        Ok(None)
    }
}

/// An in-memory workbook: named worksheets in creation order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workbook {
    pub title: String,
    pub sheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn new(title: &str) -> Self {
        Workbook {
            title: title.to_string(),
            sheets: Vec::new(),
        }
    }

    pub fn worksheet(&self, title: &str) -> Result<&Worksheet> {
        self.sheets
            .iter()
            .find(|s| s.title == title)
            .ok_or_else(|| TrackerError::WorksheetNotFound(title.to_string()))
    }

    pub fn worksheet_mut(&mut self, title: &str) -> Result<&mut Worksheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.title == title)
            .ok_or_else(|| TrackerError::WorksheetNotFound(title.to_string()))
    }

    /// Replace a worksheet's rows wholesale, creating the worksheet if needed.
    pub fn put_rows(&mut self, title: &str, rows: Vec<Vec<String>>) {
        match self.sheets.iter().position(|s| s.title == title) {
            Some(i) => self.sheets[i].rows = rows,
            None => self.sheets.push(Worksheet {
                title: title.to_string(),
                rows,
            }),
        }
    }
}

impl SheetStore for Workbook {
    fn worksheet_titles(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.title.clone()).collect()
    }

    fn add_worksheet(&mut self, title: &str, headers: &[&str]) -> Result<()> {
        if self.worksheet(title).is_ok() {
            return Err(TrackerError::Store(format!(
                "worksheet '{}' already exists",
                title
            )));
        }
        self.sheets.push(Worksheet::new(title, headers));
        Ok(())
    }

    fn values(&self, sheet: &str) -> Result<Vec<Vec<String>>> {
        Ok(self.worksheet(sheet)?.rows.clone())
    }

    fn update_range(&mut self, sheet: &str, range: &str, rows: &[Vec<String>]) -> Result<()> {
        let (start, end) = parse_range(range)?;
        let height = end.row - start.row + 1;
        let width = end.col - start.col + 1;
        if rows.len() > height || rows.iter().any(|r| r.len() > width) {
            return Err(TrackerError::InvalidRange(format!(
                "{} rows do not fit in {}",
                rows.len(),
                range
            )));
        }
        let ws = self.worksheet_mut(sheet)?;
        for (dr, cells) in rows.iter().enumerate() {
            for (dc, value) in cells.iter().enumerate() {
                ws.set_cell(start.row + dr, start.col + dc, value)?;
            }
        }
        Ok(())
    }

    fn update_cell(&mut self, sheet: &str, row: usize, col: usize, value: &str) -> Result<()> {
        self.worksheet_mut(sheet)?.set_cell(row, col, value)
    }

    fn append_row(&mut self, sheet: &str, row: Vec<String>) -> Result<usize> {
        Ok(self.worksheet_mut(sheet)?.append(row))
    }

    fn delete_row(&mut self, sheet: &str, row: usize) -> Result<()> {
        self.worksheet_mut(sheet)?.delete_row(row)
    }
}

/// Decode raw rows into records. Duplicate non-empty headers are rejected,
/// since two columns cannot share one key.
pub fn decode_records(sheet: &str, rows: &[Vec<String>]) -> Result<Vec<Record>> {
    let Some((header, data)) = rows.split_first() else {
        return Ok(Vec::new());
    };

    for (i, h) in header.iter().enumerate() {
        if !h.is_empty() && header[..i].contains(h) {
            return Err(TrackerError::DuplicateHeader {
                sheet: sheet.to_string(),
                header: h.clone(),
            });
        }
    }

    Ok(data
        .iter()
        .map(|cells| Record {
            fields: header
                .iter()
                .enumerate()
                .filter(|(_, h)| !h.is_empty())
                .map(|(c, h)| (h.clone(), cells.get(c).cloned().unwrap_or_default()))
                .collect(),
        })
        .collect())
}

/// Index into `rows` of the row whose cell at `col` (0-based) equals `value`.
pub fn find_row(rows: &[Vec<String>], col: usize, value: &str, order: ScanOrder) -> Option<usize> {
    let matches = |cells: &&Vec<String>| cells.get(col).is_some_and(|c| c == value);
    match order {
        ScanOrder::FirstMatch => rows.iter().position(|r| matches(&r)),
        ScanOrder::LastMatch => rows.iter().rposition(|r| matches(&r)),
    }
}

pub fn col_to_letter(col: usize) -> String {
    let mut col = col;
    let mut result = String::new();
    while col > 0 {
        col -= 1;
        result.push(((col % 26) as u8 + b'A') as char);
        col /= 26;
    }
    result.chars().rev().collect()
}

pub fn letter_to_col(letters: &str) -> usize {
    letters
        .chars()
        .fold(0, |acc, c| acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1))
}

pub fn cell_name(row: usize, col: usize) -> String {
    format!("{}{}", col_to_letter(col), row)
}

fn cell_label(row: usize, col: usize) -> String {
    format!("row {} col {}", row, col)
}

pub fn parse_cell_name(name: &str) -> Option<CellRef> {
    let caps = CELL_REGEX.captures(name.trim())?;
    let col = letter_to_col(&caps[1]);
    let row = caps[2].parse().ok()?;
    Some(CellRef { row, col })
}

/// Parse `A5:N5` (or a single cell `B2`) into its top-left and bottom-right corners.
pub fn parse_range(range: &str) -> Result<(CellRef, CellRef)> {
    let invalid = || TrackerError::InvalidRange(range.to_string());
    let (a, b) = match range.split_once(':') {
        Some((a, b)) => (a, b),
        None => (range, range),
    };
    let start = parse_cell_name(a).ok_or_else(invalid)?;
    let end = parse_cell_name(b).ok_or_else(invalid)?;
    if end.row < start.row || end.col < start.col {
        return Err(invalid());
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(col_to_letter(1), "A");
        assert_eq!(col_to_letter(14), "N");
        assert_eq!(col_to_letter(27), "AA");
        assert_eq!(col_to_letter(703), "AAA");
        assert_eq!(letter_to_col("N"), 14);
        assert_eq!(letter_to_col("az"), 52);
    }

    #[test]
    fn ranges() {
        let (s, e) = parse_range("A5:N5").unwrap();
        assert_eq!(s, CellRef { row: 5, col: 1 });
        assert_eq!(e, CellRef { row: 5, col: 14 });
        assert!(parse_range("N5:A5").is_err());
        assert!(parse_range("5A").is_err());
        assert!(parse_range("A0").is_err());
    }

    #[test]
    fn scan_order_picks_the_requested_end() {
        let rows = vec![
            vec!["Bob".to_string(), "1".to_string()],
            vec!["Ann".to_string(), "2".to_string()],
            vec!["Bob".to_string(), "3".to_string()],
        ];
        assert_eq!(find_row(&rows, 0, "Bob", ScanOrder::FirstMatch), Some(0));
        assert_eq!(find_row(&rows, 0, "Bob", ScanOrder::LastMatch), Some(2));
        assert_eq!(find_row(&rows, 0, "Cid", ScanOrder::LastMatch), None);
    }
}
