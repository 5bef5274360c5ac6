use std::fs;
use std::path::Path;

use crate::error::{Result, TrackerError};

/// Load worksheet rows from a CSV file
///
/// The first line becomes the header row. Quoted fields may contain commas,
/// doubled quotes and line breaks, so multi-line daily updates survive import.
///
/// # Arguments
/// * `filepath` - Path to the CSV file to load
///
/// # Returns
/// * `Result<Vec<Vec<String>>>` - The rows, header first
///
/// # Examples
/// ```no_run
/// use taskboard::loader::from_csv;
///
/// match from_csv("goals.csv") {
///     Ok(rows) => println!("Read {} rows", rows.len()),
///     Err(e) => eprintln!("Error loading CSV: {}", e),
/// }
/// ```
pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Vec<Vec<String>>> {
    let path = filepath.as_ref();
    match path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.to_lowercase()) {
        Some(ext) if ext == "csv" => {}
        Some(ext) => {
            return Err(TrackerError::InvalidInput(format!(
                "Unsupported file extension: {}",
                ext
            )));
        }
        None => return Err(TrackerError::InvalidInput("File has no extension".to_string())),
    }

    let text = fs::read_to_string(path)?;
    let rows = parse_csv(&text);
    if rows.is_empty() {
        return Err(TrackerError::InvalidInput("CSV file is empty".to_string()));
    }
    Ok(rows)
}

/// Parse CSV text into rows. Blank lines are skipped; trailing empty cells are kept.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    // Doubled quote inside a quoted field
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => row.push(std::mem::take(&mut field)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => end_row(&mut rows, &mut row, &mut field),
            _ => field.push(c),
        }
    }
    end_row(&mut rows, &mut row, &mut field);

    rows
}

fn end_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, field: &mut String) {
    row.push(std::mem::take(field));
    let cells = std::mem::take(row);
    if !(cells.len() == 1 && cells[0].is_empty()) {
        rows.push(cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_fields_and_newlines() {
        let rows = parse_csv("Name,01-Jan-2025\r\n\"Smith, Bob\",\"line one\nline \"\"two\"\"\"\n\nAnn,\n");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Name", "01-Jan-2025"]);
        assert_eq!(rows[1], vec!["Smith, Bob", "line one\nline \"two\""]);
        assert_eq!(rows[2], vec!["Ann", ""]);
    }
}
