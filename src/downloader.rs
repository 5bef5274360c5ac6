#![cfg(not(tarpaulin_include))]

/// Convert worksheet rows to CSV format
///
/// Cells containing commas, quotes or line breaks are quoted, with inner
/// quotes doubled. Rows are written as they are, without padding.
///
/// # Arguments
/// * `rows` - The worksheet rows, header first
///
/// # Returns
/// * `String` - CSV content
///
/// # Examples
/// ```
/// use taskboard::downloader::to_csv;
///
/// let rows = vec![vec!["Name".to_string(), "Note".to_string()]];
/// assert_eq!(to_csv(&rows), "Name,Note\n");
/// ```
pub fn to_csv(rows: &[Vec<String>]) -> String {
    let mut csv_content = String::new();

    for row in rows {
        for (c, value) in row.iter().enumerate() {
            if c > 0 {
                csv_content.push(',');
            }
            if value.contains(',') || value.contains('"') || value.contains('\n') {
                let escaped = value.replace('"', "\"\"");
                csv_content.push_str(&format!("\"{}\"", escaped));
            } else {
                csv_content.push_str(value);
            }
        }
        csv_content.push('\n');
    }

    csv_content
}

/// Convert worksheet rows to XLSX format
///
/// Writes every cell as a string into a single worksheet named after the
/// source sheet, with the header row in bold.
///
/// # Arguments
/// * `title` - Worksheet name to use in the file
/// * `rows` - The worksheet rows, header first
///
/// # Returns
/// * `Result<Vec<u8>, rust_xlsxwriter::XlsxError>` - XLSX file content as bytes or an error
#[cfg(feature = "web")]
pub fn to_xlsx(title: &str, rows: &[Vec<String>]) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(title)?;

    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if r == 0 {
                worksheet.write_string_with_format(r as u32, c as u16, value, &bold)?;
            } else {
                worksheet.write_string(r as u32, c as u16, value)?;
            }
        }
    }

    workbook.save_to_buffer()
}
