use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{debug, info, warn};
use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::sheet::{SheetStore, Workbook};

/// Write the snapshot to a temporary file beside `path`, then rename it over
/// `path`. The previous snapshot stays intact until the rename.
pub fn save_workbook(workbook: &Workbook, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            create_dir_all(parent)?;
            parent
        }
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)?;
    let encoder = GzEncoder::new(tmp, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, workbook)?;

    writer.flush()?;
    let encoder = writer.into_inner().map_err(|e| e.into_error())?;
    let tmp = encoder.finish()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn load_workbook(path: &Path) -> Result<Workbook> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = BufReader::new(decoder);

    let workbook: Workbook = deserialize_from(&mut reader)?;
    Ok(workbook)
}

/// A workbook kept in memory and written back to its snapshot file after every change.
#[derive(Debug)]
pub struct FileWorkbook {
    path: PathBuf,
    book: Workbook,
}

impl FileWorkbook {
    /// Open the snapshot at `path`, or start an empty workbook titled `title`
    /// if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>, title: &str) -> Result<Self> {
        let path = path.into();
        let book = if path.exists() {
            let book = load_workbook(&path)?;
            info!(
                "Opened workbook '{}' from {} ({} worksheets)",
                book.title,
                path.display(),
                book.sheets.len()
            );
            book
        } else {
            info!("No workbook at {}, starting '{}'", path.display(), title);
            Workbook::new(title)
        };
        Ok(FileWorkbook { path, book })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn workbook(&self) -> &Workbook {
        &self.book
    }

    /// Replace a worksheet's contents wholesale and persist.
    pub fn put_rows(&mut self, title: &str, rows: Vec<Vec<String>>) -> Result<()> {
        self.commit(|book| {
            book.put_rows(title, rows);
            Ok(())
        })
    }

    /// Apply `change` to a copy of the workbook and keep it only once the
    /// copy is saved. On any error the in-memory workbook is left untouched.
    fn commit<T>(&mut self, change: impl FnOnce(&mut Workbook) -> Result<T>) -> Result<T> {
        let mut next = self.book.clone();
        let out = change(&mut next)?;
        if let Err(e) = save_workbook(&next, &self.path) {
            warn!("Could not save {}, change discarded: {}", self.path.display(), e);
            return Err(e);
        }
        self.book = next;
        debug!("Saved workbook to {}", self.path.display());
        Ok(out)
    }
}

impl SheetStore for FileWorkbook {
    fn worksheet_titles(&self) -> Vec<String> {
        self.book.worksheet_titles()
    }

    fn add_worksheet(&mut self, title: &str, headers: &[&str]) -> Result<()> {
        self.commit(|book| book.add_worksheet(title, headers))
    }

    fn values(&self, sheet: &str) -> Result<Vec<Vec<String>>> {
        self.book.values(sheet)
    }

    fn update_range(&mut self, sheet: &str, range: &str, rows: &[Vec<String>]) -> Result<()> {
        self.commit(|book| book.update_range(sheet, range, rows))
    }

    fn update_cell(&mut self, sheet: &str, row: usize, col: usize, value: &str) -> Result<()> {
        self.commit(|book| book.update_cell(sheet, row, col, value))
    }

    fn append_row(&mut self, sheet: &str, row: Vec<String>) -> Result<usize> {
        self.commit(|book| book.append_row(sheet, row))
    }

    fn delete_row(&mut self, sheet: &str, row: usize) -> Result<()> {
        self.commit(|book| book.delete_row(sheet, row))
    }
}
