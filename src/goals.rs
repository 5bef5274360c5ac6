//! Mapping between the flat Goals sheet and per-user goal entries.
//!
//! Each row is `Name, Department, Main Goal, Month` followed by five
//! `Task i, Task i Status` pairs. Unused slots hold the `--` sentinel and an
//! empty status.

use chrono::Month;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TrackerError};
use crate::sheet::{Record, ScanOrder, SheetStore, col_to_letter, decode_records, find_row};

pub const GOALS_SHEET: &str = "Goals";
pub const GOAL_HEADERS: [&str; 14] = [
    "Name",
    "Department",
    "Main Goal",
    "Month",
    "Task 1",
    "Task 1 Status",
    "Task 2",
    "Task 2 Status",
    "Task 3",
    "Task 3 Status",
    "Task 4",
    "Task 4 Status",
    "Task 5",
    "Task 5 Status",
];
pub const MAX_TASKS: usize = 5;
pub const EMPTY_SLOT: &str = "--";
pub const DEPARTMENTS: [&str; 6] = ["Sales", "Marketing", "HR", "IT", "Operations", "Finance"];

/// Records are numbered from the row after the single header row, and rows are 1-based.
const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    Working,
    Completed,
    Incomplete,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::NotStarted,
        TaskStatus::Working,
        TaskStatus::Completed,
        TaskStatus::Incomplete,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::Working => "Working",
            TaskStatus::Completed => "Completed",
            TaskStatus::Incomplete => "Incomplete",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "⏳",
            TaskStatus::Working => "🔄",
            TaskStatus::Completed => "✅",
            TaskStatus::Incomplete => "❌",
        }
    }

    /// Status as read from a sheet cell: blank or unknown text means Not Started.
    /// Unknown text is logged, since the next save of the row replaces it.
    pub fn from_cell(cell: &str) -> Self {
        if cell.trim().is_empty() {
            return TaskStatus::NotStarted;
        }
        cell.parse().unwrap_or_else(|_| {
            warn!("Unknown task status '{}' read as {}", cell.trim(), TaskStatus::NotStarted);
            TaskStatus::NotStarted
        })
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| TrackerError::InvalidInput(format!("Unknown status '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub description: String,
    pub status: TaskStatus,
}

impl Task {
    pub fn new(description: &str, status: TaskStatus) -> Self {
        Task {
            description: description.to_string(),
            status,
        }
    }
}

/// One Goals row belonging to a user: a department goal for a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalEntry {
    pub full_name: String,
    pub department: String,
    pub goal: String,
    pub month: String,
    pub tasks: Vec<Task>,
    /// Sheet row this entry was read from, used to overwrite it in place.
    pub row: usize,
}

/// Form input for a new or edited goal, before it is written to the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GoalDraft {
    pub department: String,
    pub goal: String,
    pub tasks: Vec<Task>,
}

impl GoalDraft {
    /// Build a draft, dropping blank task descriptions and anything past the fifth task.
    pub fn new(department: &str, goal: &str, tasks: Vec<Task>) -> Self {
        let tasks = tasks
            .into_iter()
            .filter_map(|t| {
                let description = t.description.trim();
                (!description.is_empty()).then(|| Task::new(description, t.status))
            })
            .take(MAX_TASKS)
            .collect();
        GoalDraft {
            department: department.trim().to_string(),
            goal: goal.trim().to_string(),
            tasks,
        }
    }

    /// New goals need a main goal and at least one task.
    pub fn validate(&self) -> Result<()> {
        if self.goal.is_empty() {
            return Err(TrackerError::InvalidInput("Please enter a main goal".to_string()));
        }
        if self.tasks.is_empty() {
            return Err(TrackerError::InvalidInput(
                "Please add at least one task".to_string(),
            ));
        }
        Ok(())
    }
}

/// Every entry for `full_name` in `month`. Name and month match exactly.
pub fn load_user_month(
    store: &impl SheetStore,
    full_name: &str,
    month: Month,
) -> Result<Vec<GoalEntry>> {
    let records = store.records(GOALS_SHEET)?;
    let entries: Vec<GoalEntry> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.field("Name") == full_name && r.field("Month") == month.name())
        .map(|(idx, r)| entry_from_record(r, idx + FIRST_DATA_ROW))
        .collect();

    if entries.is_empty() {
        debug!("No tasks found for {} in {}", full_name, month.name());
    }
    Ok(entries)
}

/// Every Goals row, for the aggregate view.
pub fn all_entries(store: &impl SheetStore) -> Result<Vec<GoalEntry>> {
    Ok(store
        .records(GOALS_SHEET)?
        .iter()
        .enumerate()
        .map(|(idx, r)| entry_from_record(r, idx + FIRST_DATA_ROW))
        .collect())
}

/// The entry for `full_name` picked by `order`; `LastMatch` gives the most recent row.
pub fn find_entry(
    store: &impl SheetStore,
    full_name: &str,
    order: ScanOrder,
) -> Result<Option<GoalEntry>> {
    let rows = store.values(GOALS_SHEET)?;
    let Some(name_col) = rows
        .first()
        .and_then(|header| header.iter().position(|h| h == "Name"))
    else {
        return Err(TrackerError::MissingColumn {
            sheet: GOALS_SHEET.to_string(),
            column: "Name".to_string(),
        });
    };

    let Some(idx) = find_row(&rows[1..], name_col, full_name, order) else {
        return Ok(None);
    };
    let records = decode_records(GOALS_SHEET, &rows)?;
    Ok(records
        .get(idx)
        .map(|r| entry_from_record(r, idx + FIRST_DATA_ROW)))
}

/// Overwrite the whole row `row` with the draft's fixed-width shape.
pub fn update_row(
    store: &mut impl SheetStore,
    row: usize,
    full_name: &str,
    month: &str,
    draft: &GoalDraft,
) -> Result<()> {
    if row < FIRST_DATA_ROW {
        return Err(TrackerError::InvalidRange(format!(
            "row {} is not a data row",
            row
        )));
    }
    let range = format!("A{}:{}{}", row, col_to_letter(GOAL_HEADERS.len()), row);
    store.update_range(GOALS_SHEET, &range, &[row_cells(full_name, month, draft)])?;
    info!("Updated {} goal for {} at row {}", draft.department, full_name, row);
    Ok(())
}

/// Append the draft as a new row and return its row number.
pub fn append_row(
    store: &mut impl SheetStore,
    full_name: &str,
    month: Month,
    draft: &GoalDraft,
) -> Result<usize> {
    let row = store.append_row(GOALS_SHEET, row_cells(full_name, month.name(), draft))?;
    info!(
        "Added {} goal for {} in {} at row {}",
        draft.department,
        full_name,
        month.name(),
        row
    );
    Ok(row)
}

/// The 14 cells of a Goals row. Slots past the draft's tasks get the sentinel and no status.
pub fn row_cells(full_name: &str, month: &str, draft: &GoalDraft) -> Vec<String> {
    let mut cells = vec![
        full_name.to_string(),
        draft.department.clone(),
        draft.goal.clone(),
        month.to_string(),
    ];
    for slot in 0..MAX_TASKS {
        match draft.tasks.get(slot) {
            Some(task) => {
                cells.push(task.description.clone());
                cells.push(task.status.label().to_string());
            }
            None => {
                cells.push(EMPTY_SLOT.to_string());
                cells.push(String::new());
            }
        }
    }
    cells
}

fn entry_from_record(record: &Record, row: usize) -> GoalEntry {
    GoalEntry {
        full_name: record.field("Name").to_string(),
        department: record.field("Department").to_string(),
        goal: record.field("Main Goal").to_string(),
        month: record.field("Month").to_string(),
        tasks: tasks_from_record(record),
        row,
    }
}

fn tasks_from_record(record: &Record) -> Vec<Task> {
    (1..=MAX_TASKS)
        .filter_map(|i| {
            let description = record.field(&format!("Task {}", i)).trim();
            if description.is_empty() || description == EMPTY_SLOT {
                return None;
            }
            let status = TaskStatus::from_cell(record.field(&format!("Task {} Status", i)));
            Some(Task::new(description, status))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_drops_blank_and_extra_tasks() {
        let tasks = (1..=7)
            .map(|i| {
                let desc = if i == 2 { "   ".to_string() } else { format!("task {}", i) };
                Task::new(&desc, TaskStatus::Working)
            })
            .collect();
        let draft = GoalDraft::new("IT", " Ship it ", tasks);
        assert_eq!(draft.goal, "Ship it");
        assert_eq!(draft.tasks.len(), MAX_TASKS);
        assert_eq!(draft.tasks[1].description, "task 3");
        assert_eq!(draft.tasks[4].description, "task 6");
    }

    #[test]
    fn validation_rejects_empty_goal_and_no_tasks() {
        assert!(GoalDraft::new("IT", "", vec![Task::new("a", TaskStatus::Working)])
            .validate()
            .is_err());
        assert!(GoalDraft::new("IT", "goal", vec![]).validate().is_err());
        assert!(GoalDraft::new("IT", "goal", vec![Task::new("a", TaskStatus::Working)])
            .validate()
            .is_ok());
    }

    #[test]
    fn status_cells() {
        assert_eq!(TaskStatus::from_cell(""), TaskStatus::NotStarted);
        assert_eq!(TaskStatus::from_cell(" Completed "), TaskStatus::Completed);
        assert_eq!(TaskStatus::from_cell("done"), TaskStatus::NotStarted);
        assert_eq!(TaskStatus::Working.emoji(), "🔄");
    }
}
