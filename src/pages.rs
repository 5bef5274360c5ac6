//! Screen rendering with handlebars templates compiled into the binary.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::Month;
use handlebars::{Handlebars, TemplateError};
use log::error;
use serde::Serialize;
use serde_json::{Value, json};

use crate::credentials::Identity;
use crate::goals::{DEPARTMENTS, GoalEntry, MAX_TASKS, Task, TaskStatus};

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

pub struct Pages {
    registry: Handlebars<'static>,
}

#[derive(Serialize)]
struct TaskView<'a> {
    description: &'a str,
    status: &'static str,
    emoji: &'static str,
}

#[derive(Serialize)]
struct EntryView<'a> {
    department: &'a str,
    goal: &'a str,
    month: &'a str,
    name: &'a str,
    row: usize,
    tasks: Vec<TaskView<'a>>,
}

#[derive(Serialize)]
struct Choice {
    label: String,
    selected: bool,
}

#[derive(Serialize)]
struct SlotView {
    number: usize,
    description: String,
    statuses: Vec<Choice>,
}

/// What every signed-in screen shows around its main form.
pub struct Frame<'a> {
    pub identity: &'a Identity,
    pub month: Month,
    pub entries: &'a [GoalEntry],
    pub error: Option<String>,
    pub success: Option<String>,
}

impl Pages {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_partial("head", include_str!("./static/head.hbs"))?;
        registry.register_partial("sidebar", include_str!("./static/sidebar.hbs"))?;
        registry.register_template_string("login", include_str!("./static/login.hbs"))?;
        registry.register_template_string("dashboard", include_str!("./static/dashboard.hbs"))?;
        registry.register_template_string("add_task", include_str!("./static/add_task.hbs"))?;
        registry.register_template_string("edit_task", include_str!("./static/edit_task.hbs"))?;
        registry.register_template_string("master", include_str!("./static/master.hbs"))?;
        Ok(Pages { registry })
    }

    pub fn login(&self, status: StatusCode, error: Option<&str>) -> Response {
        let body = self.render("login", &json!({ "error": error }));
        (status, body).into_response()
    }

    pub fn dashboard(
        &self,
        frame: &Frame,
        today: &str,
        last_update: Option<(String, String)>,
        show_intro: bool,
    ) -> Response {
        let mut data = frame_data(frame);
        data["today"] = json!(today);
        data["show_intro"] = json!(show_intro);
        data["last_update"] = match last_update {
            Some((date, text)) => json!({ "date": date, "text": text }),
            None => Value::Null,
        };
        self.render("dashboard", &data).into_response()
    }

    pub fn add_task(&self, frame: &Frame) -> Response {
        let mut data = frame_data(frame);
        data["departments"] = json!(
            DEPARTMENTS
                .iter()
                .enumerate()
                .map(|(i, d)| Choice { label: d.to_string(), selected: i == 0 })
                .collect::<Vec<_>>()
        );
        data["slots"] = json!(slots(&[]));
        self.render("add_task", &data).into_response()
    }

    pub fn edit_task(&self, frame: &Frame, entry: &GoalEntry) -> Response {
        let mut data = frame_data(frame);
        data["entry"] = json!(entry_view(entry));
        data["slots"] = json!(slots(&entry.tasks));
        self.render("edit_task", &data).into_response()
    }

    pub fn master(
        &self,
        frame: &Frame,
        users: &[Identity],
        goals: &[GoalEntry],
        updates: &[Vec<String>],
    ) -> Response {
        let mut data = frame_data(frame);
        data["users"] = json!(users);
        data["goals"] = json!(goals.iter().map(entry_view).collect::<Vec<_>>());
        data["update_header"] = json!(updates.first());
        data["update_rows"] = json!(updates.get(1..).unwrap_or(&[]));
        self.render("master", &data).into_response()
    }

    fn render(&self, template: &str, data: &Value) -> Response {
        match self.registry.render(template, data) {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!("Rendering {} failed: {}", template, e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Rendering error").into_response()
            }
        }
    }
}

fn frame_data(frame: &Frame) -> Value {
    json!({
        "user": frame.identity,
        "is_master": frame.identity.is_master(),
        "month": frame.month.name(),
        "months": MONTHS
            .iter()
            .map(|m| Choice { label: m.name().to_string(), selected: *m == frame.month })
            .collect::<Vec<_>>(),
        "entries": frame.entries.iter().map(entry_view).collect::<Vec<_>>(),
        "error": frame.error,
        "success": frame.success,
    })
}

fn entry_view(entry: &GoalEntry) -> EntryView<'_> {
    EntryView {
        department: &entry.department,
        goal: &entry.goal,
        month: &entry.month,
        name: &entry.full_name,
        row: entry.row,
        tasks: entry
            .tasks
            .iter()
            .map(|t| TaskView {
                description: &t.description,
                status: t.status.label(),
                emoji: t.status.emoji(),
            })
            .collect(),
    }
}

/// Five task inputs, prefilled from `tasks` where present.
fn slots(tasks: &[Task]) -> Vec<SlotView> {
    (0..MAX_TASKS)
        .map(|i| {
            let (description, current) = tasks
                .get(i)
                .map(|t| (t.description.clone(), t.status))
                .unwrap_or_default();
            SlotView {
                number: i + 1,
                description,
                statuses: TaskStatus::ALL
                    .iter()
                    .map(|s| Choice { label: s.label().to_string(), selected: *s == current })
                    .collect(),
            }
        })
        .collect()
}
