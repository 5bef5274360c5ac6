use axum::{
    Form, Router,
    extract::{Path, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Local, Month, NaiveDate};
use log::{error, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::credentials::{Identity, Role};
use crate::daily::date_key;
use crate::downloader;
use crate::error::TrackerError;
use crate::goals::{GoalDraft, GoalEntry, MAX_TASKS, Task, TaskStatus};
use crate::pages::{Frame, Pages};
use crate::saving::FileWorkbook;
use crate::session::{Action, Screen, Session, SessionStore};
use crate::sheet::SheetStore;
use crate::tracker::Tracker;

const SESSION_COOKIE: &str = "session";
const MAX_DATE_COLUMNS_PER_REQUEST: usize = 366;

pub struct AppState<S: SheetStore> {
    pub tracker: Mutex<Tracker<S>>,
    pub sessions: Mutex<SessionStore>,
    pub pages: Pages,
}

type Shared<S> = State<Arc<AppState<S>>>;

impl<S: SheetStore> AppState<S> {
    pub fn new(tracker: Tracker<S>, sessions: SessionStore, pages: Pages) -> Self {
        AppState {
            tracker: Mutex::new(tracker),
            sessions: Mutex::new(sessions),
            pages,
        }
    }

    fn tracker(&self) -> MutexGuard<'_, Tracker<S>> {
        self.tracker.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sessions(&self) -> MutexGuard<'_, SessionStore> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The caller's session, creating a fresh one (and its cookie) when the
    /// cookie is missing or expired.
    fn session(&self, jar: CookieJar) -> (CookieJar, String, Session) {
        let mut sessions = self.sessions();
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            if let Some(session) = sessions.get(cookie.value()) {
                let id = cookie.value().to_string();
                return (jar, id, session.clone());
            }
        }
        let id = sessions.create();
        let session = sessions.get(&id).cloned().unwrap_or_default();
        let mut cookie = Cookie::new(SESSION_COOKIE, id.clone());
        cookie.set_http_only(true);
        cookie.set_path("/");
        (jar.add(cookie), id, session)
    }

    /// Log `identity` into the session, ending whoever was logged in before.
    fn sign_in(&self, id: &str, identity: Identity) -> Result<(), TrackerError> {
        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(id) else {
            return Err(expired_session());
        };
        if session.is_authenticated() {
            info!("New login as '{}' on an active session, resetting it", identity.username);
            session.apply(Action::Logout)?;
        }
        session.apply(Action::LoginSucceeded(identity))
    }

    /// Apply a navigation action to the stored session.
    fn navigate(&self, id: &str, action: Action) -> Result<(), TrackerError> {
        match self.sessions().get_mut(id) {
            Some(session) => session.apply(action),
            None => Err(expired_session()),
        }
    }
}

fn expired_session() -> TrackerError {
    TrackerError::InvalidTransition {
        from: "expired session".to_string(),
        action: "continue".to_string(),
    }
}

/// Start the web application with the given configuration
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileWorkbook::open(&config.store.path, &config.store.workbook)?;
    let mut tracker = Tracker::new(store, &config.cache);
    for title in tracker.ensure_schema()? {
        info!("Initialised worksheet '{}'", title);
    }
    if let Some(bootstrap) = &config.bootstrap {
        tracker.bootstrap_master(bootstrap)?;
    }

    let state = Arc::new(AppState::new(
        tracker,
        SessionStore::new(config.server.session_lifetime()),
        Pages::new()?,
    ));

    let purge_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60 * 60));
        loop {
            interval.tick().await;
            let purged = purge_state.sessions().purge_expired();
            if purged > 0 {
                info!("Purged {} expired sessions", purged);
            }
        }
    });

    let app = router(state);
    let listener = TcpListener::bind(&config.server.bind).await?;
    info!("Listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router<S: SheetStore + Send + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/", get(index::<S>))
        .route("/login", get(login_page::<S>).post(login::<S>))
        .route("/logout", post(logout::<S>))
        .route("/home", post(home::<S>))
        .route("/cancel", post(cancel::<S>))
        .route("/month", post(select_month::<S>))
        .route("/add", post(open_add::<S>))
        .route("/edit/:row", post(open_edit::<S>))
        .route("/goals", post(save_new_goal::<S>))
        .route("/goals/:row", post(save_goal_edit::<S>))
        .route("/daily", post(post_daily_update::<S>))
        .route("/admin", post(open_admin::<S>))
        .route("/admin/users", post(add_user::<S>))
        .route("/admin/users/delete", post(delete_user::<S>))
        .route("/admin/dates", post(add_dates::<S>))
        .route("/admin/export/:file", get(export::<S>))
        .nest_service("/static", ServeDir::new("static"))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    info!("{} {} -> {}", method, path, response.status());
    response
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct MonthForm {
    month: String,
}

#[derive(Deserialize)]
struct DailyForm {
    date: String,
    text: String,
}

#[derive(Deserialize)]
struct NewUserForm {
    username: String,
    password: String,
    name: String,
    #[serde(default)]
    role: String,
}

#[derive(Deserialize)]
struct UsernameForm {
    username: String,
}

#[derive(Deserialize)]
struct DateRangeForm {
    from: String,
    to: String,
}

/// Feedback shown on the re-rendered screen.
#[derive(Default)]
struct Notice {
    error: Option<String>,
    success: Option<String>,
}

impl Notice {
    fn error(e: impl ToString) -> Self {
        Notice {
            error: Some(e.to_string()),
            success: None,
        }
    }

    fn success(message: impl Into<String>) -> Self {
        Notice {
            error: None,
            success: Some(message.into()),
        }
    }
}

/// Render whatever screen the session is on.
fn render_screen<S: SheetStore>(state: &AppState<S>, session: &Session, notice: Notice) -> Response {
    let Some(identity) = &session.identity else {
        return Redirect::to("/login").into_response();
    };
    let mut tracker = state.tracker();

    let mut notice = notice;
    let entries = tracker
        .user_month(&identity.full_name, session.month)
        .unwrap_or_else(|e| {
            error!("Data error: {}", e);
            notice.error.get_or_insert_with(|| format!("Data error: {}", e));
            Vec::new()
        });

    match &session.screen {
        Screen::LoggedOut => Redirect::to("/login").into_response(),
        Screen::Dashboard => {
            let last_update = tracker.latest_update(identity).unwrap_or_else(|e| {
                warn!("Could not read daily updates: {}", e);
                None
            });
            let frame = frame(identity, session, &entries, notice);
            let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
            state.pages.dashboard(
                &frame,
                &today,
                last_update,
                session.last_update_date.is_none(),
            )
        }
        Screen::AddTask => state.pages.add_task(&frame(identity, session, &entries, notice)),
        Screen::EditTask(entry) => state
            .pages
            .edit_task(&frame(identity, session, &entries, notice), entry),
        Screen::MasterDashboard => {
            let aggregate = tracker.list_users(identity).and_then(|users| {
                Ok((users, tracker.all_goals(identity)?, tracker.all_updates(identity)?))
            });
            match aggregate {
                Ok((users, goals, updates)) => state.pages.master(
                    &frame(identity, session, &entries, notice),
                    &users,
                    &goals,
                    &updates,
                ),
                Err(e) => {
                    error!("Master view failed: {}", e);
                    let frame = frame(identity, session, &entries, Notice::error(e));
                    state.pages.master(&frame, &[], &[], &[])
                }
            }
        }
    }
}

fn frame<'a>(identity: &'a Identity, session: &Session, entries: &'a [GoalEntry], notice: Notice) -> Frame<'a> {
    Frame {
        identity,
        month: session.month,
        entries,
        error: notice.error,
        success: notice.success,
    }
}

/// Run `action` on the session and redirect home, or re-render with the error.
fn navigate_and_redirect<S: SheetStore>(state: &AppState<S>, jar: CookieJar, action: Action) -> Response {
    let (jar, id, session) = state.session(jar);
    if !session.is_authenticated() {
        return (jar, Redirect::to("/login")).into_response();
    }
    match state.navigate(&id, action) {
        Ok(()) => (jar, Redirect::to("/")).into_response(),
        Err(e) => (jar, render_screen(state, &session, Notice::error(e))).into_response(),
    }
}

async fn index<S: SheetStore>(State(state): Shared<S>, jar: CookieJar) -> Response {
    let (jar, _, session) = state.session(jar);
    if !session.is_authenticated() {
        return (jar, Redirect::to("/login")).into_response();
    }
    (jar, render_screen(&state, &session, Notice::default())).into_response()
}

async fn login_page<S: SheetStore>(State(state): Shared<S>, jar: CookieJar) -> Response {
    let (jar, _, session) = state.session(jar);
    if session.is_authenticated() {
        return (jar, Redirect::to("/")).into_response();
    }
    (jar, state.pages.login(StatusCode::OK, None)).into_response()
}

async fn login<S: SheetStore>(State(state): Shared<S>, jar: CookieJar, Form(form): Form<LoginForm>) -> Response {
    let (jar, id, _) = state.session(jar);
    let result = state.tracker().authenticate(&form.username, &form.password);
    match result {
        Ok(Some(identity)) => match state.sign_in(&id, identity) {
            Ok(()) => (jar, Redirect::to("/")).into_response(),
            Err(e) => {
                warn!("Login could not be applied: {}", e);
                let message = e.to_string();
                (jar, state.pages.login(StatusCode::CONFLICT, Some(message.as_str()))).into_response()
            }
        },
        Ok(None) => (
            jar,
            state.pages.login(StatusCode::UNAUTHORIZED, Some("Invalid credentials")),
        )
            .into_response(),
        Err(e) => {
            let message = format!("Error retrieving credentials: {}", e);
            (jar, state.pages.login(StatusCode::SERVICE_UNAVAILABLE, Some(message.as_str()))).into_response()
        }
    }
}

async fn logout<S: SheetStore>(State(state): Shared<S>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions().remove(cookie.value());
    }
    let mut removal = Cookie::from(SESSION_COOKIE);
    removal.set_path("/");
    let jar = jar.remove(removal);
    (jar, Redirect::to("/login")).into_response()
}

async fn home<S: SheetStore>(State(state): Shared<S>, jar: CookieJar) -> Response {
    navigate_and_redirect(&state, jar, Action::Home)
}

async fn cancel<S: SheetStore>(State(state): Shared<S>, jar: CookieJar) -> Response {
    navigate_and_redirect(&state, jar, Action::Cancel)
}

async fn open_add<S: SheetStore>(State(state): Shared<S>, jar: CookieJar) -> Response {
    navigate_and_redirect(&state, jar, Action::AddNewTask)
}

async fn open_admin<S: SheetStore>(State(state): Shared<S>, jar: CookieJar) -> Response {
    navigate_and_redirect(&state, jar, Action::OpenAdmin)
}

async fn select_month<S: SheetStore>(
    State(state): Shared<S>,
    jar: CookieJar,
    Form(form): Form<MonthForm>,
) -> Response {
    match form.month.parse::<Month>() {
        Ok(month) => navigate_and_redirect(&state, jar, Action::SelectMonth(month)),
        Err(_) => (StatusCode::BAD_REQUEST, "Unknown month").into_response(),
    }
}

async fn open_edit<S: SheetStore>(State(state): Shared<S>, jar: CookieJar, Path(row): Path<usize>) -> Response {
    let (jar, _, session) = state.session(jar);
    let Some(identity) = &session.identity else {
        return (jar, Redirect::to("/login")).into_response();
    };
    let entry = state
        .tracker()
        .user_month(&identity.full_name, session.month)
        .map(|entries| entries.into_iter().find(|e| e.row == row));
    match entry {
        Ok(Some(entry)) => navigate_and_redirect(&state, jar, Action::Edit(entry)),
        Ok(None) => (StatusCode::NOT_FOUND, "No such entry").into_response(),
        Err(e) => (jar, render_screen(&state, &session, Notice::error(e))).into_response(),
    }
}

async fn save_new_goal<S: SheetStore>(
    State(state): Shared<S>,
    jar: CookieJar,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let (jar, id, session) = state.session(jar);
    let Some(identity) = &session.identity else {
        return (jar, Redirect::to("/login")).into_response();
    };
    let draft = GoalDraft::new(
        form.get("department").map(String::as_str).unwrap_or_default(),
        form.get("goal").map(String::as_str).unwrap_or_default(),
        tasks_from_form(&form),
    );
    let result = state.tracker().add_goal(identity, session.month, &draft);
    match result {
        Ok(_) => match state.navigate(&id, Action::Saved) {
            Ok(()) => (jar, Redirect::to("/")).into_response(),
            Err(e) => (jar, render_screen(&state, &session, Notice::error(e))).into_response(),
        },
        Err(e) => {
            warn!("Add task failed: {}", e);
            (jar, render_screen(&state, &session, Notice::error(e))).into_response()
        }
    }
}

async fn save_goal_edit<S: SheetStore>(
    State(state): Shared<S>,
    jar: CookieJar,
    Path(row): Path<usize>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let (jar, id, session) = state.session(jar);
    let (Some(identity), Screen::EditTask(entry)) = (&session.identity, &session.screen) else {
        return (jar, Redirect::to("/")).into_response();
    };
    if entry.row != row {
        return (StatusCode::CONFLICT, "The form does not match the entry being edited").into_response();
    }
    let draft = GoalDraft::new(
        &entry.department,
        form.get("goal").map(String::as_str).unwrap_or_default(),
        tasks_from_form(&form),
    );
    let result = state.tracker().save_edit(identity, entry, &draft);
    match result {
        Ok(()) => match state.navigate(&id, Action::Saved) {
            Ok(()) => (jar, Redirect::to("/")).into_response(),
            Err(e) => (jar, render_screen(&state, &session, Notice::error(e))).into_response(),
        },
        Err(e) => {
            error!("Update failed: {}", e);
            let notice = Notice::error(format!("Update failed: {}", e));
            (jar, render_screen(&state, &session, notice)).into_response()
        }
    }
}

async fn post_daily_update<S: SheetStore>(
    State(state): Shared<S>,
    jar: CookieJar,
    Form(form): Form<DailyForm>,
) -> Response {
    let (jar, id, mut session) = state.session(jar);
    let Some(identity) = session.identity.clone() else {
        return (jar, Redirect::to("/login")).into_response();
    };
    let notice = match NaiveDate::parse_from_str(&form.date, "%Y-%m-%d") {
        Err(_) => Notice::error(format!("Invalid date '{}'", form.date)),
        Ok(date) => {
            let key = date_key(date);
            let result = state.tracker().log_daily_update(&identity, &key, &form.text);
            match result {
                Ok(_) => {
                    if let Some(stored) = state.sessions().get_mut(&id) {
                        stored.last_update_date = Some(key.clone());
                    }
                    session.last_update_date = Some(key);
                    Notice::success("Daily update logged successfully!")
                }
                Err(e) => {
                    error!("Failed to log daily update: {}", e);
                    Notice::error(e)
                }
            }
        }
    };
    (jar, render_screen(&state, &session, notice)).into_response()
}

async fn add_user<S: SheetStore>(
    State(state): Shared<S>,
    jar: CookieJar,
    Form(form): Form<NewUserForm>,
) -> Response {
    let (jar, _, session) = state.session(jar);
    let Some(identity) = &session.identity else {
        return (jar, Redirect::to("/login")).into_response();
    };
    let result = form.role.parse::<Role>().and_then(|role| {
        state
            .tracker()
            .add_user(identity, &form.username, &form.password, &form.name, role)
    });
    let notice = match result {
        Ok(_) => Notice::success(format!("Added user '{}'", form.username.trim())),
        Err(e) => Notice::error(e),
    };
    (jar, render_screen(&state, &session, notice)).into_response()
}

async fn delete_user<S: SheetStore>(
    State(state): Shared<S>,
    jar: CookieJar,
    Form(form): Form<UsernameForm>,
) -> Response {
    let (jar, _, session) = state.session(jar);
    let Some(identity) = &session.identity else {
        return (jar, Redirect::to("/login")).into_response();
    };
    let result = state.tracker().delete_user(identity, form.username.trim());
    let notice = match result {
        Ok(row) => Notice::success(format!("Deleted row {} ('{}')", row, form.username.trim())),
        Err(e) => Notice::error(e),
    };
    (jar, render_screen(&state, &session, notice)).into_response()
}

async fn add_dates<S: SheetStore>(
    State(state): Shared<S>,
    jar: CookieJar,
    Form(form): Form<DateRangeForm>,
) -> Response {
    let (jar, _, session) = state.session(jar);
    let Some(identity) = &session.identity else {
        return (jar, Redirect::to("/login")).into_response();
    };
    let parsed = (
        NaiveDate::parse_from_str(&form.from, "%Y-%m-%d"),
        NaiveDate::parse_from_str(&form.to, "%Y-%m-%d"),
    );
    let notice = match parsed {
        (Ok(from), Ok(to)) if from <= to => {
            let keys: Vec<String> = from
                .iter_days()
                .take_while(|d| *d <= to)
                .take(MAX_DATE_COLUMNS_PER_REQUEST)
                .map(date_key)
                .collect();
            let result = state.tracker().add_date_columns(identity, &keys);
            match result {
                Ok(added) => Notice::success(format!("Added {} date columns", added)),
                Err(e) => Notice::error(e),
            }
        }
        _ => Notice::error("Please pick a valid date range"),
    };
    (jar, render_screen(&state, &session, notice)).into_response()
}

async fn export<S: SheetStore>(State(state): Shared<S>, jar: CookieJar, Path(file): Path<String>) -> Response {
    let (jar, _, session) = state.session(jar);
    let Some(identity) = &session.identity else {
        return (jar, Redirect::to("/login")).into_response();
    };
    let Some((sheet, extension)) = file.rsplit_once('.') else {
        return (StatusCode::BAD_REQUEST, "Missing file extension").into_response();
    };
    let rows = match state.tracker().export_rows(identity, sheet) {
        Ok(rows) => rows,
        Err(TrackerError::Forbidden) => return (StatusCode::FORBIDDEN, "Forbidden").into_response(),
        Err(e) => return (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    };
    let disposition = format!(
        "attachment; filename=\"{}\"",
        urlencoding::encode(&file)
    );

    match extension {
        "csv" => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            downloader::to_csv(&rows),
        )
            .into_response(),
        "xlsx" => match downloader::to_xlsx(sheet, &rows) {
            Ok(bytes) => (
                [
                    (
                        header::CONTENT_TYPE,
                        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
                    ),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response(),
            Err(e) => {
                error!("XLSX export failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Export failed").into_response()
            }
        },
        other => (StatusCode::BAD_REQUEST, format!("Unsupported export format: {}", other)).into_response(),
    }
}

fn tasks_from_form(form: &HashMap<String, String>) -> Vec<Task> {
    (1..=MAX_TASKS)
        .filter_map(|i| {
            let description = form.get(&format!("task_{}", i))?;
            let status = form
                .get(&format!("status_{}", i))
                .map(|s| TaskStatus::from_cell(s))
                .unwrap_or_default();
            Some(Task::new(description, status))
        })
        .collect()
}
