// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row as TableRow, Table, Tabs};
use serde_json::{Value, json};
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::{Date, OffsetDateTime};

use alma_app::credentials::issue_credentials;
use alma_app::forms::{
    AnnouncementFormInput, BookFormInput, BookIssuanceFormInput, CompanyFormInput,
    CourseFormInput, CreditAwardFormInput, FeeFormInput, FieldProblem, FormPayload,
    PaymentFormInput, PlacementDriveFormInput, RoomAllocationFormInput, RoomFormInput,
    StudentFormInput, TimetableEntryFormInput, ValidationError, ensure_room_has_space,
};
use alma_app::model::{
    Announcement, Audience, Book, BookIssuance, Company, Course, CreditAward, DriveStatus,
    FeeCategory, FeeRecord, FeeStatus, Grade, PlacementDrive, Room, RoomAllocation, Student,
    StudentStatus, TimetableEntry, Weekday, loan_due_date,
};
use alma_app::session::{CurrentUser, Role};
use alma_app::state::{AppCommand, AppMode, AppState, DialogPhase, FormDialog, FormKind, TabKind};
use alma_app::stats::{
    available_copies, credit_stats, dashboard_counts, fee_stats, hostel_stats, library_stats,
    placement_stats, room_occupancy,
};
use alma_app::timefmt;
use alma_store::input::{
    format_cents, format_cgpa_tenths, format_compact_cents, parse_cgpa_tenths,
    parse_optional_cents, parse_required_cents, parse_required_date, parse_required_int,
    parse_required_time,
};
use alma_store::{Collection, CreateError, Filter, Gateway, ListFilter, MutateError, Row};

const STATUS_CLEAR_MS: u64 = 4_000;

/// Every collection a screen can show. Loaded lazily per tab; the tab's
/// stats panels are recomputed from these rows on every draw.
#[derive(Default)]
pub struct Screens {
    pub students: Collection<Student>,
    pub fees: Collection<FeeRecord>,
    pub books: Collection<Book>,
    pub issuances: Collection<BookIssuance>,
    pub courses: Collection<Course>,
    pub timetable: Collection<TimetableEntry>,
    pub credits: Collection<CreditAward>,
    pub companies: Collection<Company>,
    pub drives: Collection<PlacementDrive>,
    pub announcements: Collection<Announcement>,
    pub rooms: Collection<Room>,
    pub allocations: Collection<RoomAllocation>,
}

impl Screens {
    pub fn apply_table(&mut self, table: &str, rows: Vec<Row>) -> Result<usize> {
        let applied = match table {
            "students" => self.students.apply_rows(rows),
            "fees" => self.fees.apply_rows(rows),
            "books" => self.books.apply_rows(rows),
            "book_issuances" => self.issuances.apply_rows(rows),
            "courses" => self.courses.apply_rows(rows),
            "timetable" => self.timetable.apply_rows(rows),
            "credit_awards" => self.credits.apply_rows(rows),
            "companies" => self.companies.apply_rows(rows),
            "placement_drives" => self.drives.apply_rows(rows),
            "announcements" => self.announcements.apply_rows(rows),
            "rooms" => self.rooms.apply_rows(rows),
            "room_allocations" => self.allocations.apply_rows(rows),
            other => anyhow::bail!("no screen maps table {other:?}"),
        };
        applied.map_err(|error| anyhow::anyhow!("{error}"))
    }
}

/// Tables a tab reads, with the server-side scope each one needs. Students
/// only ever receive their own fee, issuance, and credit rows.
pub fn tables_for_tab(tab: TabKind, user: &CurrentUser) -> Vec<(&'static str, ListFilter)> {
    let own = |scoped: bool| {
        if scoped {
            ListFilter::new().eq("student_id", user.user_id.get())
        } else {
            ListFilter::new()
        }
    };
    let student = user.role == Role::Student;

    match tab {
        TabKind::Dashboard => vec![
            ("students", ListFilter::new()),
            ("fees", own(student)),
            ("book_issuances", own(student)),
            ("placement_drives", ListFilter::new()),
            ("announcements", ListFilter::new()),
        ],
        TabKind::Students => vec![("students", ListFilter::new())],
        // The extra lookup tables feed the forms; students cannot open
        // those forms, so their loads stay minimal.
        TabKind::Fees => {
            if student {
                vec![("fees", own(true))]
            } else {
                vec![("fees", ListFilter::new()), ("students", ListFilter::new())]
            }
        }
        TabKind::Books => vec![
            ("books", ListFilter::new()),
            ("book_issuances", ListFilter::new()),
        ],
        TabKind::Issuances => {
            if student {
                vec![("book_issuances", own(true))]
            } else {
                vec![
                    ("book_issuances", ListFilter::new()),
                    ("books", ListFilter::new()),
                    ("students", ListFilter::new()),
                ]
            }
        }
        TabKind::Courses => vec![("courses", ListFilter::new())],
        TabKind::Timetable => vec![("timetable", ListFilter::new())],
        TabKind::Credits => {
            if student {
                vec![("credit_awards", own(true))]
            } else {
                vec![
                    ("credit_awards", ListFilter::new()),
                    ("students", ListFilter::new()),
                    ("courses", ListFilter::new()),
                ]
            }
        }
        TabKind::Companies => vec![("companies", ListFilter::new())],
        TabKind::Drives => vec![
            ("placement_drives", ListFilter::new()),
            ("companies", ListFilter::new()),
        ],
        TabKind::Announcements => vec![("announcements", ListFilter::new())],
        TabKind::Hostel => vec![
            ("rooms", ListFilter::new()),
            ("room_allocations", ListFilter::new()),
            ("students", ListFilter::new()),
        ],
    }
}

/// Roles allowed to create, edit, and delete on a tab.
pub fn can_mutate(role: Role, tab: TabKind) -> bool {
    match tab {
        TabKind::Dashboard => false,
        TabKind::Students => matches!(role, Role::Admin),
        TabKind::Fees => matches!(role, Role::Admin | Role::Accountant),
        TabKind::Books | TabKind::Issuances => matches!(role, Role::Admin | Role::Librarian),
        TabKind::Courses | TabKind::Timetable | TabKind::Credits => {
            matches!(role, Role::Admin | Role::Hod | Role::Faculty)
        }
        TabKind::Companies | TabKind::Drives => {
            matches!(role, Role::Admin | Role::PlacementOfficer)
        }
        TabKind::Announcements => role != Role::Student,
        TabKind::Hostel => matches!(role, Role::Admin | Role::Warden),
    }
}

const fn create_form_for_tab(tab: TabKind) -> Option<FormKind> {
    match tab {
        TabKind::Students => Some(FormKind::Student),
        TabKind::Fees => Some(FormKind::Fee),
        TabKind::Books => Some(FormKind::Book),
        TabKind::Issuances => Some(FormKind::BookIssuance),
        TabKind::Courses => Some(FormKind::Course),
        TabKind::Timetable => Some(FormKind::TimetableEntry),
        TabKind::Credits => Some(FormKind::CreditAward),
        TabKind::Companies => Some(FormKind::Company),
        TabKind::Drives => Some(FormKind::PlacementDrive),
        TabKind::Announcements => Some(FormKind::Announcement),
        TabKind::Hostel => Some(FormKind::Room),
        TabKind::Dashboard => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    TabLoaded {
        request_id: u64,
        tab: TabKind,
        tables: Vec<(&'static str, Vec<Row>)>,
    },
    LoadFailed {
        request_id: u64,
        tab: TabKind,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingLoad {
    request_id: u64,
    tab: TabKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Int,
    Money,
    OptionalMoney,
    Date,
    Time,
    Cgpa,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FormFieldSpec {
    label: &'static str,
    kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct FormUiState {
    values: Vec<String>,
    field_index: usize,
    /// Present while editing a payment: (fee id, outstanding balance).
    payment_target: Option<(i64, i64)>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct TabUiState {
    filter: Filter,
    selected: usize,
    /// Derived-status filter for the fees tab; computed per row, so it
    /// cannot live in the facet filter.
    fee_status: Option<FeeStatus>,
    mine_only: bool,
}

pub struct ViewData {
    screens: Screens,
    dialog: FormDialog,
    form: FormUiState,
    tab_ui: std::collections::HashMap<TabKind, TabUiState>,
    pending_load: Option<PendingLoad>,
    pending_delete: Option<i64>,
    pending_vacate: Option<i64>,
    next_request_id: u64,
    status_token: u64,
    help_visible: bool,
    today: Date,
}

impl ViewData {
    fn new(today: Date) -> Self {
        Self {
            screens: Screens::default(),
            dialog: FormDialog::default(),
            form: FormUiState::default(),
            tab_ui: std::collections::HashMap::new(),
            pending_load: None,
            pending_delete: None,
            pending_vacate: None,
            next_request_id: 0,
            status_token: 0,
            help_visible: false,
            today,
        }
    }

    fn tab_ui(&mut self, tab: TabKind) -> &mut TabUiState {
        self.tab_ui.entry(tab).or_default()
    }

    fn tab_ui_ref(&self, tab: TabKind) -> TabUiState {
        self.tab_ui.get(&tab).cloned().unwrap_or_default()
    }
}

pub fn run_app(
    state: &mut AppState,
    gateway: Arc<dyn Gateway>,
    user: &CurrentUser,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let today = OffsetDateTime::now_utc().date();
    let mut view_data = ViewData::new(today);
    let (internal_tx, internal_rx) = mpsc::channel();

    state.active_tab = TabKind::Dashboard;
    spawn_tab_load(state, &mut view_data, &gateway, user, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) =
            terminal.draw(|frame| render(frame, state, &view_data, user))
        {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, &mut view_data, &gateway, user, &internal_tx, key)
                    {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus, &[]);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::TabLoaded {
                request_id,
                tab,
                tables,
            } => {
                // Stale guard: results from a superseded request are dropped.
                if view_data.pending_load != Some(PendingLoad { request_id, tab }) {
                    continue;
                }
                view_data.pending_load = None;
                let mut failed = None;
                for (table, rows) in tables {
                    if let Err(error) = view_data.screens.apply_table(table, rows) {
                        failed = Some(error.to_string());
                    }
                }
                if let Some(error) = failed {
                    emit_status(state, view_data, tx, &format!("load failed: {error}"));
                } else {
                    clamp_selection(state, view_data);
                }
            }
            InternalEvent::LoadFailed {
                request_id,
                tab,
                error,
            } => {
                if view_data.pending_load != Some(PendingLoad { request_id, tab }) {
                    continue;
                }
                view_data.pending_load = None;
                emit_status(state, view_data, tx, &format!("load failed: {error}"));
            }
        }
    }
}

/// Fetches every table the tab needs on a worker thread. The UI keeps
/// rendering; a request id ties the eventual result back to this request
/// and anything stale is discarded on arrival.
fn spawn_tab_load(
    state: &mut AppState,
    view_data: &mut ViewData,
    gateway: &Arc<dyn Gateway>,
    user: &CurrentUser,
    tx: &Sender<InternalEvent>,
) {
    let tab = state.active_tab;
    view_data.next_request_id += 1;
    let request_id = view_data.next_request_id;
    view_data.pending_load = Some(PendingLoad { request_id, tab });

    let specs = tables_for_tab(tab, user);
    let gateway = Arc::clone(gateway);
    let tx = tx.clone();
    thread::spawn(move || {
        let mut tables = Vec::with_capacity(specs.len());
        for (table, filter) in specs {
            match gateway.list(table, &filter) {
                Ok(rows) => tables.push((table, rows)),
                Err(error) => {
                    let _ = tx.send(InternalEvent::LoadFailed {
                        request_id,
                        tab,
                        error: error.to_string(),
                    });
                    return;
                }
            }
        }
        let _ = tx.send(InternalEvent::TabLoaded {
            request_id,
            tab,
            tables,
        });
    });
}

fn schedule_status_clear(tx: &Sender<InternalEvent>, token: u64) {
    let tx = tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(STATUS_CLEAR_MS));
        let _ = tx.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    message: &str,
) {
    view_data.status_token += 1;
    state.dispatch(AppCommand::SetStatus(message.to_owned()), &[]);
    schedule_status_clear(tx, view_data.status_token);
}

fn handle_key_event(
    state: &mut AppState,
    view_data: &mut ViewData,
    gateway: &Arc<dyn Gateway>,
    user: &CurrentUser,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if view_data.help_visible {
        view_data.help_visible = false;
        return false;
    }

    match state.mode {
        AppMode::Nav => handle_nav_key(state, view_data, gateway, user, tx, key),
        AppMode::Search => {
            handle_search_key(state, view_data, key);
            false
        }
        AppMode::Form(kind) => {
            handle_form_key(state, view_data, gateway, user, tx, kind, key);
            false
        }
        AppMode::ConfirmDelete => {
            handle_confirm_key(state, view_data, gateway, tx, key);
            false
        }
    }
}

fn handle_nav_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    gateway: &Arc<dyn Gateway>,
    user: &CurrentUser,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let tabs = user.role.tabs();
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Tab | KeyCode::Char(']') => {
            state.dispatch(AppCommand::NextTab, tabs);
            spawn_tab_load(state, view_data, gateway, user, tx);
        }
        KeyCode::BackTab | KeyCode::Char('[') => {
            state.dispatch(AppCommand::PrevTab, tabs);
            spawn_tab_load(state, view_data, gateway, user, tx);
        }
        KeyCode::Char('R') => {
            spawn_tab_load(state, view_data, gateway, user, tx);
            emit_status(state, view_data, tx, "reloading");
        }
        KeyCode::Down | KeyCode::Char('j') => move_selection(state, view_data, 1),
        KeyCode::Up | KeyCode::Char('k') => move_selection(state, view_data, -1),
        KeyCode::Char('g') => set_selection(state, view_data, 0),
        KeyCode::Char('G') => set_selection(state, view_data, usize::MAX),
        KeyCode::Char('/') => {
            if state.active_tab != TabKind::Dashboard {
                state.dispatch(AppCommand::EnterSearch, tabs);
            }
        }
        KeyCode::Char('f') => cycle_facet(state, view_data),
        KeyCode::Char('s') => {
            if state.active_tab == TabKind::Fees {
                cycle_fee_status(state, view_data);
            }
        }
        KeyCode::Char('m') => {
            if state.active_tab == TabKind::Announcements {
                toggle_mine_only(state, view_data, user);
            }
        }
        KeyCode::Char('n') => open_create_form(state, view_data, user, tx),
        KeyCode::Char('a') => {
            if state.active_tab == TabKind::Hostel {
                open_allocation_form(state, view_data, user, tx);
            }
        }
        KeyCode::Char('x') => {
            if state.active_tab == TabKind::Hostel {
                request_vacate(state, view_data, user, tx);
            }
        }
        KeyCode::Char('e') => open_edit_form(state, view_data, user, tx),
        KeyCode::Char('p') => {
            if state.active_tab == TabKind::Fees {
                open_payment_form(state, view_data, user, tx);
            }
        }
        KeyCode::Char('r') => {
            if state.active_tab == TabKind::Issuances {
                return_selected_book(state, view_data, gateway, user, tx);
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => request_delete(state, view_data, user, tx),
        _ => {}
    }
    false
}

fn handle_search_key(state: &mut AppState, view_data: &mut ViewData, key: KeyEvent) {
    let tab = state.active_tab;
    match key.code {
        KeyCode::Esc => {
            view_data.tab_ui(tab).filter.set_text("");
            view_data.tab_ui(tab).selected = 0;
            state.dispatch(AppCommand::ExitToNav, &[]);
        }
        KeyCode::Enter => {
            state.dispatch(AppCommand::ExitToNav, &[]);
        }
        KeyCode::Backspace => {
            let ui = view_data.tab_ui(tab);
            let mut text = ui.filter.text().to_owned();
            text.pop();
            ui.filter.set_text(text);
            ui.selected = 0;
        }
        KeyCode::Char(ch) => {
            let ui = view_data.tab_ui(tab);
            let mut text = ui.filter.text().to_owned();
            text.push(ch);
            ui.filter.set_text(text);
            ui.selected = 0;
        }
        _ => {}
    }
}

fn handle_confirm_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    gateway: &Arc<dyn Gateway>,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            let vacate_id = view_data.pending_vacate.take();
            let row_id = view_data.pending_delete.take();
            state.dispatch(AppCommand::ExitToNav, &[]);
            if let Some(allocation_id) = vacate_id {
                perform_vacate(state, view_data, gateway, tx, allocation_id);
            } else if let Some(row_id) = row_id {
                perform_delete(state, view_data, gateway, tx, row_id);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_data.pending_delete = None;
            view_data.pending_vacate = None;
            state.dispatch(AppCommand::ExitToNav, &[]);
            emit_status(state, view_data, tx, "delete cancelled");
        }
        _ => {}
    }
}

fn handle_form_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    gateway: &Arc<dyn Gateway>,
    user: &CurrentUser,
    tx: &Sender<InternalEvent>,
    kind: FormKind,
    key: KeyEvent,
) {
    if view_data.dialog.is_submitting() {
        // Submit already in flight for this dialog; nothing to type into.
        return;
    }
    let specs = form_field_specs(kind);
    match key.code {
        KeyCode::Esc => {
            if view_data.dialog.cancel() {
                view_data.form = FormUiState::default();
                state.dispatch(AppCommand::ExitToNav, &[]);
            }
        }
        KeyCode::Down | KeyCode::Tab => {
            view_data.form.field_index = (view_data.form.field_index + 1) % specs.len();
        }
        KeyCode::Up | KeyCode::BackTab => {
            view_data.form.field_index =
                (view_data.form.field_index + specs.len() - 1) % specs.len();
        }
        KeyCode::Left => cycle_choice(view_data, specs, -1),
        KeyCode::Right => cycle_choice(view_data, specs, 1),
        KeyCode::Backspace => {
            let index = view_data.form.field_index;
            if !matches!(specs[index].kind, FieldKind::Choice(_)) {
                view_data.form.values[index].pop();
            }
        }
        KeyCode::Enter => submit_form(state, view_data, gateway, user, tx, kind),
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            submit_form(state, view_data, gateway, user, tx, kind);
        }
        KeyCode::Char(ch) => {
            let index = view_data.form.field_index;
            if !matches!(specs[index].kind, FieldKind::Choice(_)) {
                view_data.form.values[index].push(ch);
            }
        }
        _ => {}
    }
}

fn cycle_choice(view_data: &mut ViewData, specs: &[FormFieldSpec], delta: isize) {
    let index = view_data.form.field_index;
    let FieldKind::Choice(options) = specs[index].kind else {
        return;
    };
    let current = options
        .iter()
        .position(|option| *option == view_data.form.values[index])
        .unwrap_or(0) as isize;
    let len = options.len() as isize;
    let next = (current + delta).rem_euclid(len) as usize;
    view_data.form.values[index] = options[next].to_owned();
}

fn visible_row_ids(state: &AppState, view_data: &ViewData) -> Vec<i64> {
    let ui = view_data.tab_ui_ref(state.active_tab);
    let screens = &view_data.screens;
    match state.active_tab {
        TabKind::Dashboard => Vec::new(),
        TabKind::Students => screens
            .students
            .query(&ui.filter)
            .map(|row| row.id.get())
            .collect(),
        TabKind::Fees => screens
            .fees
            .query(&ui.filter)
            .filter(|fee| {
                ui.fee_status
                    .is_none_or(|status| fee.status(view_data.today) == status)
            })
            .map(|row| row.id.get())
            .collect(),
        TabKind::Books => screens
            .books
            .query(&ui.filter)
            .map(|row| row.id.get())
            .collect(),
        TabKind::Issuances => screens
            .issuances
            .query(&ui.filter)
            .map(|row| row.id.get())
            .collect(),
        TabKind::Courses => screens
            .courses
            .query(&ui.filter)
            .map(|row| row.id.get())
            .collect(),
        TabKind::Timetable => screens
            .timetable
            .query(&ui.filter)
            .map(|row| row.id.get())
            .collect(),
        TabKind::Credits => screens
            .credits
            .query(&ui.filter)
            .map(|row| row.id.get())
            .collect(),
        TabKind::Companies => screens
            .companies
            .query(&ui.filter)
            .map(|row| row.id.get())
            .collect(),
        TabKind::Drives => screens
            .drives
            .query(&ui.filter)
            .map(|row| row.id.get())
            .collect(),
        TabKind::Announcements => screens
            .announcements
            .query(&ui.filter)
            .map(|row| row.id.get())
            .collect(),
        TabKind::Hostel => screens
            .rooms
            .query(&ui.filter)
            .map(|row| row.id.get())
            .collect(),
    }
}

fn selected_row_id(state: &AppState, view_data: &ViewData) -> Option<i64> {
    let ids = visible_row_ids(state, view_data);
    let ui = view_data.tab_ui_ref(state.active_tab);
    ids.get(ui.selected.min(ids.len().saturating_sub(1)))
        .copied()
}

fn move_selection(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let count = visible_row_ids(state, view_data).len();
    if count == 0 {
        return;
    }
    let ui = view_data.tab_ui(state.active_tab);
    let current = ui.selected.min(count - 1) as isize;
    ui.selected = (current + delta).rem_euclid(count as isize) as usize;
}

fn set_selection(state: &AppState, view_data: &mut ViewData, index: usize) {
    let count = visible_row_ids(state, view_data).len();
    if count == 0 {
        return;
    }
    view_data.tab_ui(state.active_tab).selected = index.min(count - 1);
}

fn clamp_selection(state: &AppState, view_data: &mut ViewData) {
    let count = visible_row_ids(state, view_data).len();
    let ui = view_data.tab_ui(state.active_tab);
    if count == 0 {
        ui.selected = 0;
    } else {
        ui.selected = ui.selected.min(count - 1);
    }
}

fn cycle_facet(state: &mut AppState, view_data: &mut ViewData) {
    let tab = state.active_tab;
    let Some((field, options)) = facet_options(tab) else {
        return;
    };
    let ui = view_data.tab_ui(tab);
    let next = match ui.filter.facet(field) {
        None => Some(options[0].to_owned()),
        Some(current) => options
            .iter()
            .position(|option| *option == current)
            .and_then(|index| options.get(index + 1))
            .map(|option| (*option).to_owned()),
    };
    ui.filter.set_facet(field, next);
    ui.selected = 0;
}

fn facet_options(tab: TabKind) -> Option<(&'static str, &'static [&'static str])> {
    match tab {
        TabKind::Students => Some(("status", &["active", "alumni", "suspended"])),
        TabKind::Fees => Some(("category", &["tuition", "hostel", "exam", "library", "transport"])),
        TabKind::Timetable => Some(("day", &["mon", "tue", "wed", "thu", "fri", "sat"])),
        TabKind::Drives => Some(("status", &["scheduled", "completed", "cancelled"])),
        TabKind::Announcements => {
            Some(("audience", &["everyone", "students", "faculty", "staff"]))
        }
        _ => None,
    }
}

fn cycle_fee_status(state: &mut AppState, view_data: &mut ViewData) {
    let ui = view_data.tab_ui(state.active_tab);
    ui.fee_status = match ui.fee_status {
        None => Some(FeeStatus::Pending),
        Some(FeeStatus::Pending) => Some(FeeStatus::Partial),
        Some(FeeStatus::Partial) => Some(FeeStatus::Paid),
        Some(FeeStatus::Paid) => Some(FeeStatus::Overdue),
        Some(FeeStatus::Overdue) => None,
    };
    ui.selected = 0;
}

fn toggle_mine_only(state: &mut AppState, view_data: &mut ViewData, user: &CurrentUser) {
    let author = user.user_id.get().to_string();
    let ui = view_data.tab_ui(state.active_tab);
    ui.mine_only = !ui.mine_only;
    let value = ui.mine_only.then_some(author);
    ui.filter.set_facet("author_id", value);
    ui.selected = 0;
}

fn form_field_specs(kind: FormKind) -> &'static [FormFieldSpec] {
    match kind {
        FormKind::Student => &[
            FormFieldSpec { label: "name", kind: FieldKind::Text },
            FormFieldSpec { label: "email", kind: FieldKind::Text },
            FormFieldSpec { label: "phone", kind: FieldKind::Text },
            FormFieldSpec { label: "department", kind: FieldKind::Text },
            FormFieldSpec { label: "year", kind: FieldKind::Int },
            FormFieldSpec {
                label: "status",
                kind: FieldKind::Choice(&["active", "alumni", "suspended"]),
            },
        ],
        FormKind::Fee => &[
            FormFieldSpec { label: "student id", kind: FieldKind::Int },
            FormFieldSpec {
                label: "category",
                kind: FieldKind::Choice(&["tuition", "hostel", "exam", "library", "transport"]),
            },
            FormFieldSpec { label: "amount", kind: FieldKind::Money },
            FormFieldSpec { label: "paid", kind: FieldKind::OptionalMoney },
            FormFieldSpec { label: "due date", kind: FieldKind::Date },
        ],
        FormKind::Payment => &[FormFieldSpec { label: "amount", kind: FieldKind::Money }],
        FormKind::Book => &[
            FormFieldSpec { label: "title", kind: FieldKind::Text },
            FormFieldSpec { label: "author", kind: FieldKind::Text },
            FormFieldSpec { label: "isbn", kind: FieldKind::Text },
            FormFieldSpec { label: "category", kind: FieldKind::Text },
            FormFieldSpec { label: "copies", kind: FieldKind::Int },
        ],
        FormKind::BookIssuance => &[
            FormFieldSpec { label: "book id", kind: FieldKind::Int },
            FormFieldSpec { label: "student id", kind: FieldKind::Int },
            FormFieldSpec { label: "issued on", kind: FieldKind::Date },
        ],
        FormKind::Course => &[
            FormFieldSpec { label: "code", kind: FieldKind::Text },
            FormFieldSpec { label: "title", kind: FieldKind::Text },
            FormFieldSpec { label: "department", kind: FieldKind::Text },
            FormFieldSpec { label: "credits", kind: FieldKind::Int },
            FormFieldSpec { label: "semester", kind: FieldKind::Int },
            FormFieldSpec { label: "faculty", kind: FieldKind::Text },
        ],
        FormKind::TimetableEntry => &[
            FormFieldSpec { label: "course code", kind: FieldKind::Text },
            FormFieldSpec {
                label: "day",
                kind: FieldKind::Choice(&["mon", "tue", "wed", "thu", "fri", "sat"]),
            },
            FormFieldSpec { label: "starts at", kind: FieldKind::Time },
            FormFieldSpec { label: "ends at", kind: FieldKind::Time },
            FormFieldSpec { label: "room", kind: FieldKind::Text },
            FormFieldSpec { label: "faculty", kind: FieldKind::Text },
        ],
        FormKind::CreditAward => &[
            FormFieldSpec { label: "student id", kind: FieldKind::Int },
            FormFieldSpec { label: "course code", kind: FieldKind::Text },
            FormFieldSpec { label: "credits", kind: FieldKind::Int },
            FormFieldSpec {
                label: "grade",
                kind: FieldKind::Choice(&["A+", "A", "B+", "B", "C", "D", "F"]),
            },
            FormFieldSpec { label: "awarded on", kind: FieldKind::Date },
        ],
        FormKind::Company => &[
            FormFieldSpec { label: "name", kind: FieldKind::Text },
            FormFieldSpec { label: "industry", kind: FieldKind::Text },
            FormFieldSpec { label: "website", kind: FieldKind::Text },
            FormFieldSpec { label: "contact email", kind: FieldKind::Text },
        ],
        FormKind::PlacementDrive => &[
            FormFieldSpec { label: "company id", kind: FieldKind::Int },
            FormFieldSpec { label: "role", kind: FieldKind::Text },
            FormFieldSpec { label: "package", kind: FieldKind::Money },
            FormFieldSpec { label: "drive date", kind: FieldKind::Date },
            FormFieldSpec { label: "min cgpa", kind: FieldKind::Cgpa },
            FormFieldSpec {
                label: "status",
                kind: FieldKind::Choice(&["scheduled", "completed", "cancelled"]),
            },
            FormFieldSpec { label: "offers", kind: FieldKind::Int },
        ],
        FormKind::Announcement => &[
            FormFieldSpec { label: "title", kind: FieldKind::Text },
            FormFieldSpec { label: "body", kind: FieldKind::Text },
            FormFieldSpec {
                label: "audience",
                kind: FieldKind::Choice(&["everyone", "students", "faculty", "staff"]),
            },
            FormFieldSpec { label: "posted on", kind: FieldKind::Date },
        ],
        FormKind::Room => &[
            FormFieldSpec { label: "block", kind: FieldKind::Text },
            FormFieldSpec { label: "number", kind: FieldKind::Text },
            FormFieldSpec { label: "capacity", kind: FieldKind::Int },
        ],
        FormKind::RoomAllocation => &[
            FormFieldSpec { label: "room id", kind: FieldKind::Int },
            FormFieldSpec { label: "student id", kind: FieldKind::Int },
            FormFieldSpec { label: "allocated on", kind: FieldKind::Date },
        ],
    }
}

fn blank_values(kind: FormKind, today: Date) -> Vec<String> {
    let today_text = timefmt::format_date(today);
    form_field_specs(kind)
        .iter()
        .map(|spec| match spec.kind {
            FieldKind::Choice(options) => options[0].to_owned(),
            FieldKind::Date => today_text.clone(),
            FieldKind::Int => match (kind, spec.label) {
                (FormKind::Student, "year") => "1".to_owned(),
                (FormKind::Book, "copies") => "1".to_owned(),
                (FormKind::Course, "credits") => "3".to_owned(),
                (FormKind::Course, "semester") => "1".to_owned(),
                (FormKind::Room, "capacity") => "2".to_owned(),
                (FormKind::PlacementDrive, "offers") => "0".to_owned(),
                _ => String::new(),
            },
            _ => String::new(),
        })
        .collect()
}

fn open_create_form(
    state: &mut AppState,
    view_data: &mut ViewData,
    user: &CurrentUser,
    tx: &Sender<InternalEvent>,
) {
    let tab = state.active_tab;
    if !can_mutate(user.role, tab) {
        emit_status(state, view_data, tx, "your role cannot edit this screen");
        return;
    }
    let Some(kind) = create_form_for_tab(tab) else {
        return;
    };
    view_data.dialog.open_create(kind);
    view_data.form = FormUiState {
        values: blank_values(kind, view_data.today),
        field_index: 0,
        payment_target: None,
    };
    state.dispatch(AppCommand::OpenForm(kind), &[]);
}

fn open_allocation_form(
    state: &mut AppState,
    view_data: &mut ViewData,
    user: &CurrentUser,
    tx: &Sender<InternalEvent>,
) {
    if !can_mutate(user.role, TabKind::Hostel) {
        emit_status(state, view_data, tx, "your role cannot edit this screen");
        return;
    }
    let kind = FormKind::RoomAllocation;
    let mut values = blank_values(kind, view_data.today);
    if let Some(room_id) = selected_row_id(state, view_data) {
        values[0] = room_id.to_string();
    }
    view_data.dialog.open_create(kind);
    view_data.form = FormUiState {
        values,
        field_index: 0,
        payment_target: None,
    };
    state.dispatch(AppCommand::OpenForm(kind), &[]);
}

fn open_payment_form(
    state: &mut AppState,
    view_data: &mut ViewData,
    user: &CurrentUser,
    tx: &Sender<InternalEvent>,
) {
    if !can_mutate(user.role, TabKind::Fees) {
        emit_status(state, view_data, tx, "your role cannot edit this screen");
        return;
    }
    let Some(fee_id) = selected_row_id(state, view_data) else {
        emit_status(state, view_data, tx, "no fee selected");
        return;
    };
    let Some(fee) = view_data.screens.fees.get(fee_id) else {
        return;
    };
    let balance = fee.balance_cents();
    if balance <= 0 {
        emit_status(state, view_data, tx, "fee is already settled");
        return;
    }
    view_data.dialog.open_edit(FormKind::Payment, fee_id);
    view_data.form = FormUiState {
        values: vec![String::new()],
        field_index: 0,
        payment_target: Some((fee_id, balance)),
    };
    state.dispatch(AppCommand::OpenForm(FormKind::Payment), &[]);
}

fn open_edit_form(
    state: &mut AppState,
    view_data: &mut ViewData,
    user: &CurrentUser,
    tx: &Sender<InternalEvent>,
) {
    let tab = state.active_tab;
    if !can_mutate(user.role, tab) {
        emit_status(state, view_data, tx, "your role cannot edit this screen");
        return;
    }
    let Some(kind) = create_form_for_tab(tab) else {
        return;
    };
    let Some(row_id) = selected_row_id(state, view_data) else {
        emit_status(state, view_data, tx, "no row selected");
        return;
    };
    let Some(values) = values_from_record(view_data, tab, row_id) else {
        emit_status(state, view_data, tx, "row is gone; reload and retry");
        return;
    };
    view_data.dialog.open_edit(kind, row_id);
    view_data.form = FormUiState {
        values,
        field_index: 0,
        payment_target: None,
    };
    state.dispatch(AppCommand::OpenForm(kind), &[]);
}

fn values_from_record(view_data: &ViewData, tab: TabKind, row_id: i64) -> Option<Vec<String>> {
    let screens = &view_data.screens;
    match tab {
        TabKind::Students => screens.students.get(row_id).map(|student| {
            vec![
                student.name.clone(),
                student.email.clone(),
                student.phone.clone(),
                student.department.clone(),
                student.year.to_string(),
                student.status.as_str().to_owned(),
            ]
        }),
        TabKind::Fees => screens.fees.get(row_id).map(|fee| {
            vec![
                fee.student_id.get().to_string(),
                fee.category.as_str().to_owned(),
                format_cents(fee.amount_cents),
                format_cents(fee.paid_cents),
                timefmt::format_date(fee.due_date),
            ]
        }),
        TabKind::Books => screens.books.get(row_id).map(|book| {
            vec![
                book.title.clone(),
                book.author.clone(),
                book.isbn.clone(),
                book.category.clone(),
                book.total_copies.to_string(),
            ]
        }),
        TabKind::Issuances => screens.issuances.get(row_id).map(|issue| {
            vec![
                issue.book_id.get().to_string(),
                issue.student_id.get().to_string(),
                timefmt::format_date(issue.issued_on),
            ]
        }),
        TabKind::Courses => screens.courses.get(row_id).map(|course| {
            vec![
                course.code.clone(),
                course.title.clone(),
                course.department.clone(),
                course.credits.to_string(),
                course.semester.to_string(),
                course.faculty_name.clone(),
            ]
        }),
        TabKind::Timetable => screens.timetable.get(row_id).map(|entry| {
            vec![
                entry.course_code.clone(),
                entry.day.as_str().to_owned(),
                timefmt::format_clock(entry.starts_at),
                timefmt::format_clock(entry.ends_at),
                entry.room.clone(),
                entry.faculty_name.clone(),
            ]
        }),
        TabKind::Credits => screens.credits.get(row_id).map(|award| {
            vec![
                award.student_id.get().to_string(),
                award.course_code.clone(),
                award.credits.to_string(),
                award.grade.as_str().to_owned(),
                timefmt::format_date(award.awarded_on),
            ]
        }),
        TabKind::Companies => screens.companies.get(row_id).map(|company| {
            vec![
                company.name.clone(),
                company.industry.clone(),
                company.website.clone(),
                company.contact_email.clone(),
            ]
        }),
        TabKind::Drives => screens.drives.get(row_id).map(|drive| {
            vec![
                drive.company_id.get().to_string(),
                drive.role_title.clone(),
                format_cents(drive.package_cents),
                timefmt::format_date(drive.drive_date),
                format_cgpa_tenths(drive.min_cgpa_tenths),
                drive.status.as_str().to_owned(),
                drive.offers_made.to_string(),
            ]
        }),
        TabKind::Announcements => screens.announcements.get(row_id).map(|notice| {
            vec![
                notice.title.clone(),
                notice.body.clone(),
                notice.audience.as_str().to_owned(),
                timefmt::format_date(notice.posted_on),
            ]
        }),
        TabKind::Hostel => screens.rooms.get(row_id).map(|room| {
            vec![
                room.block.clone(),
                room.number.clone(),
                room.capacity.to_string(),
            ]
        }),
        TabKind::Dashboard => None,
    }
}

/// Collects field-level parse failures so every bad field is reported in
/// one pass, mirroring how required-field validation reports all misses.
#[derive(Debug, Default)]
struct ParsedFields {
    problems: Vec<FieldProblem>,
}

impl ParsedFields {
    fn money(&mut self, field: &'static str, raw: &str) -> i64 {
        if raw.trim().is_empty() {
            return 0;
        }
        match parse_required_cents(raw) {
            Ok(value) => value,
            Err(error) => {
                self.problem(field, error.to_string());
                0
            }
        }
    }

    fn optional_money(&mut self, field: &'static str, raw: &str) -> i64 {
        match parse_optional_cents(raw) {
            Ok(value) => value.unwrap_or(0),
            Err(error) => {
                self.problem(field, error.to_string());
                0
            }
        }
    }

    fn date(&mut self, field: &'static str, raw: &str) -> Option<Date> {
        if raw.trim().is_empty() {
            return None;
        }
        match parse_required_date(raw) {
            Ok(value) => Some(value),
            Err(error) => {
                self.problem(field, error.to_string());
                None
            }
        }
    }

    fn time(&mut self, field: &'static str, raw: &str) -> Option<time::Time> {
        if raw.trim().is_empty() {
            return None;
        }
        match parse_required_time(raw) {
            Ok(value) => Some(value),
            Err(error) => {
                self.problem(field, error.to_string());
                None
            }
        }
    }

    fn int(&mut self, field: &'static str, raw: &str) -> i64 {
        if raw.trim().is_empty() {
            return 0;
        }
        match parse_required_int(raw) {
            Ok(value) => value,
            Err(error) => {
                self.problem(field, error.to_string());
                0
            }
        }
    }

    fn cgpa(&mut self, field: &'static str, raw: &str) -> i64 {
        match parse_cgpa_tenths(raw) {
            Ok(value) => value,
            Err(_) => {
                self.problem(field, "must be between 0.0 and 10.0");
                0
            }
        }
    }

    fn problem(&mut self, field: &'static str, message: impl Into<String>) {
        self.problems.push(FieldProblem {
            field,
            message: message.into(),
        });
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                missing: Vec::new(),
                invalid: self.problems,
            })
        }
    }
}

fn build_payload(
    view_data: &ViewData,
    kind: FormKind,
) -> Result<FormPayload, ValidationError> {
    let values = &view_data.form.values;
    let screens = &view_data.screens;
    let mut parsed = ParsedFields::default();

    let payload = match kind {
        FormKind::Student => FormPayload::Student(StudentFormInput {
            name: values[0].trim().to_owned(),
            email: values[1].trim().to_owned(),
            phone: values[2].trim().to_owned(),
            department: values[3].trim().to_owned(),
            year: parsed.int("year", &values[4]),
            status: StudentStatus::parse(&values[5]).unwrap_or(StudentStatus::Active),
        }),
        FormKind::Fee => {
            let student_id = parsed.int("student", &values[0]);
            let student_name = match screens.students.get(student_id) {
                Some(student) => student.name.clone(),
                None => {
                    if student_id > 0 {
                        parsed.problem("student", "unknown student id");
                    }
                    String::new()
                }
            };
            FormPayload::Fee(FeeFormInput {
                student_id: alma_app::StudentId::new(student_id),
                student_name,
                category: FeeCategory::parse(&values[1]).unwrap_or(FeeCategory::Tuition),
                amount_cents: parsed.money("amount", &values[2]),
                paid_cents: parsed.optional_money("paid", &values[3]),
                due_date: parsed.date("due_date", &values[4]),
            })
        }
        FormKind::Payment => {
            let (fee_id, balance) = view_data.form.payment_target.unwrap_or((0, 0));
            FormPayload::Payment(PaymentFormInput {
                fee_id: alma_app::FeeRecordId::new(fee_id),
                amount_cents: parsed.money("amount", &values[0]),
                balance_cents: balance,
            })
        }
        FormKind::Book => FormPayload::Book(BookFormInput {
            title: values[0].trim().to_owned(),
            author: values[1].trim().to_owned(),
            isbn: values[2].trim().to_owned(),
            category: values[3].trim().to_owned(),
            total_copies: parsed.int("copies", &values[4]),
        }),
        FormKind::BookIssuance => {
            let book_id = parsed.int("book", &values[0]);
            let student_id = parsed.int("student", &values[1]);
            let book_title = match screens.books.get(book_id) {
                Some(book) => book.title.clone(),
                None => {
                    if book_id > 0 {
                        parsed.problem("book", "unknown book id");
                    }
                    String::new()
                }
            };
            let student_name = match screens.students.get(student_id) {
                Some(student) => student.name.clone(),
                None => {
                    if student_id > 0 {
                        parsed.problem("student", "unknown student id");
                    }
                    String::new()
                }
            };
            FormPayload::BookIssuance(BookIssuanceFormInput {
                book_id: alma_app::BookId::new(book_id),
                book_title,
                student_id: alma_app::StudentId::new(student_id),
                student_name,
                issued_on: parsed.date("issued_on", &values[2]),
            })
        }
        FormKind::Course => FormPayload::Course(CourseFormInput {
            code: values[0].trim().to_owned(),
            title: values[1].trim().to_owned(),
            department: values[2].trim().to_owned(),
            credits: parsed.int("credits", &values[3]),
            semester: parsed.int("semester", &values[4]),
            faculty_name: values[5].trim().to_owned(),
        }),
        FormKind::TimetableEntry => FormPayload::TimetableEntry(TimetableEntryFormInput {
            course_code: values[0].trim().to_owned(),
            day: Weekday::parse(&values[1]).unwrap_or(Weekday::Mon),
            starts_at: parsed.time("starts_at", &values[2]),
            ends_at: parsed.time("ends_at", &values[3]),
            room: values[4].trim().to_owned(),
            faculty_name: values[5].trim().to_owned(),
        }),
        FormKind::CreditAward => {
            let student_id = parsed.int("student", &values[0]);
            let student_name = match screens.students.get(student_id) {
                Some(student) => student.name.clone(),
                None => {
                    if student_id > 0 {
                        parsed.problem("student", "unknown student id");
                    }
                    String::new()
                }
            };
            let course_code = values[1].trim().to_owned();
            let course_id = screens
                .courses
                .rows()
                .iter()
                .find(|course| course.code == course_code)
                .map(|course| course.id.get())
                .unwrap_or(0);
            FormPayload::CreditAward(CreditAwardFormInput {
                student_id: alma_app::StudentId::new(student_id),
                student_name,
                course_id: alma_app::CourseId::new(course_id),
                course_code,
                credits: parsed.int("credits", &values[2]),
                grade: Grade::parse(&values[3]).unwrap_or(Grade::A),
                awarded_on: parsed.date("awarded_on", &values[4]),
            })
        }
        FormKind::Company => FormPayload::Company(CompanyFormInput {
            name: values[0].trim().to_owned(),
            industry: values[1].trim().to_owned(),
            website: values[2].trim().to_owned(),
            contact_email: values[3].trim().to_owned(),
        }),
        FormKind::PlacementDrive => {
            let company_id = parsed.int("company", &values[0]);
            let company_name = match screens.companies.get(company_id) {
                Some(company) => company.name.clone(),
                None => {
                    if company_id > 0 {
                        parsed.problem("company", "unknown company id");
                    }
                    String::new()
                }
            };
            FormPayload::PlacementDrive(PlacementDriveFormInput {
                company_id: alma_app::CompanyId::new(company_id),
                company_name,
                role_title: values[1].trim().to_owned(),
                package_cents: parsed.money("package", &values[2]),
                drive_date: parsed.date("drive_date", &values[3]),
                min_cgpa_tenths: parsed.cgpa("min_cgpa", &values[4]),
                status: DriveStatus::parse(&values[5]).unwrap_or(DriveStatus::Scheduled),
                offers_made: parsed.int("offers", &values[6]),
            })
        }
        FormKind::Announcement => FormPayload::Announcement(AnnouncementFormInput {
            title: values[0].trim().to_owned(),
            body: values[1].trim().to_owned(),
            audience: Audience::parse(&values[2]).unwrap_or(Audience::Everyone),
            posted_on: parsed.date("posted_on", &values[3]),
        }),
        FormKind::Room => FormPayload::Room(RoomFormInput {
            block: values[0].trim().to_owned(),
            number: values[1].trim().to_owned(),
            capacity: parsed.int("capacity", &values[2]),
        }),
        FormKind::RoomAllocation => {
            let room_id = parsed.int("room", &values[0]);
            let student_id = parsed.int("student", &values[1]);
            let room_label = match screens.rooms.get(room_id) {
                Some(room) => room.label(),
                None => {
                    if room_id > 0 {
                        parsed.problem("room", "unknown room id");
                    }
                    String::new()
                }
            };
            let student_name = match screens.students.get(student_id) {
                Some(student) => student.name.clone(),
                None => {
                    if student_id > 0 {
                        parsed.problem("student", "unknown student id");
                    }
                    String::new()
                }
            };
            FormPayload::RoomAllocation(RoomAllocationFormInput {
                room_id: alma_app::RoomId::new(room_id),
                room_label,
                student_id: alma_app::StudentId::new(student_id),
                student_name,
                allocated_on: parsed.date("allocated_on", &values[2]),
            })
        }
    };

    parsed.finish()?;
    Ok(payload)
}

/// Checks that need more than one collection: copy availability before an
/// issuance, room capacity before an allocation.
fn cross_checks(view_data: &ViewData, payload: &FormPayload) -> Result<(), ValidationError> {
    match payload {
        FormPayload::BookIssuance(input) => {
            let Some(book) = view_data.screens.books.get(input.book_id.get()) else {
                return Ok(());
            };
            if available_copies(book, view_data.screens.issuances.rows()) <= 0 {
                return Err(ValidationError {
                    missing: Vec::new(),
                    invalid: vec![FieldProblem {
                        field: "book",
                        message: format!("no copies of {} available", book.title),
                    }],
                });
            }
            Ok(())
        }
        FormPayload::RoomAllocation(input) => {
            let Some(room) = view_data.screens.rooms.get(input.room_id.get()) else {
                return Ok(());
            };
            ensure_room_has_space(room, view_data.screens.allocations.rows())
        }
        _ => Ok(()),
    }
}

enum SubmitError {
    Gateway(String),
}

fn submit_form(
    state: &mut AppState,
    view_data: &mut ViewData,
    gateway: &Arc<dyn Gateway>,
    user: &CurrentUser,
    tx: &Sender<InternalEvent>,
    kind: FormKind,
) {
    if !view_data.dialog.begin_submit() {
        return;
    }

    let payload = match build_payload(view_data, kind) {
        Ok(payload) => payload,
        Err(validation) => {
            view_data.dialog.reject_invalid(validation.lines());
            return;
        }
    };
    if let Err(validation) = payload.validate() {
        view_data.dialog.reject_invalid(validation.lines());
        return;
    }
    if view_data.dialog.target().is_none()
        && let Err(validation) = cross_checks(view_data, &payload)
    {
        view_data.dialog.reject_invalid(validation.lines());
        return;
    }

    match apply_payload(view_data, gateway.as_ref(), user, &payload) {
        Ok(message) => {
            view_data.dialog.submit_succeeded();
            view_data.form = FormUiState::default();
            state.dispatch(AppCommand::ExitToNav, &[]);
            clamp_selection(state, view_data);
            emit_status(state, view_data, tx, &message);
        }
        Err(SubmitError::Gateway(message)) => {
            view_data.dialog.submit_failed(vec![message.clone()]);
            emit_status(state, view_data, tx, &format!("not saved: {message}"));
        }
    }
}

fn object(value: Value) -> Row {
    match value {
        Value::Object(row) => row,
        _ => Row::new(),
    }
}

fn create_error(error: CreateError) -> SubmitError {
    SubmitError::Gateway(error.to_string())
}

fn mutate_error(error: MutateError) -> SubmitError {
    SubmitError::Gateway(error.to_string())
}

fn apply_payload(
    view_data: &mut ViewData,
    gateway: &dyn Gateway,
    user: &CurrentUser,
    payload: &FormPayload,
) -> Result<String, SubmitError> {
    let target = view_data.dialog.target();
    let screens = &mut view_data.screens;

    match payload {
        FormPayload::Student(input) => {
            let fields = json!({
                "name": input.name,
                "email": input.email,
                "phone": input.phone,
                "department": input.department,
                "year": input.year,
                "status": input.status.as_str(),
            });
            match target {
                Some(id) => {
                    screens
                        .students
                        .update(gateway, id, object(fields))
                        .map_err(mutate_error)?;
                    Ok("student updated".to_owned())
                }
                None => {
                    // Credentials are only issued once validation has passed.
                    let sequence = screens.students.len() as i64 + 1;
                    let issued = issue_credentials(
                        &input.department,
                        view_data.today.year(),
                        sequence,
                        OffsetDateTime::now_utc(),
                    )
                    .map_err(|error| SubmitError::Gateway(error.to_string()))?;
                    let mut row = object(fields);
                    row.insert("roll_no".to_owned(), json!(issued.roll_no));
                    row.insert(
                        "password_sha256".to_owned(),
                        json!(issued.password_sha256),
                    );
                    let student = screens
                        .students
                        .create(gateway, row)
                        .map_err(create_error)?;
                    Ok(format!(
                        "registered {} -- temporary password {}",
                        student.roll_no, issued.password
                    ))
                }
            }
        }
        FormPayload::Fee(input) => {
            let row = object(json!({
                "student_id": input.student_id.get(),
                "student_name": input.student_name,
                "category": input.category.as_str(),
                "amount_cents": input.amount_cents,
                "paid_cents": input.paid_cents,
                "due_date": input.due_date.map(timefmt::format_date),
            }));
            match target {
                Some(id) => {
                    screens.fees.update(gateway, id, row).map_err(mutate_error)?;
                    Ok("fee updated".to_owned())
                }
                None => {
                    screens.fees.create(gateway, row).map_err(create_error)?;
                    Ok("fee recorded".to_owned())
                }
            }
        }
        FormPayload::Payment(input) => {
            let fee_id = input.fee_id.get();
            let paid = screens
                .fees
                .get(fee_id)
                .map(|fee| fee.paid_cents + input.amount_cents)
                .unwrap_or(input.amount_cents);
            let updated = screens
                .fees
                .update(gateway, fee_id, object(json!({"paid_cents": paid})))
                .map_err(mutate_error)?;
            let status = updated.status(view_data.today);
            Ok(format!(
                "payment of {} recorded -- now {}",
                format_cents(input.amount_cents),
                status.as_str()
            ))
        }
        FormPayload::Book(input) => {
            let row = object(json!({
                "title": input.title,
                "author": input.author,
                "isbn": input.isbn,
                "category": input.category,
                "total_copies": input.total_copies,
            }));
            match target {
                Some(id) => {
                    screens.books.update(gateway, id, row).map_err(mutate_error)?;
                    Ok("book updated".to_owned())
                }
                None => {
                    screens.books.create(gateway, row).map_err(create_error)?;
                    Ok("book added".to_owned())
                }
            }
        }
        FormPayload::BookIssuance(input) => {
            let issued_on = input.issued_on.unwrap_or(view_data.today);
            let row = object(json!({
                "book_id": input.book_id.get(),
                "book_title": input.book_title,
                "student_id": input.student_id.get(),
                "student_name": input.student_name,
                "issued_on": timefmt::format_date(issued_on),
                "due_on": timefmt::format_date(loan_due_date(issued_on)),
                "returned_on": Value::Null,
            }));
            match target {
                Some(id) => {
                    screens
                        .issuances
                        .update(gateway, id, row)
                        .map_err(mutate_error)?;
                    Ok("issuance updated".to_owned())
                }
                None => {
                    let issue = screens
                        .issuances
                        .create(gateway, row)
                        .map_err(create_error)?;
                    Ok(format!(
                        "issued {} until {}",
                        issue.book_title,
                        timefmt::format_date(issue.due_on)
                    ))
                }
            }
        }
        FormPayload::Course(input) => {
            let row = object(json!({
                "code": input.code,
                "title": input.title,
                "department": input.department,
                "credits": input.credits,
                "semester": input.semester,
                "faculty_name": input.faculty_name,
            }));
            match target {
                Some(id) => {
                    screens
                        .courses
                        .update(gateway, id, row)
                        .map_err(mutate_error)?;
                    Ok("course updated".to_owned())
                }
                None => {
                    screens.courses.create(gateway, row).map_err(create_error)?;
                    Ok("course added".to_owned())
                }
            }
        }
        FormPayload::TimetableEntry(input) => {
            let row = object(json!({
                "course_code": input.course_code,
                "day": input.day.as_str(),
                "starts_at": input.starts_at.map(timefmt::format_clock),
                "ends_at": input.ends_at.map(timefmt::format_clock),
                "room": input.room,
                "faculty_name": input.faculty_name,
            }));
            match target {
                Some(id) => {
                    screens
                        .timetable
                        .update(gateway, id, row)
                        .map_err(mutate_error)?;
                    Ok("timetable slot updated".to_owned())
                }
                None => {
                    screens
                        .timetable
                        .create(gateway, row)
                        .map_err(create_error)?;
                    Ok("timetable slot added".to_owned())
                }
            }
        }
        FormPayload::CreditAward(input) => {
            let row = object(json!({
                "student_id": input.student_id.get(),
                "student_name": input.student_name,
                "course_code": input.course_code,
                "credits": input.credits,
                "grade": input.grade.as_str(),
                "awarded_on": input.awarded_on.map(timefmt::format_date),
            }));
            match target {
                Some(id) => {
                    screens
                        .credits
                        .update(gateway, id, row)
                        .map_err(mutate_error)?;
                    Ok("credit award updated".to_owned())
                }
                None => {
                    screens.credits.create(gateway, row).map_err(create_error)?;
                    Ok("credits awarded".to_owned())
                }
            }
        }
        FormPayload::Company(input) => {
            let row = object(json!({
                "name": input.name,
                "industry": input.industry,
                "website": input.website,
                "contact_email": input.contact_email,
            }));
            match target {
                Some(id) => {
                    screens
                        .companies
                        .update(gateway, id, row)
                        .map_err(mutate_error)?;
                    Ok("company updated".to_owned())
                }
                None => {
                    screens
                        .companies
                        .create(gateway, row)
                        .map_err(create_error)?;
                    Ok("company added".to_owned())
                }
            }
        }
        FormPayload::PlacementDrive(input) => {
            let row = object(json!({
                "company_id": input.company_id.get(),
                "company_name": input.company_name,
                "role_title": input.role_title,
                "package_cents": input.package_cents,
                "drive_date": input.drive_date.map(timefmt::format_date),
                "min_cgpa_tenths": input.min_cgpa_tenths,
                "status": input.status.as_str(),
                "offers_made": input.offers_made,
            }));
            match target {
                Some(id) => {
                    screens.drives.update(gateway, id, row).map_err(mutate_error)?;
                    Ok("drive updated".to_owned())
                }
                None => {
                    screens.drives.create(gateway, row).map_err(create_error)?;
                    Ok("drive scheduled".to_owned())
                }
            }
        }
        FormPayload::Announcement(input) => {
            let mut row = object(json!({
                "title": input.title,
                "body": input.body,
                "audience": input.audience.as_str(),
                "posted_on": input.posted_on.map(timefmt::format_date),
            }));
            match target {
                Some(id) => {
                    screens
                        .announcements
                        .update(gateway, id, row)
                        .map_err(mutate_error)?;
                    Ok("announcement updated".to_owned())
                }
                None => {
                    // Attribution comes from the session, never the form.
                    row.insert("author_id".to_owned(), json!(user.user_id.get()));
                    row.insert("author_name".to_owned(), json!(user.name));
                    screens
                        .announcements
                        .create(gateway, row)
                        .map_err(create_error)?;
                    Ok("announcement posted".to_owned())
                }
            }
        }
        FormPayload::Room(input) => {
            let row = object(json!({
                "block": input.block,
                "number": input.number,
                "capacity": input.capacity,
            }));
            match target {
                Some(id) => {
                    screens.rooms.update(gateway, id, row).map_err(mutate_error)?;
                    Ok("room updated".to_owned())
                }
                None => {
                    screens.rooms.create(gateway, row).map_err(create_error)?;
                    Ok("room added".to_owned())
                }
            }
        }
        FormPayload::RoomAllocation(input) => {
            let row = object(json!({
                "room_id": input.room_id.get(),
                "room_label": input.room_label,
                "student_id": input.student_id.get(),
                "student_name": input.student_name,
                "allocated_on": input.allocated_on.map(timefmt::format_date),
            }));
            screens
                .allocations
                .create(gateway, row)
                .map_err(create_error)?;
            Ok(format!("allocated {} to {}", input.student_name, input.room_label))
        }
    }
}

fn return_selected_book(
    state: &mut AppState,
    view_data: &mut ViewData,
    gateway: &Arc<dyn Gateway>,
    user: &CurrentUser,
    tx: &Sender<InternalEvent>,
) {
    if !can_mutate(user.role, TabKind::Issuances) {
        emit_status(state, view_data, tx, "your role cannot edit this screen");
        return;
    }
    let Some(issue_id) = selected_row_id(state, view_data) else {
        emit_status(state, view_data, tx, "no issuance selected");
        return;
    };
    let Some(issue) = view_data.screens.issuances.get(issue_id) else {
        return;
    };
    if issue.returned_on.is_some() {
        emit_status(state, view_data, tx, "already returned");
        return;
    }

    let today = view_data.today;
    let patch = object(json!({"returned_on": timefmt::format_date(today)}));
    match view_data
        .screens
        .issuances
        .update(gateway.as_ref(), issue_id, patch)
    {
        Ok(updated) => {
            let fine = updated.fine_cents(today);
            let message = if fine > 0 {
                format!("returned {} -- fine {}", updated.book_title, format_cents(fine))
            } else {
                format!("returned {}", updated.book_title)
            };
            emit_status(state, view_data, tx, &message);
        }
        Err(error) => {
            emit_status(state, view_data, tx, &format!("not saved: {error}"));
        }
    }
}

fn request_delete(
    state: &mut AppState,
    view_data: &mut ViewData,
    user: &CurrentUser,
    tx: &Sender<InternalEvent>,
) {
    let tab = state.active_tab;
    if tab == TabKind::Dashboard {
        return;
    }
    if !can_mutate(user.role, tab) {
        emit_status(state, view_data, tx, "your role cannot edit this screen");
        return;
    }
    let Some(row_id) = selected_row_id(state, view_data) else {
        emit_status(state, view_data, tx, "no row selected");
        return;
    };
    if let Some(blocked) = delete_guard(view_data, tab, row_id) {
        emit_status(state, view_data, tx, &blocked);
        return;
    }
    view_data.pending_delete = Some(row_id);
    state.dispatch(AppCommand::RequestDelete, &[]);
}

/// Guards that keep obviously-inconsistent deletes from reaching the
/// backend, using whatever collections the tab already has loaded.
fn delete_guard(view_data: &ViewData, tab: TabKind, row_id: i64) -> Option<String> {
    match tab {
        TabKind::Books => {
            let book = view_data.screens.books.get(row_id)?;
            let out = view_data
                .screens
                .issuances
                .rows()
                .iter()
                .filter(|issue| issue.book_id.get() == row_id && issue.is_active())
                .count();
            (out > 0).then(|| format!("{} has {out} copies out on loan", book.title))
        }
        TabKind::Hostel => {
            let room = view_data.screens.rooms.get(row_id)?;
            let occupied = room_occupancy(room, view_data.screens.allocations.rows());
            (occupied > 0).then(|| format!("{} still has {occupied} occupants", room.label()))
        }
        TabKind::Fees => {
            let fee = view_data.screens.fees.get(row_id)?;
            (fee.paid_cents > 0)
                .then(|| "fees with recorded payments cannot be deleted".to_owned())
        }
        _ => None,
    }
}

fn perform_delete(
    state: &mut AppState,
    view_data: &mut ViewData,
    gateway: &Arc<dyn Gateway>,
    tx: &Sender<InternalEvent>,
    row_id: i64,
) {
    let gateway = gateway.as_ref();
    let screens = &mut view_data.screens;
    let result = match state.active_tab {
        TabKind::Students => remove_from(&mut screens.students, gateway, row_id),
        TabKind::Fees => remove_from(&mut screens.fees, gateway, row_id),
        TabKind::Books => remove_from(&mut screens.books, gateway, row_id),
        TabKind::Issuances => remove_from(&mut screens.issuances, gateway, row_id),
        TabKind::Courses => remove_from(&mut screens.courses, gateway, row_id),
        TabKind::Timetable => remove_from(&mut screens.timetable, gateway, row_id),
        TabKind::Credits => remove_from(&mut screens.credits, gateway, row_id),
        TabKind::Companies => remove_from(&mut screens.companies, gateway, row_id),
        TabKind::Drives => remove_from(&mut screens.drives, gateway, row_id),
        TabKind::Announcements => remove_from(&mut screens.announcements, gateway, row_id),
        TabKind::Hostel => remove_from(&mut screens.rooms, gateway, row_id),
        TabKind::Dashboard => DeleteResult::Missing,
    };

    let message = match result {
        DeleteResult::Removed => "deleted".to_owned(),
        DeleteResult::AlreadyGone => "row was already gone; view refreshed".to_owned(),
        DeleteResult::Missing => "row not found; reload and retry".to_owned(),
        DeleteResult::Failed(error) => format!("delete failed: {error}"),
    };
    clamp_selection(state, view_data);
    emit_status(state, view_data, tx, &message);
}

enum DeleteResult {
    Removed,
    AlreadyGone,
    Missing,
    Failed(String),
}

fn remove_from<E: alma_store::Entity>(
    collection: &mut Collection<E>,
    gateway: &dyn Gateway,
    row_id: i64,
) -> DeleteResult {
    let Some(staged) = collection.stage_removal(row_id) else {
        return DeleteResult::Missing;
    };
    match collection.commit_removal(gateway, staged) {
        Ok(alma_store::RemoveOutcome::Removed) => DeleteResult::Removed,
        Ok(alma_store::RemoveOutcome::AlreadyGone) => DeleteResult::AlreadyGone,
        Err(error) => DeleteResult::Failed(error.to_string()),
    }
}

fn request_vacate(
    state: &mut AppState,
    view_data: &mut ViewData,
    user: &CurrentUser,
    tx: &Sender<InternalEvent>,
) {
    if !can_mutate(user.role, TabKind::Hostel) {
        emit_status(state, view_data, tx, "your role cannot edit this screen");
        return;
    }
    let Some(room_id) = selected_row_id(state, view_data) else {
        emit_status(state, view_data, tx, "no room selected");
        return;
    };
    let latest = view_data
        .screens
        .allocations
        .rows()
        .iter()
        .filter(|allocation| allocation.room_id.get() == room_id)
        .max_by_key(|allocation| allocation.id.get())
        .map(|allocation| allocation.id.get());
    let Some(allocation_id) = latest else {
        emit_status(state, view_data, tx, "room is already empty");
        return;
    };
    view_data.pending_vacate = Some(allocation_id);
    state.dispatch(AppCommand::RequestDelete, &[]);
}

fn perform_vacate(
    state: &mut AppState,
    view_data: &mut ViewData,
    gateway: &Arc<dyn Gateway>,
    tx: &Sender<InternalEvent>,
    allocation_id: i64,
) {
    let result = remove_from(
        &mut view_data.screens.allocations,
        gateway.as_ref(),
        allocation_id,
    );
    let message = match result {
        DeleteResult::Removed => "allocation removed".to_owned(),
        DeleteResult::AlreadyGone => "allocation was already gone".to_owned(),
        DeleteResult::Missing => "allocation not found; reload and retry".to_owned(),
        DeleteResult::Failed(error) => format!("vacate failed: {error}"),
    };
    emit_status(state, view_data, tx, &message);
}

fn render(
    frame: &mut ratatui::Frame<'_>,
    state: &AppState,
    view_data: &ViewData,
    user: &CurrentUser,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let tabs = user.role.tabs();
    let selected = tabs
        .iter()
        .position(|tab| *tab == state.active_tab)
        .unwrap_or(0);
    let titles = tabs
        .iter()
        .map(|tab| tab.label().to_owned())
        .collect::<Vec<String>>();
    let tab_bar = Tabs::new(titles)
        .block(
            Block::default()
                .title(format!("alma -- {} ({})", user.name, user.role.as_str()))
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tab_bar, layout[0]);

    if state.active_tab == TabKind::Dashboard {
        let body = Paragraph::new(dashboard_text(view_data, user))
            .block(Block::default().borders(Borders::ALL).title("overview"));
        frame.render_widget(body, layout[1]);
    } else {
        render_table(frame, layout[1], state, view_data);
    }

    let stats = Paragraph::new(stats_text(state, view_data))
        .block(Block::default().borders(Borders::ALL).title("stats"));
    frame.render_widget(stats, layout[2]);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if let AppMode::Form(kind) = state.mode {
        render_form_overlay(frame, view_data, kind);
    }

    if state.mode == AppMode::ConfirmDelete {
        let area = centered_rect(50, 20, frame.area());
        frame.render_widget(Clear, area);
        let prompt = Paragraph::new(confirm_text(state, view_data)).block(
            Block::default()
                .title("confirm")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Red)),
        );
        frame.render_widget(prompt, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let (headers, rows) = table_projection(state, view_data);
    let ui = view_data.tab_ui_ref(state.active_tab);
    let selected = ui.selected.min(rows.len().saturating_sub(1));

    let header_cells = headers.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = TableRow::new(header_cells);

    let body = rows.iter().enumerate().map(|(index, cells)| {
        let style = if index == selected && !rows.is_empty() {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        TableRow::new(cells.iter().map(|cell| Cell::from(cell.clone()).style(style)))
    });

    let widths = vec![Constraint::Min(6); headers.len().max(1)];
    let table = Table::new(body, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(state, view_data, rows.len()))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn table_title(state: &AppState, view_data: &ViewData, visible: usize) -> String {
    let ui = view_data.tab_ui_ref(state.active_tab);
    let mut title = format!("{} ({visible})", state.active_tab.label());
    if !ui.filter.text().trim().is_empty() {
        title.push_str(&format!(" /{}", ui.filter.text()));
    }
    if let Some((field, _)) = facet_options(state.active_tab)
        && let Some(value) = ui.filter.facet(field)
    {
        title.push_str(&format!(" [{field}={value}]"));
    }
    if let Some(status) = ui.fee_status {
        title.push_str(&format!(" [status={}]", status.as_str()));
    }
    if ui.mine_only {
        title.push_str(" [mine]");
    }
    title
}

fn table_projection(
    state: &AppState,
    view_data: &ViewData,
) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let ui = view_data.tab_ui_ref(state.active_tab);
    let screens = &view_data.screens;
    let today = view_data.today;

    match state.active_tab {
        TabKind::Dashboard => (Vec::new(), Vec::new()),
        TabKind::Students => (
            vec!["id", "roll no", "name", "email", "department", "year", "status"],
            screens
                .students
                .query(&ui.filter)
                .map(|student| {
                    vec![
                        student.id.get().to_string(),
                        student.roll_no.clone(),
                        student.name.clone(),
                        student.email.clone(),
                        student.department.clone(),
                        student.year.to_string(),
                        student.status.as_str().to_owned(),
                    ]
                })
                .collect(),
        ),
        TabKind::Fees => (
            vec!["id", "student", "category", "amount", "paid", "balance", "status", "due"],
            screens
                .fees
                .query(&ui.filter)
                .filter(|fee| {
                    ui.fee_status
                        .is_none_or(|status| fee.status(today) == status)
                })
                .map(|fee| {
                    vec![
                        fee.id.get().to_string(),
                        fee.student_name.clone(),
                        fee.category.as_str().to_owned(),
                        format_cents(fee.amount_cents),
                        format_cents(fee.paid_cents),
                        format_cents(fee.balance_cents()),
                        fee.status(today).as_str().to_owned(),
                        timefmt::format_date(fee.due_date),
                    ]
                })
                .collect(),
        ),
        TabKind::Books => (
            vec!["id", "title", "author", "category", "copies", "available"],
            screens
                .books
                .query(&ui.filter)
                .map(|book| {
                    vec![
                        book.id.get().to_string(),
                        book.title.clone(),
                        book.author.clone(),
                        book.category.clone(),
                        book.total_copies.to_string(),
                        available_copies(book, screens.issuances.rows()).to_string(),
                    ]
                })
                .collect(),
        ),
        TabKind::Issuances => (
            vec!["id", "book", "student", "issued", "due", "returned", "status", "fine"],
            screens
                .issuances
                .query(&ui.filter)
                .map(|issue| {
                    let fine = issue.fine_cents(today);
                    vec![
                        issue.id.get().to_string(),
                        issue.book_title.clone(),
                        issue.student_name.clone(),
                        timefmt::format_date(issue.issued_on),
                        timefmt::format_date(issue.due_on),
                        issue
                            .returned_on
                            .map(timefmt::format_date)
                            .unwrap_or_default(),
                        issue.status(today).as_str().to_owned(),
                        if fine > 0 {
                            format_cents(fine)
                        } else {
                            String::new()
                        },
                    ]
                })
                .collect(),
        ),
        TabKind::Courses => (
            vec!["id", "code", "title", "department", "credits", "sem", "faculty"],
            screens
                .courses
                .query(&ui.filter)
                .map(|course| {
                    vec![
                        course.id.get().to_string(),
                        course.code.clone(),
                        course.title.clone(),
                        course.department.clone(),
                        course.credits.to_string(),
                        course.semester.to_string(),
                        course.faculty_name.clone(),
                    ]
                })
                .collect(),
        ),
        TabKind::Timetable => (
            vec!["id", "course", "slot", "room", "faculty"],
            screens
                .timetable
                .query(&ui.filter)
                .map(|entry| {
                    vec![
                        entry.id.get().to_string(),
                        entry.course_code.clone(),
                        entry.slot_label(),
                        entry.room.clone(),
                        entry.faculty_name.clone(),
                    ]
                })
                .collect(),
        ),
        TabKind::Credits => (
            vec!["id", "student", "course", "credits", "grade", "awarded"],
            screens
                .credits
                .query(&ui.filter)
                .map(|award| {
                    vec![
                        award.id.get().to_string(),
                        award.student_name.clone(),
                        award.course_code.clone(),
                        award.credits.to_string(),
                        award.grade.as_str().to_owned(),
                        timefmt::format_date(award.awarded_on),
                    ]
                })
                .collect(),
        ),
        TabKind::Companies => (
            vec!["id", "name", "industry", "website", "contact"],
            screens
                .companies
                .query(&ui.filter)
                .map(|company| {
                    vec![
                        company.id.get().to_string(),
                        company.name.clone(),
                        company.industry.clone(),
                        company.website.clone(),
                        company.contact_email.clone(),
                    ]
                })
                .collect(),
        ),
        TabKind::Drives => (
            vec!["id", "company", "role", "package", "date", "min cgpa", "status", "offers"],
            screens
                .drives
                .query(&ui.filter)
                .map(|drive| {
                    vec![
                        drive.id.get().to_string(),
                        drive.company_name.clone(),
                        drive.role_title.clone(),
                        format_compact_cents(drive.package_cents),
                        timefmt::format_date(drive.drive_date),
                        format_cgpa_tenths(drive.min_cgpa_tenths),
                        drive.status.as_str().to_owned(),
                        drive.offers_made.to_string(),
                    ]
                })
                .collect(),
        ),
        TabKind::Announcements => (
            vec!["id", "title", "audience", "author", "posted"],
            screens
                .announcements
                .query(&ui.filter)
                .map(|notice| {
                    vec![
                        notice.id.get().to_string(),
                        notice.title.clone(),
                        notice.audience.as_str().to_owned(),
                        notice.author_name.clone(),
                        timefmt::format_date(notice.posted_on),
                    ]
                })
                .collect(),
        ),
        TabKind::Hostel => (
            vec!["id", "room", "capacity", "occupied", "vacant"],
            screens
                .rooms
                .query(&ui.filter)
                .map(|room| {
                    let occupied = room_occupancy(room, screens.allocations.rows());
                    vec![
                        room.id.get().to_string(),
                        room.label(),
                        room.capacity.to_string(),
                        occupied.to_string(),
                        (room.capacity - occupied).max(0).to_string(),
                    ]
                })
                .collect(),
        ),
    }
}

fn dashboard_text(view_data: &ViewData, user: &CurrentUser) -> String {
    let screens = &view_data.screens;
    let counts = dashboard_counts(
        screens.students.rows(),
        screens.fees.rows(),
        screens.issuances.rows(),
        screens.drives.rows(),
        view_data.today,
    );

    let mut lines = vec![
        format!("signed in as {} ({})", user.name, user.role.as_str()),
        String::new(),
        format!("active students: {}", counts.students_active),
        format!("fees with balance: {}", counts.fees_pending),
        format!("overdue library books: {}", counts.books_overdue),
        format!("upcoming placement drives: {}", counts.drives_scheduled),
    ];

    let mut notices: Vec<&Announcement> = screens.announcements.rows().iter().collect();
    notices.sort_by(|a, b| b.posted_on.cmp(&a.posted_on).then(b.id.cmp(&a.id)));
    if !notices.is_empty() {
        lines.push(String::new());
        lines.push("latest notices:".to_owned());
        for notice in notices.iter().take(5) {
            lines.push(format!(
                "  {}  {} ({})",
                timefmt::format_date(notice.posted_on),
                notice.title,
                notice.audience.as_str(),
            ));
        }
    }
    lines.join("\n")
}

fn stats_text(state: &AppState, view_data: &ViewData) -> String {
    let screens = &view_data.screens;
    let today = view_data.today;
    match state.active_tab {
        TabKind::Dashboard => "Tab switch screen · ? help · q quit".to_owned(),
        TabKind::Students => {
            let rows = screens.students.rows();
            let active = rows
                .iter()
                .filter(|s| s.status == StudentStatus::Active)
                .count();
            format!(
                "{} students · {} active · {} alumni or suspended",
                rows.len(),
                active,
                rows.len() - active
            )
        }
        TabKind::Fees => {
            let stats = fee_stats(screens.fees.rows(), today);
            format!(
                "billed {} · collected {} · pending {} | paid {} · partial {} · pending {} · overdue {}",
                format_compact_cents(stats.total_billed_cents),
                format_compact_cents(stats.total_collected_cents),
                format_compact_cents(stats.total_pending_cents),
                stats.paid,
                stats.partial,
                stats.pending,
                stats.overdue,
            )
        }
        TabKind::Books => {
            let stats = library_stats(screens.books.rows(), screens.issuances.rows(), today);
            format!(
                "{} titles · {} copies · {} out · {} available · {} overdue · fines {}",
                stats.titles,
                stats.total_copies,
                stats.issued,
                stats.available,
                stats.overdue,
                format_cents(stats.outstanding_fine_cents),
            )
        }
        TabKind::Issuances => {
            let rows = screens.issuances.rows();
            let active = rows.iter().filter(|issue| issue.is_active()).count();
            let overdue = rows
                .iter()
                .filter(|issue| issue.is_active() && today > issue.due_on)
                .count();
            let fines: i64 = rows.iter().map(|issue| issue.fine_cents(today)).sum();
            format!(
                "{} issues · {} out · {} overdue · fines {}",
                rows.len(),
                active,
                overdue,
                format_cents(fines),
            )
        }
        TabKind::Courses => {
            let total: i64 = screens.courses.rows().iter().map(|c| c.credits).sum();
            format!(
                "{} courses · {} credits offered",
                screens.courses.len(),
                total
            )
        }
        TabKind::Timetable => format!("{} scheduled slots", screens.timetable.len()),
        TabKind::Credits => {
            let stats = credit_stats(screens.credits.rows());
            format!(
                "{} awards · {} credits · gpa {}.{:02}",
                stats.awards,
                stats.total_credits,
                stats.gpa_hundredths / 100,
                stats.gpa_hundredths % 100,
            )
        }
        TabKind::Companies => format!("{} companies on campus", screens.companies.len()),
        TabKind::Drives => {
            let stats = placement_stats(screens.drives.rows());
            format!(
                "{} drives · {} scheduled · {} completed · {} offers · best {}",
                stats.drives,
                stats.scheduled,
                stats.completed,
                stats.offers_made,
                format_compact_cents(stats.highest_package_cents),
            )
        }
        TabKind::Announcements => format!("{} notices", screens.announcements.len()),
        TabKind::Hostel => {
            let stats = hostel_stats(screens.rooms.rows(), screens.allocations.rows());
            format!(
                "{} rooms · capacity {} · occupied {} · vacant {}",
                stats.rooms, stats.capacity, stats.occupied, stats.vacant,
            )
        }
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.pending_load.is_some() {
        return "loading...".to_owned();
    }
    if let Some(message) = &state.status_line {
        return message.clone();
    }
    match state.mode {
        AppMode::Nav => {
            "n new · e edit · d delete · / search · f filter · R reload · ? help".to_owned()
        }
        AppMode::Search => format!(
            "search: {}_  (Enter keep, Esc clear)",
            view_data.tab_ui_ref(state.active_tab).filter.text()
        ),
        AppMode::Form(kind) => format!(
            "{} form -- Enter save · Esc cancel",
            kind.label()
        ),
        AppMode::ConfirmDelete => "confirm delete: y / n".to_owned(),
    }
}

fn confirm_text(state: &AppState, view_data: &ViewData) -> String {
    if let Some(allocation_id) = view_data.pending_vacate {
        let label = view_data
            .screens
            .allocations
            .get(allocation_id)
            .map(|allocation| {
                format!("{} from {}", allocation.student_name, allocation.room_label)
            })
            .unwrap_or_else(|| format!("allocation {allocation_id}"));
        return format!("\nRemove {label}?\n\n  y confirm    n cancel");
    }
    let summary = view_data
        .pending_delete
        .map(|row_id| format!("{} row {row_id}", state.active_tab.label()))
        .unwrap_or_else(|| "this row".to_owned());
    format!("\nDelete {summary}? This cannot be undone.\n\n  y confirm    n cancel")
}

fn render_form_overlay(frame: &mut ratatui::Frame<'_>, view_data: &ViewData, kind: FormKind) {
    let area = centered_rect(64, 70, frame.area());
    frame.render_widget(Clear, area);

    let specs = form_field_specs(kind);
    let mut lines = Vec::with_capacity(specs.len() + 4);
    for (index, spec) in specs.iter().enumerate() {
        let marker = if index == view_data.form.field_index {
            ">"
        } else {
            " "
        };
        let value = view_data
            .form
            .values
            .get(index)
            .map(String::as_str)
            .unwrap_or_default();
        let hint = match spec.kind {
            FieldKind::Choice(_) => "  (left/right)",
            FieldKind::Date => "  (YYYY-MM-DD)",
            FieldKind::Time => "  (HH:MM)",
            _ => "",
        };
        lines.push(format!("{marker} {:<12} {value}{hint}", spec.label));
    }

    if view_data.dialog.phase() == DialogPhase::Submitting {
        lines.push(String::new());
        lines.push("saving...".to_owned());
    } else if !view_data.dialog.errors().is_empty() {
        lines.push(String::new());
        for error in view_data.dialog.errors() {
            lines.push(format!("! {error}"));
        }
    }

    let title = if view_data.dialog.is_edit() && kind != FormKind::Payment {
        format!("edit {}", kind.label())
    } else {
        format!("new {}", kind.label())
    };
    let dialog = Paragraph::new(lines.join("\n")).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(dialog, area);
}

fn help_text() -> String {
    [
        "navigation",
        "  Tab / ]        next screen",
        "  Shift-Tab / [  previous screen",
        "  j / k          move selection",
        "  g / G          first / last row",
        "  R              reload from the backend",
        "",
        "filtering",
        "  /              text search on this screen",
        "  f              cycle the screen's filter",
        "  s              cycle fee status (fees)",
        "  m              only my notices (notices)",
        "",
        "editing",
        "  n              new record",
        "  e              edit selected record",
        "  d              delete selected record (asks first)",
        "  p              record a payment (fees)",
        "  r              return a book (issues)",
        "  a / x          allocate / vacate a room (hostel)",
        "",
        "forms",
        "  Up/Down/Tab    move between fields",
        "  Left/Right     cycle a choice field",
        "  Enter          save",
        "  Esc            cancel",
        "",
        "q quits from navigation. Any key closes this help.",
    ]
    .join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use alma_store::LocalGateway;
    use std::sync::mpsc;
    use time::macros::date;

    fn admin() -> CurrentUser {
        CurrentUser {
            user_id: alma_app::UserId::new(1),
            role: Role::Admin,
            name: "Registrar Office".to_owned(),
            email: "registrar@college.edu".to_owned(),
        }
    }

    fn student_user(id: i64) -> CurrentUser {
        CurrentUser {
            user_id: alma_app::UserId::new(id),
            role: Role::Student,
            name: "Meera Nair".to_owned(),
            email: "meera@college.edu".to_owned(),
        }
    }

    fn seeded_view() -> (Arc<dyn Gateway>, ViewData) {
        let gateway = LocalGateway::open_memory().expect("open gateway");
        gateway.bootstrap().expect("bootstrap");
        alma_testkit::seed_demo(&gateway).expect("seed demo data");
        let gateway: Arc<dyn Gateway> = Arc::new(gateway);

        let mut view = ViewData::new(date!(2026 - 07 - 01));
        let all = ListFilter::new();
        view.screens.students.load(gateway.as_ref(), &all).expect("students");
        view.screens.fees.load(gateway.as_ref(), &all).expect("fees");
        view.screens.books.load(gateway.as_ref(), &all).expect("books");
        view.screens.issuances.load(gateway.as_ref(), &all).expect("issuances");
        view.screens.courses.load(gateway.as_ref(), &all).expect("courses");
        view.screens.timetable.load(gateway.as_ref(), &all).expect("timetable");
        view.screens.credits.load(gateway.as_ref(), &all).expect("credits");
        view.screens.companies.load(gateway.as_ref(), &all).expect("companies");
        view.screens.drives.load(gateway.as_ref(), &all).expect("drives");
        view.screens.announcements.load(gateway.as_ref(), &all).expect("announcements");
        view.screens.rooms.load(gateway.as_ref(), &all).expect("rooms");
        view.screens.allocations.load(gateway.as_ref(), &all).expect("allocations");
        (gateway, view)
    }

    #[test]
    fn student_tab_loads_are_scoped_to_their_own_rows() {
        let user = student_user(7);
        for tab in [TabKind::Fees, TabKind::Issuances, TabKind::Credits] {
            let specs = tables_for_tab(tab, &user);
            let scoped = specs
                .iter()
                .find(|(table, _)| {
                    matches!(*table, "fees" | "book_issuances" | "credit_awards")
                })
                .expect("scoped table present");
            assert!(!scoped.1.is_empty(), "{tab:?} load must be scoped");
        }

        // Staff see everything.
        let specs = tables_for_tab(TabKind::Fees, &admin());
        assert!(specs.iter().all(|(_, filter)| filter.is_empty()));
    }

    #[test]
    fn mutation_rights_follow_roles() {
        assert!(can_mutate(Role::Accountant, TabKind::Fees));
        assert!(!can_mutate(Role::Accountant, TabKind::Books));
        assert!(can_mutate(Role::Librarian, TabKind::Issuances));
        assert!(!can_mutate(Role::Student, TabKind::Announcements));
        assert!(can_mutate(Role::Warden, TabKind::Hostel));
        assert!(can_mutate(Role::Admin, TabKind::Students));
        assert!(!can_mutate(Role::Faculty, TabKind::Drives));
    }

    #[test]
    fn blank_values_cover_every_field_of_every_form() {
        for kind in [
            FormKind::Student,
            FormKind::Fee,
            FormKind::Payment,
            FormKind::Book,
            FormKind::BookIssuance,
            FormKind::Course,
            FormKind::TimetableEntry,
            FormKind::CreditAward,
            FormKind::Company,
            FormKind::PlacementDrive,
            FormKind::Announcement,
            FormKind::Room,
            FormKind::RoomAllocation,
        ] {
            let specs = form_field_specs(kind);
            let values = blank_values(kind, date!(2026 - 07 - 01));
            assert_eq!(specs.len(), values.len(), "{kind:?}");
        }
    }

    #[test]
    fn prefill_matches_field_specs_for_every_tab() {
        let (_gateway, view) = seeded_view();
        let cases = [
            (TabKind::Students, FormKind::Student),
            (TabKind::Fees, FormKind::Fee),
            (TabKind::Books, FormKind::Book),
            (TabKind::Issuances, FormKind::BookIssuance),
            (TabKind::Courses, FormKind::Course),
            (TabKind::Timetable, FormKind::TimetableEntry),
            (TabKind::Credits, FormKind::CreditAward),
            (TabKind::Companies, FormKind::Company),
            (TabKind::Drives, FormKind::PlacementDrive),
            (TabKind::Announcements, FormKind::Announcement),
            (TabKind::Hostel, FormKind::Room),
        ];
        for (tab, kind) in cases {
            let state = AppState {
                active_tab: tab,
                ..AppState::default()
            };
            let row_id = visible_row_ids(&state, &view)[0];
            let values = values_from_record(&view, tab, row_id).expect("prefill");
            assert_eq!(values.len(), form_field_specs(kind).len(), "{tab:?}");
        }
    }

    #[test]
    fn registration_with_empty_email_reports_the_field_and_issues_nothing() {
        let (gateway, mut view) = seeded_view();
        let mut state = AppState {
            active_tab: TabKind::Students,
            ..AppState::default()
        };
        let (tx, _rx) = mpsc::channel();
        let user = admin();
        let before = view.screens.students.len();

        open_create_form(&mut state, &mut view, &user, &tx);
        view.form.values = vec![
            "Divya Menon".to_owned(),
            String::new(), // email left blank
            String::new(),
            "Computer Science".to_owned(),
            "1".to_owned(),
            "active".to_owned(),
        ];
        submit_form(&mut state, &mut view, &gateway, &user, &tx, FormKind::Student);

        assert_eq!(view.dialog.phase(), DialogPhase::Editing, "stays editing");
        assert_eq!(
            view.dialog.errors(),
            ["missing required fields: email"],
            "exactly the empty field is reported"
        );
        assert_eq!(view.screens.students.len(), before, "nothing was created");
    }

    #[test]
    fn registration_issues_roll_number_and_temporary_password() {
        let (gateway, mut view) = seeded_view();
        let mut state = AppState {
            active_tab: TabKind::Students,
            ..AppState::default()
        };
        let (tx, _rx) = mpsc::channel();
        let user = admin();
        let before = view.screens.students.len();

        open_create_form(&mut state, &mut view, &user, &tx);
        view.form.values = vec![
            "Divya Menon".to_owned(),
            "divya@college.edu".to_owned(),
            String::new(),
            "Computer Science".to_owned(),
            "1".to_owned(),
            "active".to_owned(),
        ];
        submit_form(&mut state, &mut view, &gateway, &user, &tx, FormKind::Student);

        assert_eq!(view.dialog.phase(), DialogPhase::Closed);
        assert_eq!(view.screens.students.len(), before + 1);
        let created = view
            .screens
            .students
            .rows()
            .last()
            .expect("created student");
        assert!(created.roll_no.starts_with("CS26-"));
        assert_eq!(created.password_sha256.len(), 64);
        let status = state.status_line.clone().unwrap_or_default();
        assert!(status.contains("temporary password"), "status: {status}");
    }

    #[test]
    fn payment_flow_settles_the_fee_and_reports_the_new_status() {
        let (gateway, mut view) = seeded_view();
        let mut state = AppState {
            active_tab: TabKind::Fees,
            ..AppState::default()
        };
        let (tx, _rx) = mpsc::channel();
        let user = admin();

        let fee = view
            .screens
            .fees
            .rows()
            .iter()
            .find(|fee| fee.balance_cents() > 0)
            .expect("a fee with balance")
            .clone();
        let balance = fee.balance_cents();

        view.dialog.open_edit(FormKind::Payment, fee.id.get());
        view.form = FormUiState {
            values: vec![(balance / 100).to_string()],
            field_index: 0,
            payment_target: Some((fee.id.get(), balance)),
        };
        submit_form(&mut state, &mut view, &gateway, &user, &tx, FormKind::Payment);

        assert_eq!(view.dialog.phase(), DialogPhase::Closed);
        let settled = view.screens.fees.get(fee.id.get()).expect("fee still there");
        assert_eq!(settled.balance_cents(), 0);
        assert_eq!(settled.status(view.today), FeeStatus::Paid);
    }

    #[test]
    fn overpayment_is_rejected_in_the_dialog() {
        let (gateway, mut view) = seeded_view();
        let mut state = AppState {
            active_tab: TabKind::Fees,
            ..AppState::default()
        };
        let (tx, _rx) = mpsc::channel();
        let user = admin();

        let fee = view
            .screens
            .fees
            .rows()
            .iter()
            .find(|fee| fee.balance_cents() > 0)
            .expect("a fee with balance")
            .clone();
        let paid_before = fee.paid_cents;

        view.dialog.open_edit(FormKind::Payment, fee.id.get());
        view.form = FormUiState {
            values: vec![((fee.balance_cents() / 100) + 1_000).to_string()],
            field_index: 0,
            payment_target: Some((fee.id.get(), fee.balance_cents())),
        };
        submit_form(&mut state, &mut view, &gateway, &user, &tx, FormKind::Payment);

        assert_eq!(view.dialog.phase(), DialogPhase::Editing);
        assert!(!view.dialog.errors().is_empty());
        assert_eq!(
            view.screens.fees.get(fee.id.get()).expect("fee").paid_cents,
            paid_before
        );
    }

    #[test]
    fn fee_status_filter_narrows_visible_rows() {
        let (_gateway, mut view) = seeded_view();
        let mut state = AppState {
            active_tab: TabKind::Fees,
            ..AppState::default()
        };
        let all = visible_row_ids(&state, &view).len();
        assert!(all > 0);

        cycle_fee_status(&mut state, &mut view); // pending
        cycle_fee_status(&mut state, &mut view); // partial
        cycle_fee_status(&mut state, &mut view); // paid
        let paid_only = visible_row_ids(&state, &view);
        for row_id in &paid_only {
            let fee = view.screens.fees.get(*row_id).expect("fee");
            assert_eq!(fee.status(view.today), FeeStatus::Paid);
        }
        assert!(paid_only.len() < all);
    }

    #[test]
    fn issuing_the_last_copy_blocks_the_next_issuance() {
        let (gateway, mut view) = seeded_view();
        let mut state = AppState {
            active_tab: TabKind::Issuances,
            ..AppState::default()
        };
        let (tx, _rx) = mpsc::channel();
        let user = admin();

        let book = view.screens.books.rows()[0].clone();
        let student = view.screens.students.rows()[0].clone();
        let available = available_copies(&book, view.screens.issuances.rows());

        for round in 0..available {
            view.dialog.open_create(FormKind::BookIssuance);
            view.form = FormUiState {
                values: vec![
                    book.id.get().to_string(),
                    student.id.get().to_string(),
                    "2026-07-01".to_owned(),
                ],
                field_index: 0,
                payment_target: None,
            };
            submit_form(
                &mut state,
                &mut view,
                &gateway,
                &user,
                &tx,
                FormKind::BookIssuance,
            );
            assert_eq!(
                view.dialog.phase(),
                DialogPhase::Closed,
                "issue {round} of {available} should succeed"
            );
        }
        assert_eq!(available_copies(&book, view.screens.issuances.rows()), 0);

        view.dialog.open_create(FormKind::BookIssuance);
        view.form = FormUiState {
            values: vec![
                book.id.get().to_string(),
                student.id.get().to_string(),
                "2026-07-01".to_owned(),
            ],
            field_index: 0,
            payment_target: None,
        };
        submit_form(
            &mut state,
            &mut view,
            &gateway,
            &user,
            &tx,
            FormKind::BookIssuance,
        );
        assert_eq!(view.dialog.phase(), DialogPhase::Editing);
        assert!(
            view.dialog.errors()[0].contains("no copies"),
            "errors: {:?}",
            view.dialog.errors()
        );
    }

    #[test]
    fn full_room_rejects_allocation_through_the_form() {
        let (gateway, mut view) = seeded_view();
        let mut state = AppState {
            active_tab: TabKind::Hostel,
            ..AppState::default()
        };
        let (tx, _rx) = mpsc::channel();
        let user = admin();

        let room = view.screens.rooms.rows()[0].clone();
        let students: Vec<i64> = view
            .screens
            .students
            .rows()
            .iter()
            .map(|s| s.id.get())
            .collect();
        let mut next_student = students.iter().rev();

        // Fill the room to capacity.
        while room_occupancy(&room, view.screens.allocations.rows()) < room.capacity {
            let student = next_student.next().expect("enough students");
            view.dialog.open_create(FormKind::RoomAllocation);
            view.form = FormUiState {
                values: vec![
                    room.id.get().to_string(),
                    student.to_string(),
                    "2026-07-01".to_owned(),
                ],
                field_index: 0,
                payment_target: None,
            };
            submit_form(
                &mut state,
                &mut view,
                &gateway,
                &user,
                &tx,
                FormKind::RoomAllocation,
            );
            assert_eq!(view.dialog.phase(), DialogPhase::Closed);
        }

        let student = next_student.next().expect("one more student");
        view.dialog.open_create(FormKind::RoomAllocation);
        view.form = FormUiState {
            values: vec![
                room.id.get().to_string(),
                student.to_string(),
                "2026-07-01".to_owned(),
            ],
            field_index: 0,
            payment_target: None,
        };
        submit_form(
            &mut state,
            &mut view,
            &gateway,
            &user,
            &tx,
            FormKind::RoomAllocation,
        );
        assert_eq!(view.dialog.phase(), DialogPhase::Editing);
        assert!(view.dialog.errors()[0].contains("full"));
    }

    #[test]
    fn returning_a_book_stamps_the_date_and_reports_the_fine() {
        let (gateway, mut view) = seeded_view();
        let mut state = AppState {
            active_tab: TabKind::Issuances,
            ..AppState::default()
        };
        let (tx, _rx) = mpsc::channel();
        let user = admin();

        let overdue = view
            .screens
            .issuances
            .rows()
            .iter()
            .find(|issue| issue.is_active() && view.today > issue.due_on)
            .expect("seed data has an overdue loan")
            .clone();
        let ids = visible_row_ids(&state, &view);
        let position = ids
            .iter()
            .position(|id| *id == overdue.id.get())
            .expect("overdue row visible");
        view.tab_ui(TabKind::Issuances).selected = position;

        return_selected_book(&mut state, &mut view, &gateway, &user, &tx);

        let returned = view
            .screens
            .issuances
            .get(overdue.id.get())
            .expect("issuance");
        assert_eq!(returned.returned_on, Some(view.today));
        let status = state.status_line.clone().unwrap_or_default();
        assert!(status.contains("fine"), "status: {status}");
    }

    #[test]
    fn delete_guard_blocks_books_with_live_loans() {
        let (_gateway, view) = seeded_view();
        let on_loan = view
            .screens
            .issuances
            .rows()
            .iter()
            .find(|issue| issue.is_active())
            .expect("live loan")
            .book_id
            .get();
        let blocked = delete_guard(&view, TabKind::Books, on_loan);
        assert!(blocked.is_some());
    }

    #[test]
    fn stale_load_results_are_discarded() {
        let (_gateway, mut view) = seeded_view();
        let mut state = AppState::default();
        let (tx, rx) = mpsc::channel();

        view.pending_load = Some(PendingLoad {
            request_id: 2,
            tab: TabKind::Fees,
        });
        let fees_before = view.screens.fees.len();

        // A result from a superseded request must not touch the screens.
        tx.send(InternalEvent::TabLoaded {
            request_id: 1,
            tab: TabKind::Fees,
            tables: vec![("fees", Vec::new())],
        })
        .expect("send");
        process_internal_events(&mut state, &mut view, &tx, &rx);
        assert_eq!(view.screens.fees.len(), fees_before);
        assert!(view.pending_load.is_some(), "current request still pending");

        // The matching result lands.
        tx.send(InternalEvent::TabLoaded {
            request_id: 2,
            tab: TabKind::Fees,
            tables: vec![("fees", Vec::new())],
        })
        .expect("send");
        process_internal_events(&mut state, &mut view, &tx, &rx);
        assert_eq!(view.screens.fees.len(), 0);
        assert!(view.pending_load.is_none());
    }

    #[test]
    fn mine_filter_keeps_only_the_sessions_notices() {
        let (_gateway, mut view) = seeded_view();
        let mut state = AppState {
            active_tab: TabKind::Announcements,
            ..AppState::default()
        };
        let user = admin();

        let all = visible_row_ids(&state, &view).len();
        toggle_mine_only(&mut state, &mut view, &user);
        let mine = visible_row_ids(&state, &view);
        assert!(mine.len() <= all);
        for row_id in mine {
            let notice = view.screens.announcements.get(row_id).expect("notice");
            assert_eq!(notice.author_id, user.user_id);
        }
    }
}
