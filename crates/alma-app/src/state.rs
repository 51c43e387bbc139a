// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TabKind {
    Dashboard,
    Students,
    Fees,
    Books,
    Issuances,
    Courses,
    Timetable,
    Credits,
    Companies,
    Drives,
    Announcements,
    Hostel,
}

impl TabKind {
    pub const ALL: [Self; 12] = [
        Self::Dashboard,
        Self::Students,
        Self::Fees,
        Self::Books,
        Self::Issuances,
        Self::Courses,
        Self::Timetable,
        Self::Credits,
        Self::Companies,
        Self::Drives,
        Self::Announcements,
        Self::Hostel,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Students => "students",
            Self::Fees => "fees",
            Self::Books => "books",
            Self::Issuances => "issues",
            Self::Courses => "courses",
            Self::Timetable => "timetable",
            Self::Credits => "credits",
            Self::Companies => "companies",
            Self::Drives => "drives",
            Self::Announcements => "notices",
            Self::Hostel => "hostel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Student,
    Fee,
    Payment,
    Book,
    BookIssuance,
    Course,
    TimetableEntry,
    CreditAward,
    Company,
    PlacementDrive,
    Announcement,
    Room,
    RoomAllocation,
}

impl FormKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Fee => "fee",
            Self::Payment => "payment",
            Self::Book => "book",
            Self::BookIssuance => "issue book",
            Self::Course => "course",
            Self::TimetableEntry => "timetable slot",
            Self::CreditAward => "credit award",
            Self::Company => "company",
            Self::PlacementDrive => "placement drive",
            Self::Announcement => "announcement",
            Self::Room => "room",
            Self::RoomAllocation => "room allocation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Search,
    Form(FormKind),
    ConfirmDelete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_tab: TabKind,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            active_tab: TabKind::Dashboard,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextTab,
    PrevTab,
    SelectTab(TabKind),
    EnterSearch,
    OpenForm(FormKind),
    RequestDelete,
    ExitToNav,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    TabChanged(TabKind),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    /// The tab ring is caller-supplied so roles can scope it.
    pub fn dispatch(&mut self, command: AppCommand, tabs: &[TabKind]) -> Vec<AppEvent> {
        match command {
            AppCommand::NextTab => self.rotate_tab(1, tabs),
            AppCommand::PrevTab => self.rotate_tab(-1, tabs),
            AppCommand::SelectTab(tab) => {
                if !tabs.contains(&tab) {
                    return vec![self.set_status("tab not available for this role")];
                }
                self.active_tab = tab;
                vec![AppEvent::TabChanged(tab)]
            }
            AppCommand::EnterSearch => {
                self.mode = AppMode::Search;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::OpenForm(kind) => {
                self.mode = AppMode::Form(kind);
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::RequestDelete => {
                self.mode = AppMode::ConfirmDelete;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_tab(&mut self, delta: isize, tabs: &[TabKind]) -> Vec<AppEvent> {
        if tabs.is_empty() {
            return Vec::new();
        }
        let current = tabs
            .iter()
            .position(|tab| *tab == self.active_tab)
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_tab = tabs[next];
        vec![AppEvent::TabChanged(self.active_tab)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogPhase {
    #[default]
    Closed,
    Editing,
    Submitting,
}

/// Modal form lifecycle: Closed -> Editing -> Submitting -> Closed on
/// success, back to Editing (errors surfaced, fields retained) on failure.
/// Submit while Submitting is ignored, which is what prevents a double
/// submission while a gateway call is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormDialog {
    kind: Option<FormKind>,
    phase: DialogPhase,
    target: Option<i64>,
    errors: Vec<String>,
}

impl FormDialog {
    pub fn open_create(&mut self, kind: FormKind) {
        *self = Self {
            kind: Some(kind),
            phase: DialogPhase::Editing,
            target: None,
            errors: Vec::new(),
        };
    }

    pub fn open_edit(&mut self, kind: FormKind, target_id: i64) {
        *self = Self {
            kind: Some(kind),
            phase: DialogPhase::Editing,
            target: Some(target_id),
            errors: Vec::new(),
        };
    }

    /// Returns true when the submit is accepted and the dialog moves to
    /// Submitting. A dialog that is Closed or already Submitting refuses.
    pub fn begin_submit(&mut self) -> bool {
        if self.phase != DialogPhase::Editing {
            return false;
        }
        self.phase = DialogPhase::Submitting;
        self.errors.clear();
        true
    }

    pub fn submit_failed(&mut self, errors: Vec<String>) {
        if self.phase == DialogPhase::Submitting {
            self.phase = DialogPhase::Editing;
            self.errors = errors;
        }
    }

    /// Validation failures never leave Editing; the field errors land inline.
    pub fn reject_invalid(&mut self, errors: Vec<String>) {
        if self.phase != DialogPhase::Closed {
            self.phase = DialogPhase::Editing;
            self.errors = errors;
        }
    }

    pub fn submit_succeeded(&mut self) {
        *self = Self::default();
    }

    /// Cancel discards all field state. Ignored while Submitting so an
    /// in-flight result cannot land on a closed dialog.
    pub fn cancel(&mut self) -> bool {
        if self.phase == DialogPhase::Editing {
            *self = Self::default();
            return true;
        }
        false
    }

    pub fn phase(&self) -> DialogPhase {
        self.phase
    }

    pub fn kind(&self) -> Option<FormKind> {
        self.kind
    }

    pub fn is_open(&self) -> bool {
        self.phase != DialogPhase::Closed
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == DialogPhase::Submitting
    }

    pub fn is_edit(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<i64> {
        self.target
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AppCommand, AppEvent, AppState, DialogPhase, FormDialog, FormKind, TabKind,
    };

    const TABS: [TabKind; 3] = [TabKind::Dashboard, TabKind::Fees, TabKind::Announcements];

    #[test]
    fn tab_rotation_wraps_within_the_role_ring() {
        let mut state = AppState {
            active_tab: TabKind::Announcements,
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::NextTab, &TABS);
        assert_eq!(state.active_tab, TabKind::Dashboard);
        assert_eq!(events, vec![AppEvent::TabChanged(TabKind::Dashboard)]);

        state.dispatch(AppCommand::PrevTab, &TABS);
        assert_eq!(state.active_tab, TabKind::Announcements);
    }

    #[test]
    fn selecting_a_tab_outside_the_ring_is_refused() {
        let mut state = AppState::default();
        let events = state.dispatch(AppCommand::SelectTab(TabKind::Hostel), &TABS);
        assert_eq!(state.active_tab, TabKind::Dashboard);
        assert!(matches!(events.as_slice(), [AppEvent::StatusUpdated(_)]));
    }

    #[test]
    fn dialog_happy_path_ends_closed_and_reset() {
        let mut dialog = FormDialog::default();
        dialog.open_create(FormKind::Fee);
        assert_eq!(dialog.phase(), DialogPhase::Editing);
        assert!(!dialog.is_edit());

        assert!(dialog.begin_submit());
        assert_eq!(dialog.phase(), DialogPhase::Submitting);

        dialog.submit_succeeded();
        assert_eq!(dialog.phase(), DialogPhase::Closed);
        assert_eq!(dialog.kind(), None);
        assert!(dialog.errors().is_empty());
    }

    #[test]
    fn double_submit_is_refused_while_submitting() {
        let mut dialog = FormDialog::default();
        dialog.open_create(FormKind::Student);
        assert!(dialog.begin_submit());
        assert!(!dialog.begin_submit());
        assert!(!dialog.begin_submit());
        assert_eq!(dialog.phase(), DialogPhase::Submitting);
    }

    #[test]
    fn failed_submit_returns_to_editing_with_errors_retained() {
        let mut dialog = FormDialog::default();
        dialog.open_edit(FormKind::Book, 42);
        assert!(dialog.begin_submit());

        dialog.submit_failed(vec!["gateway unreachable".to_owned()]);
        assert_eq!(dialog.phase(), DialogPhase::Editing);
        assert_eq!(dialog.errors(), ["gateway unreachable"]);
        assert_eq!(dialog.target(), Some(42));

        // The user can retry from Editing.
        assert!(dialog.begin_submit());
    }

    #[test]
    fn invalid_payload_keeps_the_dialog_in_editing() {
        let mut dialog = FormDialog::default();
        dialog.open_create(FormKind::Student);
        dialog.reject_invalid(vec!["missing required fields: email".to_owned()]);
        assert_eq!(dialog.phase(), DialogPhase::Editing);
        assert_eq!(dialog.errors().len(), 1);
    }

    #[test]
    fn cancel_only_works_from_editing() {
        let mut dialog = FormDialog::default();
        assert!(!dialog.cancel());

        dialog.open_create(FormKind::Company);
        assert!(dialog.begin_submit());
        assert!(!dialog.cancel(), "cancel must not race an in-flight submit");

        dialog.submit_failed(vec!["timeout".to_owned()]);
        assert!(dialog.cancel());
        assert!(!dialog.is_open());
    }
}
