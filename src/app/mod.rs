mod filter_bar;
mod layout;
mod mouse;

pub use filter_bar::FilterBar;
pub use layout::{Column, PaneAreas, centered_rect, columns, screen_layout};

use crate::domain::{
    Activation, CursorMove, Entry, FilterKind, Pane, RefreshOutcome, RefreshTicket, SORT_KEYS,
};
use crate::infra::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PaneSide {
    Left,
    Right,
}

impl PaneSide {
    pub const BOTH: [PaneSide; 2] = [PaneSide::Left, PaneSide::Right];

    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ClickRecord {
    pub side: PaneSide,
    pub index: usize,
    pub at: Instant,
}

#[derive(Clone, Debug)]
pub struct AppModel {
    pub panes: [Pane; 2],
    pub active: PaneSide,
    pub terminal_size: (u16, u16),
    pub notice: Option<String>,
    pub filter_bar: Option<FilterBar>,
    pub help_open: bool,
    pub show_hidden: bool,
    pub default_filter_kind: FilterKind,
    pub last_click: Option<ClickRecord>,
}

impl AppModel {
    pub fn new(left: PathBuf, right: PathBuf, settings: &Settings) -> Self {
        let pane = |dir| Pane::new(dir, settings.sort_key, settings.margin_rows);
        Self {
            panes: [pane(left), pane(right)],
            active: PaneSide::Left,
            terminal_size: (0, 0),
            notice: None,
            filter_bar: None,
            help_open: false,
            show_hidden: settings.show_hidden,
            default_filter_kind: settings.filter_kind,
            last_click: None,
        }
    }

    pub fn with_terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_size = (width, height);
        self.sync_viewports();
        self
    }

    pub fn with_notice(mut self, notice: Option<String>) -> Self {
        if notice.is_some() {
            self.notice = notice;
        }
        self
    }

    pub fn pane(&self, side: PaneSide) -> &Pane {
        &self.panes[side.index()]
    }

    pub fn pane_mut(&mut self, side: PaneSide) -> &mut Pane {
        &mut self.panes[side.index()]
    }

    pub fn active_pane(&self) -> &Pane {
        self.pane(self.active)
    }

    /// Issues the first read for both panes.
    pub fn begin_initial_scans(&mut self) -> Vec<ScanTarget> {
        PaneSide::BOTH
            .into_iter()
            .map(|side| ScanTarget {
                side,
                ticket: self.pane_mut(side).begin_refresh(),
            })
            .collect()
    }

    fn sync_viewports(&mut self) {
        let layout = screen_layout(self.terminal_size);
        for side in PaneSide::BOTH {
            let rows = layout.panes[side.index()].rows.height as usize;
            self.pane_mut(side).set_viewport_rows(rows);
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanTarget {
    pub side: PaneSide,
    pub ticket: RefreshTicket,
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Paste(String),
    Mouse(MouseEvent),
    Resize(u16, u16),
    RefreshRequested(PaneSide),
    Refreshed {
        side: PaneSide,
        generation: u64,
        result: Result<Vec<Entry>, String>,
    },
    DirectoryResolved {
        side: PaneSide,
        result: Result<PathBuf, String>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AppCommand {
    None,
    Quit,
    Scan(Vec<ScanTarget>),
    ResolveDirectory { side: PaneSide, path: PathBuf },
    OpenFile { path: PathBuf },
}

pub fn update(model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    match event {
        AppEvent::Key(key) => update_on_key(model, key),
        AppEvent::Paste(text) => update_on_paste(model, text),
        AppEvent::Mouse(mouse) => mouse::update_on_mouse(model, mouse),
        AppEvent::Resize(width, height) => (model.with_terminal_size(width, height), AppCommand::None),
        AppEvent::RefreshRequested(side) => {
            let mut model = model;
            let ticket = model.pane_mut(side).begin_refresh();
            (model, AppCommand::Scan(vec![ScanTarget { side, ticket }]))
        }
        AppEvent::Refreshed {
            side,
            generation,
            result,
        } => update_on_refreshed(model, side, generation, result),
        AppEvent::DirectoryResolved { side, result } => update_on_resolved(model, side, result),
    }
}

fn update_on_refreshed(
    mut model: AppModel,
    side: PaneSide,
    generation: u64,
    result: Result<Vec<Entry>, String>,
) -> (AppModel, AppCommand) {
    let outcome = model.pane_mut(side).apply_refresh(generation, result);
    if outcome == RefreshOutcome::Failed {
        let pane = model.pane(side);
        let error = pane.load_error().unwrap_or_default();
        model.notice = Some(format!("Cannot read {}: {error}", pane.dir().display()));
    }
    (model, AppCommand::None)
}

fn update_on_resolved(
    mut model: AppModel,
    side: PaneSide,
    result: Result<PathBuf, String>,
) -> (AppModel, AppCommand) {
    match result {
        Ok(dir) => navigate(model, side, dir),
        Err(error) => {
            model.notice = Some(format!("Cannot open directory: {error}"));
            (model, AppCommand::None)
        }
    }
}

fn navigate(mut model: AppModel, side: PaneSide, dir: PathBuf) -> (AppModel, AppCommand) {
    if model.filter_bar.as_ref().is_some_and(|bar| bar.side == side) {
        model.filter_bar = None;
    }
    let ticket = model.pane_mut(side).navigate(dir, None);
    (model, AppCommand::Scan(vec![ScanTarget { side, ticket }]))
}

pub(crate) fn activate_cursor(mut model: AppModel, side: PaneSide) -> (AppModel, AppCommand) {
    match model.pane(side).activate_cursor_entry() {
        Some(Activation::EnterDirectory(path)) => (model, AppCommand::ResolveDirectory { side, path }),
        Some(Activation::OpenFile(path)) => (model, AppCommand::OpenFile { path }),
        None => {
            model.notice = Some("Nothing to open.".to_string());
            (model, AppCommand::None)
        }
    }
}

fn update_on_key(model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    let mut model = model;
    model.notice = None;

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        return (model, AppCommand::Quit);
    }

    if model.help_open {
        model.help_open = false;
        return (model, AppCommand::None);
    }

    if let Some(bar) = model.filter_bar.take() {
        return update_filter_bar(model, bar, key);
    }

    let side = model.active;
    match key.code {
        KeyCode::F(1) | KeyCode::Char('?') => {
            model.help_open = true;
        }
        KeyCode::Char('r') if ctrl => {
            let ticket = model.pane_mut(side).begin_refresh();
            return (model, AppCommand::Scan(vec![ScanTarget { side, ticket }]));
        }
        KeyCode::Char('a') if ctrl => model.pane_mut(side).toggle_all(),
        KeyCode::Char(' ') if ctrl => model.pane_mut(side).select_only_current(),
        KeyCode::Char(' ') => model.pane_mut(side).toggle_current(),
        KeyCode::Tab | KeyCode::BackTab => {
            model.pane_mut(side).cancel_gesture();
            model.active = side.other();
        }
        KeyCode::Up => {
            model.pane_mut(side).move_cursor(CursorMove::Up, shift);
        }
        KeyCode::Down => {
            model.pane_mut(side).move_cursor(CursorMove::Down, shift);
        }
        KeyCode::Home => {
            model.pane_mut(side).move_cursor(CursorMove::Top, shift);
        }
        KeyCode::End => {
            model.pane_mut(side).move_cursor(CursorMove::Bottom, shift);
        }
        KeyCode::PageUp => {
            let page = model.pane(side).page_rows();
            model.pane_mut(side).move_cursor(CursorMove::PageUp(page), shift);
        }
        KeyCode::PageDown => {
            let page = model.pane(side).page_rows();
            model
                .pane_mut(side)
                .move_cursor(CursorMove::PageDown(page), shift);
        }
        KeyCode::Esc => {
            let pane = model.pane_mut(side);
            if pane.list().selection().is_empty() && !pane.filter_text().is_empty() {
                let kind = pane.filter_kind();
                pane.set_filter_text(kind, "");
            } else {
                pane.clear_selection();
            }
        }
        KeyCode::Enter => return activate_cursor(model, side),
        KeyCode::Backspace => {
            if model.filter_bar.as_ref().is_some_and(|bar| bar.side == side) {
                model.filter_bar = None;
            }
            return match model.pane_mut(side).navigate_parent() {
                Some(ticket) => (model, AppCommand::Scan(vec![ScanTarget { side, ticket }])),
                None => {
                    model.notice = Some("Already at the top directory.".to_string());
                    (model, AppCommand::None)
                }
            };
        }
        KeyCode::Char('/') => {
            model.filter_bar = Some(open_filter_bar(&model, side));
        }
        KeyCode::Char(digit @ '1'..='4') => {
            let index = digit as usize - '1' as usize;
            let sort_key = SORT_KEYS[index];
            model.pane_mut(side).set_sort_key(sort_key);
        }
        KeyCode::Char('.') => return toggle_hidden(model),
        _ => {}
    }

    (model, AppCommand::None)
}

pub(crate) fn open_filter_bar(model: &AppModel, side: PaneSide) -> FilterBar {
    let pane = model.pane(side);
    let kind = if pane.filter_text().is_empty() {
        model.default_filter_kind
    } else {
        pane.filter_kind()
    };
    FilterBar::new(side, kind, pane.filter_text())
}

fn toggle_hidden(mut model: AppModel) -> (AppModel, AppCommand) {
    model.show_hidden = !model.show_hidden;
    info!(show_hidden = model.show_hidden, "hidden entries toggled");
    model.notice = Some(if model.show_hidden {
        "Showing hidden files.".to_string()
    } else {
        "Hiding hidden files.".to_string()
    });
    let targets = PaneSide::BOTH
        .into_iter()
        .map(|side| ScanTarget {
            side,
            ticket: model.pane_mut(side).begin_resync(),
        })
        .collect();
    (model, AppCommand::Scan(targets))
}

fn update_filter_bar(
    mut model: AppModel,
    mut bar: FilterBar,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let side = bar.side;

    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            debug!(filter = %bar.text, kind = ?bar.kind, "filter editing finished");
            return (model, AppCommand::None);
        }
        KeyCode::Up => {
            model.pane_mut(side).move_cursor(CursorMove::Up, false);
        }
        KeyCode::Down => {
            model.pane_mut(side).move_cursor(CursorMove::Down, false);
        }
        KeyCode::Left => bar.move_left(),
        KeyCode::Right => bar.move_right(),
        KeyCode::Home => bar.move_home(),
        KeyCode::End => bar.move_end(),
        KeyCode::Char('t') if ctrl => {
            bar.toggle_kind();
            apply_filter_bar(&mut model, &bar);
        }
        KeyCode::Char('u') if ctrl => {
            bar.clear();
            apply_filter_bar(&mut model, &bar);
        }
        KeyCode::Backspace => {
            bar.backspace();
            apply_filter_bar(&mut model, &bar);
        }
        KeyCode::Delete => {
            bar.delete_forward();
            apply_filter_bar(&mut model, &bar);
        }
        KeyCode::Char(ch) if !ctrl && !alt => {
            bar.insert_char(ch);
            apply_filter_bar(&mut model, &bar);
        }
        _ => {}
    }

    model.filter_bar = Some(bar);
    (model, AppCommand::None)
}

fn apply_filter_bar(model: &mut AppModel, bar: &FilterBar) {
    model.pane_mut(bar.side).set_filter_text(bar.kind, &bar.text);
}

fn update_on_paste(mut model: AppModel, text: String) -> (AppModel, AppCommand) {
    let Some(mut bar) = model.filter_bar.take() else {
        return (model, AppCommand::None);
    };
    bar.insert_str(&text);
    apply_filter_bar(&mut model, &bar);
    model.filter_bar = Some(bar);
    (model, AppCommand::None)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::SortKey;

    pub(crate) fn loaded_model(left: Vec<Entry>, right: Vec<Entry>) -> AppModel {
        let mut model = AppModel::new(
            PathBuf::from("/data"),
            PathBuf::from("/other"),
            &Settings::default(),
        )
        .with_terminal_size(100, 30);
        let scans = model.begin_initial_scans();
        for (target, entries) in scans.into_iter().zip([left, right]) {
            let event = AppEvent::Refreshed {
                side: target.side,
                generation: target.ticket.generation,
                result: Ok(entries),
            };
            model = update(model, event).0;
        }
        model
    }

    pub(crate) fn sample_entries() -> Vec<Entry> {
        vec![
            Entry::dir("docs", "2024/01/01 00:00:00"),
            Entry::file("b.txt", 300, "2024/01/03 00:00:00"),
            Entry::file("a.rs", 100, "2024/01/02 00:00:00"),
            Entry::file("c.md", 200, "2024/01/04 00:00:00"),
        ]
    }

    fn press(model: AppModel, code: KeyCode) -> (AppModel, AppCommand) {
        update(model, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn press_with(model: AppModel, code: KeyCode, modifiers: KeyModifiers) -> (AppModel, AppCommand) {
        update(model, AppEvent::Key(KeyEvent::new(code, modifiers)))
    }

    fn cursor_name(model: &AppModel, side: PaneSide) -> Option<String> {
        model
            .pane(side)
            .list()
            .cursor_entry()
            .map(|entry| entry.name.clone())
    }

    #[test]
    fn initial_load_sorts_by_name() {
        let model = loaded_model(sample_entries(), Vec::new());
        let names: Vec<&str> = model
            .pane(PaneSide::Left)
            .list()
            .rows()
            .iter()
            .map(|row| row.entry.name.as_str())
            .collect();
        assert_eq!(names, vec!["a.rs", "b.txt", "c.md", "docs"]);
        assert!(model.pane(PaneSide::Right).list().is_empty());
    }

    #[test]
    fn quit_keys() {
        let model = loaded_model(Vec::new(), Vec::new());
        let (_, command) = press_with(model.clone(), KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert_eq!(command, AppCommand::Quit);
        let (_, command) = press_with(model, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(command, AppCommand::Quit);
    }

    #[test]
    fn digit_keys_choose_sort_key() {
        let model = loaded_model(sample_entries(), Vec::new());
        let (model, _) = press(model, KeyCode::Char('3'));
        let pane = model.pane(PaneSide::Left);
        assert_eq!(pane.list().sort_key(), SortKey::Size);
        assert_eq!(pane.list().rows()[0].entry.name, "docs");
    }

    #[test]
    fn shift_down_extends_selection() {
        let model = loaded_model(sample_entries(), Vec::new());
        let (model, _) = press_with(model, KeyCode::Down, KeyModifiers::SHIFT);
        let (model, _) = press_with(model, KeyCode::Down, KeyModifiers::SHIFT);
        let selected: Vec<usize> = model.active_pane().list().selection().iter().collect();
        assert_eq!(selected, vec![0, 1, 2]);
        assert_eq!(model.active_pane().list().cursor(), Some(2));
    }

    #[test]
    fn space_and_ctrl_a_edit_selection() {
        let model = loaded_model(sample_entries(), Vec::new());
        let (model, _) = press(model, KeyCode::Char(' '));
        assert_eq!(model.active_pane().list().selection().len(), 1);
        let (model, _) = press_with(model, KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(model.active_pane().list().selection().len(), 4);
        let (model, _) = press(model, KeyCode::Esc);
        assert!(model.active_pane().list().selection().is_empty());
    }

    #[test]
    fn tab_switches_active_pane() {
        let model = loaded_model(Vec::new(), Vec::new());
        let (model, _) = press(model, KeyCode::Tab);
        assert_eq!(model.active, PaneSide::Right);
        let (model, _) = press(model, KeyCode::Tab);
        assert_eq!(model.active, PaneSide::Left);
    }

    #[test]
    fn enter_on_directory_requests_resolution() {
        let model = loaded_model(sample_entries(), Vec::new());
        let (model, _) = press(model, KeyCode::End);
        assert_eq!(cursor_name(&model, PaneSide::Left).as_deref(), Some("docs"));

        let (model, command) = press(model, KeyCode::Enter);
        assert_eq!(
            command,
            AppCommand::ResolveDirectory {
                side: PaneSide::Left,
                path: PathBuf::from("/data/docs"),
            }
        );

        let (model, command) = update(
            model,
            AppEvent::DirectoryResolved {
                side: PaneSide::Left,
                result: Ok(PathBuf::from("/data/docs")),
            },
        );
        let AppCommand::Scan(targets) = command else {
            panic!("expected scan");
        };
        assert_eq!(targets[0].ticket.dir, PathBuf::from("/data/docs"));
        assert_eq!(model.pane(PaneSide::Left).dir(), PathBuf::from("/data/docs"));
    }

    #[test]
    fn enter_on_file_requests_open() {
        let model = loaded_model(sample_entries(), Vec::new());
        let (_, command) = press(model, KeyCode::Enter);
        assert_eq!(
            command,
            AppCommand::OpenFile {
                path: PathBuf::from("/data/a.rs"),
            }
        );
    }

    #[test]
    fn backspace_goes_to_parent_and_focuses_child() {
        let model = loaded_model(Vec::new(), Vec::new());
        let (model, command) = press(model, KeyCode::Backspace);
        let AppCommand::Scan(targets) = command else {
            panic!("expected scan");
        };
        assert_eq!(targets[0].ticket.dir, PathBuf::from("/"));

        let (model, _) = update(
            model,
            AppEvent::Refreshed {
                side: PaneSide::Left,
                generation: targets[0].ticket.generation,
                result: Ok(vec![
                    Entry::dir("bin", ""),
                    Entry::dir("data", ""),
                    Entry::dir("usr", ""),
                ]),
            },
        );
        assert_eq!(cursor_name(&model, PaneSide::Left).as_deref(), Some("data"));
    }

    #[test]
    fn filter_bar_filters_incrementally() {
        let model = loaded_model(sample_entries(), Vec::new());
        let (model, _) = press(model, KeyCode::Char('/'));
        assert!(model.filter_bar.is_some());

        let (model, _) = press(model, KeyCode::Char('t'));
        let (model, _) = press(model, KeyCode::Char('x'));
        let pane = model.pane(PaneSide::Left);
        assert_eq!(pane.filter_text(), "tx");
        assert_eq!(pane.list().len(), 1);
        assert_eq!(pane.list().filtered_out(), 3);

        let (model, _) = press_with(model, KeyCode::Char('t'), KeyModifiers::CONTROL);
        assert_eq!(model.pane(PaneSide::Left).filter_kind(), FilterKind::Regex);

        let (model, _) = press(model, KeyCode::Enter);
        assert!(model.filter_bar.is_none());
        assert_eq!(model.pane(PaneSide::Left).filter_text(), "tx");

        let (model, _) = press(model, KeyCode::Esc);
        assert_eq!(model.pane(PaneSide::Left).filter_text(), "");
        assert_eq!(model.pane(PaneSide::Left).list().len(), 4);
    }

    #[test]
    fn paste_goes_to_open_filter_bar() {
        let model = loaded_model(sample_entries(), Vec::new());
        let (model, _) = press(model, KeyCode::Char('/'));
        let (model, _) = update(model, AppEvent::Paste("md".to_string()));
        assert_eq!(model.pane(PaneSide::Left).list().len(), 1);
    }

    #[test]
    fn dot_toggles_hidden_and_rescans_both_panes() {
        let model = loaded_model(sample_entries(), Vec::new());
        let (model, command) = press(model, KeyCode::Char('.'));
        assert!(model.show_hidden);
        let AppCommand::Scan(targets) = command else {
            panic!("expected scan");
        };
        let sides: Vec<PaneSide> = targets.iter().map(|target| target.side).collect();
        assert_eq!(sides, vec![PaneSide::Left, PaneSide::Right]);
    }

    #[test]
    fn read_failure_becomes_notice() {
        let mut model = loaded_model(sample_entries(), Vec::new());
        let ticket = model.pane_mut(PaneSide::Left).begin_refresh();
        let (model, _) = update(
            model,
            AppEvent::Refreshed {
                side: PaneSide::Left,
                generation: ticket.generation,
                result: Err("permission denied".to_string()),
            },
        );
        assert_eq!(
            model.notice.as_deref(),
            Some("Cannot read /data: permission denied")
        );
        assert!(model.pane(PaneSide::Left).list().is_empty());
    }

    #[test]
    fn help_opens_and_any_key_closes() {
        let model = loaded_model(Vec::new(), Vec::new());
        let (model, _) = press(model, KeyCode::F(1));
        assert!(model.help_open);
        let (model, _) = press(model, KeyCode::Down);
        assert!(!model.help_open);
    }
}
