use crate::domain::SortKey;
use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};

pub const TYPE_COLUMN_WIDTH: u16 = 6;
pub const SIZE_COLUMN_WIDTH: u16 = 9;
pub const DATE_COLUMN_WIDTH: u16 = 19;
const MIN_NAME_WIDTH: u16 = 12;

/// Regions of one bordered pane. `rows` holds the list body only.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PaneAreas {
    pub block: Rect,
    pub filter: Rect,
    pub header: Rect,
    pub rows: Rect,
    pub info: Rect,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScreenLayout {
    pub title: Rect,
    pub panes: [PaneAreas; 2],
    pub footer: Rect,
}

pub fn screen_layout(terminal_size: (u16, u16)) -> ScreenLayout {
    let (width, height) = terminal_size;
    let full = Rect {
        x: 0,
        y: 0,
        width,
        height,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(full);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    ScreenLayout {
        title: chunks[0],
        panes: [pane_areas(halves[0]), pane_areas(halves[1])],
        footer: chunks[2],
    }
}

fn pane_areas(block: Rect) -> PaneAreas {
    let inner = block.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

    PaneAreas {
        block,
        filter: chunks[0],
        header: chunks[1],
        rows: chunks[2],
        info: chunks[3],
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Column {
    pub key: SortKey,
    pub x: u16,
    pub width: u16,
}

/// Columns laid out left to right with one blank cell between them. Narrow
/// panes drop the date column first, then type and size.
pub fn columns(area: Rect) -> Vec<Column> {
    let full = [
        (SortKey::Type, TYPE_COLUMN_WIDTH),
        (SortKey::Size, SIZE_COLUMN_WIDTH),
        (SortKey::Date, DATE_COLUMN_WIDTH),
    ];
    let fixed = |count: usize| -> u16 {
        full.iter()
            .take(count)
            .map(|(_, width)| width + 1)
            .sum()
    };

    let trailing_count = (0..=full.len())
        .rev()
        .find(|count| area.width >= fixed(*count) + MIN_NAME_WIDTH)
        .unwrap_or(0);

    let name_width = area.width.saturating_sub(fixed(trailing_count));
    let mut out = vec![Column {
        key: SortKey::Name,
        x: area.x,
        width: name_width,
    }];
    let mut x = area.x.saturating_add(name_width);
    for (key, width) in full.iter().take(trailing_count) {
        x = x.saturating_add(1);
        out.push(Column {
            key: *key,
            x,
            width: *width,
        });
        x = x.saturating_add(*width);
    }
    out
}

pub fn column_at(area: Rect, col: u16) -> Option<SortKey> {
    columns(area)
        .into_iter()
        .find(|column| col >= column.x && col < column.x.saturating_add(column.width))
        .map(|column| column.key)
}

pub fn rect_contains(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x
        && col < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
