use super::layout::{PaneAreas, ScreenLayout, column_at, rect_contains, screen_layout};
use super::{AppCommand, AppModel, ClickRecord, PaneSide, activate_cursor, open_filter_bar};
use crate::domain::{CursorMove, Pane};
use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

const SCROLL_STEP: usize = 3;
const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

pub(super) fn update_on_mouse(model: AppModel, mouse: MouseEvent) -> (AppModel, AppCommand) {
    let mut model = model;
    if model.terminal_size.0 == 0 || model.terminal_size.1 == 0 {
        return (model, AppCommand::None);
    }

    if model.help_open {
        if matches!(mouse.kind, MouseEventKind::Down(_)) {
            model.help_open = false;
        }
        return (model, AppCommand::None);
    }

    let layout = screen_layout(model.terminal_size);
    let shift = mouse.modifiers.contains(KeyModifiers::SHIFT);
    let ctrl = mouse.modifiers.contains(KeyModifiers::CONTROL);

    match mouse.kind {
        MouseEventKind::ScrollUp => {
            apply_scroll(&mut model, &layout, mouse.column, mouse.row, CursorMove::PageUp(SCROLL_STEP));
        }
        MouseEventKind::ScrollDown => {
            apply_scroll(&mut model, &layout, mouse.column, mouse.row, CursorMove::PageDown(SCROLL_STEP));
        }
        MouseEventKind::Down(MouseButton::Left) => {
            return apply_press(model, &layout, mouse.column, mouse.row, shift, ctrl);
        }
        MouseEventKind::Down(_) => {
            if let Some((side, index)) = row_hit(&model, &layout, mouse.column, mouse.row) {
                model.pane_mut(side).pointer_down(index, shift, ctrl, false);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let side = model.active;
            if model.pane(side).gesture().is_dragging() {
                let index = drag_index(model.pane(side), layout.panes[side.index()].rows, mouse.row);
                model.pane_mut(side).pointer_move(index, true);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let side = model.active;
            if model.pane(side).gesture().is_dragging() {
                let index = drag_index(model.pane(side), layout.panes[side.index()].rows, mouse.row);
                model.pane_mut(side).pointer_up(index);
            }
        }
        _ => {}
    }

    (model, AppCommand::None)
}

fn apply_scroll(model: &mut AppModel, layout: &ScreenLayout, col: u16, row: u16, motion: CursorMove) {
    let Some(side) = side_at(layout, col, row) else {
        return;
    };
    if model.pane(side).gesture().is_dragging() {
        return;
    }
    model.pane_mut(side).move_cursor(motion, false);
}

fn apply_press(
    mut model: AppModel,
    layout: &ScreenLayout,
    col: u16,
    row: u16,
    shift: bool,
    ctrl: bool,
) -> (AppModel, AppCommand) {
    let Some(side) = side_at(layout, col, row) else {
        return (model, AppCommand::None);
    };
    if side != model.active {
        model.pane_mut(model.active).cancel_gesture();
        model.active = side;
    }
    if model.filter_bar.as_ref().is_some_and(|bar| bar.side != side) {
        model.filter_bar = None;
    }

    let areas: PaneAreas = layout.panes[side.index()];
    if rect_contains(areas.header, col, row) {
        if let Some(sort_key) = column_at(areas.header, col) {
            model.pane_mut(side).set_sort_key(sort_key);
        }
        return (model, AppCommand::None);
    }
    if rect_contains(areas.filter, col, row) {
        model.filter_bar = Some(open_filter_bar(&model, side));
        return (model, AppCommand::None);
    }
    if !rect_contains(areas.rows, col, row) {
        return (model, AppCommand::None);
    }

    let index = model.pane(side).row_at(usize::from(row - areas.rows.y));
    let now = Instant::now();
    let is_double_click = !shift
        && !ctrl
        && index < model.pane(side).list().len()
        && model.last_click.is_some_and(|last| {
            last.side == side
                && last.index == index
                && now.duration_since(last.at) <= DOUBLE_CLICK_WINDOW
        });

    if is_double_click {
        model.last_click = None;
        let pane = model.pane_mut(side);
        pane.pointer_down(index, false, false, true);
        pane.pointer_up(index);
        return activate_cursor(model, side);
    }

    model.last_click = Some(ClickRecord {
        side,
        index,
        at: now,
    });
    model.pane_mut(side).pointer_down(index, shift, ctrl, true);
    (model, AppCommand::None)
}

fn side_at(layout: &ScreenLayout, col: u16, row: u16) -> Option<PaneSide> {
    PaneSide::BOTH
        .into_iter()
        .find(|side| rect_contains(layout.panes[side.index()].block, col, row))
}

fn row_hit(model: &AppModel, layout: &ScreenLayout, col: u16, row: u16) -> Option<(PaneSide, usize)> {
    let side = side_at(layout, col, row)?;
    let rows = layout.panes[side.index()].rows;
    if !rect_contains(rows, col, row) {
        return None;
    }
    Some((side, model.pane(side).row_at(usize::from(row - rows.y))))
}

/// Row targeted by a drag. Above the list body it reaches one row past the top
/// of the viewport so the list scrolls up; below it the index keeps growing
/// until `len`.
fn drag_index(pane: &Pane, rows: Rect, row: u16) -> usize {
    if row < rows.y {
        return pane.scroll_offset().saturating_sub(1);
    }
    pane.row_at(usize::from(row - rows.y))
}
