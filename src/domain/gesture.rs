use super::FileList;
use tracing::trace;

pub const DEFAULT_MARGIN_ROWS: usize = 2;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging {
        start: usize,
        origin_cursor: usize,
        shift: bool,
        ctrl: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CursorMove {
    Up,
    Down,
    Top,
    Bottom,
    PageUp(usize),
    PageDown(usize),
}

/// Turns pointer and keyboard input into selection/cursor changes on a
/// [`FileList`], and remembers how much context the scroll logic should keep
/// around the cursor afterwards.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GestureController {
    state: GestureState,
    margin_rows: usize,
    keyboard_margin: usize,
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new(DEFAULT_MARGIN_ROWS)
    }
}

impl GestureController {
    pub fn new(keyboard_margin: usize) -> Self {
        Self {
            state: GestureState::Idle,
            margin_rows: keyboard_margin,
            keyboard_margin,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    pub fn margin_rows(&self) -> usize {
        self.margin_rows
    }

    /// Starts a gesture at `index` (which may be `list.len()` for the empty area
    /// below the last row). Only a press of the primary button alone counts.
    pub fn pointer_down(
        &mut self,
        list: &mut FileList,
        index: usize,
        shift: bool,
        ctrl: bool,
        primary_only: bool,
    ) {
        if !primary_only {
            return;
        }
        let origin_cursor = list.cursor().unwrap_or(0);
        self.state = GestureState::Dragging {
            start: index,
            origin_cursor,
            shift,
            ctrl,
        };
        trace!(index, shift, ctrl, "pointer down");
        self.apply(list, index);
    }

    pub fn pointer_move(&mut self, list: &mut FileList, index: usize, primary_held: bool) {
        if !primary_held || !self.is_dragging() {
            return;
        }
        self.apply(list, index);
    }

    pub fn pointer_up(&mut self, list: &mut FileList, index: usize) {
        if !self.is_dragging() {
            return;
        }
        self.state = GestureState::Idle;
        self.margin_rows = 0;
        list.set_cursor(index);
        trace!(index, "pointer up");
    }

    /// Abandons a drag without touching the selection (focus lost, pane switch).
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }

    fn apply(&mut self, list: &mut FileList, target: usize) {
        let GestureState::Dragging {
            start,
            origin_cursor,
            shift,
            ctrl,
        } = self.state
        else {
            return;
        };

        if shift {
            list.add_selection_range(origin_cursor, target);
        } else if ctrl {
            list.add_selection_range(start, target);
        } else {
            list.replace_selection(start, target);
        }

        if target < list.len() {
            list.set_cursor(target);
            self.margin_rows = if target == start { 0 } else { 1 };
        }
    }

    /// Keyboard cursor motion. Single steps past either end are no-ops; page and
    /// jump moves clamp. With `extend`, the rows between the old and new cursor
    /// join the selection.
    pub fn move_cursor(&mut self, list: &mut FileList, motion: CursorMove, extend: bool) -> bool {
        let Some(current) = list.cursor() else {
            return false;
        };
        let last = list.len() - 1;
        let target = match motion {
            CursorMove::Up => match current.checked_sub(1) {
                Some(target) => target,
                None => return false,
            },
            CursorMove::Down => {
                if current >= last {
                    return false;
                }
                current + 1
            }
            CursorMove::Top => 0,
            CursorMove::Bottom => last,
            CursorMove::PageUp(page) => current.saturating_sub(page.max(1)),
            CursorMove::PageDown(page) => current.saturating_add(page.max(1)).min(last),
        };

        if extend {
            list.add_selection_range(current, target);
        }
        list.set_cursor(target);
        self.margin_rows = self.keyboard_margin;
        true
    }

    pub fn toggle_current(&mut self, list: &mut FileList) {
        if let Some(cursor) = list.cursor() {
            list.toggle_selection(cursor);
            self.margin_rows = self.keyboard_margin;
        }
    }

    pub fn select_only_current(&mut self, list: &mut FileList) {
        if let Some(cursor) = list.cursor() {
            list.select_only(cursor);
            self.margin_rows = self.keyboard_margin;
        }
    }

    pub fn toggle_all(&mut self, list: &mut FileList) {
        list.toggle_all();
    }

    pub fn clear(&mut self, list: &mut FileList) {
        list.clear_selection();
    }
}
