/// Vertical geometry of a scrolling list, all in the same unit (terminal rows).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScrollGeometry {
    pub scroll_offset: usize,
    pub viewport_height: usize,
    /// Rows at the top of the viewport covered by a sticky header.
    pub header_height: usize,
    pub row_offset: usize,
    pub row_height: usize,
    pub content_height: usize,
}

impl ScrollGeometry {
    pub fn max_offset(&self) -> usize {
        let visible = self.viewport_height.saturating_sub(self.header_height);
        self.content_height.saturating_sub(visible)
    }
}

/// Smallest scroll change that shows the row at `row_offset` with
/// `margin_rows` rows of context on each side.
pub fn scroll_into_view(geometry: ScrollGeometry, margin_rows: usize) -> usize {
    let margin = margin_rows * geometry.row_height;
    let visible = geometry
        .viewport_height
        .saturating_sub(geometry.header_height);
    let row_bottom = geometry.row_offset + geometry.row_height;

    let upper = geometry.row_offset.saturating_sub(margin);
    let lower = (row_bottom + margin).saturating_sub(visible);

    let offset = if geometry.scroll_offset > upper {
        upper
    } else if geometry.scroll_offset < lower {
        lower
    } else {
        geometry.scroll_offset
    };
    offset.min(geometry.max_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(scroll_offset: usize, row_offset: usize) -> ScrollGeometry {
        ScrollGeometry {
            scroll_offset,
            viewport_height: 11,
            header_height: 1,
            row_offset,
            row_height: 1,
            content_height: 100,
        }
    }

    #[test]
    fn visible_row_with_room_keeps_offset() {
        assert_eq!(scroll_into_view(geometry(10, 15), 2), 10);
    }

    #[test]
    fn row_above_viewport_scrolls_up_to_margin() {
        assert_eq!(scroll_into_view(geometry(10, 11), 2), 9);
        assert_eq!(scroll_into_view(geometry(10, 1), 2), 0);
    }

    #[test]
    fn row_below_viewport_scrolls_down_to_margin() {
        // visible = 10 rows; row 20 plus 2 margin must end at offset + 10.
        assert_eq!(scroll_into_view(geometry(0, 20), 2), 13);
        assert_eq!(scroll_into_view(geometry(0, 20), 0), 11);
    }

    #[test]
    fn result_never_exceeds_content() {
        assert_eq!(scroll_into_view(geometry(0, 99), 2), 90);
        let short = ScrollGeometry {
            content_height: 4,
            ..geometry(3, 3)
        };
        assert_eq!(scroll_into_view(short, 2), 0);
    }
}
