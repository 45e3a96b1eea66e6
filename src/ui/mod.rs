mod theme;

use crate::app::{AppModel, Column, FilterBar, PaneAreas, PaneSide, centered_rect, columns, screen_layout};
use crate::domain::{Pane, SortKey, ViewRow, style_token};
use humansize::{DECIMAL, format_size};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn render(frame: &mut Frame, model: &AppModel) {
    let full_area = frame.area();
    if full_area.width == 0 || full_area.height == 0 {
        return;
    }
    frame.render_widget(Block::default().style(Style::default().bg(theme::BG)), full_area);

    let layout = screen_layout((full_area.width, full_area.height));
    render_title_bar(frame, layout.title, model);
    for side in PaneSide::BOTH {
        render_pane(frame, layout.panes[side.index()], model, side);
    }
    frame.render_widget(footer_paragraph(model), layout.footer);

    if model.help_open {
        render_help_overlay(frame, full_area);
    }
}

fn render_title_bar(frame: &mut Frame, area: Rect, model: &AppModel) {
    let name = " twinpane ";
    let path = model.active_pane().dir().display().to_string();
    let available = (area.width as usize).saturating_sub(UnicodeWidthStr::width(name) + 1);
    let line = Line::from(vec![
        Span::styled(
            name,
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(truncate_middle(&path, available), Style::default().fg(theme::MUTED)),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(theme::BAR_BG)),
        area,
    );
}

fn render_pane(frame: &mut Frame, areas: PaneAreas, model: &AppModel, side: PaneSide) {
    let pane = model.pane(side);
    let active = model.active == side;

    let border_style = if active {
        Style::default().fg(theme::ACCENT)
    } else {
        Style::default().fg(theme::BORDER)
    };
    let title_width = (areas.block.width as usize).saturating_sub(4);
    let title = truncate_middle(&pane.dir().display().to_string(), title_width);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(format!(" {title} "), border_style))
        .style(Style::default().bg(theme::SURFACE));
    frame.render_widget(block, areas.block);

    let editing = model.filter_bar.as_ref().filter(|bar| bar.side == side);
    render_filter_line(frame, areas.filter, pane, editing);
    render_header(frame, areas.header, pane.list().sort_key());
    render_rows(frame, areas.rows, pane, active);

    let (info, info_style) = match pane.load_error() {
        Some(error) => (
            format!("Cannot read directory: {error}"),
            Style::default().fg(theme::ERROR),
        ),
        None => (info_text(pane), Style::default().fg(theme::MUTED)),
    };
    frame.render_widget(
        Paragraph::new(truncate_end(&info, areas.info.width as usize)).style(info_style),
        areas.info,
    );
}

fn render_filter_line(frame: &mut Frame, area: Rect, pane: &Pane, editing: Option<&FilterBar>) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let line = match editing {
        Some(bar) => {
            let prefix = format!("{}: ", bar.kind.label());
            let prefix_width = UnicodeWidthStr::width(prefix.as_str());
            let before: String = bar.text.chars().take(bar.cursor_col).collect();
            let cursor_x = area
                .x
                .saturating_add((prefix_width + UnicodeWidthStr::width(before.as_str())) as u16);
            if cursor_x < area.x.saturating_add(area.width) {
                frame.set_cursor_position((cursor_x, area.y));
            }
            Line::from(vec![
                Span::styled(
                    prefix,
                    Style::default()
                        .fg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(bar.text.clone(), Style::default().fg(theme::FG)),
            ])
        }
        None if !pane.filter_text().is_empty() => Line::from(vec![
            Span::styled(
                format!("{}: ", pane.filter_kind().label()),
                Style::default().fg(theme::MUTED),
            ),
            Span::styled(pane.filter_text().to_string(), Style::default().fg(theme::FG)),
        ]),
        None => Line::from(Span::styled(
            "/ to filter",
            Style::default().fg(theme::DIM),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_header(frame: &mut Frame, area: Rect, sort_key: SortKey) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let mut spans = Vec::new();
    for (index, column) in columns(area).iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw(" "));
        }
        let style = if column.key == sort_key {
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme::MUTED)
        };
        spans.push(Span::styled(header_cell(column, sort_key), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn header_cell(column: &Column, sort_key: SortKey) -> String {
    let label = if column.key == sort_key {
        format!("{} ▲", column.key.label())
    } else {
        column.key.label().to_string()
    };
    let width = column.width as usize;
    let label = truncate_end(&label, width);
    if column.key == SortKey::Size {
        pad_left(&label, width)
    } else {
        pad_right(&label, width)
    }
}

fn render_rows(frame: &mut Frame, area: Rect, pane: &Pane, active: bool) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let list = pane.list();
    if list.is_empty() {
        let message = empty_message(pane);
        frame.render_widget(
            Paragraph::new(Span::styled(message, Style::default().fg(theme::DIM))),
            area,
        );
        return;
    }

    let cols = columns(area);
    let cursor = list.cursor();
    let lines: Vec<Line> = list
        .rows()
        .iter()
        .enumerate()
        .skip(pane.scroll_offset())
        .take(area.height as usize)
        .map(|(index, row)| {
            let marks = RowMarks {
                selected: list.is_selected(index),
                cursor: cursor == Some(index),
                active,
            };
            row_line(row, &cols, marks)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn empty_message(pane: &Pane) -> &'static str {
    if pane.load_error().is_some() {
        "Directory unavailable."
    } else if !pane.is_loaded() {
        "Loading…"
    } else if pane.list().has_filter() {
        "No matching entries."
    } else {
        "Empty directory."
    }
}

#[derive(Clone, Copy, Debug)]
struct RowMarks {
    selected: bool,
    cursor: bool,
    active: bool,
}

fn row_line(row: &ViewRow, cols: &[Column], marks: RowMarks) -> Line<'static> {
    let entry = &row.entry;
    let mut base = Style::default().fg(theme::token_color(style_token(&entry.name, entry.is_dir)));
    if marks.selected {
        base = base.bg(theme::ACCENT_BG);
    } else if marks.cursor && marks.active {
        base = base.bg(theme::CURSOR_BG);
    }
    if marks.cursor {
        base = base.add_modifier(if marks.active {
            Modifier::BOLD
        } else {
            Modifier::UNDERLINED
        });
    }

    let mut spans = Vec::new();
    for (index, column) in cols.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(" ", base));
        }
        let width = column.width as usize;
        match column.key {
            SortKey::Name => spans.extend(name_spans(&entry.name, &row.matched, width, base)),
            SortKey::Type => spans.push(Span::styled(
                pad_right(&truncate_end(entry.type_label(), width), width),
                base,
            )),
            SortKey::Size => {
                let size = if entry.is_dir {
                    "-".to_string()
                } else {
                    format_size(entry.size, DECIMAL)
                };
                spans.push(Span::styled(pad_left(&truncate_end(&size, width), width), base));
            }
            SortKey::Date => spans.push(Span::styled(
                pad_right(&truncate_end(&entry.modified, width), width),
                base,
            )),
        }
    }
    Line::from(spans)
}

/// Name cell with the characters the filter matched set in the accent color.
fn name_spans(name: &str, matched: &[usize], width: usize, base: Style) -> Vec<Span<'static>> {
    let shown = truncate_end(name, width);
    let highlight = base.fg(theme::ACCENT).add_modifier(Modifier::UNDERLINED);

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_matched = false;
    let visible = if shown == name {
        name.chars().count()
    } else {
        shown.chars().count().saturating_sub(1)
    };
    for (index, ch) in shown.chars().enumerate() {
        let is_match = index < visible && matched.contains(&index);
        if is_match != run_matched && !run.is_empty() {
            let style = if run_matched { highlight } else { base };
            spans.push(Span::styled(std::mem::take(&mut run), style));
        }
        run_matched = is_match;
        run.push(ch);
    }
    if !run.is_empty() {
        let style = if run_matched { highlight } else { base };
        spans.push(Span::styled(run, style));
    }

    let used = UnicodeWidthStr::width(shown.as_str());
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), base));
    }
    spans
}

fn info_text(pane: &Pane) -> String {
    let list = pane.list();
    let mut out = format!("{} items", list.len());
    let selected = list.selection().len();
    if selected > 0 {
        out.push_str(&format!(" · {selected} selected"));
    }
    let filtered = list.filtered_out();
    if filtered > 0 {
        out.push_str(&format!(" · {filtered} file(s) filtered."));
    }
    out
}

fn footer_line(model: &AppModel) -> String {
    if model.filter_bar.is_some() {
        return "Keys: type=filter  Ctrl+T=match/regex  Ctrl+U=clear  Up/Down=move  Enter/Esc=done"
            .to_string();
    }
    "Keys: arrows=move  Shift=extend  Space=select  Enter=open  Backspace=up  Tab=pane  /=filter  1-4=sort  .=hidden  F1=help  Ctrl+Q=quit"
        .to_string()
}

fn footer_with_notice(base: String, notice: Option<&str>) -> String {
    match notice {
        Some(notice) if !notice.is_empty() => format!("{base} | {notice}"),
        _ => base,
    }
}

fn footer_paragraph(model: &AppModel) -> Paragraph<'static> {
    let text = footer_with_notice(footer_line(model), model.notice.as_deref());
    Paragraph::new(text).style(Style::default().fg(theme::DIM).bg(theme::BAR_BG))
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup);

    let text = vec![
        Line::from("Navigation"),
        Line::from("  - Arrows, Home/End, PgUp/PgDn: move the cursor"),
        Line::from("  - Shift + movement: extend the selection"),
        Line::from("  - Enter or double-click: open directory"),
        Line::from("  - Backspace: parent directory"),
        Line::from("  - Tab: switch pane"),
        Line::from(""),
        Line::from("Selection"),
        Line::from("  - Space: toggle entry, Ctrl+Space: select only this entry"),
        Line::from("  - Ctrl+A: select or clear all, Esc: clear"),
        Line::from("  - Drag: select a range, Shift/Ctrl+click: extend"),
        Line::from(""),
        Line::from("View"),
        Line::from("  - /: filter names (Ctrl+T switches match/regex)"),
        Line::from("  - 1-4 or header click: sort by name, type, size, date"),
        Line::from("  - .: show or hide dotfiles"),
        Line::from("  - Ctrl+R: reload, changes on disk reload on their own"),
        Line::from("  - Ctrl+Q or Ctrl+C: quit"),
        Line::from(""),
        Line::from("Help"),
        Line::from("  - F1 or ?: toggle this help"),
    ];

    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(theme::FG).bg(theme::SURFACE))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::ACCENT))
                .padding(Padding::horizontal(1))
                .title("Help (F1 or ? to close)"),
        );
    frame.render_widget(paragraph, popup);
}

fn pad_left(text: &str, width: usize) -> String {
    let current = UnicodeWidthStr::width(text);
    if current >= width {
        return text.to_string();
    }
    format!("{}{text}", " ".repeat(width - current))
}

fn pad_right(text: &str, width: usize) -> String {
    let current = UnicodeWidthStr::width(text);
    if current >= width {
        return text.to_string();
    }
    format!("{text}{}", " ".repeat(width - current))
}

fn truncate_end(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let mut out = take_prefix_width(text, max_width.saturating_sub(1));
    out.push('…');
    out
}

fn truncate_middle(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let available = max_width.saturating_sub(1);
    let head = available / 2;
    let tail = available - head;
    format!(
        "{}…{}",
        take_prefix_width(text, head),
        take_suffix_width(text, tail)
    )
}

fn take_prefix_width(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > width {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out
}

fn take_suffix_width(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut out: Vec<char> = Vec::new();
    for ch in text.chars().rev() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > width {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out.into_iter().rev().collect()
}
