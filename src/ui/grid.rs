use std::time::Instant;

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use regex::Regex;
use unicode_width::UnicodeWidthStr;

use crate::animation::{EntranceTracker, ScaleAlpha};
use crate::app::dialogs::display_title;
use crate::app::format::format_card_date;
use crate::config::Theme;
use crate::highlight::{build_highlight_regex, split_matches};
use crate::storage::Note;

use super::RenderContext;

/// Scroll position of the grid, kept across frames like a list state.
#[derive(Debug, Clone, Default)]
pub struct GridState {
    pub scroll: u16,
    /// Layout of the last drawn frame, indexed like the visible notes.
    pub slots: Vec<CardSlot>,
}

impl GridState {
    /// Index of the card directly above (`step < 0`) or below the card at
    /// `index` in the same column, using the last drawn layout.
    pub fn vertical_neighbor(&self, index: usize, step: isize) -> Option<usize> {
        let current = self.slots.get(index)?;
        let same_column = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.column == current.column);
        if step < 0 {
            same_column
                .filter(|(_, slot)| slot.top < current.top)
                .max_by_key(|(_, slot)| slot.top)
                .map(|(idx, _)| idx)
        } else {
            same_column
                .filter(|(_, slot)| slot.top > current.top)
                .min_by_key(|(_, slot)| slot.top)
                .map(|(idx, _)| idx)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSlot {
    pub column: usize,
    pub top: u16,
    pub height: u16,
}

/// Masonry placement: each card goes into the currently shortest column.
pub fn layout_staggered(heights: &[u16], columns: usize) -> Vec<CardSlot> {
    let columns = columns.max(1);
    let mut column_heights = vec![0u16; columns];
    heights
        .iter()
        .map(|&height| {
            let (column, top) = column_heights
                .iter()
                .copied()
                .enumerate()
                .min_by_key(|&(idx, h)| (h, idx))
                .unwrap_or((0, 0));
            column_heights[column] = top.saturating_add(height);
            CardSlot {
                column,
                top,
                height,
            }
        })
        .collect()
}

/// Borders, title and date rows plus wrapped content, capped at
/// `preview_lines`.
pub fn card_height(note: &Note, inner_width: u16, preview_lines: u16) -> u16 {
    let width = usize::from(inner_width.max(1));
    let mut content_rows = 0usize;
    for line in note.content.lines() {
        let cols = UnicodeWidthStr::width(line);
        content_rows += cols.div_ceil(width).max(1);
        if content_rows >= usize::from(preview_lines) {
            break;
        }
    }
    let content_rows = content_rows.min(usize::from(preview_lines)) as u16;
    4 + content_rows
}

fn scale_rect(rect: Rect, scale: f32) -> Rect {
    let scale = scale.clamp(0.0, 1.0);
    let width = ((f32::from(rect.width) * scale).round() as u16).clamp(1, rect.width.max(1));
    let height = ((f32::from(rect.height) * scale).round() as u16).clamp(1, rect.height.max(1));
    Rect {
        x: rect.x + (rect.width - width) / 2,
        y: rect.y + (rect.height - height) / 2,
        width,
        height,
    }
}

pub fn draw_grid(
    frame: &mut Frame,
    area: Rect,
    ctx: &RenderContext,
    grid: &mut GridState,
    tracker: &mut EntranceTracker,
) {
    grid.slots.clear();
    let notes = ctx.state.visible_notes();
    if notes.is_empty() {
        tracker.sync_visible(&[], ctx.now);
        let message = if ctx.state.search.query.is_empty() {
            "No notes yet. Press 'a' to write one."
        } else {
            "No notes match your search."
        };
        let empty = Paragraph::new(Line::from(Span::styled(
            message,
            Style::default().fg(ctx.theme.muted),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(empty, area);
        return;
    }

    let columns = ctx.config.grid.columns.max(1);
    let column_width = area.width / columns as u16;
    if column_width < 4 || area.height < 4 {
        return;
    }
    let heights: Vec<u16> = notes
        .iter()
        .map(|note| card_height(note, column_width - 2, ctx.config.grid.preview_lines))
        .collect();
    let slots = layout_staggered(&heights, columns);

    if let Some(slot) = slots.get(ctx.state.cursor()) {
        keep_in_view(grid, slot, area.height);
    }

    let on_screen: Vec<(usize, VisibleSpan)> = slots
        .iter()
        .enumerate()
        .filter_map(|(idx, slot)| {
            clip_slot(slot, grid.scroll, area.height).map(|span| (idx, span))
        })
        .collect();
    let ids: Vec<i64> = on_screen.iter().map(|(idx, _)| notes[*idx].id).collect();
    tracker.sync_visible(&ids, ctx.now);
    grid.slots = slots;

    let highlight = build_highlight_regex(&ctx.state.search_terms());
    for (idx, span) in on_screen {
        let note = notes[idx];
        let rect = Rect {
            x: area.x + grid.slots[idx].column as u16 * column_width,
            y: area.y + span.offset,
            width: column_width,
            height: span.height,
        };
        let animated = tracker.sample(note.id, ctx.now);
        draw_card(
            frame,
            rect,
            span.skipped,
            note,
            idx == ctx.state.cursor(),
            animated,
            ctx.theme,
            highlight.as_ref(),
        );
    }
}

/// The part of a card inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VisibleSpan {
    /// Rows from the top of the viewport.
    offset: u16,
    height: u16,
    /// Card rows scrolled off above the viewport.
    skipped: u16,
}

fn clip_slot(slot: &CardSlot, scroll: u16, viewport: u16) -> Option<VisibleSpan> {
    let bottom = scroll.saturating_add(viewport);
    let end = slot.top.saturating_add(slot.height);
    if end <= scroll || slot.top >= bottom {
        return None;
    }
    let top = slot.top.max(scroll);
    Some(VisibleSpan {
        offset: top - scroll,
        height: end.min(bottom) - top,
        skipped: top - slot.top,
    })
}

fn keep_in_view(grid: &mut GridState, slot: &CardSlot, viewport: u16) {
    if slot.top < grid.scroll {
        grid.scroll = slot.top;
    } else if slot.top + slot.height > grid.scroll + viewport {
        grid.scroll = (slot.top + slot.height).saturating_sub(viewport).min(slot.top);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_card(
    frame: &mut Frame,
    rect: Rect,
    skipped: u16,
    note: &Note,
    focused: bool,
    animated: ScaleAlpha,
    theme: &Theme,
    highlight: Option<&Regex>,
) {
    let area = scale_rect(rect, animated.scale);
    let fade = |color| theme.fade(color, animated.alpha);

    let border = if focused {
        theme.accent
    } else if note.selected {
        theme.selected
    } else if note.pinned {
        theme.pinned
    } else {
        theme.border
    };
    let mut border_style = Style::default().fg(fade(border));
    if focused || note.selected {
        border_style = border_style.add_modifier(Modifier::BOLD);
    }

    let mut marker = String::new();
    if note.selected {
        marker.push_str("✓ ");
    }
    if note.pinned {
        marker.push_str("📌 ");
    }

    let title_style = Style::default()
        .fg(fade(theme.text))
        .add_modifier(Modifier::BOLD);
    let hit_style = Style::default()
        .fg(fade(theme.highlight))
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let mut title_spans = vec![Span::styled(marker, Style::default().fg(fade(theme.pinned)))];
    title_spans.extend(highlighted(display_title(note), highlight, title_style, hit_style));

    let mut lines = vec![
        Line::from(title_spans),
        Line::from(Span::styled(
            format_card_date(note.last_modified),
            Style::default().fg(fade(theme.muted)),
        )),
    ];
    let body_style = Style::default().fg(fade(theme.text));
    for line in note.content.lines() {
        lines.push(Line::from(highlighted(line, highlight, body_style, hit_style)));
    }

    frame.render_widget(Clear, area);
    let card = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .wrap(Wrap { trim: false })
        .scroll((skipped, 0));
    frame.render_widget(card, area);
}

fn highlighted(
    text: &str,
    regex: Option<&Regex>,
    base: Style,
    hit: Style,
) -> Vec<Span<'static>> {
    split_matches(text, regex)
        .into_iter()
        .map(|(piece, is_hit)| Span::styled(piece.to_string(), if is_hit { hit } else { base }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cards_fill_the_shortest_column() {
        let slots = layout_staggered(&[6, 4, 3, 5], 2);
        assert_eq!(
            slots,
            vec![
                CardSlot { column: 0, top: 0, height: 6 },
                CardSlot { column: 1, top: 0, height: 4 },
                CardSlot { column: 1, top: 4, height: 3 },
                CardSlot { column: 0, top: 6, height: 5 },
            ]
        );
    }

    #[test]
    fn card_height_caps_preview_and_counts_wrapping() {
        let short = Note::new(1, "t", "one line");
        assert_eq!(card_height(&short, 20, 6), 5);

        let wrapped = Note::new(2, "t", &"x".repeat(45));
        assert_eq!(card_height(&wrapped, 20, 6), 7);

        let long = Note::new(3, "t", &"line\n".repeat(30));
        assert_eq!(card_height(&long, 20, 6), 10);

        let empty = Note::new(4, "t", "");
        assert_eq!(card_height(&empty, 20, 6), 4);
    }

    #[test]
    fn scaling_shrinks_around_the_centre() {
        let rect = Rect::new(10, 10, 20, 10);
        assert_eq!(scale_rect(rect, 1.0), rect);
        assert_eq!(scale_rect(rect, 0.5), Rect::new(15, 12, 10, 5));
        assert_eq!(scale_rect(rect, 0.0).width, 1);
    }

    #[test]
    fn scrolling_follows_the_cursor_card() {
        let mut grid = GridState::default();
        keep_in_view(&mut grid, &CardSlot { column: 0, top: 20, height: 6 }, 10);
        assert_eq!(grid.scroll, 16);
        keep_in_view(&mut grid, &CardSlot { column: 1, top: 3, height: 6 }, 10);
        assert_eq!(grid.scroll, 3);
    }

    #[test]
    fn cards_partly_above_the_viewport_stay_visible() {
        let slot = CardSlot { column: 1, top: 4, height: 8 };
        assert_eq!(
            clip_slot(&slot, 7, 10),
            Some(VisibleSpan { offset: 0, height: 5, skipped: 3 })
        );
        assert_eq!(
            clip_slot(&slot, 0, 10),
            Some(VisibleSpan { offset: 4, height: 6, skipped: 0 })
        );
        assert_eq!(clip_slot(&slot, 12, 10), None);
        assert_eq!(clip_slot(&slot, 0, 4), None);
    }

    #[test]
    fn vertical_moves_stay_in_the_same_column() {
        let grid = GridState {
            scroll: 0,
            slots: layout_staggered(&[6, 4, 3, 5], 2),
        };
        assert_eq!(grid.vertical_neighbor(0, 1), Some(3));
        assert_eq!(grid.vertical_neighbor(3, -1), Some(0));
        assert_eq!(grid.vertical_neighbor(1, 1), Some(2));
        assert_eq!(grid.vertical_neighbor(2, 1), None);
        assert_eq!(grid.vertical_neighbor(1, -1), None);
        assert_eq!(GridState::default().vertical_neighbor(0, 1), None);
    }
}
