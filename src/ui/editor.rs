use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::app::editor::{EditorField, EditorState};
use crate::config::Theme;

pub fn draw_editor(frame: &mut Frame, area: Rect, editor: &EditorState, theme: &Theme) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let focus_style = |field| {
        if editor.field() == field {
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.border)
        }
    };
    let title_label = if editor.is_dirty() { "Title *" } else { "Title" };

    frame.render_widget(
        Paragraph::new(editor.title().to_string())
            .style(Style::default().fg(theme.text))
            .block(
                Block::default()
                    .title(title_label)
                    .borders(Borders::ALL)
                    .border_style(focus_style(EditorField::Title)),
            ),
        rows[0],
    );
    frame.render_widget(
        Paragraph::new(editor.content().to_string())
            .style(Style::default().fg(theme.text))
            .block(
                Block::default()
                    .title(format!("Note #{}", editor.note_id()))
                    .borders(Borders::ALL)
                    .border_style(focus_style(EditorField::Content)),
            ),
        rows[1],
    );

    let (field_area, text) = match editor.field() {
        EditorField::Title => (rows[0], editor.title()),
        EditorField::Content => (rows[1], editor.content()),
    };
    let (col, row) = cursor_offset(text, editor.cursor());
    let x = field_area.x + 1 + col.min(field_area.width.saturating_sub(3));
    let y = field_area.y + 1 + row.min(field_area.height.saturating_sub(3));
    frame.set_cursor(x, y);
}

/// Column and row of the byte offset `cursor` in unwrapped text.
fn cursor_offset(text: &str, cursor: usize) -> (u16, u16) {
    let before = &text[..cursor.min(text.len())];
    let row = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let col = UnicodeWidthStr::width(&before[line_start..]);
    (col as u16, row as u16)
}

#[cfg(test)]
mod tests {
    use super::cursor_offset;

    #[test]
    fn cursor_offset_counts_rows_and_display_columns() {
        assert_eq!(cursor_offset("ab\ncd", 4), (1, 1));
        assert_eq!(cursor_offset("日本", 3), (2, 0));
        assert_eq!(cursor_offset("", 0), (0, 0));
    }
}
