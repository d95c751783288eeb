use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::dialogs::DialogText;
use crate::app::format::format_last_modified;
use crate::app::view::{MenuState, NoteViewSession, MENU_ITEMS};
use crate::config::Theme;

use super::{centered_rect, RenderContext};

pub fn draw_note_view(frame: &mut Frame, area: Rect, ctx: &RenderContext, session: &NoteViewSession) {
    let notes = ctx.state.notes();
    let display = session.display(notes);
    let theme = ctx.theme;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let mut header = vec![Line::from(Span::styled(
        display.title.clone(),
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
    ))];
    let mut meta = vec![Span::styled(
        format!("Edited {}", format_last_modified(display.last_modified)),
        Style::default().fg(theme.muted),
    )];
    if display.pinned {
        meta.push(Span::styled("  • pinned", Style::default().fg(theme.pinned)));
    }
    if display.missing {
        meta.push(Span::styled(
            "  • note not found",
            Style::default().fg(theme.danger),
        ));
    }
    header.push(Line::from(meta));
    frame.render_widget(
        Paragraph::new(header).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(theme.border)),
        ),
        rows[0],
    );

    let body = Paragraph::new(display.content.clone())
        .style(Style::default().fg(theme.text))
        .wrap(Wrap { trim: false });
    frame.render_widget(body, rows[1]);

    if session.menu() == MenuState::Open {
        draw_menu(frame, area, session, theme);
    }
    if let Some(text) = session.delete_dialog_text(notes) {
        draw_confirm(frame, &text, "Enter delete • Esc cancel", theme.danger, theme);
    }
    if let Some(text) = session.export_dialog(notes, ctx.config.export.format) {
        draw_confirm(frame, &text, "Enter export • Esc cancel", theme.accent, theme);
    }
}

fn draw_menu(frame: &mut Frame, area: Rect, session: &NoteViewSession, theme: &Theme) {
    let width = 16.min(area.width);
    let height = (MENU_ITEMS.len() as u16 + 2).min(area.height);
    let rect = Rect {
        x: area.right().saturating_sub(width),
        y: area.y,
        width,
        height,
    };
    let items: Vec<ListItem> = MENU_ITEMS
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let style = if idx == session.menu_cursor() {
                Style::default()
                    .fg(theme.background)
                    .bg(theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text)
            };
            ListItem::new(Line::from(Span::styled(format!(" {item}"), style)))
        })
        .collect();
    frame.render_widget(Clear, rect);
    frame.render_widget(
        List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent)),
        ),
        rect,
    );
}

pub(super) fn draw_confirm(
    frame: &mut Frame,
    text: &DialogText,
    hint: &str,
    accent: ratatui::style::Color,
    theme: &Theme,
) {
    let area = centered_rect(60, 30, frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(text.body.clone(), Style::default().fg(theme.text))),
        Line::from(""),
        Line::from(Span::styled(hint.to_string(), Style::default().fg(theme.muted))),
    ])
    .block(
        Block::default()
            .title(Span::styled(
                text.title.clone(),
                Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent)),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
