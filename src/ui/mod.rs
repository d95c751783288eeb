use std::time::Instant;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use crate::animation::EntranceTracker;
use crate::app::dialogs;
use crate::app::editor::EditorState;
use crate::app::navigation::Route;
use crate::app::state::{AppState, ListDialog};
use crate::app::view::NoteViewSession;
use crate::config::{AppConfig, Theme};

mod editor;
mod grid;
mod note_view;

pub use grid::{card_height, layout_staggered, CardSlot, GridState};

/// Everything a frame reads. Built fresh by the event loop for each draw.
pub struct RenderContext<'a> {
    pub state: &'a AppState,
    pub config: &'a AppConfig,
    pub theme: &'a Theme,
    pub route: Route,
    pub session: Option<&'a NoteViewSession>,
    pub editor: Option<&'a EditorState>,
    pub now: Instant,
}

pub fn draw_app(
    frame: &mut Frame,
    ctx: &RenderContext,
    grid: &mut GridState,
    tracker: &mut EntranceTracker,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.size());

    frame.render_widget(
        Block::default().style(Style::default().bg(ctx.theme.background)),
        frame.size(),
    );
    frame.render_widget(Paragraph::new(build_header(ctx)), rows[0]);

    let body = rows[1];
    match (ctx.route, ctx.session, ctx.editor) {
        (Route::ViewNote { .. }, Some(session), _) => {
            note_view::draw_note_view(frame, body, ctx, session)
        }
        (Route::EditNote { .. }, _, Some(editor)) => {
            editor::draw_editor(frame, body, editor, ctx.theme)
        }
        _ => grid::draw_grid(frame, body, ctx, grid, tracker),
    }

    frame.render_widget(Paragraph::new(build_footer(ctx)), rows[2]);

    if ctx.route == Route::NotesList {
        if let Some(ListDialog::ExportSelection) = ctx.state.list_dialog() {
            let selected = ctx.state.selected_notes();
            if !selected.is_empty() {
                let text = dialogs::export_dialog(&selected, ctx.config.export.format);
                note_view::draw_confirm(
                    frame,
                    &text,
                    "Enter export • Esc cancel",
                    ctx.theme.accent,
                    ctx.theme,
                );
            }
        }
    }
}

fn build_header(ctx: &RenderContext) -> Line<'static> {
    let theme = ctx.theme;
    let strong = Style::default().fg(theme.accent).add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(theme.muted);
    match ctx.route {
        Route::NotesList => {
            let visible = ctx.state.visible_notes().len();
            let mut spans = vec![
                Span::styled("notegrid", strong),
                Span::styled(format!("  {visible} notes"), muted),
            ];
            let search = &ctx.state.search;
            if search.active || !search.input.is_empty() {
                let mut input = format!("  /{}", search.input);
                if search.active {
                    input.push('▌');
                }
                spans.push(Span::styled(input, Style::default().fg(theme.highlight)));
            }
            let selected = ctx.state.selection_len();
            if selected > 0 {
                spans.push(Span::styled(
                    format!("  {selected} selected"),
                    Style::default().fg(theme.selected),
                ));
            }
            Line::from(spans)
        }
        Route::ViewNote { note_id } => Line::from(vec![
            Span::styled("notegrid", strong),
            Span::styled(format!("  note #{note_id}"), muted),
        ]),
        Route::EditNote { note_id } => Line::from(vec![
            Span::styled("notegrid", strong),
            Span::styled(format!("  editing #{note_id}"), muted),
        ]),
    }
}

fn build_footer(ctx: &RenderContext) -> Line<'static> {
    if let Some(toast) = ctx.state.toast() {
        return Line::from(Span::styled(
            toast.message.clone(),
            Style::default()
                .fg(ctx.theme.accent)
                .add_modifier(Modifier::BOLD),
        ));
    }
    let hint = match ctx.route {
        Route::NotesList if ctx.state.is_search_active() => "type to filter • Enter keep • Esc clear",
        Route::NotesList => {
            "Enter open • / search • a new • p pin • space select • x export • q quit"
        }
        Route::ViewNote { .. } => "m menu • e edit • Esc back",
        Route::EditNote { .. } => "Tab switch field • Ctrl-s save • Esc discard",
    };
    Line::from(Span::styled(hint, Style::default().fg(ctx.theme.muted)))
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::view::MenuItem;
    use crate::app::view::EffectQueue;
    use crate::storage::Note;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(ctx: &RenderContext) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).expect("terminal");
        let mut grid = GridState::default();
        let mut tracker = EntranceTracker::disabled();
        terminal
            .draw(|frame| draw_app(frame, ctx, &mut grid, &mut tracker))
            .expect("draw");
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn grid_shows_every_note_title() {
        let state = AppState::from_notes(vec![
            Note::new(1, "Groceries", "milk"),
            Note::new(2, "Plans", "travel"),
        ]);
        let config = AppConfig::default();
        let theme = Theme::default();
        let ctx = RenderContext {
            state: &state,
            config: &config,
            theme: &theme,
            route: Route::NotesList,
            session: None,
            editor: None,
            now: Instant::now(),
        };
        let screen = render(&ctx);
        assert!(screen.contains("Groceries"));
        assert!(screen.contains("Plans"));
        assert!(screen.contains("2 notes"));
    }

    #[test]
    fn missing_note_view_renders_placeholder_and_no_dialog() {
        let state = AppState::from_notes(vec![Note::new(1, "Groceries", "milk")]);
        let config = AppConfig::default();
        let theme = Theme::default();
        let mut session = NoteViewSession::new(99);
        session.open_menu();
        session.select_menu_item(MenuItem::Export, state.notes(), &mut EffectQueue::default());
        let ctx = RenderContext {
            state: &state,
            config: &config,
            theme: &theme,
            route: Route::ViewNote { note_id: 99 },
            session: Some(&session),
            editor: None,
            now: Instant::now(),
        };
        let screen = render(&ctx);
        assert!(screen.contains("note not found"));
        assert!(screen.contains("Jan 1, 1970"));
        assert!(!screen.contains("Export note"));
    }

    #[test]
    fn confirm_dialog_shows_its_title_once() {
        let state = AppState::from_notes(vec![Note::new(1, "Groceries", "milk")]);
        let config = AppConfig::default();
        let theme = Theme::default();
        let mut session = NoteViewSession::new(1);
        session.open_menu();
        session.select_menu_item(MenuItem::Delete, state.notes(), &mut EffectQueue::default());
        let ctx = RenderContext {
            state: &state,
            config: &config,
            theme: &theme,
            route: Route::ViewNote { note_id: 1 },
            session: Some(&session),
            editor: None,
            now: Instant::now(),
        };
        let screen = render(&ctx);
        assert_eq!(screen.matches("Delete note").count(), 1);
        assert!(screen.contains("deleted permanently"));
    }
}
