use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::animation::EntranceTracker;
use crate::config::{AppConfig, Theme};
use crate::export::Exporter;
use crate::storage::StorageHandle;
use crate::ui::{self, GridState, RenderContext};

pub mod actions;
pub mod dialogs;
pub mod editor;
pub mod format;
pub mod navigation;
pub mod state;
pub mod view;

use self::actions::{ActionDispatcher, IntentOutcome};
use self::editor::EditorState;
use self::navigation::{NavOptions, NavStack, Route};
use self::state::{AppState, ListDialog};
use self::view::{DialogState, EffectQueue, MenuItem, MenuState, NoteViewSession};

const IDLE_TICK: Duration = Duration::from_millis(250);
const FRAME_TICK: Duration = Duration::from_millis(16);

pub struct App {
    pub config: Arc<AppConfig>,
    pub storage: StorageHandle,
    exporter: Exporter,
    theme: Theme,
    state: AppState,
    nav: NavStack,
    session: Option<NoteViewSession>,
    editor: Option<EditorState>,
    grid: GridState,
    tracker: EntranceTracker,
    /// Note created by `a` that has not been saved yet.
    draft_note: Option<i64>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Arc<AppConfig>, storage: StorageHandle) -> Result<Self> {
        let state = AppState::load(&storage).context("loading notes for initial state")?;
        let tracker = if config.animation.enabled {
            EntranceTracker::new(
                config.animation.tuning(),
                config.animation.stagger_factor,
                config.animation.duration(),
                config.animation.scale_alpha_args(),
            )
        } else {
            EntranceTracker::disabled()
        };
        Ok(Self {
            exporter: Exporter::from_options(&config.export),
            theme: Theme::for_name(config.theme),
            config,
            storage,
            state,
            nav: NavStack::new(Route::NotesList),
            session: None,
            editor: None,
            grid: GridState::default(),
            tracker,
            draft_note: None,
            should_quit: false,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            let now = Instant::now();
            let toast_showing = self.state.expire_toast(now);
            terminal
                .draw(|frame| {
                    let ctx = RenderContext {
                        state: &self.state,
                        config: &self.config,
                        theme: &self.theme,
                        route: self.nav.current(),
                        session: self.session.as_ref(),
                        editor: self.editor.as_ref(),
                        now,
                    };
                    ui::draw_app(frame, &ctx, &mut self.grid, &mut self.tracker);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = if self.tracker.is_animating(now) {
                FRAME_TICK
            } else if toast_showing {
                IDLE_TICK.min(self.config.toast_duration())
            } else {
                IDLE_TICK
            };

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // layout is recomputed on the next draw
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            if let Some(note_id) = self.draft_note {
                self.discard_draft(note_id);
            }
            self.should_quit = true;
            return;
        }
        match self.nav.current() {
            Route::NotesList => self.handle_list_key(key),
            Route::ViewNote { .. } => self.handle_view_key(key),
            Route::EditNote { .. } => self.handle_editor_key(key),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        if let Some(ListDialog::ExportSelection) = self.state.list_dialog() {
            match key.code {
                KeyCode::Enter => self.export_selection(),
                KeyCode::Esc => self.state.close_list_dialog(),
                _ => {}
            }
            return;
        }

        if self.state.is_search_active() {
            match key.code {
                KeyCode::Esc => self.state.cancel_search(),
                KeyCode::Enter => self.state.finish_search(),
                KeyCode::Backspace => self.state.pop_search_char(),
                KeyCode::Char(ch) if !has_command_modifier(key) => self.state.push_search_char(ch),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Left | KeyCode::Char('h') => self.state.move_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.state.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_vertical(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_vertical(1),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_notes()
            }
            KeyCode::Enter => {
                if let Some(note_id) = self.state.cursor_note().map(|note| note.id) {
                    self.navigate(Route::ViewNote { note_id }, NavOptions::push());
                }
            }
            KeyCode::Esc => {
                if !self.state.clear_selection() {
                    self.state.cancel_search();
                }
            }
            KeyCode::Char('/') => self.state.begin_search(),
            KeyCode::Char('a') if !has_command_modifier(key) => self.create_note(),
            KeyCode::Char('p') if !has_command_modifier(key) => self.toggle_pin(),
            KeyCode::Char(' ') => {
                if self.state.toggle_selection().is_none() {
                    self.toast("Nothing to select");
                }
            }
            KeyCode::Char('x') if !has_command_modifier(key) => {
                if !self.state.open_export_selection() {
                    self.toast("Select notes with space first");
                }
            }
            _ => {}
        }
    }

    /// Up/down follow the masonry columns of the last drawn frame.
    fn move_vertical(&mut self, step: isize) {
        let cursor = self.state.cursor();
        if self.grid.slots.is_empty() {
            let columns = self.config.grid.columns.max(1) as isize;
            self.state.move_cursor(step * columns);
        } else if let Some(target) = self.grid.vertical_neighbor(cursor, step) {
            self.state.move_cursor(target as isize - cursor as isize);
        }
    }

    fn handle_view_key(&mut self, key: KeyEvent) {
        let Some(session) = self.session.as_mut() else {
            self.back();
            return;
        };
        let notes = self.state.notes();
        let mut effects = EffectQueue::default();

        // Dialogs for a note that vanished are never drawn, so they must not
        // hold the keyboard either.
        if session.delete_dialog() == DialogState::Confirming && !session.can_confirm_delete(notes)
        {
            session.cancel_delete();
        }
        if session.export_dialog_state() == DialogState::Confirming
            && session.export_dialog(notes, self.config.export.format).is_none()
        {
            session.cancel_export();
        }

        if session.delete_dialog() == DialogState::Confirming {
            match key.code {
                KeyCode::Enter => session.confirm_delete(notes, &mut effects),
                KeyCode::Esc => session.cancel_delete(),
                _ => {}
            }
        } else if session.export_dialog_state() == DialogState::Confirming {
            match key.code {
                KeyCode::Enter => session.confirm_export(notes, &mut effects),
                KeyCode::Esc => session.cancel_export(),
                _ => {}
            }
        } else if session.menu() == MenuState::Open {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => session.move_menu_cursor(-1),
                KeyCode::Down | KeyCode::Char('j') => session.move_menu_cursor(1),
                KeyCode::Enter => {
                    let item = session.highlighted_item();
                    session.select_menu_item(item, notes, &mut effects);
                }
                KeyCode::Esc | KeyCode::Char('m') => session.dismiss_menu(),
                _ => {}
            }
        } else {
            match key.code {
                KeyCode::Char('m') => session.open_menu(),
                KeyCode::Char('e') => {
                    session.open_menu();
                    session.select_menu_item(MenuItem::Edit, notes, &mut effects);
                }
                KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => {
                    self.back();
                    return;
                }
                _ => {}
            }
        }

        self.apply_effects(effects);
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let Some(editor) = self.editor.as_mut() else {
            self.back();
            return;
        };
        match key.code {
            KeyCode::Esc => {
                let note_id = editor.note_id();
                if editor.is_dirty() {
                    self.toast("Changes discarded");
                }
                if self.draft_note == Some(note_id) {
                    self.discard_draft(note_id);
                }
                self.back();
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.save_editor()
            }
            KeyCode::Tab => editor.toggle_field(),
            KeyCode::Enter => {
                editor.insert_newline();
            }
            KeyCode::Backspace => {
                editor.backspace();
            }
            KeyCode::Left => {
                editor.move_left();
            }
            KeyCode::Right => {
                editor.move_right();
            }
            KeyCode::Char(ch) if !has_command_modifier(key) => {
                editor.insert_char(ch);
            }
            _ => {}
        }
    }

    fn apply_effects(&mut self, effects: EffectQueue) {
        for message in effects.notifications {
            self.toast(message);
        }
        for intent in effects.intents {
            let dispatcher = ActionDispatcher::new(&self.storage, &self.exporter);
            match dispatcher.dispatch(intent) {
                Ok(IntentOutcome::Deleted { note_id, .. }) => {
                    tracing::info!(note_id, "note deleted");
                    self.refresh_notes();
                }
                Ok(IntentOutcome::Exported { paths }) => {
                    tracing::debug!(files = paths.len(), "export finished");
                }
                Ok(IntentOutcome::EditingStarted(note)) => {
                    self.editor = Some(EditorState::from_note(&note));
                }
                Err(err) => {
                    tracing::error!(?err, "failed to apply note intent");
                    self.toast(format!("Action failed: {err}"));
                }
            }
        }
        for (route, options) in effects.navigation {
            self.navigate(route, options);
        }
    }

    fn navigate(&mut self, route: Route, options: NavOptions) {
        self.nav.navigate(route, options);
        self.enter_current_route();
    }

    fn back(&mut self) {
        if self.nav.back() {
            self.enter_current_route();
        }
    }

    /// Sets up per-screen state for whatever route is now on top and tears
    /// down the rest.
    fn enter_current_route(&mut self) {
        match self.nav.current() {
            Route::NotesList => {
                self.session = None;
                self.editor = None;
                self.tracker.clear();
                self.refresh_notes();
            }
            Route::ViewNote { note_id } => {
                self.editor = None;
                self.tracker.clear();
                self.session = Some(NoteViewSession::new(note_id));
            }
            Route::EditNote { note_id } => {
                self.session = None;
                let ready = self
                    .editor
                    .as_ref()
                    .is_some_and(|editor| editor.note_id() == note_id);
                if ready {
                    return;
                }
                match view::resolve(self.state.notes(), note_id) {
                    Some(note) => self.editor = Some(EditorState::from_note(note)),
                    None => {
                        self.toast("That note no longer exists");
                        self.back();
                    }
                }
            }
        }
    }

    fn refresh_notes(&mut self) {
        if let Err(err) = self.state.refresh(&self.storage) {
            tracing::error!(?err, "failed to refresh notes from storage");
            self.toast("Failed to reload notes");
        }
    }

    fn create_note(&mut self) {
        let dispatcher = ActionDispatcher::new(&self.storage, &self.exporter);
        match dispatcher.create_note() {
            Ok(note_id) => {
                self.draft_note = Some(note_id);
                self.refresh_notes();
                self.state.focus_note(note_id);
                self.navigate(Route::EditNote { note_id }, NavOptions::push());
            }
            Err(err) => {
                tracing::error!(?err, "failed to create note");
                self.toast("Failed to create note");
            }
        }
    }

    fn toggle_pin(&mut self) {
        let Some(note) = self.state.cursor_note().cloned() else {
            return;
        };
        let dispatcher = ActionDispatcher::new(&self.storage, &self.exporter);
        match dispatcher.toggle_pin(&note) {
            Ok(pinned) => {
                self.refresh_notes();
                self.state.focus_note(note.id);
                self.toast(if pinned { "Pinned" } else { "Unpinned" });
            }
            Err(err) => {
                tracing::error!(?err, note_id = note.id, "failed to toggle pin");
                self.toast("Failed to update pin");
            }
        }
    }

    fn export_selection(&mut self) {
        let selected = self.state.selected_notes();
        self.state.close_list_dialog();
        if selected.is_empty() {
            return;
        }
        let dispatcher = ActionDispatcher::new(&self.storage, &self.exporter);
        match dispatcher.export_notes(&selected) {
            Ok(_) => {
                self.state.clear_selection();
                self.toast(dialogs::export_success_message(&selected));
            }
            Err(err) => {
                tracing::error!(?err, "failed to export selection");
                self.toast("Export failed");
            }
        }
    }

    fn save_editor(&mut self) {
        let Some(editor) = self.editor.as_ref() else {
            return;
        };
        let note_id = editor.note_id();
        let dispatcher = ActionDispatcher::new(&self.storage, &self.exporter);
        match dispatcher.save_note(note_id, editor.title(), editor.content()) {
            Ok(()) => {
                if self.draft_note == Some(note_id) {
                    self.draft_note = None;
                }
                self.refresh_notes();
                self.toast("Saved");
                self.back();
            }
            Err(err) => {
                tracing::error!(?err, "failed to save note");
                self.toast("Failed to save note");
            }
        }
    }

    /// Removes a note that was created for the editor but never saved.
    fn discard_draft(&mut self, note_id: i64) {
        self.draft_note = None;
        let dispatcher = ActionDispatcher::new(&self.storage, &self.exporter);
        if let Err(err) = dispatcher.discard_note(note_id) {
            tracing::error!(?err, note_id, "failed to discard unsaved note");
        }
    }

    fn toast(&mut self, message: impl Into<String>) {
        self.state
            .set_toast(message, self.config.toast_duration(), Instant::now());
    }
}

fn has_command_modifier(key: KeyEvent) -> bool {
    key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
