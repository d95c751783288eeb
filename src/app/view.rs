//! State for one visit of the note screen: the overflow menu and the delete
//! and export confirmations.
//!
//! The session never touches storage. Everything it wants done goes out
//! through [`ViewEffects`] as an intent, a navigation request or a toast, and
//! only explicit confirm actions produce intents. Dropping the session (the
//! user navigated away) discards any open dialog without side effects.

use strum::{Display, EnumIter};

use crate::app::dialogs::{self, DialogText};
use crate::app::navigation::{NavOptions, Route, RouteKind};
use crate::config::ExportFormat;
use crate::storage::Note;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteIntent {
    DeleteNote(Note),
    ExportNote(Note),
    StartEditing(Note),
}

pub trait ViewEffects {
    fn emit(&mut self, intent: NoteIntent);
    fn navigate(&mut self, route: Route, options: NavOptions);
    fn notify(&mut self, message: String);
}

/// Buffers effects so the event loop can apply them after the handler
/// returns.
#[derive(Debug, Default)]
pub struct EffectQueue {
    pub intents: Vec<NoteIntent>,
    pub navigation: Vec<(Route, NavOptions)>,
    pub notifications: Vec<String>,
}

impl EffectQueue {
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty() && self.navigation.is_empty() && self.notifications.is_empty()
    }
}

impl ViewEffects for EffectQueue {
    fn emit(&mut self, intent: NoteIntent) {
        self.intents.push(intent);
    }

    fn navigate(&mut self, route: Route, options: NavOptions) {
        self.navigation.push((route, options));
    }

    fn notify(&mut self, message: String) {
        self.notifications.push(message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Hidden,
    Confirming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum MenuItem {
    Edit,
    Export,
    Delete,
}

/// Linear lookup; collections are a person's notes, not a database.
pub fn resolve(notes: &[Note], note_id: i64) -> Option<&Note> {
    notes.iter().find(|note| note.id == note_id)
}

/// Fields shown on the note screen with placeholders for a vanished note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDisplay {
    pub title: String,
    pub content: String,
    pub last_modified: i64,
    pub pinned: bool,
    pub missing: bool,
}

#[derive(Debug, Clone)]
pub struct NoteViewSession {
    selected_note_id: i64,
    menu: MenuState,
    menu_cursor: usize,
    delete_dialog: DialogState,
    export_dialog: DialogState,
}

impl NoteViewSession {
    pub fn new(selected_note_id: i64) -> Self {
        Self {
            selected_note_id,
            menu: MenuState::Closed,
            menu_cursor: 0,
            delete_dialog: DialogState::Hidden,
            export_dialog: DialogState::Hidden,
        }
    }

    pub fn selected_note_id(&self) -> i64 {
        self.selected_note_id
    }

    pub fn menu(&self) -> MenuState {
        self.menu
    }

    pub fn menu_cursor(&self) -> usize {
        self.menu_cursor
    }

    pub fn delete_dialog(&self) -> DialogState {
        self.delete_dialog
    }

    pub fn export_dialog_state(&self) -> DialogState {
        self.export_dialog
    }

    pub fn resolve<'a>(&self, notes: &'a [Note]) -> Option<&'a Note> {
        resolve(notes, self.selected_note_id)
    }

    pub fn display(&self, notes: &[Note]) -> NoteDisplay {
        match self.resolve(notes) {
            Some(note) => NoteDisplay {
                title: note.title.clone(),
                content: note.content.clone(),
                last_modified: note.last_modified,
                pinned: note.pinned,
                missing: false,
            },
            None => NoteDisplay {
                title: String::new(),
                content: String::new(),
                last_modified: 0,
                pinned: false,
                missing: true,
            },
        }
    }

    pub fn open_menu(&mut self) {
        if self.menu == MenuState::Closed {
            self.menu = MenuState::Open;
            self.menu_cursor = 0;
        }
    }

    pub fn dismiss_menu(&mut self) {
        self.menu = MenuState::Closed;
    }

    pub fn move_menu_cursor(&mut self, delta: isize) {
        if self.menu != MenuState::Open {
            return;
        }
        let len = MENU_ITEMS.len() as isize;
        let next = (self.menu_cursor as isize + delta).clamp(0, len - 1);
        self.menu_cursor = next as usize;
    }

    pub fn highlighted_item(&self) -> MenuItem {
        MENU_ITEMS[self.menu_cursor.min(MENU_ITEMS.len() - 1)]
    }

    /// Returns false when the menu was not open.
    pub fn select_menu_item(
        &mut self,
        item: MenuItem,
        notes: &[Note],
        effects: &mut dyn ViewEffects,
    ) -> bool {
        if self.menu != MenuState::Open {
            return false;
        }
        self.menu = MenuState::Closed;
        match item {
            MenuItem::Edit => {
                if let Some(note) = self.resolve(notes) {
                    effects.emit(NoteIntent::StartEditing(note.clone()));
                }
                effects.navigate(
                    Route::EditNote {
                        note_id: self.selected_note_id,
                    },
                    NavOptions::push(),
                );
            }
            MenuItem::Export => self.export_dialog = DialogState::Confirming,
            MenuItem::Delete => self.delete_dialog = DialogState::Confirming,
        }
        true
    }

    pub fn can_confirm_delete(&self, notes: &[Note]) -> bool {
        self.delete_dialog == DialogState::Confirming && self.resolve(notes).is_some()
    }

    pub fn delete_dialog_text(&self, notes: &[Note]) -> Option<DialogText> {
        if self.delete_dialog != DialogState::Confirming {
            return None;
        }
        let note = self.resolve(notes)?;
        Some(dialogs::delete_dialog(std::slice::from_ref(note)))
    }

    pub fn confirm_delete(&mut self, notes: &[Note], effects: &mut dyn ViewEffects) {
        if self.delete_dialog != DialogState::Confirming {
            return;
        }
        self.delete_dialog = DialogState::Hidden;
        let Some(note) = self.resolve(notes) else {
            tracing::debug!(
                note_id = self.selected_note_id,
                "delete confirmed for a note that no longer exists"
            );
            return;
        };
        effects.emit(NoteIntent::DeleteNote(note.clone()));
        effects.navigate(Route::NotesList, NavOptions::clear_to(RouteKind::NotesList));
    }

    pub fn cancel_delete(&mut self) {
        self.delete_dialog = DialogState::Hidden;
    }

    /// Dialog copy, or `None` when the dialog is closed or the note vanished.
    pub fn export_dialog(&self, notes: &[Note], format: ExportFormat) -> Option<DialogText> {
        if self.export_dialog != DialogState::Confirming {
            return None;
        }
        let note = self.resolve(notes)?;
        Some(dialogs::export_dialog(std::slice::from_ref(note), format))
    }

    pub fn confirm_export(&mut self, notes: &[Note], effects: &mut dyn ViewEffects) {
        if self.export_dialog != DialogState::Confirming {
            return;
        }
        self.export_dialog = DialogState::Hidden;
        let Some(note) = self.resolve(notes) else {
            return;
        };
        effects.emit(NoteIntent::ExportNote(note.clone()));
        effects.notify(dialogs::export_success_message(std::slice::from_ref(note)));
    }

    pub fn cancel_export(&mut self) {
        self.export_dialog = DialogState::Hidden;
    }
}

pub const MENU_ITEMS: [MenuItem; 3] = [MenuItem::Edit, MenuItem::Export, MenuItem::Delete];
