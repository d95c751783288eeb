#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    NotesList,
    ViewNote { note_id: i64 },
    EditNote { note_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    NotesList,
    ViewNote,
    EditNote,
}

impl Route {
    pub fn kind(&self) -> RouteKind {
        match self {
            Route::NotesList => RouteKind::NotesList,
            Route::ViewNote { .. } => RouteKind::ViewNote,
            Route::EditNote { .. } => RouteKind::EditNote,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavOptions {
    /// Pop entries above the most recent entry of this kind before pushing.
    pub pop_up_to: Option<RouteKind>,
    /// Also pop the matched entry itself.
    pub inclusive: bool,
}

impl NavOptions {
    pub fn push() -> Self {
        Self::default()
    }

    /// Replace everything from the last `kind` entry upwards.
    pub fn clear_to(kind: RouteKind) -> Self {
        Self {
            pop_up_to: Some(kind),
            inclusive: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavStack {
    entries: Vec<Route>,
}

impl NavStack {
    pub fn new(root: Route) -> Self {
        Self {
            entries: vec![root],
        }
    }

    pub fn current(&self) -> Route {
        *self.entries.last().unwrap_or(&Route::NotesList)
    }

    pub fn entries(&self) -> &[Route] {
        &self.entries
    }

    pub fn navigate(&mut self, route: Route, options: NavOptions) {
        if let Some(kind) = options.pop_up_to {
            if let Some(idx) = self.entries.iter().rposition(|entry| entry.kind() == kind) {
                let keep = if options.inclusive { idx } else { idx + 1 };
                self.entries.truncate(keep);
            }
        }
        tracing::debug!(?route, depth = self.entries.len(), "navigating");
        self.entries.push(route);
    }

    /// Returns false when already at the root.
    pub fn back(&mut self) -> bool {
        if self.entries.len() <= 1 {
            return false;
        }
        self.entries.pop();
        true
    }
}
