//! services/app/src/tui/views/favorites.rs
//!
//! Documents marked favorite. Contrast with the library: this view fetches
//! the unfiltered list and narrows it locally by favorite membership plus a
//! case-insensitive title search.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use doclens_core::domain::{Document, DocumentQuery};
use doclens_core::ports::PortResult;

use crate::state::library::FavoritesViewState;
use crate::tui::events::{AppEvent, Route, ViewResult};
use crate::tui::services::Services;
use crate::tui::theme::Palette;
use crate::tui::widgets::input::InputBuffer;

use super::library::document_row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
}

pub struct FavoritesView {
    pub state: FavoritesViewState,
    selected: usize,
    mode: Mode,
    search: InputBuffer,
}

impl FavoritesView {
    pub fn new() -> Self {
        Self {
            state: FavoritesViewState::new(),
            selected: 0,
            mode: Mode::Browse,
            search: InputBuffer::new(),
        }
    }

    pub fn load(&mut self, services: &Services) {
        let generation = self.state.begin_load();
        let backend = services.backend.clone();
        let tx = services.event_tx.clone();
        tokio::spawn(async move {
            let result = backend.list_documents(&DocumentQuery::default()).await;
            let _ = tx.send(AppEvent::FavoritesLoaded { generation, result });
        });
    }

    pub fn on_loaded(&mut self, generation: u64, result: PortResult<Vec<Document>>) {
        self.state.finish_load(generation, result);
        self.selected = 0;
    }

    pub fn on_deleted(&mut self, document_id: i64) {
        self.state.apply_delete(document_id);
    }

    fn visible_len(&self, services: &Services) -> usize {
        self.state.visible(&services.favorites.ids()).len()
    }

    fn clamp_selection(&mut self, visible_len: usize) {
        if visible_len == 0 {
            self.selected = 0;
        } else if self.selected >= visible_len {
            self.selected = visible_len - 1;
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent, services: &Services) -> ViewResult {
        if self.mode == Mode::Search {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => {
                    self.mode = Mode::Browse;
                    self.state.search = self.search.value().trim().to_string();
                    let len = self.visible_len(services);
                    self.clamp_selection(len);
                }
                code => {
                    self.search.handle_key(code, key.modifiers);
                }
            }
            return ViewResult::Consumed;
        }

        let visible_len = self.visible_len(services);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + 1 < visible_len {
                    self.selected += 1;
                }
                ViewResult::Consumed
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                ViewResult::Consumed
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Search;
                ViewResult::Consumed
            }
            KeyCode::Char('r') => {
                self.load(services);
                ViewResult::Consumed
            }
            KeyCode::Char('x') => {
                let target = self
                    .state
                    .visible(&services.favorites.ids())
                    .get(self.selected)
                    .map(|doc| doc.id);
                if let Some(id) = target {
                    services.favorites.toggle(id);
                    let len = self.visible_len(services);
                    self.clamp_selection(len);
                }
                ViewResult::Consumed
            }
            KeyCode::Enter => {
                let target = self
                    .state
                    .visible(&services.favorites.ids())
                    .get(self.selected)
                    .map(|doc| doc.id);
                match target {
                    Some(id) => ViewResult::Goto(Route::Document(id)),
                    None => ViewResult::Consumed,
                }
            }
            _ => ViewResult::Ignored,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, services: &Services, palette: &Palette) {
        let rows = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

        let search = if self.mode == Mode::Search {
            format!("/{}█", self.search.value())
        } else if self.state.search.is_empty() {
            String::from("(no search)")
        } else {
            format!("/{}", self.state.search)
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("★ Favorites  ", palette.title()),
                Span::styled(search, palette.text()),
            ])),
            rows[0],
        );

        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(rows[1]);
        frame.render_widget(block, rows[1]);

        let visible = self.state.visible(&services.favorites.ids());
        if self.state.loading && visible.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::styled("Loading favorites…", palette.hint())),
                inner,
            );
        } else if visible.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::styled(
                    "No favorite documents yet. Mark one with x in the library.",
                    palette.hint(),
                )),
                inner,
            );
        } else {
            let height = inner.height as usize;
            let first = self.selected.saturating_sub(height.saturating_sub(1));
            let lines: Vec<Line> = visible
                .iter()
                .enumerate()
                .skip(first)
                .take(height)
                .map(|(index, &doc)| document_row(doc, index == self.selected, services, palette))
                .collect();
            frame.render_widget(Paragraph::new(lines), inner);
        }

        frame.render_widget(
            Paragraph::new(Line::styled(
                "enter open · / search · x unfavorite · r refresh",
                palette.hint(),
            )),
            rows[2],
        );
    }
}

impl Default for FavoritesView {
    fn default() -> Self {
        Self::new()
    }
}
