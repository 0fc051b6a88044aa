//! services/app/src/tui/views/library.rs
//!
//! The full document listing. Search, status filter, and sort are sent to
//! the server as query parameters; the response is displayed as-is. Delete
//! asks for confirmation and removes the card only after the server
//! confirms.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use doclens_core::domain::{Document, DocumentStatus, SortKey, StatusFilter};

use crate::state::library::LibraryState;
use crate::tui::events::{AppEvent, Route, ViewResult};
use crate::tui::services::Services;
use crate::tui::theme::Palette;
use crate::tui::widgets::input::InputBuffer;

use super::centered_box;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
}

pub struct LibraryView {
    pub state: LibraryState,
    selected: usize,
    mode: Mode,
    search: InputBuffer,
    /// Document awaiting delete confirmation.
    pending_delete: Option<i64>,
}

impl LibraryView {
    pub fn new() -> Self {
        Self {
            state: LibraryState::new(),
            selected: 0,
            mode: Mode::Browse,
            search: InputBuffer::new(),
            pending_delete: None,
        }
    }

    pub fn load(&mut self, services: &Services) {
        let generation = self.state.begin_load();
        let query = self.state.query.clone();
        let backend = services.backend.clone();
        let tx = services.event_tx.clone();
        tokio::spawn(async move {
            let result = backend.list_documents(&query).await;
            let _ = tx.send(AppEvent::LibraryLoaded { generation, result });
        });
    }

    pub fn on_loaded(
        &mut self,
        generation: u64,
        result: doclens_core::ports::PortResult<Vec<Document>>,
        services: &Services,
    ) {
        if let Some(error) = self.state.finish_load(generation, result) {
            services
                .toasts
                .error(format!("Could not load the library: {error}"));
        }
        self.clamp_selection();
    }

    pub fn on_deleted(&mut self, document_id: i64) {
        self.state.apply_delete(document_id);
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        if self.state.documents.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.state.documents.len() {
            self.selected = self.state.documents.len() - 1;
        }
    }

    fn selected_document(&self) -> Option<&Document> {
        self.state.documents.get(self.selected)
    }

    pub fn handle_input(&mut self, key: KeyEvent, services: &Services) -> ViewResult {
        // Delete confirmation has priority over everything else.
        if let Some(document_id) = self.pending_delete {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.pending_delete = None;
                    spawn_delete(services, document_id);
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.pending_delete = None;
                }
                _ => {}
            }
            return ViewResult::Consumed;
        }

        if self.mode == Mode::Search {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => {
                    self.mode = Mode::Browse;
                    let term = self.search.value().trim().to_string();
                    self.state.query.search = (!term.is_empty()).then_some(term);
                    self.load(services);
                }
                code => {
                    self.search.handle_key(code, key.modifiers);
                }
            }
            return ViewResult::Consumed;
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + 1 < self.state.documents.len() {
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
            KeyCode::Char('f') => {
                self.state.query.status = next_status_filter(self.state.query.status);
                self.load(services);
                ViewResult::Consumed
            }
            KeyCode::Char('s') => {
                self.state.query.sort_by = match self.state.query.sort_by {
                    SortKey::CreatedAt => SortKey::Title,
                    SortKey::Title => SortKey::CreatedAt,
                };
                self.load(services);
                ViewResult::Consumed
            }
            KeyCode::Char('o') => {
                self.state.query.order = self.state.query.order.flipped();
                self.load(services);
                ViewResult::Consumed
            }
            KeyCode::Char('r') => {
                self.load(services);
                ViewResult::Consumed
            }
            KeyCode::Char('x') => {
                if let Some(doc) = self.selected_document() {
                    services.favorites.toggle(doc.id);
                }
                ViewResult::Consumed
            }
            KeyCode::Char('d') => {
                self.pending_delete = self.selected_document().map(|doc| doc.id);
                ViewResult::Consumed
            }
            KeyCode::Enter => match self.selected_document() {
                Some(doc) => ViewResult::Goto(Route::Document(doc.id)),
                None => ViewResult::Consumed,
            },
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

        self.render_header(frame, rows[0], palette);
        self.render_list(frame, rows[1], services, palette);
        frame.render_widget(
            Paragraph::new(Line::styled(
                "enter open · / search · f status · s sort · o order · x favorite · d delete · r refresh",
                palette.hint(),
            )),
            rows[2],
        );

        if let Some(document_id) = self.pending_delete {
            let title = self
                .state
                .documents
                .iter()
                .find(|doc| doc.id == document_id)
                .map(|doc| doc.title.clone())
                .unwrap_or_default();
            let container = centered_box(area, 50, 5);
            frame.render_widget(Clear, container);
            let block = Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" Delete document ", palette.title()));
            let inner = block.inner(container);
            frame.render_widget(block, container);
            frame.render_widget(
                Paragraph::new(vec![
                    Line::styled(format!("Delete \"{title}\"?"), palette.text()),
                    Line::default(),
                    Line::styled("y confirm · n cancel", palette.hint()),
                ]),
                inner,
            );
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let search = if self.mode == Mode::Search {
            format!("/{}█", self.search.value())
        } else {
            match &self.state.query.search {
                Some(term) => format!("/{term}"),
                None => String::from("(no search)"),
            }
        };
        let status = match self.state.query.status {
            StatusFilter::All => "all".to_string(),
            StatusFilter::Only(status) => status.label().to_string(),
        };
        let line = Line::from(vec![
            Span::styled("Library  ", palette.title()),
            Span::styled(search, palette.text()),
            Span::styled(
                format!(
                    "  status:{status}  sort:{}/{}",
                    self.state.query.sort_by.as_param(),
                    self.state.query.order.as_param()
                ),
                palette.hint(),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_list(&self, frame: &mut Frame, area: Rect, services: &Services, palette: &Palette) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.state.loading && self.state.documents.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::styled("Loading library…", palette.hint())),
                inner,
            );
            return;
        }
        if self.state.documents.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::styled("No documents found.", palette.hint())),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        let first = self.selected.saturating_sub(height.saturating_sub(1));
        let lines: Vec<Line> = self
            .state
            .documents
            .iter()
            .enumerate()
            .skip(first)
            .take(height)
            .map(|(index, doc)| document_row(doc, index == self.selected, services, palette))
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Default for LibraryView {
    fn default() -> Self {
        Self::new()
    }
}

fn next_status_filter(current: StatusFilter) -> StatusFilter {
    match current {
        StatusFilter::All => StatusFilter::Only(DocumentStatus::Uploaded),
        StatusFilter::Only(DocumentStatus::Uploaded) => {
            StatusFilter::Only(DocumentStatus::Processing)
        }
        StatusFilter::Only(DocumentStatus::Processing) => {
            StatusFilter::Only(DocumentStatus::Completed)
        }
        StatusFilter::Only(DocumentStatus::Completed) => StatusFilter::Only(DocumentStatus::Error),
        StatusFilter::Only(DocumentStatus::Error) => StatusFilter::All,
    }
}

fn spawn_delete(services: &Services, document_id: i64) {
    let backend = services.backend.clone();
    let tx = services.event_tx.clone();
    tokio::spawn(async move {
        let result = backend.delete_document(document_id).await;
        let _ = tx.send(AppEvent::DocumentDeleted {
            document_id,
            result,
        });
    });
}

pub(super) fn document_row<'a>(
    doc: &'a Document,
    selected: bool,
    services: &Services,
    palette: &Palette,
) -> Line<'a> {
    let marker = if services.favorites.is_favorite(doc.id) {
        "★ "
    } else {
        "  "
    };
    let pages = doc
        .page_count
        .map(|count| format!("{count} pages"))
        .unwrap_or_default();
    let mut line = Line::from(vec![
        Span::styled(marker, ratatui::style::Style::default().fg(palette.warning)),
        Span::styled(format!("{:<40}", truncate(&doc.title, 38)), palette.text()),
        Span::styled(
            format!("{:<12}", doc.status.label()),
            ratatui::style::Style::default().fg(palette.status_color(doc.status)),
        ),
        Span::styled(
            format!("{:<12}", doc.created_at.format("%Y-%m-%d")),
            palette.hint(),
        ),
        Span::styled(pages, palette.hint()),
    ]);
    if selected {
        line = line.style(palette.selected());
    }
    line
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
