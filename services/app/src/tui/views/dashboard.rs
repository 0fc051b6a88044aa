//! services/app/src/tui/views/dashboard.rs
//!
//! Account statistics plus the upload modal. Stats are a non-critical read:
//! a failed fetch degrades to placeholders, no user-facing error.

use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use doclens_core::domain::{upload_content_type, UserStats};
use doclens_core::ports::{PortError, PortResult};

use crate::tui::events::{AppEvent, ViewResult};
use crate::tui::services::Services;
use crate::tui::theme::Palette;
use crate::tui::widgets::input::InputBuffer;

use super::centered_box;

struct UploadModal {
    path: InputBuffer,
    uploading: bool,
    /// Client-side validation failure, shown inline in the modal.
    error: Option<String>,
}

pub struct DashboardView {
    stats: Option<UserStats>,
    loading: bool,
    upload: Option<UploadModal>,
}

impl DashboardView {
    pub fn new() -> Self {
        Self {
            stats: None,
            loading: false,
            upload: None,
        }
    }

    /// Kicks off the stats fetch for this visit.
    pub fn load(&mut self, services: &Services) {
        self.loading = true;
        let backend = services.backend.clone();
        let tx = services.event_tx.clone();
        tokio::spawn(async move {
            let result = backend.user_stats().await;
            let _ = tx.send(AppEvent::StatsLoaded { result });
        });
    }

    pub fn on_stats_loaded(&mut self, result: PortResult<UserStats>) {
        self.loading = false;
        // Degrade silently on failure; the placeholders stay.
        if let Ok(stats) = result {
            self.stats = Some(stats);
        }
    }

    pub fn on_upload_finished(&mut self, result: &PortResult<doclens_core::domain::Document>) {
        if let Some(modal) = &mut self.upload {
            modal.uploading = false;
        }
        if result.is_ok() {
            self.upload = None;
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent, services: &Services) -> ViewResult {
        if let Some(modal) = &mut self.upload {
            if modal.uploading {
                return ViewResult::Consumed;
            }
            match key.code {
                KeyCode::Esc => {
                    self.upload = None;
                }
                KeyCode::Enter => self.submit_upload(services),
                code => {
                    if modal.path.handle_key(code, key.modifiers) {
                        modal.error = None;
                    }
                }
            }
            return ViewResult::Consumed;
        }

        match key.code {
            KeyCode::Char('u') => {
                self.upload = Some(UploadModal {
                    path: InputBuffer::new(),
                    uploading: false,
                    error: None,
                });
                ViewResult::Consumed
            }
            KeyCode::Char('r') => {
                self.load(services);
                ViewResult::Consumed
            }
            _ => ViewResult::Ignored,
        }
    }

    fn submit_upload(&mut self, services: &Services) {
        let Some(modal) = &mut self.upload else {
            return;
        };
        let raw = modal.path.value().trim().to_string();
        if raw.is_empty() {
            modal.error = Some("Enter a file path".to_string());
            return;
        }

        let filename = Path::new(&raw)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        // Validated by declared content type before the upload is attempted.
        let Some(content_type) = upload_content_type(&filename) else {
            modal.error = Some("Unsupported file type. Use PDF, DOCX, TXT or EPUB.".to_string());
            return;
        };

        modal.uploading = true;
        modal.error = None;
        let backend = services.backend.clone();
        let tx = services.event_tx.clone();
        tokio::spawn(async move {
            let result = match tokio::fs::read(&raw).await {
                Ok(data) => backend.upload_document(&filename, content_type, data).await,
                Err(error) => Err(PortError::Unexpected(format!("cannot read {raw}: {error}"))),
            };
            let _ = tx.send(AppEvent::UploadFinished { result });
        });
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let rows = Layout::vertical([
            Constraint::Length(5),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_tiles(frame, rows[0], palette);
        self.render_activity(frame, rows[1], palette);
        frame.render_widget(
            Paragraph::new(Line::styled(
                "u upload document · r refresh",
                palette.hint(),
            )),
            rows[2],
        );

        if let Some(modal) = &self.upload {
            self.render_upload_modal(frame, area, modal, palette);
        }
    }

    fn render_tiles(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let tiles = Layout::horizontal([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(area);

        let (documents, processed, pages, storage) = match &self.stats {
            Some(stats) => (
                stats.total_documents.to_string(),
                stats.processed_documents.to_string(),
                stats.total_pages.to_string(),
                format!("{:.1} MB", stats.storage_used_mb),
            ),
            None if self.loading => ("…".into(), "…".into(), "…".into(), "…".into()),
            None => ("—".into(), "—".into(), "—".into(), "—".into()),
        };

        for (rect, (label, value)) in tiles.iter().zip([
            ("Documents", documents),
            ("Processed", processed),
            ("Pages", pages),
            ("Storage", storage),
        ]) {
            let block = Block::default().borders(Borders::ALL).title(label);
            let inner = block.inner(*rect);
            frame.render_widget(block, *rect);
            frame.render_widget(
                Paragraph::new(Line::styled(value, palette.title())),
                inner,
            );
        }
    }

    fn render_activity(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let block = Block::default().borders(Borders::ALL).title("Recent activity");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines: Vec<Line> = match &self.stats {
            Some(stats) if !stats.activity_history.is_empty() => stats
                .activity_history
                .iter()
                .map(|day| {
                    let bar = "▇".repeat(day.count.min(40) as usize);
                    Line::from(vec![
                        Span::styled(format!("{:<12}", day.date), palette.hint()),
                        Span::styled(bar, ratatui::style::Style::default().fg(palette.accent)),
                        Span::styled(format!(" {}", day.count), palette.text()),
                    ])
                })
                .collect(),
            _ => vec![Line::styled("No recent activity to show.", palette.hint())],
        };
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_upload_modal(
        &self,
        frame: &mut Frame,
        area: Rect,
        modal: &UploadModal,
        palette: &Palette,
    ) {
        let container = centered_box(area, 64, 8);
        frame.render_widget(Clear, container);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" Upload document ", palette.title()));
        let inner = block.inner(container);
        frame.render_widget(block, container);

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

        frame.render_widget(
            Paragraph::new(Line::styled(
                "Path to a PDF, DOCX, TXT or EPUB file:",
                palette.text(),
            )),
            rows[0],
        );
        frame.render_widget(
            Paragraph::new(format!("{}█", modal.path.display())).style(palette.title()),
            rows[1],
        );
        if let Some(error) = &modal.error {
            frame.render_widget(
                Paragraph::new(Line::styled(
                    error.clone(),
                    ratatui::style::Style::default().fg(palette.error),
                )),
                rows[3],
            );
        }
        let status = if modal.uploading {
            "Uploading…"
        } else {
            "Enter upload · Esc cancel"
        };
        frame.render_widget(Paragraph::new(Line::styled(status, palette.hint())), rows[4]);
    }
}

impl Default for DashboardView {
    fn default() -> Self {
        Self::new()
    }
}
