//! services/app/src/tui/views/detail.rs
//!
//! Single-document page: header with metadata, the AI chat, and the
//! generated summary/glossary/quiz side panel. Entering starts the detail
//! fetch and history load; while the document is processing the status poll
//! runs until it leaves that state or the view is left.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use tokio_util::sync::CancellationToken;

use doclens_core::domain::{
    ChatMessage, ChatReply, Document, DocumentStatus, ExportFormat, GlossaryTerm, MessageRole,
    QuizQuestion,
};
use doclens_core::ports::{PortError, PortResult};

use crate::state::chat::{export_file_name, ChatSession};
use crate::state::detail::{spawn_status_poll, DetailState, PollOutcome, PollUpdate};
use crate::state::glossary::GlossaryState;
use crate::state::quiz::{QuizPhase, QuizState};
use crate::tui::events::{AppEvent, Route, ViewResult};
use crate::tui::services::Services;
use crate::tui::theme::Palette;
use crate::tui::widgets::input::InputBuffer;

use super::{centered_box, wrap_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Chat,
    Glossary,
    Quiz,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Chat => Pane::Glossary,
            Pane::Glossary => Pane::Quiz,
            Pane::Quiz => Pane::Chat,
        }
    }
}

pub struct DetailView {
    pub detail: DetailState,
    chat: ChatSession,
    glossary: GlossaryState,
    quiz: QuizState,
    pane: Pane,
    input: InputBuffer,
    /// Lines scrolled up from the transcript tail.
    chat_scroll: usize,
    export_menu: bool,
    export_selected: usize,
}

impl DetailView {
    pub fn new() -> Self {
        Self {
            detail: DetailState::new(),
            chat: ChatSession::new(0),
            glossary: GlossaryState::new(),
            quiz: QuizState::new(),
            pane: Pane::Chat,
            input: InputBuffer::new(),
            chat_scroll: 0,
            export_menu: false,
            export_selected: 0,
        }
    }

    /// Starts a visit: resets per-document state, fetches the document and
    /// its chat history.
    pub fn enter(&mut self, document_id: i64, services: &Services) {
        let generation = self.detail.enter();
        self.chat = ChatSession::new(document_id);
        self.glossary = GlossaryState::new();
        self.quiz = QuizState::new();
        self.pane = Pane::Chat;
        self.input.clear();
        self.chat_scroll = 0;
        self.export_menu = false;
        self.export_selected = 0;

        let backend = services.backend.clone();
        let tx = services.event_tx.clone();
        tokio::spawn(async move {
            let result = backend.get_document(document_id).await;
            let _ = tx.send(AppEvent::DetailFetched { generation, result });
        });

        let backend = services.backend.clone();
        let tx = services.event_tx.clone();
        tokio::spawn(async move {
            let result = backend.chat_history(document_id).await;
            let _ = tx.send(AppEvent::HistoryLoaded {
                document_id,
                result,
            });
        });
    }

    /// Tears the visit down; the poll interval is cancelled here, not
    /// abandoned.
    pub fn leave(&mut self) {
        self.detail.leave();
    }

    pub fn document_id(&self) -> i64 {
        self.chat.document_id()
    }

    // ── Completion handlers (already route-guarded by the shell) ─────────

    pub fn on_detail_fetched(
        &mut self,
        generation: u64,
        result: PortResult<Document>,
        services: &Services,
    ) {
        match result {
            Ok(document) => {
                if self.detail.apply_fetch(generation, document) {
                    self.ensure_polling(services);
                }
            }
            Err(error) => {
                if self.detail.is_current(generation) {
                    self.detail.loading = false;
                    if !matches!(error, PortError::NotFound(_)) {
                        services
                            .toasts
                            .error(format!("Could not load the document: {error}"));
                    }
                }
            }
        }
    }

    pub fn on_poll(&mut self, update: PollUpdate, services: &Services) {
        match update.outcome {
            PollOutcome::Updated(document) => {
                let finished = document.status != DocumentStatus::Processing;
                let applied = self.detail.apply_fetch(update.generation, document);
                if applied && finished {
                    self.detail.stop_polling();
                }
            }
            PollOutcome::Failed(error) => {
                tracing::warn!("status poll failed: {error}");
            }
            PollOutcome::GaveUp => {
                if self.detail.is_current(update.generation) {
                    self.detail.stop_polling();
                    services
                        .toasts
                        .warning("The document is taking longer than expected to process.");
                }
            }
        }
    }

    pub fn on_history_loaded(&mut self, result: PortResult<Vec<ChatMessage>>) {
        self.chat.apply_history(result);
    }

    pub fn on_chat_completed(&mut self, seq: u64, result: PortResult<ChatReply>) {
        self.chat.finish_send(seq, result);
        self.chat_scroll = 0;
    }

    pub fn on_glossary_ready(&mut self, result: PortResult<Vec<GlossaryTerm>>) {
        self.glossary.finish(result);
    }

    pub fn on_quiz_ready(&mut self, result: PortResult<Vec<QuizQuestion>>) {
        self.quiz.finish(result);
    }

    /// Spawns the status poll when the displayed document is processing and
    /// no poll is running yet.
    fn ensure_polling(&mut self, services: &Services) {
        if !self.detail.needs_polling() {
            return;
        }
        let token = CancellationToken::new();
        self.detail.attach_poll(token.clone());
        let tx = services.event_tx.clone();
        let _ = spawn_status_poll(
            services.backend.clone(),
            self.document_id(),
            self.detail.generation(),
            services.config.poll_interval,
            token,
            move |update| {
                let _ = tx.send(AppEvent::Poll(update));
            },
        );
    }

    // ── Input ────────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, key: KeyEvent, services: &Services) -> ViewResult {
        if self.export_menu {
            self.handle_export_menu(key, services);
            return ViewResult::Consumed;
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => return ViewResult::Goto(Route::Library),
            (_, KeyCode::Tab) => {
                self.pane = self.pane.next();
                return ViewResult::Consumed;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('e')) => {
                self.export_menu = true;
                self.export_selected = 0;
                return ViewResult::Consumed;
            }
            _ => {}
        }

        match self.pane {
            Pane::Chat => self.handle_chat_input(key, services),
            Pane::Glossary => self.handle_glossary_input(key, services),
            Pane::Quiz => self.handle_quiz_input(key, services),
        }
    }

    fn handle_chat_input(&mut self, key: KeyEvent, services: &Services) -> ViewResult {
        match key.code {
            KeyCode::PageUp => {
                self.chat_scroll = self.chat_scroll.saturating_add(5);
                ViewResult::Consumed
            }
            KeyCode::PageDown => {
                self.chat_scroll = self.chat_scroll.saturating_sub(5);
                ViewResult::Consumed
            }
            KeyCode::Enter => {
                self.send_message(services);
                ViewResult::Consumed
            }
            code => {
                // Input stays disabled while a reply is pending; swallow
                // typed characters so they don't trigger global keys.
                if self.chat.waiting() {
                    return if matches!(code, KeyCode::Char(_)) {
                        ViewResult::Consumed
                    } else {
                        ViewResult::Ignored
                    };
                }
                if self.input.handle_key(code, key.modifiers) {
                    ViewResult::Consumed
                } else {
                    ViewResult::Ignored
                }
            }
        }
    }

    fn send_message(&mut self, services: &Services) {
        if self.chat.waiting() || self.chat.history_loading {
            return;
        }
        let text = self.input.value().trim().to_string();
        if text.is_empty() {
            return;
        }

        // Optimistic append: the message shows up immediately and the input
        // clears; the reply lands via ChatCompleted.
        let seq = self.chat.begin_send(&text);
        self.input.clear();
        self.chat_scroll = 0;

        let document_id = self.document_id();
        let backend = services.backend.clone();
        let tx = services.event_tx.clone();
        tokio::spawn(async move {
            let result = backend.send_chat(document_id, &text).await;
            let _ = tx.send(AppEvent::ChatCompleted {
                document_id,
                seq,
                result,
            });
        });
    }

    fn handle_glossary_input(&mut self, key: KeyEvent, services: &Services) -> ViewResult {
        match key.code {
            KeyCode::Char('g') | KeyCode::Enter => {
                if self.glossary.begin() {
                    let document_id = self.document_id();
                    let backend = services.backend.clone();
                    let tx = services.event_tx.clone();
                    tokio::spawn(async move {
                        let result = backend.generate_glossary(document_id).await;
                        let _ = tx.send(AppEvent::GlossaryReady {
                            document_id,
                            result,
                        });
                    });
                }
                ViewResult::Consumed
            }
            _ => ViewResult::Ignored,
        }
    }

    fn handle_quiz_input(&mut self, key: KeyEvent, services: &Services) -> ViewResult {
        match key.code {
            KeyCode::Enter => {
                if matches!(self.quiz.phase(), QuizPhase::Intro { .. }) {
                    if self.quiz.begin() {
                        let document_id = self.document_id();
                        let backend = services.backend.clone();
                        let tx = services.event_tx.clone();
                        tokio::spawn(async move {
                            let result = backend.generate_quiz(document_id).await;
                            let _ = tx.send(AppEvent::QuizReady {
                                document_id,
                                result,
                            });
                        });
                    }
                } else if matches!(self.quiz.phase(), QuizPhase::Active { .. }) {
                    self.quiz.advance();
                }
                ViewResult::Consumed
            }
            KeyCode::Char(c @ '1'..='9') => {
                let option = c as usize - '1' as usize;
                self.quiz.select_answer(option);
                ViewResult::Consumed
            }
            KeyCode::Char('r') => {
                self.quiz.reset();
                ViewResult::Consumed
            }
            _ => ViewResult::Ignored,
        }
    }

    fn handle_export_menu(&mut self, key: KeyEvent, services: &Services) {
        match key.code {
            KeyCode::Esc => self.export_menu = false,
            KeyCode::Char('j') | KeyCode::Down => {
                self.export_selected = (self.export_selected + 1) % ExportFormat::ALL.len();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.export_selected = (self.export_selected + ExportFormat::ALL.len() - 1)
                    % ExportFormat::ALL.len();
            }
            KeyCode::Enter => {
                let format = ExportFormat::ALL[self.export_selected];
                self.export_menu = false;
                self.spawn_export(format, services);
            }
            _ => {}
        }
    }

    fn spawn_export(&self, format: ExportFormat, services: &Services) {
        let document_id = self.document_id();
        let backend = services.backend.clone();
        let export_dir = services.config.export_dir.clone();
        let tx = services.event_tx.clone();
        tokio::spawn(async move {
            let result = async {
                let payload = backend.export_chat(document_id, format).await?;
                tokio::fs::create_dir_all(&export_dir).await.map_err(|e| {
                    PortError::Unexpected(format!("cannot create export dir: {e}"))
                })?;
                let path = export_dir.join(export_file_name(document_id, format));
                tokio::fs::write(&path, &payload)
                    .await
                    .map_err(|e| PortError::Unexpected(format!("cannot write export: {e}")))?;
                Ok(path)
            }
            .await;
            let _ = tx.send(AppEvent::ExportFinished {
                document_id,
                result,
            });
        });
    }

    // ── Render ───────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        if self.detail.loading && self.detail.document.is_none() {
            frame.render_widget(
                Paragraph::new(Line::styled("Loading document…", palette.hint())),
                area,
            );
            return;
        }
        let Some(document) = self.detail.document.clone() else {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::styled("Document not found.", palette.text()),
                    Line::styled("Esc back to library", palette.hint()),
                ]),
                area,
            );
            return;
        };

        let rows = Layout::vertical([
            Constraint::Length(4),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_header(frame, rows[0], &document, palette);

        let panes = Layout::horizontal([Constraint::Percentage(58), Constraint::Percentage(42)])
            .split(rows[1]);
        self.render_chat(frame, panes[0], palette);
        match self.pane {
            Pane::Glossary => self.render_glossary(frame, panes[1], palette),
            Pane::Quiz => self.render_quiz(frame, panes[1], palette),
            Pane::Chat => self.render_summary(frame, panes[1], &document, palette),
        }

        frame.render_widget(
            Paragraph::new(Line::styled(
                "tab switch pane · Ctrl+E export chat · Esc back",
                palette.hint(),
            )),
            rows[2],
        );

        if self.export_menu {
            self.render_export_menu(frame, area, palette);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, document: &Document, palette: &Palette) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut meta = vec![
            Span::styled(
                document.created_at.format("%Y-%m-%d").to_string(),
                palette.hint(),
            ),
            Span::raw("  "),
            Span::styled(
                document.status.label(),
                Style::default().fg(palette.status_color(document.status)),
            ),
        ];
        if let Some(pages) = document.page_count {
            meta.push(Span::styled(format!("  {pages} pages"), palette.hint()));
        }
        if let Some(author) = &document.author {
            meta.push(Span::styled(format!("  by {author}"), palette.hint()));
        }
        if self.detail.is_polling() {
            meta.push(Span::styled("  ⟳ refreshing", palette.hint()));
        }

        frame.render_widget(
            Paragraph::new(vec![
                Line::styled(document.title.clone(), palette.title()),
                Line::from(meta),
            ]),
            inner,
        );
    }

    fn render_summary(
        &self,
        frame: &mut Frame,
        area: Rect,
        document: &Document,
        palette: &Palette,
    ) {
        let block = Block::default().borders(Borders::ALL).title("Summary");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let text = if document.status == DocumentStatus::Processing {
            "Generating the summary…".to_string()
        } else {
            document
                .summary_short
                .clone()
                .unwrap_or_else(|| "No summary available.".to_string())
        };
        let lines: Vec<Line> = wrap_text(&text, inner.width.saturating_sub(1) as usize)
            .into_iter()
            .map(|line| Line::styled(line, palette.text()))
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_chat(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let focused = self.pane == Pane::Chat;
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if focused { palette.title() } else { palette.hint() })
            .title("Chat");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let parts =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).split(inner);
        let transcript = parts[0];
        let width = transcript.width.saturating_sub(2) as usize;

        let mut lines: Vec<Line> = Vec::new();
        if self.chat.history_loading {
            lines.push(Line::styled("Loading conversation…", palette.hint()));
        } else {
            for message in &self.chat.messages {
                let (label, style) = match message.role {
                    MessageRole::User => ("you", Style::default().fg(palette.accent)),
                    MessageRole::Ai => ("assistant", Style::default().fg(palette.success)),
                };
                lines.push(Line::styled(format!("{label}:"), style));
                for wrapped in wrap_text(&message.content, width) {
                    lines.push(Line::styled(format!("  {wrapped}"), palette.text()));
                }
                if !message.sources.is_empty() {
                    let pages: Vec<String> = message
                        .sources
                        .iter()
                        .map(|source| format!("p.{}", source.page))
                        .collect();
                    lines.push(Line::styled(
                        format!("  sources: {}", pages.join(", ")),
                        palette.hint(),
                    ));
                }
            }
            if self.chat.waiting() {
                lines.push(Line::styled("assistant is typing…", palette.hint()));
            }
        }

        let height = transcript.height as usize;
        let bottom = lines.len().saturating_sub(self.chat_scroll);
        let first = bottom.saturating_sub(height);
        let window: Vec<Line> = lines[first..bottom].to_vec();
        frame.render_widget(Paragraph::new(window), transcript);

        let prompt = if self.chat.waiting() {
            Line::styled("… waiting for the assistant", palette.hint())
        } else {
            Line::from(vec![
                Span::styled("> ", palette.title()),
                Span::styled(format!("{}█", self.input.display()), palette.text()),
            ])
        };
        frame.render_widget(Paragraph::new(prompt), parts[1]);
    }

    fn render_glossary(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(palette.title())
            .title("Glossary");
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let width = inner.width.saturating_sub(2) as usize;

        let lines: Vec<Line> = match &self.glossary {
            GlossaryState::Idle => vec![
                Line::styled(
                    "Extract the key terms and concepts of this document.",
                    palette.text(),
                ),
                Line::default(),
                Line::styled("g generate glossary", palette.hint()),
            ],
            GlossaryState::Loading => {
                vec![Line::styled("Analyzing the document…", palette.hint())]
            }
            GlossaryState::Failed(message) => vec![
                Line::styled(message.clone(), Style::default().fg(palette.error)),
                Line::default(),
                Line::styled("g try again", palette.hint()),
            ],
            GlossaryState::Loaded(terms) => {
                let mut lines = Vec::new();
                for term in terms {
                    lines.push(Line::styled(term.term.clone(), palette.title()));
                    for wrapped in wrap_text(&term.definition, width) {
                        lines.push(Line::styled(format!("  {wrapped}"), palette.text()));
                    }
                }
                lines
            }
        };
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_quiz(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(palette.title())
            .title("Quiz");
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let width = inner.width.saturating_sub(4) as usize;

        let lines: Vec<Line> = match self.quiz.phase() {
            QuizPhase::Intro { error } => {
                let mut lines = vec![
                    Line::styled("Test yourself on this document.", palette.text()),
                    Line::default(),
                ];
                if let Some(error) = error {
                    lines.push(Line::styled(
                        error.clone(),
                        Style::default().fg(palette.error),
                    ));
                    lines.push(Line::default());
                }
                lines.push(Line::styled("enter start quiz", palette.hint()));
                lines
            }
            QuizPhase::Loading => vec![
                Line::styled("Preparing your quiz…", palette.hint()),
                Line::styled("Reading the document and drafting questions.", palette.hint()),
            ],
            QuizPhase::Active {
                questions,
                current,
                answers,
            } => {
                let question = &questions[*current];
                let mut lines = vec![Line::styled(
                    format!("Question {} of {}", current + 1, questions.len()),
                    palette.hint(),
                )];
                for wrapped in wrap_text(&question.question, width) {
                    lines.push(Line::styled(wrapped, palette.title()));
                }
                lines.push(Line::default());
                for (index, option) in question.options.iter().enumerate() {
                    let picked = answers.get(current) == Some(&index);
                    let marker = if picked { "●" } else { "○" };
                    let style = if picked {
                        Style::default().fg(palette.accent)
                    } else {
                        palette.text()
                    };
                    lines.push(Line::styled(
                        format!("{marker} {}. {option}", index + 1),
                        style,
                    ));
                }
                lines.push(Line::default());
                let hint = if answers.contains_key(current) {
                    if *current + 1 == questions.len() {
                        "enter finish"
                    } else {
                        "enter next question"
                    }
                } else {
                    "1-9 pick an answer"
                };
                lines.push(Line::styled(hint, palette.hint()));
                lines
            }
            QuizPhase::Results {
                questions,
                answers,
                score,
            } => {
                let percentage = self.quiz.percentage().unwrap_or(0);
                let mut lines = vec![
                    Line::styled(
                        format!("{percentage}% — {score} of {} correct", questions.len()),
                        palette.title(),
                    ),
                    Line::default(),
                ];
                for (index, question) in questions.iter().enumerate() {
                    let picked = answers.get(&index).copied();
                    let correct = picked == Some(question.correct_answer);
                    let marker = if correct { "✓" } else { "✗" };
                    let style = if correct {
                        Style::default().fg(palette.success)
                    } else {
                        Style::default().fg(palette.error)
                    };
                    lines.push(Line::styled(
                        format!("{marker} {}", question.question),
                        style,
                    ));
                    if !correct {
                        let answer = question
                            .options
                            .get(question.correct_answer)
                            .map(String::as_str)
                            .unwrap_or("—");
                        lines.push(Line::styled(
                            format!("  correct: {answer}"),
                            palette.text(),
                        ));
                    }
                    for wrapped in wrap_text(&question.explanation, width) {
                        lines.push(Line::styled(format!("  {wrapped}"), palette.hint()));
                    }
                }
                lines.push(Line::default());
                lines.push(Line::styled("r try a fresh quiz", palette.hint()));
                lines
            }
        };
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_export_menu(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let container = centered_box(area, 36, ExportFormat::ALL.len() as u16 + 4);
        frame.render_widget(Clear, container);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" Export chat ", palette.title()));
        let inner = block.inner(container);
        frame.render_widget(block, container);

        let mut lines = Vec::new();
        for (index, format) in ExportFormat::ALL.iter().enumerate() {
            let selected = index == self.export_selected;
            let marker = if selected { "▸" } else { " " };
            let mut line = Line::styled(
                format!("{marker} {} (.{})", format.label(), format.extension()),
                palette.text(),
            );
            if selected {
                line = line.style(palette.selected());
            }
            lines.push(line);
        }
        lines.push(Line::default());
        lines.push(Line::styled("enter export · esc cancel", palette.hint()));
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Default for DetailView {
    fn default() -> Self {
        Self::new()
    }
}
