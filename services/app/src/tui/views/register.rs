//! services/app/src/tui/views/register.rs
//!
//! Account creation form. Password confirmation and minimum length are
//! validated client-side; no request is issued until they pass.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::tui::events::{AppEvent, Route, ViewResult};
use crate::tui::services::Services;
use crate::tui::theme::Palette;
use crate::tui::widgets::input::InputBuffer;

use super::centered_box;
use super::login::render_field;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Email,
    Password,
    Confirm,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Email => Field::Password,
            Field::Password => Field::Confirm,
            Field::Confirm => Field::Email,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Email => Field::Confirm,
            Field::Password => Field::Email,
            Field::Confirm => Field::Password,
        }
    }
}

pub struct RegisterView {
    email: InputBuffer,
    password: InputBuffer,
    confirm: InputBuffer,
    focus: Field,
    submitting: bool,
    /// Client-side validation failure, shown inline.
    error: Option<String>,
}

impl RegisterView {
    pub fn new() -> Self {
        Self {
            email: InputBuffer::new(),
            password: InputBuffer::masked(),
            confirm: InputBuffer::masked(),
            focus: Field::Email,
            submitting: false,
            error: None,
        }
    }

    pub fn on_register_finished(&mut self, ok: bool) {
        self.submitting = false;
        if ok {
            self.password.clear();
            self.confirm.clear();
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent, services: &Services) -> ViewResult {
        if self.submitting {
            return ViewResult::Consumed;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('l')) => return ViewResult::Goto(Route::Login),
            (_, KeyCode::Esc) => return ViewResult::Goto(Route::Login),
            (_, KeyCode::Tab) | (_, KeyCode::Down) => {
                self.focus = self.focus.next();
                return ViewResult::Consumed;
            }
            (_, KeyCode::BackTab) | (_, KeyCode::Up) => {
                self.focus = self.focus.prev();
                return ViewResult::Consumed;
            }
            (_, KeyCode::Enter) => {
                self.submit(services);
                return ViewResult::Consumed;
            }
            _ => {}
        }

        let field = match self.focus {
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::Confirm => &mut self.confirm,
        };
        if field.handle_key(key.code, key.modifiers) {
            self.error = None;
            ViewResult::Consumed
        } else {
            ViewResult::Ignored
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.email.value().trim().is_empty() {
            return Err("Enter your email address".to_string());
        }
        if self.password.value() != self.confirm.value() {
            return Err("Passwords do not match".to_string());
        }
        if self.password.value().chars().count() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ));
        }
        Ok(())
    }

    fn submit(&mut self, services: &Services) {
        if let Err(message) = self.validate() {
            // Caught before any request is issued.
            self.error = Some(message);
            return;
        }

        self.submitting = true;
        self.error = None;
        let email = self.email.value().trim().to_string();
        let password = self.password.value().to_string();
        let session = services.session.clone();
        let tx = services.event_tx.clone();
        tokio::spawn(async move {
            let ok = session.register(&email, &password).await;
            let _ = tx.send(AppEvent::RegisterFinished { ok });
        });
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let container = centered_box(area, 52, 17);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" DocLens — Create account ", palette.title()));
        let inner = block.inner(container);
        frame.render_widget(block, container);

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

        render_field(
            frame,
            rows[1],
            "Email",
            &self.email.display(),
            self.focus == Field::Email,
            palette,
        );
        render_field(
            frame,
            rows[2],
            "Password",
            &self.password.display(),
            self.focus == Field::Password,
            palette,
        );
        render_field(
            frame,
            rows[3],
            "Confirm password",
            &self.confirm.display(),
            self.focus == Field::Confirm,
            palette,
        );

        if let Some(error) = &self.error {
            frame.render_widget(
                Paragraph::new(Line::styled(
                    error.clone(),
                    ratatui::style::Style::default().fg(palette.error),
                )),
                rows[4],
            );
        }

        let status = if self.submitting {
            Line::styled("Creating account…", palette.hint())
        } else {
            Line::styled("Enter create account · Esc back to sign in", palette.hint())
        };
        frame.render_widget(Paragraph::new(status), rows[5]);
    }
}

impl Default for RegisterView {
    fn default() -> Self {
        Self::new()
    }
}
