//! services/app/src/tui/views/login.rs
//!
//! Sign-in form. Submitting exchanges credentials through the session
//! store; outcome toasts come from the store itself.

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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Email,
    Password,
}

pub struct LoginView {
    email: InputBuffer,
    password: InputBuffer,
    focus: Field,
    submitting: bool,
}

impl LoginView {
    pub fn new() -> Self {
        Self {
            email: InputBuffer::new(),
            password: InputBuffer::masked(),
            focus: Field::Email,
            submitting: false,
        }
    }

    pub fn on_login_finished(&mut self, ok: bool) {
        self.submitting = false;
        if ok {
            self.password.clear();
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent, services: &Services) -> ViewResult {
        if self.submitting {
            return ViewResult::Consumed;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('r')) => return ViewResult::Goto(Route::Register),
            (_, KeyCode::Tab) | (_, KeyCode::Down) | (_, KeyCode::Up) => {
                self.focus = match self.focus {
                    Field::Email => Field::Password,
                    Field::Password => Field::Email,
                };
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
        };
        if field.handle_key(key.code, key.modifiers) {
            ViewResult::Consumed
        } else {
            ViewResult::Ignored
        }
    }

    fn submit(&mut self, services: &Services) {
        let email = self.email.value().trim().to_string();
        let password = self.password.value().to_string();
        if email.is_empty() || password.is_empty() {
            services.toasts.warning("Enter your email and password");
            return;
        }

        self.submitting = true;
        let session = services.session.clone();
        let tx = services.event_tx.clone();
        tokio::spawn(async move {
            let ok = session.login(&email, &password).await;
            let _ = tx.send(AppEvent::LoginFinished { ok });
        });
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let container = centered_box(area, 52, 13);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" DocLens — Sign in ", palette.title()));
        let inner = block.inner(container);
        frame.render_widget(block, container);

        let rows = Layout::vertical([
            Constraint::Length(1),
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

        let status = if self.submitting {
            Line::styled("Signing in…", palette.hint())
        } else {
            Line::styled("Enter sign in · Ctrl+R create account", palette.hint())
        };
        frame.render_widget(Paragraph::new(status), rows[4]);
    }
}

impl Default for LoginView {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn render_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    focused: bool,
    palette: &Palette,
) {
    let style = if focused {
        palette.title()
    } else {
        palette.hint()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(Span::styled(format!(" {label} "), style));
    let text = if focused {
        format!("{value}█")
    } else {
        value.to_string()
    };
    frame.render_widget(Paragraph::new(text).style(palette.text()).block(block), area);
}
