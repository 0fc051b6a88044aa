//! services/app/src/tui/views/settings.rs
//!
//! Account and appearance preferences. The draft is saved to the local
//! profile store only; the theme applies on the next frame.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::state::settings::SettingsDraft;
use crate::tui::events::ViewResult;
use crate::tui::services::Services;
use crate::tui::theme::Palette;
use crate::tui::widgets::input::InputBuffer;

const ROWS: usize = 6;

pub struct SettingsView {
    draft: SettingsDraft,
    name: InputBuffer,
    email: InputBuffer,
    selected: usize,
    editing: bool,
}

impl SettingsView {
    pub fn new() -> Self {
        Self {
            draft: SettingsDraft::default(),
            name: InputBuffer::new(),
            email: InputBuffer::new(),
            selected: 0,
            editing: false,
        }
    }

    /// Loads the persisted draft, seeding the email from the session when
    /// the draft has none.
    pub fn load(&mut self, services: &Services) {
        self.draft = services.settings.draft();
        if self.draft.email.is_empty() {
            if let Some(user) = services.session.snapshot().user {
                self.draft.email = user.email;
            }
        }
        self.name.set_value(self.draft.name.clone());
        self.email.set_value(self.draft.email.clone());
        self.selected = 0;
        self.editing = false;
    }

    pub fn handle_input(&mut self, key: KeyEvent, services: &Services) -> ViewResult {
        if self.editing {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => {
                    self.editing = false;
                    self.draft.name = self.name.value().to_string();
                    self.draft.email = self.email.value().to_string();
                }
                code => {
                    let field = if self.selected == 0 {
                        &mut self.name
                    } else {
                        &mut self.email
                    };
                    field.handle_key(code, key.modifiers);
                }
            }
            return ViewResult::Consumed;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
                self.save(services);
                ViewResult::Consumed
            }
            (_, KeyCode::Char('j')) | (_, KeyCode::Down) => {
                self.selected = (self.selected + 1) % ROWS;
                ViewResult::Consumed
            }
            (_, KeyCode::Char('k')) | (_, KeyCode::Up) => {
                self.selected = (self.selected + ROWS - 1) % ROWS;
                ViewResult::Consumed
            }
            (_, KeyCode::Enter) | (_, KeyCode::Char(' ')) => {
                match self.selected {
                    0 | 1 => self.editing = true,
                    2 => {
                        self.draft.language = if self.draft.language == "en" {
                            "es".to_string()
                        } else {
                            "en".to_string()
                        };
                    }
                    3 => self.draft.notifications = !self.draft.notifications,
                    4 => self.draft.email_notifications = !self.draft.email_notifications,
                    _ => self.draft.theme = self.draft.theme.toggled(),
                }
                ViewResult::Consumed
            }
            _ => ViewResult::Ignored,
        }
    }

    fn save(&mut self, services: &Services) {
        self.draft.name = self.name.value().to_string();
        self.draft.email = self.email.value().to_string();
        match services.settings.save(self.draft.clone()) {
            Ok(()) => {
                services.toasts.success("Settings saved");
            }
            Err(error) => {
                services
                    .toasts
                    .error(format!("Could not save settings: {error}"));
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let rows = Layout::vertical([Constraint::Min(ROWS as u16 + 2), Constraint::Length(1)])
            .split(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" Settings ", palette.title()));
        let inner = block.inner(rows[0]);
        frame.render_widget(block, rows[0]);

        let name = if self.editing && self.selected == 0 {
            format!("{}█", self.name.display())
        } else {
            self.name.value().to_string()
        };
        let email = if self.editing && self.selected == 1 {
            format!("{}█", self.email.display())
        } else {
            self.email.value().to_string()
        };

        let entries = [
            ("Name", name),
            ("Email", email),
            ("Language", self.draft.language.clone()),
            ("In-app notifications", on_off(self.draft.notifications)),
            (
                "Email notifications",
                on_off(self.draft.email_notifications),
            ),
            ("Theme", self.draft.theme.label().to_string()),
        ];

        let lines: Vec<Line> = entries
            .iter()
            .enumerate()
            .map(|(index, (label, value))| {
                let mut line = Line::from(vec![
                    Span::styled(format!("{label:<24}"), palette.hint()),
                    Span::styled(value.clone(), palette.text()),
                ]);
                if index == self.selected {
                    line = line.style(palette.selected());
                }
                line
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);

        frame.render_widget(
            Paragraph::new(Line::styled(
                "enter edit/toggle · Ctrl+S save · Ctrl+L sign out",
                palette.hint(),
            )),
            rows[1],
        );
    }
}

impl Default for SettingsView {
    fn default() -> Self {
        Self::new()
    }
}

fn on_off(value: bool) -> String {
    if value { "on" } else { "off" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::settings::ThemePreference;

    #[test]
    fn theme_row_toggles_between_light_and_dark() {
        let mut view = SettingsView::new();
        view.selected = 5;
        assert_eq!(view.draft.theme, ThemePreference::Dark);
        view.draft.theme = view.draft.theme.toggled();
        assert_eq!(view.draft.theme, ThemePreference::Light);
    }
}
