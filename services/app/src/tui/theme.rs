//! services/app/src/tui/theme.rs
//!
//! Palette for the two theme preferences. Views take the active palette at
//! render time, so a settings change applies on the next frame.

use ratatui::style::{Color, Modifier, Style};

use crate::state::settings::ThemePreference;
use doclens_core::domain::DocumentStatus;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub dim: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub highlight_bg: Color,
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            fg: Color::Gray,
            dim: Color::DarkGray,
            accent: Color::LightBlue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            highlight_bg: Color::Rgb(40, 44, 58),
        }
    }

    pub fn light() -> Self {
        Self {
            fg: Color::Black,
            dim: Color::DarkGray,
            accent: Color::Blue,
            success: Color::Rgb(0, 128, 64),
            warning: Color::Rgb(170, 110, 0),
            error: Color::Rgb(180, 30, 30),
            highlight_bg: Color::Rgb(220, 226, 240),
        }
    }

    pub fn for_preference(preference: ThemePreference) -> Self {
        match preference {
            ThemePreference::Dark => Self::dark(),
            ThemePreference::Light => Self::light(),
        }
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.fg)
    }

    pub fn hint(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_color(&self, status: DocumentStatus) -> Color {
        match status {
            DocumentStatus::Uploaded => self.dim,
            DocumentStatus::Processing => self.warning,
            DocumentStatus::Completed => self.success,
            DocumentStatus::Error => self.error,
        }
    }
}
