//! services/app/src/tui/views/mod.rs
//!
//! One module per route. Each view owns its state, handles input for its
//! pane, spawns backend work with a clone of the event sender, and renders
//! itself into the area the shell hands it.

pub mod dashboard;
pub mod detail;
pub mod favorites;
pub mod library;
pub mod login;
pub mod register;
pub mod settings;

use ratatui::layout::Rect;

/// Centers a `width` x `height` box inside `area`, clamped to fit.
pub(crate) fn centered_box(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Greedy word wrap used by panes that need to know their line count for
/// scrolling.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }
    let mut lines = Vec::new();
    for raw_line in text.lines() {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.chars().count() + 1 + word.chars().count() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
            // Hard-break words longer than the pane.
            while current.chars().count() > width {
                let head: String = current.chars().take(width).collect();
                let tail: String = current.chars().skip(width).collect();
                lines.push(head);
                current = tail;
            }
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_the_width() {
        let lines = wrap_text("one two three four five", 9);
        assert!(lines.iter().all(|line| line.chars().count() <= 9));
        assert_eq!(lines.join(" "), "one two three four five");
    }

    #[test]
    fn wrap_hard_breaks_long_words() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }
}
