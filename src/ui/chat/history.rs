//! Transcript widget for the chat screen

use std::time::{SystemTime, UNIX_EPOCH};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::events::{Message, Sender};

/// Conversation transcript, bottom-anchored so the newest exchange stays
/// in view. Rebuilt from the controller's messages on every draw.
pub struct ChatHistory<'a> {
    messages: &'a [Message],
    pending: bool,
    show_timestamps: bool,
}

impl<'a> ChatHistory<'a> {
    pub fn new(messages: &'a [Message], pending: bool, show_timestamps: bool) -> Self {
        Self {
            messages,
            pending,
            show_timestamps,
        }
    }

    /// Render a single message into lines: a dim header followed by the
    /// wrapped, role-colored body.
    fn message_lines(&self, message: &Message, width: u16) -> Vec<Line<'static>> {
        let (icon, color) = match message.sender {
            Sender::User => ("👤", Color::Blue),
            Sender::Assistant => ("🤖", Color::Green),
        };

        let mut header = format!("{} {}", icon, message.sender.display_name());
        if self.show_timestamps {
            header.push_str(&format!("  {}", message.timestamp.format("%H:%M")));
        }

        let mut lines = vec![Line::from(Span::styled(
            header,
            Style::default().fg(Color::DarkGray),
        ))];

        for body_line in wrap_text(&message.text, width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(body_line, Style::default().fg(color)),
            ]));
        }

        lines
    }

    /// Animated indicator shown while a request is in flight. The tick
    /// timer in the app loop keeps redraws coming so the dots advance.
    fn thinking_line(&self) -> Line<'static> {
        let dots = match (SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            / 300)
            % 4
        {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "",
        };

        Line::from(vec![
            Span::styled("🤖 ", Style::default().fg(Color::Green)),
            Span::styled("Assistant is thinking", Style::default().fg(Color::Green)),
            Span::styled(dots.to_string(), Style::default().fg(Color::Yellow)),
        ])
    }
}

impl Widget for ChatHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation");
        let inner = block.inner(area);
        block.render(area, buf);

        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.messages {
            all_lines.extend(self.message_lines(message, inner.width));
            // spacing between messages
            all_lines.push(Line::from(""));
        }

        if self.pending {
            all_lines.push(self.thinking_line());
        }

        // Show the tail that fits
        let height = inner.height as usize;
        let start = all_lines.len().saturating_sub(height);
        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }
    }
}

/// Word-wrap to the given width, keeping the text's own line breaks.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for raw in text.split('\n') {
        if raw.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in raw.split_whitespace() {
            if !current.is_empty() && current.len() + word.len() + 1 > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
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
    fn wraps_at_the_given_width() {
        let lines = wrap_text("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn keeps_blank_lines_from_the_source_text() {
        let lines = wrap_text("Hello!\n\nHow can I help?", 40);
        assert_eq!(lines, vec!["Hello!", "", "How can I help?"]);
    }

    #[test]
    fn zero_width_passes_text_through() {
        assert_eq!(wrap_text("anything", 0), vec!["anything"]);
    }

    #[test]
    fn words_longer_than_the_width_get_their_own_line() {
        let lines = wrap_text("a incomprehensibilities b", 6);
        assert_eq!(lines, vec!["a", "incomprehensibilities", "b"]);
    }
}
