use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::events::Message;
use crate::ui::chat::commands::{get_help_text, SlashCommand};
use crate::ui::chat::composer::{ChatComposer, ComposerResult};
use crate::ui::chat::history::ChatHistory;

/// What the app loop should do in response to a key press
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    None,
    Submit(String),
    Reset,
    DismissError,
    Quit,
}

/// Wires the transcript, composer, error banner, and help notice
/// together and turns key events into [`ChatAction`]s.
pub struct ChatManager {
    composer: ChatComposer,
    notice: Option<String>,
    show_timestamps: bool,
}

impl ChatManager {
    pub fn new(show_timestamps: bool) -> Self {
        let mut composer = ChatComposer::new("Type a message, / for commands".to_string());
        composer.set_focus(true);
        Self {
            composer,
            notice: None,
            show_timestamps,
        }
    }

    /// `pending` is the controller's in-flight flag; the composer keeps
    /// its draft instead of submitting while it is set.
    pub fn handle_key(&mut self, key: KeyEvent, pending: bool) -> ChatAction {
        if key.kind != KeyEventKind::Press {
            return ChatAction::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ChatAction::Quit;
        }

        // Esc dismisses overlays, unless the palette claims it first
        if key.code == KeyCode::Esc && !self.composer.palette_open() {
            self.notice = None;
            return ChatAction::DismissError;
        }

        match self.composer.handle_key(key, pending) {
            ComposerResult::Submitted(text) => ChatAction::Submit(text),
            ComposerResult::Command(SlashCommand::Reset) => ChatAction::Reset,
            ComposerResult::Command(SlashCommand::Bye) => ChatAction::Quit,
            ComposerResult::Command(SlashCommand::Help) => {
                self.notice = Some(get_help_text());
                ChatAction::None
            }
            ComposerResult::None => ChatAction::None,
        }
    }

    /// Draw the whole chat screen from the controller's current state.
    pub fn render(
        &self,
        frame: &mut Frame,
        messages: &[Message],
        pending: bool,
        error: Option<&str>,
    ) {
        let notice_height = self
            .notice
            .as_ref()
            .map(|n| (n.lines().count() as u16).saturating_add(2));

        let mut constraints = vec![Constraint::Min(5)];
        if let Some(height) = notice_height {
            constraints.push(Constraint::Length(height));
        }
        if error.is_some() {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Length(3));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(frame.size());

        let mut index = 0;
        frame.render_widget(
            ChatHistory::new(messages, pending, self.show_timestamps),
            chunks[index],
        );
        index += 1;

        if let Some(notice) = &self.notice {
            let help = Paragraph::new(notice.as_str())
                .style(Style::default().fg(Color::Cyan))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Help (Esc to close)"),
                );
            frame.render_widget(help, chunks[index]);
            index += 1;
        }

        if let Some(error) = error {
            let banner = Paragraph::new(format!("{error} (Esc to dismiss)"))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("⚠ Error"));
            frame.render_widget(banner, chunks[index]);
            index += 1;
        }

        frame.render_widget(self.composer.clone(), chunks[index]);
    }
}
