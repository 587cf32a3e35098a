use std::cell::{Cell, RefCell};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::ui::chat::commands::{parse_slash_command, CommandEntry, SlashCommand, COMMAND_ENTRIES};

/// What a key press amounted to
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(SlashCommand),
    None,
}

#[derive(Debug, Clone, Default)]
struct TextAreaState {
    content: String,
    /// Byte offset into `content`, always on a char boundary
    cursor: usize,
}

/// Input line at the bottom of the chat screen, with a command palette
/// that opens when the line starts with '/'.
#[derive(Clone)]
pub struct ChatComposer {
    state: RefCell<TextAreaState>,
    placeholder: String,
    has_focus: bool,
    filtered: RefCell<Vec<CommandEntry>>,
    palette_visible: Cell<bool>,
    selected: Cell<Option<usize>>,
}

impl ChatComposer {
    pub fn new(placeholder: String) -> Self {
        Self {
            state: RefCell::new(TextAreaState::default()),
            placeholder,
            has_focus: false,
            filtered: RefCell::new(Vec::new()),
            palette_visible: Cell::new(false),
            selected: Cell::new(None),
        }
    }

    /// Handle key input. `pending` mirrors the controller's in-flight
    /// flag: while set, Enter leaves the draft in place instead of
    /// submitting it. Slash commands still run.
    pub fn handle_key(&self, key: KeyEvent, pending: bool) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        let mut state = self.state.borrow_mut();

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char(&mut state, '\n');
                } else {
                    if self.palette_visible.get() && self.apply_selected(&mut state) {
                        return ComposerResult::None;
                    }
                    if !state.content.trim().is_empty() {
                        if let Some(command) = parse_slash_command(&state.content) {
                            state.content.clear();
                            state.cursor = 0;
                            drop(state);
                            self.close_palette();
                            return ComposerResult::Command(command);
                        }
                        // The draft is only cleared by an accepted
                        // submission; a pending request blocks the send
                        if pending {
                            return ComposerResult::None;
                        }
                        let content = std::mem::take(&mut state.content);
                        state.cursor = 0;
                        drop(state);
                        self.close_palette();
                        return ComposerResult::Submitted(content);
                    }
                }
            }
            KeyCode::Up => {
                if self.palette_visible.get() {
                    self.move_selection(-1);
                }
            }
            KeyCode::Down => {
                if self.palette_visible.get() {
                    self.move_selection(1);
                }
            }
            KeyCode::Esc => {
                if self.palette_visible.get() {
                    self.close_palette();
                }
            }
            KeyCode::Tab => {
                if self.palette_visible.get() {
                    self.apply_selected(&mut state);
                }
            }
            KeyCode::Char(c) => {
                self.insert_char(&mut state, c);

                if self.palette_visible.get() {
                    if state.content.starts_with('/') && !c.is_whitespace() {
                        self.refresh_palette(&state);
                    } else {
                        self.close_palette();
                    }
                } else if state.content == "/" {
                    self.open_palette(&state);
                }
            }
            KeyCode::Backspace => {
                if self.backspace(&mut state) && self.palette_visible.get() {
                    if state.content.starts_with('/') {
                        self.refresh_palette(&state);
                    } else {
                        self.close_palette();
                    }
                }
            }
            KeyCode::Delete => {
                if self.delete(&mut state) && self.palette_visible.get() {
                    if state.content.starts_with('/') {
                        self.refresh_palette(&state);
                    } else {
                        self.close_palette();
                    }
                }
            }
            KeyCode::Left => {
                if state.cursor > 0 {
                    state.cursor = prev_boundary(&state.content, state.cursor);
                }
            }
            KeyCode::Right => {
                if state.cursor < state.content.len() {
                    state.cursor = next_boundary(&state.content, state.cursor);
                }
            }
            KeyCode::Home => {
                state.cursor = 0;
            }
            KeyCode::End => {
                state.cursor = state.content.len();
            }
            _ => {}
        }

        ComposerResult::None
    }

    fn insert_char(&self, state: &mut TextAreaState, c: char) {
        state.content.insert(state.cursor, c);
        state.cursor += c.len_utf8();
    }

    /// Delete the char before the cursor
    fn backspace(&self, state: &mut TextAreaState) -> bool {
        if state.cursor == 0 {
            return false;
        }
        state.cursor = prev_boundary(&state.content, state.cursor);
        state.content.remove(state.cursor);
        true
    }

    /// Delete the char at the cursor
    fn delete(&self, state: &mut TextAreaState) -> bool {
        if state.cursor < state.content.len() {
            state.content.remove(state.cursor);
            true
        } else {
            false
        }
    }

    fn open_palette(&self, state: &TextAreaState) {
        self.palette_visible.set(true);
        self.selected.set(Some(0));
        self.refresh_palette(state);
    }

    fn close_palette(&self) {
        self.palette_visible.set(false);
        self.filtered.borrow_mut().clear();
        self.selected.set(None);
    }

    fn refresh_palette(&self, state: &TextAreaState) {
        let query = state.content.trim_start_matches('/').to_lowercase();
        let mut filtered = self.filtered.borrow_mut();
        filtered.clear();

        for entry in COMMAND_ENTRIES.iter() {
            if query.is_empty() || entry.keyword.starts_with(&query) {
                filtered.push(*entry);
            }
        }

        if filtered.is_empty() {
            self.selected.set(None);
        } else {
            let index = self.selected.get().unwrap_or(0);
            self.selected.set(Some(index.min(filtered.len() - 1)));
        }
    }

    fn move_selection(&self, delta: isize) {
        let filtered = self.filtered.borrow();
        if filtered.is_empty() {
            self.selected.set(None);
            return;
        }

        let current = self.selected.get().unwrap_or(0) as isize;
        let len = filtered.len() as isize;
        let mut next = current + delta;

        if next < 0 {
            next = len - 1;
        } else if next >= len {
            next = 0;
        }

        self.selected.set(Some(next as usize));
    }

    /// Replace the input with the highlighted palette entry. Returns false
    /// when nothing is highlighted (e.g. the filter matched no command).
    fn apply_selected(&self, state: &mut TextAreaState) -> bool {
        let filtered = self.filtered.borrow();
        let Some(index) = self.selected.get() else {
            return false;
        };
        let Some(entry) = filtered.get(index) else {
            return false;
        };

        state.content = format!("/{} ", entry.keyword);
        state.cursor = state.content.len();
        drop(filtered);
        self.close_palette();
        true
    }

    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    pub fn palette_open(&self) -> bool {
        self.palette_visible.get()
    }

    #[cfg(test)]
    fn content(&self) -> String {
        self.state.borrow().content.clone()
    }

    /// Key press with no request in flight
    #[cfg(test)]
    fn handle_key_idle(&self, key: KeyEvent) -> ComposerResult {
        self.handle_key(key, false)
    }
}

fn prev_boundary(s: &str, idx: usize) -> usize {
    s[..idx].char_indices().last().map(|(i, _)| i).unwrap_or(0)
}

fn next_boundary(s: &str, idx: usize) -> usize {
    s[idx..]
        .chars()
        .next()
        .map(|c| idx + c.len_utf8())
        .unwrap_or(idx)
}

impl Widget for ChatComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state.borrow();

        let block = Block::default()
            .borders(Borders::ALL)
            .title("✉ Message")
            .style(if self.has_focus {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });
        let inner = block.inner(area);
        block.render(area, buf);

        if state.content.is_empty() {
            let placeholder = Line::from(Span::styled(
                &self.placeholder,
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(inner.x, inner.y, &placeholder, inner.width);
        } else {
            let mut content = state.content.clone();
            if self.has_focus {
                content.insert(state.cursor.min(content.len()), '▌');
            }

            for (i, text_line) in content.split('\n').enumerate() {
                if i < inner.height as usize {
                    let line = Line::from(Span::raw(text_line));
                    buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
                }
            }
        }

        if self.palette_visible.get() {
            let filtered = self.filtered.borrow();
            let palette_height = (filtered.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: inner.x,
                y: inner.y.saturating_sub(palette_height),
                width: inner.width,
                height: palette_height,
            };

            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let palette_inner = block.inner(palette_area);
            block.render(palette_area, buf);

            let selected = self.selected.get();
            for (index, entry) in filtered.iter().enumerate() {
                if index >= palette_inner.height as usize {
                    break;
                }

                let style = if selected == Some(index) {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" - ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);

                buf.set_line(
                    palette_inner.x,
                    palette_inner.y + index as u16,
                    &line,
                    palette_inner.width,
                );
            }
        }
    }
}
