use crate::ui::conversation::commands::{command_entries, parse_slash_command, CommandEntry, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

/// Result returned when the user interacts with a composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    /// Enter was pressed on ordinary content
    Submitted,
    /// Enter was pressed on a slash command; the content has been cleared
    Command(ParsedCommand),
    None,
}

/// Single-field editor. The text itself is owned by the caller so the
/// controller stays the source of truth for drafts.
#[derive(Debug, Clone)]
pub struct Composer {
    /// Byte offset into the content, always on a char boundary
    cursor: usize,
    title: String,
    placeholder: String,
    multiline: bool,
    commands_enabled: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    show_command_palette: bool,
    selected_command: Option<usize>,
}

impl Composer {
    pub fn new(title: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            cursor: 0,
            title: title.into(),
            placeholder: placeholder.into(),
            multiline: false,
            commands_enabled: false,
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            show_command_palette: false,
            selected_command: None,
        }
    }

    /// Allow Shift+Enter to insert a newline
    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    /// Recognise slash commands and show the command palette
    pub fn with_commands(mut self) -> Self {
        self.commands_enabled = true;
        self
    }

    pub fn is_palette_open(&self) -> bool {
        self.show_command_palette
    }

    /// Handle key input against `content`
    pub fn handle_key(&mut self, key: KeyEvent, content: &mut String) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        self.clamp_cursor(content);

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) && self.multiline {
                    self.insert_char(content, '\n');
                } else if self.show_command_palette {
                    if self.apply_selected_command(content) {
                        return ComposerResult::None;
                    }
                } else {
                    if self.commands_enabled {
                        // "/help me write a poem" is a chat message, not a command
                        let command = parse_slash_command(content)
                            .filter(|parsed| parsed.argument.is_none() || parsed.command.usage().is_some());
                        if let Some(command) = command {
                            content.clear();
                            self.cursor = 0;
                            self.close_command_palette();
                            return ComposerResult::Command(command);
                        }
                    }
                    return ComposerResult::Submitted;
                }
            }
            KeyCode::Up => {
                if self.show_command_palette {
                    self.move_command_selection(-1);
                }
            }
            KeyCode::Down => {
                if self.show_command_palette {
                    self.move_command_selection(1);
                }
            }
            KeyCode::Esc => {
                if self.show_command_palette {
                    self.close_command_palette();
                }
            }
            KeyCode::Tab => {
                if self.show_command_palette {
                    self.apply_selected_command(content);
                }
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return ComposerResult::None;
                }
                self.insert_char(content, c);
                self.sync_command_palette(content);
            }
            KeyCode::Backspace => {
                if self.backspace(content) {
                    self.sync_command_palette(content);
                }
            }
            KeyCode::Delete => {
                if self.delete(content) {
                    self.sync_command_palette(content);
                }
            }
            KeyCode::Left => {
                self.cursor = prev_boundary(content, self.cursor);
            }
            KeyCode::Right => {
                self.cursor = next_boundary(content, self.cursor);
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.cursor = content.len();
            }
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert pasted text at the cursor
    pub fn insert_str(&mut self, content: &mut String, text: &str) {
        self.clamp_cursor(content);
        let text = if self.multiline {
            text.replace("\r\n", "\n")
        } else {
            text.replace("\r\n", "\n").replace('\n', " ")
        };
        content.insert_str(self.cursor, &text);
        self.cursor += text.len();
        self.sync_command_palette(content);
    }

    /// Close the command palette
    pub fn close_command_palette(&mut self) {
        self.show_command_palette = false;
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    /// Borrowing widget for rendering this composer with `content`
    pub fn view<'a>(&'a self, content: &'a str, focused: bool, disabled: bool) -> ComposerView<'a> {
        ComposerView {
            composer: self,
            content,
            focused,
            disabled,
        }
    }

    /// Put the cursor after the last character, for content replaced from outside
    pub fn move_to_end(&mut self, content: &str) {
        self.cursor = content.len();
    }

    fn clamp_cursor(&mut self, content: &str) {
        self.cursor = floor_boundary(content, self.cursor);
    }

    /// Insert a character at the cursor position
    fn insert_char(&mut self, content: &mut String, c: char) {
        content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Delete character before cursor
    fn backspace(&mut self, content: &mut String) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_boundary(content, self.cursor);
        content.remove(self.cursor);
        true
    }

    /// Delete character at cursor
    fn delete(&mut self, content: &mut String) -> bool {
        if self.cursor >= content.len() {
            return false;
        }
        content.remove(self.cursor);
        true
    }

    fn sync_command_palette(&mut self, content: &str) {
        if !self.commands_enabled {
            return;
        }

        let typing_command = content.starts_with('/') && !content.contains(char::is_whitespace);
        if typing_command {
            if !self.show_command_palette {
                self.show_command_palette = true;
                self.selected_command = Some(0);
            }
            self.refresh_command_palette(content);
        } else if self.show_command_palette {
            self.close_command_palette();
        }
    }

    fn refresh_command_palette(&mut self, content: &str) {
        let query = content.trim_start_matches('/').to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| query.is_empty() || entry.keyword.starts_with(&query))
            .copied()
            .collect();

        if self.filtered_commands.is_empty() {
            self.selected_command = None;
        } else {
            let index = self.selected_command.unwrap_or(0);
            self.selected_command = Some(index.min(self.filtered_commands.len() - 1));
        }
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        let current = self.selected_command.unwrap_or(0) as isize;
        let len = self.filtered_commands.len() as isize;
        let next = (current + delta).rem_euclid(len);

        self.selected_command = Some(next as usize);
    }

    fn apply_selected_command(&mut self, content: &mut String) -> bool {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index))
            .copied()
        else {
            return false;
        };

        *content = format!("/{} ", entry.keyword);
        self.cursor = content.len();
        self.close_command_palette();
        true
    }
}

/// Largest char boundary at or before `cursor`
fn floor_boundary(content: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(content.len());
    while !content.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

fn prev_boundary(content: &str, cursor: usize) -> usize {
    content[..cursor]
        .char_indices()
        .next_back()
        .map(|(index, _)| index)
        .unwrap_or(0)
}

fn next_boundary(content: &str, cursor: usize) -> usize {
    content[cursor..]
        .chars()
        .next()
        .map(|c| cursor + c.len_utf8())
        .unwrap_or(cursor)
}

/// Render-time view of a composer and its content
pub struct ComposerView<'a> {
    composer: &'a Composer,
    content: &'a str,
    focused: bool,
    disabled: bool,
}

impl Widget for ComposerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let composer = self.composer;

        let title = if self.disabled {
            format!("{} (waiting for reply)", composer.title)
        } else {
            composer.title.clone()
        };
        let style = if self.disabled {
            Style::default().fg(Color::DarkGray)
        } else if self.focused {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Gray)
        };

        let block = Block::default().borders(Borders::ALL).title(title).style(style);
        let inner_area = block.inner(area);
        block.render(area, buf);

        if inner_area.height == 0 || inner_area.width == 0 {
            // Too small to show any text
        } else if self.content.is_empty() && !(self.focused && !self.disabled) {
            let placeholder_line = Line::from(vec![Span::styled(
                composer.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.content.to_string();
            if self.focused && !self.disabled {
                content.insert(floor_boundary(&content, composer.cursor), '▌');
            }

            // Keep the cursor line visible when the content outgrows the box
            let lines: Vec<&str> = content.split('\n').collect();
            let height = inner_area.height as usize;
            let start = lines.len().saturating_sub(height);
            for (i, line_text) in lines[start..].iter().enumerate() {
                let line = Line::from(vec![Span::styled(*line_text, Style::default().fg(Color::White))]);
                buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
            }
        }

        if composer.show_command_palette && !composer.filtered_commands.is_empty() {
            let filtered = &composer.filtered_commands;
            let palette_height = (filtered.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: area.x,
                y: area.y.saturating_sub(palette_height),
                width: area.width,
                height: palette_height.min(area.y),
            };
            if palette_area.height < 3 {
                return;
            }

            Clear.render(palette_area, buf);
            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            for (index, entry) in filtered.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }

                let is_selected = composer.selected_command == Some(index);
                let style = if is_selected {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" - ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);

                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::conversation::commands::SlashCommand;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &mut Composer, content: &mut String, text: &str) {
        for c in text.chars() {
            composer.handle_key(press(KeyCode::Char(c)), content);
        }
    }

    #[test]
    fn edits_at_the_cursor_across_multibyte_chars() {
        let mut composer = Composer::new("Chat", "Type your message...");
        let mut content = String::new();
        type_text(&mut composer, &mut content, "héllo");

        composer.handle_key(press(KeyCode::Left), &mut content);
        composer.handle_key(press(KeyCode::Left), &mut content);
        composer.handle_key(press(KeyCode::Left), &mut content);
        composer.handle_key(press(KeyCode::Backspace), &mut content);
        assert_eq!(content, "hllo");

        composer.handle_key(press(KeyCode::Char('é')), &mut content);
        composer.handle_key(press(KeyCode::End), &mut content);
        composer.handle_key(press(KeyCode::Char('!')), &mut content);
        assert_eq!(content, "héllo!");
    }

    #[test]
    fn enter_submits_without_touching_content() {
        let mut composer = Composer::new("Chat", "");
        let mut content = "Hello".to_string();
        assert_eq!(composer.handle_key(press(KeyCode::Enter), &mut content), ComposerResult::Submitted);
        assert_eq!(content, "Hello");
    }

    #[test]
    fn shift_enter_inserts_newline_only_when_multiline() {
        let shift_enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT);

        let mut chat = Composer::new("Chat", "").multiline();
        let mut content = "a".to_string();
        composer_end(&mut chat, &mut content);
        assert_eq!(chat.handle_key(shift_enter, &mut content), ComposerResult::None);
        assert_eq!(content, "a\n");

        let mut url = Composer::new("URL", "");
        let mut content = "a".to_string();
        assert_eq!(url.handle_key(shift_enter, &mut content), ComposerResult::Submitted);
    }

    fn composer_end(composer: &mut Composer, content: &mut String) {
        composer.handle_key(press(KeyCode::End), content);
    }

    #[test]
    fn cursor_is_clamped_after_external_clear() {
        let mut composer = Composer::new("Chat", "");
        let mut content = String::new();
        type_text(&mut composer, &mut content, "Hello");
        content.clear();
        type_text(&mut composer, &mut content, "x");
        assert_eq!(content, "x");
    }

    #[test]
    fn slash_command_is_returned_and_content_cleared() {
        let mut composer = Composer::new("Chat", "").with_commands();
        let mut content = "/fetch example.com".to_string();
        match composer.handle_key(press(KeyCode::Enter), &mut content) {
            ComposerResult::Command(parsed) => {
                assert_eq!(parsed.command, SlashCommand::Fetch);
                assert_eq!(parsed.argument(), Some("example.com"));
            }
            other => panic!("expected command, got {other:?}"),
        }
        assert!(content.is_empty());
    }

    #[test]
    fn commands_without_arguments_keep_trailing_text_as_chat() {
        let mut composer = Composer::new("Chat", "").with_commands();
        let mut content = "/help me write a poem".to_string();
        assert_eq!(composer.handle_key(press(KeyCode::Enter), &mut content), ComposerResult::Submitted);
        assert_eq!(content, "/help me write a poem");

        let mut content = "/quit now".to_string();
        assert_eq!(composer.handle_key(press(KeyCode::Enter), &mut content), ComposerResult::Submitted);

        let mut content = "/help".to_string();
        assert!(matches!(
            composer.handle_key(press(KeyCode::Enter), &mut content),
            ComposerResult::Command(ParsedCommand { command: SlashCommand::Help, argument: None })
        ));
    }

    #[test]
    fn renders_with_a_cursor_left_inside_a_multibyte_char() {
        let mut composer = Composer::new("URL", "");
        let mut typed = String::new();
        type_text(&mut composer, &mut typed, "a");

        // Content replaced behind the composer's back; byte 1 is inside 'é'
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        composer.view("é.de", true, false).render(area, &mut buf);
        assert_eq!(buf.get(1, 1).symbol(), "▌");
        assert_eq!(buf.get(2, 1).symbol(), "é");

        composer.move_to_end("é.de");
        let mut content = "é.de".to_string();
        composer.handle_key(press(KeyCode::Char('/')), &mut content);
        assert_eq!(content, "é.de/");
    }

    #[test]
    fn palette_filters_and_completes() {
        let mut composer = Composer::new("Chat", "").with_commands();
        let mut content = String::new();
        type_text(&mut composer, &mut content, "/up");
        assert!(composer.is_palette_open());

        composer.handle_key(press(KeyCode::Tab), &mut content);
        assert_eq!(content, "/upload ");
        assert!(!composer.is_palette_open());
    }

    #[test]
    fn fields_without_commands_submit_slash_text() {
        let mut composer = Composer::new("URL", "");
        let mut content = String::new();
        type_text(&mut composer, &mut content, "/help");
        assert!(!composer.is_palette_open());
        assert_eq!(composer.handle_key(press(KeyCode::Enter), &mut content), ComposerResult::Submitted);
    }

    #[test]
    fn paste_flattens_newlines_in_single_line_fields() {
        let mut composer = Composer::new("URL", "");
        let mut content = String::new();
        composer.insert_str(&mut content, "https://a\r\nb");
        assert_eq!(content, "https://a b");

        let mut upload = Composer::new("Upload", "").multiline();
        let mut content = String::new();
        upload.insert_str(&mut content, "/tmp/a.txt\n/tmp/b.txt");
        assert_eq!(content, "/tmp/a.txt\n/tmp/b.txt");
    }
}
