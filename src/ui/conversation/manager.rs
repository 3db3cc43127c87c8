use crate::controller::{ChatController, Dispatch};
use crate::ui::conversation::history::{self, TranscriptView};
use crate::ui::conversation::{get_help_text, Composer, ComposerResult, ParsedCommand, PendingIndicator, SlashCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use std::path::PathBuf;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Input field that receives keystrokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Chat,
    Url,
    Upload,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Chat => Focus::Url,
            Focus::Url => Focus::Upload,
            Focus::Upload => Focus::Chat,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Chat => Focus::Upload,
            Focus::Url => Focus::Chat,
            Focus::Upload => Focus::Url,
        }
    }
}

/// Routes terminal input to the controller and lays out the chat screen
pub struct ConversationManager {
    controller: ChatController,
    chat: Composer,
    url: Composer,
    upload: Composer,
    upload_draft: String,
    focus: Focus,
    show_help: bool,
    title: String,
    tick: u64,
    /// Where the transcript was last drawn, for paging
    history_area: Rect,
}

impl ConversationManager {
    pub fn new(controller: ChatController, title: impl Into<String>) -> Self {
        Self {
            controller,
            chat: Composer::new("Message", "Type your message...").multiline().with_commands(),
            url: Composer::new("Web page", "Enter webpage URL"),
            upload: Composer::new("Upload file", "Path to a file to upload").multiline(),
            upload_draft: String::new(),
            focus: Focus::Chat,
            show_help: false,
            title: title.into(),
            tick: 0,
            history_area: Rect::default(),
        }
    }

    pub fn controller(&self) -> &ChatController {
        &self.controller
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn upload_draft(&self) -> &str {
        &self.upload_draft
    }

    pub fn is_help_visible(&self) -> bool {
        self.show_help
    }

    /// Advance animations and apply settled requests (called once per loop)
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        let applied = self.controller.process_outcomes();
        if applied > 0 {
            tracing::debug!(applied, "applied request outcomes");
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ConversationAction::Exit;
        }
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        let palette_open = self.focus == Focus::Chat && self.chat.is_palette_open();

        match key.code {
            KeyCode::Esc if self.show_help && !palette_open => {
                self.show_help = false;
                return ConversationAction::None;
            }
            KeyCode::Tab if !palette_open => {
                self.focus = self.focus.next();
                return ConversationAction::None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                return ConversationAction::None;
            }
            KeyCode::PageUp => {
                let max = history::max_scroll_back(self.controller.transcript(), self.history_area);
                self.controller.scroll_up(self.page_size(), max);
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.controller.scroll_down(self.page_size());
                return ConversationAction::None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Chat => {
                // The chat field is disabled while a reply is pending
                if self.controller.is_pending() {
                    return ConversationAction::None;
                }
                match self.chat.handle_key(key, self.controller.draft_mut()) {
                    ComposerResult::Submitted => {
                        self.controller.submit_chat();
                    }
                    ComposerResult::Command(command) => return self.handle_slash_command(command),
                    ComposerResult::None => {}
                }
            }
            Focus::Url => {
                if self.url.handle_key(key, self.controller.url_draft_mut()) == ComposerResult::Submitted {
                    self.controller.submit_url();
                }
            }
            Focus::Upload => {
                if self.upload.handle_key(key, &mut self.upload_draft) == ComposerResult::Submitted {
                    self.submit_upload();
                }
            }
        }

        ConversationAction::None
    }

    /// Insert pasted text into the focused field
    pub fn handle_paste(&mut self, text: &str) {
        match self.focus {
            Focus::Chat => {
                if !self.controller.is_pending() {
                    self.chat.insert_str(self.controller.draft_mut(), text);
                }
            }
            Focus::Url => self.url.insert_str(self.controller.url_draft_mut(), text),
            Focus::Upload => self.upload.insert_str(&mut self.upload_draft, text),
        }
    }

    fn submit_upload(&mut self) {
        let selection = parse_selection(&self.upload_draft);
        if self.controller.upload_file(&selection) == Dispatch::Sent {
            self.upload_draft.clear();
        }
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: ParsedCommand) -> ConversationAction {
        tracing::debug!(command = command.command.command(), "slash command");

        match command.command {
            SlashCommand::Fetch => match command.argument() {
                Some(url) => {
                    self.controller.set_url_draft(url);
                    self.url.move_to_end(self.controller.url_draft());
                    self.controller.submit_url();
                }
                None => self.focus = Focus::Url,
            },
            SlashCommand::Upload => match command.argument() {
                Some(path) => {
                    self.controller.upload_file(&parse_selection(path));
                }
                None => self.focus = Focus::Upload,
            },
            SlashCommand::Help => self.show_help = !self.show_help,
            SlashCommand::Quit => return ConversationAction::Exit,
        }

        ConversationAction::None
    }

    fn page_size(&self) -> usize {
        (self.history_area.height.saturating_sub(3) as usize).max(1)
    }

    /// Render the whole chat screen
    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(5),    // History
                Constraint::Length(1), // Pending indicator
                Constraint::Length(3), // URL
                Constraint::Length(3), // Upload
                Constraint::Length(3), // Chat composer
                Constraint::Length(1), // Key hints
            ])
            .split(area);

        self.history_area = chunks[1];
        let pending = self.controller.is_pending();

        let header = Line::from(vec![
            Span::styled(
                format!(" {} ", self.title),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{} messages", self.controller.transcript().len()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        if chunks[0].height > 0 {
            buf.set_line(chunks[0].x, chunks[0].y, &header, chunks[0].width);
        }

        TranscriptView::new(self.controller.transcript(), self.controller.scroll_back())
            .render(chunks[1], buf);

        if pending {
            PendingIndicator::new(self.tick).render(chunks[2], buf);
        }

        self.url
            .view(self.controller.url_draft(), self.focus == Focus::Url, false)
            .render(chunks[3], buf);
        self.upload
            .view(&self.upload_draft, self.focus == Focus::Upload, false)
            .render(chunks[4], buf);
        self.chat
            .view(self.controller.draft(), self.focus == Focus::Chat, pending)
            .render(chunks[5], buf);

        let hints = Line::from(Span::styled(
            " Enter send · Tab switch field · PgUp/PgDn scroll · /help · Ctrl+C quit",
            Style::default().fg(Color::DarkGray),
        ));
        if chunks[6].height > 0 {
            buf.set_line(chunks[6].x, chunks[6].y, &hints, chunks[6].width);
        }

        if self.show_help {
            render_help(chunks[1], buf);
        }
    }
}

fn render_help(area: Rect, buf: &mut Buffer) {
    let width = area.width.saturating_sub(4).min(72);
    let height = area.height.saturating_sub(2).min(16);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    Clear.render(popup, buf);
    Paragraph::new(get_help_text())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help (Esc to close)")
                .style(Style::default().fg(Color::Yellow)),
        )
        .render(popup, buf);
}

/// Paths in the upload field, one per line. Quotes added by terminal
/// drag-and-drop are stripped.
pub fn parse_selection(text: &str) -> Vec<PathBuf> {
    text.lines()
        .map(str::trim)
        .map(|line| {
            line.strip_prefix('\'')
                .and_then(|rest| rest.strip_suffix('\''))
                .or_else(|| line.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')))
                .unwrap_or(line)
        })
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChatApi;
    use crate::config::Config;
    use crate::events::Message;

    fn manager() -> ConversationManager {
        let config = Config {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let controller = ChatController::new(ChatApi::new(&config).unwrap());
        ConversationManager::new(controller, "LLM Chat")
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(manager: &mut ConversationManager, text: &str) {
        for c in text.chars() {
            manager.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn tab_cycles_focus_both_ways() {
        let mut manager = manager();
        assert_eq!(manager.focus(), Focus::Chat);
        manager.handle_key(press(KeyCode::Tab));
        assert_eq!(manager.focus(), Focus::Url);
        manager.handle_key(press(KeyCode::Tab));
        assert_eq!(manager.focus(), Focus::Upload);
        manager.handle_key(press(KeyCode::Tab));
        assert_eq!(manager.focus(), Focus::Chat);
        manager.handle_key(press(KeyCode::BackTab));
        assert_eq!(manager.focus(), Focus::Upload);
    }

    #[test]
    fn typing_goes_to_the_focused_draft() {
        let mut manager = manager();
        type_text(&mut manager, "hi");
        manager.handle_key(press(KeyCode::Tab));
        type_text(&mut manager, "example.com");
        manager.handle_key(press(KeyCode::Tab));
        manager.handle_paste("'/tmp/notes.txt'");

        assert_eq!(manager.controller().draft(), "hi");
        assert_eq!(manager.controller().url_draft(), "example.com");
        assert_eq!(manager.upload_draft(), "'/tmp/notes.txt'");
    }

    #[test]
    fn ctrl_c_and_quit_command_exit() {
        let mut manager = manager();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(manager.handle_key(ctrl_c), ConversationAction::Exit);

        type_text(&mut manager, "/qu");
        // First Enter completes from the palette, the second runs it
        assert_eq!(manager.handle_key(press(KeyCode::Enter)), ConversationAction::None);
        assert_eq!(manager.controller().draft(), "/quit ");
        assert_eq!(manager.handle_key(press(KeyCode::Enter)), ConversationAction::Exit);
    }

    #[test]
    fn help_toggles_without_touching_the_transcript() {
        let mut manager = manager();
        type_text(&mut manager, "/help");
        manager.handle_key(press(KeyCode::Esc)); // close palette
        manager.handle_key(press(KeyCode::Enter));
        assert!(manager.is_help_visible());
        assert!(manager.controller().transcript().is_empty());

        manager.handle_key(press(KeyCode::Esc));
        assert!(!manager.is_help_visible());
    }

    #[test]
    fn enter_on_empty_fields_sends_nothing() {
        let mut manager = manager();
        manager.handle_key(press(KeyCode::Enter));
        manager.handle_key(press(KeyCode::Tab));
        manager.handle_key(press(KeyCode::Enter));
        manager.handle_key(press(KeyCode::Tab));
        manager.handle_key(press(KeyCode::Enter));
        assert!(manager.controller().transcript().is_empty());
        assert!(!manager.controller().is_pending());
    }

    #[tokio::test]
    async fn chat_field_is_disabled_while_pending() {
        let mut manager = manager();
        type_text(&mut manager, "Hello");
        manager.handle_key(press(KeyCode::Enter));

        assert!(manager.controller().is_pending());
        assert_eq!(manager.controller().transcript(), &[Message::user("Hello")]);

        type_text(&mut manager, "again");
        manager.handle_key(press(KeyCode::Enter));
        manager.handle_paste("pasted");
        assert_eq!(manager.controller().draft(), "");
        assert_eq!(manager.controller().transcript().len(), 1);

        // The other fields stay usable
        manager.handle_key(press(KeyCode::Tab));
        type_text(&mut manager, "example.com");
        assert_eq!(manager.controller().url_draft(), "example.com");
    }

    #[tokio::test]
    async fn upload_field_is_cleared_once_dispatched() {
        let mut manager = manager();
        manager.handle_key(press(KeyCode::BackTab));
        manager.handle_paste("\"/tmp/a.txt\"\n/tmp/b.txt");
        manager.handle_key(press(KeyCode::Enter));
        assert_eq!(manager.upload_draft(), "");
    }

    #[tokio::test]
    async fn fetch_command_with_multibyte_url_renders_in_the_url_field() {
        let mut manager = manager();
        manager.handle_key(press(KeyCode::Tab));
        type_text(&mut manager, "a");
        manager.handle_key(press(KeyCode::BackTab));
        type_text(&mut manager, "/fetch é.de");
        manager.handle_key(press(KeyCode::Enter));
        assert_eq!(manager.controller().url_draft(), "é.de");

        manager.handle_key(press(KeyCode::Tab));
        assert_eq!(manager.focus(), Focus::Url);
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        manager.render(area, &mut buf);

        type_text(&mut manager, "/x");
        assert_eq!(manager.controller().url_draft(), "é.de/x");
    }

    #[tokio::test]
    async fn help_with_trailing_text_is_sent_as_chat() {
        let mut manager = manager();
        manager.handle_paste("/help me write a poem");
        manager.handle_key(press(KeyCode::Enter));

        assert!(!manager.is_help_visible());
        assert_eq!(manager.controller().transcript(), &[Message::user("/help me write a poem")]);
        assert!(manager.controller().is_pending());
    }

    #[test]
    fn selection_takes_one_path_per_line() {
        assert_eq!(
            parse_selection("  '/tmp/my file.txt' \n\n\"/tmp/b.pdf\"\n/tmp/c.docx"),
            vec![
                PathBuf::from("/tmp/my file.txt"),
                PathBuf::from("/tmp/b.pdf"),
                PathBuf::from("/tmp/c.docx"),
            ]
        );
        assert!(parse_selection("   \n ").is_empty());
    }

    #[test]
    fn renders_in_small_and_large_areas() {
        for (width, height) in [(20, 10), (120, 40)] {
            let mut manager = manager();
            let area = Rect::new(0, 0, width, height);
            let mut buf = Buffer::empty(area);
            manager.handle_key(press(KeyCode::Char('/')));
            manager.render(area, &mut buf);
        }
    }
}
