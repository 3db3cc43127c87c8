//! Conversation transcript display component

use crate::events::{Message, Sender};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget,
        Widget,
    },
};

/// Transcript view, anchored to the bottom and offset by `scroll_back` lines
pub struct TranscriptView<'a> {
    messages: &'a [Message],
    scroll_back: usize,
}

impl<'a> TranscriptView<'a> {
    pub fn new(messages: &'a [Message], scroll_back: usize) -> Self {
        Self {
            messages,
            scroll_back,
        }
    }
}

/// Number of rendered lines the transcript occupies at `width` columns of content
pub fn line_count(messages: &[Message], width: u16) -> usize {
    messages
        .iter()
        .map(|message| message_lines(message, width).len() + 1)
        .sum()
}

/// Furthest the view can scroll back when drawn into `area`
pub fn max_scroll_back(messages: &[Message], area: Rect) -> usize {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    line_count(messages, content_width(inner)).saturating_sub(inner.height as usize)
}

/// One column is reserved for the scrollbar
fn content_width(inner: Rect) -> u16 {
    inner.width.saturating_sub(1)
}

impl Widget for TranscriptView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Conversation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() {
            let welcome_lines = vec![
                Line::from(vec![Span::styled("Welcome!", Style::default().fg(Color::Green))]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Type a message below, fetch a web page or upload a file.",
                    Style::default().fg(Color::Gray),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Tab switches fields. Type /help for commands.",
                    Style::default().fg(Color::DarkGray),
                )]),
            ];

            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let width = content_width(inner_area);
        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.messages {
            all_lines.extend(message_lines(message, width));
            all_lines.push(Line::from(""));
        }

        let height = inner_area.height as usize;
        let total = all_lines.len();
        let max_back = total.saturating_sub(height);
        let back = self.scroll_back.min(max_back);
        let start = max_back - back;
        let end = (start + height).min(total);

        let text_area = Rect {
            width,
            ..inner_area
        };
        Paragraph::new(all_lines[start..end].to_vec()).render(text_area, buf);

        if max_back > 0 {
            let mut scroll_state = ScrollbarState::new(max_back + 1).position(start);
            Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .render(inner_area, buf, &mut scroll_state);
        }
    }
}

/// Render a single message into lines: a label followed by wrapped text
fn message_lines(message: &Message, width: u16) -> Vec<Line<'static>> {
    let (alignment, label_style, text_style) = match message.from {
        Sender::User => (
            Alignment::Right,
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Blue),
        ),
        Sender::Assistant => (
            Alignment::Left,
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Gray),
        ),
    };

    let mut lines = vec![
        Line::from(Span::styled(message.from.display_name(), label_style)).alignment(alignment),
    ];

    // Bubbles take at most 70% of the width
    let bubble_width = (width as usize * 7 / 10).max(10);
    for text in wrap_text(&message.text, bubble_width) {
        lines.push(Line::from(Span::styled(text, text_style)).alignment(alignment));
    }

    lines
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + word_len + 1 > width {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            if current_len > 0 {
                current_line.push(' ');
                current_len += 1;
            }

            // Hard-break words longer than the line
            for c in word.chars() {
                if current_len == width {
                    lines.push(std::mem::take(&mut current_line));
                    current_len = 0;
                }
                current_line.push(c);
                current_len += 1;
            }
        }

        lines.push(current_line);
    }

    lines
}
