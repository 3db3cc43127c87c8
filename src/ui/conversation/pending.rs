use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// One-line "waiting for reply" indicator shown while a chat request is in flight
pub struct PendingIndicator {
    tick: u64,
}

impl PendingIndicator {
    pub fn new(tick: u64) -> Self {
        Self { tick }
    }

    fn dots(&self) -> &'static str {
        match (self.tick / 3) % 4 {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        }
    }
}

impl Widget for PendingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        let indicator = Line::from(vec![
            Span::styled(" Assistant is replying", Style::default().fg(Color::Green)),
            Span::styled(self.dots(), Style::default().fg(Color::Yellow)),
        ]);
        buf.set_line(area.x, area.y, &indicator, area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dots_cycle_with_ticks() {
        assert_eq!(PendingIndicator::new(0).dots(), ".");
        assert_eq!(PendingIndicator::new(3).dots(), "..");
        assert_eq!(PendingIndicator::new(6).dots(), "...");
        assert_eq!(PendingIndicator::new(12).dots(), ".");
    }
}
