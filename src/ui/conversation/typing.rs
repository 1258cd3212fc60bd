use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// "Doctor is typing..." line shown while a chat request is in flight
#[derive(Debug, Clone, Default)]
pub struct TypingIndicator {
    active: bool,
    frame: usize,
}

impl TypingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.active = true;
        self.frame = 0;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance the animation by one render tick
    pub fn tick(&mut self) {
        if self.active {
            self.frame = self.frame.wrapping_add(1);
        }
    }

    fn dots(&self) -> &'static str {
        match self.frame % 4 {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        }
    }
}

impl Widget for &TypingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.active || area.height == 0 {
            return;
        }

        let indicator = Line::from(vec![
            Span::styled("👨‍⚕️ ", Style::default().fg(Color::Green)),
            Span::styled("Doctor is typing", Style::default().fg(Color::Green)),
            Span::styled(self.dots(), Style::default().fg(Color::Yellow)),
        ]);
        buf.set_line(area.x, area.y, &indicator, area.width);
    }
}
