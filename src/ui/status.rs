use crate::session::{HealthStatus, SessionId};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Title line with the backend health badge
pub struct StatusBar<'a> {
    health: HealthStatus,
    session_id: &'a SessionId,
}

impl<'a> StatusBar<'a> {
    pub fn new(health: HealthStatus, session_id: &'a SessionId) -> Self {
        Self { health, session_id }
    }
}

fn badge_color(health: HealthStatus) -> Color {
    match health {
        HealthStatus::Unknown => Color::Gray,
        HealthStatus::Healthy { .. } => Color::Green,
        HealthStatus::Degraded => Color::Yellow,
        HealthStatus::Offline => Color::Red,
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        let color = badge_color(self.health);
        let line = Line::from(vec![
            Span::styled(
                "🩺 AI Doctor",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" · Your Personal Health Assistant  ", Style::default().fg(Color::Gray)),
            Span::styled("● ", Style::default().fg(color)),
            Span::styled(self.health.label(), Style::default().fg(color)),
            Span::styled(format!("  {}", self.session_id), Style::default().fg(Color::DarkGray)),
        ]);
        buf.set_line(inner.x, inner.y, &line, inner.width);
    }
}
