//! Conversation history display component

use crate::conversation::{ConversationLog, Message, Role};
use crate::markup::{self, Emphasis, Segment};
use crate::prompts::{DISCLAIMER, EXAMPLE_PROMPTS, GREETING};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// View state for the conversation history pane.
///
/// The messages themselves belong to the session; this only tracks how they
/// are shown.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    show_context: bool,
    scroll_offset: usize,
    notice: Option<String>,
}

impl ConversationHistory {
    pub fn new(show_context: bool) -> Self {
        Self {
            show_context,
            scroll_offset: 0,
            notice: None,
        }
    }

    pub fn show_context(&self) -> bool {
        self.show_context
    }

    pub fn toggle_context(&mut self) -> bool {
        self.show_context = !self.show_context;
        self.show_context
    }

    /// A UI-only note under the conversation (help text, confirmations)
    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
        self.scroll_to_bottom();
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Bind the view state to a log for rendering
    pub fn widget<'a>(&'a self, log: &'a ConversationLog) -> HistoryWidget<'a> {
        HistoryWidget { history: self, log }
    }

    /// Every line the pane would show at `width`, top to bottom
    pub fn lines(&self, log: &ConversationLog, width: u16) -> Vec<Line<'static>> {
        let width = width.saturating_sub(2) as usize;
        let mut lines = Vec::new();

        push_block(&mut lines, header("👨‍⚕️ Doctor", None), GREETING, assistant_style(), width);

        if log.is_empty() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Try asking (or type /example N):",
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
            )));
            for (index, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
                lines.push(Line::from(Span::styled(
                    format!("  {}. {}", index + 1, prompt),
                    Style::default().fg(Color::Gray),
                )));
            }
            lines.push(Line::default());
            push_block(
                &mut lines,
                Line::default(),
                &format!("⚠️ {}", DISCLAIMER),
                Style::default().fg(Color::DarkGray),
                width,
            );
        }

        for message in log.messages() {
            lines.push(Line::default());
            self.push_message(&mut lines, message, width);
        }

        if let Some(notice) = &self.notice {
            lines.push(Line::default());
            push_block(&mut lines, Line::default(), notice, Style::default().fg(Color::Yellow), width);
        }

        lines
    }

    fn push_message(&self, lines: &mut Vec<Line<'static>>, message: &Message, width: usize) {
        let time = message.timestamp.format("%-I:%M %p").to_string();
        let (label, style) = match (message.role, message.is_error) {
            (Role::User, _) => ("👤 You", Style::default().fg(Color::Blue)),
            (Role::Assistant, false) => ("👨‍⚕️ Doctor", assistant_style()),
            (Role::Assistant, true) => ("⚠️ Doctor", Style::default().fg(Color::Red)),
        };

        push_block(lines, header(label, Some(&time)), &message.content, style, width);

        if self.show_context && !message.context_used.is_empty() {
            lines.push(Line::from(Span::styled(
                "  📚 Medical context used:",
                Style::default().fg(Color::Cyan),
            )));
            for context in &message.context_used {
                for (i, wrapped) in markup::wrap(&[Segment::plain(context.as_str())], width.saturating_sub(4))
                    .into_iter()
                    .enumerate()
                {
                    let bullet = if i == 0 { "   • " } else { "     " };
                    let mut spans = vec![Span::raw(bullet)];
                    spans.extend(styled_spans(wrapped, Style::default().fg(Color::DarkGray)));
                    lines.push(Line::from(spans));
                }
            }
        }
    }
}

/// History pane bound to the log it displays
pub struct HistoryWidget<'a> {
    history: &'a ConversationHistory,
    log: &'a ConversationLog,
}

impl Widget for HistoryWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Consultation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        let all_lines = self.history.lines(self.log, inner_area.width);

        // Show the bottom of the conversation, shifted up by the scroll offset
        let height = inner_area.height as usize;
        let total = all_lines.len();
        let max_offset = total.saturating_sub(height);
        let end = total - self.history.scroll_offset.min(max_offset);
        let start = end.saturating_sub(height);

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

fn assistant_style() -> Style {
    Style::default().fg(Color::Green)
}

fn header(label: &str, time: Option<&str>) -> Line<'static> {
    let text = match time {
        Some(time) => format!("{} · {} {}", label, time, "─".repeat(12)),
        None => format!("{} {}", label, "─".repeat(12)),
    };
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

/// Push an optional header followed by the formatted, wrapped body
fn push_block(lines: &mut Vec<Line<'static>>, header: Line<'static>, body: &str, style: Style, width: usize) {
    if !header.spans.is_empty() {
        lines.push(header);
    }

    for parsed in markup::parse(body) {
        for wrapped in markup::wrap(&parsed, width) {
            let mut spans = vec![Span::raw("  ")];
            spans.extend(styled_spans(wrapped, style));
            lines.push(Line::from(spans));
        }
    }
}

fn styled_spans(segments: Vec<Segment>, base: Style) -> impl Iterator<Item = Span<'static>> {
    segments.into_iter().map(move |segment| {
        let style = match segment.emphasis {
            Emphasis::Plain => base,
            Emphasis::Bold => base.add_modifier(Modifier::BOLD),
            Emphasis::Italic => base.add_modifier(Modifier::ITALIC),
            Emphasis::BoldItalic => base.add_modifier(Modifier::BOLD | Modifier::ITALIC),
        };
        Span::styled(segment.text, style)
    })
}
