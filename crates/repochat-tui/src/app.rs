use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};
use repochat_core::{ChatRole, Controller, Conversation, ConversationPhase};

use crate::markdown::render_markdown;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub controller: Controller,
    pub endpoint: String,

    // Input editing (the buffer itself lives in the conversation)
    pub cursor: usize,

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of chat area for scroll calculations
    pub chat_width: u16,  // Inner width of chat area for wrap calculations
    pub follow_tail: bool,
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    seen_messages: usize,
}

impl App {
    pub fn new(controller: Controller, endpoint: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            controller,
            endpoint: endpoint.into(),
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_tail: true,
            chat_area: None,
            animation_frame: 0,
            seen_messages: 0,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        self.controller.conversation()
    }

    pub fn input(&self) -> &str {
        self.conversation().input()
    }

    /// Input is accepted on the intro screen and in chat, but never while a
    /// request is in flight.
    pub fn input_enabled(&self) -> bool {
        let conv = self.conversation();
        !conv.is_loading() && conv.phase() != ConversationPhase::Analyzing
    }

    // Input editing
    pub fn insert_char(&mut self, c: char) {
        let cursor = self.cursor;
        let input = self.controller.input_mut();
        let byte_pos = char_to_byte_index(input, cursor);
        input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        // Pasted newlines would submit half a question
        let text: String = text.chars().filter(|c| !c.is_control()).collect();
        let cursor = self.cursor;
        let input = self.controller.input_mut();
        let byte_pos = char_to_byte_index(input, cursor);
        input.insert_str(byte_pos, &text);
        self.cursor += text.chars().count();
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let cursor = self.cursor;
        let input = self.controller.input_mut();
        let byte_pos = char_to_byte_index(input, cursor);
        input.remove(byte_pos);
    }

    pub fn delete_at_cursor(&mut self) {
        let cursor = self.cursor;
        let input = self.controller.input_mut();
        if cursor < input.chars().count() {
            let byte_pos = char_to_byte_index(input, cursor);
            input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input().chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input().chars().count();
    }

    /// Submit whatever is in the input box: a repository URL on the intro
    /// screen, a question once the analyzer is ready.
    pub fn submit_input(&mut self) -> bool {
        let text = self.input().to_string();
        let accepted = match self.conversation().phase() {
            ConversationPhase::Intro => self.controller.submit_repo_url(&text),
            ConversationPhase::Ready => self.controller.submit_question(&text),
            ConversationPhase::Analyzing => false,
        };
        if accepted {
            self.follow_tail = true;
            self.scroll_chat_to_bottom();
        }
        self.sync_with_conversation();
        accepted
    }

    /// Start over with a new repository.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.chat_scroll = 0;
        self.follow_tail = true;
        self.sync_with_conversation();
    }

    /// Keep view state consistent after the conversation changed underneath
    /// (a flow result arrived, input was consumed, or a reset happened).
    pub fn sync_with_conversation(&mut self) {
        let char_count = self.input().chars().count();
        self.cursor = self.cursor.min(char_count);

        let message_count = self.conversation().messages().len();
        if message_count != self.seen_messages {
            self.seen_messages = message_count;
            if self.follow_tail {
                self.scroll_chat_to_bottom();
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation().is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling
    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_tail = self.chat_scroll >= max;
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    /// Scroll chat to bottom so the latest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }

    fn max_chat_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.chat_line_count().saturating_sub(visible_height)
    }

    /// Rows the chat takes once wrapped to the chat width, measured on the
    /// same lines the chat screen draws.
    fn chat_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 60 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 60 };

        let rows = Paragraph::new(Text::from(self.chat_lines()))
            .wrap(Wrap { trim: false })
            .line_count(wrap_width);
        rows.min(u16::MAX as usize) as u16
    }

    /// Every line of the chat transcript, plus the "Thinking" indicator while
    /// a question is in flight.
    pub fn chat_lines(&self) -> Vec<Line<'static>> {
        let conv = self.conversation();
        let mut lines = Vec::new();
        for msg in conv.messages() {
            lines.push(Self::role_line(msg.role));
            match msg.role {
                ChatRole::User => {
                    lines.extend(msg.content.lines().map(|l| Line::from(l.to_string())));
                }
                ChatRole::Assistant => lines.extend(render_markdown(&msg.content)),
            }
            lines.push(Line::default());
        }

        if conv.is_loading() {
            lines.push(Self::role_line(ChatRole::Assistant));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((self.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        lines
    }

    fn role_line(role: ChatRole) -> Line<'static> {
        let color = match role {
            ChatRole::User => Color::Cyan,
            ChatRole::Assistant => Color::Yellow,
        };
        Line::from(Span::styled(
            Self::role_label(role),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
    }

    pub fn role_label(role: ChatRole) -> &'static str {
        match role {
            ChatRole::User => "You:",
            ChatRole::Assistant => "Assistant:",
        }
    }
}
