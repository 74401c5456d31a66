use tracing::info;

use crate::attachment::{looks_like_dropped_file, select_file};
use crate::client::AdapterEvent;
use crate::controller::{ChatController, DisplayTurn, SessionIdentity};
use crate::protocol::{ChatRequest, Variant};
use crate::text_layout::{char_to_byte_idx, wrap_word_with_positions};

const COMMAND_INDEX: [(&str, &str); 3] = [
    ("/attach", "Attach a data file: /attach <path>"),
    ("/quit", "Quit app"),
    ("/exit", "Quit app"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub ticks: u64,
    title: String,
    controller: ChatController,
    chat_cursor: usize,
    chat_scroll: u16,
    follow_tail: bool,
    notice: Option<Notice>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(
            ChatController::new(Variant::Plain, SessionIdentity::default()),
            Variant::Plain.default_title(),
        )
    }
}

impl App {
    pub fn new(controller: ChatController, title: impl Into<String>) -> Self {
        Self {
            running: true,
            ticks: 0,
            title: title.into(),
            controller,
            chat_cursor: 0,
            chat_scroll: 0,
            follow_tail: true,
            notice: None,
        }
    }

    pub fn on_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn controller(&self) -> &ChatController {
        &self.controller
    }

    pub fn variant(&self) -> Variant {
        self.controller.variant()
    }

    pub fn chat_input(&self) -> &str {
        self.controller.pending_text()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn display_turns(&self) -> Vec<DisplayTurn> {
        self.controller.display_turns()
    }

    /// Typing is blocked while a reply is outstanding.
    pub fn is_typing_enabled(&self) -> bool {
        !self.controller.is_busy()
    }

    pub fn input_char(&mut self, c: char) {
        if !self.is_typing_enabled() {
            return;
        }
        let cursor = self.chat_cursor;
        let input = self.controller.pending_text_mut();
        let byte_idx = char_to_byte_idx(input, cursor);
        input.insert(byte_idx, c);
        self.chat_cursor = cursor.saturating_add(1);
    }

    pub fn insert_text(&mut self, text: &str) {
        for ch in text.chars() {
            let ch = if ch == '\n' || ch == '\r' { ' ' } else { ch };
            self.input_char(ch);
        }
    }

    pub fn backspace_input(&mut self) {
        if self.chat_cursor == 0 || !self.is_typing_enabled() {
            return;
        }
        let cursor = self.chat_cursor;
        let input = self.controller.pending_text_mut();
        let start = char_to_byte_idx(input, cursor.saturating_sub(1));
        let end = char_to_byte_idx(input, cursor);
        input.drain(start..end);
        self.chat_cursor = cursor.saturating_sub(1);
    }

    pub fn move_cursor_left(&mut self) {
        self.chat_cursor = self.chat_cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        let char_len = self.chat_input().chars().count();
        self.chat_cursor = (self.chat_cursor + 1).min(char_len);
    }

    pub fn move_cursor_home(&mut self) {
        self.chat_cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.chat_cursor = self.chat_input().chars().count();
    }

    #[cfg(test)]
    pub fn chat_cursor(&self) -> usize {
        self.chat_cursor
    }

    pub fn chat_cursor_line_col(&self, width: u16) -> (u16, u16) {
        let wrapped = wrap_word_with_positions(self.chat_input(), width);
        let idx = self.chat_cursor.min(wrapped.positions.len().saturating_sub(1));
        wrapped.positions.get(idx).copied().unwrap_or((0, 0))
    }

    /// Handles Enter. Slash commands are consumed locally; anything else goes
    /// through the controller, and an accepted turn yields the request to
    /// dispatch.
    pub fn submit(&mut self) -> Option<ChatRequest> {
        let input = self.chat_input().trim().to_string();
        if let Some((command, argument)) = parse_command(&input) {
            self.run_command(command, argument);
            return None;
        }

        match self.controller.submit_pending() {
            Ok(request) => {
                self.chat_cursor = 0;
                self.notice = None;
                self.follow_tail = true;
                Some(request)
            }
            Err(rejection) => {
                self.set_notice(NoticeKind::Warning, rejection.notice());
                None
            }
        }
    }

    /// Submits a message that did not come from the input box (startup file,
    /// headless mode). The input box keeps whatever the user typed.
    pub fn submit_text(&mut self, text: &str) -> Option<ChatRequest> {
        let typed = self.chat_input().to_string();
        self.controller.set_pending_text(text);
        let request = self.submit();
        self.chat_cursor = typed.chars().count();
        self.controller.set_pending_text(typed);
        request
    }

    pub fn handle_paste(&mut self, text: &str) {
        if self.variant().requires_file() && looks_like_dropped_file(text) {
            self.attach_path(text);
            return;
        }
        self.insert_text(text);
    }

    pub fn attach_path(&mut self, raw: &str) {
        if !self.variant().requires_file() {
            self.set_notice(NoticeKind::Warning, "This chat does not take file uploads.");
            return;
        }
        match select_file(raw) {
            Ok(selection) => {
                let name = selection.file.name().to_string();
                self.controller.attach_file(selection.file);
                match selection.notice {
                    Some(notice) => self.set_notice(NoticeKind::Warning, notice),
                    None => self.set_notice(NoticeKind::Info, format!("Selected: {name}")),
                }
            }
            Err(err) => self.set_notice(NoticeKind::Warning, err),
        }
    }

    pub fn on_adapter_event(&mut self, event: AdapterEvent) {
        let elapsed_ms = u64::try_from(event.elapsed.as_millis()).unwrap_or(u64::MAX);
        info!(elapsed_ms, "reply settled");
        self.controller.settle(event.outcome);
        self.follow_tail = true;
    }

    pub fn command_suggestions(&self) -> Vec<(&'static str, &'static str)> {
        let input = self.chat_input().trim_start();
        if !input.starts_with('/') || input.contains(' ') {
            return Vec::new();
        }
        COMMAND_INDEX
            .iter()
            .copied()
            .filter(|(command, _)| command.starts_with(input))
            .filter(|(command, _)| *command != "/attach" || self.variant().requires_file())
            .collect()
    }

    #[cfg(test)]
    pub fn is_following_tail(&self) -> bool {
        self.follow_tail
    }

    pub fn chat_scroll(&self, max_scroll: u16) -> u16 {
        if self.follow_tail {
            max_scroll
        } else {
            self.chat_scroll.min(max_scroll)
        }
    }

    pub fn scroll_up(&mut self, lines: u16, max_scroll: u16) {
        let current = self.chat_scroll(max_scroll);
        self.chat_scroll = current.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: u16, max_scroll: u16) {
        let next = self.chat_scroll(max_scroll).saturating_add(lines);
        if next >= max_scroll {
            self.chat_scroll = max_scroll;
            self.follow_tail = true;
        } else {
            self.chat_scroll = next;
        }
    }

    fn run_command(&mut self, command: &str, argument: &str) {
        match command {
            "/quit" | "/exit" => self.quit(),
            "/attach" => self.attach_path(argument),
            _ => {}
        }
        self.controller.set_pending_text(String::new());
        self.chat_cursor = 0;
    }

    fn set_notice(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            text: text.into(),
        });
    }
}

fn parse_command(input: &str) -> Option<(&str, &str)> {
    let (command, argument) = match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    };
    COMMAND_INDEX
        .iter()
        .any(|(known, _)| *known == command)
        .then_some((command, argument))
}

#[cfg(test)]
#[path = "../tests/unit/app_tests.rs"]
mod tests;
