use super::*;
use crate::client::AdapterEvent;
use crate::controller::{ChatController, SessionIdentity};
use crate::protocol::{ChatOutcome, Variant};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use std::io::Write;
use std::time::Duration;

fn render_text(app: &App, width: u16, height: u16) -> String {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).expect("test terminal should initialize");
    let theme = Theme::default();
    terminal
        .draw(|frame| render(frame, app, &theme))
        .expect("render should succeed");
    buffer_to_string(terminal.backend().buffer())
}

fn buffer_to_string(buffer: &Buffer) -> String {
    let mut text = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            text.push_str(buffer[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

fn send(app: &mut App, text: &str) {
    for c in text.chars() {
        app.input_char(c);
    }
    app.submit().expect("request should be produced");
}

fn reply(app: &mut App, text: &str) {
    app.on_adapter_event(AdapterEvent {
        outcome: ChatOutcome::Success(text.to_string()),
        elapsed: Duration::from_millis(1),
    });
}

fn file_app() -> App {
    App::new(
        ChatController::new(Variant::FileAugmented, SessionIdentity::default()),
        "Data Analyst Chat",
    )
}

#[test]
fn empty_plain_chat_shows_welcome_and_help() {
    let app = App::default();
    let text = render_text(&app, 100, 24);
    assert!(text.contains("Agent Chat"));
    assert!(text.contains("Hello! Type a message"));
    assert!(text.contains("Type your message..."));
    assert!(text.contains("Ctrl+C quit"));
    assert!(!text.contains("FILE UPLOAD"));
}

#[test]
fn file_chat_shows_upload_sidebar() {
    let app = file_app();
    let text = render_text(&app, 120, 24);
    assert!(text.contains("FILE UPLOAD"));
    assert!(text.contains("Accepted Formats"));
    assert!(text.contains("Attach a file to start chatting"));
}

#[test]
fn sidebar_shows_selected_file_name() {
    let mut upload = tempfile::Builder::new()
        .prefix("q3")
        .suffix(".csv")
        .tempfile()
        .expect("temp csv");
    upload.write_all(b"a\n1\n").expect("write csv");
    let mut app = file_app();
    app.attach_path(&upload.path().display().to_string());
    let text = render_text(&app, 140, 24);
    assert!(text.contains("Selected:"));
    assert!(text.contains("Selected: q3"));
}

#[test]
fn busy_chat_shows_typing_indicator_and_hides_welcome() {
    let mut app = App::default();
    send(&mut app, "hi");
    let text = render_text(&app, 100, 24);
    assert!(text.contains("You: hi"));
    assert!(text.contains("Waiting for reply..."));
    assert!(!text.contains("Hello! Type a message"));
    assert_eq!(text.matches("Agent:").count(), 1);
}

#[test]
fn settled_reply_replaces_indicator() {
    let mut app = App::default();
    send(&mut app, "hi");
    reply(&mut app, "hello there");
    let text = render_text(&app, 100, 24);
    assert!(text.contains("You: hi"));
    assert!(text.contains("Agent: hello there"));
    assert!(text.contains("Type your message..."));
}

#[test]
fn file_chat_labels_replies_as_bot() {
    let mut upload = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("temp json");
    upload.write_all(b"{}").expect("write json");
    let mut app = file_app();
    app.attach_path(&upload.path().display().to_string());
    send(&mut app, "summarize");
    reply(&mut app, "Total is 42");
    let text = render_text(&app, 120, 24);
    assert!(text.contains("Bot: Total is 42"));
}

#[test]
fn validation_notice_replaces_help_text() {
    let mut app = file_app();
    for c in "hello".chars() {
        app.input_char(c);
    }
    app.submit();
    let text = render_text(&app, 120, 24);
    assert!(text.contains("Please upload a file first."));
    assert!(!text.contains("Ctrl+C quit"));
}

#[test]
fn command_index_lists_matching_commands() {
    let mut app = file_app();
    app.input_char('/');
    let text = render_text(&app, 120, 24);
    assert!(text.contains("/attach"));
    assert!(text.contains("/quit"));
}

#[test]
fn long_transcripts_scroll_to_newest_turn() {
    let mut app = App::default();
    for idx in 0..20 {
        send(&mut app, &format!("question {idx}"));
        reply(&mut app, &format!("answer {idx}"));
    }
    let screen = Rect::new(0, 0, 80, 20);
    assert!(transcript_max_scroll(screen, &app) > 0);
    let text = render_text(&app, 80, 20);
    assert!(text.contains("answer 19"));
    assert!(!text.contains("question 0 "));
}

#[test]
fn page_height_is_positive_even_on_tiny_screens() {
    let app = App::default();
    assert!(transcript_page_height(Rect::new(0, 0, 10, 4), &app) >= 1);
    assert_eq!(transcript_max_scroll(Rect::new(0, 0, 10, 4), &app), 0);
}

#[test]
fn input_box_metrics_caps_at_five_lines_and_scrolls_after() {
    let (height, scroll) = input_box_metrics(3, 2, 20);
    assert_eq!(height, 5);
    assert_eq!(scroll, 0);

    let (height, scroll) = input_box_metrics(8, 6, 20);
    assert_eq!(height, 7);
    assert_eq!(scroll, 3);
}

#[test]
fn input_box_metrics_respects_small_available_height() {
    let (height, scroll) = input_box_metrics(10, 9, 4);
    assert_eq!(height, 4);
    assert_eq!(scroll, 8);
}

#[test]
fn typing_dots_cycle_with_ticks() {
    assert_eq!(typing_dots(0), "   ");
    assert_eq!(typing_dots(8), ".  ");
    assert_eq!(typing_dots(32), "   ");
}

#[test]
fn max_scroll_saturates_for_transcripts_taller_than_u16() {
    let mut app = App::default();
    for _ in 0..33_000 {
        let request = app.submit_text("q");
        assert!(request.is_some());
        reply(&mut app, "a");
    }
    let max_scroll = transcript_max_scroll(Rect::new(0, 0, 80, 20), &app);
    assert!(max_scroll > u16::MAX - 20);
}

#[test]
fn typing_dots_handle_huge_tick_counts() {
    assert_eq!(typing_dots(u64::MAX), "...");
}
