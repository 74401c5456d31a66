use super::*;
use crate::client::{ChatAdapter, ChatBackend, ChatError};
use crate::protocol::ChatOutcome;
use crate::transcript::Turn;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.input_char(c);
    }
}

fn file_app() -> App {
    App::new(
        ChatController::new(Variant::FileAugmented, SessionIdentity::default()),
        "Data Analyst Chat",
    )
}

fn settled(outcome: ChatOutcome) -> AdapterEvent {
    AdapterEvent {
        outcome,
        elapsed: Duration::from_millis(3),
    }
}

fn csv_upload() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("temp csv");
    file.write_all(b"a,b\n1,2\n").expect("write csv");
    file
}

#[test]
fn default_state_is_running_and_idle() {
    let app = App::default();
    assert!(app.running);
    assert_eq!(app.ticks, 0);
    assert_eq!(app.variant(), Variant::Plain);
    assert!(app.chat_input().is_empty());
    assert!(app.is_typing_enabled());
    assert!(app.is_following_tail());
    assert_eq!(app.notice(), None);
}

#[test]
fn typing_and_cursor_editing() {
    let mut app = App::default();
    type_text(&mut app, "helo");
    app.move_cursor_left();
    app.input_char('l');
    assert_eq!(app.chat_input(), "hello");
    app.move_cursor_home();
    app.backspace_input();
    assert_eq!(app.chat_input(), "hello");
    app.move_cursor_end();
    app.backspace_input();
    assert_eq!(app.chat_input(), "hell");
    assert_eq!(app.chat_cursor(), 4);
}

#[test]
fn submit_returns_request_and_blocks_typing_until_settled() {
    let mut app = App::default();
    type_text(&mut app, "hi");
    let request = app.submit().expect("request should be produced");
    assert_eq!(request.message(), "hi");
    assert!(app.chat_input().is_empty());
    assert_eq!(app.chat_cursor(), 0);
    assert!(!app.is_typing_enabled());

    type_text(&mut app, "ignored");
    assert!(app.chat_input().is_empty());

    app.on_adapter_event(settled(ChatOutcome::Success("hello".to_string())));
    assert!(app.is_typing_enabled());
    assert_eq!(
        app.controller().transcript().turns(),
        &[Turn::user("hi"), Turn::agent("hello")]
    );
}

#[test]
fn double_enter_dispatches_a_single_request() {
    let mut app = App::default();
    type_text(&mut app, "hi");
    let dispatched: Vec<ChatRequest> = (0..2).filter_map(|_| app.submit()).collect();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(
        app.notice().map(|notice| notice.text.as_str()),
        Some("Still waiting for the previous reply.")
    );
    assert_eq!(app.controller().transcript().len(), 1);
}

#[test]
fn empty_submit_shows_notice_without_touching_transcript() {
    let mut app = App::default();
    type_text(&mut app, "   ");
    assert_eq!(app.submit(), None);
    assert_eq!(
        app.notice(),
        Some(&Notice {
            kind: NoticeKind::Warning,
            text: "Please enter a message to continue.".to_string(),
        })
    );
    assert!(app.controller().transcript().is_empty());
}

#[test]
fn file_chat_requires_attachment_before_sending() {
    let mut app = file_app();
    type_text(&mut app, "what is the total?");
    assert_eq!(app.submit(), None);
    assert_eq!(
        app.notice().map(|notice| notice.text.as_str()),
        Some("Please upload a file first.")
    );
    assert!(app.controller().transcript().is_empty());
    assert_eq!(app.chat_input(), "what is the total?");
}

#[test]
fn attach_command_selects_file_and_clears_input() {
    let upload = csv_upload();
    let mut app = file_app();
    type_text(
        &mut app,
        &format!("/attach {}", upload.path().display()),
    );
    assert_eq!(app.submit(), None);
    assert!(app.chat_input().is_empty());
    assert_eq!(
        app.controller().attached_file().map(|file| file.path()),
        Some(upload.path())
    );
    assert_eq!(app.notice().map(|notice| notice.kind), Some(NoticeKind::Info));

    type_text(&mut app, "summarize");
    let request = app.submit().expect("request should be produced");
    assert_eq!(request.variant(), Variant::FileAugmented);
}

#[test]
fn attach_command_reports_missing_file() {
    let mut app = file_app();
    type_text(&mut app, "/attach /definitely/not/here.csv");
    app.submit();
    assert_eq!(app.controller().attached_file(), None);
    assert!(
        app.notice()
            .is_some_and(|notice| notice.text.contains("No such file"))
    );
}

#[test]
fn dropped_file_path_attaches_in_file_chat() {
    let upload = csv_upload();
    let mut app = file_app();
    app.handle_paste(&format!("'{}'", upload.path().display()));
    assert!(app.controller().attached_file().is_some());
    assert!(app.chat_input().is_empty());
}

#[test]
fn paste_in_plain_chat_inserts_flattened_text() {
    let upload = csv_upload();
    let mut app = App::default();
    app.handle_paste("line one\nline two");
    assert_eq!(app.chat_input(), "line one line two");
    assert_eq!(app.controller().attached_file(), None);

    let mut other = App::default();
    other.attach_path(&upload.path().display().to_string());
    assert_eq!(other.controller().attached_file(), None);
    assert!(other.notice().is_some());
}

#[test]
fn quit_commands_stop_the_app() {
    let mut app = App::default();
    type_text(&mut app, "/quit");
    assert_eq!(app.submit(), None);
    assert!(!app.running);
    assert!(app.controller().transcript().is_empty());
}

#[test]
fn unknown_slash_text_is_sent_as_a_message() {
    let mut app = App::default();
    type_text(&mut app, "/shrug");
    let request = app.submit().expect("plain text should be sent");
    assert_eq!(request.message(), "/shrug");
}

#[test]
fn command_suggestions_filter_by_prefix_and_variant() {
    let mut plain = App::default();
    type_text(&mut plain, "/");
    assert_eq!(
        plain
            .command_suggestions()
            .iter()
            .map(|(command, _)| *command)
            .collect::<Vec<_>>(),
        vec!["/quit", "/exit"]
    );

    let mut file = file_app();
    type_text(&mut file, "/a");
    assert_eq!(file.command_suggestions().len(), 1);
    type_text(&mut file, "ttach ");
    assert!(file.command_suggestions().is_empty());
}

#[test]
fn submit_text_keeps_typed_draft() {
    let mut app = App::default();
    type_text(&mut app, "draft");
    let request = app.submit_text("from file").expect("request should be produced");
    assert_eq!(request.message(), "from file");
    assert_eq!(app.chat_input(), "draft");
    assert_eq!(app.controller().transcript().turns(), &[Turn::user("from file")]);
}

#[test]
fn scrolling_up_detaches_and_scrolling_to_bottom_reattaches() {
    let mut app = App::default();
    assert_eq!(app.chat_scroll(10), 10);
    app.scroll_up(3, 10);
    assert!(!app.is_following_tail());
    assert_eq!(app.chat_scroll(10), 7);
    app.scroll_down(1, 10);
    assert_eq!(app.chat_scroll(10), 8);
    app.scroll_down(5, 10);
    assert!(app.is_following_tail());
}

#[test]
fn new_turns_snap_back_to_the_tail() {
    let mut app = App::default();
    app.scroll_up(2, 10);
    type_text(&mut app, "hi");
    app.submit().expect("request should be produced");
    assert!(app.is_following_tail());
    app.scroll_up(1, 12);
    app.on_adapter_event(settled(ChatOutcome::TransportError("refused".to_string())));
    assert!(app.is_following_tail());
}

struct GatedBackend {
    calls: AtomicUsize,
    release: Mutex<mpsc::Receiver<()>>,
}

impl ChatBackend for GatedBackend {
    fn post(&self, request: &ChatRequest) -> Result<String, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(release) = self.release.lock() {
            let _ = release.recv_timeout(Duration::from_secs(5));
        }
        Ok(format!("reply to {}", request.message()))
    }
}

#[test]
fn rapid_submits_through_adapter_issue_one_request() {
    let (release_tx, release_rx) = mpsc::channel();
    let backend = Arc::new(GatedBackend {
        calls: AtomicUsize::new(0),
        release: Mutex::new(release_rx),
    });
    let adapter = ChatAdapter::new(backend.clone());
    let mut app = App::default();

    type_text(&mut app, "first");
    for _ in 0..3 {
        if let Some(request) = app.submit() {
            adapter.send(request);
        }
    }
    release_tx.send(()).expect("release backend");
    let event = adapter.wait_event().expect("reply should settle");
    app.on_adapter_event(event);

    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        app.controller().transcript().turns(),
        &[Turn::user("first"), Turn::agent("reply to first")]
    );
    assert!(app.is_typing_enabled());
}
