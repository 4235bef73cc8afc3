mod support;

use std::sync::Arc;
use std::time::Duration;

use chat_provider::{ChatMessage, Role};
use chat_provider_mock::MockChatProvider;
use termfolio::{strip_escapes, visible_width};
use termfolio_server::chrome::{MOUSE_OFF, MOUSE_ON};
use termfolio_server::session::{QUIT_DELAY, STATUS_TTL, WHEEL_LINES};
use termfolio_server::{
    run_connection, InputDecoder, InputEvent, MouseAction, RuntimeConfig, Session,
    SessionControl, SessionEvent, View,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use support::{key, portfolio, pump, screen, session, session_with, submit, type_text};

#[test]
fn starts_on_welcome_and_navigates_with_commands() {
    let mut s = session(80, 24);
    let first = screen(&s);
    assert!(first.contains("[NEURAL_LINK]"));
    assert!(first.contains("WELCOME TO"));
    assert!(first.contains("◉ ONLINE"));

    submit(&mut s, "/projects");
    assert_eq!(s.view(), View::ProjectList);
    let list = screen(&s);
    assert!(list.contains("[PROJECTS]"));
    assert!(list.contains("[1] Termfolio ●"));
    assert!(list.contains("[2] Ledger ◈"));

    submit(&mut s, "/OPEN ledger");
    assert_eq!(s.view(), View::ProjectDetail);
    assert_eq!(s.selected_project(), Some("ledger"));
    assert!(screen(&s).contains("STATUS: ◈ ARCHIVED"));

    submit(&mut s, "/cv");
    assert_eq!(s.view(), View::Resume);
    assert!(screen(&s).contains("Ada Example"));

    submit(&mut s, "/work");
    assert_eq!(s.view(), View::Experience);
    assert!(screen(&s).contains("WORK EXPERIENCE"));

    submit(&mut s, "/bio");
    assert_eq!(s.view(), View::About);
    assert!(screen(&s).contains("▸ Based in Lisbon"));

    submit(&mut s, "/b");
    assert_eq!(s.view(), View::Chat);
    assert_eq!(s.input(), "");
}

#[test]
fn command_errors_are_shown_once_and_change_nothing() {
    let mut s = session(80, 24);

    submit(&mut s, "/open");
    assert_eq!(s.error(), Some("Usage: /open <project-id>"));
    assert!(screen(&s).contains("⚠ ERR: Usage: /open <project-id>"));

    submit(&mut s, "/open nope");
    assert_eq!(s.error(), Some("Project not found: nope"));
    assert_eq!(s.view(), View::Chat);
    assert_eq!(s.selected_project(), None);

    submit(&mut s, "/Frobnicate now");
    assert_eq!(s.error(), Some("Unknown command: /frobnicate"));

    key(&mut s, "enter");
    assert_eq!(s.error(), None);
    assert!(!screen(&s).contains("ERR:"));
}

#[test]
fn digits_select_projects_by_position() {
    let mut s = session(80, 24);
    key(&mut s, "alt+p");
    type_text(&mut s, "9");
    assert_eq!(s.view(), View::ProjectList);
    assert_eq!(s.input(), "9");

    key(&mut s, "backspace");
    type_text(&mut s, "3");
    assert_eq!(s.view(), View::ProjectDetail);
    assert_eq!(s.selected_project(), Some("sketch"));
    assert!(screen(&s).contains("○ IN_PROGRESS"));

    type_text(&mut s, "1");
    assert_eq!(s.view(), View::ProjectDetail);
    assert_eq!(s.input(), "1");
}

#[test]
fn help_collapses_on_narrow_terminals() {
    let mut wide = session(80, 60);
    key(&mut wide, "alt+h");
    let wide_screen = screen(&wide);
    assert!(wide_screen.contains("[SYS_HELP]"));
    assert!(wide_screen.contains(" ALT+KEY "));
    assert!(wide_screen.contains(" SLASH "));

    let mut narrow = session(40, 60);
    key(&mut narrow, "ctrl+/");
    let narrow_screen = screen(&narrow);
    assert!(narrow_screen.contains(" HELP "));
    assert!(!narrow_screen.contains(" SLASH "));
}

#[test]
fn every_frame_row_is_exactly_terminal_width() {
    let navigation = ["alt+h", "alt+a", "alt+p", "alt+r", "alt+e", "alt+w"];
    for (width, height) in [(20u16, 10u16), (41, 12), (80, 24), (132, 50)] {
        let mut s = Session::new("sized", Arc::new(portfolio()), None, width, height);
        type_text(&mut s, "some text that is rather long for a narrow prompt line");
        let mut frames = vec![s.render_frame()];
        for shortcut in navigation {
            key(&mut s, shortcut);
            frames.push(s.render_frame());
        }
        key(&mut s, "alt+p");
        key(&mut s, "ctrl+u");
        type_text(&mut s, "1");
        frames.push(s.render_frame());

        for frame in frames {
            assert_eq!(frame.len(), usize::from(height), "{width}x{height}");
            for row in &frame {
                assert_eq!(visible_width(row), usize::from(width), "{width}x{height}: {row:?}");
            }
        }
    }
}

#[test]
fn render_is_pure_and_follows_resize() {
    let mut s = session(80, 24);
    key(&mut s, "alt+r");
    assert_eq!(s.render_frame(), s.render_frame());

    s.handle_event(SessionEvent::Resize {
        width: 100,
        height: 30,
    });
    let frame = s.render_frame();
    assert_eq!(frame.len(), 30);
    assert!(frame.iter().all(|row| visible_width(row) == 100));
    assert_eq!(s.size(), (100, 30));
}

#[test]
fn static_views_scroll_from_the_top_and_reset_on_view_change() {
    let mut s = session(80, 12);
    key(&mut s, "alt+r");
    let top = screen(&s);

    key(&mut s, "up");
    assert_eq!(s.scroll(), 0);

    key(&mut s, "down");
    assert_eq!(s.scroll(), 1);
    assert_ne!(screen(&s), top);

    key(&mut s, "pageDown");
    assert_eq!(s.scroll(), 5);
    for _ in 0..200 {
        key(&mut s, "down");
    }
    let bottom = s.scroll();
    key(&mut s, "down");
    assert_eq!(s.scroll(), bottom);
    assert!(screen(&s).contains("ACHIEVEMENTS") || screen(&s).contains("Speaker at RustConf"));

    key(&mut s, "alt+a");
    assert_eq!(s.scroll(), 0);
}

#[test]
fn clear_and_exit() {
    let mut s = session(80, 24);
    submit(&mut s, "/cls");
    assert_eq!(s.status(), Some("Chat cleared"));
    assert!(screen(&s).contains("✓ Chat cleared"));

    assert_eq!(
        submit(&mut s, "/quit"),
        SessionControl::CloseAfter(QUIT_DELAY)
    );
    let farewell = screen(&s);
    assert!(farewell.contains("CONNECTION TERMINATED"));
    assert!(farewell.contains("// session ended"));
}

#[test]
fn ctrl_c_quits_from_any_view() {
    let mut s = session(80, 24);
    key(&mut s, "alt+e");
    assert_eq!(key(&mut s, "ctrl+c"), SessionControl::CloseAfter(QUIT_DELAY));
    assert!(s.is_quitting());
}

#[tokio::test]
async fn chat_reply_streams_into_history() {
    let provider = Arc::new(MockChatProvider::from_chunks(&["Hello **there**"]));
    let mut s = session_with(provider.clone(), 80, 24);

    submit(&mut s, "hi");
    assert!(s.is_streaming());
    let pending = screen(&s);
    assert!(pending.contains("◉ STREAMING"));
    assert!(pending.contains("initializing..."));
    assert!(pending.contains("│ hi"));

    pump(&mut s).await;
    assert!(!s.is_streaming());
    assert_eq!(
        s.history(),
        &[
            ChatMessage::user("hi"),
            ChatMessage::assistant("Hello **there**"),
        ]
    );

    let done = screen(&s);
    assert!(done.contains("┌─ YOU"));
    assert!(done.contains("┌─ MOHAK.AI"));
    assert!(done.contains("│ Hello there"));
    assert!(done.contains("◉ ONLINE"));

    submit(&mut s, "again");
    pump(&mut s).await;
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].message, "again");
    assert_eq!(requests[1].history.len(), 2);
    assert_eq!(requests[1].history[0].role, Role::User);
}

#[tokio::test]
async fn chat_from_another_view_returns_to_chat() {
    let provider = Arc::new(MockChatProvider::from_chunks(&["ok"]));
    let mut s = session_with(provider, 80, 24);
    key(&mut s, "alt+p");
    submit(&mut s, "tell me more");
    assert_eq!(s.view(), View::Chat);
    pump(&mut s).await;
    assert_eq!(s.history().len(), 2);
}

#[tokio::test]
async fn chat_view_is_pinned_to_the_bottom() {
    let long_reply = (1..=40)
        .map(|n| format!("line {n}\n\n"))
        .collect::<String>();
    let provider = Arc::new(MockChatProvider::new(vec![long_reply]));
    let mut s = session_with(provider, 80, 16);

    submit(&mut s, "count");
    pump(&mut s).await;
    let pinned = screen(&s);
    assert!(pinned.contains("line 40"));
    assert!(!pinned.contains("│ line 1 "));

    key(&mut s, "up");
    assert_eq!(s.scroll(), 1);
    key(&mut s, "pageUp");
    assert!(s.scroll() > 1);
    assert!(!screen(&s).contains("line 40"));

    key(&mut s, "down");
    key(&mut s, "pageDown");
    key(&mut s, "pageDown");
    assert_eq!(s.scroll(), 0);
    assert!(screen(&s).contains("line 40"));
}

fn feed_bytes(session: &mut Session, decoder: &mut InputDecoder, bytes: &[u8]) {
    for event in decoder.feed(bytes) {
        session.handle_event(SessionEvent::Input(event));
    }
}

#[test]
fn crlf_enter_submits_once_and_keeps_the_error() {
    let mut s = session(80, 24);
    let mut decoder = InputDecoder::new();

    feed_bytes(&mut s, &mut decoder, b"/open demo\r\n");
    assert_eq!(s.error(), Some("Project not found: demo"));
    assert!(screen(&s).contains("⚠ ERR: Project not found: demo"));

    feed_bytes(&mut s, &mut decoder, b"/nope\r");
    feed_bytes(&mut s, &mut decoder, b"\n");
    assert_eq!(s.error(), Some("Unknown command: /nope"));

    feed_bytes(&mut s, &mut decoder, b"/open\r\0");
    assert_eq!(s.error(), Some("Usage: /open <project-id>"));
}

fn wheel(session: &mut Session, action: MouseAction) {
    session.handle_event(SessionEvent::Input(InputEvent::Mouse {
        raw: String::new(),
        action,
        column: 1,
        row: 1,
    }));
}

#[test]
fn mouse_wheel_scrolls_and_can_be_switched_off() {
    let mut s = session(80, 12);
    assert!(s.mouse_enabled());
    key(&mut s, "alt+r");

    wheel(&mut s, MouseAction::WheelDown);
    assert_eq!(s.scroll(), WHEEL_LINES);
    wheel(&mut s, MouseAction::Press);
    assert_eq!(s.scroll(), WHEEL_LINES);

    key(&mut s, "ctrl+s");
    assert!(!s.mouse_enabled());
    assert_eq!(s.status(), Some("Mouse OFF (select mode)"));
    assert!(screen(&s).contains("✓ Mouse OFF (select mode)"));
    wheel(&mut s, MouseAction::WheelUp);
    assert_eq!(s.scroll(), WHEEL_LINES);

    key(&mut s, "alt+s");
    assert!(s.mouse_enabled());
    assert_eq!(s.status(), Some("Mouse ON (scroll mode)"));
    wheel(&mut s, MouseAction::WheelUp);
    assert_eq!(s.scroll(), 0);
}

#[test]
fn status_messages_arm_a_timer_and_expire() {
    let mut s = session(80, 24);
    assert_eq!(s.take_status_timer(), None);

    key(&mut s, "alt+l");
    assert_eq!(s.status(), Some("Chat cleared"));
    assert_eq!(s.take_status_timer(), Some(STATUS_TTL));
    assert_eq!(s.take_status_timer(), None);

    key(&mut s, "alt+p");
    assert_eq!(s.take_status_timer(), None);

    s.handle_event(SessionEvent::StatusExpired);
    assert_eq!(s.status(), None);
    assert!(!screen(&s).contains("Chat cleared"));
}

#[tokio::test(start_paused = true)]
async fn runtime_toggles_mouse_reporting_and_clears_status_after_delay() {
    let (mut client, server) = tokio::io::duplex(256 * 1024);
    let (reader, writer) = tokio::io::split(server);
    let task = tokio::spawn(run_connection(
        session(80, 24),
        reader,
        writer,
        RuntimeConfig::new(Duration::from_secs(60)),
        CancellationToken::new(),
    ));

    client.write_all(b"\x13").await.unwrap();
    let mut output = String::new();
    client.read_to_string(&mut output).await.unwrap();
    assert!(task.await.unwrap().is_ok());

    let toggled = output.find(MOUSE_OFF).expect("mouse reporting switched off");
    assert!(!output[toggled..].contains(MOUSE_ON));
    assert!(strip_escapes(&output).contains("Mouse OFF (select mode)"));

    let last_frame = output.rsplit("\x1b[H").next().unwrap_or_default();
    assert!(!strip_escapes(last_frame).contains("Mouse OFF"));
}
