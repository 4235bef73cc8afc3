//! Per-connection state machine.
//!
//! A [`Session`] owns everything one client sees: the current view, the
//! input line, chat history and the reply that is still streaming. Events are
//! applied one at a time through [`Session::handle_event`] and the frame is
//! recomputed from scratch by [`Session::render_frame`].

use std::sync::Arc;
use std::time::Duration;

use chat_provider::{ChatMessage, StreamError};
use portfolio_content::Portfolio;
use termfolio::{Layout, Theme};
use tracing::{debug, info};
use unicode_segmentation::UnicodeSegmentation;

use crate::chrome::{self, Hint};
use crate::commands::{parse_command, Command};
use crate::input::{InputEvent, MouseAction};
use crate::pipeline::{ActiveStream, StreamEvent, StreamPipeline};
use crate::views;

/// How long the farewell frame stays up before the connection closes.
pub const QUIT_DELAY: Duration = Duration::from_millis(1500);
pub const MAX_INPUT_CHARS: usize = 1000;
/// How long a status message stays in the footer.
pub const STATUS_TTL: Duration = Duration::from_secs(2);
/// Lines scrolled per mouse wheel notch.
pub const WHEEL_LINES: usize = 3;

pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Chat,
    Help,
    About,
    ProjectList,
    ProjectDetail,
    Resume,
    Experience,
}

impl View {
    /// Label shown in the header.
    pub fn tag(self) -> &'static str {
        match self {
            View::Chat => "NEURAL_LINK",
            View::Help => "SYS_HELP",
            View::About => "PROFILE",
            View::ProjectList => "PROJECTS",
            View::ProjectDetail => "PROJECT",
            View::Resume => "CREDENTIALS",
            View::Experience => "EXPERIENCE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Input(InputEvent),
    Resize { width: u16, height: u16 },
    Stream(StreamEvent),
    /// The status message timer armed by [`Session::take_status_timer`] ran out.
    StatusExpired,
    IdleTimeout,
    Disconnect,
}

/// What the connection should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    /// Show the current frame, wait, then close.
    CloseAfter(Duration),
    Close,
}

pub struct Session {
    id: String,
    portfolio: Arc<Portfolio>,
    pipeline: Option<StreamPipeline>,
    theme: Theme,
    view: View,
    width: usize,
    height: usize,
    input: String,
    history: Vec<ChatMessage>,
    response: String,
    stream: Option<ActiveStream>,
    selected_project: Option<String>,
    status: Option<String>,
    status_timer: Option<Duration>,
    error: Option<String>,
    scroll: usize,
    mouse: bool,
    quitting: bool,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        portfolio: Arc<Portfolio>,
        pipeline: Option<StreamPipeline>,
        width: u16,
        height: u16,
    ) -> Self {
        Self {
            id: id.into(),
            portfolio,
            pipeline,
            theme: Theme::cyberpunk(),
            view: View::Chat,
            width: usize::from(width.max(1)),
            height: usize::from(height.max(1)),
            input: String::new(),
            history: Vec::new(),
            response: String::new(),
            stream: None,
            selected_project: None,
            status: None,
            status_timer: None,
            error: None,
            scroll: 0,
            mouse: true,
            quitting: false,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Reply text received so far for the in-flight request.
    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    pub fn selected_project(&self) -> Option<&str> {
        self.selected_project.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Whether the client should report mouse events. On by default; while
    /// off the terminal keeps native text selection.
    pub fn mouse_enabled(&self) -> bool {
        self.mouse
    }

    /// Returns the lifetime of a status message set since the last call.
    /// The caller delivers [`SessionEvent::StatusExpired`] once it elapses.
    pub fn take_status_timer(&mut self) -> Option<Duration> {
        self.status_timer.take()
    }

    /// Next event from the in-flight reply. Pending forever when nothing is
    /// streaming, so it can sit in a `select!` unconditionally. Cancel safe.
    pub async fn next_stream_event(&mut self) -> StreamEvent {
        match self.stream.as_mut() {
            Some(stream) => stream
                .next_event()
                .await
                .unwrap_or(StreamEvent::Finished(None)),
            None => std::future::pending().await,
        }
    }

    pub fn handle_event(&mut self, event: SessionEvent) -> SessionControl {
        if self.quitting {
            return match event {
                SessionEvent::IdleTimeout | SessionEvent::Disconnect => SessionControl::Close,
                _ => SessionControl::Continue,
            };
        }

        match event {
            SessionEvent::Input(input) => self.handle_input(input),
            SessionEvent::Resize { width, height } => {
                self.resize(width, height);
                SessionControl::Continue
            }
            SessionEvent::Stream(event) => {
                self.apply_stream_event(event);
                SessionControl::Continue
            }
            SessionEvent::StatusExpired => {
                self.status = None;
                SessionControl::Continue
            }
            SessionEvent::IdleTimeout => {
                info!(session_id = %self.id, "idle timeout");
                self.stream = None;
                SessionControl::Close
            }
            SessionEvent::Disconnect => {
                info!(session_id = %self.id, "client disconnected");
                self.stream = None;
                SessionControl::Close
            }
        }
    }

    fn handle_input(&mut self, event: InputEvent) -> SessionControl {
        match event {
            InputEvent::Key { key_id, .. } => return self.handle_key(&key_id),
            InputEvent::Text { text, .. } => {
                let opened = self
                    .project_shortcut(&text)
                    .is_some_and(|position| self.open_by_position(position));
                if !opened {
                    self.append_input(&text);
                }
            }
            InputEvent::Paste { text, .. } => {
                let flattened = text.replace("\r\n", " ").replace(['\r', '\n'], " ");
                self.append_input(&flattened);
            }
            InputEvent::Resize { columns, rows } => self.resize(columns, rows),
            InputEvent::Mouse { action, .. } if self.mouse => match action {
                MouseAction::WheelUp => self.scroll_by(true, WHEEL_LINES),
                MouseAction::WheelDown => self.scroll_by(false, WHEEL_LINES),
                MouseAction::Press | MouseAction::Release | MouseAction::Drag => {}
            },
            InputEvent::Mouse { .. } => {}
            InputEvent::UnknownRaw { raw } => {
                debug!(session_id = %self.id, raw = ?raw, "ignoring unrecognised input");
            }
        }
        SessionControl::Continue
    }

    fn handle_key(&mut self, key_id: &str) -> SessionControl {
        match key_id {
            "ctrl+c" => return self.quit(),
            "enter" => return self.submit(),
            "escape" => {
                if self.interrupt_stream() {
                    self.set_status("Response interrupted");
                } else {
                    self.go(View::Chat);
                }
            }
            "backspace" => {
                if let Some((index, _)) = self.input.grapheme_indices(true).next_back() {
                    self.input.truncate(index);
                }
            }
            "ctrl+u" => self.input.clear(),
            "up" => self.scroll_by(true, 1),
            "down" => self.scroll_by(false, 1),
            "pageUp" => self.scroll_by(true, chrome::content_rows(self.height)),
            "pageDown" => self.scroll_by(false, chrome::content_rows(self.height)),
            other => {
                let shortcut = other
                    .strip_prefix("ctrl+")
                    .or_else(|| other.strip_prefix("alt+"));
                if let Some(shortcut) = shortcut {
                    return self.handle_shortcut(shortcut);
                }
            }
        }
        SessionControl::Continue
    }

    fn handle_shortcut(&mut self, key: &str) -> SessionControl {
        match key {
            "h" | "/" => self.go(View::Help),
            "a" => self.go(View::About),
            "p" => {
                self.selected_project = None;
                self.go(View::ProjectList);
            }
            "r" => self.go(View::Resume),
            "e" => self.go(View::Experience),
            "w" => self.go(View::Chat),
            "l" => self.clear_chat(),
            "s" => self.toggle_mouse(),
            "q" => return self.quit(),
            _ => {}
        }
        SessionControl::Continue
    }

    /// A lone digit typed on the project list with nothing in the input line.
    fn project_shortcut(&self, text: &str) -> Option<usize> {
        if self.view != View::ProjectList || !self.input.is_empty() {
            return None;
        }
        let mut chars = text.chars();
        let digit = chars.next()?.to_digit(10)?;
        if chars.next().is_some() || digit == 0 {
            return None;
        }
        Some(digit as usize)
    }

    fn open_by_position(&mut self, position: usize) -> bool {
        let Some(project) = self.portfolio.projects.by_position(position) else {
            return false;
        };
        self.selected_project = Some(project.id.clone());
        self.go(View::ProjectDetail);
        true
    }

    fn append_input(&mut self, text: &str) {
        let room = MAX_INPUT_CHARS.saturating_sub(self.input.chars().count());
        self.input
            .extend(text.chars().filter(|c| !c.is_control()).take(room));
    }

    fn submit(&mut self) -> SessionControl {
        if self.is_streaming() {
            return SessionControl::Continue;
        }

        let line = std::mem::take(&mut self.input);
        let line = line.trim();
        self.error = None;
        self.status = None;
        if line.is_empty() {
            return SessionControl::Continue;
        }

        match parse_command(line) {
            Some(command) => self.run_command(command),
            None => {
                self.send_chat(line);
                SessionControl::Continue
            }
        }
    }

    fn run_command(&mut self, command: Command) -> SessionControl {
        match command {
            Command::Help => self.go(View::Help),
            Command::About => self.go(View::About),
            Command::Projects => {
                self.selected_project = None;
                self.go(View::ProjectList);
            }
            Command::Open(None) => self.error = Some("Usage: /open <project-id>".to_string()),
            Command::Open(Some(id)) => {
                if self.portfolio.projects.by_id(&id).is_some() {
                    self.selected_project = Some(id);
                    self.go(View::ProjectDetail);
                } else {
                    self.error = Some(format!("Project not found: {id}"));
                }
            }
            Command::Resume => self.go(View::Resume),
            Command::Experience => self.go(View::Experience),
            Command::Clear => self.clear_chat(),
            Command::Exit => return self.quit(),
            Command::Back => self.go(View::Chat),
            Command::Unknown(word) => self.error = Some(format!("Unknown command: {word}")),
        }
        SessionControl::Continue
    }

    fn send_chat(&mut self, message: &str) {
        let Some(pipeline) = self.pipeline.as_ref() else {
            self.error = Some("AI not available".to_string());
            return;
        };

        let stream = pipeline.send(&self.id, message, &self.history);
        self.history.push(ChatMessage::user(message));
        self.response.clear();
        self.stream = Some(stream);
        self.go(View::Chat);
    }

    fn apply_stream_event(&mut self, event: StreamEvent) {
        if self.stream.is_none() {
            return;
        }
        match event {
            StreamEvent::Fragment(fragment) => self.response.push_str(&fragment),
            StreamEvent::Finished(outcome) => {
                self.stream = None;
                self.finalize_response();
                match outcome {
                    None => debug!(session_id = %self.id, "reply complete"),
                    Some(StreamError::Cancelled) => {}
                    Some(error) => self.error = Some(error.to_string()),
                }
            }
        }
    }

    /// Stops the in-flight reply, keeping whatever already arrived.
    fn interrupt_stream(&mut self) -> bool {
        let Some(mut stream) = self.stream.take() else {
            return false;
        };
        for fragment in stream.cancel_and_drain() {
            self.response.push_str(&fragment);
        }
        info!(session_id = %self.id, kept = self.response.len(), "reply interrupted");
        self.finalize_response();
        true
    }

    fn finalize_response(&mut self) {
        let response = std::mem::take(&mut self.response);
        if !response.trim().is_empty() {
            self.history.push(ChatMessage::assistant(response));
        }
    }

    fn clear_chat(&mut self) {
        self.interrupt_stream();
        self.history.clear();
        self.response.clear();
        self.go(View::Chat);
        self.set_status("Chat cleared");
    }

    fn toggle_mouse(&mut self) {
        self.mouse = !self.mouse;
        debug!(session_id = %self.id, enabled = self.mouse, "mouse reporting toggled");
        self.set_status(if self.mouse {
            "Mouse ON (scroll mode)"
        } else {
            "Mouse OFF (select mode)"
        });
    }

    fn set_status(&mut self, text: &str) {
        self.status = Some(text.to_string());
        self.status_timer = Some(STATUS_TTL);
    }

    fn quit(&mut self) -> SessionControl {
        self.stream = None;
        self.quitting = true;
        info!(session_id = %self.id, "session quit");
        SessionControl::CloseAfter(QUIT_DELAY)
    }

    fn go(&mut self, view: View) {
        if view != self.view {
            debug!(session_id = %self.id, view = view.tag(), "view changed");
        }
        self.view = view;
        self.scroll = 0;
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = usize::from(width.max(1));
        self.height = usize::from(height.max(1));
    }

    fn showing_welcome(&self) -> bool {
        self.view == View::Chat && self.history.is_empty() && !self.is_streaming()
    }

    /// The chat transcript grows at the bottom, so it scrolls back from
    /// there. Everything else scrolls down from the top.
    fn anchored_to_bottom(&self) -> bool {
        self.view == View::Chat && !self.showing_welcome()
    }

    fn scroll_by(&mut self, up: bool, amount: usize) {
        let layout = Layout::for_width(self.width);
        let max = self
            .content_lines(&layout)
            .len()
            .saturating_sub(chrome::content_rows(self.height));
        let grow = self.anchored_to_bottom() == up;
        self.scroll = if grow {
            (self.scroll + amount).min(max)
        } else {
            self.scroll.saturating_sub(amount)
        };
    }

    fn content_lines(&self, layout: &Layout) -> Vec<String> {
        let theme = &self.theme;
        let portfolio = &self.portfolio;
        match self.view {
            View::Chat if self.showing_welcome() => views::welcome(layout, theme),
            View::Chat => {
                let mut lines = vec![String::new()];
                for message in &self.history {
                    lines.extend(views::chat_message(message, layout, theme));
                }
                if self.is_streaming() {
                    lines.extend(views::streaming_message(&self.response, layout, theme));
                }
                lines
            }
            View::Help => views::help(layout, theme),
            View::About => views::about(&portfolio.bio, layout, theme),
            View::ProjectList => views::projects_list(&portfolio.projects, layout, theme),
            View::ProjectDetail => {
                let project = self
                    .selected_project
                    .as_deref()
                    .and_then(|id| portfolio.projects.by_id(id));
                views::project_detail(project, layout, theme)
            }
            View::Resume => views::resume(&portfolio.resume, layout, theme),
            View::Experience => views::experience(&portfolio.resume, layout, theme),
        }
    }

    fn hint(&self) -> Hint<'_> {
        if let Some(error) = self.error.as_deref() {
            Hint::Error(error)
        } else if let Some(status) = self.status.as_deref() {
            Hint::Status(status)
        } else if self.is_streaming() {
            Hint::Streaming
        } else if self.view != View::Chat {
            Hint::Navigate
        } else {
            Hint::Chat
        }
    }

    /// Full frame for the current state, one string per terminal row.
    pub fn render_frame(&self) -> Vec<String> {
        let theme = &self.theme;
        if self.quitting {
            return chrome::farewell(self.width, theme);
        }

        let layout = Layout::for_width(self.width);
        let mut rows = chrome::header(self.width, self.view.tag(), self.is_streaming(), theme);

        let lines = self.content_lines(&layout);
        let visible = chrome::content_rows(self.height);
        let max = lines.len().saturating_sub(visible);
        let offset = self.scroll.min(max);
        let start = if self.anchored_to_bottom() {
            max - offset
        } else {
            offset
        };

        let shown: Vec<&String> = lines.iter().skip(start).take(visible).collect();
        for line in &shown {
            rows.push(chrome::content_row(line, self.width, theme));
        }
        for _ in shown.len()..visible {
            rows.push(chrome::content_row("", self.width, theme));
        }

        rows.extend(chrome::footer(self.width, &self.input, self.hint(), theme));
        rows
    }
}
