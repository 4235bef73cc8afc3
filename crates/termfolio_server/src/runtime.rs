//! The per-connection event loop.
//!
//! One task per connection waits on input, the in-flight reply, its timers
//! and the shutdown token, applies whichever fires to the [`Session`] and
//! writes a fresh frame. Nothing else touches the session.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::chrome::{encode_frame, mouse_mode, ENTER_SCREEN, RESTORE_SCREEN};
use crate::config::DEFAULT_IDLE_TIMEOUT_SECS;
use crate::error::ServerError;
use crate::input::{InputDecoder, InputEvent};
use crate::pipeline::StreamEvent;
use crate::session::{Session, SessionControl, SessionEvent};

/// How long a lone `ESC` waits for the rest of a sequence before it is
/// taken as the escape key.
pub const DEFAULT_ESCAPE_FLUSH: Duration = Duration::from_millis(30);

const READ_BUFFER: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub idle_timeout: Duration,
    pub escape_flush: Duration,
}

impl RuntimeConfig {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            escape_flush: DEFAULT_ESCAPE_FLUSH,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS))
    }
}

enum Step {
    Read(usize),
    Closed,
    ReadFailed(std::io::Error),
    EscapeFlush,
    StatusExpired,
    Stream(StreamEvent),
    Idle,
    Cancelled,
}

/// Drives `session` until the client leaves, quits, idles out or `cancel`
/// fires. The terminal is switched to the alternate screen for the duration
/// and restored on the way out, whatever the outcome.
pub async fn run_connection<R, W>(
    mut session: Session,
    mut reader: R,
    mut writer: W,
    config: RuntimeConfig,
    cancel: CancellationToken,
) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let peer = session.id().to_string();
    writer
        .write_all(ENTER_SCREEN.as_bytes())
        .await
        .map_err(|error| ServerError::transport(&peer, error))?;

    let result = drive(&mut session, &mut reader, &mut writer, config, &cancel).await;

    if writer.write_all(RESTORE_SCREEN.as_bytes()).await.is_ok() {
        let _ = writer.flush().await;
    }
    let _ = writer.shutdown().await;
    result
}

async fn drive<R, W>(
    session: &mut Session,
    reader: &mut R,
    writer: &mut W,
    config: RuntimeConfig,
    cancel: &CancellationToken,
) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut decoder = InputDecoder::new();
    let mut buffer = [0u8; READ_BUFFER];
    let mut flush_at: Option<Instant> = None;
    let mut status_at: Option<Instant> = None;
    let mut mouse = session.mouse_enabled();
    let idle = sleep(config.idle_timeout);
    tokio::pin!(idle);

    write_frame(session, writer).await?;

    loop {
        let step = tokio::select! {
            _ = cancel.cancelled() => Step::Cancelled,
            read = reader.read(&mut buffer) => match read {
                Ok(0) => Step::Closed,
                Ok(count) => Step::Read(count),
                Err(error) => Step::ReadFailed(error),
            },
            _ = sleep_until(flush_at.unwrap_or_else(Instant::now)), if flush_at.is_some() => {
                Step::EscapeFlush
            }
            _ = sleep_until(status_at.unwrap_or_else(Instant::now)), if status_at.is_some() => {
                Step::StatusExpired
            }
            event = session.next_stream_event() => Step::Stream(event),
            _ = &mut idle => Step::Idle,
        };

        let events: Vec<SessionEvent> = match step {
            Step::Cancelled | Step::Closed => {
                session.handle_event(SessionEvent::Disconnect);
                return Ok(());
            }
            Step::ReadFailed(error) => {
                session.handle_event(SessionEvent::Disconnect);
                debug!(session_id = %session.id(), error = %error, "read failed");
                return Err(ServerError::transport(session.id(), error));
            }
            Step::Read(count) => {
                idle.as_mut().reset(Instant::now() + config.idle_timeout);
                decoder
                    .feed(&buffer[..count])
                    .into_iter()
                    .map(input_to_event)
                    .collect()
            }
            Step::EscapeFlush => decoder.flush().into_iter().map(input_to_event).collect(),
            Step::StatusExpired => {
                status_at = None;
                vec![SessionEvent::StatusExpired]
            }
            Step::Stream(event) => vec![SessionEvent::Stream(event)],
            Step::Idle => vec![SessionEvent::IdleTimeout],
        };

        flush_at = if decoder.has_pending() {
            flush_at.or_else(|| Some(Instant::now() + config.escape_flush))
        } else {
            None
        };

        for event in events {
            let control = session.handle_event(event);
            if let Some(ttl) = session.take_status_timer() {
                status_at = Some(Instant::now() + ttl);
            }
            match control {
                SessionControl::Continue => {}
                SessionControl::Close => return Ok(()),
                SessionControl::CloseAfter(delay) => {
                    write_frame(session, writer).await?;
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = sleep(delay) => {}
                    }
                    return Ok(());
                }
            }
        }

        if session.mouse_enabled() != mouse {
            mouse = session.mouse_enabled();
            write_raw(session, writer, mouse_mode(mouse)).await?;
        }
        write_frame(session, writer).await?;
    }
}

fn input_to_event(input: InputEvent) -> SessionEvent {
    match input {
        InputEvent::Resize { columns, rows } => SessionEvent::Resize {
            width: columns,
            height: rows,
        },
        other => SessionEvent::Input(other),
    }
}

async fn write_frame<W>(session: &Session, writer: &mut W) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    write_raw(session, writer, &encode_frame(&session.render_frame())).await
}

async fn write_raw<W>(session: &Session, writer: &mut W, data: &str) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(data.as_bytes())
        .await
        .map_err(|error| ServerError::transport(session.id(), error))?;
    writer
        .flush()
        .await
        .map_err(|error| ServerError::transport(session.id(), error))
}
