//! Session engine for the terminal portfolio.
//!
//! A connection is admitted by [`admission::AdmissionController`], decoded by
//! [`input::InputDecoder`] and driven by one [`session::Session`] inside
//! [`runtime::run_connection`]. Chat replies stream through
//! [`pipeline::StreamPipeline`] into the same single-threaded loop.

pub mod admission;
pub mod chrome;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod pipeline;
pub mod runtime;
pub mod server;
pub mod session;
pub mod views;

pub use admission::{AdmissionController, AdmissionGuard, DEFAULT_MAX_PER_ADDRESS};
pub use config::{Args, EnvConfig, ServerConfig};
pub use error::ServerError;
pub use input::{InputDecoder, InputEvent, MouseAction};
pub use pipeline::{ActiveStream, StreamEvent, StreamPipeline};
pub use runtime::{run_connection, RuntimeConfig};
pub use server::Server;
pub use session::{Session, SessionControl, SessionEvent, View};
