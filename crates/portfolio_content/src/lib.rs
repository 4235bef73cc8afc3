//! Static portfolio content: resume, projects and bio.
//!
//! Everything here is loaded once at startup and shared read-only by every
//! session.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::ContentError;
pub use loader::{ContentLoader, Portfolio, BIO_FILE, PROJECTS_FILE, RESUME_FILE};
pub use schema::{
    Contact, Education, Experience, Project, ProjectLinks, ProjectStatus, Projects, Resume, Skills,
};
