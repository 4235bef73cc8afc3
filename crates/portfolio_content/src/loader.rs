use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::ContentError;
use crate::schema::{Projects, Resume};

pub const RESUME_FILE: &str = "resume.json";
pub const PROJECTS_FILE: &str = "projects.json";
pub const BIO_FILE: &str = "bio.md";

/// Reads content files from one directory.
#[derive(Debug, Clone)]
pub struct ContentLoader {
    base_path: PathBuf,
}

impl ContentLoader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn load_resume(&self) -> Result<Resume, ContentError> {
        self.load_json(RESUME_FILE)
    }

    pub fn load_projects(&self) -> Result<Projects, ContentError> {
        self.load_json(PROJECTS_FILE)
    }

    pub fn load_bio(&self) -> Result<String, ContentError> {
        let path = self.base_path.join(BIO_FILE);
        fs::read_to_string(&path).map_err(|source| ContentError::io(path, source))
    }

    /// Loads all three files. Any failure is returned as-is.
    pub fn load_all(&self) -> Result<Portfolio, ContentError> {
        let portfolio = Portfolio {
            resume: self.load_resume()?,
            projects: self.load_projects()?,
            bio: self.load_bio()?,
        };
        info!(
            path = %self.base_path.display(),
            projects = portfolio.projects.len(),
            "portfolio content loaded"
        );
        Ok(portfolio)
    }

    fn load_json<T: DeserializeOwned>(&self, file: &str) -> Result<T, ContentError> {
        let path = self.base_path.join(file);
        let data = fs::read_to_string(&path).map_err(|source| ContentError::io(&path, source))?;
        serde_json::from_str(&data).map_err(|source| ContentError::parse(path, source))
    }
}

/// The full content bundle handed to every session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Portfolio {
    pub resume: Resume,
    pub projects: Projects,
    pub bio: String,
}
