use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resume {
    pub name: String,
    pub title: String,
    pub tagline: String,
    pub contact: Contact,
    pub summary: String,
    pub experience: Vec<Experience>,
    pub skills: Skills,
    pub education: Vec<Education>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub email: String,
    pub website: String,
    pub github: String,
    pub linkedin: String,
    pub twitter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub company: String,
    pub role: String,
    pub period: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub languages: Vec<String>,
    pub frontend: Vec<String>,
    pub backend: Vec<String>,
    pub databases: Vec<String>,
    pub devops: Vec<String>,
    pub tools: Vec<String>,
    pub mobile: Vec<String>,
}

impl Skills {
    /// Non-empty skill groups with their display labels, in display order.
    pub fn groups(&self) -> Vec<(&'static str, &[String])> {
        [
            ("Languages", self.languages.as_slice()),
            ("Frontend", self.frontend.as_slice()),
            ("Backend", self.backend.as_slice()),
            ("Databases", self.databases.as_slice()),
            ("DevOps", self.devops.as_slice()),
            ("Tools", self.tools.as_slice()),
            ("Mobile", self.mobile.as_slice()),
        ]
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub location: String,
    pub period: String,
    pub score: String,
}

/// Closed status vocabulary. `active` and `completed` are recognised;
/// anything else (`archived`, `in_progress`, empty) keeps its raw text
/// under [`ProjectStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectStatus {
    Active,
    Completed,
    Other(String),
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl ProjectStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "completed" => Self::Completed,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProjectStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProjectStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tech: Vec<String>,
    pub status: ProjectStatus,
    pub links: ProjectLinks,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projects {
    pub projects: Vec<Project>,
}

impl Projects {
    pub fn by_id(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    /// One-based position as shown in the project list.
    pub fn by_position(&self, position: usize) -> Option<&Project> {
        position
            .checked_sub(1)
            .and_then(|index| self.projects.get(index))
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
