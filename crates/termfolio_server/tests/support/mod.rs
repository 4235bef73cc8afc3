#![allow(dead_code)]

use std::sync::Arc;

use chat_provider::ChatProvider;
use portfolio_content::{
    Contact, Education, Experience, Portfolio, Project, ProjectLinks, ProjectStatus, Projects,
    Resume, Skills,
};
use termfolio::{strip_escapes, Theme};
use termfolio_server::{InputEvent, Session, SessionControl, SessionEvent, StreamPipeline};

pub fn portfolio() -> Portfolio {
    Portfolio {
        resume: Resume {
            name: "Ada Example".to_string(),
            title: "Systems Engineer".to_string(),
            tagline: "Builds small sharp tools".to_string(),
            contact: Contact {
                email: "ada@example.com".to_string(),
                website: "https://example.com".to_string(),
                github: "github.com/ada".to_string(),
                ..Contact::default()
            },
            summary: "Ten years of backend and infrastructure work.".to_string(),
            experience: vec![
                Experience {
                    company: "Acme".to_string(),
                    role: "Staff Engineer".to_string(),
                    period: "2020 - now".to_string(),
                    highlights: vec!["Cut p99 latency in half".to_string()],
                },
                Experience {
                    company: "Initech".to_string(),
                    role: "Engineer".to_string(),
                    period: "2015 - 2020".to_string(),
                    highlights: vec!["Shipped the billing rewrite".to_string()],
                },
            ],
            skills: Skills {
                languages: vec!["Rust".to_string(), "Go".to_string()],
                devops: vec!["Kubernetes".to_string()],
                ..Skills::default()
            },
            education: vec![Education {
                institution: "State University".to_string(),
                degree: "BSc Computer Science".to_string(),
                period: "2011 - 2015".to_string(),
                ..Education::default()
            }],
            achievements: vec!["Speaker at RustConf".to_string()],
        },
        projects: Projects {
            projects: vec![
                project("termfolio", "Termfolio", ProjectStatus::Active),
                project("ledger", "Ledger", ProjectStatus::Completed),
                project("sketch", "Sketch", ProjectStatus::parse("in-progress")),
            ],
        },
        bio: "# Ada\n## About\nI build things.\n- **Based in** Lisbon\n- Open source".to_string(),
    }
}

fn project(id: &str, name: &str, status: ProjectStatus) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} does one thing well."),
        tech: vec!["Rust".to_string(), "Tokio".to_string()],
        status,
        links: ProjectLinks {
            demo: None,
            github: Some(format!("https://github.com/ada/{id}")),
        },
    }
}

pub fn session(width: u16, height: u16) -> Session {
    Session::new("test", Arc::new(portfolio()), None, width, height).with_theme(Theme::plain())
}

pub fn session_with(provider: Arc<dyn ChatProvider>, width: u16, height: u16) -> Session {
    Session::new(
        "test",
        Arc::new(portfolio()),
        Some(StreamPipeline::new(provider)),
        width,
        height,
    )
    .with_theme(Theme::plain())
}

pub fn key(session: &mut Session, key_id: &str) -> SessionControl {
    session.handle_event(SessionEvent::Input(InputEvent::key(key_id)))
}

pub fn type_text(session: &mut Session, text: &str) {
    session.handle_event(SessionEvent::Input(InputEvent::text(text)));
}

/// Types `line` and presses enter.
pub fn submit(session: &mut Session, line: &str) -> SessionControl {
    type_text(session, line);
    key(session, "enter")
}

/// Applies stream events until the in-flight reply finishes.
pub async fn pump(session: &mut Session) {
    while session.is_streaming() {
        let event = session.next_stream_event().await;
        session.handle_event(SessionEvent::Stream(event));
    }
}

pub fn screen(session: &Session) -> String {
    strip_escapes(&session.render_frame().join("\n"))
}
