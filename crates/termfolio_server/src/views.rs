//! Content lines for every view.
//!
//! Each function is pure: given the same content, layout and theme it
//! returns the same lines. Plain text is wrapped or truncated first and
//! styled afterwards.

use chat_provider::{ChatMessage, Role};
use portfolio_content::{Project, ProjectStatus, Projects, Resume};
use termfolio::{
    center, pad_to_width, truncate_to_width, visible_width, wrap_text_with_ansi, Layout,
    MarkdownRenderer, Panel, Style, Theme,
};

use crate::commands::{CommandKind, COMMANDS};

pub const ASSISTANT_NAME: &str = "MOHAK.AI";

const LARGE_BANNER: [&str; 6] = [
    "███╗   ███╗ ██████╗ ██╗  ██╗ █████╗ ██╗  ██╗",
    "████╗ ████║██╔═══██╗██║  ██║██╔══██╗██║ ██╔╝",
    "██╔████╔██║██║   ██║███████║███████║█████╔╝ ",
    "██║╚██╔╝██║██║   ██║██╔══██║██╔══██║██╔═██╗ ",
    "██║ ╚═╝ ██║╚██████╔╝██║  ██║██║  ██║██║  ██╗",
    "╚═╝     ╚═╝ ╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝╚═╝  ╚═╝",
];

const SMALL_BANNER: [&str; 3] = [
    "╔╦╗╔═╗╦ ╦╔═╗╦╔═",
    "║║║║ ║╠═╣╠═╣╠╩╗",
    "╩ ╩╚═╝╩ ╩╩ ╩╩ ╩",
];

const INPUT_PLACEHOLDER: &str = "enter command or chat...";

pub fn input_placeholder() -> &'static str {
    INPUT_PLACEHOLDER
}

/// Wraps plain `text` to `width` and styles each resulting line.
fn wrap_styled(text: &str, width: usize, style: Style) -> Vec<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Vec::new();
    }
    wrap_text_with_ansi(&collapsed, width.max(1))
        .into_iter()
        .map(|line| style.paint(&line))
        .collect()
}

fn fit_styled(text: &str, width: usize, style: Style) -> String {
    style.paint(&truncate_to_width(text, width))
}

fn tag_styles(theme: &Theme) -> [Style; 4] {
    [theme.cyan, theme.neon, theme.green, theme.yellow]
}

fn tag(text: &str, style: Style) -> String {
    style.paint(&format!("⟨{text}⟩"))
}

/// Lays tags out left to right, starting a new line when `width` is reached.
fn flow_tags(items: &[String], width: usize, styles: &[Style]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for (index, item) in items.iter().enumerate() {
        let item_width = visible_width(item) + 3;
        if used > 0 && used + item_width > width {
            lines.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push_str(&tag(item, styles[index % styles.len()]));
        current.push(' ');
        used += item_width;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn status_badge(status: &ProjectStatus, theme: &Theme) -> (Style, &'static str, &'static str) {
    match status {
        ProjectStatus::Active => (theme.green, "●", "● ACTIVE"),
        ProjectStatus::Completed => (theme.cyan, "◈", "◈ ARCHIVED"),
        ProjectStatus::Other(_) => (theme.yellow, "○", "○ IN_PROGRESS"),
    }
}

pub fn welcome(layout: &Layout, theme: &Theme) -> Vec<String> {
    let view = layout.view_width;
    let mut lines = vec![String::new(), String::new()];

    let welcome = format!(
        "{}{}{}",
        theme.yellow.paint("░▒▓"),
        theme.muted.paint(" WELCOME TO "),
        theme.yellow.paint("▓▒░")
    );
    lines.push(center(&welcome, view));
    lines.push(String::new());

    let banner_styles = [
        theme.yellow,
        theme.neon,
        theme.neon,
        theme.cyan,
        theme.cyan,
        theme.yellow,
    ];
    let banner: &[&str] = if layout.large_banner() {
        &LARGE_BANNER
    } else {
        &SMALL_BANNER
    };
    for (index, row) in banner.iter().enumerate() {
        let style = banner_styles[index % banner_styles.len()].bold();
        lines.push(center(&style.paint(row), view));
    }

    lines.push(String::new());
    let mut tagline = format!(
        "{}{}{}",
        theme.yellow.paint("▓▒░"),
        theme.cyan.paint(" FULL STACK · SYSTEMS · AI · DEVOPS "),
        theme.yellow.paint("░▒▓")
    );
    if visible_width(&tagline) > view {
        tagline = theme.cyan.paint("FULL STACK · SYSTEMS · AI · DEVOPS");
    }
    lines.push(center(&tagline, view));
    lines.push(String::new());

    let key = |label: &str, style: Style| style.bold().paint(label);
    let shortcuts: Vec<String> = if layout.compact_shortcuts() {
        vec![
            key("Alt+A", theme.green) + &theme.dim.paint(" about"),
            key("Alt+P", theme.yellow) + &theme.dim.paint(" projects"),
            key("Alt+R", theme.neon) + &theme.dim.paint(" resume"),
            key("Alt+E", theme.orange) + &theme.dim.paint(" experience"),
            key("Alt+H", theme.purple) + &theme.dim.paint(" help"),
            String::new(),
            theme.cyan.paint("type to chat"),
        ]
    } else {
        let pair = |left: String, right: String| {
            format!("{}{}{right}", pad_to_width(&left, 13), theme.yellow.paint("│ "))
        };
        vec![
            pair(
                key("Alt+A", theme.green) + &theme.dim.paint(" about"),
                key("Alt+P", theme.yellow) + &theme.dim.paint(" projects"),
            ),
            pair(
                key("Alt+R", theme.neon) + &theme.dim.paint(" resume"),
                key("Alt+E", theme.orange) + &theme.dim.paint(" experience"),
            ),
            pair(
                key("Alt+H", theme.purple) + &theme.dim.paint(" help"),
                key("Alt+Q", theme.red) + &theme.dim.paint(" quit"),
            ),
            String::new(),
            theme.cyan.paint("just type to chat with AI"),
        ]
    };
    lines.extend(Panel::new("SHORTCUTS").lines(shortcuts).render(layout, theme));
    lines
}

pub fn help(layout: &Layout, theme: &Theme) -> Vec<String> {
    let mut lines = vec![String::new()];

    if layout.compact_help() {
        let compact = vec![
            theme.cyan.bold().paint("Alt+") + &theme.muted.paint(" shortcuts"),
            "A about, P projects".to_string(),
            "R resume, E exp".to_string(),
            "W home, L clear".to_string(),
            "S mouse, H help".to_string(),
            "Q quit".to_string(),
            String::new(),
            theme.cyan.bold().paint("Commands:"),
            "/help /about /exit".to_string(),
        ];
        lines.extend(Panel::new("HELP").lines(compact).render(layout, theme));
        return lines;
    }

    let key = |label: &str, style: Style, action: &str| {
        format!("{} {}", style.bold().paint(label), theme.muted.paint(action))
    };
    let navigation = vec![
        theme.yellow.bold().paint("NAVIGATION"),
        String::new(),
        key("Alt+H", theme.purple, "help"),
        key("Alt+A", theme.green, "about"),
        key("Alt+P", theme.yellow, "projects"),
        key("Alt+E", theme.orange, "experience"),
        key("Alt+R", theme.neon, "resume"),
        key("Alt+W", theme.cyan, "home"),
        key("Alt+L", theme.cyan, "clear chat"),
        key("Alt+S", theme.blue, "mouse scroll on/off"),
        key("Alt+Q", theme.red, "quit"),
        String::new(),
        theme.dim.paint("Ctrl works too; ESC goes back"),
    ];
    lines.extend(Panel::new("ALT+KEY").lines(navigation).render(layout, theme));
    lines.push(String::new());

    let mut commands = vec![theme.yellow.bold().paint("COMMANDS"), String::new()];
    for entry in COMMANDS {
        let name = if entry.kind == CommandKind::Open {
            format!("{} <id>", entry.names[0])
        } else {
            entry.names[0].to_string()
        };
        let aliases = entry.names[1..].join(" ");
        let mut line = format!(
            "{} {}",
            theme.yellow.bold().paint(&name),
            theme.muted.paint(entry.summary)
        );
        if !aliases.is_empty() {
            line.push_str(&theme.dim.paint(&format!(" ({aliases})")));
        }
        commands.push(line);
    }
    lines.extend(Panel::new("SLASH").lines(commands).render(layout, theme));
    lines
}

/// `**bold**` spans inside an about-page bullet.
fn inline_bold(text: &str, theme: &Theme) -> String {
    let mut out = String::new();
    let mut rest = text;
    let mut found = false;
    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        found = true;
        out.push_str(&theme.body.paint(&rest[..start]));
        out.push_str(&theme.neon.bold().paint(&after[..end]));
        rest = &after[end + 2..];
    }
    if !found {
        return theme.body.paint(text);
    }
    out.push_str(&theme.body.paint(rest));
    out
}

pub fn about(bio: &str, layout: &Layout, theme: &Theme) -> Vec<String> {
    let cw = layout.content_width;
    let mut body = Vec::new();

    for line in bio.lines() {
        let line = line.trim_end();
        if line.starts_with("# ") {
            continue;
        }
        if let Some(title) = line.strip_prefix("## ") {
            body.push(String::new());
            body.push(theme.cyan.bold().paint(&format!("◈ {}", title.trim())));
        } else if let Some(pair) = line.strip_prefix("- **").and_then(|rest| rest.split_once("**")) {
            let (key, value) = pair;
            let value_width = cw.saturating_sub(visible_width(key) + 2).max(4);
            body.push(format!(
                "{}{}{}",
                theme.green.paint("▸ "),
                theme.neon.bold().paint(key),
                fit_styled(value, value_width, theme.body)
            ));
        } else if let Some(item) = line.strip_prefix("- ") {
            let text = truncate_to_width(&inline_bold(item, theme), cw.saturating_sub(2).max(4));
            body.push(format!("{}{text}", theme.green.paint("▸ ")));
        } else if !line.trim().is_empty() {
            body.extend(wrap_styled(line, cw.saturating_sub(2), theme.body));
        }
    }

    let mut lines = vec![String::new()];
    lines.extend(Panel::new("PROFILE").lines(body).render(layout, theme));
    lines
}

pub fn projects_list(projects: &Projects, layout: &Layout, theme: &Theme) -> Vec<String> {
    let cw = layout.content_width;
    let mut body = Vec::new();

    if projects.is_empty() {
        body.push(theme.muted.paint("No projects yet."));
        body.push(String::new());
    }

    for (index, project) in projects.projects.iter().enumerate() {
        let (status_style, icon, _) = status_badge(&project.status, theme);
        body.push(format!(
            "{}{} {}",
            theme.dim.paint(&format!("[{}] ", index + 1)),
            theme.neon.bold().paint(&project.name),
            status_style.paint(icon)
        ));
        body.push(format!(
            "{}{}",
            theme.dim.paint("    ID: "),
            theme.muted.paint(&project.id)
        ));
        body.push(format!(
            "    {}",
            fit_styled(&project.description, cw.saturating_sub(6).max(20), theme.body)
        ));
        let tags: String = project
            .tech
            .iter()
            .take(layout.max_tech_tags())
            .enumerate()
            .map(|(i, tech)| tag(tech, tag_styles(theme)[i % 4]) + " ")
            .collect();
        body.push(format!("    {tags}"));
        body.push(String::new());
    }

    body.push(theme.dim.paint(&"─".repeat(cw.saturating_sub(2).min(40))));
    body.push(theme.muted.paint("/open <id> or 1-9 to view details"));

    let mut lines = vec![String::new()];
    lines.extend(Panel::new("PROJECTS").lines(body).render(layout, theme));
    lines
}

pub fn project_detail(project: Option<&Project>, layout: &Layout, theme: &Theme) -> Vec<String> {
    let Some(project) = project else {
        return vec![
            String::new(),
            center(&theme.red.paint("⚠ PROJECT_NOT_FOUND"), layout.view_width),
        ];
    };

    let cw = layout.content_width;
    let inner = cw.saturating_sub(4);
    let (status_style, _, status_text) = status_badge(&project.status, theme);
    let mut body = vec![
        theme.dim.paint("STATUS: ") + &status_style.bold().paint(status_text),
        String::new(),
        theme.cyan.bold().paint("◈ DESCRIPTION"),
    ];
    body.extend(
        wrap_styled(&project.description, inner, theme.body)
            .into_iter()
            .map(|line| format!("  {line}")),
    );
    body.push(String::new());

    body.push(theme.green.bold().paint("◈ TECH_STACK"));
    body.extend(
        flow_tags(&project.tech, inner, &tag_styles(theme))
            .into_iter()
            .map(|line| format!("  {line}")),
    );
    body.push(String::new());

    let demo = project.links.demo.as_deref().filter(|link| !link.is_empty());
    let source = project.links.github.as_deref().filter(|link| !link.is_empty());
    if demo.is_some() || source.is_some() {
        body.push(theme.yellow.bold().paint("◈ LINKS"));
        let link_width = cw.saturating_sub(10);
        if let Some(demo) = demo {
            body.push(theme.dim.paint("  DEMO:   ") + &fit_styled(demo, link_width, theme.link));
        }
        if let Some(source) = source {
            body.push(theme.dim.paint("  SOURCE: ") + &fit_styled(source, link_width, theme.link));
        }
    }

    let mut lines = vec![String::new()];
    lines.extend(Panel::new(project.name.clone()).lines(body).render(layout, theme));
    lines
}

pub fn resume(resume: &Resume, layout: &Layout, theme: &Theme) -> Vec<String> {
    let cw = layout.content_width;
    let inner = cw.saturating_sub(4);
    let mut body = vec![
        center(&fit_styled(&resume.name, cw, theme.neon.bold()), cw),
        center(&fit_styled(&resume.title, cw, theme.cyan), cw),
    ];
    if !resume.tagline.is_empty() {
        let quoted = format!("\"{}\"", resume.tagline);
        body.push(center(&fit_styled(&quoted, inner, theme.muted.italic()), cw));
    }
    body.push(String::new());

    let contact = &resume.contact;
    if !contact.email.is_empty() {
        body.push(center(
            &(theme.green.paint("✉ ") + &fit_styled(&contact.email, inner, theme.body)),
            cw,
        ));
    }
    if !contact.website.is_empty() {
        body.push(center(
            &(theme.cyan.paint("⚡ ") + &fit_styled(&contact.website, inner, theme.link)),
            cw,
        ));
    }
    if !contact.github.is_empty() {
        body.push(center(
            &(theme.purple.paint("◈ ") + &fit_styled(&contact.github, inner, theme.body)),
            cw,
        ));
    }
    body.push(String::new());
    body.push(theme.dim.paint(&"─".repeat(cw.saturating_sub(2).min(44))));
    body.push(String::new());

    if !resume.summary.is_empty() {
        body.push(theme.purple.bold().paint("◈ SUMMARY"));
        body.extend(
            wrap_styled(&resume.summary, inner, theme.body)
                .into_iter()
                .map(|line| format!("  {line}")),
        );
        body.push(String::new());
    }

    let groups = resume.skills.groups();
    if !groups.is_empty() {
        body.push(theme.cyan.bold().paint("◈ SKILLS"));
        let group_styles = [
            theme.neon,
            theme.cyan,
            theme.green,
            theme.yellow,
            theme.purple,
            theme.orange,
            theme.blue,
        ];
        for (index, (_, skills)) in groups.iter().enumerate() {
            let style = group_styles[index % group_styles.len()];
            let shown: Vec<String> = skills.iter().take(5).cloned().collect();
            if let Some(first_line) = flow_tags(&shown, inner, &[style]).into_iter().next() {
                body.push(format!("  {first_line}"));
            }
        }
        body.push(String::new());
    }

    if !resume.education.is_empty() {
        body.push(theme.yellow.bold().paint("◈ EDUCATION"));
        for education in &resume.education {
            body.push(format!(
                "  {}",
                fit_styled(&education.degree, inner, theme.neon.bold())
            ));
            let place = if education.location.is_empty() {
                education.institution.clone()
            } else {
                format!("{}, {}", education.institution, education.location)
            };
            body.push(format!("  {}", fit_styled(&place, inner, theme.cyan)));
            let mut when = format!("  {}", theme.dim.paint(&education.period));
            if !education.score.is_empty() {
                when.push_str(" │ ");
                when.push_str(&theme.green.paint(&education.score));
            }
            body.push(when);
            body.push(String::new());
        }
    }

    if !resume.achievements.is_empty() {
        body.push(theme.green.bold().paint("◈ ACHIEVEMENTS"));
        for achievement in resume.achievements.iter().take(3) {
            body.push(
                theme.neon.paint("  ▸ ")
                    + &fit_styled(achievement, cw.saturating_sub(6), theme.body),
            );
        }
    }

    let mut lines = vec![String::new()];
    lines.extend(Panel::new("CREDENTIALS").lines(body).render(layout, theme));
    lines
}

pub fn experience(resume: &Resume, layout: &Layout, theme: &Theme) -> Vec<String> {
    let cw = layout.content_width;
    let mut body = vec![
        center(&theme.neon.bold().paint("WORK EXPERIENCE"), cw),
        center(&fit_styled(&resume.name, cw, theme.muted), cw),
        String::new(),
        theme.dim.paint(&"─".repeat(cw.saturating_sub(2).min(44))),
        String::new(),
    ];

    for (index, job) in resume.experience.iter().enumerate() {
        body.push(fit_styled(&job.role, cw.saturating_sub(2), theme.neon.bold()));
        body.push(
            theme.dim.paint("@ ") + &fit_styled(&job.company, cw.saturating_sub(4), theme.cyan.bold()),
        );
        body.push(theme.muted.paint(&format!("  {}", job.period)));
        body.push(String::new());
        for highlight in &job.highlights {
            body.push(
                theme.green.paint("  ▸ ")
                    + &fit_styled(highlight, cw.saturating_sub(6), theme.body),
            );
        }
        if index + 1 < resume.experience.len() {
            body.push(String::new());
            body.push(theme.dim.paint(&format!(
                "  {}",
                "─".repeat(cw.saturating_sub(6).min(36))
            )));
            body.push(String::new());
        }
    }

    let mut lines = vec![String::new()];
    lines.extend(Panel::new("EXPERIENCE").lines(body).render(layout, theme));
    lines
}

fn message_border_len(layout: &Layout) -> usize {
    layout.screen_width.saturating_sub(8).min(40).max(20)
}

fn markdown_renderer(layout: &Layout, theme: &Theme) -> MarkdownRenderer {
    let width = layout
        .screen_width
        .saturating_sub(6)
        .max(MarkdownRenderer::MIN_WIDTH);
    MarkdownRenderer::with_width(theme.markdown_theme(), width)
}

/// One finalized chat message, followed by a blank separator line.
pub fn chat_message(message: &ChatMessage, layout: &Layout, theme: &Theme) -> Vec<String> {
    let border_len = message_border_len(layout);
    let gutter = theme.dim.paint("│ ");
    let mut lines = Vec::new();

    match message.role {
        Role::User => {
            lines.push(theme.cyan.bold().paint(&format!(
                "┌─ YOU {}",
                "─".repeat(border_len.saturating_sub(6))
            )));
            let width = layout.screen_width.saturating_sub(8).max(1);
            for line in message.content.split('\n') {
                for wrapped in wrap_text_with_ansi(line, width) {
                    lines.push(format!("{gutter}{}", theme.body.paint(&wrapped)));
                }
            }
        }
        Role::Assistant => {
            lines.push(theme.neon.bold().paint(&format!(
                "┌─ {ASSISTANT_NAME} {}",
                "─".repeat(border_len.saturating_sub(11))
            )));
            for line in markdown_renderer(layout, theme).render(&message.content, false) {
                lines.push(format!("{gutter}{line}"));
            }
        }
    }

    lines.push(theme.dim.paint(&format!("└{}", "─".repeat(border_len))));
    lines.push(String::new());
    lines
}

/// The reply that is still arriving. Partial markdown is rendered in
/// streaming mode so an open code fence shows as code.
pub fn streaming_message(content: &str, layout: &Layout, theme: &Theme) -> Vec<String> {
    let border_len = message_border_len(layout);
    let gutter = theme.dim.paint("│ ");
    let mut lines = vec![format!(
        "{}{}",
        theme.neon.bold().paint(&format!("┌─ {ASSISTANT_NAME} ")),
        theme.neon.paint("▓▒░ streaming ░▒▓")
    )];

    if content.is_empty() {
        lines.push(format!(
            "{gutter}{}{}{}",
            theme.neon.paint("▓▒░ "),
            theme.muted.paint("initializing..."),
            theme.neon.paint(" ░▒▓")
        ));
    } else {
        for line in markdown_renderer(layout, theme).render(content, true) {
            lines.push(format!("{gutter}{line}"));
        }
        lines.push(format!("{gutter}{}", theme.neon.paint("▌")));
    }

    lines.push(theme.dim.paint(&format!("└{}", "─".repeat(border_len))));
    lines
}
