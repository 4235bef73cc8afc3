//! Slash command table.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    About,
    Projects,
    Open,
    Resume,
    Experience,
    Clear,
    Exit,
    Back,
}

#[derive(Debug, Clone, Copy)]
pub struct CommandDef {
    pub kind: CommandKind,
    /// Canonical name first.
    pub names: &'static [&'static str],
    pub summary: &'static str,
}

pub const COMMANDS: &[CommandDef] = &[
    CommandDef {
        kind: CommandKind::Help,
        names: &["/help", "/h", "/?"],
        summary: "show help",
    },
    CommandDef {
        kind: CommandKind::About,
        names: &["/about", "/bio"],
        summary: "profile",
    },
    CommandDef {
        kind: CommandKind::Projects,
        names: &["/projects", "/p"],
        summary: "list",
    },
    CommandDef {
        kind: CommandKind::Open,
        names: &["/open", "/o"],
        summary: "view",
    },
    CommandDef {
        kind: CommandKind::Resume,
        names: &["/resume", "/cv", "/r"],
        summary: "credentials",
    },
    CommandDef {
        kind: CommandKind::Experience,
        names: &["/exp", "/experience", "/work"],
        summary: "work history",
    },
    CommandDef {
        kind: CommandKind::Clear,
        names: &["/clear", "/cls"],
        summary: "clear chat",
    },
    CommandDef {
        kind: CommandKind::Exit,
        names: &["/exit", "/quit", "/q"],
        summary: "quit",
    },
    CommandDef {
        kind: CommandKind::Back,
        names: &["/back", "/b"],
        summary: "back to chat",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    About,
    Projects,
    /// `None` when the id argument is missing.
    Open(Option<String>),
    Resume,
    Experience,
    Clear,
    Exit,
    Back,
    /// Lowercased command word that matched nothing.
    Unknown(String),
}

/// Parses a submitted line. Returns `None` for anything that is not a slash
/// command, which then goes to chat.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if !line.starts_with('/') {
        return None;
    }

    let mut parts = line.split_whitespace();
    let word = parts.next()?.to_lowercase();
    let Some(entry) = COMMANDS
        .iter()
        .find(|entry| entry.names.contains(&word.as_str()))
    else {
        return Some(Command::Unknown(word));
    };

    Some(match entry.kind {
        CommandKind::Help => Command::Help,
        CommandKind::About => Command::About,
        CommandKind::Projects => Command::Projects,
        CommandKind::Open => Command::Open(parts.next().map(str::to_string)),
        CommandKind::Resume => Command::Resume,
        CommandKind::Experience => Command::Experience,
        CommandKind::Clear => Command::Clear,
        CommandKind::Exit => Command::Exit,
        CommandKind::Back => Command::Back,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_command, Command};

    #[test]
    fn aliases_resolve_case_insensitively() {
        assert_eq!(parse_command("/HELP"), Some(Command::Help));
        assert_eq!(parse_command("/?"), Some(Command::Help));
        assert_eq!(parse_command("/bio"), Some(Command::About));
        assert_eq!(parse_command("/cv"), Some(Command::Resume));
        assert_eq!(parse_command("/work"), Some(Command::Experience));
        assert_eq!(parse_command("/cls"), Some(Command::Clear));
        assert_eq!(parse_command("/q"), Some(Command::Exit));
        assert_eq!(parse_command("/b"), Some(Command::Back));
    }

    #[test]
    fn open_keeps_id_case_and_tolerates_missing_argument() {
        assert_eq!(
            parse_command("/open  MyProj extra"),
            Some(Command::Open(Some("MyProj".to_string())))
        );
        assert_eq!(parse_command("/o"), Some(Command::Open(None)));
    }

    #[test]
    fn unknown_and_free_text() {
        assert_eq!(
            parse_command("/Nope arg"),
            Some(Command::Unknown("/nope".to_string()))
        );
        assert_eq!(parse_command("hello /help"), None);
    }
}
