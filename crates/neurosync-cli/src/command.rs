use std::path::PathBuf;

/// A slash command as shown in help, completion and hints.
pub struct CommandSpec {
    pub name: &'static str,
    /// Argument placeholder, empty when the command takes none.
    pub args: &'static str,
    pub summary: &'static str,
}

const fn spec(name: &'static str, args: &'static str, summary: &'static str) -> CommandSpec {
    CommandSpec {
        name,
        args,
        summary,
    }
}

pub const COMMANDS: &[CommandSpec] = &[
    spec("/load", "<path>", "load a .pdf, .md or .txt file"),
    spec("/clear", "", "clear the material draft"),
    spec("/start", "", "generate the study session"),
    spec("/concepts", "", "list concepts (data core)"),
    spec("/select", "<number|id>", "select a concept"),
    spec("/overview", "", "show the selected concept"),
    spec("/dive", "", "deep dive into the selected concept"),
    spec("/sync", "", "get a new challenge for the selected concept"),
    spec("/submit", "", "submit the challenge or quiz answer"),
    spec("/quiz", "", "switch to the simulation"),
    spec("/core", "", "switch to the data core"),
    spec("/pick", "<option>", "choose a quiz option"),
    spec("/next", "", "next quiz question"),
    spec("/stats", "", "show stability and progress"),
    spec("/exit", "", "leave the session"),
    spec("/help", "", "list commands"),
    spec("/quit", "", "exit NeuroSync"),
];

pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|command| command.name == name)
}

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(PathBuf),
    Clear,
    Start,
    Concepts,
    Select(String),
    Overview,
    Dive,
    Sync,
    Submit,
    Quiz,
    Core,
    /// Zero-based option index.
    Pick(usize),
    Next,
    Stats,
    Exit,
    Help,
    Quit,
    /// Free text: study material while ingesting, otherwise an answer.
    Text(String),
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line == "quit" {
            return Self::Quit;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Text(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "load" if arg.is_empty() => Self::Invalid("Usage: /load <path>".into()),
            "load" => Self::Load(PathBuf::from(arg)),
            "clear" => Self::Clear,
            "start" => Self::Start,
            "concepts" => Self::Concepts,
            "select" if arg.is_empty() => Self::Invalid("Usage: /select <number|id>".into()),
            "select" => Self::Select(arg.to_string()),
            "overview" => Self::Overview,
            "dive" => Self::Dive,
            "sync" => Self::Sync,
            "submit" => Self::Submit,
            "quiz" => Self::Quiz,
            "core" => Self::Core,
            "pick" => match arg.parse::<usize>() {
                Ok(n) if n >= 1 => Self::Pick(n - 1),
                _ => Self::Invalid("Usage: /pick <option number, starting at 1>".into()),
            },
            "next" => Self::Next,
            "stats" => Self::Stats,
            "exit" => Self::Exit,
            "help" => Self::Help,
            "quit" => Self::Quit,
            other => Self::Invalid(format!("Unknown command '/{}'. Type /help.", other)),
        }
    }
}
