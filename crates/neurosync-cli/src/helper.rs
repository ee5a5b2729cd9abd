use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::command::{self, COMMANDS};

/// A concept offered to `/select` completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptEntry {
    pub id: String,
    pub term: String,
}

/// Rustyline helper for the study REPL.
///
/// Completes command names, file paths after `/load` and concepts of the
/// active session after `/select`. Hints show the argument a command expects.
pub struct CliHelper {
    files: FilenameCompleter,
    concepts: Vec<ConceptEntry>,
}

impl CliHelper {
    pub fn new() -> Self {
        Self {
            files: FilenameCompleter::new(),
            concepts: Vec::new(),
        }
    }

    /// Replaces the concepts offered to `/select`. Empty outside a session.
    pub fn set_concepts(&mut self, concepts: Vec<ConceptEntry>) {
        self.concepts = concepts;
    }

    fn command_candidates(&self, prefix: &str) -> Vec<Pair> {
        COMMANDS
            .iter()
            .filter(|command| command.name.starts_with(prefix))
            .map(|command| Pair {
                display: command.name.to_string(),
                replacement: if command.args.is_empty() {
                    command.name.to_string()
                } else {
                    format!("{} ", command.name)
                },
            })
            .collect()
    }

    /// Concepts whose number, id or term starts with `arg`. The replacement
    /// is always the concept number.
    fn concept_candidates(&self, arg: &str) -> Vec<Pair> {
        let needle = arg.to_lowercase();
        self.concepts
            .iter()
            .enumerate()
            .filter_map(|(i, concept)| {
                let number = (i + 1).to_string();
                let matches = number.starts_with(&needle)
                    || concept.id.to_lowercase().starts_with(&needle)
                    || concept.term.to_lowercase().starts_with(&needle);
                matches.then(|| Pair {
                    display: format!("{:>2}  {}", number, concept.term),
                    replacement: number,
                })
            })
            .collect()
    }

    fn usage_hint(&self, line: &str) -> Option<String> {
        if !line.starts_with('/') {
            return None;
        }
        match line.split_once(' ') {
            None => {
                let command = COMMANDS
                    .iter()
                    .find(|command| command.name.starts_with(line))?;
                let rest = &command.name[line.len()..];
                if command.args.is_empty() {
                    (!rest.is_empty()).then(|| rest.to_string())
                } else {
                    Some(format!("{} {}", rest, command.args))
                }
            }
            Some((name, "")) => command::find(name)
                .filter(|command| !command.args.is_empty())
                .map(|command| command.args.to_string()),
            Some(_) => None,
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let head = &line[..pos];

        match head.split_once(' ') {
            None if head.starts_with('/') => Ok((0, self.command_candidates(head))),
            Some(("/load", _)) => self.files.complete(line, pos, ctx),
            Some(("/select", arg)) => Ok((pos - arg.len(), self.concept_candidates(arg.trim()))),
            _ => Ok((pos, vec![])),
        }
    }
}

impl Highlighter for CliHelper {
    /// Known commands in cyan, unknown ones in red; free text is untouched.
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.starts_with('/') {
            return Borrowed(line);
        }
        let (name, rest) = match line.find(' ') {
            Some(index) => line.split_at(index),
            None => (line, ""),
        };
        let name = match command::find(name) {
            Some(_) => name.bright_cyan(),
            None => name.red(),
        };
        Owned(format!("{}{}", name, rest))
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        self.usage_hint(line)
    }
}

impl Validator for CliHelper {}
