//! Interactive front-end over [`FlowController`].

use std::fs;
use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use neurosync_application::{ActionOutcome, FlowController, FlowState, StudySessionController};
use neurosync_core::IngestDraft;
use neurosync_core::ingest::MIN_TEXT_CHARS;
use neurosync_core::session::{ConceptMode, SessionView, SimulationPhase, StudySession};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use crate::command::{COMMANDS, Command};
use crate::helper::{CliHelper, ConceptEntry};

pub struct Repl {
    flow: FlowController,
    draft: IngestDraft,
}

impl Repl {
    pub fn new(flow: FlowController) -> Self {
        Self {
            flow,
            draft: IngestDraft::new(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(CliHelper::new()));

        println!("{}", "=== NeuroSync ===".bright_magenta().bold());
        println!(
            "{}",
            "Paste study material (more than 50 characters) or /load a .pdf, .md or .txt file, then /start. /help lists commands."
                .bright_black()
        );
        println!();

        loop {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line.as_str());

                    let command = Command::parse(&line);
                    if command == Command::Quit {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    self.dispatch(command).await;
                    if let Some(helper) = rl.helper_mut() {
                        helper.set_concepts(self.concept_entries());
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "CTRL-D detected. Exiting...".bright_green());
                    break;
                }
                Err(err) => {
                    eprintln!("{}", format!("Error: {:?}", err).red());
                    break;
                }
            }
        }
        Ok(())
    }

    /// Loads a file into the ingest draft.
    pub fn load_file(&mut self, path: &Path) {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let result = fs::read(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
            .and_then(|bytes| {
                self.draft
                    .load_file(&file_name, None, &bytes)
                    .map_err(|e| e.user_message())
            });

        match result {
            Ok(()) => {
                let size = match self.draft.file() {
                    Some(_) => "PDF attached".to_string(),
                    None => format!("{} characters", self.draft.text().chars().count()),
                };
                println!("{}", format!("Loaded {} ({})", file_name, size).green());
                self.print_draft_status();
            }
            Err(message) => println!("{}", message.red()),
        }
    }

    fn concept_entries(&self) -> Vec<ConceptEntry> {
        self.flow
            .session()
            .map(|controller| {
                controller
                    .session()
                    .data()
                    .concepts
                    .iter()
                    .map(|concept| ConceptEntry {
                        id: concept.id.clone(),
                        term: concept.term.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn prompt(&self) -> String {
        match self.flow.session() {
            Some(controller) => match controller.session().view() {
                SessionView::DataCore => "core> ".to_string(),
                SessionView::Simulation => "sim> ".to_string(),
            },
            None => ">> ".to_string(),
        }
    }

    async fn dispatch(&mut self, command: Command) {
        match command {
            Command::Help => print_help(),
            Command::Invalid(message) => println!("{}", message.yellow()),
            Command::Load(path) => self.with_ingestion(|repl| repl.load_file(&path)),
            Command::Clear => self.with_ingestion(|repl| {
                repl.draft.clear();
                println!("{}", "Draft cleared.".bright_black());
            }),
            Command::Start => self.start().await,
            Command::Text(text) => self.free_text(text),
            Command::Exit => match self.flow.exit_session() {
                Ok(()) => {
                    self.draft.clear();
                    println!("{}", "Session closed. Ready for new material.".bright_green());
                }
                Err(err) => println!("{}", err.to_string().yellow()),
            },
            command => self.session_command(command).await,
        }
    }

    fn with_ingestion(&mut self, action: impl FnOnce(&mut Self)) {
        if self.flow.state() == FlowState::Ingestion {
            action(self);
        } else {
            println!("{}", "Leave the session with /exit first.".yellow());
        }
    }

    fn free_text(&mut self, text: String) {
        match self.flow.state() {
            FlowState::Ingestion => {
                let mut material = self.draft.text().to_string();
                if !material.is_empty() {
                    material.push('\n');
                }
                material.push_str(&text);
                self.draft.set_text(material);
                self.print_draft_status();
            }
            FlowState::SessionActive => {
                let Some(controller) = self.flow.session_mut() else {
                    return;
                };
                let session = controller.session_mut();
                match session.view() {
                    SessionView::DataCore if session.concept_mode() == ConceptMode::SyncProtocol => {
                        if session.challenge().locked {
                            println!("{}", "This concept is already synced.".bright_black());
                        } else {
                            session.set_sync_answer(text);
                            println!("{}", "Answer recorded. /submit to send it.".bright_black());
                        }
                    }
                    SessionView::Simulation => match session.set_defense(text) {
                        Ok(()) => println!("{}", "Answer recorded. /submit to send it.".bright_black()),
                        Err(err) => println!("{}", err.to_string().yellow()),
                    },
                    SessionView::DataCore => println!(
                        "{}",
                        "Select a concept and open /sync before typing an answer.".yellow()
                    ),
                }
            }
            _ => println!("{}", "Nothing accepts text right now.".yellow()),
        }
    }

    async fn start(&mut self) {
        if self.flow.state() != FlowState::Ingestion {
            println!("{}", "A session is already active. /exit to leave it.".yellow());
            return;
        }
        let input = match self.draft.build() {
            Ok(input) => input,
            Err(err) => {
                println!("{}", err.user_message().yellow());
                return;
            }
        };

        println!("{}", format!("Processing {}...", input.label()).bright_black());
        match self.flow.start(input).await {
            Ok(FlowState::SessionActive) => {
                if let Some(controller) = self.flow.session() {
                    print_session_header(controller.session());
                    print_concepts(controller.session());
                }
            }
            Ok(_) => {
                let message = self
                    .flow
                    .ingestion_error()
                    .unwrap_or("Session generation failed.");
                println!("{}", message.red());
                println!("{}", "Your material is kept. Try /start again.".bright_black());
            }
            Err(err) => println!("{}", err.to_string().red()),
        }
    }

    async fn session_command(&mut self, command: Command) {
        let Some(controller) = self.flow.session_mut() else {
            println!("{}", "No active session. Provide material and /start.".yellow());
            return;
        };

        match command {
            Command::Concepts => print_concepts(controller.session()),
            Command::Select(target) => {
                let concept_id = resolve_concept(controller.session(), &target);
                match controller.session_mut().select_concept(&concept_id) {
                    Ok(()) => {
                        controller.switch_view(SessionView::DataCore);
                        print_selected(controller.session());
                    }
                    Err(err) => println!("{}", err.to_string().yellow()),
                }
            }
            Command::Overview => match controller.session_mut().show_overview() {
                Ok(()) => print_selected(controller.session()),
                Err(err) => println!("{}", err.to_string().yellow()),
            },
            Command::Dive => {
                println!("{}", "Decrypting deep dive...".bright_black());
                let outcome = controller.request_deep_dive().await;
                report(controller, outcome, print_selected);
            }
            Command::Sync => {
                println!("{}", "Generating challenge...".bright_black());
                let outcome = controller.initiate_sync().await;
                report(controller, outcome, print_selected);
            }
            Command::Submit => match controller.session().view() {
                SessionView::DataCore => {
                    println!("{}", "Evaluating...".bright_black());
                    let outcome = controller.submit_sync().await;
                    report(controller, outcome, print_selected);
                }
                SessionView::Simulation => {
                    let outcome = controller.submit_answer().await;
                    report(controller, outcome, print_question);
                }
            },
            Command::Quiz => {
                controller.switch_view(SessionView::Simulation);
                print_question(controller.session());
            }
            Command::Core => {
                controller.switch_view(SessionView::DataCore);
                print_concepts(controller.session());
            }
            Command::Pick(option) => match controller.session_mut().select_option(option) {
                Ok(()) => print_question(controller.session()),
                Err(err) => println!("{}", err.to_string().yellow()),
            },
            Command::Next => match controller.advance() {
                Ok(_) => print_question(controller.session()),
                Err(err) => println!("{}", err.to_string().yellow()),
            },
            Command::Stats => print_stats(controller.session()),
            _ => {}
        }
    }

    fn print_draft_status(&self) {
        if self.draft.can_start() {
            println!("{}", "Ready. Type /start to build the session.".bright_black());
        } else {
            println!(
                "{}",
                format!(
                    "{} characters so far; more than {} needed.",
                    self.draft.text().chars().count(),
                    MIN_TEXT_CHARS
                )
                .bright_black()
            );
        }
    }
}

fn report(
    controller: &mut StudySessionController,
    outcome: ActionOutcome,
    render: fn(&StudySession),
) {
    match outcome {
        ActionOutcome::Done | ActionOutcome::Cached => render(controller.session()),
        ActionOutcome::Ignored => println!("{}", "Already in progress.".bright_black()),
        ActionOutcome::Rejected(message) => println!("{}", message.yellow()),
        ActionOutcome::Failed(message) => {
            let notice = controller.session_mut().take_notice().unwrap_or(message);
            println!("{}", notice.red());
        }
    }
}

/// Accepts a 1-based concept number or a concept id.
fn resolve_concept(session: &StudySession, target: &str) -> String {
    target
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| session.data().concepts.get(i))
        .map(|concept| concept.id.clone())
        .unwrap_or_else(|| target.to_string())
}

fn print_help() {
    println!(
        "  {:<22} {}",
        "<text>".bright_cyan(),
        "add study material, or answer the open question"
    );
    for command in COMMANDS {
        let usage = format!("{} {}", command.name, command.args);
        println!("  {:<22} {}", usage.trim_end().bright_cyan(), command.summary);
    }
}

fn print_session_header(session: &StudySession) {
    println!();
    println!("{}", session.data().title.bright_magenta().bold());
    println!("{}", session.data().summary);
    println!();
}

fn print_concepts(session: &StudySession) {
    let selected = session.selected_concept_id();
    for (i, concept) in session.data().concepts.iter().enumerate() {
        let marker = if concept.mastered { "[synced]" } else { "[      ]" };
        let line = format!("{:>2}. {} {}", i + 1, marker, concept.term);
        if Some(concept.id.as_str()) == selected {
            println!("{}", line.bright_yellow());
        } else if concept.mastered {
            println!("{}", line.green());
        } else {
            println!("{}", line);
        }
    }
}

fn print_selected(session: &StudySession) {
    let Some(concept) = session
        .selected_concept_id()
        .and_then(|id| session.data().concept(id))
    else {
        println!("{}", "No concept selected. Use /select.".yellow());
        return;
    };

    println!(
        "{}",
        format!("{} [{}]", concept.term, session.concept_mode()).bright_magenta()
    );
    match session.concept_mode() {
        ConceptMode::Overview => {
            println!("{}", concept.definition);
            println!("{} {}", "Analogy:".bright_blue(), concept.analogy);
        }
        ConceptMode::DeepDive => match session.deep_dive(&concept.id) {
            Some(content) => {
                println!("{}", "Theoretical underpinnings".bright_blue());
                println!("{}", content.theoretical_underpinnings);
                println!("{}", "Real-world application".bright_blue());
                println!("{}", content.real_world_application);
                println!("{}", "Interdisciplinary connection".bright_blue());
                println!("{}", content.interdisciplinary_connection);
            }
            None => println!("{}", "Not loaded yet. Use /dive.".bright_black()),
        },
        ConceptMode::SyncProtocol => {
            let challenge = session.challenge();
            match &challenge.question {
                Some(question) => println!("{} {}", "Challenge:".bright_blue(), question),
                None => println!("{}", "No challenge yet. Use /sync.".bright_black()),
            }
            if !challenge.answer.is_empty() {
                println!("{} {}", "Your answer:".bright_blue(), challenge.answer);
            }
            if let Some(evaluation) = &challenge.evaluation {
                let verdict = if evaluation.passed {
                    format!("SYNCED ({}/100)", evaluation.score).green()
                } else {
                    format!("REJECTED ({}/100)", evaluation.score).red()
                };
                println!("{} {}", verdict, evaluation.feedback);
            } else if challenge.question.is_some() && challenge.answer.is_empty() {
                println!("{}", "Type your answer, then /submit.".bright_black());
            }
        }
    }
}

fn print_question(session: &StudySession) {
    let quiz = session.quiz();
    if quiz.phase == SimulationPhase::Complete {
        println!("{}", "Simulation complete.".bright_green().bold());
        print_stats(session);
        return;
    }
    let Some(question) = session.current_question() else {
        return;
    };

    println!(
        "{}",
        format!(
            "Question {}/{} [{}] {}",
            quiz.index + 1,
            quiz.total(),
            question.question_type,
            question.difficulty
        )
        .bright_magenta()
    );
    println!("{}", question.question);
    for (i, option) in question.options.iter().flatten().enumerate() {
        let line = format!("  {}. {}", i + 1, option);
        if quiz.selected_option == Some(i) {
            println!("{}", line.bright_yellow());
        } else {
            println!("{}", line);
        }
    }

    match (quiz.phase, &quiz.outcome) {
        (SimulationPhase::Answered, Some(outcome)) => {
            let verdict = if outcome.correct {
                "Correct".green()
            } else {
                "Incorrect".red()
            };
            let score = outcome
                .score
                .map(|s| format!(" ({}/100)", s))
                .unwrap_or_default();
            println!("{}{} {:+}", verdict, score, outcome.delta);
            println!("{}", outcome.feedback);
            println!("{}", "/next to continue.".bright_black());
        }
        (SimulationPhase::Answering, _) if question.question_type.is_free_text() => {
            println!("{}", "Type your defense, then /submit.".bright_black());
        }
        (SimulationPhase::Answering, _) => {
            println!("{}", "/pick <n>, then /submit.".bright_black());
        }
        _ => {}
    }
}

fn print_stats(session: &StudySession) {
    let stats = session.stats();
    let progress = session.progress();
    println!(
        "Synced nodes {}/{}  Stability {:.0}%  Streak {}",
        stats.synced_nodes, progress.total_concepts, stats.stability, stats.streak
    );
    println!(
        "Questions answered {}/{}",
        progress.answered_questions, progress.total_questions
    );
    let trend: Vec<String> = session
        .history()
        .iter()
        .map(|sample| format!("{:.0}", sample.stability))
        .collect();
    println!("{} {}", "Stability history:".bright_blue(), trend.join(" > "));
}
