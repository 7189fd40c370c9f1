//! REPL (Read-Eval-Print Loop) implementation for interactive chat.

use anyhow::Result;
use cirrus_session::{QueryDispatcher, QueryOptions};
use cirrus_types::{Instance, InstanceFilter};
use console::{Style, style};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

use crate::output;

const INVALID_INSTANCE_NUMBER: &str =
    "Invalid instance number. Use 'list' to see available instances.";

/// A parsed REPL line.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    Exit,
    Help,
    List,
    Context,
    History,
    Run { target: &'a str, command: &'a str },
    /// `run` without enough arguments.
    RunUsage,
    Query(&'a str),
}

impl<'a> ReplCommand<'a> {
    /// Parse a trimmed, non-empty line.
    ///
    /// The command after a `run` target is passed on exactly as typed.
    pub fn parse(line: &'a str) -> Self {
        let (head, rest) = split_word(line);

        match (head.to_ascii_lowercase().as_str(), rest.is_empty()) {
            ("exit" | "quit", true) => ReplCommand::Exit,
            ("help", true) => ReplCommand::Help,
            ("list", true) => ReplCommand::List,
            ("context", true) => ReplCommand::Context,
            ("history", true) => ReplCommand::History,
            ("run", _) => match split_word(rest) {
                (target, command) if !target.is_empty() && !command.is_empty() => {
                    ReplCommand::Run { target, command }
                }
                _ => ReplCommand::RunUsage,
            },
            _ => ReplCommand::Query(line),
        }
    }
}

/// Split off the first whitespace-delimited word; the remainder keeps its
/// inner spacing.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (s, ""),
    }
}

/// Resolve a `run` target: a 1-based index into the last listing, or an ID.
pub fn resolve_target(target: &str, last_listed: &[Instance]) -> Option<String> {
    if !target.chars().all(|c| c.is_ascii_digit()) {
        return Some(target.to_string());
    }
    let index: usize = target.parse().ok()?;
    index
        .checked_sub(1)
        .and_then(|i| last_listed.get(i))
        .map(|instance| instance.id.clone())
}

/// REPL state and configuration.
pub struct Repl {
    dispatcher: QueryDispatcher,
    options: QueryOptions,
    editor: Editor<(), DefaultHistory>,
    last_listed: Vec<Instance>,
    verbose: bool,
}

impl Repl {
    /// Create a new REPL instance.
    pub fn new(dispatcher: QueryDispatcher, options: QueryOptions, verbose: bool) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();

        let editor = Editor::with_config(config)?;

        Ok(Self {
            dispatcher,
            options,
            editor,
            last_listed: Vec::new(),
            verbose,
        })
    }

    /// Run the REPL loop.
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        match self
            .dispatcher
            .context()
            .list_instances(&InstanceFilter::default())
            .await
        {
            Ok(instances) => {
                output::print_dim(&format!("{} reachable instance(s)", instances.len()));
                self.last_listed = instances;
            }
            Err(e) => tracing::error!(error = %e, "Initial instance listing failed"),
        }
        println!();

        loop {
            let prompt = format!("{} ", style("cirrus>").cyan().bold());

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    match self.handle_line(line).await {
                        Ok(ControlFlow::Continue) => continue,
                        Ok(ControlFlow::Exit) => break,
                        Err(e) => output::print_error(&e.to_string()),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    println!();
                    output::print_dim("(Interrupted - type exit to quit)");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(e) => {
                    output::print_error(&format!("Input error: {}", e));
                    break;
                }
            }
        }

        output::print_dim("Goodbye!");
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Result<ControlFlow> {
        let context = self.dispatcher.context().clone();

        match ReplCommand::parse(line) {
            ReplCommand::Exit => return Ok(ControlFlow::Exit),
            ReplCommand::Help => self.print_help(),
            ReplCommand::List => {
                let instances = context.list_instances(&InstanceFilter::default()).await?;
                output::print_instances(&instances);
                self.last_listed = instances;
            }
            ReplCommand::Context => {
                let snapshot = context
                    .build_snapshot(&InstanceFilter::default(), true)
                    .await?;
                println!("{}", snapshot.to_json_pretty()?);
            }
            ReplCommand::History => self.print_history(),
            ReplCommand::RunUsage => {
                output::print_error("Usage: run <#|instance-id> <command>");
            }
            ReplCommand::Run { target, command } => {
                let Some(instance_id) = resolve_target(target, &self.last_listed) else {
                    output::print_error(INVALID_INSTANCE_NUMBER);
                    return Ok(ControlFlow::Continue);
                };
                output::print_dim(&format!("Running command on {}...", instance_id));
                let result = context.run_command_on_instance(&instance_id, command).await;
                output::print_result(&result);
            }
            ReplCommand::Query(message) => {
                if self.verbose {
                    output::print_dim(&format!("Asking {}...", self.dispatcher.model()));
                }
                let reply = self.dispatcher.query(message, None, self.options).await?;
                println!("{}", reply);
                println!();
            }
        }

        Ok(ControlFlow::Continue)
    }

    fn print_history(&self) {
        let history = self.dispatcher.context().history();
        if history.is_empty() {
            output::print_dim("No commands run in this session.");
            return;
        }

        let dim = Style::new().dim();
        for (i, record) in history.iter().enumerate() {
            println!(
                "{}. {} {} {}",
                i + 1,
                dim.apply_to(record.timestamp.format("%H:%M:%S")),
                style(&record.instance_id).cyan(),
                record.command
            );
            println!("   {}", dim.apply_to(format!("status: {}", record.status.as_str())));
        }
    }

    fn print_welcome(&self) {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("Cirrus Chat").bold().cyan());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!(
            "{}",
            dim.apply_to(format!("Session {}", self.dispatcher.context().session_id()))
        );
        println!(
            "{}",
            dim.apply_to("Ask a question, or type 'help' for commands. Ctrl+D to exit.")
        );
    }

    fn print_help(&self) {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("Available Commands").bold());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!("  {}  - List reachable instances", style("list").cyan());
        println!(
            "  {}  - Run a shell command (# from the last list)",
            style("run <#|id> <command>").cyan()
        );
        println!("  {}  - Show the context sent with questions", style("context").cyan());
        println!("  {}  - Show commands run in this session", style("history").cyan());
        println!("  {}  - Show this help", style("help").cyan());
        println!("  {}  - Exit the REPL", style("exit, quit").cyan());
        println!();
        println!("{}", dim.apply_to("Anything else is sent to the model."));
        println!();
    }
}

/// Control flow for the REPL.
pub enum ControlFlow {
    Continue,
    Exit,
}
