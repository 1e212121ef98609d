//! Interactive planning REPL
//!
//! A thin front end over the orchestrator: each line is one turn, slash
//! commands inspect or approve the plan.

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::session::{Orchestrator, TurnReply, TurnState};

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}

/// Interactive REPL session bound to one planning conversation
pub struct ReplSession {
    orchestrator: Arc<Orchestrator>,
    session_id: Option<String>,
}

impl ReplSession {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            session_id: None,
        }
    }

    /// Run the REPL main loop
    ///
    /// With `resume` set the conversation edits the stored plan.
    pub async fn run(&mut self, resume: bool) -> Result<()> {
        self.print_welcome(resume);

        let opened = if resume {
            self.orchestrator.resume_session().await
        } else {
            self.orchestrator.start_session().await
        };
        let (session_id, opening) = opened.map_err(|e| eyre::eyre!("Failed to start session: {}", e))?;
        println!("{} {}", "PartyHat:".bright_blue(), opening);
        println!();
        self.session_id = Some(session_id);

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else if self.process_user_input(input).await {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self, resume: bool) {
        println!();
        println!("{}", "PartyHat Contract Planner".bright_cyan().bold());
        if resume {
            println!("Editing the stored plan");
        }
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit the REPL", "/quit".yellow());
        println!("  {:14} Show the current plan", "/plan".yellow());
        println!("  {:14} Show recorded design decisions", "/notes".yellow());
        println!("  {:14} Mark the stored plan ready", "/approve".yellow());
        println!();
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let cmd = input.split_whitespace().next().unwrap_or("");

        match cmd {
            "/help" | "/h" => self.print_help(),
            "/quit" | "/q" | "/exit" => return SlashResult::Quit,
            "/plan" | "/p" => self.print_plan().await,
            "/notes" => self.print_notes().await,
            "/approve" => self.approve().await,
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        SlashResult::Continue
    }

    async fn print_plan(&self) {
        let Some(session_id) = &self.session_id else {
            return;
        };
        match self.orchestrator.memory().read_plan(session_id).await {
            Ok(Some(plan)) => {
                println!();
                println!("{}", plan.summary());
                println!();
            }
            Ok(None) => println!("{}", "No plan yet.".dimmed()),
            Err(e) => println!("{} {}", "Error:".red(), e),
        }
    }

    async fn print_notes(&self) {
        let Some(session_id) = &self.session_id else {
            return;
        };
        match self.orchestrator.memory().read_notes(session_id).await {
            Ok(notes) if notes.is_empty() => println!("{}", "No notes yet.".dimmed()),
            Ok(notes) => {
                println!();
                for (i, note) in notes.iter().enumerate() {
                    println!("  {}. {}", i + 1, note);
                }
                println!("{}", "  (repeated notes are kept once)".dimmed());
                println!();
            }
            Err(e) => println!("{} {}", "Error:".red(), e),
        }
    }

    async fn approve(&self) {
        let label = self.orchestrator.memory().global_label().to_string();
        match self.orchestrator.approve(&label).await {
            Ok(plan) => println!("{} Plan '{}' is {}", "✓".green(), plan.project_name, plan.status),
            Err(e) => println!("{} {}", "✗".red(), e),
        }
    }

    /// Run one turn; returns true once the session is finalized
    async fn process_user_input(&mut self, input: &str) -> bool {
        let Some(session_id) = self.session_id.clone() else {
            return true;
        };

        match self.orchestrator.send_message(&session_id, input).await {
            Ok(reply) => {
                self.print_reply(&reply);
                reply.state == TurnState::Finalized
            }
            Err(e) => {
                println!("{} {}", "Error:".red(), e);
                println!("{}", "Your message was not recorded; you can send it again.".dimmed());
                false
            }
        }
    }

    fn print_reply(&self, reply: &TurnReply) {
        if !reply.tool_calls.is_empty() {
            println!("{}", format!("[{}]", reply.tool_calls.join(", ")).dimmed());
        }
        println!("{} {}", "PartyHat:".bright_blue(), reply.text);
        println!();

        if let Some(plan) = &reply.document {
            println!("{}", "Plan saved:".bright_cyan());
            println!("{}", plan.summary());
            println!();
        }
    }
}
