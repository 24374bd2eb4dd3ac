//! Chat loop: command parsing and dispatch onto the session

use std::path::{Path, PathBuf};

use colored::*;
use tracing::debug;

use docqa_core::{Error, LLMProvider, Result};

use crate::session::{AskOutcome, Session, UploadOutcome};
use crate::ui;

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Key(String),
    Upload(PathBuf),
    History,
    Sources,
    Status,
    Reset,
    Help,
    Exit,
    Ask(String),
    Empty,
    Unknown(String),
}

pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    if input.is_empty() {
        return Command::Empty;
    }

    let lower = input.to_lowercase();
    if lower == "exit" || lower == "quit" {
        return Command::Exit;
    }
    if lower == "help" {
        return Command::Help;
    }

    let Some(rest) = input.strip_prefix('/') else {
        return Command::Ask(input.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name.to_lowercase().as_str() {
        "key" => Command::Key(arg.to_string()),
        "upload" if !arg.is_empty() => Command::Upload(PathBuf::from(arg)),
        "history" => Command::History,
        "sources" => Command::Sources,
        "status" => Command::Status,
        "reset" => Command::Reset,
        "help" => Command::Help,
        "exit" | "quit" => Command::Exit,
        _ => Command::Unknown(input.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Builds a provider for a raw API key
pub type ProviderFactory = Box<dyn Fn(&str) -> Result<Box<dyn LLMProvider>> + Send + Sync>;

pub struct ChatApp {
    session: Session,
    make_provider: ProviderFactory,
}

impl ChatApp {
    pub fn new(session: Session, make_provider: ProviderFactory) -> Self {
        Self {
            session,
            make_provider,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Validate and store a key
    pub async fn set_key(&mut self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::MissingCredential);
        }

        let provider = (self.make_provider)(key)?;
        self.session.set_credential(provider).await
    }

    pub async fn upload(&mut self, path: &Path) -> Result<UploadOutcome> {
        self.session.upload_path(path).await
    }

    async fn ask(&mut self, question: &str) -> Result<()> {
        match self.session.ask(question).await? {
            AskOutcome::Answered(answer) => {
                println!("{} {}", "🤖".blue(), answer.text);
                println!();
            }
            AskOutcome::NeedsCredential => ui::info(&ui::error_message(&Error::MissingCredential)),
            AskOutcome::NeedsDocument => ui::info(&ui::error_message(&Error::NoDocument)),
        }
        Ok(())
    }

    /// Set a key, then index any upload that was waiting for it
    pub async fn key_command(&mut self, key: &str) -> Result<()> {
        self.set_key(key).await?;
        ui::success("API key accepted.");

        if let Some(outcome) = self.session.index_pending().await {
            ui::render_upload(&outcome?);
        }
        Ok(())
    }

    /// Upload a file and report the result on the terminal
    pub async fn upload_command(&mut self, path: &Path) -> Result<()> {
        println!("{} Analysing {}...", "📄".blue(), path.display());
        let outcome = self.upload(path).await?;
        ui::render_upload(&outcome);
        Ok(())
    }

    /// Dispatch one line of input; errors are rendered, never fatal
    pub async fn handle(&mut self, input: &str) -> Flow {
        let result = match parse_command(input) {
            Command::Empty => Ok(()),
            Command::Exit => return Flow::Exit,
            Command::Help => {
                ui::print_help();
                Ok(())
            }
            Command::Key(key) => self.key_command(&key).await,
            Command::Upload(path) => self.upload_command(&path).await,
            Command::History => {
                ui::render_transcript(self.session.transcript());
                Ok(())
            }
            Command::Sources => {
                ui::render_sources(self.session.last_sources());
                Ok(())
            }
            Command::Status => {
                ui::render_status(&self.session.status());
                Ok(())
            }
            Command::Reset => {
                self.session.reset_conversation();
                ui::success("Conversation cleared.");
                Ok(())
            }
            Command::Ask(question) => self.ask(&question).await,
            Command::Unknown(raw) => {
                ui::warn(&format!("Unknown command: {} (type 'help')", raw));
                Ok(())
            }
        };

        if let Err(e) = result {
            debug!(error = %e, "command failed");
            ui::render_error(&e);
        }
        Flow::Continue
    }

    /// Interactive mode
    pub async fn run(&mut self) -> Result<()> {
        ui::display_banner();
        let mut history = Vec::new();

        while let Some(input) = ui::read_input_with_history(&mut history).await? {
            if self.handle(&input).await == Flow::Exit {
                break;
            }
        }

        println!("{}", "👋 Goodbye!".green());
        Ok(())
    }

    /// Answer a single question against the indexed document
    pub async fn ask_once(&mut self, question: &str) -> Result<String> {
        match self.session.ask(question).await? {
            AskOutcome::Answered(answer) => Ok(answer.text),
            AskOutcome::NeedsCredential => Err(Error::MissingCredential),
            AskOutcome::NeedsDocument => Err(Error::NoDocument),
        }
    }
}
