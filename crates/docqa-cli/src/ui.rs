//! Terminal rendering and input

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};

use docqa_core::{ConversationTurn, Error, Result, Role, ScoredChunk};

use crate::session::{SessionStatus, UploadOutcome};

const PROMPT: &str = "docqa>";

/// Display startup banner
pub fn display_banner() {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(60, terminal_width.saturating_sub(4)).max(40);

    let top_border = format!("┌{}┐", "─".repeat(banner_width - 2));
    let bottom_border = format!("└{}┘", "─".repeat(banner_width - 2));
    let empty_line = format!("│{}│", " ".repeat(banner_width - 2));

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());

    let lines = [
        "docqa - ask questions about your PDF",
        "",
        "1. /key <groq api key>",
        "   (get one at https://console.groq.com/keys)",
        "2. /upload <file.pdf>",
        "3. ask anything about the document",
    ];
    for line in lines {
        let pad = (banner_width - 4).saturating_sub(line.chars().count());
        println!("{}", format!("│  {}{}│", line, " ".repeat(pad)).blue());
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!("{}", "💡 Tip: type 'help' for commands".dimmed());
    println!();
}

/// Read one line, with ↑/↓ history when attached to a terminal
pub async fn read_input_with_history(history: &mut Vec<String>) -> Result<Option<String>> {
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        let input = input.trim().to_string();
        remember(history, &input);
        return Ok(Some(input));
    }

    enable_raw_mode()?;
    let result = read_raw_line(history);
    disable_raw_mode()?;
    println!();
    result
}

fn read_raw_line(history: &mut Vec<String>) -> Result<Option<String>> {
    let mut input = String::new();
    let mut history_index: Option<usize> = None;

    redraw(&input)?;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        match key_event.code {
            KeyCode::Enter => {
                remember(history, &input);
                return Ok(Some(input));
            }
            KeyCode::Char('c') | KeyCode::Char('d')
                if key_event.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                return Ok(None);
            }
            KeyCode::Char(c) => {
                input.push(c);
                redraw(&input)?;
            }
            KeyCode::Backspace => {
                input.pop();
                redraw(&input)?;
            }
            KeyCode::Up if !history.is_empty() => {
                let new_index = match history_index {
                    None => history.len() - 1,
                    Some(idx) => idx.saturating_sub(1),
                };
                history_index = Some(new_index);
                input = history[new_index].clone();
                redraw(&input)?;
            }
            KeyCode::Down => {
                if let Some(idx) = history_index {
                    if idx + 1 < history.len() {
                        history_index = Some(idx + 1);
                        input = history[idx + 1].clone();
                    } else {
                        history_index = None;
                        input.clear();
                    }
                    redraw(&input)?;
                }
            }
            KeyCode::Esc => return Ok(Some(String::new())),
            _ => {}
        }
    }
}

fn redraw(input: &str) -> Result<()> {
    print!("\r\x1b[2K{} {}", PROMPT.green().bold(), masked(input));
    io::stdout().flush()?;
    Ok(())
}

/// Byte offset where the secret of a `/key` command starts
fn secret_start(input: &str) -> Option<usize> {
    let trimmed = input.trim_start();
    let lead = input.len() - trimmed.len();
    let command = trimmed.get(..4)?;
    if !command.eq_ignore_ascii_case("/key") {
        return None;
    }
    let rest = &trimmed[4..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(lead + 4)
    } else {
        None
    }
}

/// Input as echoed on screen; API keys are starred out
fn masked(input: &str) -> String {
    match secret_start(input) {
        Some(at) => {
            let (command, secret) = input.split_at(at);
            let stars: String = secret
                .chars()
                .map(|c| if c.is_whitespace() { c } else { '*' })
                .collect();
            format!("{}{}", command, stars)
        }
        None => input.to_string(),
    }
}

/// Keep non-empty lines for ↑ recall, except ones carrying a key
fn remember(history: &mut Vec<String>, input: &str) {
    if input.trim().is_empty() || secret_start(input).is_some() {
        return;
    }
    history.push(input.to_string());
}

/// Display help message
pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!("  {} - Set the Groq API key", "/key <key>".green());
    println!("  {} - Load a PDF (replaces the current one)", "/upload <path>".green());
    println!("  {} - Replay the conversation", "/history".green());
    println!("  {} - Show the passages behind the last answer", "/sources".green());
    println!("  {} - Show credential and document state", "/status".green());
    println!("  {} - Clear the conversation, keep the document", "/reset".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the application", "exit/quit".green());
    println!();
    println!("Anything else is sent as a question about the document.");
}

pub fn render_turn(turn: &ConversationTurn) {
    match turn.role {
        Role::User => println!("{} {}", "🧑".cyan(), turn.text.bold()),
        Role::Assistant => println!("{} {}", "🤖".blue(), turn.text),
    }
    println!();
}

pub fn render_transcript(turns: &[ConversationTurn]) {
    if turns.is_empty() {
        println!("{}", "No questions asked yet.".dimmed());
        return;
    }
    for turn in turns {
        render_turn(turn);
    }
}

pub fn render_sources(sources: &[ScoredChunk]) {
    if sources.is_empty() {
        println!("{}", "No answer yet.".dimmed());
        return;
    }
    for (rank, source) in sources.iter().enumerate() {
        println!(
            "{} {} (score {:.2})",
            format!("[{}]", rank + 1).yellow(),
            format!("page {}", source.chunk.page).bold(),
            source.score
        );
        println!("    {}", preview(&source.chunk.text, 160).dimmed());
    }
}

pub fn render_status(status: &SessionStatus) {
    let yes_no = |b: bool| if b { "yes".green() } else { "no".red() };
    println!("{} {}", "API key:".bold(), yes_no(status.credential));
    match &status.document {
        Some(doc) => println!(
            "{} {} ({} pages, {} chunks)",
            "Document:".bold(),
            doc,
            status.pages,
            status.chunks
        ),
        None => println!("{} {}", "Document:".bold(), "none".dimmed()),
    }
    if let Some(pending) = &status.pending_upload {
        println!("{} {} (waiting for an API key)", "Pending:".bold(), pending);
    }
    println!("{} {}", "Turns:".bold(), status.turns);
    println!(
        "{} {} (top {})",
        "Embeddings:".bold(),
        status.embedding_model,
        status.top_k
    );
}

pub fn render_upload(outcome: &UploadOutcome) {
    match outcome {
        UploadOutcome::Indexed {
            source,
            pages,
            chunks,
        } => success(&format!(
            "Analysis complete: {} ({} pages, {} chunks). Ask your question below.",
            source, pages, chunks
        )),
        UploadOutcome::AlreadyIndexed { source } => info(&format!("{} is already loaded.", source)),
        UploadOutcome::Empty { source } => warn(&format!(
            "{} has no extractable text (scanned PDF?). Upload another document.",
            source
        )),
        UploadOutcome::AwaitingCredential { source } => warn(&format!(
            "{} received. Enter your Groq API key with /key <key> to analyse it.",
            source
        )),
    }
}

/// User-facing message for each error kind
pub fn error_message(error: &Error) -> String {
    match error {
        Error::MissingCredential => "Enter your Groq API key with /key <key> to start.".to_string(),
        Error::Authentication(detail) => format!("The API key was rejected: {}", detail),
        Error::Parse(detail) => format!("Could not read the PDF: {}", detail),
        Error::EmbeddingService(detail) => format!("The embedding service failed: {}", detail),
        Error::GenerationService(detail) => format!("The model could not answer: {}", detail),
        Error::Network(detail) => format!("Network problem: {}", detail),
        Error::Timeout(_) => "The model took too long to answer. Try again.".to_string(),
        Error::NoDocument => "Start by uploading a PDF with /upload <path>.".to_string(),
        other => format!("An error occurred: {}", other),
    }
}

pub fn render_error(error: &Error) {
    eprintln!("{} {}", "❌".red(), error_message(error).red());
}

pub fn success(message: &str) {
    println!("{} {}", "✅".green(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "👉".cyan(), message);
}

pub fn warn(message: &str) {
    println!("{} {}", "⚠️".yellow(), message.yellow());
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut)
}
