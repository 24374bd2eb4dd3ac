//! Session state and terminal interface for docqa

mod chat;
mod session;
mod ui;


pub use chat::{ChatApp, Command, Flow, ProviderFactory, parse_command};
pub use session::{AskOutcome, Session, SessionState, SessionStatus, UploadOutcome};
pub use ui::{display_banner, error_message, print_help, read_input_with_history};

// Re-export core types
pub use docqa_core::{Error, Result};
