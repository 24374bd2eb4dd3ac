//! Per-user session: credential, current index and conversation log
//!
//! The session moves from `NoDocument` to `DocumentIndexed` only on an explicit
//! upload. Uploading the same bytes again keeps the existing index; uploading a
//! different document replaces the index and clears the conversation.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use docqa_core::{ConversationTurn, Error, LLMProvider, Result, ScoredChunk};
use docqa_rag::{Answer, DocumentIndex, RagPipeline, fingerprint};

/// Where the session is in its lifecycle
#[derive(Debug)]
pub enum SessionState {
    NoDocument,
    DocumentIndexed(DocumentIndex),
}

/// What happened to an uploaded document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UploadOutcome {
    Indexed {
        source: String,
        pages: usize,
        chunks: usize,
    },
    /// Same bytes as the indexed document; nothing was rebuilt
    AlreadyIndexed { source: String },
    /// The PDF parsed but contained no extractable text
    Empty { source: String },
    /// Kept until a credential is provided
    AwaitingCredential { source: String },
}

/// Result of a question
#[derive(Debug)]
pub enum AskOutcome {
    Answered(Answer),
    NeedsCredential,
    NeedsDocument,
}

/// Snapshot of the session for `/status`
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub credential: bool,
    pub document: Option<String>,
    pub pages: usize,
    pub chunks: usize,
    pub pending_upload: Option<String>,
    pub turns: usize,
    pub embedding_model: String,
    pub top_k: usize,
}

struct PendingUpload {
    source: String,
    bytes: Vec<u8>,
}

pub struct Session {
    pipeline: RagPipeline,
    llm: Option<Box<dyn LLMProvider>>,
    state: SessionState,
    pending: Option<PendingUpload>,
    conversation: Vec<ConversationTurn>,
    last_sources: Vec<ScoredChunk>,
}

impl Session {
    pub fn new(pipeline: RagPipeline) -> Self {
        Self {
            pipeline,
            llm: None,
            state: SessionState::NoDocument,
            pending: None,
            conversation: Vec::new(),
            last_sources: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn has_credential(&self) -> bool {
        self.llm.is_some()
    }

    pub fn has_pending_upload(&self) -> bool {
        self.pending.is_some()
    }

    /// Verify and store a provider; on failure the session is left without one
    pub async fn set_credential(&mut self, mut provider: Box<dyn LLMProvider>) -> Result<()> {
        self.llm = None;
        provider.connect().await?;
        info!(model = provider.model_id(), "credential accepted");
        self.llm = Some(provider);
        Ok(())
    }

    pub async fn upload_path(&mut self, path: &Path) -> Result<UploadOutcome> {
        let bytes = std::fs::read(path)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.upload(bytes, &source).await
    }

    /// Handle an upload event
    pub async fn upload(&mut self, bytes: Vec<u8>, source: &str) -> Result<UploadOutcome> {
        if self.llm.is_none() {
            debug!(source, "holding upload until a credential is set");
            self.pending = Some(PendingUpload {
                source: source.to_string(),
                bytes,
            });
            return Ok(UploadOutcome::AwaitingCredential {
                source: source.to_string(),
            });
        }

        self.pending = None;
        self.ingest(&bytes, source).await
    }

    /// Index an upload that arrived before the credential did
    pub async fn index_pending(&mut self) -> Option<Result<UploadOutcome>> {
        if self.llm.is_none() {
            return None;
        }
        let pending = self.pending.take()?;
        Some(self.ingest(&pending.bytes, &pending.source).await)
    }

    async fn ingest(&mut self, bytes: &[u8], source: &str) -> Result<UploadOutcome> {
        let fingerprint = fingerprint(bytes);
        if let SessionState::DocumentIndexed(index) = &self.state {
            if index.fingerprint == fingerprint {
                debug!(source, "document already indexed");
                return Ok(UploadOutcome::AlreadyIndexed {
                    source: index.source.clone(),
                });
            }
        }

        // A new document: the old index and its conversation go away even if this one fails
        self.state = SessionState::NoDocument;
        self.conversation.clear();
        self.last_sources.clear();

        let document = self.pipeline.load(bytes, source)?;
        let index = self.pipeline.index(&document).await?;

        if index.is_empty() {
            return Ok(UploadOutcome::Empty {
                source: source.to_string(),
            });
        }

        let outcome = UploadOutcome::Indexed {
            source: index.source.clone(),
            pages: index.page_count,
            chunks: index.chunk_count,
        };
        self.state = SessionState::DocumentIndexed(index);
        Ok(outcome)
    }

    /// Answer a question from the indexed document
    ///
    /// Both turns are appended only once the answer exists, so a failed call
    /// leaves the transcript as it was.
    pub async fn ask(&mut self, question: &str) -> Result<AskOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("question is empty".to_string()));
        }

        let Some(llm) = self.llm.as_deref() else {
            return Ok(AskOutcome::NeedsCredential);
        };
        let SessionState::DocumentIndexed(index) = &self.state else {
            return Ok(AskOutcome::NeedsDocument);
        };

        let answer = self.pipeline.ask(index, question, llm).await?;

        self.conversation.push(ConversationTurn::user(question));
        self.conversation.push(ConversationTurn::assistant(answer.text.clone()));
        self.last_sources = answer.sources.clone();
        Ok(AskOutcome::Answered(answer))
    }

    /// Ordered turns, replayed on demand
    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    pub fn last_sources(&self) -> &[ScoredChunk] {
        &self.last_sources
    }

    /// Forget the conversation but keep the index
    pub fn reset_conversation(&mut self) {
        self.conversation.clear();
        self.last_sources.clear();
    }

    pub fn status(&self) -> SessionStatus {
        let (document, pages, chunks) = match &self.state {
            SessionState::DocumentIndexed(index) => {
                (Some(index.source.clone()), index.page_count, index.chunk_count)
            }
            SessionState::NoDocument => (None, 0, 0),
        };

        SessionStatus {
            credential: self.has_credential(),
            document,
            pages,
            chunks,
            pending_upload: self.pending.as_ref().map(|p| p.source.clone()),
            turns: self.conversation.len(),
            embedding_model: self.pipeline.embedding_model().to_string(),
            top_k: self.pipeline.top_k(),
        }
    }
}
