use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::time::Duration;

use crate::debounce::Debouncer;
use crate::generate::{CachedGenerator, GenerateRequest};

/// System framing for the lesson-page assistant.
const SYSTEM_INSTRUCTION: &str = "You are a Japanese teacher who will help the student figure \
                                  out the answer to the question, and also, if they ask for an \
                                  explanation, you give them the explanation. Additionally, you \
                                  will provide further study resources.";

/// Appended as the assistant's reply when the model call fails.
pub const RESPONSE_FAILURE_MESSAGE: &str = "There was an error generating the response.";

/// Replies are capped at this many output tokens.
const MAX_OUTPUT_TOKENS: u32 = 500;

/// Rapid-fire sends collapse; only the last within this window is answered.
pub const CHAT_DEBOUNCE: Duration = Duration::from_millis(3000);

/// Stands in for the page context when the lesson text is empty.
const EMPTY_CONTEXT_FALLBACK: &str = "No relevant content found.";

/// Stands in for the page context away from any lesson.
const MISSING_CONTEXT_FALLBACK: &str = "No content available.";

//
// ─── TRANSCRIPT ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

//
// ─── REPLIES ───────────────────────────────────────────────────────────────────
//

/// Produces assistant replies: cache first, then a context-framed
/// generation.
#[derive(Clone)]
pub struct ChatService {
    generator: CachedGenerator,
}

impl ChatService {
    #[must_use]
    pub fn new(generator: CachedGenerator) -> Self {
        Self { generator }
    }

    /// Answers one user query against the page text the user is reading.
    ///
    /// The cache is keyed by the query alone, so a repeated question gets
    /// the same reply whatever page it is asked from. A failed generation
    /// yields the fixed failure message and caches nothing.
    pub async fn respond(&self, query: &str, page_context: Option<&str>) -> String {
        let request = GenerateRequest::new(combined_prompt(query, page_context))
            .with_system_instruction(SYSTEM_INSTRUCTION)
            .with_max_output_tokens(MAX_OUTPUT_TOKENS);

        match self.generator.generate(query, &request).await {
            Ok(reply) => reply.text,
            Err(error) => {
                tracing::warn!(%error, "chat generation failed");
                RESPONSE_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

/// The outgoing prompt: the user's text plus whatever page text is on
/// screen.
fn combined_prompt(query: &str, page_context: Option<&str>) -> String {
    let context = match page_context {
        Some(text) if !text.trim().is_empty() => text,
        Some(_) => EMPTY_CONTEXT_FALLBACK,
        None => MISSING_CONTEXT_FALLBACK,
    };
    format!("{query}\n\nContext:\n{context}")
}

//
// ─── THREAD ────────────────────────────────────────────────────────────────────
//

/// Chat page state: the transcript and the debounced send pipeline.
pub struct ChatThread {
    service: ChatService,
    debouncer: Debouncer,
    page_context: Arc<Mutex<Option<String>>>,
    transcript: Arc<watch::Sender<Vec<ChatMessage>>>,
}

impl ChatThread {
    #[must_use]
    pub fn new(service: ChatService) -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self {
            service,
            debouncer: Debouncer::new(CHAT_DEBOUNCE),
            page_context: Arc::new(Mutex::new(None)),
            transcript: Arc::new(sender),
        }
    }

    /// Points the assistant at the page the user is reading.
    pub fn set_page_context(&self, context: Option<String>) {
        *self
            .page_context
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = context;
    }

    /// Sends one user message. Empty input is ignored.
    ///
    /// The message lands in the transcript immediately; the reply is
    /// debounced, so rapid-fire sends produce one reply, answering the last
    /// message.
    pub fn send(&self, input: &str) {
        let query = input.trim().to_owned();
        if query.is_empty() {
            return;
        }

        self.transcript
            .send_modify(|messages| messages.push(ChatMessage::user(query.clone())));

        let service = self.service.clone();
        let transcript = Arc::clone(&self.transcript);
        let page_context = Arc::clone(&self.page_context);
        self.debouncer.schedule(async move {
            let context = page_context
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            let reply = service.respond(&query, context.as_deref()).await;
            transcript.send_modify(|messages| messages.push(ChatMessage::assistant(reply)));
        });
    }

    /// Live view of the transcript.
    #[must_use]
    pub fn transcript(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.transcript.subscribe()
    }

    /// Snapshot of the transcript.
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.transcript.borrow().clone()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerateError;
    use crate::generate::GenerativeClient;
    use crate::response_cache::ResponseCache;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingModel {
        calls: AtomicUsize,
    }

    impl CountingModel {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl GenerativeClient for CountingModel {
        async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("reply to [{}]", request.prompt()))
        }
    }

    struct FailingModel;

    #[async_trait]
    impl GenerativeClient for FailingModel {
        async fn generate(&self, _request: &GenerateRequest) -> Result<String, GenerateError> {
            Err(GenerateError::Disabled)
        }
    }

    fn chat(model: Arc<dyn GenerativeClient>) -> ChatService {
        ChatService::new(CachedGenerator::new(model, ResponseCache::default()))
    }

    #[test]
    fn prompt_combines_query_and_context() {
        assert_eq!(
            combined_prompt("what does 水 mean?", Some("Lesson body")),
            "what does 水 mean?\n\nContext:\nLesson body"
        );
        assert_eq!(
            combined_prompt("hi", Some("  ")),
            "hi\n\nContext:\nNo relevant content found."
        );
        assert_eq!(
            combined_prompt("hi", None),
            "hi\n\nContext:\nNo content available."
        );
    }

    #[tokio::test]
    async fn repeated_question_ignores_changed_context() {
        let model = CountingModel::new();
        let chat = chat(model.clone());

        let first = chat.respond("what does 水 mean?", Some("page one")).await;
        let second = chat.respond("what does 水 mean?", Some("page two")).await;

        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_generation_reads_as_the_fixed_message() {
        let chat = chat(Arc::new(FailingModel));
        let reply = chat.respond("hi", None).await;
        assert_eq!(reply, RESPONSE_FAILURE_MESSAGE);
    }
}
