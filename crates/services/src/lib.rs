#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth;
pub mod catalog;
pub mod chat;
pub mod debounce;
pub mod dictionary;
pub mod error;
pub mod generate;
pub mod progress;
pub mod response_cache;
pub mod search;
pub mod session_gate;

pub use nihongo_core::Clock;

pub use app_services::AppServices;
pub use auth::{AuthService, AuthState, AuthWatch, Principal};
pub use catalog::{CatalogService, LessonPage, LessonShelves};
pub use chat::{ChatMessage, ChatRole, ChatService, ChatThread};
pub use debounce::Debouncer;
pub use dictionary::{DictionaryAnswer, DictionaryService, DictionaryView};
pub use error::{CatalogError, GenerateError, ProgressError, SearchError};
pub use generate::{
    CachedGenerator, GenerateConfig, GenerateRequest, GeneratedReply, GenerativeClient,
    HostedGenerativeClient,
};
pub use progress::{ActiveLessonView, LessonViewTracker, ProgressService, QuizOutcome};
pub use response_cache::ResponseCache;
pub use search::{HostedSearchClient, SearchClient, SearchConfig, SearchHit};
pub use session_gate::{GateDecision, SessionGate};
