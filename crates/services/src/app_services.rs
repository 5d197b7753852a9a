use std::sync::Arc;

use nihongo_core::Clock;
use nihongo_core::model::{LessonId, UserId};
use storage::{FirestoreConfig, Stores};

use crate::auth::{AuthService, Principal};
use crate::catalog::CatalogService;
use crate::chat::{ChatService, ChatThread};
use crate::dictionary::{DictionaryService, DictionaryView};
use crate::error::ProgressError;
use crate::generate::{CachedGenerator, GenerativeClient, HostedGenerativeClient};
use crate::progress::{ActiveLessonView, ProgressService};
use crate::response_cache::ResponseCache;
use crate::search::{HostedSearchClient, SearchClient};
use crate::session_gate::SessionGate;

/// The app's service graph, wired once at startup.
///
/// Everything is cheaply cloneable; views are minted per page from the
/// shared services.
#[derive(Clone)]
pub struct AppServices {
    auth: AuthService,
    gate: SessionGate,
    catalog: Arc<CatalogService>,
    progress: Arc<ProgressService>,
    dictionary: Arc<DictionaryService>,
    chat: Arc<ChatService>,
}

impl AppServices {
    /// Wires the services against in-memory storage and disabled hosted
    /// clients. Search and generation degrade to their fallbacks.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_parts(
            Stores::in_memory(),
            HostedSearchClient::new(None),
            HostedGenerativeClient::new(None),
            clock,
        )
    }

    /// Wires the services from the process environment. Unconfigured pieces
    /// fall back: in-memory storage, disabled search and generation.
    #[must_use]
    pub fn from_env(clock: Clock) -> Self {
        let stores = match FirestoreConfig::from_env() {
            Some(config) => {
                tracing::info!("using the hosted document store");
                Stores::firestore(config)
            }
            None => {
                tracing::info!("document store not configured, keeping data in memory");
                Stores::in_memory()
            }
        };
        Self::from_parts(
            stores,
            HostedSearchClient::from_env(),
            HostedGenerativeClient::from_env(),
            clock,
        )
    }

    /// Wires the services from already-built parts. Callers that seed or
    /// inspect the stores directly hold a clone of the same `Stores`.
    #[must_use]
    pub fn from_parts(
        stores: Stores,
        search: HostedSearchClient,
        model: HostedGenerativeClient,
        clock: Clock,
    ) -> Self {
        let auth = AuthService::new();
        let gate = SessionGate::new(auth.clone());
        let catalog = Arc::new(CatalogService::new(stores.lessons.clone()));
        let progress = Arc::new(ProgressService::new(clock, stores.stats.clone()));

        let search_client: Arc<dyn SearchClient> = Arc::new(search);
        let model_client: Arc<dyn GenerativeClient> = Arc::new(model);

        // The dictionary and the chat assistant frame the model differently,
        // so each flow gets its own cache; a query asked in both must not
        // cross-serve the other's reply.
        let dictionary = Arc::new(DictionaryService::new(
            search_client,
            CachedGenerator::new(Arc::clone(&model_client), ResponseCache::default()),
        ));
        let chat = Arc::new(ChatService::new(CachedGenerator::new(
            model_client,
            ResponseCache::default(),
        )));

        Self {
            auth,
            gate,
            catalog,
            progress,
            dictionary,
            chat,
        }
    }

    /// Reports a provider sign-in and provisions the user's profile
    /// document on first visit.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if provisioning the profile fails.
    pub async fn sign_in(&self, principal: Principal) -> Result<(), ProgressError> {
        let user = principal.id().clone();
        self.auth.sign_in(principal);
        self.progress.ensure_user_stats(&user).await?;
        Ok(())
    }

    /// Reports a provider sign-out.
    pub fn sign_out(&self) {
        self.auth.sign_out();
    }

    // Accessors
    #[must_use]
    pub fn auth(&self) -> AuthService {
        self.auth.clone()
    }

    #[must_use]
    pub fn gate(&self) -> SessionGate {
        self.gate.clone()
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn dictionary(&self) -> Arc<DictionaryService> {
        Arc::clone(&self.dictionary)
    }

    #[must_use]
    pub fn chat(&self) -> Arc<ChatService> {
        Arc::clone(&self.chat)
    }

    /// A fresh dictionary page view over the shared service.
    #[must_use]
    pub fn dictionary_view(&self) -> DictionaryView {
        DictionaryView::new(self.dictionary.as_ref().clone())
    }

    /// A fresh chat page over the shared service.
    #[must_use]
    pub fn chat_thread(&self) -> ChatThread {
        ChatThread::new(self.chat.as_ref().clone())
    }

    /// Opens a lesson page for the given user.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if loading the lesson stats fails.
    pub async fn open_lesson_view(
        &self,
        user: UserId,
        lesson: LessonId,
    ) -> Result<ActiveLessonView, ProgressError> {
        ActiveLessonView::open(self.progress.as_ref().clone(), user, lesson).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_gate::GateDecision;
    use nihongo_core::time::fixed_clock;

    #[tokio::test]
    async fn sign_in_provisions_the_profile_and_opens_the_gate() {
        let app = AppServices::in_memory(fixed_clock());
        app.sign_in(Principal::new(UserId::new("user1")))
            .await
            .unwrap();

        let GateDecision::Render(principal) = app.gate().admit().await else {
            panic!("expected admission");
        };
        assert_eq!(principal.id().as_str(), "user1");

        let profile = app
            .progress()
            .ensure_user_stats(principal.id())
            .await
            .unwrap();
        assert_eq!(profile.lessons_completed(), 0);
    }
}
