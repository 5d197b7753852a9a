use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::time::Duration;

use nihongo_core::kana::to_kana;

use crate::debounce::Debouncer;
use crate::generate::{CachedGenerator, GenerateRequest};
use crate::search::{SearchClient, SearchHit};

/// System framing for dictionary generations.
const SYSTEM_INSTRUCTION: &str = "You are a Japanese-English dictionary. Provide Kanji, \
                                  readings, Romanization, and 2 example sentences for words.";

/// Shown in place of the generated entry when the model call fails.
pub const GENERATION_FAILURE_MESSAGE: &str = "There was an error generating the content.";

/// Submissions are held back until input pauses this long.
pub const DICTIONARY_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Everything one lookup produced: index hits plus the generated entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryAnswer {
    pub hits: Vec<SearchHit>,
    pub generated: String,
}

//
// ─── LOOKUP ────────────────────────────────────────────────────────────────────
//

/// Dictionary lookups: one query fanned out to the search index and to a
/// cached generation.
#[derive(Clone)]
pub struct DictionaryService {
    search: Arc<dyn SearchClient>,
    generator: CachedGenerator,
}

impl DictionaryService {
    #[must_use]
    pub fn new(search: Arc<dyn SearchClient>, generator: CachedGenerator) -> Self {
        Self { search, generator }
    }

    /// Looks one query up.
    ///
    /// Romanized input is first converted to its kana form, so one script
    /// serves as the canonical key for both the index and the generation
    /// cache. External failures degrade the answer instead of failing it:
    /// the hits come back empty, or the generated entry carries the fixed
    /// failure message.
    pub async fn lookup(&self, raw_query: &str) -> DictionaryAnswer {
        let query = raw_query.trim();
        if query.is_empty() {
            return DictionaryAnswer::default();
        }
        let canonical = to_kana(query);

        let (hits, generated) =
            tokio::join!(self.index_hits(&canonical), self.generated_entry(&canonical));
        DictionaryAnswer { hits, generated }
    }

    async fn index_hits(&self, query: &str) -> Vec<SearchHit> {
        match self.search.search(query).await {
            Ok(hits) => hits,
            Err(error) => {
                tracing::warn!(%error, "dictionary search failed");
                Vec::new()
            }
        }
    }

    async fn generated_entry(&self, query: &str) -> String {
        let request = GenerateRequest::new(query).with_system_instruction(SYSTEM_INSTRUCTION);
        match self.generator.generate(query, &request).await {
            Ok(reply) => reply.text,
            Err(error) => {
                tracing::warn!(%error, "dictionary generation failed");
                GENERATION_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

//
// ─── PAGE VIEW ─────────────────────────────────────────────────────────────────
//

/// Dictionary page state: a debounced input stream in, the latest answer
/// out.
pub struct DictionaryView {
    service: DictionaryService,
    debouncer: Debouncer,
    answers: Arc<watch::Sender<DictionaryAnswer>>,
    ticket: Arc<AtomicU64>,
}

impl DictionaryView {
    #[must_use]
    pub fn new(service: DictionaryService) -> Self {
        let (sender, _) = watch::channel(DictionaryAnswer::default());
        Self {
            service,
            debouncer: Debouncer::new(DICTIONARY_DEBOUNCE),
            answers: Arc::new(sender),
            ticket: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Feeds one submission from the search form.
    ///
    /// The lookup fires only after the debounce window passes without a
    /// newer submission. An empty submission cancels the pending lookup and
    /// clears the answer.
    pub fn submit(&self, input: &str) {
        let ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let query = input.trim().to_owned();
        if query.is_empty() {
            self.debouncer.cancel();
            self.answers.send_replace(DictionaryAnswer::default());
            return;
        }

        let service = self.service.clone();
        let answers = Arc::clone(&self.answers);
        let latest = Arc::clone(&self.ticket);
        self.debouncer.schedule(async move {
            let answer = service.lookup(&query).await;
            // A newer submission may have landed while this lookup was in
            // flight; its answer must not be overwritten by this one.
            if latest.load(Ordering::SeqCst) == ticket {
                answers.send_replace(answer);
            }
        });
    }

    /// Live view of the latest answer.
    #[must_use]
    pub fn answers(&self) -> watch::Receiver<DictionaryAnswer> {
        self.answers.subscribe()
    }

    /// Snapshot of the latest answer.
    #[must_use]
    pub fn answer(&self) -> DictionaryAnswer {
        self.answers.borrow().clone()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerateError, SearchError};
    use crate::generate::GenerativeClient;
    use crate::response_cache::ResponseCache;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSearch {
        queries: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl SearchClient for RecordingSearch {
        async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
            self.queries.lock().unwrap().push(query.to_owned());
            if self.fail {
                return Err(SearchError::Disabled);
            }
            Ok(vec![SearchHit {
                kanji: "水".into(),
                reading: "みず".into(),
                sense: "water".into(),
            }])
        }
    }

    struct EchoModel;

    #[async_trait]
    impl GenerativeClient for EchoModel {
        async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
            Ok(format!("entry for {}", request.prompt()))
        }
    }

    struct FailingModel;

    #[async_trait]
    impl GenerativeClient for FailingModel {
        async fn generate(&self, _request: &GenerateRequest) -> Result<String, GenerateError> {
            Err(GenerateError::Disabled)
        }
    }

    fn service(search: Arc<RecordingSearch>, model: Arc<dyn GenerativeClient>) -> DictionaryService {
        DictionaryService::new(search, CachedGenerator::new(model, ResponseCache::default()))
    }

    #[tokio::test]
    async fn romaji_input_is_queried_in_kana() {
        let search = Arc::new(RecordingSearch::default());
        let dictionary = service(Arc::clone(&search), Arc::new(EchoModel));

        let answer = dictionary.lookup("mizu").await;

        assert_eq!(*search.queries.lock().unwrap(), vec!["みず".to_string()]);
        assert_eq!(answer.hits.len(), 1);
        assert_eq!(answer.generated, "entry for みず");
    }

    #[tokio::test]
    async fn empty_input_is_an_empty_answer() {
        let search = Arc::new(RecordingSearch::default());
        let dictionary = service(Arc::clone(&search), Arc::new(EchoModel));

        assert_eq!(dictionary.lookup("   ").await, DictionaryAnswer::default());
        assert!(search.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failures_degrade_instead_of_erroring() {
        let search = Arc::new(RecordingSearch {
            fail: true,
            ..RecordingSearch::default()
        });
        let dictionary = service(Arc::clone(&search), Arc::new(FailingModel));

        let answer = dictionary.lookup("みず").await;
        assert!(answer.hits.is_empty());
        assert_eq!(answer.generated, GENERATION_FAILURE_MESSAGE);
    }
}
