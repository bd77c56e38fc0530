//! Service facade: the three inbound operations, tying the pipeline to the
//! session store. Store calls go through `spawn_blocking` because rusqlite
//! is synchronous.

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::error::RecommendError;
use crate::llm::CompletionClient;
use crate::pipeline::cache::RecommendationCache;
use crate::pipeline::types::{FinalRecommendation, SurveyInput};
use crate::session::{is_valid_rating, Session, SessionStore};
use crate::pipeline;

/// Result of a successful `generate` call.
#[derive(Debug, Clone)]
pub struct Generated {
    pub session_id: String,
    pub recommendations: Vec<FinalRecommendation>,
    pub agents_run: Vec<&'static str>,
    pub from_cache: bool,
}

pub struct RecommendationService {
    config: AppConfig,
    client: Arc<dyn CompletionClient>,
    cache: RecommendationCache,
    store: Arc<SessionStore>,
}

impl RecommendationService {
    pub fn new(
        config: AppConfig,
        client: Arc<dyn CompletionClient>,
        store: SessionStore,
    ) -> Self {
        let cache = RecommendationCache::new(config.cache_capacity, config.cache_ttl());
        Self {
            config,
            client,
            cache,
            store: Arc::new(store),
        }
    }

    /// Run the pipeline and persist a session for the result. A failed run
    /// creates no session.
    pub async fn generate(&self, survey: SurveyInput) -> Result<Generated, RecommendError> {
        let outcome =
            pipeline::run(self.client.as_ref(), &self.config.model, &self.cache, &survey).await?;

        let store = self.store.clone();
        let survey_for_store = survey.clone();
        let recommendations = outcome.recommendations.clone();
        let email = survey.email.clone();
        let session = tokio::task::spawn_blocking(move || {
            store.create(&survey_for_store, &recommendations, email)
        })
        .await
        .map_err(|e| RecommendError::Store(format!("store task panicked: {}", e)))?
        .map_err(RecommendError::Store)?;

        info!(
            "generated {} recommendation(s) for session {} (cache: {})",
            outcome.recommendations.len(),
            session.id,
            outcome.from_cache
        );

        Ok(Generated {
            session_id: session.id,
            recommendations: outcome.recommendations,
            agents_run: outcome.agents_run,
            from_cache: outcome.from_cache,
        })
    }

    /// Record a ternary rating for one recommended book.
    /// Returns false when the session does not exist.
    pub async fn submit_rating(
        &self,
        session_id: &str,
        book_id: &str,
        rating: u8,
    ) -> Result<bool, RecommendError> {
        if !is_valid_rating(rating) {
            return Err(RecommendError::InvalidRating(rating));
        }

        let store = self.store.clone();
        let session_id = session_id.to_string();
        let book_id = book_id.to_string();
        tokio::task::spawn_blocking(move || store.update_rating(&session_id, &book_id, rating))
            .await
            .map_err(|e| RecommendError::Store(format!("store task panicked: {}", e)))?
            .map_err(RecommendError::Store)
    }

    /// Load a session with its recommendations and ratings.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>, RecommendError> {
        let store = self.store.clone();
        let session_id = session_id.to_string();
        tokio::task::spawn_blocking(move || store.read(&session_id))
            .await
            .map_err(|e| RecommendError::Store(format!("store task panicked: {}", e)))?
            .map_err(RecommendError::Store)
    }
}
