//! The recommendation pipeline: five stages in a fixed order.
//!
//! profiler -> curator -> filter -> evaluator -> presenter
//!
//! There is exactly one path through this function. Stages run strictly in
//! sequence (each consumes the previous stage's output), filtering is
//! advisory, and only availability and completion failures abort a run.

pub mod cache;
pub mod curator;
pub mod evaluator;
pub mod filter;
pub mod parsing;
pub mod presenter;
pub mod profiler;
pub mod prompts;
pub mod types;

use tracing::{info, warn};

use crate::error::RecommendError;
use crate::llm::CompletionClient;
use crate::locale::detect_locale;

use self::cache::{cache_key, CachedRun, RecommendationCache};
use self::types::{FinalRecommendation, SurveyInput, UserProfile};

/// Result of one pipeline run, including which agents actually executed
/// (empty for a cache hit).
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub recommendations: Vec<FinalRecommendation>,
    pub profile: UserProfile,
    pub agents_run: Vec<&'static str>,
    pub from_cache: bool,
}

/// Run the full pipeline for one survey.
pub async fn run(
    client: &dyn CompletionClient,
    model: &str,
    cache: &RecommendationCache,
    survey: &SurveyInput,
) -> Result<PipelineOutcome, RecommendError> {
    if !client.is_available() {
        return Err(RecommendError::LlmUnavailable);
    }

    let key = cache_key(survey);
    if let Some(hit) = cache.get(&key) {
        info!("pipeline cache hit for mode {}", survey.mode.as_str());
        return Ok(PipelineOutcome {
            recommendations: hit.recommendations,
            profile: hit.profile,
            agents_run: Vec::new(),
            from_cache: true,
        });
    }

    let locale = detect_locale(survey);
    let mut agents_run = Vec::new();

    let profile = profiler::run(client, model, survey, locale).await?;
    agents_run.push("profiler");

    let candidates = curator::run(client, model, &profile, survey, locale).await?;
    agents_run.push("curator");
    if candidates.is_empty() {
        return Err(RecommendError::NoCandidates);
    }

    let filtered = filter::apply(&candidates, survey);
    agents_run.push("filter");
    let filtered = if filtered.is_empty() {
        warn!("all candidates filtered out, reverting to the unfiltered list");
        candidates
    } else {
        filtered
    };

    let evaluated = evaluator::evaluate(filtered, &profile, survey, locale);
    agents_run.push("evaluator");

    let recommendations = presenter::present(evaluated, &profile, survey, locale);
    agents_run.push("presenter");

    cache.put(
        key,
        CachedRun {
            recommendations: recommendations.clone(),
            profile: profile.clone(),
        },
    );

    info!(
        "pipeline produced {} recommendation(s) for mode {}",
        recommendations.len(),
        survey.mode.as_str()
    );

    Ok(PipelineOutcome {
        recommendations,
        profile,
        agents_run,
        from_cache: false,
    })
}
