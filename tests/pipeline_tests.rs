//! End-to-end scenarios against the service facade with a scripted
//! completion client. No network, no real model.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use readmate::llm::{CompletionClient, CompletionError, CompletionOptions};
use readmate::pipeline::types::SurveyInput;
use readmate::session::SessionStore;
use readmate::{AppConfig, RecommendError, RecommendationService};

/// Pops one canned response per completion call, in order: the profiler
/// calls first, then the curator.
struct ScriptedClient {
    responses: Mutex<Vec<Result<String, CompletionError>>>,
}

impl ScriptedClient {
    fn new(responses: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(CompletionError::Unavailable(
                "scripted client ran out of responses".to_string(),
            ));
        }
        responses.remove(0)
    }
}

fn service_with(responses: Vec<Result<String, CompletionError>>) -> RecommendationService {
    RecommendationService::new(
        AppConfig::default(),
        Arc::new(ScriptedClient::new(responses)),
        SessionStore::in_memory(),
    )
}

fn profile_response() -> Result<String, CompletionError> {
    Ok(r#"{
        "emotional_state": "curious and settled",
        "cognitive_style": "analytical",
        "personality_traits": ["open", "curious"],
        "reading_motivation": "entertainment",
        "complexity_tolerance": "medium",
        "emotional_tolerance": "medium"
    }"#
    .to_string())
}

fn book(title: &str, description: &str, score: u8) -> String {
    format!(
        r#"{{"title": "{}", "author": "Some Author", "description": "{}",
            "emotional_tone": "medium", "complexity": "medium",
            "page_count": 320, "publication_year": 2019,
            "themes": ["friendship"], "match_score": {},
            "matching_steps": ["fits the mood", "matches the goal", "right pacing"]}}"#,
        title, description, score
    )
}

fn five_valid_books() -> Result<String, CompletionError> {
    let books: Vec<String> = (1..=5)
        .map(|i| book(&format!("Book {}", i), "a calm, gentle story", 95 - i as u8))
        .collect();
    Ok(format!("[{}]", books.join(",")))
}

fn quick_survey() -> SurveyInput {
    serde_json::from_str(
        r#"{"mode": "quick", "genres": ["fiction"], "mood": "curious",
            "goal": "entertain", "pacing": "moderate"}"#,
    )
    .unwrap()
}

// Scenario A: five valid candidates yield exactly three recommendations,
// each with purchase links and a match score in [70, 98].
#[tokio::test]
async fn scenario_a_quick_survey_yields_three_complete_recommendations() {
    let service = service_with(vec![profile_response(), five_valid_books()]);
    let generated = service.generate(quick_survey()).await.unwrap();

    assert_eq!(generated.recommendations.len(), 3);
    for rec in &generated.recommendations {
        assert!(!rec.book.id.is_empty());
        assert!(!rec.book.purchase_links.is_empty());
        assert!((70..=98).contains(&rec.book.match_score));
        assert!(rec.book.psychological_match.is_complete());
        assert!(!rec.details.reading_time.is_empty());
    }
    assert_eq!(
        generated.agents_run,
        vec!["profiler", "curator", "filter", "evaluator", "presenter"]
    );
}

// Scenario B: a "violence" trigger removes candidates mentioning murder.
#[tokio::test]
async fn scenario_b_trigger_filter_removes_matching_candidates() {
    let books = format!(
        "[{},{},{},{}]",
        book("Grim Tale", "a murder investigation in Oslo", 95),
        book("Calm One", "a quiet coastal summer", 90),
        book("Calm Two", "a gentle friendship story", 88),
        book("Calm Three", "a warm family novel", 86),
    );
    let mut survey = quick_survey();
    survey.triggers = vec!["violence".to_string()];

    let service = service_with(vec![profile_response(), Ok(books)]);
    let generated = service.generate(survey).await.unwrap();

    assert_eq!(generated.recommendations.len(), 3);
    assert!(generated
        .recommendations
        .iter()
        .all(|rec| rec.book.title != "Grim Tale"));
}

// Scenario C: a quota failure reaches the caller with "quota" in the
// message, and no session is created.
#[tokio::test]
async fn scenario_c_quota_error_is_fatal_and_creates_no_session() {
    let service = service_with(vec![Err(CompletionError::QuotaExceeded)]);
    let err = service.generate(quick_survey()).await.unwrap_err();

    assert!(err.to_string().contains("quota"));
    assert!(matches!(err, RecommendError::Completion(_)));
}

// Scenario D: garbage curation output degrades to the single fallback book.
#[tokio::test]
async fn scenario_d_unparsable_curation_yields_the_fallback_book() {
    let service = service_with(vec![
        profile_response(),
        Ok("I'm sorry, I can't produce a list today.".to_string()),
    ]);
    let generated = service.generate(quick_survey()).await.unwrap();

    assert_eq!(generated.recommendations.len(), 1);
    let rec = &generated.recommendations[0];
    assert_eq!(rec.book.title, "The Midnight Library");
    assert!(!rec.book.id.is_empty());
    assert_eq!(rec.book.purchase_links.len(), 3);
    assert!((70..=98).contains(&rec.book.match_score));
}

// Ranking is descending and stable all the way to the final output.
#[tokio::test]
async fn recommendations_are_ranked_descending_and_stable() {
    let books = format!(
        "[{},{},{},{},{}]",
        book("Tie One", "a calm story", 88),
        book("Top", "a calm story", 95),
        book("Tie Two", "a calm story", 88),
        book("Low", "a calm story", 75),
        book("Tie Three", "a calm story", 88),
    );
    let service = service_with(vec![profile_response(), Ok(books)]);
    let generated = service.generate(quick_survey()).await.unwrap();

    let titles: Vec<&str> = generated
        .recommendations
        .iter()
        .map(|r| r.book.title.as_str())
        .collect();
    // Top score first, then the 88-tie in curator order.
    assert_eq!(titles, vec!["Top", "Tie One", "Tie Two"]);
}

// The rating round-trip: submit, then read back under the exact book id.
#[tokio::test]
async fn rating_roundtrip_through_the_session_store() {
    let service = service_with(vec![profile_response(), five_valid_books()]);
    let generated = service.generate(quick_survey()).await.unwrap();
    let book_id = generated.recommendations[1].book.id.clone();

    let ok = service
        .submit_rating(&generated.session_id, &book_id, 0)
        .await
        .unwrap();
    assert!(ok);

    let session = service
        .get_session(&generated.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.ratings.get(&book_id), Some(&0));
    assert_eq!(session.ratings.len(), 1);
}

// Mode cardinality holds end to end whenever enough candidates survive.
#[tokio::test]
async fn cinema_mode_returns_exactly_two_recommendations() {
    let books = format!(
        "[{},{},{},{}]",
        book("One", "a calm story", 90),
        book("Two", "a calm story", 89),
        book("Three", "a calm story", 88),
        book("Four", "a calm story", 87),
    );
    let survey: SurveyInput = serde_json::from_str(
        r#"{"mode": "cinema", "films": ["Arrival", "Her"],
            "filmConnection": "quiet, humane science fiction"}"#,
    )
    .unwrap();

    let service = service_with(vec![profile_response(), Ok(books)]);
    let generated = service.generate(survey).await.unwrap();
    assert_eq!(generated.recommendations.len(), 2);
}

// An over-aggressive filter never empties the result: the orchestrator
// falls back to the unfiltered list.
#[tokio::test]
async fn filtering_never_empties_the_result() {
    let books = format!(
        "[{},{}]",
        book("Dark One", "a brutal murder story", 90),
        book("Dark Two", "war and violence everywhere", 85),
    );
    let mut survey = quick_survey();
    survey.triggers = vec!["violence".to_string()];

    let service = service_with(vec![profile_response(), Ok(books)]);
    let generated = service.generate(survey).await.unwrap();
    assert!(!generated.recommendations.is_empty());
}

// Identical surveys hit the request cache; the scripted client would fail
// on a third call, so a cache hit is the only way this passes.
#[tokio::test]
async fn repeated_survey_is_served_from_cache() {
    let service = service_with(vec![profile_response(), five_valid_books()]);

    let first = service.generate(quick_survey()).await.unwrap();
    assert!(!first.from_cache);

    let second = service.generate(quick_survey()).await.unwrap();
    assert!(second.from_cache);
    assert!(second.agents_run.is_empty());
    assert_eq!(second.recommendations.len(), first.recommendations.len());

    // Each request still gets its own session.
    assert_ne!(first.session_id, second.session_id);
}

// German survey text flows through to localized generated fields.
#[tokio::test]
async fn german_survey_produces_localized_fallback_content() {
    let survey: SurveyInput = serde_json::from_str(
        r#"{"mode": "quick", "genres": ["Roman"],
            "mood": "ich bin müde und suche etwas Ruhiges",
            "goal": "abschalten und träumen"}"#,
    )
    .unwrap();

    let service = service_with(vec![
        profile_response(),
        Ok("kein JSON heute, tut mir leid".to_string()),
    ]);
    let generated = service.generate(survey).await.unwrap();

    assert_eq!(generated.recommendations.len(), 1);
    assert_eq!(
        generated.recommendations[0].book.title,
        "Die Mitternachtsbibliothek"
    );
    assert_eq!(generated.recommendations[0].details.length_category, "mittel");
}
