//! Profiler stage: turn the raw survey into a psychological reader profile.
//!
//! One completion call at low temperature; any parse trouble falls back to a
//! rule-based profile built from the survey alone, so this stage only fails
//! when the completion API itself fails.

use tracing::{info, warn};

use crate::llm::{CompletionClient, CompletionError, CompletionOptions};
use crate::locale::Locale;

use super::parsing::parse_profile_object;
use super::prompts::build_profile_prompt;
use super::types::{Complexity, EmotionalTone, SurveyInput, SurveyMode, UserProfile};

const PROFILE_TEMPERATURE: f32 = 0.3;
const PROFILE_MAX_TOKENS: u32 = 800;

/// Mood words that suggest a reader currently wants gentler books.
const STRAINED_MOOD_WORDS: &[&str] = &[
    "sad", "anxious", "stressed", "tired", "exhausted", "overwhelmed",
    "traurig", "ängstlich", "gestresst", "müde", "erschöpft", "überfordert",
];

/// Run the profiler against the completion client.
/// Completion errors propagate (they are fatal for the pipeline run); parse
/// failures degrade to [`fallback_profile`].
pub async fn run(
    client: &dyn CompletionClient,
    model: &str,
    survey: &SurveyInput,
    locale: Locale,
) -> Result<UserProfile, CompletionError> {
    let prompt = build_profile_prompt(survey, locale);
    let options = CompletionOptions {
        model: model.to_string(),
        temperature: PROFILE_TEMPERATURE,
        max_tokens: PROFILE_MAX_TOKENS,
    };

    let response = client.complete(&prompt, &options).await?;

    let profile = match parse_profile_object(&response) {
        Ok(value) => {
            let mut profile = fallback_profile(survey, locale);
            merge_parsed_fields(&mut profile, &value);
            info!("profiler produced a model-backed profile");
            profile
        }
        Err(e) => {
            warn!("profile response unparsable ({}), using rule-based fallback", e);
            fallback_profile(survey, locale)
        }
    };

    Ok(profile)
}

/// Overlay fields the model actually produced onto the rule-based baseline,
/// so partial responses still contribute what they have.
fn merge_parsed_fields(profile: &mut UserProfile, value: &serde_json::Value) {
    if let Some(state) = non_empty(&value["emotional_state"]) {
        profile.emotional_state = state;
    }
    if let Some(style) = non_empty(&value["cognitive_style"]) {
        profile.cognitive_style = style;
    }
    if let Some(traits) = value["personality_traits"].as_array() {
        let traits: Vec<String> = traits.iter().filter_map(non_empty).collect();
        if !traits.is_empty() {
            profile.personality_traits = traits;
        }
    }
    if let Some(motivation) = non_empty(&value["reading_motivation"]) {
        profile.reading_motivation = motivation;
    }
    if let Some(tolerance) = value["complexity_tolerance"].as_str() {
        profile.complexity_tolerance = Complexity::parse_or_default(tolerance);
    }
    if let Some(tolerance) = value["emotional_tolerance"].as_str() {
        profile.emotional_tolerance = EmotionalTone::parse_or_default(tolerance);
    }
}

fn non_empty(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Rule-based profile keyed on survey mode and the raw mood/goal strings.
/// No model call; used whenever the model's answer cannot be parsed.
pub fn fallback_profile(survey: &SurveyInput, locale: Locale) -> UserProfile {
    let strings = locale.strings();

    let emotional_state = if survey.mood.trim().is_empty() {
        strings.profile_default_state.to_string()
    } else {
        survey.mood.trim().to_string()
    };

    let reading_motivation = if survey.goal.trim().is_empty() {
        strings.profile_default_motivation.to_string()
    } else {
        survey.goal.trim().to_string()
    };

    let (cognitive_style, traits): (&str, &[&str]) = match survey.mode {
        SurveyMode::Quick => (strings.profile_style_quick, strings.profile_traits_quick),
        SurveyMode::Deep => (strings.profile_style_deep, strings.profile_traits_deep),
        SurveyMode::Cinema => (strings.profile_style_cinema, strings.profile_traits_cinema),
        SurveyMode::BookInspiration => {
            (strings.profile_style_books, strings.profile_traits_books)
        }
    };

    let complexity_tolerance = match survey.complexity.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Complexity::parse_or_default(raw),
        _ if survey.mode == SurveyMode::Deep => Complexity::High,
        _ => Complexity::Medium,
    };

    let mood_lower = survey.mood.to_lowercase();
    let emotional_tolerance = if STRAINED_MOOD_WORDS.iter().any(|w| mood_lower.contains(w)) {
        EmotionalTone::Light
    } else if survey.mode == SurveyMode::Deep {
        EmotionalTone::Heavy
    } else {
        EmotionalTone::Medium
    };

    UserProfile {
        emotional_state,
        cognitive_style: cognitive_style.to_string(),
        personality_traits: traits.iter().map(|s| s.to_string()).collect(),
        reading_motivation,
        complexity_tolerance,
        emotional_tolerance,
        confidence: compute_confidence(survey),
    }
}

/// Confidence in the profile: 0.5 base, +0.05 per answered survey field
/// (at most +0.3), +0.1 for deep mode, +0.1 for cinema with at least two
/// films, never above 0.95.
pub fn compute_confidence(survey: &SurveyInput) -> f32 {
    let mut filled = 0u32;
    if !survey.genres.is_empty() {
        filled += 1;
    }
    if !survey.mood.trim().is_empty() {
        filled += 1;
    }
    if !survey.goal.trim().is_empty() {
        filled += 1;
    }
    if !survey.pacing.trim().is_empty() {
        filled += 1;
    }
    if !survey.triggers.is_empty() {
        filled += 1;
    }
    if !survey.films.is_empty() {
        filled += 1;
    }
    if survey.film_connection.as_deref().is_some_and(|c| !c.trim().is_empty()) {
        filled += 1;
    }
    if !survey.favorite_books.is_empty() {
        filled += 1;
    }
    if survey.complexity.as_deref().is_some_and(|c| !c.trim().is_empty()) {
        filled += 1;
    }
    if survey.length.is_some() {
        filled += 1;
    }

    let mut confidence = 0.5 + (filled as f32 * 0.05).min(0.3);
    if survey.mode == SurveyMode::Deep {
        confidence += 0.1;
    }
    if survey.mode == SurveyMode::Cinema && survey.films.len() >= 2 {
        confidence += 0.1;
    }
    confidence.min(0.95)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{FavoriteBook, LengthPreference};

    fn empty_survey(mode: SurveyMode) -> SurveyInput {
        SurveyInput {
            mode,
            genres: vec![],
            mood: String::new(),
            goal: String::new(),
            pacing: String::new(),
            triggers: vec![],
            films: vec![],
            film_connection: None,
            favorite_books: vec![],
            complexity: None,
            length: None,
            email: None,
            consent: true,
        }
    }

    #[test]
    fn test_confidence_base_for_empty_survey() {
        let survey = empty_survey(SurveyMode::Quick);
        assert!((compute_confidence(&survey) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_per_field_bonus_is_capped() {
        let mut survey = empty_survey(SurveyMode::Quick);
        survey.genres = vec!["fiction".to_string()];
        survey.mood = "curious".to_string();
        survey.goal = "learn".to_string();
        assert!((compute_confidence(&survey) - 0.65).abs() < 1e-6);

        // All ten fields answered: bonus saturates at +0.3.
        survey.pacing = "fast".to_string();
        survey.triggers = vec!["violence".to_string()];
        survey.films = vec!["Arrival".to_string()];
        survey.film_connection = Some("mood".to_string());
        survey.favorite_books = vec![FavoriteBook {
            title: "Piranesi".to_string(),
            reason: String::new(),
        }];
        survey.complexity = Some("high".to_string());
        survey.length = Some(LengthPreference::Any);
        assert!((compute_confidence(&survey) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_mode_bonuses() {
        let survey = empty_survey(SurveyMode::Deep);
        assert!((compute_confidence(&survey) - 0.6).abs() < 1e-6);

        let mut survey = empty_survey(SurveyMode::Cinema);
        survey.films = vec!["Arrival".to_string()];
        // One film: the films field counts, but no cinema bonus.
        assert!((compute_confidence(&survey) - 0.55).abs() < 1e-6);
        survey.films.push("Her".to_string());
        assert!((compute_confidence(&survey) - 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_never_exceeds_cap() {
        let mut survey = empty_survey(SurveyMode::Deep);
        survey.genres = vec!["a".to_string()];
        survey.mood = "m".to_string();
        survey.goal = "g".to_string();
        survey.pacing = "p".to_string();
        survey.triggers = vec!["t".to_string()];
        survey.films = vec!["f".to_string(), "f2".to_string()];
        survey.film_connection = Some("c".to_string());
        survey.favorite_books = vec![FavoriteBook {
            title: "b".to_string(),
            reason: String::new(),
        }];
        survey.complexity = Some("high".to_string());
        survey.length = Some(LengthPreference::Long);
        assert!(compute_confidence(&survey) <= 0.95);
    }

    #[test]
    fn test_fallback_reuses_mood_and_goal() {
        let mut survey = empty_survey(SurveyMode::Quick);
        survey.mood = "restless".to_string();
        survey.goal = "switch off".to_string();
        let profile = fallback_profile(&survey, Locale::En);
        assert_eq!(profile.emotional_state, "restless");
        assert_eq!(profile.reading_motivation, "switch off");
    }

    #[test]
    fn test_fallback_defaults_are_localized() {
        let profile = fallback_profile(&empty_survey(SurveyMode::Quick), Locale::De);
        assert_eq!(profile.emotional_state, "ausgeglichen und offen für Neues");
    }

    #[test]
    fn test_fallback_tolerances_by_mode_and_mood() {
        let deep = fallback_profile(&empty_survey(SurveyMode::Deep), Locale::En);
        assert_eq!(deep.complexity_tolerance, Complexity::High);
        assert_eq!(deep.emotional_tolerance, EmotionalTone::Heavy);

        let mut survey = empty_survey(SurveyMode::Deep);
        survey.mood = "honestly pretty stressed".to_string();
        let strained = fallback_profile(&survey, Locale::En);
        assert_eq!(strained.emotional_tolerance, EmotionalTone::Light);

        let mut survey = empty_survey(SurveyMode::Quick);
        survey.complexity = Some("low".to_string());
        let explicit = fallback_profile(&survey, Locale::En);
        assert_eq!(explicit.complexity_tolerance, Complexity::Low);
    }

    #[test]
    fn test_merge_overlays_only_present_fields() {
        let survey = empty_survey(SurveyMode::Quick);
        let mut profile = fallback_profile(&survey, Locale::En);
        let baseline_style = profile.cognitive_style.clone();

        let value = serde_json::json!({
            "emotional_state": "wired",
            "personality_traits": ["bold"],
            "emotional_tolerance": "heavy"
        });
        merge_parsed_fields(&mut profile, &value);

        assert_eq!(profile.emotional_state, "wired");
        assert_eq!(profile.personality_traits, vec!["bold"]);
        assert_eq!(profile.emotional_tolerance, EmotionalTone::Heavy);
        // Absent fields keep the rule-based baseline.
        assert_eq!(profile.cognitive_style, baseline_style);
    }
}
