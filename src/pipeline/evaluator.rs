//! Evaluator stage: per-candidate validation plus the final ranking.
//!
//! Validates rather than regenerates: fields that already satisfy their
//! contract pass through untouched, and only the gaps are filled from
//! localized templates. Ends with a stable, descending sort by match score
//! so equal scores keep their curator order.

use crate::locale::Locale;

use super::types::{BookCandidate, PsychologicalMatch, SurveyInput, SurveyMode, UserProfile};

const MIN_MATCHING_STEPS: usize = 3;

/// Validate every candidate and rank the list.
pub fn evaluate(
    candidates: Vec<BookCandidate>,
    profile: &UserProfile,
    survey: &SurveyInput,
    locale: Locale,
) -> Vec<BookCandidate> {
    let mut result: Vec<BookCandidate> = candidates
        .into_iter()
        .map(|c| validate_candidate(c, profile, survey, locale))
        .collect();

    // Stable: ties keep their input order, which makes runs reproducible.
    result.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    result
}

fn validate_candidate(
    mut candidate: BookCandidate,
    profile: &UserProfile,
    survey: &SurveyInput,
    locale: Locale,
) -> BookCandidate {
    if !(70..=98).contains(&candidate.match_score) {
        candidate.match_score = 85;
    }

    if candidate.matching_steps.len() < MIN_MATCHING_STEPS {
        candidate.matching_steps = generate_matching_steps(survey, locale);
    }

    if !candidate.psychological_match.is_complete() {
        complete_psychological_match(&mut candidate.psychological_match, profile, locale);
    }

    candidate
}

/// Build "why it matches" steps from whatever survey fields were answered,
/// mode-specific first, padded with generic steps up to the minimum.
pub fn generate_matching_steps(survey: &SurveyInput, locale: Locale) -> Vec<String> {
    let strings = locale.strings();
    let mut steps = Vec::new();

    match survey.mode {
        SurveyMode::Cinema => {
            if !survey.films.is_empty() {
                steps.push(strings.step_film.replace("{}", &survey.films.join(", ")));
            }
        }
        SurveyMode::BookInspiration => {
            if let Some(favorite) = survey.favorite_books.first() {
                steps.push(strings.step_favorites.replace("{}", &favorite.title));
            }
        }
        SurveyMode::Quick | SurveyMode::Deep => {
            if !survey.genres.is_empty() {
                steps.push(strings.step_genre.replace("{}", &survey.genres.join(", ")));
            }
        }
    }

    if !survey.mood.trim().is_empty() {
        steps.push(strings.step_mood.replace("{}", survey.mood.trim()));
    }
    if !survey.goal.trim().is_empty() {
        steps.push(strings.step_goal.replace("{}", survey.goal.trim()));
    }
    if !survey.pacing.trim().is_empty() {
        steps.push(strings.step_pace.replace("{}", survey.pacing.trim()));
    }

    for generic in strings.step_generic {
        if steps.len() >= MIN_MATCHING_STEPS {
            break;
        }
        steps.push(generic.to_string());
    }

    steps
}

/// Fill only the empty sub-fields from the reader profile; model-provided
/// text is never overwritten. Also used by the presenter as a last guard.
pub(crate) fn complete_psychological_match(
    block: &mut PsychologicalMatch,
    profile: &UserProfile,
    locale: Locale,
) {
    let strings = locale.strings();

    if block.mood_alignment.trim().is_empty() {
        block.mood_alignment = strings.psych_mood.replace("{}", &profile.emotional_state);
    }
    if block.cognitive_fit.trim().is_empty() {
        block.cognitive_fit = strings.psych_cognitive.replace("{}", &profile.cognitive_style);
    }
    if block.therapeutic_value.trim().is_empty() {
        block.therapeutic_value = strings
            .psych_therapeutic
            .replace("{}", &profile.reading_motivation);
    }
    if block.personality_resonance.trim().is_empty() {
        let traits = if profile.personality_traits.is_empty() {
            profile.cognitive_style.clone()
        } else {
            profile.personality_traits.join(", ")
        };
        block.personality_resonance = strings.psych_personality.replace("{}", &traits);
    }
}
