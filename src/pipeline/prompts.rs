//! Prompt construction for the profiler and curator stages.
//!
//! Pure functions: survey (and profile) in, instruction text out. The JSON
//! shape the model must produce is embedded in the prompt as a schema text
//! rather than enforced through provider-specific structured-output modes.

use crate::locale::Locale;

use super::types::{SurveyInput, SurveyMode, UserProfile};

/// Return a compact text version of the book JSON schema for embedding in
/// the curation prompt.
pub fn book_schema_text() -> String {
    let schema = serde_json::json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Exact published title" },
                "author": { "type": "string", "description": "Author name" },
                "genres": { "type": "array", "items": { "type": "string" } },
                "description": { "type": "string", "description": "Neutral 2-3 sentence summary" },
                "personalized_description": {
                    "type": "string",
                    "description": "Why this reader specifically will enjoy it, addressed to them"
                },
                "match_reason": { "type": "string", "description": "One-sentence match rationale" },
                "emotional_tone": { "type": "string", "enum": ["light", "medium", "heavy"] },
                "complexity": { "type": "string", "enum": ["low", "medium", "high"] },
                "page_count": { "type": "integer", "description": "Approximate page count" },
                "publication_year": { "type": "integer" },
                "themes": { "type": "array", "items": { "type": "string" } },
                "match_score": {
                    "type": "integer",
                    "description": "Recommendation strength between 70 and 98"
                },
                "matching_steps": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "At least 3 ordered reasons this book matches the survey"
                },
                "psychological_match": {
                    "type": "object",
                    "properties": {
                        "mood_alignment": { "type": "string" },
                        "cognitive_fit": { "type": "string" },
                        "therapeutic_value": { "type": "string" },
                        "personality_resonance": { "type": "string" }
                    }
                }
            },
            "required": ["title", "author", "description"]
        }
    });
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "[]".to_string())
}

/// Render the mode-specific survey section included in both prompts.
fn survey_section(survey: &SurveyInput) -> String {
    let mut lines = vec![format!("Survey mode: {}", survey.mode.as_str())];

    match survey.mode {
        SurveyMode::Cinema => {
            if !survey.films.is_empty() {
                lines.push(format!("Favorite films: {}", survey.films.join(", ")));
            }
            if let Some(connection) = &survey.film_connection {
                if !connection.trim().is_empty() {
                    lines.push(format!("What connects these films: {}", connection));
                }
            }
        }
        SurveyMode::BookInspiration => {
            for favorite in &survey.favorite_books {
                if favorite.reason.trim().is_empty() {
                    lines.push(format!("Loved book: {}", favorite.title));
                } else {
                    lines.push(format!(
                        "Loved book: {} - because: {}",
                        favorite.title, favorite.reason
                    ));
                }
            }
        }
        SurveyMode::Quick | SurveyMode::Deep => {
            if !survey.genres.is_empty() {
                lines.push(format!("Preferred genres: {}", survey.genres.join(", ")));
            }
        }
    }

    if !survey.mood.trim().is_empty() {
        lines.push(format!("Current mood: {}", survey.mood));
    }
    if !survey.goal.trim().is_empty() {
        lines.push(format!("Reading goal: {}", survey.goal));
    }
    if !survey.pacing.trim().is_empty() {
        lines.push(format!("Preferred pacing: {}", survey.pacing));
    }
    if !survey.triggers.is_empty() {
        lines.push(format!(
            "Content to avoid: {}",
            survey.triggers.join(", ")
        ));
    }

    lines.join("\n")
}

/// Build the psychology-analysis prompt for the profiler.
/// Asks for a single JSON object describing the reader.
pub fn build_profile_prompt(survey: &SurveyInput, locale: Locale) -> String {
    let section = survey_section(survey);
    let directive = locale.strings().language_directive;
    format!(
        r#"Analyze the reader behind the following book survey and describe them psychologically.

SURVEY:
{section}

RULES:
- Base the analysis only on the survey answers above. Do NOT invent biographical facts.
- Keep each field to one short phrase or sentence.
- complexity_tolerance must be one of: low, medium, high.
- emotional_tolerance must be one of: light, medium, heavy.
- {directive}

Return a single JSON object with exactly these fields:
{{
  "emotional_state": "...",
  "cognitive_style": "...",
  "personality_traits": ["...", "..."],
  "reading_motivation": "...",
  "complexity_tolerance": "low|medium|high",
  "emotional_tolerance": "light|medium|heavy"
}}"#
    )
}

/// Build the book-generation prompt for the curator.
/// Requests a mode-dependent number of real books as a JSON array.
pub fn build_curation_prompt(
    profile: &UserProfile,
    survey: &SurveyInput,
    locale: Locale,
) -> String {
    let count = survey.mode.curated_count();
    let section = survey_section(survey);
    let schema = book_schema_text();
    let directive = locale.strings().language_directive;
    let traits = profile.personality_traits.join(", ");
    format!(
        r#"Recommend exactly {count} books for the reader described below.

READER PROFILE:
- Emotional state: {emotional_state}
- Cognitive style: {cognitive_style}
- Personality traits: {traits}
- Reading motivation: {motivation}
- Complexity tolerance: {complexity}
- Emotional tolerance: {tolerance}

SURVEY:
{section}

RULES:
- Recommend only real, existing, published books. Do NOT invent titles or authors.
- No duplicate titles and at most one book per author.
- Respect the "content to avoid" list strictly.
- match_score is an integer between 70 and 98.
- matching_steps must contain at least 3 entries.
- {directive}

Return a JSON array matching this schema, with no text before or after it:
{schema}"#,
        count = count,
        emotional_state = profile.emotional_state,
        cognitive_style = profile.cognitive_style,
        traits = traits,
        motivation = profile.reading_motivation,
        complexity = profile.complexity_tolerance.as_str(),
        tolerance = profile.emotional_tolerance.as_str(),
        section = section,
        schema = schema,
        directive = directive,
    )
}
