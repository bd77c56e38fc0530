//! Parsing and normalization of model output.
//!
//! Model responses are untrusted: they may be fenced in markdown, wrapped in
//! prose, or missing fields. Everything is parsed into a loose
//! `serde_json::Value` first and mapped field-by-field with explicit default
//! substitution, so every [`BookCandidate`] leaving this module already
//! satisfies the documented bounds.

use chrono::{Datelike, Utc};
use thiserror::Error;

use crate::locale::Locale;

use super::types::{BookCandidate, Complexity, EmotionalTone, PsychologicalMatch};

/// Maximum number of candidates accepted from one response.
const MAX_CANDIDATES: usize = 10;
/// Substituted when the model's match score is missing or out of [70, 98].
const DEFAULT_MATCH_SCORE: u8 = 85;
const DEFAULT_PAGE_COUNT: u16 = 300;
const DEFAULT_PUBLICATION_YEAR: i32 = 2020;

/// The response could not be turned into any candidate at all. Callers
/// recover with a static fallback instead of retrying.
#[derive(Debug, Clone, Error)]
#[error("AI generation unparsable: {0}")]
pub struct ParseFailure(pub String);

/// Strip markdown code fences from a model response if present.
/// Providers without a strict JSON mode often wrap output in ```json ... ```.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        let after_open = if let Some(pos) = trimmed.find('\n') {
            &trimmed[pos + 1..]
        } else {
            trimmed
        };
        let cleaned = after_open.trim_end();
        if cleaned.ends_with("```") {
            cleaned[..cleaned.len() - 3].trim().to_string()
        } else {
            cleaned.to_string()
        }
    } else {
        trimmed.to_string()
    }
}

/// Slice out the JSON array, treating everything outside the first `[` and
/// the last `]` as prose noise.
///
/// Known limitation: prose containing brackets around the payload defeats
/// this extraction. TODO: replace with a depth-counting scanner that finds
/// the first balanced top-level array.
fn extract_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Object-shaped equivalent of [`extract_array`], for the profiler.
fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse a curation response into normalized candidates.
///
/// Elements without a non-empty title, author and description are dropped;
/// every other field is normalized or defaulted. The result is capped at
/// [`MAX_CANDIDATES`] entries. Failure to locate or parse a JSON array is a
/// [`ParseFailure`], never a panic.
pub fn parse_candidates(raw: &str, locale: Locale) -> Result<Vec<BookCandidate>, ParseFailure> {
    let cleaned = strip_code_fences(raw);
    let payload = extract_array(&cleaned)
        .ok_or_else(|| ParseFailure("no JSON array found in response".to_string()))?;

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| ParseFailure(format!("invalid JSON: {}", e)))?;

    let items = value
        .as_array()
        .ok_or_else(|| ParseFailure("response payload is not a JSON array".to_string()))?;

    let candidates: Vec<BookCandidate> = items
        .iter()
        .filter_map(|item| normalize_candidate(item, locale))
        .take(MAX_CANDIDATES)
        .collect();

    Ok(candidates)
}

/// Parse a profile response into a loose JSON object. Field extraction and
/// defaulting happen in the profiler, which owns the fallback profile.
pub fn parse_profile_object(raw: &str) -> Result<serde_json::Value, ParseFailure> {
    let cleaned = strip_code_fences(raw);
    let payload = extract_object(&cleaned)
        .ok_or_else(|| ParseFailure("no JSON object found in response".to_string()))?;

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| ParseFailure(format!("invalid JSON: {}", e)))?;

    if value.is_object() {
        Ok(value)
    } else {
        Err(ParseFailure("response payload is not a JSON object".to_string()))
    }
}

/// Map one array element to a candidate, or drop it when the required
/// fields are absent. The id, cover and purchase links stay empty here; the
/// curator fills them right after parsing.
fn normalize_candidate(item: &serde_json::Value, locale: Locale) -> Option<BookCandidate> {
    let title = non_empty_str(&item["title"])?;
    let author = non_empty_str(&item["author"])?;
    let description = non_empty_str(&item["description"])?;
    let strings = locale.strings();

    let current_year = Utc::now().year();

    Some(BookCandidate {
        id: String::new(),
        title,
        author,
        genres: string_list(&item["genres"]),
        description,
        personalized_description: non_empty_str(&item["personalized_description"])
            .unwrap_or_else(|| strings.default_personalized_description.to_string()),
        match_reason: non_empty_str(&item["match_reason"])
            .unwrap_or_else(|| strings.default_match_reason.to_string()),
        emotional_tone: EmotionalTone::parse_or_default(
            item["emotional_tone"].as_str().unwrap_or(""),
        ),
        complexity: Complexity::parse_or_default(item["complexity"].as_str().unwrap_or("")),
        page_count: normalize_page_count(&item["page_count"]),
        publication_year: normalize_publication_year(&item["publication_year"], current_year),
        themes: {
            let themes = string_list(&item["themes"]);
            if themes.is_empty() {
                strings.default_themes.iter().map(|s| s.to_string()).collect()
            } else {
                themes
            }
        },
        match_score: normalize_match_score(&item["match_score"]),
        matching_steps: {
            let steps = string_list(&item["matching_steps"]);
            if steps.is_empty() {
                strings.step_generic.iter().map(|s| s.to_string()).collect()
            } else {
                steps
            }
        },
        psychological_match: normalize_psychological_match(&item["psychological_match"]),
        cover_url: String::new(),
        purchase_links: Vec::new(),
    })
}

fn non_empty_str(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn string_list(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(non_empty_str)
                .collect::<Vec<String>>()
        })
        .unwrap_or_default()
}

/// 85 unless the model produced a number inside [70, 98].
fn normalize_match_score(value: &serde_json::Value) -> u8 {
    match value.as_i64().or_else(|| value.as_f64().map(|f| f as i64)) {
        Some(score) if (70..=98).contains(&score) => score as u8,
        _ => DEFAULT_MATCH_SCORE,
    }
}

/// 300 unless the model produced a count inside [150, 800].
fn normalize_page_count(value: &serde_json::Value) -> u16 {
    match value.as_i64() {
        Some(pages) if (150..=800).contains(&pages) => pages as u16,
        _ => DEFAULT_PAGE_COUNT,
    }
}

/// 2020 unless the model produced a year inside [1950, current year].
fn normalize_publication_year(value: &serde_json::Value, current_year: i32) -> i32 {
    match value.as_i64() {
        Some(year) if year >= 1950 && year <= current_year as i64 => year as i32,
        _ => DEFAULT_PUBLICATION_YEAR,
    }
}

/// Carry over whatever sub-fields the model produced. Completeness is
/// guaranteed later by the evaluator, which can phrase the missing parts
/// from the reader profile.
fn normalize_psychological_match(value: &serde_json::Value) -> PsychologicalMatch {
    PsychologicalMatch {
        mood_alignment: non_empty_str(&value["mood_alignment"]).unwrap_or_default(),
        cognitive_fit: non_empty_str(&value["cognitive_fit"]).unwrap_or_default(),
        therapeutic_value: non_empty_str(&value["therapeutic_value"]).unwrap_or_default(),
        personality_resonance: non_empty_str(&value["personality_resonance"]).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_json(title: &str) -> String {
        format!(
            r#"{{"title": "{}", "author": "Some Author", "description": "A fine book.",
                "emotional_tone": "light", "complexity": "low", "page_count": 320,
                "publication_year": 2015, "match_score": 91,
                "themes": ["hope"], "matching_steps": ["a", "b", "c"],
                "psychological_match": {{"mood_alignment": "m", "cognitive_fit": "c",
                    "therapeutic_value": "t", "personality_resonance": "p"}}}}"#,
            title
        )
    }

    #[test]
    fn test_parse_well_formed_array() {
        let raw = format!("[{}, {}]", book_json("One"), book_json("Two"));
        let candidates = parse_candidates(&raw, Locale::En).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "One");
        assert_eq!(candidates[0].match_score, 91);
        assert_eq!(candidates[0].page_count, 320);
        assert_eq!(candidates[0].emotional_tone, EmotionalTone::Light);
    }

    #[test]
    fn test_parse_strips_code_fences() {
        let raw = format!("```json\n[{}]\n```", book_json("Fenced"));
        let candidates = parse_candidates(&raw, Locale::En).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Fenced");
    }

    #[test]
    fn test_parse_ignores_surrounding_prose() {
        let raw = format!(
            "Here are my recommendations:\n[{}]\nI hope you enjoy them!",
            book_json("Wrapped")
        );
        let candidates = parse_candidates(&raw, Locale::En).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_elements_without_required_fields_are_dropped() {
        let raw = format!(
            r#"[{}, {{"title": "", "author": "X", "description": "y"}},
                {{"author": "No Title", "description": "y"}}]"#,
            book_json("Valid")
        );
        let candidates = parse_candidates(&raw, Locale::En).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Valid");
    }

    #[test]
    fn test_out_of_range_values_get_defaults() {
        let raw = r#"[{"title": "T", "author": "A", "description": "D",
            "match_score": 120, "page_count": 40, "publication_year": 1899,
            "emotional_tone": "brutal", "complexity": "phd"}]"#;
        let candidates = parse_candidates(raw, Locale::En).unwrap();
        let c = &candidates[0];
        assert_eq!(c.match_score, 85);
        assert_eq!(c.page_count, 300);
        assert_eq!(c.publication_year, 2020);
        assert_eq!(c.emotional_tone, EmotionalTone::Medium);
        assert_eq!(c.complexity, Complexity::Medium);
    }

    #[test]
    fn test_normalized_candidates_satisfy_bounds() {
        let raw = r#"[{"title": "T", "author": "A", "description": "D",
            "match_score": 98, "page_count": 800, "publication_year": 1950}]"#;
        let c = &parse_candidates(raw, Locale::En).unwrap()[0];
        assert!((70..=98).contains(&c.match_score));
        assert!((150..=800).contains(&c.page_count));
        assert!(c.publication_year >= 1950 && c.publication_year <= Utc::now().year());
    }

    #[test]
    fn test_missing_collections_get_localized_defaults() {
        let raw = r#"[{"title": "T", "author": "A", "description": "D"}]"#;
        let c = &parse_candidates(raw, Locale::De).unwrap()[0];
        assert_eq!(c.themes, vec!["Selbstfindung", "Beziehungen", "Hoffnung"]);
        assert_eq!(c.matching_steps.len(), 3);
        assert!(!c.personalized_description.is_empty());
        assert!(!c.match_reason.is_empty());
    }

    #[test]
    fn test_result_is_capped_at_ten() {
        let books: Vec<String> = (0..14).map(|i| book_json(&format!("Book {}", i))).collect();
        let raw = format!("[{}]", books.join(","));
        let candidates = parse_candidates(&raw, Locale::En).unwrap();
        assert_eq!(candidates.len(), 10);
    }

    #[test]
    fn test_garbage_is_a_parse_failure() {
        let err = parse_candidates("I cannot help with that.", Locale::En).unwrap_err();
        assert!(err.to_string().contains("unparsable"));
    }

    #[test]
    fn test_broken_json_is_a_parse_failure() {
        assert!(parse_candidates("[{\"title\": \"unterminated", Locale::En).is_err());
    }

    #[test]
    fn test_bracketed_prose_yields_no_candidates() {
        // "[1]" parses as an array of non-objects; each element is dropped.
        let candidates = parse_candidates("see [1] in the bibliography", Locale::En).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_empty_array_is_ok_and_empty() {
        let candidates = parse_candidates("[]", Locale::En).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_parse_profile_object() {
        let raw = "```json\n{\"emotional_state\": \"calm\"}\n```";
        let value = parse_profile_object(raw).unwrap();
        assert_eq!(value["emotional_state"], "calm");
    }

    #[test]
    fn test_parse_profile_object_failure() {
        assert!(parse_profile_object("no json here").is_err());
    }

    #[test]
    fn test_strip_code_fences_variants() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("[1]"), "[1]");
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
    }
}
