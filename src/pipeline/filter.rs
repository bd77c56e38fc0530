//! Filter stage: four sequential content filters over the candidate list.
//!
//! Purely local, order-preserving, and advisory: each pass may only shrink
//! the list, and the orchestrator reverts to the unfiltered list when
//! nothing survives. This stage never errors.

use chrono::Datelike;
use tracing::info;

use super::types::{BookCandidate, LengthPreference, SurveyInput, SurveyMode};

/// Static expansion from a survey trigger tag to the keywords it covers.
/// Unknown tags fall back to matching the tag text itself.
const TRIGGER_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "violence",
        &["violence", "violent", "murder", "war", "brutal", "assault", "killing"],
    ),
    (
        "death",
        &["death", "dying", "grief", "bereavement", "terminal illness", "loss of a child"],
    ),
    (
        "abuse",
        &["abuse", "abusive", "domestic violence", "childhood trauma"],
    ),
    (
        "addiction",
        &["addiction", "alcoholism", "drug", "substance", "overdose"],
    ),
    (
        "sexual-content",
        &["sexual assault", "rape", "explicit sex"],
    ),
    (
        "self-harm",
        &["self-harm", "suicide", "suicidal"],
    ),
];

/// Run all four filters in order. The input is borrowed so the caller can
/// keep the pre-filter list for the advisory-revert contract.
pub fn apply(candidates: &[BookCandidate], survey: &SurveyInput) -> Vec<BookCandidate> {
    let mut result: Vec<BookCandidate> = candidates.to_vec();
    let before = result.len();

    result.retain(|c| passes_trigger_filter(c, &survey.triggers));
    result.retain(|c| passes_complexity_filter(c, survey));
    result.retain(|c| passes_length_filter(c, survey.length));
    result.retain(passes_availability_filter);

    if result.len() < before {
        info!("filter kept {}/{} candidates", result.len(), before);
    }
    result
}

/// Drop candidates whose text mentions any keyword behind the reader's
/// trigger tags. Matching is lowercase substring over description, themes
/// and genres.
fn passes_trigger_filter(candidate: &BookCandidate, triggers: &[String]) -> bool {
    if triggers.is_empty() {
        return true;
    }

    let haystack = format!(
        "{} {} {}",
        candidate.description,
        candidate.themes.join(" "),
        candidate.genres.join(" ")
    )
    .to_lowercase();

    for tag in triggers {
        let tag_lower = tag.trim().to_lowercase();
        if tag_lower.is_empty() {
            continue;
        }
        let keywords = TRIGGER_KEYWORDS
            .iter()
            .find(|(name, _)| *name == tag_lower)
            .map(|(_, keywords)| *keywords);
        let hit = match keywords {
            Some(keywords) => keywords.iter().any(|k| haystack.contains(k)),
            None => haystack.contains(&tag_lower),
        };
        if hit {
            return false;
        }
    }
    true
}

/// Reader tolerance on the low < medium < high < academic scale, taken from
/// the survey (default medium). Deep mode grants one extra level.
fn tolerance_ordinal(survey: &SurveyInput) -> u8 {
    let base = match survey
        .complexity
        .as_deref()
        .map(|c| c.trim().to_lowercase())
        .as_deref()
    {
        Some("low") => 0,
        Some("high") => 2,
        Some("academic") => 3,
        _ => 1,
    };
    if survey.mode == SurveyMode::Deep {
        base + 1
    } else {
        base
    }
}

fn passes_complexity_filter(candidate: &BookCandidate, survey: &SurveyInput) -> bool {
    candidate.complexity.ordinal() <= tolerance_ordinal(survey)
}

/// Page-count thresholds per length preference.
fn passes_length_filter(candidate: &BookCandidate, preference: Option<LengthPreference>) -> bool {
    let pages = candidate.page_count;
    match preference {
        Some(LengthPreference::Short) => pages <= 250,
        Some(LengthPreference::Medium) => (150..=450).contains(&pages),
        Some(LengthPreference::Long) => pages >= 350,
        Some(LengthPreference::Any) | None => true,
    }
}

/// Drop books published more than a century ago or dated in the future.
fn passes_availability_filter(candidate: &BookCandidate) -> bool {
    let current_year = chrono::Utc::now().date_naive().year();
    candidate.publication_year >= current_year - 100 && candidate.publication_year <= current_year
}
