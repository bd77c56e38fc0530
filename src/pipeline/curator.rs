//! Curator stage: ask the model for book candidates and enrich them with
//! ids, cover images and purchase links.
//!
//! Unparsable model output is not an error here: the stage degrades to a
//! single well-known fallback book so the pipeline always has something to
//! present. Only completion failures propagate.

use chrono::Utc;
use tracing::{info, warn};

use crate::llm::{CompletionClient, CompletionError, CompletionOptions};
use crate::locale::Locale;

use super::parsing::parse_candidates;
use super::prompts::build_curation_prompt;
use super::types::{
    BookCandidate, Complexity, EmotionalTone, PsychologicalMatch, PurchaseLink, SurveyInput,
    UserProfile,
};

const CURATION_TEMPERATURE: f32 = 0.8;
const CURATION_MAX_TOKENS: u32 = 8000;

/// Fixed pool of cover placeholders; selection is a deterministic function
/// of the title so re-renders stay stable.
const COVER_POOL: &[&str] = &[
    "/assets/covers/cover-01.jpg",
    "/assets/covers/cover-02.jpg",
    "/assets/covers/cover-03.jpg",
    "/assets/covers/cover-04.jpg",
    "/assets/covers/cover-05.jpg",
    "/assets/covers/cover-06.jpg",
    "/assets/covers/cover-07.jpg",
    "/assets/covers/cover-08.jpg",
];

/// Search-URL templates per retailer; `{}` takes the encoded "title author"
/// query.
const RETAILERS: &[(&str, &str)] = &[
    ("Amazon", "https://www.amazon.de/s?i=stripbooks&k={}"),
    ("Thalia", "https://www.thalia.de/suche?sq={}"),
    ("Hugendubel", "https://www.hugendubel.de/de/search?searchString={}"),
];

/// Run the curator against the completion client.
pub async fn run(
    client: &dyn CompletionClient,
    model: &str,
    profile: &UserProfile,
    survey: &SurveyInput,
    locale: Locale,
) -> Result<Vec<BookCandidate>, CompletionError> {
    let prompt = build_curation_prompt(profile, survey, locale);
    let options = CompletionOptions {
        model: model.to_string(),
        temperature: CURATION_TEMPERATURE,
        max_tokens: CURATION_MAX_TOKENS,
    };

    let response = client.complete(&prompt, &options).await?;

    let candidates = match parse_candidates(&response, locale) {
        Ok(candidates) if !candidates.is_empty() => candidates,
        Ok(_) => {
            warn!("curation response parsed but contained no usable books, using fallback book");
            vec![fallback_book(locale)]
        }
        Err(e) => {
            warn!("{}, using fallback book", e);
            vec![fallback_book(locale)]
        }
    };

    let timestamp = Utc::now().timestamp_millis();
    let mut enriched: Vec<BookCandidate> = candidates
        .into_iter()
        .map(|c| enrich(c, timestamp))
        .collect();

    // Duplicate title+author pairs would collide on id; keep the first.
    let mut seen = std::collections::HashSet::new();
    enriched.retain(|c| seen.insert(c.id.clone()));

    info!("curator produced {} candidate(s)", enriched.len());
    Ok(enriched)
}

/// Give a parsed candidate its id, cover and purchase links. Existing
/// values are kept; enrichment never overwrites.
fn enrich(mut candidate: BookCandidate, timestamp: i64) -> BookCandidate {
    if candidate.id.is_empty() {
        candidate.id = make_book_id(&candidate.title, &candidate.author, timestamp);
    }
    if candidate.cover_url.is_empty() {
        candidate.cover_url = pick_cover(&candidate.title).to_string();
    }
    if candidate.purchase_links.is_empty() {
        candidate.purchase_links = build_purchase_links(&candidate.title, &candidate.author);
    }
    candidate
}

/// Book id: normalized title and author joined with the generation
/// timestamp. Plain concatenation, no hashing.
pub fn make_book_id(title: &str, author: &str, timestamp: i64) -> String {
    format!("{}-{}-{}", slugify(title), slugify(author), timestamp)
}

/// Lowercase alphanumeric with single dashes; non-ASCII letters pass
/// through so German titles stay readable.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_dash = true;
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Deterministic cover selection: byte sum of the title modulo the pool.
fn pick_cover(title: &str) -> &'static str {
    let sum: usize = title.bytes().map(|b| b as usize).sum();
    COVER_POOL[sum % COVER_POOL.len()]
}

/// Templated search links for the three static retailers.
pub fn build_purchase_links(title: &str, author: &str) -> Vec<PurchaseLink> {
    let query = urlencoding::encode(&format!("{} {}", title, author)).into_owned();
    RETAILERS
        .iter()
        .map(|(retailer, template)| PurchaseLink {
            retailer: retailer.to_string(),
            url: template.replace("{}", &query),
        })
        .collect()
}

/// The single static fallback book, localized. Psychological-match fields
/// stay empty; the evaluator phrases them from the reader profile.
pub fn fallback_book(locale: Locale) -> BookCandidate {
    let strings = locale.strings();
    BookCandidate {
        id: String::new(),
        title: strings.fallback_title.to_string(),
        author: strings.fallback_author.to_string(),
        genres: vec!["fiction".to_string()],
        description: strings.fallback_description.to_string(),
        personalized_description: strings.fallback_personalized.to_string(),
        match_reason: strings.fallback_reason.to_string(),
        emotional_tone: EmotionalTone::Light,
        complexity: Complexity::Low,
        page_count: 304,
        publication_year: 2020,
        themes: strings.fallback_themes.iter().map(|s| s.to_string()).collect(),
        match_score: 85,
        matching_steps: strings.step_generic.iter().map(|s| s.to_string()).collect(),
        psychological_match: PsychologicalMatch::default(),
        cover_url: String::new(),
        purchase_links: Vec::new(),
    }
}
