//! Presenter stage: cut the list down to the mode's recommendation count
//! and guarantee every display field the client renders.
//!
//! This is the only place where final cardinality is decided.

use chrono::Utc;

use crate::locale::Locale;

use super::curator::{build_purchase_links, make_book_id};
use super::evaluator::complete_psychological_match;
use super::types::{
    BookCandidate, BookDetails, FinalRecommendation, SurveyInput, UserProfile,
};

/// Produce the final recommendation list.
pub fn present(
    candidates: Vec<BookCandidate>,
    profile: &UserProfile,
    survey: &SurveyInput,
    locale: Locale,
) -> Vec<FinalRecommendation> {
    let count = survey.mode.final_count();
    candidates
        .into_iter()
        .take(count)
        .map(|c| finalize(c, profile, locale))
        .collect()
}

/// Fill whatever is still missing on one candidate and attach the display
/// details block.
fn finalize(
    mut book: BookCandidate,
    profile: &UserProfile,
    locale: Locale,
) -> FinalRecommendation {
    if book.id.is_empty() {
        book.id = make_book_id(&book.title, &book.author, Utc::now().timestamp_millis());
    }
    if book.purchase_links.is_empty() {
        book.purchase_links = build_purchase_links(&book.title, &book.author);
    }
    if !book.psychological_match.is_complete() {
        complete_psychological_match(&mut book.psychological_match, profile, locale);
    }

    let details = book_details(book.page_count, locale);
    FinalRecommendation { book, details }
}

/// Length category and reading-time estimate, bucketed by page count.
pub fn book_details(page_count: u16, locale: Locale) -> BookDetails {
    let strings = locale.strings();
    let (length_category, reading_time) = if page_count < 200 {
        (strings.length_short, strings.time_short)
    } else if page_count > 400 {
        (strings.length_long, strings.time_long)
    } else {
        (strings.length_medium, strings.time_medium)
    };
    BookDetails {
        length_category: length_category.to_string(),
        reading_time: reading_time.to_string(),
    }
}
