use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::types::{FinalRecommendation, SurveyInput, SurveyMode};

/// Ratings are ternary: 0 = thumbs down, 1 = neutral, 2 = thumbs up.
pub const MAX_RATING: u8 = 2;

pub fn is_valid_rating(rating: u8) -> bool {
    rating <= MAX_RATING
}

/// Persisted record of one survey submission: the input, the produced
/// recommendations, and the ratings added later. Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub mode: SurveyMode,
    pub survey: SurveyInput,
    pub recommendations: Vec<FinalRecommendation>,
    /// Book id -> rating in {0, 1, 2}.
    pub ratings: BTreeMap<String, u8>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session id: creation timestamp plus a short random suffix, readable in
/// logs and unique enough for a per-submission record.
pub fn new_session_id() -> String {
    let bytes: [u8; 4] = rand::random();
    let suffix: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("s-{}-{}", Utc::now().timestamp_millis(), suffix)
}
