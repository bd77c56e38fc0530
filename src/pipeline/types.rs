use serde::{Deserialize, Serialize};

/// Which survey the user filled in. The mode decides which input fields are
/// collected, how many books the curator requests, and how many
/// recommendations the presenter keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurveyMode {
    Quick,
    Deep,
    Cinema,
    BookInspiration,
}

impl SurveyMode {
    /// Number of recommendations returned to the client.
    /// This is enforced in exactly one place (the presenter).
    pub fn final_count(self) -> usize {
        match self {
            SurveyMode::Quick => 3,
            SurveyMode::Deep => 4,
            SurveyMode::Cinema => 2,
            SurveyMode::BookInspiration => 3,
        }
    }

    /// Number of books the curator asks the model for. Larger than
    /// `final_count` so the filter has room to drop candidates.
    pub fn curated_count(self) -> usize {
        match self {
            SurveyMode::Quick => 5,
            SurveyMode::Deep => 7,
            SurveyMode::Cinema => 4,
            SurveyMode::BookInspiration => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SurveyMode::Quick => "quick",
            SurveyMode::Deep => "deep",
            SurveyMode::Cinema => "cinema",
            SurveyMode::BookInspiration => "bookInspiration",
        }
    }
}

/// Preferred book length, used by the length filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthPreference {
    Short,
    Medium,
    Long,
    Any,
}

/// A favorite book with the reason the user loved it (bookInspiration mode).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteBook {
    pub title: String,
    #[serde(default)]
    pub reason: String,
}

/// User-submitted survey. Immutable once submitted; every pipeline stage
/// reads it, none mutates it. All fields except `mode` are optional on the
/// wire so partially filled surveys still parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyInput {
    pub mode: SurveyMode,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub pacing: String,
    /// Content the reader wants to avoid, as tags ("violence", "grief", ...).
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Cinema mode: films the recommendations should echo.
    #[serde(default)]
    pub films: Vec<String>,
    /// Cinema mode: what connects the listed films for this user.
    #[serde(default)]
    pub film_connection: Option<String>,
    /// BookInspiration mode: loved books with reasons.
    #[serde(default)]
    pub favorite_books: Vec<FavoriteBook>,
    /// Reader's complexity tolerance ("low", "medium", "high", "academic").
    #[serde(default)]
    pub complexity: Option<String>,
    #[serde(default)]
    pub length: Option<LengthPreference>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub consent: bool,
}

/// Emotional weight of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalTone {
    Light,
    Medium,
    Heavy,
}

impl EmotionalTone {
    /// Parse a model-provided string, defaulting to `Medium` for anything
    /// outside {light, medium, heavy}.
    pub fn parse_or_default(input: &str) -> EmotionalTone {
        match input.trim().to_lowercase().as_str() {
            "light" => EmotionalTone::Light,
            "heavy" => EmotionalTone::Heavy,
            "medium" => EmotionalTone::Medium,
            _ => EmotionalTone::Medium,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionalTone::Light => "light",
            EmotionalTone::Medium => "medium",
            EmotionalTone::Heavy => "heavy",
        }
    }
}

/// Reading complexity of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    /// Parse a model-provided string, defaulting to `Medium` for anything
    /// outside {low, medium, high}.
    pub fn parse_or_default(input: &str) -> Complexity {
        match input.trim().to_lowercase().as_str() {
            "low" => Complexity::Low,
            "high" => Complexity::High,
            "medium" => Complexity::Medium,
            _ => Complexity::Medium,
        }
    }

    /// Position on the low < medium < high scale. Reader tolerance adds a
    /// fourth level ("academic") above high, see the complexity filter.
    pub fn ordinal(self) -> u8 {
        match self {
            Complexity::Low => 0,
            Complexity::Medium => 1,
            Complexity::High => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

/// Psychological summary of the reader, derived once per request by the
/// profiler and consumed read-only by every later stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub emotional_state: String,
    pub cognitive_style: String,
    pub personality_traits: Vec<String>,
    pub reading_motivation: String,
    pub complexity_tolerance: Complexity,
    pub emotional_tolerance: EmotionalTone,
    /// How much survey signal backed this profile, in [0, 1].
    pub confidence: f32,
}

/// Why a book fits the reader psychologically. All four fields are
/// guaranteed non-empty after the evaluator has run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PsychologicalMatch {
    pub mood_alignment: String,
    pub cognitive_fit: String,
    pub therapeutic_value: String,
    pub personality_resonance: String,
}

impl PsychologicalMatch {
    pub fn is_complete(&self) -> bool {
        !self.mood_alignment.trim().is_empty()
            && !self.cognitive_fit.trim().is_empty()
            && !self.therapeutic_value.trim().is_empty()
            && !self.personality_resonance.trim().is_empty()
    }
}

/// A templated search link at one retailer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseLink {
    pub retailer: String,
    pub url: String,
}

/// A book proposed by the curator. Constructed fully normalized by the
/// response parser (every bound below holds from that point on) and only
/// ever enriched afterwards:
///
/// - `match_score` in [70, 98]
/// - `page_count` in [150, 800]
/// - `publication_year` in [1950, current year]
/// - `themes`, `matching_steps`, `psychological_match` and
///   `personalized_description` never empty after the evaluator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookCandidate {
    /// Set by the curator: normalized title+author plus a timestamp.
    pub id: String,
    pub title: String,
    pub author: String,
    pub genres: Vec<String>,
    pub description: String,
    pub personalized_description: String,
    pub match_reason: String,
    pub emotional_tone: EmotionalTone,
    pub complexity: Complexity,
    pub page_count: u16,
    pub publication_year: i32,
    pub themes: Vec<String>,
    pub match_score: u8,
    /// Ordered "why it matches" steps shown to the user.
    pub matching_steps: Vec<String>,
    pub psychological_match: PsychologicalMatch,
    pub cover_url: String,
    pub purchase_links: Vec<PurchaseLink>,
}

/// Display block the presenter derives from the page count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    pub length_category: String,
    pub reading_time: String,
}

/// Terminal entity returned to the client and persisted into a session.
/// Every display field is guaranteed present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalRecommendation {
    #[serde(flatten)]
    pub book: BookCandidate,
    pub details: BookDetails,
}
