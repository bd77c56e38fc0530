//! Language preference detection and localized string tables.
//!
//! The survey has no explicit language field; instead the free-text answers
//! are scanned for German function words and umlauts. Every user-facing
//! string the service generates locally (defaults, fallback texts, display
//! labels, prompt language directives) lives in the per-locale tables below
//! so no generator carries inline literals.

use crate::pipeline::types::SurveyInput;

/// Output language for generated text and prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    En,
    De,
}

impl Locale {
    pub fn strings(self) -> &'static LocaleStrings {
        match self {
            Locale::En => &EN,
            Locale::De => &DE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::De => "de",
        }
    }
}

/// German function words that rarely appear in English survey answers.
const GERMAN_STOPWORDS: &[&str] = &[
    "und", "der", "die", "das", "ich", "ist", "nicht", "ein", "eine", "mit",
    "für", "auch", "aber", "wie", "über", "mehr", "etwas", "mich", "gerne",
    "lesen", "buch", "bücher", "weil", "wenn", "oder",
];

/// Decide the output language from the survey's free-text fields.
/// Any umlaut/eszett is treated as a definitive signal; otherwise two or
/// more German function-word hits across all scanned fields select German.
pub fn detect_locale(survey: &SurveyInput) -> Locale {
    let mut text = String::new();
    text.push_str(&survey.mood);
    text.push(' ');
    text.push_str(&survey.goal);
    if let Some(connection) = &survey.film_connection {
        text.push(' ');
        text.push_str(connection);
    }
    for favorite in &survey.favorite_books {
        text.push(' ');
        text.push_str(&favorite.reason);
    }

    let lower = text.to_lowercase();
    if lower.chars().any(|c| matches!(c, 'ä' | 'ö' | 'ü' | 'ß')) {
        return Locale::De;
    }

    let hits = lower
        .split(|c: char| !c.is_alphabetic())
        .filter(|word| !word.is_empty())
        .filter(|word| GERMAN_STOPWORDS.contains(word))
        .count();

    if hits >= 2 {
        Locale::De
    } else {
        Locale::En
    }
}

/// Every locally generated user-facing string, per locale.
/// Templates use `{}` as the single interpolation marker; callers substitute
/// with `str::replace`.
pub struct LocaleStrings {
    /// Appended to every prompt so the model answers in the user's language.
    pub language_directive: &'static str,

    // Parser defaults for fields the model left out.
    pub default_themes: &'static [&'static str],
    pub default_personalized_description: &'static str,
    pub default_match_reason: &'static str,

    // Matching-step templates, assembled by the evaluator.
    pub step_mood: &'static str,
    pub step_goal: &'static str,
    pub step_genre: &'static str,
    pub step_pace: &'static str,
    pub step_film: &'static str,
    pub step_favorites: &'static str,
    pub step_generic: &'static [&'static str],

    // Rule-based fallback profile pieces, keyed by survey mode.
    pub profile_default_state: &'static str,
    pub profile_default_motivation: &'static str,
    pub profile_style_quick: &'static str,
    pub profile_style_deep: &'static str,
    pub profile_style_cinema: &'static str,
    pub profile_style_books: &'static str,
    pub profile_traits_quick: &'static [&'static str],
    pub profile_traits_deep: &'static [&'static str],
    pub profile_traits_cinema: &'static [&'static str],
    pub profile_traits_books: &'static [&'static str],

    // Psychological-match templates, assembled from profile fields.
    pub psych_mood: &'static str,
    pub psych_cognitive: &'static str,
    pub psych_therapeutic: &'static str,
    pub psych_personality: &'static str,

    // Book-details display block.
    pub length_short: &'static str,
    pub length_medium: &'static str,
    pub length_long: &'static str,
    pub time_short: &'static str,
    pub time_medium: &'static str,
    pub time_long: &'static str,

    // The single static fallback book used when generation is unparsable.
    pub fallback_title: &'static str,
    pub fallback_author: &'static str,
    pub fallback_description: &'static str,
    pub fallback_personalized: &'static str,
    pub fallback_reason: &'static str,
    pub fallback_themes: &'static [&'static str],
}

pub static EN: LocaleStrings = LocaleStrings {
    language_directive: "Write every user-facing text field in English.",

    default_themes: &["self-discovery", "relationships", "hope"],
    default_personalized_description:
        "A thoughtful pick that fits the reading preferences you described.",
    default_match_reason: "Matches the preferences from your survey.",

    step_mood: "Meets your current mood of \"{}\".",
    step_goal: "Supports your reading goal: {}.",
    step_genre: "Sits in your chosen genres: {}.",
    step_pace: "Its pacing fits your preference for {} reading.",
    step_film: "Echoes the atmosphere of films you named: {}.",
    step_favorites: "Shares qualities with books you loved, such as {}.",
    step_generic: &[
        "Widely praised for its accessible, engaging storytelling.",
        "A length and depth that fit comfortably into everyday reading.",
        "Leaves room for reflection without overwhelming the reader.",
    ],

    profile_default_state: "balanced and open to something new",
    profile_default_motivation: "reading for enjoyment and perspective",
    profile_style_quick: "pragmatic, decides quickly",
    profile_style_deep: "reflective and analytical",
    profile_style_cinema: "visual, drawn to atmosphere and imagery",
    profile_style_books: "associative, connects new reads to loved ones",
    profile_traits_quick: &["curious", "decisive"],
    profile_traits_deep: &["introspective", "thorough", "patient"],
    profile_traits_cinema: &["imaginative", "mood-driven"],
    profile_traits_books: &["loyal to favorites", "detail-oriented"],

    psych_mood: "Chosen to meet you in your current emotional state: {}.",
    psych_cognitive: "The narrative structure suits a {} way of thinking.",
    psych_therapeutic: "Offers gentle perspective for a reader motivated by {}.",
    psych_personality: "Resonates with readers who describe themselves as {}.",

    length_short: "short",
    length_medium: "medium",
    length_long: "long",
    time_short: "approx. 2-4 hours",
    time_medium: "approx. 4-6 hours",
    time_long: "approx. 8-12 hours",

    fallback_title: "The Midnight Library",
    fallback_author: "Matt Haig",
    fallback_description:
        "Between life and death there is a library where every book is a \
         different life you could have lived. Nora Seed gets the chance to \
         try them all and to ask what makes a life truly fulfilling.",
    fallback_personalized:
        "A warm, widely loved novel that works for almost every reader and \
         mood - our safe recommendation while your personalized list was \
         unavailable.",
    fallback_reason: "A dependable favorite chosen when personalized generation failed.",
    fallback_themes: &["second chances", "regret", "hope"],
};

pub static DE: LocaleStrings = LocaleStrings {
    language_directive: "Schreibe alle nutzerseitigen Textfelder auf Deutsch.",

    default_themes: &["Selbstfindung", "Beziehungen", "Hoffnung"],
    default_personalized_description:
        "Eine durchdachte Wahl, die zu deinen beschriebenen Lesevorlieben passt.",
    default_match_reason: "Passt zu den Angaben aus deinem Fragebogen.",

    step_mood: "Trifft deine aktuelle Stimmung: \"{}\".",
    step_goal: "Unterstützt dein Leseziel: {}.",
    step_genre: "Liegt in deinen gewählten Genres: {}.",
    step_pace: "Das Erzähltempo passt zu deiner Vorliebe für {} Lektüre.",
    step_film: "Greift die Atmosphäre deiner genannten Filme auf: {}.",
    step_favorites: "Teilt Qualitäten mit Büchern, die du geliebt hast, etwa {}.",
    step_generic: &[
        "Vielfach gelobt für zugängliches, mitreißendes Erzählen.",
        "Länge und Tiefe passen gut in den Lesealltag.",
        "Lässt Raum zum Nachdenken, ohne zu überfordern.",
    ],

    profile_default_state: "ausgeglichen und offen für Neues",
    profile_default_motivation: "Lesen aus Freude und für neue Perspektiven",
    profile_style_quick: "pragmatisch, entscheidet schnell",
    profile_style_deep: "reflektiert und analytisch",
    profile_style_cinema: "visuell, von Atmosphäre und Bildern angezogen",
    profile_style_books: "assoziativ, verknüpft Neues mit geliebten Büchern",
    profile_traits_quick: &["neugierig", "entschlussfreudig"],
    profile_traits_deep: &["introspektiv", "gründlich", "geduldig"],
    profile_traits_cinema: &["fantasievoll", "stimmungsgeleitet"],
    profile_traits_books: &["treu gegenüber Favoriten", "detailverliebt"],

    psych_mood: "Ausgewählt für deine aktuelle emotionale Lage: {}.",
    psych_cognitive: "Die Erzählstruktur passt zu einer {} Denkweise.",
    psych_therapeutic: "Bietet sanfte Perspektiven für ein Leseziel wie {}.",
    psych_personality: "Spricht Leserinnen und Leser an, die sich als {} beschreiben.",

    length_short: "kurz",
    length_medium: "mittel",
    length_long: "lang",
    time_short: "ca. 2-4 Stunden",
    time_medium: "ca. 4-6 Stunden",
    time_long: "ca. 8-12 Stunden",

    fallback_title: "Die Mitternachtsbibliothek",
    fallback_author: "Matt Haig",
    fallback_description:
        "Zwischen Leben und Tod liegt eine Bibliothek, in der jedes Buch ein \
         anderes mögliches Leben erzählt. Nora Seed darf sie alle ausprobieren \
         und fragt sich, was ein erfülltes Leben ausmacht.",
    fallback_personalized:
        "Ein warmherziger, vielgeliebter Roman, der zu fast jeder Stimmung \
         passt - unsere verlässliche Empfehlung, solange deine persönliche \
         Liste nicht erstellt werden konnte.",
    fallback_reason:
        "Ein verlässlicher Favorit, gewählt weil die persönliche Generierung fehlschlug.",
    fallback_themes: &["zweite Chancen", "Reue", "Hoffnung"],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{FavoriteBook, SurveyMode};

    fn survey_with_mood(mood: &str) -> SurveyInput {
        SurveyInput {
            mode: SurveyMode::Quick,
            genres: vec![],
            mood: mood.to_string(),
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
    fn test_english_survey_detected_as_english() {
        let survey = survey_with_mood("curious and a little restless");
        assert_eq!(detect_locale(&survey), Locale::En);
    }

    #[test]
    fn test_german_stopwords_detected() {
        let survey = survey_with_mood("ich bin neugierig und etwas unruhig");
        assert_eq!(detect_locale(&survey), Locale::De);
    }

    #[test]
    fn test_single_stopword_is_not_enough() {
        // "der" alone can appear in English names/titles.
        let survey = survey_with_mood("der zug");
        assert_eq!(detect_locale(&survey), Locale::En);
    }

    #[test]
    fn test_umlaut_is_a_definitive_signal() {
        let survey = survey_with_mood("müde");
        assert_eq!(detect_locale(&survey), Locale::De);
    }

    #[test]
    fn test_favorite_reasons_are_scanned() {
        let mut survey = survey_with_mood("");
        survey.favorite_books = vec![FavoriteBook {
            title: "Der Prozess".to_string(),
            reason: "weil die Sprache so klar ist".to_string(),
        }];
        assert_eq!(detect_locale(&survey), Locale::De);
    }

    #[test]
    fn test_empty_survey_defaults_to_english() {
        let survey = survey_with_mood("");
        assert_eq!(detect_locale(&survey), Locale::En);
    }

    #[test]
    fn test_locale_tables_are_wired() {
        assert!(Locale::En.strings().language_directive.contains("English"));
        assert!(Locale::De.strings().language_directive.contains("Deutsch"));
        assert_eq!(Locale::En.strings().default_themes.len(), 3);
        assert_eq!(Locale::De.strings().step_generic.len(), 3);
    }
}
