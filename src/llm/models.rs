//! Static model metadata used to clamp token budgets.

/// Context window size for an unrecognized model. Deliberately conservative.
pub const DEFAULT_CONTEXT_LIMIT: u32 = 4096;

/// Known model context limits, in tokens. This is a lookup table, not a
/// capability probe; unknown models fall back to `DEFAULT_CONTEXT_LIMIT`.
const CONTEXT_LIMITS: &[(&str, u32)] = &[
    ("claude-3-5-haiku", 200_000),
    ("claude-sonnet-4", 200_000),
    ("claude-opus-4", 200_000),
    ("gpt-4o", 128_000),
    ("gpt-4o-mini", 128_000),
    ("gpt-4-turbo", 128_000),
    ("gpt-3.5-turbo", 16_385),
    ("mistral-large", 128_000),
    ("llama-3.1-70b", 128_000),
];

/// Look up the context limit for a model id. Matching is by prefix so dated
/// snapshots ("claude-sonnet-4-20250514") resolve to their family entry.
pub fn context_limit(model: &str) -> u32 {
    CONTEXT_LIMITS
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, limit)| *limit)
        .unwrap_or(DEFAULT_CONTEXT_LIMIT)
}

/// Clamp a requested token budget to 80% of the model's context limit,
/// leaving headroom for the prompt itself.
pub fn clamp_max_tokens(model: &str, requested: u32) -> u32 {
    let ceiling = context_limit(model) * 4 / 5;
    requested.min(ceiling)
}
