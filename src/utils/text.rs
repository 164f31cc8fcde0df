//! Text helpers for titles, labels and identifiers.

use chrono::Utc;
use uuid::Uuid;

/// Returns at most `max_chars` characters of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Capitalizes every word, treating `-` and `_` as spaces.
///
/// `"my-cool_app"` becomes `"My Cool App"`.
pub fn title_case(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Builds a session label from free text: spaces become `_`, capped at `max_chars`.
pub fn slug_label(s: &str, max_chars: usize) -> String {
    truncate_chars(&s.trim().replace(' ', "_"), max_chars)
}

/// Builds a time-stamped identifier: `{prefix}_{YYYYmmdd_HHMMSS}_{8 hex}`.
///
/// The random suffix keeps ids minted within the same second distinct, so
/// documents keyed by them never overwrite each other.
pub fn timestamp_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        prefix,
        Utc::now().format("%Y%m%d_%H%M%S"),
        &suffix[..8]
    )
}
