//! Stage 2: noise removal via a configurable regex set.
//!
//! Defaults target boilerplate commonly seen in scanned/converted document
//! text (`原始来源`/`第 N 页` style page markers, URLs, emails, and long
//! punctuation runs); user-supplied patterns compose with, rather than
//! replace, the defaults.

use once_cell::sync::Lazy;
use regex::Regex;

static BARE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w.+-]+@[\w-]+\.[\w.-]+").unwrap());
static PAGE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"第\s*\d+\s*页").unwrap());
static REPEATED_PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^\w\s])\1{5,}").unwrap());

fn default_patterns() -> [&'static Regex; 4] {
    [&BARE_URL, &EMAIL, &PAGE_MARKER, &REPEATED_PUNCTUATION]
}

/// Returns the cleaned text and the total number of matches removed, across
/// the default set plus any `custom_patterns` (already-compiled).
pub fn remove_noise(text: &str, custom_patterns: &[Regex]) -> (String, usize) {
    let mut working = text.to_string();
    let mut removed = 0usize;

    for pattern in default_patterns() {
        removed += pattern.find_iter(&working).count();
        working = pattern.replace_all(&working, "").into_owned();
    }
    for pattern in custom_patterns {
        removed += pattern.find_iter(&working).count();
        working = pattern.replace_all(&working, "").into_owned();
    }

    (working, removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_urls_and_emails() {
        let (cleaned, count) = remove_noise("see https://example.com/x or mail me at a@b.com", &[]);
        assert!(!cleaned.contains("https://"));
        assert!(!cleaned.contains("@b.com"));
        assert_eq!(count, 2);
    }

    #[test]
    fn strips_page_markers_and_punctuation_runs() {
        let (cleaned, count) = remove_noise("intro 第 12 页 text!!!!!! more", &[]);
        assert!(!cleaned.contains("第"));
        assert!(!cleaned.contains("!!!!!!"));
        assert_eq!(count, 2);
    }

    #[test]
    fn custom_patterns_compose_with_defaults() {
        let custom = Regex::new(r"CONFIDENTIAL").unwrap();
        let (cleaned, count) = remove_noise("CONFIDENTIAL body https://x.com", &[custom]);
        assert!(!cleaned.contains("CONFIDENTIAL"));
        assert!(!cleaned.contains("https://"));
        assert_eq!(count, 2);
    }
}
