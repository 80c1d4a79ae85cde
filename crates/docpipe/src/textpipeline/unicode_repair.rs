//! Stage 1: unicode repair and whitespace normalisation.
//!
//! Pattern set follows the `Lazy<Regex>` idiom used elsewhere in this crate
//! (module-level compiled-once patterns rather than per-call `Regex::new`).

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static ODD_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{200B}\u{200C}\u{200D}\u{FEFF}\u{00A0}\u{3000}]").unwrap());
static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

pub fn repair(text: &str) -> String {
    let normalized_newlines = if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    };

    let whitespace_fixed = ODD_WHITESPACE.replace_all(&normalized_newlines, " ");
    let collapsed = EXCESS_NEWLINES.replace_all(&whitespace_fixed, "\n\n\n");
    collapsed.into_owned()
}
