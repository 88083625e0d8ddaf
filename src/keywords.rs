//! # Keyword Highlighting
//!
//! Stateless text substitution over a finished transcript: each keyword is
//! matched case-insensitively on word boundaries and wrapped in `**...**`
//! markers so calling UIs can render emphasis.

use crate::error::{AppError, AppResult};
use regex::RegexBuilder;

/// Wrap every whole-word, case-insensitive occurrence of each keyword in
/// `**...**`, preserving the original casing of the matched text.
///
/// Empty or whitespace-only keywords are skipped rather than rejected.
pub fn highlight_keywords(transcript: &str, keywords: &[String]) -> AppResult<String> {
    let mut highlighted = transcript.to_string();

    for keyword in keywords {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            continue;
        }

        let pattern = format!(r"\b{}\b", regex::escape(keyword));
        let matcher = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| AppError::Input(format!("Invalid keyword {:?}: {}", keyword, e)))?;

        highlighted = matcher
            .replace_all(&highlighted, |caps: &regex::Captures| {
                format!("**{}**", &caps[0])
            })
            .into_owned();
    }

    Ok(highlighted)
}
