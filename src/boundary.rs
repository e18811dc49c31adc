//! Boundary location: the span of text between two pattern matches.
//!
//! Both patterns are regular expressions matched case-insensitively. Callers
//! that need literal matching escape their input with [`literal`] first.

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};

/// Where a located span stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndBoundary<'a> {
    /// Stop right before the first match of this pattern after the start match
    Pattern(&'a str),
    /// Run to the end of the text
    EndOfText,
}

impl<'a> EndBoundary<'a> {
    /// `Pattern` when a pattern is given, `EndOfText` otherwise.
    pub fn from_option(pattern: Option<&'a str>) -> Self {
        pattern.map_or(EndBoundary::EndOfText, EndBoundary::Pattern)
    }
}

/// Escape a heading so it matches itself literally.
pub fn literal(name: &str) -> String {
    regex::escape(name)
}

/// Compile a boundary pattern case-insensitively.
pub fn compile(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Return the trimmed text between the end of the first `start` match and
/// the start of the first `end` match that follows it.
///
/// No `start` match yields an empty string. No `end` match after the start
/// match extends the span to the end of `text`. Only an invalid pattern is an
/// error.
pub fn locate(text: &str, start: &str, end: EndBoundary<'_>) -> Result<String> {
    let start_re = compile(start)?;
    let end_re = match end {
        EndBoundary::Pattern(pattern) => Some(compile(pattern)?),
        EndBoundary::EndOfText => None,
    };
    Ok(locate_compiled(text, &start_re, end_re.as_ref()).to_string())
}

/// [`locate`] with patterns that are already compiled.
pub fn locate_compiled<'t>(text: &'t str, start: &Regex, end: Option<&Regex>) -> &'t str {
    let Some(start_match) = start.find(text) else {
        return "";
    };
    let rest = &text[start_match.end()..];
    let span = match end.and_then(|re| re.find(rest)) {
        Some(end_match) => &rest[..end_match.start()],
        None => rest,
    };
    span.trim()
}
