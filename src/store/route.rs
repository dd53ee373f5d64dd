//! Route entity and pattern helpers.
//!
//! # Responsibilities
//! - Hold a compiled pattern, destination template and write time
//! - Expand back-references (`$1`, `$name`) against a lookup uri
//! - Extract the literal prefix used for prefix range scans
//!
//! # Design Decisions
//! - Patterns are compiled once, when the route is built or decoded
//! - Matching is an unanchored search; authors anchor with `^`/`$`
//! - Two routes are equal when pattern source, url and time match

use regex::Regex;
use serde::{Serialize, Serializer};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::store::error::{StoreError, StoreResult};

/// A mapping from a pattern to a destination url template.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    /// Pattern a lookup must match.
    #[serde(serialize_with = "serialize_pattern")]
    pub pattern: Regex,

    /// Destination template, may reference capture groups.
    pub url: String,

    /// Last write time in seconds since epoch, 0 when unset.
    pub time: u64,
}

fn serialize_pattern<S: Serializer>(pattern: &Regex, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(pattern.as_str())
}

impl Route {
    /// Compile `pattern` and build a route.
    pub fn new(pattern: &str, url: impl Into<String>, time: u64) -> StoreResult<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| StoreError::BadInput(format!("invalid pattern {:?}: {}", pattern, e)))?;
        Ok(Self {
            pattern,
            url: url.into(),
            time,
        })
    }

    /// Build a route stamped with the current time.
    pub fn now(pattern: &str, url: impl Into<String>) -> StoreResult<Self> {
        Self::new(pattern, url, now_secs())
    }

    /// The pattern's source string, which is also its storage identity.
    pub fn source(&self) -> &str {
        self.pattern.as_str()
    }

    /// Expand the url template for `uri`, or `None` if the pattern does not match.
    ///
    /// Capture groups that did not participate expand to the empty string.
    pub fn expand(&self, uri: &str) -> Option<String> {
        let caps = self.pattern.captures(uri)?;
        let mut dst = String::with_capacity(self.url.len());
        caps.expand(&self.url, &mut dst);
        Some(dst)
    }

    /// The literal prefix of the pattern, cut at the first `/` or `?`.
    ///
    /// This is the bucket a lookup uri falls into (see [`uri_prefix`]).
    pub fn prefix(&self) -> String {
        let mut p = self.literal_prefix();
        if let Some(ix) = p.find(|c| c == '/' || c == '?') {
            p.truncate(ix);
        }
        p
    }

    /// Longest literal string every match of the pattern must begin with.
    pub fn literal_prefix(&self) -> String {
        literal_prefix(self.pattern.as_str())
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.as_str() == other.pattern.as_str()
            && self.url == other.url
            && self.time == other.time
    }
}

impl Eq for Route {}

/// The portion of a lookup uri before the first `/` or `?`.
pub fn uri_prefix(uri: &str) -> &str {
    match uri.find(|c| c == '/' || c == '?') {
        Some(ix) => &uri[..ix],
        None => uri,
    }
}

/// Current wall clock time in seconds since epoch.
fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn literal_prefix(src: &str) -> String {
    if has_top_level_alternation(src) {
        return String::new();
    }

    let src = src.strip_prefix('^').unwrap_or(src);
    let mut out = String::new();
    let mut chars = src.chars().peekable();

    while let Some(c) = chars.next() {
        let lit = match c {
            '\\' => match chars.next() {
                Some(e) if e.is_ascii_punctuation() => e,
                // class escapes (\d, \w, ...) and a dangling backslash
                _ => break,
            },
            '.' | '[' | ']' | '(' | ')' | '|' | '*' | '+' | '?' | '{' | '}' | '^' | '$' => break,
            c => c,
        };

        match chars.peek() {
            // optional or repeated from zero
            Some('*') | Some('?') | Some('{') => break,
            Some('+') => {
                out.push(lit);
                break;
            }
            _ => out.push(lit),
        }
    }

    out
}

fn has_top_level_alternation(src: &str) -> bool {
    let mut depth = 0usize;
    let mut in_class = false;
    let mut chars = src.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => depth = depth.saturating_sub(1),
            '|' if !in_class && depth == 0 => return true,
            _ => {}
        }
    }

    false
}
