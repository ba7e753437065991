use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::CandidateFixture;

const MIN_NAME_CHARS: usize = 2;
const MAX_NAME_CHARS: usize = 30;

/// Substrings that only show up when the extractor has bitten into script or links.
const BLOCKED_TOKENS: &[&str] = &[
    "script", "javascript", "function", "var", "const", "let", "http", "www", "undefined", "null",
];

static BARE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}(-[0-9]{2})?$").expect("date regex"));
static NUMERIC_SEGMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,4}([:\-][0-9]{1,4}){1,3}$").expect("segments regex"));
static ALL_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("digits regex"));
static ALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\-.()\x{4E00}-\x{9FA5}A-Za-z]").expect("allowed regex"));

/// True when `name` cannot be a team name.
pub fn looks_like_garbage_name(name: &str) -> bool {
    let v = name.trim();
    if v.is_empty() {
        return true;
    }

    let len = v.chars().count();
    if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&len) {
        return true;
    }

    let lower = v.to_lowercase();
    if BLOCKED_TOKENS.iter().any(|t| lower.contains(t)) {
        return true;
    }

    if BARE_DATE.is_match(v) || NUMERIC_SEGMENTS.is_match(v) || ALL_DIGITS.is_match(v) {
        return true;
    }

    // Digits are not an allowed class: "Team 2" style names are noise from odds tables.
    !ALLOWED_CHARS.replace_all(v, "").is_empty()
}

pub fn is_valid_candidate(candidate: &CandidateFixture) -> bool {
    let home = candidate.home.trim();
    let away = candidate.away.trim();
    if home.is_empty() || away.is_empty() || home == away {
        return false;
    }
    !looks_like_garbage_name(home) && !looks_like_garbage_name(away)
}
