use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));
static TR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").expect("row regex"));

/// Strip tags, `&nbsp;` and runs of whitespace from raw page text.
pub fn normalize_text(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, " ");
    without_tags
        .replace("&nbsp;", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A page reduced to plain text, plus the row-like segments found in it.
#[derive(Debug, Clone, Default)]
pub struct NormalizedPage {
    /// Table rows (or plain-text lines when the page has no table), each normalized.
    pub rows: Vec<String>,
    /// The whole page as one normalized string.
    pub text: String,
}

impl NormalizedPage {
    pub fn parse(raw: &str) -> Self {
        let text = normalize_text(raw);

        let mut rows = table_rows(raw);
        if rows.is_empty() && !raw.contains('<') {
            rows = raw
                .lines()
                .map(normalize_text)
                .filter(|l| !l.is_empty())
                .collect();
        }

        Self { rows, text }
    }
}

fn table_rows(raw: &str) -> Vec<String> {
    let document = Html::parse_document(raw);
    let row_selector = Selector::parse("tr").expect("tr selector");

    let rows: Vec<String> = document
        .select(&row_selector)
        .map(|row| normalize_text(&row.text().collect::<Vec<_>>().join(" ")))
        .filter(|r| !r.is_empty())
        .collect();
    if !rows.is_empty() {
        return rows;
    }

    // html5ever drops <tr> outside of a <table>; listing pages are not always that tidy.
    TR_RE
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| normalize_text(m.as_str()))
        .filter(|r| !r.is_empty())
        .collect()
}
