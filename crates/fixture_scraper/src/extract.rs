//! Team-pair extraction from normalized listing text.
//!
//! Row-scoped matching runs first with the source's own delimiter set. Only
//! when no row yields a pair does the whole-text scan run, with two fixed
//! patterns of decreasing strictness and a hard cap on candidates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::normalize::NormalizedPage;
use crate::source::SourceConfig;
use crate::validate::is_valid_candidate;

/// Characters a team name may be built from inside a pair pattern.
const NAME_CLASS: &str = r"[\x{4E00}-\x{9FA5}A-Za-z0-9.\-()]";

const KNOWN_LEAGUES: &[&str] = &[
    "英超", "西甲", "德甲", "意甲", "法甲", "中超", "欧冠", "欧联", "荷甲", "葡超", "日职", "韩职",
    "澳超", "巴甲", "阿甲", "墨超", "苏超", "挪超", "瑞超", "英冠", "西乙", "德乙", "意乙", "法乙",
];

pub const MAX_WHOLE_TEXT_CANDIDATES: usize = 300;
const NEAR_WINDOW_CHARS: usize = 40;
const WIDE_WINDOW_CHARS: usize = 120;

static LEAGUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("({})", KNOWN_LEAGUES.join("|"))).expect("league regex"));
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{2}:[0-9]{2})").expect("time regex"));
static WHOLE_TEXT_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    let name = format!("({NAME_CLASS}{{2,30}})");
    [
        Regex::new(&format!(r"{name}\s*(?:VS|vs|v|对阵)\s*{name}")).expect("vs regex"),
        Regex::new(&format!(r"{name}\s*-\s*{name}")).expect("hyphen regex"),
    ]
});

/// A team pair as found in the text, before validation and dedup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateFixture {
    pub league: Option<String>,
    pub kickoff_time: Option<String>,
    pub home: String,
    pub away: String,
    pub source: String,
}

/// Per-source extractor; the row pattern is built from the source's delimiters.
#[derive(Debug, Clone)]
pub struct FixtureExtractor {
    source: String,
    row_pattern: Regex,
}

impl FixtureExtractor {
    pub fn new(source: &SourceConfig) -> Result<Self, regex::Error> {
        let delimiters = source
            .row_delimiters
            .iter()
            .filter(|d| !d.is_empty())
            .map(|d| regex::escape(d))
            .collect::<Vec<_>>()
            .join("|");
        let name = format!("({NAME_CLASS}+)");
        let row_pattern = Regex::new(&format!(r"{name}\s*(?:{delimiters})\s*{name}"))?;

        Ok(Self {
            source: source.id.clone(),
            row_pattern,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Lazily yields raw candidates: row-scoped when any row matches, whole-text otherwise.
    pub fn extract<'a>(
        &'a self,
        page: &'a NormalizedPage,
    ) -> Box<dyn Iterator<Item = CandidateFixture> + 'a> {
        let mut by_row = self.row_candidates(&page.rows).peekable();
        if by_row.peek().is_some() {
            Box::new(by_row)
        } else {
            Box::new(self.whole_text_candidates(&page.text))
        }
    }

    fn row_candidates<'a>(
        &'a self,
        rows: &'a [String],
    ) -> impl Iterator<Item = CandidateFixture> + 'a {
        rows.iter().filter_map(move |row| {
            let pair = self.row_pattern.captures(row)?;
            Some(CandidateFixture {
                league: find_league(row),
                kickoff_time: find_time(row),
                home: capture_trimmed(&pair, 1),
                away: capture_trimmed(&pair, 2),
                source: self.source.clone(),
            })
        })
    }

    fn whole_text_candidates<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = CandidateFixture> + 'a {
        WHOLE_TEXT_PATTERNS
            .iter()
            .flat_map(move |re| re.captures_iter(text))
            .filter_map(move |pair| {
                let whole = pair.get(0)?;
                let near = char_window(text, whole.start(), whole.end(), NEAR_WINDOW_CHARS);
                let league = find_league(near).or_else(|| {
                    find_league(char_window(text, whole.start(), whole.start(), WIDE_WINDOW_CHARS))
                });
                Some(CandidateFixture {
                    league,
                    kickoff_time: find_time(near),
                    home: capture_trimmed(&pair, 1),
                    away: capture_trimmed(&pair, 2),
                    source: self.source.clone(),
                })
            })
            .take(MAX_WHOLE_TEXT_CANDIDATES)
    }
}

/// What one source page produced, for status messages and the probe binary.
#[derive(Debug, Clone, Default)]
pub struct SourceParse {
    pub raw_count: usize,
    pub rejected: usize,
    pub candidates: Vec<CandidateFixture>,
}

/// Normalize, extract and validate one fetched page.
pub fn parse_source_page(extractor: &FixtureExtractor, raw_page: &str) -> SourceParse {
    let page = NormalizedPage::parse(raw_page);
    let mut parsed = SourceParse::default();
    for candidate in extractor.extract(&page) {
        parsed.raw_count += 1;
        if is_valid_candidate(&candidate) {
            parsed.candidates.push(candidate);
        } else {
            parsed.rejected += 1;
        }
    }
    parsed
}

fn capture_trimmed(caps: &regex::Captures<'_>, idx: usize) -> String {
    caps.get(idx)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn find_league(text: &str) -> Option<String> {
    LEAGUE_RE.captures(text).map(|c| c[1].to_string())
}

fn find_time(text: &str) -> Option<String> {
    TIME_RE.captures(text).map(|c| c[1].to_string())
}

/// Slice of `text` reaching `radius` characters before `start` and after `end`.
fn char_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    &text[from..to]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str, delimiters: &[&str]) -> SourceConfig {
        SourceConfig {
            id: id.to_string(),
            url: "http://127.0.0.1/".to_string(),
            row_delimiters: delimiters.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn page(rows: &[&str], text: &str) -> NormalizedPage {
        NormalizedPage {
            rows: rows.iter().map(|r| r.to_string()).collect(),
            text: text.to_string(),
        }
    }

    #[test]
    fn row_scoped_pairs_pick_up_league_and_time() {
        let ex = FixtureExtractor::new(&source("500", &["VS", "vs", "v"])).unwrap();
        let p = page(&["周六001 英超 20:00 阿森纳 VS 切尔西", "no pair here", "西甲 皇马 vs 马竞"], "");
        let got: Vec<_> = ex.extract(&p).collect();

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].home, "阿森纳");
        assert_eq!(got[0].away, "切尔西");
        assert_eq!(got[0].league.as_deref(), Some("英超"));
        assert_eq!(got[0].kickoff_time.as_deref(), Some("20:00"));
        assert_eq!(got[0].source, "500");
        assert_eq!(got[1].league.as_deref(), Some("西甲"));
        assert_eq!(got[1].kickoff_time, None);
    }

    #[test]
    fn delimiters_are_per_source_configuration() {
        let row = ["德甲 21:30 拜仁 - 多特"];
        let strict = FixtureExtractor::new(&source("500", &["VS", "vs", "v"])).unwrap();
        let loose = FixtureExtractor::new(&source("球探", &["-", "VS", "vs", "v"])).unwrap();

        assert!(strict.row_candidates(&page(&row, "").rows).next().is_none());
        let got: Vec<_> = loose.extract(&page(&row, "")).collect();
        assert_eq!(got.len(), 1);
        assert_eq!((got[0].home.as_str(), got[0].away.as_str()), ("拜仁", "多特"));
    }

    #[test]
    fn whole_text_runs_only_when_rows_yield_nothing() {
        let ex = FixtureExtractor::new(&source("500", &["VS"])).unwrap();

        let with_rows = page(&["英超 阿森纳 VS 切尔西"], "意甲 米兰 对阵 国米");
        let got: Vec<_> = ex.extract(&with_rows).collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].home, "阿森纳");

        let without_rows = page(&["nothing"], "意甲 19:45 米兰 对阵 国米");
        let got: Vec<_> = ex.extract(&without_rows).collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].home, "米兰");
        assert_eq!(got[0].away, "国米");
        assert_eq!(got[0].league.as_deref(), Some("意甲"));
        assert_eq!(got[0].kickoff_time.as_deref(), Some("19:45"));
    }

    #[test]
    fn whole_text_league_falls_back_to_wide_window() {
        let ex = FixtureExtractor::new(&source("500", &["VS"])).unwrap();
        let filler = "。".repeat(60);
        let text = format!("法甲{filler}巴黎 对阵 里昂");
        let got: Vec<_> = ex.extract(&page(&[], &text)).collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].league.as_deref(), Some("法甲"));

        let far = format!("法甲{}巴黎 对阵 里昂", "。".repeat(200));
        let got: Vec<_> = ex.extract(&page(&[], &far)).collect();
        assert_eq!(got[0].league, None);
    }

    #[test]
    fn whole_text_falls_back_to_hyphen_pairs() {
        let ex = FixtureExtractor::new(&source("500", &["VS", "vs", "v"])).unwrap();

        let got: Vec<_> = ex.extract(&page(&[], "德甲 21:30 拜仁 - 多特")).collect();
        assert_eq!(got.len(), 1);
        assert_eq!((got[0].home.as_str(), got[0].away.as_str()), ("拜仁", "多特"));
        assert_eq!(got[0].league.as_deref(), Some("德甲"));
        assert_eq!(got[0].kickoff_time.as_deref(), Some("21:30"));

        let html = "<div>德甲 21:30 拜仁 - 多特</div><p>2026-03-01 英超 利物浦-曼城</p>";
        let parsed = parse_source_page(&ex, html);
        assert_eq!(parsed.raw_count, 3);
        assert_eq!(parsed.rejected, 1);
        let pairs: Vec<_> = parsed
            .candidates
            .iter()
            .map(|c| (c.home.as_str(), c.away.as_str()))
            .collect();
        assert_eq!(pairs, vec![("拜仁", "多特"), ("利物浦", "曼城")]);
        assert_eq!(parsed.candidates[0].league.as_deref(), Some("德甲"));
        assert_eq!(parsed.candidates[0].kickoff_time.as_deref(), Some("21:30"));
    }

    #[test]
    fn whole_text_prefers_vs_pairs_over_hyphen_pairs() {
        let ex = FixtureExtractor::new(&source("500", &["VS"])).unwrap();
        let got: Vec<_> = ex
            .extract(&page(&[], "英超 阿森纳 VS 切尔西 。德甲 拜仁 - 多特"))
            .map(|c| c.home)
            .collect();
        assert_eq!(got, vec!["阿森纳", "拜仁"]);
    }

    #[test]
    fn names_stop_at_ideographs_outside_the_basic_block() {
        let ex = FixtureExtractor::new(&source("500", &["VS"])).unwrap();
        let got: Vec<_> = ex.extract(&page(&["英超 㐀阿森纳 VS 切尔西"], "")).collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].home, "阿森纳");
    }

    #[test]
    fn whole_text_is_capped() {
        let ex = FixtureExtractor::new(&source("500", &["VS"])).unwrap();
        let text = (0..400).map(|_| "甲队 vs 乙队").collect::<Vec<_>>().join("。");
        assert_eq!(ex.extract(&page(&[], &text)).count(), MAX_WHOLE_TEXT_CANDIDATES);
    }

    #[test]
    fn parse_source_page_counts_rejects() {
        let ex = FixtureExtractor::new(&source("500", &["VS", "vs", "v"])).unwrap();
        let html = "<table>\
            <tr><td>英超</td><td>20:00</td><td>阿森纳</td><td>VS</td><td>切尔西</td></tr>\
            <tr><td>12:30</td><td>VS</td><td>20:45</td></tr>\
            </table>";
        let parsed = parse_source_page(&ex, html);
        assert_eq!(parsed.raw_count, 2);
        assert_eq!(parsed.rejected, 1);
        assert_eq!(parsed.candidates[0].away, "切尔西");
    }

    #[test]
    fn char_window_respects_boundaries() {
        let text = "一二三四五六七八九十";
        // byte offsets of "五六" (each char is 3 bytes)
        assert_eq!(char_window(text, 12, 18, 2), "三四五六七八");
        assert_eq!(char_window(text, 0, 3, 5), "一二三四五六");
        assert_eq!(char_window(text, 27, 30, 50), text);
    }
}
