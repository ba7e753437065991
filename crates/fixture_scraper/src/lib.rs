//! MatchCast Live: fixture scraper
//!
//! Turns noisy listing pages from the configured sources into canonical
//! fixtures:
//!   fetch (per source, bounded timeout) → normalize → extract team pairs
//!   → validate names → dedup + stable ids → TTL cache with fallback set.

pub mod cache;
pub mod dedup;
pub mod extract;
pub mod hash;
pub mod normalize;
pub mod source;
pub mod validate;

pub use cache::{CacheOrigin, CacheSnapshot, FixtureCache};
pub use dedup::{canonicalize, fallback_fixtures, CanonicalFixture};
pub use extract::{parse_source_page, CandidateFixture, FixtureExtractor, SourceParse};
pub use hash::stable_hash;
pub use normalize::{normalize_text, NormalizedPage};
pub use source::{FetchError, PageSource, SourceConfig, SourceFetcher};
pub use validate::{is_valid_candidate, looks_like_garbage_name};

/// League label used when no known league name appears near a fixture.
pub const UNKNOWN_LEAGUE: &str = "其他联赛";

/// Time label used when no `HH:MM` token appears near a fixture.
pub const UNKNOWN_TIME: &str = "--:--";
