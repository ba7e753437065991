use fixture_scraper::SourceConfig;
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const SOURCE_500: &str = "500";
pub const SOURCE_QIUTAN: &str = "球探";

const DEFAULT_BIND: &str = "0.0.0.0:8787";
const DEFAULT_500_URL: &str = "https://trade.500.com/jczq/";
const DEFAULT_QIUTAN_URL: &str = "https://live.titan007.com/oldIndexall.aspx";

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub source_500_url: String,
    pub source_qiutan_url: String,
    /// Default trial count for `/prediction/detail`.
    pub sim_trials: usize,
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Every setting falls back to its default when missing; unparsable values warn first.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default_bind: SocketAddr = DEFAULT_BIND
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8787)));

        Self {
            bind: parse_or(&lookup, "MATCHCAST_BIND", default_bind),
            cache_ttl: Duration::from_secs(parse_or(&lookup, "MATCH_CACHE_TTL_SECS", 180)),
            fetch_timeout: Duration::from_millis(parse_or(&lookup, "FETCH_TIMEOUT_MS", 8000)),
            source_500_url: lookup("SOURCE_500_URL").unwrap_or_else(|| DEFAULT_500_URL.to_string()),
            source_qiutan_url: lookup("SOURCE_QIUTAN_URL")
                .unwrap_or_else(|| DEFAULT_QIUTAN_URL.to_string()),
            sim_trials: parse_or(&lookup, "SIM_TRIALS", prediction_engine::DEFAULT_TRIALS),
            log_dir: lookup("LOG_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("logs")),
        }
    }

    /// The two listing sources with their row delimiters.
    pub fn sources(&self) -> Vec<SourceConfig> {
        vec![
            SourceConfig::new(SOURCE_500, self.source_500_url.clone(), &["VS", "vs", "v"]),
            SourceConfig::new(SOURCE_QIUTAN, self.source_qiutan_url.clone(), &["-", "VS", "vs", "v"]),
        ]
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("invalid {key}={raw:?}, using {default}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.bind.port(), 8787);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(180));
        assert_eq!(cfg.fetch_timeout, Duration::from_millis(8000));
        assert_eq!(cfg.sim_trials, 5000);
        assert_eq!(cfg.log_dir, PathBuf::from("logs"));
        assert_eq!(cfg.source_500_url, DEFAULT_500_URL);
    }

    #[test]
    fn overrides_and_bad_values() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("MATCHCAST_BIND", "127.0.0.1:9000"),
            ("MATCH_CACHE_TTL_SECS", "60"),
            ("FETCH_TIMEOUT_MS", "soon"),
            ("SIM_TRIALS", " 1200 "),
            ("SOURCE_QIUTAN_URL", "http://127.0.0.1:1/"),
        ]));
        assert_eq!(cfg.bind, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.cache_ttl, Duration::from_secs(60));
        assert_eq!(cfg.fetch_timeout, Duration::from_millis(8000));
        assert_eq!(cfg.sim_trials, 1200);
        assert_eq!(cfg.source_qiutan_url, "http://127.0.0.1:1/");
    }

    #[test]
    fn sources_carry_their_delimiters() {
        let sources = AppConfig::default().sources();
        assert_eq!(sources[0].id, SOURCE_500);
        assert_eq!(sources[0].row_delimiters, vec!["VS", "vs", "v"]);
        assert_eq!(sources[1].id, SOURCE_QIUTAN);
        assert_eq!(sources[1].row_delimiters[0], "-");
    }
}
