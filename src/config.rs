// src/config.rs
//! Configuration: keyword lists (TOML or JSON file with env override) and
//! runtime settings pulled from the environment.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::reconcile::TagRetention;

pub const ENV_KEYWORDS_PATH: &str = "KI_TRACKER_KEYWORDS_PATH";
pub const ENV_STATE_PATH: &str = "KI_TRACKER_STATE_PATH";
pub const ENV_DASHBOARD_PATH: &str = "KI_TRACKER_DASHBOARD_PATH";
pub const ENV_NTFY_TOPIC: &str = "KI_TRACKER_NTFY_TOPIC";
pub const ENV_TAG_RETENTION: &str = "KI_TRACKER_TAG_RETENTION";
pub const ENV_FETCH_RETRIES: &str = "KI_TRACKER_FETCH_RETRIES";
pub const ENV_INTERVAL_SECS: &str = "KI_TRACKER_INTERVAL_SECS";

pub const DEFAULT_KEYWORDS_PATH: &str = "config/keywords.toml";
pub const DEFAULT_STATE_PATH: &str = "data/seen_jobs.json";
pub const DEFAULT_DASHBOARD_PATH: &str = "docs/index.html";
pub const DEFAULT_NTFY_TOPIC: &str = "andrada-ki-jobs";

/// Two ordered, case-insensitive keyword tiers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordConfig {
    pub high: Vec<String>,
    pub medium: Vec<String>,
}

impl Default for KeywordConfig {
    /// Built-in research-focus keywords, used when no keyword file exists.
    fn default() -> Self {
        Self {
            high: [
                "organoid",
                "ipsc",
                "induced pluripotent",
                "stem cell",
                "neuroscience",
                "neurodevelopmental",
                "neural stem",
                "brain organoid",
                "single-cell",
                "scrna-seq",
                "spatial transcriptomics",
            ]
            .map(str::to_string)
            .to_vec(),
            medium: [
                "crispr",
                "genome editing",
                "developmental biology",
                "cell culture",
                "bioinformatics",
                "computational biology",
            ]
            .map(str::to_string)
            .to_vec(),
        }
    }
}

/// Load keywords from an explicit path. Supports TOML or JSON formats.
pub fn load_keywords_from(path: &Path) -> Result<KeywordConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading keywords from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_keywords(&content, ext.as_str())
}

/// Load keywords using env var + fallbacks:
/// 1) $KI_TRACKER_KEYWORDS_PATH
/// 2) config/keywords.toml
/// 3) config/keywords.json
/// 4) built-in defaults
pub fn load_keywords_default() -> Result<KeywordConfig> {
    if let Ok(p) = std::env::var(ENV_KEYWORDS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_keywords_from(&pb);
        } else {
            return Err(anyhow!("{ENV_KEYWORDS_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_KEYWORDS_PATH);
    if toml_p.exists() {
        return load_keywords_from(&toml_p);
    }
    let json_p = PathBuf::from("config/keywords.json");
    if json_p.exists() {
        return load_keywords_from(&json_p);
    }
    Ok(KeywordConfig::default())
}

fn parse_keywords(s: &str, hint_ext: &str) -> Result<KeywordConfig> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("high");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported keywords format"))
}

fn parse_toml(s: &str) -> Result<KeywordConfig> {
    let v: KeywordConfig = toml::from_str(s)?;
    Ok(clean(v))
}

fn parse_json(s: &str) -> Result<KeywordConfig> {
    let v: KeywordConfig = serde_json::from_str(s)?;
    Ok(clean(v))
}

/// Trim entries, drop empties, dedup while preserving configured order
/// (tier order is meaningful for display).
fn clean(cfg: KeywordConfig) -> KeywordConfig {
    KeywordConfig {
        high: clean_list(cfg.high),
        medium: clean_list(cfg.medium),
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|x| x == t) {
            out.push(t.to_string());
        }
    }
    out
}

/// Runtime settings for one tracker process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub state_path: PathBuf,
    pub dashboard_path: PathBuf,
    pub ntfy_topic: String,
    pub keywords: KeywordConfig,
    pub tag_retention: TagRetention,
    pub fetch_retries: u8,
    /// When set, the binary loops on this interval instead of running once.
    pub interval_secs: Option<u64>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let state_path = env_or(ENV_STATE_PATH, DEFAULT_STATE_PATH).into();
        let dashboard_path = env_or(ENV_DASHBOARD_PATH, DEFAULT_DASHBOARD_PATH).into();
        let ntfy_topic = env_or(ENV_NTFY_TOPIC, DEFAULT_NTFY_TOPIC);

        let tag_retention = match std::env::var(ENV_TAG_RETENTION) {
            Ok(v) => v
                .parse()
                .map_err(|e: String| anyhow!(e))
                .with_context(|| format!("parsing {ENV_TAG_RETENTION}"))?,
            Err(_) => TagRetention::WhileOpen,
        };

        let fetch_retries = std::env::var(ENV_FETCH_RETRIES)
            .ok()
            .and_then(|v| v.parse::<u8>().ok())
            .unwrap_or(3);

        let interval_secs = std::env::var(ENV_INTERVAL_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0);

        Ok(Self {
            state_path,
            dashboard_path,
            ntfy_topic,
            keywords: load_keywords_default()?,
            tag_retention,
            fetch_retries,
            interval_secs,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_dedup_and_formats_work() {
        let toml = r#"
high = [" organoid ", "", "ipsc", "ipsc"]
medium = ["crispr"]
"#;
        let json = r#"{"high": ["stem cell"], "medium": ["  bioinformatics  ", ""]}"#;
        let t = parse_toml(toml).unwrap();
        assert_eq!(t.high, vec!["organoid".to_string(), "ipsc".to_string()]);
        assert_eq!(t.medium, vec!["crispr".to_string()]);
        let j = parse_json(json).unwrap();
        assert_eq!(j.high, vec!["stem cell".to_string()]);
        assert_eq!(j.medium, vec!["bioinformatics".to_string()]);
    }

    #[test]
    fn clean_preserves_configured_order() {
        let v = clean_list(vec![
            "neuroscience".into(),
            "organoid".into(),
            "neuroscience".into(),
            "ipsc".into(),
        ]);
        assert_eq!(
            v,
            vec![
                "neuroscience".to_string(),
                "organoid".to_string(),
                "ipsc".to_string()
            ]
        );
    }
}
