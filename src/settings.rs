use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::stopwords;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const ENV_PREFIX: &str = "NEWS";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub news_sites: BTreeMap<String, SiteConfig>,
    #[serde(default)]
    pub transform: TransformSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub extract: ExtractSettings,
}

/// Extraction rules for one news site, keyed by site uid in `news_sites`.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub url: String,
    pub queries: SiteQueries,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteQueries {
    pub homepage_article_links: String,
    pub article_body: String,
    pub article_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformSettings {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
}

impl Default for TransformSettings {
    fn default() -> Self {
        TransformSettings {
            language: default_language(),
            extra_stopwords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractSettings {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        ExtractSettings {
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_language() -> String {
    "spanish".to_string()
}

fn default_db_path() -> String {
    "data/newspapers.sqlite".to_string()
}

fn default_concurrency() -> usize {
    8
}

fn default_max_retries() -> u32 {
    3
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) Chrome/51.0.2704.103 Safari/537.36".to_string()
}

impl Settings {
    /// Load settings from a YAML file, overridden by `NEWS__*` environment variables.
    pub fn load(path: &Path) -> Result<Settings> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read config {:?}", path))?;
        settings
            .try_deserialize()
            .with_context(|| format!("Invalid config {:?}", path))
    }

    pub fn site(&self, uid: &str) -> Result<&SiteConfig> {
        self.news_sites.get(uid).with_context(|| {
            let known: Vec<&str> = self.news_sites.keys().map(String::as_str).collect();
            format!("Unknown news site '{}' (configured: {})", uid, known.join(", "))
        })
    }

    pub fn transform_config(&self) -> Result<TransformConfig> {
        TransformConfig::new(&self.transform.language, &self.transform.extra_stopwords)
    }
}

/// Immutable inputs of one transform run besides the batch itself.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    pub language: String,
    pub stopwords: HashSet<String>,
}

impl TransformConfig {
    pub fn new(language: &str, extra_stopwords: &[String]) -> Result<TransformConfig> {
        let mut stopwords = stopwords::for_language(language)?;
        stopwords.extend(extra_stopwords.iter().map(|w| w.trim().to_lowercase()));
        Ok(TransformConfig {
            language: language.to_string(),
            stopwords,
        })
    }

    #[cfg(test)]
    pub fn with_stopwords<I, S>(language: &str, words: I) -> TransformConfig
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TransformConfig {
            language: language.to_string(),
            stopwords: words.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_repo_config() {
        let settings = Settings::load(Path::new("config.yaml")).unwrap();
        let site = settings.site("eluniversal").unwrap();
        assert!(site.url.starts_with("https://"));
        assert!(!site.queries.article_body.is_empty());
        assert_eq!(settings.transform.language, "spanish");
    }

    #[test]
    fn unknown_site_lists_known_ones() {
        let settings = Settings::load(Path::new("config.yaml")).unwrap();
        let err = settings.site("nope").unwrap_err().to_string();
        assert!(err.contains("nope"));
        assert!(err.contains("eluniversal"));
    }

    #[test]
    fn extra_stopwords_are_lowercased() {
        let cfg = TransformConfig::new("english", &["Reuters ".to_string()]).unwrap();
        assert!(cfg.stopwords.contains("reuters"));
        assert!(cfg.stopwords.contains("the"));
    }

    #[test]
    fn unknown_language_is_an_error() {
        assert!(TransformConfig::new("klingon", &[]).is_err());
    }
}
