use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{NavigiumError, Result};

pub const DEFAULT_BASE_URL: &str = "https://www.navigium.de/latein-woerterbuch";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Settings for talking to the dictionary site.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Dictionary endpoint; the word is appended as a path segment.
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Upper bound on lookups in flight while analyzing a text.
    pub max_concurrency: usize,
    /// Numbered meanings kept per dictionary entry.
    pub max_translations: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            max_concurrency: 50,
            max_translations: 5,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed `base_url`; fails unless it can take a path segment.
    pub fn base(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| NavigiumError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        if url.cannot_be_a_base() {
            return Err(NavigiumError::InvalidUrl(self.base_url.clone()));
        }
        Ok(url)
    }

    /// Result page URL for `word`, optionally pinned to entry `nr`. The word
    /// is percent-encoded as a single path segment.
    pub fn url_for(&self, word: &str, nr: Option<u32>) -> Result<String> {
        let mut url = self.base()?;
        url.path_segments_mut()
            .map_err(|_| NavigiumError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(word);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("wb", "gross");
            if let Some(nr) = nr {
                query.append_pair("nr", &nr.to_string());
            }
        }
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for() {
        let config = ClientConfig::default();
        assert_eq!(
            config.url_for("amo", Some(2)).unwrap(),
            "https://www.navigium.de/latein-woerterbuch/amo?wb=gross&nr=2"
        );
        assert_eq!(
            config.url_for("amo", None).unwrap(),
            "https://www.navigium.de/latein-woerterbuch/amo?wb=gross"
        );
    }

    #[test]
    fn test_url_for_trailing_slash() {
        let config = ClientConfig {
            base_url: "http://localhost:9000/".into(),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.url_for("est", None).unwrap(),
            "http://localhost:9000/est?wb=gross"
        );
    }

    #[test]
    fn test_url_for_encodes_word_as_one_segment() {
        let config = ClientConfig {
            base_url: "http://localhost:9000".into(),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.url_for("amo?nr=9", Some(1)).unwrap(),
            "http://localhost:9000/amo%3Fnr=9?wb=gross&nr=1"
        );
        assert_eq!(
            config.url_for("a/b#c", None).unwrap(),
            "http://localhost:9000/a%2Fb%23c?wb=gross"
        );
    }

    #[test]
    fn test_url_for_rejects_bad_base() {
        for base_url in ["not a url", "mailto:someone@example.com"] {
            let config = ClientConfig {
                base_url: base_url.into(),
                ..ClientConfig::default()
            };
            assert!(matches!(
                config.url_for("amo", None),
                Err(NavigiumError::InvalidUrl(_))
            ));
        }
    }
}
