use std::collections::HashMap;

use futures_util::stream::{self, StreamExt};
use lectio_core::{AnalysisContext, Meaning, WordAnalysis, lookup_words, preprocess_text, tokenize};

use crate::cache::MemoryCache;
use crate::config::ClientConfig;
use crate::error::{NavigiumError, Result};
use crate::parse::{parse_forms, parse_lookup};

/// Dictionary client with a per-process cache of every page it has parsed.
pub struct NavigiumClient {
    http: reqwest::Client,
    config: ClientConfig,
    entries: MemoryCache<Meaning>,
    forms: MemoryCache<Vec<Meaning>>,
}

impl NavigiumClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.base()?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .pool_max_idle_per_host(config.max_concurrency.max(1))
            .build()?;
        Ok(Self {
            http,
            config,
            entries: MemoryCache::new(),
            forms: MemoryCache::new(),
        })
    }

    /// Number of cached pages (single entries plus form lists).
    pub async fn cached_pages(&self) -> usize {
        self.entries.len().await + self.forms.len().await
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NavigiumError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// Look up dictionary entry `nr` (1-based) for `word`.
    ///
    /// Transport failures come back as a not-found reading carrying the
    /// error message; they are not cached, so a later call retries.
    pub async fn lookup(&self, word: &str, nr: u32) -> Meaning {
        let key = format!("{}_{nr}", word.to_lowercase());
        if let Some(hit) = self.entries.get(&key).await {
            tracing::debug!(word, nr, "lookup cache hit");
            return hit;
        }

        let url = match self.config.url_for(word, Some(nr)) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(word, nr, "lookup failed: {e}");
                return Meaning {
                    error: Some(e.to_string()),
                    ..Meaning::not_found(word, nr)
                };
            }
        };
        match self.fetch(&url).await {
            Ok(body) => {
                let mut meaning = parse_lookup(&body, word, nr, self.config.max_translations);
                meaning.url = Some(url);
                self.entries.insert(key, meaning.clone()).await;
                meaning
            }
            Err(e) => {
                tracing::warn!(word, nr, "lookup failed: {e}");
                Meaning {
                    url: Some(url),
                    error: Some(e.to_string()),
                    ..Meaning::not_found(word, nr)
                }
            }
        }
    }

    /// Every genuine form entry for `word`. Empty when the page has none or
    /// the request fails; only successful answers are cached.
    pub async fn lookup_all_meanings(&self, word: &str) -> Vec<Meaning> {
        let key = format!("all_{word}");
        if let Some(hit) = self.forms.get(&key).await {
            tracing::debug!(word, "forms cache hit");
            return hit;
        }

        let fetched = match self.config.url_for(word, None) {
            Ok(url) => self.fetch(&url).await,
            Err(e) => Err(e),
        };
        match fetched {
            Ok(body) => {
                let mut meanings = parse_forms(&body, word, self.config.max_translations);
                for meaning in &mut meanings {
                    meaning.url = self.config.url_for(word, Some(meaning.nr)).ok();
                }
                self.forms.insert(key, meanings.clone()).await;
                meanings
            }
            Err(e) => {
                tracing::warn!(word, "forms lookup failed: {e}");
                Vec::new()
            }
        }
    }

    /// Look up every distinct word of `text` concurrently.
    ///
    /// Results keep first-seen order; words without any reading are left
    /// out. With `all_meanings` false only the first entry is fetched.
    pub async fn analyze_text(&self, text: &str, all_meanings: bool) -> Vec<WordAnalysis> {
        let text = preprocess_text(text);
        let words = lookup_words(&tokenize(&text));
        tracing::info!(words = words.len(), "analyzing text");

        let found: HashMap<String, Vec<Meaning>> = stream::iter(words.iter().cloned())
            .map(|word| async move {
                let meanings = if all_meanings {
                    self.lookup_all_meanings(&word).await
                } else {
                    let first = self.lookup(&word, 1).await;
                    if first.found { vec![first] } else { Vec::new() }
                };
                (word, meanings)
            })
            .buffer_unordered(self.config.max_concurrency.max(1))
            .filter(|(_, meanings)| std::future::ready(!meanings.is_empty()))
            .collect()
            .await;

        words
            .into_iter()
            .filter_map(|word| {
                let meanings = found.get(&word)?.clone();
                Some(WordAnalysis::new(word, meanings))
            })
            .collect()
    }

    /// Fetch lemma sets for every search word and text token the context
    /// does not know yet.
    pub async fn fill_lemmas(&self, ctx: &mut AnalysisContext, search_words: &[String]) {
        let missing = ctx.missing_words(search_words);
        if missing.is_empty() {
            return;
        }
        tracing::debug!(missing = missing.len(), "resolving lemmas");

        let resolved: Vec<(String, Vec<Meaning>)> = stream::iter(missing)
            .map(|word| async move {
                let meanings = self.lookup_all_meanings(&word.to_lowercase()).await;
                (word, meanings)
            })
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        for (word, meanings) in resolved {
            ctx.insert_lemmas(&word, &meanings);
        }
    }
}
