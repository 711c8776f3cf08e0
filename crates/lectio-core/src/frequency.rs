use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::lexicon::{LemmaSet, Meaning, WordAnalysis, lemma_set_of};
use crate::text::{normalize, preprocess_text, tokenize};

/// Everything known about one analyzed text.
///
/// Built once per text and handed to the frequency search explicitly; a new
/// text means a new context.
#[derive(Clone, Debug, Default)]
pub struct AnalysisContext {
    text: String,
    tokens: Vec<String>,
    lemmas: HashMap<String, LemmaSet>,
}

impl AnalysisContext {
    /// Preprocess and tokenize `text`, seeding lemma sets from a full analysis.
    pub fn new(text: &str, analyses: &[WordAnalysis]) -> Self {
        let text = preprocess_text(text);
        let tokens = tokenize(&text);
        let lemmas = analyses
            .iter()
            .map(|a| (a.word.clone(), a.lemma_set()))
            .collect();
        Self {
            text,
            tokens,
            lemmas,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn total_words(&self) -> usize {
        self.tokens.len()
    }

    /// Record the readings of a word looked up after the analysis.
    pub fn insert_lemmas(&mut self, word: &str, meanings: &[Meaning]) {
        self.lemmas
            .insert(word.to_string(), lemma_set_of(word, meanings));
    }

    pub fn has_lemmas(&self, word: &str) -> bool {
        self.lemmas.contains_key(word)
    }

    /// Known lemma set for `word`, or just its normalized form.
    pub fn lemmas_for(&self, word: &str) -> LemmaSet {
        self.lemmas
            .get(word)
            .cloned()
            .unwrap_or_else(|| LemmaSet::from([normalize(word)]))
    }

    /// Distinct words among the search words and the text's tokens that have
    /// no lemma set yet, in first-seen order.
    pub fn missing_words(&self, search_words: &[String]) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for word in search_words.iter().chain(self.tokens.iter()) {
            if !self.lemmas.contains_key(word) && !missing.contains(word) {
                missing.push(word.clone());
            }
        }
        missing
    }
}

/// Where one search word's lemmata appear in the text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub search_word: String,
    pub lemmas: Vec<String>,
    /// 1-based word numbers.
    pub positions: Vec<usize>,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyReport {
    pub total_words: usize,
    pub word_data: Vec<WordFrequency>,
}

/// Locate every text word sharing a lemma with each search word.
///
/// Search words are looked up as given (the context keys lookups by the
/// word string); text words are the context's lowercase tokens.
pub fn word_frequency(ctx: &AnalysisContext, search_words: &[String]) -> FrequencyReport {
    let token_lemmas: Vec<LemmaSet> = ctx.tokens.iter().map(|t| ctx.lemmas_for(t)).collect();

    let word_data = search_words
        .iter()
        .map(|search_word| {
            let search_lemmas = ctx.lemmas_for(search_word);
            let positions: Vec<usize> = token_lemmas
                .iter()
                .enumerate()
                .filter(|(_, lemmas)| !lemmas.is_disjoint(&search_lemmas))
                .map(|(i, _)| i + 1)
                .collect();
            WordFrequency {
                search_word: search_word.clone(),
                lemmas: search_lemmas.into_iter().collect(),
                count: positions.len(),
                positions,
            }
        })
        .collect();

    FrequencyReport {
        total_words: ctx.total_words(),
        word_data,
    }
}
