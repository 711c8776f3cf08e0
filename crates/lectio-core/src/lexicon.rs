use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::text::normalize;

/// Normalized lemma keys. Ordered so reports serialize deterministically.
pub type LemmaSet = BTreeSet<String>;

/// Another dictionary reading of the same word form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub nr: u32,
    pub lemma: Option<String>,
}

/// One dictionary reading of a word form as scraped from a result page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meaning {
    pub word_form: String,
    pub nr: u32,
    pub lemma: Option<String>,
    pub grammar: Option<String>,
    pub translation: Option<String>,
    pub found: bool,
    /// True only when the entry's underlined form is exactly the looked-up word.
    #[serde(default)]
    pub word_matches: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Meaning {
    /// An empty, not-found reading for `word`.
    pub fn not_found(word: &str, nr: u32) -> Self {
        Self {
            word_form: word.to_string(),
            nr,
            ..Self::default()
        }
    }

    pub fn lemma_key(&self) -> Option<String> {
        self.lemma.as_deref().and_then(lemma_key)
    }
}

/// How a word form resolves against the dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reading {
    Unknown,
    Unambiguous(String),
    Ambiguous(Vec<String>),
}

/// All readings found for one distinct word of an analyzed text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordAnalysis {
    pub word: String,
    pub meanings: Vec<Meaning>,
    pub has_multiple: bool,
}

impl WordAnalysis {
    pub fn new(word: impl Into<String>, meanings: Vec<Meaning>) -> Self {
        let has_multiple = meanings.len() > 1;
        Self {
            word: word.into(),
            meanings,
            has_multiple,
        }
    }

    /// Lemma keys of every reading plus the normalized word itself.
    pub fn lemma_set(&self) -> LemmaSet {
        lemma_set_of(&self.word, &self.meanings)
    }

    /// Distinct lemmata, in reading order, collapsed into a `Reading`.
    pub fn reading(&self) -> Reading {
        let mut lemmas: Vec<String> = Vec::new();
        for lemma in self.meanings.iter().filter_map(|m| m.lemma.as_ref()) {
            if !lemmas.contains(lemma) {
                lemmas.push(lemma.clone());
            }
        }
        match lemmas.len() {
            0 => Reading::Unknown,
            1 => Reading::Unambiguous(lemmas.remove(0)),
            _ => Reading::Ambiguous(lemmas),
        }
    }
}

/// Lemma set for a word given the readings a lookup returned for it.
pub fn lemma_set_of(word: &str, meanings: &[Meaning]) -> LemmaSet {
    let mut set: LemmaSet = meanings.iter().filter_map(Meaning::lemma_key).collect();
    set.insert(normalize(word));
    set
}

/// Dictionary headwords carry stem forms and word class after the lemma
/// (`"arma -ōrum n"`); only the first token identifies it.
pub fn lemma_key(lemma: &str) -> Option<String> {
    lemma
        .split_whitespace()
        .next()
        .map(|first| normalize(first.trim_end_matches([',', ';'])))
        .filter(|key| !key.is_empty())
}
