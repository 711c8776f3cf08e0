//! HTML parsing for navigium result pages.
//!
//! A result page lists one `div.umgebend` container per dictionary entry.
//! Inside `div.innen` the entry carries its headword in `div.lemma > span`,
//! the matched form underlined (`<u>`) in front of its grammatical tag, and
//! numbered meanings in an `<ol>`. Pages with a "lat. Formen" heading
//! separate genuine forms from phrase and idiom hits further down.

use std::sync::LazyLock;

use lectio_core::{Alternative, Meaning, clean_text};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static CONTAINER: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.umgebend").unwrap());
static INNER: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.innen").unwrap());
static LEMMA: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.lemma").unwrap());
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static WORTART: LazyLock<Selector> = LazyLock::new(|| Selector::parse("i.wortart").unwrap());
static DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").unwrap());
static UNDERLINE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("u").unwrap());
static LIST: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ol").unwrap());
static ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static BEDEUTUNG: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".bedeutung").unwrap());
static HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3.ergebnis").unwrap());

/// Grammar tags sniffed from raw page text when no entry container exists:
/// finite verb forms, noun cases, infinitives.
static GRAMMAR_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(
            r"(\d+\.\s*Pers\.\s*(?:Sg|Pl)\.\s*(?:Präs|Perf|Imperf|Plusq|Fut)\.\s*(?:Ind|Konj|Imp)\.\s*(?:Akt|Pass)\.?)",
        )
        .unwrap(),
        Regex::new(r"((?:Nom|Gen|Dat|Akk|Abl|Vok)\.\s*(?:Sg|Pl)\.?)").unwrap(),
        Regex::new(r"(Inf\.\s*(?:Präs|Perf|Fut)\.\s*(?:Akt|Pass)\.?)").unwrap(),
    ]
});

const FORMS_HEADING: &str = "lat. Formen";

/// Loose-text translations longer than this are page noise, not a gloss.
const MAX_LOOSE_TRANSLATION: usize = 150;

fn text_of(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}

/// Parse one entry container into a reading of `word`.
///
/// Only the underlined form counts as a match: a word that merely shows up
/// in an example sentence leaves `word_matches` false.
pub fn parse_container(
    container: ElementRef<'_>,
    word: &str,
    nr: u32,
    max_translations: usize,
) -> Meaning {
    let mut result = Meaning::not_found(word, nr);

    let Some(inner) = container.select(&INNER).next() else {
        return result;
    };

    if let Some(lemma_div) = inner.select(&LEMMA).next() {
        if let Some(span) = lemma_div.select(&SPAN).next() {
            result.lemma = Some(text_of(span));
            result.found = true;
        }
        if let (Some(wortart), Some(lemma)) =
            (lemma_div.select(&WORTART).next(), result.lemma.as_mut())
        {
            lemma.push(' ');
            lemma.push_str(&text_of(wortart));
        }
    }

    let word_lower = word.to_lowercase();
    let form_div = inner
        .select(&DIV)
        .filter(|div| div.id() != inner.id())
        .find_map(|div| div.select(&UNDERLINE).next().map(|u| (div, u)));
    if let Some((div, underlined)) = form_div {
        if text_of(underlined).to_lowercase() == word_lower {
            result.word_matches = true;
        }
        let text = text_of(div);
        if let Some((_, grammar)) = text.split_once(':') {
            result.grammar = Some(grammar.trim().to_string());
        }
    }

    if let Some(list) = inner.select(&LIST).next() {
        let meanings: Vec<String> = list
            .select(&ITEM)
            .take(max_translations)
            .filter_map(|li| li.select(&BEDEUTUNG).next())
            .map(text_of)
            .filter(|t| !t.is_empty())
            .collect();
        if !meanings.is_empty() {
            result.translation = Some(meanings.join("; "));
        }
    }

    if result.translation.is_none() {
        let text = text_of(inner);
        if text.contains(',') && text.chars().count() < MAX_LOOSE_TRANSLATION {
            result.translation = Some(text);
        }
    }

    result
}

/// Parse a single-entry lookup page, selecting entry `nr` (1-based, clamped
/// to the last entry) and listing the other found entries as alternatives.
pub fn parse_lookup(html: &str, word: &str, nr: u32, max_translations: usize) -> Meaning {
    let document = Html::parse_document(html);
    let containers: Vec<ElementRef<'_>> = document.select(&CONTAINER).collect();

    if containers.is_empty() {
        return sniff_grammar(&document, word, nr);
    }

    let index = (nr.saturating_sub(1) as usize).min(containers.len() - 1);
    let mut result = parse_container(containers[index], word, nr, max_translations);

    if containers.len() > 1 {
        result.alternatives = containers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .filter_map(|(i, container)| {
                let alt = parse_container(*container, word, i as u32 + 1, max_translations);
                alt.found.then_some(Alternative {
                    nr: i as u32 + 1,
                    lemma: alt.lemma,
                })
            })
            .collect();
    }

    result
}

fn sniff_grammar(document: &Html, word: &str, nr: u32) -> Meaning {
    let mut result = Meaning::not_found(word, nr);
    let page_text: String = document.root_element().text().collect();
    for pattern in GRAMMAR_PATTERNS.iter() {
        if let Some(m) = pattern.captures(&page_text).and_then(|c| c.get(1)) {
            result.grammar = Some(m.as_str().to_string());
            result.found = true;
            break;
        }
    }
    result
}

/// Parse every found entry in the "lat. Formen" section of a result page.
/// Entries under other headings (phrases, idioms) are ignored, so a page
/// without that heading yields nothing.
pub fn parse_forms(html: &str, word: &str, max_translations: usize) -> Vec<Meaning> {
    let document = Html::parse_document(html);
    let mut containers: Vec<ElementRef<'_>> = Vec::new();

    for heading in document.select(&HEADING) {
        if !text_of(heading).contains(FORMS_HEADING) {
            continue;
        }
        for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
            let el = sibling.value();
            if el.name() == "h3" {
                break;
            }
            if el.name() == "div" && el.classes().any(|c| c == "umgebend") {
                containers.push(sibling);
            }
        }
    }

    containers
        .into_iter()
        .enumerate()
        .map(|(i, container)| parse_container(container, word, i as u32 + 1, max_translations))
        .filter(|meaning| meaning.found)
        .collect()
}
