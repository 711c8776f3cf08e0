//! Lectio core: Latin text preparation, lemma-aware word frequency, and
//! density-chart navigation.
//!
//! Everything here is a pure function over already-computed data. Fetching
//! dictionary entries and serving them lives in `lectio-navigium` and
//! `lectio-cli`.

pub mod constants;
pub mod density;
pub mod error;
pub mod frequency;
pub mod lexicon;
pub mod text;

pub use constants::{DEFAULT_BUCKETS, DEFAULT_MAX_BUCKETS, MIN_LOOKUP_LEN};
pub use density::{
    Bucket, DensitySeries, Navigation, Occurrence, Plateau, bucket_at, build_density,
    find_plateau, find_plateau_with_tolerance, navigate, occurrences_from_positions,
    select_occurrence,
};
pub use error::{CoreError, Result};
pub use frequency::{AnalysisContext, FrequencyReport, WordFrequency, word_frequency};
pub use lexicon::{
    Alternative, LemmaSet, Meaning, Reading, WordAnalysis, lemma_key, lemma_set_of,
};
pub use text::{clean_text, lookup_words, normalize, preprocess_text, text_hash, tokenize};
