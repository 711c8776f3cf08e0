//! Word-density chart and click navigation.
//!
//! Occurrences of a word are binned into a fixed number of contiguous
//! buckets spanning the text. A click on the chart lands on a bucket; the
//! bucket's plateau (the run of neighbouring buckets with the same count)
//! decides which occurrence to jump to, so every click inside one flat
//! stretch of the chart navigates to the same passage.
//!
//! Selection rule for a plateau `[lo, hi]`:
//! 1. midpoint bucket `m = (lo + hi + 1) / 2`, rounding toward the later bucket;
//! 2. candidates are the occurrences binned inside the plateau, or every
//!    occurrence when the plateau is empty;
//! 3. the candidate with the smallest bucket distance to `m` wins, then the
//!    smallest text distance to the centre of `m`, then the lowest position.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// One appearance of the target word. `position` is a 0-based token index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    pub position: usize,
    pub value: String,
}

impl Occurrence {
    pub fn new(position: usize, value: impl Into<String>) -> Self {
        Self {
            position,
            value: value.into(),
        }
    }
}

/// Half-open text range `[start, end)` with the number of occurrences in it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensitySeries {
    pub text_len: usize,
    pub buckets: Vec<Bucket>,
}

impl DensitySeries {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.buckets.iter().map(|b| b.count).collect()
    }

    /// Bucket index holding text position `position`. Positions at or past
    /// the end of the text belong to the last bucket.
    pub fn bucket_of(&self, position: usize) -> usize {
        bucket_index(position, self.text_len, self.buckets.len())
    }
}

/// Inclusive bucket range of a plateau.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plateau {
    pub lo: usize,
    pub hi: usize,
}

impl Plateau {
    pub fn contains(&self, bucket: usize) -> bool {
        (self.lo..=self.hi).contains(&bucket)
    }

    /// Middle bucket; even-width plateaus round toward `hi`.
    pub fn midpoint(&self) -> usize {
        (self.lo + self.hi + 1) / 2
    }
}

/// Result of resolving one chart click.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub plateau: Plateau,
    pub occurrence: Option<Occurrence>,
}

fn bucket_index(position: usize, text_len: usize, bucket_count: usize) -> usize {
    if bucket_count == 0 || text_len == 0 {
        return 0;
    }
    let idx = (position as u128 * bucket_count as u128) / text_len as u128;
    (idx as usize).min(bucket_count - 1)
}

// Bucket i starts at ceil(i * L / N); this is the exact inverse of
// `bucket_index`, so a position always lands inside its bucket's range.
fn bucket_start(i: usize, text_len: usize, bucket_count: usize) -> usize {
    let num = i as u128 * text_len as u128;
    num.div_ceil(bucket_count as u128) as usize
}

/// Bin occurrence positions into `bucket_count` contiguous buckets over a
/// text of `text_len` tokens.
pub fn build_density(
    occurrences: &[Occurrence],
    text_len: usize,
    bucket_count: usize,
) -> Result<DensitySeries> {
    if text_len == 0 {
        return Err(CoreError::InvalidArgument("text is empty".into()));
    }
    if bucket_count == 0 {
        return Err(CoreError::InvalidArgument(
            "bucket count must be at least 1".into(),
        ));
    }

    let mut buckets: Vec<Bucket> = Vec::new();
    buckets.try_reserve_exact(bucket_count).map_err(|_| {
        CoreError::InvalidArgument(format!("bucket count {bucket_count} is too large"))
    })?;
    buckets.extend((0..bucket_count).map(|i| Bucket {
        index: i,
        start: bucket_start(i, text_len, bucket_count),
        end: bucket_start(i + 1, text_len, bucket_count),
        count: 0,
    }));

    for occ in occurrences {
        buckets[bucket_index(occ.position, text_len, bucket_count)].count += 1;
    }

    Ok(DensitySeries { text_len, buckets })
}

/// Maximal run of equal-count buckets around `bucket`.
pub fn find_plateau(series: &DensitySeries, bucket: usize) -> Result<Plateau> {
    find_plateau_with_tolerance(series, bucket, 0)
}

/// Like [`find_plateau`], but neighbours join the run while their counts
/// differ by at most `tolerance`. Joining is decided pairwise between
/// neighbours, so plateaus partition the series and every bucket inside a
/// plateau reports the same range.
pub fn find_plateau_with_tolerance(
    series: &DensitySeries,
    bucket: usize,
    tolerance: usize,
) -> Result<Plateau> {
    if bucket >= series.len() {
        return Err(CoreError::InvalidArgument(format!(
            "bucket {bucket} out of range for {} buckets",
            series.len()
        )));
    }

    let counts = series.counts();
    let joins = |a: usize, b: usize| counts[a].abs_diff(counts[b]) <= tolerance;

    let mut lo = bucket;
    while lo > 0 && joins(lo - 1, lo) {
        lo -= 1;
    }
    let mut hi = bucket;
    while hi + 1 < counts.len() && joins(hi, hi + 1) {
        hi += 1;
    }

    Ok(Plateau { lo, hi })
}

/// Representative occurrence for a clicked plateau. `None` only when there
/// are no occurrences at all.
pub fn select_occurrence<'a>(
    series: &DensitySeries,
    plateau: Plateau,
    occurrences: &'a [Occurrence],
) -> Option<&'a Occurrence> {
    if series.is_empty() {
        return occurrences.iter().min_by_key(|occ| occ.position);
    }
    let mid = plateau.midpoint().min(series.len() - 1);
    // Doubled coordinates keep the bucket centre integral; u128 keeps
    // positions past the end of the text from overflowing.
    let centre2 = series.buckets[mid].start as u128 + series.buckets[mid].end as u128;

    let rank = |occ: &Occurrence| {
        let bucket = series.bucket_of(occ.position);
        (
            bucket.abs_diff(mid),
            (2 * occ.position as u128 + 1).abs_diff(centre2),
            occ.position,
        )
    };

    let inside = occurrences
        .iter()
        .filter(|occ| plateau.contains(series.bucket_of(occ.position)))
        .min_by_key(|occ| rank(occ));

    inside.or_else(|| occurrences.iter().min_by_key(|occ| rank(occ)))
}

/// Resolve a click on `bucket`: find its plateau and pick the occurrence.
pub fn navigate(
    series: &DensitySeries,
    occurrences: &[Occurrence],
    bucket: usize,
    tolerance: usize,
) -> Result<Navigation> {
    let plateau = find_plateau_with_tolerance(series, bucket, tolerance)?;
    let occurrence = select_occurrence(series, plateau, occurrences).cloned();
    Ok(Navigation {
        plateau,
        occurrence,
    })
}

/// Map a click coordinate on a chart `extent` units wide to a bucket index.
/// Coordinates outside the chart clamp to the first or last bucket.
pub fn bucket_at(offset: f64, extent: f64, bucket_count: usize) -> Result<usize> {
    if bucket_count == 0 {
        return Err(CoreError::InvalidArgument(
            "bucket count must be at least 1".into(),
        ));
    }
    if !extent.is_finite() || extent <= 0.0 {
        return Err(CoreError::InvalidArgument(format!(
            "chart extent must be positive, got {extent}"
        )));
    }
    if !offset.is_finite() {
        return Err(CoreError::InvalidArgument(format!(
            "click offset must be finite, got {offset}"
        )));
    }

    let fraction = (offset / extent).clamp(0.0, 1.0);
    let idx = (fraction * bucket_count as f64).floor() as usize;
    Ok(idx.min(bucket_count - 1))
}

/// Occurrences from the 1-based word numbers of a frequency report.
pub fn occurrences_from_positions(word_numbers: &[usize], value: &str) -> Vec<Occurrence> {
    word_numbers
        .iter()
        .map(|&n| Occurrence::new(n.saturating_sub(1), value))
        .collect()
}
