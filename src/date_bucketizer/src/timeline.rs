//! Binning raw record dates into a bucketized timeline.
//!
//! This is what histogram-style charts do with a [`DateBucketizer`]: size a
//! count array from the bucket count, drop every record into its bucket by
//! index, and label each bin with its bucket's start date.
//!
//! Bounds the bucketizer doesn't have are taken from the data itself (its
//! earliest and latest date). A data-derived end is inclusive, so the latest
//! record always gets a bin; an explicit end date keeps its exclusive meaning
//! and records past it are counted as dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::{
    bucketizer::DateBucketizer,
    error::{BucketizerError, Result},
    granularity::Granularity,
};

/// Upper limit on the number of bins a single timeline may allocate.
pub const MAX_BINS: u64 = 10_000_000;

/// One bucket of a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bin {
    /// 0-based bucket index.
    pub index: u64,
    /// Start instant of the bucket (x-axis label).
    pub start: DateTime<Utc>,
    /// Number of records in the bucket.
    pub count: u64,
}

/// Per-bucket record counts over a date range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timeline {
    /// Granularity the timeline was binned at.
    pub granularity: Granularity,
    /// Bins in index order.
    pub bins: Vec<Bin>,
    /// Records whose bucket lies past the last bin.
    pub dropped: u64,
}

impl Timeline {
    /// Bins `dates` using `bucketizer`, falling back to the data's min/max for unset bounds.
    ///
    /// An empty input produces an empty timeline.
    ///
    /// Errors:
    /// - [`BucketizerError::InvalidArgument`] when the explicit range is inverted
    ///   or would need more than [`MAX_BINS`] bins.
    pub fn bin<I>(bucketizer: &DateBucketizer, dates: I) -> Result<Self>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let dates: Vec<DateTime<Utc>> = dates.into_iter().collect();
        let granularity = bucketizer.granularity();
        let (Some(&min), Some(&max)) = (dates.iter().min(), dates.iter().max()) else {
            return Ok(Self {
                granularity,
                ..Self::default()
            });
        };

        let fallback_start = Some(min);
        let n = match bucketizer.end_date() {
            Some(_) => bucketizer.num_buckets(fallback_start, None)?.max(1),
            None => bucketizer.bucket_index(max, fallback_start)? + 1,
        };
        if n > MAX_BINS {
            return Err(BucketizerError::InvalidArgument(format!(
                "{n} {granularity} buckets exceeds the limit of {MAX_BINS}"
            )));
        }

        let mut counts = vec![0u64; n as usize];
        let mut dropped = 0u64;
        for date in &dates {
            let idx = bucketizer.bucket_index(*date, fallback_start)?;
            match counts.get_mut(idx as usize) {
                Some(c) => *c += 1,
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!(dropped, bins = n, "records past the last bucket were dropped");
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| {
                let index = i as u64;
                Ok(Bin {
                    index,
                    start: bucketizer.date_for_bucket(index, fallback_start)?,
                    count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            granularity,
            bins,
            dropped,
        })
    }

    /// Records placed into bins (excludes dropped ones).
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }
}
