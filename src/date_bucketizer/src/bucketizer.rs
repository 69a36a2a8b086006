//! The [`DateBucketizer`]: bucket index <-> date conversion over a UTC range.
//!
//! - Hour/day buckets: fixed millisecond width, aligned on UTC hour/day starts.
//! - Month buckets: calendar months, each starting on the 1st at 00:00:00Z.
//! - Index 0 is the bucket containing the (zeroed) start date.
//!
//! Start and end dates are stored exactly as set; zeroing happens on use.
//! Every conversion also accepts a fallback bound that is consulted only when
//! the bucketizer's own bound is unset.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace};

use crate::{
    error::{BucketizerError, Result},
    granularity::Granularity,
};

/// Maps an inclusive date range to a sequence of granularity-aligned buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateBucketizer {
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    granularity: Granularity,
}

impl DateBucketizer {
    /// Day granularity, no start or end date.
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as [`DateBucketizer::new`] with a preset granularity.
    pub fn with_granularity(granularity: Granularity) -> Self {
        Self {
            granularity,
            ..Self::default()
        }
    }

    /// Current bucket granularity.
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Switches granularity; stored dates are left untouched.
    pub fn set_granularity(&mut self, granularity: Granularity) {
        if self.granularity != granularity {
            debug!(from = %self.granularity, to = %granularity, "bucket granularity changed");
        }
        self.granularity = granularity;
    }

    /// Parses and applies a granularity name such as `"hour"`.
    ///
    /// Errors:
    /// - [`BucketizerError::InvalidArgument`] for an unknown name; the current
    ///   granularity is kept in that case.
    pub fn set_granularity_str(&mut self, name: &str) -> Result<()> {
        let granularity = name.parse()?;
        self.set_granularity(granularity);
        Ok(())
    }

    /// Per-bucket width in milliseconds, or `None` for month granularity.
    pub fn millis_multiplier(&self) -> Option<i64> {
        self.granularity.millis_multiplier()
    }

    /// Inclusive lower bound, as it was set.
    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    /// Sets or clears (`None`) the inclusive lower bound.
    pub fn set_start_date(&mut self, date: impl Into<Option<DateTime<Utc>>>) {
        self.start_date = date.into();
    }

    /// Upper bound of bucketing, as it was set.
    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    /// Sets or clears (`None`) the upper bound.
    pub fn set_end_date(&mut self, date: impl Into<Option<DateTime<Utc>>>) {
        self.end_date = date.into();
    }

    /// Returns `date` truncated to the start of its bucket, in UTC.
    ///
    /// Idempotent; the input is never modified.
    pub fn zero_out_date(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        self.granularity.zero_out(date)
    }

    /// 0-based index of the bucket containing `date`.
    ///
    /// Dates at or before the zeroed start all land in bucket 0.
    ///
    /// Errors:
    /// - [`BucketizerError::Precondition`] when no start date is set and no
    ///   fallback is given.
    pub fn bucket_index(
        &self,
        date: DateTime<Utc>,
        fallback_start: Option<DateTime<Utc>>,
    ) -> Result<u64> {
        let base = self.zeroed_start(fallback_start)?;
        let idx = self
            .granularity
            .buckets_between(base, self.zero_out_date(date));
        Ok(idx.max(0) as u64)
    }

    /// Start instant of bucket `index`; inverse of [`DateBucketizer::bucket_index`].
    ///
    /// Errors:
    /// - [`BucketizerError::Precondition`] without a start date or fallback.
    /// - [`BucketizerError::OutOfRange`] when the result is not representable.
    pub fn date_for_bucket(
        &self,
        index: u64,
        fallback_start: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>> {
        let base = self.zeroed_start(fallback_start)?;
        let steps = i64::try_from(index)
            .map_err(|_| BucketizerError::OutOfRange(format!("bucket index {index}")))?;
        self.granularity.add_buckets(base, steps)
    }

    /// `(start, end_exclusive)` of bucket `index`.
    ///
    /// For months the exclusive end is the first instant of the next month.
    pub fn bucket_bounds(
        &self,
        index: u64,
        fallback_start: Option<DateTime<Utc>>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.date_for_bucket(index, fallback_start)?;
        let end = self.granularity.add_buckets(start, 1)?;
        Ok((start, end))
    }

    /// Number of buckets between the zeroed start and the zeroed end.
    ///
    /// Zero when both bounds fall into the same bucket.
    ///
    /// Errors:
    /// - [`BucketizerError::Precondition`] when either bound is missing.
    /// - [`BucketizerError::InvalidArgument`] when the end precedes the start.
    pub fn num_buckets(
        &self,
        fallback_start: Option<DateTime<Utc>>,
        fallback_end: Option<DateTime<Utc>>,
    ) -> Result<u64> {
        let start = self.zeroed_start(fallback_start)?;
        let end = self.zeroed_end(fallback_end)?;
        if end < start {
            return Err(BucketizerError::InvalidArgument(format!(
                "end date {end} is before start date {start}"
            )));
        }
        // both bounds sit on the bucket grid, so this division is exact
        Ok(self.granularity.buckets_between(start, end) as u64)
    }

    /// Start instant of every bucket in `[0, num_buckets)`, in order.
    pub fn bucket_starts(
        &self,
        fallback_start: Option<DateTime<Utc>>,
        fallback_end: Option<DateTime<Utc>>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let n = self.num_buckets(fallback_start, fallback_end)?;
        (0..n)
            .map(|i| self.date_for_bucket(i, fallback_start))
            .collect()
    }

    /// Rounds `date` forward to the next bucket boundary.
    ///
    /// A date already on a boundary is returned unchanged. Dates before the
    /// start date are treated as the start date; the result is clamped to the
    /// end date when one is set.
    pub fn round_up_bucket(&self, date: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let date = self.start_date.map_or(date, |start| date.max(start));
        // boundary at or after `date`: start of the bucket holding date - 1ms, plus one
        let prev_tick = shift_millis(date, -1)?;
        let rounded = self
            .granularity
            .add_buckets(self.zero_out_date(prev_tick), 1)?;
        Ok(self.clamp_to_range(rounded))
    }

    /// Rounds `date` back to the start of its bucket.
    ///
    /// A date one millisecond short of a boundary rounds to that boundary.
    /// The result is clamped to `[start, end]` for whichever bounds are set.
    pub fn round_down_bucket(&self, date: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let next_tick = shift_millis(date, 1)?;
        let rounded = self.zero_out_date(next_tick);
        Ok(self.clamp_to_range(rounded))
    }

    /// Snaps a selected `[from, to]` range outward onto bucket boundaries.
    pub fn snap_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        Ok((self.round_down_bucket(from)?, self.round_up_bucket(to)?))
    }

    fn zeroed_start(&self, fallback: Option<DateTime<Utc>>) -> Result<DateTime<Utc>> {
        let start = resolve(self.start_date, fallback, "start")
            .ok_or(BucketizerError::Precondition("start date required"))?;
        Ok(self.zero_out_date(start))
    }

    fn zeroed_end(&self, fallback: Option<DateTime<Utc>>) -> Result<DateTime<Utc>> {
        let end = resolve(self.end_date, fallback, "end")
            .ok_or(BucketizerError::Precondition("end date required"))?;
        Ok(self.zero_out_date(end))
    }

    fn clamp_to_range(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        let mut out = date;
        if let Some(end) = self.end_date
            && out > end
        {
            trace!(%date, %end, "clamped to end date");
            out = end;
        }
        if let Some(start) = self.start_date
            && out < start
        {
            trace!(%date, %start, "clamped to start date");
            out = start;
        }
        out
    }
}

fn resolve(
    own: Option<DateTime<Utc>>,
    fallback: Option<DateTime<Utc>>,
    which: &'static str,
) -> Option<DateTime<Utc>> {
    if own.is_none() && fallback.is_some() {
        trace!(bound = which, "using fallback date");
    }
    own.or(fallback)
}

fn shift_millis(date: DateTime<Utc>, millis: i64) -> Result<DateTime<Utc>> {
    date.checked_add_signed(Duration::milliseconds(millis))
        .ok_or_else(|| BucketizerError::OutOfRange(format!("{date} shifted by {millis}ms")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn start() -> DateTime<Utc> {
        utc(1980, 2, 2, 3, 4, 5)
    }

    fn bucketizer(g: Granularity) -> DateBucketizer {
        let mut b = DateBucketizer::with_granularity(g);
        b.set_start_date(start());
        b
    }

    #[test]
    fn defaults() {
        let b = DateBucketizer::new();
        assert_eq!(b.granularity(), Granularity::Day);
        assert_eq!(b.millis_multiplier(), Some(86_400_000));
        assert_eq!(b.start_date(), None);
        assert_eq!(b.end_date(), None);
    }

    #[test]
    fn dates_are_stored_unzeroed() {
        let b = bucketizer(Granularity::Day);
        assert_eq!(b.start_date(), Some(start()));
    }

    #[test]
    fn day_scenario() {
        let b = bucketizer(Granularity::Day);
        assert_eq!(b.bucket_index(start(), None).unwrap(), 0);
        assert_eq!(b.bucket_index(utc(1980, 2, 3, 0, 0, 0), None).unwrap(), 1);
        assert_eq!(b.bucket_index(utc(1980, 2, 2, 4, 4, 0), None).unwrap(), 0);
    }

    #[test]
    fn hour_scenario() {
        let b = bucketizer(Granularity::Hour);
        assert_eq!(b.bucket_index(start(), None).unwrap(), 0);
        assert_eq!(b.bucket_index(start() + Duration::hours(1), None).unwrap(), 1);
        assert_eq!(b.bucket_index(start() + Duration::days(1), None).unwrap(), 24);
    }

    #[test]
    fn month_scenario() {
        let b = bucketizer(Granularity::Month);
        assert_eq!(b.bucket_index(utc(1980, 2, 28, 0, 0, 0), None).unwrap(), 0);
        assert_eq!(b.bucket_index(utc(1980, 3, 1, 0, 0, 0), None).unwrap(), 1);
        assert_eq!(b.bucket_index(utc(1981, 2, 1, 0, 0, 0), None).unwrap(), 12);

        let d = b.date_for_bucket(13, None).unwrap();
        assert_eq!(d.year(), 1981);
        assert_eq!(d.month0(), 2);
        assert_eq!(d, utc(1981, 3, 1, 0, 0, 0));
    }

    #[test]
    fn dates_before_start_floor_to_zero() {
        for g in [Granularity::Hour, Granularity::Day, Granularity::Month] {
            let b = bucketizer(g);
            assert_eq!(b.bucket_index(utc(1970, 1, 1, 0, 0, 0), None).unwrap(), 0);
        }
    }

    #[test]
    fn fallback_only_used_when_start_unset() {
        let mut b = DateBucketizer::new();
        let date = utc(1980, 2, 5, 0, 0, 0);
        assert_eq!(b.bucket_index(date, Some(start())).unwrap(), 3);

        b.set_start_date(utc(1980, 2, 4, 0, 0, 0));
        assert_eq!(b.bucket_index(date, Some(start())).unwrap(), 1);
    }

    #[test]
    fn missing_start_is_precondition_error() {
        let b = DateBucketizer::new();
        let err = b.bucket_index(start(), None).unwrap_err();
        assert!(matches!(err, BucketizerError::Precondition("start date required")));
        assert!(b.date_for_bucket(0, None).is_err());
    }

    #[test]
    fn missing_end_is_precondition_error() {
        let b = bucketizer(Granularity::Day);
        let err = b.num_buckets(None, None).unwrap_err();
        assert!(matches!(err, BucketizerError::Precondition("end date required")));
    }

    #[test]
    fn num_buckets_per_granularity() {
        let mut b = bucketizer(Granularity::Day);
        b.set_end_date(utc(1980, 2, 12, 18, 0, 0));
        assert_eq!(b.num_buckets(None, None).unwrap(), 10);

        b.set_granularity(Granularity::Hour);
        assert_eq!(b.num_buckets(None, None).unwrap(), 10 * 24 + 15);

        b.set_granularity(Granularity::Month);
        b.set_end_date(utc(1981, 1, 31, 0, 0, 0));
        assert_eq!(b.num_buckets(None, None).unwrap(), 11);
    }

    #[test]
    fn zero_length_range_has_no_buckets() {
        let mut b = bucketizer(Granularity::Day);
        b.set_end_date(start());
        assert_eq!(b.num_buckets(None, None).unwrap(), 0);
        assert!(b.bucket_starts(None, None).unwrap().is_empty());
    }

    #[test]
    fn inverted_range_is_invalid_argument() {
        let mut b = bucketizer(Granularity::Day);
        b.set_end_date(utc(1980, 1, 1, 0, 0, 0));
        let err = b.num_buckets(None, None).unwrap_err();
        assert!(matches!(err, BucketizerError::InvalidArgument(_)));
    }

    #[test]
    fn set_granularity_str_keeps_state_on_error() {
        let mut b = DateBucketizer::with_granularity(Granularity::Hour);
        assert!(b.set_granularity_str("fortnight").is_err());
        assert_eq!(b.granularity(), Granularity::Hour);
        b.set_granularity_str("month").unwrap();
        assert_eq!(b.granularity(), Granularity::Month);
        assert_eq!(b.millis_multiplier(), None);
    }

    #[test]
    fn round_up_moves_to_next_boundary() {
        let b = DateBucketizer::with_granularity(Granularity::Day);
        let d = utc(1980, 2, 2, 3, 4, 5);
        assert_eq!(b.round_up_bucket(d).unwrap(), utc(1980, 2, 3, 0, 0, 0));
        // already on a boundary
        let boundary = utc(1980, 2, 3, 0, 0, 0);
        assert_eq!(b.round_up_bucket(boundary).unwrap(), boundary);
    }

    #[test]
    fn round_up_month_is_calendar_aware() {
        let b = DateBucketizer::with_granularity(Granularity::Month);
        assert_eq!(
            b.round_up_bucket(utc(1980, 12, 15, 0, 0, 0)).unwrap(),
            utc(1981, 1, 1, 0, 0, 0)
        );
        assert_eq!(
            b.round_up_bucket(utc(1980, 3, 1, 0, 0, 0)).unwrap(),
            utc(1980, 3, 1, 0, 0, 0)
        );
    }

    #[test]
    fn round_up_of_unaligned_start_is_next_boundary() {
        let mut b = bucketizer(Granularity::Day);
        b.set_end_date(utc(1980, 3, 1, 0, 0, 0));
        let next_day = utc(1980, 2, 3, 0, 0, 0);
        assert_eq!(b.round_up_bucket(start()).unwrap(), next_day);
        assert_eq!(b.round_up_bucket(utc(1979, 1, 1, 0, 0, 0)).unwrap(), next_day);
        assert_eq!(b.round_up_bucket(next_day).unwrap(), next_day);

        // a brush collapsed onto the start still covers one bucket
        let (from, to) = b.snap_range(start(), start()).unwrap();
        assert_eq!(from, start());
        assert_eq!(to, next_day);
    }

    #[test]
    fn round_up_clamps_to_end() {
        let mut b = bucketizer(Granularity::Day);
        let end = utc(1980, 2, 10, 12, 0, 0);
        b.set_end_date(end);
        assert_eq!(b.round_up_bucket(utc(1980, 2, 10, 1, 0, 0)).unwrap(), end);
        assert_eq!(b.round_up_bucket(end).unwrap(), end);
    }

    #[test]
    fn round_down_to_bucket_start() {
        let b = DateBucketizer::with_granularity(Granularity::Hour);
        assert_eq!(
            b.round_down_bucket(utc(1980, 2, 2, 3, 59, 0)).unwrap(),
            utc(1980, 2, 2, 3, 0, 0)
        );
        // one tick short of a boundary rounds onto it
        let almost = utc(1980, 2, 2, 4, 0, 0) - Duration::milliseconds(1);
        assert_eq!(
            b.round_down_bucket(almost).unwrap(),
            utc(1980, 2, 2, 4, 0, 0)
        );
    }

    #[test]
    fn round_down_clamps_to_start() {
        let b = bucketizer(Granularity::Day);
        // zeroing the start itself would precede it
        assert_eq!(b.round_down_bucket(start()).unwrap(), start());
        assert_eq!(
            b.round_down_bucket(utc(1979, 6, 1, 0, 0, 0)).unwrap(),
            start()
        );
    }

    #[test]
    fn snap_range_rounds_outward() {
        let mut b = bucketizer(Granularity::Day);
        b.set_end_date(utc(1980, 3, 1, 0, 0, 0));
        let (from, to) = b
            .snap_range(utc(1980, 2, 5, 13, 0, 0), utc(1980, 2, 7, 9, 0, 0))
            .unwrap();
        assert_eq!(from, utc(1980, 2, 5, 0, 0, 0));
        assert_eq!(to, utc(1980, 2, 8, 0, 0, 0));
    }

    #[test]
    fn bucket_bounds_for_month() {
        let b = bucketizer(Granularity::Month);
        let (s, e) = b.bucket_bounds(0, None).unwrap();
        assert_eq!(s, utc(1980, 2, 1, 0, 0, 0));
        assert_eq!(e, utc(1980, 3, 1, 0, 0, 0));
    }

    #[test]
    fn bucket_starts_label_every_bucket() {
        let mut b = bucketizer(Granularity::Hour);
        b.set_end_date(utc(1980, 2, 2, 6, 30, 0));
        let labels = b.bucket_starts(None, None).unwrap();
        assert_eq!(
            labels,
            vec![
                utc(1980, 2, 2, 3, 0, 0),
                utc(1980, 2, 2, 4, 0, 0),
                utc(1980, 2, 2, 5, 0, 0),
            ]
        );
    }

    #[test]
    fn huge_index_is_out_of_range() {
        let b = bucketizer(Granularity::Hour);
        let err = b.date_for_bucket(u64::MAX, None).unwrap_err();
        assert!(matches!(err, BucketizerError::OutOfRange(_)));
    }
}
