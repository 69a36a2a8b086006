#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use date_bucketizer::{DateBucketizer, Granularity};
use proptest::prelude::*;

pub const ALL: [Granularity; 3] = [Granularity::Hour, Granularity::Day, Granularity::Month];

/// 1980-02-02T03:04:05Z, the anchor used across scenarios.
pub fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1980, 2, 2, 3, 4, 5).unwrap()
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

pub fn bucketizer(g: Granularity, start: DateTime<Utc>) -> DateBucketizer {
    let mut b = DateBucketizer::with_granularity(g);
    b.set_start_date(start);
    b
}

pub fn granularity() -> impl Strategy<Value = Granularity> {
    prop_oneof![
        Just(Granularity::Hour),
        Just(Granularity::Day),
        Just(Granularity::Month),
    ]
}

/// Millisecond-precision dates between 1900 and 2100.
pub fn date() -> impl Strategy<Value = DateTime<Utc>> {
    (-2_208_988_800_000i64..4_102_444_800_000i64)
        .prop_map(|ms| DateTime::<Utc>::from_timestamp_millis(ms).unwrap())
}
