//! Date bucketing for timeline and histogram style visualizations.
//!
//! A [`DateBucketizer`] quantizes a continuous UTC date axis into discrete
//! buckets of one hour, one day, or one calendar month, and converts between
//! dates and 0-based bucket indices in both directions.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use date_bucketizer::{DateBucketizer, Granularity};
//!
//! let mut b = DateBucketizer::new();
//! b.set_granularity(Granularity::Hour);
//! b.set_start_date(Utc.with_ymd_and_hms(1980, 2, 2, 3, 4, 5).unwrap());
//!
//! let later = Utc.with_ymd_and_hms(1980, 2, 3, 3, 4, 5).unwrap();
//! assert_eq!(b.bucket_index(later, None).unwrap(), 24);
//! ```

#![deny(missing_docs)]

pub mod bucketizer;
pub mod config;
pub mod error;
pub mod granularity;
pub mod timeline;
pub mod timestamp;

pub use bucketizer::DateBucketizer;
pub use error::{BucketizerError, Result};
pub use granularity::Granularity;
