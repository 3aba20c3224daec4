//! # vigil-types
//!
//! Shared domain types used across the Vigil workspace.

pub mod feed;
pub mod price;
pub mod status;

pub use feed::{FeedId, FeedReading};
pub use price::PriceInterval;
pub use status::CollateralStatus;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// A duration in seconds.
pub type Seconds = u64;

/// One day in seconds.
pub const ONE_DAY: Seconds = 86_400;

/// One week in seconds.
pub const ONE_WEEK: Seconds = 7 * ONE_DAY;
