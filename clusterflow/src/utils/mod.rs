//! Utility functions for timestamps, clocks and retries.

mod retry;
pub mod timestamps;

pub use retry::{run_with_retry, RetryPolicy};
pub use timestamps::{
    add_duration, format_timestamp, now_utc, parse_timestamp, to_chrono, Clock, ManualClock,
    SystemClock, Timestamp, TimestampError,
};
