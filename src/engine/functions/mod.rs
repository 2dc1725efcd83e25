//! Scalar date and duration functions.

pub mod calendar;

pub use calendar::{format_duration, last_day, last_day_of_timestamp, normalize_time};
