//! Shared utilities for Time-to-Event Studio crates.
//!
//! - **any_value**: `AnyValue` conversions used when reading roster cells
//! - **datetime**: ISO 8601 date/timestamp parsing and formatting

pub mod any_value;
pub mod datetime;

pub use any_value::{any_to_integer, any_to_string, any_to_string_non_empty};
pub use datetime::{any_to_timestamp, format_timestamp, parse_timestamp};
