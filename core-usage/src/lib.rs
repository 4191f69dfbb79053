//! # Usage Query Module
//!
//! Fetches the current billing period's data quota from the carrier's
//! GraphQL endpoint and converts it into display-ready values: a used
//! percentage, volume labels in gigabytes, and a humanized remaining time.

pub mod error;
pub mod fetcher;
pub mod summary;

pub use error::{Result, UsageError};
pub use fetcher::{UsageFetcher, CUSTOMER_FILTER, USAGE_QUERY};
pub use summary::{format_gigabytes, humanize_duration, DurationParts, UsageSummary};
