//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **URL validation**: Security-focused validation to prevent SSRF attacks
//! - **Identity and time**: Fresh URNs and second-precision UTC timestamps for derived feeds
//!
//! # Examples
//!
//! ```
//! use feedset::util::{fresh_urn, utc_now, validate_url};
//!
//! // Validate a feed URL
//! let url = validate_url("https://example.com/feed.xml", false).unwrap();
//!
//! // Identity and timestamp for a new feed
//! let id = fresh_urn();
//! assert!(id.starts_with("urn:uuid:"));
//! let now = utc_now();
//! assert_eq!(now.timestamp_subsec_nanos(), 0);
//! ```

mod clock;
mod url_validator;

pub use clock::{format_timestamp, fresh_urn, utc_now};
pub use url_validator::{validate_url, UrlValidationError};
