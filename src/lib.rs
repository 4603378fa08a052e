//! Treat Atom and RSS feeds as sets of entries.
//!
//! Feeds are parsed from markup or fetched from a URL, combined with the
//! usual set operations, and written back out as Atom 1.0.

pub mod config;
pub mod feed;
pub mod util;
