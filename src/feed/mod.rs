//! Feeds as sets of entries.
//!
//! This module provides the core functionality for treating RSS and Atom
//! feeds like mathematical sets:
//!
//! - **Model**: [`Feed`] and [`Entry`], with a cached Atom rendering
//! - **Identity**: [`EntryIndex`], the computed-once id -> entry map of a feed
//! - **Set algebra**: [`combine`] and the named/operator bindings on `Feed`
//!
//! # Architecture
//!
//! The collaborators the model relies on live in their own submodules:
//!
//! - [`parser`] - Atom/RSS parsing using the `feed-rs` crate
//! - [`render`] - Atom 1.0 serialization with `quick-xml`
//! - [`fetcher`] - HTTP retrieval with retry logic and size limits
//!
//! # Example
//!
//! ```ignore
//! use feedset::feed::{combine, Feed, SetOp};
//!
//! let a = Feed::parse(&atom_a)?;
//! let b = Feed::parse(&atom_b)?;
//!
//! let both = &a & &b;
//! assert!(a.issuperset(&both));
//! println!("{}", both.to_xml()?);
//! ```

pub mod fetcher;
mod index;
mod model;
pub mod parser;
pub mod render;
mod set_ops;

pub use fetcher::{FetchError, FetchPolicy, Fetcher};
pub use index::EntryIndex;
pub use model::{Entry, Feed, FeedError, FeedParts};
pub use parser::Source;
pub use set_ops::{combine, SetOp, SetOutcome, AUTHOR};
