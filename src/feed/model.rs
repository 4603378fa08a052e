use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use feed_rs::parser::ParseFeedError;
use thiserror::Error;

use crate::feed::fetcher::{FetchError, Fetcher};
use crate::feed::index::EntryIndex;
use crate::feed::parser::{self, ParsedFeed, Source};
use crate::feed::render::{self, FeedView};

/// Errors raised while building, combining, or rendering feeds.
///
/// Parser and fetch failures are carried through untouched so callers can
/// match on the collaborator's own error type.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Wrong number of operands, or explicit construction with missing fields
    #[error("Invalid arguments: {0}")]
    Argument(String),
    /// Feed source was not text; carries the name of the offending type
    #[error("String expected, {0} given")]
    Type(&'static str),
    /// Markup is not a well-formed Atom/RSS document
    #[error(transparent)]
    Parse(#[from] ParseFeedError),
    /// `contains` and `copy` are deliberately not offered on feeds
    #[error("Unsupported operation on a feed: {0}")]
    Unsupported(&'static str),
    /// Retrieving a feed URL failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Atom serialization failed
    #[error("Render error: {0}")]
    Render(String),
}

/// One item of a feed, immutable once produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    pub title: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub link: Option<String>,
}

impl Entry {
    /// Entry with only an id; every optional field left empty.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            updated: None,
            summary: None,
            link: None,
        }
    }
}

/// Explicit field values for [`Feed::from_parts`].
///
/// Every field must be set; a missing one is an argument error rather than
/// a silently defaulted value.
#[derive(Debug, Default)]
pub struct FeedParts {
    pub id: Option<String>,
    pub title: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub entries: Option<Vec<Arc<Entry>>>,
}

/// A syndication document that can be treated as a set of entries.
///
/// Only `id` and `title` are writable after construction. Writing either one
/// drops the cached Atom rendering. The identity index is built on the first
/// set operation and never rebuilt for the same instance.
///
/// `Feed` is `Send` but not `Sync`: the lazily filled caches are not guarded
/// against concurrent population, so sharing one instance across threads has
/// to be serialized by the caller.
#[derive(Debug)]
pub struct Feed {
    id: String,
    title: String,
    updated: Option<DateTime<Utc>>,
    author: Option<String>,
    entries: Vec<Arc<Entry>>,
    index: OnceCell<EntryIndex>,
    rendered: OnceCell<Arc<str>>,
}

impl Feed {
    /// Parses literal Atom or RSS markup. Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Parse`] carrying the parser's error unchanged.
    pub fn parse(markup: &str) -> Result<Self, FeedError> {
        let parsed = parser::parse_document(markup.as_bytes())?;
        Ok(Self::from_parsed(parsed))
    }

    /// Reads a feed from a string that is either markup or an http(s) URL.
    ///
    /// URLs are retrieved through `fetcher`; markup is parsed in place.
    /// Loopback and private-network URLs such as `http://localhost:8000/`
    /// are refused unless the fetcher's policy sets `allow_private_hosts`.
    pub async fn open(input: &str, fetcher: &Fetcher) -> Result<Self, FeedError> {
        match Source::classify(input) {
            Source::Url(url) => {
                let bytes = fetcher.fetch(&url).await?;
                let parsed = parser::parse_document(&bytes)?;
                tracing::debug!(url = %url, entries = parsed.entries.len(), "Loaded feed from URL");
                Ok(Self::from_parsed(parsed))
            }
            Source::Markup(markup) => Self::parse(markup),
        }
    }

    /// Reads a feed from a dynamically typed configuration value.
    ///
    /// Only strings are accepted; any other TOML type fails with
    /// [`FeedError::Type`] naming that type.
    pub async fn from_value(value: &toml::Value, fetcher: &Fetcher) -> Result<Self, FeedError> {
        match value {
            toml::Value::String(input) => Self::open(input, fetcher).await,
            other => Err(FeedError::Type(other.type_str())),
        }
    }

    /// Builds a feed from explicit values without parsing anything.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Argument`] listing every field that was left unset.
    pub fn from_parts(parts: FeedParts) -> Result<Self, FeedError> {
        match parts {
            FeedParts {
                id: Some(id),
                title: Some(title),
                updated: Some(updated),
                author: Some(author),
                entries: Some(entries),
            } => Ok(Self::assemble(id, title, Some(updated), Some(author), entries)),
            parts => {
                let missing: Vec<&str> = [
                    ("id", parts.id.is_none()),
                    ("title", parts.title.is_none()),
                    ("updated", parts.updated.is_none()),
                    ("author", parts.author.is_none()),
                    ("entries", parts.entries.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(FeedError::Argument(format!(
                    "feed needs markup or all explicit fields; missing: {}",
                    missing.join(", ")
                )))
            }
        }
    }

    fn from_parsed(parsed: ParsedFeed) -> Self {
        let entries = parsed.entries.into_iter().map(Arc::new).collect();
        Self::assemble(
            parsed.id,
            parsed.title.unwrap_or_default(),
            parsed.updated,
            parsed.author,
            entries,
        )
    }

    /// Explicit construction for values already known to be complete.
    pub(crate) fn assemble(
        id: String,
        title: String,
        updated: Option<DateTime<Utc>>,
        author: Option<String>,
        entries: Vec<Arc<Entry>>,
    ) -> Self {
        Self {
            id,
            title,
            updated,
            author,
            entries,
            index: OnceCell::new(),
            rendered: OnceCell::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replaces the feed id and drops the cached rendering.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
        self.rendered.take();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replaces the feed title and drops the cached rendering.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.rendered.take();
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn entries(&self) -> &[Arc<Entry>] {
        &self.entries
    }

    /// Returns the identity index, building it on first use.
    pub fn ensure_index(&self) -> &EntryIndex {
        self.index.get_or_init(|| EntryIndex::build(&self.entries))
    }

    /// Whether a set operation has already indexed this feed.
    pub fn is_indexed(&self) -> bool {
        self.index.get().is_some()
    }

    /// Renders the feed as an Atom 1.0 document.
    ///
    /// The result is cached: repeated calls without an intervening
    /// [`set_id`](Self::set_id) or [`set_title`](Self::set_title) return the
    /// same allocation.
    pub fn to_xml(&self) -> Result<Arc<str>, FeedError> {
        if let Some(xml) = self.rendered.get() {
            return Ok(Arc::clone(xml));
        }

        let view = FeedView {
            id: &self.id,
            title: &self.title,
            updated: self.updated,
            author: self.author.as_deref(),
            entries: &self.entries,
        };
        let xml = render::render_atom(&view).map_err(|e| FeedError::Render(format!("{e:#}")))?;
        Ok(Arc::clone(self.rendered.get_or_init(|| Arc::from(xml))))
    }

    /// Membership tests by raw entry are not offered; always fails.
    pub fn contains(&self, _entry: &Entry) -> Result<bool, FeedError> {
        Err(FeedError::Unsupported("contains"))
    }

    /// Shallow duplication is not offered; always fails.
    pub fn copy(&self) -> Result<Feed, FeedError> {
        Err(FeedError::Unsupported("copy"))
    }
}

/// Writes the Atom rendering. A render failure surfaces only as
/// `fmt::Error` here; use [`Feed::to_xml`] to get the [`FeedError`].
impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.to_xml().map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}
