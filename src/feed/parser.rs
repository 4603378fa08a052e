use chrono::{DateTime, Utc};
use feed_rs::parser::{self, ParseFeedError};
use url::Url;

use crate::feed::model::Entry;

/// Where a feed string points: literal markup or a location to fetch.
#[derive(Debug, PartialEq)]
pub enum Source<'a> {
    Markup(&'a str),
    Url(Url),
}

impl<'a> Source<'a> {
    /// Sniffs the scheme: trimmed input starting with `http://` or `https://`
    /// that parses as a URL is fetched, everything else is treated as markup.
    pub fn classify(input: &'a str) -> Self {
        let trimmed = input.trim();
        let lower = trimmed.get(..8).unwrap_or(trimmed).to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            if let Ok(url) = Url::parse(trimmed) {
                return Source::Url(url);
            }
        }
        Source::Markup(input)
    }
}

/// Feed-level fields and entries taken verbatim from a parsed document.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub id: String,
    pub title: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub entries: Vec<Entry>,
}

/// Parses Atom or RSS bytes. Parser errors are returned unchanged.
pub fn parse_document(bytes: &[u8]) -> Result<ParsedFeed, ParseFeedError> {
    let feed = parser::parse(bytes)?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body));

            Entry {
                id: entry.id,
                title: entry.title.map(|t| t.content),
                updated: entry.updated.or(entry.published),
                summary,
                link: entry.links.into_iter().next().map(|l| l.href),
            }
        })
        .collect();

    Ok(ParsedFeed {
        id: feed.id,
        title: feed.title.map(|t| t.content),
        updated: feed.updated,
        author: feed.authors.into_iter().next().map(|p| p.name),
        entries,
    })
}
