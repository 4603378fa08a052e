//! Integration tests for reading feeds and rendering them back as Atom.

use std::sync::Arc;

use feedset::feed::{Feed, FeedError, FeedParts, FetchPolicy, Fetcher};
use pretty_assertions::assert_eq;

const ATOM12: &str = include_str!("fixtures/atom12.xml");
const ATOM23: &str = include_str!("fixtures/atom23.xml");
const ATOM34: &str = include_str!("fixtures/atom34.xml");
const ATOM_MIN_ENTRY: &str = include_str!("fixtures/atom-min-entry.xml");
const ATOM_MIN_FEED: &str = include_str!("fixtures/atom-min-feed.xml");
const ATOM_HTML: &str = include_str!("fixtures/atom-html.xml");

/// Comparable projection of a parsed document: feed metadata plus entries sorted by id.
type Snapshot = (
    (Option<String>, String, Option<String>),
    Vec<(Option<String>, String, Option<String>, Option<String>)>,
);

fn snapshot(xml: &str) -> Snapshot {
    let feed = feed_rs::parser::parse(xml.as_bytes()).unwrap();
    let meta = (
        feed.title.map(|t| t.content),
        feed.id,
        feed.updated.map(|u| u.to_rfc3339()),
    );
    let mut entries: Vec<_> = feed
        .entries
        .into_iter()
        .map(|e| {
            (
                e.title.map(|t| t.content),
                e.id,
                e.updated.map(|u| u.to_rfc3339()),
                e.summary.map(|s| s.content),
            )
        })
        .collect();
    entries.sort_by(|a, b| a.1.cmp(&b.1));
    (meta, entries)
}

fn assert_content_is_the_same(original: &str) {
    let rendered = Feed::parse(original).unwrap().to_xml().unwrap();
    assert_eq!(snapshot(original), snapshot(&rendered));
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_round_trip_preserves_content() {
    for fixture in [ATOM12, ATOM23, ATOM34, ATOM_MIN_ENTRY, ATOM_HTML] {
        assert_content_is_the_same(fixture);
    }
}

#[test]
fn test_minimal_feed_renders() {
    let feed = Feed::parse(ATOM_MIN_FEED).unwrap();
    assert!(feed.is_empty());
    let xml = feed.to_xml().unwrap();
    assert!(xml.contains("<id>urn:feedset:minimal-feed</id>"));
    assert!(!xml.contains("<entry>"));
}

#[test]
fn test_html_summary_is_escaped() {
    let xml = Feed::parse(ATOM_HTML).unwrap().to_xml().unwrap();
    assert!(xml.contains(r#"<summary type="html">&lt;p&gt;Some &lt;em&gt;"#));
    assert!(!xml.contains("<em>"));
}

#[test]
fn test_parse_rss() {
    let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>RSS Channel</title>
    <item><guid>a</guid><title>First</title><description>One</description></item>
    <item><guid>b</guid><title>Second</title></item>
</channel></rss>"#;

    let feed = Feed::parse(rss).unwrap();
    assert_eq!(feed.title(), "RSS Channel");
    assert_eq!(feed.len(), 2);

    let xml = feed.to_xml().unwrap();
    let reparsed = feed_rs::parser::parse(xml.as_bytes()).unwrap();
    let ids: Vec<_> = reparsed.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

// ============================================================================
// Attributes and render cache
// ============================================================================

#[test]
fn test_title_attribute_matches_rendering() {
    let feed = Feed::parse(ATOM12).unwrap();
    let (meta, _) = snapshot(&feed.to_xml().unwrap());
    assert_eq!(meta.0.as_deref(), Some(feed.title()));
}

#[test]
fn test_change_title() {
    let mut feed = Feed::parse(ATOM12).unwrap();
    let new_title = format!("{}foo", feed.title());
    feed.set_title(new_title.clone());

    assert_eq!(feed.title(), new_title);
    let (meta, _) = snapshot(&feed.to_xml().unwrap());
    assert_eq!(meta.0, Some(new_title));
}

#[test]
fn test_change_id() {
    let mut feed = Feed::parse(ATOM12).unwrap();
    feed.set_id("urn:feedset:renamed");
    let (meta, _) = snapshot(&feed.to_xml().unwrap());
    assert_eq!(meta.1, "urn:feedset:renamed");
}

#[test]
fn test_cache_rendered_xml_if_feed_unchanged() {
    let feed = Feed::parse(ATOM12).unwrap();
    let first = feed.to_xml().unwrap();
    let second = feed.to_xml().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_rerender_after_title_write_even_if_equal() {
    let mut feed = Feed::parse(ATOM12).unwrap();
    let first = feed.to_xml().unwrap();

    let same_title = feed.title().to_string();
    feed.set_title(same_title);
    let second = feed.to_xml().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first, second);
}

#[test]
fn test_rerender_after_id_write() {
    let mut feed = Feed::parse(ATOM12).unwrap();
    let first = feed.to_xml().unwrap();
    let same_id = feed.id().to_string();
    feed.set_id(same_id);
    assert!(!Arc::ptr_eq(&first, &feed.to_xml().unwrap()));
}

// ============================================================================
// Construction errors
// ============================================================================

#[test]
fn test_malformed_markup_is_parse_error() {
    for markup in ["almost xml", "<not valid xml", ""] {
        match Feed::parse(markup) {
            Err(FeedError::Parse(_)) => {}
            other => panic!("Expected Parse error for {:?}, got {:?}", markup, other),
        }
    }
}

#[test]
fn test_no_arguments_is_argument_error() {
    assert!(matches!(
        Feed::from_parts(FeedParts::default()),
        Err(FeedError::Argument(_))
    ));
}

#[tokio::test]
async fn test_non_string_values_are_type_errors() {
    let fetcher = Fetcher::new(FetchPolicy::default()).unwrap();
    let values: toml::Table = toml::from_str(
        r#"
integer = 0
float = 2.72
array = ["bar"]
table = { baz = "quak" }
boolean = true
"#,
    )
    .unwrap();

    for (name, value) in &values {
        match Feed::from_value(value, &fetcher).await {
            Err(FeedError::Type(type_name)) => {
                assert_eq!(type_name, name.as_str());
                let message = FeedError::Type(type_name).to_string();
                assert!(message.contains(name.as_str()));
            }
            other => panic!("Expected Type error for {}, got {:?}", name, other),
        }
    }
}

#[tokio::test]
async fn test_string_value_is_parsed() {
    let fetcher = Fetcher::new(FetchPolicy::default()).unwrap();
    let value = toml::Value::String(ATOM12.to_string());
    let feed = Feed::from_value(&value, &fetcher).await.unwrap();
    assert_eq!(feed.title(), "Feed 12");
}
