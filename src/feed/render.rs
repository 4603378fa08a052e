use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::feed::model::Entry;
use crate::util::format_timestamp;

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";
const GENERATOR: &str = env!("CARGO_PKG_NAME");
const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Borrowed view of the fields that make up a rendered feed.
#[derive(Debug, Clone, Copy)]
pub struct FeedView<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub updated: Option<DateTime<Utc>>,
    pub author: Option<&'a str>,
    pub entries: &'a [Arc<Entry>],
}

/// Writes `view` as an Atom 1.0 document.
///
/// Absent optional fields are left out rather than written empty, so feeds
/// and entries carrying only an id still serialize. Text content is escaped
/// by the writer; summaries are emitted as `type="html"`.
///
/// Atom 1.0 requires `title` and `updated` on every entry and `updated` on
/// the feed, so output for entries or feeds missing them is well-formed XML
/// but not schema-valid Atom.
pub fn render_atom(view: &FeedView<'_>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("Failed to write XML declaration")?;

    let mut feed = BytesStart::new("feed");
    feed.push_attribute(("xmlns", ATOM_NAMESPACE));
    writer
        .write_event(Event::Start(feed))
        .context("Failed to write feed element")?;

    write_text(&mut writer, BytesStart::new("id"), view.id)?;
    write_text(&mut writer, BytesStart::new("title"), view.title)?;
    if let Some(updated) = view.updated {
        write_text(&mut writer, BytesStart::new("updated"), &format_timestamp(updated))?;
    }
    if let Some(author) = view.author {
        writer
            .write_event(Event::Start(BytesStart::new("author")))
            .context("Failed to write author element")?;
        write_text(&mut writer, BytesStart::new("name"), author)?;
        writer
            .write_event(Event::End(BytesEnd::new("author")))
            .context("Failed to write author end")?;
    }

    let mut generator = BytesStart::new("generator");
    generator.push_attribute(("version", GENERATOR_VERSION));
    write_text(&mut writer, generator, GENERATOR)?;

    for entry in view.entries {
        write_entry(&mut writer, entry)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("feed")))
        .context("Failed to write feed end")?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).context("Generated Atom contains invalid UTF-8")
}

fn write_entry(writer: &mut Writer<Cursor<Vec<u8>>>, entry: &Entry) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("entry")))
        .context("Failed to write entry element")?;

    if let Some(title) = &entry.title {
        write_text(writer, BytesStart::new("title"), title)?;
    }
    write_text(writer, BytesStart::new("id"), &entry.id)?;
    if let Some(updated) = entry.updated {
        write_text(writer, BytesStart::new("updated"), &format_timestamp(updated))?;
    }
    if let Some(href) = &entry.link {
        let mut link = BytesStart::new("link");
        link.push_attribute(("href", href.as_str()));
        writer
            .write_event(Event::Empty(link))
            .context("Failed to write link element")?;
    }
    if let Some(summary) = &entry.summary {
        let mut start = BytesStart::new("summary");
        start.push_attribute(("type", "html"));
        write_text(writer, start, summary)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("entry")))
        .context("Failed to write entry end")?;
    Ok(())
}

fn write_text(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    start: BytesStart<'_>,
    text: &str,
) -> Result<()> {
    let end = start.to_end().into_owned();
    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();

    writer
        .write_event(Event::Start(start))
        .with_context(|| format!("Failed to write {} element", name))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .with_context(|| format!("Failed to write {} text", name))?;
    writer
        .write_event(Event::End(end))
        .with_context(|| format!("Failed to write {} end", name))?;
    Ok(())
}
