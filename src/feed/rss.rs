//! RSS 2.0 (and RSS 1.0 / RDF) documents via the [`rss`] crate.
//!
//! ## Field mapping
//!
//! | entry field | RSS source                                         |
//! |-------------|----------------------------------------------------|
//! | title       | `<title>`, cleaned                                 |
//! | link        | `<link>`                                           |
//! | content     | `<content:encoded>`, else an HTML `<description>`  |
//! | summary     | `<description>` with tags stripped                 |
//! | published   | `<pubDate>`, else the first `<dc:date>`            |

use super::{keep_valid, resolve_body, EntryStamp, FeedEntry, Skip};
use crate::error::FeedError;

pub(super) fn parse(bytes: &[u8], stamp: &EntryStamp) -> Result<Vec<FeedEntry>, FeedError> {
    let channel = ::rss::Channel::read_from(bytes)?;
    Ok(parse_channel(&channel, stamp))
}

/// Convert an already-read channel.  No I/O, so tests can drive it directly.
pub(super) fn parse_channel(channel: &::rss::Channel, stamp: &EntryStamp) -> Vec<FeedEntry> {
    keep_valid(
        &stamp.source_name,
        channel.items().iter().map(|item| convert_item(item, stamp)),
    )
}

fn convert_item(item: &::rss::Item, stamp: &EntryStamp) -> Result<FeedEntry, Skip> {
    let published = item
        .pub_date()
        .map(String::from)
        .or_else(|| {
            item.dublin_core_ext()
                .and_then(|dc| dc.dates().first().cloned())
        });

    stamp.entry(
        item.title(),
        item.link(),
        resolve_body(item.content(), item.description()),
        published,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::tests::test_source;

    fn parse_str(xml: &str) -> Vec<FeedEntry> {
        parse(xml.as_bytes(), &EntryStamp::new(&test_source())).unwrap()
    }

    #[test]
    fn parse_channel_extracts_items() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <item>
      <title>First Post</title>
      <link>https://example.com/1</link>
      <guid>guid-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
      <description>First description</description>
    </item>
    <item>
      <title>Second Post</title>
      <link>https://example.com/2</link>
      <pubDate>Tue, 02 Jan 2024 12:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

        let items = parse_str(xml);
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "First Post");
        assert_eq!(items[0].link, "https://example.com/1");
        assert_eq!(items[0].summary.as_deref(), Some("First description"));
        assert!(items[0].content.is_none());
        assert_eq!(items[0].source_name, "TestFeed");
        assert_eq!(items[0].category, "tech");
        assert_eq!(
            items[0].published.as_deref(),
            Some("Mon, 01 Jan 2024 00:00:00 +0000")
        );

        assert_eq!(items[1].title, "Second Post");
        assert!(items[1].summary.is_none());
    }

    #[test]
    fn decorated_title_is_cleaned() {
        let xml = r#"<rss version="2.0"><channel><title>t</title>
    <item>
      <title>[Source] Mon, 01 Jan 2024 12:00:00 GMT: Big News</title>
      <link>http://a/1</link>
      <pubDate>Mon, 01 Jan 2024 12:00:00 GMT</pubDate>
    </item>
</channel></rss>"#;

        let items = parse_str(xml);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Big News");
        assert_eq!(items[0].link, "http://a/1");
    }

    #[test]
    fn items_without_title_or_link_are_skipped() {
        let xml = r#"<rss version="2.0"><channel><title>t</title>
    <item><guid>g1</guid><link>http://a/no-title</link></item>
    <item><title>No link</title></item>
    <item><title>Kept</title><link>http://a/kept</link></item>
</channel></rss>"#;

        let items = parse_str(xml);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Kept");
    }

    #[test]
    fn content_encoded_wins_over_description() {
        let xml = r#"<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel><title>t</title>
    <item>
      <title>Full</title>
      <link>http://a/full</link>
      <description><![CDATA[<p>Teaser &amp; more</p>]]></description>
      <content:encoded><![CDATA[<div><p>The whole story</p></div>]]></content:encoded>
    </item>
</channel></rss>"#;

        let items = parse_str(xml);
        assert_eq!(
            items[0].content.as_deref(),
            Some("<div><p>The whole story</p></div>")
        );
        assert_eq!(items[0].summary.as_deref(), Some("Teaser & more"));
    }

    #[test]
    fn html_description_becomes_content() {
        let xml = r#"<rss version="2.0"><channel><title>t</title>
    <item>
      <title>Html</title>
      <link>http://a/html</link>
      <description><![CDATA[<p>Hello <b>there</b></p>]]></description>
    </item>
</channel></rss>"#;

        let items = parse_str(xml);
        assert_eq!(items[0].content.as_deref(), Some("<p>Hello <b>there</b></p>"));
        assert_eq!(items[0].summary.as_deref(), Some("Hello there"));
    }

    #[test]
    fn falls_back_to_dublin_core_date() {
        let xml = r#"<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
<channel><title>t</title>
    <item>
      <title>DC</title>
      <link>http://a/dc</link>
      <dc:date>2024-02-03T04:05:06Z</dc:date>
    </item>
</channel></rss>"#;

        let items = parse_str(xml);
        assert_eq!(items[0].published.as_deref(), Some("2024-02-03T04:05:06Z"));
    }

    #[test]
    fn invalid_date_is_passed_through_raw() {
        let xml = r#"<rss version="2.0"><channel><title>t</title>
    <item>
      <title>Bad Date</title>
      <link>http://a/bad</link>
      <pubDate>not-a-real-date</pubDate>
    </item>
</channel></rss>"#;

        let items = parse_str(xml);
        assert_eq!(items[0].published.as_deref(), Some("not-a-real-date"));
    }

    #[test]
    fn malformed_document_is_an_error() {
        let stamp = EntryStamp::new(&test_source());
        assert!(parse(b"<rss><channel><item>", &stamp).is_err());
    }
}
