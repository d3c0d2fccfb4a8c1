use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use serde::Serialize;

/// Date layout shown on the landing page (`DD/MM/YYYY`).
const PUBLISHED_FORMAT: &str = "%d/%m/%Y";

/// A blog post as shown on the landing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// HTML from the feed; templates render it unescaped.
    pub description: String,
    /// First `media:content` URL, empty when the entry has none
    pub image_url: String,
    /// Publish date as `DD/MM/YYYY`, empty when the entry has none
    pub published: String,
}

/// Parse RSS/Atom bytes and keep the first `limit` entries in document order.
pub fn parse_items(bytes: &[u8], limit: usize) -> Result<Vec<FeedItem>, parser::ParseFeedError> {
    let feed = parser::parse(bytes)?;

    Ok(feed
        .entries
        .into_iter()
        .take(limit)
        .map(into_item)
        .collect())
}

fn into_item(entry: Entry) -> FeedItem {
    let image_url = media_image(&entry).unwrap_or_default();
    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();
    let published = format_published(entry.published.or(entry.updated));
    let description = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();
    let title = entry.title.map(|t| t.content).unwrap_or_default();

    FeedItem {
        title,
        link,
        description,
        image_url,
        published,
    }
}

fn media_image(entry: &Entry) -> Option<String> {
    entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref())
        .map(|u| u.to_string())
}

/// Format a publish date for display. Dates are rendered in UTC.
pub fn format_published(published: Option<DateTime<Utc>>) -> String {
    published
        .map(|dt| dt.format(PUBLISHED_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn rss_with_items(count: usize) -> String {
        let items: String = (1..=count)
            .map(|i| {
                format!(
                    r#"<item>
    <title>Post {i}</title>
    <link>https://blog.example.com/post-{i}/</link>
    <description><![CDATA[<p>Body {i}</p>]]></description>
    <pubDate>0{i} Jan 2006 15:04:05 GMT</pubDate>
    <media:content url="https://blog.example.com/img/{i}.png" medium="image"/>
</item>"#
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
<channel>
<title>Blog</title>
<link>https://blog.example.com/</link>
<description>Test</description>
{items}
</channel>
</rss>"#
        )
    }

    #[test]
    fn test_five_items_yield_first_three_in_order() {
        let items = parse_items(rss_with_items(5).as_bytes(), 3).unwrap();

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Post 1", "Post 2", "Post 3"]);
        assert_eq!(items[0].link, "https://blog.example.com/post-1/");
        assert_eq!(items[1].published, "02/01/2006");
    }

    #[test]
    fn test_description_keeps_html() {
        let items = parse_items(rss_with_items(1).as_bytes(), 3).unwrap();
        assert_eq!(items[0].description, "<p>Body 1</p>");
    }

    #[test]
    fn test_media_content_becomes_image_url() {
        let items = parse_items(rss_with_items(2).as_bytes(), 3).unwrap();
        assert_eq!(items[1].image_url, "https://blog.example.com/img/2.png");
    }

    #[test]
    fn test_fewer_items_than_limit() {
        let items = parse_items(rss_with_items(2).as_bytes(), 3).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_item_without_media_or_date() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title>
    <item><title>Bare</title><link>https://example.com/bare</link></item>
</channel></rss>"#;

        let items = parse_items(rss.as_bytes(), 3).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].image_url, "");
        assert_eq!(items[0].published, "");
        assert_eq!(items[0].description, "");
    }

    #[test]
    fn test_rfc1123_with_zone_abbreviation() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title>
    <item><title>Go</title><pubDate>Mon, 02 Jan 2006 15:04:05 MST</pubDate></item>
</channel></rss>"#;

        let items = parse_items(rss.as_bytes(), 3).unwrap();
        assert_eq!(items[0].published, "02/01/2006");
    }

    #[test]
    fn test_atom_feed() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom</title>
  <id>urn:uuid:feed</id>
  <updated>2024-03-05T10:00:00Z</updated>
  <entry>
    <title>Entry</title>
    <id>urn:uuid:1</id>
    <link href="https://example.com/entry"/>
    <updated>2024-03-05T10:00:00Z</updated>
    <summary>Short</summary>
  </entry>
</feed>"#;

        let items = parse_items(atom.as_bytes(), 3).unwrap();
        assert_eq!(items[0].link, "https://example.com/entry");
        assert_eq!(items[0].published, "05/03/2024");
        assert_eq!(items[0].description, "Short");
    }

    #[test]
    fn test_malformed_feed_is_error() {
        assert!(parse_items(b"<not valid xml", 3).is_err());
    }

    #[test]
    fn test_format_published() {
        let dt = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(format_published(Some(dt)), "31/12/2023");
        assert_eq!(format_published(None), "");
    }

    proptest! {
        #[test]
        fn prop_never_more_than_limit(count in 0usize..8, limit in 1usize..6) {
            let items = parse_items(rss_with_items(count).as_bytes(), limit).unwrap();
            prop_assert_eq!(items.len(), count.min(limit));
        }
    }
}
