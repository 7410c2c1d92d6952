// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset};
use url::Url;

use crate::error::FeedError;

/// A feed document as a podcast client would read it
#[derive(Debug, Clone)]
pub struct PublishedFeed {
    pub title: String,
    pub last_build_date: Option<String>,
    pub items: Vec<PublishedItem>,
}

/// A single item of a published feed
#[derive(Debug, Clone)]
pub struct PublishedItem {
    pub title: String,
    pub description: Option<String>,
    pub pub_date: Option<DateTime<FixedOffset>>,
    pub guid: Option<String>,
    pub enclosure: Option<Enclosure>,
    pub duration: Option<String>,
    pub episode_number: Option<u32>,
}

/// The media file attached to an item
#[derive(Debug, Clone)]
pub struct Enclosure {
    pub url: Url,
    pub length: Option<u64>,
    pub mime_type: Option<String>,
}

/// Parse RSS feed XML bytes, keeping item order
pub fn parse_feed(xml_bytes: &[u8]) -> Result<PublishedFeed, FeedError> {
    let channel = rss::Channel::read_from(xml_bytes)?;

    let items = channel
        .items()
        .iter()
        .map(parse_item)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PublishedFeed {
        title: channel.title().to_string(),
        last_build_date: channel.last_build_date().map(String::from),
        items,
    })
}

/// Re-read a freshly assembled document and check it carries `expected_items` items
///
/// Catches documents a client would reject before anything is written or uploaded.
pub fn verify_feed(xml: &str, expected_items: usize) -> Result<PublishedFeed, FeedError> {
    let feed = parse_feed(xml.as_bytes())?;

    if feed.items.len() != expected_items {
        return Err(FeedError::ItemCountMismatch {
            expected: expected_items,
            found: feed.items.len(),
        });
    }

    Ok(feed)
}

fn parse_item(item: &rss::Item) -> Result<PublishedItem, FeedError> {
    let enclosure = item
        .enclosure()
        .map(|enclosure| -> Result<Enclosure, FeedError> {
            Ok(Enclosure {
                url: Url::parse(enclosure.url())?,
                length: enclosure.length().parse().ok(),
                mime_type: Some(enclosure.mime_type().to_string()).filter(|s| !s.is_empty()),
            })
        })
        .transpose()?;

    let itunes = item.itunes_ext();

    Ok(PublishedItem {
        title: item.title().map(String::from).unwrap_or_default(),
        description: item.description().map(String::from),
        pub_date: item
            .pub_date()
            .and_then(|date| DateTime::parse_from_rfc2822(date).ok()),
        guid: item.guid().map(|g| g.value().to_string()),
        enclosure,
        duration: itunes.and_then(|ext| ext.duration().map(String::from)),
        episode_number: itunes.and_then(|ext| ext.episode().and_then(|e| e.parse().ok())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>Test Podcast</title>
    <description>A test podcast for unit testing</description>
    <link>https://example.com</link>
    <lastBuildDate>Mon, 01 Jan 2024 12:00:00 +0000</lastBuildDate>
    <item>
      <title>Episode 1</title>
      <description><![CDATA[First<br>episode]]></description>
      <pubDate>Mon, 01 Jan 2024 12:00:00 +0000</pubDate>
      <guid>e1_2024-01-01T12-00-00Z</guid>
      <enclosure url="https://example.com/ep1.mp3" length="1234567" type="audio/mpeg"/>
      <itunes:duration>30:00</itunes:duration>
      <itunes:episode>1</itunes:episode>
    </item>
    <item>
      <title>Episode 2</title>
      <enclosure url="https://example.com/ep2.ogg" length="" type=""/>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parse_feed_extracts_items_in_order() {
        let feed = parse_feed(SAMPLE_FEED.as_bytes()).unwrap();

        assert_eq!(feed.title, "Test Podcast");
        assert_eq!(
            feed.last_build_date.as_deref(),
            Some("Mon, 01 Jan 2024 12:00:00 +0000")
        );
        assert_eq!(feed.items.len(), 2);

        let ep1 = &feed.items[0];
        assert_eq!(ep1.title, "Episode 1");
        assert_eq!(ep1.description.as_deref(), Some("First<br>episode"));
        assert_eq!(ep1.guid.as_deref(), Some("e1_2024-01-01T12-00-00Z"));
        assert!(ep1.pub_date.is_some());
        assert_eq!(ep1.duration.as_deref(), Some("30:00"));
        assert_eq!(ep1.episode_number, Some(1));
        let enclosure = ep1.enclosure.as_ref().unwrap();
        assert_eq!(enclosure.length, Some(1234567));
        assert_eq!(enclosure.mime_type.as_deref(), Some("audio/mpeg"));
    }

    #[test]
    fn empty_enclosure_attributes_become_none() {
        let feed = parse_feed(SAMPLE_FEED.as_bytes()).unwrap();
        let enclosure = feed.items[1].enclosure.as_ref().unwrap();

        assert_eq!(enclosure.length, None);
        assert_eq!(enclosure.mime_type, None);
        assert!(feed.items[1].guid.is_none());
    }

    #[test]
    fn verify_checks_item_count() {
        assert!(verify_feed(SAMPLE_FEED, 2).is_ok());

        match verify_feed(SAMPLE_FEED, 3).unwrap_err() {
            FeedError::ItemCountMismatch { expected, found } => {
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("Expected ItemCountMismatch, got {other:?}"),
        }
    }

    #[test]
    fn malformed_xml_is_rejected() {
        let result = parse_feed(b"<rss><channel><title>x</title>");
        assert!(result.is_err());
    }
}
