// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::mime::mime_type_for;
use crate::declaration::{Channel, FeedContext, require};
use crate::error::FeedError;
use crate::reconcile::ResolvedEpisode;

/// Value of the channel's `generator` element
pub const GENERATOR: &str = concat!("podconverge ", env!("CARGO_PKG_VERSION"));

/// Namespace declarations on the root `rss` element, in document order
pub const NAMESPACES: [(&str, &str); 7] = [
    ("xmlns:content", "http://purl.org/rss/1.0/modules/content/"),
    ("xmlns:wfw", "http://wellformedweb.org/CommentAPI/"),
    ("xmlns:itunes", "http://www.itunes.com/dtds/podcast-1.0.dtd"),
    ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
    ("xmlns:media", "http://www.rssboard.org/media-rss"),
    ("xmlns:googleplay", "http://www.google.com/schemas/play-podcasts/1.0"),
    ("xmlns:atom", "http://www.w3.org/2005/Atom"),
];

/// Thin event writer keeping element bookkeeping out of the assembly code
struct FeedWriter {
    writer: Writer<Vec<u8>>,
}

impl FeedWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), FeedError> {
        self.writer
            .write_event(event)
            .map_err(|e| FeedError::Write(e.into()))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), FeedError> {
        let mut element = BytesStart::new(name);
        element.extend_attributes(attrs.iter().copied());
        self.event(Event::Start(element))
    }

    fn end(&mut self, name: &str) -> Result<(), FeedError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), FeedError> {
        let mut element = BytesStart::new(name);
        element.extend_attributes(attrs.iter().copied());
        self.event(Event::Empty(element))
    }

    fn text_with(&mut self, name: &str, attrs: &[(&str, &str)], value: &str) -> Result<(), FeedError> {
        self.start(name, attrs)?;
        self.event(Event::Text(BytesText::new(value)))?;
        self.end(name)
    }

    fn text(&mut self, name: &str, value: &str) -> Result<(), FeedError> {
        self.text_with(name, &[], value)
    }

    /// Write `value` as CDATA, splitting any `]]>` across sections
    fn cdata(&mut self, name: &str, value: &str) -> Result<(), FeedError> {
        self.start(name, &[])?;
        for section in cdata_sections(value) {
            self.event(Event::CData(BytesCData::new(section)))?;
        }
        self.end(name)
    }

    fn finish(self) -> Result<String, FeedError> {
        Ok(String::from_utf8(self.writer.into_inner())?)
    }
}

fn cdata_sections(value: &str) -> Vec<String> {
    let parts: Vec<&str> = value.split("]]>").collect();
    let last = parts.len() - 1;

    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let mut section = String::with_capacity(part.len() + 3);
            if i > 0 {
                section.push('>');
            }
            section.push_str(part);
            if i < last {
                section.push_str("]]");
            }
            section
        })
        .collect()
}

/// Line breaks in descriptions become `<br>` so clients render them
fn format_description(description: &str) -> String {
    description.replace("\r\n", "<br>").replace('\n', "<br>")
}

/// Serialize the channel and its publish-eligible episodes as an RSS 2.0 document
///
/// `episodes` holds every declared episode in declaration order. Items are
/// written only for eligible ones; `lastBuildDate` is written only when every
/// declared episode is eligible.
pub fn assemble_feed(
    channel: &Channel,
    episodes: &[ResolvedEpisode],
    context: &FeedContext,
) -> Result<String, FeedError> {
    check_required(channel, episodes, context)?;

    let mut w = FeedWriter::new();
    w.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root: Vec<(&str, &str)> = NAMESPACES.to_vec();
    root.push(("version", "2.0"));
    w.start("rss", &root)?;
    w.start("channel", &[])?;

    w.text("title", &channel.title)?;
    w.text("generator", GENERATOR)?;
    if let Some(last) = episodes.last()
        && episodes.iter().all(|e| e.publish_eligible)
    {
        w.text("lastBuildDate", &last.pub_date)?;
    }
    w.text("link", &channel.link)?;
    w.text("language", &channel.language)?;
    w.text("description", &channel.long_description)?;
    w.empty(
        "atom:link",
        &[
            ("href", context.feed_url.as_str()),
            ("rel", "self"),
            ("type", "application/rss+xml"),
        ],
    )?;

    if let Some(owner) = &channel.owner {
        w.start("itunes:owner", &[])?;
        w.text("itunes:name", &owner.name)?;
        w.text("itunes:email", &owner.email)?;
        w.end("itunes:owner")?;
    }

    w.text("itunes:subtitle", &channel.short_description)?;
    w.text("itunes:summary", &channel.long_description)?;
    w.text("itunes:type", &channel.show_type.to_string())?;
    w.text("itunes:explicit", &channel.explicit.to_string())?;
    if let Some(keywords) = &channel.keywords {
        w.text("itunes:keywords", keywords)?;
    }
    let image_url = context.image_url(&channel.image_path);
    w.empty("itunes:image", &[("href", image_url.as_str())])?;
    w.text("itunes:author", &channel.author)?;

    if let Some(category) = &channel.category {
        let attrs = [("text", category.name.as_str())];
        match &category.sub_category {
            Some(sub) => {
                w.start("itunes:category", &attrs)?;
                w.empty("itunes:category", &[("text", sub.as_str())])?;
                w.end("itunes:category")?;
            }
            None => w.empty("itunes:category", &attrs)?,
        }
    }

    for resolved in episodes.iter().filter(|e| e.publish_eligible) {
        write_item(&mut w, resolved, context)?;
    }

    w.end("channel")?;
    w.end("rss")?;
    w.finish()
}

fn write_item(
    w: &mut FeedWriter,
    resolved: &ResolvedEpisode,
    context: &FeedContext,
) -> Result<(), FeedError> {
    let episode = &resolved.episode;
    let description = format_description(&episode.description);
    let media_url = context.media_url(&episode.media_path);
    let mime_type = mime_type_for(&episode.media_path).unwrap_or_default();
    let length = episode.size_bytes.to_string();
    let image_url = context.image_url(&episode.image_path);

    w.start("item", &[])?;
    w.text("pubDate", &resolved.pub_date)?;
    w.text("itunes:title", &episode.title)?;
    w.text("title", &episode.title)?;
    w.cdata("description", &description)?;
    w.text("itunes:summary", &description)?;
    w.text("guid", &resolved.guid)?;
    w.empty(
        "enclosure",
        &[
            ("url", media_url.as_str()),
            ("type", mime_type),
            ("length", length.as_str()),
        ],
    )?;
    w.empty("itunes:image", &[("href", image_url.as_str())])?;
    w.cdata("content:encoded", &description)?;
    w.text("itunes:duration", episode.duration.as_deref().unwrap_or_default())?;

    w.start(
        "media:content",
        &[
            ("url", media_url.as_str()),
            ("type", mime_type),
            ("isDefault", "true"),
            ("medium", "audio"),
        ],
    )?;
    w.text_with("media:title", &[("type", "plain")], &episode.title)?;
    w.end("media:content")?;

    w.text("itunes:keywords", episode.keywords.as_deref().unwrap_or_default())?;
    w.text("itunes:episodeType", &episode.episode_type.to_string())?;
    w.text("itunes:episode", &episode.number.to_string())?;
    w.text("itunes:explicit", &episode.explicit.to_string())?;
    w.text("itunes:author", &episode.author)?;
    w.end("item")
}

fn check_required(
    channel: &Channel,
    episodes: &[ResolvedEpisode],
    context: &FeedContext,
) -> Result<(), FeedError> {
    require("channel.title", &channel.title)?;
    require("channel.link", &channel.link)?;
    require("channel.language", &channel.language)?;
    require("channel.long_description", &channel.long_description)?;
    require("channel.image_path", &channel.image_path)?;
    require("channel.author", &channel.author)?;
    require("s3.rss_url", &context.feed_url)?;
    require("s3.images_url", &context.images_url)?;
    require("s3.episodes_url", &context.episodes_url)?;

    for resolved in episodes.iter().filter(|e| e.publish_eligible) {
        let number = resolved.episode.number;
        require(&format!("episode {number} title"), &resolved.episode.title)?;
        require(&format!("episode {number} media_path"), &resolved.episode.media_path)?;
        require(&format!("episode {number} guid"), &resolved.guid)?;
    }

    Ok(())
}
