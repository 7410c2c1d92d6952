// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::error::{DeclarationError, ValidationError};

const DEFAULT_MEDIA_BASE_DIR: &str = "./episodes/";

/// The full declaration: channel, episodes and where they get published
#[derive(Debug, Clone, Deserialize)]
pub struct Declaration {
    /// Local directory holding the episode media files
    #[serde(default = "default_media_base_dir")]
    pub media_base_dir: PathBuf,
    #[serde(rename = "s3")]
    pub storage: StorageConfig,
    #[serde(rename = "cloudfront", default)]
    pub cdn: Option<CdnConfig>,
    pub channel: ChannelDeclaration,
}

/// Bucket and the public URLs it is served from
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    /// Public URL of the feed itself, used for the `atom:link` self reference
    pub rss_url: String,
    /// Base URL that channel and episode image paths are appended to
    pub images_url: String,
    /// Base URL that episode media paths are appended to
    pub episodes_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CdnConfig {
    pub distribution_id: Option<String>,
}

/// Channel-level metadata as declared
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelDeclaration {
    pub title: String,
    pub link: String,
    pub language: String,
    #[serde(default)]
    pub explicit: Option<Explicit>,
    #[serde(rename = "type", default)]
    pub show_type: ShowType,
    pub author: String,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_email: Option<String>,
    pub long_description: String,
    pub short_description: String,
    pub image_path: String,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub episodes: Vec<EpisodeDeclaration>,
}

/// A single episode as declared; unset fields inherit from the channel
#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeDeclaration {
    pub number: u32,
    pub title: String,
    pub pubdate: String,
    pub media_path: String,
    pub description: String,
    #[serde(default)]
    pub episode_type: EpisodeType,
    #[serde(default)]
    pub explicit: Option<Explicit>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

/// The `itunes:explicit` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Explicit {
    #[serde(alias = "true")]
    Yes,
    #[default]
    #[serde(alias = "false")]
    No,
    Clean,
}

impl fmt::Display for Explicit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Explicit::Yes => "yes",
            Explicit::No => "no",
            Explicit::Clean => "clean",
        })
    }
}

/// The `itunes:type` of the show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowType {
    #[default]
    Episodic,
    Serial,
}

impl fmt::Display for ShowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShowType::Episodic => "episodic",
            ShowType::Serial => "serial",
        })
    }
}

/// The `itunes:episodeType` of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeType {
    #[default]
    Full,
    Trailer,
    Bonus,
}

impl fmt::Display for EpisodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EpisodeType::Full => "full",
            EpisodeType::Trailer => "trailer",
            EpisodeType::Bonus => "bonus",
        })
    }
}

fn default_media_base_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MEDIA_BASE_DIR)
}

impl Declaration {
    /// Parse a declaration from JSON text
    pub fn from_json(json: &str, source: &Path) -> Result<Self, DeclarationError> {
        serde_json::from_str(json).map_err(|e| DeclarationError::ParseFailed {
            path: source.to_path_buf(),
            source: e,
        })
    }

    /// Check required fields and URLs
    ///
    /// Runs before anything touches the filesystem or the network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let channel = &self.channel;
        require("s3.bucket", &self.storage.bucket)?;
        require("channel.title", &channel.title)?;
        require("channel.link", &channel.link)?;
        require("channel.language", &channel.language)?;
        require("channel.author", &channel.author)?;
        require("channel.long_description", &channel.long_description)?;
        require("channel.short_description", &channel.short_description)?;
        require("channel.image_path", &channel.image_path)?;

        require_url("s3.rss_url", &self.storage.rss_url)?;
        require_url("s3.images_url", &self.storage.images_url)?;
        require_url("s3.episodes_url", &self.storage.episodes_url)?;

        for episode in &channel.episodes {
            let prefix = format!("channel.episodes[{}]", episode.number);
            require(&format!("{prefix}.title"), &episode.title)?;
            require(&format!("{prefix}.pubdate"), &episode.pubdate)?;
            require(&format!("{prefix}.media_path"), &episode.media_path)?;
            require(&format!("{prefix}.description"), &episode.description)?;
        }

        Ok(())
    }

    /// The CDN distribution to invalidate after publishing, if configured
    pub fn distribution_id(&self) -> Option<&str> {
        self.cdn
            .as_ref()
            .and_then(|cdn| cdn.distribution_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

/// Load and parse a declaration file
pub fn load_declaration(path: &Path) -> Result<Declaration, DeclarationError> {
    let content = std::fs::read_to_string(path).map_err(|e| DeclarationError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    Declaration::from_json(&content, path)
}

pub(crate) fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn require_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require(field, value)?;
    Url::parse(value).map_err(|e| ValidationError::InvalidUrl { field, source: e })?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_DECLARATION: &str = r#"{
  "s3": {
    "bucket": "my-podcast",
    "rss_url": "https://cdn.example.com/feed",
    "images_url": "https://cdn.example.com/images/",
    "episodes_url": "https://cdn.example.com/episodes/"
  },
  "cloudfront": { "distribution_id": "E2ABCDEF" },
  "channel": {
    "title": "Test Podcast",
    "link": "https://example.com",
    "language": "en-us",
    "author": "Test Author",
    "owner_name": "Owner",
    "owner_email": "owner@example.com",
    "long_description": "A long description",
    "short_description": "Short",
    "image_path": "cover.jpg",
    "category": "Technology",
    "sub_category": "Podcasting",
    "episodes": [
      {
        "number": 1,
        "title": "First",
        "pubdate": "2024-01-15T12:00:00Z",
        "media_path": "first.mp3",
        "description": "The first one"
      },
      {
        "number": 2,
        "title": "Second",
        "pubdate": "2024-02-15T12:00:00Z",
        "media_path": "second.wav",
        "description": "The second one",
        "episode_type": "bonus",
        "explicit": "yes",
        "author": "Guest"
      }
    ]
  }
}"#;

    fn sample() -> Declaration {
        Declaration::from_json(SAMPLE_DECLARATION, Path::new("test.json")).unwrap()
    }

    #[test]
    fn parses_declaration_with_defaults() {
        let declaration = sample();

        assert_eq!(declaration.media_base_dir, PathBuf::from("./episodes/"));
        assert_eq!(declaration.storage.bucket, "my-podcast");
        assert_eq!(declaration.channel.show_type, ShowType::Episodic);
        assert_eq!(declaration.channel.explicit, None);
        assert_eq!(declaration.channel.episodes.len(), 2);

        let first = &declaration.channel.episodes[0];
        assert_eq!(first.episode_type, EpisodeType::Full);
        assert_eq!(first.explicit, None);

        let second = &declaration.channel.episodes[1];
        assert_eq!(second.episode_type, EpisodeType::Bonus);
        assert_eq!(second.explicit, Some(Explicit::Yes));
        assert_eq!(second.author.as_deref(), Some("Guest"));
    }

    #[test]
    fn sample_is_valid() {
        sample().validate().unwrap();
    }

    #[test]
    fn distribution_id_is_exposed() {
        assert_eq!(sample().distribution_id(), Some("E2ABCDEF"));

        let mut declaration = sample();
        declaration.cdn = None;
        assert_eq!(declaration.distribution_id(), None);
    }

    #[test]
    fn explicit_accepts_boolean_words() {
        let value: Explicit = serde_json::from_str("\"true\"").unwrap();
        assert_eq!(value, Explicit::Yes);
        let value: Explicit = serde_json::from_str("\"false\"").unwrap();
        assert_eq!(value, Explicit::No);
        assert_eq!(Explicit::Clean.to_string(), "clean");
    }

    #[test]
    fn missing_required_field_fails_to_parse() {
        let json = SAMPLE_DECLARATION.replace("\"title\": \"Test Podcast\",", "");
        let result = Declaration::from_json(&json, Path::new("broken.json"));
        assert!(matches!(result, Err(DeclarationError::ParseFailed { .. })));
    }

    #[test]
    fn empty_required_field_is_rejected() {
        let mut declaration = sample();
        declaration.channel.link = "  ".to_string();

        match declaration.validate().unwrap_err() {
            ValidationError::MissingField { field } => assert_eq!(field, "channel.link"),
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let mut declaration = sample();
        declaration.storage.episodes_url = "episodes/".to_string();

        assert!(matches!(
            declaration.validate(),
            Err(ValidationError::InvalidUrl {
                field: "s3.episodes_url",
                ..
            })
        ));
    }

    #[test]
    fn load_nonexistent_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_declaration(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(DeclarationError::ReadFailed { .. })));
    }
}
