// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::channel::{Declaration, EpisodeDeclaration, EpisodeType, Explicit, ShowType};
use super::timestamp::PublishTimestamp;
use crate::error::{MediaError, PublishError, ValidationError};
use crate::storage::episode_object_key;

/// `itunes:owner`, only present when both parts are declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub name: String,
    pub email: String,
}

/// `itunes:category` with its optional nested sub-category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub sub_category: Option<String>,
}

/// Channel metadata with defaults applied
#[derive(Debug, Clone)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub language: String,
    pub explicit: Explicit,
    pub show_type: ShowType,
    pub author: String,
    pub owner: Option<Owner>,
    pub long_description: String,
    pub short_description: String,
    pub image_path: String,
    pub keywords: Option<String>,
    pub category: Option<Category>,
}

/// An episode with every inheritable field filled in and its media measured
#[derive(Debug, Clone)]
pub struct NormalizedEpisode {
    pub number: u32,
    pub title: String,
    pub pubdate: PublishTimestamp,
    pub media_path: String,
    pub description: String,
    pub episode_type: EpisodeType,
    pub explicit: Explicit,
    pub author: String,
    pub keywords: Option<String>,
    pub image_path: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub duration: Option<String>,
    pub size_bytes: u64,
}

/// The public URLs feed assembly needs, passed explicitly instead of living in global state
#[derive(Debug, Clone)]
pub struct FeedContext {
    pub feed_url: String,
    pub images_url: String,
    pub episodes_url: String,
}

impl FeedContext {
    pub fn image_url(&self, image_path: &str) -> String {
        format!("{}{}", self.images_url, image_path)
    }

    pub fn media_url(&self, media_path: &str) -> String {
        format!("{}{}", self.episodes_url, media_path)
    }
}

/// Output of normalization: everything reconciliation and assembly need
#[derive(Debug, Clone)]
pub struct Normalized {
    pub channel: Channel,
    pub episodes: Vec<NormalizedEpisode>,
    pub context: FeedContext,
    pub media_base_dir: PathBuf,
}

impl NormalizedEpisode {
    /// Location of the media file on disk
    pub fn media_file(&self, media_base_dir: &Path) -> PathBuf {
        media_base_dir.join(&self.media_path)
    }

    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        self.pubdate.is_published_at(now)
    }
}

/// Validate the declaration and turn it into normalized channel and episodes
///
/// Validation (required fields, timestamps, uniqueness) completes before any
/// media file is read, so a bad declaration never touches the disk.
pub fn normalize(declaration: &Declaration) -> Result<Normalized, PublishError> {
    declaration.validate()?;

    let declared = &declaration.channel;
    check_unique(&declared.episodes)?;

    let timestamps = declared
        .episodes
        .iter()
        .map(|e| {
            PublishTimestamp::parse(&e.pubdate).map_err(|source| {
                ValidationError::InvalidTimestamp {
                    number: e.number,
                    value: e.pubdate.clone(),
                    source,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    ensure_unique(
        "pubdate",
        timestamps.iter().map(|t| (t.at(), t.raw().to_string())),
    )?;

    let channel = Channel {
        title: declared.title.clone(),
        link: declared.link.clone(),
        language: declared.language.clone(),
        explicit: declared.explicit.unwrap_or_default(),
        show_type: declared.show_type,
        author: declared.author.clone(),
        owner: match (&declared.owner_name, &declared.owner_email) {
            (Some(name), Some(email)) => Some(Owner {
                name: name.clone(),
                email: email.clone(),
            }),
            _ => None,
        },
        long_description: declared.long_description.clone(),
        short_description: declared.short_description.clone(),
        image_path: declared.image_path.clone(),
        keywords: declared.keywords.clone(),
        category: declared.category.clone().map(|name| Category {
            name,
            sub_category: declared.sub_category.clone(),
        }),
    };

    let mut episodes = Vec::with_capacity(declared.episodes.len());
    for (episode, pubdate) in declared.episodes.iter().zip(timestamps) {
        let size_bytes = media_size(&declaration.media_base_dir.join(&episode.media_path))?;
        episodes.push(inherit(&channel, episode, pubdate, size_bytes));
    }

    Ok(Normalized {
        channel,
        episodes,
        context: FeedContext {
            feed_url: declaration.storage.rss_url.clone(),
            images_url: declaration.storage.images_url.clone(),
            episodes_url: declaration.storage.episodes_url.clone(),
        },
        media_base_dir: declaration.media_base_dir.clone(),
    })
}

/// Reject declarations reusing a number, title, pubdate or storage key
///
/// An already published episode must never be changed to make room for a new
/// one; the new one has to pick different values. Media is stored by file name
/// alone, so two media paths ending in the same file name would overwrite each
/// other.
pub fn check_unique(episodes: &[EpisodeDeclaration]) -> Result<(), ValidationError> {
    ensure_unique("number", episodes.iter().map(|e| (e.number, e.number.to_string())))?;
    ensure_unique("title", episodes.iter().map(|e| (e.title.clone(), e.title.clone())))?;
    ensure_unique(
        "pubdate",
        episodes.iter().map(|e| (e.pubdate.clone(), e.pubdate.clone())),
    )?;
    ensure_unique(
        "media_path",
        episodes.iter().map(|e| {
            let key = episode_object_key(Path::new(&e.media_path));
            (key.clone(), key)
        }),
    )?;
    Ok(())
}

fn ensure_unique<K, I>(field: &'static str, values: I) -> Result<(), ValidationError>
where
    K: Eq + Hash,
    I: IntoIterator<Item = (K, String)>,
{
    let mut seen = HashSet::new();
    for (key, display) in values {
        if !seen.insert(key) {
            return Err(ValidationError::Duplicate {
                field,
                value: display,
            });
        }
    }
    Ok(())
}

fn inherit(
    channel: &Channel,
    episode: &EpisodeDeclaration,
    pubdate: PublishTimestamp,
    size_bytes: u64,
) -> NormalizedEpisode {
    let category = channel.category.as_ref();

    NormalizedEpisode {
        number: episode.number,
        title: episode.title.clone(),
        pubdate,
        media_path: episode.media_path.clone(),
        description: episode.description.clone(),
        episode_type: episode.episode_type,
        explicit: episode.explicit.unwrap_or(channel.explicit),
        author: episode
            .author
            .clone()
            .unwrap_or_else(|| channel.author.clone()),
        keywords: episode.keywords.clone().or_else(|| channel.keywords.clone()),
        image_path: episode
            .image_path
            .clone()
            .unwrap_or_else(|| channel.image_path.clone()),
        category: episode
            .category
            .clone()
            .or_else(|| category.map(|c| c.name.clone())),
        sub_category: episode
            .sub_category
            .clone()
            .or_else(|| category.and_then(|c| c.sub_category.clone())),
        duration: episode.duration.clone(),
        size_bytes,
    }
}

fn media_size(path: &Path) -> Result<u64, MediaError> {
    std::fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|e| MediaError::SizeUnavailable {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::channel::tests::SAMPLE_DECLARATION;
    use crate::error::TimestampError;
    use tempfile::{TempDir, tempdir};

    fn declaration_with_media() -> (TempDir, Declaration) {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("first.mp3"), b"first audio").unwrap();
        std::fs::write(dir.path().join("second.wav"), b"second audio!").unwrap();

        let mut declaration =
            Declaration::from_json(SAMPLE_DECLARATION, Path::new("test.json")).unwrap();
        declaration.media_base_dir = dir.path().to_path_buf();
        (dir, declaration)
    }

    #[test]
    fn inherits_channel_defaults() {
        let (_dir, declaration) = declaration_with_media();
        let normalized = normalize(&declaration).unwrap();

        let first = &normalized.episodes[0];
        assert_eq!(first.author, "Test Author");
        assert_eq!(first.image_path, "cover.jpg");
        assert_eq!(first.category.as_deref(), Some("Technology"));
        assert_eq!(first.sub_category.as_deref(), Some("Podcasting"));
        assert_eq!(first.explicit, Explicit::No);
        assert_eq!(first.size_bytes, 11);
    }

    #[test]
    fn episode_values_override_channel() {
        let (_dir, declaration) = declaration_with_media();
        let normalized = normalize(&declaration).unwrap();

        let second = &normalized.episodes[1];
        assert_eq!(second.author, "Guest");
        assert_eq!(second.explicit, Explicit::Yes);
        assert_eq!(second.episode_type, EpisodeType::Bonus);
        assert_eq!(second.size_bytes, 13);
    }

    #[test]
    fn channel_explicit_is_inherited_when_declared() {
        let (_dir, mut declaration) = declaration_with_media();
        declaration.channel.explicit = Some(Explicit::Clean);
        let normalized = normalize(&declaration).unwrap();

        assert_eq!(normalized.channel.explicit, Explicit::Clean);
        assert_eq!(normalized.episodes[0].explicit, Explicit::Clean);
        assert_eq!(normalized.episodes[1].explicit, Explicit::Yes);
    }

    #[test]
    fn owner_requires_name_and_email() {
        let (_dir, mut declaration) = declaration_with_media();
        assert!(normalize(&declaration).unwrap().channel.owner.is_some());

        declaration.channel.owner_email = None;
        assert!(normalize(&declaration).unwrap().channel.owner.is_none());
    }

    #[test]
    fn rejects_duplicate_numbers() {
        let (_dir, mut declaration) = declaration_with_media();
        declaration.channel.episodes[1].number = 1;

        match normalize(&declaration).unwrap_err() {
            PublishError::Validation(ValidationError::Duplicate { field, value }) => {
                assert_eq!(field, "number");
                assert_eq!(value, "1");
            }
            other => panic!("Expected duplicate number, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_titles() {
        let (_dir, mut declaration) = declaration_with_media();
        declaration.channel.episodes[1].title = "First".to_string();

        assert!(matches!(
            normalize(&declaration),
            Err(PublishError::Validation(ValidationError::Duplicate {
                field: "title",
                ..
            }))
        ));
    }

    #[test]
    fn rejects_duplicate_pubdates_even_when_written_differently() {
        let (_dir, mut declaration) = declaration_with_media();
        declaration.channel.episodes[1].pubdate = "2024-01-15 12:00:00 +0000".to_string();

        assert!(matches!(
            normalize(&declaration),
            Err(PublishError::Validation(ValidationError::Duplicate {
                field: "pubdate",
                ..
            }))
        ));
    }

    #[test]
    fn rejects_unparseable_pubdate() {
        let (_dir, mut declaration) = declaration_with_media();
        declaration.channel.episodes[0].pubdate = "soon".to_string();

        assert!(matches!(
            normalize(&declaration),
            Err(PublishError::Validation(ValidationError::InvalidTimestamp {
                number: 1,
                source: TimestampError::Unrecognized { .. },
                ..
            }))
        ));
    }

    #[test]
    fn rejects_media_paths_sharing_a_file_name() {
        let (dir, mut declaration) = declaration_with_media();
        for sub in ["a", "b"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
            std::fs::write(dir.path().join(sub).join("ep.mp3"), sub).unwrap();
        }
        declaration.channel.episodes[0].media_path = "a/ep.mp3".to_string();
        declaration.channel.episodes[1].media_path = "b/ep.mp3".to_string();

        match normalize(&declaration) {
            Err(PublishError::Validation(ValidationError::Duplicate { field, value })) => {
                assert_eq!(field, "media_path");
                assert_eq!(value, "episodes/ep.mp3");
            }
            other => panic!("Expected duplicate media_path, got {other:?}"),
        }
    }

    #[test]
    fn media_in_different_directories_with_distinct_names_is_accepted() {
        let (dir, mut declaration) = declaration_with_media();
        std::fs::create_dir_all(dir.path().join("2024")).unwrap();
        std::fs::rename(dir.path().join("first.mp3"), dir.path().join("2024/first.mp3")).unwrap();
        declaration.channel.episodes[0].media_path = "2024/first.mp3".to_string();

        assert!(normalize(&declaration).is_ok());
    }

    #[test]
    fn missing_media_is_fatal() {
        let (dir, declaration) = declaration_with_media();
        std::fs::remove_file(dir.path().join("second.wav")).unwrap();

        match normalize(&declaration).unwrap_err() {
            PublishError::Media(MediaError::SizeUnavailable { path, .. }) => {
                assert_eq!(path, dir.path().join("second.wav"));
            }
            other => panic!("Expected media error, got {other:?}"),
        }
    }

    #[test]
    fn validation_runs_before_media_is_read() {
        let (dir, mut declaration) = declaration_with_media();
        std::fs::remove_file(dir.path().join("first.mp3")).unwrap();
        declaration.channel.episodes[1].title = "First".to_string();

        assert!(matches!(
            normalize(&declaration),
            Err(PublishError::Validation(_))
        ));
    }

    #[test]
    fn context_joins_base_urls() {
        let (_dir, declaration) = declaration_with_media();
        let context = normalize(&declaration).unwrap().context;

        assert_eq!(
            context.media_url("first.mp3"),
            "https://cdn.example.com/episodes/first.mp3"
        );
        assert_eq!(
            context.image_url("cover.jpg"),
            "https://cdn.example.com/images/cover.jpg"
        );
    }
}
