// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use futures::future::try_join_all;

use super::{ObjectStore, ObjectTags};
use crate::error::StorageError;

/// Key prefix all episode media lives under
pub const EPISODE_PREFIX: &str = "episodes";

/// The unique id of the episode in the feed
pub const GUID_TAG: &str = "guid";
/// The declared publish timestamp the media was uploaded with
pub const RELEASE_DATE_TAG: &str = "release_date";
/// The chronological number of the episode
pub const EPISODE_NUMBER_TAG: &str = "episode_number";

/// An episode already persisted in storage, as described by its tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEpisodeRecord {
    pub key: String,
    pub guid: Option<String>,
    pub release_date: Option<String>,
    pub episode_number: Option<u32>,
}

impl RemoteEpisodeRecord {
    /// Build a record from an object's key and tags
    pub fn from_tags(key: impl Into<String>, tags: &ObjectTags) -> Self {
        let tag = |name: &str| tags.get(name).filter(|v| !v.is_empty()).cloned();

        Self {
            key: key.into(),
            guid: tag(GUID_TAG),
            release_date: tag(RELEASE_DATE_TAG),
            episode_number: tags
                .get(EPISODE_NUMBER_TAG)
                .and_then(|n| n.trim().parse().ok()),
        }
    }

    /// A record is usable only with a key, a guid and a release date
    pub fn is_valid(&self) -> bool {
        !self.key.is_empty() && self.guid.is_some() && self.release_date.is_some()
    }
}

/// Snapshot of the episodes already persisted in `bucket`
///
/// Zero-byte placeholders and records missing a guid or release date are
/// dropped. Tag lookups run concurrently; the result keeps listing order.
pub async fn list_valid_episode_records<S: ObjectStore + ?Sized>(
    store: &S,
    bucket: &str,
) -> Result<Vec<RemoteEpisodeRecord>, StorageError> {
    let objects = store.list_objects(bucket, EPISODE_PREFIX).await?;

    let lookups = objects
        .into_iter()
        .filter(|object| object.size != 0)
        .map(|object| async move {
            let tags = store.get_object_tags(bucket, &object.key).await?;
            Ok::<_, StorageError>(RemoteEpisodeRecord::from_tags(object.key, &tags))
        });

    let records = try_join_all(lookups).await?;

    Ok(records.into_iter().filter(|r| r.is_valid()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FsObjectStore, ObjectSummary, PutObject};
    use async_trait::async_trait;
    use bytes::Bytes;
    use tempfile::tempdir;

    fn tags(pairs: &[(&str, &str)]) -> ObjectTags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn put(store: &FsObjectStore, key: &str, body: &'static [u8], pairs: &[(&str, &str)]) {
        store
            .put_object(
                "pod",
                PutObject {
                    key: key.to_string(),
                    body: Bytes::from_static(body),
                    content_type: None,
                    tags: tags(pairs),
                },
            )
            .await
            .unwrap();
    }

    #[test]
    fn record_from_complete_tags_is_valid() {
        let record = RemoteEpisodeRecord::from_tags(
            "episodes/one.mp3",
            &tags(&[
                ("guid", "e1_2024-01-15T12-00-00Z"),
                ("release_date", "2024-01-15T12:00:00Z"),
                ("episode_number", "1"),
            ]),
        );

        assert!(record.is_valid());
        assert_eq!(record.episode_number, Some(1));
        assert_eq!(record.guid.as_deref(), Some("e1_2024-01-15T12-00-00Z"));
    }

    #[test]
    fn record_without_guid_or_date_is_invalid() {
        let no_guid =
            RemoteEpisodeRecord::from_tags("episodes/a.mp3", &tags(&[("release_date", "2024-01-15")]));
        assert!(!no_guid.is_valid());

        let no_date = RemoteEpisodeRecord::from_tags("episodes/a.mp3", &tags(&[("guid", "x")]));
        assert!(!no_date.is_valid());

        let empty_guid = RemoteEpisodeRecord::from_tags(
            "episodes/a.mp3",
            &tags(&[("guid", ""), ("release_date", "2024-01-15")]),
        );
        assert!(!empty_guid.is_valid());
    }

    #[test]
    fn unparseable_episode_number_is_absent() {
        let record = RemoteEpisodeRecord::from_tags(
            "episodes/a.mp3",
            &tags(&[("guid", "x"), ("release_date", "d"), ("episode_number", "one")]),
        );
        assert!(record.is_valid());
        assert_eq!(record.episode_number, None);
    }

    #[tokio::test]
    async fn resolver_filters_placeholders_and_incomplete_records() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        put(
            &store,
            "episodes/one.mp3",
            b"audio",
            &[("guid", "g1"), ("release_date", "2024-01-15"), ("episode_number", "1")],
        )
        .await;
        put(
            &store,
            "episodes/placeholder.mp3",
            b"",
            &[("guid", "g2"), ("release_date", "2024-02-15"), ("episode_number", "2")],
        )
        .await;
        put(&store, "episodes/untagged.mp3", b"audio", &[]).await;

        let records = list_valid_episode_records(&store, "pod").await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "episodes/one.mp3");
        assert_eq!(records[0].episode_number, Some(1));
    }

    struct FailingTagStore;

    #[async_trait]
    impl ObjectStore for FailingTagStore {
        async fn list_objects(
            &self,
            _bucket: &str,
            _prefix: &str,
        ) -> Result<Vec<ObjectSummary>, StorageError> {
            Ok(vec![ObjectSummary {
                key: "episodes/one.mp3".to_string(),
                size: 10,
            }])
        }

        async fn get_object_tags(&self, bucket: &str, key: &str) -> Result<ObjectTags, StorageError> {
            Err(StorageError::TagsFailed {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: std::io::Error::other("access denied"),
            })
        }

        async fn put_object(&self, _bucket: &str, _object: PutObject) -> Result<bool, StorageError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn tag_lookup_failure_is_an_error() {
        let result = list_valid_episode_records(&FailingTagStore, "pod").await;
        assert!(matches!(result, Err(StorageError::TagsFailed { .. })));
    }
}
