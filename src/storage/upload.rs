// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};

use super::remote::{EPISODE_NUMBER_TAG, EPISODE_PREFIX, GUID_TAG, RELEASE_DATE_TAG};
use super::{ObjectStore, ObjectTags, PutObject};
use crate::error::StorageError;

/// Content type of the uploaded feed document
pub const FEED_CONTENT_TYPE: &str = "application/rss+xml";
/// Tag recording when the feed document was uploaded
pub const LAST_BUILD_DATE_TAG: &str = "lastBuildDate";

/// What to upload for a single episode
#[derive(Debug, Clone)]
pub struct EpisodeUpload<'a> {
    pub media_file: &'a Path,
    pub guid: &'a str,
    /// Publish timestamp exactly as declared
    pub pubdate: &'a str,
    pub episode_number: u32,
    pub mime_type: Option<&'a str>,
}

/// Storage key for an episode's media file
pub fn episode_object_key(media_file: &Path) -> String {
    let name = media_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{EPISODE_PREFIX}/{name}")
}

/// Upload an episode's media, tagged with its identity
///
/// Returns whether the store accepted the object.
pub async fn upload_episode<S: ObjectStore + ?Sized>(
    store: &S,
    bucket: &str,
    upload: &EpisodeUpload<'_>,
) -> Result<bool, StorageError> {
    let body = tokio::fs::read(upload.media_file)
        .await
        .map_err(|e| StorageError::SourceReadFailed {
            path: upload.media_file.to_path_buf(),
            source: e,
        })?;

    let mut tags = ObjectTags::new();
    tags.insert(GUID_TAG.to_string(), upload.guid.to_string());
    tags.insert(RELEASE_DATE_TAG.to_string(), upload.pubdate.to_string());
    tags.insert(
        EPISODE_NUMBER_TAG.to_string(),
        upload.episode_number.to_string(),
    );

    store
        .put_object(
            bucket,
            PutObject {
                key: episode_object_key(upload.media_file),
                body: Bytes::from(body),
                content_type: upload.mime_type.map(String::from),
                tags,
            },
        )
        .await
}

/// Upload the feed document under `name`
pub async fn upload_document<S: ObjectStore + ?Sized>(
    store: &S,
    bucket: &str,
    document: &str,
    name: &str,
    uploaded_at: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let mut tags = ObjectTags::new();
    tags.insert(
        LAST_BUILD_DATE_TAG.to_string(),
        uploaded_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    );

    store
        .put_object(
            bucket,
            PutObject {
                key: name.to_string(),
                body: Bytes::copy_from_slice(document.as_bytes()),
                content_type: Some(FEED_CONTENT_TYPE.to_string()),
                tags,
            },
        )
        .await
}
