// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod fs;
mod remote;
mod upload;

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageError;

pub use fs::FsObjectStore;
pub use remote::{
    EPISODE_NUMBER_TAG, EPISODE_PREFIX, GUID_TAG, RELEASE_DATE_TAG, RemoteEpisodeRecord,
    list_valid_episode_records,
};
pub use upload::{
    EpisodeUpload, FEED_CONTENT_TYPE, LAST_BUILD_DATE_TAG, episode_object_key, upload_document,
    upload_episode,
};

/// Key/value tags attached to a stored object
pub type ObjectTags = BTreeMap<String, String>;

/// An entry returned by an object listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    /// Object size in bytes
    pub size: u64,
}

/// A single object write
#[derive(Debug, Clone)]
pub struct PutObject {
    pub key: String,
    pub body: Bytes,
    pub content_type: Option<String>,
    pub tags: ObjectTags,
}

/// Object storage abstraction for testability
///
/// Retries, if any, are the implementation's business; every error returned
/// here is treated as fatal by the publish pipeline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List objects in `bucket` whose key starts with `prefix`, ordered by key
    async fn list_objects(&self, bucket: &str, prefix: &str)
    -> Result<Vec<ObjectSummary>, StorageError>;

    /// Fetch the tags attached to an object
    async fn get_object_tags(&self, bucket: &str, key: &str) -> Result<ObjectTags, StorageError>;

    /// Store an object, returning whether the store accepted it
    async fn put_object(&self, bucket: &str, object: PutObject) -> Result<bool, StorageError>;
}
