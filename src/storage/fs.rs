// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ObjectStore, ObjectSummary, ObjectTags, PutObject};
use crate::error::StorageError;

/// Sidecar suffix holding an object's content type and tags
const METADATA_SUFFIX: &str = ".meta.json";

/// Serializable sidecar stored next to every object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ObjectMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(default)]
    tags: ObjectTags,
}

/// Object store backed by a local directory, one subdirectory per bucket
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the object with `key` in `bucket`
    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }

    fn metadata_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(format!("{key}{METADATA_SUFFIX}"))
    }
}

/// Turn a file path below the bucket directory into a `/`-separated key
fn object_key(bucket_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(bucket_dir).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectSummary>, StorageError> {
        let list_err = |e: std::io::Error| StorageError::ListFailed {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            source: e,
        };

        let bucket_dir = self.root.join(bucket);
        // A bucket nothing was ever uploaded to
        if !tokio::fs::try_exists(&bucket_dir).await.map_err(list_err)? {
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        let mut pending = vec![bucket_dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(list_err)?;

            while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
                let path = entry.path();
                if entry.file_type().await.map_err(list_err)?.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Some(key) = object_key(&bucket_dir, &path) else {
                    continue;
                };
                if key.ends_with(METADATA_SUFFIX) || !key.starts_with(prefix) {
                    continue;
                }

                let size = entry.metadata().await.map_err(list_err)?.len();
                objects.push(ObjectSummary { key, size });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn get_object_tags(&self, bucket: &str, key: &str) -> Result<ObjectTags, StorageError> {
        let path = self.metadata_path(bucket, key);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ObjectTags::new()),
            Err(e) => {
                return Err(StorageError::TagsFailed {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    source: e,
                });
            }
        };

        let metadata: ObjectMetadata =
            serde_json::from_str(&content).map_err(|e| StorageError::MetadataInvalid {
                key: key.to_string(),
                source: e,
            })?;

        Ok(metadata.tags)
    }

    async fn put_object(&self, bucket: &str, object: PutObject) -> Result<bool, StorageError> {
        let put_err = |e: std::io::Error| StorageError::PutFailed {
            bucket: bucket.to_string(),
            key: object.key.clone(),
            source: e,
        };

        let path = self.object_path(bucket, &object.key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(put_err)?;
        }

        tokio::fs::write(&path, &object.body).await.map_err(put_err)?;

        let metadata = ObjectMetadata {
            content_type: object.content_type.clone(),
            tags: object.tags.clone(),
        };
        let json = serde_json::to_string_pretty(&metadata).map_err(|e| {
            StorageError::MetadataInvalid {
                key: object.key.clone(),
                source: e,
            }
        })?;
        tokio::fs::write(self.metadata_path(bucket, &object.key), json)
            .await
            .map_err(put_err)?;

        Ok(true)
    }
}
