// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::declaration::{Declaration, Normalized, normalize};
use crate::error::PublishError;
use crate::feed::{assemble_feed, mime_type_for, verify_feed};
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::reconcile::{MetadataDrift, ReconcileOptions, reconcile};
use crate::storage::{
    EpisodeUpload, ObjectStore, episode_object_key, list_valid_episode_records, upload_document,
    upload_episode,
};

/// Canonical storage name of the feed document
pub const FEED_DOCUMENT_NAME: &str = "podcast.xml";
/// Alias storage name of the feed document
pub const FEED_ALIAS_NAME: &str = "feed";

/// Options for a publish run
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Upload every episode even when storage already has it
    pub force_upload: bool,
    /// Assemble and write the feed locally but upload nothing
    pub dry_run: bool,
    /// Where the assembled document is written
    pub output_path: PathBuf,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            force_upload: false,
            dry_run: false,
            output_path: PathBuf::from(FEED_DOCUMENT_NAME),
        }
    }
}

/// Result of a publish run
#[derive(Debug, Clone)]
pub struct PublishResult {
    /// Number of episodes uploaded
    pub uploaded: usize,
    /// Number of episodes storage already had
    pub persisted: usize,
    /// Number of episodes dated in the future
    pub pending: usize,
    /// Number of items in the feed
    pub items: usize,
    /// Remote tags that disagree with the declaration
    pub drift: Vec<MetadataDrift>,
    pub document_path: PathBuf,
    /// CDN invalidation for the operator to run, when a distribution is configured
    pub invalidation_command: Option<String>,
}

/// Command clearing the CDN cache for both feed document names
pub fn invalidation_command(distribution_id: &str) -> String {
    format!(
        "aws cloudfront create-invalidation --distribution-id {} --paths /{} /{}",
        distribution_id, FEED_ALIAS_NAME, FEED_DOCUMENT_NAME
    )
}

/// Build the feed for a declaration and publish it
///
/// This is the main entry point for the library. It:
/// 1. Validates and normalizes the declaration
/// 2. Fetches a snapshot of the episodes already in storage
/// 3. Reconciles declared episodes against it
/// 4. Assembles the feed and verifies it parses
/// 5. Uploads media that storage is missing
/// 6. Writes the feed locally and uploads it under both names
///
/// Every failure up to step 4 leaves disk and storage untouched.
pub async fn publish_podcast<S: ObjectStore + ?Sized>(
    store: &S,
    declaration: &Declaration,
    options: &PublishOptions,
    reporter: SharedProgressReporter,
    now: DateTime<Utc>,
) -> Result<PublishResult, PublishError> {
    let Normalized {
        channel,
        episodes,
        context,
        media_base_dir,
    } = normalize(declaration)?;

    reporter.report(ProgressEvent::DeclarationNormalized {
        podcast_title: channel.title.clone(),
        total_episodes: episodes.len(),
    });

    let bucket = declaration.storage.bucket.as_str();
    reporter.report(ProgressEvent::FetchingRemoteState {
        bucket: bucket.to_string(),
    });
    let records = list_valid_episode_records(store, bucket).await?;
    reporter.report(ProgressEvent::RemoteStateFetched {
        valid_records: records.len(),
    });

    let plan = reconcile(
        episodes,
        &records,
        now,
        ReconcileOptions {
            force_upload: options.force_upload,
        },
    )?;

    for drift in &plan.drift {
        reporter.report(ProgressEvent::MetadataDrift {
            episode_number: drift.number,
            key: drift.key.clone(),
            field: drift.field,
            remote: drift.remote.clone(),
            declared: drift.declared.clone(),
        });
    }

    for pending in plan.pending() {
        reporter.report(ProgressEvent::EpisodePending {
            episode_number: pending.episode.number,
            episode_title: pending.episode.title.clone(),
            pub_date: pending.pub_date.clone(),
        });
    }

    let to_upload: Vec<_> = plan.to_upload().collect();
    let eligible = plan.eligible().count();
    let pending = plan.episodes.len() - eligible;
    let persisted = plan.episodes.len() - to_upload.len();

    reporter.report(ProgressEvent::PlanReady {
        to_upload: to_upload.len(),
        already_persisted: persisted,
        eligible,
    });

    let document = assemble_feed(&channel, &plan.episodes, &context)?;
    verify_feed(&document, eligible)?;
    reporter.report(ProgressEvent::FeedAssembled { items: eligible });

    let mut uploaded = 0;
    if options.dry_run {
        reporter.report(ProgressEvent::UploadsSkipped {
            count: to_upload.len(),
        });
    } else {
        let total_to_upload = to_upload.len();

        for (upload_index, resolved) in to_upload.iter().enumerate() {
            let episode = &resolved.episode;
            let media_file = episode.media_file(&media_base_dir);
            let key = episode_object_key(&media_file);

            reporter.report(ProgressEvent::UploadStarting {
                episode_number: episode.number,
                episode_title: episode.title.clone(),
                key: key.clone(),
                upload_index,
                total_to_upload,
            });

            let accepted = upload_episode(
                store,
                bucket,
                &EpisodeUpload {
                    media_file: &media_file,
                    guid: &resolved.guid,
                    pubdate: episode.pubdate.raw(),
                    episode_number: episode.number,
                    mime_type: mime_type_for(&episode.media_path),
                },
            )
            .await?;

            if !accepted {
                return Err(PublishError::UploadRejected { key });
            }

            reporter.report(ProgressEvent::UploadCompleted {
                episode_number: episode.number,
                episode_title: episode.title.clone(),
                key,
            });
            uploaded += 1;
        }
    }

    std::fs::write(&options.output_path, &document).map_err(|e| PublishError::WriteFailed {
        path: options.output_path.clone(),
        source: e,
    })?;
    reporter.report(ProgressEvent::FeedWritten {
        path: options.output_path.clone(),
    });

    let mut invalidation = None;
    if !options.dry_run {
        for name in [FEED_DOCUMENT_NAME, FEED_ALIAS_NAME] {
            if !upload_document(store, bucket, &document, name, now).await? {
                return Err(PublishError::UploadRejected {
                    key: name.to_string(),
                });
            }
            reporter.report(ProgressEvent::DocumentUploaded {
                name: name.to_string(),
            });
        }

        invalidation = declaration.distribution_id().map(invalidation_command);
        if let Some(command) = &invalidation {
            reporter.report(ProgressEvent::CacheInvalidation {
                command: command.clone(),
            });
        }
    }

    reporter.report(ProgressEvent::PublishCompleted {
        uploaded_count: uploaded,
        persisted_count: persisted,
        pending_count: pending,
        item_count: eligible,
    });

    Ok(PublishResult {
        uploaded,
        persisted,
        pending,
        items: eligible,
        drift: plan.drift.clone(),
        document_path: options.output_path.clone(),
        invalidation_command: invalidation,
    })
}
