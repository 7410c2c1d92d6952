// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::declaration::{NormalizedEpisode, PublishTimestamp, parse_flexible};
use crate::error::ReconcileError;
use crate::storage::RemoteEpisodeRecord;

/// Whether an episode's media has to be sent to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDecision {
    NeedsUpload,
    AlreadyPersisted,
}

/// An episode ready for feed assembly
#[derive(Debug, Clone)]
pub struct ResolvedEpisode {
    pub episode: NormalizedEpisode,
    pub guid: String,
    /// `pubDate` value
    pub pub_date: String,
    pub publish_eligible: bool,
    pub upload: UploadDecision,
    /// Key of the matching remote record, if one was found
    pub remote_key: Option<String>,
}

/// Which remote tag disagrees with the declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftField {
    Guid,
    ReleaseDate,
}

impl fmt::Display for DriftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriftField::Guid => "guid",
            DriftField::ReleaseDate => "release_date",
        })
    }
}

/// A remote tag that no longer matches what the declaration computes
///
/// The declaration wins in the feed; the stored object keeps its stale tag
/// until the episode is uploaded again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDrift {
    pub number: u32,
    pub key: String,
    pub field: DriftField,
    pub remote: String,
    pub declared: String,
}

/// Options for reconciliation
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Upload every episode even when storage already has it
    pub force_upload: bool,
}

/// Result of reconciling the declaration with remote state
#[derive(Debug, Clone)]
pub struct ReconcilePlan {
    /// Every declared episode, in declaration order
    pub episodes: Vec<ResolvedEpisode>,
    pub drift: Vec<MetadataDrift>,
}

impl ReconcilePlan {
    /// Episodes whose media must be uploaded
    pub fn to_upload(&self) -> impl Iterator<Item = &ResolvedEpisode> {
        self.episodes
            .iter()
            .filter(|e| e.upload == UploadDecision::NeedsUpload)
    }

    /// Episodes that belong in the feed, in declaration order
    pub fn eligible(&self) -> impl Iterator<Item = &ResolvedEpisode> {
        self.episodes.iter().filter(|e| e.publish_eligible)
    }

    /// Episodes whose publish time has not come yet
    pub fn pending(&self) -> impl Iterator<Item = &ResolvedEpisode> {
        self.episodes.iter().filter(|e| !e.publish_eligible)
    }
}

/// Stable feed identifier for an episode
///
/// Depends only on the number and the declared timestamp text, so re-running
/// with an unchanged declaration always reproduces it.
pub fn episode_guid(number: u32, pubdate: &PublishTimestamp) -> String {
    format!("e{}_{}", number, pubdate.raw().replace(':', "-"))
}

/// Decide identifier, eligibility and upload need for every episode
///
/// Records missing a release date are ignored. A record that matches an
/// episode number but carries no guid aborts reconciliation. Records from
/// [`list_valid_episode_records`] never lack a guid, so during a publish run a
/// guid-less object counts as missing and is uploaded again; the check guards
/// callers that build records some other way.
///
/// [`list_valid_episode_records`]: crate::storage::list_valid_episode_records
pub fn reconcile(
    episodes: Vec<NormalizedEpisode>,
    records: &[RemoteEpisodeRecord],
    now: DateTime<Utc>,
    options: ReconcileOptions,
) -> Result<ReconcilePlan, ReconcileError> {
    let mut resolved = Vec::with_capacity(episodes.len());
    let mut drift = Vec::new();

    for episode in episodes {
        let guid = episode_guid(episode.number, &episode.pubdate);

        let record = records.iter().find(|r| {
            r.episode_number == Some(episode.number) && !r.key.is_empty() && r.release_date.is_some()
        });

        if let Some(record) = record {
            let Some(remote_guid) = record.guid.as_deref() else {
                return Err(ReconcileError::MissingIdentifier {
                    number: episode.number,
                    key: record.key.clone(),
                });
            };
            drift.extend(detect_drift(&episode, record, remote_guid, &guid));
        }

        let upload = if record.is_none() || options.force_upload {
            UploadDecision::NeedsUpload
        } else {
            UploadDecision::AlreadyPersisted
        };

        resolved.push(ResolvedEpisode {
            pub_date: episode.pubdate.rfc2822(),
            publish_eligible: episode.is_published_at(now),
            remote_key: record.map(|r| r.key.clone()),
            guid,
            upload,
            episode,
        });
    }

    Ok(ReconcilePlan {
        episodes: resolved,
        drift,
    })
}

fn detect_drift(
    episode: &NormalizedEpisode,
    record: &RemoteEpisodeRecord,
    remote_guid: &str,
    guid: &str,
) -> Vec<MetadataDrift> {
    let mut found = Vec::new();
    let mut push = |field, remote: &str, declared: &str| {
        found.push(MetadataDrift {
            number: episode.number,
            key: record.key.clone(),
            field,
            remote: remote.to_string(),
            declared: declared.to_string(),
        });
    };

    if remote_guid != guid {
        push(DriftField::Guid, remote_guid, guid);
    }

    if let Some(release_date) = record.release_date.as_deref() {
        let same_instant = parse_flexible(release_date.trim()) == Some(episode.pubdate.at());
        if release_date != episode.pubdate.raw() && !same_instant {
            push(DriftField::ReleaseDate, release_date, episode.pubdate.raw());
        }
    }

    found
}
