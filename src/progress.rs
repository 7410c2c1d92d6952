use std::path::PathBuf;
use std::sync::Arc;

use crate::reconcile::DriftField;

/// Events emitted during a publish run for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Declaration passed validation and normalization
    DeclarationNormalized {
        podcast_title: String,
        total_episodes: usize,
    },

    /// Remote state is being listed
    FetchingRemoteState { bucket: String },

    /// Remote state snapshot is complete
    RemoteStateFetched { valid_records: usize },

    /// A remote tag disagrees with the declaration; the declaration wins
    MetadataDrift {
        episode_number: u32,
        key: String,
        field: DriftField,
        remote: String,
        declared: String,
    },

    /// An episode is dated in the future and stays out of the feed for now
    EpisodePending {
        episode_number: u32,
        episode_title: String,
        pub_date: String,
    },

    /// Reconciliation finished
    PlanReady {
        to_upload: usize,
        already_persisted: usize,
        eligible: usize,
    },

    /// The feed document was assembled and verified
    FeedAssembled { items: usize },

    /// The feed document was written locally
    FeedWritten { path: PathBuf },

    /// An episode upload is starting
    UploadStarting {
        episode_number: u32,
        episode_title: String,
        key: String,
        /// Index of this episode in the upload queue
        upload_index: usize,
        total_to_upload: usize,
    },

    /// An episode upload completed
    UploadCompleted {
        episode_number: u32,
        episode_title: String,
        key: String,
    },

    /// Uploads were skipped because of a dry run
    UploadsSkipped { count: usize },

    /// The feed document was uploaded under `name`
    DocumentUploaded { name: String },

    /// Command the operator can run to clear CDN caches
    CacheInvalidation { command: String },

    /// Publish run completed
    PublishCompleted {
        uploaded_count: usize,
        persisted_count: usize,
        pending_count: usize,
        item_count: usize,
    },
}

/// Trait for reporting progress events during a publish run.
///
/// Implementations can use this to display progress, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_reporter_handles_events() {
        let reporter = NoopReporter::shared();

        reporter.report(ProgressEvent::FetchingRemoteState {
            bucket: "my-podcast".to_string(),
        });

        reporter.report(ProgressEvent::MetadataDrift {
            episode_number: 1,
            key: "episodes/one.mp3".to_string(),
            field: DriftField::Guid,
            remote: "old".to_string(),
            declared: "new".to_string(),
        });

        reporter.report(ProgressEvent::PublishCompleted {
            uploaded_count: 1,
            persisted_count: 2,
            pending_count: 0,
            item_count: 3,
        });
    }
}
