pub mod declaration;
pub mod error;
pub mod feed;
pub mod progress;
pub mod publish;
pub mod reconcile;
pub mod storage;

// Re-export main types for convenience
pub use declaration::{Declaration, PublishTimestamp, load_declaration, normalize};
pub use error::{
    DeclarationError, FeedError, MediaError, PublishError, ReconcileError, StorageError,
    TimestampError, ValidationError,
};
pub use feed::{assemble_feed, mime_type_for, parse_feed, verify_feed};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use publish::{PublishOptions, PublishResult, invalidation_command, publish_podcast};
pub use reconcile::{ReconcileOptions, ReconcilePlan, ResolvedEpisode, episode_guid, reconcile};
pub use storage::{FsObjectStore, ObjectStore, RemoteEpisodeRecord};
