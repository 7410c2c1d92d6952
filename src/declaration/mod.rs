mod channel;
mod normalize;
mod timestamp;

pub(crate) use channel::require;
pub use channel::{
    CdnConfig, ChannelDeclaration, Declaration, EpisodeDeclaration, EpisodeType, Explicit,
    ShowType, StorageConfig, load_declaration,
};
pub use normalize::{
    Category, Channel, FeedContext, Normalized, NormalizedEpisode, Owner, check_unique, normalize,
};
pub use timestamp::{PublishTimestamp, parse_flexible};
