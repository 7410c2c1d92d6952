mod assemble;
mod mime;
mod parse;

pub use assemble::{GENERATOR, NAMESPACES, assemble_feed};
pub use mime::mime_type_for;
pub use parse::{Enclosure, PublishedFeed, PublishedItem, parse_feed, verify_feed};
