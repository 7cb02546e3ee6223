//! Database access for podstats-import

pub mod podcasts;

pub use podcasts::{PodcastStore, StoreSummary, TopQuery};
