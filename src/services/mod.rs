/// Business logic services layer
pub mod aggregator;
pub mod normalizer;
pub mod preferences;
pub mod sun;
pub mod video;

pub use aggregator::{sun_proximity, LaunchFeedAggregator, LoadOutcome};
pub use preferences::PreferenceStore;
