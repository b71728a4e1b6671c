//! Feed-based tool discovery
//!
//! Everything that keeps the registry populated: the feed/profile
//! collaborator traits, mention extraction, and the single-flight scanner.

pub mod feed;
pub mod mentions;
pub mod mock;
pub mod scanner;

pub use feed::{FeedClient, FeedError, FeedPost, JsonFeed, ProfileClient};
pub use mentions::MentionExtractor;
pub use mock::MockFeed;
pub use scanner::{DiscoveryScanner, ScanError, ScanResult, DEFAULT_FEED_TIMEOUT};
