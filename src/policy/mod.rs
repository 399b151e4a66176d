pub mod two_tier;

#[cfg(feature = "concurrency")]
pub use two_tier::ConcurrentTwoTierCache;
pub use two_tier::{Tier, TwoTierCache};
