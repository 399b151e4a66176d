pub mod expiry_queue;
pub mod popularity;
pub mod score_heap;

pub use expiry_queue::ExpiryQueue;
pub use popularity::{BucketWindow, MAX_PRECISION, PopularityHistory, Weighting};
pub use score_heap::{INDEX_OVERHEAD, ScoreHeap};
