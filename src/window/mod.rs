//! Windowing engine: per-identity fixed-size time windows, concurrent
//! storage, closed-window eviction, and the bounded hand-off to feature
//! extraction.

mod bucket;
mod channel;
mod evictor;
mod store;

pub use bucket::{window_start, WindowBucket, WindowKey, WindowSnapshot};
pub use channel::OutputChannel;
pub use evictor::Evictor;
pub use store::WindowStore;
