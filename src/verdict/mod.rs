pub mod classifier;
pub mod fusion;

pub use classifier::{classify, strength};
pub use fusion::{fuse, CombinedVerdict};
