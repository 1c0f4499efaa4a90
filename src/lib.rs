//! Token verdict engine: market data in, a fused technical/fundamental/sentiment verdict out.

pub mod analyst;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod history;
pub mod narrative;
pub mod report;
pub mod scorer;
pub mod types;
pub mod verdict;
