pub mod data_fetcher;
pub mod deduplicator;
pub mod linear_system;
pub mod pipeline;
pub mod team_indexer;

pub use data_fetcher::*;
pub use deduplicator::*;
pub use linear_system::*;
pub use pipeline::*;
pub use team_indexer::*;
