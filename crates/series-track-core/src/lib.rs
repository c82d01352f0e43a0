pub mod error;
pub mod kv;
pub mod library;
pub mod overview;
pub mod posters;
pub mod store;

mod keys;

pub use error::{Result, StoreError};
pub use kv::{Batch, Kv, RedisKv, ScoreBound};
pub use library::UserLibrary;
pub use overview::{build_overview, Overview, OverviewEntry};
pub use posters::{PosterCache, PosterStatus};
pub use store::{ShowInfo, ShowInfoOptions, ShowStore, UpdateSummary};

#[cfg(test)]
pub(crate) mod test_support;
