pub mod error;
pub mod retry;
pub mod traits;
pub mod tvmaze;

pub use error::SourceError;
pub use retry::{with_retry, IsRetryable, RetryPolicy};
pub use traits::{ChangedShows, FullShow, ShowMetadataSource};
pub use tvmaze::TvMazeClient;
