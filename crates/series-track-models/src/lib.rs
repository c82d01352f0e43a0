pub mod air_date;
pub mod episode;
pub mod episode_id;
pub mod poster;
pub mod search;
pub mod settings;
pub mod show;

pub use air_date::AirDate;
pub use episode::Episode;
pub use episode_id::EpisodeId;
pub use poster::PosterCandidate;
pub use search::SearchResult;
pub use settings::UserSettings;
pub use show::{Show, ShowStatus};
