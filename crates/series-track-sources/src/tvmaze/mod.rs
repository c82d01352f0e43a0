mod client;
mod wire;

pub use client::{TvMazeClient, DEFAULT_BASE_URL};
