mod models;
mod resolver;
mod schema;
mod store;

pub use models::{ArtistRecord, SongRecord, SongplayRecord, TimeRecord, UserRecord};
pub use resolver::SongArtistResolver;
pub use store::{SqliteStarStore, StarCounts};
