mod log;
mod song;

pub use log::{transform_log, LogEvent, LogTables, TransformError};
pub use song::{transform_song, SongFile};
