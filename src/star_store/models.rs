//! Row models for the star schema.
//!
//! Every value here is produced once per input record during a file's
//! transformation and written out in the same pass; nothing is mutated
//! after creation and nothing outlives the file that produced it.

/// One song of the metadata catalog. Dimension row for `songs`.
#[derive(Clone, Debug, PartialEq)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
}

/// The artist co-resident with a song in the same metadata file.
/// Dimension row for `artists`; coordinates may be absent in the source.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtistRecord {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Calendar decomposition of one playback timestamp, in UTC.
/// Weekday follows the Monday=0 convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeRecord {
    /// Original epoch-millisecond timestamp.
    pub start_time: i64,
    pub hour: u32,
    pub day: u32,
    /// ISO week-of-year.
    pub week: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: u32,
}

/// User attributes copied verbatim from one playback event. Duplicates
/// across events for the same user are expected; the sink's upsert decides
/// which `level` wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub level: String,
}

/// The fact row: one playback event enriched with resolved references.
///
/// `sequence_index` is the 0-based position of the event within its source
/// file's filtered sequence: a per-file, per-run artifact, not a stable
/// identifier. The song/artist references are either both set (the catalog
/// held an exact match) or both `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct SongplayRecord {
    pub sequence_index: i64,
    pub start_time: i64,
    pub user_id: String,
    pub level: String,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: String,
    pub user_agent: String,
}
