//! Event-log transformation.
//!
//! A log file is newline-delimited JSON, one event per line. Only
//! `page == "NextSong"` events feed the star schema; each retained event
//! yields one time row, one user row and one songplay fact row, all in the
//! filtered order. The song/artist reference on the fact row is resolved
//! through the injected [`SongArtistResolver`] so the transformation stays
//! testable without a live database.

use crate::star_store::{SongArtistResolver, SongplayRecord, TimeRecord, UserRecord};
use anyhow::Result;
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Deserialize;
use thiserror::Error;

/// The page value marking a playback event.
const PLAY_PAGE: &str = "NextSong";

/// Errors raised while transforming one log file. Any of these fails the
/// whole file; records are never skipped.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("malformed log record: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("play event is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("play event carries timestamp {0} outside the representable range")]
    InvalidTimestamp(i64),
}

/// The raw shape of one log line.
///
/// Everything except `page` and `ts` is optional at parse time: rows for
/// other pages (Home, Login, ...) legitimately omit the playback fields,
/// and filtering happens before extraction. Unknown fields in the source
/// (auth, method, status, ...) are ignored.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub page: String,
    pub ts: i64,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// The three row sequences produced from one log file, each in filtered
/// event order.
#[derive(Debug, Default)]
pub struct LogTables {
    pub time: Vec<TimeRecord>,
    pub users: Vec<UserRecord>,
    pub songplays: Vec<SongplayRecord>,
}

/// Decompose an epoch-millisecond timestamp in UTC. Weekday is Monday=0,
/// week is the ISO week-of-year.
fn decompose_timestamp(ts: i64) -> Result<TimeRecord, TransformError> {
    let datetime: DateTime<Utc> =
        DateTime::from_timestamp_millis(ts).ok_or(TransformError::InvalidTimestamp(ts))?;
    Ok(TimeRecord {
        start_time: ts,
        hour: datetime.hour(),
        day: datetime.day(),
        week: datetime.iso_week().week(),
        month: datetime.month(),
        year: datetime.year(),
        weekday: datetime.weekday().num_days_from_monday(),
    })
}

fn require<T>(field: &Option<T>, name: &'static str) -> Result<T, TransformError>
where
    T: Clone,
{
    field.clone().ok_or(TransformError::MissingField(name))
}

/// Transform one log file's raw content into the three row sequences.
///
/// Steps: parse every non-empty line, filter to play events, then per
/// retained event decompose the timestamp, copy the user attributes
/// verbatim and resolve the song/artist reference. An unresolved lookup
/// produces a fact row with both references `None`, never a partial pair
/// and never a dropped row.
pub fn transform_log(raw: &str, resolver: &dyn SongArtistResolver) -> Result<LogTables> {
    let mut events: Vec<LogEvent> = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        events.push(serde_json::from_str(line).map_err(TransformError::Parse)?);
    }

    let plays: Vec<&LogEvent> = events.iter().filter(|e| e.page == PLAY_PAGE).collect();

    let mut tables = LogTables::default();
    for (sequence_index, event) in plays.iter().enumerate() {
        tables.time.push(decompose_timestamp(event.ts)?);

        tables.users.push(UserRecord {
            user_id: require(&event.user_id, "userId")?,
            first_name: require(&event.first_name, "firstName")?,
            last_name: require(&event.last_name, "lastName")?,
            gender: require(&event.gender, "gender")?,
            level: require(&event.level, "level")?,
        });

        let title = require(&event.song, "song")?;
        let artist_name = require(&event.artist, "artist")?;
        let duration = require(&event.length, "length")?;
        let (song_id, artist_id) = match resolver.resolve(&title, &artist_name, duration)? {
            Some((song_id, artist_id)) => (Some(song_id), Some(artist_id)),
            None => (None, None),
        };

        tables.songplays.push(SongplayRecord {
            sequence_index: sequence_index as i64,
            start_time: event.ts,
            user_id: require(&event.user_id, "userId")?,
            level: require(&event.level, "level")?,
            song_id,
            artist_id,
            session_id: require(&event.session_id, "sessionId")?,
            location: require(&event.location, "location")?,
            user_agent: require(&event.user_agent, "userAgent")?,
        });
    }

    Ok(tables)
}
