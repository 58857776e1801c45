//! SQLite-backed star store implementation.
//!
//! One long-lived write connection for the whole run. The schema is
//! created on first open and validated against the declared tables on
//! every later open. Inserts are parameterized statements; transaction
//! scope is per source file through [`SqliteStarStore::with_file_transaction`].

use super::models::{ArtistRecord, SongRecord, SongplayRecord, TimeRecord, UserRecord};
use super::resolver::SongArtistResolver;
use super::schema::STAR_SCHEMA;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;

/// Row totals per table, for the end-of-run summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StarCounts {
    pub songs: i64,
    pub artists: i64,
    pub time: i64,
    pub users: i64,
    pub songplays: i64,
}

/// SQLite-backed sink for the star schema.
pub struct SqliteStarStore {
    conn: Connection,
}

fn init_schema(conn: &Connection) -> Result<()> {
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating star schema at version {}", STAR_SCHEMA.version);
        STAR_SCHEMA.create(conn)?;
    } else {
        STAR_SCHEMA.validate(conn)?;
    }
    Ok(())
}

impl SqliteStarStore {
    /// Open (or create) the star database at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            db_path.as_ref(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )
        .with_context(|| format!("Failed to open star database at {:?}", db_path.as_ref()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        init_schema(&conn)?;

        let counts = Self::counts_on(&conn)?;
        info!(
            "Opened star database: {} songs, {} artists, {} users, {} songplays",
            counts.songs, counts.artists, counts.users, counts.songplays
        );

        Ok(SqliteStarStore { conn })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(SqliteStarStore { conn })
    }

    /// Run `f` inside one transaction covering a whole source file.
    /// All of the file's inserts land or none do; a failure rolls the
    /// file back before propagating.
    pub fn with_file_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.conn.execute("BEGIN IMMEDIATE", [])?;
        match f(self) {
            Ok(value) => {
                self.conn.execute("COMMIT", [])?;
                Ok(value)
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    pub fn insert_song(&self, song: &SongRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO songs (song_id, title, artist_id, year, duration)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &song.song_id,
                    &song.title,
                    &song.artist_id,
                    song.year,
                    song.duration
                ],
            )
            .with_context(|| format!("Failed to insert song '{}'", song.song_id))?;
        Ok(())
    }

    pub fn insert_artist(&self, artist: &ArtistRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO artists (artist_id, name, location, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &artist.artist_id,
                    &artist.name,
                    &artist.location,
                    artist.latitude,
                    artist.longitude
                ],
            )
            .with_context(|| format!("Failed to insert artist '{}'", artist.artist_id))?;
        Ok(())
    }

    pub fn insert_time(&self, time: &TimeRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    time.start_time,
                    time.hour,
                    time.day,
                    time.week,
                    time.month,
                    time.year,
                    time.weekday
                ],
            )
            .with_context(|| format!("Failed to insert time row for ts {}", time.start_time))?;
        Ok(())
    }

    /// Insert a user row, updating `level` when the user already exists.
    pub fn upsert_user(&self, user: &UserRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO users (user_id, first_name, last_name, gender, level)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET level = excluded.level",
                params![
                    &user.user_id,
                    &user.first_name,
                    &user.last_name,
                    &user.gender,
                    &user.level
                ],
            )
            .with_context(|| format!("Failed to upsert user '{}'", user.user_id))?;
        Ok(())
    }

    pub fn insert_songplay(&self, songplay: &SongplayRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO songplays (sequence_index, start_time, user_id, level, song_id,
                 artist_id, session_id, location, user_agent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    songplay.sequence_index,
                    songplay.start_time,
                    &songplay.user_id,
                    &songplay.level,
                    &songplay.song_id,
                    &songplay.artist_id,
                    songplay.session_id,
                    &songplay.location,
                    &songplay.user_agent
                ],
            )
            .with_context(|| {
                format!(
                    "Failed to insert songplay at index {}",
                    songplay.sequence_index
                )
            })?;
        Ok(())
    }

    /// Row totals per table.
    pub fn get_counts(&self) -> Result<StarCounts> {
        Self::counts_on(&self.conn)
    }

    fn counts_on(conn: &Connection) -> Result<StarCounts> {
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?)
        };
        Ok(StarCounts {
            songs: count("songs")?,
            artists: count("artists")?,
            time: count("time")?,
            users: count("users")?,
            songplays: count("songplays")?,
        })
    }
}

impl SongArtistResolver for SqliteStarStore {
    fn resolve(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<(String, String)>> {
        // Ordering by song_id makes the multi-match case deterministic.
        match self.conn.query_row(
            "SELECT s.song_id, s.artist_id
             FROM songs s
             JOIN artists a ON s.artist_id = a.artist_id
             WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3
             ORDER BY s.song_id
             LIMIT 1",
            params![title, artist_name, duration],
            |r| Ok((r.get(0)?, r.get(1)?)),
        ) {
            Ok(ids) => Ok(Some(ids)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
