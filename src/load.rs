//! Load driver: discovery + transformation + sink, one file at a time.
//!
//! Strictly sequential. Each file is read fully into memory, transformed,
//! and written inside one transaction committed before the next file
//! starts. A failure anywhere aborts the run; files committed before the
//! failure stay in the database.

use crate::discover::discover_files;
use crate::star_store::SqliteStarStore;
use crate::transform::{transform_log, transform_song, SongFile};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Extension of the data files under both roots, without the dot.
pub const DATA_FILE_EXTENSION: &str = "json";

/// Row counts accumulated over one load phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub files_processed: usize,
    pub songs: usize,
    pub artists: usize,
    pub time_rows: usize,
    pub user_rows: usize,
    pub songplays: usize,
}

/// Load every song-metadata file under `root`: one JSON object per file,
/// one song row and one artist row each.
pub fn load_song_files(root: &Path, store: &SqliteStarStore) -> Result<LoadStats> {
    let files = discover_files(root, DATA_FILE_EXTENSION)?;
    info!("{} files found in {}", files.len(), root.display());

    let mut stats = LoadStats::default();
    for (i, path) in files.iter().enumerate() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read song file {}", path.display()))?;
        let song_file: SongFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse song file {}", path.display()))?;
        let (song, artist) = transform_song(&song_file);

        store
            .with_file_transaction(|store| {
                store.insert_song(&song)?;
                store.insert_artist(&artist)?;
                Ok(())
            })
            .with_context(|| format!("Failed to load song file {}", path.display()))?;

        stats.files_processed += 1;
        stats.songs += 1;
        stats.artists += 1;
        info!("{}/{} files processed", i + 1, files.len());
    }
    Ok(stats)
}

/// Load every event-log file under `root`: newline-delimited JSON, with
/// the store itself acting as the song/artist resolver. Resolution runs
/// against whatever the catalog holds at call time, so the song phase must
/// come first.
pub fn load_log_files(root: &Path, store: &SqliteStarStore) -> Result<LoadStats> {
    let files = discover_files(root, DATA_FILE_EXTENSION)?;
    info!("{} files found in {}", files.len(), root.display());

    let mut stats = LoadStats::default();
    for (i, path) in files.iter().enumerate() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read log file {}", path.display()))?;
        let tables = transform_log(&raw, store)
            .with_context(|| format!("Failed to transform log file {}", path.display()))?;

        store
            .with_file_transaction(|store| {
                for time in &tables.time {
                    store.insert_time(time)?;
                }
                for user in &tables.users {
                    store.upsert_user(user)?;
                }
                for songplay in &tables.songplays {
                    store.insert_songplay(songplay)?;
                }
                Ok(())
            })
            .with_context(|| format!("Failed to load log file {}", path.display()))?;

        stats.files_processed += 1;
        stats.time_rows += tables.time.len();
        stats.user_rows += tables.users.len();
        stats.songplays += tables.songplays.len();
        info!("{}/{} files processed", i + 1, files.len());
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_song_file(dir: &Path, name: &str, song_id: &str, title: &str) {
        fs::write(
            dir.join(name),
            format!(
                r#"{{"song_id":"{song_id}","title":"{title}","artist_id":"A1",
                    "artist_name":"Artist A","year":2000,"duration":200.0,
                    "location":"LA","latitude":null,"longitude":null}}"#
            )
            .replace('\n', ""),
        )
        .unwrap();
    }

    #[test]
    fn test_load_song_files_inserts_one_pair_per_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("A/B")).unwrap();
        write_song_file(&dir.path().join("A/B"), "song1.json", "S1", "Song A");
        write_song_file(dir.path(), "song2.json", "S2", "Song B");

        let store = SqliteStarStore::open_in_memory().unwrap();
        let stats = load_song_files(dir.path(), &store).unwrap();

        assert_eq!(stats.files_processed, 2);
        assert_eq!(stats.songs, 2);
        let counts = store.get_counts().unwrap();
        assert_eq!(counts.songs, 2);
        // Both files name the same artist; the id conflict is ignored.
        assert_eq!(counts.artists, 1);
    }

    #[test]
    fn test_load_log_files_resolves_against_loaded_catalog() {
        let dir = TempDir::new().unwrap();
        let songs = dir.path().join("song_data");
        let logs = dir.path().join("log_data");
        fs::create_dir_all(&songs).unwrap();
        fs::create_dir_all(&logs).unwrap();
        write_song_file(&songs, "song1.json", "S1", "Song A");

        let matched = r#"{"page":"NextSong","ts":1541121934796,"userId":"10","firstName":"Lily","lastName":"Koch","gender":"F","level":"paid","song":"Song A","artist":"Artist A","length":200.0,"sessionId":582,"location":"LA","userAgent":"Mozilla/5.0"}"#;
        let unmatched = r#"{"page":"NextSong","ts":1541121950000,"userId":"10","firstName":"Lily","lastName":"Koch","gender":"F","level":"paid","song":"Unknown","artist":"Artist A","length":200.0,"sessionId":582,"location":"LA","userAgent":"Mozilla/5.0"}"#;
        fs::write(logs.join("events.json"), format!("{matched}\n{unmatched}\n")).unwrap();

        let store = SqliteStarStore::open_in_memory().unwrap();
        load_song_files(&songs, &store).unwrap();
        let stats = load_log_files(&logs, &store).unwrap();

        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.time_rows, 2);
        assert_eq!(stats.user_rows, 2);
        assert_eq!(stats.songplays, 2);

        let counts = store.get_counts().unwrap();
        assert_eq!(counts.time, 2);
        // Duplicate user rows collapse through the upsert.
        assert_eq!(counts.users, 1);
        assert_eq!(counts.songplays, 2);
    }

    #[test]
    fn test_malformed_file_aborts_the_run() {
        let dir = TempDir::new().unwrap();
        // Sorted discovery order: the good file commits first, then the
        // malformed one aborts.
        write_song_file(dir.path(), "a_good.json", "S1", "Song A");
        fs::write(dir.path().join("b_broken.json"), "not json").unwrap();

        let store = SqliteStarStore::open_in_memory().unwrap();
        let result = load_song_files(dir.path(), &store);
        assert!(result.is_err());

        // The committed file survives the abort.
        assert_eq!(store.get_counts().unwrap().songs, 1);
    }

    #[test]
    fn test_missing_root_fails_discovery() {
        let store = SqliteStarStore::open_in_memory().unwrap();
        let result = load_song_files(Path::new("/nonexistent/song_data"), &store);
        assert!(result.is_err());
    }
}
