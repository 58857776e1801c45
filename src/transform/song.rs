//! Song metadata transformation.
//!
//! A song-metadata file holds exactly one flat JSON object describing a
//! song together with its artist. Parsing it and splitting it into the two
//! dimension rows is the whole job; there is no filtering and no unit
//! conversion.

use crate::star_store::{ArtistRecord, SongRecord};
use serde::Deserialize;

/// The raw shape of one song-metadata file.
#[derive(Clone, Debug, Deserialize)]
pub struct SongFile {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub artist_name: String,
    pub year: i32,
    pub duration: f64,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Split one parsed song file into its song and artist dimension rows.
/// Fields are copied verbatim.
pub fn transform_song(raw: &SongFile) -> (SongRecord, ArtistRecord) {
    let song = SongRecord {
        song_id: raw.song_id.clone(),
        title: raw.title.clone(),
        artist_id: raw.artist_id.clone(),
        year: raw.year,
        duration: raw.duration,
    };
    let artist = ArtistRecord {
        artist_id: raw.artist_id.clone(),
        name: raw.artist_name.clone(),
        location: raw.location.clone(),
        latitude: raw.latitude,
        longitude: raw.longitude,
    };
    (song, artist)
}
