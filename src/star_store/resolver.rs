//! SongArtistResolver trait definition.
//!
//! The log transformation needs to look playback events up against whatever
//! catalog the sink currently holds. Modeling the lookup as a capability
//! keeps the transformer testable without a live database.

use anyhow::Result;

/// Exact-match lookup of a playback event against the song/artist catalog.
pub trait SongArtistResolver {
    /// Resolve `(song title, artist name, duration)` to the catalog's
    /// `(song_id, artist_id)` pair.
    ///
    /// Returns `None` when no catalog entry matches the full triple. When
    /// more than one entry matches, implementations must return the first
    /// match in a deterministic order.
    fn resolve(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<(String, String)>>;
}
