//! Album/photo visibility rules.
//!
//! An album is visible to everyone unless it is private, in which case only
//! its owner sees it. Photos inherit visibility from their album; a photo
//! whose album no longer exists is never visible.

use std::collections::HashMap;

use crate::models::{Album, Photo};
use crate::store::StoreResult;

pub fn album_visible(album: &Album, requester: Option<&str>) -> bool {
    !album.is_private || requester == Some(album.owner_id.as_str())
}

/// Memoizes the per-album visibility decision for one requester across a
/// single query, so a listing resolves each album at most once.
pub struct PrivacyCache {
    requester: Option<String>,
    decisions: HashMap<String, bool>,
}

impl PrivacyCache {
    pub fn new(requester: Option<&str>) -> Self {
        Self {
            requester: requester.map(String::from),
            decisions: HashMap::new(),
        }
    }

    pub fn photo_visible<F>(&mut self, photo: &Photo, mut fetch_album: F) -> StoreResult<bool>
    where
        F: FnMut(&str) -> StoreResult<Option<Album>>,
    {
        if let Some(decision) = self.decisions.get(&photo.album_id) {
            return Ok(*decision);
        }
        let decision = match fetch_album(&photo.album_id)? {
            Some(album) => album_visible(&album, self.requester.as_deref()),
            // Dangling photo: its album is gone, so it must not be served.
            None => false,
        };
        self.decisions.insert(photo.album_id.clone(), decision);
        Ok(decision)
    }
}
