//! Consistency engine: every mutation that touches an aggregate counter or
//! cascades across rows goes through here, and nothing else writes counters.
//!
//! Single-entity mutations run the row change and its counter update inside
//! one transaction, so readers never observe one without the other. Cascades
//! over unbounded row sets (album delete, account delete) instead run one
//! small transaction per photo or edge; every step is idempotent, so an
//! interrupted cascade is finished by running the operation again.

use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::activity;
use crate::models::*;
use crate::store::{self, Store, StoreError, StoreResult};

#[derive(Error, Debug)]
#[error("storage error: {0}")]
pub struct StorageError(pub String);

/// Boundary to the external file store holding the actual image bytes.
/// Deletion failures are reported but never block database cleanup.
pub trait PhotoStorage: Send + Sync {
    fn delete(&self, storage_id: &str) -> Result<(), StorageError>;
}

/// Default boundary for deployments where file cleanup is handled out of
/// band (CDN lifecycle rules, object-store expiry).
pub struct NullStorage;

impl PhotoStorage for NullStorage {
    fn delete(&self, _storage_id: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

pub struct Engine {
    store: Arc<Store>,
    storage: Arc<dyn PhotoStorage>,
}

impl Engine {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            storage: Arc::new(NullStorage),
        }
    }

    pub fn with_storage(store: Arc<Store>, storage: Arc<dyn PhotoStorage>) -> Self {
        Self { store, storage }
    }

    // ==================== Albums ====================

    pub fn create_album(&self, owner_id: &str, req: &CreateAlbumRequest) -> StoreResult<String> {
        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if store::find_user_on(&tx, owner_id)?.is_none() {
            return Err(StoreError::NotFound(format!("User {}", owner_id)));
        }

        let mut album = Album {
            id: String::new(),
            title: req.title.clone(),
            description: req.description.clone(),
            is_private: req.is_private,
            owner_id: owner_id.to_string(),
            photo_count: 0,
            cover_image: req.cover_image.clone(),
            date_created: Utc::now(),
            date_updated: Utc::now(),
            search_text: String::new(),
        };
        store::insert_album_on(&tx, &mut album)?;
        tx.execute(
            "UPDATE users SET album_count = album_count + 1 WHERE id = ?1",
            params![owner_id],
        )?;
        tx.commit()?;
        Ok(album.id)
    }

    pub fn update_album(
        &self,
        caller_id: &str,
        album_id: &str,
        req: &UpdateAlbumRequest,
    ) -> StoreResult<String> {
        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let album = store::find_album_on(&tx, album_id)?
            .ok_or_else(|| StoreError::NotFound(format!("Album {}", album_id)))?;
        if album.owner_id != caller_id {
            return Err(StoreError::PermissionDenied(
                "You don't have permission to update this album".to_string(),
            ));
        }

        let title = req.title.clone().unwrap_or(album.title);
        let description = match &req.description {
            Some(d) => Some(d.clone()),
            None => album.description,
        };
        let is_private = req.is_private.unwrap_or(album.is_private);
        let cover_image = match &req.cover_image {
            Some(c) => Some(c.clone()),
            None => album.cover_image,
        };
        let search_text = store::search_blob(&[&title, description.as_deref().unwrap_or("")]);

        tx.execute(
            r#"UPDATE albums SET title = ?1, description = ?2, is_private = ?3, cover_image = ?4,
                search_text = ?5, date_updated = ?6 WHERE id = ?7"#,
            params![
                title,
                description,
                is_private,
                cover_image,
                search_text,
                Utc::now().to_rfc3339(),
                album_id,
            ],
        )?;
        tx.commit()?;
        Ok(album_id.to_string())
    }

    pub fn update_album_cover(
        &self,
        caller_id: &str,
        album_id: &str,
        cover_image: &str,
    ) -> StoreResult<String> {
        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let album = store::find_album_on(&tx, album_id)?
            .ok_or_else(|| StoreError::NotFound(format!("Album {}", album_id)))?;
        if album.owner_id != caller_id {
            return Err(StoreError::PermissionDenied(
                "You don't have permission to update this album".to_string(),
            ));
        }
        tx.execute(
            "UPDATE albums SET cover_image = ?1, date_updated = ?2 WHERE id = ?3",
            params![cover_image, Utc::now().to_rfc3339(), album_id],
        )?;
        tx.commit()?;
        Ok(album_id.to_string())
    }

    pub fn delete_album(&self, caller_id: &str, album_id: &str) -> StoreResult<String> {
        let album = self.store.get_album(album_id)?;
        if album.owner_id != caller_id {
            return Err(StoreError::PermissionDenied(
                "You don't have permission to delete this album".to_string(),
            ));
        }
        self.delete_album_cascade(&album)?;
        Ok(album_id.to_string())
    }

    /// Tear down an album photo by photo, one transaction each, then remove
    /// the album row itself. Re-running after an interruption picks up with
    /// whatever photos remain.
    fn delete_album_cascade(&self, album: &Album) -> StoreResult<()> {
        loop {
            let mut conn = self.store.conn.lock().unwrap();
            let photos = photos_in_album_on(&conn, &album.id, 100)?;
            if photos.is_empty() {
                break;
            }
            let mut storage_ids = Vec::with_capacity(photos.len());
            for photo in &photos {
                let tx = conn.transaction()?;
                let current = store::find_album_on(&tx, &album.id)?;
                delete_photo_cascade_on(&tx, photo, current.as_ref())?;
                tx.commit()?;
                storage_ids.push(photo.storage_id.clone());
            }
            drop(conn);
            for storage_id in storage_ids {
                if let Err(e) = self.storage.delete(&storage_id) {
                    log::warn!("failed to delete stored file {}: {}", storage_id, e);
                }
            }
        }

        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM albums WHERE id = ?1", params![album.id])?;
        if removed > 0 {
            tx.execute(
                "UPDATE users SET album_count = MAX(album_count - 1, 0) WHERE id = ?1",
                params![album.owner_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ==================== Photos ====================

    pub fn add_photo(
        &self,
        caller_id: &str,
        album_id: &str,
        req: &AddPhotoRequest,
    ) -> StoreResult<String> {
        if !req.aspect_ratio.is_finite() || req.aspect_ratio <= 0.0 {
            return Err(StoreError::InvalidArgument(
                "aspectRatio must be a positive number".to_string(),
            ));
        }
        if req.url.trim().is_empty()
            || req.thumbnail_url.trim().is_empty()
            || req.storage_id.trim().is_empty()
        {
            return Err(StoreError::InvalidArgument(
                "photo file metadata is incomplete".to_string(),
            ));
        }

        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let album = store::find_album_on(&tx, album_id)?
            .ok_or_else(|| StoreError::NotFound(format!("Album {}", album_id)))?;
        if album.owner_id != caller_id {
            return Err(StoreError::PermissionDenied(
                "You don't have permission to add photos to this album".to_string(),
            ));
        }

        let mut photo = Photo {
            id: String::new(),
            title: req.title.clone(),
            description: req.description.clone(),
            url: req.url.clone(),
            thumbnail_url: req.thumbnail_url.clone(),
            album_id: album_id.to_string(),
            owner_id: caller_id.to_string(),
            date_uploaded: Utc::now(),
            aspect_ratio: req.aspect_ratio,
            storage_id: req.storage_id.clone(),
            likes: 0,
            comments: 0,
            search_text: String::new(),
        };
        store::insert_photo_on(&tx, &mut photo)?;
        tx.execute(
            "UPDATE albums SET photo_count = photo_count + 1, date_updated = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), album_id],
        )?;
        tx.execute(
            "UPDATE users SET total_photos = total_photos + 1 WHERE id = ?1",
            params![caller_id],
        )?;
        if album.photo_count == 0 && album.cover_image.is_none() {
            tx.execute(
                "UPDATE albums SET cover_image = ?1 WHERE id = ?2",
                params![photo.thumbnail_url, album_id],
            )?;
        }
        tx.commit()?;
        Ok(photo.id)
    }

    pub fn update_photo(
        &self,
        caller_id: &str,
        photo_id: &str,
        req: &UpdatePhotoRequest,
    ) -> StoreResult<String> {
        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let photo = store::find_photo_on(&tx, photo_id)?
            .ok_or_else(|| StoreError::NotFound(format!("Photo {}", photo_id)))?;
        if photo.owner_id != caller_id {
            return Err(StoreError::PermissionDenied(
                "You don't have permission to update this photo".to_string(),
            ));
        }

        let title = req.title.clone().unwrap_or(photo.title);
        let description = match &req.description {
            Some(d) => Some(d.clone()),
            None => photo.description,
        };
        let search_text = store::search_blob(&[&title, description.as_deref().unwrap_or("")]);
        tx.execute(
            "UPDATE photos SET title = ?1, description = ?2, search_text = ?3 WHERE id = ?4",
            params![title, description, search_text, photo_id],
        )?;
        tx.commit()?;
        Ok(photo_id.to_string())
    }

    pub fn delete_photo(&self, caller_id: &str, photo_id: &str) -> StoreResult<String> {
        let storage_id;
        {
            let mut conn = self.store.conn.lock().unwrap();
            let tx = conn.transaction()?;
            let photo = store::find_photo_on(&tx, photo_id)?
                .ok_or_else(|| StoreError::NotFound(format!("Photo {}", photo_id)))?;
            if photo.owner_id != caller_id {
                return Err(StoreError::PermissionDenied(
                    "You don't have permission to delete this photo".to_string(),
                ));
            }
            let album = store::find_album_on(&tx, &photo.album_id)?;
            delete_photo_cascade_on(&tx, &photo, album.as_ref())?;
            tx.commit()?;
            storage_id = photo.storage_id;
        }
        // The rows are gone either way; file cleanup is best-effort.
        if let Err(e) = self.storage.delete(&storage_id) {
            log::warn!("failed to delete stored file {}: {}", storage_id, e);
        }
        Ok(photo_id.to_string())
    }

    /// Re-parent a batch of photos into another album the caller owns. The
    /// whole batch is validated before anything moves.
    pub fn move_photos(&self, caller_id: &str, req: &MovePhotosRequest) -> StoreResult<usize> {
        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let target = store::find_album_on(&tx, &req.target_album_id)?
            .ok_or_else(|| StoreError::NotFound(format!("Album {}", req.target_album_id)))?;
        if target.owner_id != caller_id {
            return Err(StoreError::PermissionDenied(
                "You don't have permission to move photos into this album".to_string(),
            ));
        }

        let mut moving: Vec<Photo> = Vec::new();
        for photo_id in &req.photo_ids {
            let photo = store::find_photo_on(&tx, photo_id)?
                .ok_or_else(|| StoreError::NotFound(format!("Photo {}", photo_id)))?;
            if photo.owner_id != caller_id {
                return Err(StoreError::PermissionDenied(format!(
                    "You don't have permission to move photo {}",
                    photo_id
                )));
            }
            if photo.album_id != target.id {
                moving.push(photo);
            }
        }
        if moving.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let mut by_source: HashMap<String, Vec<&Photo>> = HashMap::new();
        for photo in &moving {
            by_source.entry(photo.album_id.clone()).or_default().push(photo);
        }

        for photo in &moving {
            tx.execute(
                "UPDATE photos SET album_id = ?1 WHERE id = ?2",
                params![target.id, photo.id],
            )?;
        }

        for (source_id, photos) in &by_source {
            tx.execute(
                "UPDATE albums SET photo_count = MAX(photo_count - ?1, 0), date_updated = ?2 WHERE id = ?3",
                params![photos.len() as i64, now, source_id],
            )?;
            if let Some(source) = store::find_album_on(&tx, source_id)? {
                let cover_moved = source
                    .cover_image
                    .as_deref()
                    .map(|cover| photos.iter().any(|p| p.thumbnail_url == cover))
                    .unwrap_or(false);
                if cover_moved || source.photo_count == 0 {
                    let replacement = remaining_thumbnail_on(&tx, source_id)?;
                    tx.execute(
                        "UPDATE albums SET cover_image = ?1 WHERE id = ?2",
                        params![replacement, source_id],
                    )?;
                }
            }
        }

        tx.execute(
            "UPDATE albums SET photo_count = photo_count + ?1, date_updated = ?2 WHERE id = ?3",
            params![moving.len() as i64, now, target.id],
        )?;
        if target.photo_count == 0 && target.cover_image.is_none() {
            tx.execute(
                "UPDATE albums SET cover_image = ?1 WHERE id = ?2",
                params![moving[0].thumbnail_url, target.id],
            )?;
        }
        tx.commit()?;
        Ok(moving.len())
    }

    // ==================== Likes / Bookmarks ====================

    /// Idempotent: liking a photo twice returns the existing row without a
    /// second counter bump or a second notification.
    pub fn like_photo(&self, caller_id: &str, photo_id: &str) -> StoreResult<String> {
        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let photo = store::find_photo_on(&tx, photo_id)?
            .ok_or_else(|| StoreError::NotFound(format!("Photo {}", photo_id)))?;
        if let Some(existing) = store::find_like_on(&tx, photo_id, caller_id)? {
            return Ok(existing.id);
        }

        let like_id = store::insert_like_on(&tx, photo_id, caller_id)?;
        tx.execute(
            "UPDATE photos SET likes = likes + 1 WHERE id = ?1",
            params![photo_id],
        )?;
        activity::record_on(
            &tx,
            caller_id,
            &photo.owner_id,
            ActivityKind::Like {
                photo_id: photo_id.to_string(),
            },
        )?;
        tx.commit()?;
        Ok(like_id)
    }

    pub fn unlike_photo(&self, caller_id: &str, photo_id: &str) -> StoreResult<String> {
        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if store::find_photo_on(&tx, photo_id)?.is_none() {
            return Err(StoreError::NotFound(format!("Photo {}", photo_id)));
        }
        let like = store::find_like_on(&tx, photo_id, caller_id)?.ok_or_else(|| {
            StoreError::InvalidState("You have not liked this photo".to_string())
        })?;

        tx.execute("DELETE FROM likes WHERE id = ?1", params![like.id])?;
        tx.execute(
            "UPDATE photos SET likes = MAX(likes - 1, 0) WHERE id = ?1",
            params![photo_id],
        )?;
        tx.commit()?;
        Ok(like.id)
    }

    pub fn bookmark_photo(&self, caller_id: &str, photo_id: &str) -> StoreResult<String> {
        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let photo = store::find_photo_on(&tx, photo_id)?
            .ok_or_else(|| StoreError::NotFound(format!("Photo {}", photo_id)))?;
        if let Some(existing) = store::find_bookmark_on(&tx, photo_id, caller_id)? {
            return Ok(existing.id);
        }

        let bookmark_id = store::insert_bookmark_on(&tx, photo_id, caller_id)?;
        activity::record_on(
            &tx,
            caller_id,
            &photo.owner_id,
            ActivityKind::Bookmark {
                photo_id: photo_id.to_string(),
            },
        )?;
        tx.commit()?;
        Ok(bookmark_id)
    }

    pub fn unbookmark_photo(&self, caller_id: &str, photo_id: &str) -> StoreResult<String> {
        let conn = self.store.conn.lock().unwrap();
        let bookmark = store::find_bookmark_on(&conn, photo_id, caller_id)?.ok_or_else(|| {
            StoreError::InvalidState("You have not bookmarked this photo".to_string())
        })?;
        conn.execute("DELETE FROM bookmarks WHERE id = ?1", params![bookmark.id])?;
        Ok(bookmark.id)
    }

    // ==================== Comments ====================

    pub fn add_comment(
        &self,
        caller_id: &str,
        photo_id: &str,
        content: &str,
    ) -> StoreResult<String> {
        let content = content.trim();
        if content.is_empty() {
            return Err(StoreError::InvalidArgument(
                "Comment content must not be empty".to_string(),
            ));
        }

        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let photo = store::find_photo_on(&tx, photo_id)?
            .ok_or_else(|| StoreError::NotFound(format!("Photo {}", photo_id)))?;

        let comment_id = store::insert_comment_on(&tx, photo_id, caller_id, content)?;
        tx.execute(
            "UPDATE photos SET comments = comments + 1 WHERE id = ?1",
            params![photo_id],
        )?;
        activity::record_on(
            &tx,
            caller_id,
            &photo.owner_id,
            ActivityKind::Comment {
                photo_id: photo_id.to_string(),
                comment_id: comment_id.clone(),
            },
        )?;
        tx.commit()?;
        Ok(comment_id)
    }

    /// The comment's author or the photo's owner may delete it.
    pub fn delete_comment(&self, caller_id: &str, comment_id: &str) -> StoreResult<String> {
        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let comment = store::find_comment_on(&tx, comment_id)?
            .ok_or_else(|| StoreError::NotFound(format!("Comment {}", comment_id)))?;

        if comment.user_id != caller_id {
            let owns_photo = store::find_photo_on(&tx, &comment.photo_id)?
                .map(|p| p.owner_id == caller_id)
                .unwrap_or(false);
            if !owns_photo {
                return Err(StoreError::PermissionDenied(
                    "You don't have permission to delete this comment".to_string(),
                ));
            }
        }

        tx.execute("DELETE FROM comments WHERE id = ?1", params![comment_id])?;
        tx.execute(
            "UPDATE photos SET comments = MAX(comments - 1, 0) WHERE id = ?1",
            params![comment.photo_id],
        )?;
        tx.commit()?;
        Ok(comment_id.to_string())
    }

    // ==================== Follows ====================

    pub fn follow(&self, caller_id: &str, followed_id: &str) -> StoreResult<String> {
        if caller_id == followed_id {
            return Err(StoreError::InvalidArgument(
                "You cannot follow yourself".to_string(),
            ));
        }

        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if store::find_user_on(&tx, caller_id)?.is_none() {
            return Err(StoreError::NotFound(format!("User {}", caller_id)));
        }
        if store::find_user_on(&tx, followed_id)?.is_none() {
            return Err(StoreError::NotFound(format!("User {}", followed_id)));
        }
        if let Some(existing) = store::find_follow_on(&tx, caller_id, followed_id)? {
            return Ok(existing.id);
        }

        let follow_id = store::insert_follow_on(&tx, caller_id, followed_id)?;
        tx.execute(
            "UPDATE users SET following_count = following_count + 1 WHERE id = ?1",
            params![caller_id],
        )?;
        tx.execute(
            "UPDATE users SET followers_count = followers_count + 1 WHERE id = ?1",
            params![followed_id],
        )?;
        activity::record_on(&tx, caller_id, followed_id, ActivityKind::Follow)?;
        tx.commit()?;
        Ok(follow_id)
    }

    pub fn unfollow(&self, caller_id: &str, followed_id: &str) -> StoreResult<String> {
        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let follow = store::find_follow_on(&tx, caller_id, followed_id)?.ok_or_else(|| {
            StoreError::InvalidState("You are not following this user".to_string())
        })?;

        tx.execute("DELETE FROM follows WHERE id = ?1", params![follow.id])?;
        tx.execute(
            "UPDATE users SET following_count = MAX(following_count - 1, 0) WHERE id = ?1",
            params![caller_id],
        )?;
        tx.execute(
            "UPDATE users SET followers_count = MAX(followers_count - 1, 0) WHERE id = ?1",
            params![followed_id],
        )?;
        tx.commit()?;
        Ok(follow.id)
    }

    // ==================== Account deletion ====================

    /// Remove a user and everything they own: albums (with their photo
    /// cascades), follow edges in both directions (fixing the surviving
    /// side's counters), and activities where they acted or were notified.
    /// Ordered and idempotent, so a partial run is completed by re-invoking.
    pub fn delete_user(&self, user_id: &str) -> StoreResult<()> {
        let user = self.store.get_user(user_id)?;

        loop {
            let next = {
                let conn = self.store.conn.lock().unwrap();
                store::optional(conn.query_row(
                    "SELECT * FROM albums WHERE owner_id = ?1 LIMIT 1",
                    params![user.id],
                    store::row_to_album,
                ))?
            };
            match next {
                Some(album) => self.delete_album_cascade(&album)?,
                None => break,
            }
        }

        self.remove_follow_edges(&user.id)?;

        let mut conn = self.store.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM activities WHERE actor_id = ?1 OR target_user_id = ?1",
            params![user.id],
        )?;
        tx.execute("DELETE FROM users WHERE id = ?1", params![user.id])?;
        tx.commit()?;
        log::info!("deleted account {}", user.id);
        Ok(())
    }

    fn remove_follow_edges(&self, user_id: &str) -> StoreResult<()> {
        loop {
            let mut conn = self.store.conn.lock().unwrap();
            let edges = follows_touching_on(&conn, user_id, 100)?;
            if edges.is_empty() {
                break;
            }
            for edge in &edges {
                let tx = conn.transaction()?;
                let removed = tx.execute("DELETE FROM follows WHERE id = ?1", params![edge.id])?;
                if removed > 0 {
                    tx.execute(
                        "UPDATE users SET following_count = MAX(following_count - 1, 0) WHERE id = ?1",
                        params![edge.follower_id],
                    )?;
                    tx.execute(
                        "UPDATE users SET followers_count = MAX(followers_count - 1, 0) WHERE id = ?1",
                        params![edge.followed_id],
                    )?;
                }
                tx.commit()?;
            }
        }
        Ok(())
    }
}

/// Remove a photo row together with its likes, comments and bookmarks, and
/// settle the owning album's count and cover. Runs inside the caller's
/// transaction; already-deleted rows make every statement a no-op.
fn delete_photo_cascade_on(
    conn: &Connection,
    photo: &Photo,
    album: Option<&Album>,
) -> StoreResult<()> {
    conn.execute("DELETE FROM likes WHERE photo_id = ?1", params![photo.id])?;
    conn.execute("DELETE FROM comments WHERE photo_id = ?1", params![photo.id])?;
    conn.execute("DELETE FROM bookmarks WHERE photo_id = ?1", params![photo.id])?;
    let removed = conn.execute("DELETE FROM photos WHERE id = ?1", params![photo.id])?;
    if removed == 0 {
        return Ok(());
    }

    conn.execute(
        "UPDATE users SET total_photos = MAX(total_photos - 1, 0) WHERE id = ?1",
        params![photo.owner_id],
    )?;
    if let Some(album) = album {
        conn.execute(
            "UPDATE albums SET photo_count = MAX(photo_count - 1, 0), date_updated = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), album.id],
        )?;
        if album.cover_image.as_deref() == Some(photo.thumbnail_url.as_str()) {
            let replacement = remaining_thumbnail_on(conn, &album.id)?;
            conn.execute(
                "UPDATE albums SET cover_image = ?1 WHERE id = ?2",
                params![replacement, album.id],
            )?;
        }
    }
    Ok(())
}

/// Any surviving photo's thumbnail, or None when the album is empty.
fn remaining_thumbnail_on(conn: &Connection, album_id: &str) -> StoreResult<Option<String>> {
    store::optional(conn.query_row(
        "SELECT thumbnail_url FROM photos WHERE album_id = ?1 LIMIT 1",
        params![album_id],
        |row| row.get(0),
    ))
}

fn photos_in_album_on(conn: &Connection, album_id: &str, limit: i64) -> StoreResult<Vec<Photo>> {
    let mut stmt = conn.prepare("SELECT * FROM photos WHERE album_id = ?1 LIMIT ?2")?;
    let rows = stmt.query_map(params![album_id, limit], store::row_to_photo)?;
    let mut photos = Vec::new();
    for row in rows {
        photos.push(row?);
    }
    Ok(photos)
}

fn follows_touching_on(conn: &Connection, user_id: &str, limit: i64) -> StoreResult<Vec<Follow>> {
    let mut stmt = conn
        .prepare("SELECT * FROM follows WHERE follower_id = ?1 OR followed_id = ?1 LIMIT ?2")?;
    let rows = stmt.query_map(params![user_id, limit], store::row_to_follow)?;
    let mut follows = Vec::new();
    for row in rows {
        follows.push(row?);
    }
    Ok(follows)
}
