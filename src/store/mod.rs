use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, Row};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;
use crate::privacy::{self, PrivacyCache};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Thread-safe SQLite store. Everything goes through the one connection, so
/// any sequence of statements run under the lock is serialized against all
/// other readers and writers.
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store for testing
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                username TEXT UNIQUE NOT NULL,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                avatar TEXT,
                joined_at TEXT NOT NULL,
                album_count INTEGER NOT NULL DEFAULT 0,
                total_photos INTEGER NOT NULL DEFAULT 0,
                followers_count INTEGER NOT NULL DEFAULT 0,
                following_count INTEGER NOT NULL DEFAULT 0,
                search_text TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS albums (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                is_private INTEGER NOT NULL DEFAULT 0,
                owner_id TEXT NOT NULL,
                photo_count INTEGER NOT NULL DEFAULT 0,
                cover_image TEXT,
                date_created TEXT NOT NULL,
                date_updated TEXT NOT NULL,
                search_text TEXT NOT NULL DEFAULT '',
                FOREIGN KEY (owner_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS photos (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                url TEXT NOT NULL,
                thumbnail_url TEXT NOT NULL,
                album_id TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                date_uploaded TEXT NOT NULL,
                aspect_ratio REAL NOT NULL,
                storage_id TEXT NOT NULL,
                likes INTEGER NOT NULL DEFAULT 0,
                comments INTEGER NOT NULL DEFAULT 0,
                search_text TEXT NOT NULL DEFAULT '',
                FOREIGN KEY (album_id) REFERENCES albums(id),
                FOREIGN KEY (owner_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS likes (
                id TEXT PRIMARY KEY,
                photo_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(photo_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                photo_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS bookmarks (
                id TEXT PRIMARY KEY,
                photo_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, photo_id)
            );

            CREATE TABLE IF NOT EXISTS follows (
                id TEXT PRIMARY KEY,
                follower_id TEXT NOT NULL,
                followed_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(follower_id, followed_id)
            );

            CREATE TABLE IF NOT EXISTS activities (
                id TEXT PRIMARY KEY,
                actor_id TEXT NOT NULL,
                target_user_id TEXT NOT NULL,
                type TEXT NOT NULL,
                photo_id TEXT,
                album_id TEXT,
                comment_id TEXT,
                read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_albums_owner_id ON albums(owner_id);
            CREATE INDEX IF NOT EXISTS idx_albums_is_private ON albums(is_private);
            CREATE INDEX IF NOT EXISTS idx_photos_album_id ON photos(album_id);
            CREATE INDEX IF NOT EXISTS idx_photos_owner_id ON photos(owner_id);
            CREATE INDEX IF NOT EXISTS idx_likes_photo_id ON likes(photo_id);
            CREATE INDEX IF NOT EXISTS idx_likes_user_id ON likes(user_id);
            CREATE INDEX IF NOT EXISTS idx_comments_photo_id ON comments(photo_id);
            CREATE INDEX IF NOT EXISTS idx_comments_user_id ON comments(user_id);
            CREATE INDEX IF NOT EXISTS idx_bookmarks_photo_id ON bookmarks(photo_id);
            CREATE INDEX IF NOT EXISTS idx_bookmarks_user_id ON bookmarks(user_id);
            CREATE INDEX IF NOT EXISTS idx_follows_follower_id ON follows(follower_id);
            CREATE INDEX IF NOT EXISTS idx_follows_followed_id ON follows(followed_id);
            CREATE INDEX IF NOT EXISTS idx_activities_target_read ON activities(target_user_id, read);
            CREATE INDEX IF NOT EXISTS idx_activities_actor_id ON activities(actor_id);
            "#,
        )?;
        Ok(())
    }

    // ==================== User Operations ====================

    pub fn create_user(&self, user: &mut User) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        if username_taken_on(&conn, &user.username, None)? {
            return Err(StoreError::Conflict(format!(
                "Username {} is already taken",
                user.username
            )));
        }

        user.id = Uuid::new_v4().to_string();
        user.joined_at = Utc::now();
        user.album_count = 0;
        user.total_photos = 0;
        user.followers_count = 0;
        user.following_count = 0;
        user.search_text = search_blob(&[&user.name, &user.username, &user.email]);

        let result = conn.execute(
            r#"INSERT INTO users (id, name, username, email, password_hash, avatar, joined_at,
                album_count, total_photos, followers_count, following_count, search_text)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
            params![
                &user.id,
                &user.name,
                &user.username,
                &user.email,
                &user.password_hash,
                &user.avatar,
                user.joined_at.to_rfc3339(),
                user.album_count,
                user.total_photos,
                user.followers_count,
                user.following_count,
                &user.search_text,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Conflict(format!(
                    "Username {} is already taken",
                    user.username
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_user(&self, id: &str) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        find_user_on(&conn, id)?.ok_or_else(|| StoreError::NotFound(format!("User {}", id)))
    }

    pub fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        find_user_on(&conn, id)
    }

    pub fn get_user_by_username(&self, username: &str) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT * FROM users WHERE username = ?1",
            params![username],
            row_to_user,
        ) {
            Ok(user) => Ok(user),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(StoreError::NotFound(format!("User {}", username)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Update profile fields. A username change is re-checked for uniqueness.
    pub fn update_profile(&self, id: &str, req: &UpdateProfileRequest) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let user = find_user_on(&conn, id)?
            .ok_or_else(|| StoreError::NotFound(format!("User {}", id)))?;

        if let Some(username) = &req.username {
            if username != &user.username && username_taken_on(&conn, username, Some(id))? {
                return Err(StoreError::Conflict(format!(
                    "Username {} is already taken",
                    username
                )));
            }
        }

        let name = req.name.clone().unwrap_or(user.name);
        let username = req.username.clone().unwrap_or(user.username);
        let avatar = match &req.avatar {
            Some(a) => Some(a.clone()),
            None => user.avatar,
        };
        let search_text = search_blob(&[&name, &username, &user.email]);

        conn.execute(
            "UPDATE users SET name = ?1, username = ?2, avatar = ?3, search_text = ?4 WHERE id = ?5",
            params![name, username, avatar, search_text, id],
        )?;
        Ok(())
    }

    pub fn list_users(&self, search: Option<&str>, page: &Page) -> StoreResult<PageOf<User>> {
        let conn = self.conn.lock().unwrap();
        let mut conditions = Vec::new();
        let mut values = Vec::new();
        push_search(&mut conditions, &mut values, search);
        let (items, next_cursor) = paged_rows(
            &conn,
            "users",
            conditions,
            values,
            "joined_at",
            SortOrder::Desc,
            page,
            10,
            row_to_user,
        )?;
        Ok(PageOf { items, next_cursor })
    }

    pub fn count_users(&self) -> StoreResult<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    // ==================== Album Operations ====================

    pub fn get_album(&self, id: &str) -> StoreResult<Album> {
        let conn = self.conn.lock().unwrap();
        find_album_on(&conn, id)?.ok_or_else(|| StoreError::NotFound(format!("Album {}", id)))
    }

    /// Single album lookup through the privacy filter: a private album is
    /// indistinguishable from a missing one for anybody but its owner.
    pub fn album_view(&self, id: &str, requester: Option<&str>) -> StoreResult<Option<AlbumView>> {
        let conn = self.conn.lock().unwrap();
        let Some(album) = find_album_on(&conn, id)? else {
            return Ok(None);
        };
        if !privacy::album_visible(&album, requester) {
            return Ok(None);
        }
        let owner = find_user_on(&conn, &album.owner_id)?.map(|u| UserSummary::from(&u));
        Ok(Some(AlbumView { album, owner }))
    }

    pub fn list_albums(
        &self,
        filter: &AlbumFilter,
        sort: AlbumSortKey,
        order: SortOrder,
        page: &Page,
    ) -> StoreResult<PageOf<AlbumView>> {
        let conn = self.conn.lock().unwrap();
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(owner_id) = &filter.owner_id {
            conditions.push("owner_id = ?".to_string());
            values.push(SqlValue::Text(owner_id.clone()));
        }

        // The owner browsing their own shelf sees private albums too.
        let owner_is_requester =
            filter.owner_id.is_some() && filter.owner_id.as_deref() == filter.requester.as_deref();
        if !owner_is_requester {
            match &filter.requester {
                Some(requester) => {
                    conditions.push("(is_private = 0 OR owner_id = ?)".to_string());
                    values.push(SqlValue::Text(requester.clone()));
                }
                None => conditions.push("is_private = 0".to_string()),
            }
        }

        push_search(&mut conditions, &mut values, filter.search.as_deref());

        let (albums, next_cursor) = paged_rows(
            &conn,
            "albums",
            conditions,
            values,
            album_sort_col(sort),
            order,
            page,
            10,
            row_to_album,
        )?;

        let mut owners: HashMap<String, Option<UserSummary>> = HashMap::new();
        let mut items = Vec::with_capacity(albums.len());
        for album in albums {
            if !owners.contains_key(&album.owner_id) {
                let owner = find_user_on(&conn, &album.owner_id)?.map(|u| UserSummary::from(&u));
                owners.insert(album.owner_id.clone(), owner);
            }
            let owner = owners[&album.owner_id].clone();
            items.push(AlbumView { album, owner });
        }
        Ok(PageOf { items, next_cursor })
    }

    // ==================== Photo Operations ====================

    pub fn get_photo(&self, id: &str) -> StoreResult<Photo> {
        let conn = self.conn.lock().unwrap();
        find_photo_on(&conn, id)?.ok_or_else(|| StoreError::NotFound(format!("Photo {}", id)))
    }

    /// Single photo lookup: resolved through its album for privacy, enriched
    /// with the requester's like/bookmark state.
    pub fn photo_view(&self, id: &str, requester: Option<&str>) -> StoreResult<Option<PhotoView>> {
        let conn = self.conn.lock().unwrap();
        let Some(photo) = find_photo_on(&conn, id)? else {
            return Ok(None);
        };
        let Some(album) = find_album_on(&conn, &photo.album_id)? else {
            // A photo whose album is gone must never be served.
            return Ok(None);
        };
        if !privacy::album_visible(&album, requester) {
            return Ok(None);
        }

        let is_liked = match requester {
            Some(uid) => find_like_on(&conn, id, uid)?.is_some(),
            None => false,
        };
        let is_bookmarked = match requester {
            Some(uid) => find_bookmark_on(&conn, id, uid)?.is_some(),
            None => false,
        };
        let owner = find_user_on(&conn, &photo.owner_id)?.map(|u| UserSummary::from(&u));
        let album_summary = AlbumSummary::from(&album);
        Ok(Some(PhotoView {
            is_liked,
            is_bookmarked,
            owner,
            album: Some(album_summary),
            photo,
        }))
    }

    /// Photos of one album. An invisible or missing album yields an empty
    /// page rather than an error, so callers cannot probe for private albums.
    pub fn list_album_photos(
        &self,
        album_id: &str,
        requester: Option<&str>,
        search: Option<&str>,
        sort: PhotoSortKey,
        order: SortOrder,
        page: &Page,
    ) -> StoreResult<PageOf<PhotoView>> {
        let conn = self.conn.lock().unwrap();
        let Some(album) = find_album_on(&conn, album_id)? else {
            return Ok(PageOf::empty());
        };
        if !privacy::album_visible(&album, requester) {
            return Ok(PageOf::empty());
        }

        let mut conditions = vec!["album_id = ?".to_string()];
        let mut values = vec![SqlValue::Text(album_id.to_string())];
        push_search(&mut conditions, &mut values, search);

        let (photos, next_cursor) = paged_rows(
            &conn,
            "photos",
            conditions,
            values,
            photo_sort_col(sort),
            order,
            page,
            20,
            row_to_photo,
        )?;
        let items = photo_views_on(&conn, photos, requester)?;
        Ok(PageOf { items, next_cursor })
    }

    /// Photos uploaded by one user, newest first. Photos in private albums
    /// are filtered out after the page is fetched, so a page may come back
    /// short; the cursor still advances over the unfiltered rows.
    pub fn list_user_photos(
        &self,
        owner_id: &str,
        requester: Option<&str>,
        page: &Page,
    ) -> StoreResult<PageOf<PhotoView>> {
        let conn = self.conn.lock().unwrap();
        let conditions = vec!["owner_id = ?".to_string()];
        let values = vec![SqlValue::Text(owner_id.to_string())];
        let (photos, next_cursor) = paged_rows(
            &conn,
            "photos",
            conditions,
            values,
            "date_uploaded",
            SortOrder::Desc,
            page,
            20,
            row_to_photo,
        )?;
        let photos = if requester == Some(owner_id) {
            photos
        } else {
            visible_photos_on(&conn, photos, requester)?
        };
        let items = photo_views_on(&conn, photos, requester)?;
        Ok(PageOf { items, next_cursor })
    }

    /// Public browsing across all albums, with optional substring search.
    pub fn explore_photos(
        &self,
        requester: Option<&str>,
        search: Option<&str>,
        sort: PhotoSortKey,
        order: SortOrder,
        page: &Page,
    ) -> StoreResult<PageOf<PhotoView>> {
        let conn = self.conn.lock().unwrap();
        let mut conditions = Vec::new();
        let mut values = Vec::new();
        push_search(&mut conditions, &mut values, search);

        let (photos, next_cursor) = paged_rows(
            &conn,
            "photos",
            conditions,
            values,
            photo_sort_col(sort),
            order,
            page,
            20,
            row_to_photo,
        )?;
        let photos = visible_photos_on(&conn, photos, requester)?;
        let items = photo_views_on(&conn, photos, requester)?;
        Ok(PageOf { items, next_cursor })
    }

    /// A user's saved photos, newest bookmark first. Vanished photos and
    /// photos that went private under someone else's account are dropped.
    pub fn list_bookmarked_photos(
        &self,
        user_id: &str,
        page: &Page,
    ) -> StoreResult<PageOf<BookmarkedPhoto>> {
        let conn = self.conn.lock().unwrap();
        let conditions = vec!["user_id = ?".to_string()];
        let values = vec![SqlValue::Text(user_id.to_string())];
        let (bookmarks, next_cursor) = paged_rows(
            &conn,
            "bookmarks",
            conditions,
            values,
            "created_at",
            SortOrder::Desc,
            page,
            20,
            row_to_bookmark,
        )?;

        let mut cache = PrivacyCache::new(Some(user_id));
        let mut items = Vec::with_capacity(bookmarks.len());
        for bookmark in bookmarks {
            let Some(photo) = find_photo_on(&conn, &bookmark.photo_id)? else {
                continue;
            };
            if !cache.photo_visible(&photo, |id| find_album_on(&conn, id))? {
                continue;
            }
            let album = find_album_on(&conn, &photo.album_id)?;
            let owner = find_user_on(&conn, &photo.owner_id)?.map(|u| UserSummary::from(&u));
            items.push(BookmarkedPhoto {
                bookmarked_at: bookmark.created_at,
                owner,
                album: album.as_ref().map(AlbumSummary::from),
                photo,
            });
        }
        Ok(PageOf { items, next_cursor })
    }

    // ==================== Like / Bookmark Lookups ====================

    pub fn find_like(&self, photo_id: &str, user_id: &str) -> StoreResult<Option<Like>> {
        let conn = self.conn.lock().unwrap();
        find_like_on(&conn, photo_id, user_id)
    }

    pub fn find_bookmark(&self, photo_id: &str, user_id: &str) -> StoreResult<Option<Bookmark>> {
        let conn = self.conn.lock().unwrap();
        find_bookmark_on(&conn, photo_id, user_id)
    }

    // ==================== Comment Operations ====================

    pub fn get_comment(&self, id: &str) -> StoreResult<Comment> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT * FROM comments WHERE id = ?1",
            params![id],
            row_to_comment,
        ) {
            Ok(comment) => Ok(comment),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(StoreError::NotFound(format!("Comment {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_comments(&self, photo_id: &str, page: &Page) -> StoreResult<PageOf<CommentView>> {
        let conn = self.conn.lock().unwrap();
        let conditions = vec!["photo_id = ?".to_string()];
        let values = vec![SqlValue::Text(photo_id.to_string())];
        let (comments, next_cursor) = paged_rows(
            &conn,
            "comments",
            conditions,
            values,
            "created_at",
            SortOrder::Desc,
            page,
            10,
            row_to_comment,
        )?;

        let mut users: HashMap<String, Option<UserSummary>> = HashMap::new();
        let mut items = Vec::with_capacity(comments.len());
        for comment in comments {
            if !users.contains_key(&comment.user_id) {
                let user = find_user_on(&conn, &comment.user_id)?.map(|u| UserSummary::from(&u));
                users.insert(comment.user_id.clone(), user);
            }
            let user = users[&comment.user_id].clone();
            items.push(CommentView { comment, user });
        }
        Ok(PageOf { items, next_cursor })
    }

    // ==================== Follow Operations ====================

    pub fn find_follow(&self, follower_id: &str, followed_id: &str) -> StoreResult<Option<Follow>> {
        let conn = self.conn.lock().unwrap();
        find_follow_on(&conn, follower_id, followed_id)
    }

    pub fn is_following(&self, follower_id: &str, followed_id: &str) -> StoreResult<bool> {
        Ok(self.find_follow(follower_id, followed_id)?.is_some())
    }

    pub fn list_followers(&self, user_id: &str, page: &Page) -> StoreResult<PageOf<User>> {
        self.follow_edge_users(user_id, "followed_id", |f| f.follower_id.clone(), page)
    }

    pub fn list_following(&self, user_id: &str, page: &Page) -> StoreResult<PageOf<User>> {
        self.follow_edge_users(user_id, "follower_id", |f| f.followed_id.clone(), page)
    }

    fn follow_edge_users(
        &self,
        user_id: &str,
        filter_col: &str,
        pick: impl Fn(&Follow) -> String,
        page: &Page,
    ) -> StoreResult<PageOf<User>> {
        let conn = self.conn.lock().unwrap();
        let conditions = vec![format!("{} = ?", filter_col)];
        let values = vec![SqlValue::Text(user_id.to_string())];
        let (follows, next_cursor) = paged_rows(
            &conn,
            "follows",
            conditions,
            values,
            "created_at",
            SortOrder::Desc,
            page,
            10,
            row_to_follow,
        )?;

        // Deleted accounts leave no user row; their edges are skipped.
        let mut items = Vec::with_capacity(follows.len());
        for follow in &follows {
            if let Some(user) = find_user_on(&conn, &pick(follow))? {
                items.push(user);
            }
        }
        Ok(PageOf { items, next_cursor })
    }
}

/// Filter spec for album listings, built once per request.
#[derive(Debug, Default)]
pub struct AlbumFilter {
    pub owner_id: Option<String>,
    pub requester: Option<String>,
    pub search: Option<String>,
}

// ==================== Row mappers ====================

pub(crate) fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        avatar: row.get("avatar")?,
        joined_at: parse_datetime(row.get::<_, String>("joined_at")?),
        album_count: row.get("album_count")?,
        total_photos: row.get("total_photos")?,
        followers_count: row.get("followers_count")?,
        following_count: row.get("following_count")?,
        search_text: row.get("search_text")?,
    })
}

pub(crate) fn row_to_album(row: &Row) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        is_private: row.get("is_private")?,
        owner_id: row.get("owner_id")?,
        photo_count: row.get("photo_count")?,
        cover_image: row.get("cover_image")?,
        date_created: parse_datetime(row.get::<_, String>("date_created")?),
        date_updated: parse_datetime(row.get::<_, String>("date_updated")?),
        search_text: row.get("search_text")?,
    })
}

pub(crate) fn row_to_photo(row: &Row) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        url: row.get("url")?,
        thumbnail_url: row.get("thumbnail_url")?,
        album_id: row.get("album_id")?,
        owner_id: row.get("owner_id")?,
        date_uploaded: parse_datetime(row.get::<_, String>("date_uploaded")?),
        aspect_ratio: row.get("aspect_ratio")?,
        storage_id: row.get("storage_id")?,
        likes: row.get("likes")?,
        comments: row.get("comments")?,
        search_text: row.get("search_text")?,
    })
}

pub(crate) fn row_to_like(row: &Row) -> rusqlite::Result<Like> {
    Ok(Like {
        id: row.get("id")?,
        photo_id: row.get("photo_id")?,
        user_id: row.get("user_id")?,
        created_at: parse_datetime(row.get::<_, String>("created_at")?),
    })
}

pub(crate) fn row_to_comment(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        photo_id: row.get("photo_id")?,
        user_id: row.get("user_id")?,
        content: row.get("content")?,
        created_at: parse_datetime(row.get::<_, String>("created_at")?),
    })
}

pub(crate) fn row_to_bookmark(row: &Row) -> rusqlite::Result<Bookmark> {
    Ok(Bookmark {
        id: row.get("id")?,
        photo_id: row.get("photo_id")?,
        user_id: row.get("user_id")?,
        created_at: parse_datetime(row.get::<_, String>("created_at")?),
    })
}

pub(crate) fn row_to_follow(row: &Row) -> rusqlite::Result<Follow> {
    Ok(Follow {
        id: row.get("id")?,
        follower_id: row.get("follower_id")?,
        followed_id: row.get("followed_id")?,
        created_at: parse_datetime(row.get::<_, String>("created_at")?),
    })
}

pub(crate) fn row_to_activity(row: &Row) -> rusqlite::Result<Activity> {
    let type_name: String = row.get("type")?;
    let kind = ActivityKind::from_columns(
        &type_name,
        row.get("photo_id")?,
        row.get("album_id")?,
        row.get("comment_id")?,
    )
    .ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("malformed activity row of type {}", type_name).into(),
        )
    })?;
    Ok(Activity {
        id: row.get("id")?,
        actor_id: row.get("actor_id")?,
        target_user_id: row.get("target_user_id")?,
        kind,
        read: row.get("read")?,
        created_at: parse_datetime(row.get::<_, String>("created_at")?),
    })
}

// ==================== Connection-level helpers ====================
//
// These operate on a borrowed connection so the engine can compose them
// inside a single transaction; a `rusqlite::Transaction` derefs to
// `Connection` and can be passed directly.

pub(crate) fn find_user_on(conn: &Connection, id: &str) -> StoreResult<Option<User>> {
    optional(conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], row_to_user))
}

pub(crate) fn find_album_on(conn: &Connection, id: &str) -> StoreResult<Option<Album>> {
    optional(conn.query_row("SELECT * FROM albums WHERE id = ?1", params![id], row_to_album))
}

pub(crate) fn find_photo_on(conn: &Connection, id: &str) -> StoreResult<Option<Photo>> {
    optional(conn.query_row("SELECT * FROM photos WHERE id = ?1", params![id], row_to_photo))
}

pub(crate) fn find_comment_on(conn: &Connection, id: &str) -> StoreResult<Option<Comment>> {
    optional(conn.query_row(
        "SELECT * FROM comments WHERE id = ?1",
        params![id],
        row_to_comment,
    ))
}

pub(crate) fn find_like_on(
    conn: &Connection,
    photo_id: &str,
    user_id: &str,
) -> StoreResult<Option<Like>> {
    optional(conn.query_row(
        "SELECT * FROM likes WHERE photo_id = ?1 AND user_id = ?2",
        params![photo_id, user_id],
        row_to_like,
    ))
}

pub(crate) fn find_bookmark_on(
    conn: &Connection,
    photo_id: &str,
    user_id: &str,
) -> StoreResult<Option<Bookmark>> {
    optional(conn.query_row(
        "SELECT * FROM bookmarks WHERE photo_id = ?1 AND user_id = ?2",
        params![photo_id, user_id],
        row_to_bookmark,
    ))
}

pub(crate) fn find_follow_on(
    conn: &Connection,
    follower_id: &str,
    followed_id: &str,
) -> StoreResult<Option<Follow>> {
    optional(conn.query_row(
        "SELECT * FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
        params![follower_id, followed_id],
        row_to_follow,
    ))
}

pub(crate) fn optional<T>(result: rusqlite::Result<T>) -> StoreResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn username_taken_on(
    conn: &Connection,
    username: &str,
    excluding: Option<&str>,
) -> StoreResult<bool> {
    let count: i64 = match excluding {
        Some(id) => conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1 AND id != ?2",
            params![username, id],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )?,
    };
    Ok(count > 0)
}

pub(crate) fn insert_album_on(conn: &Connection, album: &mut Album) -> StoreResult<()> {
    album.id = Uuid::new_v4().to_string();
    let now = Utc::now();
    album.date_created = now;
    album.date_updated = now;
    album.search_text = search_blob(&[&album.title, album.description.as_deref().unwrap_or("")]);

    conn.execute(
        r#"INSERT INTO albums (id, title, description, is_private, owner_id, photo_count,
            cover_image, date_created, date_updated, search_text)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
        params![
            &album.id,
            &album.title,
            &album.description,
            album.is_private,
            &album.owner_id,
            album.photo_count,
            &album.cover_image,
            album.date_created.to_rfc3339(),
            album.date_updated.to_rfc3339(),
            &album.search_text,
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_photo_on(conn: &Connection, photo: &mut Photo) -> StoreResult<()> {
    photo.id = Uuid::new_v4().to_string();
    photo.date_uploaded = Utc::now();
    photo.likes = 0;
    photo.comments = 0;
    photo.search_text = search_blob(&[&photo.title, photo.description.as_deref().unwrap_or("")]);

    conn.execute(
        r#"INSERT INTO photos (id, title, description, url, thumbnail_url, album_id, owner_id,
            date_uploaded, aspect_ratio, storage_id, likes, comments, search_text)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"#,
        params![
            &photo.id,
            &photo.title,
            &photo.description,
            &photo.url,
            &photo.thumbnail_url,
            &photo.album_id,
            &photo.owner_id,
            photo.date_uploaded.to_rfc3339(),
            photo.aspect_ratio,
            &photo.storage_id,
            photo.likes,
            photo.comments,
            &photo.search_text,
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_like_on(
    conn: &Connection,
    photo_id: &str,
    user_id: &str,
) -> StoreResult<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO likes (id, photo_id, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, photo_id, user_id, Utc::now().to_rfc3339()],
    )?;
    Ok(id)
}

pub(crate) fn insert_bookmark_on(
    conn: &Connection,
    photo_id: &str,
    user_id: &str,
) -> StoreResult<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO bookmarks (id, photo_id, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, photo_id, user_id, Utc::now().to_rfc3339()],
    )?;
    Ok(id)
}

pub(crate) fn insert_comment_on(
    conn: &Connection,
    photo_id: &str,
    user_id: &str,
    content: &str,
) -> StoreResult<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO comments (id, photo_id, user_id, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, photo_id, user_id, content, Utc::now().to_rfc3339()],
    )?;
    Ok(id)
}

pub(crate) fn insert_follow_on(
    conn: &Connection,
    follower_id: &str,
    followed_id: &str,
) -> StoreResult<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO follows (id, follower_id, followed_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, follower_id, followed_id, Utc::now().to_rfc3339()],
    )?;
    Ok(id)
}

pub(crate) fn insert_activity_on(
    conn: &Connection,
    actor_id: &str,
    target_user_id: &str,
    kind: &ActivityKind,
) -> StoreResult<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        r#"INSERT INTO activities (id, actor_id, target_user_id, type, photo_id, album_id,
            comment_id, read, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)"#,
        params![
            id,
            actor_id,
            target_user_id,
            kind.type_name(),
            kind.photo_id(),
            kind.album_id(),
            kind.comment_id(),
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(id)
}

/// Lowercase blob the substring search runs against.
pub(crate) fn search_blob(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn push_search(conditions: &mut Vec<String>, values: &mut Vec<SqlValue>, search: Option<&str>) {
    if let Some(term) = search {
        let term = term.trim();
        if !term.is_empty() {
            conditions.push("instr(search_text, ?) > 0".to_string());
            values.push(SqlValue::Text(term.to_lowercase()));
        }
    }
}

// ==================== Cursor pagination ====================

/// Seek-based page fetch. Total order is (sort column, id ASC); the cursor
/// is the id of the previous page's last row, resolved to its sort value so
/// the page picks up strictly after it. A full page yields a cursor even
/// when it happens to be the final one.
fn paged_rows<T>(
    conn: &Connection,
    table: &str,
    mut conditions: Vec<String>,
    mut values: Vec<SqlValue>,
    sort_col: &str,
    order: SortOrder,
    page: &Page,
    default_limit: i64,
    map: impl Fn(&Row) -> rusqlite::Result<T>,
) -> StoreResult<(Vec<T>, Option<String>)> {
    let limit = page.limit(default_limit);

    if let Some(cursor) = &page.cursor {
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", sort_col, table);
        let value = optional(conn.query_row(&sql, params![cursor], |row| {
            row.get::<_, SqlValue>(0)
        }))?;
        // The cursor row is gone; there is nothing to order against, and
        // callers already tolerate an empty follow-up page.
        let Some(value) = value else {
            return Ok((Vec::new(), None));
        };
        let cmp = match order {
            SortOrder::Asc => ">",
            SortOrder::Desc => "<",
        };
        conditions.push(format!(
            "({col} {cmp} ? OR ({col} = ? AND id > ?))",
            col = sort_col,
            cmp = cmp
        ));
        values.push(value.clone());
        values.push(value);
        values.push(SqlValue::Text(cursor.clone()));
    }

    let dir = match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let sql = format!(
        "SELECT * FROM {}{} ORDER BY {} {}, id ASC LIMIT ?",
        table, where_clause, sort_col, dir
    );
    values.push(SqlValue::Integer(limit));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values), |row| {
        Ok((row.get::<_, String>("id")?, map(row)?))
    })?;

    let mut items = Vec::new();
    let mut last_id = None;
    for row in rows {
        let (id, item) = row?;
        last_id = Some(id);
        items.push(item);
    }
    let next_cursor = if items.len() as i64 == limit { last_id } else { None };
    Ok((items, next_cursor))
}

fn album_sort_col(key: AlbumSortKey) -> &'static str {
    match key {
        AlbumSortKey::DateCreated => "date_created",
        AlbumSortKey::DateUpdated => "date_updated",
        AlbumSortKey::Title => "title COLLATE NOCASE",
        AlbumSortKey::PhotoCount => "photo_count",
    }
}

fn photo_sort_col(key: PhotoSortKey) -> &'static str {
    match key {
        PhotoSortKey::DateUploaded => "date_uploaded",
        PhotoSortKey::Title => "title COLLATE NOCASE",
        PhotoSortKey::Likes => "likes",
    }
}

// ==================== Enrichment ====================

/// Drop photos the requester may not see. One album lookup per distinct
/// album id per call, memoized by the privacy cache.
fn visible_photos_on(
    conn: &Connection,
    photos: Vec<Photo>,
    requester: Option<&str>,
) -> StoreResult<Vec<Photo>> {
    let mut cache = PrivacyCache::new(requester);
    let mut out = Vec::with_capacity(photos.len());
    for photo in photos {
        if cache.photo_visible(&photo, |id| find_album_on(conn, id))? {
            out.push(photo);
        }
    }
    Ok(out)
}

fn photo_views_on(
    conn: &Connection,
    photos: Vec<Photo>,
    requester: Option<&str>,
) -> StoreResult<Vec<PhotoView>> {
    let (liked, bookmarked) = match requester {
        Some(uid) => (
            photo_id_set_on(conn, "likes", uid)?,
            photo_id_set_on(conn, "bookmarks", uid)?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    let mut users: HashMap<String, Option<UserSummary>> = HashMap::new();
    let mut albums: HashMap<String, Option<AlbumSummary>> = HashMap::new();
    let mut out = Vec::with_capacity(photos.len());
    for photo in photos {
        if !users.contains_key(&photo.owner_id) {
            let user = find_user_on(conn, &photo.owner_id)?.map(|u| UserSummary::from(&u));
            users.insert(photo.owner_id.clone(), user);
        }
        if !albums.contains_key(&photo.album_id) {
            let album = find_album_on(conn, &photo.album_id)?;
            albums.insert(photo.album_id.clone(), album.as_ref().map(AlbumSummary::from));
        }
        out.push(PhotoView {
            is_liked: liked.contains(&photo.id),
            is_bookmarked: bookmarked.contains(&photo.id),
            owner: users[&photo.owner_id].clone(),
            album: albums[&photo.album_id].clone(),
            photo,
        });
    }
    Ok(out)
}

fn photo_id_set_on(conn: &Connection, table: &str, user_id: &str) -> StoreResult<HashSet<String>> {
    let sql = format!("SELECT photo_id FROM {} WHERE user_id = ?1", table);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;
    let mut out = HashSet::new();
    for row in rows {
        out.insert(row?);
    }
    Ok(out)
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
