use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile plus the denormalized counters maintained by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub avatar: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub album_count: i64,
    pub total_photos: i64,
    pub followers_count: i64,
    pub following_count: i64,
    #[serde(skip_serializing, default)]
    pub search_text: String,
}

/// Album owned by a single user. `photo_count` mirrors the number of photos
/// referencing the album; `cover_image` tracks a thumbnail of one of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub owner_id: String,
    pub photo_count: i64,
    pub cover_image: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    #[serde(skip_serializing, default)]
    pub search_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub thumbnail_url: String,
    pub album_id: String,
    pub owner_id: String,
    pub date_uploaded: DateTime<Utc>,
    pub aspect_ratio: f64,
    /// Opaque handle into the external file store, kept for deletion.
    pub storage_id: String,
    pub likes: i64,
    pub comments: i64,
    #[serde(skip_serializing, default)]
    pub search_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: String,
    pub photo_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub photo_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub photo_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: String,
    pub follower_id: String,
    pub followed_id: String,
    pub created_at: DateTime<Utc>,
}

/// Notification record routed to `target_user_id`. The actor and target are
/// never the same user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub actor_id: String,
    pub target_user_id: String,
    #[serde(flatten)]
    pub kind: ActivityKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Closed set of notifiable actions. Each variant carries exactly the
/// references its enrichment needs, so a `follow` can never hold a photo id
/// and a `comment` can never lack one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ActivityKind {
    Like { photo_id: String },
    Comment { photo_id: String, comment_id: String },
    Bookmark { photo_id: String },
    Follow,
    AlbumComment { album_id: String, comment_id: String },
}

impl ActivityKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ActivityKind::Like { .. } => "like",
            ActivityKind::Comment { .. } => "comment",
            ActivityKind::Bookmark { .. } => "bookmark",
            ActivityKind::Follow => "follow",
            ActivityKind::AlbumComment { .. } => "album_comment",
        }
    }

    pub fn photo_id(&self) -> Option<&str> {
        match self {
            ActivityKind::Like { photo_id }
            | ActivityKind::Comment { photo_id, .. }
            | ActivityKind::Bookmark { photo_id } => Some(photo_id),
            _ => None,
        }
    }

    pub fn album_id(&self) -> Option<&str> {
        match self {
            ActivityKind::AlbumComment { album_id, .. } => Some(album_id),
            _ => None,
        }
    }

    pub fn comment_id(&self) -> Option<&str> {
        match self {
            ActivityKind::Comment { comment_id, .. }
            | ActivityKind::AlbumComment { comment_id, .. } => Some(comment_id),
            _ => None,
        }
    }

    /// Rebuild the variant from the stored type tag and reference columns.
    /// Returns None when the columns do not satisfy the variant's contract.
    pub fn from_columns(
        type_name: &str,
        photo_id: Option<String>,
        album_id: Option<String>,
        comment_id: Option<String>,
    ) -> Option<ActivityKind> {
        match type_name {
            "like" => Some(ActivityKind::Like { photo_id: photo_id? }),
            "comment" => Some(ActivityKind::Comment {
                photo_id: photo_id?,
                comment_id: comment_id?,
            }),
            "bookmark" => Some(ActivityKind::Bookmark { photo_id: photo_id? }),
            "follow" => Some(ActivityKind::Follow),
            "album_comment" => Some(ActivityKind::AlbumComment {
                album_id: album_id?,
                comment_id: comment_id?,
            }),
            _ => None,
        }
    }
}

// ==================== Pagination ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumSortKey {
    DateCreated,
    DateUpdated,
    Title,
    PhotoCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSortKey {
    DateUploaded,
    Title,
    Likes,
}

/// Cursor page request. The cursor is the id of the last row of the previous
/// page; limits are clamped to 1..=100.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

impl Page {
    pub fn new(cursor: Option<String>, limit: Option<i64>) -> Self {
        Self { cursor, limit }
    }

    pub fn limit(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, 100)
    }
}

/// One page of results. `next_cursor` is set iff the page is full, which is
/// a "maybe more" signal, not a promise: the follow-up page may be empty.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOf<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> PageOf<T> {
    pub fn empty() -> Self {
        Self { items: Vec::new(), next_cursor: None }
    }
}

// ==================== Enriched query views ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub username: String,
    pub avatar: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    pub id: String,
    pub title: String,
    pub is_private: bool,
}

impl From<&Album> for AlbumSummary {
    fn from(album: &Album) -> Self {
        Self {
            id: album.id.clone(),
            title: album.title.clone(),
            is_private: album.is_private,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumView {
    #[serde(flatten)]
    pub album: Album,
    pub owner: Option<UserSummary>,
}

/// Photo plus the per-requester flags and joins the grids display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoView {
    #[serde(flatten)]
    pub photo: Photo,
    pub is_liked: bool,
    pub is_bookmarked: bool,
    pub owner: Option<UserSummary>,
    pub album: Option<AlbumSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkedPhoto {
    #[serde(flatten)]
    pub photo: Photo,
    pub bookmarked_at: DateTime<Utc>,
    pub owner: Option<UserSummary>,
    pub album: Option<AlbumSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: Option<UserSummary>,
}

/// Activity joined with whatever referenced entities still exist. A deleted
/// photo/album/comment leaves the corresponding field null rather than
/// failing the listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    #[serde(flatten)]
    pub activity: Activity,
    pub actor: Option<UserSummary>,
    pub photo: Option<Photo>,
    pub album: Option<AlbumSummary>,
    pub comment: Option<Comment>,
}

// ==================== Request types ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlbumRequest {
    pub title: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub cover_image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlbumRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_private: Option<bool>,
    pub cover_image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPhotoRequest {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub thumbnail_url: String,
    pub storage_id: String,
    pub aspect_ratio: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhotoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePhotosRequest {
    pub target_album_id: String,
    pub photo_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub content: String,
}

// ==================== Response envelope ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_kind_round_trips_through_columns() {
        let kind = ActivityKind::Comment {
            photo_id: "p1".to_string(),
            comment_id: "c1".to_string(),
        };
        let rebuilt = ActivityKind::from_columns(
            kind.type_name(),
            kind.photo_id().map(String::from),
            kind.album_id().map(String::from),
            kind.comment_id().map(String::from),
        );
        assert_eq!(rebuilt, Some(kind));
    }

    #[test]
    fn activity_kind_rejects_missing_references() {
        assert_eq!(ActivityKind::from_columns("like", None, None, None), None);
        assert_eq!(
            ActivityKind::from_columns("album_comment", None, Some("a1".into()), None),
            None
        );
        assert_eq!(ActivityKind::from_columns("poke", None, None, None), None);
    }

    #[test]
    fn follow_carries_no_references() {
        let kind = ActivityKind::from_columns("follow", None, None, None).unwrap();
        assert_eq!(kind, ActivityKind::Follow);
        assert_eq!(kind.photo_id(), None);
        assert_eq!(kind.comment_id(), None);
    }

    #[test]
    fn page_limit_is_clamped() {
        assert_eq!(Page::new(None, None).limit(20), 20);
        assert_eq!(Page::new(None, Some(500)).limit(20), 100);
        assert_eq!(Page::new(None, Some(0)).limit(20), 1);
    }

    #[test]
    fn activity_serializes_with_flattened_kind() {
        let activity = Activity {
            id: "a1".to_string(),
            actor_id: "u1".to_string(),
            target_user_id: "u2".to_string(),
            kind: ActivityKind::Like { photo_id: "p1".to_string() },
            read: false,
            created_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "like");
        assert_eq!(json["photoId"], "p1");
        assert_eq!(json["read"], false);
    }
}
