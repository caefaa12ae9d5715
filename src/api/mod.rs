use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::activity::Notifications;
use crate::auth::{AuthService, AuthUser, MaybeAuth};
use crate::engine::Engine;
use crate::models::*;
use crate::store::{AlbumFilter, Store, StoreError};

pub struct AppState {
    pub store: Arc<Store>,
    pub engine: Arc<Engine>,
    pub notifications: Arc<Notifications>,
    pub auth_service: Arc<AuthService>,
}

/// Maps the error taxonomy onto status codes. Database/serialization
/// failures are logged and reported opaquely.
fn error_response(err: StoreError) -> HttpResponse {
    let message = err.to_string();
    match err {
        StoreError::NotFound(_) => HttpResponse::NotFound().json(ApiResponse::<()>::error(message)),
        StoreError::PermissionDenied(_) => {
            HttpResponse::Forbidden().json(ApiResponse::<()>::error(message))
        }
        StoreError::InvalidArgument(_) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(message))
        }
        StoreError::Conflict(_) | StoreError::InvalidState(_) => {
            HttpResponse::Conflict().json(ApiResponse::<()>::error(message))
        }
        StoreError::Database(_) | StoreError::Json(_) => {
            log::error!("internal error: {}", message);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Internal error"))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl ListQuery {
    fn page(&self) -> Page {
        Page::new(self.cursor.clone(), self.limit)
    }
}

fn sort_order(order: Option<&str>) -> SortOrder {
    match order {
        Some("asc") => SortOrder::Asc,
        _ => SortOrder::Desc,
    }
}

fn album_sort(query: &ListQuery) -> (AlbumSortKey, SortOrder) {
    match query.sort_by.as_deref() {
        Some("oldest") => (AlbumSortKey::DateCreated, SortOrder::Asc),
        Some("title") => (
            AlbumSortKey::Title,
            match query.order.as_deref() {
                Some("desc") => SortOrder::Desc,
                _ => SortOrder::Asc,
            },
        ),
        Some("updated") => (AlbumSortKey::DateUpdated, sort_order(query.order.as_deref())),
        Some("photoCount") => (AlbumSortKey::PhotoCount, sort_order(query.order.as_deref())),
        _ => (AlbumSortKey::DateCreated, SortOrder::Desc),
    }
}

fn photo_sort(sort_by: Option<&str>) -> (PhotoSortKey, SortOrder) {
    match sort_by {
        Some("oldest") => (PhotoSortKey::DateUploaded, SortOrder::Asc),
        Some("most-liked") | Some("trending") => (PhotoSortKey::Likes, SortOrder::Desc),
        Some("title-az") => (PhotoSortKey::Title, SortOrder::Asc),
        Some("title-za") => (PhotoSortKey::Title, SortOrder::Desc),
        _ => (PhotoSortKey::DateUploaded, SortOrder::Desc),
    }
}

// ==================== Health Check ====================

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

// ==================== Auth Endpoints ====================

pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> impl Responder {
    let password_hash = match state.auth_service.hash_password(&body.password) {
        Ok(hash) => hash,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to hash password"))
        }
    };

    let mut user = User {
        id: String::new(),
        name: body.name.clone(),
        username: body.username.clone(),
        email: body.email.clone(),
        password_hash,
        avatar: body.avatar.clone(),
        joined_at: Utc::now(),
        album_count: 0,
        total_photos: 0,
        followers_count: 0,
        following_count: 0,
        search_text: String::new(),
    };

    if let Err(e) = state.store.create_user(&mut user) {
        return error_response(e);
    }

    let token = match state.auth_service.generate_token(&user.id) {
        Ok(t) => t,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to generate token"))
        }
    };

    HttpResponse::Created().json(ApiResponse::success(LoginResponse { token, user }))
}

pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    let user = match state.store.get_user_by_username(&body.username) {
        Ok(u) => u,
        Err(StoreError::NotFound(_)) => {
            return HttpResponse::Unauthorized()
                .json(ApiResponse::<()>::error("Invalid credentials"));
        }
        Err(e) => return error_response(e),
    };

    let valid = state
        .auth_service
        .verify_password(&body.password, &user.password_hash)
        .unwrap_or(false);
    if !valid {
        return HttpResponse::Unauthorized().json(ApiResponse::<()>::error("Invalid credentials"));
    }

    let token = match state.auth_service.generate_token(&user.id) {
        Ok(t) => t,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to generate token"))
        }
    };

    HttpResponse::Ok().json(ApiResponse::success(LoginResponse { token, user }))
}

pub async fn get_current_user(state: web::Data<AppState>, auth: AuthUser) -> impl Responder {
    match state.store.get_user(&auth.user_id) {
        Ok(user) => HttpResponse::Ok().json(ApiResponse::success(user)),
        Err(e) => error_response(e),
    }
}

/// Full account teardown: albums, photos, reactions, follow edges and
/// notification history all go.
pub async fn delete_account(state: web::Data<AppState>, auth: AuthUser) -> impl Responder {
    match state.engine.delete_user(&auth.user_id) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::success(auth.user_id)),
        Err(e) => error_response(e),
    }
}

// ==================== User Endpoints ====================

pub async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    match state
        .store
        .list_users(query.search.as_deref(), &query.page())
    {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => error_response(e),
    }
}

pub async fn get_user(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.store.get_user(&path.into_inner()) {
        Ok(user) => HttpResponse::Ok().json(ApiResponse::success(user)),
        Err(e) => error_response(e),
    }
}

pub async fn update_profile(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    match state.store.update_profile(&auth.user_id, &body) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::success(auth.user_id)),
        Err(e) => error_response(e),
    }
}

pub async fn list_followers(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    match state.store.list_followers(&path.into_inner(), &query.page()) {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => error_response(e),
    }
}

pub async fn list_following(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    match state.store.list_following(&path.into_inner(), &query.page()) {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => error_response(e),
    }
}

pub async fn is_following(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (follower_id, followed_id) = path.into_inner();
    match state.store.is_following(&follower_id, &followed_id) {
        Ok(following) => {
            HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "following": following })))
        }
        Err(e) => error_response(e),
    }
}

pub async fn follow_user(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.engine.follow(&auth.user_id, &path.into_inner()) {
        Ok(id) => HttpResponse::Created().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

pub async fn unfollow_user(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.engine.unfollow(&auth.user_id, &path.into_inner()) {
        Ok(id) => HttpResponse::Ok().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

// ==================== Album Endpoints ====================

pub async fn create_album(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<CreateAlbumRequest>,
) -> impl Responder {
    match state.engine.create_album(&auth.user_id, &body) {
        Ok(id) => HttpResponse::Created().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

pub async fn list_albums(
    state: web::Data<AppState>,
    maybe: MaybeAuth,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let filter = AlbumFilter {
        owner_id: None,
        requester: maybe.requester().map(String::from),
        search: query.search.clone(),
    };
    let (sort, order) = album_sort(&query);
    match state.store.list_albums(&filter, sort, order, &query.page()) {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => error_response(e),
    }
}

pub async fn list_user_albums(
    state: web::Data<AppState>,
    maybe: MaybeAuth,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let filter = AlbumFilter {
        owner_id: Some(path.into_inner()),
        requester: maybe.requester().map(String::from),
        search: query.search.clone(),
    };
    let (sort, order) = album_sort(&query);
    match state.store.list_albums(&filter, sort, order, &query.page()) {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => error_response(e),
    }
}

pub async fn get_album(
    state: web::Data<AppState>,
    maybe: MaybeAuth,
    path: web::Path<String>,
) -> impl Responder {
    match state.store.album_view(&path.into_inner(), maybe.requester()) {
        Ok(Some(view)) => HttpResponse::Ok().json(ApiResponse::success(view)),
        Ok(None) => HttpResponse::NotFound().json(ApiResponse::<()>::error("Album not found")),
        Err(e) => error_response(e),
    }
}

pub async fn update_album(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateAlbumRequest>,
) -> impl Responder {
    match state.engine.update_album(&auth.user_id, &path.into_inner(), &body) {
        Ok(id) => HttpResponse::Ok().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCoverRequest {
    pub cover_image: String,
}

pub async fn update_album_cover(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateCoverRequest>,
) -> impl Responder {
    match state
        .engine
        .update_album_cover(&auth.user_id, &path.into_inner(), &body.cover_image)
    {
        Ok(id) => HttpResponse::Ok().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

pub async fn delete_album(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.engine.delete_album(&auth.user_id, &path.into_inner()) {
        Ok(id) => HttpResponse::Ok().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

pub async fn list_album_photos(
    state: web::Data<AppState>,
    maybe: MaybeAuth,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let (sort, order) = photo_sort(query.sort_by.as_deref());
    match state.store.list_album_photos(
        &path.into_inner(),
        maybe.requester(),
        query.search.as_deref(),
        sort,
        order,
        &query.page(),
    ) {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => error_response(e),
    }
}

pub async fn add_photo(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<AddPhotoRequest>,
) -> impl Responder {
    match state.engine.add_photo(&auth.user_id, &path.into_inner(), &body) {
        Ok(id) => HttpResponse::Created().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

// ==================== Photo Endpoints ====================

pub async fn explore_photos(
    state: web::Data<AppState>,
    maybe: MaybeAuth,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let (sort, order) = photo_sort(query.sort_by.as_deref());
    match state.store.explore_photos(
        maybe.requester(),
        query.search.as_deref(),
        sort,
        order,
        &query.page(),
    ) {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => error_response(e),
    }
}

pub async fn search_photos(
    state: web::Data<AppState>,
    maybe: MaybeAuth,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let term = query.search.as_deref().unwrap_or("").trim().to_string();
    if term.is_empty() {
        return HttpResponse::Ok().json(ApiResponse::success(PageOf::<PhotoView>::empty()));
    }
    let (sort, order) = photo_sort(query.sort_by.as_deref());
    match state
        .store
        .explore_photos(maybe.requester(), Some(&term), sort, order, &query.page())
    {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => error_response(e),
    }
}

pub async fn list_user_photos(
    state: web::Data<AppState>,
    maybe: MaybeAuth,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    match state
        .store
        .list_user_photos(&path.into_inner(), maybe.requester(), &query.page())
    {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => error_response(e),
    }
}

pub async fn move_photos(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<MovePhotosRequest>,
) -> impl Responder {
    match state.engine.move_photos(&auth.user_id, &body) {
        Ok(moved) => {
            HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "moved": moved })))
        }
        Err(e) => error_response(e),
    }
}

pub async fn get_photo(
    state: web::Data<AppState>,
    maybe: MaybeAuth,
    path: web::Path<String>,
) -> impl Responder {
    match state.store.photo_view(&path.into_inner(), maybe.requester()) {
        Ok(Some(view)) => HttpResponse::Ok().json(ApiResponse::success(view)),
        Ok(None) => HttpResponse::NotFound().json(ApiResponse::<()>::error("Photo not found")),
        Err(e) => error_response(e),
    }
}

pub async fn update_photo(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdatePhotoRequest>,
) -> impl Responder {
    match state.engine.update_photo(&auth.user_id, &path.into_inner(), &body) {
        Ok(id) => HttpResponse::Ok().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

pub async fn delete_photo(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.engine.delete_photo(&auth.user_id, &path.into_inner()) {
        Ok(id) => HttpResponse::Ok().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

pub async fn like_photo(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.engine.like_photo(&auth.user_id, &path.into_inner()) {
        Ok(id) => HttpResponse::Created().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

pub async fn unlike_photo(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.engine.unlike_photo(&auth.user_id, &path.into_inner()) {
        Ok(id) => HttpResponse::Ok().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

pub async fn bookmark_photo(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.engine.bookmark_photo(&auth.user_id, &path.into_inner()) {
        Ok(id) => HttpResponse::Created().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

pub async fn unbookmark_photo(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.engine.unbookmark_photo(&auth.user_id, &path.into_inner()) {
        Ok(id) => HttpResponse::Ok().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

pub async fn list_bookmarks(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<ListQuery>,
) -> impl Responder {
    match state
        .store
        .list_bookmarked_photos(&auth.user_id, &query.page())
    {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => error_response(e),
    }
}

// ==================== Comment Endpoints ====================

pub async fn list_comments(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    match state.store.list_comments(&path.into_inner(), &query.page()) {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => error_response(e),
    }
}

pub async fn add_comment(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<AddCommentRequest>,
) -> impl Responder {
    match state
        .engine
        .add_comment(&auth.user_id, &path.into_inner(), &body.content)
    {
        Ok(id) => HttpResponse::Created().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match state.engine.delete_comment(&auth.user_id, &path.into_inner()) {
        Ok(id) => HttpResponse::Ok().json(ApiResponse::success(id)),
        Err(e) => error_response(e),
    }
}

// ==================== Notification Endpoints ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    pub include_read: Option<bool>,
}

pub async fn list_notifications(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<NotificationsQuery>,
) -> impl Responder {
    let page = Page::new(query.cursor.clone(), query.limit);
    match state.notifications.list(
        &auth.user_id,
        query.include_read.unwrap_or(false),
        &page,
    ) {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub ids: Option<Vec<String>>,
    pub all: Option<bool>,
}

pub async fn mark_notifications_read(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<MarkReadRequest>,
) -> impl Responder {
    let result = if body.all.unwrap_or(false) {
        state.notifications.mark_all_read(&auth.user_id)
    } else {
        let ids = body.ids.clone().unwrap_or_default();
        state.notifications.mark_read(&auth.user_id, &ids)
    };
    match result {
        Ok(count) => {
            HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "count": count })))
        }
        Err(e) => error_response(e),
    }
}

pub async fn unread_notification_count(
    state: web::Data<AppState>,
    auth: AuthUser,
) -> impl Responder {
    match state.notifications.unread_count(&auth.user_id) {
        Ok(count) => {
            HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "count": count })))
        }
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteNotificationsRequest {
    pub ids: Vec<String>,
}

pub async fn delete_notifications(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<DeleteNotificationsRequest>,
) -> impl Responder {
    match state.notifications.delete(&auth.user_id, &body.ids) {
        Ok(count) => {
            HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "count": count })))
        }
        Err(e) => error_response(e),
    }
}

pub async fn clear_notifications(state: web::Data<AppState>, auth: AuthUser) -> impl Responder {
    match state.notifications.clear_all(&auth.user_id) {
        Ok(count) => {
            HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "count": count })))
        }
        Err(e) => error_response(e),
    }
}

// ==================== Route Configuration ====================

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health))

        // Auth
        .route("/api/auth/register", web::post().to(register))
        .route("/api/auth/login", web::post().to(login))
        .route("/api/auth/me", web::get().to(get_current_user))
        .route("/api/auth/me", web::delete().to(delete_account))

        // Users
        .route("/api/users", web::get().to(list_users))
        .route("/api/users/me", web::put().to(update_profile))
        .route("/api/users/{id}", web::get().to(get_user))
        .route("/api/users/{id}/albums", web::get().to(list_user_albums))
        .route("/api/users/{id}/photos", web::get().to(list_user_photos))
        .route("/api/users/{id}/followers", web::get().to(list_followers))
        .route("/api/users/{id}/following", web::get().to(list_following))
        .route("/api/users/{id}/following/{other}", web::get().to(is_following))
        .route("/api/users/{id}/follow", web::post().to(follow_user))
        .route("/api/users/{id}/follow", web::delete().to(unfollow_user))

        // Albums
        .route("/api/albums", web::post().to(create_album))
        .route("/api/albums", web::get().to(list_albums))
        .route("/api/albums/{id}", web::get().to(get_album))
        .route("/api/albums/{id}", web::put().to(update_album))
        .route("/api/albums/{id}", web::delete().to(delete_album))
        .route("/api/albums/{id}/cover", web::put().to(update_album_cover))
        .route("/api/albums/{id}/photos", web::get().to(list_album_photos))
        .route("/api/albums/{id}/photos", web::post().to(add_photo))

        // Photos (fixed segments before the id catch-all)
        .route("/api/photos/explore", web::get().to(explore_photos))
        .route("/api/photos/search", web::get().to(search_photos))
        .route("/api/photos/move", web::post().to(move_photos))
        .route("/api/photos/{id}", web::get().to(get_photo))
        .route("/api/photos/{id}", web::put().to(update_photo))
        .route("/api/photos/{id}", web::delete().to(delete_photo))
        .route("/api/photos/{id}/like", web::post().to(like_photo))
        .route("/api/photos/{id}/like", web::delete().to(unlike_photo))
        .route("/api/photos/{id}/bookmark", web::post().to(bookmark_photo))
        .route("/api/photos/{id}/bookmark", web::delete().to(unbookmark_photo))
        .route("/api/photos/{id}/comments", web::get().to(list_comments))
        .route("/api/photos/{id}/comments", web::post().to(add_comment))
        .route("/api/comments/{id}", web::delete().to(delete_comment))

        // Bookmarked photos for the caller
        .route("/api/bookmarks", web::get().to(list_bookmarks))

        // Notifications
        .route("/api/notifications", web::get().to(list_notifications))
        .route("/api/notifications", web::delete().to(clear_notifications))
        .route("/api/notifications/read", web::post().to(mark_notifications_read))
        .route("/api/notifications/unread-count", web::get().to(unread_notification_count))
        .route("/api/notifications/delete", web::post().to(delete_notifications));
}
