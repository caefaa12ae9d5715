use actix_web::{test, web, App};
use serde_json::json;
use std::sync::Arc;

use gallery_server::activity::Notifications;
use gallery_server::api::{self, AppState};
use gallery_server::auth::AuthService;
use gallery_server::engine::Engine;
use gallery_server::models::Page;
use gallery_server::store::{Store, StoreError};

fn create_app_state(store: Arc<Store>, auth_service: Arc<AuthService>) -> AppState {
    AppState {
        store: store.clone(),
        engine: Arc::new(Engine::new(store.clone())),
        notifications: Arc::new(Notifications::new(store)),
        auth_service,
    }
}

macro_rules! init_app {
    ($store:expr, $auth:expr) => {{
        test::init_service(
            App::new()
                .app_data(web::Data::new($auth.clone()))
                .app_data(web::Data::new(create_app_state($store.clone(), $auth.clone())))
                .configure(api::configure_routes),
        )
        .await
    }};
}

macro_rules! register_and_get_token_id {
    ($app:expr, $username:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "name": format!("{} Example", $username),
                "username": $username,
                "email": format!("{}@example.com", $username),
                "password": "password123"
            }))
            .to_request();

        let resp: serde_json::Value = test::call_and_read_body_json(&$app, req).await;
        let token = resp["data"]["token"].as_str().unwrap().to_string();
        let user_id = resp["data"]["user"]["id"].as_str().unwrap().to_string();
        (token, user_id)
    }};
}

macro_rules! create_album {
    ($app:expr, $token:expr, $title:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/albums")
            .insert_header(("Authorization", format!("Bearer {}", $token)))
            .set_json(json!({ "title": $title, "isPrivate": false }))
            .to_request();

        let resp: serde_json::Value = test::call_and_read_body_json(&$app, req).await;
        resp["data"].as_str().unwrap().to_string()
    }};
}

macro_rules! add_photo {
    ($app:expr, $token:expr, $album_id:expr, $title:expr) => {{
        let req = test::TestRequest::post()
            .uri(&format!("/api/albums/{}/photos", $album_id))
            .insert_header(("Authorization", format!("Bearer {}", $token)))
            .set_json(json!({
                "title": $title,
                "url": format!("https://img.example/{}", $title),
                "thumbnailUrl": format!("https://img.example/{}-thumb", $title),
                "storageId": format!("st-{}", $title),
                "aspectRatio": 1.5
            }))
            .to_request();

        let resp: serde_json::Value = test::call_and_read_body_json(&$app, req).await;
        resp["data"].as_str().unwrap().to_string()
    }};
}

#[actix_web::test]
async fn test_add_photo_rejects_invalid_metadata() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (token, _) = register_and_get_token_id!(app, "alice");
    let album_id = create_album!(app, &token, "Strict");

    for body in [
        json!({
            "title": "bad ratio",
            "url": "https://img.example/x",
            "thumbnailUrl": "https://img.example/x-thumb",
            "storageId": "st-x",
            "aspectRatio": 0.0
        }),
        json!({
            "title": "negative ratio",
            "url": "https://img.example/x",
            "thumbnailUrl": "https://img.example/x-thumb",
            "storageId": "st-x",
            "aspectRatio": -2.0
        }),
        json!({
            "title": "no storage handle",
            "url": "https://img.example/x",
            "thumbnailUrl": "https://img.example/x-thumb",
            "storageId": "  ",
            "aspectRatio": 1.0
        }),
    ] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/albums/{}/photos", album_id))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    // Nothing was written.
    let album = store.get_album(&album_id).unwrap();
    assert_eq!(album.photo_count, 0);
}

#[actix_web::test]
async fn test_add_photo_requires_album_ownership() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (owner_token, _) = register_and_get_token_id!(app, "alice");
    let (other_token, _) = register_and_get_token_id!(app, "bob");
    let album_id = create_album!(app, &owner_token, "Locked");

    let req = test::TestRequest::post()
        .uri(&format!("/api/albums/{}/photos", album_id))
        .insert_header(("Authorization", format!("Bearer {}", other_token)))
        .set_json(json!({
            "title": "intruder",
            "url": "https://img.example/i",
            "thumbnailUrl": "https://img.example/i-thumb",
            "storageId": "st-i",
            "aspectRatio": 1.0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_delete_photo_recomputes_cover() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (token, _) = register_and_get_token_id!(app, "alice");
    let album_id = create_album!(app, &token, "Covers");
    let p1 = add_photo!(app, &token, album_id, "first");
    let p2 = add_photo!(app, &token, album_id, "second");

    let p2_thumb = store.get_photo(&p2).unwrap().thumbnail_url;

    // Deleting the cover photo promotes a surviving photo's thumbnail.
    let req = test::TestRequest::delete()
        .uri(&format!("/api/photos/{}", p1))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let album = store.get_album(&album_id).unwrap();
    assert_eq!(album.photo_count, 1);
    assert_eq!(album.cover_image.as_deref(), Some(p2_thumb.as_str()));

    // Deleting the last photo clears the cover entirely.
    let req = test::TestRequest::delete()
        .uri(&format!("/api/photos/{}", p2))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    test::call_service(&app, req).await;

    let album = store.get_album(&album_id).unwrap();
    assert_eq!(album.photo_count, 0);
    assert!(album.cover_image.is_none());
}

#[actix_web::test]
async fn test_delete_photo_cleans_reactions() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (owner_token, owner_id) = register_and_get_token_id!(app, "alice");
    let (fan_token, fan_id) = register_and_get_token_id!(app, "bob");
    let album_id = create_album!(app, &owner_token, "Trips");
    add_photo!(app, &owner_token, album_id, "one");
    let target = add_photo!(app, &owner_token, album_id, "two");
    add_photo!(app, &owner_token, album_id, "three");

    for uri in [
        format!("/api/photos/{}/like", target),
        format!("/api/photos/{}/bookmark", target),
    ] {
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(("Authorization", format!("Bearer {}", fan_token)))
            .to_request();
        test::call_service(&app, req).await;
    }
    let req = test::TestRequest::post()
        .uri(&format!("/api/photos/{}/comments", target))
        .insert_header(("Authorization", format!("Bearer {}", fan_token)))
        .set_json(json!({ "content": "nice light" }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/photos/{}", target))
        .insert_header(("Authorization", format!("Bearer {}", owner_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    assert!(matches!(store.get_photo(&target), Err(StoreError::NotFound(_))));
    assert!(store.find_like(&target, &fan_id).unwrap().is_none());
    assert!(store.find_bookmark(&target, &fan_id).unwrap().is_none());
    assert!(store.list_comments(&target, &Page::default()).unwrap().items.is_empty());

    let album = store.get_album(&album_id).unwrap();
    assert_eq!(album.photo_count, 2);
    let owner = store.get_user(&owner_id).unwrap();
    assert_eq!(owner.total_photos, 2);
}

#[actix_web::test]
async fn test_update_photo_feeds_search() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (token, _) = register_and_get_token_id!(app, "alice");
    let album_id = create_album!(app, &token, "Search");
    let photo_id = add_photo!(app, &token, album_id, "untitled");

    let req = test::TestRequest::put()
        .uri(&format!("/api/photos/{}", photo_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "title": "Sunset Harbor" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri("/api/photos/search?search=harbor")
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let items = resp["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_str().unwrap(), photo_id);

    // A blank query returns nothing rather than everything.
    let req = test::TestRequest::get()
        .uri("/api/photos/search?search=%20")
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert!(resp["data"]["items"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_move_photos_between_albums() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (token, user_id) = register_and_get_token_id!(app, "alice");
    let source = create_album!(app, &token, "Source");
    let target = create_album!(app, &token, "Target");
    let p1 = add_photo!(app, &token, source, "alpha");
    let p2 = add_photo!(app, &token, source, "beta");
    let p3 = add_photo!(app, &token, source, "gamma");

    let req = test::TestRequest::post()
        .uri("/api/photos/move")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "targetAlbumId": target, "photoIds": [p1, p2] }))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["data"]["moved"].as_u64().unwrap(), 2);

    let source_album = store.get_album(&source).unwrap();
    let target_album = store.get_album(&target).unwrap();
    assert_eq!(source_album.photo_count, 1);
    assert_eq!(target_album.photo_count, 2);

    // The moved set included the source cover, so a survivor takes over,
    // and the empty target adopts a cover from the arrivals.
    let p3_thumb = store.get_photo(&p3).unwrap().thumbnail_url;
    let p1_thumb = store.get_photo(&p1).unwrap().thumbnail_url;
    assert_eq!(source_album.cover_image.as_deref(), Some(p3_thumb.as_str()));
    assert_eq!(target_album.cover_image.as_deref(), Some(p1_thumb.as_str()));

    // Re-parenting does not change the owner's total.
    let user = store.get_user(&user_id).unwrap();
    assert_eq!(user.total_photos, 3);
    assert_eq!(store.get_photo(&p1).unwrap().album_id, target);
}

#[actix_web::test]
async fn test_move_photos_clears_emptied_source_cover() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (token, _) = register_and_get_token_id!(app, "alice");
    let source = create_album!(app, &token, "Emptied");
    let target = create_album!(app, &token, "Filled");
    let p1 = add_photo!(app, &token, source, "only");

    let req = test::TestRequest::post()
        .uri("/api/photos/move")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "targetAlbumId": target, "photoIds": [p1] }))
        .to_request();
    test::call_service(&app, req).await;

    let source_album = store.get_album(&source).unwrap();
    assert_eq!(source_album.photo_count, 0);
    assert!(source_album.cover_image.is_none());
}

#[actix_web::test]
async fn test_move_photos_checks_ownership_on_both_sides() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (alice_token, _) = register_and_get_token_id!(app, "alice");
    let (bob_token, _) = register_and_get_token_id!(app, "bob");
    let alice_album = create_album!(app, &alice_token, "Alice");
    let bob_album = create_album!(app, &bob_token, "Bob");
    let alice_photo = add_photo!(app, &alice_token, alice_album, "hers");

    // Alice cannot move into Bob's album.
    let req = test::TestRequest::post()
        .uri("/api/photos/move")
        .insert_header(("Authorization", format!("Bearer {}", alice_token)))
        .set_json(json!({ "targetAlbumId": bob_album, "photoIds": [alice_photo] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    // Bob cannot pull Alice's photos into his album.
    let req = test::TestRequest::post()
        .uri("/api/photos/move")
        .insert_header(("Authorization", format!("Bearer {}", bob_token)))
        .set_json(json!({ "targetAlbumId": bob_album, "photoIds": [alice_photo] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    assert_eq!(store.get_photo(&alice_photo).unwrap().album_id, alice_album);
}
