use actix_web::{test, web, App};
use serde_json::json;
use std::sync::Arc;

use gallery_server::activity::Notifications;
use gallery_server::api::{self, AppState};
use gallery_server::auth::AuthService;
use gallery_server::engine::Engine;
use gallery_server::store::Store;

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
    ($app:expr, $token:expr, $title:expr, $private:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/albums")
            .insert_header(("Authorization", format!("Bearer {}", $token)))
            .set_json(json!({ "title": $title, "isPrivate": $private }))
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
                "aspectRatio": 1.0
            }))
            .to_request();

        let resp: serde_json::Value = test::call_and_read_body_json(&$app, req).await;
        resp["data"].as_str().unwrap().to_string()
    }};
}

/// Helper macro to collect the ids of items from a paged listing response
macro_rules! list_ids {
    ($app:expr, $uri:expr, $token:expr) => {{
        let mut req = test::TestRequest::get().uri($uri);
        if let Some(token) = $token {
            req = req.insert_header(("Authorization", format!("Bearer {}", token)));
        }
        let resp: serde_json::Value =
            test::call_and_read_body_json(&$app, req.to_request()).await;
        resp["data"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_str().unwrap().to_string())
            .collect::<Vec<String>>()
    }};
}

#[actix_web::test]
async fn test_private_album_hidden_from_browse() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (owner_token, _) = register_and_get_token_id!(app, "alice");
    let (other_token, _) = register_and_get_token_id!(app, "bob");
    let public_album = create_album!(app, &owner_token, "Open", false);
    let private_album = create_album!(app, &owner_token, "Secret", true);

    let anon = list_ids!(app, "/api/albums", None::<&str>);
    assert!(anon.contains(&public_album));
    assert!(!anon.contains(&private_album));

    let other = list_ids!(app, "/api/albums", Some(&other_token));
    assert!(!other.contains(&private_album));

    let owner = list_ids!(app, "/api/albums", Some(&owner_token));
    assert!(owner.contains(&public_album));
    assert!(owner.contains(&private_album));
}

#[actix_web::test]
async fn test_private_album_reads_like_missing() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (owner_token, _) = register_and_get_token_id!(app, "alice");
    let (other_token, _) = register_and_get_token_id!(app, "bob");
    let private_album = create_album!(app, &owner_token, "Secret", true);

    let req = test::TestRequest::get()
        .uri(&format!("/api/albums/{}", private_album))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::get()
        .uri(&format!("/api/albums/{}", private_album))
        .insert_header(("Authorization", format!("Bearer {}", other_token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::get()
        .uri(&format!("/api/albums/{}", private_album))
        .insert_header(("Authorization", format!("Bearer {}", owner_token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
}

#[actix_web::test]
async fn test_private_photos_never_leak_into_listings() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (owner_token, owner_id) = register_and_get_token_id!(app, "alice");
    let (other_token, _) = register_and_get_token_id!(app, "bob");
    let public_album = create_album!(app, &owner_token, "Open", false);
    let private_album = create_album!(app, &owner_token, "Secret", true);
    let public_photo = add_photo!(app, &owner_token, public_album, "shared");
    let private_photo = add_photo!(app, &owner_token, private_album, "hidden");

    // Explore, anonymous and as another user.
    let anon = list_ids!(app, "/api/photos/explore", None::<&str>);
    assert!(anon.contains(&public_photo));
    assert!(!anon.contains(&private_photo));
    let other = list_ids!(app, "/api/photos/explore", Some(&other_token));
    assert!(!other.contains(&private_photo));

    // The uploader's public profile grid.
    let profile_uri = format!("/api/users/{}/photos", owner_id);
    let anon = list_ids!(app, &profile_uri, None::<&str>);
    assert!(anon.contains(&public_photo));
    assert!(!anon.contains(&private_photo));

    // The owner sees everything of their own.
    let owner = list_ids!(app, &profile_uri, Some(&owner_token));
    assert!(owner.contains(&public_photo));
    assert!(owner.contains(&private_photo));
}

#[actix_web::test]
async fn test_private_album_photo_listing_is_empty_not_an_error() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (owner_token, _) = register_and_get_token_id!(app, "alice");
    let private_album = create_album!(app, &owner_token, "Secret", true);
    add_photo!(app, &owner_token, private_album, "hidden");

    let uri = format!("/api/albums/{}/photos", private_album);
    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["success"].as_bool().unwrap(), true);
    assert!(resp["data"]["items"].as_array().unwrap().is_empty());

    let owner = list_ids!(app, &uri, Some(&owner_token));
    assert_eq!(owner.len(), 1);
}

#[actix_web::test]
async fn test_photo_in_private_album_reads_like_missing() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (owner_token, _) = register_and_get_token_id!(app, "alice");
    let (other_token, _) = register_and_get_token_id!(app, "bob");
    let private_album = create_album!(app, &owner_token, "Secret", true);
    let photo_id = add_photo!(app, &owner_token, private_album, "hidden");

    let req = test::TestRequest::get()
        .uri(&format!("/api/photos/{}", photo_id))
        .insert_header(("Authorization", format!("Bearer {}", other_token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::get()
        .uri(&format!("/api/photos/{}", photo_id))
        .insert_header(("Authorization", format!("Bearer {}", owner_token)))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["data"]["id"].as_str().unwrap(), photo_id);
}

#[actix_web::test]
async fn test_flipping_album_private_hides_existing_photos() {
    let store = Arc::new(Store::in_memory().unwrap());
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let app = init_app!(store, auth_service);

    let (owner_token, _) = register_and_get_token_id!(app, "alice");
    let album_id = create_album!(app, &owner_token, "Flip", false);
    let photo_id = add_photo!(app, &owner_token, album_id, "exposed");

    let anon = list_ids!(app, "/api/photos/explore", None::<&str>);
    assert!(anon.contains(&photo_id));

    let req = test::TestRequest::put()
        .uri(&format!("/api/albums/{}", album_id))
        .insert_header(("Authorization", format!("Bearer {}", owner_token)))
        .set_json(json!({ "isPrivate": true }))
        .to_request();
    test::call_service(&app, req).await;

    let anon = list_ids!(app, "/api/photos/explore", None::<&str>);
    assert!(!anon.contains(&photo_id));
}
