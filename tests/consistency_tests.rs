use std::sync::Arc;
use std::thread;

use chrono::Utc;
use gallery_server::engine::{Engine, PhotoStorage, StorageError};
use gallery_server::models::{AddPhotoRequest, CreateAlbumRequest, User};
use gallery_server::store::Store;

fn seed_user(store: &Store, username: &str) -> String {
    let mut user = User {
        id: String::new(),
        name: format!("{} Example", username),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: "hash".to_string(),
        avatar: None,
        joined_at: Utc::now(),
        album_count: 0,
        total_photos: 0,
        followers_count: 0,
        following_count: 0,
        search_text: String::new(),
    };
    store.create_user(&mut user).unwrap();
    user.id
}

fn seed_album(engine: &Engine, owner_id: &str, title: &str) -> String {
    engine
        .create_album(
            owner_id,
            &CreateAlbumRequest {
                title: title.to_string(),
                description: None,
                is_private: false,
                cover_image: None,
            },
        )
        .unwrap()
}

fn seed_photo(engine: &Engine, owner_id: &str, album_id: &str, title: &str) -> String {
    engine
        .add_photo(
            owner_id,
            album_id,
            &AddPhotoRequest {
                title: title.to_string(),
                description: None,
                url: format!("https://img.example/{}", title),
                thumbnail_url: format!("https://img.example/{}-thumb", title),
                storage_id: format!("st-{}", title),
                aspect_ratio: 1.0,
            },
        )
        .unwrap()
}

#[test]
fn concurrent_likes_from_distinct_users_all_count() {
    let store = Arc::new(Store::in_memory().unwrap());
    let engine = Arc::new(Engine::new(store.clone()));

    let owner = seed_user(&store, "owner");
    let album = seed_album(&engine, &owner, "Busy");
    let photo = seed_photo(&engine, &owner, &album, "viral");

    let fans: Vec<String> = (0..8)
        .map(|i| seed_user(&store, &format!("fan{}", i)))
        .collect();

    let handles: Vec<_> = fans
        .into_iter()
        .map(|fan| {
            let engine = engine.clone();
            let photo = photo.clone();
            thread::spawn(move || engine.like_photo(&fan, &photo).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Every like landed as exactly one increment: no lost updates.
    assert_eq!(store.get_photo(&photo).unwrap().likes, 8);
}

#[test]
fn concurrent_likes_from_one_user_count_once() {
    let store = Arc::new(Store::in_memory().unwrap());
    let engine = Arc::new(Engine::new(store.clone()));

    let owner = seed_user(&store, "owner");
    let fan = seed_user(&store, "fan");
    let album = seed_album(&engine, &owner, "Busy");
    let photo = seed_photo(&engine, &owner, &album, "double-tap");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            let fan = fan.clone();
            let photo = photo.clone();
            thread::spawn(move || engine.like_photo(&fan, &photo).unwrap())
        })
        .collect();
    let ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // All eight calls resolved to the same single row.
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(store.get_photo(&photo).unwrap().likes, 1);
    assert!(store.find_like(&photo, &fan).unwrap().is_some());
}

#[test]
fn concurrent_follows_settle_exact_counters() {
    let store = Arc::new(Store::in_memory().unwrap());
    let engine = Arc::new(Engine::new(store.clone()));

    let target = seed_user(&store, "popular");
    let fans: Vec<String> = (0..6)
        .map(|i| seed_user(&store, &format!("fan{}", i)))
        .collect();

    let handles: Vec<_> = fans
        .into_iter()
        .map(|fan| {
            let engine = engine.clone();
            let target = target.clone();
            thread::spawn(move || engine.follow(&fan, &target).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.get_user(&target).unwrap().followers_count, 6);
}

#[test]
fn counters_track_rows_through_mixed_operations() {
    let store = Arc::new(Store::in_memory().unwrap());
    let engine = Engine::new(store.clone());

    let owner = seed_user(&store, "owner");
    let fan = seed_user(&store, "fan");
    let other = seed_user(&store, "other");

    let album = seed_album(&engine, &owner, "Mixed");
    let p1 = seed_photo(&engine, &owner, &album, "one");
    let p2 = seed_photo(&engine, &owner, &album, "two");
    let p3 = seed_photo(&engine, &owner, &album, "three");

    engine.like_photo(&fan, &p1).unwrap();
    engine.like_photo(&other, &p1).unwrap();
    engine.unlike_photo(&fan, &p1).unwrap();
    engine.add_comment(&fan, &p1, "a").unwrap();
    let doomed_comment = engine.add_comment(&other, &p1, "b").unwrap();
    engine.delete_comment(&other, &doomed_comment).unwrap();
    engine.bookmark_photo(&fan, &p2).unwrap();
    engine.delete_photo(&owner, &p3).unwrap();

    let p1_row = store.get_photo(&p1).unwrap();
    assert_eq!(p1_row.likes, 1);
    assert_eq!(p1_row.comments, 1);

    let album_row = store.get_album(&album).unwrap();
    assert_eq!(album_row.photo_count, 2);

    let owner_row = store.get_user(&owner).unwrap();
    assert_eq!(owner_row.album_count, 1);
    assert_eq!(owner_row.total_photos, 2);
}

struct FailingStorage;

impl PhotoStorage for FailingStorage {
    fn delete(&self, storage_id: &str) -> Result<(), StorageError> {
        Err(StorageError(format!("object store unreachable for {}", storage_id)))
    }
}

#[test]
fn storage_failure_never_blocks_row_cleanup() {
    let store = Arc::new(Store::in_memory().unwrap());
    let engine = Engine::with_storage(store.clone(), Arc::new(FailingStorage));

    let owner = seed_user(&store, "owner");
    let album = seed_album(&engine, &owner, "Flaky");
    let photo = seed_photo(&engine, &owner, &album, "stuck");

    // The external delete fails, the database cascade still completes.
    engine.delete_photo(&owner, &photo).unwrap();
    assert!(store.get_photo(&photo).is_err());
    assert_eq!(store.get_album(&album).unwrap().photo_count, 0);

    let p1 = seed_photo(&engine, &owner, &album, "a");
    seed_photo(&engine, &owner, &album, "b");
    engine.delete_album(&owner, &album).unwrap();
    assert!(store.get_album(&album).is_err());
    assert!(store.get_photo(&p1).is_err());
    assert_eq!(store.get_user(&owner).unwrap().total_photos, 0);
    assert_eq!(store.get_user(&owner).unwrap().album_count, 0);
}
