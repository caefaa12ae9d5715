mod activity;
mod api;
mod auth;
mod engine;
mod models;
mod privacy;
mod store;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::env;
use std::sync::Arc;

use activity::Notifications;
use api::AppState;
use auth::AuthService;
use engine::Engine;
use store::Store;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Load environment variables
    dotenvy::dotenv().ok();

    // Get configuration from environment
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .expect("PORT must be a number");

    let db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "gallery.db".to_string());

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
        log::warn!("JWT_SECRET not set, using default (not secure for production!)");
        "default_jwt_secret_change_me".to_string()
    });

    // Initialize store
    let store = Arc::new(Store::new(&db_path).expect("Failed to initialize database"));

    // Initialize services
    let auth_service = Arc::new(AuthService::new(jwt_secret));
    let engine = Arc::new(Engine::new(store.clone()));
    let notifications = Arc::new(Notifications::new(store.clone()));

    log::info!("Database: {}", db_path);
    log::info!("Starting gallery server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            // Register AuthService individually for the auth extractors
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                engine: engine.clone(),
                notifications: notifications.clone(),
                auth_service: auth_service.clone(),
            }))
            // Photo metadata payloads are small; uploads go to the file store
            .app_data(web::PayloadConfig::new(1024 * 1024))
            .configure(api::configure_routes)
    })
    .workers(1) // Single worker for minimal memory
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
