use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

use gazette::application::auth_service::AuthService;
use gazette::application::comment_service::CommentService;
use gazette::application::feed_service::FeedService;
use gazette::application::post_service::PostService;
use gazette::application::profile_service::ProfileService;
use gazette::data::category_repository::{CategoryRepository, PostgresCategoryRepository};
use gazette::data::comment_repository::{CommentRepository, PostgresCommentRepository};
use gazette::data::location_repository::{LocationRepository, PostgresLocationRepository};
use gazette::data::post_repository::{PostRepository, PostgresPostRepository};
use gazette::data::user_repository::{PostgresUserRepository, UserRepository};
use gazette::infrastructure::config::AppConfig;
use gazette::infrastructure::database::{create_pool, run_migrations};
use gazette::infrastructure::logging::init_logging;
use gazette::infrastructure::security::JwtKeys;
use gazette::presentation::handlers;
use gazette::presentation::middleware::{JwtAuthMiddleware, RequestIdMiddleware, TimingMiddleware};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
    let posts: Arc<dyn PostRepository> = Arc::new(PostgresPostRepository::new(pool.clone()));
    let categories: Arc<dyn CategoryRepository> =
        Arc::new(PostgresCategoryRepository::new(pool.clone()));
    let locations: Arc<dyn LocationRepository> =
        Arc::new(PostgresLocationRepository::new(pool.clone()));
    let comments: Arc<dyn CommentRepository> =
        Arc::new(PostgresCommentRepository::new(pool.clone()));

    let keys = JwtKeys::new(config.jwt_secret.clone());
    let auth_service = AuthService::new(users.clone(), keys.clone());
    let feed_service = FeedService::new(
        posts.clone(),
        users.clone(),
        categories.clone(),
        comments.clone(),
    );
    let post_service = PostService::new(posts.clone(), categories.clone(), locations.clone());
    let comment_service = CommentService::new(comments.clone(), posts.clone());
    let profile_service = ProfileService::new(users.clone());

    let config_data = config.clone();

    HttpServer::new(move || {
        let cors = build_cors(&config_data);
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(TimingMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(cors)
            .app_data(web::Data::new(keys.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(feed_service.clone()))
            .app_data(web::Data::new(post_service.clone()))
            .app_data(web::Data::new(comment_service.clone()))
            .app_data(web::Data::new(profile_service.clone()))
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(health))
                    .service(handlers::auth::scope())
                    .service(handlers::feed::global_feed)
                    .service(handlers::feed::category_feed)
                    .service(handlers::feed::profile_feed)
                    .service(handlers::feed::post_detail)
                    .service(
                        web::scope("")
                            .wrap(JwtAuthMiddleware::new(auth_service.keys().clone()))
                            .service(handlers::post::create_post)
                            .service(handlers::post::edit_post)
                            .service(handlers::post::confirm_delete_post)
                            .service(handlers::post::delete_post)
                            .service(handlers::comment::add_comment)
                            .service(handlers::comment::edit_comment)
                            .service(handlers::comment::confirm_delete_comment)
                            .service(handlers::comment::delete_comment)
                            .service(handlers::profile::edit_profile),
                    ),
            )
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .supports_credentials()
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = cors.allowed_origin(origin);
    }

    cors
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
