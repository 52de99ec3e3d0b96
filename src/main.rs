use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;
use std::sync::Arc;

use quizhub_be::database::{
    init_database,
    repositories::{EventRepository, TaskRepository},
};
use quizhub_be::handlers::{scrape, tasks};
use quizhub_be::scraper::RemoteExtractor;
use quizhub_be::{Config, ScraperService};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("QuizHub API v1.0")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init();

    println!("🚀 Starting QuizHub API server...");

    // Load configuration
    let config = Config::from_env()?;
    println!(
        "📋 Configuration loaded (environment: {})",
        config.environment
    );

    // Initialize database
    let pool = init_database(&config.database_url).await?;
    println!("✅ Database initialized");

    // Initialize repositories and services
    let event_repository = EventRepository::new(pool.clone());
    let task_repository = TaskRepository::new(pool.clone());
    let extractor = Arc::new(RemoteExtractor::new(config.extractor_url.clone()));
    let scraper_service =
        ScraperService::new(pool.clone(), extractor, config.scrape_interval_minutes);

    let event_repo_data = web::Data::new(event_repository);
    let task_repo_data = web::Data::new(task_repository);
    let scraper_service_data = web::Data::new(scraper_service);
    let config_data = web::Data::new(config.clone());

    let server_address = config.server_address();
    println!("🌐 Server starting on http://{}", server_address);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(event_repo_data.clone())
            .app_data(task_repo_data.clone())
            .app_data(scraper_service_data.clone())
            .app_data(config_data.clone())
            .wrap(
                Cors::default()
                    .allowed_origin("http://localhost:3000")
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(hello)
            .service(health)
            .service(
                web::scope("/api/v1")
                    .service(
                        web::scope("/scrape")
                            .route("", web::post().to(scrape::scrape_new_data))
                            .route("/full", web::post().to(scrape::force_full_rescrape)),
                    )
                    .service(
                        web::scope("/tasks")
                            .route("/placeholder", web::post().to(tasks::trigger_placeholder))
                            .route("/autoscrape", web::post().to(tasks::trigger_autoscrape))
                            .route("/reenable", web::post().to(tasks::trigger_reenable)),
                    ),
            )
    })
    .bind(server_address)?
    .run()
    .await?;

    Ok(())
}
