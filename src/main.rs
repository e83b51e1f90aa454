use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};

use taskdesk::auth::{AuthMiddleware, PasswordHasher, RoutePolicy, TokenCodec};
use taskdesk::config::Config;
use taskdesk::routes;
use taskdesk::store::{MemoryStore, PgStore, TaskStore, UserStore};

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::other(err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;
    info!("Starting with {:?}", config);

    let codec = Arc::new(TokenCodec::from_config(&config).map_err(startup_error)?);
    let policy = Arc::new(RoutePolicy::task_manager().map_err(startup_error)?);
    let hasher = web::Data::new(PasswordHasher::new(config.bcrypt_cost).map_err(startup_error)?);

    let (users, tasks): (Arc<dyn UserStore>, Arc<dyn TaskStore>) = match &config.database_url {
        Some(url) => {
            let store = Arc::new(PgStore::connect(url).await.map_err(startup_error)?);
            (store.clone() as Arc<dyn UserStore>, store as Arc<dyn TaskStore>)
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store, data is lost on exit");
            let store = Arc::new(MemoryStore::new());
            (store.clone() as Arc<dyn UserStore>, store as Arc<dyn TaskStore>)
        }
    };
    let users = web::Data::from(users);
    let tasks = web::Data::from(tasks);
    let codec_data = web::Data::from(codec.clone());

    let origins = config.cors_allowed_origins.clone();
    info!("Listening on {}", config.server_url());

    HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["HEAD", "GET", "POST", "PUT", "DELETE", "PATCH"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::CACHE_CONTROL,
                header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(users.clone())
            .app_data(tasks.clone())
            .app_data(hasher.clone())
            .app_data(codec_data.clone())
            .wrap(AuthMiddleware::new(codec.clone(), policy.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
