use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;
use std::io;

use taskvault::auth::{PasswordHasher, TokenService};
use taskvault::config::Config;
use taskvault::{db, routes};

fn startup_error<E>(error: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::Other, error)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(startup_error)?;

    let pool = db::connect(&config.database_url, config.database_max_connections)
        .await
        .map_err(startup_error)?;
    db::migrate(&pool).await.map_err(startup_error)?;

    let pool = web::Data::new(pool);
    let tokens = web::Data::new(TokenService::from_config(&config));
    let hasher = web::Data::new(PasswordHasher::new(config.bcrypt_cost));
    let allowed_origins = config.cors_allowed_origins.clone();

    info!("Starting TaskVault server at {}", config.server_url());
    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(pool.clone())
            .app_data(tokens.clone())
            .app_data(hasher.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(routes::config)
            .service(web::scope("/api").configure(routes::config))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
