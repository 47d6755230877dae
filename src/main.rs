use actix_cors::Cors;
use actix_web::web;
use shuttle_actix_web::ShuttleActixWeb;
use shuttle_runtime::SecretStore;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use closet::gateway::AiGateway;
use closet::middleware::auth::Authentication;
use closet::models::ClosetCache;
use closet::storage::ObjectStore;
use closet::{routes, ApiDoc, AppConfig, AppState};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[shuttle_runtime::main]
async fn main(
    #[shuttle_runtime::Secrets] secret_store: SecretStore,
) -> ShuttleActixWeb<impl FnOnce(&mut web::ServiceConfig) + Send + Clone + 'static> {
    let app_config = Arc::new(AppConfig::new(&secret_store)?);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&app_config.database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    info!("Database ready");

    // Cached catalogs also expire so edits made outside this instance show up.
    let closet_cache = ClosetCache::new(10_000, Duration::from_secs(60 * 10));

    let app_state = Arc::new(AppState {
        pool,
        gateway: AiGateway::from_config(&app_config),
        storage: ObjectStore::from_config(&app_config).await,
        closet_cache,
        analyzer: app_config.analyzer_settings(),
    });

    let config = move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(app_state.clone()))
            .app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
            .service(Scalar::with_url("/scalar", ApiDoc::openapi()))
            .service(
                web::scope("")
                    .wrap(Authentication {
                        app_config: app_config.clone(),
                    })
                    .wrap(Cors::permissive())
                    .configure(routes::configure),
            );
    };

    Ok(config.into())
}
