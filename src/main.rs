use std::sync::Arc;

use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager},
    AsyncPgConnection,
};
use tracing_subscriber::EnvFilter;
use yatube::{
    app,
    config::Config,
    db::{MemoryRepository, PgRepository, Repository},
    migrations::run_migrations,
    AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("yatube=debug,tower_http=debug")),
        )
        .init();

    let config = Config::from_env().expect("valid YATUBE_* environment");

    let repo: Arc<dyn Repository> = match &config.database_url {
        Some(database_url) => {
            let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
            let pool = Pool::builder(manager)
                .max_size(config.db_pool_size)
                .build()
                .expect("db connection pool");

            run_migrations(database_url)
                .await
                .expect("apply migrations");

            Arc::new(PgRepository::new(pool))
        }
        None => {
            tracing::warn!("YATUBE_DATABASE_URL is not set, keeping posts in memory");
            Arc::new(MemoryRepository::new())
        }
    };

    let addr = config.addr().expect("valid listen address");

    let app = app(AppState::new(&config, repo));

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .expect("start server");
}
