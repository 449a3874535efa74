use std::error::Error;

use diesel::Connection;
use diesel_async::{async_connection_wrapper::AsyncConnectionWrapper, AsyncPgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies the migrations that haven't run against `database_url` yet.
pub async fn run_migrations(database_url: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let database_url = database_url.to_owned();

    // the harness is blocking, it gets its own thread
    tokio::task::spawn_blocking(move || -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut connection = AsyncConnectionWrapper::<AsyncPgConnection>::establish(&database_url)?;

        for version in connection.run_pending_migrations(MIGRATIONS)? {
            tracing::info!("applied migration {version}");
        }

        Ok(())
    })
    .await?
}
