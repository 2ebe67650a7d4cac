use anyhow::Context;
use quiz_app::db;
use quiz_app::server::app::run_server;
use quiz_app::settings::Settings;
use quiz_app::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let settings = Settings::load().context("Failed to load settings")?;
    let pool = db::establish_connection(&settings.db_path, settings.max_connections)
        .await
        .with_context(|| format!("Cannot connect to DB at {}", settings.db_path))?;

    tracing::info!("Running db migrations...");
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    let count = db::queries::questions::count_questions(&pool).await?;
    tracing::info!("{count} questions available");

    run_server(pool, &settings.listen_addr).await
}
