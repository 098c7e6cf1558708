use clap::Parser;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod cli;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = cli::Args::parse();
    let settings = settings::Settings::new(args.config.as_deref())?;

    // stdout is reserved for command output (`blob cat` streams bytes there).
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "budgetmapper={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let db = match parse_database(&settings.database).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!("failed to initialize database: {err}");
            return Err(err);
        }
    };
    let engine = engine::Engine::builder().database(db).build().await?;

    if let Err(err) = cli::run(&engine, &settings, args.command).await {
        tracing::error!("command failed: {err}");
        return Err(err);
    }
    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::debug!("database ready");
    Ok(database)
}
