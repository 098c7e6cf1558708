//! Standalone schema runner: `migration [up|down|fresh|status]`.
//!
//! The database is taken from `DATABASE_URL` when set, otherwise from the
//! same `BUDGETMAPPER__DATABASE` variables the `budgetmapper` binary reads.
use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_SQLITE_PATH: &str = "budgetmapper.db";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let url = database_url(
        std::env::var("DATABASE_URL").ok(),
        std::env::var("BUDGETMAPPER__DATABASE").ok(),
        std::env::var("BUDGETMAPPER__DATABASE__SQLITE").ok(),
    );
    let db = Database::connect(&url).await?;

    match command.as_str() {
        "up" => migration::Migrator::up(&db, None).await?,
        "down" => migration::Migrator::down(&db, Some(1)).await?,
        "fresh" => migration::Migrator::fresh(&db).await?,
        "status" => migration::Migrator::status(&db).await?,
        other => {
            eprintln!("unknown command '{other}', expected up|down|fresh|status");
            std::process::exit(2);
        }
    }
    Ok(())
}

fn database_url(url: Option<String>, database: Option<String>, sqlite: Option<String>) -> String {
    if let Some(url) = url {
        return url;
    }
    if database.as_deref() == Some("memory") {
        return "sqlite::memory:".to_string();
    }
    let path = sqlite.unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string());
    format!("sqlite:{path}?mode=rwc")
}
