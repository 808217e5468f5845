use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_DATABASE_URL: &str = "sqlite:./pledge.db?mode=rwc";

fn usage() -> String {
    format!(
        "Apply the pledge schema (users, projects, donations, allocations).

Usage: migration [COMMAND]

Commands:
  up      apply pending migrations (default)
  down    revert the last migration
  fresh   drop every table and re-apply all migrations
  status  list applied and pending migrations
  help    print this message

Environment:
  DATABASE_URL  database to migrate [default: {DEFAULT_DATABASE_URL}]"
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cmd = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "up".to_string());

    if matches!(cmd.as_str(), "help" | "-h" | "--help") {
        println!("{}", usage());
        return Ok(());
    }

    let db_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let db = Database::connect(&db_url).await?;

    match cmd.as_str() {
        "up" => migration::Migrator::up(&db, None).await?,
        "down" => migration::Migrator::down(&db, Some(1)).await?,
        "fresh" => migration::Migrator::fresh(&db).await?,
        "status" => migration::Migrator::status(&db).await?,
        other => {
            eprintln!("unknown command: {other}\n\n{}", usage());
            std::process::exit(2);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_lists_every_command_and_the_default_url() {
        let text = usage();
        for command in ["up", "down", "fresh", "status", "help"] {
            assert!(text.contains(&format!("  {command} ")), "missing {command}");
        }
        assert!(text.contains(DEFAULT_DATABASE_URL));
    }
}
