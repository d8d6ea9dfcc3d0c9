//! Creates the directory database if it is missing and applies the schema.

use tokio_postgres::NoTls;

const SCHEMA: &str = include_str!("../../migrations/001_directory_schema.sql");

async fn connect(conn_str: &str) -> Result<tokio_postgres::Client, tokio_postgres::Error> {
    let (client, connection) = tokio_postgres::connect(conn_str, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("connection error: {}", e);
        }
    });

    Ok(client)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let admin_conn = std::env::var("PG_ADMIN_CONN")
        .unwrap_or_else(|_| "host=127.0.0.1 user=postgres dbname=postgres".into());
    let db_name = std::env::var("DB_NAME").unwrap_or_else(|_| "local_directory".into());

    let valid_name = !db_name.is_empty()
        && db_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_name {
        log::error!("Refusing to create database: invalid database name '{}'", db_name);
        return Ok(());
    }

    log::info!("Connecting to Postgres to manage databases...");
    let admin = connect(&admin_conn).await?;

    let exists = admin
        .query_opt("SELECT 1 FROM pg_database WHERE datname = $1", &[&db_name])
        .await?
        .is_some();

    if exists {
        log::info!("Database '{}' already exists", db_name);
    } else {
        admin
            .execute(format!("CREATE DATABASE \"{}\"", db_name).as_str(), &[])
            .await?;
        log::info!("Database '{}' created", db_name);
    }

    let target_conn = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("{} dbname={}", strip_dbname(&admin_conn), db_name));
    let client = connect(&target_conn).await?;
    client.batch_execute(SCHEMA).await?;
    log::info!("Directory schema applied to '{}'", db_name);

    Ok(())
}

/// Drops any `dbname=` pair from a key/value connection string
fn strip_dbname(conn_str: &str) -> String {
    conn_str
        .split_whitespace()
        .filter(|pair| !pair.starts_with("dbname="))
        .collect::<Vec<_>>()
        .join(" ")
}
