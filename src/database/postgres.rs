use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use postgres_types::ToSql;
use serde_json::Value;
use tokio_postgres::NoTls;

use super::{escape_like, Predicate, Row, RowStore, SelectQuery, StoreError, Table};

type Param = Box<dyn ToSql + Sync + Send>;

/// Direct connection to the hosted Postgres database behind the directory.
/// Rows travel as `jsonb` so the column set stays owned by the transform layer.
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: usize) -> Result<Self, StoreError> {
        let mut cfg = Config::new();
        cfg.url = Some(database_url.to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        let mut pool_config = PoolConfig::new(max_connections);
        pool_config.timeouts.wait = Some(Duration::from_secs(5));
        pool_config.timeouts.create = Some(Duration::from_secs(5));
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let client = pool.get().await.map_err(unavailable)?;
        client.execute("SELECT 1", &[]).await.map_err(classify)?;

        log::info!("Database connection established");
        Ok(Self { pool })
    }

    async fn client(&self) -> Result<deadpool_postgres::Client, StoreError> {
        self.pool.get().await.map_err(unavailable)
    }
}

#[async_trait]
impl RowStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn select(&self, table: Table, query: &SelectQuery) -> Result<Vec<Row>, StoreError> {
        let (sql, params) = select_statement(table, query);
        let client = self.client().await?;

        let rows = client
            .query(sql.as_str(), &param_refs(&params))
            .await
            .map_err(classify)?;

        Ok(rows.iter().map(|r| json_row(r.get(0))).collect())
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        let sql = insert_statement(table, &row);
        let client = self.client().await?;
        let inserted = if row.is_empty() {
            client.query_one(sql.as_str(), &[]).await
        } else {
            let payload = Value::Object(row);
            client.query_one(sql.as_str(), &[&payload]).await
        }
        .map_err(classify)?;

        Ok(json_row(inserted.get(0)))
    }

    async fn update(&self, table: Table, id: &str, mut row: Row) -> Result<Row, StoreError> {
        row.remove("id");
        let Some(sql) = update_statement(table, &row) else {
            return self
                .select(table, &SelectQuery::by_id(id))
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| StoreError::not_found(table, id));
        };

        let client = self.client().await?;
        let payload = Value::Object(row);
        let updated = client
            .query_opt(sql.as_str(), &[&id, &payload])
            .await
            .map_err(classify)?
            .ok_or_else(|| StoreError::not_found(table, id))?;

        Ok(json_row(updated.get(0)))
    }

    async fn delete(&self, table: Table, id: &str) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id::text = $1", table.name());
        let client = self.client().await?;

        let affected = client.execute(sql.as_str(), &[&id]).await.map_err(classify)?;
        if affected == 0 {
            return Err(StoreError::not_found(table, id));
        }
        Ok(())
    }
}

/// Builds `SELECT to_jsonb(t) ...` with one positional parameter per value
fn select_statement(table: Table, query: &SelectQuery) -> (String, Vec<Param>) {
    let mut clauses = Vec::new();
    let mut params: Vec<Param> = Vec::new();

    for predicate in &query.predicates {
        match predicate {
            Predicate::Eq { column, value } => {
                let column = quote_ident(column);
                match value {
                    Value::Null => clauses.push(format!("{column} IS NULL")),
                    Value::Bool(flag) => {
                        params.push(Box::new(*flag));
                        clauses.push(format!("{column} = ${}", params.len()));
                    }
                    Value::Number(number) => {
                        params.push(Box::new(number.as_f64().unwrap_or_default()));
                        clauses.push(format!("{column}::float8 = ${}", params.len()));
                    }
                    Value::String(text) => {
                        params.push(Box::new(text.clone()));
                        clauses.push(format!("{column}::text = ${}", params.len()));
                    }
                    other => {
                        params.push(Box::new(other.clone()));
                        clauses.push(format!("to_jsonb({column}) = ${}", params.len()));
                    }
                }
            }
            Predicate::Contains { columns, needle } => {
                params.push(Box::new(format!("%{}%", escape_like(needle))));
                let index = params.len();
                let alternatives: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} ILIKE ${index}", quote_ident(c)))
                    .collect();
                clauses.push(format!("({})", alternatives.join(" OR ")));
            }
        }
    }

    let mut sql = format!("SELECT to_jsonb(t) FROM {} t", table.name());
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    if let Some(order) = &query.order {
        sql.push_str(&format!(
            " ORDER BY {} {} NULLS LAST",
            quote_ident(order.column),
            if order.descending { "DESC" } else { "ASC" }
        ));
    }

    (sql, params)
}

/// `INSERT` taking the row as `$1::jsonb`; an empty row falls back to the
/// column defaults and takes no parameter
fn insert_statement(table: Table, row: &Row) -> String {
    if row.is_empty() {
        return format!(
            "INSERT INTO {t} DEFAULT VALUES RETURNING to_jsonb({t}.*)",
            t = table.name()
        );
    }
    format!(
        "INSERT INTO {t} ({c}) SELECT {c} FROM jsonb_populate_record(NULL::{t}, $1::jsonb) \
         RETURNING to_jsonb({t}.*)",
        t = table.name(),
        c = column_list(row)
    )
}

/// `UPDATE` of exactly the row's columns, id as `$1` and values as `$2::jsonb`.
/// `None` when there is nothing to write.
fn update_statement(table: Table, row: &Row) -> Option<String> {
    if row.is_empty() {
        return None;
    }
    Some(format!(
        "UPDATE {t} SET ({c}) = (SELECT {c} FROM jsonb_populate_record(NULL::{t}, $2::jsonb)) \
         WHERE id::text = $1 RETURNING to_jsonb({t}.*)",
        t = table.name(),
        c = column_list(row)
    ))
}

fn param_refs(params: &[Param]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

fn column_list(row: &Row) -> String {
    row.keys()
        .map(|k| quote_ident(k))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn json_row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

fn unavailable(err: deadpool_postgres::PoolError) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

/// Server-side errors carrying a SQLSTATE are rejections; everything else is
/// treated as the store being unreachable.
fn classify(err: tokio_postgres::Error) -> StoreError {
    match err.as_db_error() {
        Some(db) => StoreError::Rejected(format!("{} ({})", db.message(), db.code().code())),
        None => StoreError::Unavailable(err.to_string()),
    }
}
