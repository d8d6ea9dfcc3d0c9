use std::{cmp::Ordering, collections::HashMap, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{seed, Order, Predicate, Row, RowStore, SelectQuery, StoreError, Table};

/// In-process stand-in for the hosted store, used for local development
/// and tests. Rows live for the lifetime of the process.
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
    latency: Duration,
}

impl MemoryStore {
    pub fn new(latency: Duration) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            latency,
        }
    }

    /// Store preloaded with the sample listings and an admin profile
    pub fn seeded(latency: Duration) -> Self {
        let mut tables = HashMap::new();
        tables.insert(Table::Businesses, seed::sample_businesses());
        tables.insert(Table::Profiles, seed::sample_profiles());
        Self {
            tables: RwLock::new(tables),
            latency,
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn select(&self, table: Table, query: &SelectQuery) -> Result<Vec<Row>, StoreError> {
        self.simulate_latency().await;

        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.predicates.iter().all(|p| matches_predicate(row, p)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| compare_rows(a, b, order));
        }

        Ok(rows)
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Row, StoreError> {
        self.simulate_latency().await;

        let id = match row.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        let now = Value::String(Utc::now().to_rfc3339());

        row.insert("id".into(), Value::String(id.clone()));
        row.insert("created_at".into(), now.clone());
        row.insert("updated_at".into(), now);

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        if rows.iter().any(|existing| row_id(existing) == Some(id.as_str())) {
            return Err(StoreError::Rejected(format!(
                "duplicate key value violates unique constraint on {}.id",
                table.name()
            )));
        }
        rows.push(row.clone());

        Ok(row)
    }

    async fn update(&self, table: Table, id: &str, mut row: Row) -> Result<Row, StoreError> {
        self.simulate_latency().await;

        row.remove("id");

        let mut tables = self.tables.write().await;
        let existing = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)))
            .ok_or_else(|| StoreError::not_found(table, id))?;

        for (column, value) in row {
            existing.insert(column, value);
        }

        Ok(existing.clone())
    }

    async fn delete(&self, table: Table, id: &str) -> Result<(), StoreError> {
        self.simulate_latency().await;

        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(&table)
            .ok_or_else(|| StoreError::not_found(table, id))?;

        let before = rows.len();
        rows.retain(|r| row_id(r) != Some(id));
        if rows.len() == before {
            return Err(StoreError::not_found(table, id));
        }

        Ok(())
    }
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn matches_predicate(row: &Row, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq { column, value } => row.get(*column).unwrap_or(&Value::Null) == value,
        Predicate::Contains { columns, needle } => {
            let needle = needle.to_lowercase();
            columns.iter().any(|column| {
                row.get(*column)
                    .and_then(Value::as_str)
                    .map(|text| text.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        }
    }
}

/// Rows without a comparable value sort last regardless of direction
fn compare_rows(a: &Row, b: &Row, order: &Order) -> Ordering {
    let left = sort_key(a.get(order.column));
    let right = sort_key(b.get(order.column));

    match (left, right) {
        (Some(l), Some(r)) => {
            let ordering = l.partial_cmp(&r).unwrap_or(Ordering::Equal);
            if order.descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(PartialEq, PartialOrd)]
enum SortKey {
    Number(f64),
    Time(DateTime<Utc>),
    Text(String),
}

fn sort_key(value: Option<&Value>) -> Option<SortKey> {
    match value? {
        Value::Number(n) => n.as_f64().map(SortKey::Number),
        Value::Bool(b) => Some(SortKey::Number(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => Some(
            DateTime::parse_from_rfc3339(s)
                .map(|t| SortKey::Time(t.with_timezone(&Utc)))
                .unwrap_or_else(|_| SortKey::Text(s.clone())),
        ),
        _ => None,
    }
}
