pub mod memory;
pub mod postgres;
pub mod seed;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store-native record: column name to value, snake_case keys
pub type Row = serde_json::Map<String, Value>;

/// Tables owned by the external store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Businesses,
    Profiles,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Businesses => "businesses",
            Self::Profiles => "profiles",
        }
    }
}

/// Single constraint of a select request
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Column equals value exactly
    Eq { column: &'static str, value: Value },
    /// Case-insensitive substring match against any of the columns
    Contains {
        columns: &'static [&'static str],
        needle: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

/// Backend-neutral select request. Predicates combine with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub predicates: Vec<Predicate>,
    pub order: Option<Order>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: &str) -> Self {
        Self::new().eq("id", id)
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Eq {
            column,
            value: value.into(),
        });
        self
    }

    pub fn contains(mut self, columns: &'static [&'static str], needle: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Contains {
            columns,
            needle: needle.into(),
        });
        self
    }

    pub fn order_by(mut self, column: &'static str, descending: bool) -> Self {
        self.order = Some(Order { column, descending });
        self
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected request: {0}")]
    Rejected(String),
    #[error("no row in {table} with id {id}")]
    NotFound { table: &'static str, id: String },
}

impl StoreError {
    pub fn not_found(table: Table, id: &str) -> Self {
        Self::NotFound {
            table: table.name(),
            id: id.to_string(),
        }
    }
}

/// Row-level contract shared by the hosted store and the in-memory stand-in
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Short backend label used in logs and health output
    fn backend(&self) -> &'static str;

    async fn select(&self, table: Table, query: &SelectQuery) -> Result<Vec<Row>, StoreError>;

    /// Inserts a row; the store assigns `id` (unless supplied) and `created_at`
    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError>;

    /// Overwrites the given columns of the row with `id`
    async fn update(&self, table: Table, id: &str, row: Row) -> Result<Row, StoreError>;

    async fn delete(&self, table: Table, id: &str) -> Result<(), StoreError>;
}

/// Escapes LIKE metacharacters so user input is matched literally
pub(crate) fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
