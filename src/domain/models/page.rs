use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use super::ClientError;

/// Cursor-paginated list response: `{items, next_cursor}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Page<T> {
        return Page { items, next_cursor };
    }

    pub fn last(items: Vec<T>) -> Page<T> {
        return Page {
            items,
            next_cursor: None,
        };
    }

    pub fn is_exhausted(&self) -> bool {
        return self.next_cursor.is_none();
    }
}

/// A stateless page fetch. `None` asks for the first page.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page<T>, ClientError>;
}
