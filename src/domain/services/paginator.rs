#[cfg(test)]
#[path = "paginator_test.rs"]
mod tests;

use crate::domain::models::ClientError;
use crate::domain::models::Page;
use crate::domain::models::PageSource;

/// Held state of a cursor-paginated list: the collection so far, where to
/// continue from, and whether a fetch is in flight.
#[derive(Clone, Debug)]
pub struct Paginator<T> {
    items: Vec<T>,
    next_cursor: Option<String>,
    loading: bool,
}

impl<T> Default for Paginator<T> {
    fn default() -> Paginator<T> {
        return Paginator {
            items: vec![],
            next_cursor: None,
            loading: false,
        };
    }
}

impl<T> Paginator<T> {
    pub fn new() -> Paginator<T> {
        return Paginator::default();
    }

    pub fn items(&self) -> &[T] {
        return &self.items;
    }

    pub fn into_items(self) -> Vec<T> {
        return self.items;
    }

    pub fn next_cursor(&self) -> Option<&str> {
        return self.next_cursor.as_deref();
    }

    pub fn is_loading(&self) -> bool {
        return self.loading;
    }

    pub fn can_load_more(&self) -> bool {
        return self.next_cursor.is_some() && !self.loading;
    }

    /// Folds a fetched page in. A page fetched without a cursor replaces the
    /// collection; a page fetched with one is appended.
    pub fn apply(&mut self, requested_cursor: Option<&str>, page: Page<T>) {
        if requested_cursor.is_none() {
            self.items = page.items;
        } else {
            self.items.extend(page.items);
        }
        self.next_cursor = page.next_cursor;
    }

    /// Drops everything held, for a filter change.
    pub fn reset(&mut self) {
        self.items.clear();
        self.next_cursor = None;
        self.loading = false;
    }

    /// Fetches the first page and replaces the collection with it.
    pub async fn refresh(&mut self, source: &dyn PageSource<T>) -> Result<(), ClientError> {
        self.load(source, None).await?;
        return Ok(());
    }

    /// Fetches the page after the held cursor and appends it. Returns
    /// `Ok(false)` without fetching when the list is exhausted or a fetch is
    /// already running.
    pub async fn load_more(&mut self, source: &dyn PageSource<T>) -> Result<bool, ClientError> {
        if !self.can_load_more() {
            return Ok(false);
        }

        let cursor = self.next_cursor.clone();
        self.load(source, cursor).await?;
        return Ok(true);
    }

    async fn load(
        &mut self,
        source: &dyn PageSource<T>,
        cursor: Option<String>,
    ) -> Result<(), ClientError> {
        self.loading = true;
        let res = source.fetch(cursor.as_deref()).await;
        self.loading = false;

        match res {
            Ok(page) => {
                self.apply(cursor.as_deref(), page);
                return Ok(());
            }
            Err(err) => {
                tracing::warn!(cursor = ?cursor, error = ?err, "Fetching page failed");
                return Err(err);
            }
        }
    }
}
