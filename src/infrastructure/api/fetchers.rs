#[cfg(test)]
#[path = "fetchers_test.rs"]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;

use super::ApiClient;
use crate::domain::models::ActivityLog;
use crate::domain::models::ActivityQuery;
use crate::domain::models::ClientError;
use crate::domain::models::Comment;
use crate::domain::models::Page;
use crate::domain::models::PageSource;
use crate::domain::models::Post;

/// The global feed, or the feed of personas someone follows.
pub struct FeedSource {
    client: Arc<ApiClient>,
    following_of: Option<String>,
    limit: u32,
}

impl FeedSource {
    pub fn global(client: Arc<ApiClient>, limit: u32) -> FeedSource {
        return FeedSource {
            client,
            following_of: None,
            limit,
        };
    }

    pub fn following(client: Arc<ApiClient>, persona_id: &str, limit: u32) -> FeedSource {
        return FeedSource {
            client,
            following_of: Some(persona_id.to_string()),
            limit,
        };
    }
}

#[async_trait]
impl PageSource<Post> for FeedSource {
    #[allow(clippy::implicit_return)]
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page<Post>, ClientError> {
        match &self.following_of {
            Some(persona_id) => {
                return self
                    .client
                    .following_feed(persona_id, self.limit, cursor)
                    .await
            }
            None => return self.client.feed(self.limit, cursor).await,
        }
    }
}

pub struct ActivitySource {
    client: Arc<ApiClient>,
    persona_id: String,
    query: ActivityQuery,
}

impl ActivitySource {
    pub fn new(
        client: Arc<ApiClient>,
        persona_id: &str,
        limit: u32,
        activity_type: Option<String>,
        triggered_by: Option<String>,
    ) -> ActivitySource {
        return ActivitySource {
            client,
            persona_id: persona_id.to_string(),
            query: ActivityQuery {
                limit,
                cursor: None,
                activity_type,
                triggered_by,
            },
        };
    }
}

#[async_trait]
impl PageSource<ActivityLog> for ActivitySource {
    #[allow(clippy::implicit_return)]
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page<ActivityLog>, ClientError> {
        let query = ActivityQuery {
            cursor: cursor.map(|e| return e.to_string()),
            ..self.query.clone()
        };

        return self.client.activity_logs(&self.persona_id, &query).await;
    }
}

/// A post's comment tree. The endpoint returns everything at once, so the
/// first page is always the last.
pub struct CommentsSource {
    client: Arc<ApiClient>,
    post_id: String,
}

impl CommentsSource {
    pub fn new(client: Arc<ApiClient>, post_id: &str) -> CommentsSource {
        return CommentsSource {
            client,
            post_id: post_id.to_string(),
        };
    }
}

#[async_trait]
impl PageSource<Comment> for CommentsSource {
    #[allow(clippy::implicit_return)]
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page<Comment>, ClientError> {
        if cursor.is_some() {
            return Ok(Page::last(vec![]));
        }

        let comments = self.client.comments(&self.post_id).await?;
        return Ok(Page::last(comments));
    }
}
