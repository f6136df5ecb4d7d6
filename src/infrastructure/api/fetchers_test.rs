use std::sync::Arc;

use anyhow::Result;
use mockito::Matcher;
use serde_json::json;

use super::ActivitySource;
use super::CommentsSource;
use super::FeedSource;
use crate::domain::models::ActivityLog;
use crate::domain::models::Comment;
use crate::domain::models::PageSource;
use crate::domain::models::Post;
use crate::domain::services::Paginator;
use crate::infrastructure::api::ApiClient;

fn post_json(id: &str) -> serde_json::Value {
    return json!({
        "id": id,
        "persona_id": "p2",
        "content": format!("post {id}"),
        "created_at": format!("2024-05-10T0{id}:00:00+00:00"),
        "persona": { "id": "p2", "name": "Sol" }
    });
}

#[tokio::test]
async fn it_pages_through_the_following_feed() -> Result<()> {
    let mut server = mockito::Server::new();
    let first = server
        .mock("GET", "/api/sns/feed/p1")
        .match_query(Matcher::Exact("limit=2".to_string()))
        .with_status(200)
        .with_body(
            json!({ "items": [post_json("3"), post_json("2")], "next_cursor": "c2" }).to_string(),
        )
        .create();
    let second = server
        .mock("GET", "/api/sns/feed/p1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "2".into()),
            Matcher::UrlEncoded("cursor".into(), "c2".into()),
        ]))
        .with_status(200)
        .with_body(json!({ "items": [post_json("1")], "next_cursor": null }).to_string())
        .create();

    let client = Arc::new(ApiClient::new(&server.url(), "secret"));
    let source = FeedSource::following(client, "p1", 2);
    let mut paginator: Paginator<Post> = Paginator::new();

    paginator.refresh(&source).await?;
    assert!(paginator.can_load_more());
    assert!(paginator.load_more(&source).await?);

    let ids = paginator
        .items()
        .iter()
        .map(|post| return post.id.to_string())
        .collect::<Vec<String>>();
    assert_eq!(ids, vec!["3", "2", "1"]);
    assert!(!paginator.can_load_more());
    first.assert();
    second.assert();

    return Ok(());
}

#[tokio::test]
async fn it_reloads_activity_when_filters_change() -> Result<()> {
    let mut server = mockito::Server::new();
    let all = server
        .mock("GET", "/api/persona/p1/activity-logs")
        .match_query(Matcher::Exact("limit=20".to_string()))
        .with_status(200)
        .with_body(
            json!({
                "items": [
                    { "id": "a1", "persona_id": "p1", "activity_type": "post", "detail": {}, "triggered_by": "manual", "created_at": "t1" },
                    { "id": "a2", "persona_id": "p1", "activity_type": "like", "detail": {}, "triggered_by": "auto", "created_at": "t2" }
                ],
                "next_cursor": "t2"
            })
            .to_string(),
        )
        .create();
    let filtered = server
        .mock("GET", "/api/persona/p1/activity-logs")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "20".into()),
            Matcher::UrlEncoded("activity_type".into(), "like".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "items": [
                    { "id": "a2", "persona_id": "p1", "activity_type": "like", "detail": {}, "triggered_by": "auto", "created_at": "t2" }
                ],
                "next_cursor": null
            })
            .to_string(),
        )
        .create();

    let client = Arc::new(ApiClient::new(&server.url(), "secret"));
    let mut paginator: Paginator<ActivityLog> = Paginator::new();

    let source = ActivitySource::new(client.clone(), "p1", 20, None, None);
    paginator.refresh(&source).await?;
    assert_eq!(paginator.items().len(), 2);

    paginator.reset();
    let source = ActivitySource::new(client, "p1", 20, Some("like".to_string()), None);
    paginator.refresh(&source).await?;

    assert_eq!(paginator.items().len(), 1);
    assert_eq!(paginator.items()[0].activity_type, "like");
    assert!(!paginator.can_load_more());
    all.assert();
    filtered.assert();

    return Ok(());
}

#[tokio::test]
async fn it_loads_comments_as_a_single_page() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/sns/post/x1/comments")
        .with_status(200)
        .with_body(
            json!([{
                "id": "c1", "post_id": "x1", "persona_id": "p1", "content": "nice",
                "created_at": "t1", "persona": { "id": "p1", "name": "Luna" },
                "replies": [{
                    "id": "c2", "post_id": "x1", "persona_id": "p2", "parent_id": "c1",
                    "content": "thanks", "created_at": "t2", "persona": { "id": "p2", "name": "Sol" }
                }]
            }])
            .to_string(),
        )
        .expect(1)
        .create();

    let client = Arc::new(ApiClient::new(&server.url(), "secret"));
    let source = CommentsSource::new(client, "x1");
    let mut paginator: Paginator<Comment> = Paginator::new();

    paginator.refresh(&source).await?;

    assert_eq!(paginator.items().len(), 1);
    assert_eq!(Comment::flatten(paginator.items()).len(), 2);
    assert!(!paginator.can_load_more());
    assert!(source.fetch(Some("ignored")).await?.items.is_empty());
    mock.assert();

    return Ok(());
}
