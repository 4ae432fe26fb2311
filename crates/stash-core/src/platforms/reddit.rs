//! Reddit saved-items client.
//!
//! Saved posts (`t3_`) and comments (`t1_`) are keyed by their fullname. A
//! post is its own conversation; a comment belongs to the conversation of
//! the post it was made on (`link_id`).

use chrono::{DateTime, SecondsFormat};
use reqwest::Client;
use serde::Deserialize;

use super::{ensure_success, parse_token_response};
use crate::auth::{TokenPair, TokenRefresher};
use crate::config::RedditConfig;
use crate::models::{Author, Item, ItemGraph, ItemMetrics, MediaAttachment, Platform};
use crate::sync::{BookmarkSource, Page, MAX_PAGE_SIZE};
use crate::{Error, Result};

const POST_KIND: &str = "t3";
const COMMENT_KIND: &str = "t1";
const WEB_BASE_URL: &str = "https://www.reddit.com";
/// Upper bound on comments returned for one thread lookup
const THREAD_COMMENT_LIMIT: &str = "500";

#[derive(Clone)]
pub struct RedditClient {
    config: RedditConfig,
    client: Client,
}

impl RedditClient {
    pub fn new(config: RedditConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { config, client })
    }

    fn saved_url(&self, account_id: &str) -> String {
        format!(
            "{}/user/{}/saved",
            self.config.api_base_url,
            account_id.trim()
        )
    }

    fn thread_url(&self, conversation_id: &str) -> String {
        let article = conversation_id
            .strip_prefix("t3_")
            .unwrap_or(conversation_id);
        format!("{}/comments/{article}", self.config.api_base_url)
    }
}

impl BookmarkSource for RedditClient {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    async fn fetch_page(
        &self,
        access_token: &str,
        account_id: &str,
        continuation: Option<&str>,
        page_size: usize,
    ) -> Result<Page> {
        let mut query = vec![
            ("limit", page_size.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(after) = continuation {
            query.push(("after", after.to_string()));
        }

        let response = self
            .client
            .get(self.saved_url(account_id))
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await?;
        let listing = ensure_success(response).await?.json::<Listing>().await?;

        let items = listing
            .data
            .children
            .iter()
            .filter_map(|thing| thing_to_graph(thing, false))
            .collect();
        Ok(Page::new(items, listing.data.after))
    }

    /// The whole comment tree arrives in one response, so there is never a
    /// continuation token.
    async fn fetch_thread(
        &self,
        access_token: &str,
        _author_id: &str,
        conversation_id: &str,
        _continuation: Option<&str>,
    ) -> Result<Page> {
        let response = self
            .client
            .get(self.thread_url(conversation_id))
            .bearer_auth(access_token)
            .query(&[("raw_json", "1"), ("limit", THREAD_COMMENT_LIMIT)])
            .send()
            .await?;
        let listings = ensure_success(response)
            .await?
            .json::<Vec<Listing>>()
            .await?;
        Ok(Page::new(flatten_thread(&listings), None))
    }
}

impl TokenRefresher for RedditClient {
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair> {
        let Some(client_id) = self.config.client_id.as_deref() else {
            return Err(Error::InvalidInput(
                "STASH_REDDIT_CLIENT_ID is required to refresh tokens".to_string(),
            ));
        };

        // Installed apps have no secret and authenticate with an empty password.
        let response = self
            .client
            .post(&self.config.token_url)
            .basic_auth(client_id, Some(self.config.client_secret.as_deref().unwrap_or("")))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;
        parse_token_response(response).await
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
struct ListingData {
    after: Option<String>,
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: ThingData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThingData {
    name: Option<String>,
    author: Option<String>,
    author_fullname: Option<String>,
    title: Option<String>,
    selftext: Option<String>,
    body: Option<String>,
    link_id: Option<String>,
    permalink: Option<String>,
    created_utc: Option<f64>,
    score: Option<i64>,
    num_comments: Option<i64>,
    num_crossposts: Option<i64>,
    post_hint: Option<String>,
    url: Option<String>,
    /// Empty string when there are no replies, otherwise a listing
    replies: serde_json::Value,
}

/// Post first, then its comments depth-first
fn flatten_thread(listings: &[Listing]) -> Vec<ItemGraph> {
    let mut graphs = Vec::new();
    for listing in listings {
        collect_things(&listing.data.children, &mut graphs);
    }
    graphs
}

fn collect_things(things: &[Thing], graphs: &mut Vec<ItemGraph>) {
    for thing in things {
        // "more" stubs carry only ids of comments that were cut off.
        let Some(graph) = thing_to_graph(thing, true) else {
            continue;
        };
        graphs.push(graph);

        if thing.data.replies.is_object() {
            match serde_json::from_value::<Listing>(thing.data.replies.clone()) {
                Ok(replies) => collect_things(&replies.data.children, graphs),
                Err(error) => tracing::debug!("Skipping malformed replies: {}", error),
            }
        }
    }
}

fn thing_to_graph(thing: &Thing, in_thread: bool) -> Option<ItemGraph> {
    let data = &thing.data;
    let id = data.name.clone()?;

    let (conversation_id, text) = match thing.kind.as_str() {
        POST_KIND => (id.clone(), post_text(data)),
        COMMENT_KIND => (
            data.link_id.clone().unwrap_or_else(|| id.clone()),
            data.body.clone().unwrap_or_default(),
        ),
        _ => return None,
    };

    let author_name = data.author.clone().unwrap_or_default();
    let author_id = data
        .author_fullname
        .clone()
        .unwrap_or_else(|| author_name.clone());

    let mut item = Item::new(Platform::Reddit, id.as_str())
        .by(author_id.as_str())
        .in_conversation(conversation_id)
        .created(data.created_utc.and_then(to_rfc3339).unwrap_or_default())
        .with_text(text);
    if let Some(permalink) = &data.permalink {
        item = item.with_url(format!("{WEB_BASE_URL}{permalink}"));
    }
    if in_thread {
        item = item.referenced();
    }

    let mut graph = ItemGraph::new(item);
    if !author_id.is_empty() {
        graph.push_author(Author {
            platform: Platform::Reddit,
            id: author_id,
            username: author_name,
            display_name: None,
        });
    }
    graph.metrics.push((
        id.clone(),
        ItemMetrics {
            likes: data.score.unwrap_or_default(),
            reposts: data.num_crossposts.unwrap_or_default(),
            replies: data.num_comments.unwrap_or_default(),
        },
    ));
    if data.post_hint.as_deref() == Some("image") {
        if let Some(url) = &data.url {
            graph.media.push(MediaAttachment {
                platform: Platform::Reddit,
                key: format!("{id}:image"),
                item_id: id,
                kind: "image".to_string(),
                url: Some(url.clone()),
            });
        }
    }
    Some(graph)
}

fn post_text(data: &ThingData) -> String {
    let title = data.title.as_deref().unwrap_or_default().trim();
    let body = data.selftext.as_deref().unwrap_or_default().trim();
    if body.is_empty() {
        title.to_string()
    } else {
        format!("{title}\n\n{body}")
    }
}

#[allow(clippy::cast_possible_truncation)] // created_utc is whole seconds
fn to_rfc3339(created_utc: f64) -> Option<String> {
    DateTime::from_timestamp(created_utc as i64, 0)
        .map(|timestamp| timestamp.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    const SAVED_FIXTURE: &str = r#"{
        "kind": "Listing",
        "data": {
            "after": "t1_k2",
            "children": [
                {
                    "kind": "t3",
                    "data": {
                        "name": "t3_abc",
                        "author": "alice",
                        "author_fullname": "t2_alice",
                        "title": "A post",
                        "selftext": "with a body",
                        "permalink": "/r/rust/comments/abc/a_post/",
                        "created_utc": 1717236000.0,
                        "score": 42,
                        "num_comments": 5,
                        "num_crossposts": 1,
                        "post_hint": "image",
                        "url": "https://i.redd.it/x.png"
                    }
                },
                {
                    "kind": "t1",
                    "data": {
                        "name": "t1_k2",
                        "author": "bob",
                        "body": "saved comment",
                        "link_id": "t3_zzz",
                        "permalink": "/r/rust/comments/zzz/t/k2/",
                        "created_utc": 1717236060.0,
                        "score": 3,
                        "replies": ""
                    }
                }
            ]
        }
    }"#;

    const THREAD_FIXTURE: &str = r#"[
        {"kind": "Listing", "data": {"after": null, "children": [
            {"kind": "t3", "data": {"name": "t3_zzz", "author": "op", "title": "Thread", "created_utc": 1717000000.0}}
        ]}},
        {"kind": "Listing", "data": {"after": null, "children": [
            {"kind": "t1", "data": {"name": "t1_a", "author": "x", "body": "top", "link_id": "t3_zzz",
                "replies": {"kind": "Listing", "data": {"after": null, "children": [
                    {"kind": "t1", "data": {"name": "t1_a1", "author": "y", "body": "nested", "link_id": "t3_zzz", "replies": ""}},
                    {"kind": "more", "data": {"count": 4, "children": ["b2", "b3"]}}
                ]}}}},
            {"kind": "t1", "data": {"name": "t1_b", "author": "z", "body": "second", "link_id": "t3_zzz", "replies": ""}}
        ]}}
    ]"#;

    fn client() -> RedditClient {
        RedditClient::new(RedditConfig {
            api_base_url: "https://oauth.reddit.com".to_string(),
            token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            client_id: None,
            client_secret: None,
            user_agent: "stash-tests/0.1".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn normalizes_saved_posts_and_comments() {
        let listing: Listing = serde_json::from_str(SAVED_FIXTURE).unwrap();
        let graphs: Vec<ItemGraph> = listing
            .data
            .children
            .iter()
            .filter_map(|thing| thing_to_graph(thing, false))
            .collect();

        assert_eq!(listing.data.after.as_deref(), Some("t1_k2"));
        assert_eq!(graphs.len(), 2);

        let post = &graphs[0];
        assert_eq!(post.root.id, "t3_abc");
        assert!(post.root.is_conversation_root());
        assert_eq!(post.root.author_id, "t2_alice");
        assert_eq!(post.root.text, "A post\n\nwith a body");
        assert_eq!(post.root.created_at, "2024-06-01T10:00:00Z");
        assert_eq!(
            post.root.url.as_deref(),
            Some("https://www.reddit.com/r/rust/comments/abc/a_post/")
        );
        assert_eq!(
            post.metrics[0].1,
            ItemMetrics {
                likes: 42,
                reposts: 1,
                replies: 5
            }
        );
        assert_eq!(post.media[0].key, "t3_abc:image");

        let comment = &graphs[1];
        assert_eq!(comment.root.conversation_id, "t3_zzz");
        assert_eq!(comment.root.author_id, "bob");
        assert!(!comment.root.is_referenced);
    }

    #[test]
    fn flattens_comment_tree_depth_first() {
        let listings: Vec<Listing> = serde_json::from_str(THREAD_FIXTURE).unwrap();
        let graphs = flatten_thread(&listings);

        let ids: Vec<&str> = graphs.iter().map(ItemGraph::id).collect();
        assert_eq!(ids, vec!["t3_zzz", "t1_a", "t1_a1", "t1_b"]);
        assert!(graphs
            .iter()
            .all(|graph| graph.root.conversation_id == "t3_zzz"));
        assert!(graphs.iter().all(|graph| graph.root.is_referenced));
    }

    #[test]
    fn thread_url_strips_fullname_prefix() {
        let client = client();
        assert_eq!(
            client.thread_url("t3_zzz"),
            "https://oauth.reddit.com/comments/zzz"
        );
        assert_eq!(
            client.saved_url("alice"),
            "https://oauth.reddit.com/user/alice/saved"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refresh_requires_client_id() {
        let error = client().refresh_tokens("r1").await.unwrap_err();
        assert!(error.to_string().contains("STASH_REDDIT_CLIENT_ID"));
    }
}
