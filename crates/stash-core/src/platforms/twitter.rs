//! Twitter/X API v2 bookmarks client.

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;

use super::{ensure_success, parse_token_response};
use crate::auth::{TokenPair, TokenRefresher};
use crate::config::TwitterConfig;
use crate::models::{Author, Item, ItemGraph, ItemMetrics, MediaAttachment, Platform};
use crate::sync::{BookmarkSource, Page, MAX_PAGE_SIZE};
use crate::{Error, Result};

const TWEET_FIELDS: &str =
    "author_id,conversation_id,created_at,public_metrics,referenced_tweets,attachments";
const EXPANSIONS: &str =
    "author_id,attachments.media_keys,referenced_tweets.id,referenced_tweets.id.author_id";
const USER_FIELDS: &str = "username,name";
const MEDIA_FIELDS: &str = "type,url,preview_image_url";

#[derive(Clone)]
pub struct TwitterClient {
    config: TwitterConfig,
    client: Client,
}

impl TwitterClient {
    pub fn new(config: TwitterConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn bookmarks_url(&self, account_id: &str) -> String {
        format!(
            "{}/2/users/{}/bookmarks",
            self.config.api_base_url,
            account_id.trim()
        )
    }

    fn search_url(&self) -> String {
        format!("{}/2/tweets/search/recent", self.config.api_base_url)
    }

    async fn get_tweets(
        &self,
        url: String,
        access_token: &str,
        query: Vec<(&'static str, String)>,
    ) -> Result<Page> {
        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .query(&query)
            .query(&[
                ("tweet.fields", TWEET_FIELDS),
                ("expansions", EXPANSIONS),
                ("user.fields", USER_FIELDS),
                ("media.fields", MEDIA_FIELDS),
            ])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let payload = response.json::<TweetListResponse>().await?;
        Ok(normalize_listing(payload))
    }
}

impl BookmarkSource for TwitterClient {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn fetch_page(
        &self,
        access_token: &str,
        account_id: &str,
        continuation: Option<&str>,
        page_size: usize,
    ) -> Result<Page> {
        let mut query = vec![(
            "max_results",
            page_size.clamp(1, MAX_PAGE_SIZE).to_string(),
        )];
        if let Some(token) = continuation {
            query.push(("pagination_token", token.to_string()));
        }
        self.get_tweets(self.bookmarks_url(account_id), access_token, query)
            .await
    }

    async fn fetch_thread(
        &self,
        access_token: &str,
        author_id: &str,
        conversation_id: &str,
        continuation: Option<&str>,
    ) -> Result<Page> {
        let mut query = vec![
            ("query", thread_query(author_id, conversation_id)),
            ("max_results", MAX_PAGE_SIZE.to_string()),
        ];
        if let Some(token) = continuation {
            query.push(("next_token", token.to_string()));
        }
        self.get_tweets(self.search_url(), access_token, query).await
    }
}

impl TokenRefresher for TwitterClient {
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair> {
        let Some(client_id) = self.config.client_id.as_deref() else {
            return Err(Error::InvalidInput(
                "STASH_TWITTER_CLIENT_ID is required to refresh tokens".to_string(),
            ));
        };

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id),
            ])
            .send()
            .await?;
        parse_token_response(response).await
    }
}

/// Replies by the thread's author within one conversation
fn thread_query(author_id: &str, conversation_id: &str) -> String {
    if author_id.trim().is_empty() {
        format!("conversation_id:{conversation_id}")
    } else {
        format!("conversation_id:{conversation_id} from:{author_id}")
    }
}

#[derive(Debug, Default, Deserialize)]
struct TweetListResponse {
    #[serde(default)]
    data: Vec<TweetData>,
    #[serde(default)]
    includes: Includes,
    #[serde(default)]
    meta: Meta,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
    #[serde(default)]
    text: String,
    author_id: Option<String>,
    conversation_id: Option<String>,
    created_at: Option<String>,
    public_metrics: Option<PublicMetrics>,
    #[serde(default)]
    referenced_tweets: Vec<ReferencedTweet>,
    attachments: Option<Attachments>,
}

#[derive(Debug, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    like_count: i64,
    #[serde(default)]
    retweet_count: i64,
    #[serde(default)]
    quote_count: i64,
    #[serde(default)]
    reply_count: i64,
}

#[derive(Debug, Deserialize)]
struct ReferencedTweet {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Attachments {
    #[serde(default)]
    media_keys: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<UserData>,
    #[serde(default)]
    tweets: Vec<TweetData>,
    #[serde(default)]
    media: Vec<MediaData>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
    username: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaData {
    media_key: String,
    #[serde(rename = "type")]
    kind: String,
    url: Option<String>,
    preview_image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    next_token: Option<String>,
}

struct Lookup<'a> {
    users: HashMap<&'a str, &'a UserData>,
    tweets: HashMap<&'a str, &'a TweetData>,
    media: HashMap<&'a str, &'a MediaData>,
}

fn normalize_listing(response: TweetListResponse) -> Page {
    let lookup = Lookup {
        users: response
            .includes
            .users
            .iter()
            .map(|user| (user.id.as_str(), user))
            .collect(),
        tweets: response
            .includes
            .tweets
            .iter()
            .map(|tweet| (tweet.id.as_str(), tweet))
            .collect(),
        media: response
            .includes
            .media
            .iter()
            .map(|media| (media.media_key.as_str(), media))
            .collect(),
    };

    let items = response
        .data
        .iter()
        .map(|tweet| {
            let mut graph = ItemGraph::new(to_item(tweet, &lookup));
            attach_extras(&mut graph, tweet, &lookup);

            for reference in &tweet.referenced_tweets {
                let Some(referenced) = lookup.tweets.get(reference.id.as_str()) else {
                    continue;
                };
                if graph.items().any(|item| item.id == referenced.id) {
                    continue;
                }
                graph
                    .referenced
                    .push(to_item(referenced, &lookup).referenced());
                attach_extras(&mut graph, referenced, &lookup);
            }
            graph
        })
        .collect();

    Page::new(items, response.meta.next_token)
}

fn to_item(tweet: &TweetData, lookup: &Lookup<'_>) -> Item {
    let author_id = tweet.author_id.clone().unwrap_or_default();
    let url = match lookup.users.get(author_id.as_str()) {
        Some(user) => format!("https://x.com/{}/status/{}", user.username, tweet.id),
        None => format!("https://x.com/i/web/status/{}", tweet.id),
    };

    Item::new(Platform::Twitter, tweet.id.as_str())
        .by(author_id)
        .in_conversation(
            tweet
                .conversation_id
                .clone()
                .unwrap_or_else(|| tweet.id.clone()),
        )
        .created(tweet.created_at.clone().unwrap_or_default())
        .with_text(tweet.text.as_str())
        .with_url(url)
}

fn attach_extras(graph: &mut ItemGraph, tweet: &TweetData, lookup: &Lookup<'_>) {
    if let Some(user) = tweet
        .author_id
        .as_deref()
        .and_then(|id| lookup.users.get(id))
    {
        graph.push_author(Author {
            platform: Platform::Twitter,
            id: user.id.clone(),
            username: user.username.clone(),
            display_name: user.name.clone(),
        });
    }

    if let Some(metrics) = &tweet.public_metrics {
        graph.metrics.push((
            tweet.id.clone(),
            ItemMetrics {
                likes: metrics.like_count,
                reposts: metrics.retweet_count + metrics.quote_count,
                replies: metrics.reply_count,
            },
        ));
    }

    let keys = tweet
        .attachments
        .as_ref()
        .map(|attachments| attachments.media_keys.as_slice())
        .unwrap_or_default();
    for key in keys {
        let Some(media) = lookup.media.get(key.as_str()) else {
            continue;
        };
        graph.media.push(MediaAttachment {
            platform: Platform::Twitter,
            key: media.media_key.clone(),
            item_id: tweet.id.clone(),
            kind: media.kind.clone(),
            url: media.url.clone().or_else(|| media.preview_image_url.clone()),
        });
    }
}
