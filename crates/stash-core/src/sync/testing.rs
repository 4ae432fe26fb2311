//! In-memory fakes of the remote listing for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, Semaphore};

use super::{BookmarkSource, Page};
use crate::models::{Item, ItemGraph, Platform};
use crate::{Error, Result};

pub enum FakePage {
    Items(Vec<ItemGraph>),
    Unauthorized,
    NetworkError,
}

/// Listing whose continuation tokens are page indexes
pub struct FakeSource {
    platform: Platform,
    pages: Vec<FakePage>,
    threads: HashMap<String, Vec<Vec<ItemGraph>>>,
    failing_thread_pages: HashSet<(String, usize)>,
    gate: Option<Arc<Semaphore>>,
    page_calls: AtomicUsize,
    tokens_seen: Mutex<Vec<String>>,
    thread_calls: Mutex<Vec<String>>,
    /// Notified on every page fetch, before the gate is awaited
    pub entered: Arc<Notify>,
}

impl FakeSource {
    pub fn new(platform: Platform, pages: Vec<FakePage>) -> Self {
        Self {
            platform,
            pages,
            threads: HashMap::new(),
            failing_thread_pages: HashSet::new(),
            gate: None,
            page_calls: AtomicUsize::new(0),
            tokens_seen: Mutex::new(Vec::new()),
            thread_calls: Mutex::new(Vec::new()),
            entered: Arc::new(Notify::new()),
        }
    }

    pub fn with_thread(mut self, conversation_id: &str, pages: Vec<Vec<ItemGraph>>) -> Self {
        self.threads.insert(conversation_id.to_string(), pages);
        self
    }

    pub fn failing_thread_page(mut self, conversation_id: &str, index: usize) -> Self {
        self.failing_thread_pages
            .insert((conversation_id.to_string(), index));
        self
    }

    /// Block every page fetch until the semaphore hands out a permit
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }

    pub fn thread_calls(&self) -> Vec<String> {
        self.thread_calls.lock().unwrap().clone()
    }
}

fn page_index(continuation: Option<&str>) -> usize {
    continuation.and_then(|token| token.parse().ok()).unwrap_or(0)
}

fn next_token(index: usize, len: usize) -> Option<String> {
    (index + 1 < len).then(|| (index + 1).to_string())
}

impl BookmarkSource for FakeSource {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch_page(
        &self,
        access_token: &str,
        _account_id: &str,
        continuation: Option<&str>,
        _page_size: usize,
    ) -> Result<Page> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen
            .lock()
            .unwrap()
            .push(access_token.to_string());
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await;
        }

        let index = page_index(continuation);
        match self.pages.get(index) {
            Some(FakePage::Items(items)) => Ok(Page::new(
                items.clone(),
                next_token(index, self.pages.len()),
            )),
            Some(FakePage::Unauthorized) => Err(Error::Unauthorized),
            Some(FakePage::NetworkError) => {
                Err(Error::Api("upstream unavailable (503)".to_string()))
            }
            None => Ok(Page::default()),
        }
    }

    async fn fetch_thread(
        &self,
        _access_token: &str,
        _author_id: &str,
        conversation_id: &str,
        continuation: Option<&str>,
    ) -> Result<Page> {
        self.thread_calls
            .lock()
            .unwrap()
            .push(conversation_id.to_string());

        let index = page_index(continuation);
        if self
            .failing_thread_pages
            .contains(&(conversation_id.to_string(), index))
        {
            return Err(Error::Api("thread lookup failed (500)".to_string()));
        }
        let Some(pages) = self.threads.get(conversation_id) else {
            return Ok(Page::default());
        };
        Ok(Page::new(
            pages.get(index).cloned().unwrap_or_default(),
            next_token(index, pages.len()),
        ))
    }
}

pub fn tweet(id: &str) -> ItemGraph {
    ItemGraph::new(
        Item::new(Platform::Twitter, id)
            .by("u1")
            .created(format!("2024-05-01T12:00:{:0>2}Z", id.len()))
            .with_text(format!("tweet {id}")),
    )
}

pub fn reply(id: &str, conversation_id: &str) -> ItemGraph {
    ItemGraph::new(
        Item::new(Platform::Twitter, id)
            .by("u1")
            .in_conversation(conversation_id)
            .created(format!("2024-05-01T12:01:{id:0>2}Z"))
            .with_text(format!("reply {id}")),
    )
}

pub fn reddit_post(id: &str) -> ItemGraph {
    ItemGraph::new(
        Item::new(Platform::Reddit, id)
            .by("t2_author")
            .created("2024-05-01T12:00:00Z")
            .with_text(format!("post {id}")),
    )
}
