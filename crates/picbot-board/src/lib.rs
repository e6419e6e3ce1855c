//! Board API adapter (reqwest).
//!
//! Implements the core `BoardPort` over the board's public JSON endpoints:
//! `GET {base}/{board}/threads.json` for the index and
//! `GET {base}/{board}/res/{id}.json` for a thread's post listing.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use picbot_core::{
    domain::{ThreadId, ThreadSummary},
    ports::BoardPort,
    Error, Result,
};

#[derive(Clone)]
pub struct BoardClient {
    http: reqwest::Client,
    base_url: String,
    board: String,
}

impl BoardClient {
    pub fn new(base_url: &str, board: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Board(format!("http client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            board: board.to_string(),
        })
    }

    fn index_url(&self) -> String {
        format!("{}/{}/threads.json", self.base_url, self.board)
    }

    fn thread_url(&self, thread: &ThreadId) -> String {
        format!("{}/{}/res/{}.json", self.base_url, self.board, thread.0)
    }

    /// File paths on the wire are board-absolute (`/b/src/1.jpg`).
    fn absolute_link(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ThreadIndex {
    #[serde(default)]
    threads: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    num: i64,
    #[serde(default)]
    subject: String,
}

#[derive(Debug, Deserialize)]
struct ThreadDetail {
    #[serde(default)]
    threads: Vec<DetailThread>,
}

#[derive(Debug, Deserialize)]
struct DetailThread {
    #[serde(default)]
    posts: Option<Vec<Post>>,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    files: Option<Vec<PostFile>>,
}

#[derive(Debug, Deserialize)]
struct PostFile {
    path: String,
}

fn image_links(client: &BoardClient, detail: ThreadDetail) -> Vec<String> {
    let mut links = Vec::new();
    for thread in detail.threads {
        for post in thread.posts.unwrap_or_default() {
            for file in post.files.unwrap_or_default() {
                links.push(client.absolute_link(&file.path));
            }
        }
    }
    links
}

#[async_trait]
impl BoardPort for BoardClient {
    async fn fetch_index(&self) -> Result<Vec<ThreadSummary>> {
        let resp = self
            .http
            .get(self.index_url())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Board(format!("index fetch: {e}")))?;

        let index: ThreadIndex = resp
            .json()
            .await
            .map_err(|e| Error::Board(format!("index decode: {e}")))?;

        Ok(index
            .threads
            .into_iter()
            .map(|t| ThreadSummary {
                id: ThreadId(t.num.to_string()),
                subject: t.subject,
            })
            .collect())
    }

    async fn fetch_thread_images(&self, thread: &ThreadId) -> Result<Vec<String>> {
        let resp = self
            .http
            .get(self.thread_url(thread))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Board(format!("thread {thread} fetch: {e}")))?;

        let detail: ThreadDetail = resp
            .json()
            .await
            .map_err(|e| Error::Board(format!("thread {thread} decode: {e}")))?;

        Ok(image_links(self, detail))
    }
}
