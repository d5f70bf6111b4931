//! Minimal CubeCobra blog client.
//!
//! This crate provides a focused client for a cube's blog feed:
//! - Single-page fetches with pagination-terminator semantics
//! - A newest-first page stream that ends at the first unavailable page
//!
//! Blog pages are served newest-first: page 0 holds the most recent posts,
//! higher indices reach further back in time. An unavailable page (any
//! non-success status) marks the end of the feed rather than an error.

use thiserror::Error;
use tokio_stream::Stream;

const DEFAULT_BASE_URL: &str = "https://cubecobra.com";
const USER_AGENT: &str = concat!("cubehist/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when talking to CubeCobra.
///
/// Note that an unavailable blog page is *not* an error: it terminates
/// pagination. Only transport-level failures surface here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to read page body: {0}")]
    Body(String),
}

/// One fetched blog page.
#[derive(Debug, Clone)]
pub struct BlogPage {
    /// Zero-based page index; 0 is the newest page.
    pub index: usize,
    /// The raw HTML body of the page.
    pub html: String,
}

/// CubeCobra blog client.
#[derive(Clone)]
pub struct BlogClient {
    client: reqwest::Client,
    base_url: String,
}

impl BlogClient {
    /// Create a new client against the public CubeCobra instance.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(std::time::Duration::from_secs(30))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a client honoring the `CUBECOBRA_BASE_URL` environment
    /// variable, falling back to the public instance.
    pub fn from_env() -> Self {
        match std::env::var("CUBECOBRA_BASE_URL") {
            Ok(base) if !base.trim().is_empty() => Self::new().with_base_url(base),
            _ => Self::new(),
        }
    }

    /// Point the client at a different base URL (mirror, fixture server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        self.base_url = base.trim_end_matches('/').to_string();
        self
    }

    /// Fetch one blog page of a cube.
    ///
    /// Returns `Ok(Some(html))` on success and `Ok(None)` when the page is
    /// unavailable (any non-success status), the signal that pagination has
    /// run past the end of the feed. Transport failures are `Err`.
    pub async fn fetch_blog_page(
        &self,
        cube_id: &str,
        page: usize,
    ) -> Result<Option<String>, Error> {
        let url = self.page_url(cube_id, page);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::Body(e.to_string()))?;

        Ok(Some(html))
    }

    /// Stream a cube's blog pages, newest first.
    ///
    /// The stream starts at page 0 and ends at the first unavailable page or
    /// after `max_pages` items. A transport failure is yielded as a final
    /// `Err` item, after which the stream ends.
    pub fn blog_pages<'a>(
        &'a self,
        cube_id: &'a str,
        max_pages: usize,
    ) -> impl Stream<Item = Result<BlogPage, Error>> + 'a {
        futures::stream::unfold(0usize, move |page| async move {
            if page >= max_pages {
                return None;
            }
            match self.fetch_blog_page(cube_id, page).await {
                Ok(Some(html)) => Some((Ok(BlogPage { index: page, html }), page + 1)),
                Ok(None) => None,
                Err(e) => Some((Err(e), max_pages)),
            }
        })
    }

    /// The base URL this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn page_url(&self, cube_id: &str, page: usize) -> String {
        format!("{}/cube/blog/{}/{}", self.base_url, cube_id, page)
    }
}

impl Default for BlogClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_client_creation() {
        let client = BlogClient::new();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let client = BlogClient::new().with_base_url("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_page_url() {
        let client = BlogClient::new().with_base_url("http://localhost:8080");
        assert_eq!(
            client.page_url("modernclassics", 3),
            "http://localhost:8080/cube/blog/modernclassics/3"
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_error() {
        // Nothing listens on this port; the connect itself must fail.
        let client = BlogClient::new().with_base_url("http://127.0.0.1:9");
        let result = client.fetch_blog_page("modernclassics", 0).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_stream_yields_transport_failure_then_ends() {
        let client = BlogClient::new().with_base_url("http://127.0.0.1:9");
        let mut pages = Box::pin(client.blog_pages("modernclassics", 5));

        let first = pages.next().await;
        assert!(matches!(first, Some(Err(Error::Network(_)))));
        assert!(pages.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_respects_max_pages_zero() {
        let client = BlogClient::new().with_base_url("http://127.0.0.1:9");
        let mut pages = Box::pin(client.blog_pages("modernclassics", 0));
        assert!(pages.next().await.is_none());
    }

    /// Serve exactly one request with the given status line and an empty
    /// body, then close. Returns the base URL to point a client at.
    fn spawn_one_shot_status(status: &str) -> String {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind failed");
        let addr = listener.local_addr().expect("no local addr");
        let response =
            format!("HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    match stream.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            request.extend_from_slice(&buf[..n]);
                            if request.windows(4).any(|win| win == b"\r\n\r\n") {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_unavailable_page_is_pagination_end() {
        let base = spawn_one_shot_status("404 Not Found");
        let client = BlogClient::new().with_base_url(base);

        let page = client.fetch_blog_page("modernclassics", 0).await.unwrap();
        assert_eq!(page, None);
    }

    #[tokio::test]
    async fn test_stream_ends_at_unavailable_page() {
        let base = spawn_one_shot_status("404 Not Found");
        let client = BlogClient::new().with_base_url(base);

        let mut pages = Box::pin(client.blog_pages("modernclassics", 5));
        assert!(pages.next().await.is_none());
    }

    /// Live test against the public CubeCobra instance.
    ///
    /// Run with: `cargo test -p cubecobra -- --ignored --nocapture`
    #[tokio::test]
    #[ignore]
    async fn test_fetch_live_blog_page() {
        let client = BlogClient::from_env();
        let page = client
            .fetch_blog_page("modernclassics", 0)
            .await
            .expect("fetch failed");

        let html = page.expect("newest blog page should exist");
        assert!(!html.is_empty());
        println!("fetched {} bytes", html.len());
    }
}
