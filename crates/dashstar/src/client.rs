use async_trait::async_trait;
use dashstar_core::article::{
    comments_from_slice, detail_from_value, ArticleDetail, ArticlePage, Comment,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::config::ClientConfig;
use crate::prelude::*;

/// Backend operations the listing depends on
#[async_trait]
pub trait ArticleServiceClient: Send + Sync {
    /// `GET /articles?page={page}&size={size}`
    async fn fetch_page(&self, page: usize, size: usize) -> Result<ArticlePage>;

    /// `GET /articles/{id}`
    async fn fetch_article(&self, id: &str) -> Result<ArticleDetail>;

    /// `GET /articles/{id}/comments`
    async fn fetch_comments(&self, id: &str) -> Result<Vec<Comment>>;
}

/// [`ArticleServiceClient`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpArticleClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpArticleClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            base_url: config.api_base().to_string(),
        })
    }
}

/// Create an HTTP client with the configured bearer token and timeout
pub fn create_client(config: &ClientConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    if let Some(token) = &config.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| eyre!("Invalid header value: {}", e))?,
        );
    }

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

#[async_trait]
impl ArticleServiceClient for HttpArticleClient {
    async fn fetch_page(&self, page: usize, size: usize) -> Result<ArticlePage> {
        let url = format!("{}/articles", self.base_url);
        log::debug!("GET {url}?page={page}&size={size}");

        let response = self
            .client
            .get(&url)
            .query(&[("page", page), ("size", size)])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to fetch articles page {page}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http { url, status }.into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read articles page {page}: {e}")))?;

        let article_page = ArticlePage::from_slice(&body);
        log::debug!(
            "page {page}: {} articles, {} total",
            article_page.data.len(),
            article_page.total_articles
        );

        Ok(article_page)
    }

    async fn fetch_article(&self, id: &str) -> Result<ArticleDetail> {
        let url = format!("{}/articles/{}", self.base_url, urlencoding::encode(id));
        log::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to fetch article {id}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http { url, status }.into());
        }

        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| eyre!("Failed to parse article {}: {}", id, e))?;

        detail_from_value(&body).ok_or_eyre(format!("Article {id} not found"))
    }

    async fn fetch_comments(&self, id: &str) -> Result<Vec<Comment>> {
        let url = format!(
            "{}/articles/{}/comments",
            self.base_url,
            urlencoding::encode(id)
        );
        log::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to fetch comments for {id}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http { url, status }.into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read comments for {id}: {e}")))?;

        Ok(comments_from_slice(&body))
    }
}
