//! Article and comment models, with lenient decoding of the `/articles`
//! endpoints.
//!
//! The backend wraps every payload in a `{ code, data, ... }` envelope and
//! serialises ids as numbers. Decoding here never fails on a malformed
//! body: missing or mistyped fields degrade to an empty list and a zero
//! count, and individual entries that cannot be read are skipped.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A content record as listed by the backend
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Article {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_text")]
    pub title: String,
    /// Creation time in unix seconds
    #[serde(default, deserialize_with = "de_timestamp")]
    pub created_at: Option<i64>,
}

/// Article as returned by `GET /articles/{id}`, including the body
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    #[serde(default)]
    pub content: Option<String>,
}

/// One page of articles in arrival order, with the collection total
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ArticlePage {
    pub data: Vec<Article>,
    pub total_articles: usize,
}

impl ArticlePage {
    /// Decode a `GET /articles?page&size` response body.
    ///
    /// `data` that is absent or not an array yields an empty list;
    /// `totalArticles` that is absent, negative or non-numeric yields zero.
    pub fn from_value(body: &Value) -> Self {
        let data = body
            .get("data")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value::<Article>(entry.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        let total_articles = body
            .get("totalArticles")
            .and_then(count_from_value)
            .unwrap_or(0);

        Self {
            data,
            total_articles,
        }
    }

    /// Decode from raw response bytes. Bodies that are not JSON decode as an
    /// empty page.
    pub fn from_slice(bytes: &[u8]) -> Self {
        serde_json::from_slice::<Value>(bytes)
            .map(|body| Self::from_value(&body))
            .unwrap_or_default()
    }
}

/// Decode a `GET /articles/{id}` response body. Returns `None` when the
/// envelope has no readable article.
pub fn detail_from_value(body: &Value) -> Option<ArticleDetail> {
    let data = body.get("data")?;
    serde_json::from_value(data.clone()).ok()
}

/// A reader comment on an article, as returned by `GET /articles/{id}/comments`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Comment {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_text")]
    pub content: String,
    /// Creation time in unix seconds
    #[serde(default, deserialize_with = "de_timestamp")]
    pub created_at: Option<i64>,
    /// Nickname of the commenter, falling back to the username
    #[serde(default, rename(deserialize = "user"), deserialize_with = "de_author")]
    pub author: Option<String>,
}

/// Decode a comments response body, keeping arrival order.
///
/// Same rules as [`ArticlePage::from_value`]: `data` that is absent or not
/// an array yields an empty list and unreadable entries are skipped.
pub fn comments_from_value(body: &Value) -> Vec<Comment> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value::<Comment>(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Decode comments from raw response bytes. Bodies that are not JSON decode
/// as no comments.
pub fn comments_from_slice(bytes: &[u8]) -> Vec<Comment> {
    serde_json::from_slice::<Value>(bytes)
        .map(|body| comments_from_value(&body))
        .unwrap_or_default()
}

/// An article together with its comments
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ArticleThread {
    #[serde(flatten)]
    pub detail: ArticleDetail,
    pub comments: Vec<Comment>,
}

fn count_from_value(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .map(|n| n as usize),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invalid article id: {other}"
        ))),
    }
}

fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn de_author<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let user = Value::deserialize(deserializer)?;
    let name = |key: &str| {
        user.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Ok(name("nickname").or_else(|| name("username")))
}
