//! Listing presentation: routes, role gate and the rendered list view

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::article::Article;

/// Role of the current viewer as reported by the session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member(String),
    #[default]
    Anonymous,
}

impl Role {
    /// Map the session's role claim. Only the exact value `"admin"` grants
    /// admin actions.
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some("admin") => Role::Admin,
            Some(other) => Role::Member(other.to_string()),
            None => Role::Anonymous,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Navigation targets reachable from the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "id", rename_all = "snake_case")]
pub enum Route {
    NewArticle,
    Article(String),
    EditArticle(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::NewArticle => "/articles/new".to_string(),
            Route::Article(id) => format!("/articles/{id}"),
            Route::EditArticle(id) => format!("/articles/{id}/edit"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// A route transition together with the site title it sets.
///
/// Gateways apply both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavAction {
    pub route: Route,
    pub title: String,
}

impl NavAction {
    pub fn new(route: Route, title: impl Into<String>) -> Self {
        Self {
            route,
            title: title.into(),
        }
    }
}

/// Display language for labels and timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" | "cn" => Ok(Language::Zh),
            "en" | "en-us" => Ok(Language::En),
            other => Err(format!("Unsupported language: {other}. Valid values: zh, en")),
        }
    }
}

impl Language {
    pub fn heading(self) -> &'static str {
        match self {
            Language::Zh => "所有文章",
            Language::En => "All articles",
        }
    }

    pub fn new_article(self) -> &'static str {
        match self {
            Language::Zh => "新建文章",
            Language::En => "New article",
        }
    }

    pub fn edit(self) -> &'static str {
        match self {
            Language::Zh => "编辑",
            Language::En => "Edit",
        }
    }

    pub fn empty(self) -> &'static str {
        match self {
            Language::Zh => "还没有写过文章",
            Language::En => "No articles yet",
        }
    }

    pub fn create_first(self) -> &'static str {
        match self {
            Language::Zh => "创建第一篇文章",
            Language::En => "Create the first article",
        }
    }

    /// Fixed interface text
    pub fn label(self, label: Label) -> &'static str {
        use Label::*;

        match (self, label) {
            (Language::Zh, Created) => "创建于",
            (Language::En, Created) => "Created",
            (_, Id) => "ID",
            (Language::Zh, Read) => "阅读",
            (Language::En, Read) => "Read",
            (Language::Zh, Navigation) => "导航",
            (Language::En, Navigation) => "NAVIGATION",
            (Language::Zh, NextPage) => "下一页",
            (Language::En, NextPage) => "Next page",
            (Language::Zh, PreviousPage) => "上一页",
            (Language::En, PreviousPage) => "Previous page",
            (Language::Zh, JumpToPage) => "跳转到页",
            (Language::En, JumpToPage) => "Jump to page",
            (Language::Zh, NoTitle) => "（无标题）",
            (Language::En, NoTitle) => "(No title)",
            (Language::Zh, NoContent) => "（无内容）",
            (Language::En, NoContent) => "(No content)",
            (Language::Zh, Comments) => "评论",
            (Language::En, Comments) => "Comments",
            (Language::Zh, NoComments) => "暂无评论",
            (Language::En, NoComments) => "No comments yet",
            (Language::Zh, UnknownAuthor) => "匿名用户",
            (Language::En, UnknownAuthor) => "Anonymous",
        }
    }

    /// Suffix for the heading, e.g. "(Page 2 of 3)"
    pub fn page_position(self, page: usize, page_count: usize) -> String {
        match self {
            Language::Zh => format!("（第 {page} 页，共 {page_count} 页）"),
            Language::En => format!("(Page {page} of {page_count})"),
        }
    }

    /// One-line summary under the navigation header
    pub fn page_summary(self, page: usize, page_count: usize, total: usize) -> String {
        match self {
            Language::Zh => format!("第 {page} 页，共 {page_count} 页（共 {total} 篇文章）"),
            Language::En => {
                format!("Showing page {page} of {page_count} ({total} total articles)")
            }
        }
    }

    fn timestamp_format(self) -> &'static str {
        match self {
            Language::Zh => "%Y/%-m/%-d %H:%M:%S",
            Language::En => "%-m/%-d/%Y, %-I:%M:%S %p",
        }
    }
}

/// Labels of the terminal chrome around the listing and detail views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Created,
    Id,
    Read,
    Navigation,
    NextPage,
    PreviousPage,
    JumpToPage,
    NoTitle,
    NoContent,
    Comments,
    NoComments,
    UnknownAuthor,
}

/// One rendered article row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub id: String,
    pub title: String,
    pub timestamp: Option<String>,
    pub primary: NavAction,
    /// Present for admins only
    pub edit: Option<NavAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListBody {
    Empty {
        message: String,
        /// Present for admins only
        create: Option<NavAction>,
    },
    Rows {
        rows: Vec<Row>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListView {
    pub heading: String,
    /// Top-level create action, present for admins only
    pub create: Option<NavAction>,
    pub body: ListBody,
}

impl ListView {
    pub fn rows(&self) -> &[Row] {
        match &self.body {
            ListBody::Rows { rows } => rows,
            ListBody::Empty { .. } => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.body, ListBody::Empty { .. })
    }
}

/// Format a creation time (unix seconds) as a local timestamp in `tz`.
///
/// The instant is taken as `created_at * 1000` milliseconds since the epoch.
pub fn format_created_at<Tz>(created_at: i64, tz: &Tz, language: Language) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let millis = created_at.checked_mul(1000)?;
    let instant = DateTime::<Utc>::from_timestamp_millis(millis)?;
    Some(
        instant
            .with_timezone(tz)
            .format(language.timestamp_format())
            .to_string(),
    )
}

/// Render the listing for `items` as seen by `role`.
///
/// Items are displayed in the order given.
pub fn render<Tz>(items: &[Article], role: &Role, language: Language, tz: &Tz) -> ListView
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let admin = role.is_admin();
    let create = || NavAction::new(Route::NewArticle, language.new_article());

    let body = if items.is_empty() {
        ListBody::Empty {
            message: language.empty().to_string(),
            create: admin.then(create),
        }
    } else {
        let rows = items
            .iter()
            .map(|article| Row {
                id: article.id.clone(),
                title: article.title.clone(),
                timestamp: article
                    .created_at
                    .and_then(|ts| format_created_at(ts, tz, language)),
                primary: NavAction::new(Route::Article(article.id.clone()), article.title.clone()),
                edit: admin.then(|| {
                    NavAction::new(Route::EditArticle(article.id.clone()), language.edit())
                }),
            })
            .collect();
        ListBody::Rows { rows }
    };

    ListView {
        heading: language.heading().to_string(),
        create: admin.then(create),
        body,
    }
}
