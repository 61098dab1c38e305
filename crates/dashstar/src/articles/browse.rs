//! Interactive article browser
//!
//! Hosts a [`PageFetchController`] in an event loop. Page fetches run on
//! spawned tasks and report back over a channel, so the prompt stays
//! responsive while a request is in flight. Completions are handed to the
//! controller, which drops any that belong to a superseded request.

use std::io::Write;
use std::sync::Arc;

use chrono::Local;
use colored::Colorize;
use dashstar_core::article::ArticlePage;
use dashstar_core::page::{PageFetchController, PageRequest, Settlement, DEFAULT_PAGE_SIZE};
use dashstar_core::view::{render, Language, ListView, Role, Row};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::read::{format_detail_text, read_thread};
use super::{format_list_text, ArticlesContext, Hints};
use crate::auth::AuthGateway;
use crate::client::ArticleServiceClient;
use crate::navigation::{NavigationGateway, TerminalNavigator};
use crate::prelude::{eprintln, *};

#[derive(Debug, clap::Args, Serialize, Deserialize, Clone)]
pub struct BrowseOptions {
    /// Number of articles per page
    #[arg(short, long, env = "DASHSTAR_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub size: usize,
}

const HELP: &str = "Commands:
  n | next          next page
  p | prev          previous page
  <number>          jump to page
  open <row>        read the article on that row
  edit <row>        edit the article on that row (admin)
  new               write a new article (admin)
  size <number>     change the page size
  r | refresh       reload the current page
  h | help          show this help
  q | quit          leave";

/// A line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Prev,
    Page(usize),
    Size(usize),
    Open(usize),
    Edit(usize),
    New,
    Refresh,
    Help,
    Quit,
}

/// Parse a line typed at the browse prompt
pub fn parse_command(input: &str) -> Result<BrowseCommand, String> {
    let mut parts = input.split_whitespace();
    let head = parts.next().unwrap_or_default().to_ascii_lowercase();
    let arg = parts.next();

    if parts.next().is_some() {
        return Err(format!("Too many arguments: {input}"));
    }

    let number = |what: &str| -> Result<usize, String> {
        arg.ok_or_else(|| format!("{what} needs a number"))?
            .parse::<usize>()
            .map_err(|_| format!("{what} needs a number, got {:?}", arg.unwrap_or_default()))
    };

    match head.as_str() {
        "n" | "next" if arg.is_none() => Ok(BrowseCommand::Next),
        "p" | "prev" if arg.is_none() => Ok(BrowseCommand::Prev),
        "r" | "refresh" if arg.is_none() => Ok(BrowseCommand::Refresh),
        "h" | "help" | "?" if arg.is_none() => Ok(BrowseCommand::Help),
        "q" | "quit" | "exit" if arg.is_none() => Ok(BrowseCommand::Quit),
        "new" if arg.is_none() => Ok(BrowseCommand::New),
        "open" | "o" => number("open").map(BrowseCommand::Open),
        "edit" | "e" => number("edit").map(BrowseCommand::Edit),
        "size" => number("size").map(BrowseCommand::Size),
        "page" | "g" => number("page").map(BrowseCommand::Page),
        other if arg.is_none() => other
            .parse::<usize>()
            .map(BrowseCommand::Page)
            .map_err(|_| format!("Unknown command: {input}. Type 'help' for the list.")),
        _ => Err(format!("Unknown command: {input}. Type 'help' for the list.")),
    }
}

/// Result of a page fetch, posted back to the session loop
#[derive(Debug)]
pub enum Completion {
    Settled(PageRequest, ArticlePage),
    Failed(PageRequest, String),
}

/// Whether the loop should keep reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct BrowseSession<N: NavigationGateway> {
    controller: PageFetchController,
    client: Arc<dyn ArticleServiceClient>,
    navigator: N,
    role: Role,
    language: Language,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl<N: NavigationGateway> BrowseSession<N> {
    pub fn new(
        client: Arc<dyn ArticleServiceClient>,
        navigator: N,
        auth: &impl AuthGateway,
        language: Language,
        page_size: usize,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self {
            controller: PageFetchController::starting_at(1, page_size)?,
            client,
            navigator,
            role: auth.role(),
            language,
            tx,
            rx,
        })
    }

    /// Issue the initial fetch
    pub fn start(&mut self) {
        let request = self.controller.mount();
        self.dispatch(request);
    }

    pub fn controller(&self) -> &PageFetchController {
        &self.controller
    }

    /// The listing as currently displayed
    pub fn view(&self) -> ListView {
        render(self.controller().items(), &self.role, self.language, &Local)
    }

    /// Wait for the next fetch to finish
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }

    /// Hand a finished fetch to the controller and redraw if it was applied
    pub fn apply(&mut self, completion: Completion, out: &mut impl Write) -> Result<Settlement> {
        match completion {
            Completion::Settled(request, page) => {
                let settlement = self.controller.on_fetch_settled(request, page);
                match settlement {
                    Settlement::Applied => self.redraw(out)?,
                    Settlement::Stale => log::debug!(
                        "discarding stale response for page {} (generation {})",
                        request.page,
                        request.generation
                    ),
                }
                Ok(settlement)
            }
            Completion::Failed(request, message) => {
                let settlement = self.controller.on_fetch_failed(request);
                match settlement {
                    Settlement::Applied => writeln!(
                        out,
                        "{} Failed to load page {}: {}",
                        "Error:".red().bold(),
                        request.page,
                        message
                    )?,
                    Settlement::Stale => log::debug!(
                        "ignoring failure of superseded request for page {}",
                        request.page
                    ),
                }
                Ok(settlement)
            }
        }
    }

    /// Execute one user command
    pub async fn handle(&mut self, command: BrowseCommand, out: &mut impl Write) -> Result<Flow> {
        match command {
            BrowseCommand::Next => {
                let request = self.controller.next_page()?;
                self.request(request, out)?;
            }
            BrowseCommand::Prev => {
                let request = self.controller.prev_page()?;
                self.request(request, out)?;
            }
            BrowseCommand::Page(page) => {
                let request = self.controller.set_page(page)?;
                self.request(request, out)?;
            }
            BrowseCommand::Size(size) => {
                let request = self.controller.set_page_size(size)?;
                self.request(request, out)?;
            }
            BrowseCommand::Refresh => {
                let request = self.controller.refresh();
                self.request(Some(request), out)?;
            }
            BrowseCommand::Open(row) => {
                let (id, action) = {
                    let view = self.view();
                    let row = row_at(&view, row)?;
                    (row.id.clone(), row.primary.clone())
                };
                self.navigator.navigate_with_title(&action)?;
                let thread = read_thread(self.client.as_ref(), &id).await?;
                write!(out, "{}", format_detail_text(&thread, self.language, &Local))?;
            }
            BrowseCommand::Edit(row) => {
                let action = {
                    let view = self.view();
                    row_at(&view, row)?.edit.clone()
                };
                let action = action.ok_or_else(|| {
                    Error::PermissionDenied("editing articles requires the admin role".to_string())
                })?;
                self.navigator.navigate_with_title(&action)?;
            }
            BrowseCommand::New => {
                let action = self.view().create.ok_or_else(|| {
                    Error::PermissionDenied("creating articles requires the admin role".to_string())
                })?;
                self.navigator.navigate_with_title(&action)?;
            }
            BrowseCommand::Help => writeln!(out, "{HELP}")?,
            BrowseCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    /// Read commands from stdin until `quit` or end of input
    pub async fn run(mut self) -> Result<()> {
        let mut out = anstream::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        writeln!(out, "{}", HELP.bright_black())?;
        self.start();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }

                    let command = match parse_command(&line) {
                        Ok(command) => command,
                        Err(message) => {
                            eprintln!("{}", message.yellow());
                            continue;
                        }
                    };

                    match self.handle(command, &mut out).await {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(err) => eprintln!("{} {}", "Error:".red().bold(), err),
                    }
                }
                Some(completion) = self.next_completion() => {
                    self.apply(completion, &mut out)?;
                }
            }
        }

        Ok(())
    }

    fn request(&mut self, request: Option<PageRequest>, out: &mut impl Write) -> Result<()> {
        match request {
            Some(request) => {
                writeln!(
                    out,
                    "{}",
                    f!("Loading page {}...", request.page).bright_black()
                )?;
                self.dispatch(request);
            }
            None => writeln!(
                out,
                "{}",
                f!("Already on page {}", self.controller.page()).bright_black()
            )?,
        }
        Ok(())
    }

    fn dispatch(&self, request: PageRequest) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();

        log::debug!(
            "fetching page {} (size {}, generation {})",
            request.page,
            request.size,
            request.generation
        );

        tokio::spawn(async move {
            let completion = match client.fetch_page(request.page, request.size).await {
                Ok(page) => Completion::Settled(request, page),
                Err(err) => Completion::Failed(request, err.to_string()),
            };
            // The session may have ended while the request was in flight
            let _ = tx.send(completion);
        });
    }

    fn redraw(&self, out: &mut impl Write) -> Result<()> {
        let view = self.view();
        write!(
            out,
            "{}",
            format_list_text(&view, &self.controller.pagination(), self.language, Hints::Browse)
        )?;
        Ok(())
    }
}

fn row_at(view: &ListView, row: usize) -> Result<&Row> {
    row.checked_sub(1)
        .and_then(|idx| view.rows().get(idx))
        .ok_or_else(|| eyre!("No article on row {}", row))
}

pub async fn run(options: BrowseOptions, context: ArticlesContext) -> Result<()> {
    let session = BrowseSession::new(
        context.client,
        TerminalNavigator::new(),
        &context.auth,
        context.language,
        options.size,
    )?;

    session.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dashstar_core::article::{Article, ArticleDetail, Comment};
    use dashstar_core::view::{NavAction, Route};
    use std::collections::HashMap;
    use std::time::Duration;

    /// Pages keyed by page number; some pages answer late
    #[derive(Default)]
    struct FakeClient {
        pages: HashMap<usize, Vec<&'static str>>,
        total: usize,
        delays: HashMap<usize, Duration>,
        failing: Vec<usize>,
    }

    impl FakeClient {
        fn with_pages(pages: &[(usize, &[&'static str])], total: usize) -> Self {
            Self {
                pages: pages.iter().map(|(n, ids)| (*n, ids.to_vec())).collect(),
                total,
                ..Default::default()
            }
        }
    }

    fn article(id: &str) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Title {id}"),
            created_at: Some(1609459200),
        }
    }

    #[async_trait]
    impl ArticleServiceClient for FakeClient {
        async fn fetch_page(&self, page: usize, _size: usize) -> Result<ArticlePage> {
            if let Some(delay) = self.delays.get(&page) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing.contains(&page) {
                return Err(eyre!("HTTP 500"));
            }
            Ok(ArticlePage {
                data: self
                    .pages
                    .get(&page)
                    .map(|ids| ids.iter().map(|id| article(id)).collect())
                    .unwrap_or_default(),
                total_articles: self.total,
            })
        }

        async fn fetch_article(&self, id: &str) -> Result<ArticleDetail> {
            Ok(ArticleDetail {
                article: article(id),
                content: Some(format!("Body of {id}")),
            })
        }

        async fn fetch_comments(&self, id: &str) -> Result<Vec<Comment>> {
            Ok(vec![Comment {
                id: "c1".to_string(),
                content: format!("Comment on {id}"),
                created_at: None,
                author: Some("Reader".to_string()),
            }])
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        actions: Vec<NavAction>,
    }

    impl NavigationGateway for RecordingNavigator {
        fn navigate_with_title(&mut self, action: &NavAction) -> Result<()> {
            self.actions.push(action.clone());
            Ok(())
        }
    }

    fn session(
        client: FakeClient,
        auth: &crate::auth::AuthContext,
    ) -> BrowseSession<RecordingNavigator> {
        BrowseSession::new(
            Arc::new(client),
            RecordingNavigator::default(),
            auth,
            Language::En,
            5,
        )
        .unwrap()
    }

    async fn settle_next(session: &mut BrowseSession<RecordingNavigator>) -> (Settlement, String) {
        let completion = session.next_completion().await.unwrap();
        let mut out = Vec::new();
        let settlement = session.apply(completion, &mut out).unwrap();
        (settlement, String::from_utf8(out).unwrap())
    }

    fn ids(session: &BrowseSession<RecordingNavigator>) -> Vec<String> {
        session
            .controller()
            .items()
            .iter()
            .map(|a| a.id.clone())
            .collect()
    }

    fn anonymous() -> crate::auth::AuthContext {
        crate::auth::AuthContext::anonymous()
    }

    fn admin() -> crate::auth::AuthContext {
        crate::auth::AuthContext::with_role("admin")
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("n"), Ok(BrowseCommand::Next));
        assert_eq!(parse_command("Next"), Ok(BrowseCommand::Next));
        assert_eq!(parse_command("p"), Ok(BrowseCommand::Prev));
        assert_eq!(parse_command(" 3 "), Ok(BrowseCommand::Page(3)));
        assert_eq!(parse_command("page 4"), Ok(BrowseCommand::Page(4)));
        assert_eq!(parse_command("open 2"), Ok(BrowseCommand::Open(2)));
        assert_eq!(parse_command("edit 1"), Ok(BrowseCommand::Edit(1)));
        assert_eq!(parse_command("size 10"), Ok(BrowseCommand::Size(10)));
        assert_eq!(parse_command("new"), Ok(BrowseCommand::New));
        assert_eq!(parse_command("r"), Ok(BrowseCommand::Refresh));
        assert_eq!(parse_command("?"), Ok(BrowseCommand::Help));
        assert_eq!(parse_command("q"), Ok(BrowseCommand::Quit));
    }

    #[test]
    fn test_parse_command_errors() {
        assert!(parse_command("open").is_err());
        assert!(parse_command("open x").is_err());
        assert!(parse_command("next 2").is_err());
        assert!(parse_command("open 1 2").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[tokio::test]
    async fn test_start_renders_reversed_page() {
        colored::control::set_override(false);
        let client = FakeClient::with_pages(&[(1, &["A", "B", "C"])], 3);
        let mut session = session(client, &anonymous());

        session.start();
        let (settlement, output) = settle_next(&mut session).await;

        assert_eq!(settlement, Settlement::Applied);
        assert_eq!(ids(&session), vec!["C", "B", "A"]);
        assert!(output.contains("[1] Title C"));
        assert!(output.contains("[3] Title A"));
    }

    #[tokio::test]
    async fn test_empty_page_shows_empty_state() {
        colored::control::set_override(false);
        let client = FakeClient::with_pages(&[], 0);
        let mut session = session(client, &admin());

        session.start();
        let (_, output) = settle_next(&mut session).await;

        assert!(session.view().is_empty());
        assert!(output.contains("No articles yet"));
        assert!(output.contains("Create the first article"));
    }

    #[tokio::test]
    async fn test_page_change_keeps_items_until_settled() {
        let client = FakeClient::with_pages(&[(1, &["a"]), (2, &["b"])], 10);
        let mut session = session(client, &anonymous());
        session.start();
        settle_next(&mut session).await;

        let mut out = Vec::new();
        session
            .handle(BrowseCommand::Page(2), &mut out)
            .await
            .unwrap();

        assert_eq!(session.controller().page(), 2);
        assert_eq!(ids(&session), vec!["a"]);

        settle_next(&mut session).await;
        assert_eq!(ids(&session), vec!["b"]);
    }

    #[tokio::test]
    async fn test_slow_superseded_page_is_discarded() {
        let mut client =
            FakeClient::with_pages(&[(1, &["p1"]), (2, &["p2"]), (3, &["p3"])], 15);
        client.delays.insert(2, Duration::from_millis(100));
        let mut session = session(client, &anonymous());
        session.start();
        settle_next(&mut session).await;

        let mut out = Vec::new();
        session
            .handle(BrowseCommand::Page(2), &mut out)
            .await
            .unwrap();
        session
            .handle(BrowseCommand::Page(3), &mut out)
            .await
            .unwrap();

        // Page 3 answers first, then the slow page 2 response arrives
        let (first, _) = settle_next(&mut session).await;
        let (second, _) = settle_next(&mut session).await;

        assert_eq!(first, Settlement::Applied);
        assert_eq!(second, Settlement::Stale);
        assert_eq!(session.controller().page(), 3);
        assert_eq!(ids(&session), vec!["p3"]);
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_rejected() {
        let client = FakeClient::with_pages(&[(1, &["a"])], 5);
        let mut session = session(client, &anonymous());
        session.start();
        settle_next(&mut session).await;

        let mut out = Vec::new();
        let err = session
            .handle(BrowseCommand::Page(2), &mut out)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("out of range"));
        assert_eq!(session.controller().in_flight(), None);
    }

    #[tokio::test]
    async fn test_same_page_is_not_refetched() {
        let client = FakeClient::with_pages(&[(1, &["a"])], 10);
        let mut session = session(client, &anonymous());
        session.start();
        settle_next(&mut session).await;

        let mut out = Vec::new();
        session
            .handle(BrowseCommand::Page(1), &mut out)
            .await
            .unwrap();

        assert!(String::from_utf8(out).unwrap().contains("Already on page 1"));
        assert_eq!(session.controller().in_flight(), None);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_last_page() {
        colored::control::set_override(false);
        let mut client = FakeClient::with_pages(&[(1, &["a"])], 10);
        client.failing.push(2);
        let mut session = session(client, &anonymous());
        session.start();
        settle_next(&mut session).await;

        let mut out = Vec::new();
        session.handle(BrowseCommand::Next, &mut out).await.unwrap();
        let (settlement, output) = settle_next(&mut session).await;

        assert_eq!(settlement, Settlement::Applied);
        assert!(output.contains("Failed to load page 2"));
        assert_eq!(ids(&session), vec!["a"]);
    }

    #[tokio::test]
    async fn test_open_navigates_with_title_and_shows_detail() {
        colored::control::set_override(false);
        let client = FakeClient::with_pages(&[(1, &["x", "y"])], 2);
        let mut session = session(client, &anonymous());
        session.start();
        settle_next(&mut session).await;

        let mut out = Vec::new();
        session
            .handle(BrowseCommand::Open(1), &mut out)
            .await
            .unwrap();

        assert_eq!(
            session.navigator.actions,
            vec![NavAction::new(Route::Article("y".into()), "Title y")]
        );
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Body of y"));
        assert!(output.contains("Comment on y"));
    }

    #[tokio::test]
    async fn test_open_missing_row() {
        let client = FakeClient::with_pages(&[(1, &["x"])], 1);
        let mut session = session(client, &anonymous());
        session.start();
        settle_next(&mut session).await;

        let mut out = Vec::new();
        assert!(session.handle(BrowseCommand::Open(0), &mut out).await.is_err());
        assert!(session.handle(BrowseCommand::Open(2), &mut out).await.is_err());
        assert!(session.navigator.actions.is_empty());
    }

    #[tokio::test]
    async fn test_admin_actions_require_admin() {
        let client = FakeClient::with_pages(&[(1, &["x"])], 1);
        let mut session = session(client, &anonymous());
        session.start();
        settle_next(&mut session).await;

        let mut out = Vec::new();
        let err = session
            .handle(BrowseCommand::Edit(1), &mut out)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("admin"));
        assert!(session.handle(BrowseCommand::New, &mut out).await.is_err());
        assert!(session.navigator.actions.is_empty());
    }

    #[tokio::test]
    async fn test_admin_edit_and_new() {
        let client = FakeClient::with_pages(&[(1, &["x"])], 1);
        let mut session = session(client, &admin());
        session.start();
        settle_next(&mut session).await;

        let mut out = Vec::new();
        session
            .handle(BrowseCommand::Edit(1), &mut out)
            .await
            .unwrap();
        session.handle(BrowseCommand::New, &mut out).await.unwrap();

        assert_eq!(
            session.navigator.actions,
            vec![
                NavAction::new(Route::EditArticle("x".into()), "Edit"),
                NavAction::new(Route::NewArticle, "New article"),
            ]
        );
    }

    #[tokio::test]
    async fn test_quit() {
        let client = FakeClient::with_pages(&[], 0);
        let mut session = session(client, &anonymous());

        let mut out = Vec::new();
        assert_eq!(
            session.handle(BrowseCommand::Quit, &mut out).await.unwrap(),
            Flow::Quit
        );
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let result = BrowseSession::new(
            Arc::new(FakeClient::default()),
            RecordingNavigator::default(),
            &anonymous(),
            Language::En,
            0,
        );

        let err = result.err().unwrap();
        assert!(err.to_string().contains("Page size must be greater than zero"));
    }

    #[tokio::test]
    async fn test_run_rejects_zero_page_size() {
        let context = ArticlesContext {
            client: Arc::new(FakeClient::default()),
            auth: anonymous(),
            language: Language::En,
        };

        let err = run(BrowseOptions { size: 0 }, context).await.unwrap_err();

        assert!(err.to_string().contains("Page size must be greater than zero"));
    }

    #[tokio::test]
    async fn test_prev_after_shrinking_refresh() {
        colored::control::set_override(false);
        let client = FakeClient::with_pages(&[(1, &["a"]), (3, &["c"])], 15);
        let mut session = session(client, &anonymous());
        session.start();
        settle_next(&mut session).await;

        let mut out = Vec::new();
        session
            .handle(BrowseCommand::Page(3), &mut out)
            .await
            .unwrap();
        settle_next(&mut session).await;

        // The collection shrinks to a single page while page 3 is shown
        let request = session.controller.refresh();
        session.controller.on_fetch_settled(
            request,
            ArticlePage {
                data: Vec::new(),
                total_articles: 5,
            },
        );
        let mut out = Vec::new();
        session.redraw(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Previous page: p"));

        let mut out = Vec::new();
        session.handle(BrowseCommand::Prev, &mut out).await.unwrap();
        assert_eq!(session.controller().page(), 1);
        assert!(String::from_utf8(out).unwrap().contains("Loading page 1"));
    }
}
