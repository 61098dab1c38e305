use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use dashstar_core::page::PaginationView;
use dashstar_core::view::{Label, Language, ListBody, ListView};

use crate::auth::AuthContext;
use crate::client::{ArticleServiceClient, HttpArticleClient};
use crate::config::ClientConfig;
use crate::prelude::{println, *};

pub mod browse;
pub mod list;
pub mod read;

#[derive(Debug, clap::Parser)]
#[command(name = "articles")]
#[command(about = "Browse articles published on a dashstar backend")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Print one page of articles, most recent first
    #[clap(name = "list")]
    List(list::ListOptions),

    /// Page through articles interactively
    #[clap(name = "browse")]
    Browse(browse::BrowseOptions),

    /// Show a single article
    #[clap(name = "read")]
    Read(read::ReadOptions),
}

/// Collaborators shared by the article commands
#[derive(Clone)]
pub struct ArticlesContext {
    pub client: Arc<dyn ArticleServiceClient>,
    pub auth: AuthContext,
    pub language: Language,
}

impl ArticlesContext {
    pub fn from_global(global: &crate::Global) -> Result<Self> {
        let auth = AuthContext::resolve(global.session.clone(), global.role.clone())?;

        let config = ClientConfig::from_env()?
            .with_overrides(global.base_url.clone(), global.token.clone(), global.timeout)
            .with_fallback_token(auth.token());

        if global.verbose {
            println!("Backend: {}", config.api_base());
            if let Some(name) = auth.display_name() {
                println!("Signed in as {name}");
            }
            println!();
        }

        Ok(Self {
            client: Arc::new(HttpArticleClient::new(&config)?),
            auth,
            language: global.lang,
        })
    }
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let context = ArticlesContext::from_global(&global)?;

    match app.command {
        Commands::List(options) => list::run(options, context).await,
        Commands::Browse(options) => browse::run(options, context).await,
        Commands::Read(options) => read::run(options, context).await,
    }
}

/// Write rendered text to a terminal stream.
///
/// Pass an [`anstream`] stream so styling is stripped when the output is
/// not a terminal.
pub fn emit(out: &mut impl Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Which navigation hints to print under a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hints {
    /// Shell commands for one-shot use
    Cli,
    /// Keys understood by the interactive browser
    Browse,
}

/// Render a listing view and its pagination as colored text
pub fn format_list_text(
    view: &ListView,
    pagination: &PaginationView,
    language: Language,
    hints: Hints,
) -> String {
    let mut result = String::new();

    // Header
    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_cyan()));
    let heading = if pagination.total_pages > 0 {
        f!(
            "{} {}",
            view.heading,
            language.page_position(pagination.current_page, pagination.total_pages)
        )
    } else {
        view.heading.clone()
    };
    result.push_str(&f!("{}\n", heading.bright_cyan().bold()));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_cyan()));

    if let Some(create) = &view.create {
        result.push_str(&f!(
            "\n{} {}: {}\n",
            "[+]".green().bold(),
            create.title.green(),
            create.route.path().cyan()
        ));
    }

    match &view.body {
        ListBody::Empty { message, create } => {
            result.push_str(&f!("\n{}\n", message.yellow()));
            if let Some(create) = create {
                result.push_str(&f!(
                    "  {}: {}\n",
                    language.create_first().green(),
                    create.route.path().cyan()
                ));
            }
        }
        ListBody::Rows { rows } => {
            for (idx, row) in rows.iter().enumerate() {
                let title = if row.title.is_empty() {
                    language.label(Label::NoTitle).to_string()
                } else {
                    row.title.clone()
                };
                result.push_str(&f!(
                    "\n{} {}\n",
                    f!("[{}]", idx + 1).yellow().bold(),
                    title.white().bold()
                ));

                if let Some(timestamp) = &row.timestamp {
                    result.push_str(&f!(
                        "    {}: {}\n",
                        language.label(Label::Created).green(),
                        timestamp.bright_black()
                    ));
                }

                let read = match hints {
                    Hints::Cli => f!("dashstar articles read {}", row.id),
                    Hints::Browse => f!("open {}", idx + 1),
                };
                result.push_str(&f!(
                    "    {}: {} | {}: {}\n",
                    language.label(Label::Id).green(),
                    row.id.bright_white(),
                    language.label(Label::Read).green(),
                    read.cyan()
                ));

                if let Some(edit) = &row.edit {
                    let target = match hints {
                        Hints::Cli => edit.route.path(),
                        Hints::Browse => f!("edit {}", idx + 1),
                    };
                    result.push_str(&f!("    {}: {}\n", edit.title.green(), target.cyan()));
                }
            }
        }
    }

    // Navigation section
    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_yellow()));
    result.push_str(&f!("{}\n", language.label(Label::Navigation).bright_yellow().bold()));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_yellow()));

    let summary = language.page_summary(
        pagination.current_page,
        pagination.total_pages,
        pagination.total_items,
    );
    result.push_str(&f!("\n{}\n", summary.bright_white()));

    match hints {
        Hints::Cli => {
            if let Some(next) = &pagination.next_page_command {
                result.push_str(&f!("  {}: {}\n", language.label(Label::NextPage).green(), next.cyan()));
            }
            if let Some(prev) = &pagination.prev_page_command {
                result.push_str(&f!("  {}: {}\n", language.label(Label::PreviousPage).green(), prev.cyan()));
            }
        }
        Hints::Browse => {
            if pagination.has_next {
                result.push_str(&f!("  {}: {}\n", language.label(Label::NextPage).green(), "n".cyan()));
            }
            if pagination.has_prev {
                result.push_str(&f!("  {}: {}\n", language.label(Label::PreviousPage).green(), "p".cyan()));
            }
            if pagination.total_pages > 1 {
                result.push_str(&f!(
                    "  {}: {}\n",
                    language.label(Label::JumpToPage).green(),
                    f!("1..{}", pagination.total_pages).cyan()
                ));
            }
        }
    }

    result.push('\n');
    result
}
