use chrono::{Local, TimeZone};
use colored::Colorize;
use dashstar_core::article::{ArticleThread, Comment};
use dashstar_core::view::{format_created_at, Label, Language};
use serde::{Deserialize, Serialize};

use super::{emit, ArticlesContext};
use crate::client::ArticleServiceClient;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args, Serialize, Deserialize, Clone)]
pub struct ReadOptions {
    /// Article ID
    #[clap(env = "DASHSTAR_ARTICLE")]
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: ReadOptions, context: ArticlesContext) -> Result<()> {
    let thread = read_thread(context.client.as_ref(), &options.id).await?;

    if options.json {
        let json = serde_json::to_string_pretty(&thread)
            .map_err(|e| eyre!("JSON serialization failed: {}", e))?;
        println!("{}", json);
    } else {
        let text = format_detail_text(&thread, context.language, &Local);
        emit(&mut anstream::stdout(), &text)?;
    }

    Ok(())
}

/// Fetch an article and its comments concurrently
pub async fn read_thread(client: &dyn ArticleServiceClient, id: &str) -> Result<ArticleThread> {
    let (detail, comments) = tokio::try_join!(client.fetch_article(id), client.fetch_comments(id))?;
    Ok(ArticleThread { detail, comments })
}

/// Render an article with a metadata table, its body and the comments below
pub fn format_detail_text<Tz>(thread: &ArticleThread, language: Language, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let article = &thread.detail.article;
    let mut result = String::new();

    let title = if article.title.is_empty() {
        language.label(Label::NoTitle)
    } else {
        article.title.as_str()
    };
    result.push_str(&f!("\n{}\n\n", title.bright_white().bold()));

    let mut table = new_table();
    table.add_row(prettytable::row![language.label(Label::Id).bold().cyan(), article.id]);
    if let Some(created) = article
        .created_at
        .and_then(|ts| format_created_at(ts, tz, language))
    {
        table.add_row(prettytable::row![
            language.label(Label::Created).bold().cyan(),
            created.bright_black().to_string()
        ]);
    }
    result.push_str(&table.to_string());

    match thread.detail.content.as_deref() {
        Some(content) if !content.trim().is_empty() => {
            result.push_str(&f!("\n{}\n", content.trim_end()));
        }
        _ => result.push_str(&f!(
            "\n{}\n",
            language.label(Label::NoContent).bright_black()
        )),
    }

    result.push_str(&format_comments(&thread.comments, language, tz));
    result.push('\n');
    result
}

fn format_comments<Tz>(comments: &[Comment], language: Language, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut result = String::new();

    result.push_str(&f!("\n{}\n", "-".repeat(80).bright_black()));
    result.push_str(&f!(
        "{} ({})\n",
        language.label(Label::Comments).bright_yellow().bold(),
        comments.len()
    ));

    if comments.is_empty() {
        result.push_str(&f!("  {}\n", language.label(Label::NoComments).bright_black()));
        return result;
    }

    for comment in comments {
        let author = comment
            .author
            .as_deref()
            .unwrap_or(language.label(Label::UnknownAuthor));
        let mut header = f!("\n  {}", author.green().bold());
        if let Some(created) = comment
            .created_at
            .and_then(|ts| format_created_at(ts, tz, language))
        {
            header.push_str(&f!(" · {}", created.bright_black()));
        }
        result.push_str(&header);
        result.push('\n');

        for line in comment.content.lines() {
            result.push_str(&f!("    {}\n", line));
        }
    }

    result
}
