use chrono::Local;
use dashstar_core::page::{ListOutput, PageFetchController, DEFAULT_PAGE_SIZE};
use dashstar_core::view::render;
use serde::{Deserialize, Serialize};

use super::{emit, format_list_text, ArticlesContext, Hints};
use crate::auth::AuthGateway;
use crate::client::ArticleServiceClient;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args, Serialize, Deserialize, Clone)]
pub struct ListOptions {
    /// Page number (1-indexed)
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Number of articles per page
    #[arg(short, long, env = "DASHSTAR_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub size: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: ListOptions, context: ArticlesContext) -> Result<()> {
    let controller = list_articles_data(context.client.as_ref(), options.page, options.size).await?;

    if options.json {
        output_json(&controller.output())?;
    } else {
        let view = render(
            controller.items(),
            &context.auth.role(),
            context.language,
            &Local,
        );
        let text = format_list_text(&view, &controller.pagination(), context.language, Hints::Cli);
        emit(&mut anstream::stdout(), &text)?;
    }

    Ok(())
}

/// Fetch one page of articles and return the settled controller
pub async fn list_articles_data(
    client: &dyn ArticleServiceClient,
    page: usize,
    size: usize,
) -> Result<PageFetchController> {
    let mut controller = PageFetchController::starting_at(page, size)?;
    let request = controller.mount();

    let response = client.fetch_page(request.page, request.size).await?;
    controller.on_fetch_settled(request, response);
    controller.ensure_in_range()?;

    Ok(controller)
}

/// Convert list output to JSON string
fn format_list_json(output: &ListOutput) -> Result<String> {
    serde_json::to_string_pretty(output).map_err(|e| eyre!("JSON serialization failed: {}", e))
}

fn output_json(output: &ListOutput) -> Result<()> {
    let json = format_list_json(output)?;
    println!("{}", json);
    Ok(())
}
