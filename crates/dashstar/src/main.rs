use std::path::PathBuf;

use crate::prelude::*;
use clap::Parser;
use dashstar_core::view::Language;

mod articles;
mod auth;
mod client;
mod config;
mod error;
mod navigation;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Browse, page through and open articles published on a dashstar backend"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Backend API root (overrides DASHSTAR_BASE_URL)
    #[clap(long, global = true)]
    base_url: Option<String>,

    /// Bearer token (overrides DASHSTAR_TOKEN and the session token)
    #[clap(long, global = true)]
    token: Option<String>,

    /// Request timeout in seconds (overrides DASHSTAR_TIMEOUT)
    #[clap(long, global = true)]
    timeout: Option<u64>,

    /// Session file written at login (overrides DASHSTAR_SESSION)
    #[clap(long, global = true)]
    session: Option<PathBuf>,

    /// Role to act as, e.g. "admin" (overrides DASHSTAR_ROLE and the session role)
    #[clap(long, global = true)]
    role: Option<String>,

    /// Display language: zh or en
    #[clap(long, env = "DASHSTAR_LANG", global = true, default_value = "zh")]
    lang: Language,

    /// Whether to display additional information.
    #[clap(long, env = "DASHSTAR_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Article listing operations
    Articles(crate::articles::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Articles(sub_app) => crate::articles::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
