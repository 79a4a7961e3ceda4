//! # Genba Press
//!
//! A personal content pipeline that turns news aggregator output and queued
//! article themes into a static Japanese-language site, plus a small JSON API
//! that fronts the generated data.
//!
//! ## Features
//!
//! - Pulls security/infrastructure news through a NewsAPI-compatible
//!   aggregator with a two-pass bucket strategy and recency filtering
//! - Summarizes picked articles into a daily Japanese digest via an
//!   OpenAI-compatible LLM (structured outputs, local tag classifier)
//! - Generates weekly how-to articles from a theme queue in two LLM stages
//!   (structured draft, then polished HTML) and publishes them as static pages
//! - Maintains the posts index page and the marker-delimited article list on
//!   the home page
//! - Serves digest, live news, theme queue CRUD, and a ja/en translation
//!   proxy over HTTP
//!
//! ## Usage
//!
//! ```sh
//! genba_press digest          # daily, around 07:00 JST
//! genba_press weekly          # saturdays
//! genba_press build-index     # after adding pages by hand
//! genba_press serve           # long-running API
//! ```
//!
//! ## Architecture
//!
//! Each subcommand is an independent pipeline stage sharing one config and
//! one data directory:
//! 1. **Digest**: fetch news buckets, extract article bodies, summarize, persist
//! 2. **Weekly**: pop a theme, draft + finalize via LLM, write the page, update indexes
//! 3. **Build-index**: rescan the posts directory and rewrite the index page
//! 4. **Serve**: axum API over the persisted files

use clap::Parser;
use tracing::{debug, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod config;
mod digest;
mod extract;
mod models;
mod news;
mod outputs;
mod prompts;
mod schema;
mod server;
mod store;
mod tags;
mod translate;
mod utils;
mod weekly;

use cli::{Cli, Command};
use config::Config;

#[tokio::main]
#[instrument]
async fn main() -> anyhow::Result<()> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("genba_press starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.command, ?args.config, "Parsed CLI arguments");

    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Digest { force } => digest::run(&config, force).await?,
        Command::Weekly => weekly::run(&config).await?,
        Command::BuildIndex => outputs::indexes::build_posts_index(&config).await?,
        Command::Serve => server::serve(config).await?,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
