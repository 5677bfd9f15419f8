use std::io::Read;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use kb_client::{ArticlesApi, ClientConfig};
use kb_core::filters::build_articles_query;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod args;
mod editor;

use args::{Cli, Command, FilterArgs};
use editor::EditorSelection;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kb=info,kb_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Query(filters) => print_query(&filters),
        Command::Feed(filters) => fetch_feed(&filters).await,
        Command::Scope { input } => print_scope(&input),
    }
}

fn print_query(filters: &FilterArgs) -> anyhow::Result<()> {
    let query = build_articles_query(&filters.to_input());
    println!("{}", serde_json::to_string_pretty(&query)?);
    Ok(())
}

async fn fetch_feed(filters: &FilterArgs) -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("Invalid client configuration")?;
    tracing::info!(api_url = %config.api_url, "Loaded client configuration");

    let api = ArticlesApi::new(&config)?;
    let list = api
        .fetch_feed(&filters.to_input())
        .await
        .context("Failed to fetch article feed")?;

    for article in &list.articles {
        println!("{:>6}  {}", article.id, article.title);
    }
    let p = &list.pagination;
    println!("page {}/{} ({} total)", p.page, p.pages.max(1), p.total);
    Ok(())
}

fn print_scope(input: &Path) -> anyhow::Result<()> {
    let raw = read_input(input)?;
    let selection: EditorSelection =
        serde_json::from_str(&raw).context("Editor selection is not valid JSON")?;
    println!("{}", serde_json::to_string_pretty(&selection.to_scope())?);
    Ok(())
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))
    }
}
