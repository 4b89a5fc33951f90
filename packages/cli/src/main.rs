use std::sync::Arc;
use std::time::Duration;

use actors::{PoolConfig, start_processing};
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use db::repositories::{ArticleFilter, ArticleRepository};
use scribe_core::{Article, ArticleId, ArticleStatus, Format, Length, ProcessingEvent, artifact};
use tokio::sync::broadcast;
use tracing::{info, warn};

mod app;
mod logging;

#[derive(Parser)]
#[command(name = "pocketscribe")]
#[command(version)]
#[command(about = "Turn web articles into summaries, narrated audio or short videos", long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an article and process it to completion
    Submit(SubmitArgs),

    /// Print one article as JSON
    Get { id: String },

    /// List articles, newest first
    List {
        #[arg(long)]
        owner: Option<String>,

        #[arg(long)]
        status: Option<ArticleStatus>,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Delete an article and its stored artifacts
    Delete { id: String },
}

#[derive(Args)]
struct SubmitArgs {
    /// Source article URL
    url: String,

    #[arg(long, default_value = "cli")]
    owner: String,

    /// text, audio or video
    #[arg(short, long, default_value = "text")]
    format: Format,

    /// s, m or l
    #[arg(short, long, default_value = "m")]
    length: Length,

    #[arg(long)]
    language: Option<String>,

    /// summarize, explain, simplify, detailed, bullet or story
    #[arg(long)]
    style: Option<String>,

    /// Give up waiting after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    logging::init_logger(cli.verbose);

    match cli.command {
        Commands::Submit(args) => cmd_submit(args).await,
        Commands::Get { id } => cmd_get(&id).await,
        Commands::List {
            owner,
            status,
            limit,
        } => cmd_list(owner, status, limit).await,
        Commands::Delete { id } => cmd_delete(&id).await,
    }
}

async fn cmd_submit(args: SubmitArgs) -> Result<()> {
    let storage = app::connect().await?;
    let pipeline = app::build_pipeline(storage)?;
    let pool_config = PoolConfig::from_env()?;

    let (pool, join) = start_processing(Arc::new(pipeline), pool_config)
        .await
        .context("Failed to start processing pool")?;
    let mut events = pool.subscribe();

    let mut draft = Article::new(args.owner, args.url, args.format, args.length);
    if let Some(language) = args.language {
        draft = draft.with_language(language);
    }
    if let Some(style) = args.style {
        draft = draft.with_style(style);
    }

    let article = ArticleRepository::create(&draft)
        .await
        .context("Failed to create article")?;
    info!(article_id = %article.id, format = %article.format, length = %article.length, "Created article");

    pool.submit(article.id).await?;

    let waited = match args.timeout {
        Some(secs) => {
            tokio::time::timeout(Duration::from_secs(secs), wait_finished(&mut events, article.id))
                .await
                .with_context(|| format!("Article {} still processing after {secs}s", article.id))?
        }
        None => wait_finished(&mut events, article.id).await,
    };
    waited?;

    pool.shutdown()?;
    join.await.context("Processing pool did not shut down cleanly")?;

    let article = ArticleRepository::get(article.id).await?;
    println!("{}", serde_json::to_string_pretty(&article)?);

    if article.status == ArticleStatus::Failed {
        bail!(
            "Article {} failed: {}",
            article.id,
            article.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn wait_finished(
    events: &mut broadcast::Receiver<ProcessingEvent>,
    id: ArticleId,
) -> Result<()> {
    loop {
        match events.recv().await {
            Ok(ProcessingEvent::Finished {
                article_id,
                duration_ms,
                ..
            }) if article_id == id => {
                info!(article_id = %id, duration_ms, "Processing finished");
                return Ok(());
            }
            Ok(event) => tracing::debug!(at = %event.timestamp(), "{}", event.description()),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Missed processing events");
            }
            Err(broadcast::error::RecvError::Closed) => {
                bail!("Processing pool stopped before article {id} finished")
            }
        }
    }
}

fn parse_id(id: &str) -> Result<ArticleId> {
    ArticleId::parse(id).with_context(|| format!("Invalid article id: {id}"))
}

async fn cmd_get(id: &str) -> Result<()> {
    let id = parse_id(id)?;
    app::connect().await?;

    let article = ArticleRepository::get(id).await?;
    println!("{}", serde_json::to_string_pretty(&article)?);
    Ok(())
}

async fn cmd_list(owner: Option<String>, status: Option<ArticleStatus>, limit: usize) -> Result<()> {
    app::connect().await?;

    let articles = ArticleRepository::list(ArticleFilter {
        owner_id: owner,
        status,
        limit: Some(limit),
    })
    .await?;

    for article in &articles {
        println!(
            "{}  {:<10}  {:<5}  {}  {}",
            article.id,
            article.status.as_str(),
            article.format.as_str(),
            article.created_at.format("%Y-%m-%d %H:%M"),
            article.title.as_deref().unwrap_or(article.url.as_str())
        );
    }
    info!(count = articles.len(), "Listed articles");
    Ok(())
}

async fn cmd_delete(id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let storage = app::connect().await?;

    let article = ArticleRepository::get(id).await?;
    if article.status == ArticleStatus::Processing {
        warn!(article_id = %id, "Deleting an article that is still processing");
    }

    let stored = [
        (article.thumbnail_path.is_some(), artifact::thumbnail_key(id)),
        (article.audio_file_path.is_some(), artifact::audio_key(id)),
        (article.video_file_path.is_some(), artifact::video_key(id)),
    ];
    for (_, key) in stored.iter().filter(|(present, _)| *present) {
        if let Err(e) = storage.delete(key).await {
            warn!(article_id = %id, key = %key, error = %e, "Failed to delete artifact");
        }
    }

    ArticleRepository::delete(id).await?;
    info!(article_id = %id, "Deleted article");
    Ok(())
}
