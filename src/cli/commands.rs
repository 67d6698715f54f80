//! CLI commands implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::ProgressBar;

use crate::models::ScrapedVideo;
use crate::pipeline::{
    run_analysis, run_enrichment, run_ingest, run_normalization, run_scoring, AnalyzeOptions,
    EnrichOptions,
};
use crate::repository::{migrations, AnalysisRepository, AsyncSqlitePool, ChannelRepository, VideoRepository};
use crate::services::YtDlpExtractor;

const DEFAULT_DATABASE: &str = "ytscout.db";

#[derive(Parser)]
#[command(name = "yts")]
#[command(about = "YouTube channel discovery, enrichment, and ranking pipeline")]
#[command(version)]
pub struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema
    Init,

    /// Ingest a scraper JSON batch as a new search run
    Ingest {
        /// Path to the scraper's JSON output (array of search results)
        file: PathBuf,
        /// Search query the batch was scraped for (defaults to the first
        /// record's query)
        #[arg(short, long)]
        query: Option<String>,
        /// Search run mode tag
        #[arg(long, default_value = "exploration")]
        mode: String,
    },

    /// Normalize and validate raw videos
    Normalize {
        /// Max raw rows to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<i64>,
    },

    /// Enrich candidate channels via yt-dlp
    Enrich {
        /// Number of concurrent workers
        #[arg(short, long, default_value = "6")]
        workers: usize,
        /// Channels claimed per batch
        #[arg(long, default_value = "10")]
        batch_size: usize,
        /// Recent videos to keep per channel
        #[arg(long, default_value = "25")]
        max_videos: usize,
        /// Per-channel yt-dlp timeout in seconds
        #[arg(long, default_value = "180")]
        timeout_seconds: u64,
    },

    /// Analyze enriched channels (cycle detection + qualification)
    Analyze {
        /// Number of concurrent workers
        #[arg(short, long, default_value = "4")]
        workers: usize,
        /// Channels claimed per batch
        #[arg(long, default_value = "100")]
        batch_size: usize,
    },

    /// Score analyzed channels (idempotent, re-runnable)
    Score {
        /// Max channels to score (default: all)
        #[arg(short = 'n', long)]
        limit: Option<i64>,
    },

    /// Run normalize -> enrich -> analyze -> score in sequence
    Run {
        #[arg(short, long, default_value = "6")]
        workers: usize,
        #[arg(long, default_value = "10")]
        batch_size: usize,
        #[arg(long, default_value = "25")]
        max_videos: usize,
        #[arg(long, default_value = "180")]
        timeout_seconds: u64,
    },

    /// Show pipeline table counts
    Stats,

    /// Show the top-ranked channels
    Top {
        /// How many channels to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let database_url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
    let pool = AsyncSqlitePool::new(&database_url);

    // Idempotent and safe from any worker; every command gets a usable schema.
    migrations::run(&pool)
        .await
        .with_context(|| format!("failed to initialize database at {database_url}"))?;

    match cli.command {
        Commands::Init => {
            println!(
                "{} database ready at {}",
                style("ok:").green().bold(),
                database_url
            );
        }

        Commands::Ingest { file, query, mode } => {
            let body = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let records: Vec<ScrapedVideo> =
                serde_json::from_str(&body).context("scraper batch was not a JSON array")?;

            let query = query
                .or_else(|| records.iter().find_map(|r| r.query.clone()))
                .unwrap_or_else(|| "unknown".to_string());

            let repo = VideoRepository::new(pool.clone());
            let report = run_ingest(&repo, &query, &mode, &records).await?;
            println!(
                "{} run {}: received={} inserted={} ignored={}",
                style("ingested").green().bold(),
                report.search_run_id,
                report.received,
                report.inserted,
                report.ignored
            );
        }

        Commands::Normalize { limit } => {
            let repo = VideoRepository::new(pool.clone());
            let stats = run_normalization(&repo, limit).await?;
            println!(
                "{} fetched={} inserted={} ignored={}",
                style("normalized").green().bold(),
                stats.fetched,
                stats.inserted,
                stats.ignored
            );
        }

        Commands::Enrich {
            workers,
            batch_size,
            max_videos,
            timeout_seconds,
        } => {
            let extractor = Arc::new(YtDlpExtractor::new(
                max_videos,
                Duration::from_secs(timeout_seconds),
            )?);
            enrich(&pool, extractor, workers, batch_size, max_videos).await?;
        }

        Commands::Analyze { workers, batch_size } => {
            analyze(&pool, workers, batch_size).await?;
        }

        Commands::Score { limit } => {
            let repo = AnalysisRepository::new(pool.clone());
            let stats = run_scoring(&repo, limit).await?;
            println!(
                "{} fetched={} scored={} excluded={} failed={}",
                style("scored").green().bold(),
                stats.fetched,
                stats.scored,
                stats.excluded,
                stats.failed
            );
        }

        Commands::Run {
            workers,
            batch_size,
            max_videos,
            timeout_seconds,
        } => {
            let videos = VideoRepository::new(pool.clone());
            let stats = run_normalization(&videos, None).await?;
            println!(
                "{} fetched={} inserted={} ignored={}",
                style("normalized").green().bold(),
                stats.fetched,
                stats.inserted,
                stats.ignored
            );

            let extractor = Arc::new(YtDlpExtractor::new(
                max_videos,
                Duration::from_secs(timeout_seconds),
            )?);
            enrich(&pool, extractor, workers, batch_size, max_videos).await?;
            analyze(&pool, workers, batch_size).await?;

            let analysis = AnalysisRepository::new(pool.clone());
            let stats = run_scoring(&analysis, None).await?;
            println!(
                "{} fetched={} scored={} excluded={}",
                style("scored").green().bold(),
                stats.fetched,
                stats.scored,
                stats.excluded
            );
        }

        Commands::Stats => {
            stats(&pool).await?;
        }

        Commands::Top { limit } => {
            let repo = AnalysisRepository::new(pool.clone());
            let top = repo.fetch_top_scores(limit).await?;
            if top.is_empty() {
                println!("no scored channels yet");
            } else {
                println!(
                    "{:<5} {:<8} {:<6} {:<6} {:<6} {:<6}  {}",
                    "rank", "score", "perf", "peak", "cons", "size", "channel"
                );
                for (i, row) in top.iter().enumerate() {
                    println!(
                        "{:<5} {:<8.4} {:<6.3} {:<6.3} {:<6.3} {:<6.3}  {}",
                        i + 1,
                        row.final_score,
                        row.s_perf,
                        row.s_peak,
                        row.s_consistency,
                        row.s_size,
                        row.channel_url
                    );
                }
            }
        }
    }

    Ok(())
}

async fn enrich(
    pool: &AsyncSqlitePool,
    extractor: Arc<YtDlpExtractor>,
    workers: usize,
    batch_size: usize,
    max_videos: usize,
) -> anyhow::Result<()> {
    let repo = ChannelRepository::new(pool.clone());
    let pending = repo.count_enrichment_candidates().await?;

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("enriching {pending} candidate channels..."));

    let stats = run_enrichment(
        repo,
        extractor,
        EnrichOptions {
            workers,
            batch_size,
            max_videos,
        },
    )
    .await;
    pb.finish_and_clear();
    let stats = stats?;

    println!(
        "{} claimed={} processed={} skipped={} failed={}",
        style("enriched").green().bold(),
        stats.claimed,
        stats.processed,
        stats.skipped,
        stats.failed
    );
    Ok(())
}

async fn analyze(pool: &AsyncSqlitePool, workers: usize, batch_size: usize) -> anyhow::Result<()> {
    let channels = ChannelRepository::new(pool.clone());
    let analysis = AnalysisRepository::new(pool.clone());
    let pending = analysis.count_analysis_candidates().await?;

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("analyzing {pending} channels..."));

    let stats = run_analysis(channels, analysis, AnalyzeOptions { workers, batch_size }).await;
    pb.finish_and_clear();
    let stats = stats?;

    println!(
        "{} claimed={} processed={} skipped={} failed={}",
        style("analyzed").green().bold(),
        stats.claimed,
        stats.processed,
        stats.skipped,
        stats.failed
    );
    Ok(())
}

async fn stats(pool: &AsyncSqlitePool) -> anyhow::Result<()> {
    let videos = VideoRepository::new(pool.clone());
    let channels = ChannelRepository::new(pool.clone());
    let analysis = AnalysisRepository::new(pool.clone());

    let label = |s: &str| style(format!("{s:<28}")).cyan();
    println!("{}{}", label("raw videos"), videos.count_raw().await?);
    println!(
        "{}{}",
        label("normalized videos"),
        videos.count_normalized().await?
    );
    println!(
        "{}{}",
        label("awaiting normalization"),
        videos.count_unprocessed_raw().await?
    );
    println!(
        "{}{}",
        label("enrichment candidates"),
        channels.count_enrichment_candidates().await?
    );
    println!(
        "{}{}",
        label("channels enriched"),
        channels.count_channels_raw().await?
    );
    println!(
        "{}{}",
        label("enrichment failures"),
        channels
            .count_processed(crate::models::ProcessedStatus::Failed)
            .await?
    );
    println!(
        "{}{}",
        label("stale enrichment claims"),
        channels.count_stale_claims().await?
    );
    println!(
        "{}{}",
        label("analysis candidates"),
        analysis.count_analysis_candidates().await?
    );
    println!(
        "{}{}",
        label("channels analyzed"),
        analysis.count_analyzed().await?
    );
    println!(
        "{}{}",
        label("channels qualified"),
        analysis.count_qualified().await?
    );
    println!(
        "{}{}",
        label("channels scored"),
        analysis.count_scored().await?
    );
    Ok(())
}
