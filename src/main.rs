//! ReviewLens - video game review analytics
//!
//! A CLI tool that counts verified reviews per month, sentiment, rating
//! and product, renders a static chart report from the counts and serves
//! an interactive dashboard over the same data.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (invalid arguments, unreadable input, bind failure, etc.)

mod analysis;
mod cli;
mod config;
mod counter;
mod dashboard;
mod dataset;
mod models;
mod report;

use anyhow::{bail, Context, Result};
use cli::{Args, Command, ReportArgs};
use config::{Config, CONFIG_FILE};
use dataset::Snapshot;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("ReviewLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Handle --init-config: generate a default .reviewlens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize input paths, report limits and the dashboard address.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Resolve configuration and dispatch the subcommand.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    match &args.command {
        Some(Command::Count(_)) => run_count(&config, &args),
        Some(Command::Report(cmd)) => run_report(&config, cmd, &args),
        Some(Command::Dashboard(_)) => run_dashboard(&config, &args).await,
        None => bail!("A subcommand is required (count, report or dashboard)"),
    }
}

/// Count raw reviews into the aggregated counts file.
fn run_count(config: &Config, args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let options = counter::CountOptions {
        min_text_len: config.count.min_text_len,
        verified_only: config.count.verified_only,
        timezone: config.input.timezone,
    };

    println!("🔢 Counting reviews in {}", config.count.input.display());
    println!(
        "   Minimum text length: {} | Verified only: {}",
        options.min_text_len, options.verified_only
    );

    let summary = counter::run_count(
        &config.count.input,
        &config.count.output,
        &options,
        !args.quiet,
    )?;

    if summary.malformed > 0 {
        warn!("{} malformed lines were skipped", summary.malformed);
    }

    println!("\n📊 Count Summary:");
    println!("   Files: {} | Lines: {}", summary.files, summary.lines);
    println!(
        "   Counted: {} | Too short: {} | Unverified: {} | Malformed: {}",
        summary.counted, summary.too_short, summary.unverified, summary.malformed
    );
    println!("   Distinct keys: {}", summary.keys);
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Counts saved to: {}",
        config.count.output.display()
    );
    Ok(())
}

/// Build the static report.
fn run_report(config: &Config, cmd: &ReportArgs, args: &Args) -> Result<()> {
    let start_time = Instant::now();

    println!("📥 Loading dataset...");
    let snapshot = load_snapshot(config, !args.quiet)?;
    println!(
        "   Count records: {} | Detailed reviews: {}",
        snapshot.counts.len(),
        snapshot.reviews.len()
    );

    let span = snapshot.year_span();
    let first = cmd
        .from_year
        .or_else(|| span.as_ref().map(|s| *s.start()))
        .unwrap_or(i32::MIN);
    let last = cmd
        .to_year
        .or_else(|| span.as_ref().map(|s| *s.end()))
        .unwrap_or(i32::MAX);
    if first > last {
        bail!("Year range {}..={} is empty", first, last);
    }

    println!("\n📊 Aggregating...");
    let report = report::build_report(&snapshot, &config.report, first..=last);

    println!("\n📝 Rendering charts and report...");
    let path = report::write_report(&report, &config.report.output_dir, cmd.format)?;

    println!("\n📊 Report Summary:");
    println!("   Total reviews counted: {}", report.metadata.total_reviews);
    if let Some(top) = report.top_products.first() {
        println!("   Most reviewed: {} ({})", top.display_title(), top.total);
    }
    println!(
        "   Word cloud sample: {} reviews",
        report.metadata.sampled_reviews
    );
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!("\n✅ Report complete! Saved to: {}", path.display());
    Ok(())
}

/// Serve the dashboard until interrupted.
async fn run_dashboard(config: &Config, args: &Args) -> Result<()> {
    let addr: SocketAddr = config
        .dashboard
        .bind
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.dashboard.bind))?;

    println!("📥 Loading dataset...");
    let snapshot = Arc::new(load_snapshot(config, !args.quiet)?);
    println!(
        "   Count records: {} | Detailed reviews: {}",
        snapshot.counts.len(),
        snapshot.reviews.len()
    );

    let limits = dashboard::PanelLimits {
        top_products: config.dashboard.top_products,
        max_words: config.dashboard.max_words,
    };
    let state = Arc::new(dashboard::AppState::new(snapshot, limits));

    println!("\n🌐 Dashboard running at http://{}", addr);
    println!("   Press Ctrl-C to stop.");
    dashboard::run(addr, state).await
}

fn load_snapshot(config: &Config, show_progress: bool) -> Result<Snapshot> {
    Snapshot::load(&config.input.paths(), config.input.timezone, show_progress)
        .context("Failed to load dataset")
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
