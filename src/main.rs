mod analysis;
mod config;
mod markdown;
mod pr;
mod publish;
mod report;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

use config::{Config, ConfigError};
use pr::{DateWindow, PrError, RepoCoords};
use publish::{ChannelResult, Publisher};
use report::ReportError;

/// PR Digest: turn the pull requests merged in a date window into
/// categorized release notes, and optionally publish them.
#[derive(Parser, Debug)]
#[command(name = "pr-digest", version, about)]
struct Cli {
    /// Repository owner (user or organization)
    #[arg(long)]
    owner: String,

    /// Repository name
    #[arg(long)]
    repo: String,

    /// First merge day to include (YYYY-MM-DD)
    #[arg(long)]
    from: String,

    /// Last merge day to include (YYYY-MM-DD)
    #[arg(long)]
    to: String,

    /// Write the markdown to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only keep PRs carrying this label (repeatable)
    #[arg(long = "include-label", value_name = "LABEL")]
    include_labels: Vec<String>,

    /// Drop PRs carrying this label (repeatable)
    #[arg(long = "exclude-label", value_name = "LABEL")]
    exclude_labels: Vec<String>,

    /// Create a page in the configured Notion database
    #[arg(long)]
    notion: bool,

    /// Post to the configured Slack webhook
    #[arg(long)]
    slack: bool,

    /// Post to the configured Discord webhook
    #[arg(long)]
    discord: bool,

    /// Config file (defaults to .pr-digest.toml in the current directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the bundled sample PRs (merged 2024-01-02..05) instead of GitHub
    #[arg(long)]
    mock: bool,
}

#[derive(Debug, Error)]
enum ValidationError {
    #[error("--{flag} must be a date in YYYY-MM-DD form, got {value:?}")]
    InvalidDate { flag: &'static str, value: String },

    #[error("--from {from} is after --to {to}")]
    ReversedRange { from: NaiveDate, to: NaiveDate },

    #[error("--{0} must not be empty")]
    EmptyCoordinate(&'static str),
}

/// Everything that can end a run, grouped by exit code.
#[derive(Debug, Error)]
enum Failure {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] PrError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl Failure {
    fn exit_code(&self) -> u8 {
        match self {
            Failure::Validation(_) | Failure::Config(_) => 1,
            Failure::Fetch(PrError::MissingToken) => 1,
            Failure::Fetch(_) => 2,
            Failure::Report(_) => 3,
        }
    }
}

fn parse_date(flag: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        flag,
        value: value.to_string(),
    })
}

fn parse_window(from: &str, to: &str) -> Result<DateWindow, ValidationError> {
    let from = parse_date("from", from)?;
    let to = parse_date("to", to)?;
    if from > to {
        return Err(ValidationError::ReversedRange { from, to });
    }
    Ok(DateWindow { from, to })
}

fn parse_coords(owner: &str, repo: &str) -> Result<RepoCoords, ValidationError> {
    let owner = owner.trim();
    let repo = repo.trim();
    if owner.is_empty() {
        return Err(ValidationError::EmptyCoordinate("owner"));
    }
    if repo.is_empty() {
        return Err(ValidationError::EmptyCoordinate("repo"));
    }
    Ok(RepoCoords {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

/// Build the publishers the flags ask for. A channel that is requested but
/// not configured becomes a failed result instead of a publisher.
fn select_publishers(cli: &Cli, config: &Config) -> (Vec<Arc<dyn Publisher>>, Vec<ChannelResult>) {
    let mut publishers: Vec<Arc<dyn Publisher>> = Vec::new();
    let mut unconfigured: Vec<ChannelResult> = Vec::new();

    if cli.notion {
        match publish::notion::NotionPublisher::from_config(&config.notion) {
            Ok(p) => publishers.push(Arc::new(p)),
            Err(e) => unconfigured.push(("notion".to_string(), Err(e))),
        }
    }
    if cli.slack {
        match publish::slack::SlackPublisher::from_config(&config.slack) {
            Ok(p) => publishers.push(Arc::new(p)),
            Err(e) => unconfigured.push(("slack".to_string(), Err(e))),
        }
    }
    if cli.discord {
        match publish::discord::DiscordPublisher::from_config(&config.discord) {
            Ok(p) => publishers.push(Arc::new(p)),
            Err(e) => unconfigured.push(("discord".to_string(), Err(e))),
        }
    }

    (publishers, unconfigured)
}

fn print_channel_results(results: &[ChannelResult]) {
    for (channel, result) in results {
        match result {
            Ok(delivery) => eprintln!("{} {}: {}", "✓".green().bold(), delivery.channel, delivery.detail),
            Err(e) => {
                error!(channel = %channel, error = %e, "publish failed");
                eprintln!("{} {}: {}", "✗".red().bold(), channel, e);
            }
        }
    }
}

async fn run(cli: Cli) -> Result<(), Failure> {
    let window = parse_window(&cli.from, &cli.to)?;
    let coords = parse_coords(&cli.owner, &cli.repo)?;
    debug!(repo = %coords, from = %window.from, to = %window.to, "validated arguments");

    info!("loading configuration");
    let config = Config::load(cli.config.as_deref())?;

    let pull_requests = if cli.mock {
        info!("using bundled sample PRs");
        pr::load_fixture(include_str!("../tests/fixtures/merged_prs.json"), &window)?
    } else {
        info!("fetching merged pull requests from GitHub");
        let client = pr::GitHubClient::new(&config.github)?;
        client.fetch_merged_pull_requests(&coords, &window).await?
    };

    let include: Vec<String> = config
        .filters
        .include_labels
        .iter()
        .chain(&cli.include_labels)
        .cloned()
        .collect();
    let exclude: Vec<String> = config
        .filters
        .exclude_labels
        .iter()
        .chain(&cli.exclude_labels)
        .cloned()
        .collect();
    let fetched = pull_requests.len();
    let pull_requests = pr::filter_by_labels(pull_requests, &include, &exclude);
    info!(fetched, kept = pull_requests.len(), "applied label filters");

    info!("generating release notes");
    let notes = report::build(&coords, &window, &pull_requests, Utc::now());
    report::output(&notes, cli.output.as_deref())?;
    report::print_terminal_summary(&notes);

    let (publishers, mut results) = select_publishers(&cli, &config);
    if !publishers.is_empty() {
        info!(channels = publishers.len(), "publishing release notes");
        results.extend(publish::publish_all(publishers, Arc::new(notes)).await);
    }
    print_channel_results(&results);

    info!("done");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let span = info_span!("pr_digest", owner = %cli.owner, repo = %cli.repo);
    match run(cli).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(error = %failure, "pr-digest failed");
            eprintln!("{} {}", "error:".red().bold(), failure);
            ExitCode::from(failure.exit_code())
        }
    }
}
