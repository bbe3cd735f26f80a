use anyhow::Result;
use clap::{Parser, Subcommand};
use holo_analytics::{
    Collector, Config, HttpShortsProbe, Preparer, Roster, Session, SessionStore, Summarizer, YouTubeClient,
};
use holo_core::{KeywordBanks, Selection};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "holo-analytics")]
#[command(version, about = "YouTube analytics pipeline for Hololive Production members")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a session and collect channel and video data
    Collect,
    /// Extract title keywords, classify video types and tag content types
    Prepare {
        /// Session directory name; prompts for one when omitted
        #[arg(long)]
        session: Option<String>,
        /// Only prepare these members (repeatable)
        #[arg(long = "member")]
        members: Vec<String>,
    },
    /// Build channel and unit summaries
    Summarize {
        /// Session directory name; prompts for one when omitted
        #[arg(long)]
        session: Option<String>,
        /// Only summarize these members (repeatable)
        #[arg(long = "member")]
        members: Vec<String>,
        /// Skip the per-video-type statistics columns
        #[arg(long)]
        no_type_breakdown: bool,
    },
    /// Collect, prepare and summarize in one session
    Run,
    /// List existing sessions
    Sessions,
    /// Print the effective configuration
    Config {
        /// Also write it as TOML to this path
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration before logging so the configured level applies
    let loaded = Config::load();
    let level = match (&loaded, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(config), false) => config.output.log_level.clone(),
        (Err(_), false) => "info".to_string(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(format!("holo_analytics={level},holo_core={level},warn"))
        .init();

    let config = loaded.unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    config.validate()?;

    let store = SessionStore::new(config.paths.sessions_root.clone())
        .with_timestamp_filenames(config.output.timestamp_filenames);
    let start_time = Instant::now();

    match cli.command {
        Commands::Collect => {
            let roster = Roster::load(&config.paths.roster_file)?;
            collect(&config, &store, &roster).await?;
        }

        Commands::Prepare { session, members } => {
            let roster = Roster::load(&config.paths.roster_file)?;
            let session = open_session(&store, session)?;
            prepare(&config, &session, &roster, &selection(members)).await?;
        }

        Commands::Summarize {
            session,
            members,
            no_type_breakdown,
        } => {
            let roster = Roster::load(&config.paths.roster_file)?;
            let session = open_session(&store, session)?;
            summarize(&config, &session, &roster, &selection(members), !no_type_breakdown)?;
        }

        Commands::Run => {
            let roster = Roster::load(&config.paths.roster_file)?;
            let session = collect(&config, &store, &roster).await?;
            prepare(&config, &session, &roster, &Selection::All).await?;
            summarize(&config, &session, &roster, &Selection::All, true)?;
        }

        Commands::Sessions => {
            let sessions = store.list_sessions()?;
            if sessions.is_empty() {
                info!("📭 No sessions found in {}", store.root().display());
                return Ok(());
            }

            info!("📚 Found {} session(s) in {}:", sessions.len(), store.root().display());
            for (index, name) in sessions.iter().enumerate() {
                println!("{}. {}", index + 1, name);
            }
            return Ok(());
        }

        Commands::Config { write } => {
            println!("{}", config.summary());
            if let Some(path) = write {
                config.save(&path)?;
            }
            return Ok(());
        }
    }

    info!("🎉 Completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

fn selection(members: Vec<String>) -> Selection {
    match members.len() {
        0 => Selection::All,
        1 => Selection::from(members[0].as_str()),
        _ => Selection::Many(members),
    }
}

fn open_session(store: &SessionStore, name: Option<String>) -> Result<Session> {
    match name {
        Some(name) => store.open(&name),
        None => {
            let stdin = std::io::stdin();
            store.request_session(stdin.lock(), std::io::stdout())
        }
    }
}

async fn collect(config: &Config, store: &SessionStore, roster: &Roster) -> Result<Session> {
    config.validate_for_collection()?;

    let client = YouTubeClient::from_config(config)?;
    let session = store.create_session()?;
    info!("🚀 Collecting data for {} members into {}", roster.len(), session.name());

    let (channels, videos) = Collector::new(&client, &session).collect_all(roster).await?;
    info!(
        "📊 Collected {} channels and video data for {} members",
        channels.titles.len(),
        videos.len()
    );

    Ok(session)
}

async fn prepare(config: &Config, session: &Session, roster: &Roster, selection: &Selection) -> Result<()> {
    let banks = KeywordBanks::import_dir(&config.paths.keyword_banks_dir)?;
    let probe = HttpShortsProbe::from_config(config)?;

    let preparer = Preparer::new(session, &banks, config.classification.clone(), &probe)?;
    preparer.prepare(roster, selection).await?;
    Ok(())
}

fn summarize(
    config: &Config,
    session: &Session,
    roster: &Roster,
    selection: &Selection,
    per_type: bool,
) -> Result<()> {
    let banks = KeywordBanks::import_dir(&config.paths.keyword_banks_dir)?;

    let report = Summarizer::new(session, roster, &banks)
        .with_type_breakdown(per_type)
        .run(selection)?;

    for unit in &report.units {
        info!(
            "  {} / {} / {}: {} members, {} subscribers, {} videos",
            unit.group, unit.branch, unit.unit, unit.member_count, unit.subscriber_count, unit.video_count
        );
    }
    Ok(())
}
