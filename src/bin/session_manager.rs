use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use holo_analytics::{Config, Session, SessionStore};
use holo_core::join::validate_video_ids;
use holo_core::{
    ContentTypesRecord, Timestamped, TitleKeywordsRecord, VideoAttributes, VideoStats, VideoTypeRecord,
};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "session-manager")]
#[command(about = "Session maintenance utility")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Sessions root; defaults to the configured one
    #[arg(long)]
    sessions_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all sessions
    List,
    /// Show the members and files of a session
    Show {
        /// Session directory name
        session: String,
    },
    /// Check that every derived table only references collected video ids
    Check {
        /// Session directory name
        session: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("holo_analytics=info,holo_core=info,info")
        .init();

    let cli = Cli::parse();

    let sessions_root = match cli.sessions_root {
        Some(root) => root,
        None => Config::load()?.paths.sessions_root,
    };
    let store = SessionStore::new(sessions_root);

    match cli.command {
        Commands::List => {
            let sessions = store.list_sessions()?;

            if sessions.is_empty() {
                info!("📭 No sessions found in {}", store.root().display());
                return Ok(());
            }

            info!("📚 Found {} sessions:", sessions.len());
            for name in sessions {
                let session = store.open(&name)?;
                info!("  {} - {} members", name, session.member_dirs()?.len());
            }
        }

        Commands::Show { session } => {
            let session = store.open(&session)?;
            let members = session.member_dirs()?;
            let files = session.files()?;

            info!("📂 {}", session.path().display());
            info!("👥 Members ({}): {}", members.len(), members.join(", "));
            info!("📄 Files ({}):", files.len());
            for file in files {
                info!("  {}", file.display());
            }
        }

        Commands::Check { session } => {
            let session = store.open(&session)?;
            let mut failures = 0;

            for member in session.member_dirs()? {
                match check_member(&session, &member) {
                    Ok(true) => info!("✅ {}", member),
                    Ok(false) => warn!("⚠️ {}: no video_attributes table", member),
                    Err(e) => {
                        error!("❌ {}: {:#}", member, e);
                        failures += 1;
                    }
                }
            }

            if failures > 0 {
                bail!("{} member(s) with inconsistent video tables", failures);
            }
            info!("✅ All video tables consistent");
        }
    }

    Ok(())
}

/// Validate one member's derived tables against its attributes.
/// Returns `false` when there is no attributes table to check against.
fn check_member(session: &Session, member: &str) -> Result<bool> {
    let Some(attributes) = session.import_video_table::<VideoAttributes>(member, "video_attributes")? else {
        return Ok(false);
    };
    let known: HashSet<&str> = attributes.data.iter().map(|v| v.video_id.as_str()).collect();

    check_table::<VideoStats>(session, member, "video_stats", &known, |r| &r.video_id)?;
    check_table::<VideoTypeRecord>(session, member, "video_types", &known, |r| &r.video_id)?;
    check_table::<TitleKeywordsRecord>(session, member, "video_title_keywords", &known, |r| &r.video_id)?;
    check_table::<ContentTypesRecord>(session, member, "content_types", &known, |r| &r.video_id)?;
    Ok(true)
}

fn check_table<T: DeserializeOwned>(
    session: &Session,
    member: &str,
    data_type: &str,
    known: &HashSet<&str>,
    video_id: impl Fn(&T) -> &String,
) -> Result<()> {
    let table: Option<Timestamped<T>> = session.import_video_table(member, data_type)?;
    if let Some(table) = table {
        validate_video_ids(data_type, known, table.data.iter().map(|r| video_id(r).as_str()))?;
    }
    Ok(())
}
