/// Hololive Analytics - YouTube data pipeline
///
/// Collects channel and video metadata for the members of Hololive Production,
/// classifies and tags each video, and summarizes the results per channel and
/// per organizational unit. Every stage reads and writes CSV tables inside a
/// timestamped session directory.

pub mod config;
pub mod prepare;
pub mod probe;
pub mod roster;
pub mod session;
pub mod summary;
pub mod youtube;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::prepare::{PreparedMember, Preparer};
pub use crate::probe::{HttpShortsProbe, ShortsProbe};
pub use crate::roster::{Member, Roster, UnitKey};
pub use crate::session::{GroupedTable, Session, SessionStore};
pub use crate::summary::{ChannelSummary, SummaryReport, Summarizer, UnitShare, UnitSummary};
pub use crate::youtube::{Collector, DataApi, ResourceKind, YouTubeClient};
