//! Session store: timestamped directories of CSV tables
//!
//! ```text
//! <sessions_root>/
//!   2024-05-01_YT-DAPI_Session/
//!     Channel/2024-05-01-1230_channel_stats.csv
//!     Video/Tokino_Sora/2024-05-01-1231_tokino_sora_video_attributes.csv
//!   2024-05-01_YT-DAPI_Session-2/
//! ```

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use holo_core::{TableColumns, Timestamped};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::roster::member_dir_name;

pub const SESSION_SUFFIX: &str = "YT-DAPI_Session";
pub const CHANNEL_DIR: &str = "Channel";
pub const VIDEO_DIR: &str = "Video";

const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M";

/// Root directory holding every collection session
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
    timestamp_filenames: bool,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            timestamp_filenames: true,
        }
    }

    /// Whether sessions prefix exported file names with the collection time
    pub fn with_timestamp_filenames(mut self, enable: bool) -> Self {
        self.timestamp_filenames = enable;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a new session dated today (UTC)
    pub fn create_session(&self) -> Result<Session> {
        self.create_session_on(Utc::now().date_naive())
    }

    /// Create a new session for `date`, appending `-2`, `-3`, ... when the name is taken
    pub fn create_session_on(&self, date: NaiveDate) -> Result<Session> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create sessions root {}", self.root.display()))?;

        let base_name = format!("{}_{}", date.format("%Y-%m-%d"), SESSION_SUFFIX);
        let mut name = base_name.clone();
        let mut counter = 2;
        while self.root.join(&name).exists() {
            name = format!("{}-{}", base_name, counter);
            counter += 1;
        }

        let path = self.root.join(&name);
        std::fs::create_dir(&path)
            .with_context(|| format!("Failed to create session {}", path.display()))?;

        info!("📁 Created session: {}", name);
        Ok(Session {
            name,
            path,
            timestamp_filenames: self.timestamp_filenames,
        })
    }

    /// Session directory names, oldest first
    pub fn list_sessions(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.with_context(|| format!("Failed to scan {}", self.root.display()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if is_session_name(&name) {
                sessions.push(name);
            }
        }

        sessions.sort_by_key(|name| session_sort_key(name));
        Ok(sessions)
    }

    /// Reopen an existing session by directory name
    pub fn open(&self, name: &str) -> Result<Session> {
        let path = self.root.join(name);
        if !path.is_dir() {
            bail!("Session not found: {}", path.display());
        }

        debug!("📂 Opened session: {}", name);
        Ok(Session {
            name: name.to_string(),
            path,
            timestamp_filenames: self.timestamp_filenames,
        })
    }

    /// Print the numbered session list and read a choice, asking again until it is valid.
    /// End of input is an error.
    pub fn request_session<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> Result<Session> {
        let sessions = self.list_sessions()?;
        if sessions.is_empty() {
            bail!("No sessions found in {}", self.root.display());
        }

        writeln!(output, "Available sessions:")?;
        for (index, name) in sessions.iter().enumerate() {
            writeln!(output, "{:>4}: {}", index + 1, name)?;
        }

        loop {
            write!(output, "Select a session (1-{}): ", sessions.len())?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                bail!("No session selected: input ended");
            }

            match line.trim().parse::<usize>() {
                Ok(choice) if (1..=sessions.len()).contains(&choice) => {
                    return self.open(&sessions[choice - 1]);
                }
                _ => writeln!(output, "Invalid choice: {}", line.trim())?,
            }
        }
    }
}

/// `YYYY-MM-DD_YT-DAPI_Session` with an optional `-N` suffix
fn is_session_name(name: &str) -> bool {
    let Some((date, rest)) = name.split_once('_') else {
        return false;
    };
    if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        return false;
    }
    match rest.strip_prefix(SESSION_SUFFIX) {
        Some("") => true,
        Some(counter) => counter
            .strip_prefix('-')
            .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false),
        None => false,
    }
}

/// Orders sessions by date, then by collision counter
fn session_sort_key(name: &str) -> (String, u32) {
    let date = name.get(..10).unwrap_or(name).to_string();
    let counter = name
        .rsplit_once("Session-")
        .and_then(|(_, n)| n.parse().ok())
        .unwrap_or(1);
    (date, counter)
}

/// One collection run. Every pipeline stage reads and writes through this handle.
#[derive(Debug, Clone)]
pub struct Session {
    name: String,
    path: PathBuf,
    timestamp_filenames: bool,
}

impl Session {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn channel_dir(&self) -> PathBuf {
        self.path.join(CHANNEL_DIR)
    }

    pub fn video_dir(&self) -> PathBuf {
        self.path.join(VIDEO_DIR)
    }

    pub fn member_dir(&self, member_name: &str) -> PathBuf {
        self.video_dir().join(member_dir_name(member_name))
    }

    fn file_name(&self, stem: &str, collected_at: DateTime<Utc>) -> String {
        if self.timestamp_filenames {
            format!("{}_{}.csv", collected_at.format(FILE_TIMESTAMP_FORMAT), stem)
        } else {
            format!("{}.csv", stem)
        }
    }

    /// Write a channel-level table to `Channel/`
    pub fn export_channel_table<T: Serialize + TableColumns>(
        &self,
        name: &str,
        table: &Timestamped<T>,
    ) -> Result<PathBuf> {
        let path = self.channel_dir().join(self.file_name(name, table.collected_at));
        write_records(&path, &table.data)?;
        info!("💾 Exported {} ({} rows)", display_name(&path), table.len());
        Ok(path)
    }

    /// Write a per-member table to `Video/<Member_Name>/`
    pub fn export_video_table<T: Serialize + TableColumns>(
        &self,
        member_name: &str,
        data_type: &str,
        table: &Timestamped<T>,
    ) -> Result<PathBuf> {
        let stem = video_file_stem(member_name, data_type);
        let path = self
            .member_dir(member_name)
            .join(self.file_name(&stem, table.collected_at));
        write_records(&path, &table.data)?;
        info!("💾 Exported {} ({} rows)", display_name(&path), table.len());
        Ok(path)
    }

    /// Read the latest channel-level table named `name`, or `None` when absent
    pub fn import_channel_table<T: DeserializeOwned>(&self, name: &str) -> Result<Option<Timestamped<T>>> {
        match find_table(&self.channel_dir(), name)? {
            Some(path) => read_table(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Read the latest per-member table, or `None` when absent
    pub fn import_video_table<T: DeserializeOwned>(
        &self,
        member_name: &str,
        data_type: &str,
    ) -> Result<Option<Timestamped<T>>> {
        let stem = video_file_stem(member_name, data_type);
        match find_table(&self.member_dir(member_name), &stem)? {
            Some(path) => read_table(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Write a table with a group row above the column-name row
    pub fn export_grouped_table(
        &self,
        name: &str,
        table: &GroupedTable,
        collected_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let path = self.channel_dir().join(self.file_name(name, collected_at));
        ensure_parent(&path)?;

        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(table.columns.iter().map(|(group, _)| group.as_str()))?;
        writer.write_record(table.columns.iter().map(|(_, column)| column.as_str()))?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        info!("💾 Exported {} ({} rows)", display_name(&path), table.rows.len());
        Ok(path)
    }

    /// Read a table written by [`Session::export_grouped_table`]
    pub fn import_grouped_table(&self, name: &str) -> Result<Option<Timestamped<GroupedTable>>> {
        let Some(path) = find_table(&self.channel_dir(), name)? else {
            return Ok(None);
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let mut records = reader.records();
        let groups = records
            .next()
            .ok_or_else(|| anyhow!("{} has no group header", path.display()))??;
        let columns = records
            .next()
            .ok_or_else(|| anyhow!("{} has no column header", path.display()))??;

        let rows = records
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, _>>()
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let table = GroupedTable {
            columns: groups
                .iter()
                .zip(columns.iter())
                .map(|(g, c)| (g.to_string(), c.to_string()))
                .collect(),
            rows,
        };

        Ok(Some(Timestamped::at(vec![table], file_timestamp(&path)?)))
    }

    /// Member directory names found under `Video/`, sorted
    pub fn member_dirs(&self) -> Result<Vec<String>> {
        let video_dir = self.video_dir();
        if !video_dir.exists() {
            return Ok(Vec::new());
        }

        let mut members = Vec::new();
        for entry in WalkDir::new(&video_dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_dir() {
                members.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        members.sort();
        Ok(members)
    }

    /// Every file in the session, relative to the session directory
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.path).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                let relative = entry.path().strip_prefix(&self.path)?.to_path_buf();
                files.push(relative);
            }
        }
        Ok(files)
    }
}

/// A table with a two-row header: column group, then column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedTable {
    pub columns: Vec<(String, String)>,
    pub rows: Vec<Vec<String>>,
}

impl GroupedTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(_, column)| column == name)
    }

    /// Values of one column, `None` for unknown columns
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }
}

/// `<member_name lower-cased>_<data_type>`, spaces as underscores
pub fn video_file_stem(member_name: &str, data_type: &str) -> String {
    format!("{}_{}", member_dir_name(member_name).to_lowercase(), data_type)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn write_records<T: Serialize + TableColumns>(path: &Path, records: &[T]) -> Result<()> {
    ensure_parent(path)?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    // The writer only emits a header alongside the first record
    if records.is_empty() {
        writer.write_record(T::COLUMNS)?;
    }
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    writer.flush()?;
    Ok(())
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Timestamped<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let data = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    debug!("📄 Imported {} ({} rows)", display_name(path), data.len());
    Ok(Timestamped::at(data, file_timestamp(path)?))
}

/// Latest file in `dir` named `<stem>.csv` or `<timestamp>_<stem>.csv`
fn find_table(dir: &Path, stem: &str) -> Result<Option<PathBuf>> {
    if !dir.exists() {
        return Ok(None);
    }

    let exact = format!("{}.csv", stem);
    let mut candidates = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        let matches = file_name == exact
            || file_name
                .strip_suffix(&exact)
                .and_then(|prefix| prefix.strip_suffix('_'))
                .map(|timestamp| parse_file_timestamp(timestamp).is_some())
                .unwrap_or(false);
        if matches {
            candidates.push(entry.into_path());
        }
    }

    // Unprefixed files are dated by modification time
    let latest = candidates
        .into_iter()
        .map(|path| file_timestamp(&path).map(|timestamp| (timestamp, path)))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .max();
    Ok(latest.map(|(_, path)| path))
}

fn parse_file_timestamp(prefix: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(prefix, FILE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Collection time from the file name prefix, or the modification time for unprefixed files
fn file_timestamp(path: &Path) -> Result<DateTime<Utc>> {
    let file_name = display_name(path);
    if let Some(timestamp) = file_name
        .get(..15)
        .and_then(parse_file_timestamp)
    {
        return Ok(timestamp);
    }

    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to read modification time of {}", path.display()))?;
    let modified: DateTime<Utc> = modified.into();
    Ok(DateTime::from_timestamp(modified.timestamp(), 0).unwrap_or(modified))
}
