//! Roster of tracked members and their organizational units

use anyhow::{bail, Context, Result};
use holo_core::Selection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One tracked channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub youtube_channel_id: String,
    pub group: String,
    pub branch: String,
    pub unit: String,
}

impl Member {
    /// Directory name used under `Video/`, e.g. `Tokino_Sora`
    pub fn dir_name(&self) -> String {
        member_dir_name(&self.name)
    }
}

/// Member name with spaces replaced by underscores
pub fn member_dir_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// A unit inside a branch inside a group, e.g. Hololive / English / Myth
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitKey {
    pub group: String,
    pub branch: String,
    pub unit: String,
}

/// The fixed list of members, in file order
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: Vec<Member>,
}

impl Roster {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    /// Load the roster CSV (`name,youtube_channel_id,group,branch,unit`)
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open roster {}", path.display()))?;

        let members = reader
            .deserialize()
            .collect::<std::result::Result<Vec<Member>, _>>()
            .with_context(|| format!("Failed to parse roster {}", path.display()))?;

        info!("👥 Loaded {} members from {}", members.len(), path.display());
        Ok(Self { members })
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }

    pub fn channel_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.youtube_channel_id.clone()).collect()
    }

    /// Find a member by name, also accepting the underscored directory form
    pub fn find(&self, name: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.name == name || m.dir_name() == name)
    }

    pub fn by_channel_id(&self, channel_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.youtube_channel_id == channel_id)
    }

    /// Resolve a selection of member names. Unknown names are an error.
    pub fn select(&self, selection: &Selection) -> Result<Vec<&Member>> {
        let names = selection.resolve(&self.names())?;

        names
            .iter()
            .map(|name| match self.find(name) {
                Some(member) => Ok(member),
                None => bail!("Unknown member: {}", name),
            })
            .collect()
    }

    /// Distinct units in first-appearance order
    pub fn units(&self) -> Vec<UnitKey> {
        let mut units: Vec<UnitKey> = Vec::new();
        for member in &self.members {
            let key = UnitKey {
                group: member.group.clone(),
                branch: member.branch.clone(),
                unit: member.unit.clone(),
            };
            if !units.contains(&key) {
                units.push(key);
            }
        }
        units
    }

    pub fn members_of(&self, unit: &UnitKey) -> Vec<&Member> {
        self.members
            .iter()
            .filter(|m| m.group == unit.group && m.branch == unit.branch && m.unit == unit.unit)
            .collect()
    }
}
