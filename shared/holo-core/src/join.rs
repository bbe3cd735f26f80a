//! Key validation for joins on `video_id`
//!
//! Derived tables may only reference videos present in the attributes table.
//! Joins check that before merging so they never produce unmatched rows.

use crate::{HoloCoreError, Result};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Ensure every id in `ids` appears in `known`.
/// The error lists each unmatched id once, in first-seen order.
pub fn validate_video_ids<'a, I>(table: &str, known: &HashSet<&str>, ids: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut reported = BTreeSet::new();
    let unmatched: Vec<String> = ids
        .into_iter()
        .filter(|id| !known.contains(id) && reported.insert(*id))
        .map(str::to_string)
        .collect();

    if unmatched.is_empty() {
        Ok(())
    } else {
        Err(HoloCoreError::UnmatchedVideoIds {
            table: table.to_string(),
            video_ids: unmatched,
        })
    }
}

/// Index rows by their video id. Later duplicates replace earlier rows.
pub fn index_by_video_id<'a, T, F>(rows: &'a [T], key: F) -> HashMap<&'a str, &'a T>
where
    F: Fn(&'a T) -> &'a str,
{
    rows.iter().map(|row| (key(row), row)).collect()
}
