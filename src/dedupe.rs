//! Snapshot of already-alerted deal fingerprints with a TTL, persisted as a
//! JSON file so reruns stay quiet about deals they have already sent.
//!
//! Loading is forgiving: a missing, corrupt, or partly-bad snapshot degrades
//! to an empty or trimmed store so a scan can always start. Saving is not,
//! since a failed write would re-alert everything next run.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeenDeal {
    hash: String,
    /// Unix epoch milliseconds.
    seen_at: i64,
}

pub struct SeenDealStore {
    path: PathBuf,
    ttl_ms: i64,
    entries: HashMap<String, i64>,
}

impl SeenDealStore {
    pub fn new(path: impl Into<PathBuf>, ttl_ms: i64) -> Self {
        Self {
            path: path.into(),
            ttl_ms,
            entries: HashMap::new(),
        }
    }

    /// Reads the snapshot, dropping malformed and expired entries. Never
    /// fails: anything unreadable just leaves the store empty.
    pub fn load(&mut self) {
        self.entries.clear();
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!("no snapshot at {}: {err}", self.path.display());
                return;
            }
        };
        let rows: Vec<SeenDeal> = match serde_json::from_str(&raw) {
            Ok(rows) => rows,
            Err(err) => {
                debug!("discarding unreadable snapshot {}: {err}", self.path.display());
                return;
            }
        };
        let now = now_ms();
        for row in rows {
            if row.hash.is_empty() || row.seen_at <= 0 {
                continue;
            }
            if now - row.seen_at > self.ttl_ms {
                continue;
            }
            self.entries.insert(row.hash, row.seen_at);
        }
    }

    /// True while the fingerprint is inside its TTL, even if the entry has
    /// not been expired out of the map yet.
    pub fn has(&self, hash: &str) -> bool {
        self.entries
            .get(hash)
            .is_some_and(|seen_at| now_ms() - seen_at <= self.ttl_ms)
    }

    pub fn mark(&mut self, hash: &str) {
        self.entries.insert(hash.to_string(), now_ms());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the live (non-expired) entries back, via a temp file and rename
    /// so a crash mid-write cannot truncate the snapshot.
    pub fn save(&self) -> Result<()> {
        let now = now_ms();
        let mut rows: Vec<SeenDeal> = self
            .entries
            .iter()
            .filter(|(_, seen_at)| now - **seen_at <= self.ttl_ms)
            .map(|(hash, seen_at)| SeenDeal {
                hash: hash.clone(),
                seen_at: *seen_at,
            })
            .collect();
        rows.sort_by(|a, b| a.hash.cmp(&b.hash));
        let json = serde_json::to_string_pretty(&rows)
            .context("failed serializing seen-deal snapshot")?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed creating snapshot directory {}", parent.display())
                })?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("failed writing snapshot to {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed moving snapshot into {}", self.path.display()))?;
        Ok(())
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
