// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable persistence contract (§3 [ADDED]). `JsonStore` is the default
//! implementation — a single versioned JSON file with `.bak` rotation,
//! grounded on the teacher's `storage::snapshot` discipline
//! (`rotate_bak_path`) without the WAL machinery that pattern also carries;
//! a `Store` backed by a real database is a drop-in replacement.

use scp_core::{Chat, Message, Project, Setting, User};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub users: Vec<User>,
    pub projects: Vec<Project>,
    pub chats: Vec<Chat>,
    pub messages: Vec<Message>,
    pub settings: Vec<Setting>,
}

pub trait Store: Send + Sync {
    fn load(&self) -> Result<StoreSnapshot, StoreError>;
    fn save(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError>;
}

const CURRENT_STORE_VERSION: u32 = 1;
const MAX_BAK_FILES: u32 = 3;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "v")]
    version: u32,
    snapshot: StoreSnapshot,
}

/// JSON-file-backed [`Store`]. Writes go to a sibling temp file then
/// `rename` into place so a crash mid-write never corrupts the last good
/// snapshot; the previous file is rotated into `.bak`/`.bak.2`/`.bak.3`
/// before being overwritten.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn bak_path(&self, n: u32) -> PathBuf {
        if n == 1 {
            self.path.with_extension("bak")
        } else {
            self.path.with_extension(format!("bak.{n}"))
        }
    }

    fn rotate_backups(&self) {
        let oldest = self.bak_path(MAX_BAK_FILES);
        if oldest.exists() {
            let _ = fs::remove_file(&oldest);
        }
        for n in (1..MAX_BAK_FILES).rev() {
            let src = self.bak_path(n);
            if src.exists() {
                let _ = fs::rename(&src, self.bak_path(n + 1));
            }
        }
        if self.path.exists() {
            let _ = fs::rename(&self.path, self.bak_path(1));
        }
    }
}

impl Store for JsonStore {
    fn load(&self) -> Result<StoreSnapshot, StoreError> {
        if !self.path.exists() {
            return Ok(StoreSnapshot::default());
        }
        let bytes = fs::read(&self.path)?;
        let envelope: Envelope = serde_json::from_slice(&bytes)?;
        Ok(envelope.snapshot)
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
        let envelope = Envelope { version: CURRENT_STORE_VERSION, snapshot: snapshot.clone() };
        let bytes = serde_json::to_vec_pretty(&envelope)?;

        let tmp_path = tmp_path_for(&self.path);
        fs::write(&tmp_path, &bytes)?;
        self.rotate_backups();
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
