//! Append-only order ledger backed by a line-oriented JSON file.
//!
//! The ledger file is the single source of truth for which orders have been
//! seen; both the Discord listener and the startup backfill write through it
//! and the Telegram control loop reads from it. No in-memory copy is kept.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use crate::order::OrderRecord;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Handle on the ledger file. Cheap to clone; all state lives on disk.
#[derive(Debug, Clone)]
pub struct OrderLedger {
    path: PathBuf,
}

impl OrderLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Append one record as a JSON line, flushed to disk before returning.
    pub fn append(&self, record: &OrderRecord) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    /// Every parseable record in insertion order. Malformed lines are
    /// skipped, not surfaced.
    pub fn load_all(&self) -> Vec<OrderRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };
        content
            .lines()
            .filter_map(|line| serde_json::from_str::<OrderRecord>(line.trim()).ok())
            .collect()
    }

    /// [`load_all`](Self::load_all) filtered to the first occurrence per id,
    /// first-seen order preserved.
    pub fn load_unique(&self) -> Vec<OrderRecord> {
        let mut seen = std::collections::HashSet::new();
        self.load_all()
            .into_iter()
            .filter(|record| seen.insert(record.id.clone()))
            .collect()
    }

    /// Whether an order id has already been recorded.
    pub fn contains(&self, id: &str) -> bool {
        self.load_all().iter().any(|record| record.id == id)
    }

    /// Rewrite a legacy bare-id-per-line ledger into the structured format.
    ///
    /// The probe is the first non-empty line: if it parses as JSON the file
    /// is already structured and this is a no-op. Otherwise the original file
    /// is kept as a `.bak` backup and each bare id becomes a placeholder
    /// record with a derived link. Returns whether a migration ran.
    pub fn migrate_if_needed(&self) -> Result<bool, LedgerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Ok(false),
        };

        let first_line = match content.lines().map(str::trim).find(|line| !line.is_empty()) {
            Some(line) => line,
            None => return Ok(false),
        };
        if serde_json::from_str::<serde_json::Value>(first_line).is_ok() {
            return Ok(false);
        }

        info!("migrating legacy ledger format at {}", self.path.display());

        let migrated: Vec<OrderRecord> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(OrderRecord::placeholder)
            .collect();

        let backup_path = self.path.with_extension(backup_extension(&self.path));
        fs::rename(&self.path, &backup_path)?;

        let mut out = String::new();
        for record in &migrated {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        fs::write(&self.path, out)?;

        info!(
            "ledger migration done: {} record(s), backup at {}",
            migrated.len(),
            backup_path.display()
        );
        Ok(true)
    }
}

fn backup_extension(path: &PathBuf) -> String {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}.bak", ext),
        None => "bak".to_string(),
    }
}
