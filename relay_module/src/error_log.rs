//! Append-only error log with secret redaction.
//!
//! Entries are one line each, `[YYYY-MM-DD HH:MM:SS] message`. Configured
//! secret values (bot tokens) are replaced before anything touches disk, so
//! the `/errorlogs` command can never leak a credential.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use tracing::error;

/// Handle on the error-log file. Cheap to clone; all state lives on disk.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
    /// `(secret value, replacement label)` pairs applied before every write.
    secrets: Vec<(String, String)>,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            secrets: Vec::new(),
        }
    }

    pub fn with_secrets(path: impl Into<PathBuf>, secrets: Vec<(String, String)>) -> Self {
        let secrets = secrets
            .into_iter()
            .filter(|(value, _)| !value.is_empty())
            .collect();
        Self {
            path: path.into(),
            secrets,
        }
    }

    /// Redact configured secret values from a message.
    pub fn redact(&self, message: &str) -> String {
        let mut safe = message.to_string();
        for (value, label) in &self.secrets {
            if safe.contains(value) {
                safe = safe.replace(value, label);
            }
        }
        safe
    }

    /// Append a redacted, timestamped entry. Never fails: a log write that
    /// cannot land on disk is reported through tracing only.
    pub fn log_error(&self, message: &str) {
        let safe = self.redact(message);
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{}] {}", stamp, safe);
        error!("{}", safe);
        if let Err(err) = self.append_line(&line) {
            error!("failed to write error log: {}", err);
        }
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.flush()
    }

    /// Last `count` log lines, oldest first. Empty when the file is missing
    /// or empty.
    pub fn tail(&self, count: usize) -> Vec<String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };
        let lines: Vec<&str> = content.lines().filter(|line| !line.is_empty()).collect();
        let start = lines.len().saturating_sub(count);
        lines[start..].iter().map(|line| line.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_log(secrets: Vec<(String, String)>) -> (TempDir, ErrorLog) {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("error.log");
        (temp, ErrorLog::with_secrets(path, secrets))
    }

    #[test]
    fn appends_timestamped_lines() {
        let (_temp, log) = test_log(Vec::new());
        log.log_error("telegram send failed");
        log.log_error("history fetch failed");

        let lines = log.tail(10);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("telegram send failed"));
        assert!(lines[1].ends_with("history fetch failed"));
    }

    #[test]
    fn redacts_secret_tokens() {
        let (_temp, log) = test_log(vec![(
            "123456:super-secret".to_string(),
            "*****TELEGRAM_TOKEN*****".to_string(),
        )]);
        log.log_error("send to https://api.telegram.org/bot123456:super-secret/sendMessage failed");

        let lines = log.tail(1);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].contains("super-secret"));
        assert!(lines[0].contains("*****TELEGRAM_TOKEN*****"));
    }

    #[test]
    fn tail_returns_most_recent_lines() {
        let (_temp, log) = test_log(Vec::new());
        for i in 0..30 {
            log.log_error(&format!("error {}", i));
        }

        let lines = log.tail(20);
        assert_eq!(lines.len(), 20);
        assert!(lines[0].ends_with("error 10"));
        assert!(lines[19].ends_with("error 29"));
    }

    #[test]
    fn tail_of_missing_file_is_empty() {
        let (_temp, log) = test_log(Vec::new());
        assert!(log.tail(20).is_empty());
    }
}
