//! Append-only JSONL audit log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::files::{create_private_dir, PRIVATE_FILE_MODE};
use crate::error::{Error, Result};

/// One audit event: a flat JSON object.
pub type Event = Map<String, Value>;

/// Audit sink writing one JSON object per line.
///
/// Appends through one instance are serialized, so a shared `AuditLog` can
/// be used from several threads.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `event`, adding `ts` (RFC 3339, UTC, nanoseconds) when absent.
    ///
    /// The directory is created 0700 and the file 0600 on first use.
    pub fn append(&self, mut event: Event) -> Result<()> {
        if !event.contains_key("ts") {
            event.insert(
                "ts".to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)),
            );
        }
        let mut line = serde_json::to_vec(&event).map_err(crate::error::ConfigError::Serialize)?;
        line.push(b'\n');

        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(dir) = self.path.parent() {
            create_private_dir(dir)?;
        }
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(PRIVATE_FILE_MODE);
        }
        let mut file = options
            .open(&self.path)
            .map_err(|e| Error::file(&self.path, e))?;
        file.write_all(&line)
            .map_err(|e| Error::file(&self.path, e))?;
        debug!(path = %self.path.display(), "audit event written");
        Ok(())
    }

    /// [`append`](Self::append), logging instead of failing.
    pub fn record(&self, event: Event) {
        if let Err(e) = self.append(event) {
            warn!(path = %self.path.display(), error = %e, "failed to write audit event");
        }
    }
}

/// Build an event from `(key, value)` pairs.
pub fn event<I, K, V>(fields: I) -> Event
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_append_adds_timestamp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs").join("audit.log");
        let log = AuditLog::new(&path);

        log.append(event([("type", "set"), ("key", "A")])).unwrap();
        log.append(event([("type", "unset"), ("ts", "fixed")])).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "set");
        assert!(lines[0]["ts"].as_str().unwrap().ends_with('Z'));
        assert_eq!(lines[1]["ts"], "fixed");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
            let dir_mode = std::fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
            assert_eq!(dir_mode, 0o700);
        }
    }

    #[test]
    fn test_concurrent_appends_stay_whole() {
        let tmp = TempDir::new().unwrap();
        let log = Arc::new(AuditLog::new(tmp.path().join("audit.log")));

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        log.append(event([("thread", Value::from(n)), ("i", Value::from(i))]))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(text.lines().count(), 200);
        for line in text.lines() {
            let _: Value = serde_json::from_str(line).unwrap();
        }
    }
}
