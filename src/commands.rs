//! Chat trigger table backed by a JSON file
//!
//! The table maps trigger phrases to reply text. Every mutation rewrites the
//! whole file before the lock is released, so the file always reflects the
//! in-memory table.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::{Error, Result};

/// Separator between trigger and response in an add-command payload
pub const DELIMITER: &str = ":::";

/// Trigger -> response mapping
pub type CommandTable = BTreeMap<String, String>;

/// A trigger/response pair parsed from an add-command payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommand {
    /// Trigger phrase
    pub trigger: String,
    /// Reply text
    pub response: String,
}

impl NewCommand {
    /// Parse `"<trigger>:::<response>"`
    ///
    /// Only the first delimiter splits; the response may contain further
    /// delimiters verbatim.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCommand` if the delimiter is missing or either
    /// side is empty
    pub fn parse(payload: &str) -> Result<Self> {
        let (trigger, response) = payload.split_once(DELIMITER).ok_or_else(|| {
            Error::InvalidCommand(format!("expected <trigger>{DELIMITER}<response>"))
        })?;

        if trigger.is_empty() {
            return Err(Error::InvalidCommand("trigger must not be empty".to_string()));
        }
        if response.is_empty() {
            return Err(Error::InvalidCommand("response must not be empty".to_string()));
        }

        Ok(Self {
            trigger: trigger.to_string(),
            response: response.to_string(),
        })
    }
}

/// Persistent, lock-guarded command table
#[derive(Debug)]
pub struct CommandStore {
    path: PathBuf,
    write_timeout: Duration,
    table: Mutex<CommandTable>,
}

impl CommandStore {
    /// Load the table from a JSON object of strings
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Parse` if it
    /// is not a JSON object of strings
    pub async fn load(path: impl Into<PathBuf>, write_timeout: Duration) -> Result<Self> {
        let path = path.into();
        let data = tokio::fs::read(&path).await?;
        let table: CommandTable = serde_json::from_slice(&data)?;

        tracing::info!(path = %path.display(), commands = table.len(), "loaded bot commands");

        Ok(Self::with_table(path, table, write_timeout))
    }

    /// Create a store around an existing table without touching disk
    #[must_use]
    pub fn with_table(path: PathBuf, table: CommandTable, write_timeout: Duration) -> Self {
        Self {
            path,
            write_timeout,
            table: Mutex::new(table),
        }
    }

    /// Insert or overwrite a trigger and persist the whole table
    ///
    /// On a failed write the previous entry is restored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be written
    pub async fn add(&self, trigger: &str, response: &str) -> Result<()> {
        let mut table = self.table.lock().await;
        let previous = table.insert(trigger.to_string(), response.to_string());

        if let Err(e) = self.persist(&table).await {
            match previous {
                Some(old) => table.insert(trigger.to_string(), old),
                None => table.remove(trigger),
            };
            return Err(e);
        }

        tracing::info!(trigger, overwrote = previous.is_some(), "bot command added");
        Ok(())
    }

    /// Snapshot all entries
    pub async fn list(&self) -> Vec<(String, String)> {
        self.table
            .lock()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Response for the longest trigger contained in `text`
    pub async fn longest_match(&self, text: &str) -> Option<String> {
        let table = self.table.lock().await;
        longest_match(&table, text).map(ToString::to_string)
    }

    /// Write the table to disk, waiting for the outcome even past the timeout
    ///
    /// The blocking write cannot be cancelled, so the table is only rolled
    /// back once the file is known to be unchanged.
    async fn persist(&self, table: &CommandTable) -> Result<()> {
        let json = serde_json::to_vec(table)?;
        let bytes = json.len();
        let path = self.path.clone();
        let mut write = tokio::task::spawn_blocking(move || write_atomic(&path, &json));

        let joined = match tokio::time::timeout(self.write_timeout, &mut write).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    timeout = ?self.write_timeout,
                    "command file write is slow, waiting for it to finish"
                );
                write.await
            }
        };
        joined.map_err(io::Error::other)??;

        tracing::debug!(path = %self.path.display(), bytes, "bot commands persisted");
        Ok(())
    }
}

/// Write `data` to a uniquely named sibling file and rename it over `path`
///
/// The temporary file is removed if any step fails.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path.file_name().unwrap_or_default();

    let mut tmp = tempfile::Builder::new()
        .prefix(name)
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Pick the response whose trigger is the longest substring of `text`
///
/// Length counts characters; equal lengths go to the lexicographically
/// smallest trigger. Empty triggers never match.
#[must_use]
pub fn longest_match<'a>(table: &'a CommandTable, text: &str) -> Option<&'a str> {
    table
        .iter()
        .filter(|(trigger, _)| !trigger.is_empty() && text.contains(trigger.as_str()))
        .fold(None::<(&String, &String)>, |best, (trigger, response)| match best {
            Some((b, _)) if b.chars().count() >= trigger.chars().count() => best,
            _ => Some((trigger, response)),
        })
        .map(|(_, response)| response.as_str())
}
