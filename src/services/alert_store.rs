//! File-backed alert store.
//!
//! The document is a JSON object keyed by user id, each value a list of
//! `{pair, target, active, created}` objects. Older files used
//! `target_price` / `created_at`; those are renamed on every load.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::{Alert, AlertBook, UserId};

const LEGACY_FIELDS: [(&str, &str); 2] = [("target_price", "target"), ("created_at", "created")];

pub struct AlertStore {
    path: PathBuf,
    book: Mutex<AlertBook>,
}

impl AlertStore {
    /// Loads `path`, or starts empty if the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let book = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => parse_book(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AlertBook::new(),
            Err(e) => return Err(e.into()),
        };

        let total: usize = book.values().map(Vec::len).sum();
        tracing::info!(path = %path.display(), users = book.len(), alerts = total, "alert store loaded");

        Ok(Self {
            path,
            book: Mutex::new(book),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the whole book.
    pub async fn read(&self) -> AlertBook {
        self.book.lock().await.clone()
    }

    pub async fn alerts_for(&self, user_id: UserId) -> Vec<Alert> {
        self.book
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Read-modify-write under the store lock.
    ///
    /// `f` runs on a working copy. If it changed anything the copy is written
    /// to disk first and only then becomes the in-memory state, so a failed
    /// write leaves both untouched.
    pub async fn modify<R>(&self, f: impl FnOnce(&mut AlertBook) -> R) -> Result<R, StoreError> {
        let mut guard = self.book.lock().await;
        let mut working = guard.clone();
        let out = f(&mut working);

        if working != *guard {
            write_book(&self.path, &working).await?;
            *guard = working;
        }

        Ok(out)
    }
}

/// Parses a stored document, applying the legacy field renames.
pub fn parse_book(raw: &str) -> Result<AlertBook, StoreError> {
    if raw.trim().is_empty() {
        return Ok(AlertBook::new());
    }

    let mut doc: Value = serde_json::from_str(raw)?;
    normalize_legacy(&mut doc);
    Ok(serde_json::from_value(doc)?)
}

fn normalize_legacy(doc: &mut Value) {
    let Some(users) = doc.as_object_mut() else {
        return;
    };

    let alerts = users
        .values_mut()
        .filter_map(Value::as_array_mut)
        .flatten()
        .filter_map(Value::as_object_mut);

    for alert in alerts {
        for (old, new) in LEGACY_FIELDS {
            if alert.contains_key(new) {
                continue;
            }
            if let Some(v) = alert.remove(old) {
                let v = match (new, v) {
                    ("created", Value::String(s)) => Value::String(s),
                    ("created", other) => Value::String(other.to_string()),
                    (_, other) => other,
                };
                alert.insert(new.to_string(), v);
            }
        }
    }
}

async fn write_book(path: &Path, book: &AlertBook) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(book)?;

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
