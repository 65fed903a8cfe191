//! Append-only feedback history, persisted as one pretty-printed JSON array.

use std::path::PathBuf;

use anyhow::Context as AnyhowContext;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::Result;

/// Feedback records on disk. Each append rewrites the whole file: load the
/// current array, push, write back. The mutex is held across that entire
/// sequence so in-process appends never interleave. Writers in other
/// processes are not coordinated with.
pub struct FeedbackStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append one record and persist the updated array.
    pub async fn append(&self, record: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await;
        records.push(record);

        let body = serde_json::to_string_pretty(&records)?;
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("writing feedback history to {}", self.path.display()))?;
        Ok(())
    }

    /// Read the stored records.
    pub async fn load(&self) -> Vec<Value> {
        let _guard = self.write_lock.lock().await;
        self.read_records().await
    }

    /// A missing or unreadable file yields an empty history; the next append
    /// starts a fresh array rather than failing.
    async fn read_records(&self) -> Vec<Value> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                tracing::warn!("could not read {}: {err}", self.path.display());
                return Vec::new();
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(Value::Array(records)) => records,
            Ok(_) => {
                tracing::warn!("{} does not hold a JSON array, starting over", self.path.display());
                Vec::new()
            }
            Err(err) => {
                tracing::warn!("{} is not valid JSON, starting over: {err}", self.path.display());
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FeedbackStore {
        FeedbackStore::new(dir.path().join("history.json"))
    }

    #[tokio::test]
    async fn first_append_creates_the_file() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        let record = json!({ "model": "Helsinki-NLP/opus-mt-de-en", "feedback": "like" });

        store.append(record.clone()).await.expect("append should succeed");

        assert!(store.path().exists());
        assert_eq!(store.load().await, vec![record]);
    }

    #[tokio::test]
    async fn appends_preserve_order() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        for n in 0..3 {
            store
                .append(json!({ "n": n }))
                .await
                .expect("append should succeed");
        }

        let records = store.load().await;
        let ns: Vec<i64> = records.iter().map(|r| r["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, [0, 1, 2]);
    }

    #[tokio::test]
    async fn non_ascii_text_is_stored_unescaped() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        store
            .append(json!({ "input_text": "Привет, мир" }))
            .await
            .expect("append should succeed");

        let raw = std::fs::read_to_string(store.path()).expect("read raw file");
        assert!(raw.contains("Привет, мир"), "raw file: {raw}");
    }

    #[tokio::test]
    async fn corrupt_file_heals_to_a_fresh_array() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not json").expect("seed corrupt file");

        store
            .append(json!({ "feedback": "dislike" }))
            .await
            .expect("append should heal");

        let records = store.load().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["feedback"], "dislike");
    }

    #[tokio::test]
    async fn non_array_json_is_discarded() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        std::fs::write(store.path(), "{\"not\": \"an array\"}").expect("seed file");

        assert_eq!(store.load().await, Vec::<Value>::new());
    }

    #[tokio::test]
    async fn unwritable_path_surfaces_an_error() {
        let dir = TempDir::new().expect("tempdir");
        // The path is a directory, so the write must fail.
        let store = FeedbackStore::new(dir.path());

        let err = store
            .append(json!({ "feedback": "like" }))
            .await
            .expect_err("writing to a directory should fail");
        assert!(err.to_string().contains("writing feedback history"));
    }

    #[tokio::test]
    async fn concurrent_appends_all_land() {
        let dir = TempDir::new().expect("tempdir");
        let store = Arc::new(store_in(&dir));

        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append(json!({ "n": n })).await
            }));
        }
        for handle in handles {
            handle.await.expect("task").expect("append should succeed");
        }

        assert_eq!(store.load().await.len(), 8);
    }
}
