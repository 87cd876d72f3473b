use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::{JsonFileStore, Repository, Store, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitorLogFile {
    #[serde(default)]
    pub logs: Vec<Value>,
}

/// Website visit entries, newest first.
pub struct VisitorLogs<S = JsonFileStore<VisitorLogFile>> {
    repository: Repository<S>,
}

impl VisitorLogs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_store(JsonFileStore::new(path))
    }
}

impl<S: Store<Record = VisitorLogFile>> VisitorLogs<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            repository: Repository::new(store),
        }
    }

    /// Stamps the entry with `serverTimestamp` and puts it at the front.
    pub async fn add(&self, mut entry: Map<String, Value>) -> Result<(), StoreError> {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        entry.insert("serverTimestamp".to_string(), Value::String(stamp));

        self.repository
            .update(|file| file.logs.insert(0, Value::Object(entry)))
            .await
    }

    pub async fn all(&self) -> Vec<Value> {
        self.repository.load().await.logs
    }
}
