//! Telegram chats that asked to receive lost-person alerts.
//!
//! The file keeps `adminChatIds`, a bare list of ids that older deployments read, next to the
//! named `subscribers`. Both are rewritten together on every change.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    store::{JsonFileStore, Repository, Store, StoreError},
    telegram::ChatId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberFile {
    #[serde(default)]
    pub subscribers: Vec<Subscriber>,
    #[serde(default)]
    pub admin_chat_ids: Vec<String>,
}

impl SubscriberFile {
    /// Adopts ids that only exist in the legacy list. Run before changing `subscribers`.
    fn adopt_legacy(&mut self) {
        for id in &self.admin_chat_ids {
            if !self.subscribers.iter().any(|s| &s.id == id) {
                self.subscribers.push(Subscriber {
                    id: id.clone(),
                    name: String::new(),
                });
            }
        }
    }

    /// Rewrites the legacy list from `subscribers`. Run after changing them.
    fn rebuild_legacy(&mut self) {
        self.admin_chat_ids = self.subscribers.iter().map(|s| s.id.clone()).collect();
    }

    fn chat_ids(&self) -> Vec<ChatId> {
        let mut ids: Vec<ChatId> = self
            .subscribers
            .iter()
            .map(|s| ChatId::new(s.id.clone()))
            .collect();

        for legacy in &self.admin_chat_ids {
            let id = ChatId::new(legacy.clone());
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        ids
    }
}

pub struct Subscribers<S = JsonFileStore<SubscriberFile>> {
    repository: Repository<S>,
}

impl Subscribers {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_store(JsonFileStore::new(path))
    }
}

impl<S: Store<Record = SubscriberFile>> Subscribers<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            repository: Repository::new(store),
        }
    }

    /// Returns false when the chat was already subscribed.
    pub async fn subscribe(&self, id: &ChatId, name: &str) -> Result<bool, StoreError> {
        self.repository
            .update(|file| {
                file.adopt_legacy();
                if file.subscribers.iter().any(|s| s.id == id.as_str()) {
                    file.rebuild_legacy();
                    return false;
                }

                file.subscribers.push(Subscriber {
                    id: id.to_string(),
                    name: name.to_string(),
                });
                file.rebuild_legacy();
                true
            })
            .await
    }

    /// Returns false when the chat was not subscribed.
    pub async fn unsubscribe(&self, id: &ChatId) -> Result<bool, StoreError> {
        self.repository
            .update(|file| {
                file.adopt_legacy();
                let before = file.subscribers.len();
                file.subscribers.retain(|s| s.id != id.as_str());
                file.rebuild_legacy();
                file.subscribers.len() != before
            })
            .await
    }

    pub async fn chat_ids(&self) -> Vec<ChatId> {
        self.repository.load().await.chat_ids()
    }

    pub async fn list(&self) -> Vec<Subscriber> {
        let mut file = self.repository.load().await;
        file.adopt_legacy();
        file.subscribers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_subscribe_keeps_legacy_ids_in_sync() {
        let store = MemoryStore::new(SubscriberFile::default());
        let subscribers = Subscribers::with_store(store);

        assert!(subscribers.subscribe(&ChatId::new("1"), "Ana").await.unwrap());
        assert!(!subscribers.subscribe(&ChatId::new("1"), "Ana").await.unwrap());
        assert!(subscribers.subscribe(&ChatId::new("2"), "Luis").await.unwrap());

        let file = subscribers.repository.load().await;
        assert_eq!(file.admin_chat_ids, vec!["1", "2"]);
        assert_eq!(file.subscribers[1].name, "Luis");
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let subscribers = Subscribers::with_store(MemoryStore::new(SubscriberFile::default()));

        subscribers.subscribe(&ChatId::new("1"), "Ana").await.unwrap();
        assert!(subscribers.unsubscribe(&ChatId::new("1")).await.unwrap());
        assert!(!subscribers.unsubscribe(&ChatId::new("1")).await.unwrap());
        assert!(subscribers.chat_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_drops_id_from_legacy_list() {
        let subscribers = Subscribers::with_store(MemoryStore::new(SubscriberFile::default()));

        subscribers.subscribe(&ChatId::new("1"), "Ana").await.unwrap();
        subscribers.subscribe(&ChatId::new("2"), "Luis").await.unwrap();
        assert!(subscribers.unsubscribe(&ChatId::new("1")).await.unwrap());

        let file = subscribers.repository.load().await;
        assert_eq!(file.admin_chat_ids, vec!["2"]);
        assert_eq!(file.subscribers.len(), 1);
        assert_eq!(subscribers.chat_ids().await, vec![ChatId::new("2")]);
    }

    #[tokio::test]
    async fn test_legacy_only_file() {
        let legacy = SubscriberFile {
            subscribers: Vec::new(),
            admin_chat_ids: vec!["10".to_string(), "11".to_string()],
        };
        let subscribers = Subscribers::with_store(MemoryStore::new(legacy));

        assert_eq!(
            subscribers.chat_ids().await,
            vec![ChatId::new("10"), ChatId::new("11")]
        );

        assert!(subscribers.unsubscribe(&ChatId::new("10")).await.unwrap());
        assert_eq!(subscribers.list().await.len(), 1);
        assert_eq!(subscribers.repository.load().await.admin_chat_ids, vec!["11"]);
    }
}
