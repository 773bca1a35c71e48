use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{StorageBackend, StorageKind};
use crate::error::AppResult;

/// 内存存储，默认作为会话级存储
pub struct MemoryStorage {
    kind: StorageKind,
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new(kind: StorageKind) -> Self {
        Self {
            kind,
            items: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    fn items(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorageBackend for MemoryStorage {
    fn kind(&self) -> StorageKind {
        self.kind
    }

    fn get(&self, key: &str) -> Option<String> {
        self.items().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.items().remove(key);
        Ok(())
    }
}
