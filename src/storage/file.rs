use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{StorageBackend, StorageKind};
use crate::error::AppResult;

/// 持久存储：整个键值表保存为一个 JSON 文件，每次写入都整体落盘
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// 文件不存在视为空；内容损坏时同样按空处理并记录警告
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let items = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "storage file is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            items: Mutex::new(items),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn items(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(items)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Durable
    }

    fn get(&self, key: &str) -> Option<String> {
        self.items().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut items = self.items();
        items.insert(key.to_string(), value.to_string());
        self.flush(&items)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut items = self.items();
        if items.remove(key).is_some() {
            self.flush(&items)?;
        }
        Ok(())
    }
}
