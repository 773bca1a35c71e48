// 本地持久化：持久存储（跨重启）与会话存储（进程生命周期）

pub mod file;
pub mod memory;

use std::sync::Arc;

use crate::error::AppResult;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// 存储中使用的键
pub mod keys {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const USER: &str = "user";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// 浏览器重启后仍然保留
    Durable,
    /// 会话结束即清空
    Session,
}

pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> StorageKind;
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// 两级存储。登录时按"记住我"选择一级，之后通过探测令牌所在位置判断当前使用的是哪一级
#[derive(Clone)]
pub struct SessionStorages {
    pub durable: Arc<dyn StorageBackend>,
    pub session: Arc<dyn StorageBackend>,
}

impl SessionStorages {
    pub fn new(durable: Arc<dyn StorageBackend>, session: Arc<dyn StorageBackend>) -> Self {
        Self { durable, session }
    }

    /// 两级都放在内存里
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStorage::new(StorageKind::Durable)),
            Arc::new(MemoryStorage::new(StorageKind::Session)),
        )
    }

    pub fn select(&self, remember_me: bool) -> &Arc<dyn StorageBackend> {
        if remember_me { &self.durable } else { &self.session }
    }

    pub fn other(&self, kind: StorageKind) -> &Arc<dyn StorageBackend> {
        match kind {
            StorageKind::Durable => &self.session,
            StorageKind::Session => &self.durable,
        }
    }

    /// 当前持有令牌的存储，先查持久存储
    pub fn active(&self) -> Option<&Arc<dyn StorageBackend>> {
        [&self.durable, &self.session].into_iter().find(|backend| {
            backend.contains(keys::ACCESS_TOKEN) || backend.contains(keys::REFRESH_TOKEN)
        })
    }

    pub fn both(&self) -> [&Arc<dyn StorageBackend>; 2] {
        [&self.durable, &self.session]
    }
}
