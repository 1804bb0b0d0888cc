//! # Blob 注册表
//!
//! ## 设计思路
//!
//! 运行时的对象 URL 表是调用方可见的外部资源：创建与释放两个原语已经足够小，
//! 这里不再额外包装，只把它抽成 `BlobRegistry` 能力接口，由调用方注入，
//! 避免隐藏的全局单例，测试也能直接观察注册表状态。
//!
//! ## 实现思路
//!
//! - `InMemoryBlobRegistry` 用 `Mutex<HashMap>` 保存内容，句柄为 `blob:<origin>/<uuid>`。
//! - 每次释放互不影响，只作用于自己的句柄；重复释放返回 `false`，不报错。

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use super::source::{BLOB_URL_PREFIX, Blob};
use super::{BlobConfig, BlobError};

/// 对象 URL 注册表能力。
pub trait BlobRegistry: Send + Sync {
    /// 登记内容并返回新句柄。
    fn create_object_url(&self, blob: Blob) -> Result<String, BlobError>;

    /// 忘记句柄对应的内容；确有内容被移除时返回 `true`。
    fn revoke_object_url(&self, url: &str) -> bool;

    /// 解引用句柄；已释放或从未登记时返回 `None`。
    fn resolve(&self, url: &str) -> Option<Blob>;

    /// 当前仍存活的句柄数量。
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 进程内注册表实现。
pub struct InMemoryBlobRegistry {
    origin: String,
    entries: Mutex<HashMap<String, Blob>>,
}

impl InMemoryBlobRegistry {
    /// # 示例
    /// ```rust
    /// use image_blob_url::blob_handler::{Blob, BlobRegistry, InMemoryBlobRegistry};
    ///
    /// let registry = InMemoryBlobRegistry::new("https://app.example");
    /// let handle = registry.create_object_url(Blob::new(vec![1_u8, 2, 3], "image/png"))?;
    /// assert!(handle.starts_with("blob:https://app.example/"));
    /// assert!(registry.revoke_object_url(&handle));
    /// assert!(registry.resolve(&handle).is_none());
    /// # Ok::<(), image_blob_url::blob_handler::BlobError>(())
    /// ```
    pub fn new(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 使用配置中的 origin 创建注册表。
    pub fn from_config(config: &BlobConfig) -> Self {
        Self::new(config.normalized_origin())
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// 当前登记内容占用的总字节数。
    pub fn total_bytes(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.values().map(Blob::size).sum(),
            Err(_) => 0,
        }
    }
}

impl Default for InMemoryBlobRegistry {
    fn default() -> Self {
        Self::new("http://localhost")
    }
}

impl BlobRegistry for InMemoryBlobRegistry {
    fn create_object_url(&self, blob: Blob) -> Result<String, BlobError> {
        let url = format!("{}{}/{}", BLOB_URL_PREFIX, self.origin, Uuid::new_v4());
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| BlobError::Conversion("注册表锁已中毒".to_string()))?;

        log::debug!(
            "🧩 登记 Blob - size={} bytes type={:?}",
            blob.size(),
            blob.content_type
        );
        entries.insert(url.clone(), blob);
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) -> bool {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::warn!("⚠️ 注册表锁已中毒，跳过释放");
                return false;
            }
        };

        entries.remove(url).is_some()
    }

    fn resolve(&self, url: &str) -> Option<Blob> {
        let entries = self.entries.lock().ok()?;
        entries.get(url).cloned()
    }

    fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(_) => 0,
        }
    }
}
