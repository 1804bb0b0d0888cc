//! # 核心转换器
//!
//! ## 设计思路
//!
//! `BlobConverter` 只负责把输入变成句柄、把句柄交还注册表，不关心界面状态。
//! 注册表作为能力参数注入（`Arc<dyn BlobRegistry>`），不依赖隐藏的全局表。
//!
//! 三个操作：
//! 1. `file_to_blob`：本地文件 → `data:` 内联句柄
//! 2. `url_to_blob`：远程 URL → `blob:` 注册表句柄
//! 3. `revoke_blob`：释放注册表句柄，其它输入一律忽略
//!
//! ## 实现思路
//!
//! - 回调式完成改为单个 `async fn`，只有一次成功或一次失败。
//! - HTTP 客户端在构造时创建并复用。
//! - 记录 `load/register/total` 阶段耗时，便于诊断。

use std::sync::Arc;
use std::time::Instant;

use super::source::HandleKind;
use super::{BlobConfig, BlobError, BlobRegistry, LocalFile};

/// 图片 → Blob URL 转换器。
pub struct BlobConverter {
    pub(super) registry: Arc<dyn BlobRegistry>,
    pub(super) config: BlobConfig,
    pub(super) client: reqwest::Client,
}

impl BlobConverter {
    /// 使用默认配置创建转换器。
    ///
    /// # 示例
    /// ```rust
    /// use std::sync::Arc;
    /// use image_blob_url::blob_handler::{BlobConverter, InMemoryBlobRegistry};
    ///
    /// let converter = BlobConverter::new(Arc::new(InMemoryBlobRegistry::default()))?;
    /// # Ok::<(), image_blob_url::blob_handler::BlobError>(())
    /// ```
    pub fn new(registry: Arc<dyn BlobRegistry>) -> Result<Self, BlobError> {
        Self::with_config(registry, BlobConfig::default())
    }

    /// 使用自定义配置创建转换器。
    pub fn with_config(
        registry: Arc<dyn BlobRegistry>,
        config: BlobConfig,
    ) -> Result<Self, BlobError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str());

        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| BlobError::Conversion(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            registry,
            config,
            client,
        })
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    /// 注入的注册表，调用方可据此观察句柄是否仍然有效。
    pub fn registry(&self) -> &Arc<dyn BlobRegistry> {
        &self.registry
    }

    /// 本地文件 → 内联句柄。
    ///
    /// 内容直接编码进句柄，不占用注册表，因此无需释放。
    ///
    /// # 示例
    /// ```rust
    /// use std::sync::Arc;
    /// use image_blob_url::blob_handler::{BlobConverter, InMemoryBlobRegistry, LocalFile};
    ///
    /// # async fn demo() -> Result<(), image_blob_url::blob_handler::BlobError> {
    /// let converter = BlobConverter::new(Arc::new(InMemoryBlobRegistry::default()))?;
    /// let handle = converter
    ///     .file_to_blob(LocalFile::from_bytes(vec![0xFF_u8, 0xD8, 0xFF], "image/jpeg"))
    ///     .await?;
    /// assert!(handle.starts_with("data:image/jpeg;base64,"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn file_to_blob(&self, file: LocalFile) -> Result<String, BlobError> {
        let total_start = Instant::now();

        let (bytes, media_type) = self.read_local_file(file).await?;
        let handle = Self::encode_data_url(&media_type, &bytes);

        log::info!(
            "✅ 本地图片转换完成 - type={} input={}KB output={}KB total={}ms",
            media_type,
            bytes.len() / 1024,
            handle.len() / 1024,
            total_start.elapsed().as_millis()
        );

        Ok(handle)
    }

    /// 远程 URL → 注册表句柄。
    ///
    /// 成功后内容常驻注册表，直到调用 [`BlobConverter::revoke_blob`]。
    /// 任何失败都不会登记内容。
    pub async fn url_to_blob(&self, url: &str) -> Result<String, BlobError> {
        let total_start = Instant::now();

        let load_start = Instant::now();
        let blob = self.fetch_url(url).await?;
        let load_elapsed = load_start.elapsed();
        let size = blob.size();

        let register_start = Instant::now();
        let handle = self.registry.create_object_url(blob)?;
        let register_elapsed = register_start.elapsed();

        log::info!(
            "✅ URL 图片转换完成 - size={}KB load={}ms register={}ms total={}ms",
            size / 1024,
            load_elapsed.as_millis(),
            register_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(handle)
    }

    /// 释放句柄。
    ///
    /// 只有 `blob:` 注册表句柄会真正释放；内联句柄与空串直接忽略。
    /// 重复释放不会报错，第二次调用只是找不到内容。
    pub fn revoke_blob(&self, handle: &str) {
        if handle.is_empty() {
            return;
        }

        match HandleKind::of(handle) {
            Some(kind) if kind.needs_release() => {
                if self.registry.revoke_object_url(handle) {
                    log::debug!("🗑️ 已释放 Blob 句柄");
                } else {
                    log::debug!("句柄已失效或从未登记，忽略释放");
                }
            }
            _ => {}
        }
    }
}
