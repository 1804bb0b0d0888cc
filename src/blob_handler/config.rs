//! # 配置模块
//!
//! ## 设计思路
//!
//! 转换工具本身不做重试、不设总超时，因此可调项很少：
//! 注册表来源（origin）、传输层自身的连接/请求超时、重定向上限、请求头。
//! 集中到 `BlobConfig`，便于测试时注入、运行时从 JSON 读取。
//!
//! ## 实现思路
//!
//! - `Default` 提供开箱可用的配置，`request_timeout_secs` 默认关闭。
//! - `#[serde(default)]` 允许 JSON 只写需要覆盖的字段。
//! - `validate` 在加载时尽早拒绝非法组合，错误统一为 `AppError::Config`。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 无法确定媒体类型时使用的兜底值。
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// 图片转 Blob URL 的配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    /// 注册表生成句柄时使用的来源，句柄形如 `blob:<origin>/<uuid>`。
    pub origin: String,
    /// 建立连接（TCP/TLS）超时时间（秒）。
    pub connect_timeout_secs: u64,
    /// 整体请求超时（秒）；`None` 表示不额外限制，交给传输层。
    pub request_timeout_secs: Option<u64>,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 请求时携带的 User-Agent。
    pub user_agent: String,
    /// 声明类型为空时写入 data URL 的媒体类型。
    pub fallback_media_type: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: None,
            max_redirects: 10,
            user_agent: concat!("image-blob-url/", env!("CARGO_PKG_VERSION")).to_string(),
            fallback_media_type: DEFAULT_MEDIA_TYPE.to_string(),
        }
    }
}

impl BlobConfig {
    /// 从 JSON 字符串解析配置，缺失字段使用默认值。
    ///
    /// # 示例
    /// ```rust
    /// use image_blob_url::blob_handler::BlobConfig;
    ///
    /// let config = BlobConfig::from_json_str(r#"{ "origin": "https://app.example" }"#)?;
    /// assert_eq!(config.origin, "https://app.example");
    /// # Ok::<(), image_blob_url::error::AppError>(())
    /// ```
    pub fn from_json_str(content: &str) -> Result<Self, AppError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| AppError::Config(format!("解析配置失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件读取配置。
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// 校验配置取值范围。
    pub fn validate(&self) -> Result<(), AppError> {
        let origin = reqwest::Url::parse(&self.origin)
            .map_err(|e| AppError::Config(format!("origin 格式错误：{}", e)))?;
        if origin.scheme() != "http" && origin.scheme() != "https" {
            return Err(AppError::Config("origin 仅支持 http/https".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout_secs) {
            return Err(AppError::Config("connect_timeout_secs 必须在 1~120 秒之间".to_string()));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(AppError::Config("request_timeout_secs 不能为 0".to_string()));
        }
        if self.max_redirects > 20 {
            return Err(AppError::Config("max_redirects 不能超过 20".to_string()));
        }
        if self.fallback_media_type.trim().is_empty() {
            return Err(AppError::Config("fallback_media_type 不能为空".to_string()));
        }

        Ok(())
    }

    /// 去掉末尾 `/` 的 origin，用于拼接句柄。
    pub(crate) fn normalized_origin(&self) -> &str {
        self.origin.trim_end_matches('/')
    }

    pub(crate) fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub(crate) fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
