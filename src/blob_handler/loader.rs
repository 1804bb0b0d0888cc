//! # 加载与编码模块
//!
//! ## 设计思路
//!
//! 两条转换路径各自负责“拿到字节”：
//! - 本地文件：读取全部字节后编码为 `data:` 内联句柄，不占用注册表。
//! - 远程 URL：`GET` 拉取二进制内容，交给注册表换取 `blob:` 句柄。
//!
//! ## 实现思路
//!
//! - 本地读取统一走 tokio 异步 I/O，读取失败映射为 `BlobError::Read`。
//! - 不做体积限制：大文件会得到同样大的编码结果，这是已知边界。
//! - 网络错误按“是否已收到响应”分类：未收到为 `Network`，非 2xx 为 `Http`。
//! - 不重试，不回退，失败只作用于本次转换。

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use tokio::io::AsyncReadExt;

use super::config::BlobConfig;
use super::source::{Blob, DATA_URL_PREFIX, LocalContent, LocalFile};
use super::{BlobConverter, BlobError};

const BASE64_MARKER: &str = ";base64,";
const ACCEPT_BINARY: &str = "image/*,*/*;q=0.8";

impl BlobConverter {
    /// 读取本地文件全部字节，并确定写入句柄的媒体类型。
    pub(super) async fn read_local_file(
        &self,
        file: LocalFile,
    ) -> Result<(Bytes, String), BlobError> {
        let LocalFile {
            name,
            media_type,
            content,
        } = file;

        log::info!("📁 开始读取本地图片 - 文件: {}", name.as_deref().unwrap_or("<memory>"));

        let bytes = match content {
            LocalContent::Bytes(bytes) => bytes,
            LocalContent::Reader(mut reader) => {
                let mut buffer = Vec::new();
                reader
                    .read_to_end(&mut buffer)
                    .await
                    .map_err(|e| BlobError::Read(format!("无法读取文件内容：{}", e)))?;
                Bytes::from(buffer)
            }
            LocalContent::Path(path) => {
                let buffer = tokio::fs::read(&path).await.map_err(|e| {
                    BlobError::Read(format!("无法读取图片文件 {}：{}", path.display(), e))
                })?;
                Bytes::from(buffer)
            }
        };

        let media_type = match media_type {
            Some(declared) => Self::declared_media_type(&declared, &self.config),
            None => Self::sniff_media_type(&bytes)
                .map(str::to_string)
                .unwrap_or_else(|| self.config.fallback_media_type.clone()),
        };

        log::debug!("✅ 读取完成 - {} bytes type={}", bytes.len(), media_type);
        Ok((bytes, media_type))
    }

    /// 从 URL 拉取二进制内容。
    pub(super) async fn fetch_url(&self, url: &str) -> Result<Blob, BlobError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| BlobError::Conversion(format!("URL 格式错误：{}", e)))?;

        log::info!("🌐 开始下载图片 - URL: {}", Self::redact_url_for_log(url));

        let response = self
            .client
            .get(parsed)
            .header(reqwest::header::ACCEPT, ACCEPT_BINARY)
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, url))?;

        let status = response.status();
        if !status.is_success() {
            log::warn!(
                "⚠️ 下载失败 - HTTP {} URL: {}",
                status.as_u16(),
                Self::redact_url_for_log(url)
            );
            return Err(BlobError::Http {
                status: status.as_u16(),
                reason: Self::status_reason(status),
            });
        }

        let header_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .and_then(Self::content_type_essence);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_reqwest_error(e, url))?;

        let content_type = header_type
            .or_else(|| Self::sniff_media_type(&bytes).map(str::to_string))
            .unwrap_or_default();

        log::debug!("✅ 下载完成 - {} bytes type={:?}", bytes.len(), content_type);
        Ok(Blob::new(bytes, content_type))
    }

    /// 编码为 `data:<type>;base64,<payload>`。
    pub fn encode_data_url(media_type: &str, bytes: &[u8]) -> String {
        let payload = general_purpose::STANDARD.encode(bytes);
        let mut url = String::with_capacity(
            DATA_URL_PREFIX.len() + media_type.len() + BASE64_MARKER.len() + payload.len(),
        );
        url.push_str(DATA_URL_PREFIX);
        url.push_str(media_type);
        url.push_str(BASE64_MARKER);
        url.push_str(&payload);
        url
    }

    /// 将内联句柄还原为 `(媒体类型, 原始字节)`。
    ///
    /// # 示例
    /// ```rust
    /// use image_blob_url::blob_handler::BlobConverter;
    ///
    /// let (media_type, bytes) = BlobConverter::parse_data_url("data:image/png;base64,AQID")?;
    /// assert_eq!(media_type, "image/png");
    /// assert_eq!(bytes, vec![1, 2, 3]);
    /// # Ok::<(), image_blob_url::blob_handler::BlobError>(())
    /// ```
    pub fn parse_data_url(handle: &str) -> Result<(String, Vec<u8>), BlobError> {
        let rest = handle
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or_else(|| BlobError::Conversion("不是 data URL".to_string()))?;

        let marker = rest
            .find(BASE64_MARKER)
            .ok_or_else(|| BlobError::Conversion("缺少 base64 标记".to_string()))?;

        let media_type = rest[..marker].to_string();
        let payload = &rest[marker + BASE64_MARKER.len()..];

        let bytes = general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| BlobError::Conversion(format!("Base64 解码失败：{}", e)))?;

        Ok((media_type, bytes))
    }

    fn declared_media_type(declared: &str, config: &BlobConfig) -> String {
        let trimmed = declared.trim();
        if trimmed.is_empty() {
            config.fallback_media_type.clone()
        } else {
            trimmed.to_string()
        }
    }

    /// 通过文件签名（magic bytes）推断媒体类型。
    fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
        infer::get(bytes).map(|kind| kind.mime_type())
    }

    /// 取 `Content-Type` 的主体部分（去掉参数并转小写）。
    fn content_type_essence(content_type: &str) -> Option<String> {
        content_type
            .split(';')
            .next()
            .map(|base| base.trim().to_ascii_lowercase())
            .filter(|base| !base.is_empty())
    }

    /// 固定使用状态码对应的标准短语，不透传服务端自定义的 reason 文案。
    fn status_reason(status: reqwest::StatusCode) -> String {
        status
            .canonical_reason()
            .unwrap_or("Unknown Status")
            .to_string()
    }

    /// 统一映射 reqwest 错误到业务错误。
    fn map_reqwest_error(e: reqwest::Error, url: &str) -> BlobError {
        let err_msg = Self::sanitize_error_message_with_redacted_url(&e.to_string(), url);

        if e.is_builder() {
            BlobError::Conversion(format!("无法构建请求：{}", err_msg))
        } else if e.is_timeout() {
            BlobError::Network(format!("请求超时：{}", err_msg))
        } else if e.is_connect() {
            BlobError::Network(format!("无法连接：{}", err_msg))
        } else if e.is_redirect() {
            BlobError::Network(format!("重定向失败：{}", err_msg))
        } else {
            BlobError::Network(format!("请求失败：{}", err_msg))
        }
    }

    pub(crate) fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = parsed.path();

        format!("{}://{}{}{}", parsed.scheme(), host, port, path)
    }

    fn sanitize_error_message_with_redacted_url(error_msg: &str, url: &str) -> String {
        let redacted = Self::redact_url_for_log(url);
        error_msg.replace(url, &redacted)
    }
}
