//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入”和“转换产物”解耦：
//! - `LocalFile` 表示本地选中的文件（字节 / 异步读取器 / 路径 + 声明类型）
//! - `Blob` 表示注册表中持有的内存内容
//! - `HandleKind` 区分内联句柄与注册表句柄，决定是否需要释放

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::io::AsyncRead;

/// 内联句柄前缀（内容直接编码在句柄里）。
pub const DATA_URL_PREFIX: &str = "data:";
/// 注册表句柄前缀（句柄指向注册表中的内存）。
pub const BLOB_URL_PREFIX: &str = "blob:";

/// 本地文件输入。
pub struct LocalFile {
    pub(crate) name: Option<String>,
    pub(crate) media_type: Option<String>,
    pub(crate) content: LocalContent,
}

pub(crate) enum LocalContent {
    Bytes(Bytes),
    Reader(Box<dyn AsyncRead + Send + Unpin>),
    Path(PathBuf),
}

impl LocalFile {
    /// 已在内存中的文件内容。
    pub fn from_bytes(bytes: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            name: None,
            media_type: Some(media_type.into()),
            content: LocalContent::Bytes(bytes.into()),
        }
    }

    /// 从异步读取器读取内容，读取失败时转换结果为 `BlobError::Read`。
    pub fn from_reader<R>(reader: R, media_type: impl Into<String>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            name: None,
            media_type: Some(media_type.into()),
            content: LocalContent::Reader(Box::new(reader)),
        }
    }

    /// 本地路径；未声明类型时按文件签名推断。
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            media_type: None,
            content: LocalContent::Path(path),
        }
    }

    /// 覆盖声明的媒体类型。
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// 文件名（仅用于日志）。
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }
}

/// 注册表中的内存内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Bytes,
    /// 媒体类型，未知时为空字符串。
    pub content_type: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// 句柄形态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    /// `data:` 内联句柄，无需释放。
    Inline,
    /// `blob:` 注册表句柄，用完必须释放。
    Registry,
}

impl HandleKind {
    /// 识别句柄形态；空串或未知前缀返回 `None`。
    pub fn of(handle: &str) -> Option<Self> {
        if handle.starts_with(BLOB_URL_PREFIX) {
            Some(Self::Registry)
        } else if handle.starts_with(DATA_URL_PREFIX) {
            Some(Self::Inline)
        } else {
            None
        }
    }

    pub fn needs_release(self) -> bool {
        matches!(self, Self::Registry)
    }
}
