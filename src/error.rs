//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 库内各模块有自己的错误枚举，对外边界（界面层 / IPC）统一收敛为 `AppError`，
//! 通过 `Serialize` 输出为人类可读字符串。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `BlobError`、`std::io::Error` 提供 `From` 转换，无需手动 map。

use serde::Serialize;

use crate::blob_handler::{BlobError, UrlInputError};

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 转换失败（读取 / 网络 / HTTP / 其它）
    #[error("{0}")]
    Blob(#[from] BlobError),

    /// 用户输入的 URL 未通过预校验
    #[error("{0}")]
    Input(#[from] UrlInputError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置无效
    #[error("配置错误: {0}")]
    Config(String),
}

/// 对外边界要求返回值实现 `Serialize`，将错误序列化为字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
