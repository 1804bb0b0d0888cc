//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 一次转换只会以一种方式失败，因此用单一枚举承载所有失败来源，
//! 调用侧按分支匹配决定提示文案，错误只作用于当前这一次转换。
//!
//! - `Read`：本地读取失败（不可读、I/O 故障）
//! - `Network`：尚未收到响应就已失败的传输错误
//! - `Http`：收到响应但状态码不是 2xx
//! - `Conversion`：准备阶段或其他意外失败
//!
//! URL 校验失败不属于这里：校验器只返回 `false`，由调用方决定如何提示。

/// 图片转换统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("读取错误：{0}")]
    Read(String),

    #[error("网络错误：{0}")]
    Network(String),

    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("转换错误：{0}")]
    Conversion(String),
}

impl BlobError {
    /// 若为 HTTP 错误，返回其状态码。
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
