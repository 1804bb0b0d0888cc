//! # 图片转 Blob URL 模块（blob_handler）
//!
//! ## 设计思路
//!
//! 该模块把“读取字节 → 编码 → 得到可引用句柄 → 用完释放”按职责拆分，
//! 界面层（拖拽上传、标签页、复制按钮）只调用这里的少量入口。
//!
//! - `validate`：URL 预校验（纯函数）
//! - `handler`：`BlobConverter`，三个核心操作
//! - `loader`：本地读取、网络下载、data URL 编解码
//! - `registry`：对象 URL 注册表能力（可注入）
//! - `service`：调用方会话状态机（Empty / Loading / Ready）
//! - `config/error/source`：配置、错误、输入与中间模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 界面层
//!    ↓
//! service.rs（会话：释放旧句柄、丢弃过期结果）
//!    ↓
//! handler.rs（file_to_blob / url_to_blob / revoke_blob）
//!    ├─ loader.rs（读取 / 下载 / 编码）
//!    └─ registry.rs（登记 / 释放 / 解引用）
//!    ↓
//! 返回 BlobError 给调用方
//! ```

mod config;
mod error;
mod handler;
mod loader;
mod registry;
mod service;
mod source;
mod validate;

pub use config::{BlobConfig, DEFAULT_MEDIA_TYPE};
pub use error::BlobError;
pub use handler::BlobConverter;
pub use registry::{BlobRegistry, InMemoryBlobRegistry};
pub use service::{ConversionSession, ConversionTicket, SessionOutcome, SessionState};
pub use source::{BLOB_URL_PREFIX, Blob, DATA_URL_PREFIX, HandleKind, LocalFile};
pub use validate::{UrlInputError, is_valid_url, validate_url_input};
