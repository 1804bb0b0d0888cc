//! # 图片转 Blob URL 工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │        界面层（拖拽上传 / URL 输入 / 复制按钮）           │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ Result<_, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │  ┌─ error ────── AppError (对外统一错误类型)              │
//! │  │                                                       │
//! │  └─ blob_handler                                         │
//! │      ├─ service    ConversionSession 会话状态机          │
//! │      ├─ handler    BlobConverter 三个核心操作            │
//! │      ├─ loader     本地读取 · 网络下载 · data URL 编码     │
//! │      ├─ registry   BlobRegistry 注册表能力（可注入）     │
//! │      └─ validate   URL 预校验                           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，对外边界的返回类型 |
//! | [`blob_handler`] | 本地文件 / 远程 URL 转句柄、释放句柄、URL 校验 |
//!
//! ## 句柄形态
//!
//! - `data:<type>;base64,...`：内容内联，无需释放
//! - `blob:<origin>/<uuid>`：内容在注册表中，用完调用 `revoke_blob`

pub mod blob_handler;
pub mod error;
