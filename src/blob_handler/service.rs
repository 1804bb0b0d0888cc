//! # 转换会话（调用方状态机）
//!
//! ## 设计思路
//!
//! 转换器本身不维护“当前句柄”，这一约束属于调用方。`ConversionSession`
//! 把界面层的使用方式固化下来：
//!
//! ```text
//! Empty ──begin──▶ Loading ──成功──▶ Ready
//!   ▲                 │                │
//!   └──────失败───────┘◀────begin──────┘（先释放旧句柄）
//! ```
//!
//! ## 实现思路
//!
//! - 每次 `begin` 递增代号并发放 `ConversionTicket`，只有最新代号的结果会生效。
//! - 被后来者取代的成功结果立即释放，失败结果直接丢弃，避免“最后完成者覆盖”。
//! - `clear` 与 `Drop` 都会释放存活句柄。
//! - 锁不跨 `await` 持有，转换期间其它调用不受阻塞。

use std::sync::{Arc, Mutex, MutexGuard};

use super::{BlobConverter, BlobError, LocalFile, validate_url_input};
use crate::error::AppError;

/// 会话状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Loading,
    Ready(String),
}

/// 一次转换的代号凭证。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionTicket(u64);

/// 转换结果对会话的影响。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// 结果已生效，会话进入 `Ready`。
    Applied(String),
    /// 已有更新的转换开始，本次结果被丢弃（句柄已释放）。
    Superseded,
}

struct SessionInner {
    state: SessionState,
    generation: u64,
}

/// 单用户转换会话，同一时刻至多一个存活句柄。
pub struct ConversionSession {
    converter: Arc<BlobConverter>,
    inner: Mutex<SessionInner>,
}

impl ConversionSession {
    pub fn new(converter: Arc<BlobConverter>) -> Self {
        Self {
            converter,
            inner: Mutex::new(SessionInner {
                state: SessionState::Empty,
                generation: 0,
            }),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> SessionState {
        self.lock_inner().state.clone()
    }

    /// 当前存活句柄。
    pub fn handle(&self) -> Option<String> {
        match &self.lock_inner().state {
            SessionState::Ready(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.lock_inner().state, SessionState::Loading)
    }

    /// 开始新的转换：释放旧句柄，进入 `Loading`。
    pub fn begin(&self) -> ConversionTicket {
        let mut inner = self.lock_inner();
        if let SessionState::Ready(previous) = &inner.state {
            self.converter.revoke_blob(previous);
        }

        inner.generation = inner.generation.wrapping_add(1);
        inner.state = SessionState::Loading;
        ConversionTicket(inner.generation)
    }

    /// 提交转换结果。
    ///
    /// 过期凭证的结果不会改变会话状态；若是成功结果，其句柄会被立即释放。
    pub fn complete(
        &self,
        ticket: ConversionTicket,
        result: Result<String, BlobError>,
    ) -> Result<SessionOutcome, BlobError> {
        let mut inner = self.lock_inner();

        if ticket.0 != inner.generation {
            match result {
                Ok(stale) => {
                    log::debug!("🔁 转换结果已被新请求取代，释放过期句柄");
                    self.converter.revoke_blob(&stale);
                }
                Err(err) => log::debug!("🔁 过期转换失败，忽略：{}", err),
            }
            return Ok(SessionOutcome::Superseded);
        }

        match result {
            Ok(handle) => {
                inner.state = SessionState::Ready(handle.clone());
                Ok(SessionOutcome::Applied(handle))
            }
            Err(err) => {
                log::warn!("⚠️ 图片转换失败：{}", err);
                inner.state = SessionState::Empty;
                Err(err)
            }
        }
    }

    /// 本地文件转换的完整流程：begin → 转换 → complete。
    pub async fn convert_file(&self, file: LocalFile) -> Result<SessionOutcome, BlobError> {
        let ticket = self.begin();
        let result = self.converter.file_to_blob(file).await;
        self.complete(ticket, result)
    }

    /// 远程 URL 转换的完整流程。调用前应先用 `validate_url_input` 校验输入。
    pub async fn convert_url(&self, url: &str) -> Result<SessionOutcome, BlobError> {
        let ticket = self.begin();
        let result = self.converter.url_to_blob(url).await;
        self.complete(ticket, result)
    }

    /// 提交用户输入的 URL：先校验，校验不通过时不改变会话状态。
    pub async fn submit_url(&self, input: &str) -> Result<SessionOutcome, AppError> {
        let url = validate_url_input(input)?;
        Ok(self.convert_url(url).await?)
    }

    /// 清空会话：释放存活句柄，并让进行中的转换失效。
    pub fn clear(&self) {
        let mut inner = self.lock_inner();
        if let SessionState::Ready(handle) = &inner.state {
            self.converter.revoke_blob(handle);
        }

        inner.generation = inner.generation.wrapping_add(1);
        inner.state = SessionState::Empty;
    }
}

impl Drop for ConversionSession {
    fn drop(&mut self) {
        let inner = match self.inner.get_mut() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let SessionState::Ready(handle) = &inner.state {
            self.converter.revoke_blob(handle);
        }
    }
}
