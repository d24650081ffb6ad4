//! 阶段失败类型

use thiserror::Error;

use crate::pipeline::audit::{AgentKind, LogEntry};

/// 阶段执行失败
///
/// 携带该次调用产生的ERROR审计条目，确保失败路径同样留下一条记录。
/// Reporter阶段永远不会返回该错误（见其终端降级策略）。
#[derive(Debug, Error)]
#[error("阶段 [{agent}] 执行失败: {message}")]
pub struct StageError {
    /// 失败的阶段
    pub agent: AgentKind,
    /// 失败描述
    pub message: String,
    /// 本次调用的审计条目（ERROR状态）
    pub log: LogEntry,
    /// 底层错误（传输失败等），解析类失败时为None
    #[source]
    pub source: Option<anyhow::Error>,
}

impl StageError {
    pub fn new(
        agent: AgentKind,
        message: impl Into<String>,
        log: LogEntry,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            agent,
            message: message.into(),
            log,
            source,
        }
    }
}
