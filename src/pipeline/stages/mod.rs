//! 流水线的五个阶段
//!
//! 每个阶段消费上一阶段的类型化产物，恰好执行一次模型网关调用，
//! 产出自身的类型化产物与一条审计条目。阶段顺序固定，阶段间不并行。

use anyhow::Error;
use async_trait::async_trait;

use crate::pipeline::audit::{AgentKind, LogEntry, StageMeter};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::StageError;

pub mod analyst;
pub mod hunter;
pub mod reporter;
pub mod router;
pub mod scraper;

pub use analyst::AnalystStage;
pub use hunter::HunterStage;
pub use reporter::{ReporterInput, ReporterStage};
pub use router::RouterStage;
pub use scraper::ScraperStage;

/// 一次阶段执行的成果：类型化产物 + 审计条目
#[derive(Debug, Clone)]
pub struct StageRun<T> {
    pub payload: T,
    pub log: LogEntry,
}

/// 统一的阶段契约
///
/// `(类型化输入, 上下文) -> Result<(类型化输出, LogEntry), StageError>`，
/// 由外部驱动方按固定顺序串联。固定失败策略与可恢复失败策略
/// 都在各阶段内部显式表达，便于脱离网络单独测试。
#[async_trait]
pub trait PipelineStage {
    type Input: Send;
    type Output: Send;

    /// 阶段身份
    fn agent(&self) -> AgentKind;

    /// 执行阶段
    async fn run(
        &self,
        input: Self::Input,
        context: &PipelineContext,
    ) -> Result<StageRun<Self::Output>, StageError>;
}

/// 传输/服务失败：构建ERROR条目并原样上抛底层错误
pub(crate) fn gateway_failure(meter: &StageMeter, error: Error) -> StageError {
    let message = format!("模型调用失败: {}", error);
    let log = meter.failure(&message);
    StageError::new(meter.agent(), message, log, Some(error))
}

/// 结构化输出解析失败（对解析致命的阶段使用）
pub(crate) fn parse_failure(meter: &StageMeter, detail: impl Into<String>) -> StageError {
    let message = format!("结构化输出解析失败: {}", detail.into());
    let log = meter.failure(&message);
    StageError::new(meter.agent(), message, log, None)
}
