//! 竞争情报分析流水线
//!
//! 固定的五阶段顺序执行：Router（路由）→ Hunter（发现）→ Scraper（整理）
//! → Analyst（分析）→ Reporter（报告）。驱动方持有审计序列，
//! 把每个阶段的类型化产物向后传递。

use anyhow::Result;

use crate::pipeline::audit::LogEntry;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::StageError;
use crate::pipeline::stages::{
    AnalystStage, HunterStage, PipelineStage, ReporterInput, ReporterStage, RouterStage,
    ScraperStage,
};
use crate::pipeline::types::{ExtractedContent, Report, RoutingDecision, SourceRecord, SwotAnalysis};

pub mod audit;
pub mod context;
pub mod error;
pub mod stages;
pub mod types;

/// 一次完整流水线运行的产物链与审计序列
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub decision: RoutingDecision,
    pub sources: Vec<SourceRecord>,
    pub content: ExtractedContent,
    pub analysis: SwotAnalysis,
    pub report: Report,
    /// 按阶段顺序追加的审计条目，归驱动方所有
    pub logs: Vec<LogEntry>,
}

/// 启动一次竞争情报分析流程
///
/// Reporter之前任何未恢复的失败都会整体中止本次运行（不拼装部分报告），
/// 只有Reporter保证无论自身成败都向前推进。
pub async fn launch(query: &str, context: &PipelineContext) -> Result<PipelineRun> {
    println!("🚀 开始执行RivalScope竞争情报分析流程...");
    let mut logs: Vec<LogEntry> = Vec::new();

    println!("🤖 执行 Router 路由阶段...");
    let decision = match RouterStage.run(query.to_string(), context).await {
        Ok(run) => {
            logs.push(run.log);
            run.payload
        }
        Err(error) => return Err(settle_failure(&mut logs, error, context)),
    };
    println!(
        "✓ 路由完成：{} / {}",
        decision.target_company, decision.analysis_type
    );

    println!("🤖 执行 Hunter 情报发现阶段...");
    let sources = match HunterStage.run(decision.clone(), context).await {
        Ok(run) => {
            logs.push(run.log);
            run.payload
        }
        Err(error) => return Err(settle_failure(&mut logs, error, context)),
    };
    println!("✓ 发现 {} 个情报来源", sources.len());

    println!("🤖 执行 Scraper 内容整理阶段...");
    let content = match ScraperStage.run(sources.clone(), context).await {
        Ok(run) => {
            logs.push(run.log);
            run.payload
        }
        Err(error) => return Err(settle_failure(&mut logs, error, context)),
    };

    println!("🤖 执行 Analyst SWOT分析阶段...");
    let analysis = match AnalystStage.run(content.clone(), context).await {
        Ok(run) => {
            logs.push(run.log);
            run.payload
        }
        Err(error) => return Err(settle_failure(&mut logs, error, context)),
    };
    println!("✓ 综合评分 {:.1}", analysis.scores.average());

    println!("🤖 执行 Reporter 报告生成阶段...");
    let reporter_input = ReporterInput {
        company: decision.target_company.clone(),
        analysis: analysis.clone(),
        content: content.clone(),
    };
    // Reporter永远返回成功形态的结果
    let report = match ReporterStage.run(reporter_input, context).await {
        Ok(run) => {
            logs.push(run.log);
            run.payload
        }
        Err(error) => return Err(settle_failure(&mut logs, error, context)),
    };

    println!("✓ RivalScope分析流程执行完毕");
    if context.config.verbose {
        print_audit_trail(&logs);
    }

    Ok(PipelineRun {
        decision,
        sources,
        content,
        analysis,
        report,
        logs,
    })
}

/// 记录失败阶段的审计条目并整体中止
fn settle_failure(
    logs: &mut Vec<LogEntry>,
    error: StageError,
    context: &PipelineContext,
) -> anyhow::Error {
    logs.push(error.log.clone());
    eprintln!("❌ 阶段 [{}] 失败，流程终止: {}", error.agent, error.message);
    if context.config.verbose {
        print_audit_trail(logs);
    }
    error.into()
}

/// 打印审计序列
fn print_audit_trail(logs: &[LogEntry]) {
    println!("📒 审计记录:");
    for entry in logs {
        println!(
            "   [{}] {:?} - {}ms / {} tokens / ${:.4} - {}",
            entry.agent, entry.status, entry.latency_ms, entry.token_usage, entry.cost, entry.message
        );
    }
}

// Include tests
#[cfg(test)]
mod tests;
