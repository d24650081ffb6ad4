//! 阶段审计记录 - 统一的日志条目与计量器
//!
//! 每次阶段调用（无论成败）恰好产生一条LogEntry，追加到由流水线驱动方
//! 持有的审计序列中，各阶段自身不持有日志序列。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::llm::client::types::UsageMetadata;
use crate::llm::pricing::estimate_cost;

/// 流水线阶段身份标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentKind {
    #[serde(rename = "ROUTER")]
    Router,
    #[serde(rename = "HUNTER")]
    Hunter,
    #[serde(rename = "SCRAPER")]
    Scraper,
    #[serde(rename = "ANALYST")]
    Analyst,
    #[serde(rename = "REPORTER")]
    Reporter,
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentKind::Router => write!(f, "ROUTER"),
            AgentKind::Hunter => write!(f, "HUNTER"),
            AgentKind::Scraper => write!(f, "SCRAPER"),
            AgentKind::Analyst => write!(f, "ANALYST"),
            AgentKind::Reporter => write!(f, "REPORTER"),
        }
    }
}

/// 阶段执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "ERROR")]
    Error,
}

/// 一次阶段调用的审计条目，创建后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// ISO-8601时间戳
    pub timestamp: DateTime<Utc>,
    /// 阶段身份
    pub agent: AgentKind,
    /// 人类可读信息
    pub message: String,
    /// 执行状态
    pub status: StageStatus,
    /// 耗时（毫秒）
    pub latency_ms: u64,
    /// token使用总量
    pub token_usage: u64,
    /// 估算成本（美元）
    pub cost: f64,
}

/// 阶段计量器
///
/// 在阶段开始时启动计时，结束时把原始的耗时/响应数据收敛成LogEntry，
/// 成本估算委托给定价模块。
pub struct StageMeter {
    agent: AgentKind,
    started: Instant,
}

impl StageMeter {
    /// 开始对一个阶段调用计时
    pub fn start(agent: AgentKind) -> Self {
        Self {
            agent,
            started: Instant::now(),
        }
    }

    pub fn agent(&self) -> AgentKind {
        self.agent
    }

    /// 构建成功条目，耗时取自计时器，成本由模型定价推算
    pub fn success(
        &self,
        message: impl Into<String>,
        model: &str,
        usage: Option<&UsageMetadata>,
    ) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            agent: self.agent,
            message: message.into(),
            status: StageStatus::Success,
            latency_ms: self.started.elapsed().as_millis() as u64,
            token_usage: usage.map(UsageMetadata::total_tokens).unwrap_or(0),
            cost: estimate_cost(model, usage),
        }
    }

    /// 构建失败条目，计量字段全部归零
    pub fn failure(&self, message: impl Into<String>) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            agent: self.agent,
            message: message.into(),
            status: StageStatus::Error,
            latency_ms: 0,
            token_usage: 0,
            cost: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_entry_accounting() {
        let meter = StageMeter::start(AgentKind::Router);
        let usage = UsageMetadata::new(1000, 500);
        let entry = meter.success("识别完成", "gemini-2.5-flash", Some(&usage));

        assert_eq!(entry.agent, AgentKind::Router);
        assert_eq!(entry.status, StageStatus::Success);
        assert_eq!(entry.token_usage, 1500);
        assert!(entry.cost > 0.0);
        assert_eq!(entry.message, "识别完成");
    }

    #[test]
    fn test_success_entry_without_usage() {
        let meter = StageMeter::start(AgentKind::Scraper);
        let entry = meter.success("整理完成", "gemini-2.5-flash", None);

        assert_eq!(entry.token_usage, 0);
        assert_eq!(entry.cost, 0.0);
    }

    #[test]
    fn test_failure_entry_zeroes_metrics() {
        let meter = StageMeter::start(AgentKind::Reporter);
        std::thread::sleep(std::time::Duration::from_millis(5));
        let entry = meter.failure("模型服务不可用");

        assert_eq!(entry.status, StageStatus::Error);
        assert_eq!(entry.latency_ms, 0);
        assert_eq!(entry.token_usage, 0);
        assert_eq!(entry.cost, 0.0);
    }

    #[test]
    fn test_log_entry_serialization_shape() {
        let meter = StageMeter::start(AgentKind::Analyst);
        let entry = meter.success("综合评分 50.0", "gemini-2.5-pro", None);
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["agent"], "ANALYST");
        assert_eq!(value["status"], "SUCCESS");
        assert!(value.get("latencyMs").is_some());
        assert!(value.get("tokenUsage").is_some());
        // 时间戳序列化为ISO-8601字符串
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }
}
