use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::llm::client::{GeminiClient, ModelGateway};

/// 流水线执行上下文
///
/// 把凭证、模型配置与网关显式地穿入每个阶段，阶段代码不读取任何
/// 环境全局状态。一次流水线运行持有独立的上下文与数据链，
/// 多个并发运行之间没有共享可变状态。
#[derive(Clone)]
pub struct PipelineContext {
    /// 模型网关，各阶段与AI通信的唯一通道
    pub gateway: Arc<dyn ModelGateway>,
    /// 配置
    pub config: Config,
}

impl PipelineContext {
    /// 基于配置创建上下文，使用生产网关实现
    pub fn new(config: Config) -> Result<Self> {
        let gateway = Arc::new(GeminiClient::new(config.llm.clone())?);
        Ok(Self { gateway, config })
    }

    /// 注入自定义网关（测试桩或其他provider实现）
    pub fn with_gateway(config: Config, gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway, config }
    }
}
