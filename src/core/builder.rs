//! 文章工厂构建器：从配置选择 LLM 后端、组装阶段 Agent 与回退 Agent
//!
//! CLI 与测试共用；未配置 API Key 时整套退回规则样例 Agent，保证离线可运行。

use std::sync::Arc;
use std::time::Duration;

use crate::agents::AgentSet;
use crate::config::{AppConfig, WorkflowSettings};
use crate::core::{ArticleFactory, InMemoryRunStats, RunStatsSink};
use crate::llm::{create_deepseek_client, LlmClient, OpenAiClient, RetryingLlmClient};

pub struct FactoryBuilder {
    settings: WorkflowSettings,
    agents: AgentSet,
    fallback: AgentSet,
    stats: Arc<dyn RunStatsSink>,
}

impl Default for FactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FactoryBuilder {
    pub fn new() -> Self {
        Self {
            settings: WorkflowSettings::default(),
            agents: AgentSet::sample(),
            fallback: AgentSet::sample(),
            stats: Arc::new(InMemoryRunStats::new()),
        }
    }

    pub fn with_settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_agents(mut self, agents: AgentSet) -> Self {
        self.agents = agents;
        self
    }

    /// 阶段失败且策略为 fallback 时使用的 Agent，默认是样例 Agent
    pub fn with_fallback(mut self, fallback: AgentSet) -> Self {
        self.fallback = fallback;
        self
    }

    /// 注入统计汇聚点，多个工厂可共享同一个
    pub fn with_stats(mut self, stats: Arc<dyn RunStatsSink>) -> Self {
        self.stats = stats;
        self
    }

    pub fn build(self) -> ArticleFactory {
        ArticleFactory::new(self.settings, self.agents, self.fallback, self.stats)
    }
}

/// 按 [llm] 配置与环境变量选择后端；返回 None 表示使用样例 Agent
///
/// - provider = "sample" 时始终返回 None
/// - 有 `DEEPSEEK_API_KEY`，或 provider 为 deepseek 且有 `OPENAI_API_KEY` 时走 DeepSeek
/// - provider 为 openai 且有 `OPENAI_API_KEY` 时走 OpenAI 兼容端点（可配 base_url）
pub fn create_llm_from_config(cfg: &AppConfig) -> Option<Arc<dyn LlmClient>> {
    let provider = cfg.llm.provider.to_lowercase();
    if provider == "sample" {
        tracing::info!("LLM provider set to sample, using built-in sample agents");
        return None;
    }

    let has_deepseek_key = std::env::var("DEEPSEEK_API_KEY").is_ok();
    let has_openai_key = std::env::var("OPENAI_API_KEY").is_ok();
    let request_timeout = Duration::from_secs(cfg.llm.timeouts.request);

    let client = if provider == "deepseek" && (has_deepseek_key || has_openai_key) {
        tracing::info!("Using DeepSeek LLM ({})", cfg.llm.model);
        create_deepseek_client(Some(cfg.llm.model.as_str())).with_request_timeout(request_timeout)
    } else if provider == "openai" && has_openai_key {
        tracing::info!("Using OpenAI-compatible LLM ({})", cfg.llm.model);
        OpenAiClient::new(cfg.llm.base_url.as_deref(), &cfg.llm.model, None)
            .with_request_timeout(request_timeout)
    } else {
        tracing::warn!(
            provider = %provider,
            "No API key set or provider unknown, using sample agents"
        );
        return None;
    };

    Some(Arc::new(RetryingLlmClient::new(
        Arc::new(client),
        cfg.llm.retry.to_retry_config(),
    )))
}

/// 按配置构建工厂：传入 LLM 时六个阶段全部走 LLM，否则使用样例 Agent
///
/// LLM 由调用方通过 [`create_llm_from_config`] 创建并保留，运行结束后可读取 token 用量。
pub fn factory_from_config(
    config: &AppConfig,
    llm: Option<Arc<dyn LlmClient>>,
) -> ArticleFactory {
    let agents = match llm {
        Some(llm) => AgentSet::from_llm(llm),
        None => AgentSet::sample(),
    };
    FactoryBuilder::new()
        .with_settings(config.workflow.clone())
        .with_agents(agents)
        .build()
}
