//! Agent 适配层：每个内容生产阶段一个 Agent
//!
//! 编排器只依赖 [`StageAgent`] trait；具体实现有两套：
//! - **llm_agent**: 渲染阶段 Prompt → 调用 LLM → 解析 JSON
//! - **sample**: 规则生成的确定性样例输出（无 API Key 时使用，也作为失败回退）
//!
//! [`GuardedAgent`] 在外层统一负责超时、回退策略与字段补齐。

pub mod guarded;
pub mod llm_agent;
pub mod prompts;
pub mod sample;
pub mod seo;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::AgentFailure;
use crate::llm::LlmClient;

pub use guarded::{Guarded, GuardedAgent};
pub use llm_agent::LlmStageAgent;
pub use sample::SampleAgents;
pub use types::*;

/// 内容生产阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStage {
    Analysis,
    Outline,
    Draft,
    Review,
    Virality,
    Headline,
}

impl AgentStage {
    pub const ALL: [AgentStage; 6] = [
        AgentStage::Analysis,
        AgentStage::Outline,
        AgentStage::Draft,
        AgentStage::Review,
        AgentStage::Virality,
        AgentStage::Headline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStage::Analysis => "analysis",
            AgentStage::Outline => "outline",
            AgentStage::Draft => "draft",
            AgentStage::Review => "review",
            AgentStage::Virality => "virality",
            AgentStage::Headline => "headline",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl std::fmt::Display for AgentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 运行模式：紧急流程下所有 Agent 以 Fast 模式运行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    #[default]
    Standard,
    Fast,
}

/// Agent 调用失败时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// 使用确定性样例输出替代，并记录到事件日志
    #[default]
    Fallback,
    /// 直接返回 AgentFailure，工作流以失败结束
    Fail,
}

/// 阶段输出：接受前补齐必填字段，返回被补齐的字段名
pub trait StageOutput: Send + 'static {
    fn normalize(&mut self) -> Vec<&'static str>;
}

/// 单个阶段的 Agent
#[async_trait]
pub trait StageAgent<I, O>: Send + Sync
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    fn name(&self) -> &str;

    async fn invoke(&self, input: &I) -> Result<O, AgentFailure>;
}

pub type AnalysisAgent = dyn StageAgent<AnalysisInput, TopicAnalysis>;
pub type OutlineAgent = dyn StageAgent<OutlineInput, Outline>;
pub type DraftAgent = dyn StageAgent<DraftInput, Draft>;
pub type ReviewAgent = dyn StageAgent<ReviewInput, ReviewReport>;
pub type ViralityAgent = dyn StageAgent<ViralityInput, ViralityAssessment>;
pub type HeadlineAgent = dyn StageAgent<HeadlineInput, HeadlineSet>;

/// 六个阶段的 Agent 集合
#[derive(Clone)]
pub struct AgentSet {
    pub analysis: Arc<AnalysisAgent>,
    pub outline: Arc<OutlineAgent>,
    pub draft: Arc<DraftAgent>,
    pub review: Arc<ReviewAgent>,
    pub virality: Arc<ViralityAgent>,
    pub headline: Arc<HeadlineAgent>,
}

impl AgentSet {
    /// 全部使用规则样例 Agent
    pub fn sample() -> Self {
        let sample = Arc::new(SampleAgents::new());
        Self {
            analysis: sample.clone(),
            outline: sample.clone(),
            draft: sample.clone(),
            review: sample.clone(),
            virality: sample.clone(),
            headline: sample,
        }
    }

    /// 全部通过同一个 LLM 客户端完成
    pub fn from_llm(llm: Arc<dyn LlmClient>) -> Self {
        let analysis: LlmStageAgent<AnalysisInput, TopicAnalysis> =
            LlmStageAgent::new(AgentStage::Analysis, llm.clone());
        let outline: LlmStageAgent<OutlineInput, Outline> =
            LlmStageAgent::new(AgentStage::Outline, llm.clone());
        let draft: LlmStageAgent<DraftInput, Draft> =
            LlmStageAgent::new(AgentStage::Draft, llm.clone());
        let review: LlmStageAgent<ReviewInput, ReviewReport> =
            LlmStageAgent::new(AgentStage::Review, llm.clone());
        let virality: LlmStageAgent<ViralityInput, ViralityAssessment> =
            LlmStageAgent::new(AgentStage::Virality, llm.clone());
        let headline: LlmStageAgent<HeadlineInput, HeadlineSet> =
            LlmStageAgent::new(AgentStage::Headline, llm);
        Self {
            analysis: Arc::new(analysis),
            outline: Arc::new(outline),
            draft: Arc::new(draft),
            review: Arc::new(review),
            virality: Arc::new(virality),
            headline: Arc::new(headline),
        }
    }

    pub fn with_analysis(mut self, agent: Arc<AnalysisAgent>) -> Self {
        self.analysis = agent;
        self
    }

    pub fn with_outline(mut self, agent: Arc<OutlineAgent>) -> Self {
        self.outline = agent;
        self
    }

    pub fn with_draft(mut self, agent: Arc<DraftAgent>) -> Self {
        self.draft = agent;
        self
    }

    pub fn with_review(mut self, agent: Arc<ReviewAgent>) -> Self {
        self.review = agent;
        self
    }

    pub fn with_virality(mut self, agent: Arc<ViralityAgent>) -> Self {
        self.virality = agent;
        self
    }

    pub fn with_headline(mut self, agent: Arc<HeadlineAgent>) -> Self {
        self.headline = agent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_parse_roundtrip() {
        for stage in AgentStage::ALL {
            assert_eq!(AgentStage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(AgentStage::parse("publish"), None);
    }
}
