//! 生成请求：选题、来源、读者、紧急程度、质量档位、额外要求

use serde::{Deserialize, Serialize};

use crate::agents::AgentMode;
use crate::core::TopicSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    #[default]
    Normal,
    High,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityLevel {
    #[default]
    Standard,
    High,
}

/// 工作流变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowMode {
    Standard,
    Emergency,
}

impl WorkflowMode {
    /// 紧急程度为 EMERGENCY 时一律走紧急流程，与质量档位无关
    pub fn select(urgency: Urgency) -> Self {
        match urgency {
            Urgency::Emergency => WorkflowMode::Emergency,
            Urgency::Normal | Urgency::High => WorkflowMode::Standard,
        }
    }

    pub fn agent_mode(&self) -> AgentMode {
        match self {
            WorkflowMode::Standard => AgentMode::Standard,
            WorkflowMode::Emergency => AgentMode::Fast,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRequest {
    pub topic: String,
    #[serde(default)]
    pub topic_source: TopicSource,
    pub target_audience: Option<String>,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub quality_level: QualityLevel,
    pub custom_requirements: Option<String>,
}

impl ArticleRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            topic_source: TopicSource::default(),
            target_audience: None,
            urgency: Urgency::default(),
            quality_level: QualityLevel::default(),
            custom_requirements: None,
        }
    }

    pub fn source(mut self, source: TopicSource) -> Self {
        self.topic_source = source;
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.target_audience = Some(audience.into());
        self
    }

    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn quality(mut self, quality: QualityLevel) -> Self {
        self.quality_level = quality;
        self
    }

    pub fn requirements(mut self, requirements: impl Into<String>) -> Self {
        self.custom_requirements = Some(requirements.into());
        self
    }

    pub fn mode(&self) -> WorkflowMode {
        WorkflowMode::select(self.urgency)
    }
}
