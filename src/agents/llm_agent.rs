//! LLM 驱动的阶段 Agent
//!
//! 渲染阶段 Prompt → 调用 LLM → 从回复中提取 JSON（```json 代码块或首尾花括号之间）→ 反序列化为阶段输出。

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::agents::prompts::{StagePrompt, SYSTEM_PROMPT};
use crate::agents::{AgentStage, StageAgent};
use crate::core::AgentFailure;
use crate::llm::{LlmClient, Message};

/// 从 LLM 输出中截取 JSON 文本
pub fn extract_json(output: &str) -> Option<&str> {
    let trimmed = output.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        return Some(rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim()));
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

pub struct LlmStageAgent<I, O> {
    stage: AgentStage,
    name: String,
    llm: Arc<dyn LlmClient>,
    _marker: PhantomData<fn(&I) -> O>,
}

impl<I, O> LlmStageAgent<I, O> {
    pub fn new(stage: AgentStage, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            stage,
            name: format!("llm-{}", stage),
            llm,
            _marker: PhantomData,
        }
    }

    fn parse(&self, raw: &str) -> Result<O, AgentFailure>
    where
        O: DeserializeOwned,
    {
        let json = extract_json(raw).ok_or_else(|| AgentFailure::Schema {
            stage: self.stage,
            message: "no JSON object in response".to_string(),
        })?;
        serde_json::from_str(json).map_err(|e| AgentFailure::Schema {
            stage: self.stage,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl<I, O> StageAgent<I, O> for LlmStageAgent<I, O>
where
    I: StagePrompt + Send + Sync + 'static,
    O: DeserializeOwned + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: &I) -> Result<O, AgentFailure> {
        debug_assert_eq!(I::STAGE, self.stage);
        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(input.render())];
        let raw = self
            .llm
            .complete(&messages)
            .await
            .map_err(|e| AgentFailure::Llm {
                stage: self.stage,
                message: e.to_string(),
            })?;
        self.parse(&raw)
    }
}
