//! GuardedAgent：在具体 Agent 外统一施加超时、失败策略与字段补齐
//!
//! 失败（调用出错 / 超时 / 输出无法解析）时按 [`FailurePolicy`] 处理：
//! Fallback 调用回退 Agent 并把失败原因交给调用方记录；Fail 直接返回错误。

use std::sync::Arc;
use std::time::Duration;

use crate::agents::{AgentStage, FailurePolicy, StageAgent, StageOutput};
use crate::core::AgentFailure;

/// 守护后的输出：fallback_reason 非空表示这份输出来自回退 Agent
#[derive(Debug, Clone)]
pub struct Guarded<O> {
    pub output: O,
    pub fallback_reason: Option<String>,
}

pub struct GuardedAgent<I, O>
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    stage: AgentStage,
    primary: Arc<dyn StageAgent<I, O>>,
    fallback: Arc<dyn StageAgent<I, O>>,
    timeout: Duration,
    policy: FailurePolicy,
}

impl<I, O> GuardedAgent<I, O>
where
    I: Send + Sync + 'static,
    O: StageOutput,
{
    pub fn new(
        stage: AgentStage,
        primary: Arc<dyn StageAgent<I, O>>,
        fallback: Arc<dyn StageAgent<I, O>>,
        timeout: Duration,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            stage,
            primary,
            fallback,
            timeout,
            policy,
        }
    }

    async fn call_with_timeout(
        &self,
        agent: &Arc<dyn StageAgent<I, O>>,
        input: &I,
    ) -> Result<O, AgentFailure> {
        match tokio::time::timeout(self.timeout, agent.invoke(input)).await {
            Ok(result) => result,
            Err(_) => Err(AgentFailure::Timeout {
                stage: self.stage,
                timeout: self.timeout,
            }),
        }
    }

    pub async fn run(&self, input: &I) -> Result<Guarded<O>, AgentFailure> {
        tracing::debug!(stage = %self.stage, agent = self.primary.name(), "invoking agent");

        let (mut output, fallback_reason) =
            match self.call_with_timeout(&self.primary, input).await {
                Ok(output) => (output, None),
                Err(err) => match self.policy {
                    FailurePolicy::Fail => {
                        tracing::error!(stage = %self.stage, "agent failed: {}", err);
                        return Err(err);
                    }
                    FailurePolicy::Fallback => {
                        tracing::warn!(
                            stage = %self.stage,
                            fallback = self.fallback.name(),
                            "agent failed ({}), using fallback output",
                            err
                        );
                        let output = self.call_with_timeout(&self.fallback, input).await?;
                        (output, Some(err.to_string()))
                    }
                },
            };

        let filled = output.normalize();
        if !filled.is_empty() {
            tracing::debug!(stage = %self.stage, ?filled, "filled missing output fields");
        }

        Ok(Guarded {
            output,
            fallback_reason,
        })
    }
}
