//! 错误类型：Agent 调用失败与工作流失败
//!
//! AgentFailure 由 GuardedAgent 按策略消化（回退）或上抛；WorkflowError 在编排器顶层被捕获，
//! 转成失败形态的 WorkflowResult，不会越过 generate_article 的边界。

use std::time::Duration;

use thiserror::Error;

use crate::agents::AgentStage;
use crate::core::Stage;

/// 单个 Agent 调用失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentFailure {
    #[error("{stage} agent LLM call failed: {message}")]
    Llm { stage: AgentStage, message: String },

    #[error("{stage} agent timed out after {timeout:?}")]
    Timeout { stage: AgentStage, timeout: Duration },

    #[error("{stage} agent returned invalid output: {message}")]
    Schema { stage: AgentStage, message: String },
}

impl AgentFailure {
    pub fn stage(&self) -> AgentStage {
        match self {
            AgentFailure::Llm { stage, .. }
            | AgentFailure::Timeout { stage, .. }
            | AgentFailure::Schema { stage, .. } => *stage,
        }
    }
}

/// 工作流级错误
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Agent(#[from] AgentFailure),

    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidTransition { from: Stage, to: Stage },

    #[error("Stage output '{0}' read before it was produced")]
    MissingStageOutput(&'static str),

    #[error("Workflow deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("Workflow panicked: {0}")]
    Panicked(String),
}
