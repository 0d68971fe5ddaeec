//! Article Factory - 多 Agent 健康文章生产线
//!
//! 模块划分：
//! - **agents**: 六个阶段 Agent 的契约、产出类型、LLM 实现、规则样例实现与守护层
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 统一内容对象、阶段状态机、修订路由、编排器、运行统计
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）与重试
//! - **observability**: 日志初始化

pub mod agents;
pub mod config;
pub mod core;
pub mod llm;
pub mod observability;

pub use crate::core::{ArticleFactory, ArticleRequest, WorkflowResult};
