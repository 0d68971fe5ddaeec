//! 核心编排层：UCO 与阶段状态机、修订路由、运行统计、结果组装、编排器

pub mod builder;
pub mod content;
pub mod error;
pub mod orchestrator;
pub mod request;
pub mod result;
pub mod router;
pub mod state;
pub mod stats;

pub use builder::{create_llm_from_config, factory_from_config, FactoryBuilder};
pub use content::{ContentObject, LogEntry, RoutingRecord, StageOutputs, TopicSource};
pub use error::{AgentFailure, WorkflowError};
pub use orchestrator::ArticleFactory;
pub use request::{ArticleRequest, QualityLevel, Urgency, WorkflowMode};
pub use result::{
    assemble, ArticleBlock, OldLiCompliance, QualityMetrics, WorkflowReport, WorkflowResult,
};
pub use router::{RevisionRouter, RouteAction};
pub use state::Stage;
pub use stats::{InMemoryRunStats, RunStatsSink, RunStatsSnapshot};
