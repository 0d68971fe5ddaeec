//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FACTORY__*` 覆盖
//! （双下划线表示嵌套，如 `FACTORY__WORKFLOW__REVISION_LIMITS__STANDARD=4`）。

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::agents::{AgentStage, FailurePolicy};
use crate::core::{QualityLevel, WorkflowError};
use crate::llm::RetryConfig;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub workflow: WorkflowSettings,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：后端选择、超时与重试
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：deepseek / openai / sample；sample 或缺少 API Key 时使用内置样例 Agent
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub timeouts: LlmTimeoutsSection,
    pub retry: LlmRetrySection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "deepseek".to_string(),
            model: "deepseek-chat".to_string(),
            base_url: None,
            timeouts: LlmTimeoutsSection::default(),
            retry: LlmRetrySection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [llm.retry] 段：外部调用层的指数退避
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmRetrySection {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for LlmRetrySection {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
        }
    }
}

impl LlmRetrySection {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

/// [workflow] 段：修订上限、阶段超时、阈值、失败策略
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WorkflowSettings {
    pub revision_limits: RevisionLimits,
    pub timeouts: StageTimeouts,
    pub thresholds: Thresholds,
    pub failure_policy: FailurePolicySection,
}

/// [workflow.revision_limits]：每个质量档位允许的写作-审核轮数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RevisionLimits {
    pub standard: u32,
    pub high: u32,
    pub emergency: u32,
}

impl Default for RevisionLimits {
    fn default() -> Self {
        Self {
            standard: 3,
            high: 5,
            emergency: 1,
        }
    }
}

/// [workflow.timeouts]：每个阶段的超时（秒）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StageTimeouts {
    pub analysis: u64,
    pub outline: u64,
    pub draft: u64,
    pub review: u64,
    pub virality: u64,
    pub headline: u64,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            analysis: 60,
            outline: 60,
            draft: 180,
            review: 90,
            virality: 60,
            headline: 60,
        }
    }
}

impl StageTimeouts {
    pub fn for_stage(&self, stage: AgentStage) -> Duration {
        let secs = match stage {
            AgentStage::Analysis => self.analysis,
            AgentStage::Outline => self.outline,
            AgentStage::Draft => self.draft,
            AgentStage::Review => self.review,
            AgentStage::Virality => self.virality,
            AgentStage::Headline => self.headline,
        };
        Duration::from_secs(secs)
    }
}

/// [workflow.thresholds]：分数均为 0-100
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub quality: f64,
    /// 高质量档位下低于该分数会触发一次优化重写
    pub virality: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            quality: 75.0,
            virality: 70.0,
        }
    }
}

/// [workflow.failure_policy]：Agent 失败时是回退到样例输出还是中止
///
/// ```toml
/// [workflow.failure_policy]
/// default = "fallback"
/// review = "fail"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FailurePolicySection {
    pub default: FailurePolicy,
    #[serde(flatten)]
    pub overrides: HashMap<String, FailurePolicy>,
}

impl FailurePolicySection {
    pub fn for_stage(&self, stage: AgentStage) -> FailurePolicy {
        self.overrides
            .get(stage.as_str())
            .copied()
            .unwrap_or(self.default)
    }
}

impl WorkflowSettings {
    /// 质量档位对应的修订上限；紧急模式固定使用 emergency 档
    pub fn revision_limit(&self, quality: QualityLevel, emergency: bool) -> u32 {
        if emergency {
            return self.revision_limits.emergency;
        }
        match quality {
            QualityLevel::Standard => self.revision_limits.standard,
            QualityLevel::High => self.revision_limits.high,
        }
    }

    /// 运行前校验：上限与超时必须为正，覆盖项必须是已知阶段
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let limits = &self.revision_limits;
        if limits.standard == 0 || limits.high == 0 || limits.emergency == 0 {
            return Err(WorkflowError::Config(
                "revision limits must be at least 1".to_string(),
            ));
        }
        for stage in AgentStage::ALL {
            if self.timeouts.for_stage(stage).is_zero() {
                return Err(WorkflowError::Config(format!(
                    "timeout for stage '{}' must be positive",
                    stage
                )));
            }
        }
        if let Some(unknown) = self
            .failure_policy
            .overrides
            .keys()
            .find(|k| AgentStage::parse(k).is_none())
        {
            return Err(WorkflowError::Config(format!(
                "unknown stage in failure_policy: {}",
                unknown
            )));
        }
        Ok(())
    }
}

/// 从 config 目录加载配置，环境变量 FACTORY__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 FACTORY__*
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FACTORY")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
