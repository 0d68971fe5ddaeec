//! 结果组装：把 UCO 的最终状态投影为对外的 WorkflowResult
//!
//! 纯投影，不重新计算任何分数。

use serde::Serialize;

use crate::agents::Outline;
use crate::core::{ContentObject, LogEntry, RoutingRecord, Stage, WorkflowError, WorkflowMode};

/// 文章标签最多取前几个关键词
const MAX_TAGS: usize = 5;
/// 口吻样句最多展示几条
const MAX_VOICE_SAMPLES: usize = 3;
/// 每条样句截断长度（字）
const VOICE_EXCERPT_CHARS: usize = 60;

#[derive(Debug, Clone, Serialize)]
pub struct ArticleBlock {
    pub title: String,
    pub alternate_titles: Vec<String>,
    pub outline: Outline,
    pub content: String,
    pub word_count: u32,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityMetrics {
    /// 紧急流程不做爆款评估，此时为空
    pub virality_score: Option<f64>,
    pub virality_prediction: Option<String>,
    pub quality_score: f64,
    pub revision_count: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub escalated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub elapsed_secs: f64,
    pub mode: WorkflowMode,
    pub events: Vec<LogEntry>,
    pub routing_decisions: Vec<RoutingRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OldLiCompliance {
    pub tone_score: f64,
    pub voice_samples: Vec<String>,
}

/// 工作流结果：success=true 时各块齐全；失败时只有 error 与（若已创建）run_id
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article: Option<ArticleBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_metrics: Option<QualityMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_report: Option<WorkflowReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_li_compliance: Option<OldLiCompliance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowResult {
    pub fn failure(run_id: Option<String>, error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            run_id,
            stage: None,
            article: None,
            quality_metrics: None,
            workflow_report: None,
            old_li_compliance: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_escalated(&self) -> bool {
        self.quality_metrics.as_ref().is_some_and(|m| m.escalated)
    }
}

fn excerpt(sample: &str) -> String {
    if sample.chars().count() <= VOICE_EXCERPT_CHARS {
        return sample.to_string();
    }
    let mut cut: String = sample.chars().take(VOICE_EXCERPT_CHARS).collect();
    cut.push('…');
    cut
}

/// 从最终 UCO 组装成功结果；分析 / 大纲 / 正文 / 审核缺任何一个都视为错误
pub fn assemble(
    uco: &ContentObject,
    mode: WorkflowMode,
    elapsed_secs: f64,
) -> Result<WorkflowResult, WorkflowError> {
    let outputs = uco.outputs();
    let analysis = outputs.analysis()?;
    let outline = outputs.outline()?;
    let draft = outputs.draft()?;
    let review = outputs.review()?;
    let virality = outputs.virality();
    let headlines = outputs.headlines();

    let title = headlines
        .and_then(|h| h.best())
        .unwrap_or(draft.title.as_str())
        .to_string();
    let alternate_titles = headlines
        .map(|h| {
            h.ranked
                .iter()
                .map(|r| r.title.clone())
                .filter(|t| *t != title)
                .collect()
        })
        .unwrap_or_default();

    Ok(WorkflowResult {
        success: true,
        run_id: Some(uco.id().to_string()),
        stage: Some(uco.stage()),
        article: Some(ArticleBlock {
            title,
            alternate_titles,
            outline: outline.clone(),
            content: draft.content.clone(),
            word_count: draft.word_count,
            tags: analysis.keywords.iter().take(MAX_TAGS).cloned().collect(),
        }),
        quality_metrics: Some(QualityMetrics {
            virality_score: virality.map(|v| v.overall_score),
            virality_prediction: virality.map(|v| v.prediction_label.clone()),
            quality_score: review.quality_score,
            revision_count: uco.revision_count(),
            escalated: review.escalated,
        }),
        workflow_report: Some(WorkflowReport {
            elapsed_secs,
            mode,
            events: uco.events().to_vec(),
            routing_decisions: uco.decisions().to_vec(),
        }),
        old_li_compliance: Some(OldLiCompliance {
            tone_score: review.tone_compliance,
            voice_samples: draft
                .voice_samples
                .iter()
                .take(MAX_VOICE_SAMPLES)
                .map(|s| excerpt(s))
                .collect(),
        }),
        error: None,
    })
}
