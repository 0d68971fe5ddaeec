//! 各阶段的输入 / 输出结构
//!
//! 输出结构全部 `#[serde(default)]`：LLM 漏掉的字段先取零值，再由 [`StageOutput::normalize`]
//! 补齐为有意义的默认值，保证下游读取时字段总是齐全。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agents::{AgentMode, StageOutput};

/// 审核给出的路由决策；无法识别的取值按 ESCALATE 处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingDecision {
    Approved,
    ReviseStructure,
    ReviseContent,
    AdjustTone,
    #[default]
    #[serde(other)]
    Escalate,
}

impl RoutingDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingDecision::Approved => "APPROVED",
            RoutingDecision::ReviseStructure => "REVISE_STRUCTURE",
            RoutingDecision::ReviseContent => "REVISE_CONTENT",
            RoutingDecision::AdjustTone => "ADJUST_TONE",
            RoutingDecision::Escalate => "ESCALATE",
        }
    }
}

impl std::fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// 输出
// ---------------------------------------------------------------------------

/// 选题分析
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicAnalysis {
    pub pain_points: Vec<String>,
    pub emotional_hooks: Vec<String>,
    pub patterns: Vec<String>,
    pub keywords: Vec<String>,
    pub persona: String,
    pub golden_sentences: Vec<String>,
    /// 爆款成功因子，0-1
    pub success_factor: f64,
}

pub const DEFAULT_PERSONA: &str = "关注健康的中老年读者";

impl StageOutput for TopicAnalysis {
    fn normalize(&mut self) -> Vec<&'static str> {
        let mut filled = Vec::new();
        if self.persona.trim().is_empty() {
            self.persona = DEFAULT_PERSONA.to_string();
            filled.push("persona");
        }
        if !(0.0..=1.0).contains(&self.success_factor) || self.success_factor.is_nan() {
            self.success_factor = clamp_score(self.success_factor, 1.0);
            filled.push("success_factor");
        }
        filled
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineSection {
    pub heading: String,
    pub key_points: Vec<String>,
    pub target_words: u32,
}

impl OutlineSection {
    pub fn new(heading: impl Into<String>, target_words: u32) -> Self {
        Self {
            heading: heading.into(),
            key_points: Vec::new(),
            target_words,
        }
    }
}

/// 文章大纲
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Outline {
    pub sections: Vec<OutlineSection>,
    pub total_words: u32,
    pub emotional_arc: Vec<String>,
}

impl StageOutput for Outline {
    fn normalize(&mut self) -> Vec<&'static str> {
        let mut filled = Vec::new();
        if self.sections.is_empty() {
            self.sections = vec![
                OutlineSection::new("开篇引入", 400),
                OutlineSection::new("核心内容", 800),
                OutlineSection::new("行动建议", 300),
            ];
            filled.push("sections");
        }
        if self.total_words == 0 {
            self.total_words = self.sections.iter().map(|s| s.target_words).sum();
            filled.push("total_words");
        }
        if self.emotional_arc.is_empty() {
            self.emotional_arc = vec!["好奇".into(), "认同".into(), "行动".into()];
            filled.push("emotional_arc");
        }
        filled
    }
}

/// 文章初稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub word_count: u32,
    pub sources: Vec<String>,
    /// 「老李」口吻的代表性句子
    pub voice_samples: Vec<String>,
}

pub const DEFAULT_TITLE: &str = "未命名文章";

/// 中文按字计数：统计非空白字符
pub fn count_words(content: &str) -> u32 {
    content.chars().filter(|c| !c.is_whitespace()).count() as u32
}

impl StageOutput for Draft {
    fn normalize(&mut self) -> Vec<&'static str> {
        let mut filled = Vec::new();
        if self.title.trim().is_empty() {
            self.title = DEFAULT_TITLE.to_string();
            filled.push("title");
        }
        if self.word_count == 0 {
            self.word_count = count_words(&self.content);
            filled.push("word_count");
        }
        filled
    }
}

/// 审核报告
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewReport {
    #[serde(alias = "decision")]
    pub routing_decision: RoutingDecision,
    pub reason: String,
    /// 0-100
    pub quality_score: f64,
    /// 「老李」语气符合度，0-100
    pub tone_compliance: f64,
    pub issues: Vec<String>,
    /// 修订预算耗尽或审核要求人工介入时由编排器置位，不接受 Agent 输出
    #[serde(skip_serializing_if = "std::ops::Not::not", skip_deserializing)]
    pub escalated: bool,
}

pub const DEFAULT_REVIEW_REASON: &str = "未提供评审理由";

impl ReviewReport {
    /// 给下一轮写作 / 大纲的修改意见：理由 + 问题清单
    pub fn feedback(&self) -> String {
        if self.issues.is_empty() {
            return self.reason.clone();
        }
        let issues: Vec<String> = self.issues.iter().map(|i| format!("- {}", i)).collect();
        format!("{}\n{}", self.reason, issues.join("\n"))
    }
}

impl StageOutput for ReviewReport {
    fn normalize(&mut self) -> Vec<&'static str> {
        let mut filled = Vec::new();
        if self.reason.trim().is_empty() {
            self.reason = DEFAULT_REVIEW_REASON.to_string();
            filled.push("reason");
        }
        let quality = clamp_score(self.quality_score, 100.0);
        if quality != self.quality_score {
            self.quality_score = quality;
            filled.push("quality_score");
        }
        let tone = clamp_score(self.tone_compliance, 100.0);
        if tone != self.tone_compliance {
            self.tone_compliance = tone;
            filled.push("tone_compliance");
        }
        filled
    }
}

/// 爆款潜力评估
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViralityAssessment {
    pub dimension_scores: BTreeMap<String, f64>,
    /// 0-100
    pub overall_score: f64,
    #[serde(alias = "prediction")]
    pub prediction_label: String,
    #[serde(alias = "suggestions")]
    pub optimization_suggestions: Vec<String>,
}

/// 由总分推导传播预测标签
pub fn prediction_label(score: f64) -> &'static str {
    if score >= 85.0 {
        "爆款潜力"
    } else if score >= 70.0 {
        "高传播"
    } else if score >= 50.0 {
        "中等传播"
    } else {
        "传播力弱"
    }
}

impl StageOutput for ViralityAssessment {
    fn normalize(&mut self) -> Vec<&'static str> {
        let mut filled = Vec::new();
        if self.overall_score <= 0.0 && !self.dimension_scores.is_empty() {
            let sum: f64 = self.dimension_scores.values().sum();
            self.overall_score = sum / self.dimension_scores.len() as f64;
            filled.push("overall_score");
        }
        let clamped = clamp_score(self.overall_score, 100.0);
        if clamped != self.overall_score {
            self.overall_score = clamped;
            filled.push("overall_score");
        }
        if self.prediction_label.trim().is_empty() {
            self.prediction_label = prediction_label(self.overall_score).to_string();
            filled.push("prediction_label");
        }
        filled
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankedHeadline {
    pub title: String,
    /// 预测互动率，0-100
    pub predicted_engagement: f64,
}

/// 标题候选与排序结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlineSet {
    pub candidates: Vec<String>,
    #[serde(alias = "ranked_selection")]
    pub ranked: Vec<RankedHeadline>,
}

impl HeadlineSet {
    /// 排名第一的标题
    pub fn best(&self) -> Option<&str> {
        self.ranked
            .first()
            .map(|h| h.title.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

impl StageOutput for HeadlineSet {
    fn normalize(&mut self) -> Vec<&'static str> {
        let mut filled = Vec::new();
        self.candidates.retain(|c| !c.trim().is_empty());
        self.ranked.retain(|h| !h.title.trim().is_empty());
        if self.ranked.is_empty() && !self.candidates.is_empty() {
            self.ranked = self
                .candidates
                .iter()
                .map(|c| RankedHeadline {
                    title: c.clone(),
                    predicted_engagement: 0.0,
                })
                .collect();
            filled.push("ranked");
        }
        if self.candidates.is_empty() && !self.ranked.is_empty() {
            self.candidates = self.ranked.iter().map(|h| h.title.clone()).collect();
            filled.push("candidates");
        }
        filled
    }
}

fn clamp_score(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

// ---------------------------------------------------------------------------
// 输入
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisInput {
    pub topic: String,
    pub audience: Option<String>,
    pub mode: AgentMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlineInput {
    pub topic: String,
    pub analysis: TopicAnalysis,
    /// 仅在 REVISE_STRUCTURE 重做大纲时出现
    pub prior_outline: Option<Outline>,
    pub feedback: Option<String>,
    pub mode: AgentMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftInput {
    pub topic: String,
    pub outline: Outline,
    pub analysis: TopicAnalysis,
    pub requirements: Option<String>,
    /// 上一轮审核意见（仅修订重试时出现）
    pub feedback: Option<String>,
    /// 爆款评估给出的优化建议（仅优化重写时出现）
    pub optimization_hints: Vec<String>,
    pub mode: AgentMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewInput {
    pub draft: Draft,
    pub mode: AgentMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViralityInput {
    pub draft: Draft,
    pub review: ReviewReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeadlineInput {
    pub draft: Draft,
    pub audience: Option<String>,
    pub mode: AgentMode,
}
