//! 统一内容对象（UCO）：一篇文章在工作流中的全部状态
//!
//! 只由编排器在单次运行内修改，不做持久化。每次阶段迁移恰好追加一条事件日志；
//! 各阶段产出放在类型化的槽位里，读取未产出的槽位返回 [`WorkflowError::MissingStageOutput`]。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::{
    Draft, HeadlineSet, Outline, ReviewReport, RoutingDecision, TopicAnalysis,
    ViralityAssessment,
};
use crate::core::{Stage, WorkflowError};

/// 选题来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TopicSource {
    #[default]
    Manual,
    HotTopic,
    SeoKeyword,
    Calendar,
}

/// 事件日志条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub detail: String,
}

/// 路由决策日志条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRecord {
    pub timestamp: DateTime<Utc>,
    /// 产生该决策时的修订序号（从 0 开始）
    pub revision: u32,
    pub decision: RoutingDecision,
    pub reason: String,
    pub stage: Stage,
}

/// 各阶段产出槽位
#[derive(Debug, Clone, Default)]
pub struct StageOutputs {
    analysis: Option<TopicAnalysis>,
    outline: Option<Outline>,
    draft: Option<Draft>,
    review: Option<ReviewReport>,
    virality: Option<ViralityAssessment>,
    headlines: Option<HeadlineSet>,
}

fn require<'a, T>(slot: &'a Option<T>, name: &'static str) -> Result<&'a T, WorkflowError> {
    slot.as_ref().ok_or(WorkflowError::MissingStageOutput(name))
}

impl StageOutputs {
    pub fn analysis(&self) -> Result<&TopicAnalysis, WorkflowError> {
        require(&self.analysis, "analysis")
    }

    pub fn outline(&self) -> Result<&Outline, WorkflowError> {
        require(&self.outline, "outline")
    }

    pub fn draft(&self) -> Result<&Draft, WorkflowError> {
        require(&self.draft, "draft")
    }

    pub fn review(&self) -> Result<&ReviewReport, WorkflowError> {
        require(&self.review, "review")
    }

    /// 爆款评估在紧急流程中会被跳过，因此是可选的
    pub fn virality(&self) -> Option<&ViralityAssessment> {
        self.virality.as_ref()
    }

    pub fn headlines(&self) -> Option<&HeadlineSet> {
        self.headlines.as_ref()
    }

    pub fn set_analysis(&mut self, value: TopicAnalysis) {
        self.analysis = Some(value);
    }

    pub fn set_outline(&mut self, value: Outline) {
        self.outline = Some(value);
    }

    pub fn set_draft(&mut self, value: Draft) {
        self.draft = Some(value);
    }

    pub fn set_review(&mut self, value: ReviewReport) {
        self.review = Some(value);
    }

    pub fn set_virality(&mut self, value: ViralityAssessment) {
        self.virality = Some(value);
    }

    pub fn set_headlines(&mut self, value: HeadlineSet) {
        self.headlines = Some(value);
    }

    fn review_mut(&mut self) -> Result<&mut ReviewReport, WorkflowError> {
        self.review
            .as_mut()
            .ok_or(WorkflowError::MissingStageOutput("review"))
    }
}

#[derive(Debug, Clone)]
pub struct ContentObject {
    id: String,
    topic: String,
    source: TopicSource,
    stage: Stage,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision_count: u32,
    revision_limit: u32,
    outputs: StageOutputs,
    events: Vec<LogEntry>,
    decisions: Vec<RoutingRecord>,
}

impl ContentObject {
    /// 新建处于 INIT 的内容对象；id 由创建时间加随机后缀组成
    pub fn new(topic: impl Into<String>, source: TopicSource, revision_limit: u32) -> Self {
        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        let id = format!("uco_{}_{}", now.format("%Y%m%d%H%M%S%3f"), &suffix[..8]);
        let mut uco = Self {
            id,
            topic: topic.into(),
            source,
            stage: Stage::Init,
            created_at: now,
            updated_at: now,
            revision_count: 0,
            revision_limit,
            outputs: StageOutputs::default(),
            events: Vec::new(),
            decisions: Vec::new(),
        };
        uco.log("created", format!("topic={} source={:?}", uco.topic, source));
        uco
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn source(&self) -> TopicSource {
        self.source
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn revision_count(&self) -> u32 {
        self.revision_count
    }

    pub fn revision_limit(&self) -> u32 {
        self.revision_limit
    }

    pub fn outputs(&self) -> &StageOutputs {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut StageOutputs {
        &mut self.outputs
    }

    pub fn events(&self) -> &[LogEntry] {
        &self.events
    }

    pub fn decisions(&self) -> &[RoutingRecord] {
        &self.decisions
    }

    /// 追加一条事件日志
    pub fn log(&mut self, action: impl Into<String>, detail: impl Into<String>) {
        let now = Utc::now();
        self.updated_at = now;
        self.events.push(LogEntry {
            timestamp: now,
            action: action.into(),
            detail: detail.into(),
        });
    }

    /// 迁移到新阶段；非法迁移返回错误且不修改状态
    pub fn transition(&mut self, next: Stage) -> Result<(), WorkflowError> {
        if !self.stage.can_transition_to(next) {
            return Err(WorkflowError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        let detail = format!("{} -> {}", self.stage, next);
        self.stage = next;
        self.log("transition", detail);
        Ok(())
    }

    pub fn record_routing_decision(
        &mut self,
        decision: RoutingDecision,
        reason: impl Into<String>,
        stage: Stage,
    ) {
        let reason = reason.into();
        self.log("routing", format!("#{} {} ({})", self.revision_count, decision, reason));
        self.decisions.push(RoutingRecord {
            timestamp: Utc::now(),
            revision: self.revision_count,
            decision,
            reason,
            stage,
        });
    }

    /// 修订计数 +1；已到上限时不变并返回 false
    pub fn increment_revision(&mut self) -> bool {
        if self.revision_count >= self.revision_limit {
            self.log(
                "revision_capped",
                format!("limit {} reached", self.revision_limit),
            );
            return false;
        }
        self.revision_count += 1;
        self.log(
            "revision",
            format!("{}/{}", self.revision_count, self.revision_limit),
        );
        true
    }

    /// 把当前审核结果标记为升级人工处理
    pub fn escalate(&mut self, reason: impl Into<String>) -> Result<(), WorkflowError> {
        self.outputs.review_mut()?.escalated = true;
        self.log("escalated", reason);
        Ok(())
    }

    pub fn is_escalated(&self) -> bool {
        self.outputs.review.as_ref().is_some_and(|r| r.escalated)
    }

    /// 工作流结束后的发布记账
    pub fn publish(&mut self) -> Result<(), WorkflowError> {
        self.transition(Stage::Published)
    }

    pub fn archive(&mut self) -> Result<(), WorkflowError> {
        self.transition(Stage::Archived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uco() -> ContentObject {
        ContentObject::new("立春养肝", TopicSource::Manual, 3)
    }

    #[test]
    fn test_new_starts_at_init() {
        let uco = uco();
        assert_eq!(uco.stage(), Stage::Init);
        assert_eq!(uco.revision_count(), 0);
        assert!(uco.id().starts_with("uco_"));
        assert_ne!(uco.id(), ContentObject::new("立春养肝", TopicSource::Manual, 3).id());
    }

    #[test]
    fn test_each_transition_logs_once() {
        let mut uco = uco();
        let before = uco.events().len();
        uco.transition(Stage::Analyzing).unwrap();
        uco.transition(Stage::Analyzed).unwrap();
        let transitions: Vec<_> = uco.events()[before..]
            .iter()
            .filter(|e| e.action == "transition")
            .collect();
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[1].detail, "ANALYZING -> ANALYZED");
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut uco = uco();
        uco.transition(Stage::Analyzing).unwrap();
        let events = uco.events().len();
        let err = uco.transition(Stage::Init).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        assert_eq!(uco.stage(), Stage::Analyzing);
        assert_eq!(uco.events().len(), events);
    }

    #[test]
    fn test_increment_revision_caps() {
        let mut uco = ContentObject::new("立春养肝", TopicSource::Manual, 2);
        assert!(uco.increment_revision());
        assert!(uco.increment_revision());
        assert!(!uco.increment_revision());
        assert_eq!(uco.revision_count(), 2);
    }

    #[test]
    fn test_missing_slot_is_error() {
        let uco = uco();
        assert!(matches!(
            uco.outputs().draft(),
            Err(WorkflowError::MissingStageOutput("draft"))
        ));
        assert!(uco.outputs().virality().is_none());
    }

    #[test]
    fn test_routing_decision_records_revision_index() {
        let mut uco = uco();
        uco.record_routing_decision(RoutingDecision::ReviseContent, "太短", Stage::Reviewing);
        uco.increment_revision();
        uco.record_routing_decision(RoutingDecision::Approved, "通过", Stage::Reviewing);
        let revisions: Vec<u32> = uco.decisions().iter().map(|d| d.revision).collect();
        assert_eq!(revisions, vec![0, 1]);
    }

    #[test]
    fn test_escalate_requires_review() {
        let mut uco = uco();
        assert!(uco.escalate("no review").is_err());
        uco.outputs_mut().set_review(ReviewReport::default());
        uco.escalate("limit").unwrap();
        assert!(uco.is_escalated());
    }

    #[test]
    fn test_publish_and_archive_after_ready() {
        let mut uco = uco();
        assert!(uco.publish().is_err());
        uco.transition(Stage::Ready).unwrap();
        uco.publish().unwrap();
        uco.archive().unwrap();
        assert_eq!(uco.stage(), Stage::Archived);
        assert!(uco.updated_at() >= uco.created_at());
        assert_eq!(uco.source(), TopicSource::Manual);
    }
}
