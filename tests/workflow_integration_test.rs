//! 工作流集成测试：用可编排的测试替身驱动整条流水线

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use article_factory::agents::{
    AgentMode, AgentSet, AgentStage, AnalysisInput, Draft, DraftInput, FailurePolicy, Outline,
    LlmStageAgent, OutlineInput, ReviewInput, ReviewReport, RoutingDecision, SampleAgents,
    StageAgent,
    TopicAnalysis, ViralityAssessment, ViralityInput, DEFAULT_TITLE,
};
use article_factory::config::WorkflowSettings;
use article_factory::core::{
    AgentFailure, ArticleFactory, ArticleRequest, FactoryBuilder, InMemoryRunStats, QualityLevel,
    RunStatsSink, Stage, Urgency, WorkflowMode,
};
use article_factory::llm::MockLlmClient;

/// 按脚本给出审核决策，脚本用完后一律通过；记录每次调用的模式
struct ScriptedReview {
    script: Mutex<Vec<RoutingDecision>>,
    modes: Mutex<Vec<AgentMode>>,
}

impl ScriptedReview {
    fn new(mut script: Vec<RoutingDecision>) -> Arc<Self> {
        script.reverse();
        Arc::new(Self {
            script: Mutex::new(script),
            modes: Mutex::new(Vec::new()),
        })
    }

    fn always(decision: RoutingDecision) -> Arc<Self> {
        Self::new(vec![decision; 16])
    }

    fn calls(&self) -> usize {
        self.modes.lock().unwrap().len()
    }
}

#[async_trait]
impl StageAgent<ReviewInput, ReviewReport> for ScriptedReview {
    fn name(&self) -> &str {
        "scripted_review"
    }

    async fn invoke(&self, input: &ReviewInput) -> Result<ReviewReport, AgentFailure> {
        self.modes.lock().unwrap().push(input.mode);
        let decision = self
            .script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(RoutingDecision::Approved);
        Ok(ReviewReport {
            routing_decision: decision,
            reason: format!("审核意见 {}", decision),
            quality_score: 82.0,
            tone_compliance: 88.0,
            issues: vec!["开头不够抓人".to_string()],
            escalated: false,
        })
    }
}

/// 记录大纲输入，产出交给样例 Agent
#[derive(Default)]
struct RecordingOutline {
    inputs: Mutex<Vec<OutlineInput>>,
}

#[async_trait]
impl StageAgent<OutlineInput, Outline> for RecordingOutline {
    fn name(&self) -> &str {
        "recording_outline"
    }

    async fn invoke(&self, input: &OutlineInput) -> Result<Outline, AgentFailure> {
        self.inputs.lock().unwrap().push(input.clone());
        <SampleAgents as StageAgent<OutlineInput, Outline>>::invoke(&SampleAgents::new(), input)
            .await
    }
}

/// 记录写作输入，产出交给样例 Agent
#[derive(Default)]
struct RecordingDraft {
    inputs: Mutex<Vec<DraftInput>>,
}

#[async_trait]
impl StageAgent<DraftInput, Draft> for RecordingDraft {
    fn name(&self) -> &str {
        "recording_draft"
    }

    async fn invoke(&self, input: &DraftInput) -> Result<Draft, AgentFailure> {
        self.inputs.lock().unwrap().push(input.clone());
        <SampleAgents as StageAgent<DraftInput, Draft>>::invoke(&SampleAgents::new(), input).await
    }
}

/// 依次返回给定分数，用完后重复最后一个
struct ScoredVirality {
    scores: Mutex<Vec<f64>>,
    calls: Mutex<usize>,
}

impl ScoredVirality {
    fn new(mut scores: Vec<f64>) -> Arc<Self> {
        scores.reverse();
        Arc::new(Self {
            scores: Mutex::new(scores),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl StageAgent<ViralityInput, ViralityAssessment> for ScoredVirality {
    fn name(&self) -> &str {
        "scored_virality"
    }

    async fn invoke(&self, _input: &ViralityInput) -> Result<ViralityAssessment, AgentFailure> {
        *self.calls.lock().unwrap() += 1;
        let mut scores = self.scores.lock().unwrap();
        let score = if scores.len() > 1 {
            scores.pop().unwrap_or(50.0)
        } else {
            scores.last().copied().unwrap_or(50.0)
        };
        Ok(ViralityAssessment {
            overall_score: score,
            optimization_suggestions: vec!["标题加上具体数字".to_string()],
            ..Default::default()
        })
    }
}

struct SlowAnalysis;

#[async_trait]
impl StageAgent<AnalysisInput, TopicAnalysis> for SlowAnalysis {
    fn name(&self) -> &str {
        "slow_analysis"
    }

    async fn invoke(&self, _input: &AnalysisInput) -> Result<TopicAnalysis, AgentFailure> {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(TopicAnalysis::default())
    }
}

struct BrokenReview;

#[async_trait]
impl StageAgent<ReviewInput, ReviewReport> for BrokenReview {
    fn name(&self) -> &str {
        "broken_review"
    }

    async fn invoke(&self, _input: &ReviewInput) -> Result<ReviewReport, AgentFailure> {
        Err(AgentFailure::Schema {
            stage: AgentStage::Review,
            message: "missing field `decision`".to_string(),
        })
    }
}

fn factory_with(agents: AgentSet) -> ArticleFactory {
    FactoryBuilder::new().with_agents(agents).build()
}

#[tokio::test]
async fn test_approved_first_pass() {
    let review = ScriptedReview::always(RoutingDecision::Approved);
    let factory = factory_with(AgentSet::sample().with_review(review.clone()));

    let result = factory
        .generate_article(ArticleRequest::new("立春养肝").audience("50岁以上女性"))
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.stage, Some(Stage::Ready));
    let metrics = result.quality_metrics.as_ref().unwrap();
    assert_eq!(metrics.revision_count, 0);
    assert!(!metrics.escalated);
    assert_eq!(metrics.quality_score, 82.0);
    assert_eq!(review.calls(), 1);

    let report = result.workflow_report.as_ref().unwrap();
    assert_eq!(report.mode, WorkflowMode::Standard);
    assert_eq!(report.routing_decisions.len(), 1);
    let transitions: Vec<&str> = report
        .events
        .iter()
        .filter(|e| e.action == "transition")
        .map(|e| e.detail.as_str())
        .collect();
    assert_eq!(transitions.first(), Some(&"INIT -> ANALYZING"));
    assert_eq!(transitions.last(), Some(&"OPTIMIZED -> READY"));
    assert_eq!(transitions.len(), 11);
}

#[tokio::test]
async fn test_two_content_revisions_then_approved() {
    let review = ScriptedReview::new(vec![
        RoutingDecision::ReviseContent,
        RoutingDecision::ReviseContent,
        RoutingDecision::Approved,
    ]);
    let factory = factory_with(AgentSet::sample().with_review(review.clone()));

    let result = factory.generate_article(ArticleRequest::new("立春养肝")).await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.stage, Some(Stage::Ready));
    let metrics = result.quality_metrics.as_ref().unwrap();
    assert_eq!(metrics.revision_count, 2);
    assert!(!metrics.escalated);
    assert_eq!(review.calls(), 3);
    assert_eq!(result.workflow_report.as_ref().unwrap().routing_decisions.len(), 3);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["quality_metrics"].get("escalated").is_none());
}

#[tokio::test]
async fn test_content_then_tone_revision_then_approved() {
    let review = ScriptedReview::new(vec![
        RoutingDecision::ReviseContent,
        RoutingDecision::AdjustTone,
        RoutingDecision::Approved,
    ]);
    let draft = Arc::new(RecordingDraft::default());
    let factory = factory_with(
        AgentSet::sample()
            .with_review(review.clone())
            .with_draft(draft.clone()),
    );

    let result = factory.generate_article(ArticleRequest::new("立春养肝")).await;

    let metrics = result.quality_metrics.as_ref().unwrap();
    assert_eq!(metrics.revision_count, 2);
    assert!(!metrics.escalated);
    let decisions = &result.workflow_report.as_ref().unwrap().routing_decisions;
    assert_eq!(decisions.len(), 3);
    assert_eq!(
        decisions.iter().map(|d| d.revision).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );

    let inputs = draft.inputs.lock().unwrap();
    assert_eq!(inputs.len(), 3);
    assert!(inputs[0].feedback.is_none());
    assert!(inputs[1].feedback.as_deref().unwrap().contains("开头不够抓人"));
    assert!(inputs[2].feedback.is_some());
}

#[tokio::test]
async fn test_standard_limit_escalates() {
    let review = ScriptedReview::always(RoutingDecision::ReviseContent);
    let factory = factory_with(AgentSet::sample().with_review(review.clone()));

    let result = factory.generate_article(ArticleRequest::new("立春养肝")).await;

    assert!(result.success);
    assert!(result.is_escalated());
    assert_eq!(result.quality_metrics.as_ref().unwrap().revision_count, 2);
    assert_eq!(review.calls(), 3);
    assert_eq!(result.workflow_report.unwrap().routing_decisions.len(), 3);
}

#[tokio::test]
async fn test_high_quality_limit_escalates() {
    let review = ScriptedReview::always(RoutingDecision::AdjustTone);
    let factory = factory_with(AgentSet::sample().with_review(review.clone()));

    let request = ArticleRequest::new("立春养肝").quality(QualityLevel::High);
    let result = factory.generate_article(request).await;

    assert!(result.is_escalated());
    assert_eq!(result.quality_metrics.as_ref().unwrap().revision_count, 4);
    assert_eq!(review.calls(), 5);
}

#[tokio::test]
async fn test_revise_structure_reworks_outline() {
    let review = ScriptedReview::new(vec![RoutingDecision::ReviseStructure]);
    let outline = Arc::new(RecordingOutline::default());
    let draft = Arc::new(RecordingDraft::default());
    let factory = factory_with(
        AgentSet::sample()
            .with_review(review.clone())
            .with_outline(outline.clone())
            .with_draft(draft.clone()),
    );

    let result = factory.generate_article(ArticleRequest::new("立春养肝")).await;
    assert!(result.success);
    assert_eq!(result.quality_metrics.as_ref().unwrap().revision_count, 1);

    let outline_inputs = outline.inputs.lock().unwrap();
    assert_eq!(outline_inputs.len(), 2);
    assert!(outline_inputs[0].prior_outline.is_none());
    assert!(outline_inputs[1].prior_outline.is_some());
    assert!(outline_inputs[1]
        .feedback
        .as_deref()
        .unwrap()
        .contains("REVISE_STRUCTURE"));

    let draft_inputs = draft.inputs.lock().unwrap();
    assert_eq!(draft_inputs.len(), 2);
    assert_ne!(draft_inputs[0].outline, draft_inputs[1].outline);

    let transitions: Vec<String> = result
        .workflow_report
        .unwrap()
        .events
        .into_iter()
        .filter(|e| e.action == "transition")
        .map(|e| e.detail)
        .collect();
    assert!(transitions.contains(&"REVIEWING -> OUTLINING".to_string()));
}

#[tokio::test]
async fn test_escalate_decision_stops_immediately() {
    let review = ScriptedReview::new(vec![RoutingDecision::Escalate]);
    let factory = factory_with(AgentSet::sample().with_review(review.clone()));

    let result = factory.generate_article(ArticleRequest::new("立春养肝")).await;

    assert!(result.success);
    assert!(result.is_escalated());
    assert_eq!(result.quality_metrics.as_ref().unwrap().revision_count, 0);
    assert_eq!(review.calls(), 1);
}

#[tokio::test]
async fn test_emergency_single_pass() {
    let review = ScriptedReview::always(RoutingDecision::ReviseContent);
    let virality = ScoredVirality::new(vec![90.0]);
    let factory = factory_with(
        AgentSet::sample()
            .with_review(review.clone())
            .with_virality(virality.clone()),
    );

    let request = ArticleRequest::new("流感高发期怎么防")
        .urgency(Urgency::Emergency)
        .quality(QualityLevel::High);
    let result = factory.generate_article(request).await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(review.calls(), 1);
    assert_eq!(review.modes.lock().unwrap()[0], AgentMode::Fast);
    assert_eq!(virality.calls(), 0);

    let metrics = result.quality_metrics.as_ref().unwrap();
    assert!(metrics.escalated);
    assert_eq!(metrics.revision_count, 0);
    assert!(metrics.virality_score.is_none());
    assert_eq!(
        result.workflow_report.as_ref().unwrap().mode,
        WorkflowMode::Emergency
    );
}

#[tokio::test]
async fn test_high_quality_low_virality_triggers_redraft() {
    let virality = ScoredVirality::new(vec![40.0, 85.0]);
    let draft = Arc::new(RecordingDraft::default());
    let factory = factory_with(
        AgentSet::sample()
            .with_review(ScriptedReview::always(RoutingDecision::Approved))
            .with_virality(virality.clone())
            .with_draft(draft.clone()),
    );

    let request = ArticleRequest::new("立春养肝").quality(QualityLevel::High);
    let result = factory.generate_article(request).await;

    assert!(result.success);
    assert_eq!(virality.calls(), 2);
    assert_eq!(
        result.quality_metrics.as_ref().unwrap().virality_score,
        Some(85.0)
    );
    let inputs = draft.inputs.lock().unwrap();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[1].optimization_hints, vec!["标题加上具体数字".to_string()]);
    assert!(result
        .workflow_report
        .unwrap()
        .events
        .iter()
        .any(|e| e.action == "optimization_redraft"));
}

#[tokio::test]
async fn test_standard_quality_keeps_low_virality() {
    let virality = ScoredVirality::new(vec![40.0]);
    let factory = factory_with(
        AgentSet::sample()
            .with_review(ScriptedReview::always(RoutingDecision::Approved))
            .with_virality(virality.clone()),
    );

    let result = factory.generate_article(ArticleRequest::new("立春养肝")).await;
    assert_eq!(virality.calls(), 1);
    assert_eq!(
        result.quality_metrics.as_ref().unwrap().virality_score,
        Some(40.0)
    );
}

#[tokio::test]
async fn test_fail_policy_returns_failure_result() {
    let mut settings = WorkflowSettings::default();
    settings
        .failure_policy
        .overrides
        .insert("review".to_string(), FailurePolicy::Fail);
    let factory = FactoryBuilder::new()
        .with_settings(settings)
        .with_agents(AgentSet::sample().with_review(Arc::new(BrokenReview)))
        .build();

    let result = factory.generate_article(ArticleRequest::new("立春养肝")).await;

    assert!(!result.success);
    assert!(result.run_id.as_deref().unwrap().starts_with("uco_"));
    assert!(result.error.as_deref().unwrap().contains("missing field"));
    assert!(result.article.is_none());
    assert_eq!(factory.stats().failed_runs, 1);
}

#[tokio::test]
async fn test_fallback_policy_recovers_and_logs() {
    let factory = factory_with(AgentSet::sample().with_review(Arc::new(BrokenReview)));

    let result = factory.generate_article(ArticleRequest::new("立春养肝")).await;

    assert!(result.success);
    let events = result.workflow_report.unwrap().events;
    assert!(events
        .iter()
        .any(|e| e.action == "fallback" && e.detail.starts_with("review")));
}

#[tokio::test]
async fn test_invalid_config_is_failure() {
    let mut settings = WorkflowSettings::default();
    settings.revision_limits.standard = 0;
    let factory = FactoryBuilder::new().with_settings(settings).build();

    let result = factory.generate_article(ArticleRequest::new("立春养肝")).await;

    assert!(!result.success);
    assert!(result.run_id.is_none());
    assert!(result.error.unwrap().contains("revision limits"));
    assert_eq!(factory.stats().failed_runs, 1);
}

#[tokio::test]
async fn test_deadline_counts_as_failure() {
    let factory = factory_with(AgentSet::sample().with_analysis(Arc::new(SlowAnalysis)));

    let result = factory
        .generate_article_within(ArticleRequest::new("立春养肝"), Duration::from_millis(50))
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("deadline"));
    let stats = factory.stats();
    assert_eq!(stats.total_runs, 1);
    assert_eq!(stats.failed_runs, 1);
}

#[tokio::test]
async fn test_llm_agents_with_empty_json_are_normalized() {
    let llm = Arc::new(MockLlmClient::fixed("{}"));
    let factory = factory_with(AgentSet::from_llm(llm.clone()));

    let result = factory.generate_article(ArticleRequest::new("立春养肝")).await;

    assert!(result.success, "{:?}", result.error);
    // 空 JSON 的审核结论按 ESCALATE 处理
    assert!(result.is_escalated());
    let article = result.article.unwrap();
    assert_eq!(article.title, DEFAULT_TITLE);
    assert_eq!(article.outline.sections.len(), 3);
    assert!(llm.calls() >= 5);
}

#[tokio::test]
async fn test_llm_review_cannot_self_escalate() {
    let llm = Arc::new(MockLlmClient::fixed(
        r#"{"routing_decision": "APPROVED", "reason": "结构清楚", "quality_score": 90, "tone_compliance": 90, "escalated": true}"#,
    ));
    let review: LlmStageAgent<ReviewInput, ReviewReport> =
        LlmStageAgent::new(AgentStage::Review, llm.clone());
    let factory = factory_with(AgentSet::sample().with_review(Arc::new(review)));

    let result = factory.generate_article(ArticleRequest::new("立春养肝")).await;

    assert!(result.success, "{:?}", result.error);
    assert!(!result.is_escalated());
    let metrics = result.quality_metrics.as_ref().unwrap();
    assert_eq!(metrics.revision_count, 0);
    assert_eq!(metrics.quality_score, 90.0);
    assert_eq!(llm.calls(), 1);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["quality_metrics"].get("escalated").is_none());
}

#[tokio::test]
async fn test_concurrent_runs_share_stats() {
    let stats = Arc::new(InMemoryRunStats::new());
    let factory = FactoryBuilder::new().with_stats(stats.clone()).build();

    let topics = ["立春养肝", "三伏天祛湿", "秋燥润肺", "冬至进补"];
    let runs = topics
        .iter()
        .map(|t| factory.generate_article(ArticleRequest::new(*t)));
    let results = futures_util::future::join_all(runs).await;

    assert!(results.iter().all(|r| r.success));
    let mut ids: Vec<_> = results.iter().map(|r| r.run_id.clone().unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), topics.len());

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.total_runs, 4);
    assert_eq!(snapshot.successful_runs, 4);
    assert_eq!(snapshot.failed_runs, 0);
}
