//! 编排器：按工作流变体驱动六个阶段 Agent，维护 UCO，产出 WorkflowResult
//!
//! - 标准流程：分析 → 大纲 → (写作 ⇄ 审核，受修订上限约束) → 爆款评估 → 标题 → READY
//! - 紧急流程：分析 → 大纲 → 写作 → 单次审核 → 标题 → READY，全部使用快速模式，不做爆款评估
//!
//! `generate_article` 从不返回 Err：配置错误、Agent 失败、整体超时与 panic 都会变成
//! success=false 的结果，每次调用恰好计入一次运行统计。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;

use crate::agents::{
    AgentMode, AgentSet, AgentStage, AnalysisInput, Draft, DraftInput, Guarded, GuardedAgent,
    HeadlineInput, HeadlineSet, Outline, OutlineInput, ReviewInput, ReviewReport,
    RoutingDecision, StageAgent, StageOutput, TopicAnalysis, ViralityAssessment, ViralityInput,
};
use crate::config::WorkflowSettings;
use crate::core::{
    assemble, ArticleRequest, ContentObject, FactoryBuilder, QualityLevel, RevisionRouter,
    RouteAction, RunStatsSink, RunStatsSnapshot, Stage, WorkflowError, WorkflowMode,
    WorkflowResult,
};

fn guard<I, O>(
    stage: AgentStage,
    settings: &WorkflowSettings,
    primary: Arc<dyn StageAgent<I, O>>,
    fallback: Arc<dyn StageAgent<I, O>>,
) -> GuardedAgent<I, O>
where
    I: Send + Sync + 'static,
    O: StageOutput,
{
    GuardedAgent::new(
        stage,
        primary,
        fallback,
        settings.timeouts.for_stage(stage),
        settings.failure_policy.for_stage(stage),
    )
}

/// 取出守护输出；来自回退 Agent 时在 UCO 中留痕
fn accept<O>(uco: &mut ContentObject, stage: AgentStage, guarded: Guarded<O>) -> O {
    if let Some(reason) = guarded.fallback_reason {
        uco.log("fallback", format!("{}: {}", stage, reason));
    }
    guarded.output
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// 文章工厂：持有守护后的阶段 Agent、路由器与统计汇聚点，可被多个并发运行共享
pub struct ArticleFactory {
    analysis: GuardedAgent<AnalysisInput, TopicAnalysis>,
    outline: GuardedAgent<OutlineInput, Outline>,
    draft: GuardedAgent<DraftInput, Draft>,
    review: GuardedAgent<ReviewInput, ReviewReport>,
    virality: GuardedAgent<ViralityInput, ViralityAssessment>,
    headline: GuardedAgent<HeadlineInput, HeadlineSet>,
    router: RevisionRouter,
    stats: Arc<dyn RunStatsSink>,
    settings: WorkflowSettings,
}

impl ArticleFactory {
    pub fn new(
        settings: WorkflowSettings,
        agents: AgentSet,
        fallback: AgentSet,
        stats: Arc<dyn RunStatsSink>,
    ) -> Self {
        Self {
            analysis: guard(AgentStage::Analysis, &settings, agents.analysis, fallback.analysis),
            outline: guard(AgentStage::Outline, &settings, agents.outline, fallback.outline),
            draft: guard(AgentStage::Draft, &settings, agents.draft, fallback.draft),
            review: guard(AgentStage::Review, &settings, agents.review, fallback.review),
            virality: guard(AgentStage::Virality, &settings, agents.virality, fallback.virality),
            headline: guard(AgentStage::Headline, &settings, agents.headline, fallback.headline),
            router: RevisionRouter::new(),
            stats,
            settings,
        }
    }

    pub fn builder() -> FactoryBuilder {
        FactoryBuilder::new()
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// 当前运行统计快照
    pub fn stats(&self) -> RunStatsSnapshot {
        self.stats.snapshot()
    }

    /// 执行一次完整工作流
    pub async fn generate_article(&self, request: ArticleRequest) -> WorkflowResult {
        self.execute(&request, None).await
    }

    /// 同 [`generate_article`](Self::generate_article)，但整个运行必须在 `deadline` 内结束
    pub async fn generate_article_within(
        &self,
        request: ArticleRequest,
        deadline: Duration,
    ) -> WorkflowResult {
        self.execute(&request, Some(deadline)).await
    }

    async fn execute(&self, request: &ArticleRequest, deadline: Option<Duration>) -> WorkflowResult {
        let started = Instant::now();
        let mode = request.mode();

        let result = match self.prepare(request, mode) {
            Ok(mut uco) => self.run_guarded(&mut uco, request, mode, deadline, started).await,
            Err(err) => {
                tracing::error!("workflow rejected before start: {}", err);
                WorkflowResult::failure(None, err)
            }
        };

        let elapsed = started.elapsed();
        self.stats.record(result.success, elapsed);
        tracing::info!(
            success = result.success,
            elapsed_ms = elapsed.as_millis() as u64,
            "workflow finished"
        );
        result
    }

    fn prepare(
        &self,
        request: &ArticleRequest,
        mode: WorkflowMode,
    ) -> Result<ContentObject, WorkflowError> {
        self.settings.validate()?;
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(WorkflowError::InvalidRequest(
                "topic must not be empty".to_string(),
            ));
        }
        let limit = self
            .settings
            .revision_limit(request.quality_level, mode == WorkflowMode::Emergency);
        Ok(ContentObject::new(topic, request.topic_source, limit))
    }

    async fn run_guarded(
        &self,
        uco: &mut ContentObject,
        request: &ArticleRequest,
        mode: WorkflowMode,
        deadline: Option<Duration>,
        started: Instant,
    ) -> WorkflowResult {
        let outcome = {
            let run = AssertUnwindSafe(self.drive(uco, request, mode)).catch_unwind();
            match deadline {
                Some(limit) => match tokio::time::timeout(limit, run).await {
                    Ok(caught) => caught,
                    Err(_) => Ok(Err(WorkflowError::DeadlineExceeded(limit))),
                },
                None => run.await,
            }
        };
        let outcome = outcome
            .unwrap_or_else(|payload| Err(WorkflowError::Panicked(panic_message(payload))));

        match outcome.and_then(|()| assemble(uco, mode, started.elapsed().as_secs_f64())) {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(
                    run_id = uco.id(),
                    stage = %uco.stage(),
                    "workflow failed: {}",
                    err
                );
                WorkflowResult::failure(Some(uco.id().to_string()), err)
            }
        }
    }

    async fn drive(
        &self,
        uco: &mut ContentObject,
        request: &ArticleRequest,
        mode: WorkflowMode,
    ) -> Result<(), WorkflowError> {
        tracing::info!(
            run_id = uco.id(),
            topic = uco.topic(),
            ?mode,
            revision_limit = uco.revision_limit(),
            "workflow started"
        );
        let agent_mode = mode.agent_mode();

        uco.transition(Stage::Analyzing)?;
        let analysis = self.produce_analysis(uco, request, agent_mode).await?;
        uco.outputs_mut().set_analysis(analysis);
        uco.transition(Stage::Analyzed)?;

        uco.transition(Stage::Outlining)?;
        let outline = self
            .produce_outline(uco, agent_mode, None, None)
            .await?;
        uco.outputs_mut().set_outline(outline);
        uco.transition(Stage::Outlined)?;

        match mode {
            WorkflowMode::Standard => {
                self.revision_loop(uco, request).await?;
                self.optimize(uco, request).await?;
            }
            WorkflowMode::Emergency => {
                self.single_pass(uco, request).await?;
            }
        }

        uco.transition(Stage::Ready)?;
        tracing::info!(
            run_id = uco.id(),
            revisions = uco.revision_count(),
            escalated = uco.is_escalated(),
            "article ready"
        );
        Ok(())
    }

    /// 写作 ⇄ 审核循环，结束时停在 REVIEWED
    async fn revision_loop(
        &self,
        uco: &mut ContentObject,
        request: &ArticleRequest,
    ) -> Result<(), WorkflowError> {
        let mode = AgentMode::Standard;
        let limit = uco.revision_limit();
        let mut feedback: Option<String> = None;

        loop {
            uco.transition(Stage::Drafting)?;
            let draft = self
                .produce_draft(uco, request, mode, feedback.take(), Vec::new())
                .await?;
            uco.outputs_mut().set_draft(draft);
            uco.transition(Stage::Drafted)?;

            uco.transition(Stage::Reviewing)?;
            let review = self.produce_review(uco, mode).await?;
            uco.record_routing_decision(
                review.routing_decision,
                review.reason.clone(),
                Stage::Reviewing,
            );
            let action = self.router.route(&review, uco.revision_count(), limit);
            tracing::debug!(
                run_id = uco.id(),
                revision = uco.revision_count(),
                decision = %review.routing_decision,
                ?action,
                "review routed"
            );
            uco.outputs_mut().set_review(review);

            match action {
                RouteAction::Accept => break,
                RouteAction::Escalate { reason } => {
                    tracing::warn!(run_id = uco.id(), "escalating to human review: {}", reason);
                    uco.escalate(reason)?;
                    break;
                }
                RouteAction::ReviseOutline { feedback: notes } => {
                    if !uco.increment_revision() {
                        uco.escalate("revision limit reached")?;
                        break;
                    }
                    uco.transition(Stage::Outlining)?;
                    let prior = uco.outputs().outline()?.clone();
                    let outline = self
                        .produce_outline(uco, mode, Some(prior), Some(notes.clone()))
                        .await?;
                    uco.outputs_mut().set_outline(outline);
                    uco.transition(Stage::Outlined)?;
                    feedback = Some(notes);
                }
                RouteAction::Redraft { feedback: notes } => {
                    if !uco.increment_revision() {
                        uco.escalate("revision limit reached")?;
                        break;
                    }
                    feedback = Some(notes);
                }
            }
        }

        let quality = uco.outputs().review()?.quality_score;
        if quality < self.settings.thresholds.quality {
            uco.log(
                "below_quality_threshold",
                format!("{:.1} < {:.1}", quality, self.settings.thresholds.quality),
            );
        }
        uco.transition(Stage::Reviewed)?;
        Ok(())
    }

    /// 爆款评估与标题生成；高质量档位下评分不达标会做一次优化重写
    async fn optimize(
        &self,
        uco: &mut ContentObject,
        request: &ArticleRequest,
    ) -> Result<(), WorkflowError> {
        uco.transition(Stage::Optimizing)?;

        let assessment = self.produce_virality(uco).await?;
        let below_threshold = assessment.overall_score < self.settings.thresholds.virality;
        let hints = assessment.optimization_suggestions.clone();
        uco.outputs_mut().set_virality(assessment);

        if below_threshold
            && request.quality_level == QualityLevel::High
            && !uco.is_escalated()
        {
            uco.log(
                "optimization_redraft",
                format!("{} suggestions applied", hints.len()),
            );
            let draft = self
                .produce_draft(uco, request, AgentMode::Standard, None, hints)
                .await?;
            uco.outputs_mut().set_draft(draft);
            let reassessed = self.produce_virality(uco).await?;
            uco.outputs_mut().set_virality(reassessed);
        }

        let headlines = self
            .produce_headlines(uco, request, AgentMode::Standard)
            .await?;
        uco.outputs_mut().set_headlines(headlines);
        uco.transition(Stage::Optimized)?;
        Ok(())
    }

    /// 紧急流程：一次写作、一次审核，不达标直接升级，不重试
    async fn single_pass(
        &self,
        uco: &mut ContentObject,
        request: &ArticleRequest,
    ) -> Result<(), WorkflowError> {
        let mode = AgentMode::Fast;

        uco.transition(Stage::Drafting)?;
        let draft = self.produce_draft(uco, request, mode, None, Vec::new()).await?;
        uco.outputs_mut().set_draft(draft);
        uco.transition(Stage::Drafted)?;

        uco.transition(Stage::Reviewing)?;
        let review = self.produce_review(uco, mode).await?;
        uco.record_routing_decision(
            review.routing_decision,
            review.reason.clone(),
            Stage::Reviewing,
        );
        let decision = review.routing_decision;
        uco.outputs_mut().set_review(review);
        if decision != RoutingDecision::Approved {
            tracing::warn!(run_id = uco.id(), %decision, "emergency draft not approved, escalating");
            uco.escalate(format!("emergency workflow allows no retries ({})", decision))?;
        }
        uco.transition(Stage::Reviewed)?;

        uco.transition(Stage::Optimizing)?;
        let headlines = self.produce_headlines(uco, request, mode).await?;
        uco.outputs_mut().set_headlines(headlines);
        uco.transition(Stage::Optimized)?;
        Ok(())
    }

    async fn produce_analysis(
        &self,
        uco: &mut ContentObject,
        request: &ArticleRequest,
        mode: AgentMode,
    ) -> Result<TopicAnalysis, WorkflowError> {
        let input = AnalysisInput {
            topic: uco.topic().to_string(),
            audience: request.target_audience.clone(),
            mode,
        };
        let guarded = self.analysis.run(&input).await?;
        Ok(accept(uco, AgentStage::Analysis, guarded))
    }

    async fn produce_outline(
        &self,
        uco: &mut ContentObject,
        mode: AgentMode,
        prior_outline: Option<Outline>,
        feedback: Option<String>,
    ) -> Result<Outline, WorkflowError> {
        let input = OutlineInput {
            topic: uco.topic().to_string(),
            analysis: uco.outputs().analysis()?.clone(),
            prior_outline,
            feedback,
            mode,
        };
        let guarded = self.outline.run(&input).await?;
        Ok(accept(uco, AgentStage::Outline, guarded))
    }

    async fn produce_draft(
        &self,
        uco: &mut ContentObject,
        request: &ArticleRequest,
        mode: AgentMode,
        feedback: Option<String>,
        optimization_hints: Vec<String>,
    ) -> Result<Draft, WorkflowError> {
        let input = DraftInput {
            topic: uco.topic().to_string(),
            outline: uco.outputs().outline()?.clone(),
            analysis: uco.outputs().analysis()?.clone(),
            requirements: request.custom_requirements.clone(),
            feedback,
            optimization_hints,
            mode,
        };
        let guarded = self.draft.run(&input).await?;
        Ok(accept(uco, AgentStage::Draft, guarded))
    }

    async fn produce_review(
        &self,
        uco: &mut ContentObject,
        mode: AgentMode,
    ) -> Result<ReviewReport, WorkflowError> {
        let input = ReviewInput {
            draft: uco.outputs().draft()?.clone(),
            mode,
        };
        let guarded = self.review.run(&input).await?;
        let mut review = accept(uco, AgentStage::Review, guarded);
        // 升级只由编排器判定
        review.escalated = false;
        Ok(review)
    }

    async fn produce_virality(
        &self,
        uco: &mut ContentObject,
    ) -> Result<ViralityAssessment, WorkflowError> {
        let input = ViralityInput {
            draft: uco.outputs().draft()?.clone(),
            review: uco.outputs().review()?.clone(),
        };
        let guarded = self.virality.run(&input).await?;
        Ok(accept(uco, AgentStage::Virality, guarded))
    }

    async fn produce_headlines(
        &self,
        uco: &mut ContentObject,
        request: &ArticleRequest,
        mode: AgentMode,
    ) -> Result<HeadlineSet, WorkflowError> {
        let input = HeadlineInput {
            draft: uco.outputs().draft()?.clone(),
            audience: request.target_audience.clone(),
            mode,
        };
        let guarded = self.headline.run(&input).await?;
        Ok(accept(uco, AgentStage::Headline, guarded))
    }
}
