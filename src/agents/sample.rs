//! 规则样例 Agent：不调用任何外部服务，输入相同则输出相同
//!
//! 用途：未配置 API Key 时跑通整条生产线；LLM Agent 失败且策略为 fallback 时作为替补。

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::agents::seo::{headline_templates, keyword_score, primary_intent, rank_keywords};
use crate::agents::{
    count_words, prediction_label, AgentMode, AnalysisInput, Draft, DraftInput, HeadlineInput,
    HeadlineSet, Outline, OutlineInput, OutlineSection, RankedHeadline, ReviewInput,
    ReviewReport, RoutingDecision, StageAgent, TopicAnalysis, ViralityAssessment, ViralityInput,
    DEFAULT_PERSONA,
};
use crate::core::AgentFailure;

/// 口吻标记：出现得越多越像「老李」
const VOICE_MARKERS: &[&str] = &["老李", "咱们", "您", "说句实在话", "记住"];

/// 低于该字数的稿件会被样例审核打回
const MIN_WORDS: u32 = 300;

#[derive(Debug, Default, Clone)]
pub struct SampleAgents;

impl SampleAgents {
    pub fn new() -> Self {
        Self
    }
}

fn analyze(input: &AnalysisInput) -> TopicAnalysis {
    let topic = &input.topic;
    let mut keywords = vec![
        topic.clone(),
        format!("{}怎么做", topic),
        format!("{}吃什么", topic),
        format!("{}的好处", topic),
        format!("{}注意事项", topic),
    ];
    if input.mode == AgentMode::Standard {
        keywords.push(format!("{}食谱一周不重样", topic));
        keywords.push(format!("{}真的有用吗", topic));
    }
    rank_keywords(&mut keywords);

    let best = keywords.first().map(|k| keyword_score(k)).unwrap_or(0);
    TopicAnalysis {
        pain_points: vec![
            format!("想{}却不知道从哪下手", topic),
            "网上说法太多，分不清真假".to_string(),
            "试过几次没效果，容易放弃".to_string(),
        ],
        emotional_hooks: vec![
            "身边人都在做，自己却落下了".to_string(),
            "小习惯就能带来大变化".to_string(),
        ],
        patterns: vec!["误区纠正".to_string(), "清单式干货".to_string()],
        keywords,
        persona: input
            .audience
            .clone()
            .unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
        golden_sentences: vec![
            "养生不是吃出来的，是一天天过出来的。".to_string(),
            format!("{}，贵在坚持，不在猛。", topic),
        ],
        success_factor: (best as f64 / 20.0).min(1.0),
    }
}

fn outline(input: &OutlineInput) -> Outline {
    let topic = &input.topic;
    let mut sections = vec![
        OutlineSection {
            heading: format!("为什么现在要关注{}", topic),
            key_points: input.analysis.pain_points.iter().take(2).cloned().collect(),
            target_words: 300,
        },
        OutlineSection {
            heading: format!("{}的三个关键做法", topic),
            key_points: vec!["饮食".into(), "作息".into(), "情绪".into()],
            target_words: 700,
        },
        OutlineSection {
            heading: "老李的叮嘱".to_string(),
            key_points: vec!["因人而异".into(), "不适及时就医".into()],
            target_words: 250,
        },
    ];
    if input.mode == AgentMode::Standard {
        sections.insert(
            2,
            OutlineSection {
                heading: "这些误区别再踩了".to_string(),
                key_points: vec!["偏方不可信".into(), "过犹不及".into()],
                target_words: 400,
            },
        );
    }
    // 结构修订：把误区前置，先破后立
    if input.prior_outline.is_some() && input.feedback.is_some() && sections.len() > 3 {
        let myths = sections.remove(2);
        sections.insert(1, myths);
    }

    let total_words = sections.iter().map(|s| s.target_words).sum();
    Outline {
        sections,
        total_words,
        emotional_arc: vec!["担忧".into(), "好奇".into(), "释然".into(), "行动".into()],
    }
}

fn section_paragraph(section: &OutlineSection, analysis: &TopicAnalysis) -> String {
    let points = if section.key_points.is_empty() {
        "这件事".to_string()
    } else {
        section.key_points.join("、")
    };
    let golden = analysis
        .golden_sentences
        .first()
        .map(String::as_str)
        .unwrap_or("身体是自己的，得自己上心。");
    format!(
        "## {}\n\n咱们今天就说说{}。老李在社区看诊三十多年，见过太多人在这上面走弯路。\
         您要记住，{}这些事情看着简单，真正做到的人不多。{}\n\n\
         说句实在话，方法再好也要因人而异，有基础病的朋友一定先问问自己的医生，\
         别看了一篇文章就照搬。慢慢来，比较快。",
        section.heading, points, points, golden
    )
}

fn draft(input: &DraftInput) -> Draft {
    let mut paragraphs: Vec<String> = input
        .outline
        .sections
        .iter()
        .map(|s| section_paragraph(s, &input.analysis))
        .collect();
    if let Some(req) = &input.requirements {
        paragraphs.push(format!("（写作要求：{}）", req));
    }
    if !input.optimization_hints.is_empty() {
        paragraphs.push(
            "您平时是怎么做的？欢迎在评论区跟老李聊聊，转给家里人看看也好。".to_string(),
        );
    }
    let content = paragraphs.join("\n\n");

    Draft {
        title: format!("{}：老李掏心窝的几句话", input.topic),
        word_count: count_words(&content),
        content,
        sources: vec!["《中国居民膳食指南（2022）》".to_string()],
        voice_samples: vec![
            "说句实在话，方法再好也要因人而异。".to_string(),
            "慢慢来，比较快。".to_string(),
        ],
    }
}

fn tone_score(content: &str) -> f64 {
    let hits = VOICE_MARKERS
        .iter()
        .filter(|m| content.contains(*m))
        .count();
    (40.0 + hits as f64 * 12.0).min(100.0)
}

fn review(input: &ReviewInput) -> ReviewReport {
    let draft = &input.draft;
    let tone = tone_score(&draft.content);
    let length_ok = draft.word_count >= MIN_WORDS;
    let quality = if length_ok { 82.0 } else { 58.0 };

    let mut issues = Vec::new();
    let decision = if !length_ok {
        issues.push(format!("正文不足{}字，干货不够", MIN_WORDS));
        RoutingDecision::ReviseContent
    } else if tone < 60.0 {
        issues.push("口吻偏书面，缺少老李的亲切感".to_string());
        RoutingDecision::AdjustTone
    } else {
        RoutingDecision::Approved
    };

    ReviewReport {
        routing_decision: decision,
        reason: match decision {
            RoutingDecision::Approved => "内容完整，口吻符合人设".to_string(),
            _ => "需要修改后再审".to_string(),
        },
        quality_score: quality,
        tone_compliance: tone,
        issues,
        escalated: false,
    }
}

fn assess(input: &ViralityInput) -> ViralityAssessment {
    let draft = &input.draft;
    let hooks = draft.content.matches(['？', '！']).count() as f64;
    let sections = draft.content.matches("## ").count() as f64;

    let mut dimension_scores = BTreeMap::new();
    dimension_scores.insert("情绪共鸣".to_string(), (50.0 + hooks * 8.0).min(100.0));
    dimension_scores.insert("实用价值".to_string(), (40.0 + sections * 12.0).min(100.0));
    dimension_scores.insert(
        "标题吸引力".to_string(),
        (50.0 + keyword_score(&draft.title) as f64 * 4.0).min(100.0),
    );
    dimension_scores.insert(
        "内容质量".to_string(),
        input.review.quality_score.clamp(0.0, 100.0),
    );

    let overall_score = dimension_scores.values().sum::<f64>() / dimension_scores.len() as f64;
    let optimization_suggestions = dimension_scores
        .iter()
        .filter(|(_, score)| **score < 70.0)
        .map(|(dim, _)| format!("提升「{}」：多用读者身边的真实场景", dim))
        .collect();

    ViralityAssessment {
        dimension_scores,
        overall_score,
        prediction_label: prediction_label(overall_score).to_string(),
        optimization_suggestions,
    }
}

fn headlines(input: &HeadlineInput) -> HeadlineSet {
    let title = &input.draft.title;
    let keyword = title.split('：').next().unwrap_or(title).trim();
    let mut candidates = headline_templates(keyword, primary_intent(keyword));
    if input.mode == AgentMode::Fast {
        candidates.truncate(2);
    }
    if !title.is_empty() && !candidates.contains(title) {
        candidates.push(title.clone());
    }

    let mut ranked: Vec<RankedHeadline> = candidates
        .iter()
        .map(|c| RankedHeadline {
            title: c.clone(),
            predicted_engagement: (40.0 + keyword_score(c) as f64 * 3.0).min(100.0),
        })
        .collect();
    ranked.sort_by(|a, b| b.predicted_engagement.total_cmp(&a.predicted_engagement));

    HeadlineSet { candidates, ranked }
}

#[async_trait]
impl StageAgent<AnalysisInput, TopicAnalysis> for SampleAgents {
    fn name(&self) -> &str {
        "sample-analysis"
    }

    async fn invoke(&self, input: &AnalysisInput) -> Result<TopicAnalysis, AgentFailure> {
        Ok(analyze(input))
    }
}

#[async_trait]
impl StageAgent<OutlineInput, Outline> for SampleAgents {
    fn name(&self) -> &str {
        "sample-outline"
    }

    async fn invoke(&self, input: &OutlineInput) -> Result<Outline, AgentFailure> {
        Ok(outline(input))
    }
}

#[async_trait]
impl StageAgent<DraftInput, Draft> for SampleAgents {
    fn name(&self) -> &str {
        "sample-draft"
    }

    async fn invoke(&self, input: &DraftInput) -> Result<Draft, AgentFailure> {
        Ok(draft(input))
    }
}

#[async_trait]
impl StageAgent<ReviewInput, ReviewReport> for SampleAgents {
    fn name(&self) -> &str {
        "sample-review"
    }

    async fn invoke(&self, input: &ReviewInput) -> Result<ReviewReport, AgentFailure> {
        Ok(review(input))
    }
}

#[async_trait]
impl StageAgent<ViralityInput, ViralityAssessment> for SampleAgents {
    fn name(&self) -> &str {
        "sample-virality"
    }

    async fn invoke(&self, input: &ViralityInput) -> Result<ViralityAssessment, AgentFailure> {
        Ok(assess(input))
    }
}

#[async_trait]
impl StageAgent<HeadlineInput, HeadlineSet> for SampleAgents {
    fn name(&self) -> &str {
        "sample-headline"
    }

    async fn invoke(&self, input: &HeadlineInput) -> Result<HeadlineSet, AgentFailure> {
        Ok(headlines(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis_input(mode: AgentMode) -> AnalysisInput {
        AnalysisInput {
            topic: "立春养肝".to_string(),
            audience: None,
            mode,
        }
    }

    fn draft_input() -> DraftInput {
        let analysis = analyze(&analysis_input(AgentMode::Standard));
        let outline = outline(&OutlineInput {
            topic: "立春养肝".to_string(),
            analysis: analysis.clone(),
            prior_outline: None,
            feedback: None,
            mode: AgentMode::Standard,
        });
        DraftInput {
            topic: "立春养肝".to_string(),
            outline,
            analysis,
            requirements: None,
            feedback: None,
            optimization_hints: vec![],
            mode: AgentMode::Standard,
        }
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let a = analyze(&analysis_input(AgentMode::Standard));
        let b = analyze(&analysis_input(AgentMode::Standard));
        assert_eq!(a, b);
        assert_eq!(a.persona, DEFAULT_PERSONA);
        // 排序后疑问类长尾词靠前
        assert_eq!(a.keywords[0], "立春养肝真的有用吗");
    }

    #[test]
    fn test_fast_outline_is_shorter() {
        let analysis = analyze(&analysis_input(AgentMode::Fast));
        let fast = outline(&OutlineInput {
            topic: "立春养肝".to_string(),
            analysis,
            prior_outline: None,
            feedback: None,
            mode: AgentMode::Fast,
        });
        assert_eq!(fast.sections.len(), 3);
    }

    #[test]
    fn test_structure_revision_reorders_sections() {
        let input = draft_input();
        let revised = outline(&OutlineInput {
            topic: "立春养肝".to_string(),
            analysis: input.analysis.clone(),
            prior_outline: Some(input.outline.clone()),
            feedback: Some("先讲误区".to_string()),
            mode: AgentMode::Standard,
        });
        assert_eq!(revised.sections[1].heading, "这些误区别再踩了");
        assert_ne!(revised, input.outline);
    }

    #[test]
    fn test_sample_draft_passes_sample_review() {
        let d = draft(&draft_input());
        assert!(d.word_count >= MIN_WORDS);
        let report = review(&ReviewInput {
            draft: d,
            mode: AgentMode::Standard,
        });
        assert_eq!(report.routing_decision, RoutingDecision::Approved);
    }

    #[test]
    fn test_short_draft_is_sent_back() {
        let report = review(&ReviewInput {
            draft: Draft {
                title: "短".into(),
                content: "太短了".into(),
                word_count: 3,
                ..Default::default()
            },
            mode: AgentMode::Standard,
        });
        assert_eq!(report.routing_decision, RoutingDecision::ReviseContent);
        assert!(!report.issues.is_empty());
    }

    #[test]
    fn test_headlines_ranked_descending() {
        let d = draft(&draft_input());
        let set = headlines(&HeadlineInput {
            draft: d.clone(),
            audience: None,
            mode: AgentMode::Standard,
        });
        assert!(set.candidates.contains(&d.title));
        assert!(set
            .ranked
            .windows(2)
            .all(|w| w[0].predicted_engagement >= w[1].predicted_engagement));
    }
}
