//! 各阶段 Prompt 模板
//!
//! 每个阶段的输入实现 [`StagePrompt`]：给出阶段名与 user prompt。
//! 输出格式统一要求「只输出一个 JSON 对象」，由 llm_agent 负责提取与解析。

use crate::agents::{
    AgentMode, AgentStage, AnalysisInput, DraftInput, HeadlineInput, Outline, OutlineInput,
    ReviewInput, TopicAnalysis, ViralityInput,
};

/// 内容团队共用的 system prompt
pub const SYSTEM_PROMPT: &str = "你是一个健康养生公众号的资深内容团队成员。\
公众号的人设是「老李」：退休的社区医生，说话接地气、有温度，不夸大疗效、不制造焦虑，\
所有建议都提醒读者因人而异、必要时就医。\
你必须只输出一个合法的 JSON 对象，不要输出任何解释文字。";

pub trait StagePrompt {
    const STAGE: AgentStage;

    fn render(&self) -> String;
}

fn mode_hint(mode: AgentMode) -> &'static str {
    match mode {
        AgentMode::Standard => "",
        AgentMode::Fast => "\n【紧急模式】时间紧迫，请给出精简但完整的结果。",
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "（无）".to_string();
    }
    items
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

fn analysis_summary(analysis: &TopicAnalysis) -> String {
    format!(
        "目标读者：{}\n痛点：\n{}\n情绪钩子：\n{}\n关键词：{}\n金句：\n{}",
        analysis.persona,
        bullet_list(&analysis.pain_points),
        bullet_list(&analysis.emotional_hooks),
        analysis.keywords.join("、"),
        bullet_list(&analysis.golden_sentences),
    )
}

fn outline_summary(outline: &Outline) -> String {
    outline
        .sections
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{}. {}（约{}字）：{}",
                i + 1,
                s.heading,
                s.target_words,
                s.key_points.join("；")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl StagePrompt for AnalysisInput {
    const STAGE: AgentStage = AgentStage::Analysis;

    fn render(&self) -> String {
        format!(
            "请分析选题「{}」的爆款潜力。目标读者：{}。\n\
             输出 JSON 字段：pain_points(数组)、emotional_hooks(数组)、patterns(爆款套路,数组)、\
             keywords(SEO关键词,数组)、persona(读者画像,字符串)、golden_sentences(金句,数组)、\
             success_factor(0-1 小数)。{}",
            self.topic,
            self.audience.as_deref().unwrap_or("未指定"),
            mode_hint(self.mode)
        )
    }
}

impl StagePrompt for OutlineInput {
    const STAGE: AgentStage = AgentStage::Outline;

    fn render(&self) -> String {
        let mut prompt = format!(
            "请为选题「{}」设计文章大纲。\n选题分析：\n{}\n",
            self.topic,
            analysis_summary(&self.analysis)
        );
        if let Some(prior) = &self.prior_outline {
            prompt.push_str(&format!("\n上一版大纲：\n{}\n", outline_summary(prior)));
        }
        if let Some(feedback) = &self.feedback {
            prompt.push_str(&format!("\n审核意见（请据此调整结构）：\n{}\n", feedback));
        }
        prompt.push_str(
            "\n输出 JSON 字段：sections(数组，每项含 heading、key_points 数组、target_words 整数)、\
             total_words(整数)、emotional_arc(情绪曲线,数组)。",
        );
        prompt.push_str(mode_hint(self.mode));
        prompt
    }
}

impl StagePrompt for DraftInput {
    const STAGE: AgentStage = AgentStage::Draft;

    fn render(&self) -> String {
        let mut prompt = format!(
            "请以「老李」的口吻写一篇关于「{}」的文章。\n大纲：\n{}\n选题分析：\n{}\n",
            self.topic,
            outline_summary(&self.outline),
            analysis_summary(&self.analysis)
        );
        if let Some(req) = &self.requirements {
            prompt.push_str(&format!("\n额外要求：{}\n", req));
        }
        if let Some(feedback) = &self.feedback {
            prompt.push_str(&format!("\n上一稿的审核意见（必须逐条修改）：\n{}\n", feedback));
        }
        if !self.optimization_hints.is_empty() {
            prompt.push_str(&format!(
                "\n传播力优化建议：\n{}\n",
                bullet_list(&self.optimization_hints)
            ));
        }
        prompt.push_str(
            "\n输出 JSON 字段：title、content(正文)、word_count(整数)、sources(引用来源,数组)、\
             voice_samples(最能体现老李口吻的2-3句,数组)。",
        );
        prompt.push_str(mode_hint(self.mode));
        prompt
    }
}

impl StagePrompt for ReviewInput {
    const STAGE: AgentStage = AgentStage::Review;

    fn render(&self) -> String {
        format!(
            "请审核下面这篇文章。\n标题：{}\n正文：\n{}\n\n\
             审核维度：医学准确性、是否夸大疗效、结构是否清晰、是否符合老李的亲切口吻。\n\
             输出 JSON 字段：routing_decision（只能是 APPROVED / REVISE_STRUCTURE / REVISE_CONTENT / \
             ADJUST_TONE / ESCALATE 之一）、reason、quality_score(0-100)、tone_compliance(0-100)、\
             issues(数组)。{}",
            self.draft.title,
            self.draft.content,
            mode_hint(self.mode)
        )
    }
}

impl StagePrompt for ViralityInput {
    const STAGE: AgentStage = AgentStage::Virality;

    fn render(&self) -> String {
        format!(
            "请评估这篇文章的传播潜力。\n标题：{}\n正文：\n{}\n审核得分：{:.0}\n\n\
             输出 JSON 字段：dimension_scores(对象，键为维度名如 情绪共鸣/实用价值/社交货币/标题吸引力，\
             值为 0-100)、overall_score(0-100)、prediction_label、optimization_suggestions(数组)。",
            self.draft.title, self.draft.content, self.review.quality_score
        )
    }
}

impl StagePrompt for HeadlineInput {
    const STAGE: AgentStage = AgentStage::Headline;

    fn render(&self) -> String {
        format!(
            "请为文章生成 5 个爆款标题候选并排序。\n原标题：{}\n目标读者：{}\n正文开头：{}\n\n\
             输出 JSON 字段：candidates(数组)、ranked(数组，每项含 title 与 predicted_engagement 0-100，\
             按预测互动率降序)。{}",
            self.draft.title,
            self.audience.as_deref().unwrap_or("未指定"),
            self.draft.content.chars().take(200).collect::<String>(),
            mode_hint(self.mode)
        )
    }
}
